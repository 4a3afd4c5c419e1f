//! Minimal Office Open XML workbook writer.
//!
//! One sheet, inline strings only, no shared-string table or styles. Good
//! enough for Excel, LibreOffice and Google Sheets to open.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::csv_io::{export_row, EXPORT_COLUMNS};
use super::types::TestCase;
use crate::error::ExportError;

pub const SHEET_NAME: &str = "Test Cases";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        SHEET_NAME
    )
}

/// Spreadsheet column letter for a zero-based index (A..Z, AA..)
fn column_letter(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// XML 1.0 forbids most control characters even when escaped
fn xml_safe(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn write_string_cell<W: Write>(
    writer: &mut Writer<W>,
    reference: &str,
    value: &str,
) -> Result<(), ExportError> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    cell.push_attribute(("t", "inlineStr"));
    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;

    let mut text = BytesStart::new("t");
    text.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(text))?;
    writer.write_event(Event::Text(BytesText::new(&xml_safe(value))))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;

    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_number_cell<W: Write>(
    writer: &mut Writer<W>,
    reference: &str,
    value: &str,
) -> Result<(), ExportError> {
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("v")))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("v")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

fn write_row<W: Write>(
    writer: &mut Writer<W>,
    row_number: usize,
    cells: &[String],
    numeric_first: bool,
) -> Result<(), ExportError> {
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", row_number.to_string().as_str()));
    writer.write_event(Event::Start(row))?;

    for (col, value) in cells.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let reference = format!("{}{}", column_letter(col), row_number);
        if col == 0 && numeric_first {
            write_number_cell(writer, &reference, value)?;
        } else {
            write_string_cell(writer, &reference, value)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("row")))?;
    Ok(())
}

/// Render the worksheet part
pub fn sheet_xml(cases: &[&TestCase]) -> Result<String, ExportError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute((
        "xmlns",
        "http://schemas.openxmlformats.org/spreadsheetml/2006/main",
    ));
    writer.write_event(Event::Start(worksheet))?;
    writer.write_event(Event::Start(BytesStart::new("sheetData")))?;

    let header: Vec<String> = EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect();
    write_row(&mut writer, 1, &header, false)?;
    for (idx, case) in cases.iter().enumerate() {
        write_row(&mut writer, idx + 2, &export_row(case)?, true)?;
    }

    writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
    writer.write_event(Event::End(BytesEnd::new("worksheet")))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Build a complete `.xlsx` file in memory
pub fn export_xlsx(cases: &[&TestCase]) -> Result<Vec<u8>, ExportError> {
    let sheet = sheet_xml(cases)?;
    let workbook = workbook_xml();
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", workbook.as_str()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", sheet.as_str()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in parts {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::types::TransactionType;
    use std::io::Read;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(6), "G");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn test_sheet_escapes_text() {
        let case = TestCase::new(3, TransactionType::Expense, "rice <5kg> & dal", "basic");
        let xml = sheet_xml(&[&case]).unwrap();

        assert!(xml.contains(r#"<c r="A2"><v>3</v></c>"#));
        assert!(xml.contains("rice &lt;5kg&gt; &amp; dal"));
        assert!(xml.contains(r#"<c r="G1" t="inlineStr">"#));
        // context and expectedOutput are empty for this case
        assert!(!xml.contains(r#"r="F2""#));
    }

    #[test]
    fn test_xlsx_archive_layout() {
        let case = TestCase::new(1, TransactionType::PaymentIn, "Received 300 from Neha", "basic");
        let bytes = export_xlsx(&[&case]).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "xl/workbook.xml",
            "xl/_rels/workbook.xml.rels",
            "xl/worksheets/sheet1.xml",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing part {}", name);
        }

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("Received 300 from Neha"));
        assert!(sheet.contains("payment_in"));
    }
}
