//! CSV import and export of test cases.
//!
//! Import uses a single-pass quoted-field scanner rather than a full CSV
//! grammar: a `"` toggles quoting, `""` inside quotes is a literal quote,
//! and commas/newlines only separate cells when outside quotes. Export goes
//! through the `csv` writer with minimal quoting, which produces exactly the
//! escaping the scanner understands.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use super::collection::TestSuite;
use super::types::{normalize_expected, TestCase, TransactionType};
use crate::error::{ExportError, ImportError};

/// Fixed export column order
pub const EXPORT_COLUMNS: [&str; 7] = [
    "id",
    "type",
    "input",
    "expectedIntent",
    "category",
    "context",
    "expectedOutput",
];

const DEFAULT_IMPORT_CATEGORY: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!("Unknown export format: {} (expected csv or xlsx)", other)),
        }
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped_blank: usize,
    pub first_id: u32,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imported {} test cases", self.imported)?;
        if self.skipped_blank > 0 {
            write!(f, " ({} rows with blank input skipped)", self.skipped_blank)?;
        }
        Ok(())
    }
}

/// Split raw CSV text into rows of cells.
///
/// Rows where every cell is blank are dropped, so trailing empty lines are
/// harmless. `\r\n` and `\n` both end a row outside quotes.
pub fn parse_rows(content: &str) -> Vec<Vec<String>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut inside_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if inside_quotes && chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    inside_quotes = !inside_quotes;
                }
            }
            ',' if !inside_quotes => row.push(std::mem::take(&mut cell)),
            '\r' if !inside_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !inside_quotes => {
                row.push(std::mem::take(&mut cell));
                commit_row(&mut rows, std::mem::take(&mut row));
            }
            _ => cell.push(c),
        }
    }

    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        commit_row(&mut rows, row);
    }

    rows
}

fn commit_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    if row.iter().any(|c| !c.trim().is_empty()) {
        rows.push(row);
    }
}

/// Column positions resolved from the header row
struct HeaderMap {
    transaction_type: usize,
    input: usize,
    expected_intent: Option<usize>,
    category: Option<usize>,
    context: Option<usize>,
    expected_output: Option<usize>,
}

impl HeaderMap {
    fn resolve(header: &[String]) -> Result<Self, ImportError> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let transaction_type = find("type");
        let input = find("input");
        match (transaction_type, input) {
            (Some(transaction_type), Some(input)) => Ok(Self {
                transaction_type,
                input,
                expected_intent: find("expectedintent"),
                category: find("category"),
                context: find("context"),
                expected_output: find("expectedoutput"),
            }),
            _ => {
                let mut missing = Vec::new();
                if transaction_type.is_none() {
                    missing.push("type".to_string());
                }
                if input.is_none() {
                    missing.push("input".to_string());
                }
                Err(ImportError::MissingColumns(missing))
            }
        }
    }
}

fn cell_at(row: &[String], idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parse CSV text into new test cases numbered from `first_id`.
///
/// All-or-nothing: a structural problem yields an error and no cases.
pub fn parse_cases(content: &str, first_id: u32) -> Result<(Vec<TestCase>, usize), ImportError> {
    let rows = parse_rows(content);
    let Some((header, data)) = rows.split_first() else {
        return Err(ImportError::NoDataRows);
    };
    let columns = HeaderMap::resolve(header)?;
    if data.is_empty() {
        return Err(ImportError::NoDataRows);
    }

    let mut cases = Vec::new();
    let mut skipped = 0;

    for (row_idx, row) in data.iter().enumerate() {
        let input = cell_at(row, Some(columns.input));
        if input.trim().is_empty() {
            log::debug!("Skipping CSV row {}: blank input", row_idx + 2);
            skipped += 1;
            continue;
        }

        let raw_type = cell_at(row, Some(columns.transaction_type)).trim();
        let transaction_type = if raw_type.is_empty() {
            TransactionType::Expense
        } else {
            raw_type.parse().unwrap_or_else(|_| {
                log::warn!(
                    "CSV row {}: unknown type '{}', importing as 'other'",
                    row_idx + 2,
                    raw_type
                );
                TransactionType::Other
            })
        };

        let expected_output = non_blank(cell_at(row, columns.expected_output)).and_then(|raw| {
            match serde_json::from_str::<serde_json::Value>(raw.trim()) {
                Ok(value) => normalize_expected(Some(value)),
                Err(e) => {
                    log::debug!(
                        "CSV row {}: expectedOutput is not JSON ({}), dropping",
                        row_idx + 2,
                        e
                    );
                    None
                }
            }
        });

        cases.push(TestCase {
            id: first_id + cases.len() as u32,
            transaction_type,
            input: input.to_string(),
            expected_intent: non_blank(cell_at(row, columns.expected_intent))
                .unwrap_or_else(|| transaction_type.as_str().to_string()),
            expected_output,
            category: non_blank(cell_at(row, columns.category))
                .unwrap_or_else(|| DEFAULT_IMPORT_CATEGORY.to_string()),
            context: non_blank(cell_at(row, columns.context)),
        });
    }

    if cases.is_empty() {
        return Err(ImportError::NoValidRows);
    }
    Ok((cases, skipped))
}

/// Import CSV text into `suite`, appending after the current highest id
pub fn import_csv(suite: &mut TestSuite, content: &str) -> Result<ImportSummary, ImportError> {
    let first_id = suite.next_id();
    let (cases, skipped_blank) = parse_cases(content, first_id)?;
    let summary = ImportSummary {
        imported: cases.len(),
        skipped_blank,
        first_id,
    };
    suite.extend(cases);
    log::info!("{}", summary);
    Ok(summary)
}

/// Cell values for one exported case, in [`EXPORT_COLUMNS`] order
pub fn export_row(case: &TestCase) -> Result<[String; 7], serde_json::Error> {
    let expected_output = match &case.expected_output {
        Some(value) if !value.is_null() => serde_json::to_string(value)?,
        _ => String::new(),
    };
    Ok([
        case.id.to_string(),
        case.transaction_type.as_str().to_string(),
        case.input.clone(),
        case.expected_intent.clone(),
        case.category.clone(),
        case.context.clone().unwrap_or_default(),
        expected_output,
    ])
}

pub fn export_csv(cases: &[&TestCase]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS)?;
    for case in cases {
        writer.write_record(&export_row(case)?)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// `test_cases_<type|all>_<YYYY-MM-DD>.<ext>`
pub fn export_filename(
    filter_type: Option<TransactionType>,
    date: NaiveDate,
    format: ExportFormat,
) -> String {
    format!(
        "test_cases_{}_{}.{}",
        filter_type.map_or("all", |t| t.as_str()),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strip_ids(cases: &[TestCase]) -> Vec<TestCase> {
        cases
            .iter()
            .cloned()
            .map(|mut c| {
                c.id = 0;
                c
            })
            .collect()
    }

    #[test]
    fn test_parse_rows_handles_quotes_and_crlf() {
        let rows = parse_rows(
            "type,input\r\nexpense,\"tea, snacks\"\r\nother,\"say \"\"hi\"\"\"\r\n\r\n",
        );
        assert_eq!(
            rows,
            vec![
                vec!["type".to_string(), "input".to_string()],
                vec!["expense".to_string(), "tea, snacks".to_string()],
                vec!["other".to_string(), "say \"hi\"".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_keeps_newlines_inside_quotes() {
        let rows = parse_rows("a,b\n\"line1\nline2\",x");
        assert_eq!(rows[1][0], "line1\nline2");
        assert_eq!(rows[1][1], "x");
    }

    #[test]
    fn test_parse_rows_skips_blank_rows() {
        let rows = parse_rows("a,b\n,\n  , \nc,d\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["c".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_import_applies_defaults() {
        let mut suite = TestSuite::new();
        let csv = "Type,INPUT,category,expectedOutput\n,Spent 50 on chai,,\npayment_in,Got 200 from Amit,hinglish,{\"amount\":200}\n";
        let summary = import_csv(&mut suite, csv).unwrap();

        assert_eq!(summary.imported, 2);
        let first = &suite.cases()[0];
        assert_eq!(first.transaction_type, TransactionType::Expense);
        assert_eq!(first.expected_intent, "expense");
        assert_eq!(first.category, "custom");
        assert!(first.expected_output.is_none());

        let second = &suite.cases()[1];
        assert_eq!(second.transaction_type, TransactionType::PaymentIn);
        assert_eq!(second.expected_output, Some(json!({"amount": 200})));
    }

    #[test]
    fn test_import_ids_continue_after_existing() {
        let mut suite = TestSuite::from_cases(vec![TestCase::new(
            12,
            TransactionType::Expense,
            "existing",
            "basic",
        )]);
        import_csv(&mut suite, "type,input\nexpense,a\nexpense,b\n").unwrap();
        import_csv(&mut suite, "type,input\nexpense,c\n").unwrap();

        let ids: Vec<u32> = suite.cases().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![12, 13, 14, 15]);
    }

    #[test]
    fn test_import_rejects_missing_headers() {
        let mut suite = TestSuite::new();
        let err = import_csv(&mut suite, "foo,bar\n1,2\n").unwrap_err();
        assert_eq!(
            err,
            ImportError::MissingColumns(vec!["type".to_string(), "input".to_string()])
        );
        assert!(suite.is_empty());
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_import_rejects_header_only_file() {
        let mut suite = TestSuite::new();
        assert_eq!(
            import_csv(&mut suite, "type,input\n\n").unwrap_err(),
            ImportError::NoDataRows
        );
        assert_eq!(import_csv(&mut suite, "").unwrap_err(), ImportError::NoDataRows);
    }

    #[test]
    fn test_import_rejects_all_blank_inputs() {
        let mut suite = TestSuite::new();
        let err = import_csv(&mut suite, "type,input,category\nexpense,,basic\nother,  ,x\n")
            .unwrap_err();
        assert_eq!(err, ImportError::NoValidRows);
        assert!(suite.is_empty());
    }

    #[test]
    fn test_invalid_expected_output_degrades_to_none() {
        let csv = "type,input,expectedOutput\nexpense,tea,{not json\nexpense,coffee,null\n";
        let (cases, _) = parse_cases(csv, 1).unwrap();
        assert!(cases[0].expected_output.is_none());
        assert!(cases[1].expected_output.is_none());
    }

    #[test]
    fn test_unknown_type_imports_as_other() {
        let (cases, _) = parse_cases("type,input\npurchase,bought stock\n", 1).unwrap();
        assert_eq!(cases[0].transaction_type, TransactionType::Other);
    }

    #[test]
    fn test_export_quotes_special_values() {
        let case = TestCase::new(1, TransactionType::Expense, "He said, \"hi\"\nbye", "basic");
        let csv = export_csv(&[&case]).unwrap();
        assert!(csv.starts_with("id,type,input,expectedIntent,category,context,expectedOutput"));
        assert!(csv.contains("\"He said, \"\"hi\"\"\nbye\""));
    }

    #[test]
    fn test_quoted_field_survives_round_trip() {
        let tricky = "He said, \"hi\"\nbye";
        let case = TestCase::new(1, TransactionType::Other, tricky, "basic").with_context(tricky);
        let csv = export_csv(&[&case]).unwrap();
        let (parsed, _) = parse_cases(&csv, 1).unwrap();

        assert_eq!(parsed[0].input, tricky);
        assert_eq!(parsed[0].context.as_deref(), Some(tricky));
    }

    #[test]
    fn test_export_import_round_trip() {
        let originals = vec![
            TestCase::new(
                4,
                TransactionType::SaleInvoice,
                "Invoice Sharma ji 10 bags cement",
                "basic",
            )
            .with_expected_output(json!({"party": "Sharma ji", "items": [{"qty": 10}]})),
            TestCase::new(9, TransactionType::PaymentOut, "Paid 500, cash", "hinglish")
                .with_context("follow-up to previous invoice"),
            TestCase {
                expected_intent: "custom_intent".to_string(),
                ..TestCase::new(11, TransactionType::Other, "  leading spaces kept", "custom")
            },
        ];
        let refs: Vec<&TestCase> = originals.iter().collect();
        let csv = export_csv(&refs).unwrap();

        let mut suite = TestSuite::new();
        import_csv(&mut suite, &csv).unwrap();
        assert_eq!(strip_ids(suite.cases()), strip_ids(&originals));
    }

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            export_filename(Some(TransactionType::PaymentIn), date, ExportFormat::Csv),
            "test_cases_payment_in_2024-03-09.csv"
        );
        assert_eq!(
            export_filename(None, date, ExportFormat::Xlsx),
            "test_cases_all_2024-03-09.xlsx"
        );
    }
}
