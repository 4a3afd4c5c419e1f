pub mod collection;
pub mod csv_io;
pub mod generator;
pub mod types;
pub mod xlsx;

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub use collection::{NewCase, TestSuite};
pub use csv_io::{import_csv, ExportFormat, ImportSummary};
pub use types::{CaseFilter, TestCase, TransactionType};

use crate::error::ExportError;

/// Export the filtered cases into `output_dir`, returning the written path
pub fn export_to_dir(
    suite: &TestSuite,
    filter: &CaseFilter,
    format: ExportFormat,
    output_dir: &Path,
    date: NaiveDate,
) -> Result<PathBuf, ExportError> {
    let cases = suite.filter(filter);
    let filename = csv_io::export_filename(filter.transaction_type, date, format);
    let path = output_dir.join(filename);

    std::fs::create_dir_all(output_dir)?;
    match format {
        ExportFormat::Csv => std::fs::write(&path, csv_io::export_csv(&cases)?)?,
        ExportFormat::Xlsx => std::fs::write(&path, xlsx::export_xlsx(&cases)?)?,
    }

    log::info!("Exported {} cases to {}", cases.len(), path.display());
    Ok(path)
}
