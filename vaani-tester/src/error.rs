use thiserror::Error;

/// Reasons a CSV import contributes zero test cases.
#[derive(Debug, Error, PartialEq)]
pub enum ImportError {
    #[error("CSV must contain 'type' and 'input' columns (missing: {})", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("CSV file has no data rows")]
    NoDataRows,

    #[error("No valid test cases found: every row has a blank input")]
    NoValidRows,
}

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Test case input must not be empty")]
    BlankInput,

    #[error("Unknown test case id: {0}")]
    UnknownCase(u32),

    #[error("Unknown transaction type: {0}")]
    UnknownType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Transport-level failures talking to the extraction endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Zip write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
