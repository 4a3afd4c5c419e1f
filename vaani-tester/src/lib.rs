pub mod error;
pub mod playground;
pub mod report;
pub mod runner;
pub mod suite;
pub mod utils;

// Re-export common items
pub use report::generate_report;
pub use runner::{HttpExtractionClient, TestSuiteRunner};
pub use suite::{TestCase, TestSuite, TransactionType};
pub use utils::Config;
