pub mod cancel;
pub mod client;
pub mod events;
pub mod executor;
pub mod extraction;
pub mod state;
pub mod stats;

pub use cancel::CancellationToken;
pub use client::{ExtractionClient, ExtractionReply, ExtractionRequest, HttpExtractionClient};
pub use events::{ConsoleEventListener, EventEmitter, TestEvent};
pub use executor::{matches_expected, BatchSummary, TestSuiteRunner};
pub use state::{PipelineStep, StepTiming, TestResult, TestStatus};
pub use stats::{compute_timing_stats, TimingStats};
