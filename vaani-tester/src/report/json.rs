use super::types::RunReport;
use anyhow::{Context, Result};
use std::path::Path;

/// Generate JSON report
pub fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(path) = output {
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

/// Load a report written by [`generate`]
pub fn load(path: &Path) -> Result<RunReport> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid results file {}", path.display()))
}
