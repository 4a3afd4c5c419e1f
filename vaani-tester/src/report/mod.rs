pub mod html;
pub mod json;
pub mod junit;
pub mod types;

pub use types::{CaseReport, RunReport};

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Generate report from a saved results file
pub fn generate_report(results_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let report = json::load(results_path)?;

    match format {
        "json" => json::generate(&report, output),
        "html" => html::generate(&report, output),
        "junit" => {
            let xml = junit::generate_junit_xml(&report)?;
            match output {
                Some(path) => {
                    std::fs::write(path, xml)?;
                    println!("JUnit report saved to: {}", path.display());
                }
                None => println!("{}", xml),
            }
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

/// Write `results.json`, `junit.xml` and `report.html` into `output_dir`.
/// Returns the path of the JSON results file.
pub fn write_all(report: &RunReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let results_path = output_dir.join("results.json");
    json::generate(report, Some(&results_path))?;
    junit::write_report(report, output_dir)?;
    html::generate(report, Some(&output_dir.join("report.html")))?;

    log::info!("Reports written to {}", output_dir.display());
    Ok(results_path)
}
