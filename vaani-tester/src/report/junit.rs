use super::types::{CaseReport, RunReport};
use crate::runner::state::TestStatus;
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate JUnit XML report string from a run report
pub fn generate_junit_xml(report: &RunReport) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = report.results.len().to_string();
    let failures = report.summary.failed.to_string();
    let errors = report.summary.errors.to_string();
    let skipped = report
        .summary
        .total
        .saturating_sub(report.summary.executed)
        .to_string();
    let time = seconds(report.summary.duration_ms);

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "vaani-tester-run"));
    suites_start.push_attribute(("tests", total_tests.as_str()));
    suites_start.push_attribute(("failures", failures.as_str()));
    suites_start.push_attribute(("errors", errors.as_str()));
    suites_start.push_attribute(("skipped", skipped.as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    // One <testsuite> per run, named after the model under test
    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", report.model.as_str()));
    suite_start.push_attribute(("tests", total_tests.as_str()));
    suite_start.push_attribute(("failures", failures.as_str()));
    suite_start.push_attribute(("errors", errors.as_str()));
    suite_start.push_attribute(("skipped", skipped.as_str()));
    suite_start.push_attribute(("id", report.session_id.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", report.generated_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for case in &report.results {
        write_test_case(&mut writer, case)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(writer: &mut Writer<W>, case: &CaseReport) -> Result<()> {
    let name = format!("#{} {}", case.id, case.input);
    let classname = format!("{}.{}", case.transaction_type, case.category);
    let time = seconds(case.result.latency);

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", name.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    match case.result.status {
        TestStatus::Failed => {
            let expected = case
                .expected_output
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_default();
            let message = format!("Response does not contain expected output {}", expected);
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", message.as_str()));
            fail_start.push_attribute(("type", "AssertionError"));
            writer.write_event(Event::Start(fail_start))?;
            if let Some(raw) = &case.result.raw_response {
                writer.write_event(Event::Text(BytesText::new(raw)))?;
            }
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        TestStatus::Error => {
            let message = case.result.error.as_deref().unwrap_or("Unknown error");
            let mut error_start = BytesStart::new("error");
            error_start.push_attribute(("message", message));
            error_start.push_attribute(("type", "RequestError"));
            writer.write_event(Event::Empty(error_start))?;
        }
        TestStatus::Passed | TestStatus::Running => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Write report to file
pub fn write_report(report: &RunReport, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(report)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}
