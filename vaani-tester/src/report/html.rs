use super::types::RunReport;
use crate::runner::state::TestStatus;
use anyhow::Result;
use std::path::Path;

/// Generate HTML report
pub fn generate(report: &RunReport, output: Option<&Path>) -> Result<()> {
    let html = generate_html(report);

    if let Some(path) = output {
        std::fs::write(path, html)?;
        println!("HTML report saved to: {}", path.display());
    } else {
        println!("{}", html);
    }

    Ok(())
}

pub fn generate_html(report: &RunReport) -> String {
    let summary = &report.summary;
    let pass_rate = report.pass_rate();

    let mut cases_html = String::new();
    for case in &report.results {
        let (status_icon, status_class) = match case.result.status {
            TestStatus::Passed => ("✓", "passed"),
            TestStatus::Failed => ("✗", "failed"),
            TestStatus::Error => ("!", "error"),
            TestStatus::Running => ("⋯", "running"),
        };

        let expected = case
            .expected_output
            .as_ref()
            .map(|v| html_escape(&v.to_string()))
            .unwrap_or_else(|| "-".to_string());

        let detail = match (&case.result.error, &case.result.output) {
            (Some(error), _) => {
                format!(r#"<div class="error-message">{}</div>"#, html_escape(error))
            }
            (None, Some(output)) => format!(
                r#"<pre class="output">{}</pre>"#,
                html_escape(&output.to_string())
            ),
            (None, None) => String::new(),
        };

        cases_html.push_str(&format!(
            r#"
            <div class="case {status_class}">
                <div class="case-icon">{status_icon}</div>
                <div class="case-content">
                    <div class="case-name">#{id} {input}</div>
                    <div class="case-meta">
                        <span class="badge">{transaction_type}</span>
                        <span class="badge">{category}</span>
                        <span>expected: {expected}</span>
                        <span class="duration">{latency}</span>
                    </div>
                    {detail}
                </div>
            </div>
"#,
            id = case.id,
            input = html_escape(&case.input),
            transaction_type = case.transaction_type,
            category = html_escape(&case.category),
            latency = format_duration(case.result.latency),
        ));
    }

    let mut stats_rows = String::new();
    for stats in &report.stats {
        stats_rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            stats.step.label(),
            stats.count,
            stats.min,
            stats.avg,
            stats.median,
            stats.p95,
            stats.max
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Extraction Report - {model}</title>
    <style>
        :root {{
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 3rem 1rem;
        }}
        .container {{ max-width: 1100px; margin: 0 auto; }}
        h1 {{ font-size: 2rem; font-weight: 800; margin-bottom: 2rem; }}
        h2 {{ font-size: 1.25rem; margin: 2rem 0 1rem; }}
        .summary {{
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
            gap: 1rem;
        }}
        .stat {{
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 1.25rem;
            border-radius: 1rem;
        }}
        .stat-value {{ font-size: 2rem; font-weight: 800; }}
        .stat-label {{ color: var(--text-secondary); font-size: 0.8rem; text-transform: uppercase; }}
        .stat.passed .stat-value {{ color: var(--green); }}
        .stat.failed .stat-value {{ color: var(--red); }}
        .stat.error .stat-value {{ color: var(--yellow); }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 0.5rem; border-bottom: 1px solid var(--border); text-align: right; }}
        th:first-child, td:first-child {{ text-align: left; }}
        .case {{
            display: flex;
            gap: 1rem;
            padding: 0.75rem 1rem;
            border-radius: 0.75rem;
            background: var(--bg-secondary);
            margin-bottom: 0.5rem;
        }}
        .case-icon {{ width: 1.5rem; font-weight: 700; }}
        .case.passed .case-icon {{ color: var(--green); }}
        .case.failed .case-icon {{ color: var(--red); }}
        .case.error .case-icon {{ color: var(--yellow); }}
        .case-content {{ flex: 1; }}
        .case-meta {{ display: flex; gap: 1rem; color: var(--text-secondary); font-size: 0.8rem; }}
        .badge {{ padding: 0 0.5rem; border: 1px solid var(--border); border-radius: 9999px; }}
        .error-message {{ color: var(--red); font-size: 0.85rem; margin-top: 0.25rem; }}
        .output {{ font-size: 0.8rem; color: var(--text-secondary); white-space: pre-wrap; margin-top: 0.25rem; }}
        .meta {{ margin-top: 2rem; color: var(--text-secondary); font-size: 0.8rem; display: flex; gap: 2rem; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Extraction Report: {model}</h1>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{executed}/{total}</div>
                <div class="stat-label">Executed</div>
            </div>
            <div class="stat passed">
                <div class="stat-value">{passed}</div>
                <div class="stat-label">Passed</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{failed}</div>
                <div class="stat-label">Failed</div>
            </div>
            <div class="stat error">
                <div class="stat-value">{errors}</div>
                <div class="stat-label">Errors</div>
            </div>
            <div class="stat">
                <div class="stat-value">{pass_rate}%</div>
                <div class="stat-label">Pass Rate</div>
            </div>
        </div>

        <h2>Step Timings (ms)</h2>
        <table>
            <tr><th>Step</th><th>Count</th><th>Min</th><th>Avg</th><th>Median</th><th>P95</th><th>Max</th></tr>
            {stats_rows}
        </table>

        <h2>Cases</h2>
        {cases_html}

        <div class="meta">
            <span>Session: {session_id}</span>
            <span>Duration: {duration}</span>
            <span>Generated: {generated_at}</span>
        </div>
    </div>
</body>
</html>"#,
        model = html_escape(&report.model),
        executed = summary.executed,
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        errors = summary.errors,
        session_id = html_escape(&report.session_id),
        duration = format_duration(summary.duration_ms),
        generated_at = html_escape(&report.generated_at),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) as f64 / 1000.0;
        format!("{}m {:.0}s", minutes, seconds)
    }
}
