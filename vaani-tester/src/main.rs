use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use vaani_tester::playground::{self, RunStatus};
use vaani_tester::report::{self, RunReport};
use vaani_tester::runner::{
    ConsoleEventListener, HttpExtractionClient, TestSuiteRunner, TimingStats,
};
use vaani_tester::suite::{
    self, generator, CaseFilter, ExportFormat, NewCase, TestSuite, TransactionType,
};
use vaani_tester::utils::Config;

#[derive(Parser)]
#[command(name = "vaani-tester")]
#[command(version = "0.1.0")]
#[command(about = "Test-case management and batch runner for the VAANI extraction API", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/vaani-tester/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suite file (defaults to <output_dir>/suite.json)
    #[arg(long, global = true)]
    suite: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the suite with the synthetic corpus
    Generate {
        /// Overwrite a non-empty suite
        #[arg(long, default_value = "false")]
        force: bool,
    },

    /// Add a single test case
    Add {
        /// Transaction type (expense, sale_invoice, payment_in, payment_out, other)
        #[arg(short = 't', long = "type")]
        transaction_type: TransactionType,

        /// Utterance sent to the extraction endpoint
        input: String,

        /// Expected output fragment as JSON (e.g. 500 or '{"amount": 500}')
        #[arg(short, long)]
        expected: Option<String>,

        /// Expected intent (defaults to the transaction type)
        #[arg(long)]
        intent: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        context: Option<String>,
    },

    /// Remove test cases by id
    Remove {
        /// Case ids (comma-separated)
        #[arg(value_delimiter = ',', required = true)]
        ids: Vec<u32>,

        /// Re-number the remaining cases to 1..N
        #[arg(long, default_value = "false")]
        renumber: bool,
    },

    /// Import test cases from a CSV file
    Import {
        /// Path to CSV file
        file: PathBuf,
    },

    /// Export test cases as CSV or XLSX
    Export {
        /// Output format (csv, xlsx)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        #[arg(short = 't', long = "type")]
        transaction_type: Option<TransactionType>,

        #[arg(short, long)]
        category: Option<String>,

        /// Output directory (defaults to output_dir from config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List test cases
    List {
        #[arg(short = 't', long = "type")]
        transaction_type: Option<TransactionType>,

        #[arg(short, long)]
        category: Option<String>,
    },

    /// Run test cases against the extraction endpoint
    Run {
        /// Model name (defaults to default_model from config)
        #[arg(short, long)]
        model: Option<String>,

        #[arg(short = 't', long = "type")]
        transaction_type: Option<TransactionType>,

        #[arg(short, long)]
        category: Option<String>,

        /// Run a random sample of N matching cases
        #[arg(long)]
        sample: Option<usize>,

        /// Run only these case ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print step timing statistics from a results file
    Stats {
        /// Path to results JSON
        results: PathBuf,
    },

    /// Generate report from test results
    Report {
        /// Path to test results JSON
        results: PathBuf,

        /// Output format (json, junit, html)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Send one utterance to several models and compare
    Playground {
        text: String,

        #[arg(short = 't', long = "type")]
        transaction_type: Option<TransactionType>,

        /// Models to compare (repeatable; defaults to playground_models from config)
        #[arg(short, long)]
        model: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level),
    );

    let config = Config::load(cli.config.as_deref())?;
    let suite_path = cli.suite.clone().unwrap_or_else(|| config.suite_path());

    match cli.command {
        Commands::Generate { force } => {
            let suite = TestSuite::load(&suite_path)?;
            if !suite.is_empty() && !force {
                anyhow::bail!(
                    "{} already holds {} test cases (use --force to replace them)",
                    suite_path.display(),
                    suite.len()
                );
            }

            let suite = TestSuite::from_cases(generator::build_corpus());
            suite.save(&suite_path)?;
            println!(
                "{} Generated {} test cases into {}",
                "✓".green().bold(),
                suite.len(),
                suite_path.display().to_string().cyan()
            );
        }

        Commands::Add {
            transaction_type,
            input,
            expected,
            intent,
            category,
            context,
        } => {
            let expected_output = expected
                .map(|raw| {
                    serde_json::from_str(&raw)
                        .with_context(|| format!("--expected is not valid JSON: {}", raw))
                })
                .transpose()?;

            let mut suite = TestSuite::load(&suite_path)?;
            let id = suite.add_case(NewCase {
                transaction_type,
                input,
                expected_intent: intent,
                expected_output,
                category,
                context,
            })?;
            suite.save(&suite_path)?;
            println!("{} Added test case #{}", "✓".green().bold(), id);
        }

        Commands::Remove { ids, renumber } => {
            let mut suite = TestSuite::load(&suite_path)?;
            for id in &ids {
                let removed = suite.remove(*id)?;
                println!("{} Removed #{} {}", "✓".green().bold(), id, removed.input.dimmed());
            }
            if renumber {
                suite.renumber();
                println!("  Re-numbered {} test cases", suite.len());
            }
            suite.save(&suite_path)?;
        }

        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mut suite = TestSuite::load(&suite_path)?;
            let summary = suite::import_csv(&mut suite, &content)?;
            suite.save(&suite_path)?;
            println!("{} {}", "✓".green().bold(), summary);
        }

        Commands::Export {
            format,
            transaction_type,
            category,
            output,
        } => {
            let suite = TestSuite::load(&suite_path)?;
            let filter = CaseFilter {
                transaction_type,
                category,
            };
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            let today = chrono::Local::now().date_naive();

            let path = suite::export_to_dir(&suite, &filter, format, &output_dir, today)?;
            println!(
                "{} Exported {} test cases to {}",
                "✓".green().bold(),
                suite.filter(&filter).len(),
                path.display().to_string().cyan()
            );
        }

        Commands::List {
            transaction_type,
            category,
        } => {
            let suite = TestSuite::load(&suite_path)?;
            let filter = CaseFilter {
                transaction_type,
                category,
            };
            let cases = suite.filter(&filter);
            for case in &cases {
                let expected = case
                    .expected_output
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>4}  {:<12} {:<10} {}  {}",
                    case.id,
                    case.transaction_type,
                    case.category,
                    case.input,
                    format!("→ {}", expected).dimmed()
                );
            }
            println!("\n{} of {} test cases", cases.len(), suite.len());
        }

        Commands::Run {
            model,
            transaction_type,
            category,
            sample,
            ids,
            output,
        } => {
            let suite = TestSuite::load(&suite_path)?;
            if suite.is_empty() {
                anyhow::bail!(
                    "No test cases in {} (run `vaani-tester generate` or `import` first)",
                    suite_path.display()
                );
            }

            let model = model.unwrap_or_else(|| config.default_model.clone());
            let client = HttpExtractionClient::new(&config.api_url, config.request_timeout())?;
            let mut runner = TestSuiteRunner::new(suite, Box::new(client), &model)
                .with_inter_case_delay(config.inter_case_delay());

            let filter = CaseFilter {
                transaction_type,
                category,
            };
            let ids = if !ids.is_empty() {
                ids
            } else if let Some(count) = sample {
                runner.sample_ids(&filter, count, &mut rand::thread_rng())
            } else {
                runner.suite().filter(&filter).iter().map(|c| c.id).collect()
            };

            println!("  Endpoint: {}", config.api_url.cyan());

            let token = runner.cancellation_token();
            ctrlc::set_handler(move || {
                println!("\n{} Stopping after the current case...", "⏹️ ".yellow());
                token.cancel();
            })?;

            let listener = tokio::spawn(ConsoleEventListener::listen(runner.subscribe()));
            let summary = runner.run_ids(ids).await;
            listener.await?;

            let report = RunReport::from_runner(&runner, &summary);
            print_stats_table(&report.stats);

            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            report::write_all(&report, &output_dir)?;

            if summary.failed + summary.errors > 0 {
                std::process::exit(1);
            }
        }

        Commands::Stats { results } => {
            let report = report::json::load(&results)?;
            println!(
                "{} {} results for {} ({}% passed)",
                "📊".to_string().blue(),
                report.results.len(),
                report.model.cyan(),
                report.pass_rate()
            );
            print_stats_table(&report.stats);
        }

        Commands::Report {
            results,
            format,
            output,
        } => {
            println!(
                "{} Generating {} report from: {}",
                "📊".to_string().blue(),
                format.cyan(),
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
        }

        Commands::Playground {
            text,
            transaction_type,
            model,
        } => {
            let models = if model.is_empty() {
                config.playground_models.clone()
            } else {
                model
            };
            let client = HttpExtractionClient::new(&config.api_url, config.request_timeout())?;

            let runs = playground::compare_models(&client, &text, transaction_type, &models).await?;
            for run in runs {
                match run.status {
                    RunStatus::Success => {
                        println!(
                            "\n{} {} ({}ms)",
                            "✓".green().bold(),
                            run.model.cyan(),
                            run.latency
                        );
                        if let Some(output) = &run.output {
                            println!("{}", serde_json::to_string_pretty(output)?);
                        }
                    }
                    RunStatus::Error => {
                        println!(
                            "\n{} {} ({}ms)",
                            "✗".red().bold(),
                            run.model.cyan(),
                            run.latency
                        );
                        println!("  {}", run.error.unwrap_or_default().red());
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_stats_table(stats: &[TimingStats]) {
    if stats.is_empty() {
        println!("\n  No timings recorded");
        return;
    }

    println!(
        "\n  {:<22} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Step",
        "Count",
        "Min",
        "Avg",
        "Median",
        "P95",
        "Max"
    );
    for s in stats {
        println!(
            "  {:<22} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
            s.step.label(),
            s.count,
            s.min,
            s.avg,
            s.median,
            s.p95,
            s.max
        );
    }
}

