use super::executor::BatchSummary;
use super::state::TestStatus;
use tokio::sync::broadcast;

/// Runner events for real-time updates
#[derive(Debug, Clone)]
pub enum TestEvent {
    BatchStarted {
        total: usize,
        model: String,
    },
    BatchFinished {
        summary: BatchSummary,
    },
    BatchCancelled {
        executed: usize,
        total: usize,
    },

    CaseStarted {
        id: u32,
        position: usize,
        total: usize,
        input: String,
    },
    CaseFinished {
        id: u32,
        status: TestStatus,
        latency: u64,
        error: Option<String>,
    },

    Log {
        message: String,
    },
}

/// Event emitter for broadcasting runner events
pub struct EventEmitter {
    sender: broadcast::Sender<TestEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<TestEvent>) {
        let (sender, receiver) = broadcast::channel(256);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: TestEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TestEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }
}

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Console event listener for printing real-time updates
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    /// Render one batch. Returns after `BatchFinished` or when the channel closes.
    pub async fn listen(mut receiver: broadcast::Receiver<TestEvent>) {
        use colored::Colorize;
        use std::io::IsTerminal;

        let mut progress: Option<ProgressBar> = None;

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Console listener lagged, {} events dropped", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event {
                TestEvent::BatchStarted { total, model } => {
                    println!(
                        "\n{} Running {} test cases against {}",
                        "▶".green().bold(),
                        total,
                        model.cyan()
                    );

                    let pb = ProgressBar::new(total as u64);
                    if !std::io::stdout().is_terminal() {
                        // Piped output: no escape codes
                        pb.set_draw_target(ProgressDrawTarget::hidden());
                    }
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("  {spinner} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                    {
                        pb.set_style(style.progress_chars("=> "));
                    }
                    progress = Some(pb);
                }

                TestEvent::CaseStarted { id, input, .. } => {
                    if let Some(pb) = &progress {
                        let mut preview: String = input.chars().take(40).collect();
                        if input.chars().count() > 40 {
                            preview.push('…');
                        }
                        pb.set_message(format!("#{} {}", id, preview.dimmed()));
                    }
                }

                TestEvent::CaseFinished {
                    id,
                    status,
                    latency,
                    error,
                } => {
                    let line = match status {
                        TestStatus::Passed => {
                            format!("  {} #{} ({}ms)", "✓".green(), id, latency)
                        }
                        TestStatus::Failed => format!(
                            "  {} #{} ({}ms) {}",
                            "✗".red(),
                            id,
                            latency,
                            "output did not contain expected value".dimmed()
                        ),
                        TestStatus::Error => format!(
                            "  {} #{} ({}ms) {}",
                            "!".yellow().bold(),
                            id,
                            latency,
                            error.unwrap_or_default().red()
                        ),
                        TestStatus::Running => continue,
                    };

                    match &progress {
                        Some(pb) => {
                            pb.println(line);
                            pb.inc(1);
                        }
                        None => println!("{}", line),
                    }
                }

                TestEvent::BatchCancelled { executed, total } => {
                    if let Some(pb) = &progress {
                        pb.abandon_with_message("cancelled");
                    }
                    println!(
                        "\n{} Batch cancelled after {}/{} cases",
                        "■".yellow().bold(),
                        executed,
                        total
                    );
                }

                TestEvent::BatchFinished { summary } => {
                    if let Some(pb) = progress.take() {
                        pb.finish_and_clear();
                    }
                    println!("\n{} Batch finished", "■".blue().bold());
                    println!(
                        "  {} passed, {} failed, {} errors ({} of {} executed)",
                        summary.passed.to_string().green(),
                        summary.failed.to_string().red(),
                        summary.errors.to_string().yellow(),
                        summary.executed,
                        summary.total
                    );
                    println!("  Duration: {}ms", summary.duration_ms);
                    break;
                }

                TestEvent::Log { message } => match &progress {
                    Some(pb) => pb.println(format!("    {}", message)),
                    None => println!("    {}", message),
                },
            }
        }
    }
}
