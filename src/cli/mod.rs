//! # CLI Module
//!
//! Command-line interface for the thumbnail mender.
//!
//! ## Usage
//! ```bash
//! # Scan the library and print the categorized report
//! thumb-mend scan http://localhost:8188/api/thumbnails
//!
//! # Full workflow: scan, review, rebuild, summary
//! thumb-mend rebuild http://localhost:8188/api/thumbnails --sizes small,medium
//!
//! # Custom strategy: only relink, skip generation
//! thumb-mend rebuild http://localhost:8188/api/thumbnails \
//!     --strategy custom --fix-broken-links --link-orphans
//!
//! # JSON output for scripting
//! thumb-mend scan http://localhost:8188/api/thumbnails --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::thread;
use thumbnail_mender::core::report::{RebuildSummary, ScanReport, ThumbSize};
use thumbnail_mender::core::strategy::{CustomToggles, Strategy};
use thumbnail_mender::core::task::HttpTransport;
use thumbnail_mender::core::workflow::{Workflow, WorkflowState};
use thumbnail_mender::core::EngineConfig;
use thumbnail_mender::error::Result;
use thumbnail_mender::events::{
    Event, EventChannel, RebuildEvent, ScanEvent, WorkflowEvent,
};

/// Thumbnail Mender - repair your library's thumbnails without fear
#[derive(Parser, Debug)]
#[command(name = "thumb-mend")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan the library and print the categorized report
    Scan {
        /// Base URL of the maintenance API, e.g. http://host:8188/api/thumbnails
        server: String,

        /// Thumbnail sizes to examine
        #[arg(short, long, value_delimiter = ',', default_value = "small,medium,large,xlarge")]
        sizes: Vec<SizeArg>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Run the full workflow: scan, review, rebuild, summary
    Rebuild {
        /// Base URL of the maintenance API
        server: String,

        /// Thumbnail sizes to examine and rebuild
        #[arg(short, long, value_delimiter = ',', default_value = "small,medium,large,xlarge")]
        sizes: Vec<SizeArg>,

        /// Repair strategy
        #[arg(long, default_value = "auto")]
        strategy: StrategyArg,

        /// Custom strategy: repair records pointing at missing files
        #[arg(long)]
        fix_broken_links: bool,

        /// Custom strategy: adopt orphan files with a resolvable parent
        #[arg(long)]
        link_orphans: bool,

        /// Custom strategy: generate thumbnails that never existed
        #[arg(long)]
        generate_missing: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output (lists per-item rebuild failures)
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SizeArg {
    Small,
    Medium,
    Large,
    Xlarge,
}

impl From<SizeArg> for ThumbSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::Small => ThumbSize::Small,
            SizeArg::Medium => ThumbSize::Medium,
            SizeArg::Large => ThumbSize::Large,
            SizeArg::Xlarge => ThumbSize::Xlarge,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Fix everything that is safe to fix (never deletes)
    Auto,
    /// Take each operation from its explicit flag
    Custom,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub async fn run() -> Result<()> {
    thumbnail_mender::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            server,
            sizes,
            output,
            verbose,
        } => run_scan(&server, to_sizes(&sizes), output, verbose).await,
        Commands::Rebuild {
            server,
            sizes,
            strategy,
            fix_broken_links,
            link_orphans,
            generate_missing,
            yes,
            output,
            verbose,
        } => {
            let strategy = match strategy {
                StrategyArg::Auto => Strategy::Auto,
                StrategyArg::Custom => Strategy::Custom(CustomToggles {
                    fix_broken_links,
                    link_orphans,
                    generate_missing,
                }),
            };
            run_rebuild(&server, to_sizes(&sizes), strategy, yes, output, verbose).await
        }
    }
}

fn to_sizes(args: &[SizeArg]) -> Vec<ThumbSize> {
    args.iter().copied().map(ThumbSize::from).collect()
}

fn build_workflow(server: &str) -> Result<(Workflow, thumbnail_mender::events::EventReceiver)> {
    let transport = Arc::new(HttpTransport::new(server)?);
    let (sender, receiver) = EventChannel::new();
    let workflow = Workflow::new(transport, EngineConfig::default(), sender);
    Ok((workflow, receiver))
}

/// Forward Ctrl-C to the workflow's cancel flag; the poll loop turns it
/// into a best-effort server cancel.
fn arm_ctrl_c(workflow: &Workflow) {
    let cancel = workflow.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.set();
        }
    });
}

async fn run_scan(
    server: &str,
    sizes: Vec<ThumbSize>,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let (mut workflow, receiver) = build_workflow(server)?;
    arm_ctrl_c(&workflow);
    let render = spawn_renderer(receiver, output, verbose);

    let outcome = workflow.open(sizes).await;
    let report = workflow.report().cloned();

    // Dropping the workflow drops its event sender, which ends the
    // renderer's iterator
    drop(workflow);
    render.join().ok();

    match outcome {
        Ok(WorkflowState::Options) => {
            let report = report.expect("options state holds a report");
            match output {
                OutputFormat::Pretty => print_report(&term, &report),
                OutputFormat::Json => print_json(&report),
            }
            Ok(())
        }
        Ok(_) => {
            term.write_line(&format!("{} Scan cancelled", style("✗").yellow()))
                .ok();
            Ok(())
        }
        Err(error) => {
            term.write_line(&format!("{} {}", style("✗").red().bold(), error))
                .ok();
            Err(error)
        }
    }
}

async fn run_rebuild(
    server: &str,
    sizes: Vec<ThumbSize>,
    strategy: Strategy,
    yes: bool,
    output: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term, output);

    let (mut workflow, receiver) = build_workflow(server)?;
    arm_ctrl_c(&workflow);
    let render = spawn_renderer(receiver, output, verbose);

    let outcome = drive_rebuild(&term, &mut workflow, sizes, strategy, yes).await;
    let summary = workflow.summary().cloned();

    drop(workflow);
    render.join().ok();

    match outcome {
        Ok(true) => {
            let summary = summary.expect("summary state holds statistics");
            match output {
                OutputFormat::Pretty => print_summary(&term, &summary, verbose),
                OutputFormat::Json => print_json(&summary),
            }
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(error) => {
            term.write_line(&format!("{} {}", style("✗").red().bold(), error))
                .ok();
            Err(error)
        }
    }
}

/// The workflow steps proper; answers false when the operator backed out
/// (cancelled scan, declined prompt, clean library).
async fn drive_rebuild(
    term: &Term,
    workflow: &mut Workflow,
    sizes: Vec<ThumbSize>,
    strategy: Strategy,
    yes: bool,
) -> Result<bool> {
    let state = workflow.open(sizes.clone()).await?;
    if state != WorkflowState::Options {
        term.write_line(&format!("{} Scan cancelled", style("✗").yellow()))
            .ok();
        return Ok(false);
    }

    {
        let report = workflow.report().expect("options state holds a report");
        print_report(term, report);

        if report.repairable_total() == 0 {
            term.write_line(&format!(
                "  {} Nothing to rebuild!",
                style("🎉").green()
            ))
            .ok();
            workflow.close();
            return Ok(false);
        }

        if !yes && !confirm(term, report.repairable_total()) {
            term.write_line("Rebuild declined; closing.").ok();
            workflow.close();
            return Ok(false);
        }
    }

    workflow.start_rebuild(&strategy, &sizes).await?;
    Ok(true)
}

fn confirm(term: &Term, repairable: u64) -> bool {
    term.write_line(&format!(
        "Run the rebuild for {} operations? [y/N]",
        style(repairable).cyan()
    ))
    .ok();
    matches!(
        term.read_line().ok().as_deref().map(str::trim),
        Some("y") | Some("Y") | Some("yes")
    )
}

fn print_header(term: &Term, output: OutputFormat) {
    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Thumbnail Mender").bold().cyan(),
            style("v0.1.0").dim()
        ))
        .ok();
        term.write_line("").ok();
    }
}

/// Render workflow events on a separate thread: a percentage bar whose
/// message tracks the current scan phase or rebuild operation.
fn spawn_renderer(
    receiver: thumbnail_mender::events::EventReceiver,
    output: OutputFormat,
    verbose: bool,
) -> thread::JoinHandle<()> {
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else { continue };
            match event {
                Event::Scan(ScanEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_position(p.percentage.clamp(0.0, 100.0) as u64);
                    if verbose {
                        if let Some(message) = p.message {
                            pb.set_message(message);
                        }
                    }
                }
                Event::Scan(ScanEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                Event::Rebuild(RebuildEvent::Started { .. }) => {
                    pb.reset();
                    pb.set_message("Rebuilding");
                }
                Event::Rebuild(RebuildEvent::OperationChanged { operation }) => {
                    pb.set_message(operation.to_string());
                }
                Event::Rebuild(RebuildEvent::Progress(p)) => {
                    pb.set_position(p.percentage.clamp(0.0, 100.0) as u64);
                    if verbose {
                        if let Some(file) = p.current_file {
                            pb.set_message(file);
                        }
                    }
                }
                Event::Rebuild(RebuildEvent::Completed { .. })
                | Event::Rebuild(RebuildEvent::Cancelled { .. }) => {
                    pb.finish_and_clear();
                }
                Event::Workflow(WorkflowEvent::ErrorBanner { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    })
}

fn print_report(term: &Term, report: &ScanReport) {
    term.write_line("").ok();
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    let categories = &report.categories;
    term.write_line(&format!(
        "  {} valid thumbnails",
        style(categories.valid).green()
    ))
    .ok();
    term.write_line(&format!(
        "  {} broken links",
        style(categories.broken_links).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "  {} linkable orphans",
        style(categories.linkable_orphans).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "  {} missing thumbnails",
        style(categories.missing).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "  {} repairable operations total",
        style(report.repairable_total()).cyan().bold()
    ))
    .ok();

    let orphans = &report.true_orphans;
    if orphans.count > 0 {
        term.write_line(&format!(
            "  {} true orphans ({}) - left untouched, review manually",
            style(orphans.count).red(),
            format_bytes(orphans.size_bytes)
        ))
        .ok();
        for sample in &orphans.sample_files {
            term.write_line(&format!(
                "      {} ({})",
                style(&sample.path).dim(),
                format_bytes(sample.file_size)
            ))
            .ok();
        }
    }

    if report.estimated_time_seconds > 0.0 {
        term.write_line(&format!(
            "  estimated rebuild time ~{:.0}s",
            report.estimated_time_seconds
        ))
        .ok();
    }
    term.write_line("").ok();
}

fn print_summary(term: &Term, summary: &RebuildSummary, verbose: bool) {
    term.write_line("").ok();
    let headline = match (summary.was_cancelled, summary.has_failures()) {
        (true, _) => format!(
            "{} Rebuild Cancelled (partial results below)",
            style("✓").yellow().bold()
        ),
        (false, true) => format!(
            "{} Rebuild Complete, with failures",
            style("⚠").yellow().bold()
        ),
        (false, false) => format!("{} Rebuild Complete", style("✓").green().bold()),
    };
    term.write_line(&headline).ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} broken links fixed",
        style(summary.stats.fixed_links).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} orphans linked",
        style(summary.stats.linked_orphans).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} thumbnails generated",
        style(summary.stats.generated).cyan()
    ))
    .ok();
    if summary.stats.failed > 0 {
        term.write_line(&format!(
            "  {} operations failed",
            style(summary.stats.failed).red()
        ))
        .ok();
    }
    term.write_line(&format!(
        "  {} operations in {:.1}s",
        style(summary.completed).cyan(),
        summary.duration_seconds
    ))
    .ok();

    if summary.has_failures() {
        if verbose {
            term.write_line("").ok();
            term.write_line(&format!("{}", style("Failures:").bold().underlined()))
                .ok();
            for record in &summary.errors {
                let subject = record
                    .path
                    .as_deref()
                    .or(record.image_id.as_deref())
                    .unwrap_or("<unknown>");
                term.write_line(&format!(
                    "  {} {} - {}",
                    style(&record.operation).yellow(),
                    subject,
                    record.error
                ))
                .ok();
            }
        } else {
            term.write_line("  run with --verbose to list the failed items")
                .ok();
        }
    }
    term.write_line("").ok();
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize output: {e}"),
    }
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
