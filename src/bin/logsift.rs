use anyhow::Context;
use clap::Parser;
use logsift::chunking::{AnalysisTask, ProgressReport, Scheduler};
use logsift::AnalyzeOpts;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "logsift", version, about = "Structured summary of an arbitrary log file")]
struct Cli {
    /// Input file (`-` or absent for stdin)
    input: Option<String>,

    /// Full analysis: no sampling, no record cap, anomaly detection on
    #[arg(long = "full", default_value_t = false)]
    full: bool,

    /// Report chunk progress on stderr (default: only when stderr is a terminal)
    #[arg(long = "progress", default_value_t = false)]
    progress: bool,

    /// Single-line JSON instead of pretty-printed
    #[arg(long = "compact", default_value_t = false)]
    compact: bool,
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logsift=warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn read_input(input: Option<&str>) -> anyhow::Result<String> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("reading stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading {path}")),
    }
}

fn print_progress(report: &ProgressReport) {
    let p = &report.progress;
    let eta = match report.estimated_remaining {
        Some(d) => format!("{:.1}s", d.as_secs_f64()),
        None => "?".to_string(),
    };
    eprintln!(
        "[logsift] chunk {}/{} lines={}/{} records={} elapsed={:.1}s eta={}",
        p.chunks_processed,
        p.total_chunks,
        p.lines_processed,
        p.total_lines,
        p.records_retained,
        report.elapsed.as_secs_f64(),
        eta
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let text = read_input(cli.input.as_deref())?;
    let text = logsift::validate_input(&text)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let c = cancel.clone();
        let _ = ctrlc::set_handler(move || {
            c.store(true, Ordering::SeqCst);
        });
    }
    let scheduler = Scheduler::with_cancel_flag(cancel);

    let opts = AnalyzeOpts { full_analysis: cli.full };
    let mut task = AnalysisTask::new(text, opts);
    let show_progress = cli.progress || atty::is(atty::Stream::Stderr);
    let result = scheduler.run(&mut task, |report| {
        if show_progress {
            print_progress(report);
        }
    })?;

    if cli.compact {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}
