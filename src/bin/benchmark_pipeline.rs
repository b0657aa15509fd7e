use std::fs;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <log_file>", args[0]);
        std::process::exit(1);
    }

    let content = fs::read_to_string(&args[1])?;
    let lines: Vec<&str> = content.lines().collect();

    println!("Benchmarking pipeline on {} lines ({} bytes)...", lines.len(), content.len());

    // Warmup
    for line in lines.iter().take(100) {
        let _ = logsift::parser::parse_line(line, 1);
    }

    let start = Instant::now();
    let parsed = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| logsift::parser::parse_line(line, i + 1))
        .count();
    let parse_time = start.elapsed();

    let start = Instant::now();
    let quick = logsift::parse(&content, false);
    let quick_time = start.elapsed();

    let start = Instant::now();
    let full = logsift::parse(&content, true);
    let full_time = start.elapsed();

    let anomalies = full.aggregations.anomalies.as_ref().map_or(0, Vec::len);

    println!("Results:");
    println!("  Line parsing: {:.3}s ({:.0} lines/s), {} records",
             parse_time.as_secs_f64(),
             lines.len() as f64 / parse_time.as_secs_f64(),
             parsed);
    println!("  Quick analysis: {:.3}s, format={}, records={}",
             quick_time.as_secs_f64(), quick.format, quick.total_logs);
    println!("  Full analysis: {:.3}s, records={}, anomalous records={}",
             full_time.as_secs_f64(), full.total_logs, anomalies);

    Ok(())
}
