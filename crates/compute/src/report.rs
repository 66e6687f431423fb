//! Rendering of [`KernelReport`]s in the supported output formats.

use std::fmt::Write as _;

use affinity_core::OutputFormat;

use crate::bench::KernelReport;

pub const CSV_HEADER: &str = "schedule,chunksize,num_threads,loop,time";

/// Render `reports` in `format`. `csv_header` only affects CSV output.
pub fn render(
    reports: &[KernelReport],
    format: OutputFormat,
    csv_header: bool,
) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => serde_json::to_string_pretty(reports),
        OutputFormat::Csv => Ok(render_csv(reports, csv_header)),
    }
}

pub fn render_text(reports: &[KernelReport]) -> String {
    let mut out = String::new();
    for r in reports {
        let _ = writeln!(out, "Loop {} check: sum of output is {:.6}", r.loop_number, r.checksum);
        let _ = writeln!(
            out,
            "Total time for {} reps of loop {} = {:.6}",
            r.reps, r.loop_number, r.elapsed_secs
        );
        let _ = writeln!(
            out,
            "  schedule={} threads={} chunks={} steals={} avg_pass={:.6}s",
            r.scheduler,
            r.threads,
            r.metrics.chunks,
            r.metrics.steals,
            r.metrics.avg_pass_duration.as_secs_f64()
        );
        if let Some(reference) = r.reference_checksum {
            let _ = writeln!(out, "  static reference sum is {:.6}", reference);
        }
    }
    out
}

/// One row per report. The chunk size column is 0 when no chunk size applies.
pub fn render_csv(reports: &[KernelReport], header: bool) -> String {
    let mut out = String::new();
    if header {
        out.push_str(CSV_HEADER);
        out.push('\n');
    }
    for r in reports {
        let _ = writeln!(
            out,
            "{},{},{},{},{:.6}",
            r.schedule,
            r.chunk_size.unwrap_or(0),
            r.threads,
            r.loop_number,
            r.elapsed_secs
        );
    }
    out
}
