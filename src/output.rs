//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Progress
//!
//! ```text
//! Processing 40 images
//! [ 1/40] trips/dawn.jpg
//! [ 2/40] trips/noon.jpg (eta 1m 12s)
//! [ 3/40] broken.jpg FAILED
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processed 39 images, 1 failed
//!     broken.jpg: metadata extraction failed: ...
//! Pruned 2 vanished, excluded 3 by tag
//! Index: 12 groups, 37 records
//! Done in 1m 48s
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `String` or `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.

use crate::build::BuildReport;
use crate::dispatch::ProgressEvent;
use std::time::Duration;

/// Format an elapsed/remaining duration compactly: sub-second as `ms`,
/// sub-minute as fractional seconds, otherwise `XmYYs`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if secs < 60.0 {
        format!("{secs:.1}s")
    } else {
        let whole = duration.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

/// Format one dispatcher progress event. `Started` with an empty batch
/// formats as a skip notice.
pub fn format_progress_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { total: 0 } => "Nothing to process".to_string(),
        ProgressEvent::Started { total } => format!("Processing {total} images"),
        ProgressEvent::Completed {
            done,
            total,
            file,
            ok,
            eta,
        } => {
            let width = total.to_string().len();
            let mut line = format!("[{done:>width$}/{total}] {file}");
            if !ok {
                line.push_str(" FAILED");
            }
            if let Some(eta) = eta {
                line.push_str(&format!(" (eta {})", format_duration(*eta)));
            }
            line
        }
    }
}

pub fn print_progress_event(event: &ProgressEvent) {
    println!("{}", format_progress_event(event));
}

/// Format the end-of-run summary. Contained job failures are listed
/// indented under the processed line.
pub fn format_summary(report: &BuildReport, elapsed: Duration) -> Vec<String> {
    let mut lines = Vec::new();

    if report.errors.is_empty() {
        lines.push(format!("Processed {} images", report.processed));
    } else {
        lines.push(format!(
            "Processed {} images, {} failed",
            report.processed,
            report.errors.len()
        ));
        for error in &report.errors {
            lines.push(format!("    {error}"));
        }
    }

    if report.pruned > 0 || report.excluded > 0 {
        lines.push(format!(
            "Pruned {} vanished, excluded {} by tag",
            report.pruned, report.excluded
        ));
    }
    lines.push(format!(
        "Index: {} groups, {} records",
        report.groups, report.records
    ));
    lines.push(format!("Done in {}", format_duration(elapsed)));
    lines
}

pub fn print_summary(report: &BuildReport, elapsed: Duration) {
    for line in format_summary(report, elapsed) {
        println!("{line}");
    }
}
