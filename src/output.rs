//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Inspect
//!
//! ```text
//! 001 photos/dawn.jpg
//!     Name: 1B2M2Y8AsgTpgAmY7PhCfg.jpeg
//!     Format: jpeg (image/jpeg), 800x600, 118.2 KiB
//!     MD5: d41d8cd98f00b204e9800998ecf8427e
//!     Animated: no
//! 002 notes.txt
//!     Error: Mime type "text/plain" is not supported
//!
//! Inspected 2 sources, 1 failed
//! ```
//!
//! ## Convert
//!
//! ```text
//! photos/dawn.jpg → out/Xk1s0pQ3mVb2_yA8cE9fLg.webp
//!     jpeg 800x600 → webp 400x300
//!     118.2 KiB → 40.0 KiB
//! ```
//!
//! ## Hash
//!
//! ```text
//! photos/dawn.jpg
//!     dct: 8f3c0e1a00c07f01
//!     sha256: 9f86d081884c7d65...
//!     crc32: unknown algorithm
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects. `--json` output serializes
//! [`InspectResult`] directly.

use crate::format::ImageFormat;
use crate::record::{ImageData, ImageRecord};
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte count in binary units.
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ============================================================================
// Inspect
// ============================================================================

/// Serializable summary of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub name: String,
    pub full_name: String,
    pub format: ImageFormat,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub size: u64,
    pub md5: String,
    pub animated: bool,
    /// File path for file-backed records, `None` for inline ones.
    pub path: Option<String>,
}

impl RecordReport {
    pub fn new(record: &ImageRecord, animated: bool) -> Self {
        Self {
            name: record.name().to_string(),
            full_name: record.full_name(),
            format: record.format(),
            mime_type: record.mime_type(),
            width: record.width(),
            height: record.height(),
            size: record.size(),
            md5: record.md5_hex(),
            animated,
            path: match record.data() {
                ImageData::File(path) => Some(path.display().to_string()),
                ImageData::Inline(_) => None,
            },
        }
    }
}

/// Outcome of inspecting one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InspectResult {
    pub fn ok(source: impl Into<String>, report: RecordReport) -> Self {
        Self {
            source: source.into(),
            record: Some(report),
            error: None,
        }
    }

    pub fn failed(source: impl Into<String>, error: impl ToString) -> Self {
        Self {
            source: source.into(),
            record: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Shorten data URLs so a multi-megabyte payload doesn't flood the terminal.
fn display_source(source: &str) -> String {
    const MAX: usize = 60;
    if source.len() > MAX && source.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
        let cut = (0..=MAX).rev().find(|i| source.is_char_boundary(*i)).unwrap_or(0);
        format!("{}... ({} chars)", &source[..cut], source.len())
    } else {
        source.to_string()
    }
}

pub fn format_inspect_output(results: &[InspectResult]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, result) in results.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            display_source(&result.source)
        ));
        if let Some(report) = &result.record {
            lines.push(format!("{}Name: {}", indent(1), report.full_name));
            lines.push(format!(
                "{}Format: {} ({}), {}x{}, {}",
                indent(1),
                report.format,
                report.mime_type,
                report.width,
                report.height,
                format_size(report.size)
            ));
            lines.push(format!("{}MD5: {}", indent(1), report.md5));
            lines.push(format!("{}Animated: {}", indent(1), yes_no(report.animated)));
        }
        if let Some(error) = &result.error {
            lines.push(format!("{}Error: {}", indent(1), error));
        }
    }

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    lines.push(String::new());
    lines.push(match failed {
        0 => format!("Inspected {} sources", results.len()),
        n => format!("Inspected {} sources, {} failed", results.len(), n),
    });
    lines
}

pub fn print_inspect_output(results: &[InspectResult]) {
    for line in format_inspect_output(results) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert
// ============================================================================

pub fn format_convert_output(source: &str, original: &ImageRecord, saved: &ImageRecord) -> Vec<String> {
    let target = saved
        .file_path()
        .map_or_else(|| saved.full_name(), |p| p.display().to_string());
    let mut lines = vec![format!("{} → {}", display_source(source), target)];
    if original.md5() == saved.md5() {
        lines.push(format!("{}unchanged", indent(1)));
    } else {
        lines.push(format!(
            "{}{} {}x{} → {} {}x{}",
            indent(1),
            original.format(),
            original.width(),
            original.height(),
            saved.format(),
            saved.width(),
            saved.height()
        ));
    }
    lines.push(format!(
        "{}{} → {}",
        indent(1),
        format_size(original.size()),
        format_size(saved.size())
    ));
    lines
}

pub fn print_convert_output(source: &str, original: &ImageRecord, saved: &ImageRecord) {
    for line in format_convert_output(source, original, saved) {
        println!("{}", line);
    }
}

// ============================================================================
// Hash
// ============================================================================

pub fn format_hash_output(source: &str, hashes: &[(String, Option<Vec<u8>>)]) -> Vec<String> {
    let mut lines = vec![display_source(source)];
    for (name, hash) in hashes {
        match hash {
            Some(bytes) => lines.push(format!("{}{}: {}", indent(1), name, hex::encode(bytes))),
            None => lines.push(format!("{}{}: unknown algorithm", indent(1), name)),
        }
    }
    lines
}

pub fn print_hash_output(source: &str, hashes: &[(String, Option<Vec<u8>>)]) {
    for line in format_hash_output(source, hashes) {
        println!("{}", line);
    }
}
