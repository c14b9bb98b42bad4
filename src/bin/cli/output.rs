//! Output formatting for CLI operations.

use hexlay::{Line, OffsetValues, SaveResult};
use serde_json::json;

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats rows of a hex dump
    fn format_dump(&self, name: &str, lines: &[Line]) -> String;

    /// Formats typed values at an offset
    fn format_inspect(&self, values: &OffsetValues) -> String;

    /// Formats search matches
    fn format_matches(&self, pattern: &str, matches: &[(u64, u64)]) -> String;

    /// Formats the result of saving edits
    fn format_save(&self, name: &str, edits_requested: usize, result: &SaveResult) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl OutputFormatter for HumanFormatter {
    fn format_dump(&self, name: &str, lines: &[Line]) -> String {
        let mut output = format!("{}\n", name);
        let width = lines.iter().map(|l| l.bytes.len()).max().unwrap_or(0);

        for line in lines {
            output.push_str(&format!(
                "{:08X}  {:<hex_width$}  |{}|\n",
                line.offset,
                line.render_hex(),
                line.render_text('.'),
                hex_width = width * 3,
            ));
        }
        output
    }

    fn format_inspect(&self, values: &OffsetValues) -> String {
        let rows = [
            ("i8", opt(values.i8)),
            ("u8", opt(values.u8)),
            ("i16", opt(values.i16)),
            ("u16", opt(values.u16)),
            ("i32", opt(values.i32)),
            ("u32", opt(values.u32)),
            ("i64", opt(values.i64)),
            ("u64", opt(values.u64)),
            ("f32", opt(values.f32)),
            ("f64", opt(values.f64)),
        ];

        let mut output = format!(
            "Offset {:#x} ({:?} endian, {} bytes available)\n",
            values.offset, values.endian, values.available
        );
        output.push_str(&"-".repeat(40));
        output.push('\n');
        for (name, value) in rows {
            output.push_str(&format!("{:>4}  {}\n", name, value));
        }
        output
    }

    fn format_matches(&self, pattern: &str, matches: &[(u64, u64)]) -> String {
        let mut output = String::new();
        for (start, end) in matches {
            output.push_str(&format!("{:#010x}..={:#010x}\n", start, end));
        }
        output.push_str(&format!("{} matches for {}\n", matches.len(), pattern));
        output
    }

    fn format_save(&self, name: &str, edits_requested: usize, result: &SaveResult) -> String {
        let mut output = format!(
            "Saved {} of {} edits to {}\n",
            result.edits_applied, edits_requested, name
        );
        output.push_str(&format!(
            "  {} chunks written, {} skipped, {} bytes in {:.2?}\n",
            result.chunks_written, result.chunks_skipped, result.bytes_written, result.duration
        ));
        if result.edits_remaining > 0 {
            output.push_str(&format!(
                "  {} edits past the end of the file were not written\n",
                result.edits_remaining
            ));
        }
        output
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_dump(&self, name: &str, lines: &[Line]) -> String {
        let rows: Vec<_> = lines
            .iter()
            .map(|l| {
                json!({
                    "offset": l.offset,
                    "bytes": l.bytes,
                    "text": l.render_text('.'),
                })
            })
            .collect();
        let obj = json!({ "file": name, "lines": rows });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_inspect(&self, values: &OffsetValues) -> String {
        let obj = json!({
            "offset": values.offset,
            "endian": format!("{:?}", values.endian).to_lowercase(),
            "available": values.available,
            "i8": values.i8,
            "u8": values.u8,
            "i16": values.i16,
            "u16": values.u16,
            "i32": values.i32,
            "u32": values.u32,
            "i64": values.i64,
            "u64": values.u64,
            "f32": values.f32,
            "f64": values.f64,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_matches(&self, pattern: &str, matches: &[(u64, u64)]) -> String {
        let obj = json!({
            "pattern": pattern,
            "count": matches.len(),
            "matches": matches.iter().map(|(s, e)| json!({"start": s, "end": e})).collect::<Vec<_>>(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_save(&self, name: &str, edits_requested: usize, result: &SaveResult) -> String {
        let obj = json!({
            "file": name,
            "edits_requested": edits_requested,
            "edits_applied": result.edits_applied,
            "edits_remaining": result.edits_remaining,
            "chunks_written": result.chunks_written,
            "chunks_skipped": result.chunks_skipped,
            "bytes_written": result.bytes_written,
            "duration_ms": result.duration.as_millis() as u64,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}
