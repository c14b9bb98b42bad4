//! Command implementations for the CLI tool.

use std::path::Path;

use hexlay::{Config, Endian, Line, SearchQuery, Values, View};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::progress::SaveProgress;

/// Parses a decimal or `0x`-prefixed hexadecimal offset.
pub fn parse_offset(s: &str) -> Result<u64, String> {
    let s = s.trim().replace('_', "");
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid offset '{}': {}", s, e))
}

/// A single edit given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditArg {
    /// `OFFSET=HEX`: write the bytes starting at the offset.
    Bytes { start: u64, bytes: Vec<u8> },
    /// `START..END=HH`: fill the inclusive range with one byte.
    Fill { start: u64, end: u64, value: u8 },
}

impl EditArg {
    /// Number of offsets this edit touches.
    pub fn span(&self) -> u64 {
        match self {
            EditArg::Bytes { bytes, .. } => bytes.len() as u64,
            EditArg::Fill { start, end, .. } => start.abs_diff(*end) + 1,
        }
    }

    fn apply(&self, view: &mut View) -> hexlay::Result<()> {
        match self {
            EditArg::Bytes { bytes, .. } if bytes.is_empty() => Ok(()),
            EditArg::Bytes { start, bytes } => {
                let end = start
                    .checked_add(bytes.len() as u64 - 1)
                    .ok_or_else(|| hexlay::Error::invalid_offset(*start, "edit overflows u64"))?;
                view.edit_range(*start, end, Values::Sequence(bytes))
            }
            EditArg::Fill { start, end, value } => view.edit_range(*start, *end, *value),
        }
    }
}

/// Parses `OFFSET=HEX` or `START..END=HH`.
pub fn parse_edit(s: &str) -> Result<EditArg, String> {
    let (target, value) = s
        .split_once('=')
        .ok_or_else(|| format!("edit '{}' must look like OFFSET=HEX or START..END=HH", s))?;

    let bytes = hexlay::search::parse_hex_bytes(value).map_err(|e| e.to_string())?;

    match target.split_once("..") {
        Some((start, end)) => {
            let &[value] = bytes.as_slice() else {
                return Err(format!("range edit '{}' takes exactly one fill byte", s));
            };
            Ok(EditArg::Fill {
                start: parse_offset(start)?,
                end: parse_offset(end)?,
                value,
            })
        }
        None => Ok(EditArg::Bytes {
            start: parse_offset(target)?,
            bytes,
        }),
    }
}

fn open_view(path: &Path, config: Config) -> Result<View, ExitCode> {
    let mut view = View::new(path, config);
    match view.init() {
        Ok(()) => Ok(view),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(error_to_exit_code(&e))
        }
    }
}

fn fail(e: hexlay::Error) -> ExitCode {
    eprintln!("Error: {}", e);
    error_to_exit_code(&e)
}

/// Dump command implementation
pub fn dump(
    path: &Path,
    config: Config,
    offset: u64,
    length: usize,
    width: usize,
    format: OutputFormat,
) -> ExitCode {
    if width == 0 {
        eprintln!("Error: width must be greater than 0");
        return ExitCode::BadArgs;
    }
    let mut view = match open_view(path, config) {
        Ok(v) => v,
        Err(code) => return code,
    };

    view.set_position(offset);
    if let Err(e) = view.set_length(length).and_then(|()| view.load_view(false)) {
        return fail(e);
    }

    let loaded = view.window().map(|w| w.len()).unwrap_or(0);
    let lines: Vec<Line> = (0..loaded)
        .step_by(width)
        .filter_map(|start| view.line(start, width))
        .collect();

    let name = view.filename().unwrap_or("?").to_string();
    print!("{}", create_formatter(format).format_dump(&name, &lines));
    ExitCode::Success
}

/// Inspect command implementation
pub fn inspect(path: &Path, config: Config, offset: u64, format: OutputFormat) -> ExitCode {
    let endian = config.endian;
    let view = match open_view(path, config) {
        Ok(v) => v,
        Err(code) => return code,
    };

    match view.inspect(offset, endian) {
        Ok(values) if values.available == 0 => {
            eprintln!("Error: offset {:#x} is past the end of the file", offset);
            ExitCode::BadArgs
        }
        Ok(values) => {
            print!("{}", create_formatter(format).format_inspect(&values));
            ExitCode::Success
        }
        Err(e) => fail(e),
    }
}

/// Configuration for the search command.
pub struct SearchConfig<'a> {
    pub path: &'a Path,
    pub pattern: &'a str,
    pub hex: bool,
    pub ignore_case: bool,
    pub limit: Option<usize>,
    pub format: OutputFormat,
}

/// Search command implementation
pub fn search(search: &SearchConfig<'_>, config: Config) -> ExitCode {
    let query = if search.hex {
        match SearchQuery::parse_hex(search.pattern) {
            Ok(q) => q,
            Err(e) => return fail(e),
        }
    } else if search.ignore_case {
        SearchQuery::text_insensitive(search.pattern)
    } else {
        SearchQuery::text(search.pattern)
    };

    let view = match open_view(search.path, config) {
        Ok(v) => v,
        Err(code) => return code,
    };
    let matches = match view.search(&query) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };

    let found: hexlay::Result<Vec<(u64, u64)>> = match search.limit {
        Some(limit) => matches.take(limit).collect(),
        None => matches.collect(),
    };
    let found = match found {
        Ok(f) => f,
        Err(e) => return fail(e),
    };

    print!(
        "{}",
        create_formatter(search.format).format_matches(search.pattern, &found)
    );
    if found.is_empty() {
        ExitCode::NoMatch
    } else {
        ExitCode::Success
    }
}

/// Configuration for the edit command.
pub struct EditConfig<'a> {
    pub path: &'a Path,
    pub edits: &'a [EditArg],
    pub yes: bool,
    pub optimize: bool,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Edit command implementation
pub fn edit(edit: &EditConfig<'_>, config: Config) -> ExitCode {
    let mut view = match open_view(edit.path, config) {
        Ok(v) => v,
        Err(code) => return code,
    };

    for spec in edit.edits {
        if let Err(e) = spec.apply(&mut view) {
            return fail(e);
        }
    }
    let requested: u64 = edit.edits.iter().map(EditArg::span).sum();
    let name = view.filename().unwrap_or("?").to_string();

    if !edit.yes && !confirm_write(&name, requested) {
        eprintln!("Aborted, nothing was written");
        return ExitCode::Warning;
    }

    let size = match view.size() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let progress = SaveProgress::new(size, edit.quiet || edit.format == OutputFormat::Json);
    let bar = progress.bar();
    view.set_observer(progress);

    match view.save(edit.optimize) {
        Ok(result) => {
            print!(
                "{}",
                create_formatter(edit.format).format_save(&name, requested as usize, &result)
            );
            if result.edits_remaining > 0 {
                ExitCode::Warning
            } else {
                ExitCode::Success
            }
        }
        Err(e) => {
            bar.abandon_with_message("Failed");
            fail(e)
        }
    }
}

/// Asks before modifying the file.
fn confirm_write(name: &str, count: u64) -> bool {
    use dialoguer::{Confirm, theme::ColorfulTheme};

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Write {} byte edits to {}?", count, name))
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Builds the library configuration from global flags.
pub fn build_config(
    overlay: hexlay::OverlayKind,
    chunk_size: usize,
    endian: Endian,
    strict: bool,
) -> Config {
    let config = Config::new()
        .overlay(overlay)
        .max_chunk_size(chunk_size)
        .endian(endian)
        .strict_ranges(strict);
    // Keep the default window valid for small chunk sizes.
    let window = config.window_size.min(chunk_size.max(1));
    config.window_size(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("16").unwrap(), 16);
        assert_eq!(parse_offset("0x10").unwrap(), 16);
        assert_eq!(parse_offset("0X1_000").unwrap(), 0x1000);
        assert!(parse_offset("0xZZ").is_err());
        assert!(parse_offset("-1").is_err());
    }

    #[test]
    fn test_parse_edit_bytes() {
        assert_eq!(
            parse_edit("0x10=DEADBEEF").unwrap(),
            EditArg::Bytes {
                start: 0x10,
                bytes: vec![0xDE, 0xAD, 0xBE, 0xEF]
            }
        );
    }

    #[test]
    fn test_parse_edit_fill() {
        let spec = parse_edit("0x20..0x2F=00").unwrap();
        assert_eq!(
            spec,
            EditArg::Fill {
                start: 0x20,
                end: 0x2F,
                value: 0
            }
        );
        assert_eq!(spec.span(), 16);
        assert!(parse_edit("0..4=0102").is_err());
    }

    #[test]
    fn test_parse_edit_rejects() {
        assert!(parse_edit("10").is_err());
        assert!(parse_edit("10=").is_err());
        assert!(parse_edit("x=00").is_err());
    }

    #[test]
    fn test_build_config_small_chunk() {
        let config = build_config(hexlay::OverlayKind::Map, 16, Endian::Little, false);
        assert_eq!(config.window_size, 16);
        assert!(config.validate().is_ok());
    }
}
