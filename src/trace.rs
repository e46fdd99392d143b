//! Stack capture for caller lookup and error stacks.
//!
//! `std::backtrace::Backtrace` does not expose its frames on stable, so the
//! rendered form is parsed back into a frame list, innermost first.

use once_cell::sync::Lazy;
use regex::Regex;
use std::backtrace::Backtrace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub symbol: String,
    pub location: Option<String>,
}

impl Frame {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            location: None,
        }
    }
}

static SYMBOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:\d+:\s+)?(\S.*?)\s*$").unwrap());
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+at\s+(.+?)\s*$").unwrap());

const CAPTURE_SYMBOL: &str = concat!(module_path!(), "::capture");

/// Captures the current stack regardless of `RUST_BACKTRACE`.
///
/// Leading frames of the capture machinery (std's and this function's own)
/// are dropped, so frame 0 is whoever called `capture`.
#[inline(never)]
pub fn capture() -> Vec<Frame> {
    let mut frames = parse(&Backtrace::force_capture().to_string());
    let machinery = frames
        .iter()
        .take_while(|f| f.symbol.starts_with("std::backtrace") || f.symbol == CAPTURE_SYMBOL)
        .count();
    frames.drain(..machinery);
    frames
}

/// Parses the rendered form of a `std::backtrace::Backtrace`.
///
/// Inlined frames show up as extra symbol lines without an index and are
/// kept as frames of their own. Unsupported or disabled captures yield an
/// empty list.
pub fn parse(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in rendered.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(caps) = LOCATION_RE.captures(line) {
            if let Some(last) = frames.last_mut() {
                if last.location.is_none() {
                    last.location = Some(caps[1].to_string());
                }
            }
            continue;
        }
        // "unsupported backtrace" / "disabled backtrace" and the like
        if !line.starts_with(' ') {
            continue;
        }
        if let Some(caps) = SYMBOL_RE.captures(line) {
            frames.push(Frame::new(&caps[1]));
        }
    }
    frames
}
