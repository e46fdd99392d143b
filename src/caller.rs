//! Best-effort lookup of the function that invoked a logging method.

use crate::trace::{self, Frame};
use once_cell::sync::Lazy;
use regex::Regex;

/// Reported when no caller can be determined.
pub const UNKNOWN_CALLER: &str = "unknown";

static HASH_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"::h[0-9a-f]{16}$").unwrap());
static CLOSURE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::(?:\{\{closure\}\}|\{closure#\d+\})$").unwrap());
/// Runtime and test-harness frames; never a caller worth reporting.
const RUNTIME_PREFIXES: &[&str] = &["std::", "core::", "alloc::", "test::", "__rust"];

static IDENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Captures the stack and names the first function outside the frames
/// starting with `internal_prefix`.
#[inline(never)]
pub fn current(internal_prefix: &str) -> String {
    let frames = trace::capture();
    match frames_to_skip(&frames, internal_prefix) {
        Some(skip) => resolve(&frames, skip),
        None => UNKNOWN_CALLER.to_string(),
    }
}

/// Number of innermost frames to skip: one past the outermost frame whose
/// symbol starts with `internal_prefix`. `None` when no such frame is
/// visible (e.g. everything got inlined).
pub fn frames_to_skip(frames: &[Frame], internal_prefix: &str) -> Option<usize> {
    frames
        .iter()
        .rposition(|f| f.symbol.starts_with(internal_prefix))
        .map(|idx| idx + 1)
}

/// Skips `skip` frames, then returns the first recognizable function name
/// scanning outward. Runtime frames are passed over, so an inlined caller
/// yields `"unknown"` rather than a std function.
pub fn resolve(frames: &[Frame], skip: usize) -> String {
    frames
        .iter()
        .skip(skip)
        .filter(|f| !is_runtime_frame(&f.symbol))
        .find_map(|f| function_name(&f.symbol))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_string())
}

fn is_runtime_frame(symbol: &str) -> bool {
    let symbol = symbol.trim_start_matches('<');
    RUNTIME_PREFIXES.iter().any(|prefix| symbol.starts_with(prefix))
}

/// Reduces a demangled symbol to the bare name of the function, dropping
/// the module path, hash, closure markers and generic arguments.
pub fn function_name(symbol: &str) -> Option<String> {
    let mut sym = HASH_SUFFIX_RE.replace(symbol.trim(), "").into_owned();
    loop {
        if let Some(m) = CLOSURE_SUFFIX_RE.find(&sym) {
            sym.truncate(m.start());
        } else if let Some(start) = turbofish_start(&sym) {
            sym.truncate(start);
        } else {
            break;
        }
    }

    let name = last_segment(&sym);
    IDENT_RE.is_match(name).then(|| name.to_string())
}

/// Byte offset of a trailing `::<...>` group, if the symbol ends with one.
fn turbofish_start(sym: &str) -> Option<usize> {
    if !sym.ends_with('>') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in sym.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return sym[..idx].strip_suffix("::").map(str::len);
                }
            }
            _ => {}
        }
    }
    None
}

/// Last `::` segment at bracket depth zero, so `<T as Trait>::call` gives `call`.
fn last_segment(sym: &str) -> &str {
    let bytes = sym.as_bytes();
    let mut depth = 0i32;
    let mut cut = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                cut = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    &sym[cut..]
}
