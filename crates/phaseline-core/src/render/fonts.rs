//! Locating a system font for chart text.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{FontStyle, register_font};
use tracing::{debug, warn};

const FONT_DIRS: [&str; 6] = [
    "/usr/share/fonts",
    "/usr/local/share/fonts",
    "/System/Library/Fonts",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
    "/usr/X11R6/lib/X11/fonts",
];

/// Sans-serif faces tried before falling back to any font file.
const PREFERRED: [&str; 6] = [
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "NotoSans-Regular.ttf",
    "Arial.ttf",
    "arial.ttf",
    "FreeSans.ttf",
];

const MAX_DEPTH: usize = 4;

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register a system font as the chart's sans-serif face, once per process.
/// Returns the font file in use, or `None` when text will be omitted.
pub fn ensure_registered() -> Option<&'static Path> {
    REGISTERED.get_or_init(register_system_font).as_deref()
}

fn register_system_font() -> Option<PathBuf> {
    let Some(path) = find_font(FONT_DIRS.iter().map(Path::new)) else {
        warn!("no system font found, chart text will be omitted");
        return None;
    };
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read font file");
            return None;
        }
    };
    // Registered fonts live for the rest of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    match register_font("sans-serif", FontStyle::Normal, bytes) {
        Ok(()) => {
            debug!(path = %path.display(), "registered chart font");
            Some(path)
        }
        Err(_) => {
            warn!(path = %path.display(), "font file could not be parsed");
            None
        }
    }
}

/// Best font file under `roots`: the first well-known sans-serif face, or
/// else the first TrueType/OpenType file in path order.
pub fn find_font<'a>(roots: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    for root in roots {
        collect_fonts(root, MAX_DEPTH, &mut candidates);
    }
    candidates.sort();

    PREFERRED
        .iter()
        .find_map(|name| {
            candidates
                .iter()
                .find(|p| p.file_name().and_then(|f| f.to_str()) == Some(*name))
                .cloned()
        })
        .or_else(|| candidates.into_iter().next())
}

fn collect_fonts(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if depth > 0 {
                collect_fonts(&path, depth - 1, out);
            }
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
        {
            out.push(path);
        }
    }
}
