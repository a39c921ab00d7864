//! Split raw log text into per-cycle spans using textual markers.
//!
//! Lines are matched by substring. Rules, applied per line:
//! - outside a span, a line containing the opening marker starts a span (and is kept);
//! - inside, a line containing the closing marker ends the span. If that line also
//!   contains the opening marker it starts the next span instead of ending this one;
//! - a bare-newline closing marker only matches an empty line;
//! - inside, a line containing the end marker closes the span with that line and stops;
//! - a span still open at end of input is dropped unless it was end-closed, since the
//!   log may still be mid-write.

use std::path::Path;

use super::ChunkMarkers;
use crate::Result;

/// Chunk lines that still carry their terminators (as yielded by `split_inclusive('\n')`).
#[must_use]
pub fn chunk_lines<'a, I>(lines: I, markers: &ChunkMarkers) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(issue) = markers.check() {
        tracing::warn!(
            target = "simlog::chunk",
            issue = %issue,
            "degenerate chunk markers; no records will be produced"
        );
        return Vec::new();
    }

    let opening = markers.opening.as_str();
    let closing = markers.closing.as_str();
    let end = markers.end.as_deref();
    let newline_closing = closing == "\n";

    let mut spans = Vec::new();
    let mut buffer = String::new();
    let mut inside = false;

    for line in lines {
        if !inside {
            if line.contains(opening) {
                inside = true;
                buffer.push_str(line);
            }
            continue;
        }

        let closes = line.contains(closing) && (!newline_closing || is_bare_line(line));
        if closes {
            if line.contains(opening) {
                spans.push(std::mem::take(&mut buffer));
                buffer.push_str(line);
            } else {
                buffer.push_str(line);
                spans.push(std::mem::take(&mut buffer));
                inside = false;
            }
            continue;
        }

        if end.is_some_and(|end| line.contains(end)) {
            buffer.push_str(line);
            spans.push(std::mem::take(&mut buffer));
            return spans;
        }

        buffer.push_str(line);
    }

    if inside && !buffer.is_empty() {
        tracing::debug!(
            target = "simlog::chunk",
            bytes = buffer.len(),
            "dropping incomplete trailing record"
        );
    }
    spans
}

/// Chunk a whole text buffer.
#[must_use]
pub fn chunk_text(text: &str, markers: &ChunkMarkers) -> Vec<String> {
    chunk_lines(text.split_inclusive('\n'), markers)
}

/// Read a log file and chunk it. Invalid UTF-8 is replaced rather than rejected.
pub fn chunk_file(path: &Path, markers: &ChunkMarkers) -> Result<Vec<String>> {
    let bytes = fs_err::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let spans = chunk_text(&text, markers);
    tracing::debug!(
        target = "simlog::chunk",
        file = %path.display(),
        spans = spans.len(),
        "chunked log file"
    );
    Ok(spans)
}

fn is_bare_line(line: &str) -> bool {
    line == "\n" || line == "\r\n"
}
