//! Line and column arithmetic over shader buffers.
//!
//! Line counts use `split('\n')` semantics so that prepending `k` lines of
//! `"...\n"` to a buffer always adds exactly `k` to its count.

/// Number of lines in `source` (an empty buffer still has one line)
pub fn line_count(source: &str) -> usize {
    source.split('\n').count()
}

/// Text of the 1-based `line`, without its terminator
pub fn line_text(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source
        .split('\n')
        .nth(line - 1)
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Byte offset where the 1-based `line` starts
pub fn line_start_offset(source: &str, line: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    if line == 1 {
        return Some(0);
    }
    source
        .match_indices('\n')
        .nth(line - 2)
        .map(|(idx, _)| idx + 1)
}

/// Convert byte offset to line and column number
///
/// # Returns
/// Tuple of (line, column) both 0-indexed, column counted in chars
pub fn byte_offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    let mut byte_pos = 0;

    for ch in source.chars() {
        if byte_pos >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        byte_pos += ch.len_utf8();
    }

    (line, col)
}

/// Convert line and column (0-indexed, column in chars) to byte offset
///
/// Returns `source.len()` when the position is out of bounds.
pub fn line_col_to_byte_offset(source: &str, target_line: usize, target_col: usize) -> usize {
    let mut line = 0;
    let mut col = 0;
    let mut byte_pos = 0;

    for ch in source.chars() {
        if line == target_line && col == target_col {
            return byte_pos;
        }
        if line == target_line && ch == '\n' {
            // column past end of line clamps to the line end
            return byte_pos;
        }

        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        byte_pos += ch.len_utf8();
    }

    source.len()
}
