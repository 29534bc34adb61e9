//! Byte-offset to line/column translation and the error window.
//!
//! Both `\n` and `\r\n` line endings are understood; a `\r\n` pair counts
//! as a single line break (a lone `\r` also breaks).

/// A 1-based (line, column) source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// Translate a byte offset into a 1-based line and column.
///
/// Columns count characters, not bytes. Offsets past the end of the
/// source are clamped to just past the last character.
pub fn locate(src: &str, offset: usize) -> LineCol {
    let mut line = 1;
    let mut column = 1;
    let mut chars = src.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        if at >= offset {
            break;
        }
        match c {
            '\r' => {
                // Count the break at the `\n` of a `\r\n` pair.
                if chars.peek().is_some_and(|&(_, next)| next == '\n') {
                    continue;
                }
                line += 1;
                column = 1;
            }
            '\n' => {
                line += 1;
                column = 1;
            }
            _ => column += 1,
        }
    }
    LineCol { line, column }
}

/// Render the error window for a failure at `offset`: up to five source
/// lines preceding and including the failing line, then a marker line of
/// spaces up to the failing column and tildes to the end of the trimmed
/// failing line.
pub fn window(src: &str, offset: usize) -> String {
    let loc = locate(src, offset);
    let row = loc.line - 1;
    let col = loc.column - 1;

    let lines: Vec<&str> = split_lines(src);
    let mut out = String::new();
    let first = row.saturating_sub(5);
    for line in lines.iter().take(row + 1).skip(first) {
        out.push_str(line);
        out.push('\n');
    }

    let trimmed_len = lines
        .get(row)
        .map(|line| line.trim_end().chars().count())
        .unwrap_or(0);
    for _ in 0..col {
        out.push(' ');
    }
    for _ in col..trimmed_len {
        out.push('~');
    }
    out
}

/// Split into lines without terminators, treating `\r\n` as one break.
fn split_lines(src: &str) -> Vec<&str> {
    src.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}
