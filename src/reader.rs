//! Line-oriented reader feeding the shared output buffer

use std::io::{self, BufRead, BufReader, Read};

const NEWLINE: u8 = b'\n';

// ASCII whitespace as classified by `char::is_whitespace`
const ASCII_SPACE: [bool; 128] = {
    let mut table = [false; 128];
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table[0x0B] = true;
    table[0x0C] = true;
    table[b'\r' as usize] = true;
    table[b' ' as usize] = true;
    table
};

/// A line read from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Offset of the first byte of the line in the output buffer
    pub start: usize,
    /// Offset just past the last byte of the line (terminator included)
    pub end: usize,
    /// Offset just past the last non-whitespace byte
    pub trimmed_end: usize,
    /// Whether the stream ended before a line terminator was found
    pub at_eof: bool,
}

impl Line {
    /// Whether the line holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.trimmed_end == self.start
    }
}

/// Reads lines from a stream, appending every byte to an output buffer
///
/// The buffer keeps the raw bytes so the body can be sliced out of it later;
/// only the trimmed view of each line is used for delimiter comparisons.
pub struct LineReader<'b, R> {
    reader: BufReader<R>,
    output: &'b mut Vec<u8>,
}

impl<'b, R: Read> LineReader<'b, R> {
    /// Wrap `reader`, appending to `output` from its current length
    pub fn new(reader: R, output: &'b mut Vec<u8>) -> Self {
        Self {
            reader: BufReader::new(reader),
            output,
        }
    }

    /// Total bytes read so far
    pub fn position(&self) -> usize {
        self.output.len()
    }

    /// Read through the next newline (inclusive)
    ///
    /// A final unterminated chunk is still returned, flagged with `at_eof`.
    pub fn read_line(&mut self) -> io::Result<Line> {
        let start = self.output.len();
        self.reader.read_until(NEWLINE, self.output)?;
        let end = self.output.len();
        let at_eof = end == start || self.output[end - 1] != NEWLINE;
        let trimmed_end = start + trim_right_space(&self.output[start..end]).len();
        Ok(Line { start, end, trimmed_end, at_eof })
    }

    /// Trimmed text of a line previously returned by [`read_line`](Self::read_line)
    pub fn trimmed(&self, line: &Line) -> &[u8] {
        &self.output[line.start..line.trimmed_end]
    }

    /// Bytes read so far between two offsets
    pub fn slice(&self, start: usize, end: usize) -> &[u8] {
        &self.output[start..end]
    }

    /// Append everything left in the stream to the output buffer
    pub fn read_rest(&mut self) -> io::Result<usize> {
        self.reader.read_to_end(self.output)
    }
}

/// Trim trailing whitespace, Unicode included
///
/// ASCII bytes are checked against a lookup table; the first non-ASCII byte
/// hands the remaining prefix to [`trim_right_unicode`].
pub fn trim_right_space(s: &[u8]) -> &[u8] {
    let mut stop = s.len();
    while stop > 0 {
        let c = s[stop - 1];
        if !c.is_ascii() {
            return trim_right_unicode(&s[..stop]);
        }
        if !ASCII_SPACE[c as usize] {
            break;
        }
        stop -= 1;
    }
    &s[..stop]
}

/// Trim trailing Unicode whitespace, decoding characters backwards
///
/// Invalid UTF-8 at the tail is treated as non-whitespace.
pub fn trim_right_unicode(s: &[u8]) -> &[u8] {
    let mut stop = s.len();
    while let Some((c, len)) = last_char(&s[..stop]) {
        if !c.is_whitespace() {
            break;
        }
        stop -= len;
    }
    &s[..stop]
}

/// Decode the last UTF-8 character of `s` and its encoded length
fn last_char(s: &[u8]) -> Option<(char, usize)> {
    for len in 1..=s.len().min(4) {
        if let Ok(text) = std::str::from_utf8(&s[s.len() - len..]) {
            let mut chars = text.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Some((c, len)),
                _ => None,
            };
        }
    }
    None
}
