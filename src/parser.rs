//! Front matter extraction

use crate::error::{Error, Result};
use crate::format::{default_formats, Format};
use crate::reader::LineReader;
use std::io::Read;
use tracing::{debug, trace};

/// Initial capacity of the output buffer when none is supplied
const DEFAULT_CAPACITY: usize = 4096;

/// Extracts front matter using an ordered list of formats
///
/// Formats are tried top to bottom against the first non-blank line of the
/// input; the first exact match wins.
#[derive(Debug, Clone)]
pub struct Parser<T> {
    formats: Vec<Format<T>>,
}

impl<T: serde::de::DeserializeOwned + 'static> Parser<T> {
    /// Create a parser using the built-in formats
    pub fn new() -> Self {
        Self::with_formats(default_formats())
    }
}

impl<T: serde::de::DeserializeOwned + 'static> Default for Parser<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Parser<T> {
    /// Create a parser trying `formats` in order
    ///
    /// With no formats nothing is ever detected.
    pub fn with_formats(formats: Vec<Format<T>>) -> Self {
        Self { formats }
    }

    /// Registered formats, in detection order
    pub fn formats(&self) -> &[Format<T>] {
        &self.formats
    }

    /// Decode the front matter of `reader` into `target` and return the body
    ///
    /// Without front matter the whole input is returned and `target` is left
    /// unchanged.
    pub fn parse<R: Read>(&self, reader: R, target: &mut T) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(DEFAULT_CAPACITY);
        let end = self.run(&mut output, reader, target, false)?;
        output.drain(..end);
        Ok(output)
    }

    /// Same as [`parse`](Self::parse), reading into a caller-owned buffer
    ///
    /// The buffer is cleared first; its capacity is reused and the returned
    /// body borrows from it.
    pub fn parse_with_buffer<'b, R: Read>(
        &self,
        buf: &'b mut Vec<u8>,
        reader: R,
        target: &mut T,
    ) -> Result<&'b [u8]> {
        buf.clear();
        let end = self.run(buf, reader, target, false)?;
        Ok(&buf[end..])
    }

    /// Same as [`parse`](Self::parse), but missing front matter is an error
    pub fn must_parse<R: Read>(&self, reader: R, target: &mut T) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(DEFAULT_CAPACITY);
        let end = self.run(&mut output, reader, target, true)?;
        output.drain(..end);
        Ok(output)
    }

    /// Same as [`parse_with_buffer`](Self::parse_with_buffer), but missing
    /// front matter is an error
    pub fn must_parse_with_buffer<'b, R: Read>(
        &self,
        buf: &'b mut Vec<u8>,
        reader: R,
        target: &mut T,
    ) -> Result<&'b [u8]> {
        buf.clear();
        let end = self.run(buf, reader, target, true)?;
        Ok(&buf[end..])
    }

    /// Run one extraction and return the offset of the body in `output`
    fn run<R: Read>(&self, output: &mut Vec<u8>, reader: R, target: &mut T, must: bool) -> Result<usize> {
        let base = output.len();
        let mut extraction = Extraction::new(LineReader::new(reader, output));

        let found = match extraction.detect_start(&self.formats)? {
            Some(format) => extraction.extract(format, target)?,
            None => false,
        };
        if must && !found {
            return Err(Error::NotFound);
        }

        extraction.lines.read_rest()?;
        Ok(if found { extraction.end } else { base })
    }
}

/// Per-call extraction state
struct Extraction<'b, R> {
    lines: LineReader<'b, R>,
    /// First byte of the payload
    start: usize,
    /// First byte of the body
    end: usize,
}

impl<'b, R: Read> Extraction<'b, R> {
    fn new(lines: LineReader<'b, R>) -> Self {
        let start = lines.position();
        Self { lines, start, end: start }
    }

    /// Match the first non-blank line against the opening delimiters
    ///
    /// Only that line is considered; a mismatch ends detection for good.
    fn detect_start<'f, T>(&mut self, formats: &'f [Format<T>]) -> Result<Option<&'f Format<T>>> {
        loop {
            let line = self.lines.read_line()?;
            if line.at_eof {
                debug!("input ended before any content line");
                return Ok(None);
            }
            if line.is_blank() {
                continue;
            }

            let text = self.lines.trimmed(&line);
            let format = formats.iter().find(|f| f.start.as_bytes() == text);
            match format {
                Some(format) => {
                    self.start = if format.unmarshal_delims { line.start } else { line.end };
                    debug!(start = %format.start, offset = self.start, "front matter start detected");
                }
                None => {
                    debug!(line = %String::from_utf8_lossy(text), "first content line opens no front matter");
                }
            }
            return Ok(format);
        }
    }

    /// Scan for the closing delimiter and decode the payload
    ///
    /// Returns `false` when the stream ends before a closing line is found.
    fn extract<T>(&mut self, format: &Format<T>, target: &mut T) -> Result<bool> {
        let end = format.end.as_bytes();
        let mut line = self.lines.read_line()?;

        loop {
            if self.lines.trimmed(&line) != end {
                if line.at_eof {
                    debug!(end = %format.end, "closing delimiter not found");
                    return Ok(false);
                }
                line = self.lines.read_line()?;
                continue;
            }

            let mut payload_end = if format.unmarshal_delims { line.end } else { line.start };
            if format.requires_new_line {
                let next = self.lines.read_line()?;
                if !next.is_blank() {
                    trace!(offset = line.start, "closing delimiter not followed by a blank line");
                    line = next;
                    continue;
                }
                if format.unmarshal_delims {
                    payload_end = next.end;
                }
            }

            format
                .unmarshal(self.lines.slice(self.start, payload_end), target)
                .map_err(Error::Decode)?;

            self.end = self.lines.position();
            debug!(
                payload_len = payload_end - self.start,
                body_offset = self.end,
                "front matter extracted"
            );
            return Ok(true);
        }
    }
}
