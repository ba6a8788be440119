//! # frontmatter
//!
//! Streaming detection and extraction of front matter blocks.
//!
//! A front matter is a delimited block of metadata at the top of a document:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! # Hello
//! ```
//!
//! The input is read line by line until the block is closed, the payload
//! between the delimiters is handed to a decode callback, and the rest of the
//! document is returned byte for byte.
//!
//! ## Built-in Formats
//!
//! Tried in this order (each family behind a default-on feature):
//! - **YAML** (`yaml`): `---` / `---`, `---yaml` / `---`
//! - **TOML** (`toml`): `+++` / `+++`, `---toml` / `---`
//! - **JSON** (`json`): `;;;` / `;;;`, `---json` / `---`, and a bare `{` ... `}`
//!   object followed by a blank line
//!
//! ## Detection Rules
//!
//! 1. Leading blank lines are skipped
//! 2. The first non-blank line must equal a format's opening line exactly
//!    (trailing whitespace ignored); otherwise there is no front matter
//! 3. The block ends at the first line equal to that format's closing line;
//!    with `requires_new_line` that line must also be followed by a blank line
//! 4. An unclosed block means no front matter; the input is returned as is
//!
//! Custom formats are registered through [`Parser::with_formats`].

pub mod error;
pub mod format;
pub mod parser;
pub mod reader;

pub use error::{Error, Result};
pub use format::{default_formats, Format, Unmarshal};
pub use parser::Parser;

#[cfg(feature = "json")]
pub use format::json_formats;
#[cfg(feature = "toml")]
pub use format::toml_formats;
#[cfg(feature = "yaml")]
pub use format::yaml_formats;

use serde::de::DeserializeOwned;
use std::io::Read;

/// Decode the front matter with the built-in formats and return the body
///
/// Without front matter the whole input is returned and `target` is left
/// unchanged.
pub fn parse<R, T>(reader: R, target: &mut T) -> Result<Vec<u8>>
where
    R: Read,
    T: DeserializeOwned + 'static,
{
    Parser::new().parse(reader, target)
}

/// Same as [`parse`], reading into a caller-owned buffer
pub fn parse_with_buffer<'b, R, T>(buf: &'b mut Vec<u8>, reader: R, target: &mut T) -> Result<&'b [u8]>
where
    R: Read,
    T: DeserializeOwned + 'static,
{
    Parser::new().parse_with_buffer(buf, reader, target)
}

/// Same as [`parse`], but reports [`Error::NotFound`] without front matter
pub fn must_parse<R, T>(reader: R, target: &mut T) -> Result<Vec<u8>>
where
    R: Read,
    T: DeserializeOwned + 'static,
{
    Parser::new().must_parse(reader, target)
}

/// Same as [`parse_with_buffer`], but reports [`Error::NotFound`] without
/// front matter
pub fn must_parse_with_buffer<'b, R, T>(buf: &'b mut Vec<u8>, reader: R, target: &mut T) -> Result<&'b [u8]>
where
    R: Read,
    T: DeserializeOwned + 'static,
{
    Parser::new().must_parse_with_buffer(buf, reader, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    type Meta = BTreeMap<String, String>;

    #[test]
    fn test_parse_defaults() {
        let mut meta = Meta::new();
        let body = parse(&b"+++\nkey = \"value\"\n+++\nbody\n"[..], &mut meta).unwrap();
        assert_eq!(meta.get("key").map(String::as_str), Some("value"));
        assert_eq!(body, b"body\n");
    }

    #[test]
    fn test_parse_without_front_matter() {
        let mut meta = Meta::new();
        let body = parse(&b"just text\n"[..], &mut meta).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, b"just text\n");
    }

    #[test]
    fn test_must_parse_not_found() {
        let mut meta = Meta::new();
        let err = must_parse(&b"just text\n"[..], &mut meta).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_with_buffer_variants() {
        let mut buf = Vec::with_capacity(64);
        let mut meta = Meta::new();

        let body = parse_with_buffer(&mut buf, &b"---\nkey: a\n---\nfirst body\n"[..], &mut meta).unwrap();
        assert_eq!(body, b"first body\n");

        let body = must_parse_with_buffer(&mut buf, &b";;;\n{\"key\": \"b\"}\n;;;\n2\n"[..], &mut meta).unwrap();
        assert_eq!(body, b"2\n");
        assert_eq!(meta.get("key").map(String::as_str), Some("b"));

        let err = must_parse_with_buffer(&mut buf, &b"no front matter"[..], &mut meta).unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }
}
