//! Front matter format descriptors and built-in presets

use std::fmt;
use std::sync::Arc;

// Built-in delimiters
pub const YAML_DELIM: &str = "---";
pub const TOML_DELIM: &str = "+++";
pub const JSON_DELIM: &str = ";;;";
pub const YAML_TAGGED_START: &str = "---yaml";
pub const TOML_TAGGED_START: &str = "---toml";
pub const JSON_TAGGED_START: &str = "---json";
pub const JSON_OBJECT_START: &str = "{";
pub const JSON_OBJECT_END: &str = "}";

/// Decodes a front matter payload into a target value
///
/// Implemented for every `Fn(&[u8], &mut T) -> anyhow::Result<()>`, so plain
/// functions and closures can be registered directly.
pub trait Unmarshal<T>: Send + Sync {
    /// Decode `data` into `target`
    fn unmarshal(&self, data: &[u8], target: &mut T) -> anyhow::Result<()>;
}

impl<T, F> Unmarshal<T> for F
where
    F: Fn(&[u8], &mut T) -> anyhow::Result<()> + Send + Sync,
{
    fn unmarshal(&self, data: &[u8], target: &mut T) -> anyhow::Result<()> {
        self(data, target)
    }
}

/// Describes how to recognize and decode one front matter flavor
pub struct Format<T> {
    /// Line opening the front matter
    pub start: String,
    /// Line closing the front matter
    pub end: String,
    /// Whether the delimiter lines are part of the decoded payload
    pub unmarshal_delims: bool,
    /// Whether the closing line must be followed by a blank line
    pub requires_new_line: bool,
    unmarshal: Arc<dyn Unmarshal<T>>,
}

impl<T> Format<T> {
    /// Create a format with both boundary flags unset
    pub fn new<F>(start: impl Into<String>, end: impl Into<String>, unmarshal: F) -> Self
    where
        F: Fn(&[u8], &mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_unmarshaler(start, end, unmarshal)
    }

    /// Create a format around any [`Unmarshal`] implementation
    pub fn from_unmarshaler(
        start: impl Into<String>,
        end: impl Into<String>,
        unmarshal: impl Unmarshal<T> + 'static,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            unmarshal_delims: false,
            requires_new_line: false,
            unmarshal: Arc::new(unmarshal),
        }
    }

    /// Include the delimiter lines in the payload handed to the decoder
    pub fn with_unmarshal_delims(mut self, unmarshal_delims: bool) -> Self {
        self.unmarshal_delims = unmarshal_delims;
        self
    }

    /// Require a blank line after the closing delimiter
    pub fn with_requires_new_line(mut self, requires_new_line: bool) -> Self {
        self.requires_new_line = requires_new_line;
        self
    }

    /// Decode a payload with this format's callback
    pub fn unmarshal(&self, data: &[u8], target: &mut T) -> anyhow::Result<()> {
        self.unmarshal.unmarshal(data, target)
    }
}

impl<T> Clone for Format<T> {
    fn clone(&self) -> Self {
        Self {
            start: self.start.clone(),
            end: self.end.clone(),
            unmarshal_delims: self.unmarshal_delims,
            requires_new_line: self.requires_new_line,
            unmarshal: Arc::clone(&self.unmarshal),
        }
    }
}

impl<T> fmt::Debug for Format<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Format")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("unmarshal_delims", &self.unmarshal_delims)
            .field("requires_new_line", &self.requires_new_line)
            .finish_non_exhaustive()
    }
}

/// Whether a payload holds nothing but whitespace
///
/// Empty documents leave the target untouched instead of failing.
#[allow(dead_code)]
fn is_blank(data: &[u8]) -> bool {
    data.iter().all(u8::is_ascii_whitespace)
}

#[cfg(feature = "yaml")]
fn unmarshal_yaml<T: serde::de::DeserializeOwned>(data: &[u8], target: &mut T) -> anyhow::Result<()> {
    if !is_blank(data) {
        *target = serde_yaml::from_slice(data)?;
    }
    Ok(())
}

#[cfg(feature = "toml")]
fn unmarshal_toml<T: serde::de::DeserializeOwned>(data: &[u8], target: &mut T) -> anyhow::Result<()> {
    if !is_blank(data) {
        let text = std::str::from_utf8(data)
            .map_err(|e| anyhow::anyhow!("TOML front matter is not valid UTF-8: {}", e))?;
        *target = toml::from_str(text)?;
    }
    Ok(())
}

#[cfg(feature = "json")]
fn unmarshal_json<T: serde::de::DeserializeOwned>(data: &[u8], target: &mut T) -> anyhow::Result<()> {
    if !is_blank(data) {
        *target = serde_json::from_slice(data)?;
    }
    Ok(())
}

/// YAML presets: `---`/`---` and `---yaml`/`---`
#[cfg(feature = "yaml")]
pub fn yaml_formats<T: serde::de::DeserializeOwned + 'static>() -> Vec<Format<T>> {
    vec![
        Format::new(YAML_DELIM, YAML_DELIM, unmarshal_yaml::<T>),
        Format::new(YAML_TAGGED_START, YAML_DELIM, unmarshal_yaml::<T>),
    ]
}

/// TOML presets: `+++`/`+++` and `---toml`/`---`
#[cfg(feature = "toml")]
pub fn toml_formats<T: serde::de::DeserializeOwned + 'static>() -> Vec<Format<T>> {
    vec![
        Format::new(TOML_DELIM, TOML_DELIM, unmarshal_toml::<T>),
        Format::new(TOML_TAGGED_START, YAML_DELIM, unmarshal_toml::<T>),
    ]
}

/// JSON presets: `;;;`/`;;;`, `---json`/`---`, and a bare object
///
/// The bare object form keeps its braces in the payload and must be followed
/// by a blank line.
#[cfg(feature = "json")]
pub fn json_formats<T: serde::de::DeserializeOwned + 'static>() -> Vec<Format<T>> {
    vec![
        Format::new(JSON_DELIM, JSON_DELIM, unmarshal_json::<T>),
        Format::new(JSON_TAGGED_START, YAML_DELIM, unmarshal_json::<T>),
        Format::new(JSON_OBJECT_START, JSON_OBJECT_END, unmarshal_json::<T>)
            .with_unmarshal_delims(true)
            .with_requires_new_line(true),
    ]
}

/// All presets enabled at compile time, in detection order
#[allow(unused_mut)]
pub fn default_formats<T: serde::de::DeserializeOwned + 'static>() -> Vec<Format<T>> {
    let mut formats = Vec::new();
    #[cfg(feature = "yaml")]
    formats.extend(yaml_formats::<T>());
    #[cfg(feature = "toml")]
    formats.extend(toml_formats::<T>());
    #[cfg(feature = "json")]
    formats.extend(json_formats::<T>());
    formats
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Meta {
        title: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    fn find<'a, T>(formats: &'a [Format<T>], start: &str) -> &'a Format<T> {
        formats.iter().find(|f| f.start == start).unwrap()
    }

    #[test]
    fn test_format_new_defaults() {
        let format = Format::<()>::new("<<", ">>", |_: &[u8], _: &mut ()| Ok(()));
        assert_eq!(format.start, "<<");
        assert_eq!(format.end, ">>");
        assert!(!format.unmarshal_delims);
        assert!(!format.requires_new_line);
    }

    #[test]
    fn test_format_builders() {
        let format = Format::<()>::new("<<", ">>", |_: &[u8], _: &mut ()| Ok(()))
            .with_unmarshal_delims(true)
            .with_requires_new_line(true);
        assert!(format.unmarshal_delims);
        assert!(format.requires_new_line);
    }

    #[test]
    fn test_closure_unmarshal() {
        let format = Format::new("<<", ">>", |data: &[u8], out: &mut Vec<u8>| {
            out.extend_from_slice(data);
            Ok(())
        });
        let mut out = Vec::new();
        format.unmarshal(b"abc", &mut out).unwrap();
        assert_eq!(out, b"abc");
    }

    struct LineCount;

    impl Unmarshal<usize> for LineCount {
        fn unmarshal(&self, data: &[u8], target: &mut usize) -> anyhow::Result<()> {
            *target = data.iter().filter(|&&b| b == b'\n').count();
            Ok(())
        }
    }

    #[test]
    fn test_from_unmarshaler() {
        let format = Format::from_unmarshaler("%%", "%%", LineCount).with_unmarshal_delims(true);
        let mut lines = 0;
        format.unmarshal(b"%%\na\nb\n%%\n", &mut lines).unwrap();
        assert_eq!(lines, 4);
        assert!(format.unmarshal_delims);
    }

    #[test]
    fn test_clone_shares_callback() {
        let format = Format::new("<<", ">>", |_: &[u8], out: &mut usize| {
            *out += 1;
            Ok(())
        });
        let cloned = format.clone();
        let mut count = 0;
        format.unmarshal(b"", &mut count).unwrap();
        cloned.unmarshal(b"", &mut count).unwrap();
        assert_eq!(count, 2);
        assert_eq!(cloned.start, format.start);
    }

    #[test]
    fn test_debug_omits_callback() {
        let format = Format::<()>::new("<<", ">>", |_: &[u8], _: &mut ()| Ok(()));
        let debug = format!("{:?}", format);
        assert!(debug.contains("start: \"<<\""));
        assert!(debug.contains(".."));
    }

    #[test]
    fn test_default_formats_order() {
        let formats = default_formats::<BTreeMap<String, String>>();
        let starts: Vec<&str> = formats.iter().map(|f| f.start.as_str()).collect();
        assert_eq!(starts, vec!["---", "---yaml", "+++", "---toml", ";;;", "---json", "{"]);
    }

    #[test]
    fn test_json_object_flags() {
        let formats = json_formats::<BTreeMap<String, String>>();
        let object = find(&formats, "{");
        assert_eq!(object.end, "}");
        assert!(object.unmarshal_delims);
        assert!(object.requires_new_line);

        let tagged = find(&formats, "---json");
        assert_eq!(tagged.end, "---");
        assert!(!tagged.unmarshal_delims);
    }

    #[test]
    fn test_yaml_unmarshal() {
        let formats = yaml_formats::<Meta>();
        let mut meta = Meta::default();
        formats[0].unmarshal(b"title: Hello\ntags: [a, b]\n", &mut meta).unwrap();
        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_toml_unmarshal() {
        let formats = toml_formats::<Meta>();
        let mut meta = Meta::default();
        formats[0].unmarshal(b"title = \"Hello\"\n", &mut meta).unwrap();
        assert_eq!(meta.title, "Hello");
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_toml_rejects_invalid_utf8() {
        let formats = toml_formats::<Meta>();
        let mut meta = Meta::default();
        let err = formats[0].unmarshal(&[0xFF, 0xFE], &mut meta).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_json_unmarshal() {
        let formats = json_formats::<Meta>();
        let mut meta = Meta::default();
        find(&formats, "{").unmarshal(b"{\"title\": \"Hello\"}\n", &mut meta).unwrap();
        assert_eq!(meta.title, "Hello");
    }

    #[test]
    fn test_blank_payload_leaves_target() {
        let mut meta = Meta { title: "kept".to_string(), tags: Vec::new() };
        for format in default_formats::<Meta>() {
            format.unmarshal(b"  \n\n", &mut meta).unwrap();
        }
        assert_eq!(meta.title, "kept");
    }

    #[test]
    fn test_yaml_error_propagates() {
        let formats = yaml_formats::<Meta>();
        let mut meta = Meta::default();
        assert!(formats[0].unmarshal(b"title: [unclosed\n", &mut meta).is_err());
    }
}
