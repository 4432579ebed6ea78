//! Defines the [`File`] record and the [`Files`] collection that every
//! [`crate::pipeline::Step`] mutates in place.

use serde_yaml::Value;
use std::collections::BTreeMap;

/// The metadata fields of a [`File`], keyed by field name. Parsed from the
/// file's YAML front matter and extended by pipeline steps.
pub type Metadata = BTreeMap<String, Value>;

/// The file collection for one build, keyed by the file's relative output
/// path (`/`-separated, no leading slash). Steps may remove keys (the file is
/// dropped from the output) or insert new ones (e.g., permalink rewriting
/// moves `posts/hello.html` to `blog/hello/index.html`).
pub type Files = BTreeMap<String, File>;

/// A single file flowing through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct File {
    /// The path the file was read from, relative to the source directory.
    /// Unlike the file's key, this never changes during a build, so it is
    /// used to refer to files across permalink rewrites.
    pub source: String,

    /// The raw contents of the file (less any front matter). Replaced by
    /// rendered HTML during the markdown and templating steps.
    pub contents: Vec<u8>,

    /// The file's metadata fields.
    pub metadata: Metadata,
}

impl File {
    /// Constructs a new [`File`] with the given source path and contents and
    /// no metadata.
    pub fn new(source: impl Into<String>, contents: impl Into<Vec<u8>>) -> File {
        File {
            source: source.into(),
            contents: contents.into(),
            metadata: Metadata::new(),
        }
    }

    /// Builder-style helper which sets a metadata field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> File {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    /// Returns the metadata field `key` if it is present and holds a string.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Returns the contents as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.contents)
    }
}
