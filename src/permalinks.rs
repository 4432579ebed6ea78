//! Defines the [`Permalinks`] step, which moves HTML files to
//! `{path}/index.html` so they can be served from clean URLs, and records the
//! resulting `path` on each file.

use crate::file::{File, Files};
use crate::pipeline::{self, Site, Step};
use chrono::NaiveDate;
use serde_yaml::Value;
use std::fmt;
use tracing::{debug, warn};

const HTML_EXTENSION: &str = ".html";
const INDEX_FILE: &str = "index.html";

/// Rewrites the key of every `.html` file to `{path}/index.html` and sets its
/// `path` field.
///
/// Without a pattern, `path` is the key less its extension (`dir/name.html`
/// becomes `dir/name`, and `dir/index.html` stays `dir`). With a pattern such
/// as `/blog/:title`, each `:field` placeholder is replaced by the file's
/// metadata field: strings are slugified, `YYYY-MM-DD` dates become
/// `YYYY/MM/DD`. A file whose placeholder field is missing or null falls back
/// to the default path.
#[derive(Default)]
pub struct Permalinks {
    pattern: Option<Pattern>,
}

impl Permalinks {
    pub fn new() -> Permalinks {
        Permalinks::default()
    }

    /// Returns an error if `pattern` contains an empty placeholder.
    pub fn with_pattern(pattern: &str) -> Result<Permalinks> {
        Ok(Permalinks {
            pattern: Some(Pattern::parse(pattern)?),
        })
    }

    fn path_for(&self, key: &str, file: &File) -> String {
        let resolved = self.pattern.as_ref().and_then(|pattern| {
            let path = pattern.resolve(file);
            if path.is_none() {
                debug!(file = %key, "permalink field missing; using default path");
            }
            path
        });
        resolved.unwrap_or_else(|| default_path(key))
    }
}

impl Step for Permalinks {
    fn name(&self) -> &str {
        "permalinks"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> pipeline::Result<()> {
        let keys: Vec<String> = files
            .keys()
            .filter(|key| key.ends_with(HTML_EXTENSION))
            .cloned()
            .collect();

        for key in keys {
            if let Some(mut file) = files.remove(&key) {
                let path = self.path_for(&key, &file);
                let out = output_key(&path);
                file.metadata
                    .insert("path".to_owned(), Value::String(path));
                if let Some(replaced) = files.insert(out.clone(), file) {
                    warn!(
                        file = %out,
                        replaced = %replaced.source,
                        "permalink overwrote another file"
                    );
                }
            }
        }
        Ok(())
    }
}

// `dir/name.html` -> `dir/name`, `dir/index.html` -> `dir`, `index.html` -> ``
fn default_path(key: &str) -> String {
    let stem = key.trim_end_matches(HTML_EXTENSION);
    match stem.rsplit_once('/') {
        Some((dir, "index")) => dir.to_owned(),
        None if stem == "index" => String::new(),
        _ => stem.to_owned(),
    }
}

// The file key for a path: `{path}/index.html` without a leading slash.
fn output_key(path: &str) -> String {
    let path = path.trim_matches('/');
    match path.is_empty() {
        true => INDEX_FILE.to_owned(),
        false => format!("{}/{}", path, INDEX_FILE),
    }
}

#[derive(Debug, PartialEq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed permalink pattern: literal text interleaved with `:field`
/// placeholders. A placeholder name runs until the next character that isn't
/// alphanumeric or `_`.
#[derive(Debug, PartialEq)]
struct Pattern(Vec<Segment>);

impl Pattern {
    fn parse(pattern: &str) -> Result<Pattern> {
        let is_name = |c: char| c.is_alphanumeric() || c == '_';
        let mut segments = Vec::new();
        let mut rest = pattern;
        while let Some(i) = rest.find(':') {
            if i > 0 {
                segments.push(Segment::Literal(rest[..i].to_owned()));
            }
            let after = &rest[i + 1..];
            let len = after.find(|c: char| !is_name(c)).unwrap_or(after.len());
            if len == 0 {
                return Err(Error::EmptyPlaceholder(pattern.to_owned()));
            }
            segments.push(Segment::Field(after[..len].to_owned()));
            rest = &after[len..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_owned()));
        }
        Ok(Pattern(segments))
    }

    fn resolve(&self, file: &File) -> Option<String> {
        let mut out = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Field(name) => out.push_str(&field_text(file.metadata.get(name)?)?),
            }
        }
        Some(out)
    }
}

// Null has no text; everything else slugifies. Sequences join their elements
// with commas and mappings use their YAML form.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Some(date.format("%Y/%m/%d").to_string()),
            Err(_) => Some(slug::slugify(s)),
        },
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Sequence(items) => {
            let text: Vec<String> = items.iter().filter_map(field_text).collect();
            Some(slug::slugify(text.join(",")))
        }
        Value::Mapping(_) => serde_yaml::to_string(value).ok().map(slug::slugify),
        Value::Tagged(tagged) => field_text(&tagged.value),
    }
}

/// The result of constructing a permalink step.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an invalid permalink pattern.
#[derive(Debug)]
pub enum Error {
    /// Returned when a pattern has a `:` not followed by a field name.
    EmptyPlaceholder(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::EmptyPlaceholder(pattern) => {
                write!(f, "permalink pattern `{}` has an empty placeholder", pattern)
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;

    fn run(step: &Permalinks, files: Vec<(&str, File)>) -> pipeline::Result<Files> {
        let mut files: Files = files
            .into_iter()
            .map(|(k, f)| (k.to_owned(), f))
            .collect();
        step.apply(&mut files, &mut Site::default())?;
        Ok(files)
    }

    #[test]
    fn test_default_path() {
        assert_eq!("posts/hello", default_path("posts/hello.html"));
        assert_eq!("about", default_path("about/index.html"));
        assert_eq!("", default_path("index.html"));
    }

    #[test]
    fn test_default_pattern_moves_html_files() -> pipeline::Result<()> {
        let files = run(
            &Permalinks::new(),
            vec![
                ("posts/hello.html", File::new("posts/hello.md", "")),
                ("index.html", File::new("index.html", "")),
                ("style.css", File::new("style.css", "")),
            ],
        )?;
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(vec!["index.html", "posts/hello/index.html", "style.css"], keys);
        assert_eq!(
            Some("posts/hello"),
            files["posts/hello/index.html"].str_field("path")
        );
        assert_eq!(None, files["style.css"].str_field("path"));
        Ok(())
    }

    #[test]
    fn test_pattern_slugifies_title() -> pipeline::Result<()> {
        let files = run(
            &Permalinks::with_pattern("/blog/:title")?,
            vec![(
                "posts/hello.html",
                File::new("posts/hello.md", "").with("title", "Hello World"),
            )],
        )?;
        let file = &files["blog/hello-world/index.html"];
        assert_eq!(Some("/blog/hello-world"), file.str_field("path"));
        Ok(())
    }

    #[test]
    fn test_pattern_formats_dates() -> pipeline::Result<()> {
        let files = run(
            &Permalinks::with_pattern(":date/:title")?,
            vec![(
                "posts/a.html",
                File::new("posts/a.md", "")
                    .with("title", "A")
                    .with("date", "2020-01-02"),
            )],
        )?;
        assert!(files.contains_key("2020/01/02/a/index.html"));
        Ok(())
    }

    #[test]
    fn test_missing_or_null_field_uses_default_path() -> pipeline::Result<()> {
        let files = run(
            &Permalinks::with_pattern("/blog/:title")?,
            vec![
                ("posts/a.html", File::new("posts/a.md", "")),
                ("posts/b.html", File::new("posts/b.md", "").with("title", Value::Null)),
            ],
        )?;
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(vec!["posts/a/index.html", "posts/b/index.html"], keys);
        assert_eq!(Some("posts/b"), files["posts/b/index.html"].str_field("path"));
        Ok(())
    }

    #[test]
    fn test_sequence_field_is_slugified() -> pipeline::Result<()> {
        let tags = Value::Sequence(vec![Value::from("Rust"), Value::from("Web Dev")]);
        let files = run(
            &Permalinks::with_pattern("/tags/:tags")?,
            vec![("a.html", File::new("a.md", "").with("tags", tags))],
        )?;
        assert!(files.contains_key("tags/rust-web-dev/index.html"));
        Ok(())
    }

    #[test]
    fn test_colliding_permalinks_keep_the_last_file() -> pipeline::Result<()> {
        let files = run(
            &Permalinks::with_pattern("/blog/:title")?,
            vec![
                ("posts/a.html", File::new("posts/a.md", "a").with("title", "Same")),
                ("posts/b.html", File::new("posts/b.md", "b").with("title", "Same")),
            ],
        )?;
        assert_eq!(1, files.len());
        assert_eq!("posts/b.md", files["blog/same/index.html"].source);
        Ok(())
    }

    #[test]
    fn test_empty_placeholder_is_rejected() {
        assert!(Permalinks::with_pattern("/blog/:/x").is_err());
    }
}
