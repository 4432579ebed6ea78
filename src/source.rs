//! Reads a source directory into a [`Files`] collection. Each file may begin
//! with YAML front matter fenced by `---` lines, which is parsed into the
//! file's metadata; everything after the closing fence is the file's contents.
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! ---
//! # Hello
//!
//! World
//! ```

use crate::file::{File, Files, Metadata};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const FENCE: &str = "---";

/// Walks `source_directory` and returns every regular file in it, keyed by its
/// `/`-separated path relative to `source_directory`.
pub fn read(source_directory: &Path) -> Result<Files> {
    let mut files = Files::new();
    for result in WalkDir::new(source_directory).sort_by_file_name() {
        let entry = result?;
        if !entry.file_type().is_file() {
            continue;
        }

        // strip_prefix() should never fail since WalkDir yields descendants
        // of `source_directory`.
        let relative = entry
            .path()
            .strip_prefix(source_directory)
            .map_err(|_| Error::InvalidPath(entry.path().to_owned()))?;
        let key = relative_key(relative).ok_or_else(|| Error::InvalidPath(relative.to_owned()))?;

        let raw = std::fs::read(entry.path()).map_err(|err| {
            Error::Annotated(format!("reading `{}`", key), Box::new(Error::Io(err)))
        })?;
        let file = parse(&key, raw).map_err(|err| {
            Error::Annotated(format!("parsing `{}`", key), Box::new(err))
        })?;
        debug!(file = %key, fields = file.metadata.len(), "read source file");
        files.insert(key, file);
    }
    Ok(files)
}

fn relative_key(relative: &Path) -> Option<String> {
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<&str>>>()?;
    Some(segments.join("/"))
}

/// Parses a single file's raw bytes into a [`File`]. Files that don't start
/// with a front matter fence (including non-UTF-8 files) are returned with
/// empty metadata and their contents untouched.
pub fn parse(source: &str, raw: Vec<u8>) -> Result<File> {
    let text = match std::str::from_utf8(&raw) {
        Ok(text) if text.starts_with(FENCE) => text,
        _ => return Ok(File::new(source, raw)),
    };

    let (yaml_start, yaml_stop, body_start) = frontmatter_indices(text)?;
    let metadata = parse_frontmatter(&text[yaml_start..yaml_stop])?;
    Ok(File {
        source: source.to_owned(),
        contents: text[body_start..].as_bytes().to_vec(),
        metadata,
    })
}

// Returns the (yaml_start, yaml_stop, body_start) offsets of `input`, which
// must begin with `---`. The closing fence must start a line.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    let yaml_start = FENCE.len();
    let closing = format!("\n{}", FENCE);
    match input[yaml_start..].find(&closing) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => {
            let yaml_stop = yaml_start + offset + 1;
            let mut body_start = yaml_stop + FENCE.len();
            // The rest of the fence line belongs to the fence.
            match input[body_start..].find('\n') {
                Some(newline) => body_start += newline + 1,
                None => body_start = input.len(),
            }
            Ok((yaml_start, yaml_stop, body_start))
        }
    }
}

fn parse_frontmatter(yaml: &str) -> Result<Metadata> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }
    match serde_yaml::from_str::<serde_yaml::Value>(yaml)? {
        serde_yaml::Value::Null => Ok(Metadata::new()),
        value @ serde_yaml::Value::Mapping(_) => Ok(serde_yaml::from_value(value)?),
        _ => Err(Error::FrontmatterNotMapping),
    }
}

/// Represents the result of reading source files.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error reading source files.
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file has an opening front matter fence (`---`)
    /// but no closing one.
    FrontmatterMissingEndFence,

    /// Returned when the front matter is valid YAML but not a mapping.
    FrontmatterNotMapping,

    /// Returned when there was an error parsing the front matter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a source path isn't valid UTF-8.
    InvalidPath(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::FrontmatterNotMapping => {
                write!(f, "Front matter must be a YAML mapping")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidPath(path) => write!(f, "invalid file name: {:?}", path),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::FrontmatterNotMapping => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidPath(_) => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`].
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_frontmatter_and_body() -> Result<()> {
        let file = parse(
            "posts/hello.md",
            b"---\ntitle: Hello\ndate: 2020-01-01\n---\n# Hi\n\nWorld".to_vec(),
        )?;
        assert_eq!(Some("Hello"), file.str_field("title"));
        assert_eq!(Some("2020-01-01"), file.str_field("date"));
        assert_eq!(b"# Hi\n\nWorld".to_vec(), file.contents);
        assert_eq!("posts/hello.md", file.source);
        Ok(())
    }

    #[test]
    fn test_parse_without_frontmatter() -> Result<()> {
        let file = parse("style.css", b"body {}".to_vec())?;
        assert!(file.metadata.is_empty());
        assert_eq!(b"body {}".to_vec(), file.contents);
        Ok(())
    }

    #[test]
    fn test_parse_empty_frontmatter() -> Result<()> {
        let file = parse("a.md", b"---\n---\nbody".to_vec())?;
        assert!(file.metadata.is_empty());
        assert_eq!(b"body".to_vec(), file.contents);
        Ok(())
    }

    #[test]
    fn test_dashes_inside_yaml_value_are_not_a_fence() -> Result<()> {
        let file = parse("a.md", b"---\ntitle: a---b\n---\nbody".to_vec())?;
        assert_eq!(Some("a---b"), file.str_field("title"));
        Ok(())
    }

    #[test]
    fn test_missing_end_fence() {
        assert!(matches!(
            parse("a.md", b"---\ntitle: x\nbody".to_vec()),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_frontmatter_must_be_mapping() {
        assert!(matches!(
            parse("a.md", b"---\n- a\n- b\n---\nbody".to_vec()),
            Err(Error::FrontmatterNotMapping)
        ));
    }

    #[test]
    fn test_read_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("posts"))?;
        std::fs::write(
            dir.path().join("posts/hello.md"),
            "---\ntitle: Hello\n---\nWorld",
        )?;
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *")?;

        let files = read(dir.path())?;
        let keys: Vec<&str> = files.keys().map(String::as_str).collect();
        assert_eq!(vec!["posts/hello.md", "robots.txt"], keys);
        assert_eq!(Some("Hello"), files["posts/hello.md"].str_field("title"));
        Ok(())
    }
}
