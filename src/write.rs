//! Defines the [`Write`] step, which persists the file collection to the
//! destination directory.

use crate::file::Files;
use crate::pipeline::{self, Site, Step};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Clears the destination directory and writes every file to
/// `{destination}/{key}`. Nothing is staged, so a failure part way through
/// leaves a partially written destination.
pub struct Write {
    destination: PathBuf,
}

impl Write {
    pub fn new(destination: impl Into<PathBuf>) -> Write {
        Write {
            destination: destination.into(),
        }
    }

    fn write_files(&self, files: &Files) -> Result<()> {
        rmdir(&self.destination)?;

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for (key, file) in files {
            let path = self.destination.join(key.trim_start_matches('/'));
            if let Some(dir) = path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir).map_err(|err| Error::Io {
                        path: dir.to_owned(),
                        err,
                    })?;
                }
            }
            std::fs::write(&path, &file.contents).map_err(|err| Error::Io {
                path: path.clone(),
                err,
            })?;
            debug!(file = %key, bytes = file.contents.len(), "wrote file");
        }
        Ok(())
    }
}

impl Step for Write {
    fn name(&self) -> &str {
        "write"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> pipeline::Result<()> {
        Ok(self.write_files(files)?)
    }
}

// Blows away the old output directory so we don't have any collisions with
// files from a previous build.
fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

/// The result of a file-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the output files.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while cleaning the destination directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while writing an output file.
    Io { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Io { path, err } => {
                write!(f, "Writing '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Clean { path: _, err } => Some(err),
            Error::Io { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::file::File;

    #[test]
    fn test_write_replaces_destination() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let destination = dir.path().join("out");
        std::fs::create_dir_all(&destination)?;
        std::fs::write(destination.join("stale.html"), "old")?;

        let mut files = Files::new();
        files.insert(
            "blog/hello/index.html".to_owned(),
            File::new("posts/hello.md", "<p>hi</p>"),
        );
        Write::new(&destination).apply(&mut files, &mut Site::default())?;

        assert!(!destination.join("stale.html").exists());
        assert_eq!(
            "<p>hi</p>",
            std::fs::read_to_string(destination.join("blog/hello/index.html"))?
        );
        Ok(())
    }
}
