//! Defines the [`Step`] trait and the two ways steps are composed: a
//! [`Pipeline`], which runs steps in order over the whole [`Files`]
//! collection, and a [`Branch`], which runs steps in order over only the files
//! matching a glob.
//!
//! Steps run strictly one after another. Each step either returns `Ok(())`
//! after it has finished mutating the collection or returns an error, in which
//! case no further steps run and the error becomes the result of the run.

use crate::file::Files;
use crate::{permalinks, templates, write};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use wax::{Glob, Pattern};

/// Build-wide metadata shared by all steps in a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Site {
    /// The named collections, in the order they were computed. Each maps to
    /// the ordered list of member [`crate::file::File::source`] paths.
    pub collections: Vec<(String, Vec<String>)>,
}

impl Site {
    /// Returns the member source paths of the collection `name`, if any.
    pub fn collection(&self, name: &str) -> Option<&[String]> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, members)| members.as_slice())
    }
}

/// A single transformation over the file collection.
pub trait Step {
    /// A short name for the step, used in logs and error annotations.
    fn name(&self) -> &str {
        "step"
    }

    /// Applies the step to `files`.
    fn apply(&self, files: &mut Files, site: &mut Site) -> Result<()>;
}

impl<F> Step for F
where
    F: Fn(&mut Files, &mut Site) -> Result<()>,
{
    fn apply(&self, files: &mut Files, site: &mut Site) -> Result<()> {
        self(files, site)
    }
}

/// An ordered sequence of [`Step`]s.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Constructs an empty pipeline.
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Appends a step to the pipeline.
    pub fn step(mut self, step: impl Step + 'static) -> Pipeline {
        self.steps.push(Box::new(step));
        self
    }

    /// Runs every step in order against `files`, stopping at the first error.
    pub fn run(&self, files: &mut Files, site: &mut Site) -> Result<()> {
        run_steps(&self.steps, files, site)
    }
}

fn run_steps(steps: &[Box<dyn Step>], files: &mut Files, site: &mut Site) -> Result<()> {
    for step in steps {
        debug!(step = step.name(), files = files.len(), "running step");
        step.apply(files, site).map_err(|err| match err {
            // Already annotated by a nested branch; keep the innermost name.
            Error::Annotated(..) => err,
            _ => Error::Annotated(step.name().to_owned(), Box::new(err)),
        })?;
    }
    Ok(())
}

/// Scopes a sequence of child [`Step`]s to the files whose key matches a glob.
/// Files outside the glob are invisible to the children and are left exactly
/// as they were.
pub struct Branch {
    pattern: String,
    glob: Glob<'static>,
    steps: Vec<Box<dyn Step>>,
}

impl Branch {
    /// Constructs a branch over `pattern`. Returns an error if `pattern` isn't
    /// a valid glob.
    pub fn new(pattern: &str) -> Result<Branch> {
        let glob = Glob::new(pattern)
            .map_err(|err| Error::Glob {
                pattern: pattern.to_owned(),
                message: err.to_string(),
            })?
            .into_owned();
        Ok(Branch {
            pattern: pattern.to_owned(),
            glob,
            steps: Vec::new(),
        })
    }

    /// Appends a child step to the branch.
    pub fn step(mut self, step: impl Step + 'static) -> Branch {
        self.steps.push(Box::new(step));
        self
    }

    /// Returns true if `key` falls within the branch.
    pub fn matches(&self, key: &str) -> bool {
        self.glob.is_match(key)
    }
}

impl Step for Branch {
    fn name(&self) -> &str {
        &self.pattern
    }

    fn apply(&self, files: &mut Files, site: &mut Site) -> Result<()> {
        let keys: Vec<String> = files
            .keys()
            .filter(|key| self.matches(key))
            .cloned()
            .collect();

        // Move the matching entries out of the shared map rather than copying
        // them; they are moved back once the children have run.
        let mut scoped: Files = BTreeMap::new();
        for key in keys {
            if let Some(file) = files.remove(&key) {
                scoped.insert(key, file);
            }
        }
        debug!(branch = %self.pattern, files = scoped.len(), "entering branch");

        let result = run_steps(&self.steps, &mut scoped, site);
        for (key, file) in scoped {
            if let Some(replaced) = files.insert(key.clone(), file) {
                warn!(
                    file = %key,
                    replaced = %replaced.source,
                    "branch output overwrote another file"
                );
            }
        }
        result
    }
}

/// The result of running a [`Step`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a step failure.
#[derive(Debug)]
pub enum Error {
    /// Returned when a branch pattern isn't a valid glob.
    Glob { pattern: String, message: String },

    /// Returned when a permalink pattern can't be applied.
    Permalink(permalinks::Error),

    /// Returned when a file can't be templated.
    Template(templates::Error),

    /// Returned when the output can't be written.
    Write(write::Error),

    /// A free-form failure, e.g., from a closure step.
    Other(String),

    /// A step failure annotated with the name of the failing step.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Glob { pattern, message } => {
                write!(f, "invalid glob `{}`: {}", pattern, message)
            }
            Error::Permalink(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Other(message) => message.fmt(f),
            Error::Annotated(step, err) => write!(f, "step `{}`: {}", step, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Glob { .. } => None,
            Error::Permalink(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Other(_) => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<permalinks::Error> for Error {
    fn from(err: permalinks::Error) -> Error {
        Error::Permalink(err)
    }
}

impl From<templates::Error> for Error {
    fn from(err: templates::Error) -> Error {
        Error::Template(err)
    }
}

impl From<write::Error> for Error {
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}
