//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: reading the source files
//! ([`crate::source`]) and running them through the [`pipeline`] returned for
//! the [`Config`], which ends by writing the output ([`crate::write`]).

use crate::collections::Collections;
use crate::config::Config;
use crate::description::Description;
use crate::file::Files;
use crate::markdown::Markdown;
use crate::meta::Meta;
use crate::navigation::Navigation;
use crate::permalinks::Permalinks;
use crate::pipeline::{self, Branch, Pipeline, Site};
use crate::source;
use crate::templates::Templates;
use crate::write::Write;
use std::fmt;
use tracing::info;

/// Assembles the site pipeline for `config`. In order:
///
/// 1. Default permalinks for every HTML file
/// 2. Markdown rendering
/// 3. The `posts`, `projects`, and `products` collections
/// 4. One branch per content type. Each requires a `title` and applies the
///    type's permalink pattern; posts also default `template` to the post
///    template and derive a `description`.
/// 5. Navigation
/// 6. Templating
/// 7. Writing to the destination
///
/// Returns an error if a configured glob or permalink pattern is invalid.
pub fn pipeline(config: &Config) -> Result<Pipeline> {
    let globs = &config.globs;
    let patterns = &config.permalinks;
    Ok(Pipeline::new()
        .step(Permalinks::new())
        .step(Markdown::new())
        .step(Collections::new(config.collections())?)
        .step(
            Branch::new(&globs.posts)?
                .step(Meta::required("title"))
                .step(Meta::with_default("template", config.templates.post.as_str()))
                .step(Permalinks::with_pattern(&patterns.posts)?)
                .step(Description::new()),
        )
        .step(
            Branch::new(&globs.projects)?
                .step(Meta::required("title"))
                .step(Permalinks::with_pattern(&patterns.projects)?),
        )
        .step(
            Branch::new(&globs.products)?
                .step(Meta::required("title"))
                .step(Permalinks::with_pattern(&patterns.products)?),
        )
        .step(
            Branch::new(&globs.pages)?
                .step(Meta::required("title"))
                .step(Permalinks::with_pattern(&patterns.pages)?),
        )
        .step(Navigation::with_match(
            config.navigation.clone(),
            config.navigation_match,
        ))
        .step(Templates::new(config.templates.clone()))
        .step(Write::new(&config.destination)))
}

/// A summary of a finished build.
#[derive(Debug)]
pub struct Summary {
    /// The files as they were written, keyed by output path.
    pub files: Files,

    /// The site-wide metadata computed during the build.
    pub site: Site,
}

/// Builds the site from a [`Config`] object: reads the source directory and
/// runs the files through [`pipeline`]. Fails with the first step's error;
/// the destination may be partially written in that case.
pub fn build_site(config: &Config) -> Result<Summary> {
    info!(
        source = %config.source.display(),
        destination = %config.destination.display(),
        "building site"
    );
    let pipeline = pipeline(config)?;
    let mut files = source::read(&config.source)?;
    let mut site = Site::default();
    pipeline.run(&mut files, &mut site)?;
    info!(files = files.len(), "build complete");
    Ok(Summary { files, site })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during reading the
/// source files, assembling the pipeline, or running one of its steps.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors reading the source files.
    Source(source::Error),

    /// Returned when a step fails or can't be constructed.
    Step(pipeline::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Source(err) => err.fmt(f),
            Error::Step(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Source(err) => Some(err),
            Error::Step(err) => Some(err),
        }
    }
}

impl From<source::Error> for Error {
    /// Converts [`source::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: source::Error) -> Error {
        Error::Source(err)
    }
}

impl From<pipeline::Error> for Error {
    /// Converts [`pipeline::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: pipeline::Error) -> Error {
        Error::Step(err)
    }
}

impl From<crate::permalinks::Error> for Error {
    fn from(err: crate::permalinks::Error) -> Error {
        Error::Step(err.into())
    }
}
