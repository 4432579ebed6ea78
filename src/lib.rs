//! The library code for the `sitesmith` static site builder. A build reads a
//! source directory into an in-memory collection of files ([`crate::source`])
//! and threads that collection through an ordered sequence of steps
//! ([`crate::pipeline`]). Each step mutates the collection in place: adding,
//! removing, or renaming files, or changing their metadata.
//!
//! The steps themselves are small:
//!
//! 1. [`crate::permalinks`] moves HTML files to clean `{path}/index.html`
//!    locations
//! 2. [`crate::markdown`] renders markdown files to HTML
//! 3. [`crate::collections`] groups files into named, sorted lists
//! 4. [`crate::meta`] and [`crate::description`] fill in or require metadata
//! 5. [`crate::navigation`] attaches the site menu to every file
//! 6. [`crate::templates`] renders each file through its template
//! 7. [`crate::write`] persists the result
//!
//! A [`crate::pipeline::Branch`] scopes a sub-sequence of steps to the files
//! matching a glob, which is how each content type (posts, projects, products,
//! pages) gets its own permalink scheme. [`crate::build`] assembles the
//! standard site pipeline from a [`crate::config::Config`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod collections;
pub mod config;
pub mod description;
pub mod file;
pub mod markdown;
pub mod meta;
pub mod navigation;
pub mod permalinks;
pub mod pipeline;
pub mod source;
pub mod templates;
pub mod value;
pub mod write;
