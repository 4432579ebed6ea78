//! Defines the [`Templates`] step, which renders each file's contents through
//! a template (Go `text/template` syntax, via [`gtmpl`]).
//!
//! A file's template is named by its `template` field, falling back to the
//! configured default. The template source is assembled from the configured
//! partials, each wrapped in `{{define "<name>"}}...{{end}}` so templates can
//! include them with `{{template "<name>" .}}`, followed by the template file
//! itself.
//!
//! The template context is an object holding:
//!
//! * every collection by name, and all of them under `collections`; each
//!   member is the member file's metadata plus its `contents`
//! * the file's own metadata fields
//! * `contents`, the file's current contents

use crate::file::{File, Files};
use crate::pipeline::{self, Site, Step};
use crate::value;
use gtmpl::Value;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the [`Templates`] step.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplatesConfig {
    /// The directory holding template and partial files.
    pub directory: PathBuf,

    /// The template used for files without a `template` field.
    pub default: String,

    /// The template assigned to blog posts.
    pub post: String,

    /// Partial names mapped to their files in [`TemplatesConfig::directory`].
    pub partials: BTreeMap<String, String>,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        let mut partials = BTreeMap::new();
        partials.insert("page".to_owned(), "page.html".to_owned());
        partials.insert("header".to_owned(), "header.html".to_owned());
        TemplatesConfig {
            directory: PathBuf::from("templates"),
            default: "page.html".to_owned(),
            post: "post.html".to_owned(),
            partials,
        }
    }
}

/// Renders every UTF-8 file through its template. See the module
/// documentation for details.
pub struct Templates {
    config: TemplatesConfig,
}

impl Templates {
    pub fn new(config: TemplatesConfig) -> Templates {
        Templates { config }
    }

    fn template_name<'a>(&'a self, file: &'a File) -> &'a str {
        file.str_field("template").unwrap_or(&self.config.default)
    }

    // Loads the partial files, wrapping each in a `define` block.
    fn partials(&self) -> Result<String> {
        let mut contents = String::new();
        for (name, file_name) in &self.config.partials {
            let partial = read_template(&self.config.directory.join(file_name))?;
            contents.push_str(&format!("{{{{define \"{}\"}}}}{}{{{{end}}}}", name, partial));
        }
        Ok(contents)
    }

    // Builds the site-wide part of the context: each collection resolved to
    // the current state of its members.
    fn site_context(&self, files: &Files, site: &Site) -> HashMap<String, Value> {
        let by_source: HashMap<&str, &File> = files
            .values()
            .map(|file| (file.source.as_str(), file))
            .collect();

        let mut collections = HashMap::new();
        for (name, members) in &site.collections {
            let members: Vec<Value> = members
                .iter()
                .filter_map(|source| by_source.get(source.as_str()))
                .map(|file| value::from_file(file))
                .collect();
            collections.insert(name.clone(), Value::Array(members));
        }

        let mut context = collections.clone();
        context.insert("collections".to_owned(), Value::Object(collections));
        context
    }
}

impl Step for Templates {
    fn name(&self) -> &str {
        "templates"
    }

    fn apply(&self, files: &mut Files, site: &mut Site) -> pipeline::Result<()> {
        let partials = self.partials()?;
        let site_context = self.site_context(files, site);
        let mut sources: HashMap<String, String> = HashMap::new();
        let mut rendered: Vec<(String, String)> = Vec::new();

        for (key, file) in files.iter() {
            if std::str::from_utf8(&file.contents).is_err() {
                debug!(file = %key, "skipping binary file");
                continue;
            }

            let name = self.template_name(file);
            if !sources.contains_key(name) {
                let template = read_template(&self.config.directory.join(name))?;
                sources.insert(name.to_owned(), format!("{}{}", partials, template));
            }

            let mut context = site_context.clone();
            context.extend(value::from_metadata(&file.metadata));
            context.insert("contents".to_owned(), Value::String(file.text().into_owned()));

            let output = gtmpl::template(&sources[name], Value::Object(context)).map_err(|err| {
                Error::Render {
                    file: key.clone(),
                    template: name.to_owned(),
                    message: err.to_string(),
                }
            })?;
            debug!(file = %key, template = %name, "rendered template");
            rendered.push((key.clone(), output));
        }

        for (key, output) in rendered {
            if let Some(file) = files.get_mut(&key) {
                file.contents = output.into_bytes();
            }
        }
        Ok(())
    }
}

fn read_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

/// The result of a templating operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error templating a file.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when a template fails to parse or execute.
    Render {
        file: String,
        template: String,
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Render {
                file,
                template,
                message,
            } => write!(f, "Rendering `{}` with `{}`: {}", file, template, message),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::Render { .. } => None,
        }
    }
}
