//! Loads the project configuration from a `site.yaml` file. Every field has a
//! default, so an empty file (or no file at all) describes the standard site
//! layout:
//!
//! ```yaml
//! source: content
//! destination: content-build
//! templates:
//!   directory: templates
//!   default: page.html
//!   post: post.html
//!   partials: {page: page.html, header: header.html}
//! globs:
//!   posts: posts/*
//!   projects: projects/**/*
//!   products: products/**/*
//!   pages: pages/**/*
//! permalinks:
//!   posts: /blog/:title
//!   projects: /projects/:title
//!   products: /products/:title
//!   pages: :title
//! navigation:
//!   - {label: Home, path: /}
//!   - {label: Blog, path: /blog}
//!   - {label: Projects, path: /projects}
//!   - {label: Products, path: /products}
//! navigation_match: prefix
//! ```

use crate::collections::CollectionConfig;
use crate::navigation::{ActiveMatch, NavItem};
use crate::templates::TemplatesConfig;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "site.yaml";

/// The globs selecting each content type, matched against file keys.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Globs {
    pub posts: String,
    pub projects: String,
    pub products: String,
    pub pages: String,
}

impl Default for Globs {
    fn default() -> Self {
        Globs {
            posts: "posts/*".to_owned(),
            projects: "projects/**/*".to_owned(),
            products: "products/**/*".to_owned(),
            pages: "pages/**/*".to_owned(),
        }
    }
}

/// The permalink pattern for each content type. See
/// [`crate::permalinks::Permalinks`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PermalinkPatterns {
    pub posts: String,
    pub projects: String,
    pub products: String,
    pub pages: String,
}

impl Default for PermalinkPatterns {
    fn default() -> Self {
        PermalinkPatterns {
            posts: "/blog/:title".to_owned(),
            projects: "/projects/:title".to_owned(),
            products: "/products/:title".to_owned(),
            pages: ":title".to_owned(),
        }
    }
}

#[derive(Deserialize)]
struct Navigation(Vec<NavItem>);
impl Default for Navigation {
    fn default() -> Self {
        Navigation(vec![
            NavItem::new("Home", "/"),
            NavItem::new("Blog", "/blog"),
            NavItem::new("Projects", "/projects"),
            NavItem::new("Products", "/products"),
        ])
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Project {
    source: Option<PathBuf>,
    destination: Option<PathBuf>,
    templates: TemplatesConfig,
    globs: Globs,
    permalinks: PermalinkPatterns,
    navigation: Navigation,
    navigation_match: ActiveMatch,
}

/// The configuration for one site build. Relative paths in the project file
/// are resolved against the project file's directory.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The directory the source files are read from.
    pub source: PathBuf,

    /// The directory the output files are written to. It is deleted and
    /// recreated by every build.
    pub destination: PathBuf,

    pub templates: TemplatesConfig,
    pub globs: Globs,
    pub permalinks: PermalinkPatterns,

    /// The site menu, in display order.
    pub navigation: Vec<NavItem>,
    pub navigation_match: ActiveMatch,
}

impl Config {
    /// Returns the default configuration rooted at `root`.
    pub fn with_root(root: &Path) -> Config {
        Config::from_project(Project::default(), root)
    }

    /// Searches `dir` and then each of its ancestors for a `site.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        match find_project_file(dir) {
            Some(path) => match Config::from_project_file(&path) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            },
            None => Err(anyhow!(
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            )),
        }
    }

    /// Loads the configuration from the project file at `path`.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        use std::io::Read;
        let mut contents = String::new();
        open(path, "project")?.read_to_string(&mut contents)?;
        // An empty project file is a valid, all-defaults project.
        let project: Option<Project> = match contents.trim().is_empty() {
            true => None,
            false => Some(serde_yaml::from_str(&contents)?),
        };
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config::from_project(
                project.unwrap_or_default(),
                project_root,
            )),
        }
    }

    fn from_project(project: Project, root: &Path) -> Config {
        let mut templates = project.templates;
        templates.directory = root.join(&templates.directory);
        Config {
            source: root.join(project.source.unwrap_or_else(|| PathBuf::from("content"))),
            destination: root.join(
                project
                    .destination
                    .unwrap_or_else(|| PathBuf::from("content-build")),
            ),
            templates,
            globs: project.globs,
            permalinks: project.permalinks,
            navigation: project.navigation.0,
            navigation_match: project.navigation_match,
        }
    }

    /// The collections computed for templates: `posts` (newest first),
    /// `projects`, and `products`.
    pub fn collections(&self) -> Vec<CollectionConfig> {
        vec![
            CollectionConfig::new("posts", &self.globs.posts).sorted_by("date", true),
            CollectionConfig::new("projects", &self.globs.projects),
            CollectionConfig::new("products", &self.globs.products),
        ]
    }
}

fn open(path: &Path, kind: &str) -> Result<File> {
    File::open(path).map_err(|e| anyhow!("Opening {} file `{}`: {}", kind, path.display(), e))
}

/// Returns the path of the `site.yaml` in `dir` or its nearest ancestor.
pub fn find_project_file(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|ancestor| ancestor.join(PROJECT_FILE))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_project_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), "")?;
        let config = Config::from_directory(dir.path())?;
        assert_eq!(Config::with_root(dir.path()), config);
        assert_eq!(dir.path().join("content"), config.source);
        assert_eq!(dir.path().join("templates"), config.templates.directory);
        assert_eq!(4, config.navigation.len());
        assert_eq!(ActiveMatch::Prefix, config.navigation_match);
        Ok(())
    }

    #[test]
    fn test_project_file_overrides() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join(PROJECT_FILE),
            "destination: public\n\
             permalinks:\n  posts: /posts/:date/:title\n\
             navigation:\n  - {label: Home, path: /}\n\
             navigation_match: segment\n",
        )?;
        let config = Config::from_project_file(&dir.path().join(PROJECT_FILE))?;
        assert_eq!(dir.path().join("public"), config.destination);
        assert_eq!("/posts/:date/:title", config.permalinks.posts);
        assert_eq!("/projects/:title", config.permalinks.projects);
        assert_eq!(vec![NavItem::new("Home", "/")], config.navigation);
        assert_eq!(ActiveMatch::Segment, config.navigation_match);
        Ok(())
    }

    #[test]
    fn test_project_file_found_in_ancestor() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), "source: src\n")?;
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested)?;
        let config = Config::from_directory(&nested)?;
        assert_eq!(dir.path().join("src"), config.source);
        Ok(())
    }
}
