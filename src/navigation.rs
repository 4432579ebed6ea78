//! Defines the [`Navigation`] step, which attaches the site menu to every file
//! with the entries matching the file's location marked active.

use crate::file::Files;
use crate::pipeline::{Result, Site, Step};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// A site menu entry.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NavItem {
    /// The text of the menu entry.
    pub label: String,

    /// The absolute path the entry links to (e.g., `/blog`).
    pub path: String,
}

impl NavItem {
    pub fn new(label: &str, path: &str) -> NavItem {
        NavItem {
            label: label.to_owned(),
            path: path.to_owned(),
        }
    }
}

/// How a menu entry's path is compared against a file's path.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveMatch {
    /// Raw string prefix: `/pro` matches `/products/x`.
    #[default]
    Prefix,

    /// Whole path segments: `/pro` matches `/pro` and `/pro/x` only.
    Segment,
}

impl ActiveMatch {
    fn is_active(self, item_path: &str, file_path: &str) -> bool {
        if item_path.is_empty() || !file_path.starts_with(item_path) {
            return false;
        }
        match self {
            ActiveMatch::Prefix => true,
            ActiveMatch::Segment => {
                item_path.ends_with('/')
                    || file_path.len() == item_path.len()
                    || file_path[item_path.len()..].starts_with('/')
            }
        }
    }
}

/// Sets the `navigation` field of every file to the list of menu entries, each
/// a mapping of `label`, `path`, and `states`. `states` contains `"active"`
/// when the entry is the root (`/`) and the file has no path, or when the
/// entry's path matches the file's path per [`ActiveMatch`].
///
/// Also normalizes each file's `path` field to a single leading slash.
pub struct Navigation {
    items: Vec<NavItem>,
    active_match: ActiveMatch,
}

impl Navigation {
    pub fn new(items: Vec<NavItem>) -> Navigation {
        Navigation::with_match(items, ActiveMatch::default())
    }

    pub fn with_match(items: Vec<NavItem>, active_match: ActiveMatch) -> Navigation {
        Navigation {
            items,
            active_match,
        }
    }

    fn entry(&self, item: &NavItem, file_path: Option<&str>) -> Value {
        let active = match (item.path.as_str(), file_path) {
            ("/", path) => path.is_none(),
            (item_path, path) => self.active_match.is_active(item_path, path.unwrap_or("")),
        };
        let states = match active {
            true => vec![Value::from("active")],
            false => Vec::new(),
        };

        let mut m = Mapping::new();
        m.insert("label".into(), item.label.as_str().into());
        m.insert("path".into(), item.path.as_str().into());
        m.insert("states".into(), Value::Sequence(states));
        Value::Mapping(m)
    }
}

/// Joins the segments of `path` under a single leading slash, so that
/// `blog/x`, `/blog/x`, and `//blog//x` all become `/blog/x`. `.` segments are
/// dropped and `..` removes the preceding segment, never climbing above `/`.
pub fn absolute_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

impl Step for Navigation {
    fn name(&self) -> &str {
        "navigation"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> Result<()> {
        for file in files.values_mut() {
            let path = match file.str_field("path") {
                Some(path) if !path.is_empty() => Some(absolute_path(path)),
                _ => None,
            };
            if let Some(path) = &path {
                file.metadata
                    .insert("path".to_owned(), Value::String(path.clone()));
            }

            let navigation = self
                .items
                .iter()
                .map(|item| self.entry(item, path.as_deref()))
                .collect();
            file.metadata
                .insert("navigation".to_owned(), Value::Sequence(navigation));
        }
        Ok(())
    }
}
