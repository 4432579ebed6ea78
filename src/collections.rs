//! Defines the [`Collections`] step, which groups files into named, ordered
//! collections (e.g., all blog posts newest first) for templates to list.

use crate::file::{File, Files};
use crate::pipeline::{Error, Result, Site, Step};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_yaml::Value;
use std::cmp::Ordering;
use wax::{Glob, Pattern};

/// The definition of a single collection.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CollectionConfig {
    /// The collection's name, e.g. `posts`.
    pub name: String,

    /// The glob a file's key must match to be a member.
    pub pattern: String,

    /// The metadata field members are sorted by. Without one, members keep
    /// their key order.
    #[serde(default)]
    pub sort_by: Option<String>,

    /// Sort descending rather than ascending.
    #[serde(default)]
    pub reverse: bool,
}

impl CollectionConfig {
    pub fn new(name: &str, pattern: &str) -> CollectionConfig {
        CollectionConfig {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
            sort_by: None,
            reverse: false,
        }
    }

    pub fn sorted_by(mut self, field: &str, reverse: bool) -> CollectionConfig {
        self.sort_by = Some(field.to_owned());
        self.reverse = reverse;
        self
    }
}

struct Collection {
    config: CollectionConfig,
    glob: Glob<'static>,
}

/// Computes every configured collection, records it on the [`Site`], and
/// appends the collection's name to each member's `collection` field.
pub struct Collections {
    collections: Vec<Collection>,
}

impl Collections {
    /// Returns an error if any collection's pattern isn't a valid glob.
    pub fn new(configs: Vec<CollectionConfig>) -> Result<Collections> {
        let collections = configs
            .into_iter()
            .map(|config| {
                let glob = Glob::new(&config.pattern)
                    .map_err(|err| Error::Glob {
                        pattern: config.pattern.clone(),
                        message: err.to_string(),
                    })?
                    .into_owned();
                Ok(Collection { config, glob })
            })
            .collect::<Result<Vec<Collection>>>()?;
        Ok(Collections { collections })
    }
}

impl Step for Collections {
    fn name(&self) -> &str {
        "collections"
    }

    fn apply(&self, files: &mut Files, site: &mut Site) -> Result<()> {
        for Collection { config, glob } in &self.collections {
            let mut members: Vec<(&String, &File)> = files
                .iter()
                .filter(|(key, _)| glob.is_match(key.as_str()))
                .collect();

            if let Some(field) = &config.sort_by {
                // `sort_by` is stable, so equal values keep key order in both
                // directions.
                members.sort_by(|(_, a), (_, b)| {
                    let ordering = compare(a.metadata.get(field), b.metadata.get(field));
                    match config.reverse {
                        true => ordering.reverse(),
                        false => ordering,
                    }
                });
            }

            let keys: Vec<String> = members.iter().map(|(key, _)| (*key).clone()).collect();
            let sources: Vec<String> = members.iter().map(|(_, f)| f.source.clone()).collect();

            for key in &keys {
                if let Some(file) = files.get_mut(key) {
                    add_membership(file, &config.name);
                }
            }
            site.collections.retain(|(name, _)| name != &config.name);
            site.collections.push((config.name.clone(), sources));
        }
        Ok(())
    }
}

fn add_membership(file: &mut File, name: &str) {
    let entry = file
        .metadata
        .entry("collection".to_owned())
        .or_insert_with(|| Value::Sequence(Vec::new()));
    match entry {
        Value::Sequence(names) => {
            if !names.iter().any(|n| n.as_str() == Some(name)) {
                names.push(Value::from(name));
            }
        }
        other => *other = Value::Sequence(vec![other.clone(), Value::from(name)]),
    }
}

/// Orders two optional metadata values. Missing values sort first; `YYYY-MM-DD`
/// strings compare as dates, numbers numerically, other strings as text.
pub fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    let date = |v: &Value| {
        v.as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    };
    if let (Some(a), Some(b)) = (date(a), date(b)) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_f64(), b.as_f64()) {
        return a.partial_cmp(&b).unwrap_or(Ordering::Equal);
    }
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn post(source: &str, date: &str) -> File {
        File::new(source, "").with("date", date)
    }

    fn files() -> Files {
        let mut files = Files::new();
        files.insert("posts/a.html".to_owned(), post("posts/a.md", "2020-01-01"));
        files.insert("posts/b.html".to_owned(), post("posts/b.md", "2021-06-01"));
        files.insert("posts/c.html".to_owned(), post("posts/c.md", "2020-01-01"));
        files.insert("posts/d.html".to_owned(), post("posts/d.md", "2019-12-31"));
        files.insert(
            "projects/x/y.html".to_owned(),
            File::new("projects/x/y.md", ""),
        );
        files
    }

    #[test]
    fn test_posts_sorted_by_date_descending_and_stable() -> Result<()> {
        let step = Collections::new(vec![
            CollectionConfig::new("posts", "posts/*").sorted_by("date", true)
        ])?;
        let mut site = Site::default();
        step.apply(&mut files(), &mut site)?;
        assert_eq!(
            Some(&["posts/b.md", "posts/a.md", "posts/c.md", "posts/d.md"].map(String::from)[..]),
            site.collection("posts")
        );
        Ok(())
    }

    #[test]
    fn test_membership_is_recorded_on_files() -> Result<()> {
        let step = Collections::new(vec![
            CollectionConfig::new("posts", "posts/*"),
            CollectionConfig::new("projects", "projects/**/*"),
        ])?;
        let mut files = files();
        let mut site = Site::default();
        step.apply(&mut files, &mut site)?;

        assert_eq!(
            Value::Sequence(vec![Value::from("projects")]),
            files["projects/x/y.html"].metadata["collection"]
        );
        assert_eq!(
            Some(&["projects/x/y.md".to_owned()][..]),
            site.collection("projects")
        );
        assert_eq!(4, site.collection("posts").map_or(0, |m| m.len()));
        Ok(())
    }

    #[test]
    fn test_compare_missing_values_first() {
        let v = Value::from("2020-01-01");
        assert_eq!(Ordering::Less, compare(None, Some(&v)));
        assert_eq!(Ordering::Greater, compare(Some(&v), None));
    }

    #[test]
    fn test_compare_numbers_numerically() {
        assert_eq!(
            Ordering::Less,
            compare(Some(&Value::from(9)), Some(&Value::from(10)))
        );
    }
}
