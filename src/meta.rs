//! Defines the [`Meta`] step, which fills in or requires a metadata field on
//! every file.

use crate::file::Files;
use crate::pipeline::{Result, Site, Step};
use serde_yaml::Value;
use tracing::warn;

/// Fills in or requires the metadata field `key` on every file.
///
/// A file lacking `key` gets the default value if one was given. Without a
/// default, the file is removed from the collection. Removal is not an error:
/// an author who forgets a required field gets no failed build, the file just
/// doesn't appear in the output, so each removal is logged as a warning.
pub struct Meta {
    key: String,
    default: Option<Value>,
}

impl Meta {
    /// Drops every file that lacks `key`.
    pub fn required(key: &str) -> Meta {
        Meta {
            key: key.to_owned(),
            default: None,
        }
    }

    /// Sets `key` to `default` on every file that lacks it.
    pub fn with_default(key: &str, default: impl Into<Value>) -> Meta {
        Meta {
            key: key.to_owned(),
            default: Some(default.into()),
        }
    }
}

impl Step for Meta {
    fn name(&self) -> &str {
        "meta"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> Result<()> {
        let key = &self.key;
        match &self.default {
            Some(default) => {
                for file in files.values_mut() {
                    file.metadata
                        .entry(key.clone())
                        .or_insert_with(|| default.clone());
                }
            }
            None => files.retain(|path, file| {
                let present = file.metadata.contains_key(key);
                if !present {
                    warn!(file = %path, field = %key, "dropping file missing required field");
                }
                present
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::file::File;

    fn files() -> Files {
        let mut files = Files::new();
        files.insert(
            "a.html".to_owned(),
            File::new("a.md", "a").with("title", "A").with("draft", true),
        );
        files.insert("b.html".to_owned(), File::new("b.md", "b"));
        files.insert(
            "c.html".to_owned(),
            File::new("c.md", "c").with("title", Value::Null),
        );
        files
    }

    #[test]
    fn test_required_drops_exactly_files_missing_key() -> Result<()> {
        let before = files();
        let mut after = before.clone();
        Meta::required("title").apply(&mut after, &mut Site::default())?;

        let keys: Vec<&str> = after.keys().map(String::as_str).collect();
        assert_eq!(vec!["a.html", "c.html"], keys);
        assert_eq!(before["a.html"], after["a.html"]);
        assert_eq!(before["c.html"], after["c.html"]);
        Ok(())
    }

    #[test]
    fn test_default_fills_missing_key() -> Result<()> {
        let mut files = files();
        Meta::with_default("title", "Untitled").apply(&mut files, &mut Site::default())?;
        assert_eq!(Some("A"), files["a.html"].str_field("title"));
        assert_eq!(Some("Untitled"), files["b.html"].str_field("title"));
        assert_eq!(Some(&Value::Null), files["c.html"].metadata.get("title"));
        Ok(())
    }

    #[test]
    fn test_default_is_idempotent() -> Result<()> {
        let step = Meta::with_default("template", "post.html");
        let mut once = files();
        step.apply(&mut once, &mut Site::default())?;
        let mut twice = once.clone();
        step.apply(&mut twice, &mut Site::default())?;
        assert_eq!(once, twice);
        Ok(())
    }
}
