//! Defines the [`Description`] step.

use crate::file::Files;
use crate::pipeline::{Result, Site, Step};
use serde_yaml::Value;

/// The number of characters of content used for a derived description.
pub const EXCERPT_LENGTH: usize = 100;

/// Sets the `description` field of every file that lacks one (absent, null,
/// `false`, zero, or empty) to the first [`EXCERPT_LENGTH`] characters of its contents. The
/// cut isn't aligned to words or sentences.
#[derive(Default)]
pub struct Description;

impl Description {
    pub fn new() -> Description {
        Description
    }
}

fn lacks_description(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n == 0.0 || n.is_nan()),
        Some(_) => false,
    }
}

impl Step for Description {
    fn name(&self) -> &str {
        "description"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> Result<()> {
        for file in files.values_mut() {
            if lacks_description(file.metadata.get("description")) {
                let excerpt: String = file.text().chars().take(EXCERPT_LENGTH).collect();
                file.metadata
                    .insert("description".to_owned(), Value::String(excerpt));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::file::File;

    #[test]
    fn test_description_is_first_hundred_characters() -> Result<()> {
        let body = "x".repeat(150);
        let mut files = Files::new();
        files.insert("a.html".to_owned(), File::new("a.md", body.as_str()));
        Description::new().apply(&mut files, &mut Site::default())?;
        assert_eq!(
            Some("x".repeat(100).as_str()),
            files["a.html"].str_field("description")
        );
        Ok(())
    }

    #[test]
    fn test_short_content_is_used_whole() -> Result<()> {
        let mut files = Files::new();
        files.insert("a.html".to_owned(), File::new("a.md", "<p>Hi</p>"));
        Description::new().apply(&mut files, &mut Site::default())?;
        assert_eq!(Some("<p>Hi</p>"), files["a.html"].str_field("description"));
        Ok(())
    }

    #[test]
    fn test_existing_description_is_untouched() -> Result<()> {
        let mut files = Files::new();
        files.insert(
            "a.html".to_owned(),
            File::new("a.md", "body").with("description", "Mine"),
        );
        let step = Description::new();
        step.apply(&mut files, &mut Site::default())?;
        step.apply(&mut files, &mut Site::default())?;
        assert_eq!(Some("Mine"), files["a.html"].str_field("description"));
        Ok(())
    }

    #[test]
    fn test_false_or_zero_description_is_replaced() -> Result<()> {
        let mut files = Files::new();
        files.insert(
            "a.html".to_owned(),
            File::new("a.md", "body").with("description", false),
        );
        files.insert(
            "b.html".to_owned(),
            File::new("b.md", "body").with("description", 0),
        );
        files.insert(
            "c.html".to_owned(),
            File::new("c.md", "body").with("description", true),
        );
        Description::new().apply(&mut files, &mut Site::default())?;
        assert_eq!(Some("body"), files["a.html"].str_field("description"));
        assert_eq!(Some("body"), files["b.html"].str_field("description"));
        assert_eq!(
            Some(&Value::Bool(true)),
            files["c.html"].metadata.get("description")
        );
        Ok(())
    }

    #[test]
    fn test_multibyte_content_is_not_split() -> Result<()> {
        let body = "é".repeat(120);
        let mut files = Files::new();
        files.insert("a.html".to_owned(), File::new("a.md", body.as_str()));
        Description::new().apply(&mut files, &mut Site::default())?;
        assert_eq!(
            100,
            files["a.html"].str_field("description").unwrap().chars().count()
        );
        Ok(())
    }
}
