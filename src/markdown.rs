//! Defines the [`Markdown`] step, which converts markdown files to HTML.

use crate::file::Files;
use crate::pipeline::{Result, Site, Step};
use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

const MARKDOWN_EXTENSIONS: [&str; 2] = [".md", ".markdown"];
const HTML_EXTENSION: &str = ".html";

/// Renders the contents of every markdown file (`.md` or `.markdown`) to HTML
/// and renames the file to `.html`. Other files pass through untouched.
#[derive(Default)]
pub struct Markdown;

impl Markdown {
    pub fn new() -> Markdown {
        Markdown
    }
}

/// Converts markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

// Returns the key with its markdown extension replaced by `.html`, or `None`
// if `key` isn't a markdown file.
fn html_key(key: &str) -> Option<String> {
    MARKDOWN_EXTENSIONS.iter().find_map(|ext| {
        key.strip_suffix(ext)
            .map(|stem| format!("{}{}", stem, HTML_EXTENSION))
    })
}

impl Step for Markdown {
    fn name(&self) -> &str {
        "markdown"
    }

    fn apply(&self, files: &mut Files, _: &mut Site) -> Result<()> {
        let renames: Vec<(String, String)> = files
            .keys()
            .filter_map(|key| html_key(key).map(|html| (key.clone(), html)))
            .collect();

        for (key, html) in renames {
            if let Some(mut file) = files.remove(&key) {
                file.contents = to_html(&file.text()).into_bytes();
                debug!(file = %key, output = %html, "rendered markdown");
                files.insert(html, file);
            }
        }
        Ok(())
    }
}
