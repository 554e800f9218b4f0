/*
 * patterns.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Recognizers for notebook directives and markup.
 */

//! Text recognizers over cell sources.
//!
//! Every structural pattern the pipeline relies on lives here, behind a
//! named function. Patterns are line based; fenced code blocks are not
//! treated specially, so a directive inside a fence is still recognized.
//!
//! | Recognizer | Example match |
//! |------------|---------------|
//! | [`is_export_cell`] | `# export`, `#exports` (any case) |
//! | [`is_hidden_cell`] | `#hide`, `#default_exp core`, `#default_cls_lvl 3` |
//! | [`hides_input`] | `show_doc(f)`, `# export\n`, `#hide_input\n` |
//! | [`show_doc_target`] | `show_doc(Foo, title_level=3)` -> `Foo` |
//! | [`IMAGE`] | `![alt](img.png)`, `<img src="img.png">` |
//! | [`BLOCK_NOTE`] | `> Note: be careful` |
//! | [`is_fake_header`] | `## Section -` |
//! | [`title_summary`] | `# Title\n\n> Summary` |
//! | [`properties`] | `- Author: Jane` |
//! | [`default_class_level`] | `#default_cls_lvl 3` -> 3 |
//! | [`default_export`] | `#default_exp core` -> `core` |

use once_cell::sync::Lazy;
use regex::Regex;

use crate::attrs::TagAttrs;

/// `# export` / `# exports` lines, case-insensitive.
pub static EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*#\s*exports?\s*").expect("valid regex"));

/// Cells whose input should be hidden in the rendered page.
static CELL_TO_HIDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)show_doc\(|^\s*#\s*export\s+|^\s*#\s*hide_input\s+").expect("valid regex")
});

/// A leading `#exports` line, including its newline.
pub static EXPORTS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A#\s*exports[^\n]*\n").expect("valid regex"));

/// Cells dropped from the output entirely.
static CELL_TO_REMOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\s*#\s*(hide|default_exp|default_cls_lvl)(?:\s+|\z)").expect("valid regex")
});

/// First argument of a `show_doc` call.
pub static SHOW_DOC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)show_doc\s*\(\s*([^,\)\s]*)[,\)\s]").expect("valid regex")
});

/// Markdown image (groups 1-3) or a line-leading `<img>` tag (group 4).
pub static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(!\[[^\]]*\]\()([^\)]*)(\))|^(<img [^>]*>)").expect("valid regex")
});

/// `> Title: text` block quotes; title in group 1, text in group 2.
pub static BLOCK_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*>\s*([^:]*):\s*([^\n]*)(?:\n|$)").expect("valid regex"));

/// A heading used as a visual separator: ends with `-`.
static FAKE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#+\s+.*-\s*$").expect("valid regex"));

static TITLE_SUMMARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*#\s+([^\n]*)\n+>[ ]*([^\n]*)").expect("valid regex"));

static PROPERTIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^-\s+(.*?)\s*:\s*(.*?)$").expect("valid regex"));

static DEFAULT_CLS_LVL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*#\s*default_cls_lvl\s*(\d*)\s*$").expect("valid regex")
});

static DEFAULT_EXP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*#\s*default_exp\s+(\S+)").expect("valid regex"));

/// Leading ordering prefix of notebook file names, e.g. `00_`.
pub static DIGIT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\S*?_").expect("valid regex"));

/// Image references emitted by the markdown exporter for extracted outputs.
pub static RENDERED_PNG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[png\]\((.+)\)").expect("valid regex"));
pub static RENDERED_SVG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[svg\]\((.+)\)").expect("valid regex"));

/// Token notebook editors use to reference a pasted image attachment.
pub const ATTACHMENT_TOKEN: &str = "attachment:image.png";

/// Which form an image reference takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Markdown,
    Html,
}

/// Classification of a cell source by the first directive it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    NoMatch,
    ExportMarker,
    HideMarker,
    ShowDoc(String),
    Image {
        kind: ImageKind,
        path: String,
        attrs: TagAttrs,
    },
}

/// Classify `source`. Removal markers win over export markers, which win
/// over `show_doc` calls, which win over images.
pub fn classify(source: &str) -> Directive {
    if is_hidden_cell(source) {
        return Directive::HideMarker;
    }
    if is_export_cell(source) {
        return Directive::ExportMarker;
    }
    if let Some(name) = show_doc_target(source) {
        return Directive::ShowDoc(name.to_string());
    }
    if let Some(caps) = IMAGE.captures(source) {
        if let Some(tag) = caps.get(4) {
            let attrs = TagAttrs::parse(tag.as_str());
            let path = attrs.attrs.get("src").cloned().unwrap_or_default();
            return Directive::Image {
                kind: ImageKind::Html,
                path,
                attrs,
            };
        }
        if let Some(path) = caps.get(2) {
            return Directive::Image {
                kind: ImageKind::Markdown,
                path: path.as_str().to_string(),
                attrs: TagAttrs::default(),
            };
        }
    }
    Directive::NoMatch
}

pub fn is_export_cell(source: &str) -> bool {
    EXPORT.is_match(source)
}

pub fn hides_input(source: &str) -> bool {
    CELL_TO_HIDE.is_match(source)
}

/// `#hide`, `#default_exp` and `#default_cls_lvl` at the very start of a
/// source. `#hide_input` is a different marker and does not match.
pub fn is_hidden_cell(source: &str) -> bool {
    CELL_TO_REMOVE.is_match(source)
}

pub fn is_fake_header(source: &str) -> bool {
    FAKE_HEADER.is_match(source)
}

/// First argument of the first `show_doc` call in `source`.
pub fn show_doc_target(source: &str) -> Option<&str> {
    SHOW_DOC
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Title and summary when `source` starts with `# Title` then `> Summary`.
pub fn title_summary(source: &str) -> Option<(&str, &str)> {
    let caps = TITLE_SUMMARY.captures(source)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Every `- Key: Value` line in `source`, in order.
pub fn properties(source: &str) -> Vec<(&str, &str)> {
    PROPERTIES
        .captures_iter(source)
        .filter_map(|caps| Some((caps.get(1)?.as_str(), caps.get(2)?.as_str())))
        .collect()
}

/// Level given by a `#default_cls_lvl N` line, if present and numeric.
pub fn default_class_level(source: &str) -> Option<u32> {
    DEFAULT_CLS_LVL
        .captures(source)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Module named by a `#default_exp name` line.
pub fn default_export(source: &str) -> Option<&str> {
    DEFAULT_EXP
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Cells worth executing: `show_doc(...)` calls and imports from `lib_name`.
#[derive(Debug, Clone)]
pub struct ExecutablePattern {
    regex: Regex,
}

impl ExecutablePattern {
    pub fn new(lib_name: &str) -> Self {
        let pattern = format!(
            r"(?m)^\s*show_doc\(([^\)]*)\)|^from {}\.",
            regex::escape(lib_name)
        );
        Self {
            regex: Regex::new(&pattern).expect("escaped library name forms a valid regex"),
        }
    }

    pub fn is_match(&self, source: &str) -> bool {
        self.regex.is_match(source)
    }
}

/// Notebook file name without its ordering prefix.
pub fn strip_digit_prefix(name: &str) -> &str {
    match DIGIT_PREFIX.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_marker() {
        assert!(is_export_cell("#export\ndef f(): pass"));
        assert!(is_export_cell("  # Exports\nx = 1"));
        assert!(is_export_cell("x = 1\n# export"));
        assert!(!is_export_cell("def export(): pass"));
    }

    #[test]
    fn test_hidden_cell_markers() {
        assert!(is_hidden_cell("#hide"));
        assert!(is_hidden_cell("#hide\nimport os"));
        assert!(is_hidden_cell("#default_exp foo"));
        assert!(is_hidden_cell("#default_cls_lvl 3"));
        assert!(is_hidden_cell(" # hide\n"));
        assert!(!is_hidden_cell("#hide_input"));
        assert!(!is_hidden_cell("x = 1\n#hide"));
    }

    #[test]
    fn test_hides_input() {
        assert!(hides_input("show_doc(f)"));
        assert!(hides_input("#export\ndef f(): pass"));
        assert!(hides_input("#hide_input\nplot()"));
        assert!(!hides_input("#exports\ndef f(): pass"));
        assert!(!hides_input("#export"));
    }

    #[test]
    fn test_show_doc_target() {
        assert_eq!(show_doc_target("show_doc(Foo)"), Some("Foo"));
        assert_eq!(show_doc_target("show_doc( Foo.bar, title_level=3)"), Some("Foo.bar"));
        assert_eq!(show_doc_target("print(1)"), None);
    }

    #[test]
    fn test_image_pattern() {
        let caps = IMAGE.captures("text\n![alt](images/a.png)\n").unwrap();
        assert_eq!(&caps[2], "images/a.png");
        let caps = IMAGE.captures(r#"<img src="a.png" width="50">"#).unwrap();
        assert_eq!(&caps[4], r#"<img src="a.png" width="50">"#);
        assert!(IMAGE.captures("see ![alt](a.png) inline").is_none());
    }

    #[test]
    fn test_fake_header() {
        assert!(is_fake_header("## Section -"));
        assert!(is_fake_header("# Export -\n"));
        assert!(!is_fake_header("## A real header"));
    }

    #[test]
    fn test_title_summary() {
        assert_eq!(
            title_summary("# My Title\n\n> A summary\n- Author: Jane\n"),
            Some(("My Title", "A summary"))
        );
        assert_eq!(title_summary("Some text\n# Title\n\n> Summary"), None);
    }

    #[test]
    fn test_properties() {
        assert_eq!(
            properties("# T\n\n> S\n- Author: Jane\n- status : draft\n"),
            vec![("Author", "Jane"), ("status", "draft")]
        );
    }

    #[test]
    fn test_default_class_level() {
        assert_eq!(default_class_level("#default_cls_lvl 3"), Some(3));
        assert_eq!(default_class_level("x = 1\n# DEFAULT_CLS_LVL 4\n"), Some(4));
        assert_eq!(default_class_level("#default_cls_lvl"), None);
    }

    #[test]
    fn test_default_export() {
        assert_eq!(default_export("#default_exp core.utils"), Some("core.utils"));
        assert_eq!(default_export("#export"), None);
    }

    #[test]
    fn test_executable_pattern() {
        let pattern = ExecutablePattern::new("mylib");
        assert!(pattern.is_match("show_doc(f)"));
        assert!(pattern.is_match("from mylib.core import *"));
        assert!(!pattern.is_match("from mylibrary.core import *"));
        assert!(!pattern.is_match("x = show_doc(f)"));
        assert!(!pattern.is_match("import numpy"));
    }

    #[test]
    fn test_strip_digit_prefix() {
        assert_eq!(strip_digit_prefix("00_core.ipynb"), "core.ipynb");
        assert_eq!(strip_digit_prefix("01a_data_block.ipynb"), "data_block.ipynb");
        assert_eq!(strip_digit_prefix("index.ipynb"), "index.ipynb");
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("#hide\nx"), Directive::HideMarker);
        assert_eq!(classify("#export\ndef f(): pass"), Directive::ExportMarker);
        assert_eq!(classify("show_doc(f)"), Directive::ShowDoc("f".to_string()));
        assert!(matches!(
            classify("![a](b.png)"),
            Directive::Image { kind: ImageKind::Markdown, ref path, .. } if path == "b.png"
        ));
        assert!(matches!(
            classify(r#"<img src="c.png">"#),
            Directive::Image { kind: ImageKind::Html, ref path, .. } if path == "c.png"
        ));
        assert_eq!(classify("plain text"), Directive::NoMatch);
    }
}
