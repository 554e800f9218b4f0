/*
 * transforms/images.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Image reference rewriting for HTML and Markdown targets.
 */

//! Image reference rewriting.
//!
//! Notebooks reference images relative to their own directory, either as
//! markdown (`![alt](images/a.png)`) or as a line-leading `<img>` tag. The
//! rendered page lives elsewhere, so each reference is rewritten:
//!
//! - HTML target ([`copy_images`]): the file is copied into the documentation
//!   directory at the same relative path and the reference gets the site's
//!   base URL as prefix.
//! - Markdown target ([`adapt_img_path`]): nothing is copied; the reference is
//!   made relative from the output directory back to the image.
//!
//! `<img>` tags are rewritten as a Jekyll `image.html` include in Jekyll
//! mode, with `src` renamed to `file` and `width` to `max-width`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use regex::Captures;

use crate::Result;
use crate::attrs::TagAttrs;
use crate::error::NbdocError;
use crate::notebook::Cell;
use crate::patterns::IMAGE;
use crate::transform::CellTransform;

/// Write a parsed `<img>` tag back out, as a Jekyll include or as HTML.
pub fn img2jkl(mut tag: TagAttrs, jekyll: bool) -> String {
    if !jekyll {
        return format!("<img {}>", tag.attrs_to_string());
    }
    tag.rename("width", "max-width");
    tag.rename("src", "file");
    format!("{{% include image.html {} %}}", tag.attrs_to_string())
}

/// Copy the images referenced in `cell` from the directory of `fname` into
/// `dest`, and point the references at the copies under `doc_baseurl`.
///
/// # Errors
///
/// Returns [`NbdocError::MissingImage`] when a referenced file does not exist.
pub fn copy_images(
    cell: &mut Cell,
    fname: &Path,
    dest: &Path,
    doc_baseurl: &str,
    jekyll: bool,
) -> Result<()> {
    let nb_dir = parent_dir(fname);
    cell.source = try_replace_images(&cell.source, |caps| {
        if let Some(tag) = caps.get(4) {
            let mut tag = TagAttrs::parse(tag.as_str());
            let src = tag.attrs.get("src").cloned().unwrap_or_default();
            copy_image(&nb_dir, dest, &src)?;
            if let Some(value) = tag.attrs.get_mut("src") {
                *value = format!("{}{}", doc_baseurl, src);
            }
            Ok(img2jkl(tag, jekyll))
        } else {
            let src = &caps[2];
            copy_image(&nb_dir, dest, src)?;
            Ok(format!("{}{}{}{}", &caps[1], doc_baseurl, src, &caps[3]))
        }
    })?;
    Ok(())
}

/// Rewrite image references in a markdown cell so they resolve from `dest`.
pub fn adapt_img_path(cell: &mut Cell, fname: &Path, dest: &Path, jekyll: bool) -> Result<()> {
    if !cell.is_markdown() {
        return Ok(());
    }
    let nb_dir = parent_dir(fname);
    cell.source = try_replace_images(&cell.source, |caps| {
        if let Some(tag) = caps.get(4) {
            let mut tag = TagAttrs::parse(tag.as_str());
            if let Some(src) = tag.attrs.get_mut("src") {
                *src = relative_to(&existing_image(&nb_dir, src)?, dest)?;
            }
            Ok(img2jkl(tag, jekyll))
        } else {
            let img = relative_to(&existing_image(&nb_dir, &caps[2])?, dest)?;
            Ok(format!("{}{}{}", &caps[1], img, &caps[3]))
        }
    })?;
    Ok(())
}

fn parent_dir(fname: &Path) -> PathBuf {
    fname
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn existing_image(nb_dir: &Path, src: &str) -> Result<PathBuf> {
    let path = nb_dir.join(src);
    if !path.is_file() {
        return Err(NbdocError::MissingImage(path));
    }
    Ok(path)
}

fn copy_image(nb_dir: &Path, dest: &Path, src: &str) -> Result<()> {
    let from = existing_image(nb_dir, src)?;
    let to = dest.join(src);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(&from, &to)?;
    tracing::debug!(from = %from.display(), to = %to.display(), "Copied image");
    Ok(())
}

/// Path of `target` relative to the directory `base`, with `/` separators.
fn relative_to(target: &Path, base: &Path) -> Result<String> {
    let target = std::path::absolute(target)?;
    let base = std::path::absolute(base)?;
    let relative = pathdiff::diff_paths(&target, &base).unwrap_or(target);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

/// Like `Regex::replace_all` over [`IMAGE`], with a fallible replacer.
fn try_replace_images<F>(source: &str, mut replace: F) -> Result<String>
where
    F: FnMut(&Captures) -> Result<String>,
{
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for caps in IMAGE.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&source[last..whole.start()]);
        out.push_str(&replace(&caps)?);
        last = whole.end();
    }
    out.push_str(&source[last..]);
    Ok(out)
}

/// Copy images into the documentation directory (HTML target).
pub struct CopyImages {
    fname: PathBuf,
    dest: PathBuf,
    doc_baseurl: String,
    jekyll: bool,
}

impl CopyImages {
    pub fn new(
        fname: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
        doc_baseurl: impl Into<String>,
        jekyll: bool,
    ) -> Self {
        Self {
            fname: fname.into(),
            dest: dest.into(),
            doc_baseurl: doc_baseurl.into(),
            jekyll,
        }
    }
}

impl CellTransform for CopyImages {
    fn name(&self) -> &str {
        "copy-images"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        copy_images(cell, &self.fname, &self.dest, &self.doc_baseurl, self.jekyll)
    }
}

/// Make image paths relative to the output directory (Markdown target).
pub struct AdaptImgPath {
    fname: PathBuf,
    dest: PathBuf,
    jekyll: bool,
}

impl AdaptImgPath {
    pub fn new(fname: impl Into<PathBuf>, dest: impl Into<PathBuf>, jekyll: bool) -> Self {
        Self {
            fname: fname.into(),
            dest: dest.into(),
            jekyll,
        }
    }
}

impl CellTransform for AdaptImgPath {
    fn name(&self) -> &str {
        "adapt-img-path"
    }

    fn transform(&self, cell: &mut Cell) -> Result<()> {
        adapt_img_path(cell, &self.fname, &self.dest, self.jekyll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let nbs = temp.path().join("nbs");
        let docs = temp.path().join("docs");
        fs::create_dir_all(nbs.join("images")).unwrap();
        fs::write(nbs.join("images").join("a.png"), b"png-bytes").unwrap();
        (temp, nbs, docs)
    }

    #[test]
    fn test_img2jkl() {
        let tag = TagAttrs::parse(r#"<img src="a.png" width="50" alt="x">"#);
        assert_eq!(
            img2jkl(tag.clone(), true),
            r#"{% include image.html alt="x" max-width="50" file="a.png" %}"#
        );
        assert_eq!(img2jkl(tag, false), r#"<img src="a.png" width="50" alt="x">"#);
    }

    #[test]
    fn test_copy_markdown_image() {
        let (_temp, nbs, docs) = project();
        let mut cell = Cell::markdown("Look:\n![diagram](images/a.png)\n");
        copy_images(&mut cell, &nbs.join("00_core.ipynb"), &docs, "/mylib/", true).unwrap();
        assert_eq!(cell.source, "Look:\n![diagram](/mylib/images/a.png)\n");
        assert_eq!(fs::read(docs.join("images").join("a.png")).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_copy_html_image_as_jekyll_include() {
        let (_temp, nbs, docs) = project();
        let mut cell = Cell::markdown(r#"<img src="images/a.png" width="300">"#);
        copy_images(&mut cell, &nbs.join("00_core.ipynb"), &docs, "/", true).unwrap();
        assert_eq!(
            cell.source,
            r#"{% include image.html max-width="300" file="/images/a.png" %}"#
        );
        assert!(docs.join("images").join("a.png").is_file());
    }

    #[test]
    fn test_copy_twice_is_harmless() {
        let (_temp, nbs, docs) = project();
        for _ in 0..2 {
            let mut cell = Cell::markdown("![x](images/a.png)");
            copy_images(&mut cell, &nbs.join("nb.ipynb"), &docs, "/", false).unwrap();
        }
        assert!(docs.join("images").join("a.png").is_file());
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let (_temp, nbs, docs) = project();
        let mut cell = Cell::markdown("![x](images/missing.png)");
        let err = copy_images(&mut cell, &nbs.join("nb.ipynb"), &docs, "/", true).unwrap_err();
        assert!(matches!(err, NbdocError::MissingImage(_)));
    }

    #[test]
    fn test_adapt_img_path() {
        let (_temp, nbs, docs) = project();
        let mut cell = Cell::markdown("![x](images/a.png)\n<img src=\"images/a.png\">");
        adapt_img_path(&mut cell, &nbs.join("nb.ipynb"), &docs, false).unwrap();
        assert_eq!(
            cell.source,
            "![x](../nbs/images/a.png)\n<img src=\"../nbs/images/a.png\">"
        );
        assert!(!docs.exists());
    }

    #[test]
    fn test_adapt_missing_image_is_an_error() {
        let (_temp, nbs, docs) = project();
        for source in ["![x](images/missing.png)", "<img src=\"images/missing.png\">"] {
            let mut cell = Cell::markdown(source);
            let err = adapt_img_path(&mut cell, &nbs.join("nb.ipynb"), &docs, false).unwrap_err();
            match err {
                NbdocError::MissingImage(path) => assert!(path.ends_with("images/missing.png")),
                other => panic!("unexpected error: {other:?}"),
            }
            assert_eq!(cell.source, source);
        }
    }

    #[test]
    fn test_adapt_img_path_skips_code() {
        let (_temp, nbs, docs) = project();
        let mut cell = Cell::code("![x](images/a.png)");
        adapt_img_path(&mut cell, &nbs.join("nb.ipynb"), &docs, true).unwrap();
        assert_eq!(cell.source, "![x](images/a.png)");
    }
}
