/*
 * templates.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Site boilerplate written next to the documentation.
 *
 * Templates are embedded at compile time via `include_str!()`.
 */

use std::path::{Path, PathBuf};

use crate::Result;
use crate::config::DocConfig;
use crate::error::NbdocError;

/// Jekyll site configuration, `<doc_path>/_config.yml`.
pub const CONFIG_YML: &str = include_str!("../resources/site/_config.yml");

/// Top navigation bar, `<doc_path>/_data/topnav.yml`.
pub const TOPNAV_YML: &str = include_str!("../resources/site/topnav.yml");

/// Project Makefile, next to the settings file.
pub const MAKEFILE: &str = include_str!("../resources/site/Makefile");

/// Where a site template is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRoot {
    DocDir,
    ProjectDir,
}

/// A template with the settings it needs and its destination.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Destination relative to `root`
    pub path: &'static str,
    pub root: TemplateRoot,
    /// Settings substituted for `{name}` slots
    pub names: &'static [&'static str],
    pub template: &'static str,
}

impl TemplateFile {
    const fn new(
        path: &'static str,
        root: TemplateRoot,
        names: &'static [&'static str],
        template: &'static str,
    ) -> Self {
        Self {
            path,
            root,
            names,
            template,
        }
    }

    /// Absolute destination for `config`.
    pub fn destination(&self, config: &DocConfig) -> PathBuf {
        let root = match self.root {
            TemplateRoot::DocDir => config.doc_dir(),
            TemplateRoot::ProjectDir => config.project_dir.clone(),
        };
        root.join(self.path)
    }
}

/// The boilerplate files of a documentation site.
pub static SITE_TEMPLATES: [TemplateFile; 3] = [
    TemplateFile::new(
        "_config.yml",
        TemplateRoot::DocDir,
        &["user", "lib_name", "title", "copyright", "description"],
        CONFIG_YML,
    ),
    TemplateFile::new(
        "_data/topnav.yml",
        TemplateRoot::DocDir,
        &["user", "lib_name"],
        TOPNAV_YML,
    ),
    TemplateFile::new(
        "Makefile",
        TemplateRoot::ProjectDir,
        &["nbs_path", "lib_name"],
        MAKEFILE,
    ),
];

/// Fill the `{name}` slots of `template` from the settings of `config`.
pub fn fill_template(template: &str, names: &[&str], config: &DocConfig) -> Result<String> {
    let mut output = template.to_string();
    for name in names {
        let value = config.value(name).ok_or_else(|| {
            NbdocError::other(format!("Missing setting '{}' required by template", name))
        })?;
        output = output.replace(&format!("{{{}}}", name), value);
    }
    Ok(output)
}

/// Write `template` to `dest` with its slots filled, unless `dest` exists.
///
/// Returns whether the file was written.
pub fn write_tmpl(template: &str, names: &[&str], config: &DocConfig, dest: &Path) -> Result<bool> {
    if dest.exists() {
        tracing::debug!(path = %dest.display(), "Keeping existing file");
        return Ok(false);
    }
    let output = fill_template(template, names, config)?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(dest, output)?;
    tracing::info!(path = %dest.display(), "Wrote template");
    Ok(true)
}

/// Write every site template that does not exist yet. Returns the paths
/// written.
pub fn write_tmpls(config: &DocConfig) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for file in &SITE_TEMPLATES {
        let dest = file.destination(config);
        if write_tmpl(file.template, file.names, config, &dest)? {
            written.push(dest);
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &Path) -> DocConfig {
        DocConfig::parse(
            "lib_name: mylib\nuser: someone\ntitle: My Lib\ncopyright: ACME\ndescription: Tools\n",
            dir,
        )
        .unwrap()
    }

    #[test]
    fn test_templates_embedded() {
        assert!(CONFIG_YML.contains("{lib_name}"));
        assert!(TOPNAV_YML.contains("{user}"));
        assert!(MAKEFILE.contains("{nbs_path}"));
    }

    #[test]
    fn test_fill_template() {
        let temp = TempDir::new().unwrap();
        let filled = fill_template("{user}/{lib_name} {other}", &["user", "lib_name"], &config(temp.path()))
            .unwrap();
        assert_eq!(filled, "someone/mylib {other}");
    }

    #[test]
    fn test_write_tmpls() {
        let temp = TempDir::new().unwrap();
        let written = write_tmpls(&config(temp.path())).unwrap();
        assert_eq!(written.len(), 3);

        let site = std::fs::read_to_string(temp.path().join("docs").join("_config.yml")).unwrap();
        assert!(site.contains("repository: someone/mylib"));
        assert!(site.contains("title: My Lib"));
        let topnav =
            std::fs::read_to_string(temp.path().join("docs").join("_data").join("topnav.yml"))
                .unwrap();
        assert!(topnav.contains("https://github.com/someone/mylib/"));
        let makefile = std::fs::read_to_string(temp.path().join("Makefile")).unwrap();
        assert!(makefile.contains("$(wildcard nbs/*.ipynb)"));
    }

    #[test]
    fn test_existing_files_are_not_overwritten() {
        let temp = TempDir::new().unwrap();
        let makefile = temp.path().join("Makefile");
        std::fs::write(&makefile, "custom").unwrap();

        let written = write_tmpls(&config(temp.path())).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(&makefile).unwrap(), "custom");
    }
}
