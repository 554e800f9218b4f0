/*
 * cli_integration.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for the nbdoc command line.
 */

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::json;
use tempfile::TempDir;

fn nbdoc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nbdoc"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run nbdoc")
}

fn project() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    fs::write(
        temp.path().join("nbdoc.yml"),
        "lib_name: mylib\nuser: someone\ntitle: My Lib\ncopyright: ACME\ndescription: Tools\n",
    )
    .unwrap();
    let nbs = temp.path().join("nbs");
    fs::create_dir_all(&nbs).unwrap();
    let notebook = json!({
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": "# Core\n\n> Core helpers"},
            {"cell_type": "code", "metadata": {}, "execution_count": null, "outputs": [], "source": "1 + 1"}
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 4
    });
    fs::write(nbs.join("00_core.ipynb"), notebook.to_string()).unwrap();
    temp
}

#[test]
fn test_build_docs_without_execution() {
    let temp = project();
    let output = nbdoc(temp.path(), &["build-docs", "--no-execute", "--n-workers", "0"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let page = fs::read_to_string(temp.path().join("docs").join("core.html")).unwrap();
    assert!(page.contains("title: \"Core\""));
    assert!(page.contains("1 + 1"));
}

#[test]
fn test_build_docs_reports_failures() {
    let temp = project();
    fs::write(temp.path().join("nbs").join("01_broken.ipynb"), "{").unwrap();
    let output = nbdoc(temp.path(), &["build-docs", "--no-execute", "--max-jitter", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("01_broken.ipynb"));
    assert!(temp.path().join("docs").join("core.html").is_file());
}

#[test]
fn test_convert_md() {
    let temp = project();
    let output = nbdoc(
        temp.path(),
        &["convert-md", "nbs/00_core.ipynb", "--dest", "md", "--no-jekyll"],
    );
    assert!(output.status.success());
    let page = fs::read_to_string(temp.path().join("md").join("core.md")).unwrap();
    assert!(page.starts_with("# Core\n> Core helpers"));
}

#[test]
fn test_init_templates_with_explicit_config() {
    let temp = project();
    let elsewhere = TempDir::new().unwrap();
    let config = temp.path().join("nbdoc.yml");
    let output = nbdoc(
        elsewhere.path(),
        &["--config", config.to_str().unwrap(), "init-templates"],
    );
    assert!(output.status.success());
    assert!(temp.path().join("docs").join("_config.yml").is_file());
    assert!(temp.path().join("Makefile").is_file());
}

#[test]
fn test_detach_to_stdout_leaves_file() {
    let temp = project();
    let nb = temp.path().join("pasted.ipynb");
    let original = json!({
        "cells": [{
            "cell_type": "markdown",
            "metadata": {},
            "source": "![image.png](attachment:image.png)",
            "attachments": {"image.png": {"image/png": "aGVsbG8="}}
        }],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 4
    })
    .to_string();
    fs::write(&nb, &original).unwrap();

    let output = nbdoc(temp.path(), &["detach", "pasted.ipynb", "--stdout"]);
    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(printed["cells"][0].get("attachments").is_none());
    assert_eq!(fs::read_to_string(&nb).unwrap(), original);
    assert!(temp.path().join("pasted_files").join("att_00000.png").is_file());
}

#[test]
fn test_outside_project_is_an_error() {
    let temp = TempDir::new().unwrap();
    let output = nbdoc(temp.path(), &["build-docs"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nbdoc.yml"));
}
