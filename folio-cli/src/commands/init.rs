//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"site:
  title: "Your Name"
  author: "Your Name"
  description: "Researcher"
  url: "https://example.org"

paths:
  content: content
  pages: pages
  output: public

base_url: "/"
home: about

server:
  port: 8000
"#;

const STARTER_FILES: &[(&str, &str)] = &[
    (
        "pages/about.yml",
        "type: text\ntitle: About\nsource: about.md\norder: 1\ntoc: false\n",
    ),
    (
        "pages/publications.yml",
        "type: publication\ntitle: Publications\ndescription: Papers and preprints\nsource: publications.bib\norder: 2\n",
    ),
    (
        "pages/projects.yml",
        "type: card\ntitle: Projects\nsource: projects.yml\norder: 3\n",
    ),
    (
        "content/about.md",
        r#"---
title: About
description: A short biography
---

# Hello

I am a researcher. Edit `content/about.md` to write your biography, then run:

```bash
folio build
folio dev
```
"#,
    ),
    (
        "content/publications.bib",
        r#"% One entry per publication. Set hidden_bib = {true} to hide the BibTeX panel.
@inproceedings{doe2024example,
  author = {Jane Doe and John Smith},
  title = {An Example Paper},
  booktitle = {Proceedings of the Example Conference},
  year = {2024},
  abstract = {A one-paragraph summary shown under the entry.},
}
"#,
    ),
    (
        "content/projects.yml",
        r#"- title: Example project
  subtitle: 2024 - present
  description: A short **markdown** description.
  link: https://example.org
  tags: [research]
"#,
    ),
];

/// Initialize a new folio project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_if_missing(root, "folio.yml", DEFAULT_CONFIG)?;
    for (rel, contents) in STARTER_FILES {
        write_if_missing(root, rel, contents)?;
    }

    println!("✓ folio initialized in {:?}", root);
    println!("  - Edit folio.yml to customize site metadata");
    println!("  - Add pages in pages/ and their sources in content/");
    Ok(())
}

fn write_if_missing(root: &Path, rel: &str, contents: &str) -> Result<()> {
    let path = root.join(rel);
    if path.exists() {
        println!("{} already exists at {:?}", rel, path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(&path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("Created {:?}", path);
    Ok(())
}
