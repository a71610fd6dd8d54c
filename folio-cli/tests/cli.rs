use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn folio(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("folio").expect("folio binary");
    cmd.current_dir(dir).env_remove("FOLIO_CONFIG");
    cmd
}

fn write_bib(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    fs::write(
        dir.join("content/publications.bib"),
        r#"@article{smith2021,
  author = {John Smith and Mary Jones},
  title = {Fast Parsing},
  journal = {Journal of Parsing},
  year = {2021}
}

@inproceedings{jones2020,
  author = {Mary Jones},
  title = {Incremental Types},
  booktitle = {PL Conference},
  year = {2020}
}

@misc{notes2020,
  title = {Lecture notes},
  year = {2020}
}
"#,
    )?;
    Ok(())
}

#[test]
fn init_then_build_writes_site() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    folio(dir.path()).arg("init").assert().success();
    assert!(dir.path().join("folio.yml").exists());
    assert!(dir.path().join("pages/publications.yml").exists());

    folio(dir.path()).arg("build").assert().success();

    let public = dir.path().join("public");
    for file in [
        "about.html",
        "publications.html",
        "projects.html",
        "index.html",
        "404.html",
        "publications.json",
        "css/folio.css",
        "js/publications.js",
    ] {
        assert!(public.join(file).exists(), "missing {}", file);
    }

    let index = fs::read_to_string(public.join("index.html"))?;
    assert_eq!(index, fs::read_to_string(public.join("about.html"))?);

    let publications = fs::read_to_string(public.join("publications.html"))?;
    assert!(publications.contains("An Example Paper"));
    assert!(publications.contains(r#"data-year="2024""#));

    let json: Value = serde_json::from_str(&fs::read_to_string(public.join("publications.json"))?)?;
    assert_eq!(json["publications"]["records"][0]["id"], "doe2024example");
    Ok(())
}

#[test]
fn publications_command_filters() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    folio(dir.path()).arg("init").assert().success();
    write_bib(dir.path())?;

    let assert = folio(dir.path())
        .args(["publications", "publications", "--year", "2020", "--json"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["kind"], "publications.list");
    assert_eq!(value["data"]["total"], 3);
    assert_eq!(value["data"]["visible"], 2);

    let assert = folio(dir.path())
        .args([
            "publications",
            "publications",
            "--year",
            "2020",
            "--query",
            "smith",
            "--json",
        ])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["data"]["visible"], 0);

    folio(dir.path())
        .args(["publications", "publications", "--query", "SMITH"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[smith2021] Fast Parsing (2021, article)"))
        .stdout(predicate::str::contains("1 of 3 publications"));

    let assert = folio(dir.path())
        .args(["publications", "publications", "--options", "--json"])
        .assert()
        .success();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["data"]["years"], serde_json::json!([2021, 2020]));
    assert_eq!(
        value["data"]["types"],
        serde_json::json!(["article", "inproceedings", "misc"])
    );
    Ok(())
}

#[test]
fn publications_command_rejects_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    folio(dir.path()).arg("init").assert().success();

    folio(dir.path())
        .args(["publications", "about"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is a text page"));

    folio(dir.path())
        .args(["publications", "publications", "--year", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid year"));
    Ok(())
}

#[test]
fn verify_reports_diagnostics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    folio(dir.path()).arg("init").assert().success();

    folio(dir.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 errors"));

    fs::write(
        dir.path().join("content/publications.bib"),
        "@article{ok, title={Fine}, year={2020}}\n@article{broken, title={Never closed}\n",
    )?;
    fs::remove_file(dir.path().join("content/projects.yml"))?;

    let assert = folio(dir.path()).args(["verify", "--json"]).assert().failure();
    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["kind"], "site.verify");
    assert_eq!(value["data"]["errors"], 1);
    assert_eq!(value["data"]["warnings"], 1);

    let codes: Vec<&str> = value["data"]["diagnostics"]
        .as_array()
        .expect("diagnostics array")
        .iter()
        .filter_map(|d| d["code"].as_str())
        .collect();
    assert!(codes.contains(&"bibtex.entry_skipped"));
    assert!(codes.contains(&"content.not_found"));
    Ok(())
}

#[test]
fn missing_config_fails() {
    let dir = tempdir().expect("tempdir");
    folio(dir.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
