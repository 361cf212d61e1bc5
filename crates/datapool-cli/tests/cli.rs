use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A catalog with one flat CSV dataset in two versions.
fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "foo/v1/a.csv", "id,value\n1,0.5\n");
    write(root, "foo/v2/a.csv", "id,value\n1,1.5\n2,-9999\n");
    write(root, "foo/v2/b.csv", "id,value\n3,2.5\n");

    let config = root.join("catalog.yaml");
    let yaml = format!(
        "datasets:\n  foo:\n    path: {}\n    display_name: Foo Survey\n    tags: [ice]\n    extension: csv\n    no_data_value: -9999\n",
        root.join("foo").display()
    );
    fs::write(&config, yaml).unwrap();
    (dir, config)
}

fn datapool(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("datapool").unwrap();
    cmd.env_remove("DATAPOOL_CONFIG").arg("--config").arg(config);
    cmd
}

#[test]
fn formats_need_no_catalog() {
    Command::cargo_bin("datapool")
        .unwrap()
        .env_remove("DATAPOOL_CONFIG")
        .arg("formats")
        .assert()
        .success()
        .stdout(predicate::str::contains("geojson"))
        .stdout(predicate::str::contains("Planned"));
}

#[test]
fn list_and_latest() {
    let (_dir, config) = fixture();

    datapool(&config)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("foo"))
        .stdout(predicate::str::contains("v2"));

    datapool(&config)
        .args(["latest", "foo"])
        .assert()
        .success()
        .stdout("v2\n");
}

#[test]
fn config_comes_from_the_environment() {
    let (_dir, config) = fixture();

    Command::cargo_bin("datapool")
        .unwrap()
        .env("DATAPOOL_CONFIG", &config)
        .args(["versions", "foo"])
        .assert()
        .success()
        .stdout("v1\nv2\n");
}

#[test]
fn missing_config_is_explained() {
    Command::cargo_bin("datapool")
        .unwrap()
        .env_remove("DATAPOOL_CONFIG")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATAPOOL_CONFIG is not set"));
}

#[test]
fn search_filters_by_tag() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["search", "ICE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo"));

    datapool(&config)
        .args(["search", "ocean"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching catalog entries."));
}

#[test]
fn describe_a_version() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["describe", "foo", "--version", "v2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Available subdatasets: none"))
        .stdout(predicate::str::contains("datapool load foo --version v2"));
}

#[test]
fn subdatasets_of_a_flat_dataset() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["subdatasets", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No subdatasets defined for this dataset."));
}

#[test]
fn load_previews_records() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["load", "foo", "--head", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 records"))
        .stdout(predicate::str::contains("First 2 records"));
}

#[test]
fn load_writes_csv() {
    let (dir, config) = fixture();
    let output = dir.path().join("foo.csv");

    datapool(&config)
        .args(["load", "foo", "--version", "v1", "--output"])
        .arg(&output)
        .assert()
        .success();

    let text = fs::read_to_string(output).unwrap();
    assert_eq!(text.lines().next(), Some("id,value"));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn inapplicable_option_reports_hint() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["load", "foo", "--static", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'static' is not applicable for dataset 'foo'"))
        .stderr(predicate::str::contains("Hint: Omit --static."));
}

#[test]
fn unknown_dataset_fails() {
    let (_dir, config) = fixture();

    datapool(&config)
        .args(["versions", "bar"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No versions found for dataset 'bar'"));
}
