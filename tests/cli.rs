use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn make_project(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(dir.join("Assets/Scripts")).unwrap();
    fs::write(dir.join("Assets/Scripts/Player.cs"), "class Player {}").unwrap();
    fs::create_dir_all(dir.join("Library/ShaderCache")).unwrap();
    fs::write(dir.join("Library/ShaderCache/a.bin"), "cache").unwrap();
    fs::create_dir_all(dir.join("Temp")).unwrap();
    fs::write(dir.join("Temp/lock"), "").unwrap();
}

fn setup_test_root() -> tempfile::TempDir {
    let root = tempdir().unwrap();
    make_project(root.path(), "alpha");
    make_project(root.path(), "beta");

    // Not a project: no Assets folder
    fs::create_dir_all(root.path().join("notes")).unwrap();
    fs::write(root.path().join("notes/todo.txt"), "ship it").unwrap();

    root
}

fn zip_files(root: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|n| n.ends_with(".zip"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_archives_each_project() {
    let root = setup_test_root();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/2] Processing project: alpha"))
        .stdout(predicate::str::contains("[2/2] Processing project: beta"))
        .stdout(predicate::str::contains("Processing complete!"));

    assert_eq!(zip_files(root.path()), vec!["alpha.zip", "beta.zip"]);

    // Originals and the non-project folder are untouched
    assert!(root.path().join("alpha/Library/ShaderCache/a.bin").exists());
    assert!(root.path().join("beta/Assets/Scripts/Player.cs").exists());
    assert_eq!(
        fs::read_to_string(root.path().join("notes/todo.txt")).unwrap(),
        "ship it"
    );
}

#[test]
fn test_missing_root_is_an_error() {
    let root = tempdir().unwrap();
    let missing = root.path().join("does-not-exist");

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_no_projects_is_not_an_error() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("docs")).unwrap();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects found."));

    assert!(zip_files(root.path()).is_empty());
}

#[test]
fn test_clean_flag_removes_cache_folders() {
    let root = setup_test_root();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .arg("--clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache cleaning enabled"))
        .stdout(predicate::str::contains("Deleted: Library"));

    for project in ["alpha", "beta"] {
        assert!(!root.path().join(project).join("Library").exists());
        assert!(!root.path().join(project).join("Temp").exists());
        assert!(root.path().join(project).join("Assets").exists());
    }
}

#[test]
fn test_declined_confirmation_touches_nothing() {
    for answer in ["n\n", "yes\n", "Y\n", ""] {
        let root = setup_test_root();

        let mut cmd = Command::cargo_bin("packrat").unwrap();
        cmd.arg(root.path())
            .arg("--delete")
            .write_stdin(answer)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Aborted"));

        assert!(zip_files(root.path()).is_empty(), "answer {:?}", answer);
        assert!(root.path().join("alpha").is_dir());
        assert!(root.path().join("beta").is_dir());
    }
}

#[test]
fn test_confirmed_delete_removes_originals() {
    let root = setup_test_root();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .arg("-d")
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted original directory"));

    assert_eq!(zip_files(root.path()), vec!["alpha.zip", "beta.zip"]);
    assert!(!root.path().join("alpha").exists());
    assert!(!root.path().join("beta").exists());
    assert!(root.path().join("notes/todo.txt").exists());
}

#[test]
fn test_rerun_ignores_existing_archives() {
    let root = setup_test_root();

    Command::cargo_bin("packrat")
        .unwrap()
        .arg(root.path())
        .assert()
        .success();
    Command::cargo_bin("packrat")
        .unwrap()
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/2]"));

    assert_eq!(zip_files(root.path()), vec!["alpha.zip", "beta.zip"]);
}

#[test]
fn test_extra_exclude_flag() {
    let root = setup_test_root();
    fs::create_dir_all(root.path().join("alpha/Builds")).unwrap();
    fs::write(root.path().join("alpha/Builds/game.exe"), "binary").unwrap();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .arg("-x")
        .arg("Builds")
        .arg("--verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("adding Assets/Scripts/Player.cs"))
        .stdout(predicate::str::contains("Builds/game.exe").not());

    // Exclusion is archive-only; the folder stays on disk
    assert!(root.path().join("alpha/Builds/game.exe").exists());
}

#[test]
fn test_custom_config_file() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("crate/src")).unwrap();
    fs::write(root.path().join("crate/src/lib.rs"), "").unwrap();
    fs::create_dir_all(root.path().join("crate/target/debug")).unwrap();
    fs::create_dir_all(root.path().join("game/Assets")).unwrap();

    let config_dir = tempdir().unwrap();
    let config = config_dir.path().join("packrat.toml");
    fs::write(
        &config,
        "[project]\nmarker = \"src\"\n\n[folders]\ncache = [\"target\"]\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .arg("--config")
        .arg(&config)
        .arg("--clean")
        .assert()
        .success();

    assert_eq!(zip_files(root.path()), vec!["crate.zip"]);
    assert!(!root.path().join("crate/target").exists());
}

#[test]
fn test_invalid_exclude_name_is_rejected() {
    let root = setup_test_root();

    let mut cmd = Command::cargo_bin("packrat").unwrap();
    cmd.arg(root.path())
        .arg("-x")
        .arg("../escape")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bare directory name"));

    assert!(zip_files(root.path()).is_empty());
}
