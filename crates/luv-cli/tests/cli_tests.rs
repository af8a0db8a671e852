//! End-to-end tests for the `luv` binary.
//!
//! `PATH` is cleared wherever a TeX tool could be reached, so these run the
//! same with or without a TeX Live install.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn luv(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("luv").unwrap();
    cmd.current_dir(dir).env("PATH", "").env_remove("RUST_LOG");
    cmd
}

fn initialized(main_tex: Option<&str>) -> TempDir {
    let dir = TempDir::new().unwrap();
    luv(dir.path()).arg("init").assert().success();
    if let Some(text) = main_tex {
        fs::write(dir.path().join("main.tex"), text).unwrap();
    }
    dir
}

#[test]
fn test_no_arguments_prints_help() {
    let dir = TempDir::new().unwrap();
    luv(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_info_outside_project() {
    let dir = TempDir::new().unwrap();
    luv(dir.path())
        .arg("info")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No luv.toml found"));
}

#[test]
fn test_init_creates_project() {
    let dir = TempDir::new().unwrap();
    luv(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Environment created successfully!"));

    assert!(dir.path().join("luv.toml").is_file());
    assert!(dir.path().join(".luv/texmf").is_dir());
    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(requirements.starts_with("# LaTeX package requirements"));
}

#[test]
fn test_init_with_options() {
    let dir = TempDir::new().unwrap();
    luv(dir.path())
        .args(["init", "--texfile", "thesis.tex", "--engine", "xelatex"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set texfile to thesis.tex"))
        .stdout(predicate::str::contains("Set engine to xelatex"));

    let manifest = fs::read_to_string(dir.path().join("luv.toml")).unwrap();
    assert!(manifest.contains("thesis.tex"));
    assert!(manifest.contains("xelatex"));
}

#[test]
fn test_init_rejects_unknown_engine() {
    let dir = TempDir::new().unwrap();
    luv(dir.path())
        .args(["init", "--engine", "context"])
        .assert()
        .failure();
    assert!(!dir.path().join("luv.toml").exists());
}

#[test]
fn test_second_init_fails() {
    let dir = initialized(None);
    luv(dir.path())
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Environment already exists"));
}

#[test]
fn test_info_after_init() {
    let dir = initialized(None);
    luv(dir.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("main.tex"))
        .stdout(predicate::str::contains("pdflatex"))
        .stdout(predicate::str::contains("Packages: 0 installed"));
}

#[test]
fn test_commands_work_from_subdirectory() {
    let dir = initialized(None);
    let chapters = dir.path().join("chapters");
    fs::create_dir(&chapters).unwrap();
    luv(&chapters).arg("info").assert().success();
}

#[test]
fn test_resolve_dry_run_json() {
    let dir = initialized(Some(
        r"\documentclass{article}
\usepackage[T1]{fontenc}
\usepackage{amsmath}
\begin{document}
\end{document}",
    ));

    let assert = luv(dir.path())
        .args(["resolve", "--dry-run", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    let packages = json["packages"].as_array().unwrap();
    assert!(packages.contains(&serde_json::json!("amsmath")));
    assert!(!packages.contains(&serde_json::json!("fontenc")));
    assert!(json["missing"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("amsmath")));

    // Dry run leaves the template untouched.
    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(!requirements.contains("\namsmath"));
}

#[test]
fn test_resolve_json_stdout_stays_parseable() {
    let dir = initialized(Some(r"\usepackage{booktabs}"));

    // With --no-update there is no prompt appended to the document.
    let assert = luv(dir.path())
        .args(["resolve", "--json", "--no-update"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(json["missing"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("booktabs")));
    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(!requirements.lines().any(|l| l == "booktabs"));

    // The default update reports on stderr.
    let assert = luv(dir.path()).args(["resolve", "--json"]).assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    serde_json::from_str::<serde_json::Value>(&stdout).unwrap();
    assert!(String::from_utf8_lossy(&assert.get_output().stderr).contains("Updated"));
    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(requirements.lines().any(|l| l == "booktabs"));
}

#[test]
fn test_resolve_updates_requirements() {
    let dir = initialized(Some(r"\usepackage{booktabs}"));
    luv(dir.path())
        .arg("resolve")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated"));

    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(requirements.contains("# Generated by 'luv resolve'"));
    assert!(requirements.lines().any(|l| l == "booktabs"));
}

#[test]
fn test_resolve_without_entry_file() {
    let dir = initialized(None);
    luv(dir.path())
        .arg("resolve")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TeX file not found: main.tex"));
}

#[test]
fn test_compile_without_entry_file() {
    let dir = initialized(None);
    luv(dir.path())
        .arg("compile")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TeX file not found"));
}

#[test]
fn test_compile_without_engine() {
    let dir = initialized(Some(r"\documentclass{article}\begin{document}Hi\end{document}"));
    luv(dir.path())
        .arg("compile")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "LaTeX engine 'pdflatex' not found. Please install it first.",
        ));
}

#[test]
fn test_sync_with_empty_requirements() {
    let dir = initialized(None);
    luv(dir.path())
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("No requirements found."));
}

#[test]
fn test_sync_without_tlmgr() {
    let dir = initialized(None);
    fs::write(dir.path().join("latex-requirements.txt"), "booktabs\n").unwrap();
    luv(dir.path())
        .arg("sync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("tlmgr not found"));
}

#[test]
fn test_add_core_package_is_skipped() {
    let dir = initialized(None);
    luv(dir.path())
        .args(["add", "fontenc"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Skipping fontenc (core LaTeX package, no installation needed)",
        ));

    let requirements = fs::read_to_string(dir.path().join("latex-requirements.txt")).unwrap();
    assert!(!requirements.lines().any(|l| l == "fontenc"));
}

#[test]
fn test_add_requires_package() {
    let dir = initialized(None);
    luv(dir.path()).arg("add").assert().failure();
}

#[test]
fn test_clean_removes_environment() {
    let dir = initialized(None);
    luv(dir.path()).arg("clean").assert().success();
    assert!(!dir.path().join(".luv").exists());
    assert!(dir.path().join("luv.toml").is_file());

    luv(dir.path())
        .arg("compile")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No environment found"));
}

#[cfg(unix)]
#[test]
fn test_interrupt_during_compile() {
    use std::os::unix::fs::PermissionsExt;
    use std::process::{Command as StdCommand, Stdio};
    use std::time::Duration;

    let dir = initialized(Some(r"\documentclass{article}\begin{document}Hi\end{document}"));
    let bin = dir.path().join("fake-bin");
    fs::create_dir(&bin).unwrap();
    let engine = bin.join("pdflatex");
    fs::write(&engine, "#!/bin/sh\nexec sleep 10\n").unwrap();
    fs::set_permissions(&engine, fs::Permissions::from_mode(0o755)).unwrap();

    let child = StdCommand::new(assert_cmd::cargo::cargo_bin("luv"))
        .arg("compile")
        .current_dir(dir.path())
        .env("PATH", format!("{}:/usr/bin:/bin", bin.display()))
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(1500));
    let status = StdCommand::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("Operation cancelled."));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Compilation successful!"));
}
