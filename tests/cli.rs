mod common;

use std::fs;

use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

use common::TestWorkspace;

const SOURCE_CSV: &str = "\
Nombre programa,Fecha,Cupos
DECRETO 1072,2025-02-18,631
FUNCIONES,2025-02-21,886
DECRETO 1072,2025-02-18,240
";

const BASE_CSV: &str = "\
Tema,id
DECRETO 1072,11
FUNCIONES,6
";

const CONFIG_YAML: &str = "\
- name: \"N°\"
  is_generated: true
  numeric:
    start: 1
    grouping_fields: [Fecha, Tema]
- name: \"Código módulo\"
  is_generated: true
  mapping:
    source_field: Nombre programa
    key_field: Tema
    value_field: id
- name: Cupos
  source_field: Cupos
";

fn workspace_with_inputs() -> TestWorkspace {
    let workspace = TestWorkspace::new();
    workspace.write("source.csv", SOURCE_CSV);
    workspace.write("base.csv", BASE_CSV);
    workspace.write("columns.yaml", CONFIG_YAML);
    workspace
}

#[test]
fn resolve_writes_resolved_csv() {
    let workspace = workspace_with_inputs();
    let output = workspace.path().join("out.csv");
    Command::cargo_bin("csv-resolve")
        .expect("binary exists")
        .args([
            "resolve",
            "-i",
            workspace.path().join("source.csv").to_str().unwrap(),
            "-b",
            workspace.path().join("base.csv").to_str().unwrap(),
            "-c",
            workspace.path().join("columns.yaml").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read output");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "\"N°\",\"Código módulo\",\"Cupos\"");
    assert_eq!(lines[1], "\"1\",\"11\",\"631\"");
    assert_eq!(lines[2], "\"2\",\"6\",\"886\"");
    assert_eq!(lines[3], "\"1\",\"11\",\"240\"");
}

#[test]
fn resolve_to_stdout_honors_limit() {
    let workspace = workspace_with_inputs();
    Command::cargo_bin("csv-resolve")
        .expect("binary exists")
        .args([
            "resolve",
            "-i",
            workspace.path().join("source.csv").to_str().unwrap(),
            "-b",
            workspace.path().join("base.csv").to_str().unwrap(),
            "-c",
            workspace.path().join("columns.yaml").to_str().unwrap(),
            "--limit",
            "1",
        ])
        .assert()
        .success()
        .stdout(contains("\"1\",\"11\",\"631\""))
        .stdout(contains("886").not());
}

#[test]
fn resolve_without_base_fails_with_config_error() {
    let workspace = workspace_with_inputs();
    Command::cargo_bin("csv-resolve")
        .expect("binary exists")
        .args([
            "resolve",
            "-i",
            workspace.path().join("source.csv").to_str().unwrap(),
            "-c",
            workspace.path().join("columns.yaml").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("base dataset"));
}

#[test]
fn preview_prints_a_table() {
    let workspace = workspace_with_inputs();
    Command::cargo_bin("csv-resolve")
        .expect("binary exists")
        .args([
            "preview",
            "-i",
            workspace.path().join("source.csv").to_str().unwrap(),
            "-b",
            workspace.path().join("base.csv").to_str().unwrap(),
            "-c",
            workspace.path().join("columns.yaml").to_str().unwrap(),
            "-n",
            "2",
        ])
        .assert()
        .success()
        .stdout(contains("Código módulo"))
        .stdout(contains("631"))
        .stdout(contains("240").not());
}

#[test]
fn check_reports_field_resolution() {
    let workspace = workspace_with_inputs();
    Command::cargo_bin("csv-resolve")
        .expect("binary exists")
        .args([
            "check",
            "-i",
            workspace.path().join("source.csv").to_str().unwrap(),
            "-b",
            workspace.path().join("base.csv").to_str().unwrap(),
            "-c",
            workspace.path().join("columns.yaml").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("numeric group"))
        .stdout(contains("mapping source"))
        .stdout(contains("mapping key"))
        .stdout(contains("mapping value"))
        .stdout(contains("pass-through"));
}
