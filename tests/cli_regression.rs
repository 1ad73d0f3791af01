// Regression tests for the liquid-html binary: exit codes, miette
// diagnostics on stderr and JSON trees on stdout.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

/// A scratch path unique to this test process.
fn scratch(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("liquid-html-{}-{name}", std::process::id()))
}

fn write_template(name: &str, content: &str) -> PathBuf {
    let path = scratch(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn check_reports_structural_errors_with_miette() {
    let bad_file = write_template("bad.liquid", "{% for x in xs %}<div>{% endfor %}");

    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("check").arg(&bad_file);
    cmd.assert().failure().stderr(
        contains("liquid_html::structural").and(contains("HtmlElement 'div'")),
    );

    let _ = fs::remove_file(bad_file);
}

#[test]
fn check_passes_well_formed_templates() {
    let good_file = write_template("good.liquid", "<ul>{% for x in xs %}<li>{{ x }}</li>{% endfor %}</ul>");

    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("check").arg(&good_file);
    cmd.assert()
        .success()
        .stdout(contains("1 file(s) parsed without errors"));

    let _ = fs::remove_file(good_file);
}

#[test]
fn strict_mode_reports_syntax_errors() {
    let file = write_template("strict.liquid", "{% if a == %}x{% endif %}");

    let mut tolerant = Command::cargo_bin("liquid-html").unwrap();
    tolerant.arg("check").arg(&file);
    tolerant.assert().success();

    let mut strict = Command::cargo_bin("liquid-html").unwrap();
    strict.arg("check").arg("--mode").arg("strict").arg(&file);
    strict
        .assert()
        .failure()
        .stderr(contains("liquid_html::syntax").and(contains("help:")));

    let _ = fs::remove_file(file);
}

#[test]
fn ast_prints_the_tree_as_json() {
    let file = write_template("ast.liquid", "<p class=\"a\">{{ title }}</p>");

    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("ast").arg(&file);
    cmd.assert().success().stdout(
        contains("\"type\": \"HtmlElement\"").and(contains("\"type\": \"LiquidVariableOutput\"")),
    );

    let _ = fs::remove_file(file);
}

#[test]
fn cst_prints_the_flat_sequence() {
    let file = write_template("cst.liquid", "{% if a %}x{% endif %}");

    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("cst").arg(&file);
    cmd.assert()
        .success()
        .stdout(contains("LiquidTagOpen").and(contains("LiquidTagClose")));

    let _ = fs::remove_file(file);
}

#[test]
fn allow_unclosed_flag_accepts_open_nodes() {
    let file = write_template("unclosed.liquid", "<div>{% if a %}");

    let mut rejected = Command::cargo_bin("liquid-html").unwrap();
    rejected.arg("check").arg(&file);
    rejected
        .assert()
        .failure()
        .stderr(contains("Attempting to end parsing before LiquidTag 'if' was closed"));

    let mut accepted = Command::cargo_bin("liquid-html").unwrap();
    accepted.arg("check").arg("--allow-unclosed").arg(&file);
    accepted.assert().success();

    let _ = fs::remove_file(file);
}

#[test]
fn check_walks_directories() {
    let dir = scratch("theme");
    fs::create_dir_all(dir.join("sections")).unwrap();
    fs::write(dir.join("layout.liquid"), "<html>{{ content_for_layout }}</html>").unwrap();
    fs::write(dir.join("sections").join("broken.liquid"), "<a><div></a>").unwrap();
    fs::write(dir.join("notes.txt"), "</not-a-template>").unwrap();

    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("check").arg(&dir);
    cmd.assert()
        .failure()
        .stdout(contains("1 of 2 file(s) failed to parse"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_files_are_cli_errors() {
    let mut cmd = Command::cargo_bin("liquid-html").unwrap();
    cmd.arg("ast").arg(scratch("does-not-exist.liquid"));
    cmd.assert().failure().stderr(contains("could not read"));
}
