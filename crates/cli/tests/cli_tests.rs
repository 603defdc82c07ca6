//! CLI integration tests
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("mp2md")
}

fn get_fixture_path(name: &str) -> String {
    format!("{}/../core/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn write_article(dir: &Path, title: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("index.html"),
        format!(r#"<h1 id="activity-name">{title}</h1><div id="js_content"><p>body of {title}</p></div>"#),
    )
    .unwrap();
}

#[test]
fn test_cli_file_to_markdown() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["file", &get_fixture_path("plain_article.html"), tmp.path().to_str().unwrap(), "-i", "url"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Output written to"));

    let md = fs::read_to_string(tmp.path().join("Plain Page.md")).unwrap();
    assert!(md.starts_with("# Plain Page  \n"));
}

#[test]
fn test_cli_file_to_text() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("out.txt");

    cmd()
        .args(["file", &get_fixture_path("wechat_article.html"), output.to_str().unwrap(), "-f", "text"])
        .assert()
        .success();

    let text = fs::read_to_string(output).unwrap();
    assert!(text.starts_with("Rust 所有权入门\n\n"));
}

#[test]
fn test_cli_strips_quotes_from_paths() {
    let tmp = TempDir::new().unwrap();
    let quoted = format!("\"{}\"", tmp.path().display());

    cmd()
        .args(["file", &get_fixture_path("plain_article.html"), &quoted, "--image", "u"])
        .assert()
        .success();

    assert!(tmp.path().join("Plain Page.md").exists());
}

#[test]
fn test_cli_invalid_file() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["file", "nonexistent.html", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_cli_invalid_image_policy() {
    cmd()
        .args(["file", &get_fixture_path("plain_article.html"), "-i", "zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid image policy"));
}

#[test]
fn test_cli_invalid_url() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["url", "ftp://example.com/a", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL"));
}

#[test]
fn test_cli_batch_markdown() {
    let tmp = TempDir::new().unwrap();
    write_article(&tmp.path().join("one"), "First");
    write_article(&tmp.path().join("two"), "Second");
    fs::create_dir(tmp.path().join("empty")).unwrap();

    cmd()
        .args(["batch", tmp.path().to_str().unwrap(), "-i", "url"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Converted 2 articles"));

    assert!(tmp.path().join("one/First.md").exists());
    assert!(tmp.path().join("two/Second.md").exists());
}

#[test]
fn test_cli_batch_text() {
    let tmp = TempDir::new().unwrap();
    write_article(&tmp.path().join("one"), "First");

    cmd()
        .args(["batch", tmp.path().to_str().unwrap(), "-f", "txt"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(tmp.path().join("one/First.txt")).unwrap(),
        "First\n\nbody of First"
    );
}

#[test]
fn test_cli_batch_missing_dir() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["batch", tmp.path().join("missing").to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_cli_rename() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("2023-05-01 \"测试 文章\"")).unwrap();
    fs::create_dir(tmp.path().join("no-date-here")).unwrap();

    cmd()
        .args(["rename", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Renamed 1 directories"));

    assert!(tmp.path().join("2023-05-01测试文章").is_dir());
}

#[test]
fn test_cli_verbose() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["-v", "rename", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("mp2md"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mp2md"));
}

#[test]
fn test_cli_user_agent_flag_is_kebab_case() {
    let tmp = TempDir::new().unwrap();
    cmd()
        .args(["--user-agent", "custom/1", "rename", tmp.path().to_str().unwrap()])
        .assert()
        .success();

    cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--user-agent"))
        .stdout(predicate::str::contains("--user_agent").not());

    let script = fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/build.rs")).unwrap();
    assert!(script.contains(r#"--"user-agent""#));
    assert!(!script.contains("--user_agent"));
}

#[test]
fn test_cli_requires_subcommand() {
    cmd().assert().failure();
}
