//! Integration tests for the `babel` binary against a mocked server.

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;

fn babel(url: &str) -> Command {
    let mut cmd = Command::cargo_bin("babel").unwrap();
    cmd.env_remove("BABEL_URL").arg("--url").arg(url);
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("babel")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("translate"))
        .stdout(predicate::str::contains("augment"))
        .stdout(predicate::str::contains("flush"));
}

#[test]
fn test_translate_requires_text() {
    Command::cargo_bin("babel")
        .unwrap()
        .args(["translate", "--from", "heb", "--to", "arb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TEXTS"));
}

#[test]
fn test_translate_prints_lines_in_order() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/translate_list")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("source_lang".into(), "he".into()),
            Matcher::UrlEncoded("target_lang".into(), "ar".into()),
        ]))
        .with_status(200)
        .with_body(r#"["[arb] boker tov","[arb] shalom"]"#)
        .create();

    babel(&server.url())
        .args(["translate", "--from", "he", "--to", "ar", "boker tov", "shalom"])
        .assert()
        .success()
        .stdout("[arb] boker tov\n[arb] shalom\n");

    mock.assert();
}

#[test]
fn test_supported_json_output() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/supported")
        .with_status(200)
        .with_body(r#"{"translations":["arb <--> heb"]}"#)
        .create();

    babel(&server.url())
        .args(["supported", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"arb <--> heb\""));
}

#[test]
fn test_server_error_is_reported() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/translate_list")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"error":"Unsupported language pair: eng -> heb"}"#)
        .create();

    babel(&server.url())
        .args(["translate", "--from", "eng", "--to", "heb", "hello"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported language pair: eng -> heb"));
}

#[test]
fn test_free_reports_absent_model() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/free_model")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"freed":false}"#)
        .create();

    babel(&server.url())
        .args(["free", "--from", "heb", "--to", "arb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No resident model for"));
}

#[test]
fn test_unreachable_server_fails() {
    babel("http://127.0.0.1:9")
        .arg("models")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach Babel server"));
}
