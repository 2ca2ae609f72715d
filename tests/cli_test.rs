//! CLI integration tests for the json-endpoint binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("json-endpoint"))
}

// Helper to create a temp endpoint file
fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const ITEM_ENDPOINT: &str = r#"{
    "allowed_methods": ["GET", "POST"],
    "parameters": [
        { "name": "id", "required": true, "type": "string", "methods": ["GET"] },
        { "name": "qty", "type": "int", "methods": ["POST"] }
    ]
}"#;

mod check_command {
    use super::*;

    #[test]
    fn valid_request_prints_envelope() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--query",
                "id=42",
                "--data",
                r#"{"name":"widget"}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""response_code": 200"#))
            .stdout(predicate::str::contains(r#""host": "http://localhost""#))
            .stdout(predicate::str::contains(r#""count": 1"#))
            .stdout(predicate::str::contains(r#""name": "widget""#));
    }

    #[test]
    fn missing_required_parameter() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args(["check", endpoint.to_str().unwrap()])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""response_code": 400"#))
            .stdout(predicate::str::contains(
                "Some necessary GET parameters are not given to this resource",
            ));
    }

    #[test]
    fn method_not_allowed_is_400() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--method",
                "DELETE",
                "--show-status",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::starts_with("400 Bad Request"))
            .stdout(predicate::str::contains(r#""DELETE""#));
    }

    #[test]
    fn json_body_types_are_checked() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--method",
                "POST",
                "--query",
                "id=1",
                "--content-type",
                "application/json",
                "--body",
                r#"{"qty": "three"}"#,
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(r#""qty": "int""#));
    }

    #[test]
    fn form_body_values_are_strings() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--method",
                "POST",
                "--query",
                "id=1",
                "--content-type",
                "application/x-www-form-urlencoded",
                "--body",
                "qty=3",
            ])
            .assert()
            .code(1)
            .stdout(predicate::str::contains(
                "Invalid data type for POST parameter 'qty'.",
            ));
    }

    #[test]
    fn secure_host() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--query",
                "id=1",
                "--secure",
                "--host",
                "api.example.com",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""host": "https://""#));
    }

    #[test]
    fn handler_status_code() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args([
                "check",
                endpoint.to_str().unwrap(),
                "--query",
                "id=1",
                "--code",
                "201",
                "--show-status",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("201 Created"));
    }

    #[test]
    fn custom_wrapper() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(
            &dir,
            "endpoint.json",
            r#"{
                "allowed_methods": ["GET"],
                "wrapper": { "status": "{{ response_code }}", "items": "{{ data }}" }
            }"#,
        );

        cmd()
            .args(["check", endpoint.to_str().unwrap(), "--data", "[1,2]"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""status": 200"#))
            .stdout(predicate::str::contains("meta").not());
    }

    #[test]
    fn invalid_data_json() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args(["check", endpoint.to_str().unwrap(), "--data", "{nope"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid --data JSON"));
    }

    #[test]
    fn missing_endpoint_file() {
        cmd()
            .args(["check", "/nonexistent/endpoint.json"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("file not found"));
    }

    #[test]
    fn disallowed_declaration() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(
            &dir,
            "endpoint.json",
            r#"{
                "allowed_methods": ["PUT"],
                "parameters": [{ "name": "id", "type": "int", "methods": ["PUT"] }]
            }"#,
        );

        cmd()
            .args(["check", endpoint.to_str().unwrap(), "--method", "PUT"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("only GET and POST are allowed"));
    }
}

mod cgi_command {
    use super::*;

    #[test]
    fn writes_cgi_response() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args(["cgi", endpoint.to_str().unwrap(), "--data", r#"{"ok":true}"#])
            .env("REQUEST_METHOD", "GET")
            .env("QUERY_STRING", "id=7")
            .env("HTTP_HOST", "example.com")
            .env_remove("HTTPS")
            .write_stdin("")
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "Status: 200 OK\r\nContent-Type: application/json\r\n\r\n",
            ))
            .stdout(predicate::str::contains(r#""host": "http://example.com""#));
    }

    #[test]
    fn reads_body_from_stdin() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args(["cgi", endpoint.to_str().unwrap()])
            .env("REQUEST_METHOD", "POST")
            .env("QUERY_STRING", "id=7")
            .env("CONTENT_TYPE", "application/json")
            .write_stdin(r#"{"qty": 3, "extra": 1}"#)
            .assert()
            .success()
            .stdout(predicate::str::starts_with("Status: 400 Bad Request"))
            .stdout(predicate::str::contains(
                "Some given POST parameters are not allowed for this resource",
            ))
            .stdout(predicate::str::contains(r#""extra""#));
    }
}

mod describe_command {
    use super::*;

    #[test]
    fn prints_parameter_metadata() {
        let dir = TempDir::new().unwrap();
        let endpoint = write_temp_file(&dir, "endpoint.json", ITEM_ENDPOINT);

        cmd()
            .args(["describe", endpoint.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""parameter_name": "id""#))
            .stdout(predicate::str::contains(r#""is_required": true"#))
            .stdout(predicate::str::contains(r#""allowed_methods": ["#));
    }
}
