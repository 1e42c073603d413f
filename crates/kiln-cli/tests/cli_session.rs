//! Long-running commands exit with an error when a port is unavailable.

use assert_cmd::Command;
use predicates::prelude::*;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn kiln(project: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kiln"));
    cmd.arg("--cwd")
        .arg(project)
        .arg("--no-color")
        .env_remove("NODE_ENV")
        .env_remove("LIVERELOAD_PORT")
        .env_remove("SERVER_PORT")
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(30));
    cmd
}

fn occupied_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[test]
fn test_watch_fails_when_reload_port_is_taken() {
    let temp = TempDir::new().unwrap();
    let (_held, port) = occupied_port();

    kiln(temp.path())
        .args(["watch", "--reload-port", &port.to_string()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind reload endpoint"));
}

#[test]
fn test_dev_fails_when_server_port_is_taken() {
    let temp = TempDir::new().unwrap();
    let (_held, port) = occupied_port();
    let (free, reload_port) = occupied_port();
    drop(free);

    kiln(temp.path())
        .args([
            "dev",
            "--server-port",
            &port.to_string(),
            "--reload-port",
            &reload_port.to_string(),
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind to"));
}
