use assert_cmd::Command;
use assert_fs::prelude::*;

fn pathguard(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pathguard").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap()
}

#[test]
fn reports_safe_and_joined_path() {
    let dir = assert_fs::TempDir::new().unwrap();
    let data = dir.child("data");
    data.create_dir_all().unwrap();
    let out = stdout_of(pathguard(&dir).args(["report.csv", "--base"]).arg(data.path()));
    assert!(out.contains("Path 'report.csv' is SAFE"), "{out}");
    let expected = dunce::canonicalize(data.path()).unwrap().join("report.csv");
    assert!(out.contains(&format!("Secure joined path: {}", expected.display())), "{out}");
}

#[test]
fn absolute_path_is_flattened_into_base() {
    let dir = assert_fs::TempDir::new().unwrap();
    let data = dir.child("data");
    data.create_dir_all().unwrap();
    let inner = data.child("inner.txt");
    let arg = inner.path().to_str().unwrap();
    let out = stdout_of(pathguard(&dir).arg(arg).arg("--base").arg(data.path()));
    assert!(out.contains(&format!("Path '{arg}' is SAFE")), "{out}");
    let flattened = pathguard::sanitize_filename(arg).unwrap();
    assert!(flattened.starts_with('_') && !flattened.contains('/'));
    let expected = dunce::canonicalize(data.path()).unwrap().join(flattened);
    assert!(out.contains(&format!("Secure joined path: {}", expected.display())), "{out}");
}

#[test]
fn reports_unsafe_with_reason() {
    let dir = assert_fs::TempDir::new().unwrap();
    let out = stdout_of(pathguard(&dir).args(["../../etc/passwd", "--explain"]));
    assert!(out.contains("is UNSAFE"), "{out}");
    assert!(out.contains("Reason: matches dangerous pattern (parent directory traversal)"), "{out}");
}

#[test]
fn base_from_config_file() {
    let dir = assert_fs::TempDir::new().unwrap();
    let data = dir.child("data");
    data.create_dir_all().unwrap();
    dir.child("pathguard.toml")
        .write_str(&format!("[validator]\nallowed_base = {:?}\n", data.path().to_str().unwrap()))
        .unwrap();
    let outside = dir.child("other.txt");
    let out = stdout_of(pathguard(&dir).arg(outside.path()));
    assert!(out.contains("is UNSAFE"), "{out}");
}

#[test]
fn missing_config_is_an_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    pathguard(&dir)
        .args(["a.txt", "--config", "missing.toml"])
        .assert()
        .code(1);
}

#[test]
fn missing_path_is_usage_error() {
    let dir = assert_fs::TempDir::new().unwrap();
    pathguard(&dir).assert().code(2);
}
