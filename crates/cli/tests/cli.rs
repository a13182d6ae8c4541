use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "migrate", "settings"] {
        assert!(stdout.contains(command), "help is missing `{command}`");
    }
}

#[test]
fn settings_prints_defaults_as_json() {
    let dir = std::env::temp_dir().join("shelf-cli-no-config");
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("settings")
        .env("SHELF_CONFIG_DIR", &dir)
        .env("SHELF_ENV", "staging")
        .env("SHELF_SERVER__PORT", "9191")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"environment\": \"staging\""));
    assert!(stdout.contains("\"port\": 9191"));
}

#[test]
fn migrate_reports_applied_count() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("migrate")
        .env("SHELF_CONFIG_DIR", std::env::temp_dir().join("shelf-cli-no-config"))
        .env("SHELF_DATABASE__URL", "sqlite::memory:")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .contains("applied 1 migration(s)"));
}

#[test]
fn unknown_environment_fails() {
    Command::cargo_bin("shelf")
        .unwrap()
        .arg("settings")
        .env("SHELF_ENV", "qa")
        .assert()
        .failure();
}
