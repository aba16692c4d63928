//! Integration tests for Wheelmirror

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn wheelmirror() -> Command {
        let mut cmd = cargo_bin_cmd!("wheelmirror");
        cmd.env_remove("WHEELMIRROR_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    /// Write a config whose stores live inside `dir`
    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("config.toml");
        let content = format!(
            "[storage]\ncache_dir = {:?}\nmodified_dir = {:?}\n\n[transform]\npackages = [\"demo\"]\n",
            dir.join("cache").display().to_string(),
            dir.join("modified").display().to_string(),
        );
        fs::write(&path, content).unwrap();
        path
    }

    fn store_file(dir: &Path, store: &str, package: &str, filename: &str, bytes: &[u8]) {
        let package_dir = dir.join(store).join(package);
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(package_dir.join(filename), bytes).unwrap();
    }

    #[test]
    fn help_displays() {
        wheelmirror()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("caching mirror for Python package indexes"));
    }

    #[test]
    fn version_displays() {
        wheelmirror()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("wheelmirror"));
    }

    #[test]
    fn serve_help_lists_overrides() {
        wheelmirror()
            .args(["serve", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--origin"))
            .stdout(predicate::str::contains("--port"));
    }

    #[test]
    fn config_path_honors_flag() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_prints_sections() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path());

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[server]"))
            .stdout(predicate::str::contains("port = 5000"))
            .stdout(predicate::str::contains("\"demo\""));
    }

    #[test]
    fn config_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("https://pypi.org/simple"));
        assert!(written.contains("requests"));

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn invalid_config_fails_with_hint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = \"not a number\"\n").unwrap();

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "cache", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));
    }

    #[test]
    fn log_file_setting_keeps_logs_off_stderr() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path());
        let log_path = dir.path().join("logs").join("wheelmirror.log");
        let mut content = fs::read_to_string(&path).unwrap();
        content.insert_str(0, &format!("[general]\nlog_file = {:?}\n\n", log_path));
        fs::write(&path, content).unwrap();

        wheelmirror()
            .args(["-vv", "--config", path.to_str().unwrap(), "cache", "list"])
            .assert()
            .success()
            .stderr(predicate::str::is_empty());

        assert!(log_path.is_file());
    }

    #[test]
    fn cache_list_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path());

        wheelmirror()
            .args(["--config", path.to_str().unwrap(), "cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached artifacts found."));
    }

    #[test]
    fn cache_list_reports_patched_copies() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path());
        let wheel = "demo-1.0-py3-none-any.whl";
        store_file(dir.path(), "cache", "demo", wheel, b"original");
        store_file(dir.path(), "cache", "demo", "demo-1.0.tar.gz", b"sdist");
        store_file(dir.path(), "modified", "demo", wheel, b"patched!");

        let output = wheelmirror()
            .args([
                "--config",
                path.to_str().unwrap(),
                "cache",
                "list",
                "--format",
                "json",
            ])
            .output()
            .unwrap();
        assert!(output.status.success());

        let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["filename"], "demo-1.0-py3-none-any.whl");
        assert_eq!(rows[0]["patched"], true);
        assert_eq!(rows[0]["size"], 8);
        assert_eq!(rows[1]["filename"], "demo-1.0.tar.gz");
        assert_eq!(rows[1]["patched"], false);
    }

    #[test]
    fn cache_list_plain() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path());
        store_file(dir.path(), "cache", "demo", "demo-1.0.tar.gz", b"sdist");

        wheelmirror()
            .args([
                "--config",
                path.to_str().unwrap(),
                "cache",
                "list",
                "--format",
                "plain",
            ])
            .assert()
            .success()
            .stdout(predicate::eq("demo/demo-1.0.tar.gz\n"));
    }
}
