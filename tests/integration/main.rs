//! Integration tests for onpm

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated cache, project and config for one test
    struct Sandbox {
        cache: TempDir,
        project: TempDir,
        config: PathBuf,
    }

    impl Sandbox {
        fn new() -> Self {
            let project = TempDir::new().unwrap();
            let config = project.path().join("onpm.toml");
            fs::write(
                &config,
                "[npm]\nprogram = \"onpm-test-missing-npm\"\n",
            )
            .unwrap();
            Self {
                cache: TempDir::new().unwrap(),
                project,
                config,
            }
        }

        fn onpm(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("onpm");
            cmd.env("ONPM_CACHE", self.cache.path())
                .env("CI", "1")
                .env_remove("ONPM_CONFIG")
                .arg("--config")
                .arg(&self.config)
                .current_dir(self.project.path());
            cmd
        }

        fn seed(&self, name: &str, version: &str) {
            let dir = self.cache.path().join(name).join(version);
            fs::create_dir_all(dir.join("lib")).unwrap();
            fs::write(
                dir.join("package.json"),
                format!("{{\"name\":\"{}\",\"version\":\"{}\"}}", name, version),
            )
            .unwrap();
            fs::write(dir.join("lib/index.js"), "module.exports = 1;\n").unwrap();
        }

        fn installed(&self, name: &str) -> PathBuf {
            self.project.path().join("node_modules").join(name)
        }
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("onpm")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline npm"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("onpm")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("onpm"));
    }

    #[test]
    fn cache_path_follows_env() {
        let sandbox = Sandbox::new();
        sandbox
            .onpm()
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                sandbox.cache.path().to_string_lossy().as_ref(),
            ));
    }

    #[test]
    fn cache_list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .onpm()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached packages."));
    }

    #[test]
    fn cache_list_json() {
        let sandbox = Sandbox::new();
        sandbox.seed("left-pad", "1.0.0");
        sandbox.seed("left-pad", "1.3.0");

        sandbox
            .onpm()
            .args(["cache", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"left-pad\""))
            .stdout(predicate::str::contains("\"1.3.0\""));
    }

    #[test]
    fn install_from_cache_picks_newest() {
        let sandbox = Sandbox::new();
        sandbox.seed("left-pad", "1.0.0");
        sandbox.seed("left-pad", "1.10.0");
        sandbox.seed("left-pad", "1.9.0");

        sandbox
            .onpm()
            .args(["install", "left-pad"])
            .assert()
            .success()
            .stdout(predicate::str::contains("left-pad installed from cache"))
            .stdout(predicate::str::contains("1.10.0"));

        let installed = sandbox.installed("left-pad");
        assert_eq!(read_json(&installed.join("package.json"))["version"], "1.10.0");
        assert!(installed.join("lib/index.js").exists());
    }

    #[test]
    fn install_from_cache_saves_dependency() {
        let sandbox = Sandbox::new();
        sandbox.seed("left-pad", "1.3.0");
        fs::write(
            sandbox.project.path().join("package.json"),
            "{\"name\":\"app\"}",
        )
        .unwrap();

        sandbox
            .onpm()
            .args(["install", "--save-dev", "left-pad@1.3.0"])
            .assert()
            .success();

        let manifest = read_json(&sandbox.project.path().join("package.json"));
        assert_eq!(manifest["devDependencies"]["left-pad"], "^1.3.0");
    }

    #[test]
    fn install_miss_without_npm_fails() {
        let sandbox = Sandbox::new();
        sandbox.seed("left-pad", "1.3.0");

        sandbox
            .onpm()
            .args(["install", "left-pad@2.0.0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("failed to install"));

        assert!(!sandbox.installed("left-pad").exists());
    }

    #[test]
    fn install_rejects_invalid_name() {
        let sandbox = Sandbox::new();
        sandbox
            .onpm()
            .args(["install", "../escape"])
            .assert()
            .failure();
    }

    #[test]
    fn cache_store_then_install() {
        let sandbox = Sandbox::new();
        let source = sandbox.project.path().join("node_modules/is-odd");
        fs::create_dir_all(&source).unwrap();
        fs::write(
            source.join("package.json"),
            "{\"name\":\"is-odd\",\"version\":\"3.0.1\"}",
        )
        .unwrap();

        sandbox
            .onpm()
            .args(["cache", "store", "is-odd"])
            .assert()
            .success();
        assert!(sandbox.cache.path().join("is-odd/3.0.1/package.json").exists());

        fs::remove_dir_all(&source).unwrap();
        sandbox
            .onpm()
            .args(["install", "is-odd"])
            .assert()
            .success()
            .stdout(predicate::str::contains("is-odd installed from cache"));
        assert!(source.join("package.json").exists());
    }

    #[test]
    fn config_path_uses_flag() {
        let sandbox = Sandbox::new();
        sandbox
            .onpm()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("onpm.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .onpm()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[npm]"))
            .stdout(predicate::str::contains("onpm-test-missing-npm"));
    }
}
