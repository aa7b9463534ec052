//! Integration tests for the fresca CLI

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn fresca(store_root: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("fresca");
        cmd.arg("--store-root").arg(store_root.path());
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("fresca")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "stale-while-revalidate request cache",
            ));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("fresca")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("fresca"));
    }

    #[test]
    fn status_on_empty_root() {
        let root = TempDir::new().unwrap();
        fresca(&root)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores found"));
    }

    #[test]
    fn list_on_empty_root() {
        let root = TempDir::new().unwrap();
        fresca(&root)
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores found"));
    }

    #[test]
    fn list_shows_stale_generation() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("fresca-v9.9.9")).unwrap();

        fresca(&root)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("fresca-v9.9.9"));
    }

    #[test]
    fn purge_removes_stale_generation() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("fresca-v9.9.9")).unwrap();

        fresca(&root)
            .arg("purge")
            .assert()
            .success()
            .stdout(predicate::str::contains("fresca-v9.9.9"));

        assert!(!root.path().join("fresca-v9.9.9").exists());
    }

    #[test]
    fn purge_dry_run_leaves_store() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("fresca-v9.9.9")).unwrap();

        fresca(&root)
            .args(["purge", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Would delete"));

        assert!(root.path().join("fresca-v9.9.9").exists());
    }

    #[test]
    fn show_unknown_generation_fails() {
        let root = TempDir::new().unwrap();
        fresca(&root)
            .args(["show", "/entry/one.html", "--generation", "fresca-v9.9.9"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No cache store exists"));
    }

    #[test]
    fn install_against_unreachable_origin_fails() {
        let root = TempDir::new().unwrap();
        fresca(&root)
            .args(["install", "--origin", "http://127.0.0.1:1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Install failed"));
    }
}
