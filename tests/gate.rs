use std::path::Path;
use std::process::{Command, Output};

const DIFF: &str = "\
diff --git a/pkg/file.go b/pkg/file.go
--- a/pkg/file.go
+++ b/pkg/file.go
@@ -9,2 +9,4 @@ func run() {
 \tx := 1
+\tfmt.Println(\"x\")
+}
 \treturn
";

fn check(dir: &Path, profile: &str, extra: &[&str]) -> Output {
    std::fs::write(dir.join("change.diff"), DIFF).unwrap();
    std::fs::write(dir.join("cover.out"), profile).unwrap();

    Command::new(env!("CARGO_BIN_EXE_patchcov"))
        .arg("check")
        .args(["--cover-file", "cover.out", "--diff-file", "change.diff"])
        .args(extra)
        .current_dir(dir)
        .env_remove("COVER_FILE")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn covered_change_exits_zero_and_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\npkg/file.go:8.1,12.2 1 1\n", &[]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[test]
fn uncovered_change_exits_one_with_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\npkg/file.go:8.1,12.2 1 0\n", &[]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "Please note the following code is not covered by tests.\n\
         pkg/file.go\n\n10 \tfmt.Println(\"x\")\n"
    );
}

#[test]
fn markdown_format_fences_the_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\n", &["--format", "markdown"]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("```go\npkg/file.go\n\n10 \tfmt.Println(\"x\")\n```"));
}

#[test]
fn json_format_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\n", &["--format", "json"]);

    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "uncovered");
    assert_eq!(json["addedLines"], 2);
    assert_eq!(json["coveredLines"], 1);
    assert_eq!(json["files"][0]["uncovered"][0]["number"], 10);
}

#[test]
fn prefix_flag_matches_module_paths() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(
        dir.path(),
        "mode: set\ngithub.com/acme/widgets/pkg/file.go:10.1,10.30 1 2\n",
        &["--prefix", "github.com/acme/widgets"],
    );

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn missing_profile_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("change.diff"), DIFF).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_patchcov"))
        .arg("check")
        .args(["--cover-file", "missing.out", "--diff-file", "change.diff"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout(&output), "");
}

#[test]
fn malformed_profile_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\npkg/file.go 8.1,12.2 1 0\n", &[]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn post_comment_without_pr_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = check(dir.path(), "mode: set\n", &["--post-comment"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("--post-comment requires --pr"));
}

#[test]
fn strict_mode_rejects_a_malformed_diff() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cover.out"), "mode: set\n").unwrap();
    std::fs::write(
        dir.path().join("broken.diff"),
        "--- a/pkg/file.go\n+++ b/pkg/file.go\n@@ -1,1 +1,3 @@\n+only one line\n",
    )
    .unwrap();

    let run = |strict: bool| {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_patchcov"));
        cmd.arg("check")
            .args(["--cover-file", "cover.out", "--diff-file", "broken.diff"])
            .current_dir(dir.path())
            .env_remove("COVER_FILE");
        if strict {
            cmd.arg("--strict");
        }
        cmd.output().unwrap()
    };

    assert_eq!(run(false).status.code(), Some(0));
    assert_eq!(run(true).status.code(), Some(2));
}

#[test]
fn config_file_selects_source_suffixes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".patchcov.toml"),
        "[diff]\nsource_suffixes = [\".rs\"]\n",
    )
    .unwrap();
    let output = check(dir.path(), "mode: set\n", &[]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "");
}

#[test]
fn pr_without_token_is_rejected_before_reading_the_profile() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_patchcov"))
        .arg("check")
        .args(["--cover-file", "missing.out", "--pr", "acme/widgets#7"])
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("GitHub token"), "{stderr}");
}

#[test]
fn git_diff_ignores_mnemonic_prefix_setting() {
    let dir = tempfile::tempdir().unwrap();
    let git = |args: &[&str]| {
        Command::new("git")
            .args(args)
            .current_dir(dir.path())
            .output()
    };
    if git(&["--version"]).is_err() {
        return;
    }

    std::fs::create_dir(dir.path().join("pkg")).unwrap();
    std::fs::write(dir.path().join("pkg/file.go"), "package pkg\n\nfunc run() {\n}\n").unwrap();
    for args in [
        &["init", "-q"][..],
        &["config", "user.email", "dev@example.com"],
        &["config", "user.name", "dev"],
        &["config", "diff.mnemonicPrefix", "true"],
        &["config", "diff.noprefix", "false"],
        &["add", "pkg/file.go"],
        &["commit", "-q", "-m", "init"],
    ] {
        assert!(git(args).unwrap().status.success(), "git {args:?} failed");
    }

    std::fs::write(
        dir.path().join("pkg/file.go"),
        "package pkg\n\nfunc run() {\n\tprintln(\"x\")\n}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("cover.out"), "mode: set\npkg/file.go:3.13,5.2 1 0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_patchcov"))
        .args(["check", "--cover-file", "cover.out"])
        .current_dir(dir.path())
        .env_remove("GITHUB_TOKEN")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("pkg/file.go\n\n4 \tprintln(\"x\")"));
}
