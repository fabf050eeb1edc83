// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Working-copy manager tests against a scripted runner, plus the
//! log-keyword rewrite against a real `sed`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serial_test::file_serial;

use cvsync_config::{Config, RepositoryConfig};
use cvsync_cvs::{CvsCheckout, CvsError};
use cvsync_exec::test_support::LogBuffer;
use cvsync_exec::{CommandLog, CommandRunner, ExecError, ShellRunner};

/// One recorded invocation: what ran, with what, and from where.
#[derive(Debug, Clone)]
struct RecordedCall {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    cwd: PathBuf,
}

impl RecordedCall {
    fn rendered(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// Scripted [`CommandRunner`]: records every invocation and answers with
/// a configured exit status per CVS subcommand (default success).
#[derive(Clone, Default)]
struct FakeRunner {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    statuses: Arc<Mutex<BTreeMap<String, i32>>>,
}

impl FakeRunner {
    fn new() -> Self {
        Self::default()
    }

    /// Make the given subcommand (e.g. `"commit"`) exit with `status`.
    fn set_status(&self, subcommand: &str, status: i32) {
        self.statuses.lock().unwrap().insert(subcommand.to_string(), status);
    }

    fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn rendered_calls(&self) -> Vec<String> {
        self.calls().iter().map(RecordedCall::rendered).collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run_tolerating(
        &self,
        log: &CommandLog,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
        tolerated: &[i32],
    ) -> Result<i32, ExecError> {
        let call = RecordedCall {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            cwd: std::env::current_dir().unwrap(),
        };
        log.record_invocation(&call.rendered())?;

        let status = args
            .first()
            .and_then(|sub| self.statuses.lock().unwrap().get(*sub).copied())
            .unwrap_or(0);
        self.calls.lock().unwrap().push(call.clone());

        match status {
            0 => Ok(0),
            code if tolerated.contains(&code) => Ok(code),
            code => Err(ExecError::CommandFailed {
                command: call.rendered(),
                status: code,
                output: String::new(),
            }),
        }
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    config: Config,
    runner: FakeRunner,
    buffer: LogBuffer,
    snapshot: PathBuf,
}

impl Fixture {
    const REPO: &'static str = "widget";
    const BRANCH: &'static str = "release-1";

    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            checkout_dir: dir.path().join("checkouts"),
            log_dir: dir.path().join("logs"),
            repositories: BTreeMap::from([(
                Self::REPO.to_string(),
                RepositoryConfig {
                    location: "modules/widget".to_string(),
                    root: ":pserver:${user}@cvs.example.com:/cvsroot".to_string(),
                },
            )]),
        };
        let snapshot = dir.path().join("snapshot");
        std::fs::create_dir_all(&snapshot).unwrap();
        Self {
            dir,
            config,
            runner: FakeRunner::new(),
            buffer: LogBuffer::new(),
            snapshot,
        }
    }

    fn checkout(&self) -> CvsCheckout {
        CvsCheckout::with_log(
            &self.config,
            Box::new(self.runner.clone()),
            self.buffer.log(),
            Self::REPO,
            Self::BRANCH,
            "alice",
        )
        .unwrap()
    }

    /// Materialize the checkout directory on disk, as a real `cvs
    /// checkout` would have.
    fn materialize(&self, checkout: &CvsCheckout) {
        std::fs::create_dir_all(checkout.path()).unwrap();
    }

    fn write_snapshot_file(&self, name: &str, contents: &str) {
        let path = self.snapshot.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
}

#[test]
fn construction_resolves_the_full_context() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    assert!(checkout.path().ends_with("checkouts/widget/release-1"));
    assert_eq!(checkout.branch(), "release-1");
}

#[test]
fn construction_fails_for_unknown_repository() {
    let fixture = Fixture::new();
    let result = CvsCheckout::with_log(
        &fixture.config,
        Box::new(fixture.runner.clone()),
        fixture.buffer.log(),
        "nope",
        Fixture::BRANCH,
        "alice",
    );
    assert!(matches!(result, Err(CvsError::Config(_))));
}

#[test]
#[file_serial(cwd)]
fn checkout_runs_from_the_parent_with_root_in_child_env() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    std::fs::create_dir_all(checkout.path().parent().unwrap()).unwrap();

    checkout.checkout().unwrap();

    let calls = fixture.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        vec![
            "checkout",
            "-kk",
            "-d",
            "release-1",
            "-r",
            "release-1",
            "modules/widget"
        ]
    );
    assert_eq!(
        calls[0].env,
        vec![(
            "CVSROOT".to_string(),
            ":pserver:alice@cvs.example.com:/cvsroot".to_string()
        )]
    );
    assert_eq!(
        calls[0].cwd.canonicalize().unwrap(),
        checkout.path().parent().unwrap().canonicalize().unwrap()
    );
    // The scope is call-local: nothing leaked into this process.
    assert!(std::env::var("CVSROOT").is_err());
}

#[test]
fn export_addresses_the_repository_directly() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    let target = fixture.dir.path().join("exported");

    checkout.export(&target).unwrap();

    let calls = fixture.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args[0], "export");
    assert_eq!(calls[0].args[1], "-kk");
    assert!(calls[0].args.contains(&target.display().to_string()));
    assert_eq!(calls[0].env[0].0, "CVSROOT");
}

#[test]
#[file_serial(cwd)]
fn update_runs_inside_the_checkout_without_root_override() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    checkout.update().unwrap();

    let calls = fixture.runner.calls();
    assert_eq!(calls[0].args, vec!["update", "-d"]);
    assert!(calls[0].env.is_empty());
    assert_eq!(
        calls[0].cwd.canonicalize().unwrap(),
        checkout.path().canonicalize().unwrap()
    );
}

#[test]
#[file_serial(cwd)]
fn info_diff_tolerates_differences_found_but_not_other_failures() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    fixture.runner.set_status("diff", 1);
    checkout.info_diff().unwrap();

    fixture.runner.set_status("diff", 2);
    let err = checkout.info_diff().unwrap_err();
    assert!(matches!(
        err,
        CvsError::Exec(ExecError::CommandFailed { status: 2, .. })
    ));
}

#[test]
fn empty_delete_and_add_are_noops_with_zero_invocations() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    // No checkout directory exists and none is needed.

    checkout.delete_files(&[]).unwrap();
    checkout.add_files(&[]).unwrap();
    checkout.disable_log_keyword(&[]).unwrap();

    assert!(fixture.runner.calls().is_empty());
}

#[test]
#[file_serial(cwd)]
fn delete_files_removes_from_disk_then_batches_one_removal() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);
    std::fs::create_dir_all(checkout.path().join("src")).unwrap();
    std::fs::write(checkout.path().join("src/a.txt"), "a").unwrap();
    std::fs::write(checkout.path().join("b.txt"), "b").unwrap();

    checkout.delete_files(&["src/a.txt", "b.txt"]).unwrap();

    assert!(!checkout.path().join("src/a.txt").exists());
    assert!(!checkout.path().join("b.txt").exists());
    assert_eq!(
        fixture.runner.rendered_calls(),
        vec!["cvs remove src/a.txt b.txt"]
    );
    assert!(!checkout
        .list_content_files()
        .unwrap()
        .iter()
        .any(|f| f == "src/a.txt" || f == "b.txt"));
}

#[test]
#[file_serial(cwd)]
fn delete_files_propagates_missing_file_errors() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    let err = checkout.delete_files(&["ghost.txt"]).unwrap_err();
    assert!(matches!(err, CvsError::Filesystem { .. }));
    // The batched removal never ran.
    assert!(fixture.runner.calls().is_empty());
}

#[test]
#[file_serial(cwd)]
fn add_directories_registers_parents_strictly_first() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    checkout.add_directories(&["a/b/c"]).unwrap();

    assert_eq!(
        fixture.runner.rendered_calls(),
        vec!["cvs add a", "cvs add a/b", "cvs add a/b/c"]
    );
    assert!(checkout.path().join("a/b/c").is_dir());
}

#[test]
#[file_serial(cwd)]
fn add_directories_is_idempotent_over_registered_directories() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);
    for registered in ["a/CVS", "a/b/CVS", "a/b/c/CVS"] {
        std::fs::create_dir_all(checkout.path().join(registered)).unwrap();
    }

    checkout.add_directories(&["a/b/c"]).unwrap();

    assert!(fixture.runner.calls().is_empty());
}

#[test]
#[file_serial(cwd)]
fn add_directories_skips_only_the_registered_prefix() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);
    std::fs::create_dir_all(checkout.path().join("a/CVS")).unwrap();

    checkout.add_directories(&["a/b"]).unwrap();

    assert_eq!(fixture.runner.rendered_calls(), vec!["cvs add a/b"]);
}

#[test]
#[file_serial(cwd)]
fn add_files_registers_with_keyword_expansion_disabled() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    checkout.add_files(&["src/a.txt", "src/b.txt"]).unwrap();

    assert_eq!(
        fixture.runner.rendered_calls(),
        vec!["cvs add -kk src/a.txt src/b.txt"]
    );
}

#[test]
fn copy_files_updates_content_at_the_same_relative_path() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);
    fixture.write_snapshot_file("src/a.txt", "fresh");

    checkout.copy_files(&fixture.snapshot, &["src/a.txt"]).unwrap();

    assert_eq!(
        std::fs::read_to_string(checkout.path().join("src/a.txt")).unwrap(),
        "fresh"
    );
    // Pure copy: nothing was registered on its own.
    assert!(fixture.runner.calls().is_empty());
}

#[test]
#[file_serial(cwd)]
fn commit_uses_a_message_file_and_removes_it_on_success() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    checkout.commit("add a.txt").unwrap();

    let calls = fixture.runner.calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0].args;
    assert_eq!(&args[..4], &["commit", "-r", "release-1", "-R"]);
    assert_eq!(args[4], "-F");
    let message_path = &args[5];
    assert!(!Path::new(message_path).exists());
}

#[test]
#[file_serial(cwd)]
fn commit_removes_the_message_file_when_the_commit_fails() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);
    fixture.runner.set_status("commit", 1);

    let err = checkout.commit("doomed").unwrap_err();
    assert!(matches!(err, CvsError::Exec(_)));

    let calls = fixture.runner.calls();
    let message_path = &calls[0].args[5];
    assert!(!Path::new(message_path).exists());
}

#[test]
#[file_serial(cwd)]
fn sync_cycle_applies_adds_in_protocol_order() {
    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    std::fs::create_dir_all(checkout.path().parent().unwrap()).unwrap();

    checkout.checkout().unwrap();
    // A real `cvs checkout` would have created the directory.
    fixture.materialize(&checkout);

    fixture.write_snapshot_file("src/a.txt", "contents");
    checkout.add_directories(&["src"]).unwrap();
    checkout.copy_files(&fixture.snapshot, &["src/a.txt"]).unwrap();
    checkout.add_files(&["src/a.txt"]).unwrap();
    checkout.commit("add a.txt").unwrap();

    assert_eq!(checkout.list_content_files().unwrap(), vec!["src/a.txt"]);

    let rendered = fixture.runner.rendered_calls();
    assert_eq!(rendered.len(), 4);
    assert!(rendered[0].starts_with("cvs checkout"));
    assert_eq!(rendered[1], "cvs add src");
    assert_eq!(rendered[2], "cvs add -kk src/a.txt");
    assert!(rendered[3].starts_with("cvs commit -r release-1 -R -F "));

    let message_path = fixture.runner.calls()[3].args[5].clone();
    assert!(!Path::new(&message_path).exists());

    // Every invocation also reached the repository command log.
    let transcript = fixture.buffer.contents();
    assert!(transcript.contains("+ cvs add src"));
    assert!(transcript.contains("+ cvs commit -r release-1"));
}

#[test]
#[file_serial(cwd)]
fn disable_log_keyword_rewrites_markers_through_sed() {
    if !ShellRunner::is_available("sed") {
        eprintln!("sed not available, skipping test");
        return;
    }

    let fixture = Fixture::new();
    let checkout = fixture.checkout();
    fixture.materialize(&checkout);

    let marked = "/*\n * $Log: widget.c,v $\n */\nint main() {}\n";
    let unmarked = "static int counter;\n";
    std::fs::write(checkout.path().join("marked.c"), marked).unwrap();
    std::fs::write(checkout.path().join("unmarked.c"), unmarked).unwrap();

    let runner_checkout = CvsCheckout::with_log(
        &fixture.config,
        Box::new(ShellRunner::new()),
        fixture.buffer.log(),
        Fixture::REPO,
        Fixture::BRANCH,
        "alice",
    )
    .unwrap();
    runner_checkout
        .disable_log_keyword(&["marked.c", "unmarked.c"])
        .unwrap();

    let rewritten = std::fs::read_to_string(checkout.path().join("marked.c")).unwrap();
    assert!(rewritten.contains("OldLog:"));
    assert!(!rewritten.contains("$Log"));

    // Marker-free files come through byte-for-byte.
    let untouched = std::fs::read_to_string(checkout.path().join("unmarked.c")).unwrap();
    assert_eq!(untouched, unmarked);
}
