//! End-to-end tests against fake abstract-cli executables.
#![cfg(unix)]

use bridge::prelude::*;
use serde_json::json;
use serial_test::serial;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const TOKEN: &str = "test-token";

/// Writes an executable `abstract-cli` shell script into `dir`.
fn fake_cli(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("abstract-cli");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("write script");
    let mut permissions = std::fs::metadata(&path).expect("metadata").permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).expect("chmod");
    path
}

fn config(dir: &Path) -> BridgeConfig {
    BridgeConfig::new(TOKEN).with_cwd(dir)
}

fn client_for(dir: &TempDir, body: &str) -> AbstractClient {
    fake_cli(dir.path(), body);
    AbstractClient::new(config(dir.path())).expect("client")
}

fn recorded_args(dir: &TempDir) -> Vec<String> {
    std::fs::read_to_string(dir.path().join("args.txt"))
        .expect("args recorded")
        .lines()
        .map(str::to_string)
        .collect()
}

const RECORD_ARGS: &str = r#"for arg in "$@"; do echo "$arg"; done > args.txt"#;

#[tokio::test]
#[serial]
async fn test_commits_list_end_to_end() {
    let dir = TempDir::new().unwrap();
    let client = client_for(
        &dir,
        &format!(
            "{}\nprintf '{}'",
            RECORD_ARGS, r#"{"commits":[{"sha":"abc"}]}"#
        ),
    );

    let commits = client
        .commits()
        .list(
            BranchDescriptor::new("P", "B"),
            CommitListOptions::new().with_limit(1),
        )
        .await
        .unwrap();

    assert_eq!(serde_json::to_value(&commits).unwrap(), json!([{"sha": "abc"}]));
    assert_eq!(
        recorded_args(&dir),
        vec![
            "--user-token=test-token",
            "--api-url=https://api.goabstract.com",
            "commits",
            "P",
            "B",
            "--limit",
            "1",
        ]
    );
}

#[tokio::test]
#[serial]
async fn test_fixed_flags_precede_caller_overrides() {
    let dir = TempDir::new().unwrap();
    fake_cli(dir.path(), &format!("{}\nprintf '{{}}'", RECORD_ARGS));
    let bridge =
        CommandBridge::new(config(dir.path()).with_api_url("http://localhost:9000")).unwrap();

    bridge
        .invoke(
            vec!["files".to_string(), "--api-url=https://evil.test".to_string()],
            &InvokeOptions::default(),
        )
        .await
        .unwrap();

    let args = recorded_args(&dir);
    let first_api_url = args.iter().find(|arg| arg.starts_with("--api-url=")).unwrap();
    assert_eq!(first_api_url, "--api-url=http://localhost:9000");
    assert_eq!(args[0], "--user-token=test-token");
}

#[tokio::test]
#[serial]
async fn test_split_output_decodes_like_unsplit() {
    let dir = TempDir::new().unwrap();
    let split = client_for(
        &dir,
        r#"printf '{"commits":[{"sh'; sleep 0.1; printf 'a":"abc"}]}\n'"#,
    );
    let split_result = split
        .commits()
        .list(BranchDescriptor::new("P", "B"), CommitListOptions::default())
        .await
        .unwrap();

    let unsplit = client_for(&dir, r#"printf '{"commits":[{"sha":"abc"}]}\n'"#);
    let unsplit_result = unsplit
        .commits()
        .list(BranchDescriptor::new("P", "B"), CommitListOptions::default())
        .await
        .unwrap();

    assert_eq!(split_result, unsplit_result);
    assert_eq!(split_result[0].sha, "abc");
}

#[tokio::test]
#[serial]
async fn test_extra_values_are_ignored() {
    let dir = TempDir::new().unwrap();
    let client = client_for(
        &dir,
        r#"printf '{"collections":[{"id":"C1"}]}\n{"collections":[]}\n'"#,
    );

    let collections = client
        .collections()
        .list(ProjectDescriptor::new("P"))
        .await
        .unwrap();
    assert_eq!(collections, vec![json!({"id": "C1"})]);
}

#[tokio::test]
#[serial]
async fn test_nonzero_exit_after_value_fails_with_stderr() {
    let dir = TempDir::new().unwrap();
    let client = client_for(
        &dir,
        r#"printf '{"commits":[]}'; printf 'Error: branch not found\n' >&2; exit 2"#,
    );

    let err = client
        .commits()
        .list(BranchDescriptor::new("P", "B"), CommitListOptions::default())
        .await
        .unwrap_err();

    match &err {
        BridgeError::Process { code, stderr } => {
            assert_eq!(*code, Some(2));
            assert_eq!(stderr.as_slice(), b"Error: branch not found\n");
        }
        other => panic!("expected Process error, got {:?}", other),
    }
    assert_eq!(err.stderr(), Some(&b"Error: branch not found\n"[..]));
}

#[tokio::test]
#[serial]
async fn test_malformed_output_settles_without_waiting_for_exit() {
    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, "printf 'not json'; exec sleep 5");

    let started = Instant::now();
    let err = client
        .files()
        .list(&BranchDescriptor::new("P", "B"))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Decode(_)), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
#[serial]
async fn test_empty_output_policies() {
    let dir = TempDir::new().unwrap();
    fake_cli(dir.path(), "exit 0");

    let failing = CommandBridge::new(config(dir.path())).unwrap();
    let err = failing
        .invoke(vec!["files".to_string()], &InvokeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::EmptyOutput));

    let lenient =
        CommandBridge::new(config(dir.path()).with_empty_output(EmptyOutputPolicy::Null)).unwrap();
    let value = lenient
        .invoke(vec!["files".to_string()], &InvokeOptions::default())
        .await
        .unwrap();
    assert!(value.is_null());
}

#[tokio::test]
#[serial]
async fn test_timeout_kills_process() {
    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, "exec sleep 5").with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let err = client
        .files()
        .list(&BranchDescriptor::new("P", "B"))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout { .. }), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
#[serial]
async fn test_cancellation_kills_process() {
    let dir = TempDir::new().unwrap();
    let token = CancellationToken::new();
    let client = client_for(&dir, "exec sleep 5").with_cancellation(token.clone());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let started = Instant::now();
    let err = client
        .collections()
        .list(ProjectDescriptor::new("P"))
        .await
        .unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, BridgeError::Cancelled), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
#[serial]
async fn test_spawn_failures() {
    let dir = TempDir::new().unwrap();

    let missing =
        CommandBridge::with_executable(config(dir.path()), dir.path().join("missing")).unwrap();
    let err = missing
        .invoke(vec!["files".to_string()], &InvokeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Spawn { .. }), "got {:?}", err);

    let not_executable = dir.path().join("plain");
    std::fs::write(&not_executable, "#!/bin/sh\nexit 0\n").unwrap();
    let bridge = CommandBridge::with_executable(config(dir.path()), not_executable).unwrap();
    let err = bridge
        .invoke(vec!["files".to_string()], &InvokeOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Spawn { .. }), "got {:?}", err);
}

#[tokio::test]
#[serial]
async fn test_executable_not_found() {
    let dir = TempDir::new().unwrap();
    let err = AbstractClient::new(config(dir.path())).unwrap_err();
    match err {
        BridgeError::ExecutableNotFound { searched } => {
            assert!(searched.contains("abstract-cli"));
        }
        other => panic!("expected ExecutableNotFound, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_runs_in_configured_directory() {
    let dir = TempDir::new().unwrap();
    let client = client_for(&dir, r#"printf '{"cwd":"%s"}' "$(pwd -P)""#);

    let value = client
        .invoker()
        .invoke(vec!["whoami".to_string()], &InvokeOptions::default())
        .await
        .unwrap();

    let expected = std::fs::canonicalize(dir.path()).unwrap();
    assert_eq!(value["cwd"], expected.display().to_string());
}

#[tokio::test]
#[serial]
async fn test_latest_resolved_before_file_query() {
    let dir = TempDir::new().unwrap();
    let script = r#"
echo "$*" >> calls.txt
case "$3" in
  commits) printf '{"commits":[{"sha":"c0ffee"}]}' ;;
  file) printf '{"file":{"id":"%s"},"pages":[{"id":"p1","name":"Cover"}]}' "$6" ;;
  *) echo "unexpected command $3" >&2; exit 1 ;;
esac
"#;
    let client = client_for(&dir, script);
    let page = FileDescriptor::new("P", "B", LATEST, "F").page("p1");

    let found = client.pages().info(&page).await.unwrap().unwrap();
    let absent = client
        .pages()
        .info(&FileDescriptor::new("P", "B", "c0ffee", "F").page("nope"))
        .await
        .unwrap();

    assert_eq!(found.fields["name"], "Cover");
    assert!(absent.is_none());

    let calls = std::fs::read_to_string(dir.path().join("calls.txt")).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    let token = format!("--user-token={} --api-url={}", TOKEN, DEFAULT_API_URL);
    assert_eq!(
        calls,
        vec![
            format!("{} commits P B --file-id F --limit 1", token),
            format!("{} file P c0ffee F", token),
            format!("{} file P c0ffee F", token),
        ]
    );
    assert!(!calls.iter().any(|call| call.contains(LATEST)));
}

#[tokio::test]
#[serial]
async fn test_latest_without_commits_fails_resolution() {
    let dir = TempDir::new().unwrap();
    let client = client_for(
        &dir,
        r#"case "$3" in commits) printf '{"commits":[]}' ;; *) echo "unexpected" >&2; exit 1 ;; esac"#,
    );

    let err = client
        .commits()
        .info(CommitDescriptor::new("P", "B", LATEST))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Resolution { .. }), "got {:?}", err);
}

#[tokio::test]
#[serial]
async fn test_concurrent_invocations_are_independent() {
    let dir = TempDir::new().unwrap();
    let client = client_for(
        &dir,
        r#"sleep 0.1; printf '{"commits":[{"sha":"%s"}]}' "$5""#,
    );

    let branches = ["b1", "b2", "b3", "b4"];
    let results = futures::future::join_all(branches.iter().map(|branch| {
        let client = client.clone();
        async move {
            client
                .commits()
                .list(BranchDescriptor::new("P", *branch), CommitListOptions::default())
                .await
        }
    }))
    .await;

    for (branch, result) in branches.iter().zip(results) {
        let commits = result.unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, *branch);
    }
}
