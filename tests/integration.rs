use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn travelbot_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("travelbot");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let source_dir = root.join("source_docs");
    fs::create_dir_all(&source_dir).unwrap();
    fs::write(
        source_dir.join("jtr.txt"),
        "Lodging reimbursement under the Joint Travel Regulations requires \
         itemized receipts and is capped at the locality per diem rate for \
         the duty location. Actual expense authority may raise the cap when \
         approved in advance by the authorizing official.\n\n\
         Privately owned vehicle mileage is reimbursed at the published \
         rate per mile for the official distance between the old and new \
         permanent duty stations, computed by the Defense Table of Official \
         Distances rather than the odometer reading.",
    )
    .unwrap();
    fs::write(
        source_dir.join("dafi.txt"),
        "Leave in conjunction with official travel must be approved before \
         departure, and the traveler bears any additional cost above the \
         constructed cost of the official itinerary. Supervisors document \
         approval on the travel authorization before tickets are issued.",
    )
    .unwrap();

    let config_content = format!(
        r#"[store]
source_dir = "{root}/source_docs"
chunk_dir = "{root}/jtr_chunks"

[index]
dir = "{root}/vectordb"

[embedding]
endpoint = "http://127.0.0.1:1"
model = "all-minilm"
dims = 384
max_retries = 0
timeout_secs = 1

[generation]
endpoint = "http://127.0.0.1:1"
model = "flan-t5-base"
timeout_secs = 1

[audit]
question_log = "{root}/context/sample_questions.txt"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("travelbot.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_travelbot(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = travelbot_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run travelbot binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_ingest_builds_chunk_store() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_travelbot(&config_path, &["ingest"]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents processed: 2"));
    assert!(stdout.contains("ok"));

    let chunk_dir = tmp.path().join("jtr_chunks");
    let chunk_files: Vec<_> = fs::read_dir(&chunk_dir).unwrap().collect();
    assert!(!chunk_files.is_empty(), "no chunk files written");
}

#[test]
fn test_ingest_idempotent() {
    let (tmp, config_path) = setup_test_env();

    let (stdout1, _, success1) = run_travelbot(&config_path, &["ingest"]);
    assert!(success1, "first ingest failed");

    let chunks_after_first: Vec<String> = fs::read_dir(tmp.path().join("jtr_chunks"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();

    let (stdout2, _, success2) = run_travelbot(&config_path, &["ingest"]);
    assert!(success2, "second ingest failed");
    assert_eq!(stdout1, stdout2);

    let chunks_after_second: Vec<String> = fs::read_dir(tmp.path().join("jtr_chunks"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(chunks_after_first.len(), chunks_after_second.len());
}

#[test]
fn test_ingest_flags_disallowed_content() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        tmp.path().join("source_docs").join("stale.txt"),
        "Members are always entitled to full lodging reimbursement without \
         receipts and should submit claims through the legacy portal, which \
         remains the authoritative system for all travel voucher processing \
         regardless of later policy memoranda issued by the service.",
    )
    .unwrap();

    let (stdout, _, success) = run_travelbot(&config_path, &["ingest"]);
    assert!(success);
    assert!(stdout.contains("chunks flagged: 1"), "stdout={}", stdout);

    // Flagged content must not reach the store.
    for entry in fs::read_dir(tmp.path().join("jtr_chunks")).unwrap() {
        let content = fs::read_to_string(entry.unwrap().path()).unwrap();
        assert!(!content.to_lowercase().contains("always entitled"));
    }
}

#[test]
fn test_index_empty_store_fails_without_snapshot() {
    let (tmp, config_path) = setup_test_env();

    // No ingest: the chunk store is empty, so the build must fail and
    // leave no snapshot behind.
    let (stdout, stderr, success) = run_travelbot(&config_path, &["index", "--mode", "all"]);
    assert!(!success, "index on empty store should fail: {}", stdout);
    assert!(
        stderr.contains("nothing to embed"),
        "unexpected stderr: {}",
        stderr
    );
    assert!(!tmp.path().join("vectordb").join("travelbot").exists());
}

#[test]
fn test_index_retrain_requires_flagged_keys() {
    let (_tmp, config_path) = setup_test_env();

    run_travelbot(&config_path, &["ingest"]);
    let (_, stderr, success) = run_travelbot(&config_path, &["index", "--mode", "retrain"]);
    assert!(!success);
    assert!(stderr.contains("--flagged"), "unexpected stderr: {}", stderr);
}

#[test]
fn test_ask_fails_fast_without_index() {
    let (_tmp, config_path) = setup_test_env();

    run_travelbot(&config_path, &["ingest"]);
    let (_, stderr, success) = run_travelbot(&config_path, &["ask", "What is per diem?"]);
    assert!(!success, "ask without an index snapshot should fail");
    assert!(stderr.contains("travelbot"), "unexpected stderr: {}", stderr);
}

#[test]
fn test_unknown_index_mode_rejected() {
    let (_tmp, config_path) = setup_test_env();

    run_travelbot(&config_path, &["ingest"]);
    let (_, stderr, success) = run_travelbot(&config_path, &["index", "--mode", "nightly"]);
    assert!(!success);
    assert!(stderr.contains("Unknown index mode"), "stderr={}", stderr);
}
