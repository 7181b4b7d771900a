use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("taskpad-{nanos}-{name}"))
}

fn seed(storage: &Path, autosave_delay_ms: u64) {
    let content = serde_json::json!({
        "schemaVersion": 1,
        "tasks": [
            {
                "id": "task-1",
                "title": "old",
                "description": "",
                "status": "pending",
                "pinned": false,
                "assignedTo": "User",
                "createdAt": "2025-01-01T10:00:00Z"
            }
        ]
    });
    std::fs::create_dir_all(storage).unwrap();
    std::fs::write(storage.join("tasks.json"), content.to_string()).unwrap();

    let config = serde_json::json!({ "autosave_delay_ms": autosave_delay_ms });
    std::fs::write(storage.join("config.json"), config.to_string()).unwrap();
}

fn spawn_session(storage: &Path) -> std::process::Child {
    let exe = env!("CARGO_BIN_EXE_taskpad");

    Command::new(exe)
        .env("TASKPAD_STORAGE_DIR", storage)
        .env("TASKPAD_CONFIG_PATH", storage.join("config.json"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session")
}

fn run_interactive(storage: &Path, input: &str) -> std::process::Output {
    let mut child = spawn_session(storage);

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    child
        .wait_with_output()
        .expect("failed to read interactive output")
}

fn wait_for_title(storage: &Path, expected: &str, timeout: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < timeout {
        let title = std::fs::read_to_string(storage.join("tasks.json"))
            .ok()
            .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
            .and_then(|stored| stored["tasks"][0]["title"].as_str().map(str::to_string));
        if title.as_deref() == Some(expected) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

fn stored_title(storage: &Path) -> String {
    let content = std::fs::read_to_string(storage.join("tasks.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    stored["tasks"][0]["title"].as_str().unwrap().to_string()
}

#[test]
fn interactive_help_shows_usage() {
    let storage = temp_path("interactive-help");

    let output = run_interactive(&storage, "help\n?\nexit\n");

    std::fs::remove_dir_all(&storage).ok();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.matches("Usage").count() >= 2);
}

#[test]
fn interactive_invalid_command_prints_error_and_continues() {
    let storage = temp_path("interactive-invalid");

    let output = run_interactive(&storage, "nope\nadd \"demo task\"\nexit\n");

    std::fs::remove_dir_all(&storage).ok();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Added task: demo task"));
}

#[test]
fn interactive_unterminated_quote_is_reported() {
    let storage = temp_path("interactive-quote");

    let output = run_interactive(&storage, "add \"half\nexit\n");

    std::fs::remove_dir_all(&storage).ok();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unterminated quote"));
}

#[test]
fn editor_autosaves_after_quiet_period() {
    let storage = temp_path("interactive-autosave");
    seed(&storage, 0);

    let output = run_interactive(&storage, "open task-1\nset title \"new title\"\nlist\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Editing task: old (task-1)"));
    assert!(stdout.contains("Auto-saved task: new title (task-1)"));
    assert_eq!(stored_title(&storage), "new title");
    std::fs::remove_dir_all(&storage).ok();
}

#[test]
fn editor_autosaves_while_input_is_idle() {
    let storage = temp_path("interactive-idle");
    seed(&storage, 150);

    let mut child = spawn_session(&storage);
    let mut stdin = child.stdin.take().expect("stdin");
    stdin
        .write_all(b"open task-1\nset title \"Buy oat milk\"\n")
        .expect("failed to write to stdin");
    stdin.flush().expect("failed to flush stdin");

    let saved = wait_for_title(&storage, "Buy oat milk", Duration::from_secs(5));

    stdin.write_all(b"exit\n").expect("failed to write exit");
    drop(stdin);
    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");
    std::fs::remove_dir_all(&storage).ok();

    assert!(saved, "edit was not saved while the session sat idle");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Auto-saved task: Buy oat milk (task-1)"));
    assert!(!stdout.contains("Saved task: Buy oat milk"));
}

#[test]
fn editor_close_discards_unsaved_edits() {
    let storage = temp_path("interactive-close");
    seed(&storage, 60_000);

    let output = run_interactive(&storage, "open task-1\nset title changed\nclose\nexit\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unsaved changes discarded"));
    assert_eq!(stored_title(&storage), "old");
    std::fs::remove_dir_all(&storage).ok();
}

#[test]
fn editor_save_writes_immediately() {
    let storage = temp_path("interactive-save");
    seed(&storage, 60_000);

    let output = run_interactive(&storage, "open task-1\nset title changed\nsave\nsave\nclose\n");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Saved task: changed (task-1)"));
    assert!(stdout.contains("No pending changes"));
    assert_eq!(stored_title(&storage), "changed");
    std::fs::remove_dir_all(&storage).ok();
}

#[test]
fn leaving_the_session_flushes_pending_edits() {
    let storage = temp_path("interactive-exit");
    seed(&storage, 60_000);

    let output = run_interactive(&storage, "open task-1\nset title changed\n");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Saved task: changed (task-1)"));
    assert_eq!(stored_title(&storage), "changed");
    std::fs::remove_dir_all(&storage).ok();
}

#[test]
fn set_without_open_task_is_an_error() {
    let storage = temp_path("interactive-set");
    seed(&storage, 900);

    let output = run_interactive(&storage, "set title changed\nexit\n");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input - no task is open"));
    assert_eq!(stored_title(&storage), "old");
    std::fs::remove_dir_all(&storage).ok();
}
