use std::sync::{Arc, Mutex};

use kubewizard::config::{AppConfig, ApprovalMode, PartialConfig};
use kubewizard::console::BufferConsole;
use kubewizard::error::ExecError;
use kubewizard::exec::{KubeExecutor, REFUSAL_MESSAGE};
use kubewizard::safety::{ApprovalGate, AutoApprove, PredicateGate, SafetyLayer};
use tempfile::TempDir;

fn setup_workspace() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn test_config(workspace: &TempDir, timeout: u64) -> AppConfig {
    let mut config = PartialConfig {
        command_timeout_secs: Some(timeout),
        ..Default::default()
    }
    .finalize()
    .unwrap();
    config.working_dir = workspace.path().to_path_buf();
    config.security_log_path = workspace.path().join("logs/security.log");
    config
}

/// Gate answering `answer` and recording each command it was asked about.
fn recording_gate(answer: bool) -> (Box<dyn ApprovalGate>, Arc<Mutex<Vec<String>>>) {
    let asked = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&asked);
    let gate = PredicateGate::new(move |command: &str| {
        log.lock().unwrap().push(command.to_string());
        answer
    });
    (Box::new(gate), asked)
}

// ============================================================
// Gated execution
// ============================================================

#[tokio::test]
async fn refusal_returns_exact_message_and_runs_nothing() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, asked) = recording_gate(false);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();
    let marker = ws.path().join("deleted");

    let result = safety
        .execute_gated(&format!("touch {}", marker.display()), &BufferConsole::new())
        .await
        .unwrap();

    assert_eq!(result, REFUSAL_MESSAGE);
    assert!(!marker.exists());
    assert_eq!(asked.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn approval_runs_and_returns_output() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, _) = recording_gate(true);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();

    let result = safety
        .execute_gated("echo deployment.apps/nginx scaled", &BufferConsole::new())
        .await
        .unwrap();

    assert_eq!(result, "deployment.apps/nginx scaled\n");
}

#[tokio::test]
async fn gate_sees_the_normalized_command() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, asked) = recording_gate(true);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();

    let result = safety
        .execute_gated("  `echo ok`\n", &BufferConsole::new())
        .await
        .unwrap();

    assert_eq!(result, "ok\n");
    assert_eq!(*asked.lock().unwrap(), vec!["echo ok".to_string()]);
}

#[tokio::test]
async fn each_call_asks_again() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, asked) = recording_gate(true);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();
    let console = BufferConsole::new();

    safety.execute_gated("echo one", &console).await.unwrap();
    safety.execute_gated("echo one", &console).await.unwrap();

    assert_eq!(asked.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn console_approval_shows_command_and_reads_answer() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let safety = SafetyLayer::new(&config).unwrap();
    let console = BufferConsole::with_input(["maybe", "y"]);

    let result = safety.execute_gated("\"echo approved\"", &console).await.unwrap();

    assert_eq!(result, "approved\n");
    assert_eq!(
        console.lines(),
        vec![
            "✅ Do you approve of the following input?",
            "echo approved",
            "Please enter Y or N",
        ]
    );
}

#[tokio::test]
async fn console_approval_defaults_to_no() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let safety = SafetyLayer::new(&config).unwrap();
    let marker = ws.path().join("created");

    let result = safety
        .execute_gated(
            &format!("touch {}", marker.display()),
            &BufferConsole::with_input([""]),
        )
        .await
        .unwrap();

    assert_eq!(result, REFUSAL_MESSAGE);
    assert!(!marker.exists());
}

#[tokio::test]
async fn policy_mode_auto_approves_listed_commands_only() {
    let ws = setup_workspace();
    let mut config = test_config(&ws, 5);
    config.approval = ApprovalMode::Policy;
    config.auto_approve_patterns = vec![(r"^echo\b".to_string(), "Harmless echo".to_string())];
    let safety = SafetyLayer::new(&config).unwrap();

    let console = BufferConsole::new();
    let result = safety.execute_gated("echo listed", &console).await.unwrap();
    assert_eq!(result, "listed\n");
    assert_eq!(console.lines(), vec!["Auto-approved (Harmless echo): echo listed"]);

    // Metacharacters fall back to asking; closed input means no.
    let console = BufferConsole::new();
    let result = safety
        .execute_gated("echo listed; echo smuggled", &console)
        .await
        .unwrap();
    assert_eq!(result, REFUSAL_MESSAGE);
    assert_eq!(console.lines()[0], "✅ Do you approve of the following input?");
}

#[tokio::test]
async fn auto_mode_never_asks() {
    let ws = setup_workspace();
    let mut config = test_config(&ws, 5);
    config.approval = ApprovalMode::Auto;
    let safety = SafetyLayer::new(&config).unwrap();
    let console = BufferConsole::new();

    let result = safety.execute_gated("echo unattended", &console).await.unwrap();

    assert_eq!(result, "unattended\n");
    assert!(console.lines().is_empty());
}

// ============================================================
// Blocklist
// ============================================================

#[tokio::test]
async fn blocked_command_never_reaches_the_gate() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, asked) = recording_gate(true);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();

    let result = safety
        .execute_gated("kubectl delete ns kube-system", &BufferConsole::new())
        .await
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(parsed["blocked"], true);
    assert_eq!(parsed["command"], "kubectl delete ns kube-system");
    assert!(asked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ungated_execution_is_still_filtered() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let safety = SafetyLayer::with_gate(&config, Box::new(AutoApprove)).unwrap();

    let result = safety.execute("`sudo kubectl get pods`").await.unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
    assert_eq!(parsed["blocked"], true);
    assert_eq!(parsed["command"], "sudo kubectl get pods");
}

#[tokio::test]
async fn security_log_gets_one_line_per_blocked_command() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let safety = SafetyLayer::with_gate(&config, Box::new(AutoApprove)).unwrap();

    safety.execute("kubectl delete nodes worker-1").await.unwrap();
    safety.execute("echo allowed").await.unwrap();
    safety.execute("kubectl config view --raw").await.unwrap();

    let log = std::fs::read_to_string(safety.security_log_path()).unwrap();
    let lines: Vec<serde_json::Value> = log
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["command"], "kubectl delete nodes worker-1");
    assert!(lines[0]["timestamp"].is_u64());
    assert_eq!(lines[1]["command"], "kubectl config view --raw");
}

#[tokio::test]
async fn empty_blocklist_allows_everything() {
    let ws = setup_workspace();
    let mut config = test_config(&ws, 5);
    config.blocked_patterns = Vec::new();
    let safety = SafetyLayer::with_gate(&config, Box::new(AutoApprove)).unwrap();

    assert_eq!(safety.blocked_pattern_count(), 0);
    assert_eq!(safety.execute("echo reboot").await.unwrap(), "reboot\n");
}

// ============================================================
// Executor results
// ============================================================

#[tokio::test]
async fn unconditional_run_strips_one_quote_layer() {
    let ws = setup_workspace();
    let executor = KubeExecutor::new(ws.path(), 5);

    let result = executor.run_unconditional("\"echo hi\"").await.unwrap();

    assert_eq!(result, "hi\n");
}

#[tokio::test]
async fn runs_in_working_directory() {
    let ws = setup_workspace();
    let canonical = std::fs::canonicalize(ws.path()).unwrap();
    let executor = KubeExecutor::new(ws.path(), 5);

    let result = executor.run_unconditional("pwd").await.unwrap();

    assert_eq!(result.trim(), canonical.to_str().unwrap());
}

#[tokio::test]
async fn stderr_is_returned_when_stdout_is_empty() {
    let ws = setup_workspace();
    let executor = KubeExecutor::new(ws.path(), 5);

    let result = executor
        .run_unconditional("echo 'No resources found in default namespace.' >&2")
        .await
        .unwrap();

    assert_eq!(result, "No resources found in default namespace.\n");
}

#[tokio::test]
async fn non_zero_exit_is_a_failure() {
    let ws = setup_workspace();
    let executor = KubeExecutor::new(ws.path(), 5);

    let err = executor
        .run_unconditional("echo 'pods \"web\" not found' >&2; exit 1")
        .await
        .unwrap_err();

    match err {
        ExecError::Failed { exit_code, stderr } => {
            assert_eq!(exit_code, Some(1));
            assert_eq!(stderr, "pods \"web\" not found\n");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_reports_partial_output() {
    let ws = setup_workspace();
    let executor = KubeExecutor::new(ws.path(), 1);

    let err = executor
        .run_unconditional("echo watching; sleep 30")
        .await
        .unwrap_err();

    match err {
        ExecError::TimedOut {
            timeout_secs,
            partial_output,
        } => {
            assert_eq!(timeout_secs, 1);
            assert_eq!(partial_output, "watching\n");
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }
}

#[tokio::test]
async fn gated_failure_propagates_after_approval() {
    let ws = setup_workspace();
    let config = test_config(&ws, 5);
    let (gate, _) = recording_gate(true);
    let safety = SafetyLayer::with_gate(&config, gate).unwrap();

    let result = safety.execute_gated("exit 2", &BufferConsole::new()).await;

    assert!(matches!(
        result,
        Err(ExecError::Failed {
            exit_code: Some(2),
            ..
        })
    ));
}
