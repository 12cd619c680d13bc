// Command line workflow against a temporary state file

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

struct CliWorkspace {
    dir: TempDir,
}

impl CliWorkspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn state(&self) -> std::path::PathBuf {
        self.dir.path().join("state.json")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("deee-certify").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .arg("--state")
            .arg(self.state());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).arg("--json").assert().success();
        serde_json::from_slice(&output.get_output().stdout).unwrap()
    }

    fn create_recycling_request(&self) -> String {
        let request = self.json(&[
            "create",
            "--as",
            "green-cycle",
            "--treatment",
            "recycling",
            "--company",
            "Green Cycle SARL",
            "--site",
            "Oran",
            "--document",
            "permit.pdf=uploads/permit.pdf",
        ]);
        assert_eq!(request["status"], "submitted");
        request["id"].as_str().unwrap().to_string()
    }

    fn record(&self, id: &str, step: &str, law: Option<&str>, value: &str) {
        let mut cmd = self.cmd();
        cmd.args(["record", id, "--step", step, "--value", value]);
        if let Some(law) = law {
            cmd.args(["--law", law]);
        }
        cmd.assert().success();
    }

    fn first_review(&self, target: &Path) {
        let state: Value = serde_json::from_str(&std::fs::read_to_string(self.state()).unwrap()).unwrap();
        std::fs::write(target, serde_json::to_string(&state["reviews"][0]).unwrap()).unwrap();
    }
}

#[test]
fn test_help_lists_workflow_commands() {
    let mut cmd = Command::cargo_bin("deee-certify").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("assign"))
        .stdout(predicate::str::contains("approve"))
        .stdout(predicate::str::contains("resubmit"))
        .stdout(predicate::str::contains("transitions"));
}

#[test]
fn test_transitions_table() {
    let ws = CliWorkspace::new();
    ws.cmd()
        .arg("transitions")
        .assert()
        .success()
        .stdout(predicate::str::contains("under_review"))
        .stdout(predicate::str::contains("approve_and_generate"));
}

#[test]
fn test_laws_for_recycling() {
    let ws = CliWorkspace::new();
    let view = ws.json(&["laws", "recycling"]);
    let ids: Vec<&str> = view["laws"]
        .as_array()
        .unwrap()
        .iter()
        .map(|law| law["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"LAW-28-00"));
    assert!(ids.contains(&"LAW-11-03"));
    assert!(view["form"]["fields"].as_array().is_some());
}

#[test]
fn test_full_certification_through_cli() {
    let ws = CliWorkspace::new();
    let id = ws.create_recycling_request();

    ws.cmd()
        .args(["assign", &id, "--as", "inspector-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("under review"));

    ws.record(&id, "1", None, "true");
    for law in ["LAW-28-00", "DEC-2-14-85", "LAW-11-03"] {
        ws.record(&id, "legal_compliance", Some(law), "true");
    }
    ws.record(&id, "3", None, "true");

    let gate = ws.json(&["checklist", &id]);
    assert_eq!(gate["gate"]["can_approve"], true);

    ws.cmd()
        .args(["approve", &id, "--comments", "All permits valid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("approved"))
        .stdout(predicate::str::contains("CERT-"));

    let request = ws.json(&["status", &id]);
    assert_eq!(request["status"], "approved");
    assert_eq!(request["decision_comments"], "All permits valid");

    let history = ws.json(&["history", &id]);
    assert_eq!(history.as_array().unwrap().len(), 3);
}

#[test]
fn test_gate_blocks_approval_with_missing_law() {
    let ws = CliWorkspace::new();
    let id = ws.create_recycling_request();
    ws.cmd()
        .args(["assign", &id, "--as", "inspector-1"])
        .assert()
        .success();
    ws.record(&id, "1", None, "true");
    ws.record(&id, "2", Some("LAW-28-00"), "true");
    ws.record(&id, "2", Some("DEC-2-14-85"), "true");
    ws.record(&id, "3", None, "true");

    ws.cmd()
        .args(["approve", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("LAW-11-03"));

    let request = ws.json(&["status", &id]);
    assert_eq!(request["status"], "under_review");

    let review_file = ws.dir.path().join("review.json");
    ws.first_review(&review_file);
    ws.cmd()
        .arg("gate")
        .arg(&review_file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Missing mandatory laws: LAW-11-03"));

    ws.record(&id, "2", Some("LAW-11-03"), "true");
    ws.first_review(&review_file);
    ws.cmd()
        .arg("gate")
        .arg(&review_file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready for approval"));
}

#[test]
fn test_reject_and_resubmit() {
    let ws = CliWorkspace::new();
    let id = ws.create_recycling_request();
    ws.cmd()
        .args(["assign", &id, "--as", "inspector-1"])
        .assert()
        .success();

    ws.cmd()
        .args(["reject", &id, "--reason", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reason"));

    ws.cmd()
        .args(["reject", &id, "--reason", "Permit expired"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RPT-"));

    let fresh = ws.json(&[
        "resubmit",
        &id,
        "--company",
        "Green Cycle SARL",
        "--site",
        "Oran",
        "--document",
        "permit.pdf=uploads/permit-2025.pdf",
    ]);
    assert_eq!(fresh["status"], "submitted");
    assert_eq!(fresh["predecessor"], id.as_str());

    let rejected = ws.json(&["list", "--status", "rejected"]);
    assert_eq!(rejected.as_array().unwrap().len(), 1);

    ws.cmd()
        .args([
            "resubmit", &id, "--company", "Green Cycle SARL", "--site", "Oran", "--data",
            r#"{"tonnage": 40}"#,
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already resubmitted"));
}

#[test]
fn test_draft_submit_and_cancel() {
    let ws = CliWorkspace::new();
    let draft = ws.json(&[
        "create", "--as", "green-cycle", "--treatment", "collection", "--company",
        "Green Cycle SARL", "--site", "", "--draft",
    ]);
    assert_eq!(draft["status"], "draft");
    let id = draft["id"].as_str().unwrap();

    ws.cmd()
        .args(["submit", id, "--as", "green-cycle"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("site_address"));

    ws.cmd()
        .args(["cancel", id, "--as", "someone-else"])
        .assert()
        .failure();

    ws.cmd()
        .args(["cancel", id, "--as", "green-cycle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
}

#[test]
fn test_payment_flag() {
    let ws = CliWorkspace::new();
    let id = ws.create_recycling_request();
    let paid = ws.json(&["pay", &id]);
    assert_eq!(paid["has_payment"], true);
    assert_eq!(paid["version"], 0);
}

#[test]
fn test_unknown_request_fails() {
    let ws = CliWorkspace::new();
    ws.cmd()
        .args(["status", "00000000-0000-4000-8000-000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_lists_next_operations() {
    let ws = CliWorkspace::new();
    let id = ws.create_recycling_request();

    ws.cmd()
        .args(["status", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next:        assign_to_me, cancel"));

    ws.cmd()
        .args(["cancel", &id, "--as", "green-cycle"])
        .assert()
        .success();
    ws.cmd()
        .args(["status", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next:        none (final)"));
}
