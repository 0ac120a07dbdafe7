use std::collections::BTreeSet;

use jiff::Timestamp;
use serde_json::json;

use super::*;

fn playbook() -> Playbook {
    Playbook::from_json(
        r#"{
            "name": "exfil",
            "title": "Data exfiltration",
            "phases": [
                {"name": "scope", "title": "Scope", "steps": [
                    {"name": "identify", "title": "Identify data"},
                    {"name": "timeline", "title": "Build timeline", "step_type": "analysis", "estimated_minutes": 30}
                ]},
                {"name": "respond", "title": "Respond", "steps": [
                    {"name": "revoke", "title": "Revoke tokens", "depends_on": ["identify"]},
                    {"name": "legal", "title": "Inform legal", "step_type": "approval", "required": false}
                ]}
            ]
        }"#,
    )
    .expect("valid playbook")
}

fn flow() -> Flow {
    Flow::instantiate(
        11,
        &playbook(),
        "INC-77",
        Some("dana"),
        Timestamp::from_second(1_700_000_000).unwrap(),
    )
}

#[test]
fn test_instantiate_keeps_phase_and_step_order() {
    let flow = flow();
    let names: Vec<&str> = flow.steps().map(|step| step.name.as_str()).collect();
    assert_eq!(names, vec!["identify", "timeline", "revoke", "legal"]);
    assert_eq!(flow.phase("respond").unwrap().title, "Respond");
    assert_eq!(flow.step("timeline").unwrap().estimated_minutes, 30);
    assert_eq!(
        flow.step("revoke").unwrap().depends_on,
        BTreeSet::from(["identify".to_string()])
    );
    assert!(!flow.step("legal").unwrap().required);
}

#[test]
fn test_steps_in_phase() {
    let flow = flow();
    let scope = flow.steps_in_phase("scope").unwrap();
    assert_eq!(scope.len(), 2);
    assert!(flow.steps_in_phase("eradicate").is_none());
}

#[test]
fn test_group_by_phase_preserves_first_seen_order() {
    let flow = flow();
    let groups = flow.group_by_phase();
    let phases: Vec<&str> = groups.iter().map(|(phase, _)| *phase).collect();
    assert_eq!(phases, vec!["scope", "respond"]);
    assert_eq!(groups[1].1.len(), 2);
}

#[test]
fn test_status_counts_include_every_status() {
    let mut flow = flow();
    flow.step_mut("identify").unwrap().status = StepStatus::Completed;
    flow.step_mut("legal").unwrap().status = StepStatus::Skipped;

    let counts = flow.status_counts();
    assert_eq!(counts.iter().count(), StepStatus::ALL.len());
    assert_eq!(counts.get(StepStatus::Pending), 2);
    assert_eq!(counts.get(StepStatus::Completed), 1);
    assert_eq!(counts.get(StepStatus::Failed), 0);
    assert_eq!(counts.total(), 4);
}

#[test]
fn test_current_step_prefers_active_step() {
    let mut flow = flow();
    assert_eq!(flow.current_step().unwrap().name, "identify");

    flow.step_mut("timeline").unwrap().status = StepStatus::WaitingForInput;
    assert_eq!(flow.current_step().unwrap().name, "timeline");
    assert_eq!(flow.remaining_steps(), 4);
}

#[test]
fn test_flow_summary_from_flow() {
    let mut flow = flow();
    flow.step_mut("identify").unwrap().status = StepStatus::Completed;

    let summary = FlowSummary::from(&flow);
    assert_eq!(summary.total_steps, 4);
    assert_eq!(summary.completed_steps, 1);
    assert_eq!(summary.progress, 25);
    assert_eq!(summary.current_step.as_deref(), Some("timeline"));
    assert_eq!(summary.started_by.as_deref(), Some("dana"));
}

#[test]
fn test_step_duration() {
    let mut flow = flow();
    let step = flow.step_mut("identify").unwrap();
    assert_eq!(step.duration_seconds(), None);

    step.started_at = Some(Timestamp::from_second(1_700_000_000).unwrap());
    step.finished_at = Some(Timestamp::from_second(1_700_000_185).unwrap());
    assert_eq!(step.duration_seconds(), Some(185));
}

#[test]
fn test_flow_serde_round_trip_omits_empty_fields() {
    let flow = flow();
    let value = serde_json::to_value(&flow).unwrap();
    assert_eq!(value["status"], json!("active"));
    assert!(value.get("commit").is_none());
    assert!(value["phases"][0]["steps"][0].get("depends_on").is_none());

    let back: Flow = serde_json::from_value(value).unwrap();
    assert_eq!(back, flow);
}

#[test]
fn test_step_action_wire_format() {
    let action: StepAction =
        serde_json::from_value(json!({"action": "submit_input", "input": {"host": "db-01"}}))
            .unwrap();
    assert_eq!(action.target_status(), StepStatus::InProgress);
    assert_eq!(action.name(), "submit_input");

    let control = FlowControl::Cancel {
        reason: "false alarm".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&control).unwrap(),
        json!({"action": "cancel", "reason": "false alarm"})
    );
    assert_eq!(control.target_status(), FlowStatus::Cancelled);
}

#[test]
fn test_status_parsing() {
    assert_eq!("in_progress".parse::<StepStatus>(), Ok(StepStatus::InProgress));
    assert_eq!("Canceled".parse::<FlowStatus>(), Ok(FlowStatus::Cancelled));
    assert_eq!(
        "false-positive".parse::<AlertDisposition>(),
        Ok(AlertDisposition::FalsePositive)
    );
    assert!("done".parse::<StepStatus>().is_err());
}

#[test]
fn test_dashboard_merges_counts() {
    let first = flow();
    let mut second = flow();
    second.id = 12;
    second.step_mut("identify").unwrap().status = StepStatus::Failed;

    let dashboard = DashboardSummary::from_flows(None, &[first, second]);
    assert_eq!(dashboard.flows.len(), 2);
    assert_eq!(dashboard.status_counts.get(StepStatus::Pending), 7);
    assert_eq!(dashboard.status_counts.get(StepStatus::Failed), 1);
}
