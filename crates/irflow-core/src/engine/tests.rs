use jiff::Timestamp;
use serde_json::json;

use super::{
    machine::{apply_commit, apply_control, apply_step_action, check_step_action},
    progress::{self, FlowOutcome, FlowProgress},
    resolver::{self, Resolution},
};
use crate::{
    error::FlowError,
    models::{
        AlertDisposition, Flow, FlowCommit, FlowControl, FlowStatus, IncidentStatus, Playbook,
        StepAction, StepStatus,
    },
};

fn ts(seconds: i64) -> Timestamp {
    Timestamp::from_second(1_700_000_000 + seconds).unwrap()
}

/// Three phases: triage (a, b), contain (c depends on a, optional d), recover
/// (e depends on c).
fn sample_flow() -> Flow {
    let playbook = Playbook::from_json(
        r#"{
            "name": "phishing",
            "title": "Phishing response",
            "phases": [
                {"name": "triage", "title": "Triage", "steps": [
                    {"name": "a", "title": "Review alert", "estimated_minutes": 10},
                    {"name": "b", "title": "Identify recipients"}
                ]},
                {"name": "contain", "title": "Contain", "steps": [
                    {"name": "c", "title": "Block sender", "depends_on": ["a"]},
                    {"name": "d", "title": "Notify users", "required": false}
                ]},
                {"name": "recover", "title": "Recover", "steps": [
                    {"name": "e", "title": "Purge mailboxes", "depends_on": ["c"]}
                ]}
            ]
        }"#,
    )
    .unwrap();
    Flow::instantiate(7, &playbook, "INC-1", Some("alice"), ts(0))
}

fn three_step_flow() -> Flow {
    let playbook = Playbook::from_json(
        r#"{
            "name": "simple",
            "title": "Simple",
            "phases": [{"name": "only", "title": "Only", "steps": [
                {"name": "s1", "title": "One"},
                {"name": "s2", "title": "Two"},
                {"name": "s3", "title": "Three"}
            ]}]
        }"#,
    )
    .unwrap();
    Flow::instantiate(1, &playbook, "INC-3", None, ts(0))
}

fn run(flow: &mut Flow, step: &str, action: StepAction) {
    apply_step_action(flow, step, &action, ts(60)).unwrap();
}

fn finish(flow: &mut Flow, step: &str) {
    run(flow, step, StepAction::Start);
    run(flow, step, StepAction::Complete { output: None });
}

fn commit_request() -> FlowCommit {
    FlowCommit {
        final_report: "Sender blocked, mailboxes purged".to_string(),
        alert_disposition: AlertDisposition::Resolved,
        incident_status: IncidentStatus::Resolved,
    }
}

#[test]
fn test_start_only_from_pending() {
    for status in StepStatus::ALL {
        let mut flow = three_step_flow();
        flow.step_mut("s1").unwrap().status = status;

        let result = apply_step_action(&mut flow, "s1", &StepAction::Start, ts(1));
        if status == StepStatus::Pending {
            assert!(result.is_ok());
            assert_eq!(flow.step("s1").unwrap().status, StepStatus::InProgress);
            assert_eq!(flow.step("s1").unwrap().started_at, Some(ts(1)));
        } else {
            assert!(
                matches!(result, Err(FlowError::InvalidTransition { from, to: StepStatus::InProgress, .. }) if from == status),
                "start from {status:?} should be rejected"
            );
        }
    }
}

#[test]
fn test_terminal_steps_reject_every_action() {
    let actions = [
        StepAction::Start,
        StepAction::Complete { output: None },
        StepAction::Fail { error: None },
        StepAction::Skip {
            reason: "n/a".to_string(),
        },
        StepAction::AwaitInput,
        StepAction::SubmitInput { input: json!({}) },
        StepAction::AwaitApproval,
        StepAction::Approve {
            approver: "bob".to_string(),
            note: None,
        },
        StepAction::Reject {
            approver: "bob".to_string(),
            reason: "no".to_string(),
        },
    ];

    for terminal in [StepStatus::Completed, StepStatus::Failed, StepStatus::Skipped] {
        for action in &actions {
            let mut flow = sample_flow();
            flow.step_mut("d").unwrap().status = terminal;
            let result = apply_step_action(&mut flow, "d", action, ts(1));
            assert!(
                matches!(result, Err(FlowError::InvalidTransition { .. })),
                "{} from {terminal:?} should be rejected",
                action.name()
            );
            assert_eq!(flow.step("d").unwrap().status, terminal);
        }
    }
}

#[test]
fn test_skip_optional_succeeds_and_required_fails() {
    let mut flow = sample_flow();

    apply_step_action(
        &mut flow,
        "d",
        &StepAction::Skip {
            reason: "Users already informed".to_string(),
        },
        ts(5),
    )
    .unwrap();
    let skipped = flow.step("d").unwrap();
    assert_eq!(skipped.status, StepStatus::Skipped);
    assert_eq!(skipped.skip_reason.as_deref(), Some("Users already informed"));
    assert_eq!(skipped.finished_at, Some(ts(5)));

    let err = apply_step_action(
        &mut flow,
        "b",
        &StepAction::Skip {
            reason: "Too busy".to_string(),
        },
        ts(5),
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::RequiredStep { ref step } if step == "b"));
    assert_eq!(flow.step("b").unwrap().status, StepStatus::Pending);
}

#[test]
fn test_start_with_unmet_dependency_fails() {
    let mut flow = sample_flow();

    let steps = flow.all_steps();
    let c = flow.step("c").unwrap();
    assert!(!resolver::can_execute(c, &steps));

    let err = apply_step_action(&mut flow, "c", &StepAction::Start, ts(1)).unwrap_err();
    match err {
        FlowError::DependencyNotSatisfied { step, unmet } => {
            assert_eq!(step, "c");
            assert_eq!(unmet, vec!["a".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    finish(&mut flow, "a");
    let steps = flow.all_steps();
    assert!(resolver::can_execute(flow.step("c").unwrap(), &steps));
    run(&mut flow, "c", StepAction::Start);
}

#[test]
fn test_can_execute_matches_dependency_statuses() {
    for status in StepStatus::ALL {
        let mut flow = sample_flow();
        flow.step_mut("a").unwrap().status = status;
        let steps = flow.all_steps();
        let c = flow.step("c").unwrap();
        assert_eq!(
            resolver::can_execute(c, &steps),
            status == StepStatus::Completed,
            "dependency in {status:?}"
        );
    }
}

#[test]
fn test_missing_dependency_counts_as_unmet() {
    let mut flow = three_step_flow();
    flow.step_mut("s2")
        .unwrap()
        .depends_on
        .insert("ghost".to_string());

    let steps = flow.all_steps();
    let s2 = flow.step("s2").unwrap();
    assert_eq!(resolver::unmet_dependencies(s2, &steps), vec!["ghost"]);
    assert!(!resolver::can_execute(s2, &steps));
}

#[test]
fn test_wait_states_round_trip_to_in_progress() {
    let mut flow = three_step_flow();
    run(&mut flow, "s1", StepAction::Start);
    run(&mut flow, "s1", StepAction::AwaitInput);
    assert_eq!(flow.step("s1").unwrap().status, StepStatus::WaitingForInput);

    run(
        &mut flow,
        "s1",
        StepAction::SubmitInput {
            input: json!({"hosts": ["web-01"]}),
        },
    );
    let s1 = flow.step("s1").unwrap();
    assert_eq!(s1.status, StepStatus::InProgress);
    assert_eq!(s1.input_data, Some(json!({"hosts": ["web-01"]})));

    run(&mut flow, "s1", StepAction::AwaitApproval);
    run(
        &mut flow,
        "s1",
        StepAction::Approve {
            approver: "lead".to_string(),
            note: Some("ok".to_string()),
        },
    );
    let s1 = flow.step("s1").unwrap();
    assert_eq!(s1.status, StepStatus::Completed);
    assert_eq!(
        s1.output_data,
        Some(json!({"approved_by": "lead", "note": "ok"}))
    );
}

#[test]
fn test_reject_records_error() {
    let mut flow = three_step_flow();
    run(&mut flow, "s1", StepAction::Start);
    run(&mut flow, "s1", StepAction::AwaitApproval);
    run(
        &mut flow,
        "s1",
        StepAction::Reject {
            approver: "lead".to_string(),
            reason: "Scope too wide".to_string(),
        },
    );

    let s1 = flow.step("s1").unwrap();
    assert_eq!(s1.status, StepStatus::Failed);
    assert_eq!(
        s1.error_data,
        Some(json!({"rejected_by": "lead", "reason": "Scope too wide"}))
    );
    assert!(s1.finished_at.is_some());
}

#[test]
fn test_empty_approver_rejected() {
    let mut flow = three_step_flow();
    run(&mut flow, "s1", StepAction::Start);
    run(&mut flow, "s1", StepAction::AwaitApproval);

    let err = check_step_action(
        &flow,
        "s1",
        &StepAction::Approve {
            approver: "  ".to_string(),
            note: None,
        },
    )
    .unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput { ref field, .. } if field == "approver"));
}

#[test]
fn test_unknown_step_and_inactive_flow() {
    let mut flow = three_step_flow();
    let err = check_step_action(&flow, "nope", &StepAction::Start).unwrap_err();
    assert!(matches!(err, FlowError::StepNotFound { flow_id: 1, ref name } if name == "nope"));

    apply_control(
        &mut flow,
        &FlowControl::Pause {
            reason: "shift change".to_string(),
        },
        ts(1),
    )
    .unwrap();
    let err = check_step_action(&flow, "s1", &StepAction::Start).unwrap_err();
    assert!(matches!(
        err,
        FlowError::FlowNotActive {
            status: FlowStatus::Paused,
            ..
        }
    ));
}

#[test]
fn test_three_step_scenario() {
    let mut flow = three_step_flow();
    finish(&mut flow, "s1");
    finish(&mut flow, "s2");

    let steps = flow.all_steps();
    assert_eq!(
        resolver::next_executable_step(&steps).map(|s| s.name.as_str()),
        Some("s3")
    );
    assert!(!progress::is_flow_complete(&steps));

    finish(&mut flow, "s3");
    let steps = flow.all_steps();
    assert!(progress::is_flow_complete(&steps));
    assert_eq!(progress::flow_progress(&steps), 100);
    assert_eq!(progress::outcome(&steps), FlowOutcome::Succeeded);
    assert_eq!(resolver::resolve(&steps), Resolution::Complete);
}

#[test]
fn test_progress_is_monotonic() {
    let mut flow = sample_flow();
    let mut last = progress::flow_progress(&flow.all_steps());
    assert_eq!(last, 0);

    let script: Vec<(&str, StepAction)> = vec![
        ("a", StepAction::Start),
        ("a", StepAction::Complete { output: None }),
        ("b", StepAction::Start),
        ("b", StepAction::AwaitInput),
        ("b", StepAction::SubmitInput { input: json!("x") }),
        ("b", StepAction::Complete { output: None }),
        (
            "d",
            StepAction::Skip {
                reason: "n/a".to_string(),
            },
        ),
        ("c", StepAction::Start),
        ("c", StepAction::Complete { output: None }),
        ("e", StepAction::Start),
        ("e", StepAction::Fail { error: None }),
    ];

    for (step, action) in script {
        run(&mut flow, step, action);
        let current = progress::flow_progress(&flow.all_steps());
        assert!(current >= last, "progress dropped after {step}");
        last = current;
    }
}

#[test]
fn test_failed_required_step_degrades_flow() {
    let mut flow = three_step_flow();
    finish(&mut flow, "s1");
    run(&mut flow, "s2", StepAction::Start);
    run(
        &mut flow,
        "s2",
        StepAction::Fail {
            error: Some(json!("EDR unreachable")),
        },
    );
    finish(&mut flow, "s3");

    let steps = flow.all_steps();
    assert!(progress::has_failed_required_steps(&steps));
    assert!(progress::is_flow_complete(&steps));
    assert!(progress::flow_progress(&steps) < 100);
    assert_eq!(progress::flow_progress(&steps), 67);
    assert_eq!(progress::outcome(&steps), FlowOutcome::Degraded);
}

#[test]
fn test_is_flow_complete_requires_all_terminal() {
    let flow = three_step_flow();
    for status in StepStatus::ALL {
        let mut flow = flow.clone();
        for name in ["s1", "s2"] {
            flow.step_mut(name).unwrap().status = StepStatus::Completed;
        }
        flow.step_mut("s3").unwrap().status = status;
        assert_eq!(
            progress::is_flow_complete(&flow.all_steps()),
            status.is_terminal()
        );
    }
    assert!(progress::is_flow_complete(&[]));
    assert_eq!(progress::flow_progress(&[]), 0);
}

#[test]
fn test_skip_does_not_count_as_progress() {
    let mut flow = sample_flow();
    run(
        &mut flow,
        "d",
        StepAction::Skip {
            reason: "n/a".to_string(),
        },
    );
    assert_eq!(progress::flow_progress(&flow.all_steps()), 0);
}

#[test]
fn test_current_step_auto_advances_across_phases() {
    let mut flow = sample_flow();
    assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("a"));

    run(&mut flow, "a", StepAction::Start);
    assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("a"));

    run(&mut flow, "a", StepAction::Complete { output: None });
    assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("b"));

    finish(&mut flow, "b");
    assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("c"));

    finish(&mut flow, "c");
    run(
        &mut flow,
        "d",
        StepAction::Skip {
            reason: "n/a".to_string(),
        },
    );
    assert_eq!(flow.current_step().map(|s| s.name.as_str()), Some("e"));
}

#[test]
fn test_failed_dependency_deadlocks_flow() {
    let mut flow = sample_flow();
    run(&mut flow, "a", StepAction::Start);
    run(&mut flow, "a", StepAction::Fail { error: None });
    finish(&mut flow, "b");
    run(
        &mut flow,
        "d",
        StepAction::Skip {
            reason: "n/a".to_string(),
        },
    );

    let steps = flow.all_steps();
    let blocked: Vec<&str> = resolver::blocked_by_failure(&steps)
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(blocked, vec!["c", "e"]);

    assert_eq!(
        resolver::resolve(&steps),
        Resolution::Deadlocked {
            blocked: vec!["c".to_string(), "e".to_string()]
        }
    );
    assert!(!progress::is_flow_complete(&steps));
    assert_eq!(progress::outcome(&steps), FlowOutcome::Stuck);

    let err = apply_commit(&mut flow, &commit_request(), ts(90)).unwrap_err();
    assert!(matches!(err, FlowError::DeadlockDetected { id: 7, ref blocked } if blocked.len() == 2));
    assert_eq!(flow.status, FlowStatus::Active);
}

#[test]
fn test_commit_requires_finished_flow_and_report() {
    let mut flow = three_step_flow();
    let err = apply_commit(&mut flow, &commit_request(), ts(2)).unwrap_err();
    assert!(matches!(err, FlowError::FlowIncomplete { remaining: 3, .. }));

    finish(&mut flow, "s1");
    finish(&mut flow, "s2");
    finish(&mut flow, "s3");

    let mut empty = commit_request();
    empty.final_report = "   ".to_string();
    let err = apply_commit(&mut flow, &empty, ts(2)).unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput { ref field, .. } if field == "final_report"));

    apply_commit(&mut flow, &commit_request(), ts(3)).unwrap();
    assert_eq!(flow.status, FlowStatus::Completed);
    assert_eq!(flow.commit, Some(commit_request()));
    assert_eq!(flow.updated_at, ts(3));

    let err = apply_commit(&mut flow, &commit_request(), ts(4)).unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidFlowTransition {
            from: FlowStatus::Completed,
            to: FlowStatus::Completed,
            ..
        }
    ));
}

#[test]
fn test_flow_control_transitions() {
    let mut flow = three_step_flow();
    let pause = FlowControl::Pause {
        reason: "waiting on vendor".to_string(),
    };
    let resume = FlowControl::Resume {
        reason: "vendor replied".to_string(),
    };
    let cancel = FlowControl::Cancel {
        reason: "duplicate incident".to_string(),
    };

    assert!(apply_control(&mut flow, &resume, ts(1)).is_err());
    apply_control(&mut flow, &pause, ts(1)).unwrap();
    assert_eq!(flow.status, FlowStatus::Paused);
    assert_eq!(flow.status_reason.as_deref(), Some("waiting on vendor"));
    assert!(apply_control(&mut flow, &pause, ts(2)).is_err());

    apply_control(&mut flow, &resume, ts(2)).unwrap();
    assert_eq!(flow.status, FlowStatus::Active);

    apply_control(&mut flow, &cancel, ts(3)).unwrap();
    assert_eq!(flow.status, FlowStatus::Cancelled);
    let err = apply_control(&mut flow, &resume, ts(4)).unwrap_err();
    assert!(matches!(
        err,
        FlowError::InvalidFlowTransition {
            from: FlowStatus::Cancelled,
            to: FlowStatus::Active,
            ..
        }
    ));
}

#[test]
fn test_flow_progress_snapshot() {
    let mut flow = sample_flow();
    finish(&mut flow, "a");
    run(&mut flow, "b", StepAction::Start);

    let snapshot = FlowProgress::of(&flow);
    assert_eq!(snapshot.flow_id, 7);
    assert_eq!(snapshot.total, 5);
    assert_eq!(snapshot.completed, 1);
    assert_eq!(snapshot.percent, 20);
    assert_eq!(snapshot.outcome, FlowOutcome::InProgress);
    assert_eq!(snapshot.current_step.as_deref(), Some("b"));
    assert_eq!(snapshot.status_counts.get(StepStatus::InProgress), 1);
    assert_eq!(snapshot.status_counts.get(StepStatus::Pending), 3);
    // b (5) + c (5) + d (5) + e (5)
    assert_eq!(snapshot.estimated_minutes_remaining, 20);

    let phases: Vec<(&str, u8)> = snapshot
        .phases
        .iter()
        .map(|p| (p.name.as_str(), p.percent))
        .collect();
    assert_eq!(phases, vec![("triage", 50), ("contain", 0), ("recover", 0)]);
}

#[test]
fn test_estimate_of_huge_steps_does_not_overflow() {
    let playbook = Playbook::from_json(
        r#"{
            "name": "long-haul",
            "title": "Long haul",
            "phases": [{"name": "only", "title": "Only", "steps": [
                {"name": "s1", "title": "One", "estimated_minutes": 4000000000},
                {"name": "s2", "title": "Two", "estimated_minutes": 4000000000}
            ]}]
        }"#,
    )
    .unwrap();
    let flow = Flow::instantiate(2, &playbook, "INC-4", None, ts(0));

    let snapshot = FlowProgress::of(&flow);
    assert_eq!(snapshot.estimated_minutes_remaining, 8_000_000_000);
    assert!(snapshot
        .to_string()
        .contains("- Estimated time remaining: 8000000000 min"));
}

#[test]
fn test_percentage_rounds_half_up() {
    assert_eq!(progress::percentage(1, 2), 50);
    assert_eq!(progress::percentage(2, 3), 67);
    assert_eq!(progress::percentage(1, 200), 1);
    assert_eq!(progress::percentage(1, 201), 0);
    assert_eq!(progress::percentage(5, 5), 100);
}
