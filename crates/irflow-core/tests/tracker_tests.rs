mod common;

use irflow_core::{
    display::{CreateResult, UpdateResult},
    models::{AlertDisposition, FlowCommit, FlowStatus, IncidentStatus, StepAction},
    params::{ApplyStepAction, CommitFlow, ListFlows, TriggerFlow},
    FlowOutcome, Resolution,
};

#[tokio::test]
async fn test_walk_playbook_to_commit() {
    let (_temp_dir, tracker) = common::create_test_tracker().await;

    let flow = tracker
        .trigger_flow(&TriggerFlow {
            playbook: "phishing".to_string(),
            incident_id: "INC-2024-17".to_string(),
            started_by: Some("erin".to_string()),
        })
        .await
        .expect("Failed to trigger flow");
    let created = CreateResult::new(flow.clone()).to_string();
    assert!(created.starts_with("Triggered flow"));
    assert!(created.contains("INC-2024-17"));

    // Drive the flow one resolved step at a time
    loop {
        let step = match tracker.next_step(flow.id).await.unwrap() {
            Resolution::Ready { step } => step,
            Resolution::Complete => break,
            other => panic!("Unexpected resolution {other:?}"),
        };
        let action = if step.required {
            StepAction::Start
        } else {
            StepAction::Skip {
                reason: "not applicable".to_string(),
            }
        };
        let updated = tracker
            .apply_step_action(&ApplyStepAction {
                flow_id: flow.id,
                step: step.name.clone(),
                action: action.clone(),
            })
            .await
            .unwrap();
        if action == StepAction::Start {
            tracker
                .apply_step_action(&ApplyStepAction {
                    flow_id: flow.id,
                    step: step.name.clone(),
                    action: StepAction::Complete { output: None },
                })
                .await
                .unwrap();
        }
        assert_eq!(updated.id, flow.id);
    }

    let progress = tracker.progress(flow.id).await.unwrap();
    assert_eq!(progress.percent, 75);
    assert_eq!(progress.outcome, FlowOutcome::Succeeded);
    assert_eq!(progress.estimated_minutes_remaining, 0);

    let committed = tracker
        .commit_flow(&CommitFlow {
            flow_id: flow.id,
            commit: FlowCommit {
                final_report: "Sender blocked at the gateway".to_string(),
                alert_disposition: AlertDisposition::Resolved,
                incident_status: IncidentStatus::Resolved,
            },
        })
        .await
        .unwrap();
    assert_eq!(committed.status, FlowStatus::Completed);

    let rendered = UpdateResult::with_changes(committed, vec!["Committed".to_string()]).to_string();
    assert!(rendered.contains("## Final Report"));
    assert!(rendered.contains("Sender blocked at the gateway"));

    let in_flight = tracker.list_flows(&ListFlows::default()).await.unwrap();
    assert!(in_flight.is_empty());
    assert_eq!(in_flight.to_string(), "No flows found.\n");
}

#[tokio::test]
async fn test_playbook_catalogue() {
    let (_temp_dir, tracker) = common::create_test_tracker().await;

    let playbooks = tracker.list_playbooks().await.unwrap();
    assert_eq!(playbooks.len(), 1);
    assert!(playbooks
        .to_string()
        .contains("- **phishing**: Phishing response (2 phases, 4 steps)"));

    let playbook = tracker.get_playbook("phishing").await.unwrap().unwrap();
    assert_eq!(playbook, common::phishing_playbook());
}
