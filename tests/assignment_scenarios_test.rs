//! End-to-end assignment behavior through the control center.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use claw_control::{AgentStatus, AssignmentOutcome, Lane, NewTask, Notification, TaskPatch};
use common::{drain_notifications, register, setup_center};

#[tokio::test]
async fn scenario_unowned_backend_task_goes_to_backend_agent() {
    let center = setup_center().await;
    register(&center, "forge", &["backend-dev"]).await;
    let mut rx = center.events().subscribe();

    let created = center
        .create_task(NewTask::titled("Fix backend auth bug"))
        .await
        .unwrap();

    match created.assignment {
        Some(AssignmentOutcome::Assigned { ref agent_id, ref roles }) => {
            assert_eq!(agent_id, "forge");
            assert!(roles.contains("backend-dev"));
        }
        ref other => panic!("expected assignment, got {other:?}"),
    }
    assert_eq!(created.task.owner.as_deref(), Some("forge"));

    let forge = center.get_agent("forge").await.unwrap().unwrap();
    assert_eq!(forge.active_tasks, vec![created.task.id]);

    assert_eq!(
        drain_notifications(&mut rx),
        vec![(
            "forge".to_string(),
            Notification::TaskAssigned { task_id: created.task.id }
        )]
    );
}

#[tokio::test]
async fn scenario_explicit_owner_is_left_alone() {
    let center = setup_center().await;
    register(&center, "forge", &["fullstack-dev"]).await;

    let created = center
        .create_task(NewTask::titled("Refactor").owner("patch"))
        .await
        .unwrap();
    assert_eq!(created.task.owner.as_deref(), Some("patch"));
    assert!(created.assignment.is_none());

    let result = center.auto_assign_task(created.task.id).await.unwrap();
    assert_eq!(
        result.outcome,
        AssignmentOutcome::AlreadyAssigned {
            owner: "patch".to_string()
        }
    );
    assert_eq!(result.task.owner.as_deref(), Some("patch"));
    assert_eq!(center.get_agent("forge").await.unwrap().unwrap().workload(), 0);
}

#[tokio::test]
async fn scenario_qa_task_without_qa_agent_has_no_candidate() {
    let center = setup_center().await;
    register(&center, "forge", &["backend-dev"]).await;
    register(&center, "pixel", &["fullstack-dev"]).await;

    let created = center
        .create_task(NewTask::titled("Write e2e tests for checkout"))
        .await
        .unwrap();

    let expected: BTreeSet<String> = ["qa".to_string()].into();
    assert_eq!(
        created.assignment,
        Some(AssignmentOutcome::NoCandidate { roles: expected })
    );
    assert!(created.task.owner.is_none());

    let stored = center.get_task(created.task.id).await.unwrap().unwrap();
    assert!(stored.owner.is_none());
}

#[tokio::test]
async fn developer_tasks_fall_back_to_any_developer() {
    let center = setup_center().await;
    register(&center, "pixel", &["fullstack-dev"]).await;

    // backend-dev is inferred; nobody has it, but it is a developer role
    let created = center
        .create_task(NewTask::titled("Add database index"))
        .await
        .unwrap();
    assert_eq!(created.task.owner.as_deref(), Some("pixel"));
}

#[tokio::test]
async fn offline_agents_are_skipped_until_they_return() {
    let center = setup_center().await;
    register(&center, "forge", &["qa"]).await;
    center.heartbeat("forge", Some(AgentStatus::Offline)).await.unwrap();

    let created = center.create_task(NewTask::titled("Run qa pass")).await.unwrap();
    assert!(created.task.owner.is_none());

    center.heartbeat("forge", None).await.unwrap();
    let result = center.auto_assign_task(created.task.id).await.unwrap();
    assert_eq!(result.outcome.agent_id(), Some("forge"));
}

#[tokio::test]
async fn busy_agents_still_receive_work() {
    let center = setup_center().await;
    register(&center, "forge", &["qa"]).await;
    center.heartbeat("forge", Some(AgentStatus::Busy)).await.unwrap();

    let created = center.create_task(NewTask::titled("Test login")).await.unwrap();
    assert_eq!(created.task.owner.as_deref(), Some("forge"));
}

#[tokio::test]
async fn ties_go_to_the_earliest_registered_agent() {
    let center = setup_center().await;
    register(&center, "zeta", &["devops"]).await;
    register(&center, "alpha", &["devops"]).await;

    let created = center.create_task(NewTask::titled("Deploy staging")).await.unwrap();
    assert_eq!(created.task.owner.as_deref(), Some("zeta"));
}

#[tokio::test]
async fn concurrent_burst_spreads_work_evenly() {
    let center = Arc::new(setup_center().await);
    register(&center, "forge", &["backend-dev"]).await;
    register(&center, "anvil", &["backend-dev"]).await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let center = Arc::clone(&center);
        handles.push(tokio::spawn(async move {
            center
                .create_task(NewTask::titled(format!("API endpoint {i}")))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        let created = handle.await.unwrap();
        assert!(created.task.owner.is_some());
    }

    let loads = center.workloads().await.unwrap();
    let counts: Vec<usize> = loads.iter().map(|l| l.workload).collect();
    assert_eq!(counts, vec![3, 3]);
}

#[tokio::test]
async fn reopening_a_done_task_restores_workload() {
    let center = setup_center().await;
    register(&center, "forge", &["qa"]).await;

    let task = center.create_task(NewTask::titled("Test the fix")).await.unwrap().task;
    center.update_task(task.id, TaskPatch::lane(Lane::Done)).await.unwrap();
    assert_eq!(center.get_agent("forge").await.unwrap().unwrap().workload(), 0);

    center
        .update_task(task.id, TaskPatch::lane(Lane::Review).with_note("regression"))
        .await
        .unwrap();
    let forge = center.get_agent("forge").await.unwrap().unwrap();
    assert_eq!(forge.active_tasks, vec![task.id]);
}

#[tokio::test]
async fn unassigning_releases_and_allows_reassignment() {
    let center = setup_center().await;
    register(&center, "forge", &["content"]).await;

    let task = center.create_task(NewTask::titled("Update readme")).await.unwrap().task;
    assert_eq!(task.owner.as_deref(), Some("forge"));

    let task = center.update_task(task.id, TaskPatch::owner(None)).await.unwrap();
    assert!(task.owner.is_none());
    assert_eq!(center.get_agent("forge").await.unwrap().unwrap().workload(), 0);

    let result = center.auto_assign_task(task.id).await.unwrap();
    assert!(result.outcome.is_assigned());
    assert_eq!(center.get_agent("forge").await.unwrap().unwrap().workload(), 1);
}
