//! Task service: creation, patching, lane bookkeeping and dependency
//! unblocking on top of a `TaskRepository`.
//!
//! Creation and patching only plan the new rows; the caller commits them
//! through a `BoardStore` together with any agent bookkeeping.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Lane, NewTask, Task, TaskPatch, WorkArtifact};
use crate::domain::ports::{TaskFilter, TaskRepository};

/// Everything a patch changed, for callers that do agent bookkeeping.
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    /// The task as stored before the patch.
    pub before: Task,
    /// The task after the patch.
    pub task: Task,
    /// Dependents that lost this task from `depends_on`.
    pub dependents: Vec<Task>,
    /// Dependents whose last dependency was this task. Their lane is untouched.
    pub unblocked: Vec<Task>,
}

impl TaskUpdate {
    pub fn lane_changed(&self) -> bool {
        self.before.lane != self.task.lane
    }

    pub fn completed(&self) -> bool {
        self.lane_changed() && self.task.lane == Lane::Done
    }

    pub fn owner_changed(&self) -> bool {
        self.before.owner != self.task.owner
    }

    /// Rows to write: the patched task first, then its dependents.
    pub fn changed_tasks(&self) -> Vec<Task> {
        let mut batch = Vec::with_capacity(self.dependents.len() + 1);
        batch.push(self.task.clone());
        batch.extend(self.dependents.iter().cloned());
        batch
    }
}

pub struct TaskService<T: TaskRepository> {
    task_repo: Arc<T>,
}

impl<T: TaskRepository> TaskService<T> {
    pub fn new(task_repo: Arc<T>) -> Self {
        Self { task_repo }
    }

    /// Build a validated task with defaults applied and its creation
    /// history entry. Nothing is written.
    pub fn prepare(&self, new_task: NewTask) -> DomainResult<Task> {
        if new_task.title.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Task title cannot be empty".to_string()));
        }

        let task = new_task.into_task();
        task.validate().map_err(DomainError::ValidationFailed)?;
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        self.task_repo.get(id).await
    }

    /// Like `get`, but a missing task is an error.
    pub async fn require(&self, id: Uuid) -> DomainResult<Task> {
        self.task_repo.get(id).await?.ok_or(DomainError::TaskNotFound(id))
    }

    pub async fn list(&self, filter: TaskFilter) -> DomainResult<Vec<Task>> {
        self.task_repo.list(filter).await
    }

    /// Tasks that depend on `id`.
    pub async fn dependents(&self, id: Uuid) -> DomainResult<Vec<Task>> {
        self.task_repo.get_dependents(id).await
    }

    /// Plan a partial update without writing it.
    ///
    /// A lane change appends history with the patch note. Moving into
    /// `done` strips this task from every direct dependent's `depends_on`.
    /// Commit `TaskUpdate::changed_tasks` to apply the result.
    pub async fn plan_update(&self, id: Uuid, patch: TaskPatch) -> DomainResult<TaskUpdate> {
        let before = self.require(id).await?;
        let mut task = before.clone();

        apply_patch(&mut task, patch)?;
        task.validate().map_err(DomainError::ValidationFailed)?;

        let completed = before.lane != task.lane && task.lane == Lane::Done;
        let mut dependents = Vec::new();
        let mut unblocked = Vec::new();

        if completed {
            for mut dependent in self.task_repo.get_dependents(id).await? {
                if dependent.id == id || !dependent.resolve_dependency(id) {
                    continue;
                }
                dependent.touch();
                if dependent.is_unblocked() {
                    unblocked.push(dependent.clone());
                }
                dependents.push(dependent);
            }
        }

        tracing::debug!(
            task_id = %task.id,
            lane = %task.lane,
            unblocked = unblocked.len(),
            "task update planned"
        );

        Ok(TaskUpdate {
            before,
            task,
            dependents,
            unblocked,
        })
    }

    /// Append a work artifact to the task.
    pub async fn record_artifact(&self, id: Uuid, artifact: WorkArtifact) -> DomainResult<Task> {
        if artifact.reference.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "Artifact reference cannot be empty".to_string(),
            ));
        }

        let mut task = self.require(id).await?;
        task.artifacts.push(artifact);
        task.touch();
        self.task_repo.update(&task).await?;
        Ok(task)
    }
}

fn apply_patch(task: &mut Task, patch: TaskPatch) -> DomainResult<()> {
    if let Some(title) = patch.title {
        if title.trim().is_empty() {
            return Err(DomainError::ValidationFailed("Task title cannot be empty".to_string()));
        }
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(owner) = patch.owner {
        task.owner = owner.filter(|o| !o.trim().is_empty());
    }
    if let Some(depends_on) = patch.depends_on {
        let self_id = task.id;
        task.depends_on.clear();
        for dep in depends_on {
            if dep != self_id && !task.depends_on.contains(&dep) {
                task.depends_on.push(dep);
            }
        }
    }
    if let Some(criteria) = patch.acceptance_criteria {
        task.acceptance_criteria = criteria;
    }
    if let Some(hours) = patch.estimated_hours {
        task.estimated_hours = Some(hours);
    }
    if let Some(hours) = patch.actual_hours {
        task.actual_hours = Some(hours);
    }
    if let Some(lane) = patch.lane {
        task.move_to_lane(lane, patch.note);
    }
    task.touch();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteBoardStore, SqliteTaskRepository};
    use crate::domain::models::{ArtifactKind, Priority};
    use crate::domain::ports::{BoardChanges, BoardStore};

    struct Harness {
        service: TaskService<SqliteTaskRepository>,
        store: SqliteBoardStore,
    }

    impl Harness {
        async fn create(&self, new_task: NewTask) -> Task {
            let task = self.service.prepare(new_task).unwrap();
            self.store.commit(&BoardChanges::create(task.clone())).await.unwrap();
            task
        }

        async fn update(&self, id: Uuid, patch: TaskPatch) -> DomainResult<TaskUpdate> {
            let update = self.service.plan_update(id, patch).await?;
            self.store.commit(&BoardChanges::update(update.changed_tasks())).await?;
            Ok(update)
        }
    }

    async fn setup() -> Harness {
        let pool = create_migrated_test_pool().await.unwrap();
        Harness {
            service: TaskService::new(Arc::new(SqliteTaskRepository::new(pool.clone()))),
            store: SqliteBoardStore::new(pool),
        }
    }

    #[tokio::test]
    async fn test_prepare_applies_defaults() {
        let h = setup().await;
        let service = &h.service;
        let task = service.prepare(NewTask::titled("Write docs")).unwrap();

        assert_eq!(task.lane, Lane::Proposed);
        assert_eq!(task.priority, Priority::P2);
        assert!(task.owner.is_none());
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.status_history.len(), 1);
        assert_eq!(task.status_history[0].note.as_deref(), Some("created"));
        assert!(task.status_history[0].from.is_none());

        assert!(matches!(
            service.prepare(NewTask::titled("   ")),
            Err(DomainError::ValidationFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_plan_update_writes_nothing() {
        let h = setup().await;
        let task = h.create(NewTask::titled("Ship it").lane(Lane::Queued)).await;

        let planned = h
            .service
            .plan_update(task.id, TaskPatch::lane(Lane::Done))
            .await
            .unwrap();
        assert!(planned.completed());

        let stored = h.service.require(task.id).await.unwrap();
        assert_eq!(stored.lane, Lane::Queued);
        assert_eq!(stored.status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_lane_change_appends_history() {
        let h = setup().await;
        let task = h.create(NewTask::titled("Ship it").lane(Lane::Queued)).await;

        let update = h
            .update(task.id, TaskPatch::lane(Lane::Development).with_note("picked up"))
            .await
            .unwrap();

        assert!(update.lane_changed());
        let history = &update.task.status_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].from, Some(Lane::Queued));
        assert_eq!(history[1].to, Lane::Development);
        assert_eq!(history[1].note.as_deref(), Some("picked up"));
        assert!(update.task.history_is_consistent());

        let stored = h.service.require(task.id).await.unwrap();
        assert_eq!(stored, update.task);
    }

    #[tokio::test]
    async fn test_same_lane_update_is_history_noop() {
        let h = setup().await;
        let dep = h.create(NewTask::titled("Dep").lane(Lane::Done)).await;
        let blocked = h.create(NewTask::titled("Blocked").depends_on(dep.id)).await;

        let update = h
            .update(dep.id, TaskPatch::lane(Lane::Done).with_note("again"))
            .await
            .unwrap();

        assert!(!update.lane_changed());
        assert_eq!(update.task.status_history.len(), 1);
        assert!(update.unblocked.is_empty());
        assert!(update.dependents.is_empty());
        assert!(update.task.updated_at >= update.before.updated_at);

        let blocked = h.service.require(blocked.id).await.unwrap();
        assert_eq!(blocked.depends_on, vec![dep.id]);
    }

    #[tokio::test]
    async fn test_completion_unblocks_single_hop() {
        let h = setup().await;
        let a = h.create(NewTask::titled("A").lane(Lane::Review)).await;
        let b = h.create(NewTask::titled("B").depends_on(a.id)).await;
        let other = h.create(NewTask::titled("Other")).await;
        let c = h
            .create(NewTask::titled("C").depends_on(a.id).depends_on(other.id))
            .await;
        let d = h.create(NewTask::titled("D").depends_on(b.id)).await;

        let update = h.update(a.id, TaskPatch::lane(Lane::Done)).await.unwrap();
        assert!(update.completed());
        assert_eq!(update.dependents.len(), 2);
        assert_eq!(update.unblocked.len(), 1);
        assert_eq!(update.unblocked[0].id, b.id);
        assert_eq!(update.changed_tasks()[0].id, a.id);

        let b = h.service.require(b.id).await.unwrap();
        assert!(b.depends_on.is_empty());
        assert_eq!(b.lane, Lane::Proposed);
        assert_eq!(b.status_history.len(), 1);

        let c = h.service.require(c.id).await.unwrap();
        assert_eq!(c.depends_on, vec![other.id]);

        let d = h.service.require(d.id).await.unwrap();
        assert_eq!(d.depends_on, vec![b.id]);
    }

    #[tokio::test]
    async fn test_update_overwrites_fields() {
        let h = setup().await;
        let task = h.create(NewTask::titled("Old").owner("forge")).await;
        let dep = Uuid::new_v4();

        let patch = TaskPatch {
            title: Some("New".into()),
            priority: Some(Priority::P0),
            owner: Some(None),
            depends_on: Some(vec![dep, dep, task.id]),
            acceptance_criteria: Some(vec!["works".into()]),
            actual_hours: Some(1.5),
            ..Default::default()
        };
        let update = h.update(task.id, patch).await.unwrap();

        assert!(update.owner_changed());
        assert_eq!(update.task.title, "New");
        assert_eq!(update.task.priority, Priority::P0);
        assert!(update.task.owner.is_none());
        assert_eq!(update.task.depends_on, vec![dep]);
        assert_eq!(update.task.acceptance_criteria, vec!["works".to_string()]);
        assert_eq!(update.task.actual_hours, Some(1.5));
        assert!(!update.lane_changed());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title_and_unknown_task() {
        let h = setup().await;
        let task = h.create(NewTask::titled("Keep")).await;

        let patch = TaskPatch {
            title: Some(" ".into()),
            lane: Some(Lane::Queued),
            ..Default::default()
        };
        assert!(matches!(
            h.update(task.id, patch).await,
            Err(DomainError::ValidationFailed(_))
        ));
        let stored = h.service.require(task.id).await.unwrap();
        assert_eq!(stored.lane, Lane::Proposed);
        assert_eq!(stored.status_history.len(), 1);

        let missing = Uuid::new_v4();
        assert!(matches!(
            h.update(missing, TaskPatch::default()).await,
            Err(DomainError::TaskNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn test_record_artifact() {
        let h = setup().await;
        let task = h.create(NewTask::titled("Fix bug")).await;

        let artifact = WorkArtifact::new(ArtifactKind::Commit, "abc123")
            .with_summary("fix off-by-one")
            .reported_by("forge");
        let updated = h.service.record_artifact(task.id, artifact).await.unwrap();
        assert_eq!(updated.artifacts.len(), 1);
        assert_eq!(updated.artifacts[0].reference, "abc123");

        let blank = WorkArtifact::new(ArtifactKind::File, "");
        assert!(h.service.record_artifact(task.id, blank).await.is_err());
    }
}
