//! The control center: single-writer facade over the task store, the
//! assignment engine and the agent registry.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{format_cycle_path, DomainError, DomainResult};
use crate::domain::models::{
    ActivityEvent, ActivityKind, Agent, AgentStatus, Config, NewTask, Task, TaskPatch,
    WorkArtifact,
};
use crate::domain::ports::{
    ActivityFilter, AgentFilter, AgentRepository, BoardChanges, BoardStore, Notification,
    Notifier, TaskFilter, TaskRepository,
};
use crate::services::{
    AgentService, AgentWorkload, AssignmentEngine, AssignmentOutcome, DependencyResolver,
    EventBus, TaskService, TaskUpdate,
};

/// A freshly created task and, when auto-assignment ran, its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTask {
    pub task: Task,
    pub assignment: Option<AssignmentOutcome>,
}

/// Outcome of an explicit auto-assign request.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub task: Task,
    pub outcome: AssignmentOutcome,
}

/// Coordinates every mutation of the board.
///
/// All mutating operations hold one write lock for their whole
/// read-modify-write-notify sequence, so an assignment always sees the
/// workloads left behind by the previous one. Each mutation commits its
/// task and agent rows through one `BoardStore` call; a failed commit
/// leaves the board, the notifier and the activity feed untouched.
pub struct ControlCenter<T: TaskRepository, A: AgentRepository> {
    tasks: TaskService<T>,
    agents: AgentService<A>,
    board: Arc<dyn BoardStore>,
    engine: AssignmentEngine,
    resolver: DependencyResolver,
    events: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
    write_lock: Mutex<()>,
    auto_assign_on_create: bool,
    heartbeat_timeout: chrono::Duration,
}

impl<T: TaskRepository, A: AgentRepository> ControlCenter<T, A> {
    /// Wire the control center. The event bus doubles as the notifier
    /// unless `with_notifier` replaces it.
    pub fn new(
        task_repo: Arc<T>,
        agent_repo: Arc<A>,
        board: Arc<dyn BoardStore>,
        events: Arc<EventBus>,
        config: &Config,
    ) -> DomainResult<Self> {
        let engine = AssignmentEngine::new(&config.assignment)?;
        let heartbeat_secs = i64::try_from(config.agents.heartbeat_timeout_secs).map_err(|_| {
            DomainError::ValidationFailed("agents.heartbeat_timeout_secs is too large".to_string())
        })?;

        Ok(Self {
            tasks: TaskService::new(task_repo),
            agents: AgentService::new(agent_repo),
            board,
            engine,
            resolver: DependencyResolver::new(),
            notifier: events.clone(),
            events,
            write_lock: Mutex::new(()),
            auto_assign_on_create: config.assignment.auto_assign_on_create,
            heartbeat_timeout: chrono::Duration::seconds(heartbeat_secs),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // ---- tasks -------------------------------------------------------

    /// Create a task; unowned tasks are auto-assigned when enabled.
    #[instrument(skip(self, new_task), fields(title = %new_task.title))]
    pub async fn create_task(&self, new_task: NewTask) -> DomainResult<CreatedTask> {
        let _guard = self.write_lock.lock().await;
        self.create_locked(new_task).await
    }

    /// Create several tasks strictly in order under one lock. Stops at the
    /// first failure; tasks created before it are kept.
    #[instrument(skip(self, new_tasks), fields(count = new_tasks.len()))]
    pub async fn create_tasks(&self, new_tasks: Vec<NewTask>) -> DomainResult<Vec<CreatedTask>> {
        let _guard = self.write_lock.lock().await;
        let mut created = Vec::with_capacity(new_tasks.len());
        for new_task in new_tasks {
            created.push(self.create_locked(new_task).await?);
        }
        Ok(created)
    }

    async fn create_locked(&self, new_task: NewTask) -> DomainResult<CreatedTask> {
        let mut task = self.tasks.prepare(new_task)?;

        let (assignment, agents) = if task.owner.is_some() {
            let agents = match active_owner(&task) {
                Some(owner) => self.agents.plan_workload_move(task.id, None, Some(owner)).await?,
                None => Vec::new(),
            };
            (None, agents)
        } else if self.auto_assign_on_create && !task.is_done() {
            let (outcome, agents) = self.plan_assignment(&mut task).await?;
            (Some(outcome), agents)
        } else {
            (None, Vec::new())
        };

        self.board
            .commit(&BoardChanges::create(task.clone()).with_agents(agents))
            .await?;

        info!(task_id = %task.id, lane = %task.lane, "task created");
        self.events
            .publish_activity(
                ActivityEvent::new(ActivityKind::TaskCreated, format!("Created \"{}\"", task.title))
                    .for_task(task.id),
            )
            .await;
        if let Some(outcome) = &assignment {
            self.announce_assignment(&task, outcome).await;
        }

        if !task.depends_on.is_empty() {
            self.check_dependencies(&task).await;
        }

        Ok(CreatedTask { task, assignment })
    }

    /// Patch a task and do the agent bookkeeping that follows from it.
    ///
    /// The task, its unblocked dependents and the agents whose active lists
    /// change are committed together; notifications go out only after.
    #[instrument(skip(self, patch), fields(task_id = %id))]
    pub async fn update_task(&self, id: Uuid, patch: TaskPatch) -> DomainResult<Task> {
        let _guard = self.write_lock.lock().await;

        let dependencies_patched = patch.depends_on.is_some();
        let update = self.tasks.plan_update(id, patch).await?;

        let was_active = active_owner(&update.before);
        let now_active = active_owner(&update.task);
        let agents = if was_active != now_active {
            self.agents.plan_workload_move(id, was_active, now_active).await?
        } else {
            Vec::new()
        };

        self.board
            .commit(&BoardChanges::update(update.changed_tasks()).with_agents(agents))
            .await?;

        self.publish_update_activity(&update).await;

        for unblocked in &update.unblocked {
            info!(task_id = %unblocked.id, completed = %id, "task unblocked");
            if let Some(owner) = &unblocked.owner {
                self.notifier
                    .notify(owner, Notification::TaskUnblocked { task_id: unblocked.id })
                    .await;
            }
            let mut event = ActivityEvent::new(
                ActivityKind::TaskUnblocked,
                format!("\"{}\" has no open dependencies", unblocked.title),
            )
            .for_task(unblocked.id);
            if let Some(owner) = &unblocked.owner {
                event = event.for_agent(owner.clone());
            }
            self.events.publish_activity(event).await;
        }

        if dependencies_patched && !update.task.depends_on.is_empty() {
            self.check_dependencies(&update.task).await;
        }

        Ok(update.task)
    }

    async fn publish_update_activity(&self, update: &TaskUpdate) {
        let task = &update.task;
        let event = if update.lane_changed() {
            info!(task_id = %task.id, from = %update.before.lane, lane = %task.lane, "lane changed");
            ActivityEvent::new(
                ActivityKind::LaneChanged,
                format!("\"{}\" moved {} -> {}", task.title, update.before.lane, task.lane),
            )
        } else {
            debug!(task_id = %task.id, "task updated");
            ActivityEvent::new(ActivityKind::TaskUpdated, format!("Updated \"{}\"", task.title))
        };
        let event = match &task.owner {
            Some(owner) => event.for_task(task.id).for_agent(owner.clone()),
            None => event.for_task(task.id),
        };
        self.events.publish_activity(event).await;
    }

    /// Run auto-assignment on an existing task.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn auto_assign_task(&self, id: Uuid) -> DomainResult<AssignmentResult> {
        let _guard = self.write_lock.lock().await;

        let mut task = self.tasks.require(id).await?;
        if task.owner.is_none() && task.is_done() {
            return Err(DomainError::ValidationFailed(format!(
                "Task {id} is done and cannot be assigned"
            )));
        }

        let (outcome, agents) = self.plan_assignment(&mut task).await?;
        if outcome.is_assigned() {
            self.board
                .commit(&BoardChanges::update(vec![task.clone()]).with_agents(agents))
                .await?;
        }
        self.announce_assignment(&task, &outcome).await;
        Ok(AssignmentResult { task, outcome })
    }

    /// Pick an owner for `task` in memory. Returns the outcome and the
    /// agent rows that must be committed with the task.
    async fn plan_assignment(&self, task: &mut Task) -> DomainResult<(AssignmentOutcome, Vec<Agent>)> {
        let mut agents = self.agents.list(AgentFilter::default()).await?;
        let outcome = self.engine.auto_assign(task, &mut agents);

        let changed = match &outcome {
            AssignmentOutcome::Assigned { agent_id, .. } => {
                agents.into_iter().filter(|a| &a.id == agent_id).collect()
            }
            _ => Vec::new(),
        };
        Ok((outcome, changed))
    }

    /// Log, notify and record a committed assignment outcome.
    async fn announce_assignment(&self, task: &Task, outcome: &AssignmentOutcome) {
        match outcome {
            AssignmentOutcome::Assigned { agent_id, roles } => {
                info!(task_id = %task.id, agent_id = %agent_id, roles = ?roles, "task assigned");
                self.notifier
                    .notify(agent_id, Notification::TaskAssigned { task_id: task.id })
                    .await;
                self.events
                    .publish_activity(
                        ActivityEvent::new(
                            ActivityKind::TaskAssigned,
                            format!("\"{}\" assigned to {agent_id}", task.title),
                        )
                        .for_task(task.id)
                        .for_agent(agent_id.clone()),
                    )
                    .await;
            }
            AssignmentOutcome::AlreadyAssigned { owner } => {
                debug!(task_id = %task.id, owner = %owner, "task already assigned");
            }
            AssignmentOutcome::NoCandidate { roles } => {
                info!(task_id = %task.id, roles = ?roles, "no agent available for task");
            }
        }
    }

    /// Report unknown dependencies and cycles. Never fails the caller.
    async fn check_dependencies(&self, task: &Task) {
        let all = match self.tasks.list(TaskFilter::default()).await {
            Ok(all) => all,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "dependency check skipped");
                return;
            }
        };

        let missing = self.resolver.missing_dependencies(task, &all);
        if !missing.is_empty() {
            warn!(task_id = %task.id, missing = ?missing, "task depends on unknown tasks");
        }

        if let Some(cycle) = self.resolver.detect_cycle(&all) {
            let path = format_cycle_path(&cycle);
            warn!(task_id = %task.id, cycle = %path, "dependency cycle detected");
            self.events
                .publish_activity(
                    ActivityEvent::new(ActivityKind::DependencyCycle, format!("Dependency cycle: {path}"))
                        .for_task(task.id),
                )
                .await;
        }
    }

    /// Append a work artifact reported against a task.
    #[instrument(skip(self, artifact), fields(task_id = %id, kind = artifact.kind.as_str()))]
    pub async fn record_artifact(&self, id: Uuid, artifact: WorkArtifact) -> DomainResult<Task> {
        let _guard = self.write_lock.lock().await;

        let agent_id = artifact.agent_id.clone();
        let message = format!("{} {}", artifact.kind.as_str(), artifact.reference);
        let task = self.tasks.record_artifact(id, artifact).await?;

        let mut event = ActivityEvent::new(ActivityKind::ArtifactRecorded, message).for_task(id);
        if let Some(agent_id) = agent_id {
            event = event.for_agent(agent_id);
        }
        self.events.publish_activity(event).await;
        Ok(task)
    }

    pub async fn get_task(&self, id: Uuid) -> DomainResult<Option<Task>> {
        self.tasks.get(id).await
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> DomainResult<Vec<Task>> {
        self.tasks.list(filter).await
    }

    /// Tasks that list `id` in their `depends_on`.
    pub async fn dependents(&self, id: Uuid) -> DomainResult<Vec<Task>> {
        self.tasks.dependents(id).await
    }

    // ---- assignment queries ------------------------------------------

    /// Roles the engine would infer for this text.
    pub fn infer_roles(&self, title: &str, description: &str) -> BTreeSet<String> {
        self.engine.analyze_task_roles(title, description)
    }

    /// The agent auto-assignment would pick for `roles` right now.
    pub async fn best_agent_for_roles(&self, roles: &BTreeSet<String>) -> DomainResult<Option<Agent>> {
        let agents = self.agents.list(AgentFilter::default()).await?;
        Ok(self.engine.find_best_agent(roles, &agents).cloned())
    }

    pub async fn workloads(&self) -> DomainResult<Vec<AgentWorkload>> {
        self.agents.workloads().await
    }

    /// Newest activity first.
    pub async fn activity(&self, filter: ActivityFilter) -> DomainResult<Vec<ActivityEvent>> {
        match self.events.store() {
            Some(store) => store.recent(filter).await,
            None => Ok(Vec::new()),
        }
    }

    // ---- agents ------------------------------------------------------

    #[instrument(skip(self, roles), fields(agent_id = %id))]
    pub async fn register_agent(&self, id: &str, name: &str, roles: Vec<String>) -> DomainResult<Agent> {
        let _guard = self.write_lock.lock().await;

        let agent = self.agents.register(id, name, roles).await?;
        self.events
            .publish_activity(
                ActivityEvent::new(
                    ActivityKind::AgentRegistered,
                    format!("{} registered as {}", agent.id, join_roles(&agent.roles)),
                )
                .for_agent(agent.id.clone()),
            )
            .await;
        Ok(agent)
    }

    pub async fn get_agent(&self, id: &str) -> DomainResult<Option<Agent>> {
        self.agents.get(id).await
    }

    pub async fn list_agents(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        self.agents.list(filter).await
    }

    /// Refresh an agent's heartbeat, optionally changing its status.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn heartbeat(&self, id: &str, status: Option<AgentStatus>) -> DomainResult<Agent> {
        let _guard = self.write_lock.lock().await;

        let previous = self.agents.require(id).await?.status;
        let agent = self.agents.heartbeat(id, status).await?;
        if agent.status != previous {
            self.publish_status_change(&agent, previous).await;
        }
        Ok(agent)
    }

    /// Point an agent at the task it is working on, or mark it idle.
    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn set_agent_current_task(&self, id: &str, task_id: Option<Uuid>) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        self.agents.set_current_task(id, task_id).await
    }

    #[instrument(skip(self), fields(agent_id = %id))]
    pub async fn deregister_agent(&self, id: &str) -> DomainResult<()> {
        let _guard = self.write_lock.lock().await;
        self.agents.deregister(id).await
    }

    /// Mark agents whose heartbeat is older than the configured timeout
    /// as offline.
    #[instrument(skip(self))]
    pub async fn sweep_stale_agents(&self) -> DomainResult<Vec<Agent>> {
        let _guard = self.write_lock.lock().await;

        let before = self.agents.list(AgentFilter::default()).await?;
        let swept = self.agents.mark_stale_offline(self.heartbeat_timeout).await?;
        for agent in &swept {
            let previous = before
                .iter()
                .find(|a| a.id == agent.id)
                .map_or(AgentStatus::Online, |a| a.status);
            self.publish_status_change(agent, previous).await;
        }
        Ok(swept)
    }

    async fn publish_status_change(&self, agent: &Agent, previous: AgentStatus) {
        self.events
            .publish_activity(
                ActivityEvent::new(
                    ActivityKind::AgentStatusChanged,
                    format!("{} is {} (was {})", agent.id, agent.status, previous),
                )
                .for_agent(agent.id.clone()),
            )
            .await;
    }
}

/// Owner that should carry the task in its active list.
fn active_owner(task: &Task) -> Option<&str> {
    if task.is_done() {
        None
    } else {
        task.owner.as_deref()
    }
}

fn join_roles(roles: &BTreeSet<String>) -> String {
    if roles.is_empty() {
        "no roles".to_string()
    } else {
        roles.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteActivityRepository, SqliteAgentRepository,
        SqliteBoardStore, SqliteTaskRepository,
    };
    use sqlx::SqlitePool;
    use crate::domain::models::Lane;
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<(String, Notification)>>,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<(String, Notification)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, agent_id: &str, notification: Notification) {
            self.sent.lock().unwrap().push((agent_id.to_string(), notification));
        }
    }

    type TestCenter = ControlCenter<SqliteTaskRepository, SqliteAgentRepository>;

    async fn setup_with_pool() -> (TestCenter, Arc<RecordingNotifier>, SqlitePool) {
        let pool = create_migrated_test_pool().await.unwrap();
        let events = Arc::new(
            EventBus::default().with_store(Arc::new(SqliteActivityRepository::new(pool.clone()))),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let center = ControlCenter::new(
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::new(SqliteAgentRepository::new(pool.clone())),
            Arc::new(SqliteBoardStore::new(pool.clone())),
            events,
            &Config::default(),
        )
        .unwrap()
        .with_notifier(notifier.clone());
        (center, notifier, pool)
    }

    async fn setup() -> (TestCenter, Arc<RecordingNotifier>) {
        let (center, notifier, _) = setup_with_pool().await;
        (center, notifier)
    }

    /// Make every write to the agents table fail like a full disk.
    async fn reject_agent_writes(pool: &SqlitePool) {
        sqlx::query(
            "CREATE TRIGGER reject_agent_writes BEFORE UPDATE ON agents \
             BEGIN SELECT RAISE(ABORT, 'disk full'); END",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| (*r).to_string()).collect()
    }

    #[tokio::test]
    async fn test_create_auto_assigns_and_notifies() {
        let (center, notifier) = setup().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();

        let created = center
            .create_task(NewTask::titled("Build API endpoint").lane(Lane::Queued))
            .await
            .unwrap();

        assert_eq!(created.task.owner.as_deref(), Some("forge"));
        assert!(created.assignment.as_ref().unwrap().is_assigned());

        let stored = center.get_task(created.task.id).await.unwrap().unwrap();
        assert_eq!(stored.owner.as_deref(), Some("forge"));

        let agent = center.get_agent("forge").await.unwrap().unwrap();
        assert_eq!(agent.active_tasks, vec![created.task.id]);
        assert_eq!(agent.current_task, Some(created.task.id));

        assert_eq!(
            notifier.sent(),
            vec![("forge".to_string(), Notification::TaskAssigned { task_id: created.task.id })]
        );
    }

    #[tokio::test]
    async fn test_explicit_owner_is_tracked_not_reassigned() {
        let (center, notifier) = setup().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();
        center.register_agent("human", "Human", roles(&["pm"])).await.unwrap();

        let created = center
            .create_task(NewTask::titled("Build API").owner("human"))
            .await
            .unwrap();

        assert!(created.assignment.is_none());
        assert_eq!(created.task.owner.as_deref(), Some("human"));
        let human = center.get_agent("human").await.unwrap().unwrap();
        assert_eq!(human.workload(), 1);
        let forge = center.get_agent("forge").await.unwrap().unwrap();
        assert_eq!(forge.workload(), 0);
        assert!(notifier.sent().is_empty());

        let result = center.auto_assign_task(created.task.id).await.unwrap();
        assert_eq!(result.outcome, AssignmentOutcome::AlreadyAssigned { owner: "human".into() });
    }

    #[tokio::test]
    async fn test_completion_releases_and_unblocks() {
        let (center, notifier) = setup().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();

        let a = center.create_task(NewTask::titled("Database schema")).await.unwrap().task;
        let b = center
            .create_task(NewTask::titled("Database migration").depends_on(a.id))
            .await
            .unwrap()
            .task;

        let forge = center.get_agent("forge").await.unwrap().unwrap();
        assert_eq!(forge.active_tasks, vec![a.id, b.id]);
        assert_eq!(forge.current_task, Some(a.id));

        let done = center.update_task(a.id, TaskPatch::lane(Lane::Done)).await.unwrap();
        assert_eq!(done.lane, Lane::Done);

        let forge = center.get_agent("forge").await.unwrap().unwrap();
        assert_eq!(forge.active_tasks, vec![b.id]);
        assert_eq!(forge.current_task, Some(b.id));

        let b = center.get_task(b.id).await.unwrap().unwrap();
        assert!(b.depends_on.is_empty());
        assert_eq!(b.lane, Lane::Proposed);

        assert!(notifier
            .sent()
            .contains(&("forge".to_string(), Notification::TaskUnblocked { task_id: b.id })));

        let feed = center.activity(ActivityFilter::default()).await.unwrap();
        assert!(feed.iter().any(|e| e.kind == ActivityKind::TaskUnblocked));
        assert_eq!(feed[0].kind, ActivityKind::TaskUnblocked);
    }

    #[tokio::test]
    async fn test_failed_agent_write_leaves_board_untouched() {
        let (center, notifier, pool) = setup_with_pool().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();
        let a = center.create_task(NewTask::titled("Database schema")).await.unwrap().task;
        let b = center
            .create_task(NewTask::titled("Database migration").depends_on(a.id))
            .await
            .unwrap()
            .task;

        let sent_before = notifier.sent().len();
        let feed_before = center.activity(ActivityFilter::default()).await.unwrap().len();
        reject_agent_writes(&pool).await;

        let result = center.update_task(a.id, TaskPatch::lane(Lane::Done)).await;
        assert!(matches!(result, Err(DomainError::DatabaseError(_))));

        let stored_a = center.get_task(a.id).await.unwrap().unwrap();
        assert_eq!(stored_a.lane, Lane::Proposed);
        assert_eq!(stored_a.status_history.len(), 1);
        let stored_b = center.get_task(b.id).await.unwrap().unwrap();
        assert_eq!(stored_b.depends_on, vec![a.id]);
        let forge = center.get_agent("forge").await.unwrap().unwrap();
        assert_eq!(forge.active_tasks, vec![a.id, b.id]);

        // an assignment that cannot record the workload does not keep the task
        let result = center.create_task(NewTask::titled("Fix database index")).await;
        assert!(result.is_err());
        assert_eq!(center.list_tasks(TaskFilter::default()).await.unwrap().len(), 2);

        assert_eq!(notifier.sent().len(), sent_before);
        assert_eq!(
            center.activity(ActivityFilter::default()).await.unwrap().len(),
            feed_before
        );

        sqlx::query("DROP TRIGGER reject_agent_writes").execute(&pool).await.unwrap();
        center.update_task(a.id, TaskPatch::lane(Lane::Done)).await.unwrap();
        let stored_b = center.get_task(b.id).await.unwrap().unwrap();
        assert!(stored_b.depends_on.is_empty());
        assert_eq!(center.get_agent("forge").await.unwrap().unwrap().active_tasks, vec![b.id]);
        assert!(notifier
            .sent()
            .contains(&("forge".to_string(), Notification::TaskUnblocked { task_id: b.id })));
    }

    #[tokio::test]
    async fn test_owner_change_moves_workload() {
        let (center, _) = setup().await;
        center.register_agent("forge", "Forge", roles(&["qa"])).await.unwrap();
        center.register_agent("anvil", "Anvil", roles(&["qa"])).await.unwrap();

        let task = center.create_task(NewTask::titled("Write tests")).await.unwrap().task;
        assert_eq!(task.owner.as_deref(), Some("forge"));

        center
            .update_task(task.id, TaskPatch::owner(Some("anvil".into())))
            .await
            .unwrap();
        assert_eq!(center.get_agent("forge").await.unwrap().unwrap().workload(), 0);
        assert_eq!(center.get_agent("anvil").await.unwrap().unwrap().workload(), 1);

        // unknown owners are accepted without bookkeeping
        let task = center
            .update_task(task.id, TaskPatch::owner(Some("visitor".into())))
            .await
            .unwrap();
        assert_eq!(task.owner.as_deref(), Some("visitor"));
        assert_eq!(center.get_agent("anvil").await.unwrap().unwrap().workload(), 0);
    }

    #[tokio::test]
    async fn test_no_candidate_is_not_an_error() {
        let (center, notifier) = setup().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();

        let created = center.create_task(NewTask::titled("Write tests")).await.unwrap();
        assert!(matches!(
            created.assignment,
            Some(AssignmentOutcome::NoCandidate { .. })
        ));
        assert!(created.task.owner.is_none());
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_create_tasks_balances_in_order() {
        let (center, _) = setup().await;
        center.register_agent("forge", "Forge", roles(&["backend-dev"])).await.unwrap();
        center.register_agent("anvil", "Anvil", roles(&["backend-dev"])).await.unwrap();

        let batch = (0..4).map(|i| NewTask::titled(format!("API route {i}"))).collect();
        let created = center.create_tasks(batch).await.unwrap();
        let owners: Vec<_> = created.iter().map(|c| c.task.owner.clone().unwrap()).collect();
        assert_eq!(owners, vec!["forge", "anvil", "forge", "anvil"]);

        let loads = center.workloads().await.unwrap();
        assert!(loads.iter().all(|l| l.workload == 2));
    }

    #[tokio::test]
    async fn test_cycle_is_reported_not_fatal() {
        let (center, _) = setup().await;
        let a = center.create_task(NewTask::titled("A")).await.unwrap().task;
        let b = center
            .create_task(NewTask::titled("B").depends_on(a.id))
            .await
            .unwrap()
            .task;

        let patch = TaskPatch {
            depends_on: Some(vec![b.id]),
            ..Default::default()
        };
        let a = center.update_task(a.id, patch).await.unwrap();
        assert_eq!(a.depends_on, vec![b.id]);

        let feed = center.activity(ActivityFilter::default()).await.unwrap();
        assert!(feed.iter().any(|e| e.kind == ActivityKind::DependencyCycle));
    }

    #[tokio::test]
    async fn test_heartbeat_and_sweep_record_status_changes() {
        let (center, _) = setup().await;
        center.register_agent("forge", "Forge", roles(&["qa"])).await.unwrap();

        let agent = center.heartbeat("forge", Some(AgentStatus::Busy)).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Busy);

        // nobody is stale yet
        assert!(center.sweep_stale_agents().await.unwrap().is_empty());

        let feed = center
            .activity(ActivityFilter {
                agent_id: Some("forge".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(feed[0].kind, ActivityKind::AgentStatusChanged);
    }

    #[tokio::test]
    async fn test_done_task_cannot_be_auto_assigned() {
        let (center, _) = setup().await;
        let task = center
            .create_task(NewTask::titled("Old work").lane(Lane::Done))
            .await
            .unwrap()
            .task;
        assert!(matches!(
            center.auto_assign_task(task.id).await,
            Err(DomainError::ValidationFailed(_))
        ));
    }
}
