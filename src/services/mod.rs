//! Service layer: business logic over the domain ports.

pub mod agent_service;
pub mod assignment;
pub mod dependency_resolver;
pub mod event_bus;
pub mod task_service;

pub use agent_service::{AgentService, AgentWorkload};
pub use assignment::{AssignmentEngine, AssignmentOutcome};
pub use dependency_resolver::DependencyResolver;
pub use event_bus::{BusEvent, BusPayload, EventBus, EventBusConfig, SequenceNumber};
pub use task_service::{TaskService, TaskUpdate};
