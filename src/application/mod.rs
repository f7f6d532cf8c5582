//! Application layer: use-case orchestration over the services.

pub mod control_center;

pub use control_center::{AssignmentResult, ControlCenter, CreatedTask};
