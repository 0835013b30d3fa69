//! Cognition tools — the named capabilities the tool loop (C15) exposes.
//!
//! Each tool is a self-contained file in src/tools/, backed by a narrow
//! collaborator trait in handles.rs. To add a tool: create the file,
//! implement Tool, add a handle trait if it needs one, register below.

pub mod handles;
pub mod registry;
pub mod tools;

pub use handles::{
    Clock, MemoryStore, MotorTaskInfo, MotorTaskManager, MotorTaskStatus, ScheduleHandleInfo,
    SchedulingHandle, StateProvider, StateSnapshot, SystemClock,
};
pub use registry::{Tool, ToolRegistry, ToolResult};

use std::sync::Arc;

/// Wiring a cognition dispatch needs to build its default tool registry.
pub struct CognitionCollaborators {
    pub state: Arc<dyn StateProvider>,
    pub memory: Arc<dyn MemoryStore>,
    pub clock: Arc<dyn Clock>,
    pub scheduling: Arc<dyn SchedulingHandle>,
    pub motor_tasks: Arc<dyn MotorTaskManager>,
}

/// Create the default tool registry: state_read, memory, time, scheduling, motor_task.
pub fn create_default_registry(collaborators: CognitionCollaborators) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(tools::state_read::StateReadTool::new(collaborators.state));
    registry.register(tools::memory::MemoryTool::new(collaborators.memory));
    registry.register(tools::time::TimeTool::new(collaborators.clock));
    registry.register(tools::scheduling::SchedulingTool::new(collaborators.scheduling));
    registry.register(tools::motor_task::MotorTaskTool::new(collaborators.motor_tasks));

    registry
}
