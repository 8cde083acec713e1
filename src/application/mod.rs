//! Application Layer - Use case orchestration

pub mod orchestrator;

pub use orchestrator::{
    LifecycleOrchestrator, LifecycleState, OrchestratorError, RestartReport, StepRecord,
};
