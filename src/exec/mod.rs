// src/exec/mod.rs

//! Workflow execution: the service seam, a simulated adapter and the
//! chain runner.

pub mod chain_runner;
pub mod service;
pub mod simulated;

pub use chain_runner::{ChainReport, ChainStatus, StepReport, WorkflowOutcome, run_chain};
pub use service::{
    ExecutionResponse, InstanceId, InstanceRecord, InstanceState, ServiceFuture, ServiceMetrics,
    WorkflowParams, WorkflowService,
};
pub use simulated::SimulatedWorkflowService;
