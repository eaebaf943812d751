//! Workflow execution for Autoflow.
//!
//! - [`graph`]: the planner's node-graph model and its validation.
//! - [`runner`]: ordering, the sequential run loop and the [`RunReport`].
//! - [`observer`]: progress callbacks for callers streaming node status.

pub mod error;
pub mod graph;
pub mod observer;
pub mod runner;

pub use error::{EngineError, Result};
pub use graph::{
    Edge, FieldMode, FieldValue, INVALID_GRAPH_MESSAGE, Node, NodeData, NodeStatus, Position,
    WorkflowGraph,
};
pub use observer::{ChannelObserver, NodeEvent, NoopObserver, RunObserver};
pub use runner::{
    ActionInvoker, NodeResult, Ordering, ResultStatus, RunOptions, RunReport, WorkflowRunner,
    execution_order,
};
