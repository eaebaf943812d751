//! Progress observation for running workflows.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::graph::NodeStatus;

/// Receives node state transitions while a run is in progress.
///
/// `Active` is reported immediately before a node's action is invoked;
/// exactly one terminal state (`Completed`, `Failed` or `Skipped`) follows
/// for every node.
#[async_trait]
pub trait RunObserver: Send + Sync {
    async fn on_node_status(&self, node_id: &str, status: NodeStatus);
}

/// Observer that ignores every transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

#[async_trait]
impl RunObserver for NoopObserver {
    async fn on_node_status(&self, _node_id: &str, _status: NodeStatus) {}
}

/// A node state transition as delivered by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEvent {
    pub node_id: String,
    pub status: NodeStatus,
}

/// Forwards transitions over an mpsc channel.
///
/// A closed receiver is ignored; the run carries on without a listener.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::Sender<NodeEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::Sender<NodeEvent>) -> Self {
        Self { tx }
    }

    /// Observer plus the receiving end of a channel of `capacity` events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NodeEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl RunObserver for ChannelObserver {
    async fn on_node_status(&self, node_id: &str, status: NodeStatus) {
        let event = NodeEvent {
            node_id: node_id.to_string(),
            status,
        };
        if self.tx.send(event).await.is_err() {
            tracing::debug!(node_id, "run observer channel closed");
        }
    }
}
