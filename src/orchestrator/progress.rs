//! 进度事件
//!
//! 每次状态变化都会在写入批次之后广播，供展示层增量刷新

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{ExtractionStatus, StorageStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProgressEvent {
    RunStarted {
        total: usize,
    },
    ExtractionChanged {
        id: String,
        status: ExtractionStatus,
    },
    StorageChanged {
        id: String,
        status: StorageStatus,
    },
    RunFinished {
        extracted: usize,
        uploaded: usize,
    },
}

/// 进度广播器，没有订阅者时事件直接丢弃
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new(256)
    }
}
