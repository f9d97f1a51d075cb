//! The run log: what each stage reports after it finishes.
//!
//! RULE: Stages report only through events.
//! A stage never reaches into another stage's internals; it reads
//! the tables earlier stages left in the Dataset.

use crate::types::RunId;
use serde::{Deserialize, Serialize};

/// Variants are appended as stages are added, never reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    RunCompleted {
        run_id: RunId,
    },

    // ── Stage events ───────────────────────────────
    PartnersGenerated {
        count: usize,
        active: usize,
    },
    MessagesGenerated {
        candidates: usize,
        emitted: usize,
        fraud_flagged: usize,
        rejections: RejectionCounts,
    },
    RoutingGenerated {
        count: usize,
        errors: usize,
    },
    AnomaliesGenerated {
        count: usize,
    },
    BlocklistGenerated {
        count: usize,
    },
}

impl GenEvent {
    /// Stable string name, used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. } => "run_initialized",
            Self::RunCompleted { .. } => "run_completed",
            Self::PartnersGenerated { .. } => "partners_generated",
            Self::MessagesGenerated { .. } => "messages_generated",
            Self::RoutingGenerated { .. } => "routing_generated",
            Self::AnomaliesGenerated { .. } => "anomalies_generated",
            Self::BlocklistGenerated { .. } => "blocklist_generated",
        }
    }
}

/// Candidates dropped by each rejection gate of the message stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectionCounts {
    pub pre_holiday: usize,
    pub weekend: usize,
    pub suppression: usize,
}

impl RejectionCounts {
    pub fn total(&self) -> usize {
        self.pre_holiday + self.weekend + self.suppression
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub seq: u64,
    pub stage: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized GenEvent
}
