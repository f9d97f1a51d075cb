//! In-memory tables produced by a run.

use crate::types::{MessageId, PartnerId, RouteId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerRecord {
    pub partner_id: PartnerId,
    pub name: String,
    pub region: String,
    pub industry: String,
    pub onboarding_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEvent {
    pub message_id: MessageId,
    pub timestamp: NaiveDateTime,
    pub partner_id: PartnerId,
    pub channel: String,
    pub status: String,
    pub fraud_flag: bool,
    /// Unclamped; may fall outside [0, 1].
    pub anomaly_score: f64,
    pub message_content: String,
}

impl MessageEvent {
    pub fn is_delivered(&self) -> bool {
        self.status == "delivered"
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Ok,
    Error,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingRecord {
    pub message_id: MessageId,
    pub route_id: RouteId,
    /// Truncated normal draw; no floor, may be negative.
    pub latency_ms: i64,
    pub delivery_status: RouteStatus,
    pub hop_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyRecord {
    pub message_id: MessageId,
    pub anomaly_type: String,
    pub anomaly_score: f64,
    pub reason: String,
    pub action_taken: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockedEntityType {
    PartnerId,
    IpAddress,
    RouteId,
}

impl BlockedEntityType {
    pub const ALL: [BlockedEntityType; 3] = [Self::PartnerId, Self::IpAddress, Self::RouteId];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PartnerId => "partner_id",
            Self::IpAddress => "ip_address",
            Self::RouteId => "route_id",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockedEntity {
    pub entity_type: BlockedEntityType,
    pub entity_id: String,
    pub reason: String,
    pub block_time: NaiveDateTime,
    /// Never populated by the generator.
    pub unblocked_timestamp: Option<NaiveDateTime>,
}

/// Every table of one run. Stages fill it in execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub partners: Vec<PartnerRecord>,
    pub messages: Vec<MessageEvent>,
    pub routing: Vec<RoutingRecord>,
    pub anomalies: Vec<AnomalyRecord>,
    pub blocked_entities: Vec<BlockedEntity>,
}

impl Dataset {
    pub fn partner_ids(&self) -> HashSet<&str> {
        self.partners.iter().map(|p| p.partner_id.as_str()).collect()
    }

    pub fn fraud_count(&self) -> usize {
        self.messages.iter().filter(|m| m.fraud_flag).count()
    }
}
