//! msgsim-core: synthetic messaging-platform dataset generation.
//!
//! A run builds five tables (partners, messages, routing, anomalies,
//! blocked entities) from one seed. See engine.rs for stage order.

pub mod analysis;
pub mod anomaly_generator;
pub mod blocklist_generator;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod event;
pub mod message_generator;
pub mod partner_generator;
pub mod rng;
pub mod routing_generator;
pub mod stage;
pub mod store;
pub mod table;
pub mod types;
pub mod window;
