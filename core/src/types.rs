//! Shared primitive types used across the whole generator.

/// Stable partner identifier, e.g. `P007`.
pub type PartnerId = String;

/// Message identifier (hyphenated UUID string).
pub type MessageId = String;

/// Route identifier, e.g. `R4821`.
pub type RouteId = String;

/// The canonical run identifier.
pub type RunId = String;
