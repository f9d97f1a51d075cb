//! Stage trait.
//!
//! RULE: Every generation step implements DatasetStage.
//! The engine calls run() on each registered stage once,
//! in registration order. The order is fixed and documented in engine.rs.

use crate::{dataset::Dataset, error::GenResult, event::GenEvent, rng::StageRng};

/// The contract every stage must fulfill.
pub trait DatasetStage {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Called once per run by the engine.
    ///
    /// - `dataset`: tables filled by earlier stages; the stage appends its own
    /// - `rng`:     this stage's deterministic RNG
    ///
    /// Returns events for the run log.
    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>>;
}
