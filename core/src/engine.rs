//! The dataset engine: runs every stage once, in a fixed order.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Partners   (roster every later stage samples from)
//!   2. Messages   (weighted rejection sampling)
//!   3. Routing    (one record per message)
//!   4. Anomalies  (fraud-flagged messages only)
//!   5. Blocklist  (independent of messages, reuses partner ids)
//!
//! RULES:
//!   - Configuration is validated before any stage runs.
//!   - Each stage draws only from its own RngBank slot.
//!   - Every stage outcome is recorded in the run log.
//!   - A stored run commits its run row, log and tables together or not at all.

use crate::{
    anomaly_generator::AnomalyGenerator,
    blocklist_generator::BlocklistGenerator,
    config::GeneratorConfig,
    dataset::Dataset,
    error::{GenError, GenResult},
    event::{EventLogEntry, GenEvent},
    message_generator::MessageGenerator,
    partner_generator::PartnerGenerator,
    rng::{RngBank, StageSlot},
    routing_generator::RoutingGenerator,
    stage::DatasetStage,
    store::DatasetStore,
    types::RunId,
};

pub struct DatasetEngine {
    pub run_id: RunId,
    pub config: GeneratorConfig,
    pub rng_bank: RngBank,
    seed: u64,
    stages: Vec<(StageSlot, Box<dyn DatasetStage>)>,
    log: Vec<EventLogEntry>,
    store: Option<DatasetStore>,
}

impl DatasetEngine {
    /// Validate `config` and build an engine with no stages registered.
    pub fn new(run_id: RunId, seed: u64, config: GeneratorConfig) -> GenResult<Self> {
        config.validate()?;
        Ok(Self {
            run_id,
            config,
            rng_bank: RngBank::new(seed),
            seed,
            stages: Vec::new(),
            log: Vec::new(),
            store: None,
        })
    }

    /// Build a fully wired engine with all stages registered.
    /// Call this instead of new() + manual register() calls.
    pub fn build(run_id: RunId, seed: u64, config: GeneratorConfig) -> GenResult<Self> {
        let mut engine = Self::new(run_id, seed, config)?;
        let cfg = engine.config.clone();

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(
            StageSlot::Partners,
            Box::new(PartnerGenerator::new(cfg.partners, cfg.window)),
        );
        engine.register(
            StageSlot::Messages,
            Box::new(MessageGenerator::new(cfg.messages, cfg.window)),
        );
        engine.register(
            StageSlot::Routing,
            Box::new(RoutingGenerator::new(cfg.routing.clone())),
        );
        engine.register(
            StageSlot::Anomalies,
            Box::new(AnomalyGenerator::new(cfg.anomalies)),
        );
        engine.register(
            StageSlot::Blocklist,
            Box::new(BlocklistGenerator::new(cfg.blocklist, cfg.routing, cfg.window)),
        );
        Ok(engine)
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, slot: StageSlot, stage: Box<dyn DatasetStage>) {
        self.stages.push((slot, stage));
    }

    /// Persist the run record, run log and every table to `store`
    /// once the run completes, all in one transaction.
    pub fn attach_store(&mut self, store: DatasetStore) {
        self.store = Some(store);
    }

    pub fn store(&self) -> Option<&DatasetStore> {
        self.store.as_ref()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The run log collected so far, in emission order.
    pub fn events(&self) -> &[EventLogEntry] {
        &self.log
    }

    /// Run every registered stage once and return the finished tables.
    pub fn run(&mut self) -> GenResult<Dataset> {
        if let Some(store) = &self.store {
            if store.run_exists(&self.run_id)? {
                return Err(GenError::DuplicateRun(self.run_id.clone()));
            }
        }
        self.record(
            "engine",
            &GenEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
            },
        )?;

        let mut dataset = Dataset::default();
        let mut stages = std::mem::take(&mut self.stages);
        let result = self.run_stages(&mut stages, &mut dataset);
        self.stages = stages;
        result?;

        self.record(
            "engine",
            &GenEvent::RunCompleted {
                run_id: self.run_id.clone(),
            },
        )?;

        if let Some(store) = &self.store {
            store.save_run(
                &self.run_id,
                self.seed,
                env!("CARGO_PKG_VERSION"),
                &self.log,
                &dataset,
            )?;
            log::debug!("run {} persisted", self.run_id);
        }
        Ok(dataset)
    }

    fn run_stages(
        &mut self,
        stages: &mut [(StageSlot, Box<dyn DatasetStage>)],
        dataset: &mut Dataset,
    ) -> GenResult<()> {
        for (slot, stage) in stages.iter_mut() {
            let mut rng = self.rng_bank.for_stage(*slot);
            let events = stage.run(dataset, &mut rng)?;
            for event in &events {
                self.record(stage.name(), event)?;
            }
        }
        Ok(())
    }

    fn record(&mut self, stage: &str, event: &GenEvent) -> GenResult<()> {
        let entry = EventLogEntry {
            id: None,
            run_id: self.run_id.clone(),
            seq: self.log.len() as u64,
            stage: stage.to_string(),
            event_type: event.type_name().to_string(),
            payload: serde_json::to_string(event)?,
        };
        self.log.push(entry);
        Ok(())
    }

    /// Decode the run log back into events. Used by the runner summary.
    pub fn decoded_events(&self) -> GenResult<Vec<GenEvent>> {
        self.log
            .iter()
            .map(|e| serde_json::from_str(&e.payload).map_err(Into::into))
            .collect()
    }
}
