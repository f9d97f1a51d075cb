use crate::{
    config::AnomalyConfig,
    dataset::{AnomalyRecord, Dataset, MessageEvent},
    error::GenResult,
    event::GenEvent,
    rng::StageRng,
    stage::DatasetStage,
};

/// Anomaly rows for fraud-flagged messages. The categorical columns are
/// drawn independently of the score and carry no causal meaning.
pub struct AnomalyGenerator {
    config: AnomalyConfig,
}

impl AnomalyGenerator {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, messages: &[MessageEvent], rng: &mut StageRng) -> Vec<AnomalyRecord> {
        messages
            .iter()
            .filter(|m| m.fraud_flag)
            .map(|m| AnomalyRecord {
                message_id: m.message_id.clone(),
                anomaly_type: rng.pick(&self.config.anomaly_types).clone(),
                anomaly_score: m.anomaly_score,
                reason: rng.pick(&self.config.reasons).clone(),
                action_taken: rng.pick(&self.config.actions).clone(),
            })
            .collect()
    }
}

impl DatasetStage for AnomalyGenerator {
    fn name(&self) -> &'static str {
        "anomalies"
    }

    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>> {
        dataset.anomalies = self.generate(&dataset.messages, rng);
        log::info!("anomalies: {} records", dataset.anomalies.len());
        Ok(vec![GenEvent::AnomaliesGenerated {
            count: dataset.anomalies.len(),
        }])
    }
}
