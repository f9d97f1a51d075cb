use crate::{
    config::RoutingConfig,
    dataset::{Dataset, MessageEvent, RouteStatus, RoutingRecord},
    error::GenResult,
    event::GenEvent,
    rng::StageRng,
    stage::DatasetStage,
};

/// One routing record per message. Latency, hops and route are drawn
/// independently per record; only delivery_status follows the parent.
pub struct RoutingGenerator {
    config: RoutingConfig,
}

impl RoutingGenerator {
    pub fn new(config: RoutingConfig) -> Self {
        Self { config }
    }

    pub fn generate(&self, messages: &[MessageEvent], rng: &mut StageRng) -> Vec<RoutingRecord> {
        messages
            .iter()
            .map(|m| {
                let route_id = route_id(&self.config, rng);
                // Truncates toward zero; negative latencies are kept.
                let latency_ms =
                    rng.normal(self.config.latency_ms.mean, self.config.latency_ms.std_dev) as i64;
                let hop_count =
                    rng.range_inclusive(self.config.hop_count_min, self.config.hop_count_max);
                RoutingRecord {
                    message_id: m.message_id.clone(),
                    route_id,
                    latency_ms,
                    delivery_status: if m.is_delivered() {
                        RouteStatus::Ok
                    } else {
                        RouteStatus::Error
                    },
                    hop_count,
                }
            })
            .collect()
    }
}

/// `R<n>` with n drawn from the configured route number range.
pub fn route_id(config: &RoutingConfig, rng: &mut StageRng) -> String {
    format!(
        "R{}",
        rng.range_inclusive(config.route_number_min, config.route_number_max)
    )
}

impl DatasetStage for RoutingGenerator {
    fn name(&self) -> &'static str {
        "routing"
    }

    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>> {
        dataset.routing = self.generate(&dataset.messages, rng);
        let errors = dataset
            .routing
            .iter()
            .filter(|r| r.delivery_status == RouteStatus::Error)
            .count();
        log::info!(
            "routing: {} records, {errors} with error status",
            dataset.routing.len()
        );
        Ok(vec![GenEvent::RoutingGenerated {
            count: dataset.routing.len(),
            errors,
        }])
    }
}
