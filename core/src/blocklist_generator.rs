use crate::{
    config::{BlocklistConfig, RoutingConfig},
    dataset::{BlockedEntity, BlockedEntityType, Dataset, PartnerRecord},
    error::{GenError, GenResult},
    event::GenEvent,
    rng::StageRng,
    routing_generator::route_id,
    stage::DatasetStage,
    window::DateWindow,
};
use chrono::Duration;

/// Blocked entities, independent of the message table. The entity type is
/// drawn once and decides both the type column and the id shape.
pub struct BlocklistGenerator {
    config: BlocklistConfig,
    routing: RoutingConfig,
    window: DateWindow,
}

impl BlocklistGenerator {
    pub fn new(config: BlocklistConfig, routing: RoutingConfig, window: DateWindow) -> Self {
        Self {
            config,
            routing,
            window,
        }
    }

    pub fn generate(
        &self,
        partners: &[PartnerRecord],
        rng: &mut StageRng,
    ) -> GenResult<Vec<BlockedEntity>> {
        if partners.is_empty() && self.config.count > 0 {
            return Err(GenError::invalid_config(
                "partners",
                "blocklist generation needs a non-empty partner roster",
            ));
        }

        let mut blocked = Vec::with_capacity(self.config.count);
        for _ in 0..self.config.count {
            let entity_type = *rng.pick(&BlockedEntityType::ALL);
            let entity_id = match entity_type {
                BlockedEntityType::PartnerId => rng.pick(partners).partner_id.clone(),
                BlockedEntityType::IpAddress => format!(
                    "{}.{}.{}.{}",
                    rng.range_inclusive(1, 255),
                    rng.range_inclusive(0, 255),
                    rng.range_inclusive(0, 255),
                    rng.range_inclusive(1, 254)
                ),
                BlockedEntityType::RouteId => route_id(&self.routing, rng),
            };
            let reason = rng.pick(&self.config.reasons).clone();
            let offset = rng.next_u64_below(self.window.num_seconds() as u64) as i64;

            blocked.push(BlockedEntity {
                entity_type,
                entity_id,
                reason,
                block_time: self.window.start_datetime() + Duration::seconds(offset),
                unblocked_timestamp: None,
            });
        }
        Ok(blocked)
    }
}

impl DatasetStage for BlocklistGenerator {
    fn name(&self) -> &'static str {
        "blocklist"
    }

    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>> {
        dataset.blocked_entities = self.generate(&dataset.partners, rng)?;
        log::info!("blocklist: {} blocked entities", dataset.blocked_entities.len());
        Ok(vec![GenEvent::BlocklistGenerated {
            count: dataset.blocked_entities.len(),
        }])
    }
}
