use crate::{
    config::PartnerConfig,
    dataset::{Dataset, PartnerRecord},
    error::GenResult,
    event::GenEvent,
    rng::StageRng,
    stage::DatasetStage,
    window::DateWindow,
};
use chrono::Duration;

/// Builds the partner roster every later stage samples from.
pub struct PartnerGenerator {
    config: PartnerConfig,
    window: DateWindow,
}

impl PartnerGenerator {
    pub fn new(config: PartnerConfig, window: DateWindow) -> Self {
        Self { config, window }
    }

    pub fn generate(&self, rng: &mut StageRng) -> Vec<PartnerRecord> {
        let n = self.config.count;
        let mut partners = Vec::with_capacity(n);

        for i in 1..=n {
            let region = rng.pick(&self.config.regions).clone();
            let industry = rng.pick(&self.config.industries).clone();
            let offset = rng.range_inclusive(
                self.config.onboarding_offset_min_days,
                self.config.onboarding_offset_max_days,
            );
            let is_active = rng.chance(self.config.active_probability);

            partners.push(PartnerRecord {
                partner_id: format!("P{i:03}"),
                name: format!("Partner_{i}"),
                region,
                industry,
                onboarding_date: self.window.start - Duration::days(offset),
                is_active,
            });
        }
        partners
    }
}

impl DatasetStage for PartnerGenerator {
    fn name(&self) -> &'static str {
        "partners"
    }

    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>> {
        dataset.partners = self.generate(rng);
        let active = dataset.partners.iter().filter(|p| p.is_active).count();
        log::info!(
            "partners: generated {} partners ({active} active)",
            dataset.partners.len()
        );
        Ok(vec![GenEvent::PartnersGenerated {
            count: dataset.partners.len(),
            active,
        }])
    }
}
