//! Message stage: weighted rejection sampling of message events.
//!
//! Each candidate walks a fixed sequence of draws:
//!   1. day in window             6. fraud probability (base / holiday)
//!   2. pre-holiday boost gate    7. anomaly score, fraud gate, score redraw
//!   3. hour / minute / second    8. legit suppression gate (days 25, 1)
//!   4. partner                   9. id, channel, content, status
//!   5. weekend industry gate
//!
//! The draw order is part of the output contract: moving or removing a
//! draw changes every later value for the same seed.

use crate::{
    config::MessageConfig,
    dataset::{Dataset, MessageEvent, PartnerRecord},
    error::{GenError, GenResult},
    event::{GenEvent, RejectionCounts},
    rng::StageRng,
    stage::DatasetStage,
    window::{is_weekend, DateWindow},
};
use chrono::{Datelike, Duration, NaiveDate};

/// Which gate dropped a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionGate {
    PreHoliday,
    Weekend,
    Suppression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Emitted(MessageEvent),
    Rejected(RejectionGate),
}

pub struct MessageGenerator {
    config: MessageConfig,
    window: DateWindow,
}

impl MessageGenerator {
    pub fn new(config: MessageConfig, window: DateWindow) -> Self {
        Self { config, window }
    }

    /// Acceptance multiplier for `date`; 1.0 unless listed in the boost table.
    pub fn boost_for(&self, date: NaiveDate) -> f64 {
        self.config
            .pre_holiday_boosts
            .iter()
            .find(|b| b.month == date.month() && b.day == date.day())
            .map(|b| b.multiplier)
            .unwrap_or(1.0)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.config.holiday_days.contains(&date.day())
    }

    pub fn is_suppression_day(&self, date: NaiveDate) -> bool {
        self.config.suppression_days.contains(&date.day())
    }

    fn weekend_modifier(&self, industry: &str) -> f64 {
        self.config
            .weekend_modifiers
            .get(industry)
            .copied()
            .unwrap_or(1.0)
    }

    /// Run one candidate through every gate.
    pub fn draw_candidate(&self, partners: &[PartnerRecord], rng: &mut StageRng) -> Candidate {
        let cfg = &self.config;

        let day_offset = rng.next_u64_below(self.window.num_days() as u64) as i64;
        let date = self.window.day(day_offset);

        if rng.next_f64() > self.boost_for(date) {
            return Candidate::Rejected(RejectionGate::PreHoliday);
        }

        let hour = rng.weighted_index(&cfg.hour_weights) as i64;
        let minute = rng.next_u64_below(60) as i64;
        let second = rng.next_u64_below(60) as i64;
        let timestamp = self.window.start_datetime()
            + Duration::days(day_offset)
            + Duration::seconds(hour * 3600 + minute * 60 + second);

        let partner = rng.pick(partners);

        let holiday = self.is_holiday(date);
        if is_weekend(date) && rng.next_f64() > self.weekend_modifier(&partner.industry) {
            return Candidate::Rejected(RejectionGate::Weekend);
        }

        // Holiday probability wins whenever the day is a holiday, even at 0.
        let base_probability = rng
            .normal(cfg.base_fraud_probability.mean, cfg.base_fraud_probability.std_dev)
            .max(0.0);
        let fraud_probability = if holiday {
            rng.normal(
                cfg.holiday_fraud_probability.mean,
                cfg.holiday_fraud_probability.std_dev,
            )
            .max(0.0)
        } else {
            base_probability
        };

        let mut anomaly_score =
            round3(rng.normal(cfg.baseline_score.mean, cfg.baseline_score.std_dev));
        let fraud_flag = rng.chance(fraud_probability);
        if fraud_flag {
            let dist = if holiday {
                cfg.fraud_score_holiday
            } else {
                cfg.fraud_score_regular
            };
            anomaly_score = round3(rng.normal(dist.mean, dist.std_dev));
        }

        if !fraud_flag && self.is_suppression_day(date) {
            let reject_probability =
                rng.normal(cfg.suppression_rate.mean, cfg.suppression_rate.std_dev);
            if rng.next_f64() < reject_probability {
                return Candidate::Rejected(RejectionGate::Suppression);
            }
        }

        let message_id = rng.uuid().to_string();
        let channel = rng.pick(&cfg.channels).clone();
        let message_content = rng.pick(&cfg.content_labels).clone();
        let weights: Vec<f64> = cfg.statuses.iter().map(|s| s.weight).collect();
        let status = cfg.statuses[rng.weighted_index(&weights)].label.clone();

        Candidate::Emitted(MessageEvent {
            message_id,
            timestamp,
            partner_id: partner.partner_id.clone(),
            channel,
            status,
            fraud_flag,
            anomaly_score,
            message_content,
        })
    }

    /// Draw `target_count` candidates and keep the survivors.
    pub fn generate(
        &self,
        partners: &[PartnerRecord],
        rng: &mut StageRng,
    ) -> GenResult<(Vec<MessageEvent>, RejectionCounts)> {
        if partners.is_empty() && self.config.target_count > 0 {
            return Err(GenError::invalid_config(
                "partners",
                "message generation needs a non-empty partner roster",
            ));
        }

        let mut messages = Vec::with_capacity(self.config.target_count);
        let mut rejections = RejectionCounts::default();

        for _ in 0..self.config.target_count {
            match self.draw_candidate(partners, rng) {
                Candidate::Emitted(m) => messages.push(m),
                Candidate::Rejected(RejectionGate::PreHoliday) => rejections.pre_holiday += 1,
                Candidate::Rejected(RejectionGate::Weekend) => rejections.weekend += 1,
                Candidate::Rejected(RejectionGate::Suppression) => rejections.suppression += 1,
            }
        }
        Ok((messages, rejections))
    }
}

impl DatasetStage for MessageGenerator {
    fn name(&self) -> &'static str {
        "messages"
    }

    fn run(&mut self, dataset: &mut Dataset, rng: &mut StageRng) -> GenResult<Vec<GenEvent>> {
        let (messages, rejections) = self.generate(&dataset.partners, rng)?;
        dataset.messages = messages;

        let emitted = dataset.messages.len();
        let fraud_flagged = dataset.fraud_count();
        log::info!(
            "messages: emitted {emitted} of {} candidates, {fraud_flagged} fraud-flagged",
            self.config.target_count
        );
        log::debug!(
            "messages: rejected {} (pre_holiday={} weekend={} suppression={})",
            rejections.total(),
            rejections.pre_holiday,
            rejections.weekend,
            rejections.suppression
        );

        Ok(vec![GenEvent::MessagesGenerated {
            candidates: self.config.target_count,
            emitted,
            fraud_flagged,
            rejections,
        }])
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}
