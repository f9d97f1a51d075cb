use crate::{
    error::{GenError, GenResult},
    window::DateWindow,
};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean and spread of a normal draw.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalParams {
    pub mean: f64,
    pub std_dev: f64,
}

impl NormalParams {
    pub const fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedLabel {
    pub label: String,
    pub weight: f64,
}

/// Acceptance multiplier for one calendar day, matched by month and day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoostDay {
    pub month: u32,
    pub day: u32,
    pub multiplier: f64,
}

// ── Partners ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerConfig {
    pub count: usize,
    pub regions: Vec<String>,
    pub industries: Vec<String>,
    /// Onboarding date = window start minus U[min, max] days.
    pub onboarding_offset_min_days: i64,
    pub onboarding_offset_max_days: i64,
    pub active_probability: f64,
}

impl Default for PartnerConfig {
    fn default() -> Self {
        Self {
            count: 10,
            regions: strings(&["UK", "EU", "NA"]),
            industries: strings(&["banking", "retail", "healthcare", "gov", "logistics"]),
            onboarding_offset_min_days: 30,
            onboarding_offset_max_days: 300,
            active_probability: 0.75,
        }
    }
}

// ── Messages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Number of candidate draws. Rejections make the emitted count smaller.
    pub target_count: usize,
    pub channels: Vec<String>,
    pub content_labels: Vec<String>,
    pub statuses: Vec<WeightedLabel>,
    /// 24 entries, index = hour of day.
    pub hour_weights: Vec<f64>,
    /// Weekend acceptance probability per industry.
    pub weekend_modifiers: BTreeMap<String, f64>,
    pub holiday_days: Vec<u32>,
    pub pre_holiday_boosts: Vec<BoostDay>,
    /// Days of month on which non-fraud traffic is thinned out.
    pub suppression_days: Vec<u32>,
    pub suppression_rate: NormalParams,
    pub base_fraud_probability: NormalParams,
    pub holiday_fraud_probability: NormalParams,
    pub baseline_score: NormalParams,
    pub fraud_score_holiday: NormalParams,
    pub fraud_score_regular: NormalParams,
}

impl Default for MessageConfig {
    fn default() -> Self {
        let weekend_modifiers = [
            ("banking", 0.35),
            ("gov", 0.20),
            ("healthcare", 0.60),
            ("logistics", 0.70),
            ("retail", 0.95),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            target_count: 100_000,
            channels: strings(&["SMS", "RCS", "WhatsApp"]),
            content_labels: strings(&["Promo", "2FA", "Reminder", "Update", "Alert"]),
            statuses: vec![
                WeightedLabel { label: "delivered".into(), weight: 0.90 },
                WeightedLabel { label: "failed".into(), weight: 0.07 },
                WeightedLabel { label: "blocked".into(), weight: 0.03 },
            ],
            hour_weights: vec![
                0.012, 0.003, 0.002, 0.002, 0.003, 0.008, // 00-05
                0.020, 0.040, 0.070, 0.075, 0.075, 0.070, // 06-11
                0.070, 0.070, 0.070, 0.070, 0.060, 0.060, // 12-17
                0.055, 0.050, 0.045, 0.035, 0.020, 0.015, // 18-23
            ],
            weekend_modifiers,
            holiday_days: vec![24, 25, 26, 30, 31, 1],
            pre_holiday_boosts: vec![
                BoostDay { month: 12, day: 22, multiplier: 1.3 },
                BoostDay { month: 12, day: 23, multiplier: 1.5 },
                BoostDay { month: 12, day: 30, multiplier: 1.4 },
            ],
            suppression_days: vec![25, 1],
            suppression_rate: NormalParams::new(0.5, 0.1),
            base_fraud_probability: NormalParams::new(0.007, 0.002),
            holiday_fraud_probability: NormalParams::new(0.02, 0.005),
            baseline_score: NormalParams::new(0.2, 0.1),
            fraud_score_holiday: NormalParams::new(0.85, 0.05),
            fraud_score_regular: NormalParams::new(0.70, 0.10),
        }
    }
}

// ── Derived tables ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub latency_ms: NormalParams,
    pub hop_count_min: i64,
    pub hop_count_max: i64,
    /// Route ids are `R<n>` with n in [route_number_min, route_number_max].
    pub route_number_min: i64,
    pub route_number_max: i64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            latency_ms: NormalParams::new(180.0, 50.0),
            hop_count_min: 1,
            hop_count_max: 4,
            route_number_min: 1000,
            route_number_max: 9999,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub anomaly_types: Vec<String>,
    pub reasons: Vec<String>,
    pub actions: Vec<String>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            anomaly_types: strings(&["volume_spike", "routing_mismatch", "duplicate_content"]),
            reasons: strings(&["suspicious timing", "high score", "pattern match"]),
            actions: strings(&["flagged", "investigated", "blocked"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocklistConfig {
    pub count: usize,
    pub reasons: Vec<String>,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            count: 100,
            reasons: strings(&["high fraud rate", "manual review", "policy breach"]),
        }
    }
}

// ── Top level ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub window: DateWindow,
    pub partners: PartnerConfig,
    pub messages: MessageConfig,
    pub routing: RoutingConfig,
    pub anomalies: AnomalyConfig,
    pub blocklist: BlocklistConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window: DateWindow::new(ymd(2024, 12, 15), ymd(2025, 1, 14)),
            partners: PartnerConfig::default(),
            messages: MessageConfig::default(),
            routing: RoutingConfig::default(),
            anomalies: AnomalyConfig::default(),
            blocklist: BlocklistConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load a JSON config file. Absent fields keep their defaults.
    pub fn load(path: &str) -> GenResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults scaled down for fast unit tests.
    pub fn default_test() -> Self {
        let mut config = Self::default();
        config.messages.target_count = 5_000;
        config.blocklist.count = 20;
        config
    }

    /// Reject configurations that would produce garbage rows.
    /// Called once before any generation starts.
    pub fn validate(&self) -> GenResult<()> {
        if self.window.end < self.window.start {
            return Err(GenError::invalid_config(
                "window",
                format!("end {} is before start {}", self.window.end, self.window.start),
            ));
        }

        // Partners
        let p = &self.partners;
        if p.count == 0 && (self.messages.target_count > 0 || self.blocklist.count > 0) {
            return Err(GenError::invalid_config(
                "partners.count",
                "at least one partner is required to attribute messages and blocks",
            ));
        }
        non_empty("partners.regions", &p.regions)?;
        non_empty("partners.industries", &p.industries)?;
        if p.onboarding_offset_min_days < 1 {
            return Err(GenError::invalid_config(
                "partners.onboarding_offset_min_days",
                "must be at least 1 so onboarding precedes the window",
            ));
        }
        ordered(
            "partners.onboarding_offset_*_days",
            p.onboarding_offset_min_days,
            p.onboarding_offset_max_days,
        )?;
        if self
            .window
            .start
            .checked_sub_days(Days::new(p.onboarding_offset_max_days as u64))
            .is_none()
        {
            return Err(GenError::invalid_config(
                "partners.onboarding_offset_max_days",
                format!(
                    "{} days before {} is outside the calendar",
                    p.onboarding_offset_max_days, self.window.start
                ),
            ));
        }
        probability("partners.active_probability", p.active_probability)?;

        // Messages
        let m = &self.messages;
        non_empty("messages.channels", &m.channels)?;
        non_empty("messages.content_labels", &m.content_labels)?;
        let status_weights: Vec<f64> = m.statuses.iter().map(|s| s.weight).collect();
        weights("messages.statuses", &status_weights)?;
        if m.hour_weights.len() != 24 {
            return Err(GenError::invalid_config(
                "messages.hour_weights",
                format!("expected 24 entries, got {}", m.hour_weights.len()),
            ));
        }
        weights("messages.hour_weights", &m.hour_weights)?;
        let hour_total: f64 = m.hour_weights.iter().sum();
        if (hour_total - 1.0).abs() > 1e-6 {
            log::warn!("hour weights sum to {hour_total:.6}, sampling will normalise them");
        }
        for industry in &p.industries {
            match m.weekend_modifiers.get(industry) {
                Some(v) => probability(&format!("messages.weekend_modifiers.{industry}"), *v)?,
                None => {
                    return Err(GenError::invalid_config(
                        "messages.weekend_modifiers",
                        format!("no modifier for industry '{industry}'"),
                    ))
                }
            }
        }
        days_of_month("messages.holiday_days", &m.holiday_days)?;
        days_of_month("messages.suppression_days", &m.suppression_days)?;
        for boost in &m.pre_holiday_boosts {
            if NaiveDate::from_ymd_opt(2024, boost.month, boost.day).is_none() {
                return Err(GenError::invalid_config(
                    "messages.pre_holiday_boosts",
                    format!("{}-{} is not a calendar day", boost.month, boost.day),
                ));
            }
            finite_non_negative("messages.pre_holiday_boosts.multiplier", boost.multiplier)?;
        }
        normal("messages.suppression_rate", m.suppression_rate)?;
        normal("messages.base_fraud_probability", m.base_fraud_probability)?;
        normal("messages.holiday_fraud_probability", m.holiday_fraud_probability)?;
        normal("messages.baseline_score", m.baseline_score)?;
        normal("messages.fraud_score_holiday", m.fraud_score_holiday)?;
        normal("messages.fraud_score_regular", m.fraud_score_regular)?;

        // Derived tables
        let r = &self.routing;
        normal("routing.latency_ms", r.latency_ms)?;
        ordered("routing.hop_count_*", r.hop_count_min, r.hop_count_max)?;
        if r.hop_count_min < 1 {
            return Err(GenError::invalid_config("routing.hop_count_min", "must be positive"));
        }
        if r.route_number_min < 0 {
            return Err(GenError::invalid_config(
                "routing.route_number_min",
                "must not be negative",
            ));
        }
        ordered("routing.route_number_*", r.route_number_min, r.route_number_max)?;

        let a = &self.anomalies;
        non_empty("anomalies.anomaly_types", &a.anomaly_types)?;
        non_empty("anomalies.reasons", &a.reasons)?;
        non_empty("anomalies.actions", &a.actions)?;

        non_empty("blocklist.reasons", &self.blocklist.reasons)?;
        Ok(())
    }
}

// ── Validation helpers ─────────────────────────────────────────────

fn non_empty(field: &str, items: &[String]) -> GenResult<()> {
    if items.is_empty() {
        return Err(GenError::invalid_config(field, "must not be empty"));
    }
    Ok(())
}

fn ordered(field: &str, min: i64, max: i64) -> GenResult<()> {
    if min > max {
        return Err(GenError::invalid_config(field, format!("min {min} exceeds max {max}")));
    }
    Ok(())
}

fn finite_non_negative(field: &str, v: f64) -> GenResult<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(GenError::invalid_config(field, format!("{v} is not a finite non-negative number")));
    }
    Ok(())
}

fn probability(field: &str, v: f64) -> GenResult<()> {
    finite_non_negative(field, v)?;
    if v > 1.0 {
        return Err(GenError::invalid_config(field, format!("{v} is greater than 1")));
    }
    Ok(())
}

fn normal(field: &str, params: NormalParams) -> GenResult<()> {
    if !params.mean.is_finite() {
        return Err(GenError::invalid_config(field, "mean must be finite"));
    }
    finite_non_negative(field, params.std_dev)
}

fn weights(field: &str, ws: &[f64]) -> GenResult<()> {
    if ws.is_empty() {
        return Err(GenError::invalid_config(field, "must not be empty"));
    }
    for w in ws {
        finite_non_negative(field, *w)?;
    }
    if ws.iter().sum::<f64>() <= 0.0 {
        return Err(GenError::invalid_config(field, "weights sum to zero"));
    }
    Ok(())
}

fn days_of_month(field: &str, days: &[u32]) -> GenResult<()> {
    if let Some(bad) = days.iter().find(|d| !(1..=31).contains(*d)) {
        return Err(GenError::invalid_config(field, format!("{bad} is not a day of month")));
    }
    Ok(())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("hardcoded default date is valid")
}
