//! Message stage tests: window bounds, partner references, fraud shape,
//! and the rejection gates.

use chrono::{Datelike, NaiveDate, Timelike};
use msgsim_core::{
    config::{GeneratorConfig, NormalParams},
    dataset::Dataset,
    engine::DatasetEngine,
    message_generator::MessageGenerator,
    partner_generator::PartnerGenerator,
    rng::{RngBank, StageSlot},
    window::{is_weekend, DateWindow},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn run(run_id: &str, seed: u64, config: GeneratorConfig) -> Dataset {
    let mut engine = DatasetEngine::build(run_id.into(), seed, config).unwrap();
    engine.run().unwrap()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    sum / n as f64
}

#[test]
fn timestamps_stay_inside_window() {
    let config = GeneratorConfig::default_test();
    let window = config.window;
    let dataset = run("ts-window", 42, config);

    assert!(!dataset.messages.is_empty());
    for m in &dataset.messages {
        assert!(window.contains(m.timestamp), "{} outside window", m.timestamp);
    }
}

#[test]
fn every_message_references_a_partner() {
    let dataset = run("partner-ref", 42, GeneratorConfig::default_test());
    let ids = dataset.partner_ids();
    for m in &dataset.messages {
        assert!(ids.contains(m.partner_id.as_str()), "dangling partner {}", m.partner_id);
    }
}

#[test]
fn message_ids_are_unique_uuids() {
    let dataset = run("uuid", 3, GeneratorConfig::default_test());
    let mut seen = std::collections::HashSet::new();
    for m in &dataset.messages {
        let parsed = uuid::Uuid::parse_str(&m.message_id).expect("message_id is a UUID");
        assert_eq!(parsed.get_version_num(), 4);
        assert!(seen.insert(m.message_id.clone()), "duplicate id {}", m.message_id);
    }
}

#[test]
fn holiday_scenario_emits_fewer_than_candidates() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 15), date(2025, 1, 14));
    config.messages.target_count = 100_000;
    config.partners.count = 10;
    let dataset = run("scenario-100k", 42, config);

    let emitted = dataset.messages.len();
    assert!(emitted < 100_000, "no candidate was rejected");
    assert!(emitted > 20_000, "only {emitted} of 100000 survived");
}

#[test]
fn fraud_scores_have_higher_mean() {
    let dataset = run("fraud-mean", 42, GeneratorConfig::default());

    let fraud: Vec<f64> = dataset
        .messages
        .iter()
        .filter(|m| m.fraud_flag)
        .map(|m| m.anomaly_score)
        .collect();
    assert!(fraud.len() > 100, "expected a meaningful fraud sample, got {}", fraud.len());

    let fraud_mean = mean(fraud.iter().copied());
    let legit_mean = mean(
        dataset
            .messages
            .iter()
            .filter(|m| !m.fraud_flag)
            .map(|m| m.anomaly_score),
    );
    assert!(
        fraud_mean > legit_mean,
        "fraud mean {fraud_mean:.3} should exceed legit mean {legit_mean:.3}"
    );
    assert!((legit_mean - 0.2).abs() < 0.01, "legit mean {legit_mean:.3}");
}

#[test]
fn holidays_carry_a_higher_fraud_rate() {
    let dataset = run("holiday-rate", 42, GeneratorConfig::default());
    let holiday_days = [24, 25, 26, 30, 31, 1];

    let rate = |holiday: bool| {
        let subset: Vec<bool> = dataset
            .messages
            .iter()
            .filter(|m| holiday_days.contains(&m.timestamp.day()) == holiday)
            .map(|m| m.fraud_flag)
            .collect();
        subset.iter().filter(|f| **f).count() as f64 / subset.len() as f64
    };
    let (holiday, regular) = (rate(true), rate(false));
    assert!(
        holiday > regular * 1.5,
        "holiday fraud rate {holiday:.4} vs regular {regular:.4}"
    );
}

#[test]
fn day_25_legit_traffic_is_roughly_halved() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 25), date(2024, 12, 25));
    config.messages.target_count = 20_000;

    let bank = RngBank::new(2024);
    let partners = PartnerGenerator::new(config.partners.clone(), config.window)
        .generate(&mut bank.for_stage(StageSlot::Partners));
    let gen = MessageGenerator::new(config.messages.clone(), config.window);
    let (messages, rejections) = gen
        .generate(&partners, &mut bank.for_stage(StageSlot::Messages))
        .unwrap();

    // 2024-12-25 is a Wednesday, so suppression is the only gate in play.
    assert_eq!(rejections.weekend, 0);
    assert_eq!(rejections.pre_holiday, 0);

    let kept_legit = messages.iter().filter(|m| !m.fraud_flag).count() as f64;
    let retained = kept_legit / (kept_legit + rejections.suppression as f64);
    assert!(
        (0.30..=0.70).contains(&retained),
        "retained fraction {retained:.3} outside [0.30, 0.70]"
    );
}

#[test]
fn ordinary_weekday_has_no_rejections() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 18), date(2024, 12, 18));
    config.messages.target_count = 5_000;
    let dataset = run("plain-wednesday", 9, config);
    assert_eq!(dataset.messages.len(), 5_000);
}

#[test]
fn weekend_gate_follows_industry_modifier() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 21), date(2024, 12, 21));
    assert!(is_weekend(config.window.start));
    config.partners.industries = vec!["banking".into()];
    config.messages.target_count = 20_000;
    let dataset = run("weekend-banking", 12, config);

    let kept = dataset.messages.len() as f64 / 20_000.0;
    assert!((0.31..=0.39).contains(&kept), "banking weekend retention {kept:.3}, expected ~0.35");
}

#[test]
fn statuses_follow_configured_weights() {
    let dataset = run("status-mix", 21, GeneratorConfig::default());
    let n = dataset.messages.len() as f64;
    let share = |label: &str| dataset.messages.iter().filter(|m| m.status == label).count() as f64 / n;

    assert!((share("delivered") - 0.90).abs() < 0.01);
    assert!((share("failed") - 0.07).abs() < 0.01);
    assert!((share("blocked") - 0.03).abs() < 0.01);
}

#[test]
fn working_hours_dominate_the_night() {
    let dataset = run("hour-shape", 4, GeneratorConfig::default_test());
    let in_hours = |lo: u32, hi: u32| {
        dataset
            .messages
            .iter()
            .filter(|m| (lo..=hi).contains(&m.timestamp.hour()))
            .count()
    };
    assert!(in_hours(9, 17) > 10 * in_hours(0, 5));
}

#[test]
fn holiday_probability_replaces_base_even_at_zero() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 24), date(2024, 12, 24));
    config.messages.target_count = 5_000;
    config.messages.base_fraud_probability = NormalParams::new(1.0, 0.0);
    config.messages.holiday_fraud_probability = NormalParams::new(0.0, 0.0);
    let dataset = run("holiday-zero", 42, config);

    assert!(!dataset.messages.is_empty());
    assert_eq!(dataset.fraud_count(), 0);
    assert!(dataset.anomalies.is_empty());
}

#[test]
fn base_probability_applies_off_holiday() {
    let mut config = GeneratorConfig::default();
    config.window = DateWindow::new(date(2024, 12, 18), date(2024, 12, 18));
    config.messages.target_count = 2_000;
    config.messages.base_fraud_probability = NormalParams::new(1.0, 0.0);
    config.messages.holiday_fraud_probability = NormalParams::new(0.0, 0.0);
    let dataset = run("regular-certain", 42, config);

    assert_eq!(dataset.fraud_count(), dataset.messages.len());
}

#[test]
fn every_candidate_is_emitted_or_counted_as_rejected() {
    let config = GeneratorConfig::default_test();
    let bank = RngBank::new(77);
    let partners = PartnerGenerator::new(config.partners.clone(), config.window)
        .generate(&mut bank.for_stage(StageSlot::Partners));
    let (messages, rejections) = MessageGenerator::new(config.messages.clone(), config.window)
        .generate(&partners, &mut bank.for_stage(StageSlot::Messages))
        .unwrap();

    assert!(rejections.total() > 0);
    assert_eq!(messages.len() + rejections.total(), config.messages.target_count);
}
