//! Trend series over a generated messages table.

use msgsim_core::{
    analysis::{analyze, Observation},
    config::GeneratorConfig,
    engine::DatasetEngine,
};

fn trends_for(seed: u64) -> (msgsim_core::analysis::Trends, usize, usize) {
    let mut engine = DatasetEngine::build(format!("trends-{seed}"), seed, GeneratorConfig::default_test()).unwrap();
    let dataset = engine.run().unwrap();
    let observations: Vec<Observation> = dataset.messages.iter().map(Observation::from).collect();
    (analyze(&observations), dataset.messages.len(), dataset.fraud_count())
}

#[test]
fn every_series_accounts_for_every_message() {
    let (t, total, fraud) = trends_for(42);

    let daily: u64 = t.daily.iter().map(|d| d.total_messages).sum();
    let daily_fraud: u64 = t.daily.iter().map(|d| d.fraud_messages).sum();
    assert_eq!(daily as usize, total);
    assert_eq!(daily_fraud as usize, fraud);

    assert_eq!(t.hourly_volume.iter().sum::<u64>() as usize, total);
    assert_eq!(t.hourly_fraud.iter().sum::<u64>() as usize, fraud);
    assert_eq!(t.hourly_over_time.iter().map(|p| p.messages).sum::<u64>() as usize, total);

    for hour in 0..24 {
        assert_eq!(t.weekday_hourly[hour] + t.weekend_hourly[hour], t.hourly_volume[hour]);
        let per_day: u64 = t.by_weekday.iter().map(|w| w.hourly[hour]).sum();
        assert_eq!(per_day, t.hourly_volume[hour]);
    }
}

#[test]
fn daily_series_covers_the_window_in_order() {
    let (t, _, _) = trends_for(9);
    let config = GeneratorConfig::default_test();

    assert_eq!(t.daily.len() as i64, config.window.num_days());
    assert!(t.daily.windows(2).all(|w| w[0].date < w[1].date));
    assert!(t.daily[0].volume_trend.is_none());
    assert!(t.daily[1].volume_trend.is_none());
    assert!(t.daily[2].volume_trend.is_some());
    assert_eq!(t.holiday_markers.len(), 4);
}

#[test]
fn weekdays_listed_monday_first() {
    let (t, _, _) = trends_for(1);
    let names: Vec<&str> = t.by_weekday.iter().map(|w| w.weekday.as_str()).collect();
    assert_eq!(
        names,
        vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
    );
}

#[test]
fn trends_serialize_to_json() {
    let (t, _, _) = trends_for(2);
    let json = serde_json::to_value(&t).unwrap();
    assert_eq!(json["hourly_volume"].as_array().unwrap().len(), 24);
    assert!(json["daily"][0]["date"].is_string());
}
