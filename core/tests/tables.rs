//! CSV output and re-reading.

use msgsim_core::{
    config::GeneratorConfig,
    engine::DatasetEngine,
    error::GenError,
    table::{self, ANOMALIES_FILE, BLOCKED_ENTITIES_FILE, MESSAGES_FILE, PARTNERS_FILE, ROUTING_FILE},
};
use std::fs;

fn header_and_rows(path: &std::path::Path) -> (String, usize) {
    let content = fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap().to_string();
    (header, lines.count())
}

#[test]
fn writes_five_tables_with_headers() {
    let mut engine = DatasetEngine::build("csv-out".into(), 42, GeneratorConfig::default_test()).unwrap();
    let dataset = engine.run().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("data");
    table::write_dataset(&out, &dataset).unwrap();

    let (h, n) = header_and_rows(&out.join(MESSAGES_FILE));
    assert_eq!(
        h,
        "message_id,timestamp,partner_id,channel,status,fraud_flag,anomaly_score,message_content"
    );
    assert_eq!(n, dataset.messages.len());

    let (h, n) = header_and_rows(&out.join(PARTNERS_FILE));
    assert_eq!(h, "partner_id,name,region,industry,onboarding_date,is_active");
    assert_eq!(n, dataset.partners.len());

    let (h, n) = header_and_rows(&out.join(ROUTING_FILE));
    assert_eq!(h, "message_id,route_id,latency_ms,delivery_status,hop_count");
    assert_eq!(n, dataset.routing.len());

    let (h, n) = header_and_rows(&out.join(ANOMALIES_FILE));
    assert_eq!(h, "message_id,anomaly_type,anomaly_score,reason,action_taken");
    assert_eq!(n, dataset.anomalies.len());

    let (h, n) = header_and_rows(&out.join(BLOCKED_ENTITIES_FILE));
    assert_eq!(h, "entity_type,entity_id,reason,block_time,unblocked_timestamp");
    assert_eq!(n, dataset.blocked_entities.len());
}

#[test]
fn blocked_rows_leave_unblock_column_empty() {
    let mut engine = DatasetEngine::build("csv-blocked".into(), 5, GeneratorConfig::default_test()).unwrap();
    let dataset = engine.run().unwrap();
    let dir = tempfile::tempdir().unwrap();
    table::write_dataset(dir.path(), &dataset).unwrap();

    let content = fs::read_to_string(dir.path().join(BLOCKED_ENTITIES_FILE)).unwrap();
    for line in content.lines().skip(1) {
        assert!(line.ends_with(','), "unblocked_timestamp should be empty: {line}");
    }
}

#[test]
fn observations_round_trip_through_messages_csv() {
    let mut engine = DatasetEngine::build("csv-read".into(), 8, GeneratorConfig::default_test()).unwrap();
    let dataset = engine.run().unwrap();
    let dir = tempfile::tempdir().unwrap();
    table::write_dataset(dir.path(), &dataset).unwrap();

    let observations = table::read_observations(&dir.path().join(MESSAGES_FILE)).unwrap();
    assert_eq!(observations.len(), dataset.messages.len());
    for (obs, m) in observations.iter().zip(dataset.messages.iter()) {
        assert_eq!(obs.message_id, m.message_id);
        assert_eq!(obs.timestamp, m.timestamp);
        assert_eq!(obs.fraud_flag, m.fraud_flag);
    }
}

#[test]
fn malformed_messages_csv_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(MESSAGES_FILE);
    fs::write(
        &path,
        "message_id,timestamp,fraud_flag\nm-1,2024-12-24 10:00:00,true\nm-2,not-a-time,false\n",
    )
    .unwrap();

    match table::read_observations(&path) {
        Err(GenError::Table { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected Table error, got {other:?}"),
    }
}

#[test]
fn missing_column_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(MESSAGES_FILE);
    fs::write(&path, "message_id,timestamp\nm-1,2024-12-24 10:00:00\n").unwrap();
    assert!(matches!(
        table::read_observations(&path),
        Err(GenError::Table { line: 1, .. })
    ));
}
