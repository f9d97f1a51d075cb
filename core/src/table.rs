//! CSV tables: one file per dataset table, header row of column names.
//!
//! Fields are quoted only when they contain a comma, quote or newline.

use crate::{
    analysis::Observation,
    dataset::{AnomalyRecord, BlockedEntity, Dataset, MessageEvent, PartnerRecord, RoutingRecord},
    error::{GenError, GenResult},
};
use chrono::NaiveDateTime;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MESSAGES_FILE: &str = "messages.csv";
pub const PARTNERS_FILE: &str = "partners.csv";
pub const ROUTING_FILE: &str = "routing.csv";
pub const ANOMALIES_FILE: &str = "anomalies.csv";
pub const BLOCKED_ENTITIES_FILE: &str = "blocked_entities.csv";

/// A record that can be written as one CSV row.
pub trait CsvRow {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

impl CsvRow for PartnerRecord {
    const HEADER: &'static [&'static str] = &[
        "partner_id",
        "name",
        "region",
        "industry",
        "onboarding_date",
        "is_active",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.partner_id.clone(),
            self.name.clone(),
            self.region.clone(),
            self.industry.clone(),
            self.onboarding_date.format(DATE_FORMAT).to_string(),
            self.is_active.to_string(),
        ]
    }
}

impl CsvRow for MessageEvent {
    const HEADER: &'static [&'static str] = &[
        "message_id",
        "timestamp",
        "partner_id",
        "channel",
        "status",
        "fraud_flag",
        "anomaly_score",
        "message_content",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.partner_id.clone(),
            self.channel.clone(),
            self.status.clone(),
            self.fraud_flag.to_string(),
            self.anomaly_score.to_string(),
            self.message_content.clone(),
        ]
    }
}

impl CsvRow for RoutingRecord {
    const HEADER: &'static [&'static str] = &[
        "message_id",
        "route_id",
        "latency_ms",
        "delivery_status",
        "hop_count",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.route_id.clone(),
            self.latency_ms.to_string(),
            self.delivery_status.as_str().to_string(),
            self.hop_count.to_string(),
        ]
    }
}

impl CsvRow for AnomalyRecord {
    const HEADER: &'static [&'static str] = &[
        "message_id",
        "anomaly_type",
        "anomaly_score",
        "reason",
        "action_taken",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.message_id.clone(),
            self.anomaly_type.clone(),
            self.anomaly_score.to_string(),
            self.reason.clone(),
            self.action_taken.clone(),
        ]
    }
}

impl CsvRow for BlockedEntity {
    const HEADER: &'static [&'static str] = &[
        "entity_type",
        "entity_id",
        "reason",
        "block_time",
        "unblocked_timestamp",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.entity_type.as_str().to_string(),
            self.entity_id.clone(),
            self.reason.clone(),
            self.block_time.format(TIMESTAMP_FORMAT).to_string(),
            self.unblocked_timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        ]
    }
}

pub fn write_table<R: CsvRow>(path: &Path, rows: &[R]) -> GenResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", R::HEADER.join(","))?;
    for row in rows {
        let line: Vec<String> = row.fields().into_iter().map(escape).collect();
        writeln!(writer, "{}", line.join(","))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write all five tables into `dir`, creating it if needed.
pub fn write_dataset(dir: &Path, dataset: &Dataset) -> GenResult<()> {
    std::fs::create_dir_all(dir)?;
    write_table(&dir.join(MESSAGES_FILE), &dataset.messages)?;
    write_table(&dir.join(PARTNERS_FILE), &dataset.partners)?;
    write_table(&dir.join(ROUTING_FILE), &dataset.routing)?;
    write_table(&dir.join(ANOMALIES_FILE), &dataset.anomalies)?;
    write_table(&dir.join(BLOCKED_ENTITIES_FILE), &dataset.blocked_entities)?;
    log::info!("wrote 5 tables to {}", dir.display());
    Ok(())
}

fn escape(field: String) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field
    }
}

/// Split one CSV line into fields, honouring quoted fields.
pub fn split_record(line: &str) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            ('"', true) => in_quotes = false,
            ('"', false) if current.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut current)),
            (c, _) => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".into());
    }
    fields.push(current);
    Ok(fields)
}

/// Re-read the columns trend analysis needs from a messages table.
/// Columns are located by header name, so extra or reordered columns are fine.
pub fn read_observations(path: &Path) -> GenResult<Vec<Observation>> {
    let table = path.display().to_string();
    let malformed = |line: usize, reason: String| GenError::Table {
        table: table.clone(),
        line,
        reason,
    };

    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(h) => split_record(&h?).map_err(|r| malformed(1, r))?,
        None => return Err(malformed(1, "missing header row".into())),
    };
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| malformed(1, format!("missing column '{name}'")))
    };
    let id_col = column("message_id")?;
    let ts_col = column("timestamp")?;
    let fraud_col = column("fraud_flag")?;

    let mut observations = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let fields = split_record(&line).map_err(|r| malformed(line_no, r))?;
        let field = |col: usize| {
            fields
                .get(col)
                .ok_or_else(|| malformed(line_no, format!("expected at least {} fields", col + 1)))
        };
        let timestamp = NaiveDateTime::parse_from_str(field(ts_col)?, TIMESTAMP_FORMAT)
            .map_err(|e| malformed(line_no, format!("bad timestamp: {e}")))?;
        let fraud_flag = parse_bool(field(fraud_col)?)
            .ok_or_else(|| malformed(line_no, "bad fraud_flag".into()))?;
        observations.push(Observation {
            message_id: field(id_col)?.clone(),
            timestamp,
            fraud_flag,
        });
    }
    Ok(observations)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "1" => Some(true),
        "false" | "False" | "0" => Some(false),
        _ => None,
    }
}
