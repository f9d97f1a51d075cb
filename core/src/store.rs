//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; stages never execute SQL.

use crate::{
    dataset::Dataset,
    error::GenResult,
    event::EventLogEntry,
    table::{DATE_FORMAT, TIMESTAMP_FORMAT},
};
use rusqlite::{params, Connection};

pub struct DatasetStore {
    conn: Connection,
}

impl DatasetStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        // WAL is ignored for :memory: databases, so don't fail on it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_dataset.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn run_exists(&self, run_id: &str) -> GenResult<bool> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn run_seed(&self, run_id: &str) -> GenResult<u64> {
        let seed: i64 = self.conn.query_row(
            "SELECT seed FROM run WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(seed as u64)
    }

    /// Write the run row, its event log and every table of `dataset` in
    /// one transaction. A failure anywhere leaves no trace of the run.
    pub fn save_run(
        &self,
        run_id: &str,
        seed: u64,
        version: &str,
        events: &[EventLogEntry],
        dataset: &Dataset,
    ) -> GenResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO run (run_id, seed, version) VALUES (?1, ?2, ?3)",
            params![run_id, seed as i64, version],
        )?;
        insert_events(&tx, events)?;
        insert_tables(&tx, run_id, dataset)?;
        tx.commit()?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn events_for_run(&self, run_id: &str) -> GenResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, stage, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], |row| {
                Ok(EventLogEntry {
                    id: Some(row.get(0)?),
                    run_id: row.get(1)?,
                    seq: row.get::<_, i64>(2)? as u64,
                    stage: row.get(3)?,
                    event_type: row.get(4)?,
                    payload: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn partner_count(&self, run_id: &str) -> GenResult<i64> {
        self.count("SELECT COUNT(*) FROM partner WHERE run_id = ?1", run_id)
    }

    pub fn message_count(&self, run_id: &str) -> GenResult<i64> {
        self.count("SELECT COUNT(*) FROM message WHERE run_id = ?1", run_id)
    }

    pub fn fraud_message_count(&self, run_id: &str) -> GenResult<i64> {
        self.count(
            "SELECT COUNT(*) FROM message WHERE run_id = ?1 AND fraud_flag = 1",
            run_id,
        )
    }

    pub fn routing_count(&self, run_id: &str) -> GenResult<i64> {
        self.count("SELECT COUNT(*) FROM routing WHERE run_id = ?1", run_id)
    }

    pub fn anomaly_count(&self, run_id: &str) -> GenResult<i64> {
        self.count("SELECT COUNT(*) FROM anomaly WHERE run_id = ?1", run_id)
    }

    pub fn blocked_entity_count(&self, run_id: &str) -> GenResult<i64> {
        self.count("SELECT COUNT(*) FROM blocked_entity WHERE run_id = ?1", run_id)
    }

    /// Routing rows whose status disagrees with the parent message.
    pub fn routing_status_mismatches(&self, run_id: &str) -> GenResult<i64> {
        self.count(
            "SELECT COUNT(*) FROM routing r
             JOIN message m ON m.run_id = r.run_id AND m.message_id = r.message_id
             WHERE r.run_id = ?1
               AND (r.delivery_status = 'ok') <> (m.status = 'delivered')",
            run_id,
        )
    }

    /// Anomaly rows attached to messages that are not fraud-flagged.
    pub fn unflagged_anomaly_count(&self, run_id: &str) -> GenResult<i64> {
        self.count(
            "SELECT COUNT(*) FROM anomaly a
             JOIN message m ON m.run_id = a.run_id AND m.message_id = a.message_id
             WHERE a.run_id = ?1 AND m.fraud_flag = 0",
            run_id,
        )
    }

    fn count(&self, sql: &str, run_id: &str) -> GenResult<i64> {
        let n: i64 = self.conn.query_row(sql, params![run_id], |row| row.get(0))?;
        Ok(n)
    }
}

// ── Writers ────────────────────────────────────────────────────────

fn insert_events(conn: &Connection, events: &[EventLogEntry]) -> GenResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO event_log (run_id, seq, stage, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for e in events {
        stmt.execute(params![e.run_id, e.seq as i64, e.stage, e.event_type, e.payload])?;
    }
    Ok(())
}

fn insert_tables(conn: &Connection, run_id: &str, dataset: &Dataset) -> GenResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO partner (run_id, partner_id, name, region, industry, onboarding_date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;
    for p in &dataset.partners {
        stmt.execute(params![
            run_id,
            p.partner_id,
            p.name,
            p.region,
            p.industry,
            p.onboarding_date.format(DATE_FORMAT).to_string(),
            p.is_active,
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO message (run_id, message_id, timestamp, partner_id, channel, status,
                              fraud_flag, anomaly_score, message_content)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for m in &dataset.messages {
        stmt.execute(params![
            run_id,
            m.message_id,
            m.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            m.partner_id,
            m.channel,
            m.status,
            m.fraud_flag,
            m.anomaly_score,
            m.message_content,
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO routing (run_id, message_id, route_id, latency_ms, delivery_status, hop_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for r in &dataset.routing {
        stmt.execute(params![
            run_id,
            r.message_id,
            r.route_id,
            r.latency_ms,
            r.delivery_status.as_str(),
            r.hop_count,
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO anomaly (run_id, message_id, anomaly_type, anomaly_score, reason, action_taken)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for a in &dataset.anomalies {
        stmt.execute(params![
            run_id,
            a.message_id,
            a.anomaly_type,
            a.anomaly_score,
            a.reason,
            a.action_taken,
        ])?;
    }

    let mut stmt = conn.prepare(
        "INSERT INTO blocked_entity (run_id, entity_type, entity_id, reason, block_time, unblocked_timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for b in &dataset.blocked_entities {
        stmt.execute(params![
            run_id,
            b.entity_type.as_str(),
            b.entity_id,
            b.reason,
            b.block_time.format(TIMESTAMP_FORMAT).to_string(),
            b.unblocked_timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
        ])?;
    }
    Ok(())
}
