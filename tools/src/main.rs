//! msgsim: headless dataset generator.
//!
//! Usage:
//!   msgsim generate --seed 42 --out ./data
//!   msgsim generate --seed 42 --events 20000 --partners 25 --db run.db
//!   msgsim generate --seed 42 --db run.db --run-id baseline
//!   msgsim generate --config scenario.json --start 2024-12-01 --end 2024-12-31
//!   msgsim trends --out ./data

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use msgsim_core::{
    analysis::{self, Observation, Trends},
    config::GeneratorConfig,
    dataset::Dataset,
    engine::DatasetEngine,
    event::GenEvent,
    store::DatasetStore,
    table::{self, MESSAGES_FILE},
};
use std::env;
use std::path::Path;

const TRENDS_FILE: &str = "trends.json";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args
        .get(1)
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .unwrap_or("generate");
    let out_dir = string_arg(&args, "--out").unwrap_or("./data");

    match command {
        "generate" => generate(&args, out_dir),
        "trends" => trends(out_dir),
        other => bail!("unknown command '{other}' (expected 'generate' or 'trends')"),
    }
}

fn generate(args: &[String], out_dir: &str) -> Result<()> {
    let seed = typed_arg::<u64>(args, "--seed")?.unwrap_or(42);

    let mut config = match string_arg(args, "--config") {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(n) = typed_arg::<usize>(args, "--events")? {
        config.messages.target_count = n;
    }
    if let Some(n) = typed_arg::<usize>(args, "--partners")? {
        config.partners.count = n;
    }
    if let Some(d) = date_arg(args, "--start")? {
        config.window.start = d;
    }
    if let Some(d) = date_arg(args, "--end")? {
        config.window.end = d;
    }

    println!("msgsim: dataset generator");
    println!("  seed:      {seed}");
    println!("  window:    {} .. {}", config.window.start, config.window.end);
    println!("  events:    {}", config.messages.target_count);
    println!("  partners:  {}", config.partners.count);
    println!("  out:       {out_dir}");
    println!();

    let run_id = match string_arg(args, "--run-id") {
        Some(id) => id.to_string(),
        None => format!("run-{seed}-{}", Utc::now().format("%Y%m%dT%H%M%S%3f")),
    };
    let mut engine = DatasetEngine::build(run_id.clone(), seed, config)?;

    if let Some(db) = string_arg(args, "--db") {
        let store = DatasetStore::open(db)?;
        store.migrate()?;
        engine.attach_store(store);
        println!("  db:        {db}");
    }

    let dataset = engine.run()?;
    let out = Path::new(out_dir);
    table::write_dataset(out, &dataset)?;

    let observations: Vec<Observation> = dataset.messages.iter().map(Observation::from).collect();
    let trends = analysis::analyze(&observations);
    write_trends(out, &trends)?;

    print_summary(&engine, &dataset, &run_id)?;
    Ok(())
}

fn trends(out_dir: &str) -> Result<()> {
    let out = Path::new(out_dir);
    let messages = out.join(MESSAGES_FILE);
    let observations = table::read_observations(&messages)
        .with_context(|| format!("reading {}", messages.display()))?;
    let trends = analysis::analyze(&observations);
    write_trends(out, &trends)?;

    println!("=== TRENDS ===");
    println!("  messages read:  {}", observations.len());
    println!("  days covered:   {}", trends.daily.len());
    if let Some(peak) = trends.daily.iter().max_by_key(|d| d.total_messages) {
        println!("  busiest day:    {} ({} messages)", peak.date, peak.total_messages);
    }
    if let Some(worst) = trends
        .daily
        .iter()
        .max_by(|a, b| a.fraud_rate.total_cmp(&b.fraud_rate))
    {
        println!(
            "  top fraud rate: {} ({:.2}%)",
            worst.date,
            worst.fraud_rate * 100.0
        );
    }
    println!("  written:        {}", out.join(TRENDS_FILE).display());
    Ok(())
}

fn write_trends(out: &Path, trends: &Trends) -> Result<()> {
    let path = out.join(TRENDS_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(trends)?)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("trends written to {}", path.display());
    Ok(())
}

fn print_summary(engine: &DatasetEngine, dataset: &Dataset, run_id: &str) -> Result<()> {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {run_id}");
    println!("  partners:         {}", dataset.partners.len());
    println!("  messages:         {}", dataset.messages.len());
    println!("  fraud-flagged:    {}", dataset.fraud_count());
    println!("  routing rows:     {}", dataset.routing.len());
    println!("  anomalies:        {}", dataset.anomalies.len());
    println!("  blocked entities: {}", dataset.blocked_entities.len());

    for event in engine.decoded_events()? {
        if let GenEvent::MessagesGenerated {
            candidates,
            emitted,
            rejections,
            ..
        } = event
        {
            println!();
            println!("=== REJECTION SAMPLING ===");
            println!("  candidates:   {candidates}");
            println!("  emitted:      {emitted}");
            println!("  pre-holiday:  {}", rejections.pre_holiday);
            println!("  weekend:      {}", rejections.weekend);
            println!("  suppression:  {}", rejections.suppression);
            println!("  rejected:     {}", rejections.total());
        }
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// A present-yet-unparseable value is an error, never a silent fallback.
fn typed_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>> {
    match string_arg(args, flag) {
        Some(raw) => match raw.parse() {
            Ok(v) => Ok(Some(v)),
            Err(_) => bail!("invalid value for {flag}: '{raw}'"),
        },
        None => Ok(None),
    }
}

fn date_arg(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    string_arg(args, flag)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("invalid date for {flag}: '{raw}'"))
        })
        .transpose()
}
