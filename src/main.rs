//! User Ingest CLI
//!
//! Runs the ingestion pipeline against an uploaded CSV and prints the
//! resulting report as JSON.
//!
//! # Usage
//!
//! ```bash
//! user-ingest [OPTIONS] <object-key>
//! user-ingest [OPTIONS] --stage <local.csv>
//! user-ingest --stats [--db <path>]
//!
//! OPTIONS:
//!     --db <path>        SQLite database path        (default: users.db)
//!     --blobs <dir>      blob store root directory   (default: blobs)
//!     --policy <p>       merge | ignore              (default: merge)
//!     --strict           strict field coercion       (default: lenient)
//!     --webhook <url>    notification sink URL       (default: none)
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use std::env;
use std::fs;
use std::process;
use user_ingest::{
    ConflictPolicy, DirBlobStore, IngestConfig, IngestError, IngestionPipeline, Result, Strictness,
    UserStore,
};

/// How many recent users `--stats` lists.
const STATS_RECENT_LIMIT: usize = 10;

fn main() {
    env_logger::init();

    match run() {
        Ok(succeeded) => {
            if !succeeded {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

struct CliArgs {
    config: IngestConfig,
    policy: ConflictPolicy,
    strictness: Strictness,
    stage: Option<String>,
    stats: bool,
    object_key: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs {
        config: IngestConfig::default(),
        policy: ConflictPolicy::Merge,
        strictness: Strictness::Lenient,
        stage: None,
        stats: false,
        object_key: None,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--db" => parsed.config.db_path = take_value(&mut iter, "--db")?.into(),
            "--blobs" => parsed.config.blob_root = take_value(&mut iter, "--blobs")?.into(),
            "--webhook" => parsed.config.webhook_url = Some(take_value(&mut iter, "--webhook")?),
            "--policy" => {
                let value = take_value(&mut iter, "--policy")?;
                parsed.policy = value.parse().map_err(IngestError::InvalidArgument)?;
            }
            "--strict" => parsed.strictness = Strictness::Strict,
            "--stage" => parsed.stage = Some(take_value(&mut iter, "--stage")?),
            "--stats" => parsed.stats = true,
            other if other.starts_with("--") => {
                return Err(IngestError::InvalidArgument(format!(
                    "unknown option '{}'",
                    other
                )));
            }
            key => parsed.object_key = Some(key.to_string()),
        }
    }

    Ok(parsed)
}

fn take_value(iter: &mut std::slice::Iter<'_, String>, option: &str) -> Result<String> {
    iter.next().cloned().ok_or_else(|| {
        IngestError::InvalidArgument(format!("option '{}' requires a value", option))
    })
}

/// Returns whether the invocation succeeded, after printing its JSON result.
fn run() -> Result<bool> {
    let args: Vec<String> = env::args().skip(1).collect();
    let parsed = parse_args(&args)?;

    if parsed.stats {
        let store = UserStore::open(&parsed.config.db_path)?;
        let stats = store.stats(STATS_RECENT_LIMIT)?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        store.close()?;
        return Ok(true);
    }

    let key = match &parsed.stage {
        Some(local_path) => {
            if !local_path.ends_with(".csv") {
                return Err(IngestError::InvalidArgument(format!(
                    "'{}' is not a .csv file",
                    local_path
                )));
            }
            let bytes = fs::read(local_path)?;
            let blobs = DirBlobStore::new(&parsed.config.blob_root);
            blobs.stage(local_path, &bytes)?
        }
        None => parsed.object_key.ok_or(IngestError::MissingArgument)?,
    };

    let mut pipeline = IngestionPipeline::from_config(&parsed.config)?;
    let report = pipeline.run(&key, parsed.policy, parsed.strictness);
    pipeline.close()?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.succeeded())
}
