use std::io::{self, Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arbor_store::{FsChunkStore, StoreResult};
use arbor_value::{
    from_json, raw_encode, value_stats, write_encoded_value, write_value_stats, ValueStore,
};
use colored::Colorize;
use tracing::{debug, info};

use crate::cli::*;
use crate::config::ArborConfig;
use crate::resolve::parse_object;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ArborConfig::load(cli.config.as_deref())?;
    let stdout = io::stdout();
    let stderr = io::stderr();
    match cli.command {
        Command::Show(args) => cmd_show(
            &config,
            cli.store.as_deref(),
            cli.format,
            &args,
            &mut stdout.lock(),
            &mut stderr.lock(),
        ),
        Command::Put(args) => {
            let input = read_input(args.file.as_deref())?;
            cmd_put(&config, cli.store.as_deref(), cli.format, &input, &mut stdout.lock())
        }
    }
}

/// Open the store at `dir`, creating it when missing.
fn open_store(config: &ArborConfig, dir: &Path) -> anyhow::Result<ValueStore> {
    value_store(config, dir, FsChunkStore::open(dir))
}

/// Open the store at `dir` for reading; a missing directory is an error.
fn open_existing_store(config: &ArborConfig, dir: &Path) -> anyhow::Result<ValueStore> {
    value_store(config, dir, FsChunkStore::open_existing(dir))
}

fn value_store(
    config: &ArborConfig,
    dir: &Path,
    opened: StoreResult<FsChunkStore>,
) -> anyhow::Result<ValueStore> {
    let chunks = opened.with_context(|| format!("opening store {}", dir.display()))?;
    debug!(store = %dir.display(), "store opened");
    Ok(ValueStore::with_config(Arc::new(chunks), config.value_store.clone()))
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("reading stdin")?;
            Ok(text)
        }
    }
}

fn cmd_show(
    config: &ArborConfig,
    store_flag: Option<&Path>,
    format: OutputFormat,
    args: &ShowArgs,
    out: &mut impl Write,
    err: &mut impl Write,
) -> anyhow::Result<()> {
    let object = parse_object(&args.object)?;
    let dir = match &object.store {
        Some(dir) => dir.clone(),
        None => config.store_dir(store_flag),
    };
    let vs = open_existing_store(config, &dir)?;
    let Some(value) = vs.find_hash(&object.hash)? else {
        writeln!(err, "Object not found: {}", args.object)?;
        return Ok(());
    };
    if args.raw && args.stats {
        writeln!(err, "--raw and --stats are mutually exclusive")?;
        return Ok(());
    }

    if args.raw {
        out.write_all(&raw_encode(&value))?;
    } else if args.stats {
        let stats = value_stats(&value, &vs)?;
        match format {
            OutputFormat::Text => write_value_stats(out, &stats)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &stats)?;
                writeln!(out)?;
            }
        }
    } else {
        write_encoded_value(out, &value, &vs)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_put(
    config: &ArborConfig,
    store_flag: Option<&Path>,
    format: OutputFormat,
    input: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let doc: serde_json::Value = serde_json::from_str(input).context("parsing JSON input")?;
    let dir = config.store_dir(store_flag);
    let vs = open_store(config, &dir)?;
    let value = from_json(&vs, &doc)?;
    let root = vs.write_value(&value)?;
    info!(root = %root, kind = %value.kind(), "value stored");
    match format {
        OutputFormat::Text => writeln!(out, "{} {}", "✓".green(), root.to_string().yellow())?,
        OutputFormat::Json => {
            let report = serde_json::json!({
                "hash": root.target_hash().to_hex(),
                "height": root.height(),
                "type": root.target_type().to_string(),
            });
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
