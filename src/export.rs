//! Export scalars from an event log directory as CSV or JSON.
//!
//! Runs entirely against local files; the store is never touched.

use std::path::Path;

use anyhow::{bail, Result};

use crate::event_log::{EventLog, ExportMode};

pub fn run_export(
    logdir: &Path,
    format: &str,
    out: &Path,
    suffixes: &[String],
    mode: &str,
) -> Result<()> {
    let log = EventLog::open(logdir)?;

    match format {
        "csv" => {
            // CSV rows carry values only; the unpacked shape has no flat
            // row form.
            if mode != "strip" {
                bail!("CSV export supports strip mode only");
            }
            log.export_csv(out, suffixes)?;
        }
        "json" => {
            let mode = parse_mode(mode)?;
            log.export_json(out, suffixes, mode)?;
        }
        "packed" => {
            log.export_packed(out)?;
        }
        other => bail!("Unknown export format: '{}'. Available: csv, json", other),
    }

    let exported = log.values(suffixes).len();
    println!("export {}", format);
    println!("  scalars: {}", exported);
    println!("  wrote {}", out.display());
    println!("ok");

    Ok(())
}

fn parse_mode(mode: &str) -> Result<ExportMode> {
    match mode {
        "strip" => Ok(ExportMode::Strip),
        "unpack" => Ok(ExportMode::Unpack),
        other => bail!("Unknown export mode: '{}'. Must be strip or unpack.", other),
    }
}
