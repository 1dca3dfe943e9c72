//! Push pipeline orchestration.
//!
//! Coordinates the full logging flow: event log → scalar bundle →
//! workspace scan → document assembly → store. All inputs are read
//! fresh; nothing is cached between pushes.

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::document;
use crate::event_log::EventLog;
use crate::store::Connector;

#[allow(clippy::too_many_arguments)]
pub async fn run_push(
    config: &Config,
    name: &str,
    params: &Path,
    logdir: &Path,
    git_dir: &Path,
    requirements: Option<&Path>,
    suffixes: &[String],
    s3: Option<String>,
) -> Result<()> {
    let config_doc = document::load_config_document(params)?;

    let log = EventLog::open(logdir)?;
    let metrics = log.series(suffixes);

    let connector = Connector::connect(config).await?;
    let outcome = connector
        .push_experiment(name, config_doc, &metrics, git_dir, requirements, s3)
        .await?;

    println!("push {}", name);
    println!("  run id: {}", outcome.run_id);
    println!("  metric documents: {}", outcome.metric_ids.len());
    println!("ok");

    Ok(())
}
