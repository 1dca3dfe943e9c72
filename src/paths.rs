//! Print the stored object paths of selected runs.
//!
//! The comma-joined output plugs straight into a multi-run visualization
//! spec (`tensorboard --logdir_spec=...`).

use anyhow::Result;
use bson::doc;

use crate::config::Config;
use crate::store::Connector;

pub async fn run_paths(config: &Config, name: Option<String>) -> Result<()> {
    let connector = Connector::connect(config).await?;

    let filter = match name {
        Some(name) => doc! { "experiment.name": name },
        None => doc! {},
    };

    println!("{}", connector.gather_paths(filter).await?);
    Ok(())
}
