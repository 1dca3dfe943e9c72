use anyhow::Result;
use bson::doc;

use crate::config::Config;
use crate::db;
use crate::object_store::ObjectStoreClient;

pub async fn run_status(config: &Config) -> Result<()> {
    // Document store: connecting is lazy, so ping to force a round trip.
    let store_status = match db::connect(&config.store).await {
        Ok(database) => match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => ("OK", true),
            Err(_) => ("UNREACHABLE (ping failed)", false),
        },
        Err(_) => ("UNREACHABLE (bad options)", false),
    };

    let client = ObjectStoreClient::new(&config.object_store);
    let object_status = match client.healthcheck().await {
        Ok(_) => ("OK", true),
        Err(_) => ("UNREACHABLE", false),
    };

    println!("{:<16} {:<28} HEALTHY", "COLLABORATOR", "STATUS");
    println!("{:<16} {:<28} {}", "document-store", store_status.0, store_status.1);
    println!("{:<16} {:<28} {}", "object-store", object_status.0, object_status.1);

    Ok(())
}
