use anyhow::Result;
use mongodb::options::{ClientOptions, Credential, Tls, TlsOptions};
use mongodb::{Client, Database};

use crate::config::StoreConfig;

pub async fn connect(store: &StoreConfig) -> Result<Database> {
    let host_list = store
        .hosts
        .iter()
        .map(|host| {
            if host.contains(':') {
                host.clone()
            } else {
                format!("{}:{}", host, store.port)
            }
        })
        .collect::<Vec<_>>()
        .join(",");

    let mut options = ClientOptions::parse(format!("mongodb://{}/", host_list)).await?;
    options.credential = Some(
        Credential::builder()
            .username(store.username.clone())
            .password(store.password.clone())
            .source(store.database.clone())
            .build(),
    );
    options.repl_set_name = Some(store.replica_set.clone());
    if store.tls {
        let tls_options = TlsOptions::builder()
            .ca_file_path(store.tls_ca_file.clone())
            .build();
        options.tls = Some(Tls::Enabled(tls_options));
    }

    let client = Client::with_options(options)?;
    Ok(client.database(&store.database))
}
