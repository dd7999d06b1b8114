//! `remotewire` command line client.
//!
//! Connects to a player, prints every event it publishes and disconnects
//! cleanly on Ctrl-C.

mod cli;

use clap::Parser;
use remotewire::{
    config::RemoteConfig,
    event::RemoteEvent,
    remote::Remote,
    session::{ConnectionSession, InMemorySessionStore, SessionStore},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();

    // The library never installs a subscriber; the binary owns logging.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = RemoteConfig::default().download_dir(&cli.download_dir);
    if let Some(dir) = &cli.library {
        config = config.library_dir(dir);
    }

    let mut session = ConnectionSession::new("cli", &cli.host, cli.port);
    if let Some(code) = cli.auth_code {
        session = session.with_auth_code(code);
    }

    let store = InMemorySessionStore::new();
    let (remote, mut events) = Remote::spawn(config);
    remote.connect(session)?;

    loop {
        tokio::select! {
            biased;

            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("interrupted, disconnecting");
                remote.disconnect()?;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                match &event {
                    RemoteEvent::TransportConnected { session } => store.record_connected(session.clone()),
                    RemoteEvent::Connected if cli.library.is_some() => remote.request_library()?,
                    RemoteEvent::RemoteFilesChanged { path, .. } => {
                        store.update_browse_path("cli", path);
                    }
                    _ => {}
                }
                println!("{event:?}");
                if matches!(event, RemoteEvent::Disconnected { .. }) {
                    break;
                }
            }
        }
    }

    remote.shutdown().await?;
    Ok(())
}
