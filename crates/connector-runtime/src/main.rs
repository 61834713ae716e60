//! `connector-runtime` entry point.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use connector_runtime::{commands, init_tracing, ClientRequest, ConnectorConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "connector-runtime")]
#[command(about = "Ledger connector server and proxy client", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the connector server
    Serve,
    /// Log in through the proxy and ping a business network
    Ping {
        #[command(flatten)]
        client: ClientArgs,
        /// Business network to bind the connection to
        #[arg(long)]
        network: String,
    },
    /// Install and start a business network archive through the proxy
    Deploy {
        #[command(flatten)]
        client: ClientArgs,
        /// Archive file
        #[arg(long)]
        archive: PathBuf,
    },
    /// Print the effective configuration as TOML
    PrintConfig,
}

#[derive(Args)]
struct ClientArgs {
    /// Connection profile name
    #[arg(long, default_value = "default")]
    profile: String,

    /// Connector type the server should use
    #[arg(long = "type", default_value = "web")]
    connector_type: String,

    #[arg(long, default_value = "admin")]
    user: String,

    #[arg(long, default_value = "adminpw")]
    secret: String,
}

impl ClientArgs {
    fn into_request(self, network: Option<String>) -> ClientRequest {
        ClientRequest {
            profile: self.profile,
            network,
            connector_type: self.connector_type,
            user: self.user,
            secret: self.secret,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConnectorConfig::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    match cli.command {
        Command::Serve => {
            info!(bind_addr = %config.server.bind_addr, "Starting connector server");
            commands::serve(&config).await
        }
        Command::Ping { client, network } => {
            let pong = commands::ping(&config, &client.into_request(Some(network))).await?;
            println!("{}", serde_json::to_string_pretty(&pong)?);
            Ok(())
        }
        Command::Deploy { client, archive } => {
            commands::deploy(&config, &client.into_request(None), &archive).await
        }
        Command::PrintConfig => {
            print!("{}", commands::print_config(&config)?);
            Ok(())
        }
    }
}
