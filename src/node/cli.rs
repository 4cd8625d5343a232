use crate::gateway::GatewayServer;
use crate::node::config::{DaemonConfig, GatewaySettings};
use crate::node::ServiceHandle;
use crate::rpc::HttpCoinRpc;
use crate::utils::init_logging;
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// HTTP fee-estimation gateway for a NuBits daemon.
#[derive(Parser, Debug)]
#[clap(name = "nugetfee", version)]
pub struct Cli {
    /// Gateway settings file (TOML)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// HTTP listen address (host:port)
    #[clap(long)]
    pub listen: Option<String>,

    /// Path to the daemon conf file holding rpcuser/rpcpassword [default: ~/.nu/nu.conf]
    #[clap(long)]
    pub conf: Option<PathBuf>,

    /// Daemon RPC timeout in seconds
    #[clap(long)]
    pub rpc_timeout: Option<u64>,

    /// Log filter used when RUST_LOG is unset
    #[clap(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// File settings (or defaults) with command-line flags applied on top.
    pub fn settings(&self) -> Result<GatewaySettings> {
        let mut settings = match &self.config {
            Some(path) => GatewaySettings::load(path)
                .with_context(|| format!("reading gateway settings {}", path.display()))?,
            None => GatewaySettings::default(),
        };
        if let Some(listen) = &self.listen {
            settings.listen = listen.clone();
        }
        if let Some(conf) = &self.conf {
            settings.daemon_conf = Some(conf.clone());
        }
        if let Some(secs) = self.rpc_timeout {
            settings.rpc_timeout_secs = secs;
        }
        Ok(settings)
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let settings = cli.settings()?;
    let listen: SocketAddr = settings
        .listen
        .parse()
        .with_context(|| format!("invalid listen address {}", settings.listen))?;
    let daemon = DaemonConfig::load(settings.daemon_conf_path(), settings.rpc_timeout())?;
    let rpc = Arc::new(HttpCoinRpc::new(&daemon)?);
    info!("daemon RPC endpoint {}", rpc.url());

    let mut svc = ServiceHandle::new();
    let server = GatewayServer::new(listen, rpc);
    let (_, task) = server.start(svc.shutdown_signal())?;
    svc.attach(task);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down fee gateway...");
    svc.shutdown().await
}
