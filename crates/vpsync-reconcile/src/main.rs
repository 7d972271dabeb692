//! CLI entry point for the vantage point reconciler.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use vpsync_reconcile::config::SyncSettings;
use vpsync_reconcile::sync::{run_sync, SyncOutcome};
use vpsync_registry::RegistryClient;
use vpsync_store::StoreConfig;

#[derive(Parser)]
#[command(name = "vpsync-reconcile")]
#[command(about = "Reconcile registry nodes into the vantage point store")]
struct Cli {
    /// Store username.
    #[arg(short = 'u', long)]
    store_user: String,

    /// Store password.
    #[arg(short = 'p', long)]
    store_password: String,

    /// Store host address.
    #[arg(short = 'a', long)]
    store_host: String,

    /// Store TCP port (not the per-node measurement port).
    #[arg(short = 'o', long)]
    store_port: u16,

    /// Override the target slice id from configuration.
    #[arg(long)]
    slice_id: Option<i64>,

    /// Config file prefix (default: vpsync).
    #[arg(short, long, default_value = "vpsync")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    require_registry_credentials(&settings)?;
    let slice_id = cli.slice_id.unwrap_or(settings.slice_id);

    let registry = RegistryClient::new(settings.registry.to_client_config())?;
    let store_config = StoreConfig::new(
        cli.store_user,
        cli.store_password,
        cli.store_host,
        cli.store_port,
    );

    // An auth rejection is an intentional no-op: exit clean either way.
    match run_sync(&registry, &store_config, slice_id).await? {
        SyncOutcome::Unauthorized | SyncOutcome::Completed { .. } => {}
    }
    Ok(())
}

fn load_settings(file_prefix: &str) -> anyhow::Result<SyncSettings> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("VPSYNC")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.try_deserialize::<SyncSettings>() {
        Ok(settings) => Ok(settings),
        Err(_) => Ok(SyncSettings::default()),
    }
}

fn require_registry_credentials(settings: &SyncSettings) -> anyhow::Result<()> {
    if settings.registry.username.is_empty() || settings.registry.password.is_empty() {
        anyhow::bail!(
            "Registry credentials required: set registry.username and registry.password \
             in vpsync.toml, or VPSYNC__REGISTRY__USERNAME / VPSYNC__REGISTRY__PASSWORD"
        );
    }
    Ok(())
}
