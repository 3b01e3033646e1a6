use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use drift_api::build_app;
use drift_cache::{GlobalCache, HubCache};
use drift_hub::{DiscoveryHub, EventBus, HubConfig, JobRegistry};
use drift_provider::{
    AwsConfig, AwsProvider, AzureConfig, AzureProvider, DigitalOceanConfig, DigitalOceanProvider, GcpConfig,
    GcpProvider, LocalProvider, ProviderRegistry,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "driftmgrd", about = "Cloud drift detection server", version)]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0", env = "DRIFTMGR_BIND")]
    bind: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "DRIFTMGR_PORT")]
    port: u16,

    /// Bearer token required by every route. Also accepted as a Basic-auth password.
    #[arg(long, env = "DRIFTMGR_AUTH_TOKEN")]
    auth_token: String,

    /// Overrides the resource cache snapshot location.
    #[arg(long, env = "DRIFTMGR_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// GCP project id to discover against, if the GCP provider is enabled.
    #[arg(long, env = "DRIFTMGR_GCP_PROJECT")]
    gcp_project: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();
    let now = Utc::now();

    let mut providers = ProviderRegistry::new();
    providers.register(drift_domain::Provider::Local, Arc::new(LocalProvider::new(5)));

    if let Ok(config) = AwsConfig::from_env("us-east-1") {
        providers.register(drift_domain::Provider::Aws, Arc::new(AwsProvider::new(config)));
        tracing::info!("AWS provider enabled");
    }
    if let Ok(config) = AzureConfig::from_env() {
        providers.register(drift_domain::Provider::Azure, Arc::new(AzureProvider::new(config)));
        tracing::info!("Azure provider enabled");
    }
    if let Some(project_id) = args.gcp_project.clone() {
        let config = GcpConfig::new(project_id);
        match GcpProvider::from_env(config).await {
            Ok(provider) => {
                providers.register(drift_domain::Provider::Gcp, Arc::new(provider));
                tracing::info!("GCP provider enabled");
            }
            Err(e) => tracing::warn!(error = %e, "GCP provider requested but credentials unavailable"),
        }
    }
    if let Ok(config) = DigitalOceanConfig::from_env() {
        providers.register(drift_domain::Provider::DigitalOcean, Arc::new(DigitalOceanProvider::new(config)));
        tracing::info!("DigitalOcean provider enabled");
    }

    let cache_path = args.cache_path.unwrap_or_else(default_cache_path);
    let hub_cache = HubCache::new(cache_path.clone(), 86_400, now);
    let hub = Arc::new(DiscoveryHub::new(
        Arc::new(providers),
        hub_cache,
        GlobalCache::new(),
        JobRegistry::new(),
        EventBus::new(),
        HubConfig::default(),
    ));

    hub.spawn_job_cleanup(std::time::Duration::from_secs(300), chrono::Duration::hours(24));

    let addr = format!("{}:{}", args.bind, args.port);
    tracing::info!(addr = %addr, cache_path = %cache_path.display(), "starting driftmgrd");

    let app = build_app(hub, Arc::new(args.auth_token));
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// `<home>/.driftmgr/resource_cache.json`, falling back to the OS temp dir
/// when the home directory cannot be resolved.
fn default_cache_path() -> PathBuf {
    let base = std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| std::env::temp_dir());
    base.join(".driftmgr").join("resource_cache.json")
}
