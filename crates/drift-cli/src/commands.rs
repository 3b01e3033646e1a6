use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::Utc;
use drift_cache::{GlobalCache, HubCache};
use drift_domain::Provider as ProviderKind;
use drift_hub::{DiscoveryHub, DiscoveryRequest, EventBus, HubConfig, JobRegistry};
use drift_provider::{AwsConfig, AwsProvider, AzureConfig, AzureProvider, DigitalOceanConfig, DigitalOceanProvider, DiscoverOptions, LocalProvider, ProviderRegistry};

use crate::cli::{CacheCommand, GraphOutput, ModeArg, ProviderArg};
use crate::output;

// ── Discover ──────────────────────────────────────────────────────────────────

pub async fn discover(
    provider: ProviderArg,
    regions: Vec<String>,
    resource_types: Vec<String>,
    remote: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let provider: ProviderKind = provider.into();
    let request = DiscoveryRequest {
        provider,
        regions,
        options: DiscoverOptions { resource_types, ..DiscoverOptions::default() },
    };

    if let Some(url) = remote {
        let client = authed_client(&resolve_token(token)?);
        let base = url.trim_end_matches('/');
        let body = serde_json::json!({
            "provider": provider,
            "regions": request.regions,
            "resource_types": request.options.resource_types,
        });
        let job: serde_json::Value = client
            .post(format!("{}/discovery", base))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach server at {url}"))?
            .json()
            .await?;
        let job_id = job.get("job_id").and_then(|v| v.as_str()).unwrap_or("-");
        println!("Started discovery job {job_id} on {base}");
        return Ok(());
    }

    let hub = build_local_hub();
    let job_id = hub.start_discovery(request).await?;
    let job = poll_until_terminal(&hub, &job_id).await?;
    println!("Discovery {} ({} resources found)", job.status, job.resource_count);
    Ok(())
}

// ── Drift ─────────────────────────────────────────────────────────────────────

pub async fn drift(
    provider: ProviderArg,
    region: Option<String>,
    state_path: PathBuf,
    mode: ModeArg,
    remote: Option<String>,
    token: Option<String>,
) -> Result<()> {
    let provider: ProviderKind = provider.into();

    if let Some(url) = remote {
        let client = authed_client(&resolve_token(token)?);
        let base = url.trim_end_matches('/');
        let body = serde_json::json!({
            "provider": provider,
            "region": region,
            "state_path": state_path.display().to_string(),
            "mode": mode_to_str(mode),
        });
        let resp: serde_json::Value = client
            .post(format!("{}/drift/analyze", base))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach server at {url}"))?
            .json()
            .await?;
        let perspective: drift_domain::Perspective = serde_json::from_value(
            resp.get("perspective").cloned().context("response missing 'perspective'")?,
        )?;
        print!("{}", output::render_drift_text(&perspective));
        return Ok(());
    }

    let state_body = tokio::fs::read_to_string(&state_path)
        .await
        .with_context(|| format!("failed to read {}", state_path.display()))?;
    let hub = build_local_hub();
    let (_job_id, perspective) = hub.analyze(provider, region, state_body, mode.into()).await?;
    print!("{}", output::render_drift_text(&perspective));
    Ok(())
}

fn mode_to_str(mode: ModeArg) -> &'static str {
    match mode {
        ModeArg::Quick => "quick",
        ModeArg::Smart => "smart",
        ModeArg::Deep => "deep",
    }
}

// ── Graph ─────────────────────────────────────────────────────────────────────

pub async fn graph(output_format: GraphOutput, remote: Option<String>, token: Option<String>) -> Result<()> {
    if let Some(url) = remote {
        let client = authed_client(&resolve_token(token)?);
        let resp = client
            .get(format!("{}/graph", url.trim_end_matches('/')))
            .send()
            .await
            .with_context(|| format!("failed to reach server at {url}"))?;
        if resp.status() == reqwest::StatusCode::NO_CONTENT {
            println!("No graph available on {url}. Run `driftctl drift` first.");
            return Ok(());
        }
        let body: serde_json::Value = resp.json().await?;
        render_remote_graph(&body, output_format)?;
        return Ok(());
    }

    println!("No graph available in-process for this invocation. Run `driftctl drift` in the same process first, or pass --remote.");
    Ok(())
}

fn render_remote_graph(body: &serde_json::Value, output_format: GraphOutput) -> Result<()> {
    match output_format {
        GraphOutput::Json => println!("{}", serde_json::to_string_pretty(body)?),
        GraphOutput::Text | GraphOutput::Dot => {
            let nodes: Vec<drift_graph::ResourceNode> =
                serde_json::from_value(body.get("nodes").cloned().unwrap_or_default())?;
            let edges: Vec<drift_graph::Edge> =
                serde_json::from_value(body.get("edges").cloned().unwrap_or_default())?;
            match output_format {
                GraphOutput::Text => print!("{}", output::render_graph_text(&nodes, &edges)),
                GraphOutput::Dot => println!("{}", output::render_graph_dot(&nodes, &edges)),
                GraphOutput::Json => unreachable!(),
            }
        }
    }
    Ok(())
}

// ── Status ────────────────────────────────────────────────────────────────────

pub async fn status(remote: Option<String>, token: Option<String>) -> Result<()> {
    let Some(url) = remote else {
        anyhow::bail!("status requires --remote <url>; there is no in-process server to report on");
    };
    let client = authed_client(&resolve_token(token)?);
    let jobs: serde_json::Value = client
        .get(format!("{}/discovery/jobs", url.trim_end_matches('/')))
        .send()
        .await
        .with_context(|| format!("failed to reach server at {url}"))?
        .json()
        .await?;
    let count = jobs.as_array().map(|a| a.len()).unwrap_or(0);
    println!("Jobs tracked: {count}");
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

// ── Cache ─────────────────────────────────────────────────────────────────────

pub async fn cache(command: CacheCommand, remote: Option<String>, token: Option<String>) -> Result<()> {
    let Some(url) = remote else {
        anyhow::bail!("cache inspection requires --remote <url>; there is no in-process cache to show");
    };
    let client = authed_client(&resolve_token(token)?);
    let base = url.trim_end_matches('/');

    match command {
        CacheCommand::Show => {
            let body: serde_json::Value = client
                .get(format!("{}/cache", base))
                .send()
                .await
                .with_context(|| format!("failed to reach server at {url}"))?
                .json()
                .await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        CacheCommand::Clear { key: Some(key) } => {
            client
                .delete(format!("{}/cache/{}", base, key))
                .send()
                .await
                .with_context(|| format!("failed to reach server at {url}"))?;
            println!("Invalidated cache key '{key}'.");
        }
        CacheCommand::Clear { key: None } => {
            let body: serde_json::Value = client
                .get(format!("{}/cache", base))
                .send()
                .await
                .with_context(|| format!("failed to reach server at {url}"))?
                .json()
                .await?;
            let keys = body.get("keys").and_then(|v| v.as_array()).cloned().unwrap_or_default();
            for key in &keys {
                if let Some(key) = key.as_str() {
                    client.delete(format!("{}/cache/{}", base, key)).send().await.ok();
                }
            }
            println!("Invalidated {} cache key(s).", keys.len());
        }
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build an in-process hub with whatever provider credentials are present in
/// the environment, plus the always-available local stub.
fn build_local_hub() -> DiscoveryHub {
    let now = Utc::now();
    let mut providers = ProviderRegistry::new();
    providers.register(ProviderKind::Local, Arc::new(LocalProvider::new(5)));

    if let Ok(config) = AwsConfig::from_env("us-east-1") {
        providers.register(ProviderKind::Aws, Arc::new(AwsProvider::new(config)));
    }
    if let Ok(config) = AzureConfig::from_env() {
        providers.register(ProviderKind::Azure, Arc::new(AzureProvider::new(config)));
    }
    if let Ok(config) = DigitalOceanConfig::from_env() {
        providers.register(ProviderKind::DigitalOcean, Arc::new(DigitalOceanProvider::new(config)));
    }

    DiscoveryHub::new(
        Arc::new(providers),
        HubCache::new(default_cache_path(), 86_400, now),
        GlobalCache::new(),
        JobRegistry::new(),
        EventBus::new(),
        HubConfig::default(),
    )
}

async fn poll_until_terminal(hub: &DiscoveryHub, job_id: &str) -> Result<drift_domain::Job> {
    loop {
        let job = hub.jobs().get(job_id).await.context("job disappeared from registry")?;
        if job.status.is_terminal() {
            return Ok(job);
        }
        tokio::time::sleep(StdDuration::from_millis(50)).await;
    }
}

fn resolve_token(explicit: Option<String>) -> Result<String> {
    explicit.context("no token provided; use --token or DRIFTMGR_AUTH_TOKEN")
}

fn authed_client(token: &str) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    let bearer = format!("Bearer {}", token);
    headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_str(&bearer).expect("token contains invalid header characters"),
    );
    reqwest::Client::builder().default_headers(headers).build().expect("failed to build HTTP client")
}

fn default_cache_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".driftmgr").join("resource_cache.json")
}
