use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "driftctl", about = "Cloud infrastructure drift detection", version)]
pub struct Cli {
    /// Talk to a remote driftmgrd server instead of running in-process.
    #[arg(long, env = "DRIFTMGR_URL", global = true)]
    pub remote: Option<String>,

    /// Bearer token for a remote server (ignored in in-process mode).
    #[arg(long, env = "DRIFTMGR_AUTH_TOKEN", global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover live resources for a provider.
    Discover {
        #[arg(long, default_value = "local")]
        provider: ProviderArg,

        /// Regions to discover in.
        regions: Vec<String>,

        /// Restrict discovery to these resource types.
        #[arg(long = "type")]
        resource_types: Vec<String>,
    },

    /// Compare a declared state file against live resources.
    Drift {
        #[arg(long, default_value = "local")]
        provider: ProviderArg,

        #[arg(long)]
        region: Option<String>,

        /// Path to the declared-state file (Terraform state JSON).
        state_path: PathBuf,

        #[arg(long, default_value = "smart")]
        mode: ModeArg,
    },

    /// Render the dependency graph built by the last analysis.
    Graph {
        #[arg(long, default_value = "text")]
        output: GraphOutput,
    },

    /// Show discovery/drift job summary.
    Status,

    /// Inspect or clear the Global Cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// List cached keys.
    Show,
    /// Invalidate a key, or every key if none given.
    Clear {
        key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProviderArg {
    Aws,
    Azure,
    Gcp,
    Digitalocean,
    Local,
}

impl From<ProviderArg> for drift_domain::Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Aws => drift_domain::Provider::Aws,
            ProviderArg::Azure => drift_domain::Provider::Azure,
            ProviderArg::Gcp => drift_domain::Provider::Gcp,
            ProviderArg::Digitalocean => drift_domain::Provider::DigitalOcean,
            ProviderArg::Local => drift_domain::Provider::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Quick,
    Smart,
    Deep,
}

impl From<ModeArg> for drift_engine::AnalysisMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Quick => drift_engine::AnalysisMode::Quick,
            ModeArg::Smart => drift_engine::AnalysisMode::Smart,
            ModeArg::Deep => drift_engine::AnalysisMode::Deep,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GraphOutput {
    Text,
    Json,
    Dot,
}
