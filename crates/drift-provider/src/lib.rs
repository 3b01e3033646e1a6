mod aws;
mod azure;
mod digitalocean;
mod error;
mod gcp;
mod local;
mod provider;
mod registry;

pub use aws::{AwsConfig, AwsProvider};
pub use azure::{AzureConfig, AzureProvider};
pub use digitalocean::{DigitalOceanConfig, DigitalOceanProvider};
pub use error::ProviderError;
pub use gcp::{GcpConfig, GcpProvider};
pub use local::LocalProvider;
pub use provider::{ConnectionStatus, DiscoverOptions, DiscoverSummary, Provider};
pub use registry::ProviderRegistry;
