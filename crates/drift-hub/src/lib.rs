mod bus;
mod drift_store;
mod error;
mod hub;
mod job;

pub use bus::{Event, EventBus, EventFilter, Subscription};
pub use drift_store::DriftStore;
pub use error::HubError;
pub use hub::{DiscoveryHub, DiscoveryRequest, HubConfig};
pub use job::JobRegistry;
pub use drift_engine::AnalysisMode;
