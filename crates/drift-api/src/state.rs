use std::sync::Arc;

use drift_hub::DiscoveryHub;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<DiscoveryHub>,
    pub auth_token: Arc<String>,
}
