pub mod error;
pub mod global;
pub mod hub_cache;
pub mod snapshot;

pub use error::CacheError;
pub use global::{GetResult, GlobalCache};
pub use hub_cache::HubCache;
pub use snapshot::{default_snapshot_path, load_snapshot, write_snapshot, Snapshot};
