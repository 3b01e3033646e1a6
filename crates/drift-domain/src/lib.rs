pub mod cache_meta;
pub mod drift;
pub mod error;
pub mod job;
pub mod perspective;
pub mod resource;

pub use cache_meta::{CacheMetadata, Freshness};
pub use drift::{DriftKind, DriftRecord, DriftStatus, ImpactLevel, Severity};
pub use error::DomainError;
pub use job::{Job, JobStatus};
pub use perspective::{Perspective, PerspectiveSummary};
pub use resource::{Provider, Resource};
