pub mod build;
pub mod error;
pub mod interpolate;
pub mod node;
pub mod query;

pub use build::{build, DependencyGraph};
pub use error::GraphError;
pub use node::{Edge, EdgeKind, GraphInput, ResourceNode};
