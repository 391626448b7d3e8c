pub mod artifact;
pub mod metadata;
pub mod network;
pub mod spec;

pub use artifact::ModelArtifact;
pub use metadata::InputShape;
pub use network::{Network, Trace};
pub use spec::NetworkSpec;
