//! Upstream sources: version-keyed metadata, retrieval, and staging.

pub mod fetch;
pub mod metadata;
pub mod stage;

pub use fetch::{extract_tarball, Fetcher, TarballFetcher};
pub use metadata::{PatchDescriptor, SourceData, SourceDescriptor, VersionEntry};
pub use stage::stage_source;
