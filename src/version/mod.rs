mod descriptor;
mod manifest;
pub mod resolver;

pub use descriptor::{
    Arguments, ArgumentEntry, ArgumentValue, AssetIndexRef, LibraryDownloads, LibraryEntry,
    RemoteArtifact, VersionDescriptor, VersionDownloads,
};
pub use manifest::{VersionIndex, VersionIndexEntry};
