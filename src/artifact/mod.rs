//! Backup artifact naming and location
//!
//! Reconstructs structured metadata (device, kind, timestamp) from the
//! filename conventions the session client writes, and supports deleting a
//! snapshot/export pair as a unit.

mod errors;
mod locator;
mod naming;

pub use errors::{ArtifactError, ArtifactResult};
pub use locator::{ArtifactFile, ArtifactLocator};
pub use naming::{
    parse_artifact_name, safe_name, ArtifactKind, ParsedArtifactName, STAMP_FORMAT,
};
