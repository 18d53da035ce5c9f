//! Artifact naming conventions
//!
//! Every artifact file is named `{safe}_{kind}_{yyyyMMdd_HHmmss}.{ext}`
//! where `safe` is the filesystem-safe device name. The parser here is the
//! single place that regex lives; callers get a typed result back.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;

/// Timestamp component format, second resolution.
pub const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
///
/// Deterministic and idempotent: safe names pass through unchanged.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// The two halves of an artifact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Backup,
    Export,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Backup => "backup",
            ArtifactKind::Export => "export",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Backup => "backup",
            ArtifactKind::Export => "rsc",
        }
    }

    /// Subdirectory under the device directory holding this kind.
    pub fn subdir(&self) -> &'static str {
        self.as_str()
    }

    /// The other half of the pair.
    pub fn sibling(&self) -> ArtifactKind {
        match self {
            ArtifactKind::Backup => ArtifactKind::Export,
            ArtifactKind::Export => ArtifactKind::Backup,
        }
    }
}

/// Parsed components of an artifact filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArtifactName {
    /// Safe device name as embedded in the filename.
    pub device: String,
    pub kind: ArtifactKind,
    pub stamp: NaiveDateTime,
}

impl ParsedArtifactName {
    pub fn new(device: &str, kind: ArtifactKind, stamp: NaiveDateTime) -> Self {
        Self {
            device: safe_name(device),
            kind,
            stamp,
        }
    }

    /// The filename without its extension, as passed to vendor commands.
    pub fn base_name(&self) -> String {
        format!(
            "{}_{}_{}",
            self.device,
            self.kind.as_str(),
            self.stamp.format(STAMP_FORMAT)
        )
    }

    /// The filename this parse corresponds to.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.base_name(), self.kind.extension())
    }

    /// The filename of the pair's other half.
    pub fn sibling_file_name(&self) -> String {
        ParsedArtifactName {
            device: self.device.clone(),
            kind: self.kind.sibling(),
            stamp: self.stamp,
        }
        .file_name()
    }
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<device>.+)_(?P<kind>backup|export)_(?P<stamp>\d{8}_\d{6})\.(backup|rsc)$")
            .expect("artifact name pattern is a valid regex")
    })
}

/// Parses an artifact filename back into its components.
///
/// Returns `None` when the filename does not follow the naming convention or
/// its timestamp component is not a real instant.
pub fn parse_artifact_name(file_name: &str) -> Option<ParsedArtifactName> {
    let caps = name_pattern().captures(file_name)?;
    let kind = match &caps["kind"] {
        "backup" => ArtifactKind::Backup,
        _ => ArtifactKind::Export,
    };
    let stamp = NaiveDateTime::parse_from_str(&caps["stamp"], STAMP_FORMAT).ok()?;
    Some(ParsedArtifactName {
        device: caps["device"].to_string(),
        kind,
        stamp,
    })
}
