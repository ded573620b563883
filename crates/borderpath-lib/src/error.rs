use std::path::PathBuf;

use thiserror::Error;

use crate::coordinate::BoundingRegion;
use crate::graph::NodeId;

/// Convenient result alias for the borderpath library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when textual `"lat, lon"` input cannot be parsed.
    #[error("could not parse coordinate '{input}': {reason}")]
    CoordinateParse { input: String, reason: String },

    /// Raised when a latitude or longitude falls outside its valid range.
    #[error("coordinate ({latitude}, {longitude}) is out of range")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Raised when the graph provider returned no nodes or no edges.
    #[error("no road network data available for region {region}")]
    NoData { region: BoundingRegion },

    /// Raised when nearest-node resolution is attempted on an empty graph.
    #[error("cannot resolve nodes on an empty graph")]
    EmptyGraph,

    /// Raised when a mission name is not one of stealth, speed or safety.
    #[error("unknown mission profile '{value}'; expected one of: stealth, speed, safety")]
    InvalidMission { value: String },

    /// Raised when the destination is unreachable from the origin.
    #[error("no route found between node {origin} and node {destination}")]
    NoPath { origin: NodeId, destination: NodeId },

    /// Raised when a solver endpoint is not part of the graph.
    #[error("node {id} is not part of the graph")]
    UnknownNode { id: NodeId },

    /// Raised when the graph provider did not answer within the configured timeout.
    #[error("graph provider timed out after {timeout_secs}s fetching region {region}")]
    ProviderTimeout {
        region: BoundingRegion,
        timeout_secs: u64,
    },

    /// Raised when the graph provider answered with a failure status.
    #[error("graph provider returned HTTP status {status}")]
    ProviderStatus { status: u16 },

    /// Raised when the graph provider payload could not be interpreted.
    #[error("invalid graph provider data: {message}")]
    ProviderData { message: String },

    /// Raised when the route artifact could not be produced or persisted.
    #[error("failed to render route artifact to {path}: {message}")]
    Render { path: PathBuf, message: String },

    /// Raised when a zone name could not be found in the catalog.
    #[error("unknown zone: {name}{}", format_suggestions(.suggestions))]
    UnknownZone {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when duplicate zone names are encountered during catalog load.
    #[error("duplicate zone name encountered: {name}")]
    DuplicateZone { name: String },

    /// Raised when zone data fails validation.
    #[error("invalid zone data: {message}")]
    ZoneDataValidation { message: String },

    /// Raised when serializing a graph snapshot fails.
    #[error("failed to serialize graph snapshot: {message}")]
    SnapshotSerialize { message: String },

    /// Raised when loading a graph snapshot from a file fails.
    #[error("failed to load graph snapshot from {path}: {message}")]
    SnapshotLoad { path: PathBuf, message: String },

    /// No suitable cache directory could be resolved for storing graph snapshots.
    #[error("failed to resolve cache directories for graph snapshots")]
    CacheDirsUnavailable,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// True when the failure means the destination is unreachable.
    pub fn is_no_path(&self) -> bool {
        matches!(self, Error::NoPath { .. })
    }

    /// True when the provider had nothing to offer for the region.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Error::NoData { .. } | Error::EmptyGraph)
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
