use std::collections::TryReserveError;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("ResourceExhausted: {0}")]
    ResourceExhausted(#[from] TryReserveError),
    #[error(transparent)]
    Degenerate(#[from] DegenerateContour),
    #[error(transparent)]
    NoObject(#[from] NoObjectInTracker),
    #[error("BadConfig: {0}")]
    BadConfig(String),
    #[error("Json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Extraction: {0}")]
    Extraction(String),
}

/// Contour geometry the tracker cannot work with
#[derive(Debug)]
pub struct DegenerateContour {
    pub txt: String,
}

impl DegenerateContour {
    pub fn new(txt: impl Into<String>) -> Self {
        DegenerateContour { txt: txt.into() }
    }
}

impl fmt::Display for DegenerateContour {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DegenerateContour: {}", self.txt)
    }
}

impl std::error::Error for DegenerateContour {}

#[derive(Debug)]
pub struct NoObjectInTracker {
    pub txt: String,
}

impl fmt::Display for NoObjectInTracker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NoObjectInTracker: {}", self.txt)
    }
}

impl std::error::Error for NoObjectInTracker {}
