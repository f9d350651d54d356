use serde::{Deserialize, Serialize};

use crate::tracking::TrackerError;

/// Tunables of [`WormTracker`](crate::tracking::WormTracker).
///
/// Area values are in image pixel² and depend on microscope zoom and resolution,
/// so there is no universally right default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum number of contour vertices for a candidate. Default is 6
    pub min_vertices: usize,
    /// Lower bound (inclusive) of plausible worm area. Default is 400.0
    pub min_area: f32,
    /// Upper bound (inclusive) of plausible worm area. Default is 1000.0
    pub max_area: f32,
    /// Skip contours whose bounding box touches the frame border. Default is false
    pub reject_edge_contacts: bool,
    /// Evict worms which were not matched for more than this number of consecutive frames.
    /// Default is None: worms are kept forever
    pub max_no_match: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            min_vertices: 6,
            min_area: 400.0,
            max_area: 1000.0,
            reject_edge_contacts: false,
            max_no_match: None,
        }
    }
}

impl TrackerConfig {
    /// Parses configuration from JSON. Missing fields take default values.
    ///
    /// Basic usage:
    ///
    /// ```
    /// use worm_tracker::tracking::TrackerConfig;
    /// let cfg = TrackerConfig::from_json(r#"{"min_area": 250.0, "max_no_match": 25}"#).unwrap();
    /// assert_eq!(cfg.min_area, 250.0);
    /// assert_eq!(cfg.max_area, 1000.0);
    /// assert_eq!(cfg.max_no_match, Some(25));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        let cfg: TrackerConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.min_vertices < 3 {
            return Err(TrackerError::BadConfig(format!(
                "min_vertices must be at least 3 to form a polygon. Got: {}",
                self.min_vertices
            )));
        }
        if !self.min_area.is_finite() || !self.max_area.is_finite() {
            return Err(TrackerError::BadConfig(format!(
                "Area band must be finite. Got: [{}, {}]",
                self.min_area, self.max_area
            )));
        }
        if self.min_area < 0.0 || self.min_area > self.max_area {
            return Err(TrackerError::BadConfig(format!(
                "Area band must satisfy 0 <= min_area <= max_area. Got: [{}, {}]",
                self.min_area, self.max_area
            )));
        }
        Ok(())
    }
}

/// Tunables of [`ThresholdExtractor`](crate::tracking::ThresholdExtractor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Gray level separating foreground from background. Default is 100
    pub threshold: u8,
    /// Worms are darker than the background (typical brightfield setup).
    /// When true pixels <= threshold are foreground, otherwise pixels > threshold are. Default is true
    pub dark_foreground: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            threshold: 100,
            dark_foreground: true,
        }
    }
}

impl ExtractorConfig {
    pub fn from_json(json: &str) -> Result<Self, TrackerError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.min_vertices, 6);
        assert_eq!(cfg.min_area, 400.0);
        assert_eq!(cfg.max_area, 1000.0);
        assert!(!cfg.reject_edge_contacts);
        assert!(cfg.max_no_match.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let cfg = TrackerConfig::from_json(r#"{"min_vertices": 8, "reject_edge_contacts": true}"#).unwrap();
        assert_eq!(cfg.min_vertices, 8);
        assert!(cfg.reject_edge_contacts);
        assert_eq!(cfg.min_area, 400.0);

        let extractor = ExtractorConfig::from_json(r#"{"threshold": 60}"#).unwrap();
        assert_eq!(extractor.threshold, 60);
        assert!(extractor.dark_foreground);
    }

    #[test]
    fn test_bad_config() {
        let inverted = TrackerConfig::from_json(r#"{"min_area": 900.0, "max_area": 100.0}"#);
        assert!(matches!(inverted, Err(TrackerError::BadConfig(_))));
        let triangle = TrackerConfig {
            min_vertices: 2,
            ..TrackerConfig::default()
        };
        assert!(matches!(triangle.validate(), Err(TrackerError::BadConfig(_))));
        let garbage = TrackerConfig::from_json("{ min_area: ");
        assert!(matches!(garbage, Err(TrackerError::Json(_))));
    }
}
