use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::{threshold, ThresholdType};
use tracing::debug;

use crate::tracking::{Contour, ExtractorConfig, TrackerError};
use crate::utils::Point;

/// Source of candidate contours for a frame.
/// Every returned contour carries its own bounding rectangle.
pub trait ContourExtractor {
    fn extract(&mut self, frame: &GrayImage) -> Result<Vec<Contour>, TrackerError>;
}

/// Binarizes a frame at a fixed gray level and traces outer borders of the foreground blobs
#[derive(Debug, Clone, Default)]
pub struct ThresholdExtractor {
    config: ExtractorConfig,
}

impl ThresholdExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        ThresholdExtractor { config }
    }
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }
    /// Foreground pixels become 255, background pixels become 0
    pub fn binarize(&self, frame: &GrayImage) -> GrayImage {
        let threshold_type = if self.config.dark_foreground {
            ThresholdType::BinaryInverted
        } else {
            ThresholdType::Binary
        };
        threshold(frame, self.config.threshold, threshold_type)
    }
}

impl ContourExtractor for ThresholdExtractor {
    fn extract(&mut self, frame: &GrayImage) -> Result<Vec<Contour>, TrackerError> {
        let binary = self.binarize(frame);
        let mut contours = vec![];
        for traced in find_contours::<i32>(&binary) {
            if !matches!(traced.border_type, BorderType::Outer) {
                continue;
            }
            let points: Vec<Point> = traced.points.into_iter().map(Point::from).collect();
            match Contour::new(points) {
                Ok(contour) => contours.push(contour),
                Err(err) => debug!("skipping traced border: {}", err),
            }
        }
        Ok(contours)
    }
}
