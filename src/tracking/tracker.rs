use std::cmp::Reverse;
use std::fmt;

use image::GrayImage;
use tracing::{debug, warn};

use crate::tracking::{
    Contour, ContourExtractor, NoObjectInTracker, ThresholdExtractor, TrackerConfig, TrackerError, Worm,
};
use crate::utils::Rect;

/// Outcome of a single frame
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Contours handed over by the extractor
    pub candidates: usize,
    /// Contours which could not be a worm
    pub rejected: usize,
    /// Contours folded into already tracked worms
    pub matched: usize,
    /// Contours registered as new worms
    pub added: usize,
    /// Contours dropped because the worm update failed
    pub failed: usize,
    /// Worms removed by the no-match policy
    pub evicted: usize,
}

/// What happened to a single contour of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    Rejected,
    /// Folded into the worm at given index
    Matched(usize),
    Added,
}

impl FrameStats {
    /// Counts the outcome of a single contour. A failed worm update is logged and counted,
    /// it never stops the frame
    pub fn record(&mut self, outcome: &Result<CandidateOutcome, TrackerError>) {
        match outcome {
            Ok(CandidateOutcome::Rejected) => self.rejected += 1,
            Ok(CandidateOutcome::Matched(_)) => self.matched += 1,
            Ok(CandidateOutcome::Added) => self.added += 1,
            Err(err) => {
                warn!("dropping contour: {}", err);
                self.failed += 1;
            }
        }
    }
}

/// Tracker of worm-shaped contours. Matching is done by bounding box overlap
pub struct WormTracker<E: ContourExtractor = ThresholdExtractor> {
    config: TrackerConfig,
    extractor: E,
    // Returned for out of range lookups
    null_worm: Worm,
    frames_processed: usize,
    // Storage. Position in the table is the worm's index
    worms: Vec<Worm>,
}

impl Default for WormTracker {
    /// Creates default instance of WormTracker
    ///
    /// Basic usage:
    ///
    /// ```
    /// use worm_tracker::tracking::WormTracker;
    /// let tracker: WormTracker = WormTracker::default();
    /// assert_eq!(tracker.tracking(), 0);
    /// ```
    fn default() -> Self {
        WormTracker {
            config: TrackerConfig::default(),
            extractor: ThresholdExtractor::default(),
            null_worm: Worm::null(),
            frames_processed: 0,
            worms: vec![],
        }
    }
}

impl<E: ContourExtractor> WormTracker<E> {
    /// Creates new instance of WormTracker
    ///
    /// Basic usage:
    ///
    /// ```
    /// use worm_tracker::tracking::{ExtractorConfig, ThresholdExtractor, TrackerConfig, WormTracker};
    /// let config = TrackerConfig {
    ///     min_area: 250.0,
    ///     max_area: 1500.0,
    ///     ..TrackerConfig::default()
    /// };
    /// let extractor = ThresholdExtractor::new(ExtractorConfig { threshold: 80, dark_foreground: true });
    /// let tracker = WormTracker::new(config, extractor).unwrap();
    /// assert_eq!(tracker.tracking(), 0);
    /// ```
    pub fn new(config: TrackerConfig, extractor: E) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(WormTracker {
            config,
            extractor,
            null_worm: Worm::null(),
            frames_processed: 0,
            worms: vec![],
        })
    }
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
    /// Number of worms being tracked
    pub fn tracking(&self) -> usize {
        self.worms.len()
    }
    pub fn get_frames_processed(&self) -> usize {
        self.frames_processed
    }
    pub fn worms(&self) -> &[Worm] {
        &self.worms
    }
    /// Returns the worm at given index, or the null worm when there is no such index.
    /// Check the result with [`Worm::is_null`]
    pub fn get_worm(&self, index: usize) -> &Worm {
        self.worms.get(index).unwrap_or(&self.null_worm)
    }
    pub fn worm(&self, index: usize) -> Option<&Worm> {
        self.worms.get(index)
    }
    /// Forgets every tracked worm
    pub fn reset(&mut self) {
        self.worms.clear();
        self.frames_processed = 0;
    }

    /// Extracts contours from the frame and matches them to tracked worms.
    /// Only extractor failures are reported as errors, a failed worm update
    /// is counted in [`FrameStats::failed`] and does not stop the frame.
    pub fn advance_next_frame(&mut self, frame: &GrayImage) -> Result<FrameStats, TrackerError> {
        let contours = self.extractor.extract(frame)?;
        Ok(self.advance_with_candidates(frame, contours))
    }

    /// Matches already extracted contours of the frame to tracked worms
    pub fn advance_with_candidates(&mut self, frame: &GrayImage, candidates: Vec<Contour>) -> FrameStats {
        let mut stats = FrameStats {
            candidates: candidates.len(),
            ..FrameStats::default()
        };
        // Worms registered during this frame are never marked as missed
        let mut matched = vec![false; self.worms.len()];

        for contour in candidates.iter() {
            let outcome = self.settle(contour, frame);
            if let Ok(CandidateOutcome::Matched(idx)) = outcome {
                if let Some(flag) = matched.get_mut(idx) {
                    *flag = true;
                }
            }
            stats.record(&outcome);
        }

        for (worm, was_matched) in self.worms.iter_mut().zip(matched.iter()) {
            if *was_matched {
                worm.reset_no_match();
            } else {
                worm.inc_no_match();
            }
        }

        // Clean up existing data
        if let Some(max_no_match) = self.config.max_no_match {
            let before = self.worms.len();
            self.worms.retain(|worm| {
                // Remove worm if it was not found for a long time
                let delete = worm.get_no_match_times() > max_no_match;
                if delete {
                    debug!(worm = %worm.get_id(), "evicting worm");
                }
                !delete
            });
            stats.evicted = before - self.worms.len();
        }

        self.frames_processed += 1;
        debug!(frame = self.frames_processed, tracking = self.worms.len(), ?stats, "frame processed");
        stats
    }

    /// Filters the contour, then folds it into the best matching worm or registers a new one
    pub fn settle(&mut self, contour: &Contour, frame: &GrayImage) -> Result<CandidateOutcome, TrackerError> {
        if !self.is_possible_worm(contour) {
            debug!(vertices = contour.len(), area = contour.area(), "rejecting contour");
            return Ok(CandidateOutcome::Rejected);
        }
        if self.config.reject_edge_contacts && !self.is_within_outer_frame_edge(contour, frame) {
            debug!(bbox = ?contour.bounding_rect(), "rejecting contour touching frame edge");
            return Ok(CandidateOutcome::Rejected);
        }
        match self.find_best_match(contour) {
            Some(idx) => {
                self.acknowledge(idx, contour, frame)?;
                Ok(CandidateOutcome::Matched(idx))
            }
            None => {
                self.add(contour, frame)?;
                Ok(CandidateOutcome::Added)
            }
        }
    }

    /// Could this contour be a worm, independent of what is being tracked?
    pub fn is_possible_worm(&self, contour: &Contour) -> bool {
        if contour.len() < self.config.min_vertices {
            return false;
        }
        let area = contour.area();
        area >= self.config.min_area && area <= self.config.max_area
    }

    /// Checks that the contour's bounding box does not touch the frame border
    pub fn is_within_outer_frame_edge(&self, contour: &Contour, frame: &GrayImage) -> bool {
        let bbox = contour.bounding_rect();
        bbox.x > 0
            && bbox.y > 0
            && (bbox.right() as i64) < frame.width() as i64
            && (bbox.bottom() as i64) < frame.height() as i64
    }

    /// Finds the tracked worm the contour belongs to.
    ///
    /// Only worms whose bounding box overlaps the contour's one are considered. The winner is
    /// the worm whose shared region with the contour is overlapped by the greatest number of
    /// other worms' boxes. Ties go to the worm tracked first.
    pub fn find_best_match(&self, contour: &Contour) -> Option<usize> {
        let candidate_bbox = contour.bounding_rect();
        self.worms
            .iter()
            .enumerate()
            .filter_map(|(idx, worm)| {
                worm.get_bbox()
                    .intersection(&candidate_bbox)
                    .map(|shared| (idx, self.count_rectangles_intersected(&shared, idx)))
            })
            .min_by_key(|&(_, count)| Reverse(count))
            .map(|(idx, _)| idx)
    }

    // How many worm boxes, except the given worm's one, rest upon the rectangle
    fn count_rectangles_intersected(&self, rect: &Rect, skip: usize) -> usize {
        self.worms
            .iter()
            .enumerate()
            .filter(|(idx, worm)| *idx != skip && worm.get_bbox().intersects(rect))
            .count()
    }

    /// Folds the contour into the worm at given index
    pub fn acknowledge(&mut self, index: usize, contour: &Contour, frame: &GrayImage) -> Result<(), TrackerError> {
        let tracking = self.worms.len();
        let worm = self.worms.get_mut(index).ok_or_else(|| NoObjectInTracker {
            txt: format!("No worm at index {}. Tracking: {}", index, tracking),
        })?;
        worm.discover(contour, frame)?;
        debug!(worm = %worm.get_id(), updates = worm.get_update_count(), "acknowledged worm");
        Ok(())
    }

    /// Registers the contour as a new worm
    pub fn add(&mut self, contour: &Contour, frame: &GrayImage) -> Result<(), TrackerError> {
        let worm = Worm::new(contour, frame)?;
        debug!(worm = %worm.get_id(), bbox = ?worm.get_bbox(), "registered new worm");
        self.worms.push(worm);
        Ok(())
    }
}

impl<E: ContourExtractor> fmt::Display for WormTracker<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Tracking: {}\n\tMinimum vertices: {}\n\tArea band: [{}, {}]",
            self.worms.len(),
            self.config.min_vertices,
            self.config.min_area,
            self.config.max_area
        )?;
        for worm in self.worms.iter() {
            write!(f, "\n\t{}", worm)?;
        }
        Ok(())
    }
}
