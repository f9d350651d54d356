use std::fmt;

use chrono::{DateTime, Utc};
use image::GrayImage;
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::tracking::{Contour, DegenerateContour, TrackerError};
use crate::utils::{euclidean_distance, Point, PointF, Rect, Segment};

// How far the inward probe steps off the reference edge
const PROBE_LENGTH: f32 = 0.1;

/// Incremental arithmetic mean: `mean' = (mean * n + x) / (n + 1)`.
/// Every sample weighs the same, there is no decay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct RunningMean {
    mean: f32,
    samples: usize,
}

impl RunningMean {
    pub fn push(&mut self, x: f32) {
        let n = self.samples as f32;
        self.mean = (self.mean * n + x) / (n + 1.0);
        self.samples += 1;
    }
    pub fn mean(&self) -> f32 {
        self.mean
    }
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// How much the head/tail labels can be trusted.
///
/// None of the states is a biological classification: the tracker never decides which
/// end of a worm is actually its head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndsConfidence {
    /// Ends were never found
    Unknown,
    /// Ends were found in a single frame only, labels are arbitrary
    Unclassified,
    /// Labels follow the previous frame's labels by least displacement
    Continuity,
}

/// Both extremal points of a worm
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WormEnds {
    pub head: Point,
    pub tail: Point,
    pub head_index: usize,
    pub tail_index: usize,
    /// False when the latest contour defeated end finding and the points come from an earlier frame.
    /// Indices are meaningful only for the contour they were found on
    pub on_current_contour: bool,
}

/// What was measured on the latest acknowledged contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    pub area: f32,
    pub length: f32,
    /// None when end finding failed for that contour
    pub width: Option<f32>,
}

/// Single tracked organism.
///
/// Serializes into a snapshot of its current state, timestamps in RFC 3339
#[derive(Debug, Clone, Serialize)]
pub struct Worm {
    id: Uuid,
    contour: Contour,
    update_count: usize,
    area: RunningMean,
    length: RunningMean,
    width: RunningMean,
    ends: Option<WormEnds>,
    ends_confidence: EndsConfidence,
    last_measurement: Option<Measurement>,
    no_match_times: usize,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

impl Worm {
    /// Creates new worm and takes its first measurements from the contour
    pub fn new(contour: &Contour, frame: &GrayImage) -> Result<Self, TrackerError> {
        let mut worm = Worm::blank(Uuid::new_v4());
        worm.discover(contour, frame)?;
        Ok(worm)
    }
    /// Sentinel returned for out of range lookups: nil id, zeroed statistics, empty contour
    pub(crate) fn null() -> Self {
        Worm::blank(Uuid::nil())
    }
    fn blank(id: Uuid) -> Self {
        let now = Utc::now();
        Worm {
            id,
            contour: Contour::empty(),
            update_count: 0,
            area: RunningMean::default(),
            length: RunningMean::default(),
            width: RunningMean::default(),
            ends: None,
            ends_confidence: EndsConfidence::Unknown,
            last_measurement: None,
            no_match_times: 0,
            first_seen: now,
            last_seen: now,
        }
    }
    pub fn is_null(&self) -> bool {
        self.update_count == 0
    }
    pub fn get_id(&self) -> Uuid {
        self.id
    }
    pub fn get_contour(&self) -> &Contour {
        &self.contour
    }
    pub fn get_bbox(&self) -> Rect {
        self.contour.bounding_rect()
    }
    pub fn get_update_count(&self) -> usize {
        self.update_count
    }
    /// Best guess of the area, considering every frame seen so far
    pub fn get_area(&self) -> f32 {
        self.area.mean()
    }
    /// Best guess of the head to tail length, considering every frame seen so far
    pub fn get_length(&self) -> f32 {
        self.length.mean()
    }
    /// Best guess of the width, considering every frame where the ends were found
    pub fn get_width(&self) -> f32 {
        self.width.mean()
    }
    pub fn get_width_samples(&self) -> usize {
        self.width.samples()
    }
    /// Best-effort head position, see [`EndsConfidence`]
    pub fn get_head(&self) -> Option<Point> {
        self.ends.map(|ends| ends.head)
    }
    /// Best-effort tail position, see [`EndsConfidence`]
    pub fn get_tail(&self) -> Option<Point> {
        self.ends.map(|ends| ends.tail)
    }
    pub fn get_ends(&self) -> Option<&WormEnds> {
        self.ends.as_ref()
    }
    pub fn get_ends_confidence(&self) -> EndsConfidence {
        self.ends_confidence
    }
    pub fn get_last_measurement(&self) -> Option<&Measurement> {
        self.last_measurement.as_ref()
    }
    pub fn get_no_match_times(&self) -> usize {
        self.no_match_times
    }
    pub fn inc_no_match(&mut self) {
        self.no_match_times += 1
    }
    pub fn reset_no_match(&mut self) {
        self.no_match_times = 0
    }
    pub fn get_first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }
    pub fn get_last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    /// Replaces the contour with a copy of the given one and re-evaluates area, length,
    /// ends and width.
    ///
    /// When the contour defeats end finding, ends and width keep their previous values.
    /// Fails only when storage for the copy cannot be reserved; the worm is left untouched then.
    pub fn discover(&mut self, contour: &Contour, frame: &GrayImage) -> Result<(), TrackerError> {
        self.contour = contour.try_clone()?;
        self.update_count += 1;
        self.last_seen = Utc::now();

        let area = self.contour.area();
        self.area.push(area);

        // Walking the whole boundary of a thin worm passes along both of its sides
        let length = self.contour.perimeter() / 2.0;
        self.length.push(length);

        let width = match self.find_ends(length, frame.dimensions()) {
            Ok((end, other_end)) => {
                self.update_head_and_tail(end, other_end);
                let width = self.width_at_middle(end, length);
                self.width.push(width);
                Some(width)
            }
            Err(err) => {
                warn!(worm = %self.id, "keeping previous ends and width: {}", err);
                if let Some(ends) = self.ends.as_mut() {
                    ends.on_current_contour = false;
                }
                None
            }
        };
        self.last_measurement = Some(Measurement {
            area,
            length,
            width,
        });
        Ok(())
    }

    /// Finds both ends on the current contour: one by pinch-shifting, the other
    /// approximately `length` further along the boundary
    pub fn find_ends(&self, length: f32, frame_size: (u32, u32)) -> Result<(usize, usize), TrackerError> {
        let end = self.pinch_shift_for_an_end(frame_size)?;
        let other_end = self
            .contour
            .find_nearest_vertex_index_by_perimeter_length(end, length);
        Ok((end, other_end))
    }

    /// Finds the index of a vertex at either end of the worm.
    ///
    /// A ray is cast into the body from the middle of a reference edge to find the edge on
    /// the opposite side. Then both sides are shifted along the boundary towards each other,
    /// always moving the side which keeps them closest, until they meet at the tip.
    ///
    /// O(n²) worst case, fine for contours of a few hundred vertices.
    pub fn pinch_shift_for_an_end(&self, frame_size: (u32, u32)) -> Result<usize, TrackerError> {
        let contour = &self.contour;
        if contour.len() < 3 {
            return Err(DegenerateContour::new(format!(
                "End finding needs at least 3 vertices. Got: {}",
                contour.len()
            ))
            .into());
        }
        let start = (0..contour.len())
            .find(|&i| contour.vertex(i) != contour.vertex(contour.next_index(i)))
            .ok_or_else(|| DegenerateContour::new("All vertices coincide"))?;
        let reference = Segment::from_points(contour.vertex(start), contour.vertex(contour.next_index(start)));
        let middle = reference.midpoint();
        let mut normal = reference
            .unit_normal()
            .ok_or_else(|| DegenerateContour::new("Zero length reference edge"))?;

        // Make sure the normal points into the worm rather than outwards
        let probe = |n: &PointF| PointF::new(middle.x + PROBE_LENGTH * n.x, middle.y + PROBE_LENGTH * n.y);
        if !contour.contains(&probe(&normal)) {
            normal = PointF::new(-normal.x, -normal.y);
            if !contour.contains(&probe(&normal)) {
                return Err(DegenerateContour::new("No side of the reference edge lies inside the contour").into());
            }
        }

        // Far enough to leave the worm on the other side, then cut at the frame border
        let (frame_width, frame_height) = frame_size;
        let bbox = contour.bounding_rect();
        let reach = f32::hypot(frame_width as f32, frame_height as f32)
            .max(f32::hypot(bbox.width as f32, bbox.height as f32));
        let ray = Segment::new(
            middle,
            PointF::new(middle.x + normal.x * reach, middle.y + normal.y * reach),
        );
        let ray = match ray.clipped(frame_width, frame_height) {
            Some(clipped) if clipped.start == ray.start => clipped,
            _ => ray,
        };

        // The pierced edge nearest to the reference one is on the other side of the body,
        // not necessarily right across
        let mut opposite: Option<(usize, f32)> = None;
        let mut candidate_idx = contour.next_index(start);
        while contour.next_index(candidate_idx) != start {
            let candidate = Segment::from_points(
                contour.vertex(candidate_idx),
                contour.vertex(contour.next_index(candidate_idx)),
            );
            if ray.intersects(&candidate) {
                let dist = reference.midpoint_distance(&candidate);
                if opposite.map_or(true, |(_, best)| dist < best) {
                    opposite = Some((candidate_idx, dist));
                }
            }
            candidate_idx = contour.next_index(candidate_idx);
        }
        let (opposite_idx, _) = opposite.ok_or_else(|| DegenerateContour::new("Ray cast from the reference edge pierced nothing"))?;

        // Vertex density may differ on both sides, so sides can't move in lockstep.
        // Every step shrinks the gap between the sides by one vertex
        let mut side_a = start;
        let mut side_b = opposite_idx;
        while side_a != side_b {
            let if_shift_a = euclidean_distance(&contour.vertex(contour.prev_index(side_a)), &contour.vertex(side_b));
            let if_shift_b = euclidean_distance(&contour.vertex(side_a), &contour.vertex(contour.next_index(side_b)));
            if if_shift_a <= if_shift_b {
                side_a = contour.prev_index(side_a);
            } else {
                side_b = contour.next_index(side_b);
            }
        }
        Ok(side_a)
    }

    // Distance between the two sides half way between the ends
    fn width_at_middle(&self, end: usize, length: f32) -> f32 {
        let side_a = self
            .contour
            .find_nearest_vertex_index_by_perimeter_length(end, length / 2.0);
        let side_b = self
            .contour
            .find_nearest_vertex_index_by_perimeter_length(end, -length / 2.0);
        euclidean_distance(&self.contour.vertex(side_a), &self.contour.vertex(side_b))
    }

    // First sighting labels ends arbitrarily. Afterwards keep whichever labeling moves
    // the ends least since the previous frame
    fn update_head_and_tail(&mut self, first: usize, second: usize) {
        let first_pt = self.contour.vertex(first);
        let second_pt = self.contour.vertex(second);
        let swap = match self.ends {
            Some(prev) => {
                let keep = euclidean_distance(&prev.head, &first_pt) + euclidean_distance(&prev.tail, &second_pt);
                let swapped = euclidean_distance(&prev.head, &second_pt) + euclidean_distance(&prev.tail, &first_pt);
                swapped < keep
            }
            None => false,
        };
        let (head_index, tail_index) = if swap { (second, first) } else { (first, second) };
        self.ends_confidence = if self.ends.is_some() {
            EndsConfidence::Continuity
        } else {
            EndsConfidence::Unclassified
        };
        self.ends = Some(WormEnds {
            head: self.contour.vertex(head_index),
            tail: self.contour.vertex(tail_index),
            head_index,
            tail_index,
            on_current_contour: true,
        });
    }
}

impl fmt::Display for Worm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Worm {}: updates: {}, area: {:.2}, length: {:.2}, width: {:.2}",
            self.id,
            self.update_count,
            self.get_area(),
            self.get_length(),
            self.get_width()
        )?;
        match self.ends {
            Some(ends) => write!(
                f,
                ", head: ({}, {}), tail: ({}, {}) [{:?}]",
                ends.head.x, ends.head.y, ends.tail.x, ends.tail.y, self.ends_confidence
            ),
            None => write!(f, ", ends: unknown"),
        }
    }
}
