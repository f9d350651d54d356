use imageproc::geometry::{arc_length, contour_area};
use itertools::Itertools;
use serde::Serialize;

use crate::tracking::{DegenerateContour, TrackerError};
use crate::utils::{euclidean_distance, Point, PointF, Rect};

/// Closed polygon approximating the silhouette of an object.
///
/// Vertices are cyclic: the vertex after the last one is the first one.
/// Bounding rectangle is evaluated once on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    points: Vec<Point>,
    bbox: Rect,
}

impl Contour {
    /// Creates new contour from its vertices. At least three vertices are required
    ///
    /// Basic usage:
    ///
    /// ```
    /// use worm_tracker::tracking::Contour;
    /// use worm_tracker::utils::{Point, Rect};
    /// let contour = Contour::new(vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 3)]).unwrap();
    /// assert_eq!(contour.area(), 6.0);
    /// assert_eq!(contour.perimeter(), 12.0);
    /// assert_eq!(contour.bounding_rect(), Rect::new(0, 0, 5, 4));
    /// ```
    pub fn new(points: Vec<Point>) -> Result<Self, TrackerError> {
        if points.len() < 3 {
            return Err(TrackerError::from(DegenerateContour::new(format!(
                "Contour needs at least 3 vertices. Got: {}",
                points.len()
            ))));
        }
        let bbox = Rect::bounding(&points);
        Ok(Contour { points, bbox })
    }
    // Placeholder geometry for the null worm
    pub(crate) fn empty() -> Self {
        Contour {
            points: Vec::new(),
            bbox: Rect::default(),
        }
    }
    /// Copies the contour into freshly reserved storage, reporting allocation failure
    /// instead of aborting
    pub fn try_clone(&self) -> Result<Self, TrackerError> {
        let mut points = Vec::new();
        points.try_reserve_exact(self.points.len())?;
        points.extend_from_slice(&self.points);
        Ok(Contour {
            points,
            bbox: self.bbox,
        })
    }
    /// Same shape shifted by (dx, dy)
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        let points: Vec<Point> = self.points.iter().map(|p| p.translated(dx, dy)).collect();
        let bbox = Rect::bounding(&points);
        Contour { points, bbox }
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn points(&self) -> &[Point] {
        &self.points
    }
    pub fn vertex(&self, index: usize) -> Point {
        self.points[index]
    }
    pub fn next_index(&self, index: usize) -> usize {
        debug_assert!(index < self.points.len());
        if index + 1 < self.points.len() {
            index + 1
        } else {
            0
        }
    }
    pub fn prev_index(&self, index: usize) -> usize {
        debug_assert!(index < self.points.len());
        if index == 0 {
            self.points.len() - 1
        } else {
            index - 1
        }
    }
    pub fn bounding_rect(&self) -> Rect {
        self.bbox
    }
    fn as_imageproc_points(&self) -> Vec<imageproc::point::Point<i32>> {
        self.points.iter().map(|&p| p.into()).collect()
    }
    /// Unsigned polygon area (shoelace formula)
    pub fn area(&self) -> f32 {
        contour_area(&self.as_imageproc_points()) as f32
    }
    /// Length of the closed boundary
    pub fn perimeter(&self) -> f32 {
        arc_length(&self.as_imageproc_points(), true) as f32
    }
    /// Even-odd point in polygon test. Points exactly on the boundary may land on either side
    pub fn contains(&self, p: &PointF) -> bool {
        let mut inside = false;
        for (a, b) in self.points.iter().circular_tuple_windows() {
            let (ax, ay) = (a.x as f32, a.y as f32);
            let (bx, by) = (b.x as f32, b.y as f32);
            if (ay > p.y) != (by > p.y) {
                let x_cross = (bx - ax) * (p.y - ay) / (by - ay) + ax;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
    /// Walks the boundary from `start` and returns the last vertex whose accumulated
    /// arclength does not exceed `|length|`. Positive length walks in increasing index
    /// order, negative length in decreasing order. A walk never goes around more than once.
    ///
    /// The answer rounds down: the vertex returned is never farther than `|length|` along the boundary.
    ///
    /// Basic usage:
    ///
    /// ```
    /// use worm_tracker::tracking::Contour;
    /// use worm_tracker::utils::Point;
    /// // 10x10 square
    /// let square = Contour::new(vec![
    ///     Point::new(0, 0), Point::new(10, 0), Point::new(10, 10), Point::new(0, 10),
    /// ]).unwrap();
    /// assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, 15.0), 1);
    /// assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, 20.0), 2);
    /// assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, -15.0), 3);
    /// ```
    pub fn find_nearest_vertex_index_by_perimeter_length(&self, start: usize, length: f32) -> usize {
        // O(n), a skip structure indexed by arclength would make this logarithmic
        let total = self.points.len();
        if total == 0 {
            return start;
        }
        let start = start % total;
        if length == 0.0 || length.is_nan() {
            return start;
        }
        let target = length.abs();
        let forward = length > 0.0;
        let mut current = start;
        let mut walked = 0.0_f32;
        for _ in 0..total {
            let step = if forward {
                self.next_index(current)
            } else {
                self.prev_index(current)
            };
            let edge = euclidean_distance(&self.points[current], &self.points[step]);
            if walked + edge > target {
                break;
            }
            walked += edge;
            current = step;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::test_data::{contour_from, rectangle_contour, WORM_700};

    #[test]
    fn test_too_few_vertices() {
        let res = Contour::new(vec![Point::new(0, 0), Point::new(1, 1)]);
        assert!(matches!(res, Err(TrackerError::Degenerate(_))));
    }

    #[test]
    fn test_cyclic_indices() {
        let contour = contour_from(&WORM_700, 0, 0);
        assert_eq!(contour.next_index(19), 0);
        assert_eq!(contour.prev_index(0), 19);
        assert_eq!(contour.next_index(4), 5);
        assert_eq!(contour.prev_index(4), 3);
    }

    #[test]
    fn test_area_and_bbox() {
        let contour = contour_from(&WORM_700, 100, 50);
        assert_eq!(contour.area(), 700.0);
        assert_eq!(contour.bounding_rect(), Rect::new(73, 42, 55, 17));
        // Orientation does not matter
        let reversed = Contour::new(contour.points().iter().rev().cloned().collect()).unwrap();
        assert_eq!(reversed.area(), 700.0);
        assert_eq!(rectangle_contour(0, 0, 20, 20).area(), 400.0);
    }

    #[test]
    fn test_contains() {
        let contour = rectangle_contour(10, 10, 20, 10);
        assert!(contour.contains(&PointF::new(15.0, 15.0)));
        assert!(!contour.contains(&PointF::new(5.0, 15.0)));
        assert!(!contour.contains(&PointF::new(15.0, 25.0)));
    }

    #[test]
    fn test_perimeter_walk_zero_length() {
        let contour = contour_from(&WORM_700, 10, 10);
        for start in 0..contour.len() {
            assert_eq!(contour.find_nearest_vertex_index_by_perimeter_length(start, 0.0), start);
        }
    }

    #[test]
    fn test_perimeter_walk_full_loop() {
        let contour = contour_from(&WORM_700, 10, 10);
        let perimeter = contour.perimeter();
        for start in 0..contour.len() {
            let found = contour.find_nearest_vertex_index_by_perimeter_length(start, perimeter);
            assert!(found == start || found == contour.prev_index(start));
        }
    }

    #[test]
    fn test_perimeter_walk_rounds_down() {
        let square = rectangle_contour(0, 0, 10, 10);
        // Vertices every 5 pixels along the boundary
        assert_eq!(square.len(), 8);
        assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, 4.9), 0);
        assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, 5.0), 1);
        assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, 14.0), 2);
        assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(0, -14.0), 6);
        // Longer than the whole boundary stops after one loop
        assert_eq!(square.find_nearest_vertex_index_by_perimeter_length(3, 1000.0), 3);
    }

    #[test]
    fn test_perimeter() {
        assert_eq!(rectangle_contour(0, 0, 20, 10).perimeter(), 60.0);
        let triangle = Contour::new(vec![Point::new(0, 0), Point::new(3, 0), Point::new(3, 4)]).unwrap();
        assert_eq!(triangle.perimeter(), 12.0);
        // Degenerate back and forth line: both directions are walked
        let flat = Contour::new(vec![Point::new(0, 0), Point::new(10, 0), Point::new(5, 0)]).unwrap();
        assert_eq!(flat.area(), 0.0);
        assert_eq!(flat.perimeter(), 20.0);
    }

    #[test]
    fn test_translated() {
        let contour = contour_from(&WORM_700, 100, 50);
        let moved = contour.translated(5, -3);
        assert_eq!(moved.bounding_rect(), Rect::new(78, 39, 55, 17));
        assert_eq!(moved.area(), contour.area());
        assert_eq!(moved.vertex(0), Point::new(132, 47));
    }

    #[test]
    fn test_try_clone() {
        let contour = contour_from(&WORM_700, 3, 4);
        let copy = contour.try_clone().unwrap();
        assert_eq!(copy, contour);
    }
}
