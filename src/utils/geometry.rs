//! Floating point helpers for line segment work on contours
use crate::utils::Point;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        PointF { x, y }
    }
    pub fn distance_to(&self, other: &PointF) -> f32 {
        f32::hypot(self.x - other.x, self.y - other.y)
    }
}

impl From<Point> for PointF {
    fn from(p: Point) -> Self {
        PointF::new(p.x as f32, p.y as f32)
    }
}

/// Directed line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: PointF,
    pub end: PointF,
}

impl Segment {
    pub fn new(start: PointF, end: PointF) -> Self {
        Segment { start, end }
    }
    pub fn from_points(start: Point, end: Point) -> Self {
        Segment::new(start.into(), end.into())
    }
    pub fn midpoint(&self) -> PointF {
        PointF::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }
    /// Distance between the middles of two segments
    pub fn midpoint_distance(&self, other: &Segment) -> f32 {
        self.midpoint().distance_to(&other.midpoint())
    }
    /// Unit normal of the segment, rotated a quarter turn from its direction.
    /// None for a zero-length segment.
    pub fn unit_normal(&self) -> Option<PointF> {
        let len = self.start.distance_to(&self.end);
        if len == 0.0 {
            return None;
        }
        let dx = (self.end.x - self.start.x) / len;
        let dy = (self.end.y - self.start.y) / len;
        Some(PointF::new(-dy, dx))
    }
    /// Checks if two segments share at least one point (Cormen et al., straddle test)
    pub fn intersects(&self, other: &Segment) -> bool {
        let d1 = direction(&other.start, &other.end, &self.start);
        let d2 = direction(&other.start, &other.end, &self.end);
        let d3 = direction(&self.start, &self.end, &other.start);
        let d4 = direction(&self.start, &self.end, &other.end);
        let straddles = |a: f32, b: f32| (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0);
        if straddles(d1, d2) && straddles(d3, d4) {
            return true;
        }
        (d1 == 0.0 && other.bounds_contain(&self.start))
            || (d2 == 0.0 && other.bounds_contain(&self.end))
            || (d3 == 0.0 && self.bounds_contain(&other.start))
            || (d4 == 0.0 && self.bounds_contain(&other.end))
    }
    // For a point already known to be collinear
    fn bounds_contain(&self, p: &PointF) -> bool {
        self.start.x.min(self.end.x) <= p.x
            && p.x <= self.start.x.max(self.end.x)
            && self.start.y.min(self.end.y) <= p.y
            && p.y <= self.start.y.max(self.end.y)
    }
    /// Clips the segment to `[0, width - 1] x [0, height - 1]` (Liang-Barsky).
    /// None when no part of the segment lies inside.
    pub fn clipped(&self, width: u32, height: u32) -> Option<Segment> {
        if width == 0 || height == 0 {
            return None;
        }
        let (x_max, y_max) = ((width - 1) as f32, (height - 1) as f32);
        let dx = self.end.x - self.start.x;
        let dy = self.end.y - self.start.y;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;
        let edges = [
            (-dx, self.start.x),
            (dx, x_max - self.start.x),
            (-dy, self.start.y),
            (dy, y_max - self.start.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some(Segment::new(
            PointF::new(self.start.x + t0 * dx, self.start.y + t0 * dy),
            PointF::new(self.start.x + t1 * dx, self.start.y + t1 * dy),
        ))
    }
}

/// Cross product of (first - start) and (second - start).
/// Positive, negative or zero depending on which side of start->first the second point lies.
pub fn direction(start: &PointF, first: &PointF, second: &PointF) -> f32 {
    (first.x - start.x) * (second.y - start.y) - (second.x - start.x) * (first.y - start.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_segments() {
        let a = Segment::new(PointF::new(0.0, 0.0), PointF::new(10.0, 10.0));
        let b = Segment::new(PointF::new(0.0, 10.0), PointF::new(10.0, 0.0));
        assert!(a.intersects(&b));
        let c = Segment::new(PointF::new(20.0, 0.0), PointF::new(30.0, 10.0));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_touching_segments() {
        let a = Segment::new(PointF::new(0.0, 0.0), PointF::new(10.0, 0.0));
        let b = Segment::new(PointF::new(5.0, 0.0), PointF::new(5.0, 8.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Collinear, but disjoint
        let c = Segment::new(PointF::new(11.0, 0.0), PointF::new(15.0, 0.0));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_unit_normal() {
        let a = Segment::new(PointF::new(0.0, 0.0), PointF::new(4.0, 0.0));
        assert_eq!(a.unit_normal(), Some(PointF::new(0.0, 1.0)));
        let zero = Segment::new(PointF::new(2.0, 2.0), PointF::new(2.0, 2.0));
        assert_eq!(zero.unit_normal(), None);
    }

    #[test]
    fn test_clipping() {
        let ray = Segment::new(PointF::new(50.0, 50.0), PointF::new(50.0, 1000.0));
        let clipped = ray.clipped(100, 100).unwrap();
        assert_eq!(clipped.start, PointF::new(50.0, 50.0));
        assert!((clipped.end.x - 50.0).abs() < 1e-3);
        assert!((clipped.end.y - 99.0).abs() < 1e-3);
        let outside = Segment::new(PointF::new(200.0, 200.0), PointF::new(300.0, 300.0));
        assert!(outside.clipped(100, 100).is_none());
    }
}
