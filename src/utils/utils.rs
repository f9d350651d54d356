use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }
    /// Smallest rectangle holding every point. Extent is inclusive, so a single point
    /// gives a 1x1 rectangle. Empty input gives the zero rectangle.
    pub fn bounding(points: &[Point]) -> Self {
        let Some(first) = points.first() else {
            return Rect::default();
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in points.iter().skip(1) {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
    }
    pub fn right(&self) -> i32 {
        self.x + self.width
    }
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
    /// Overlapping region of two rectangles, if their intersection area is non-zero
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl From<Point> for imageproc::point::Point<i32> {
    fn from(p: Point) -> Self {
        imageproc::point::Point::new(p.x, p.y)
    }
}

impl From<imageproc::point::Point<i32>> for Point {
    fn from(p: imageproc::point::Point<i32>) -> Self {
        Point::new(p.x, p.y)
    }
}

pub fn euclidean_distance(p1: &Point, p2: &Point) -> f32 {
    let dx = (p1.x - p2.x) as f32;
    let dy = (p1.y - p2.y) as f32;
    f32::sqrt(dx * dx + dy * dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_euclidean_distance() {
        let p1 = Point::new(341, 264);
        let p2 = Point::new(421, 427);
        let ans = euclidean_distance(&p1, &p2);
        assert!((ans - 181.57367).abs() < 1e-4);
    }
    #[test]
    fn test_bounding_rect() {
        let points = vec![Point::new(3, 4), Point::new(12, 4), Point::new(12, 8), Point::new(3, 8)];
        assert_eq!(Rect::bounding(&points), Rect::new(3, 4, 10, 5));
        assert_eq!(Rect::bounding(&[]), Rect::default());
    }
    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Some(Rect::new(5, 5, 5, 5)));
        // Touching edges share no area
        let c = Rect::new(10, 0, 5, 5);
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }
}
