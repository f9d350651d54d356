use crate::tracking::Contour;
use crate::utils::Point;

/// 20-vertex ellipse-like worm centered at the origin with area of exactly 700 px²
pub const WORM_700: [(i32, i32); 20] = [
    (27, 0),
    (25, 3),
    (22, 5),
    (16, 7),
    (8, 8),
    (0, 8),
    (-8, 8),
    (-16, 7),
    (-22, 5),
    (-25, 3),
    (-27, 0),
    (-25, -3),
    (-22, -5),
    (-16, -7),
    (-8, -8),
    (0, -8),
    (8, -8),
    (16, -7),
    (22, -5),
    (25, -3),
];

/// 20-vertex ellipse-like worm centered at the origin with area of exactly 600 px²
pub const WORM_600: [(i32, i32); 20] = [
    (26, 0),
    (25, 2),
    (21, 4),
    (16, 6),
    (8, 7),
    (0, 8),
    (-8, 7),
    (-16, 6),
    (-21, 4),
    (-25, 2),
    (-26, 0),
    (-25, -2),
    (-21, -4),
    (-16, -6),
    (-8, -7),
    (0, -8),
    (8, -7),
    (16, -6),
    (21, -4),
    (25, -2),
];

/// Builds a contour from a template shifted by (dx, dy)
pub fn contour_from(template: &[(i32, i32)], dx: i32, dy: i32) -> Contour {
    let points = template
        .iter()
        .map(|&(x, y)| Point::new(x + dx, y + dy))
        .collect();
    Contour::new(points).unwrap()
}

/// Same template with vertex order rotated so that `first` becomes vertex 0
pub fn rotated_contour(template: &[(i32, i32)], first: usize, dx: i32, dy: i32) -> Contour {
    let points = template
        .iter()
        .cycle()
        .skip(first)
        .take(template.len())
        .map(|&(x, y)| Point::new(x + dx, y + dy))
        .collect();
    Contour::new(points).unwrap()
}

/// Axis-aligned rectangle with an extra vertex in the middle of every side (8 vertices)
pub fn rectangle_contour(x: i32, y: i32, width: i32, height: i32) -> Contour {
    Contour::new(vec![
        Point::new(x, y),
        Point::new(x + width / 2, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height / 2),
        Point::new(x + width, y + height),
        Point::new(x + width / 2, y + height),
        Point::new(x, y + height),
        Point::new(x, y + height / 2),
    ])
    .unwrap()
}
