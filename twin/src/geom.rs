//! Points and rectangles in the two fixed-point coordinate systems.
use derive_more::{Add, AddAssign, Neg, Sub, SubAssign};
use fxp::{DFixed, Fixed, SFixed};

/// Integer pixel coordinate.
pub type Coord = i16;

/// A point in Q15.16 user coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Add, AddAssign, Sub, SubAssign, Neg,
)]
pub struct Point {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point {
    pub const fn new(x: Fixed, y: Fixed) -> Point {
        Point { x, y }
    }
}

/// A point on the rasterizer's Q11.4 sub-pixel grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Add, AddAssign, Sub, SubAssign, Neg,
)]
pub struct SPoint {
    pub x: SFixed,
    pub y: SFixed,
}

impl SPoint {
    pub const fn new(x: SFixed, y: SFixed) -> SPoint {
        SPoint { x, y }
    }

    /// Squared euclidean distance to `other`, exact in [`DFixed`].
    pub fn distance_to_point_squared(self, other: SPoint) -> DFixed {
        let dx = (other.x.0 - self.x.0) as i32;
        let dy = (other.y.0 - self.y.0) as i32;
        DFixed(dx * dx + dy * dy)
    }

    /// Upper bound on the squared distance from `self` to the line through
    /// `p1` and `p2`.
    ///
    /// The line is converted to the normal form `Ax + By + C = 0`; nearly
    /// degenerate lines (and huge numerators that would overflow the
    /// division) fall back to the distance to `p1`.
    pub fn distance_to_line_squared(self, p1: SPoint, p2: SPoint) -> DFixed {
        let a = (p2.y.0 - p1.y.0) as i32;
        let b = (p1.x.0 - p2.x.0) as i32;
        let c = p1.y.0 as i32 * p2.x.0 as i32 - p1.x.0 as i32 * p2.y.0 as i32;

        let mut num = a * self.x.0 as i32 + b * self.y.0 as i32 + c;
        if num < 0 {
            num = -num;
        }
        let den = a * a + b * b;
        if den == 0 || num >= 0x8000 {
            self.distance_to_point_squared(p1)
        } else {
            DFixed((num * num) / den)
        }
    }
}

/// An axis-aligned rectangle in integer pixels: inclusive left/top,
/// exclusive right/bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: Coord,
    pub top: Coord,
    pub right: Coord,
    pub bottom: Coord,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    pub const fn new(left: Coord, top: Coord, right: Coord, bottom: Coord) -> Rect {
        Rect {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn of_size(width: Coord, height: Coord) -> Rect {
        Rect {
            left: 0,
            top: 0,
            right: width,
            bottom: height,
        }
    }

    pub fn width(&self) -> Coord {
        self.right - self.left
    }

    pub fn height(&self) -> Coord {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn contains(&self, x: Coord, y: Coord) -> bool {
        self.left <= x && x < self.right && self.top <= y && y < self.bottom
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let r = Rect {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        };
        if r.is_empty() {
            Rect::ZERO
        } else {
            r
        }
    }

    /// Union, with empty rectangles acting as the identity.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn translate(&self, dx: Coord, dy: Coord) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sp(x: i16, y: i16) -> SPoint {
        SPoint::new(SFixed(x), SFixed(y))
    }

    #[test]
    fn rect_ops() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 8);
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 10, 8));
        assert_eq!(a.union(&b), Rect::new(0, 0, 20, 10));
        assert_eq!(a.intersection(&Rect::new(20, 20, 30, 30)), Rect::ZERO);
        assert_eq!(Rect::ZERO.union(&b), b);
        assert!(a.contains(0, 0));
        assert!(!a.contains(10, 0));
    }

    #[test]
    fn line_distance() {
        // horizontal line y = 0
        let p1 = sp(0, 0);
        let p2 = sp(100, 0);
        assert_eq!(sp(50, 16).distance_to_line_squared(p1, p2), DFixed(256));
        assert_eq!(sp(50, 0).distance_to_line_squared(p1, p2), DFixed(0));
        // degenerate line collapses to point distance
        assert_eq!(
            sp(3, 4).distance_to_line_squared(p1, p1),
            DFixed(9 + 16)
        );
    }
}
