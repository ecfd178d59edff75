//! Recursive flattening of cubic Bézier splines onto a path.
use fxp::{DFixed, SFixed};

use crate::geom::SPoint;
use crate::path::Path;

#[derive(Debug, Clone, Copy)]
struct Spline {
    a: SPoint,
    b: SPoint,
    c: SPoint,
    d: SPoint,
}

fn lerp_half(a: SPoint, b: SPoint) -> SPoint {
    SPoint::new(
        SFixed(a.x.0 + ((b.x.0 - a.x.0) >> 1)),
        SFixed(a.y.0 + ((b.y.0 - a.y.0) >> 1)),
    )
}

fn de_casteljau(spline: Spline) -> (Spline, Spline) {
    let ab = lerp_half(spline.a, spline.b);
    let bc = lerp_half(spline.b, spline.c);
    let cd = lerp_half(spline.c, spline.d);
    let abbc = lerp_half(ab, bc);
    let bccd = lerp_half(bc, cd);
    let fin = lerp_half(abbc, bccd);

    (
        Spline {
            a: spline.a,
            b: ab,
            c: abbc,
            d: fin,
        },
        Spline {
            a: fin,
            b: bccd,
            c: cd,
            d: spline.d,
        },
    )
}

/// Upper bound on the squared error from approximating the spline with the
/// chord `a`–`d`: the farther of the two control points.
fn error_squared(spline: &Spline) -> DFixed {
    let berr = spline.b.distance_to_line_squared(spline.a, spline.d);
    let cerr = spline.c.distance_to_line_squared(spline.a, spline.d);
    berr.max(cerr)
}

fn decompose(path: &mut Path, spline: Spline, tolerance_squared: DFixed) {
    if error_squared(&spline) <= tolerance_squared {
        path.sdraw(spline.a.x, spline.a.y);
    } else {
        let (s1, s2) = de_casteljau(spline);
        decompose(path, s1, tolerance_squared);
        decompose(path, s2, tolerance_squared);
    }
}

/// Append the cubic spline from the path's current point through the two
/// control points to `(x3, y3)`, flattened to the quarter-pixel tolerance.
/// Coordinates are already on the sub-pixel grid.
pub(crate) fn scurve(
    path: &mut Path,
    x1: SFixed,
    y1: SFixed,
    x2: SFixed,
    y2: SFixed,
    x3: SFixed,
    y3: SFixed,
) {
    const TOLERANCE_SQUARED: DFixed =
        DFixed((SFixed::TOLERANCE.0 as i32) * (SFixed::TOLERANCE.0 as i32));

    let spline = Spline {
        a: path.current_spoint(),
        b: SPoint::new(x1, y1),
        c: SPoint::new(x2, y2),
        d: SPoint::new(x3, y3),
    };
    decompose(path, spline, TOLERANCE_SQUARED);
    path.sdraw(x3, y3);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxp::Fixed;

    #[test]
    fn straight_spline_stays_two_points() {
        let mut path = Path::new();
        path.move_to(Fixed(0), Fixed(0));
        // control points on the chord: no subdivision needed
        path.curve(
            Fixed::from_int(1),
            Fixed::from_int(1),
            Fixed::from_int(2),
            Fixed::from_int(2),
            Fixed::from_int(3),
            Fixed::from_int(3),
        );
        assert_eq!(path.points().len(), 2);
    }

    #[test]
    fn curved_spline_subdivides() {
        let mut path = Path::new();
        path.move_to(Fixed(0), Fixed(0));
        path.curve(
            Fixed::from_int(0),
            Fixed::from_int(10),
            Fixed::from_int(10),
            Fixed::from_int(10),
            Fixed::from_int(10),
            Fixed::from_int(0),
        );
        let pts = path.points();
        assert!(pts.len() > 4, "got {} points", pts.len());
        // all flattened points stay within the control hull
        for p in pts {
            assert!(p.x.0 >= 0 && p.x.0 <= SFixed::from_int(10).0);
            assert!(p.y.0 >= 0 && p.y.0 <= SFixed::from_int(10).0);
        }
    }
}
