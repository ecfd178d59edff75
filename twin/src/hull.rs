//! Convex hull of a path's points, needed to turn an arbitrary pen path
//! into the convex polygon the stroke convolution walks.
use fxp::SFixed;

use crate::geom::SPoint;
use crate::path::Path;

#[derive(Debug, Clone, Copy)]
struct Slope {
    dx: SFixed,
    dy: SFixed,
}

impl Slope {
    fn new(a: SPoint, b: SPoint) -> Slope {
        Slope {
            dx: b.x - a.x,
            dy: b.y - a.y,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct HullVertex {
    point: SPoint,
    slope: Slope,
    discard: bool,
}

/// Compare two slopes by angle from the positive x axis, increasing toward
/// positive y. Only valid when the angular difference is below half a turn;
/// the Graham scan guarantees that. Zero-length slopes order last against
/// anything.
fn slope_compare(a: Slope, b: Slope) -> i32 {
    let diff = a.dy.to_dfixed().0 as i64 * b.dx.to_dfixed().0 as i64
        - b.dy.to_dfixed().0 as i64 * a.dx.to_dfixed().0 as i64;
    if diff > 0 {
        return 1;
    }
    if diff < 0 {
        return -1;
    }
    if a.dx.0 == 0 && a.dy.0 == 0 {
        return 1;
    }
    if b.dx.0 == 0 && b.dy.0 == 0 {
        return -1;
    }
    0
}

fn create(path: &Path) -> Vec<HullVertex> {
    let p = path.points();
    let n = p.len();

    // bottom-most, then left-most extremum becomes the pivot
    let mut e = 0;
    for i in 1..n {
        if p[i].y < p[e].y || (p[i].y == p[e].y && p[i].x < p[e].x) {
            e = i;
        }
    }

    (0..n)
        .map(|i| {
            // place the extremum first
            let j = if i == 0 {
                e
            } else if i == e {
                0
            } else {
                i
            };
            let point = p[j];
            let slope = Slope::new(p[e], point);
            HullVertex {
                point,
                slope,
                // points coincident with the pivot contribute nothing
                discard: i != 0 && slope.dx.0 == 0 && slope.dy.0 == 0,
            }
        })
        .collect()
}

fn prev_valid(hull: &[HullVertex], mut index: usize) -> usize {
    // index 0 is the pivot and never discarded, so no wraparound
    loop {
        index -= 1;
        if !hull[index].discard {
            return index;
        }
    }
}

fn next_valid(hull: &[HullVertex], mut index: usize) -> usize {
    loop {
        index = (index + 1) % hull.len();
        if !hull[index].discard {
            return index;
        }
    }
}

/// The Graham scan proper: walk the angularly sorted vertices and discard
/// every one that forms a concave corner.
fn eliminate_concave(hull: &mut [HullVertex]) {
    let mut i = 0;
    let mut j = next_valid(hull, i);
    let mut k = next_valid(hull, j);

    loop {
        let slope_ij = Slope::new(hull[i].point, hull[j].point);
        let slope_jk = Slope::new(hull[j].point, hull[k].point);

        if slope_compare(slope_ij, slope_jk) >= 0 {
            if i == k {
                break;
            }
            hull[j].discard = true;
            j = i;
            i = prev_valid(hull, j);
        } else {
            i = j;
            j = k;
            k = next_valid(hull, j);
        }
        if j == 0 {
            break;
        }
    }
}

/// Convex hull of all points in `path`, as a new single-subpath path
/// wound counter-clockwise starting from the bottom-most point.
pub(crate) fn convex_hull(path: &Path) -> Path {
    if path.points().len() < 3 {
        let mut out = Path::new();
        out.append(path);
        return out;
    }

    let mut hull = create(path);

    // sort by slope from the pivot; ties discard the nearer point
    hull[1..].sort_by(|a, b| {
        use std::cmp::Ordering;
        match slope_compare(a.slope, b.slope) {
            1 => Ordering::Greater,
            -1 => Ordering::Less,
            _ => {
                let a_dist = a.slope.dx.to_dfixed().0 as i64 * a.slope.dx.to_dfixed().0 as i64
                    + a.slope.dy.to_dfixed().0 as i64 * a.slope.dy.to_dfixed().0 as i64;
                let b_dist = b.slope.dx.to_dfixed().0 as i64 * b.slope.dx.to_dfixed().0 as i64
                    + b.slope.dy.to_dfixed().0 as i64 * b.slope.dy.to_dfixed().0 as i64;
                if a_dist < b_dist {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
        }
    });

    // equal-slope runs keep only the farthest point (the sort above put
    // the nearer ones first)
    for w in 0..hull.len().saturating_sub(2) {
        let (i, j) = (w + 1, w + 2);
        if !hull[i].discard && slope_compare(hull[i].slope, hull[j].slope) == 0 {
            hull[i].discard = true;
        }
    }

    if hull.iter().filter(|v| !v.discard).count() >= 3 {
        eliminate_concave(&mut hull);
    }

    let mut out = Path::new();
    for v in hull.iter().filter(|v| !v.discard) {
        out.sdraw(v.point.x, v.point.y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxp::Fixed;

    fn hull_points(pts: &[(i32, i32)]) -> Vec<(i32, i32)> {
        let mut p = Path::new();
        for &(x, y) in pts {
            p.draw(Fixed::from_int(x), Fixed::from_int(y));
        }
        let h = convex_hull(&p);
        h.points()
            .iter()
            .map(|pt| (pt.x.trunc(), pt.y.trunc()))
            .collect()
    }

    #[test]
    fn square_with_interior_point() {
        let h = hull_points(&[(0, 0), (4, 0), (2, 2), (4, 4), (0, 4)]);
        assert_eq!(h.len(), 4);
        assert!(!h.contains(&(2, 2)));
        for corner in &[(0, 0), (4, 0), (4, 4), (0, 4)] {
            assert!(h.contains(corner), "missing {:?} in {:?}", corner, h);
        }
    }

    #[test]
    fn collinear_keeps_farthest() {
        let h = hull_points(&[(0, 0), (2, 0), (4, 0), (4, 4), (0, 4)]);
        assert!(!h.contains(&(2, 0)), "{:?}", h);
        assert!(h.contains(&(4, 0)));
    }

    #[test]
    fn triangle_is_its_own_hull() {
        let h = hull_points(&[(0, 0), (4, 0), (2, 4)]);
        assert_eq!(h.len(), 3);
    }
}
