//! Stroking by convolution: the stroked outline is the Minkowski sum of
//! the stroke path with a convex pen polygon.
//!
//! The walker advances along the stroke and around the pen simultaneously,
//! emitting the sum of the current stroke vertex and pen vertex. Whichever
//! ring's edge turns first (by cross-product sign) is the one stepped, so
//! joins fall out of the walk with no special casing. Each subpath is
//! walked forward, capped, walked backward, capped again, and closed.
use fxp::SFixed;

use crate::geom::SPoint;
use crate::hull::convex_hull;
use crate::path::{CapStyle, Path};

/// The index of the pen point farthest left of the directed line `p1→p2`.
fn leftpoint(pen: &[SPoint], p1: SPoint, p2: SPoint) -> usize {
    // Normal form of the line is Ax + By + C = 0; C does not matter for
    // an argmax across points.
    let ap = (p2.y - p1.y).to_dfixed().0 as i64;
    let bp = (p1.x - p2.x).to_dfixed().0 as i64;

    let mut best = 0;
    let mut max = i64::min_value();
    for (i, p) in pen.iter().enumerate() {
        let vp = ap * p.x.0 as i64 + bp * p.y.0 as i64;
        if vp > max {
            max = vp;
            best = i;
        }
    }
    best
}

/// Sign of the turn from the direction `a1→a2` to `b1→b2`.
fn around_order(a1: SPoint, a2: SPoint, b1: SPoint, b2: SPoint) -> i32 {
    let adx = (a2.x - a1.x).to_dfixed().0 as i64;
    let ady = (a2.y - a1.y).to_dfixed().0 as i64;
    let bdx = (b2.x - b1.x).to_dfixed().0 as i64;
    let bdy = (b2.y - b1.y).to_dfixed().0 as i64;
    let diff = ady * bdx - bdy * adx;
    if diff < 0 {
        -1
    } else if diff > 0 {
        1
    } else {
        0
    }
}

fn add(a: SPoint, b: SPoint) -> (SFixed, SFixed) {
    (a.x + b.x, a.y + b.y)
}

/// Convolve one subpath with the convex pen; appends one closed outline.
fn subpath_convolve(path: &mut Path, sp: &[SPoint], pp: &[SPoint], cap_style: CapStyle) {
    let ns = sp.len();
    let np = pp.len();

    let start = leftpoint(pp, sp[0], sp[1]);
    let ret = leftpoint(pp, sp[ns - 1], sp[ns - 2]);

    let mut s = 0usize;
    let mut p = start;
    {
        let (x, y) = add(sp[s], pp[p]);
        path.smove(x, y);
    }
    let first = path.len() - 1;

    // step along the stroke forward first, then return
    let mut inc = 1i32;
    let mut starget = ns - 1;
    let mut ptarget = ret;
    loop {
        // convolve the edges
        loop {
            let sn = (s as i32 + inc) as usize;
            let pn = if p == np - 1 { 0 } else { p + 1 };
            let pm = if p == 0 { np - 1 } else { p - 1 };

            // step around the pen (either direction) or along the stroke
            if around_order(sp[s], sp[sn], pp[p], pp[pn]) > 0 {
                p = pn;
            } else if around_order(sp[s], sp[sn], pp[pm], pp[p]) < 0 {
                p = pm;
            } else {
                s = sn;
            }
            let (x, y) = add(sp[s], pp[p]);
            path.sdraw(x, y);
            if s == starget {
                break;
            }
        }

        // cap this end
        match cap_style {
            CapStyle::Projecting => {
                // Project the line forward one pen radius by finding the
                // pen location halfway between the two normals, then add
                // that vector to the normals themselves. The result can
                // carry noticeable error, so the existing corners are
                // overwritten rather than joined to avoid a kink.
                let pm = if p <= ptarget {
                    (ptarget + p) >> 1
                } else {
                    let mut pm = (ptarget + np + p) >> 1;
                    if pm >= np {
                        pm -= np;
                    }
                    pm
                };

                // replace the last point with the cap corner
                path.pop_point();
                let (x, y) = (sp[s].x + pp[pm].x + pp[p].x, sp[s].y + pp[pm].y + pp[p].y);
                path.sdraw(x, y);
                p = ptarget;
                let (x, y) = (sp[s].x + pp[pm].x + pp[p].x, sp[s].y + pp[pm].y + pp[p].y);
                if inc == 1 {
                    // start the return edge at the other cap corner
                    path.sdraw(x, y);
                } else {
                    // overwrite the initial point
                    path.replace_point(first, SPoint::new(x, y));
                }
            }
            CapStyle::Butt => {
                // stop at the target's predecessor, then jump straight
                if ptarget == 0 {
                    p = np - 1;
                } else {
                    p = ptarget - 1;
                }
                while p != ptarget {
                    p += 1;
                    if p == np {
                        p = 0;
                    }
                    let (x, y) = add(sp[s], pp[p]);
                    path.sdraw(x, y);
                }
            }
            CapStyle::Round => {
                // continue around the pen to the return point
                while p != ptarget {
                    p += 1;
                    if p == np {
                        p = 0;
                    }
                    let (x, y) = add(sp[s], pp[p]);
                    path.sdraw(x, y);
                }
            }
        }

        if inc == -1 {
            break;
        }

        // reached the far end; walk back the other way
        inc = -1;
        ptarget = start;
        starget = 0;
    }
    path.close();
}

/// Append the convolution of every subpath of `stroke` (length ≥ 2) with
/// the convex hull of `pen` to `path`.
pub(crate) fn convolve(path: &mut Path, stroke: &Path, pen: &Path) {
    let hull = convex_hull(pen);
    let cap_style = path.current_cap_style();
    let pp = hull.points();
    if pp.is_empty() {
        return;
    }

    for sp in stroke.subpaths() {
        if sp.len() > 1 {
            subpath_convolve(path, sp, pp, cap_style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxp::Fixed;

    fn fi(i: i32) -> Fixed {
        Fixed::from_int(i)
    }

    fn pen(radius: i32) -> Path {
        let mut pen = Path::new();
        pen.circle(fi(0), fi(0), fi(radius));
        pen
    }

    #[test]
    fn horizontal_stroke_outline_bounds() {
        let mut stroke = Path::new();
        stroke.move_to(fi(2), fi(2));
        stroke.draw(fi(10), fi(2));

        let mut out = Path::new();
        out.set_cap_style(CapStyle::Round);
        convolve(&mut out, &stroke, &pen(2));

        // Minkowski sum of the segment with a radius-2 disk
        let b = out.bounds();
        assert_eq!(b.left, 0);
        assert_eq!(b.right, 12);
        assert_eq!(b.top, 0);
        assert_eq!(b.bottom, 4);
    }

    #[test]
    fn butt_cap_does_not_extend() {
        let mut stroke = Path::new();
        stroke.move_to(fi(2), fi(2));
        stroke.draw(fi(10), fi(2));

        let mut out = Path::new();
        out.set_cap_style(CapStyle::Butt);
        convolve(&mut out, &stroke, &pen(2));

        let b = out.bounds();
        // butt caps stop at the segment endpoints
        assert!(b.left >= 1 && b.right <= 11, "{:?}", b);
        assert_eq!((b.top, b.bottom), (0, 4));
    }

    #[test]
    fn multiple_subpaths_all_stroked() {
        let mut stroke = Path::new();
        stroke.move_to(fi(0), fi(0));
        stroke.draw(fi(4), fi(0));
        stroke.move_to(fi(0), fi(10));
        stroke.draw(fi(4), fi(10));

        let mut out = Path::new();
        convolve(&mut out, &stroke, &pen(1));
        assert_eq!(out.subpaths().count(), 2);
    }
}
