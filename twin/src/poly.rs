//! Supersampled polygon scan conversion into an A8 coverage mask.
//!
//! Sample rows are a quarter pixel high and sample columns a quarter pixel
//! wide, so a fully covered pixel accumulates sixteen table entries that
//! sum to 0xff. Edges carry Bresenham state stepped per sample row and an
//! adaptive anti-aliasing grade: spans bounded on both sides by perfectly
//! vertical edges are wide-filled with constant per-column coverage,
//! everything else goes through the 4×4 coverage table.
use fxp::{DFixed, SFixed};

use crate::geom::{Coord, SPoint};
use crate::path::Path;
use crate::pixel::sat;
use crate::pixmap::Pixmap;

/// log2 of the per-axis sample count: a 4×4 grid per pixel.
pub const POLY_SHIFT: u32 = 2;
const POLY_FIXED_SHIFT: u32 = 4 - POLY_SHIFT;
/// Samples per pixel along one axis.
pub const POLY_SAMPLE: i32 = 1 << POLY_SHIFT;
const POLY_MASK: i32 = POLY_SAMPLE - 1;
/// Sub-pixel height of one sample row.
pub const POLY_STEP: i16 = (SFixed::ONE.0 >> POLY_SHIFT) as i16;
const POLY_START: i16 = POLY_STEP >> 1;

/// Anti-aliasing grade of an edge: `0` for a perfectly vertical edge whose
/// coverage cannot vary horizontally, `2` for the full 4×4 grid.
type AaQuality = u8;

#[derive(Debug, Clone)]
struct Edge {
    top: SFixed,
    bot: SFixed,
    x: SFixed,
    e: DFixed,
    dx: SFixed,
    dy: SFixed,
    inc_x: i16,
    step_x: SFixed,
    winding: i32,
    aa_quality: AaQuality,
}

fn compute_aa_quality(dx: SFixed) -> AaQuality {
    // Only perfectly vertical edges take the cheap path; everything else
    // keeps full quality, which matters for text, curves, and diagonals.
    if dx.0 == 0 {
        0
    } else {
        2
    }
}

/// Nearest sample-grid coordinate not less than `f`. Sample rows live at
/// `POLY_STEP/2 + n*POLY_STEP`.
fn grid_ceil(f: SFixed) -> SFixed {
    SFixed(((f.0 + (POLY_START - 1)) & !(POLY_STEP - 1)) + POLY_START)
}

impl Edge {
    fn step_by(&mut self, dy: SFixed) {
        let e = self.e.0 + dy.0 as i32 * self.dx.0 as i32;
        let x = self.x.0 as i32
            + self.step_x.0 as i32 * dy.0 as i32
            + self.inc_x as i32 * (e / self.dy.0 as i32);
        self.x = SFixed(x as i16);
        self.e = DFixed(e % self.dy.0 as i32);
    }
}

/// Build scan edges for one closed polygon, offset by `(dx, dy)` and
/// snapped to the first sample row at or below each edge's top.
fn edge_build(
    vertices: &[SPoint],
    edges: &mut Vec<Edge>,
    dx: SFixed,
    dy: SFixed,
    top_y: SFixed,
) {
    let n = vertices.len();
    for v in 0..n {
        let nv = if v + 1 == n { 0 } else { v + 1 };

        // horizontal edges contribute no winding
        if vertices[v].y == vertices[nv].y {
            continue;
        }

        let (winding, tv, bv) = if vertices[v].y < vertices[nv].y {
            (1, v, nv)
        } else {
            (-1, nv, v)
        };

        // snap top to the first sample row inside the pixmap
        let mut y = grid_ceil(SFixed(vertices[tv].y.0 + dy.0));
        if y.0 < POLY_START + top_y.0 {
            y = SFixed(POLY_START + top_y.0);
        }

        // skip edges that don't span a sample row
        if y.0 >= vertices[bv].y.0 + dy.0 {
            continue;
        }

        let mut edx = vertices[bv].x - vertices[tv].x;
        let edy = vertices[bv].y - vertices[tv].y;

        let aa_quality = compute_aa_quality(edx);
        debug_assert!(aa_quality == 0 || aa_quality == 2);

        let inc_x: i16 = if edx.0 >= 0 {
            1
        } else {
            edx = -edx;
            -1
        };
        let step_x = SFixed((inc_x as i32 * (edx.0 as i32 / edy.0 as i32)) as i16);
        let edx = SFixed((edx.0 as i32 % edy.0 as i32) as i16);

        let mut edge = Edge {
            top: SFixed(vertices[tv].y.0 + dy.0),
            bot: SFixed(vertices[bv].y.0 + dy.0),
            x: SFixed(vertices[tv].x.0 + dx.0),
            e: DFixed(0),
            dx: edx,
            dy: edy,
            inc_x,
            step_x,
            winding,
            aa_quality,
        };

        // step to the first sample row
        edge.step_by(SFixed(y.0 - edge.top.0));
        edge.top = y;
        edges.push(edge);
    }
}

/// Coverage contribution of each 4×4 sub-pixel sample. Every full pixel
/// sums to exactly 0xff; the short entry on row 2 makes up the rounding.
static COVERAGE: [[u8; 4]; 4] = [
    [0x10, 0x10, 0x10, 0x10],
    [0x10, 0x10, 0x10, 0x10],
    [0x0f, 0x10, 0x10, 0x10],
    [0x10, 0x10, 0x10, 0x10],
];

fn clip_span_to_samples(pixmap: &Pixmap, left: SFixed, right: SFixed) -> (i32, i32) {
    let mut left = left;
    let mut right = right;

    if left < SFixed::from_int(pixmap.clip.left as i32) {
        left = SFixed::from_int(pixmap.clip.left as i32);
    }
    if right > SFixed::from_int(pixmap.clip.right as i32) {
        right = SFixed::from_int(pixmap.clip.right as i32);
    }

    (
        (grid_ceil(left).0 >> POLY_FIXED_SHIFT) as i32,
        (grid_ceil(right).0 >> POLY_FIXED_SHIFT) as i32,
    )
}

/// General span fill through the coverage table.
fn span_fill(pixmap: &mut Pixmap, y: SFixed, left: SFixed, right: SFixed) {
    let cover = &COVERAGE[((y.0 >> POLY_FIXED_SHIFT) & POLY_MASK as i16) as usize];

    let (left, right) = clip_span_to_samples(pixmap, left, right);
    if right <= left {
        return;
    }

    let row = y.trunc() as Coord;
    let row_left = (left >> POLY_SHIFT) as Coord;
    let row_right = ((right + POLY_MASK) >> POLY_SHIFT) as Coord;
    let span = pixmap.a8_row_mut(row_left, row, (row_right - row_left) as usize);

    let mut x = left;
    let mut s = 0usize;

    // leading partial pixel
    if x & POLY_MASK != 0 {
        let mut w = 0u16;
        let mut col = 0;
        while x < right && (x & POLY_MASK) != 0 {
            w += cover[col] as u16;
            col += 1;
            x += 1;
        }
        let a = span[s] as u16 + w;
        span[s] = sat(a);
        s += 1;
    }

    let full: u16 = cover.iter().map(|&c| c as u16).sum();

    // full pixels
    while x + POLY_MASK < right {
        let a = span[s] as u16 + full;
        span[s] = sat(a);
        s += 1;
        x += POLY_SAMPLE;
    }

    // trailing partial pixel
    if right & POLY_MASK != 0 && x != right {
        let mut w = 0u16;
        let mut col = 0;
        while x < right {
            w += cover[col] as u16;
            col += 1;
            x += 1;
        }
        let a = span[s] as u16 + w;
        span[s] = sat(a);
    }
}

/// Fast fill for spans bounded by two perfectly vertical edges: coverage
/// cannot vary across the pixel, so every sub-column contributes a
/// constant 0x10. (Sample row 2 is nominally a notch short; the constant
/// overshoots it by 1/255, invisible and much cheaper.)
fn span_fill_vertical(pixmap: &mut Pixmap, y: SFixed, left: SFixed, right: SFixed) {
    const FULL_COVERAGE: u16 = 0x40;

    let (left, right) = clip_span_to_samples(pixmap, left, right);
    if right <= left {
        return;
    }

    let row = y.trunc() as Coord;
    let row_left = (left >> POLY_SHIFT) as Coord;
    let row_right = ((right + POLY_MASK) >> POLY_SHIFT) as Coord;
    let span = pixmap.a8_row_mut(row_left, row, (row_right - row_left) as usize);

    let mut x = left;
    let mut s = 0usize;

    if x & POLY_MASK != 0 {
        let mut count = 0u16;
        while x < right && (x & POLY_MASK) != 0 {
            count += 1;
            x += 1;
        }
        let a = span[s] as u16 + count * 0x10;
        span[s] = sat(a);
        s += 1;
    }

    while x + POLY_MASK < right {
        let a = span[s] as u16 + FULL_COVERAGE;
        span[s] = sat(a);
        s += 1;
        x += POLY_SAMPLE;
    }

    if right & POLY_MASK != 0 && x != right {
        let mut count = 0u16;
        while x < right {
            count += 1;
            x += 1;
        }
        let a = span[s] as u16 + count * 0x10;
        span[s] = sat(a);
    }
}

/// Minimum span width (in samples) for the vertical fast path; narrower
/// spans don't amortize the branch.
const VERTICAL_SPAN_MIN: i16 = 16 << POLY_FIXED_SHIFT;

fn edge_fill(pixmap: &mut Pixmap, edges: &mut Vec<Edge>) {
    if edges.is_empty() {
        return;
    }
    edges.sort_by_key(|e| e.top);

    // active edge list, sorted by current x
    let mut active: Vec<usize> = Vec::new();
    let mut e = 0;
    let mut y = edges[0].top;

    loop {
        // splice in edges that start at or above this sample row
        while e < edges.len() && edges[e].top <= y {
            let x = edges[e].x;
            let pos = active
                .iter()
                .position(|&a| edges[a].x > x)
                .unwrap_or(active.len());
            active.insert(pos, e);
            e += 1;
        }

        // walk this sample row accumulating winding
        let mut w = 0;
        let mut x0 = SFixed(0);
        let mut span_start: Option<usize> = None;
        for &ai in active.iter() {
            if w == 0 {
                x0 = edges[ai].x;
                span_start = Some(ai);
            }
            w += edges[ai].winding;
            if w != 0 {
                continue;
            }

            let x1 = edges[ai].x;
            let wide_vertical = span_start
                .map(|si| {
                    edges[si].dx.0 == 0 && edges[ai].dx.0 == 0 && (x1.0 - x0.0) >= VERTICAL_SPAN_MIN
                })
                .unwrap_or(false);
            if wide_vertical {
                span_fill_vertical(pixmap, y, x0, x1);
            } else {
                span_fill(pixmap, y, x0, x1);
            }
        }

        // step down one sample row, clipping to the pixmap
        y = SFixed(y.0 + POLY_STEP);
        if y.trunc() >= pixmap.clip.bottom as i32 {
            break;
        }

        // drop finished edges
        active.retain(|&ai| edges[ai].bot > y);

        if active.is_empty() && e == edges.len() {
            break;
        }

        // step the survivors and fix the x order with one bubble pass
        for &ai in active.iter() {
            let step = SFixed(POLY_STEP);
            edges[ai].step_by(step);
        }
        let mut i = 0;
        while i + 1 < active.len() {
            if edges[active[i]].x > edges[active[i + 1]].x {
                active.swap(i, i + 1);
                if i > 0 {
                    i -= 1;
                }
            } else {
                i += 1;
            }
        }
    }
}

/// Rasterize `path` into the A8 `pixmap`, offset by `(dx, dy)` pixels plus
/// the pixmap's drawing origin, accumulating coverage saturating at 0xff.
pub fn fill_path(pixmap: &mut Pixmap, path: &Path, dx: Coord, dy: Coord) {
    let sdx = SFixed::from_int((dx + pixmap.origin_x) as i32);
    let sdy = SFixed::from_int((dy + pixmap.origin_y) as i32);
    let top_y = SFixed::from_int(pixmap.clip.top as i32);

    let mut edges = Vec::with_capacity(path.points().len() + 1);
    for subpath in path.subpaths() {
        if subpath.len() > 1 {
            edge_build(subpath, &mut edges, sdx, sdy, top_y);
        }
    }
    edge_fill(pixmap, &mut edges);
}
