//! Stack blur over a rectangular region of an ARGB32 pixmap.
//!
//! Two 1-D passes (horizontal, then vertical) replace the O(k²) per-pixel
//! convolution. Each pass keeps three running per-channel sums - the
//! incoming ramp, the outgoing ramp, and the stack total - initialized by
//! radius-weighted padding from the edge pixel, and emits
//! `sum / (radius + 1)²` per pixel.
use crate::geom::Coord;
use crate::pixel::Format;
use crate::pixmap::Pixmap;

/// Per-channel accumulator: a, r, g, b.
#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    c: [u32; 4],
}

impl Sums {
    fn add(&mut self, p: u32) {
        for (i, c) in self.c.iter_mut().enumerate() {
            *c += (p >> (i * 8)) & 0xff;
        }
    }

    fn sub(&mut self, p: u32) {
        for (i, c) in self.c.iter_mut().enumerate() {
            *c -= (p >> (i * 8)) & 0xff;
        }
    }

    fn add_sums(&mut self, other: &Sums) {
        for (c, o) in self.c.iter_mut().zip(&other.c) {
            *c += o;
        }
    }

    fn sub_sums(&mut self, other: &Sums) {
        for (c, o) in self.c.iter_mut().zip(&other.c) {
            *c -= o;
        }
    }

    fn pixel(&self, den: u32) -> u32 {
        let mut out = 0u32;
        for (i, c) in self.c.iter().enumerate() {
            out |= ((c / den) & 0xff) << (i * 8);
        }
        out
    }
}

fn get(px: &Pixmap, x: Coord, y: Coord) -> u32 {
    px.argb32_row(x, y, 1)[0]
}

/// One blur pass. `first` spans the unblurred dimension, `second` the
/// scan direction; `horiz` selects which of the two is x.
fn blur_pass(
    trg: &mut Pixmap,
    src: &Pixmap,
    radius: Coord,
    first: (Coord, Coord),
    second: (Coord, Coord),
    horiz: bool,
) {
    let den = (radius as u32 + 1) * (radius as u32 + 1);
    let (second_str, second_end) = second;
    let last = second_end - 1;

    for first_i in first.0..first.1 {
        let fetch = |i: Coord| -> u32 {
            let i = i.max(second_str).min(last);
            if horiz {
                get(src, i, first_i)
            } else {
                get(src, first_i, i)
            }
        };

        let mut sum_in = Sums::default();
        let mut sum_out = Sums::default();
        let mut sum = Sums::default();

        // pad the outgoing side with the edge pixel
        let edge = fetch(second_str);
        for i in 0..radius {
            sum_out.add(edge);
            for _ in 0..i + 1 {
                sum.add(edge);
            }
        }

        // prime the incoming side from the first pixels
        for i in second_str..second_str + radius {
            let p = fetch(i);
            sum_in.add(p);
            for _ in 0..radius - (i - second_str) {
                sum.add(p);
            }
        }

        for cur in second_str..second_end {
            let p_cur = fetch(cur);
            let p_old = fetch(cur - radius);
            let p_new = fetch(cur + radius);

            sum_out.add(p_cur);
            sum_in.add(p_new);
            sum.add_sums(&sum_in);

            let out = sum.pixel(den);
            if horiz {
                trg.argb32_row_mut(cur, first_i, 1)[0] = out;
            } else {
                trg.argb32_row_mut(first_i, cur, 1)[0] = out;
            }

            sum.sub_sums(&sum_out);
            sum_out.sub(p_old);
            sum_in.sub(p_cur);
        }
    }
}

/// Blur `px` inside `[left, right) × [top, bottom)` with the given
/// radius, clamped to 1..=15. Only ARGB32 pixmaps are supported.
pub fn stack_blur(
    px: &mut Pixmap,
    radius: Coord,
    left: Coord,
    right: Coord,
    top: Coord,
    bottom: Coord,
) {
    if px.format() != Format::Argb32 {
        return;
    }
    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(px.width());
    let bottom = bottom.min(px.height());
    if left >= right || top >= bottom {
        return;
    }
    let radius = radius.max(1).min(15);

    let mut tmp = Pixmap::new(Format::Argb32, px.width(), px.height());
    for y in 0..px.height() {
        let w = px.width() as usize;
        tmp.argb32_row_mut(0, y, w)
            .copy_from_slice(px.argb32_row(0, y, w));
    }

    // horizontal into the scratch copy, vertical back into place
    blur_pass(&mut tmp, px, radius, (top, bottom), (left, right), true);
    blur_pass(px, &tmp, radius, (left, right), (top, bottom), false);
}
