//! Drop-shadow mask painting: precomputed Gaussian-approximating falloff
//! applied to the right and bottom margins of a window pixmap.
//!
//! The falloff weight is a 17-entry lookup of `(1 - t²)² · 0.92 + 0.08`
//! in Q16.16. The right and bottom strips each use a 1-D alpha ramp; the
//! corner multiplies the two. The bottom ramp and the vertical alpha ramp
//! are cached across frames and recomputed only when the width or the
//! base alpha changes.
use std::cell::RefCell;

use fxp::Fixed;

use crate::geom::Coord;
use crate::pixel::{A8, Argb32, Format};
use crate::pixmap::Pixmap;

/// Horizontal displacement of the shadow, in pixels.
pub const HORIZONTAL_OFFSET: Coord = 2;
/// Vertical displacement of the shadow, in pixels.
pub const VERTICAL_OFFSET: Coord = 2;
/// Stack-blur radius applied over the shadow strips.
pub const BLUR_RADIUS: Coord = 8;
/// Extra zero-weight tail after the offset ramp.
pub const FADE_TAIL: Coord = 4;

/// The pixmap margin a shadowed window reserves on the right and bottom.
pub const fn margins() -> (Coord, Coord) {
    (
        2 * HORIZONTAL_OFFSET + BLUR_RADIUS,
        2 * VERTICAL_OFFSET + BLUR_RADIUS,
    )
}

/// `(1 - t²)² · 0.92 + 0.08` at `t = i/16`, in Q16.16.
static GAUSSIAN_LUT: [i32; 17] = [
    65536, 65066, 63667, 61371, 58235, 54335, 49771, 44664, 39158, 33418, 27632, 22010, 16783,
    12206, 8555, 6127, 5243,
];

fn gaussian_weight(t: Fixed) -> i32 {
    if t.0 <= 0 {
        return GAUSSIAN_LUT[0];
    }
    if t >= Fixed::ONE {
        return GAUSSIAN_LUT[16];
    }
    let index = ((t.0 as i64 * 16 + 0x8000) >> 16) as usize;
    GAUSSIAN_LUT[index.min(16)]
}

#[derive(Default)]
struct BottomCache {
    weights: Vec<A8>,
    width: Coord,
}

#[derive(Default)]
struct AlphaYCache {
    ramp: Vec<A8>,
    alpha: A8,
    valid: bool,
}

thread_local! {
    static BOTTOM_CACHE: RefCell<BottomCache> = RefCell::new(BottomCache::default());
    static ALPHA_Y_CACHE: RefCell<AlphaYCache> = RefCell::new(AlphaYCache::default());
}

fn ramp(len: Coord, scale: u32) -> Vec<A8> {
    let step = if len > 1 {
        Fixed(Fixed::ONE.0 / (len as i32 - 1))
    } else {
        Fixed(0)
    };
    let mut t = Fixed(0);
    (0..len)
        .map(|_| {
            let w = gaussian_weight(t);
            if t < Fixed::ONE {
                t += step;
            }
            ((w as u32 * scale) >> 16) as A8
        })
        .collect()
}

/// Paint the shadow mask into the right/bottom margins of `shadow`.
///
/// `shadow_x`/`shadow_y` are the margin widths ([`margins`]); `y_start`
/// is the first shadowed row, left untouched above so the window frame
/// isn't darkened. The caller blurs the strips afterwards.
pub fn shadow_border(
    shadow: &mut Pixmap,
    color: Argb32,
    shadow_x: Coord,
    shadow_y: Coord,
    y_start: Coord,
) {
    if shadow.format() != Format::Argb32 {
        return;
    }
    let win_width = shadow.width() - shadow_x;
    let win_height = shadow.height() - shadow_y;
    if win_width < 0 || win_height < 0 {
        return;
    }

    let base_alpha = (color >> 24) as A8;
    let base_rgb = color & 0x00ff_ffff;
    if base_alpha == 0 {
        return;
    }

    let lut_x_len = HORIZONTAL_OFFSET + FADE_TAIL;
    let lut_y_len = VERTICAL_OFFSET + FADE_TAIL;
    let right_extent = shadow_x.min(lut_x_len);
    let bottom_extent = shadow_y.min(lut_y_len);
    if right_extent <= 0 && bottom_extent <= 0 {
        return;
    }

    // clear stale shadow pixels before repainting the mask
    if shadow_x > 0 {
        for y in 0..win_height {
            for p in shadow.argb32_row_mut(win_width, y, shadow_x as usize) {
                *p = 0;
            }
        }
    }
    if shadow_y > 0 {
        let w = shadow.width() as usize;
        for y in win_height..shadow.height() {
            for p in shadow.argb32_row_mut(0, y, w) {
                *p = 0;
            }
        }
    }

    // right-edge fade, offset ramp followed by the zero tail
    let mut alpha_lut_x = ramp(HORIZONTAL_OFFSET, base_alpha as u32);
    alpha_lut_x.resize(lut_x_len as usize, 0);

    // vertical ramp, cached on (offset, alpha)
    let mut alpha_lut_y = ALPHA_Y_CACHE.with(|c| {
        let mut c = c.borrow_mut();
        if c.valid && c.alpha == base_alpha && c.ramp.len() == VERTICAL_OFFSET as usize {
            c.ramp.clone()
        } else {
            let fresh = ramp(VERTICAL_OFFSET, base_alpha as u32);
            c.ramp = fresh.clone();
            c.alpha = base_alpha;
            c.valid = true;
            fresh
        }
    });
    alpha_lut_y.resize(lut_y_len as usize, 0);

    // right edge strip
    if right_extent > 0 && y_start < shadow.height() {
        let y_end = win_height.min(shadow.height());
        for y in y_start.max(0)..y_end {
            let dst = shadow.argb32_row_mut(win_width, y, right_extent as usize);
            for (p, &a) in dst.iter_mut().zip(&alpha_lut_x) {
                *p = ((a as Argb32) << 24) | base_rgb;
            }
        }
    }

    // bottom strip, excluding the corner overlap
    if bottom_extent > 0 {
        let bottom_start = win_height.max(0);
        let bottom_end = (win_height + bottom_extent).min(shadow.height());

        let left_skip = HORIZONTAL_OFFSET.min(win_width);
        let bottom_width = (win_width - left_skip - right_extent).max(0);

        let alpha_bottom: Vec<A8> = BOTTOM_CACHE.with(|c| {
            let mut c = c.borrow_mut();
            if c.width != bottom_width {
                c.weights = ramp(bottom_width, 255);
                c.width = bottom_width;
            }
            c.weights.clone()
        });

        for y in bottom_start..bottom_end {
            let alpha_y = alpha_lut_y[(y - win_height) as usize];
            if bottom_width <= 0 {
                continue;
            }
            let dst = shadow.argb32_row_mut(left_skip, y, bottom_width as usize);
            for (p, &ax) in dst.iter_mut().zip(&alpha_bottom) {
                let alpha = ((alpha_y as u32 * ax as u32) >> 8) as Argb32;
                *p = (alpha << 24) | base_rgb;
            }
        }
    }

    // the bottom-right corner combines both falloffs
    if right_extent > 0 && bottom_extent > 0 {
        let corner_end = (win_height + bottom_extent).min(shadow.height());
        for y in win_height.max(0)..corner_end {
            let alpha_y = alpha_lut_y[(y - win_height) as usize];
            let dst = shadow.argb32_row_mut(win_width, y, right_extent as usize);
            for (p, &ax) in dst.iter_mut().zip(&alpha_lut_x) {
                let alpha = ((ax as u32 * alpha_y as u32) >> 8) as Argb32;
                *p = (alpha << 24) | base_rgb;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_matches_polynomial() {
        for (i, &v) in GAUSSIAN_LUT.iter().enumerate() {
            let t = i as f64 / 16.0;
            let f = (1.0 - t * t).powi(2) * 0.92 + 0.08;
            assert!((v as f64 / 65536.0 - f).abs() < 1e-4, "entry {}", i);
        }
        assert_eq!(gaussian_weight(Fixed(0)), 65536);
        assert_eq!(gaussian_weight(Fixed::ONE), GAUSSIAN_LUT[16]);
        assert_eq!(gaussian_weight(Fixed(-5)), 65536);
    }

    #[test]
    fn border_paints_margins_only() {
        let (sx, sy) = margins();
        let (w, h) = (40 + sx, 30 + sy);
        let mut px = Pixmap::new(Format::Argb32, w, h);
        shadow_border(&mut px, 0xff00_0000, sx, sy, 0);

        // the window body is untouched
        assert_eq!(px.argb32_row(10, 10, 1)[0], 0);
        // the immediate right margin column carries the densest alpha
        let a0 = px.argb32_row(40, 10, 1)[0] >> 24;
        assert!(a0 > 0xe0, "alpha {:#x}", a0);
        // the fade tail ends transparent
        let a_tail = px.argb32_row(40 + HORIZONTAL_OFFSET + FADE_TAIL - 1, 10, 1)[0] >> 24;
        assert_eq!(a_tail, 0);
        // corner alpha is the product of both ramps, weaker than either
        let edge = px.argb32_row(40, 15, 1)[0] >> 24;
        let corner = px.argb32_row(40 + 1, 30 + 1, 1)[0] >> 24;
        assert!(corner <= edge);
    }

    #[test]
    fn zero_alpha_is_a_noop() {
        let (sx, sy) = margins();
        let mut px = Pixmap::new(Format::Argb32, 20 + sx, 20 + sy);
        shadow_border(&mut px, 0x00ff_ffff, sx, sy, 0);
        for y in 0..px.height() {
            for &p in px.argb32_row(0, y, px.width() as usize) {
                assert_eq!(p, 0);
            }
        }
    }
}
