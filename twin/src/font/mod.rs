//! Glyph rendering and text measurement.
//!
//! A font is a flat stream of signed-byte instructions (`m x y`, `l x y`,
//! `c x1 y1 x2 y2 x3 y3`, `2 xc yc x y`, `e`) in Q1.6 glyph coordinates,
//! addressed through per-page character maps of 128 codepoints each.
//! Stroke fonts are drawn by convolving the interpreted skeleton with an
//! elliptical pen; outline fonts are filled directly.
//!
//! When the path's transform is axis-aligned and hinting is enabled, the
//! glyph's snap arrays are mapped through the font size and pulled onto
//! integer pixel edges, and the pen itself is snapped to half-pixel
//! widths.
use std::sync::atomic::{AtomicUsize, Ordering};

use fxp::{Fixed, GFixed};
use once_cell::sync::Lazy;

use crate::convolve;
use crate::geom::Point;
use crate::matrix::Matrix;
use crate::path::{FontStyle, Path};

mod data;

/// Unicode scalar value as decoded from the wire; not validated beyond
/// the UTF-8 forms.
pub type Ucs4 = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    /// Skeleton strokes convolved with a pen.
    Stroke,
    /// Closed outlines, filled.
    Outline,
}

/// One 128-codepoint page of glyph offsets into the instruction stream.
#[derive(Debug)]
pub struct FontPage {
    pub page: u32,
    pub offsets: [u16; 128],
}

pub struct Font {
    pub kind: FontKind,
    pub charmap: &'static [FontPage],
    pub outlines: &'static [i8],
    /// One-entry page cache; `usize::MAX` when empty.
    cur_page: AtomicUsize,
}

/// The built-in face.
pub static DEFAULT_FONT: Lazy<Font> = Lazy::new(|| Font {
    kind: FontKind::Stroke,
    charmap: &data::PAGES,
    outlines: &data::OUTLINES,
    cur_page: AtomicUsize::new(usize::max_value()),
});

/// Metrics of a glyph or string at the path's current font state, all in
/// Q15.16 user units.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextMetrics {
    pub left_side_bearing: Fixed,
    pub right_side_bearing: Fixed,
    pub width: Fixed,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub font_ascent: Fixed,
    pub font_descent: Fixed,
}

const fn ucs_page(ucs4: Ucs4) -> u32 {
    ucs4 >> 7
}

const fn ucs_char_in_page(ucs4: Ucs4) -> usize {
    (ucs4 & 0x7f) as usize
}

impl Font {
    /// Find the charmap page, preferring the one-entry cache. Falls back
    /// to page 0 (and glyph 0) when the codepoint has no page.
    fn find_page(&self, page: u32) -> Option<usize> {
        let cached = self.cur_page.load(Ordering::Relaxed);
        if let Some(p) = self.charmap.get(cached) {
            if p.page == page {
                return Some(cached);
            }
        }
        for (i, p) in self.charmap.iter().enumerate() {
            if p.page == page {
                self.cur_page.store(i, Ordering::Relaxed);
                return Some(i);
            }
        }
        None
    }

    pub fn has_ucs4(&self, ucs4: Ucs4) -> bool {
        self.find_page(ucs_page(ucs4)).is_some()
    }

    /// The glyph record for a codepoint; missing pages map to glyph 0.
    fn glyph_base(&self, ucs4: Ucs4) -> &[i8] {
        let (page, idx) = match self.find_page(ucs_page(ucs4)) {
            Some(p) => (p, ucs_char_in_page(ucs4)),
            None => (0, 0),
        };
        let off = self.charmap[page].offsets[idx] as usize;
        &self.outlines[off..]
    }
}

// glyph record accessors
fn glyph_left(g: &[i8]) -> GFixed {
    GFixed(g[0])
}
fn glyph_right(g: &[i8]) -> GFixed {
    GFixed(g[1])
}
fn glyph_ascent(g: &[i8]) -> GFixed {
    GFixed(g[2])
}
fn glyph_descent(g: &[i8]) -> GFixed {
    GFixed(g[3])
}
fn glyph_n_snap_x(g: &[i8]) -> usize {
    g[4] as usize
}
fn glyph_n_snap_y(g: &[i8]) -> usize {
    g[5] as usize
}
fn glyph_snap_x(g: &[i8]) -> &[i8] {
    &g[6..6 + glyph_n_snap_x(g)]
}
fn glyph_snap_y(g: &[i8]) -> &[i8] {
    &g[6 + glyph_n_snap_x(g)..6 + glyph_n_snap_x(g) + glyph_n_snap_y(g)]
}

/// Start of the instruction program within a glyph record.
fn glyph_draw<'a>(font: &Font, g: &'a [i8]) -> &'a [i8] {
    match font.kind {
        FontKind::Stroke => &g[6 + glyph_n_snap_x(g) + glyph_n_snap_y(g)..],
        FontKind::Outline => &g[4..],
    }
}

/// Snap to the nearest integer pixel edge.
fn snap_i(p: Fixed) -> Fixed {
    Fixed((p.0 + 0x8000) & !0xffff)
}

/// Snap to the nearest half pixel.
fn snap_h(p: Fixed) -> Fixed {
    Fixed((p.0 + 0x4000) & !0x7fff)
}

const MAX_SNAP: usize = 16;

struct TextInfo {
    scale: Point,
    pen: Point,
    margin: Point,
    reverse_scale: Point,
    snap: bool,
    matrix: Matrix,
    pen_matrix: Matrix,
    snap_x: arrayvec::ArrayVec<[Fixed; MAX_SNAP]>,
    snap_y: arrayvec::ArrayVec<[Fixed; MAX_SNAP]>,
}

impl TextInfo {
    /// Scale a glyph-space x coordinate into user units.
    fn fx(&self, g: i8) -> Fixed {
        Fixed((g as i32 * self.scale.x.0) >> 6)
    }

    fn fy(&self, g: i8) -> Fixed {
        Fixed((g as i32 * self.scale.y.0) >> 6)
    }
}

fn compute_info(path: &mut Path, font: &Font) -> TextInfo {
    let origin = path.current_spoint();
    let state = *path.state();
    let m = state.matrix;

    let axis_aligned = !state.font_style.contains(FontStyle::UNHINTED)
        && ((m.m[0][1].0 == 0 && m.m[1][0].0 == 0 && m.m[0][0].0 != 0 && m.m[1][1].0 != 0)
            || (m.m[0][0].0 == 0 && m.m[1][1].0 == 0 && m.m[0][1].0 != 0 && m.m[1][0].0 != 0));

    let mut info = if axis_aligned {
        let xi = if m.m[0][0].0 != 0 { 0 } else { 1 };
        let yi = 1 - xi;

        let mut matrix = Matrix::identity();
        matrix.m[xi][0] = Fixed::ONE;
        matrix.m[xi][1] = Fixed(0);
        matrix.m[yi][0] = Fixed(0);
        matrix.m[yi][1] = Fixed::ONE;

        let snap = font.kind == FontKind::Stroke;
        let ox = origin.x.to_fixed();
        let oy = origin.y.to_fixed();
        matrix.m[2][0] = if snap { snap_i(ox) } else { ox };
        matrix.m[2][1] = if snap { snap_i(oy) } else { oy };

        let mut scale_x = state.font_size * m.m[0][xi];
        let mut reverse_x = Fixed::ONE / m.m[0][xi];
        if scale_x.0 < 0 {
            scale_x = -scale_x;
            reverse_x = -reverse_x;
            matrix.m[0][xi] = -matrix.m[0][xi];
            matrix.m[1][xi] = -matrix.m[1][xi];
        }
        let mut scale_y = state.font_size * m.m[1][yi];
        let mut reverse_y = Fixed::ONE / m.m[1][yi];
        if scale_y.0 < 0 {
            scale_y = -scale_y;
            reverse_y = -reverse_y;
            matrix.m[0][yi] = -matrix.m[0][yi];
            matrix.m[1][yi] = -matrix.m[1][yi];
        }

        let pen = if font.kind == FontKind::Stroke {
            let px = snap_h(scale_x / 24).max(Fixed::HALF);
            let py = snap_h(scale_y / 24).max(Fixed::HALF);
            Point::new(px, py)
        } else {
            Point::new(Fixed(0), Fixed(0))
        };

        let mut info = TextInfo {
            scale: Point::new(scale_x, scale_y),
            pen,
            margin: pen,
            reverse_scale: Point::new(reverse_x, reverse_y),
            snap,
            matrix,
            pen_matrix: Matrix::identity(),
            snap_x: Default::default(),
            snap_y: Default::default(),
        };

        if font.kind == FontKind::Stroke && state.font_style.contains(FontStyle::BOLD) {
            let add_x = snap_h(Fixed(info.pen.x.0 >> 1)).max(Fixed::HALF);
            let add_y = snap_h(Fixed(info.pen.y.0 >> 1)).max(Fixed::HALF);
            info.pen.x += add_x;
            info.pen.y += add_y;
        }

        let margin_x = if info.snap {
            snap_i(info.margin.x)
        } else {
            info.margin.x
        };
        info.matrix.translate(margin_x + info.pen.x, -info.pen.y);
        info.pen_matrix = info.matrix;
        info
    } else {
        let mut matrix = m;
        matrix.m[2][0] = origin.x.to_fixed();
        matrix.m[2][1] = origin.y.to_fixed();

        let (pen, margin) = if font.kind == FontKind::Stroke {
            let p = if state.font_style.contains(FontStyle::BOLD) {
                state.font_size / 16
            } else {
                state.font_size / 24
            };
            (Point::new(p, p), Point::new(state.font_size / 24, state.font_size / 24))
        } else {
            (Point::default(), Point::default())
        };

        let mut info = TextInfo {
            scale: Point::new(state.font_size, state.font_size),
            pen,
            margin,
            reverse_scale: Point::default(),
            snap: false,
            matrix,
            pen_matrix: m,
            snap_x: Default::default(),
            snap_y: Default::default(),
        };
        info.matrix
            .translate(info.margin.x + info.pen.x, -info.pen.y);
        info
    };

    info.pen_matrix.m[2][0] = Fixed(0);
    info.pen_matrix.m[2][1] = Fixed(0);
    info.pen_matrix.scale(info.pen.x, info.pen.y);

    if state.font_style.contains(FontStyle::OBLIQUE) {
        // shear by atan(1/4)
        let shear = Matrix {
            m: [
                [Fixed::ONE, Fixed(0)],
                [Fixed(-(Fixed::ONE.0 / 4)), Fixed::ONE],
                [Fixed(0), Fixed(0)],
            ],
        };
        info.matrix = Matrix::multiply(&shear, &info.matrix);
    }

    info
}

fn compute_snap(info: &mut TextInfo, g: &[i8]) {
    info.snap_x.clear();
    for &s in glyph_snap_x(g).iter().take(MAX_SNAP) {
        info.snap_x.push(info.fx(s));
    }
    info.snap_y.clear();
    for &s in glyph_snap_y(g).iter().take(MAX_SNAP) {
        info.snap_y.push(info.fy(s));
    }
}

/// Interpolate `v` toward the pixel grid between its two surrounding
/// snap positions.
fn snap(v: Fixed, snaps: &[Fixed]) -> Fixed {
    for s in 0..snaps.len().saturating_sub(1) {
        if snaps[s] <= v && v <= snaps[s + 1] {
            let before = snaps[s];
            let after = snaps[s + 1];
            let dist = after - before;
            if dist.0 == 0 {
                break;
            }
            let move_before = snap_i(before) - before;
            let move_after = snap_i(after) - after;
            let dist_before = v - before;
            let dist_after = after - v;
            let mv = ((dist_before.0 as i64 * move_after.0 as i64
                + dist_after.0 as i64 * move_before.0 as i64)
                / dist.0 as i64) as i32;
            return v + Fixed(mv);
        }
    }
    v
}

fn glyph_width(info: &TextInfo, g: &[i8]) -> Fixed {
    let mut right = info.fx(glyph_right(g).0) + info.pen.x * 2;
    if info.snap {
        right = snap_i(snap(right, &info.snap_x));
    }
    let right_side_bearing = right + info.margin.x;
    right_side_bearing + info.margin.x
}

fn pen_path(info: &TextInfo) -> Path {
    let mut pen = Path::new();
    pen.set_matrix(info.pen_matrix);
    pen.circle(Fixed(0), Fixed(0), Fixed::ONE);
    pen
}

// ----------------------------------------------------------------------
// public text operations on `Path`

impl Path {
    /// Append one glyph at the current point and advance it by the
    /// glyph's width.
    pub fn ucs4(&mut self, font: &Font, ucs4: Ucs4) {
        let g = font.glyph_base(ucs4);
        let mut info = compute_info(self, font);
        if info.snap {
            compute_snap(&mut info, g);
        }
        let origin = self.current_spoint();

        let mut stroke = Path::new();
        stroke.set_matrix(info.matrix);

        let mut prog = glyph_draw(font, g).iter();
        let mut x1 = Fixed(0);
        let mut y1 = Fixed(0);

        let mut next = |prog: &mut std::slice::Iter<'_, i8>| -> i8 {
            prog.next().copied().unwrap_or(b'e' as i8)
        };

        loop {
            let op = next(&mut prog) as u8;
            match op {
                b'm' => {
                    x1 = info.fx(next(&mut prog));
                    y1 = info.fy(next(&mut prog));
                    if info.snap {
                        x1 = snap(x1, &info.snap_x);
                        y1 = snap(y1, &info.snap_y);
                    }
                    stroke.move_to(x1, y1);
                }
                b'l' => {
                    x1 = info.fx(next(&mut prog));
                    y1 = info.fy(next(&mut prog));
                    if info.snap {
                        x1 = snap(x1, &info.snap_x);
                        y1 = snap(y1, &info.snap_y);
                    }
                    stroke.draw(x1, y1);
                }
                b'c' => {
                    let mut x3 = info.fx(next(&mut prog));
                    let mut y3 = info.fy(next(&mut prog));
                    let mut x2 = info.fx(next(&mut prog));
                    let mut y2 = info.fy(next(&mut prog));
                    x1 = info.fx(next(&mut prog));
                    y1 = info.fy(next(&mut prog));
                    if info.snap {
                        x3 = snap(x3, &info.snap_x);
                        y3 = snap(y3, &info.snap_y);
                        x2 = snap(x2, &info.snap_x);
                        y2 = snap(y2, &info.snap_y);
                        x1 = snap(x1, &info.snap_x);
                        y1 = snap(y1, &info.snap_y);
                    }
                    stroke.curve(x3, y3, x2, y2, x1, y1);
                }
                b'2' => {
                    // lower the quadratic onto the cubic case
                    let cx = info.fx(next(&mut prog));
                    let cy = info.fy(next(&mut prog));
                    let x3 = x1 + (cx - x1) * 2 / 3;
                    let y3 = y1 + (cy - y1) * 2 / 3;
                    x1 = info.fx(next(&mut prog));
                    y1 = info.fy(next(&mut prog));
                    let x2 = x1 + (cx - x1) * 2 / 3;
                    let y2 = y1 + (cy - y1) * 2 / 3;
                    stroke.curve(x3, y3, x2, y2, x1, y1);
                }
                _ => break,
            }
        }

        match font.kind {
            FontKind::Stroke => {
                let pen = pen_path(&info);
                convolve::convolve(self, &stroke, &pen);
            }
            FontKind::Outline => self.append(&stroke),
        }

        let width = glyph_width(&info, g);
        let adv_x = origin.x + info.matrix.dx(width, Fixed(0));
        let adv_y = origin.y + info.matrix.dy(width, Fixed(0));
        self.smove(adv_x, adv_y);
    }

    /// Append a UTF-8 byte string glyph by glyph. Decoding stops at the
    /// first invalid byte; glyphs already appended remain.
    pub fn utf8(&mut self, font: &Font, bytes: impl AsRef<[u8]>) {
        let mut bytes = bytes.as_ref();
        while let Some((ucs4, len)) = utf8_to_ucs4(bytes) {
            self.ucs4(font, ucs4);
            bytes = &bytes[len..];
        }
    }
}

/// Advance width of one glyph at the path's current state.
pub fn width_ucs4(path: &mut Path, font: &Font, ucs4: Ucs4) -> Fixed {
    text_metrics_ucs4(path, font, ucs4).width
}

pub fn width_utf8(path: &mut Path, font: &Font, bytes: impl AsRef<[u8]>) -> Fixed {
    let mut w = Fixed(0);
    let mut bytes = bytes.as_ref();
    while let Some((ucs4, len)) = utf8_to_ucs4(bytes) {
        w += width_ucs4(path, font, ucs4);
        bytes = &bytes[len..];
    }
    w
}

pub fn text_metrics_ucs4(path: &mut Path, font: &Font, ucs4: Ucs4) -> TextMetrics {
    let g = font.glyph_base(ucs4);
    let mut info = compute_info(path, font);
    if info.snap {
        compute_snap(&mut info, g);
    }

    let mut left = info.fx(glyph_left(g).0);
    let mut right = info.fx(glyph_right(g).0) + info.pen.x * 2;
    let mut ascent = info.fy(glyph_ascent(g).0) + info.pen.y * 2;
    let mut descent = info.fy(glyph_descent(g).0);
    let mut margin_x = info.margin.x;
    let mut margin_y = info.margin.y;

    let font_spacing = info.fy(GFixed::ONE.0);
    let mut font_descent = font_spacing / 3;
    let mut font_ascent = font_spacing - font_descent;

    if info.snap {
        left = snap_i(snap(left, &info.snap_x));
        right = snap_i(snap(right, &info.snap_x));
        ascent = snap_i(snap(ascent, &info.snap_y));
        descent = snap_i(snap(descent, &info.snap_y));
        font_descent = snap_i(font_descent);
        font_ascent = snap_i(font_ascent);

        left = left * info.reverse_scale.x;
        right = right * info.reverse_scale.x;
        ascent = ascent * info.reverse_scale.y;
        descent = descent * info.reverse_scale.y;
        font_descent = font_descent * info.reverse_scale.y;
        font_ascent = font_ascent * info.reverse_scale.y;
        margin_x = margin_x * info.reverse_scale.x;
        margin_y = margin_y * info.reverse_scale.y;
    }

    TextMetrics {
        left_side_bearing: left + margin_x,
        right_side_bearing: right + margin_x,
        width: right + margin_x + margin_x,
        ascent,
        descent,
        font_ascent: font_ascent + margin_y,
        font_descent: font_descent + margin_y,
    }
}

/// Merged metrics of a whole string: bearings and extents take the
/// per-glyph maxima, `width` accumulates advances.
pub fn text_metrics_utf8(path: &mut Path, font: &Font, bytes: impl AsRef<[u8]>) -> TextMetrics {
    let mut m = TextMetrics::default();
    let mut w = Fixed(0);
    let mut first = true;
    let mut bytes = bytes.as_ref();

    while let Some((ucs4, len)) = utf8_to_ucs4(bytes) {
        let mut c = text_metrics_ucs4(path, font, ucs4);
        if first {
            m = c;
            first = false;
        } else {
            c.left_side_bearing += w;
            c.right_side_bearing += w;
            c.width += w;

            m.left_side_bearing = m.left_side_bearing.min(c.left_side_bearing);
            m.right_side_bearing = m.right_side_bearing.max(c.right_side_bearing);
            m.width = m.width.max(c.width);
            m.ascent = m.ascent.max(c.ascent);
            m.descent = m.descent.max(c.descent);
        }
        w = c.width;
        bytes = &bytes[len..];
    }
    m
}

/// Decode one UTF-8 sequence (1-6 byte forms). Returns the codepoint and
/// consumed length, or `None` at the end of input or the first invalid
/// lead or continuation byte.
fn utf8_to_ucs4(src: &[u8]) -> Option<(Ucs4, usize)> {
    let s = *src.get(0)?;
    if s == 0 {
        return None;
    }

    let (mut result, extra) = if s & 0x80 == 0 {
        (s as Ucs4, 0)
    } else if s & 0x40 == 0 {
        return None;
    } else if s & 0x20 == 0 {
        ((s & 0x1f) as Ucs4, 1)
    } else if s & 0x10 == 0 {
        ((s & 0x0f) as Ucs4, 2)
    } else if s & 0x08 == 0 {
        ((s & 0x07) as Ucs4, 3)
    } else if s & 0x04 == 0 {
        ((s & 0x03) as Ucs4, 4)
    } else if s & 0x02 == 0 {
        ((s & 0x01) as Ucs4, 5)
    } else {
        return None;
    };

    for i in 0..extra {
        let c = *src.get(1 + i)?;
        if c & 0xc0 != 0x80 {
            return None;
        }
        result = (result << 6) | (c & 0x3f) as Ucs4;
    }
    Some((result, 1 + extra))
}
