//! Compositing: the operand/operator engine plus the path paint entry
//! points built on it.
//!
//! Sources and masks may be pixmaps in any format or a solid ARGB32 color;
//! destinations are pixmaps. Every inner loop works on ARGB32-widened
//! channels and narrows on store, which is exactly the semantics of the
//! per-format loop matrix in classic renderers; the format dispatch here
//! is a `match` per scanline rather than a function-pointer table.
//!
//! If the source or mask pixmap carries a non-identity transform the
//! composite runs through a bilinear resampler. Resampled rows land in a
//! per-pixmap scratch buffer that only ever grows; samples outside the
//! source's clip rectangle read as 0 to keep edges from bleeding.
use fxp::Fixed;

use crate::geom::{Coord, Rect};
use crate::path::Path;
use crate::pixel::{self, A8, Argb32, Format, Operator};
use crate::pixmap::Pixmap;
use crate::poly;

/// A composite source or mask.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    Pixmap(&'a Pixmap),
    Solid(Argb32),
}

impl<'a> Operand<'a> {
    fn needs_xform(&self) -> bool {
        match self {
            Operand::Pixmap(px) => !px.transform.is_identity(),
            Operand::Solid(_) => false,
        }
    }
}

enum SrcSpan<'a> {
    Solid(Argb32),
    Argb(&'a [Argb32]),
}

impl<'a> SrcSpan<'a> {
    #[inline]
    fn at(&self, i: usize) -> Argb32 {
        match self {
            SrcSpan::Solid(c) => *c,
            SrcSpan::Argb(s) => s[i],
        }
    }
}

enum MskSpan<'a> {
    Solid(A8),
    A8(&'a [A8]),
    Argb(&'a [Argb32]),
}

impl<'a> MskSpan<'a> {
    #[inline]
    fn at(&self, i: usize) -> A8 {
        match self {
            MskSpan::Solid(m) => *m,
            MskSpan::A8(s) => s[i],
            MskSpan::Argb(s) => pixel::argb32_to_a8(s[i]),
        }
    }
}

/// One scanline of `(src IN msk) op dst`, all formats widened to ARGB32.
fn composite_span(dst: &mut Pixmap, x: Coord, y: Coord, width: usize, src: &SrcSpan<'_>, msk: &MskSpan<'_>, operator: Operator) {
    match dst.format {
        Format::Argb32 => {
            let row = dst.argb32_row_mut(x, y, width);
            for (i, d) in row.iter_mut().enumerate() {
                *d = match operator {
                    Operator::Over => pixel::in_over(*d, src.at(i), msk.at(i)),
                    Operator::Source => pixel::in_mask(src.at(i), msk.at(i)),
                };
            }
        }
        Format::Rgb16 => {
            let row = dst.rgb16_row_mut(x, y, width);
            for (i, d) in row.iter_mut().enumerate() {
                let wide = pixel::rgb16_to_argb32(*d);
                let out = match operator {
                    Operator::Over => pixel::in_over(wide, src.at(i), msk.at(i)),
                    Operator::Source => pixel::in_mask(src.at(i), msk.at(i)),
                };
                *d = pixel::argb32_to_rgb16(out);
            }
        }
        Format::A8 => {
            let row = dst.a8_row_mut(x, y, width);
            for (i, d) in row.iter_mut().enumerate() {
                let wide = pixel::a8_to_argb32(*d);
                let out = match operator {
                    Operator::Over => pixel::in_over(wide, src.at(i), msk.at(i)),
                    Operator::Source => pixel::in_mask(src.at(i), msk.at(i)),
                };
                *d = pixel::argb32_to_a8(out);
            }
        }
    }
}

/// Copy one source row into the ARGB32 scratch, widening as needed.
fn widen_row(px: &Pixmap, x: Coord, y: Coord, width: usize, scratch: &mut Vec<Argb32>) {
    scratch.clear();
    match px.format {
        Format::A8 => scratch.extend(px.a8_row(x, y, width).iter().map(|&a| pixel::a8_to_argb32(a))),
        Format::Rgb16 => scratch.extend(
            px.rgb16_row(x, y, width)
                .iter()
                .map(|&c| pixel::rgb16_to_argb32(c)),
        ),
        Format::Argb32 => scratch.extend_from_slice(px.argb32_row(x, y, width)),
    }
}

struct ClippedRect {
    left: Coord,
    top: Coord,
    right: Coord,
    bottom: Coord,
}

/// Clip the destination rectangle against the destination clip and, for
/// pixmap operands, against the operand's readable extent.
fn clip_composite(
    dst: &Pixmap,
    dst_x: Coord,
    dst_y: Coord,
    src: &Operand<'_>,
    src_x: Coord,
    src_y: Coord,
    msk: Option<(&Operand<'_>, Coord, Coord)>,
    width: Coord,
    height: Coord,
) -> Option<ClippedRect> {
    let mut left = dst_x;
    let mut top = dst_y;
    let mut right = dst_x + width;
    let mut bottom = dst_y + height;

    left = left.max(dst.clip.left);
    top = top.max(dst.clip.top);
    right = right.min(dst.clip.right);
    bottom = bottom.min(dst.clip.bottom);

    // never read outside a source or mask pixmap
    if let Operand::Pixmap(px) = src {
        if px.transform.is_identity() {
            let sdx = src_x - dst_x;
            let sdy = src_y - dst_y;
            left = left.max(-sdx);
            top = top.max(-sdy);
            right = right.min(px.width - sdx);
            bottom = bottom.min(px.height - sdy);
        }
    }
    if let Some((Operand::Pixmap(px), msk_x, msk_y)) = msk {
        if px.transform.is_identity() {
            let mdx = msk_x - dst_x;
            let mdy = msk_y - dst_y;
            left = left.max(-mdx);
            top = top.max(-mdy);
            right = right.min(px.width - mdx);
            bottom = bottom.min(px.height - mdy);
        }
    }

    if left >= right || top >= bottom {
        None
    } else {
        Some(ClippedRect {
            left,
            top,
            right,
            bottom,
        })
    }
}

fn composite_simple(
    dst: &mut Pixmap,
    mut dst_x: Coord,
    mut dst_y: Coord,
    src: Operand<'_>,
    mut src_x: Coord,
    mut src_y: Coord,
    msk: Option<Operand<'_>>,
    mut msk_x: Coord,
    mut msk_y: Coord,
    operator: Operator,
    width: Coord,
    height: Coord,
) {
    dst_x += dst.origin_x;
    dst_y += dst.origin_y;

    if let Operand::Pixmap(px) = &src {
        src_x += px.origin_x;
        src_y += px.origin_y;
    }
    if let Some(Operand::Pixmap(px)) = &msk {
        msk_x += px.origin_x;
        msk_y += px.origin_y;
    }

    let r = match clip_composite(
        dst,
        dst_x,
        dst_y,
        &src,
        src_x,
        src_y,
        msk.as_ref().map(|m| (m, msk_x, msk_y)),
        width,
        height,
    ) {
        Some(r) => r,
        None => return,
    };

    let sdx = src_x - dst_x;
    let sdy = src_y - dst_y;
    let mdx = msk_x - dst_x;
    let mdy = msk_y - dst_y;
    let w = (r.right - r.left) as usize;

    let mut src_scratch = Vec::new();

    for iy in r.top..r.bottom {
        let src_span = match &src {
            Operand::Solid(c) => SrcSpan::Solid(*c),
            Operand::Pixmap(px) => {
                widen_row(px, r.left + sdx, iy + sdy, w, &mut src_scratch);
                SrcSpan::Argb(&src_scratch)
            }
        };
        let msk_span = match &msk {
            None => MskSpan::Solid(0xff),
            Some(Operand::Solid(c)) => MskSpan::Solid(pixel::argb32_to_a8(*c)),
            Some(Operand::Pixmap(px)) => match px.format {
                Format::A8 => MskSpan::A8(px.a8_row(r.left + mdx, iy + mdy, w)),
                // an RGB16 mask has no alpha channel: fully opaque
                Format::Rgb16 => MskSpan::Solid(0xff),
                Format::Argb32 => MskSpan::Argb(px.argb32_row(r.left + mdx, iy + mdy, w)),
            },
        };
        composite_span(dst, r.left, iy, w, &src_span, &msk_span, operator);
    }

    dst.damage(r.left, r.top, r.right, r.bottom);
}

// ----------------------------------------------------------------------
// transformed compositing

/// Bilinear mix of four channel samples with Q16 fractional weights.
#[inline]
fn saucemix(tl: i32, tr: i32, bl: i32, br: i32, wx: i32, wy: i32) -> i32 {
    let one = Fixed::ONE.0;
    ((((br * wx + bl * (one - wx)) >> 16) * wy)
        + (((tr * wx + tl * (one - wx)) >> 16) * (one - wy)))
        >> 16
}

/// Fetch a pixel widened to ARGB32; anything outside the source clip is 0.
#[inline]
fn fetch_xform(px: &Pixmap, x: Fixed, y: Fixed) -> Argb32 {
    if x < Fixed::from_int(px.clip.left as i32)
        || x >= Fixed::from_int(px.clip.right as i32)
        || y < Fixed::from_int(px.clip.top as i32)
        || y >= Fixed::from_int(px.clip.bottom as i32)
    {
        return 0;
    }
    px.fetch_raw(x.to_int() as Coord, y.to_int() as Coord)
}

/// Resample one row of `px` through its transform into the pixmap's
/// cached scratch. Rows are addressed relative to the clipped composite
/// rectangle.
fn read_xform_row(px: &Pixmap, line: Coord, src_x: Coord, src_y: Coord, width: usize) {
    let mut cache = px.xform_cache.borrow_mut();
    if cache.argb32.len() < width {
        cache.argb32.resize(width, 0);
    }
    let tfm = &px.transform;
    let dy = Fixed::from_int(line as i32);
    let fsrc_x = Fixed::from_int(src_x as i32);
    let fsrc_y = Fixed::from_int(src_y as i32);

    for i in 0..width {
        let dx = Fixed::from_int(i as i32);
        let sx = tfm.fx(dx, dy) + fsrc_x;
        let sy = tfm.fy(dx, dy) + fsrc_y;

        let tl = fetch_xform(px, sx, sy);
        let tr = fetch_xform(px, sx + Fixed::ONE, sy);
        let bl = fetch_xform(px, sx, sy + Fixed::ONE);
        let br = fetch_xform(px, sx + Fixed::ONE, sy + Fixed::ONE);

        let wx = sx.0 & 0xffff;
        let wy = sy.0 & 0xffff;

        let mut out = 0u32;
        for shift in &[0u32, 8, 16, 24] {
            let c = saucemix(
                ((tl >> shift) & 0xff) as i32,
                ((tr >> shift) & 0xff) as i32,
                ((bl >> shift) & 0xff) as i32,
                ((br >> shift) & 0xff) as i32,
                wx,
                wy,
            );
            out |= (c as u32 & 0xff) << shift;
        }
        cache.argb32[i] = out;
    }
}

fn composite_xform(
    dst: &mut Pixmap,
    mut dst_x: Coord,
    mut dst_y: Coord,
    src: Operand<'_>,
    mut src_x: Coord,
    mut src_y: Coord,
    msk: Option<Operand<'_>>,
    mut msk_x: Coord,
    mut msk_y: Coord,
    operator: Operator,
    width: Coord,
    height: Coord,
) {
    dst_x += dst.origin_x;
    dst_y += dst.origin_y;

    let left = dst_x.max(dst.clip.left);
    let top = dst_y.max(dst.clip.top);
    let right = (dst_x + width).min(dst.clip.right);
    let bottom = (dst_y + height).min(dst.clip.bottom);

    if left >= right || top >= bottom {
        return;
    }
    let w = (right - left) as usize;

    if let Operand::Pixmap(px) = &src {
        src_x += px.origin_x;
        src_y += px.origin_y;
    }
    if let Some(Operand::Pixmap(px)) = &msk {
        msk_x += px.origin_x;
        msk_y += px.origin_y;
    }

    let mut msk_scratch: Vec<A8> = Vec::new();

    for iy in top..bottom {
        let line = iy - top;

        let cache_ref;
        let src_span = match &src {
            Operand::Solid(c) => SrcSpan::Solid(*c),
            Operand::Pixmap(px) => {
                read_xform_row(px, line, src_x, src_y, w);
                cache_ref = px.xform_cache.borrow();
                SrcSpan::Argb(&cache_ref.argb32[..w])
            }
        };

        let msk_span = match &msk {
            None => MskSpan::Solid(0xff),
            Some(Operand::Solid(c)) => MskSpan::Solid(pixel::argb32_to_a8(*c)),
            Some(Operand::Pixmap(px)) => {
                read_xform_row(px, line, msk_x, msk_y, w);
                msk_scratch.clear();
                msk_scratch.extend(
                    px.xform_cache.borrow().argb32[..w]
                        .iter()
                        .map(|&c| pixel::argb32_to_a8(c)),
                );
                MskSpan::A8(&msk_scratch)
            }
        };

        composite_span(dst, left, iy, w, &src_span, &msk_span, operator);
    }

    dst.damage(left, top, right, bottom);
}

/// Composite a rectangle of `src` (through `msk`, if given) onto `dst`.
///
/// Coordinates are origin-relative for each operand; `width`/`height`
/// bound the destination rectangle before clipping. A non-identity
/// transform on a source or mask pixmap switches to the resampling path.
pub fn composite(
    dst: &mut Pixmap,
    dst_x: Coord,
    dst_y: Coord,
    src: Operand<'_>,
    src_x: Coord,
    src_y: Coord,
    msk: Option<Operand<'_>>,
    msk_x: Coord,
    msk_y: Coord,
    operator: Operator,
    width: Coord,
    height: Coord,
) {
    let xform = src.needs_xform() || msk.as_ref().map(|m| m.needs_xform()).unwrap_or(false);
    if xform {
        composite_xform(
            dst, dst_x, dst_y, src, src_x, src_y, msk, msk_x, msk_y, operator, width, height,
        );
    } else {
        composite_simple(
            dst, dst_x, dst_y, src, src_x, src_y, msk, msk_x, msk_y, operator, width, height,
        );
    }
}

/// Fill a rectangle with a solid color: the degenerate composite.
pub fn fill(
    dst: &mut Pixmap,
    pixel: Argb32,
    operator: Operator,
    left: Coord,
    top: Coord,
    right: Coord,
    bottom: Coord,
) {
    let left = (left + dst.origin_x).max(dst.clip.left);
    let top = (top + dst.origin_y).max(dst.clip.top);
    let right = (right + dst.origin_x).min(dst.clip.right);
    let bottom = (bottom + dst.origin_y).min(dst.clip.bottom);
    if left >= right || top >= bottom {
        return;
    }

    let w = (right - left) as usize;
    let src = SrcSpan::Solid(pixel);
    let msk = MskSpan::Solid(0xff);
    for iy in top..bottom {
        composite_span(dst, left, iy, w, &src, &msk, operator);
    }
    dst.damage(left, top, right, bottom);
}

/// Convert a straight-alpha ARGB32 pixmap to the premultiplied form the
/// compositor expects. Zero-alpha pixels lose their color data.
pub fn premultiply_alpha(px: &mut Pixmap) {
    if px.format != Format::Argb32 {
        return;
    }
    let (w, h) = (px.width, px.height);
    for y in 0..h {
        for p in px.argb32_row_mut(0, y, w as usize) {
            let alpha = (*p >> 24) as u16;
            if alpha == 0 {
                *p = 0;
                continue;
            }
            let r = pixel::int_mult((*p >> 16) as u8 as u16, alpha) as u32;
            let g = pixel::int_mult((*p >> 8) as u8 as u16, alpha) as u32;
            let b = pixel::int_mult(*p as u8 as u16, alpha) as u32;
            *p = ((alpha as u32) << 24) | (r << 16) | (g << 8) | b;
        }
    }
}

/// Raw row overwrite on an ARGB32 pixmap: no clip, no blend, no damage.
/// Used to erase stale drop-shadow pixels.
pub fn cover(dst: &mut Pixmap, color: Argb32, x: Coord, y: Coord, width: Coord) {
    if x < 0 || y < 0 || width < 0 || x + width > dst.width || y >= dst.height {
        return;
    }
    if dst.format != Format::Argb32 {
        return;
    }
    for p in dst.argb32_row_mut(x, y, width as usize) {
        *p = color;
    }
}

// ----------------------------------------------------------------------
// path painting

/// Rasterize `path` into a temporary A8 mask covering its bounds, then
/// composite `src` through it.
pub fn composite_path(
    dst: &mut Pixmap,
    src: Operand<'_>,
    src_x: Coord,
    src_y: Coord,
    path: &Path,
    operator: Operator,
) {
    let bounds = path.bounds();
    if bounds.is_empty() {
        return;
    }
    let width = bounds.width();
    let height = bounds.height();

    let mut mask = Pixmap::new(Format::A8, width, height);
    poly::fill_path(&mut mask, path, -bounds.left, -bounds.top);

    composite(
        dst,
        bounds.left,
        bounds.top,
        src,
        src_x + bounds.left,
        src_y + bounds.top,
        Some(Operand::Pixmap(&mask)),
        0,
        0,
        operator,
        width,
        height,
    );
}

/// Fill `path` with a solid color using `OVER`.
pub fn paint_path(dst: &mut Pixmap, argb: Argb32, path: &Path) {
    composite_path(dst, Operand::Solid(argb), 0, 0, path, Operator::Over);
}

/// Stroke `stroke` with a circular pen of `pen_width`, compositing the
/// resulting outline.
pub fn composite_stroke(
    dst: &mut Pixmap,
    src: Operand<'_>,
    src_x: Coord,
    src_y: Coord,
    stroke: &Path,
    pen_width: Fixed,
    operator: Operator,
) {
    let mut pen = Path::new();
    let mut m = stroke.current_matrix();
    m.m[2][0] = Fixed(0);
    m.m[2][1] = Fixed(0);
    pen.set_matrix(m);
    pen.circle(Fixed(0), Fixed(0), pen_width / 2);

    let mut path = Path::new();
    path.set_cap_style(stroke.current_cap_style());
    crate::convolve::convolve(&mut path, stroke, &pen);

    composite_path(dst, src, src_x, src_y, &path, operator);
}

/// Stroke with a solid color using `OVER`.
pub fn paint_stroke(dst: &mut Pixmap, argb: Argb32, stroke: &Path, pen_width: Fixed) {
    composite_stroke(dst, Operand::Solid(argb), 0, 0, stroke, pen_width, Operator::Over);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CapStyle;

    fn fi(i: i32) -> Fixed {
        Fixed::from_int(i)
    }

    #[test]
    fn solid_fill_source() {
        // spec scenario S1
        let mut px = Pixmap::new(Format::Argb32, 4, 4);
        fill(&mut px, 0xff80_4020, Operator::Source, 1, 1, 3, 3);
        for y in 0..4 {
            for x in 0..4 {
                let expect = if (1..3).contains(&x) && (1..3).contains(&y) {
                    0xff80_4020
                } else {
                    0
                };
                assert_eq!(px.argb32_row(x, y, 1)[0], expect, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn over_blend_half_alpha() {
        // spec scenario S2
        let mut dst = Pixmap::new(Format::Argb32, 1, 1);
        dst.argb32_row_mut(0, 0, 1)[0] = 0xff00_0000;
        let src = Pixmap::from_argb32(1, 1, 1, vec![0x8080_8080]).unwrap();
        composite(
            &mut dst,
            0,
            0,
            Operand::Pixmap(&src),
            0,
            0,
            None,
            0,
            0,
            Operator::Over,
            1,
            1,
        );
        let out = dst.argb32_row(0, 0, 1)[0];
        assert_eq!(out >> 24, 0xff);
        for shift in &[0u32, 8, 16] {
            let c = ((out >> shift) & 0xff) as i32;
            assert!((c - 0x7f).abs() <= 1, "{:#010x}", out);
        }
    }

    #[test]
    fn over_with_full_mask_equals_source() {
        // spec property 6
        let src_px = {
            let mut p = Pixmap::new(Format::Argb32, 4, 4);
            for y in 0..4 {
                for (x, v) in p.argb32_row_mut(0, y, 4).iter_mut().enumerate() {
                    *v = 0xff00_0000 | (x as u32 * 40) << 8 | y as u32 * 30;
                }
            }
            p
        };
        let mask = {
            let mut m = Pixmap::new(Format::A8, 4, 4);
            for y in 0..4 {
                for v in m.a8_row_mut(0, y, 4) {
                    *v = 0xff;
                }
            }
            m
        };

        let mut with_mask = Pixmap::new(Format::Argb32, 4, 4);
        composite(
            &mut with_mask,
            0,
            0,
            Operand::Pixmap(&src_px),
            0,
            0,
            Some(Operand::Pixmap(&mask)),
            0,
            0,
            Operator::Over,
            4,
            4,
        );

        let mut with_source = Pixmap::new(Format::Argb32, 4, 4);
        composite(
            &mut with_source,
            0,
            0,
            Operand::Pixmap(&src_px),
            0,
            0,
            None,
            0,
            0,
            Operator::Source,
            4,
            4,
        );

        for y in 0..4 {
            assert_eq!(
                with_mask.argb32_row(0, y, 4),
                with_source.argb32_row(0, y, 4),
                "row {}",
                y
            );
        }
    }

    #[test]
    fn rgb16_destination_round_trips() {
        let mut dst = Pixmap::new(Format::Rgb16, 2, 1);
        fill(&mut dst, 0xffff_0000, Operator::Source, 0, 0, 2, 1);
        assert_eq!(dst.rgb16_row(0, 0, 2), &[0xf800, 0xf800][..]);
    }

    #[test]
    fn paint_path_writes_inside_only() {
        let mut dst = Pixmap::new(Format::Argb32, 8, 8);
        let mut path = Path::new();
        path.rectangle(fi(2), fi(2), fi(4), fi(4));
        paint_path(&mut dst, 0xffff_ffff, &path);

        assert_eq!(dst.argb32_row(4, 4, 1)[0], 0xffff_ffff);
        assert_eq!(dst.argb32_row(0, 0, 1)[0], 0);
        assert_eq!(dst.argb32_row(7, 7, 1)[0], 0);
    }

    #[test]
    fn stroke_round_caps() {
        // spec scenario S6: stroke from (2,2) to (10,2), width 4, round
        let mut dst = Pixmap::new(Format::A8, 16, 8);
        let mut stroke = Path::new();
        stroke.set_cap_style(CapStyle::Round);
        stroke.move_to(fi(2), fi(2));
        stroke.draw(fi(10), fi(2));

        composite_stroke(
            &mut dst,
            Operand::Solid(0xffff_ffff),
            0,
            0,
            &stroke,
            fi(4),
            Operator::Over,
        );

        // interior of the capsule is fully covered
        for x in 2..10 {
            let c = dst.a8_row(x, 2, 1)[0];
            assert!(c >= 0xf0, "({}, 2) = {:#x}", x, c);
        }
        // cap apex pixels are well covered
        assert!(dst.a8_row(0, 2, 1)[0] >= 0x80);
        assert!(dst.a8_row(12, 2, 1)[0] >= 0x80);
        // beyond the caps: nearly nothing
        assert!(dst.a8_row(13, 2, 1)[0] <= 0x20);
        // above and below the capsule
        assert_eq!(dst.a8_row(5, 6, 1)[0], 0);
    }

    #[test]
    fn transformed_source_samples_through_matrix() {
        // a 2x2 source scaled up by the transform reads as a translation
        // of sample space; just check out-of-clip reads as transparent
        let mut src = Pixmap::new(Format::Argb32, 2, 2);
        for y in 0..2 {
            for v in src.argb32_row_mut(0, y, 2) {
                *v = 0xffff_ffff;
            }
        }
        let mut m = crate::matrix::Matrix::identity();
        // sample from (x - 10, y): everything reads outside the clip
        m.translate(fi(-10), fi(0));
        src.set_transform(m);

        let mut dst = Pixmap::new(Format::Argb32, 2, 2);
        composite(
            &mut dst,
            0,
            0,
            Operand::Pixmap(&src),
            0,
            0,
            None,
            0,
            0,
            Operator::Source,
            2,
            2,
        );
        assert_eq!(dst.argb32_row(0, 0, 2), &[0, 0][..]);
    }

    #[test]
    fn premultiply_zeroes_transparent_pixels() {
        let mut px = Pixmap::from_argb32(2, 1, 2, vec![0x00ff_ffff, 0x80ff_ffff]).unwrap();
        premultiply_alpha(&mut px);
        let row = px.argb32_row(0, 0, 2);
        assert_eq!(row[0], 0);
        assert_eq!(row[1] >> 24, 0x80);
        assert_eq!((row[1] >> 16) & 0xff, 0x80);
    }

    #[test]
    fn cover_ignores_bad_ranges() {
        let mut px = Pixmap::new(Format::Argb32, 4, 4);
        cover(&mut px, 0xffff_ffff, 2, 1, 5);
        assert_eq!(px.argb32_row(0, 1, 4), &[0; 4][..]);
        cover(&mut px, 0xffff_ffff, 1, 1, 2);
        assert_eq!(px.argb32_row(0, 1, 4), &[0, 0xffff_ffff, 0xffff_ffff, 0][..]);
    }
}
