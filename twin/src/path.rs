//! Path construction: sub-pixel point sequences with subpath breaks and a
//! current graphics state.
//!
//! All public entry points take Q15.16 user coordinates and run them
//! through the path's current matrix onto the rasterizer's Q11.4 grid.
//! Consecutive duplicate points are never stored; a subpath that ends up
//! shorter than two points is discarded when it is finished.
use bitflags::bitflags;
use fxp::{Angle, Fixed, SFixed};

use crate::geom::{Rect, SPoint};
use crate::matrix::Matrix;
use crate::spline;

bitflags! {
    /// Synthetic text styling applied by the glyph interpreter.
    pub struct FontStyle: u8 {
        const BOLD = 1 << 0;
        const OBLIQUE = 1 << 1;
        /// Disable snapping of axis-aligned text to pixel edges.
        const UNHINTED = 1 << 2;
    }
}

impl FontStyle {
    pub const ROMAN: FontStyle = FontStyle::empty();
}

impl Default for FontStyle {
    fn default() -> Self {
        FontStyle::ROMAN
    }
}

/// How stroke ends are capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapStyle {
    Round,
    Butt,
    Projecting,
}

/// The graphics state a path carries; saved and restored wholesale.
#[derive(Debug, Clone, Copy)]
pub struct PathState {
    pub matrix: Matrix,
    pub font_size: Fixed,
    pub font_style: FontStyle,
    pub cap_style: CapStyle,
}

impl Default for PathState {
    fn default() -> Self {
        Self {
            matrix: Matrix::identity(),
            font_size: Fixed::from_int(15),
            font_style: FontStyle::ROMAN,
            cap_style: CapStyle::Round,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Path {
    points: Vec<SPoint>,
    /// Indices into `points` where finished subpaths end.
    sublen: Vec<usize>,
    state: PathState,
}

impl Path {
    pub fn new() -> Path {
        Path::default()
    }

    // ------------------------------------------------------------------
    // sub-pixel primitives

    fn current_subpath_len(&self) -> usize {
        let start = self.sublen.last().copied().unwrap_or(0);
        self.points.len() - start
    }

    pub(crate) fn current_spoint(&mut self) -> SPoint {
        if self.points.is_empty() {
            self.move_to(Fixed(0), Fixed(0));
        }
        *self.points.last().unwrap()
    }

    fn subpath_first_spoint(&mut self) -> SPoint {
        if self.points.is_empty() {
            self.move_to(Fixed(0), Fixed(0));
        }
        let start = self.sublen.last().copied().unwrap_or(0);
        self.points[start]
    }

    /// Close out the current subpath; a lone point is dropped.
    pub(crate) fn sfinish(&mut self) {
        match self.current_subpath_len() {
            0 => return,
            1 => {
                self.points.pop();
                return;
            }
            _ => {}
        }
        self.sublen.push(self.points.len());
    }

    pub(crate) fn smove(&mut self, x: SFixed, y: SFixed) {
        match self.current_subpath_len() {
            0 => self.sdraw(x, y),
            1 => {
                // replace the pending move
                let last = self.points.last_mut().unwrap();
                *last = SPoint::new(x, y);
            }
            _ => {
                self.sfinish();
                self.sdraw(x, y);
            }
        }
    }

    pub(crate) fn sdraw(&mut self, x: SFixed, y: SFixed) {
        if self.current_subpath_len() > 0 {
            let last = *self.points.last().unwrap();
            if last.x == x && last.y == y {
                return;
            }
        }
        self.points.push(SPoint::new(x, y));
    }

    // ------------------------------------------------------------------
    // user-coordinate operations

    pub fn move_to(&mut self, x: Fixed, y: Fixed) {
        let m = self.state.matrix;
        self.smove(m.x(x, y), m.y(x, y));
    }

    pub fn rel_move_to(&mut self, dx: Fixed, dy: Fixed) {
        let here = self.current_spoint();
        let m = self.state.matrix;
        self.smove(here.x + m.dx(dx, dy), here.y + m.dy(dx, dy));
    }

    pub fn draw(&mut self, x: Fixed, y: Fixed) {
        let m = self.state.matrix;
        self.sdraw(m.x(x, y), m.y(x, y));
    }

    pub fn rel_draw(&mut self, dx: Fixed, dy: Fixed) {
        let here = self.current_spoint();
        let m = self.state.matrix;
        self.sdraw(here.x + m.dx(dx, dy), here.y + m.dy(dx, dy));
    }

    /// Replay the first point of the current subpath.
    pub fn close(&mut self) {
        if self.current_subpath_len() >= 2 {
            let f = self.subpath_first_spoint();
            self.sdraw(f.x, f.y);
        }
    }

    /// Cubic Bézier from the current point through `(x1,y1)`, `(x2,y2)` to
    /// `(x3,y3)`.
    pub fn curve(&mut self, x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed, x3: Fixed, y3: Fixed) {
        if self.points.is_empty() {
            self.smove(SFixed(0), SFixed(0));
        }
        let m = self.state.matrix;
        spline::scurve(
            self,
            m.x(x1, y1),
            m.y(x1, y1),
            m.x(x2, y2),
            m.y(x2, y2),
            m.x(x3, y3),
            m.y(x3, y3),
        );
    }

    /// Quadratic Bézier, degree-elevated onto the cubic case.
    pub fn quadratic_curve(&mut self, xc: Fixed, yc: Fixed, x: Fixed, y: Fixed) {
        let (x0, y0) = self.user_current();
        let x1 = x0 + (xc - x0) * 2 / 3;
        let y1 = y0 + (yc - y0) * 2 / 3;
        let x2 = x + (xc - x) * 2 / 3;
        let y2 = y + (yc - y) * 2 / 3;
        self.curve(x1, y1, x2, y2, x, y);
    }

    pub fn circle(&mut self, x: Fixed, y: Fixed, radius: Fixed) {
        self.ellipse(x, y, radius, radius);
    }

    pub fn ellipse(&mut self, x: Fixed, y: Fixed, x_radius: Fixed, y_radius: Fixed) {
        self.move_to(x + x_radius, y);
        self.arc(x, y, x_radius, y_radius, Angle::D0, Angle::D360);
        self.close();
    }

    /// Elliptical arc swept from `start` by `extent` (either direction).
    ///
    /// The number of flattened sides is `max_radius / tolerance` clamped to
    /// 1024 and rounded up to a power of two so the grid angles divide the
    /// circle evenly; the exact endpoints of the sweep are always emitted.
    pub fn arc(
        &mut self,
        x: Fixed,
        y: Fixed,
        x_radius: Fixed,
        y_radius: Fixed,
        start: Angle,
        extent: Angle,
    ) {
        let save = self.state.matrix;
        self.translate(x, y);
        self.scale(x_radius, y_radius);

        let max_radius = matrix_max_radius(&self.state.matrix);
        let mut sides = max_radius.0 / SFixed::TOLERANCE.to_fixed().0;
        if sides > 1024 {
            sides = 1024;
        }
        let mut n = 2;
        while (1 << n) < sides {
            n += 1;
        }

        let step = Angle(Angle::D360.0 >> n);
        let (inc, epsilon) = if extent.0 < 0 {
            (Angle(-step.0), -1i16)
        } else {
            (step, 1i16)
        };

        let first = Angle((start.0 + inc.0 - epsilon) & !(step.0 - 1));
        let last = Angle((start.0 + extent.0 - inc.0 + epsilon) & !(step.0 - 1));

        if first != start {
            self.draw(start.cos(), start.sin());
        }
        let mut a = first;
        while a != last {
            self.draw(a.cos(), a.sin());
            a += inc;
        }
        let end = Angle(start.0 + extent.0);
        if last != end {
            self.draw(end.cos(), end.sin());
        }

        self.state.matrix = save;
    }

    pub fn rectangle(&mut self, x: Fixed, y: Fixed, w: Fixed, h: Fixed) {
        self.move_to(x, y);
        self.draw(x + w, y);
        self.draw(x + w, y + h);
        self.draw(x, y + h);
        self.close();
    }

    pub fn rounded_rectangle(
        &mut self,
        x: Fixed,
        y: Fixed,
        w: Fixed,
        h: Fixed,
        x_radius: Fixed,
        y_radius: Fixed,
    ) {
        let save = self.state.matrix;
        self.translate(x, y);
        self.move_to(Fixed(0), y_radius);
        self.arc(x_radius, y_radius, x_radius, y_radius, Angle::D180, Angle::D90);
        self.draw(w - x_radius, Fixed(0));
        self.arc(w - x_radius, y_radius, x_radius, y_radius, Angle::D270, Angle::D90);
        self.draw(w, h - y_radius);
        self.arc(w - x_radius, h - y_radius, x_radius, y_radius, Angle::D0, Angle::D90);
        self.draw(x_radius, h);
        self.arc(x_radius, h - y_radius, x_radius, y_radius, Angle::D90, Angle::D90);
        self.close();
        self.state.matrix = save;
    }

    /// A rounded rectangle whose radius is half the smaller dimension.
    pub fn lozenge(&mut self, x: Fixed, y: Fixed, w: Fixed, h: Fixed) {
        let radius = if w > h { h / 2 } else { w / 2 };
        self.rounded_rectangle(x, y, w, h, radius, radius);
    }

    /// A tab shape: rounded at the top, square at the bottom.
    pub fn tab(&mut self, x: Fixed, y: Fixed, w: Fixed, h: Fixed, x_radius: Fixed, y_radius: Fixed) {
        let save = self.state.matrix;
        self.translate(x, y);
        self.move_to(Fixed(0), y_radius);
        self.arc(x_radius, y_radius, x_radius, y_radius, Angle::D180, Angle::D90);
        self.draw(w - x_radius, Fixed(0));
        self.arc(w - x_radius, y_radius, x_radius, y_radius, Angle::D270, Angle::D90);
        self.draw(w, h);
        self.draw(Fixed(0), h);
        self.close();
        self.state.matrix = save;
    }

    pub fn empty(&mut self) {
        self.points.clear();
        self.sublen.clear();
    }

    /// Integer-pixel bounding rectangle of every stored point.
    pub fn bounds(&self) -> Rect {
        let mut left = SFixed::MAX;
        let mut top = SFixed::MAX;
        let mut right = SFixed::MIN;
        let mut bottom = SFixed::MIN;

        for p in &self.points {
            left = left.min(p.x);
            right = right.max(p.x);
            top = top.min(p.y);
            bottom = bottom.max(p.y);
        }
        if left >= right || top >= bottom {
            return Rect::ZERO;
        }
        Rect {
            left: left.trunc() as i16,
            top: top.trunc() as i16,
            right: right.ceil().trunc() as i16,
            bottom: bottom.ceil().trunc() as i16,
        }
    }

    /// Append all of `src`'s subpaths, breaking subpaths where `src` does.
    pub fn append(&mut self, src: &Path) {
        let mut s = 0;
        for (p, point) in src.points.iter().enumerate() {
            if s < src.sublen.len() && p == src.sublen[s] {
                self.sfinish();
                s += 1;
            }
            self.sdraw(point.x, point.y);
        }
    }

    // ------------------------------------------------------------------
    // state

    pub fn save(&self) -> PathState {
        self.state
    }

    pub fn restore(&mut self, state: &PathState) {
        self.state = *state;
    }

    pub fn set_matrix(&mut self, matrix: Matrix) {
        self.state.matrix = matrix;
    }

    pub fn current_matrix(&self) -> Matrix {
        self.state.matrix
    }

    pub fn identity(&mut self) {
        self.state.matrix = Matrix::identity();
    }

    pub fn translate(&mut self, tx: Fixed, ty: Fixed) {
        self.state.matrix.translate(tx, ty);
    }

    pub fn scale(&mut self, sx: Fixed, sy: Fixed) {
        self.state.matrix.scale(sx, sy);
    }

    pub fn rotate(&mut self, a: Angle) {
        self.state.matrix.rotate(a);
    }

    pub fn set_font_size(&mut self, font_size: Fixed) {
        self.state.font_size = font_size;
    }

    pub fn current_font_size(&self) -> Fixed {
        self.state.font_size
    }

    pub fn set_font_style(&mut self, font_style: FontStyle) {
        self.state.font_style = font_style;
    }

    pub fn current_font_style(&self) -> FontStyle {
        self.state.font_style
    }

    pub fn set_cap_style(&mut self, cap_style: CapStyle) {
        self.state.cap_style = cap_style;
    }

    pub fn current_cap_style(&self) -> CapStyle {
        self.state.cap_style
    }

    pub(crate) fn state(&self) -> &PathState {
        &self.state
    }

    // ------------------------------------------------------------------
    // introspection for the rasterizer

    pub(crate) fn points(&self) -> &[SPoint] {
        &self.points
    }

    /// Drop the most recently appended point (stroke cap rewriting).
    pub(crate) fn pop_point(&mut self) {
        self.points.pop();
    }

    pub(crate) fn replace_point(&mut self, index: usize, p: SPoint) {
        self.points[index] = p;
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    /// Iterate over subpaths as point slices, including the unfinished
    /// trailing one.
    pub(crate) fn subpaths(&self) -> impl Iterator<Item = &[SPoint]> + '_ {
        let mut start = 0;
        let breaks = self.sublen.iter().copied().chain(Some(self.points.len()));
        breaks.filter_map(move |end| {
            let s = start;
            start = end;
            if end > s {
                Some(&self.points[s..end])
            } else {
                None
            }
        })
    }

    fn user_current(&mut self) -> (Fixed, Fixed) {
        // The matrix is not generally invertible in fixed point, so the
        // quadratic lowering approximates the current user-space point by
        // the untransformed grid point. Exact for the identity transform,
        // which is how glyph interpretation (the only internal caller)
        // reaches this.
        let here = self.current_spoint();
        (here.x.to_fixed(), here.y.to_fixed())
    }
}

fn matrix_max_radius(m: &Matrix) -> Fixed {
    m.m[0][0].abs() + m.m[0][1].abs() + m.m[1][0].abs() + m.m[1][1].abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fi(i: i32) -> Fixed {
        Fixed::from_int(i)
    }

    #[test]
    fn duplicate_points_are_dropped() {
        let mut p = Path::new();
        p.move_to(fi(1), fi(1));
        p.draw(fi(1), fi(1));
        p.draw(fi(2), fi(1));
        p.draw(fi(2), fi(1));
        assert_eq!(p.points().len(), 2);
    }

    #[test]
    fn short_subpath_discarded_on_finish() {
        let mut p = Path::new();
        p.move_to(fi(1), fi(1));
        p.sfinish();
        assert_eq!(p.points().len(), 0);
        assert_eq!(p.subpaths().count(), 0);
    }

    #[test]
    fn move_after_draw_finishes_subpath() {
        let mut p = Path::new();
        p.move_to(fi(0), fi(0));
        p.draw(fi(1), fi(0));
        p.move_to(fi(5), fi(5));
        p.draw(fi(6), fi(5));
        let subs: Vec<_> = p.subpaths().map(|s| s.len()).collect();
        assert_eq!(subs, [2, 2]);
    }

    #[test]
    fn close_replays_first_point() {
        let mut p = Path::new();
        p.move_to(fi(0), fi(0));
        p.draw(fi(4), fi(0));
        p.draw(fi(4), fi(4));
        p.close();
        let pts = p.points();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[0], pts[3]);
    }

    #[test]
    fn bounds_of_rectangle() {
        let mut p = Path::new();
        p.rectangle(fi(1), fi(2), fi(3), fi(4));
        assert_eq!(p.bounds(), Rect::new(1, 2, 4, 6));
        let empty = Path::new();
        assert_eq!(empty.bounds(), Rect::ZERO);
    }

    #[test]
    fn bounds_rounds_subpixel_up() {
        let mut p = Path::new();
        p.rectangle(Fixed(0x8000), Fixed(0x8000), fi(1), fi(1));
        assert_eq!(p.bounds(), Rect::new(0, 0, 2, 2));
    }

    #[test]
    fn arc_endpoints_present() {
        let mut p = Path::new();
        p.move_to(fi(10), fi(0));
        p.arc(fi(0), fi(0), fi(10), fi(10), Angle::D0, Angle::D90);
        let pts = p.points();
        let last = pts.last().unwrap();
        // ends on (0, 10)
        assert!(last.x.0.abs() <= 1, "{:?}", last);
        assert!((last.y.0 - SFixed::from_int(10).0).abs() <= 1, "{:?}", last);
    }

    #[test]
    fn append_preserves_subpath_breaks() {
        let mut a = Path::new();
        a.move_to(fi(0), fi(0));
        a.draw(fi(1), fi(0));
        a.move_to(fi(2), fi(2));
        a.draw(fi(3), fi(2));

        let mut b = Path::new();
        b.append(&a);
        assert_eq!(b.subpaths().count(), 2);
    }

    #[test]
    fn ellipse_stays_in_box() {
        let mut p = Path::new();
        p.ellipse(fi(5), fi(5), fi(5), fi(3));
        for pt in p.points() {
            assert!(pt.x >= SFixed(-1) && pt.x <= SFixed::from_int(10) + SFixed(1));
            assert!(pt.y >= SFixed::from_int(2) - SFixed(1));
            assert!(pt.y <= SFixed::from_int(8) + SFixed(1));
        }
    }

    #[test]
    fn state_save_restore() {
        let mut p = Path::new();
        let saved = p.save();
        p.translate(fi(3), fi(3));
        p.set_font_size(fi(20));
        p.set_cap_style(CapStyle::Butt);
        p.restore(&saved);
        assert!(p.current_matrix().is_identity());
        assert_eq!(p.current_font_size(), fi(15));
        assert_eq!(p.current_cap_style(), CapStyle::Round);
    }
}
