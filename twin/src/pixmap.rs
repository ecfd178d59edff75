//! Addressable pixel surfaces.
//!
//! A [`Pixmap`] owns a pixel buffer in one of three formats together with
//! drawing state: a clip rectangle, a drawing origin, an affine transform
//! consulted when the pixmap is used as a composite source, and - when the
//! pixmap is shown - its position on a screen. [`HPixmap`] is the shared
//! handle that the screen's Z-order list and windows hold; clones refer to
//! the same surface.
use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use crate::geom::{Coord, Rect};
use crate::matrix::Matrix;
use crate::pixel::{self, A8, Argb32, Format, Rgb16};
use crate::screen::ScreenState;
use crate::window::WindowState;

#[derive(Debug, Clone)]
pub(crate) enum Pixels {
    A8(Vec<A8>),
    Rgb16(Vec<Rgb16>),
    Argb32(Vec<Argb32>),
}

/// Scratch row for the bilinear resampler, reallocated only when the
/// requested width grows.
#[derive(Debug, Default)]
pub(crate) struct XformCache {
    pub argb32: Vec<Argb32>,
}

#[derive(Debug)]
pub struct Pixmap {
    pub(crate) format: Format,
    pub(crate) width: Coord,
    pub(crate) height: Coord,
    /// Row pitch in elements of the format's pixel type.
    pub(crate) stride: usize,
    pub(crate) pixels: Pixels,
    pub(crate) transform: Matrix,
    /// Clip rectangle in pixmap coordinates; always inside the surface.
    pub(crate) clip: Rect,
    pub(crate) origin_x: Coord,
    pub(crate) origin_y: Coord,
    /// Position on the owning screen.
    pub(crate) x: Coord,
    pub(crate) y: Coord,
    pub(crate) screen: Weak<RefCell<ScreenState>>,
    pub(crate) window: Weak<RefCell<WindowState>>,
    pub(crate) disable: u32,
    pub(crate) xform_cache: RefCell<XformCache>,
}

/// Shared handle to a [`Pixmap`].
#[derive(Clone)]
pub struct HPixmap {
    rc: Rc<RefCell<Pixmap>>,
}

impl std::fmt::Debug for HPixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HPixmap({:p})", Rc::as_ptr(&self.rc))
    }
}

impl PartialEq for HPixmap {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.rc, &other.rc)
    }
}

impl Pixmap {
    /// A zero-initialized pixmap with a tight stride.
    pub fn new(format: Format, width: Coord, height: Coord) -> Pixmap {
        let stride = width.max(0) as usize;
        let count = stride * height.max(0) as usize;
        let pixels = match format {
            Format::A8 => Pixels::A8(vec![0; count]),
            Format::Rgb16 => Pixels::Rgb16(vec![0; count]),
            Format::Argb32 => Pixels::Argb32(vec![0; count]),
        };
        Pixmap {
            format,
            width,
            height,
            stride,
            pixels,
            transform: Matrix::identity(),
            clip: Rect::of_size(width, height),
            origin_x: 0,
            origin_y: 0,
            x: 0,
            y: 0,
            screen: Weak::new(),
            window: Weak::new(),
            disable: 0,
            xform_cache: RefCell::new(XformCache::default()),
        }
    }

    /// Wrap a caller-provided ARGB32 buffer. The buffer is owned from here
    /// on but its size and stride are never changed.
    pub fn from_argb32(width: Coord, height: Coord, stride: usize, pixels: Vec<Argb32>) -> Option<Pixmap> {
        if stride < width.max(0) as usize
            || pixels.len() < stride * height.max(0) as usize
        {
            return None;
        }
        let mut px = Pixmap::new(Format::Argb32, 0, 0);
        px.width = width;
        px.height = height;
        px.stride = stride;
        px.pixels = Pixels::Argb32(pixels);
        px.clip = Rect::of_size(width, height);
        Some(px)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    // ------------------------------------------------------------------
    // row access

    #[inline]
    pub(crate) fn row_offset(&self, x: Coord, y: Coord) -> usize {
        y as usize * self.stride + x as usize
    }

    pub(crate) fn a8_row(&self, x: Coord, y: Coord, width: usize) -> &[A8] {
        let off = self.row_offset(x, y);
        match &self.pixels {
            Pixels::A8(v) => &v[off..off + width],
            _ => panic!("pixmap is not A8"),
        }
    }

    pub(crate) fn a8_row_mut(&mut self, x: Coord, y: Coord, width: usize) -> &mut [A8] {
        let off = self.row_offset(x, y);
        match &mut self.pixels {
            Pixels::A8(v) => &mut v[off..off + width],
            _ => panic!("pixmap is not A8"),
        }
    }

    pub(crate) fn rgb16_row(&self, x: Coord, y: Coord, width: usize) -> &[Rgb16] {
        let off = self.row_offset(x, y);
        match &self.pixels {
            Pixels::Rgb16(v) => &v[off..off + width],
            _ => panic!("pixmap is not RGB16"),
        }
    }

    pub(crate) fn rgb16_row_mut(&mut self, x: Coord, y: Coord, width: usize) -> &mut [Rgb16] {
        let off = self.row_offset(x, y);
        match &mut self.pixels {
            Pixels::Rgb16(v) => &mut v[off..off + width],
            _ => panic!("pixmap is not RGB16"),
        }
    }

    pub(crate) fn argb32_row(&self, x: Coord, y: Coord, width: usize) -> &[Argb32] {
        let off = self.row_offset(x, y);
        match &self.pixels {
            Pixels::Argb32(v) => &v[off..off + width],
            _ => panic!("pixmap is not ARGB32"),
        }
    }

    pub(crate) fn argb32_row_mut(&mut self, x: Coord, y: Coord, width: usize) -> &mut [Argb32] {
        let off = self.row_offset(x, y);
        match &mut self.pixels {
            Pixels::Argb32(v) => &mut v[off..off + width],
            _ => panic!("pixmap is not ARGB32"),
        }
    }

    /// Fetch one pixel widened to ARGB32, without any bounds clipping.
    pub(crate) fn fetch_raw(&self, x: Coord, y: Coord) -> Argb32 {
        let off = self.row_offset(x, y);
        match &self.pixels {
            Pixels::A8(v) => pixel::a8_to_argb32(v[off]),
            Pixels::Rgb16(v) => pixel::rgb16_to_argb32(v[off]),
            Pixels::Argb32(v) => v[off],
        }
    }

    // ------------------------------------------------------------------
    // transform, clip, origin

    pub fn set_transform(&mut self, transform: Matrix) {
        self.transform = transform;
    }

    pub fn transform(&self) -> Matrix {
        self.transform
    }

    pub fn set_origin(&mut self, ox: Coord, oy: Coord) {
        self.origin_x = ox;
        self.origin_y = oy;
    }

    pub fn offset(&mut self, dx: Coord, dy: Coord) {
        self.origin_x += dx;
        self.origin_y += dy;
    }

    pub fn origin(&self) -> (Coord, Coord) {
        (self.origin_x, self.origin_y)
    }

    /// Fold the clip's top-left corner into the drawing origin.
    pub fn origin_to_clip(&mut self) {
        self.origin_x = self.clip.left;
        self.origin_y = self.clip.top;
    }

    /// Intersect the clip with a rectangle given in origin-relative
    /// coordinates. The clip never leaves the surface.
    pub fn clip(&mut self, left: Coord, top: Coord, right: Coord, bottom: Coord) {
        let left = left + self.origin_x;
        let right = right + self.origin_x;
        let top = top + self.origin_y;
        let bottom = bottom + self.origin_y;

        let c = &mut self.clip;
        c.left = c.left.max(left);
        c.top = c.top.max(top);
        c.right = c.right.min(right);
        c.bottom = c.bottom.min(bottom);

        if c.left >= c.right {
            c.left = 0;
            c.right = 0;
        }
        if c.top >= c.bottom {
            c.top = 0;
            c.bottom = 0;
        }
        c.left = c.left.max(0);
        c.top = c.top.max(0);
        c.right = c.right.min(self.width);
        c.bottom = c.bottom.min(self.height);
    }

    pub fn set_clip(&mut self, clip: Rect) {
        self.clip(clip.left, clip.top, clip.right, clip.bottom);
    }

    /// The clip in origin-relative coordinates.
    pub fn get_clip(&self) -> Rect {
        self.clip.translate(-self.origin_x, -self.origin_y)
    }

    /// The clip in absolute pixmap coordinates, for later
    /// [`Pixmap::restore_clip`].
    pub fn save_clip(&self) -> Rect {
        self.clip
    }

    pub fn restore_clip(&mut self, clip: Rect) {
        self.clip = clip;
    }

    pub fn reset_clip(&mut self) {
        self.clip = Rect::of_size(self.width, self.height);
    }

    // ------------------------------------------------------------------
    // screen linkage

    /// Record damage in pixmap-local coordinates; forwarded to the screen
    /// in screen space when the pixmap is shown.
    pub fn damage(&mut self, left: Coord, top: Coord, right: Coord, bottom: Coord) {
        if let Some(screen) = self.screen.upgrade() {
            ScreenState::damage_external(
                &screen,
                left + self.x,
                top + self.y,
                right + self.x,
                bottom + self.y,
            );
        }
    }

    /// True outside the pixmap or where the pixel's alpha is zero.
    /// Coordinates are in screen space.
    pub fn transparent(&self, x: Coord, y: Coord) -> bool {
        let (lx, ly) = (x - self.x, y - self.y);
        if lx < 0 || lx >= self.width || ly < 0 || ly >= self.height {
            return true;
        }
        (self.fetch_raw(lx, ly) >> 24) == 0
    }

    pub fn position(&self) -> (Coord, Coord) {
        (self.x, self.y)
    }
}

impl HPixmap {
    pub fn new(format: Format, width: Coord, height: Coord) -> HPixmap {
        HPixmap::from_pixmap(Pixmap::new(format, width, height))
    }

    pub fn from_pixmap(pixmap: Pixmap) -> HPixmap {
        HPixmap {
            rc: Rc::new(RefCell::new(pixmap)),
        }
    }

    pub fn borrow(&self) -> Ref<'_, Pixmap> {
        self.rc.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Pixmap> {
        self.rc.borrow_mut()
    }

    /// Move the pixmap on its screen, damaging both the old and the new
    /// extents.
    pub fn move_to(&self, x: Coord, y: Coord) {
        let (w, h) = {
            let px = self.borrow();
            (px.width, px.height)
        };
        self.borrow_mut().damage(0, 0, w, h);
        {
            let mut px = self.borrow_mut();
            px.x = x;
            px.y = y;
        }
        self.borrow_mut().damage(0, 0, w, h);
    }

    /// Start compositing this pixmap on `screen`, directly above `lower`
    /// (or at the bottom of the stack).
    pub fn show(&self, screen: &crate::screen::Screen, lower: Option<&HPixmap>) {
        screen.show_pixmap(self, lower);
    }

    /// Stop compositing this pixmap and remove it from its screen.
    pub fn hide(&self) {
        let screen = { self.borrow().screen.upgrade() };
        if let Some(screen) = screen {
            ScreenState::remove_pixmap(&screen, self);
        }
    }

    /// Balance an earlier [`HPixmap::disable_update`].
    pub fn enable_update(&self) {
        let screen = {
            let mut px = self.borrow_mut();
            debug_assert!(px.disable > 0, "unbalanced enable_update");
            px.disable -= 1;
            if px.disable == 0 {
                px.screen.upgrade()
            } else {
                None
            }
        };
        if let Some(screen) = screen {
            ScreenState::enable_update_external(&screen);
        }
    }

    /// Defer screen updates involving this pixmap until the matching
    /// [`HPixmap::enable_update`]. Pairs nest.
    pub fn disable_update(&self) {
        let screen = {
            let mut px = self.borrow_mut();
            px.disable += 1;
            if px.disable == 1 {
                px.screen.upgrade()
            } else {
                None
            }
        };
        if let Some(screen) = screen {
            ScreenState::disable_update_external(&screen);
        }
    }

    /// Route an input event to the window shown in this pixmap, if any.
    pub fn dispatch(&self, event: &crate::event::Event) -> bool {
        let window = { self.borrow().window.upgrade() };
        if let Some(window) = window {
            crate::window::dispatch_rc(&window, event)
        } else {
            false
        }
    }
}
