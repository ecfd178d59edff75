//! Twin - a tiny window system for memory-constrained targets.
//!
//! Twin synthesizes an ARGB32 display from a stack of overlapping
//! pixmaps, rasterizes vector geometry and glyphs into them with
//! fixed-point math, and routes pointer and keyboard events back to the
//! owning widgets. Everything renders in software; the backend below is
//! just a scanline sink plus an event source.
//!
//! The layers, bottom up:
//!
//!  - [`fxp`](../fxp/index.html) fixed-point scalars and trigonometry,
//!    re-exported here.
//!  - [`geom`], [`matrix`]: points, rectangles, affine transforms.
//!  - [`path`]: sub-pixel path construction, shapes, splines.
//!  - [`poly`], [`draw`]: the supersampled rasterizer and the operand
//!    compositor.
//!  - [`pixmap`], [`screen`]: surfaces, Z-order, damage, span output.
//!  - [`font`]: stroke-glyph text.
//!  - [`sched`]: the cooperative work/timeout dispatcher.
//!  - [`window`], [`widget`]: decorated windows and the widget tree.
//!  - [`blur`], [`shadow`]: stack blur and window drop shadows.
//!
//! # A minimal session
//!
//! ```no_run
//! use twin::prelude::*;
//!
//! struct Discard;
//! impl twin::screen::Sink for Discard {
//!     fn put_span(&mut self, _l: i16, _y: i16, _r: i16, _span: &[u32]) {}
//! }
//!
//! let screen = Screen::new(640, 480, Box::new(Discard));
//! let dispatcher = Dispatcher::new();
//! let top = Toplevel::new(
//!     &screen, &dispatcher, Format::Argb32, WindowStyle::Application,
//!     20, 20, 320, 200, "hello",
//! );
//! top.create_label(
//!     top.root(), "hello", 0xff000000, Fixed::from_int(18),
//!     FontStyle::ROMAN,
//! );
//! top.show();
//! dispatcher.dispatch(|| false);
//! ```
pub use fxp;

pub mod blur;
pub mod draw;
pub mod event;
pub mod font;
pub mod geom;
pub mod icon;
pub mod matrix;
pub mod path;
pub mod pixel;
pub mod pixmap;
pub mod poly;
pub mod sched;
pub mod screen;
pub mod shadow;
pub mod widget;
pub mod window;

mod convolve;
mod hull;
mod spline;

/// The types most applications touch.
pub mod prelude {
    pub use crate::event::{Event, Pointer};
    pub use crate::geom::{Coord, Point, Rect};
    pub use crate::matrix::Matrix;
    pub use crate::path::{CapStyle, FontStyle, Path};
    pub use crate::pixel::{Argb32, Format, Operator};
    pub use crate::pixmap::{HPixmap, Pixmap};
    pub use crate::sched::Dispatcher;
    pub use crate::screen::Screen;
    pub use crate::widget::{BoxDir, ButtonSignal, LayoutHint, Toplevel, WidgetId};
    pub use crate::window::{Window, WindowStyle};
    pub use fxp::{Angle, Fixed, SFixed};
}
