//! The widget tree: boxes, labels, buttons, and custom widgets hosted by
//! a toplevel inside a window.
//!
//! Widgets live in a pool owned by their [`Toplevel`]; parent, child, and
//! copy-geometry links are generational handles, so a destroyed widget's
//! handle goes inert instead of dangling. Dispatch walks the tree with an
//! event per concern: `QueryGeometry` computes preferred sizes bottom-up,
//! `Configure` distributes space top-down, `Paint` recurses through
//! children with the pixmap clip narrowed to each child.
use std::cell::RefCell;
use std::rc::Rc;

use fxp::Fixed;
use genpool::{Pool, Ptr};

use crate::draw;
use crate::event::Event;
use crate::geom::{Coord, Rect};
use crate::pixel::{Argb32, Operator};
use crate::pixmap::Pixmap;
use crate::window::Window;

mod boxes;
mod button;
mod label;
mod toplevel;

pub use boxes::BoxDir;
pub use button::ButtonSignal;
pub use label::Align;
pub use toplevel::Toplevel;

use boxes::BoxWidget;
use button::ButtonWidget;
use label::LabelWidget;

/// Handle to a widget within its toplevel's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetId(pub(crate) Ptr);

/// Preferred geometry and stretch weights reported by `QueryGeometry`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutHint {
    pub width: Coord,
    pub height: Coord,
    pub stretch_width: Coord,
    pub stretch_height: Coord,
}

/// The outline a widget's background is filled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    RoundedRectangle,
    Lozenge,
    Tab,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Continue,
    Done,
}

/// Hook for application-defined widgets; runs after the built-in
/// background handling.
pub trait WidgetHandler {
    fn dispatch(&mut self, core: &mut WidgetCore<'_>, event: &Event) -> DispatchResult;
}

/// The mutable view a [`WidgetHandler`] gets of its widget.
pub struct WidgetCore<'a> {
    pub extents: Rect,
    pub preferred: LayoutHint,
    pub background: Argb32,
    /// The window pixmap, clipped to the widget with the origin at its
    /// top-left corner.
    pub pixmap: &'a mut Pixmap,
}

pub(crate) enum Kind {
    Box(BoxWidget),
    Label(LabelWidget),
    Button(ButtonWidget),
    Plain,
    Custom(Box<dyn WidgetHandler>),
    /// Placeholder while a custom handler is checked out.
    Vacant,
}

pub(crate) struct Widget {
    pub parent: Option<Ptr>,
    pub extents: Rect,
    pub preferred: LayoutHint,
    pub background: Argb32,
    pub shape: Shape,
    pub radius: Fixed,
    pub paint: bool,
    pub layout: bool,
    pub want_focus: bool,
    pub copy_geom: Option<Ptr>,
    pub kind: Kind,
}

impl Widget {
    pub(crate) fn new(parent: Option<Ptr>, preferred: LayoutHint, kind: Kind) -> Widget {
        Widget {
            parent,
            extents: Rect::ZERO,
            preferred,
            background: 0x0000_0000,
            shape: Shape::Rectangle,
            radius: Fixed::from_int(12),
            paint: true,
            layout: true,
            want_focus: false,
            copy_geom: None,
            kind,
        }
    }

    pub(crate) fn width(&self) -> Coord {
        self.extents.width()
    }

    pub(crate) fn height(&self) -> Coord {
        self.extents.height()
    }

    pub(crate) fn contains(&self, x: Coord, y: Coord) -> bool {
        0 <= x && x < self.width() && 0 <= y && y < self.height()
    }
}

/// The widget arena plus the window it paints into.
pub(crate) struct Tree {
    pub window: Window,
    pub widgets: Pool<Widget>,
    pub root: Ptr,
}

pub(crate) type TreeRc = Rc<RefCell<Tree>>;

// ----------------------------------------------------------------------
// base behavior shared by every widget kind

/// Fill a shape with the widget background into the window pixmap (whose
/// origin is already at the widget's top-left).
pub(crate) fn paint_shape(
    px: &mut Pixmap,
    background: Argb32,
    shape: Shape,
    left: Coord,
    top: Coord,
    right: Coord,
    bottom: Coord,
    radius: Fixed,
) {
    if shape == Shape::Rectangle {
        draw::fill(px, background, Operator::Source, left, top, right, bottom);
        return;
    }

    let x = Fixed::from_int(left as i32);
    let y = Fixed::from_int(top as i32);
    let w = Fixed::from_int((right - left) as i32);
    let h = Fixed::from_int((bottom - top) as i32);

    let mut path = crate::path::Path::new();
    match shape {
        Shape::Rectangle => unreachable!(),
        Shape::RoundedRectangle => path.rounded_rectangle(x, y, w, h, radius, radius),
        Shape::Lozenge => path.lozenge(x, y, w, h),
        Shape::Tab => path.tab(x, y, w, h, radius, radius),
        Shape::Ellipse => path.ellipse(x + w / 2, y + h / 2, w / 2, h / 2),
    }
    draw::paint_path(px, background, &path);
}

/// The part of dispatch common to all widget kinds: geometry copying,
/// extents storage, and background paint.
fn core_dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    match event {
        Event::QueryGeometry => {
            let copy = {
                let mut tree = tree_rc.borrow_mut();
                let w = match tree.widgets.get_mut(id) {
                    Some(w) => w,
                    None => return DispatchResult::Done,
                };
                w.layout = false;
                w.copy_geom
            };
            if let Some(copy) = copy {
                let needs_layout = {
                    let tree = tree_rc.borrow();
                    tree.widgets.get(copy).map(|c| c.layout).unwrap_or(false)
                };
                if needs_layout {
                    dispatch(tree_rc, copy, event);
                }
                let mut tree = tree_rc.borrow_mut();
                if let Some(preferred) = tree.widgets.get(copy).map(|c| c.preferred) {
                    if let Some(w) = tree.widgets.get_mut(id) {
                        w.preferred = preferred;
                    }
                }
                return DispatchResult::Done;
            }
        }
        Event::Configure(extents) => {
            let mut tree = tree_rc.borrow_mut();
            if let Some(w) = tree.widgets.get_mut(id) {
                w.extents = *extents;
            }
        }
        Event::Paint => {
            let (background, shape, radius, w, h, pixmap) = {
                let mut tree = tree_rc.borrow_mut();
                let pixmap = tree.window.pixmap();
                let wdg = match tree.widgets.get_mut(id) {
                    Some(w) => w,
                    None => return DispatchResult::Done,
                };
                wdg.paint = false;
                (
                    wdg.background,
                    wdg.shape,
                    wdg.radius,
                    wdg.width(),
                    wdg.height(),
                    pixmap,
                )
            };
            let mut px = pixmap.borrow_mut();
            paint_shape(&mut px, background, shape, 0, 0, w, h, radius);
        }
        _ => {}
    }
    DispatchResult::Continue
}

/// Dispatch an event to a widget by kind.
pub(crate) fn dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    enum Tag {
        Box,
        Label,
        Button,
        Plain,
        Custom,
    }
    let tag = {
        let tree = tree_rc.borrow();
        match tree.widgets.get(id) {
            Some(w) => match &w.kind {
                Kind::Box(_) => Tag::Box,
                Kind::Label(_) => Tag::Label,
                Kind::Button(_) => Tag::Button,
                Kind::Plain => Tag::Plain,
                Kind::Custom(_) => Tag::Custom,
                Kind::Vacant => return DispatchResult::Continue,
            },
            None => return DispatchResult::Continue,
        }
    };

    match tag {
        Tag::Box => boxes::dispatch(tree_rc, id, event),
        Tag::Label => label::dispatch(tree_rc, id, event),
        Tag::Button => button::dispatch(tree_rc, id, event),
        Tag::Plain => core_dispatch(tree_rc, id, event),
        Tag::Custom => custom_dispatch(tree_rc, id, event),
    }
}

fn custom_dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    if core_dispatch(tree_rc, id, event) == DispatchResult::Done {
        return DispatchResult::Done;
    }

    // check the handler out of the tree so it can be called with the
    // pixmap borrowed
    let (mut handler, extents, preferred, background, pixmap) = {
        let mut tree = tree_rc.borrow_mut();
        let pixmap = tree.window.pixmap();
        let w = match tree.widgets.get_mut(id) {
            Some(w) => w,
            None => return DispatchResult::Continue,
        };
        let handler = match std::mem::replace(&mut w.kind, Kind::Vacant) {
            Kind::Custom(h) => h,
            other => {
                w.kind = other;
                return DispatchResult::Continue;
            }
        };
        (handler, w.extents, w.preferred, w.background, pixmap)
    };

    let result = {
        let mut px = pixmap.borrow_mut();
        let mut core = WidgetCore {
            extents,
            preferred,
            background,
            pixmap: &mut px,
        };
        let result = handler.dispatch(&mut core, event);
        (core.preferred, result)
    };

    let mut tree = tree_rc.borrow_mut();
    if let Some(w) = tree.widgets.get_mut(id) {
        if matches!(w.kind, Kind::Vacant) {
            w.kind = Kind::Custom(handler);
        }
        w.preferred = result.0;
    }
    result.1
}

// ----------------------------------------------------------------------
// paint/layout queueing

/// Mark `id` and its ancestors for repaint, scheduling the toplevel
/// paint work if it was not already queued.
pub(crate) fn queue_paint(tree_rc: &TreeRc, id: Ptr) {
    let mut cur = id;
    loop {
        let parent = {
            let mut tree = tree_rc.borrow_mut();
            let w = match tree.widgets.get_mut(cur) {
                Some(w) => w,
                None => return,
            };
            match w.parent {
                Some(parent) => {
                    if w.paint {
                        return;
                    }
                    w.paint = true;
                    parent
                }
                None => break,
            }
        };
        cur = parent;
    }
    toplevel::queue_toplevel_paint(tree_rc);
}

/// Mark for re-layout (which implies repaint) up to the toplevel.
pub(crate) fn queue_layout(tree_rc: &TreeRc, id: Ptr) {
    let mut cur = id;
    loop {
        let parent = {
            let mut tree = tree_rc.borrow_mut();
            let w = match tree.widgets.get_mut(cur) {
                Some(w) => w,
                None => return,
            };
            match w.parent {
                Some(parent) => {
                    if w.layout {
                        return;
                    }
                    w.layout = true;
                    w.paint = true;
                    parent
                }
                None => break,
            }
        };
        cur = parent;
    }
    toplevel::queue_toplevel_layout(tree_rc);
}

/// The widget's bevel frame: two half-frames in translucent white and
/// black give buttons their raised or sunk look.
pub(crate) fn paint_bevel(px: &mut Pixmap, w: Coord, h: Coord, b: Fixed, down: bool) {
    use crate::path::Path;

    let wf = Fixed::from_int(w as i32);
    let hf = Fixed::from_int(h as i32);
    let (top_color, bot_color) = if down {
        (0x8000_0000, 0x8080_8080)
    } else {
        (0x8080_8080, 0x8000_0000)
    };

    let mut path = Path::new();
    path.move_to(Fixed(0), Fixed(0));
    path.draw(wf, Fixed(0));
    path.draw(wf - b, b);
    path.draw(b, b);
    path.draw(b, hf - b);
    path.draw(Fixed(0), hf);
    path.close();
    draw::paint_path(px, top_color, &path);

    path.empty();
    path.move_to(b, hf - b);
    path.draw(wf - b, hf - b);
    path.draw(wf - b, b);
    path.draw(wf, Fixed(0));
    path.draw(wf, hf);
    path.draw(Fixed(0), hf);
    path.close();
    draw::paint_path(px, bot_color, &path);
}
