//! The box container: lays its children out along one axis, distributing
//! surplus or deficit by stretch weight, and routes input to them.
use genpool::Ptr;

use super::{core_dispatch, DispatchResult, LayoutHint, Shape, TreeRc};
use crate::event::Event;
use crate::geom::Rect;
use crate::pixel::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxDir {
    Horz,
    Vert,
}

pub(crate) struct BoxWidget {
    pub dir: BoxDir,
    pub children: Vec<Ptr>,
    /// Child that captured the pointer on button-down.
    pub button_down: Option<Ptr>,
    /// Child receiving key events.
    pub focus: Option<Ptr>,
}

impl BoxWidget {
    pub(crate) fn new(dir: BoxDir) -> BoxWidget {
        BoxWidget {
            dir,
            children: Vec::new(),
            button_down: None,
            focus: None,
        }
    }
}

fn with_box<R>(tree_rc: &TreeRc, id: Ptr, f: impl FnOnce(&mut BoxWidget) -> R) -> Option<R> {
    let mut tree = tree_rc.borrow_mut();
    match tree.widgets.get_mut(id) {
        Some(w) => match &mut w.kind {
            super::Kind::Box(b) => Some(f(b)),
            _ => None,
        },
        None => None,
    }
}

/// Aggregate the children's preferred sizes: sum along the box axis, max
/// across it; stretch sums along, min across.
fn query_geometry(tree_rc: &TreeRc, id: Ptr) -> DispatchResult {
    let (dir, children) =
        match with_box(tree_rc, id, |b| (b.dir, b.children.clone())) {
            Some(v) => v,
            None => return DispatchResult::Continue,
        };

    let mut preferred = match dir {
        BoxDir::Horz => LayoutHint {
            width: 0,
            height: 0,
            stretch_width: 0,
            stretch_height: 10000,
        },
        BoxDir::Vert => LayoutHint {
            width: 0,
            height: 0,
            stretch_width: 10000,
            stretch_height: 0,
        },
    };

    for &child in &children {
        let needs_layout = {
            let tree = tree_rc.borrow();
            tree.widgets.get(child).map(|c| c.layout).unwrap_or(false)
        };
        if needs_layout {
            super::dispatch(tree_rc, child, &Event::QueryGeometry);
        }
        let child_pref = {
            let tree = tree_rc.borrow();
            match tree.widgets.get(child) {
                Some(c) => c.preferred,
                None => continue,
            }
        };
        match dir {
            BoxDir::Horz => {
                preferred.width += child_pref.width;
                preferred.stretch_width += child_pref.stretch_width;
                preferred.height = preferred.height.max(child_pref.height);
                preferred.stretch_height = preferred.stretch_height.min(child_pref.stretch_height);
            }
            BoxDir::Vert => {
                preferred.height += child_pref.height;
                preferred.stretch_height += child_pref.stretch_height;
                preferred.width = preferred.width.max(child_pref.width);
                preferred.stretch_width = preferred.stretch_width.min(child_pref.stretch_width);
            }
        }
    }

    let mut tree = tree_rc.borrow_mut();
    if let Some(w) = tree.widgets.get_mut(id) {
        w.preferred = preferred;
    }
    DispatchResult::Continue
}

/// Distribute the difference between actual and preferred size across
/// the children proportionally to their stretch weights; the last child
/// absorbs the rounding remainder.
fn configure(tree_rc: &TreeRc, id: Ptr) -> DispatchResult {
    let (dir, children, width, height, preferred) = {
        let tree = tree_rc.borrow();
        let w = match tree.widgets.get(id) {
            Some(w) => w,
            None => return DispatchResult::Continue,
        };
        let b = match &w.kind {
            super::Kind::Box(b) => b,
            _ => return DispatchResult::Continue,
        };
        (b.dir, b.children.clone(), w.width(), w.height(), w.preferred)
    };

    let (mut stretch, actual, pref) = match dir {
        BoxDir::Horz => (preferred.stretch_width, width, preferred.width),
        BoxDir::Vert => (preferred.stretch_height, height, preferred.height),
    };
    if stretch == 0 {
        stretch = 1;
    }

    let delta = actual - pref;
    let mut delta_remain = delta;
    let mut pos = 0;

    for (i, &child) in children.iter().enumerate() {
        let child_pref = {
            let tree = tree_rc.borrow();
            match tree.widgets.get(child) {
                Some(c) => c.preferred,
                None => continue,
            }
        };

        let mut delta_this = if i + 1 == children.len() {
            delta_remain
        } else {
            let stretch_this = match dir {
                BoxDir::Horz => child_pref.stretch_width,
                BoxDir::Vert => child_pref.stretch_height,
            };
            (delta as i32 * stretch_this as i32 / stretch as i32) as i16
        };
        if delta_remain < 0 {
            delta_this = delta_this.max(delta_remain);
        } else {
            delta_this = delta_this.min(delta_remain);
        }
        delta_remain -= delta_this;

        let extents = match dir {
            BoxDir::Horz => {
                let left = pos;
                pos += child_pref.width + delta_this;
                Rect::new(left, 0, pos, height)
            }
            BoxDir::Vert => {
                let top = pos;
                pos += child_pref.height + delta_this;
                Rect::new(0, top, width, pos)
            }
        };
        super::dispatch(tree_rc, child, &Event::Configure(extents));
    }
    DispatchResult::Continue
}

fn child_at(tree_rc: &TreeRc, id: Ptr, x: i16, y: i16) -> Option<Ptr> {
    let tree = tree_rc.borrow();
    let w = tree.widgets.get(id)?;
    let b = match &w.kind {
        super::Kind::Box(b) => b,
        _ => return None,
    };
    b.children
        .iter()
        .copied()
        .find(|&c| {
            tree.widgets
                .get(c)
                .map(|c| c.extents.contains(x, y))
                .unwrap_or(false)
        })
}

fn paint_children(tree_rc: &TreeRc, id: Ptr) {
    let (children, background, pixmap) = {
        let mut tree = tree_rc.borrow_mut();
        let pixmap = tree.window.pixmap();
        let w = match tree.widgets.get_mut(id) {
            Some(w) => w,
            None => return,
        };
        w.paint = false;
        let b = match &w.kind {
            super::Kind::Box(b) => b,
            _ => return,
        };
        (b.children.clone(), w.background, pixmap)
    };

    for child in children {
        let (child_paint, child_extents, child_shape) = {
            let tree = tree_rc.borrow();
            match tree.widgets.get(child) {
                Some(c) => (c.paint, c.extents, c.shape),
                None => continue,
            }
        };
        if !child_paint {
            continue;
        }

        let (saved_clip, saved_origin) = {
            let mut px = pixmap.borrow_mut();
            let saved = (px.save_clip(), px.origin());

            // a shaped child shows the box background around its outline
            if child_shape != Shape::Rectangle {
                crate::draw::fill(
                    &mut px,
                    background,
                    Operator::Source,
                    child_extents.left,
                    child_extents.top,
                    child_extents.right,
                    child_extents.bottom,
                );
            }
            px.set_clip(child_extents);
            px.origin_to_clip();
            saved
        };

        {
            let mut tree = tree_rc.borrow_mut();
            if let Some(c) = tree.widgets.get_mut(child) {
                c.paint = false;
            }
        }
        super::dispatch(tree_rc, child, &Event::Paint);

        let mut px = pixmap.borrow_mut();
        px.restore_clip(saved_clip);
        px.set_origin(saved_origin.0, saved_origin.1);
    }
}

pub(crate) fn dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    if !matches!(event, Event::Paint) && core_dispatch(tree_rc, id, event) == DispatchResult::Done {
        return DispatchResult::Done;
    }

    match event {
        Event::QueryGeometry => query_geometry(tree_rc, id),
        Event::Configure(_) => configure(tree_rc, id),
        Event::ButtonDown(p) => {
            let hit = child_at(tree_rc, id, p.x, p.y);
            with_box(tree_rc, id, |b| b.button_down = hit);
            if let Some(hit) = hit {
                let wants_focus = {
                    let tree = tree_rc.borrow();
                    tree.widgets.get(hit).map(|c| c.want_focus).unwrap_or(false)
                };
                if wants_focus {
                    with_box(tree_rc, id, |b| b.focus = Some(hit));
                }
            }
            forward_to_capture(tree_rc, id, event)
        }
        Event::ButtonUp(_) | Event::Motion(_) => forward_to_capture(tree_rc, id, event),
        Event::KeyDown(_) | Event::KeyUp(_) | Event::Ucs4(_) => {
            let focus = with_box(tree_rc, id, |b| b.focus).flatten();
            match focus {
                Some(focus) => super::dispatch(tree_rc, focus, event),
                None => DispatchResult::Continue,
            }
        }
        Event::Paint => {
            paint_children(tree_rc, id);
            DispatchResult::Continue
        }
        Event::Destroy => {
            let children = with_box(tree_rc, id, |b| b.children.clone()).unwrap_or_default();
            for child in children {
                super::dispatch(tree_rc, child, event);
            }
            DispatchResult::Continue
        }
        _ => DispatchResult::Continue,
    }
}

/// Forward a pointer event to the captured child, translated into its
/// coordinate space.
fn forward_to_capture(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    let capture = with_box(tree_rc, id, |b| b.button_down).flatten();
    let capture = match capture {
        Some(c) => c,
        None => return DispatchResult::Continue,
    };
    let extents = {
        let tree = tree_rc.borrow();
        match tree.widgets.get(capture) {
            Some(c) => c.extents,
            None => return DispatchResult::Continue,
        }
    };
    let p = match event.pointer() {
        Some(p) => p.translated(extents.left, extents.top),
        None => return DispatchResult::Continue,
    };
    let result = super::dispatch(tree_rc, capture, &event.with_pointer(p));
    if matches!(event, Event::ButtonUp(_)) {
        with_box(tree_rc, id, |b| b.button_down = None);
    }
    result
}
