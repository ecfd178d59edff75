//! Push button: a label with a bevel, press tracking, and a signal
//! callback.
use fxp::Fixed;
use genpool::Ptr;

use super::label::{self, LabelWidget};
use super::{queue_paint, DispatchResult, TreeRc};
use crate::event::Event;
use crate::geom::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSignal {
    /// The button was pressed.
    Down,
    /// The button was released while still inside.
    Up,
}

pub(crate) struct ButtonWidget {
    pub label: LabelWidget,
    pub pressed: bool,
    pub active: bool,
    pub signal: Option<Box<dyn FnMut(ButtonSignal)>>,
}

impl ButtonWidget {
    pub(crate) fn new(label: LabelWidget) -> ButtonWidget {
        ButtonWidget {
            label,
            pressed: false,
            active: false,
            signal: None,
        }
    }
}

fn with_button<R>(tree_rc: &TreeRc, id: Ptr, f: impl FnOnce(&mut ButtonWidget) -> R) -> Option<R> {
    let mut tree = tree_rc.borrow_mut();
    let w = tree.widgets.get_mut(id)?;
    match &mut w.kind {
        super::Kind::Button(b) => Some(f(b)),
        _ => None,
    }
}

/// Bevel width grows with the label's font size.
fn bevel_width(tree_rc: &TreeRc, id: Ptr) -> Fixed {
    label::with_label(tree_rc, id, |l| l.font_size / 5).unwrap_or(Fixed(0))
}

/// While pressed, the label sits at its natural position; released, it
/// rides up-left by half the bevel for the raised look.
fn set_label_offset(tree_rc: &TreeRc, id: Ptr) {
    let bh = Fixed(bevel_width(tree_rc, id).0 / 2);
    let active = with_button(tree_rc, id, |b| b.active).unwrap_or(false);
    let offset = if active {
        Point::default()
    } else {
        Point::new(-bh, -bh)
    };
    label::with_label(tree_rc, id, |l| l.offset = offset);
    queue_paint(tree_rc, id);
}

fn emit(tree_rc: &TreeRc, id: Ptr, signal: ButtonSignal) {
    // check the callback out so it can freely touch the tree
    let cb = with_button(tree_rc, id, |b| b.signal.take()).flatten();
    if let Some(mut cb) = cb {
        cb(signal);
        with_button(tree_rc, id, |b| {
            if b.signal.is_none() {
                b.signal = Some(cb);
            }
        });
    }
}

pub(crate) fn dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    // a button is a label first
    if label::dispatch(tree_rc, id, event) == DispatchResult::Done {
        return DispatchResult::Done;
    }

    match event {
        Event::Paint => {
            let (pixmap, w, h) = {
                let tree = tree_rc.borrow();
                let pixmap = tree.window.pixmap();
                match tree.widgets.get(id) {
                    Some(widget) => (pixmap, widget.width(), widget.height()),
                    None => return DispatchResult::Continue,
                }
            };
            let bw = bevel_width(tree_rc, id);
            let active = with_button(tree_rc, id, |b| b.active).unwrap_or(false);
            let mut px = pixmap.borrow_mut();
            super::paint_bevel(&mut px, w, h, bw, active);
            DispatchResult::Continue
        }
        Event::ButtonDown(_) => {
            with_button(tree_rc, id, |b| {
                b.pressed = true;
                b.active = true;
            });
            set_label_offset(tree_rc, id);
            emit(tree_rc, id, ButtonSignal::Down);
            DispatchResult::Done
        }
        Event::Motion(p) => {
            let pressed = with_button(tree_rc, id, |b| b.pressed).unwrap_or(false);
            if pressed {
                let inside = {
                    let tree = tree_rc.borrow();
                    tree.widgets
                        .get(id)
                        .map(|w| w.contains(p.x, p.y))
                        .unwrap_or(false)
                };
                let changed =
                    with_button(tree_rc, id, |b| {
                        let changed = b.active != inside;
                        b.active = inside;
                        changed
                    })
                    .unwrap_or(false);
                if changed {
                    set_label_offset(tree_rc, id);
                }
            }
            DispatchResult::Done
        }
        Event::ButtonUp(_) => {
            with_button(tree_rc, id, |b| b.pressed = false);
            let was_active = with_button(tree_rc, id, |b| {
                let was = b.active;
                b.active = false;
                was
            })
            .unwrap_or(false);
            if was_active {
                set_label_offset(tree_rc, id);
                emit(tree_rc, id, ButtonSignal::Up);
            }
            DispatchResult::Done
        }
        _ => DispatchResult::Continue,
    }
}
