//! Static text widget.
use fxp::Fixed;
use genpool::Ptr;

use super::{core_dispatch, queue_layout, DispatchResult, TreeRc};
use crate::draw;
use crate::event::Event;
use crate::font::{self, DEFAULT_FONT};
use crate::geom::Point;
use crate::path::{FontStyle, Path};
use crate::pixel::Argb32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Clone)]
pub(crate) struct LabelWidget {
    pub text: String,
    pub foreground: Argb32,
    pub font_size: Fixed,
    pub font_style: FontStyle,
    pub align: Align,
    /// Paint offset, nudged by buttons for the sunk look.
    pub offset: Point,
}

impl LabelWidget {
    pub(crate) fn new(
        text: &str,
        foreground: Argb32,
        font_size: Fixed,
        font_style: FontStyle,
    ) -> LabelWidget {
        LabelWidget {
            text: text.into(),
            foreground,
            font_size,
            font_style,
            align: Align::Center,
            offset: Point::default(),
        }
    }

    /// Preferred size: twice the font size each way plus the text width.
    pub(crate) fn query_geometry(&self) -> (i16, i16) {
        let mut path = Path::new();
        path.set_font_size(self.font_size);
        path.set_font_style(self.font_style);
        let m = font::text_metrics_utf8(&mut path, &DEFAULT_FONT, self.text.as_bytes());

        let base = self.font_size.to_int() as i16 * 2;
        (base + m.width.to_int() as i16, base)
    }

    /// Paint into a `w × h` cell at the pixmap's current origin.
    pub(crate) fn paint(&self, px: &mut crate::pixmap::Pixmap, w: i16, h: i16) {
        let mut path = Path::new();
        path.set_font_size(self.font_size);
        path.set_font_style(self.font_style);
        let m = font::text_metrics_utf8(&mut path, &DEFAULT_FONT, self.text.as_bytes());

        let wf = Fixed::from_int(w as i32);
        let hf = Fixed::from_int(h as i32);
        let y = (hf - (m.ascent + m.descent)) / 2 + m.ascent + self.offset.y;
        let x = match self.align {
            Align::Left => self.font_size / 2,
            Align::Center => (wf - m.width) / 2,
            Align::Right => wf - self.font_size / 2 - m.width,
        } + self.offset.x;

        path.move_to(x, y);
        path.utf8(&DEFAULT_FONT, self.text.as_bytes());
        draw::paint_path(px, self.foreground, &path);
    }
}

/// Access the label data of a label *or* button widget (a button embeds
/// its label).
pub(crate) fn with_label<R>(
    tree_rc: &TreeRc,
    id: Ptr,
    f: impl FnOnce(&mut LabelWidget) -> R,
) -> Option<R> {
    let mut tree = tree_rc.borrow_mut();
    let w = tree.widgets.get_mut(id)?;
    match &mut w.kind {
        super::Kind::Label(l) => Some(f(l)),
        super::Kind::Button(b) => Some(f(&mut b.label)),
        _ => None,
    }
}

/// Replace the label's content and styling, queueing a re-layout.
pub(crate) fn label_set(
    tree_rc: &TreeRc,
    id: Ptr,
    text: Option<&str>,
    foreground: Argb32,
    font_size: Fixed,
    font_style: FontStyle,
) {
    let found = with_label(tree_rc, id, |l| {
        if let Some(text) = text {
            l.text = text.into();
        }
        l.foreground = foreground;
        l.font_size = font_size;
        l.font_style = font_style;
    });
    if found.is_some() {
        queue_layout(tree_rc, id);
    }
}

pub(crate) fn dispatch(tree_rc: &TreeRc, id: Ptr, event: &Event) -> DispatchResult {
    if core_dispatch(tree_rc, id, event) == DispatchResult::Done {
        return DispatchResult::Done;
    }

    match event {
        Event::QueryGeometry => {
            let size = with_label(tree_rc, id, |l| l.query_geometry());
            if let Some((w, h)) = size {
                let mut tree = tree_rc.borrow_mut();
                if let Some(widget) = tree.widgets.get_mut(id) {
                    widget.preferred.width = w;
                    widget.preferred.height = h;
                }
            }
        }
        Event::Paint => {
            let (pixmap, w, h) = {
                let tree = tree_rc.borrow();
                let pixmap = tree.window.pixmap();
                match tree.widgets.get(id) {
                    Some(widget) => (pixmap, widget.width(), widget.height()),
                    None => return DispatchResult::Continue,
                }
            };
            // clone the label state out so painting can borrow the pixmap
            let label = with_label(tree_rc, id, |l| l.clone());
            if let Some(label) = label {
                let mut px = pixmap.borrow_mut();
                label.paint(&mut px, w, h);
            }
        }
        _ => {}
    }
    DispatchResult::Continue
}
