//! Input and widget events.
use crate::geom::{Coord, Rect};

/// Keyboard symbol, backend-defined.
pub type KeySym = u32;

/// Pointer event payload. `screen_x`/`screen_y` are screen coordinates;
/// `x`/`y` are translated into the current target's space as the event is
/// routed down the pixmap, window, and widget layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pointer {
    pub screen_x: Coord,
    pub screen_y: Coord,
    pub x: Coord,
    pub y: Coord,
    /// Button bitmask; bit 0 is the primary button.
    pub button: u32,
}

impl Pointer {
    pub fn at(screen_x: Coord, screen_y: Coord, button: u32) -> Pointer {
        Pointer {
            screen_x,
            screen_y,
            x: screen_x,
            y: screen_y,
            button,
        }
    }

    /// The same event seen from a space offset by `(dx, dy)`.
    pub(crate) fn translated(&self, dx: Coord, dy: Coord) -> Pointer {
        Pointer {
            x: self.x - dx,
            y: self.y - dy,
            ..*self
        }
    }

    /// Local coordinates rebased to a pixmap at `(x, y)` on the screen.
    pub(crate) fn to_pixmap(&self, px_x: Coord, px_y: Coord) -> Pointer {
        Pointer {
            x: self.screen_x - px_x,
            y: self.screen_y - px_y,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A mouse button went down; bit set in the payload mask.
    ButtonDown(Pointer),
    ButtonUp(Pointer),
    Motion(Pointer),
    /// Synthesized during routing when the pointer target changes.
    Enter(Pointer),
    Leave(Pointer),

    KeyDown(KeySym),
    KeyUp(KeySym),
    /// A decoded character.
    Ucs4(char),

    /// Synthesized on focus changes.
    Activate,
    Deactivate,

    // widget-internal; never crosses the backend boundary
    Paint,
    QueryGeometry,
    Configure(Rect),
    Destroy,
}

impl Event {
    pub(crate) fn pointer(&self) -> Option<&Pointer> {
        match self {
            Event::ButtonDown(p)
            | Event::ButtonUp(p)
            | Event::Motion(p)
            | Event::Enter(p)
            | Event::Leave(p) => Some(p),
            _ => None,
        }
    }

    /// Rebuild the same event kind around a new pointer payload.
    pub(crate) fn with_pointer(&self, p: Pointer) -> Event {
        match self {
            Event::ButtonDown(_) => Event::ButtonDown(p),
            Event::ButtonUp(_) => Event::ButtonUp(p),
            Event::Motion(_) => Event::Motion(p),
            Event::Enter(_) => Event::Enter(p),
            Event::Leave(_) => Event::Leave(p),
            other => *other,
        }
    }
}
