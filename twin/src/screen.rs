//! The screen: a Z-ordered stack of pixmaps composited into scanline
//! spans and handed to the backend sink, plus input event routing.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::trace;

use crate::event::{Event, Pointer};
use crate::geom::{Coord, Rect};
use crate::pixel::{self, Argb32, Format};
use crate::pixmap::{HPixmap, Pixmap};

/// Backend output: receives composited ARGB32 scanlines.
///
/// `put_span` hands out a buffer the screen owns and reuses on the next
/// call; the sink must copy or convert before returning.
pub trait Sink {
    /// Announces the bounding rectangle of an update pass.
    fn put_begin(&mut self, _left: Coord, _top: Coord, _right: Coord, _bottom: Coord) {}

    /// One damaged scanline, `span` holding `right - left` pixels.
    fn put_span(&mut self, left: Coord, y: Coord, right: Coord, span: &[Argb32]);
}

pub struct ScreenState {
    width: Coord,
    height: Coord,
    /// Bottom..top.
    zorder: Vec<HPixmap>,
    background: Option<HPixmap>,
    cursor: Option<HPixmap>,
    curs_hx: Coord,
    curs_hy: Coord,
    curs_x: Coord,
    curs_y: Coord,
    damage: Rect,
    damaged: Option<Rc<dyn Fn()>>,
    disable: u32,
    active: Option<HPixmap>,
    /// Current pointer target; click-locked between button down and up.
    target: Option<HPixmap>,
    clicklock: bool,
    /// Window-drag bookkeeping, written by the window layer.
    pub(crate) button_x: Coord,
    pub(crate) button_y: Coord,
    span: Vec<Argb32>,
    sink: Box<dyn Sink>,
    event_filter: Option<Box<dyn FnMut(&Event) -> bool>>,
}

/// Shared handle to a screen.
#[derive(Clone)]
pub struct Screen {
    rc: Rc<RefCell<ScreenState>>,
}

impl Screen {
    pub fn new(width: Coord, height: Coord, sink: Box<dyn Sink>) -> Screen {
        Screen {
            rc: Rc::new(RefCell::new(ScreenState {
                width,
                height,
                zorder: Vec::new(),
                background: None,
                cursor: None,
                curs_hx: 0,
                curs_hy: 0,
                curs_x: 0,
                curs_y: 0,
                damage: Rect::ZERO,
                damaged: None,
                disable: 0,
                active: None,
                target: None,
                clicklock: false,
                button_x: -1,
                button_y: -1,
                span: Vec::new(),
                sink,
                event_filter: None,
            })),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<ScreenState>> {
        Rc::downgrade(&self.rc)
    }

    pub(crate) fn rc(&self) -> &Rc<RefCell<ScreenState>> {
        &self.rc
    }

    pub fn width(&self) -> Coord {
        self.rc.borrow().width
    }

    pub fn height(&self) -> Coord {
        self.rc.borrow().height
    }

    /// Register the callback invoked whenever enabled damage accumulates.
    pub fn register_damaged(&self, damaged: impl Fn() + 'static) {
        self.rc.borrow_mut().damaged = Some(Rc::new(damaged));
    }

    pub fn set_event_filter(&self, filter: impl FnMut(&Event) -> bool + 'static) {
        self.rc.borrow_mut().event_filter = Some(Box::new(filter));
    }

    pub fn damage(&self, left: Coord, top: Coord, right: Coord, bottom: Coord) {
        ScreenState::damage_external(&self.rc, left, top, right, bottom);
    }

    pub fn damaged(&self) -> bool {
        !self.rc.borrow().damage.is_empty()
    }

    pub fn resize(&self, width: Coord, height: Coord) {
        {
            let mut s = self.rc.borrow_mut();
            s.width = width;
            s.height = height;
        }
        self.damage(0, 0, width, height);
    }

    pub fn enable_update(&self) {
        ScreenState::enable_update_external(&self.rc);
    }

    pub fn disable_update(&self) {
        ScreenState::disable_update_external(&self.rc);
    }

    // ------------------------------------------------------------------
    // pixmap stack

    /// Insert `pixmap` above `lower` (or at the bottom of the stack) and
    /// damage its extent. A pixmap already shown elsewhere is hidden
    /// first.
    pub fn show_pixmap(&self, pixmap: &HPixmap, lower: Option<&HPixmap>) {
        let disable = pixmap.borrow().disable;
        if disable > 0 {
            self.disable_update();
        }

        // showing above itself means "keep the current neighbor below"
        let lower = match lower {
            Some(l) if l == pixmap => {
                let s = self.rc.borrow();
                s.zorder
                    .iter()
                    .position(|p| p == pixmap)
                    .and_then(|i| i.checked_sub(1))
                    .map(|i| s.zorder[i].clone())
            }
            other => other.cloned(),
        };
        pixmap.hide();

        {
            let mut s = self.rc.borrow_mut();
            let pos = match &lower {
                Some(l) => s
                    .zorder
                    .iter()
                    .position(|p| p == l)
                    .map(|i| i + 1)
                    .unwrap_or(0),
                None => 0,
            };
            s.zorder.insert(pos, pixmap.clone());
        }
        pixmap.borrow_mut().screen = self.downgrade();

        let (w, h) = {
            let px = pixmap.borrow();
            (px.width, px.height)
        };
        pixmap.borrow_mut().damage(0, 0, w, h);
    }

    /// The topmost pixmap, if any.
    pub fn top_pixmap(&self) -> Option<HPixmap> {
        self.rc.borrow().zorder.last().cloned()
    }

    // ------------------------------------------------------------------
    // focus, background, cursor

    /// Change the key-focused pixmap, delivering `Deactivate` then
    /// `Activate`.
    pub fn set_active(&self, pixmap: Option<HPixmap>) {
        let old = {
            let mut s = self.rc.borrow_mut();
            std::mem::replace(&mut s.active, pixmap.clone())
        };
        if let Some(old) = old {
            old.dispatch(&Event::Deactivate);
        }
        if let Some(new) = pixmap {
            new.dispatch(&Event::Activate);
        }
    }

    pub fn get_active(&self) -> Option<HPixmap> {
        self.rc.borrow().active.clone()
    }

    /// Set (or clear) the tiled background pattern.
    pub fn set_background(&self, pixmap: Option<HPixmap>) {
        let (w, h) = {
            let mut s = self.rc.borrow_mut();
            s.background = pixmap;
            (s.width, s.height)
        };
        self.damage(0, 0, w, h);
    }

    pub fn get_background(&self) -> Option<HPixmap> {
        self.rc.borrow().background.clone()
    }

    /// Install a cursor image with its hotspot.
    pub fn set_cursor(&self, pixmap: Option<HPixmap>, hotspot_x: Coord, hotspot_y: Coord) {
        self.disable_update();
        {
            let mut s = self.rc.borrow_mut();
            s.damage_cursor();
            s.cursor = pixmap;
            s.curs_hx = hotspot_x;
            s.curs_hy = hotspot_y;
            let (cx, cy) = (s.curs_x - hotspot_x, s.curs_y - hotspot_y);
            if let Some(cursor) = s.cursor.clone() {
                {
                    let mut px = cursor.borrow_mut();
                    px.x = cx;
                    px.y = cy;
                }
                s.damage_cursor();
            }
        }
        self.enable_update();
    }

    // ------------------------------------------------------------------
    // update

    /// Composite the damaged region bottom-to-top and emit it through the
    /// sink, then clear the damage. Suppressed while updates are
    /// disabled.
    pub fn update(&self) {
        let mut s = self.rc.borrow_mut();
        let s = &mut *s;

        let left = s.damage.left.max(0);
        let top = s.damage.top.max(0);
        let right = s.damage.right.min(s.width);
        let bottom = s.damage.bottom.min(s.height);

        if s.disable > 0 || left >= right || top >= bottom {
            return;
        }
        trace!(
            "screen update [{}, {}) x [{}, {})",
            left,
            right,
            top,
            bottom
        );

        s.damage = Rect::ZERO;
        let width = (right - left) as usize;
        if s.span.len() < width {
            s.span.resize(width, 0);
        }

        s.sink.put_begin(left, top, right, bottom);
        for y in top..bottom {
            let span = &mut s.span[..width];

            // seed with the (tiled) background pattern or white
            if let Some(bg) = &s.background {
                let bg = bg.borrow();
                let p_width = bg.width;
                let p_y = y % bg.height;
                let mut p_left = left;
                while p_left < right {
                    let m_left = p_left % p_width;
                    let mut p_this = p_width - m_left;
                    if p_left + p_this > right {
                        p_this = right - p_left;
                    }
                    let dst = &mut span[(p_left - left) as usize..][..p_this as usize];
                    dst.copy_from_slice(bg.argb32_row(m_left, p_y, p_this as usize));
                    p_left += p_this;
                }
            } else {
                for p in span.iter_mut() {
                    *p = 0xffff_ffff;
                }
            }

            for hpx in &s.zorder {
                span_pixmap(span, &hpx.borrow(), y, left, right);
            }
            if let Some(cursor) = &s.cursor {
                span_pixmap(span, &cursor.borrow(), y, left, right);
            }

            s.sink.put_span(left, y, right, &s.span[..width]);
        }
    }

    // ------------------------------------------------------------------
    // event dispatch

    /// Route a backend-posted event. Pointer events move the cursor,
    /// re-resolve the target pixmap with alpha-aware hit testing, and
    /// synthesize `Enter`/`Leave`; key events go to the active pixmap.
    pub fn dispatch(&self, event: &Event) -> bool {
        // pre-dispatch filter may consume the event
        let filter = self.rc.borrow_mut().event_filter.take();
        if let Some(mut filter) = filter {
            let consumed = filter(event);
            let mut s = self.rc.borrow_mut();
            if s.event_filter.is_none() {
                s.event_filter = Some(filter);
            }
            if consumed {
                return true;
            }
        }

        match event {
            Event::Motion(p) | Event::ButtonDown(p) | Event::ButtonUp(p) => {
                self.update_cursor(p.screen_x, p.screen_y);
                self.dispatch_pointer(event, *p)
            }
            Event::KeyDown(_) | Event::KeyUp(_) | Event::Ucs4(_) => {
                let active = self.rc.borrow().active.clone();
                match active {
                    Some(px) => px.dispatch(event),
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn dispatch_pointer(&self, event: &Event, p: Pointer) -> bool {
        let is_up = matches!(event, Event::ButtonUp(_));
        let is_down = matches!(event, Event::ButtonDown(_));

        let mut deliveries: Vec<(HPixmap, Event)> = Vec::new();
        let target = {
            let mut s = self.rc.borrow_mut();

            let mut pixmap = s.target.clone();
            let locked = s.clicklock && !is_up;

            if !locked {
                if is_up {
                    s.clicklock = false;
                }

                // topmost non-transparent pixmap under the pointer
                let ntarget = s
                    .zorder
                    .iter()
                    .rev()
                    .find(|px| !px.borrow().transparent(p.screen_x, p.screen_y))
                    .cloned();

                let changed = match (&pixmap, &ntarget) {
                    (Some(a), Some(b)) => a != b,
                    (None, None) => false,
                    _ => true,
                };
                if changed {
                    trace!("pointer target changed");
                    if let Some(old) = &pixmap {
                        let (px_x, px_y) = old.borrow().position();
                        deliveries.push((old.clone(), Event::Leave(p.to_pixmap(px_x, px_y))));
                    }
                    if let Some(new) = &ntarget {
                        let (px_x, px_y) = new.borrow().position();
                        deliveries.push((new.clone(), Event::Enter(p.to_pixmap(px_x, px_y))));
                    }
                    pixmap = ntarget;
                    s.target = pixmap.clone();
                }

                if pixmap.is_some() && is_down {
                    s.clicklock = true;
                }
            }

            pixmap
        };

        for (px, ev) in deliveries {
            px.dispatch(&ev);
        }

        if let Some(px) = target {
            let (px_x, px_y) = px.borrow().position();
            let ev = event.with_pointer(p.to_pixmap(px_x, px_y));
            px.dispatch(&ev)
        } else {
            false
        }
    }

    fn update_cursor(&self, x: Coord, y: Coord) {
        self.disable_update();
        {
            let mut s = self.rc.borrow_mut();
            s.damage_cursor();
            s.curs_x = x;
            s.curs_y = y;
            let (cx, cy) = (s.curs_x - s.curs_hx, s.curs_y - s.curs_hy);
            if let Some(cursor) = s.cursor.clone() {
                {
                    let mut px = cursor.borrow_mut();
                    px.x = cx;
                    px.y = cy;
                }
                s.damage_cursor();
            }
        }
        self.enable_update();
    }
}

/// Composite one pixmap's contribution to a single span: RGB16 sources
/// replace, everything else blends `OVER`.
fn span_pixmap(span: &mut [Argb32], px: &Pixmap, y: Coord, left: Coord, right: Coord) {
    if y < px.y || px.y + px.height <= y {
        return;
    }
    let p_left = left.max(px.x);
    let p_right = right.min(px.x + px.width);
    if p_left >= p_right {
        return;
    }

    let w = (p_right - p_left) as usize;
    let dst = &mut span[(p_left - left) as usize..][..w];
    let src_x = p_left - px.x;
    let src_y = y - px.y;

    match px.format {
        Format::Rgb16 => {
            for (d, &s) in dst.iter_mut().zip(px.rgb16_row(src_x, src_y, w)) {
                *d = pixel::rgb16_to_argb32(s);
            }
        }
        Format::Argb32 => {
            for (d, &s) in dst.iter_mut().zip(px.argb32_row(src_x, src_y, w)) {
                *d = pixel::over(*d, s);
            }
        }
        Format::A8 => {
            for (d, &s) in dst.iter_mut().zip(px.a8_row(src_x, src_y, w)) {
                *d = pixel::over(*d, pixel::a8_to_argb32(s));
            }
        }
    }
}

impl ScreenState {
    fn damage_cursor(&mut self) {
        if let Some(cursor) = &self.cursor {
            let (x, y, w, h) = {
                let px = cursor.borrow();
                (px.x, px.y, px.width, px.height)
            };
            self.merge_damage(x, y, x + w, y + h);
        }
    }

    fn merge_damage(&mut self, left: Coord, top: Coord, right: Coord, bottom: Coord) {
        let left = left.max(0);
        let top = top.max(0);
        let right = right.min(self.width);
        let bottom = bottom.min(self.height);

        if self.damage.left == self.damage.right {
            self.damage = Rect::new(left, top, right, bottom);
        } else {
            self.damage.left = self.damage.left.min(left);
            self.damage.top = self.damage.top.min(top);
            self.damage.right = self.damage.right.max(right);
            self.damage.bottom = self.damage.bottom.max(bottom);
        }
    }

    /// Damage entry point shared with pixmaps; invokes the damaged
    /// callback outside the state borrow.
    pub(crate) fn damage_external(
        rc: &Rc<RefCell<ScreenState>>,
        left: Coord,
        top: Coord,
        right: Coord,
        bottom: Coord,
    ) {
        let cb = {
            let mut s = rc.borrow_mut();
            s.merge_damage(left, top, right, bottom);
            if s.disable == 0 {
                s.damaged.clone()
            } else {
                None
            }
        };
        if let Some(cb) = cb {
            cb();
        }
    }

    pub(crate) fn enable_update_external(rc: &Rc<RefCell<ScreenState>>) {
        let cb = {
            let mut s = rc.borrow_mut();
            debug_assert!(s.disable > 0, "unbalanced enable_update");
            s.disable -= 1;
            if s.disable == 0 && !s.damage.is_empty() {
                s.damaged.clone()
            } else {
                None
            }
        };
        if let Some(cb) = cb {
            cb();
        }
    }

    pub(crate) fn disable_update_external(rc: &Rc<RefCell<ScreenState>>) {
        rc.borrow_mut().disable += 1;
    }

    /// Unlink a pixmap from the stack; damages its last extent first.
    pub(crate) fn remove_pixmap(rc: &Rc<RefCell<ScreenState>>, pixmap: &HPixmap) {
        let (x, y, w, h, disable) = {
            let px = pixmap.borrow();
            (px.x, px.y, px.width, px.height, px.disable)
        };
        {
            let mut s = rc.borrow_mut();
            let pos = match s.zorder.iter().position(|p| p == pixmap) {
                Some(pos) => pos,
                None => return,
            };
            s.merge_damage(x, y, x + w, y + h);
            s.zorder.remove(pos);
            if s.target.as_ref() == Some(pixmap) {
                s.target = None;
                s.clicklock = false;
            }
            if s.active.as_ref() == Some(pixmap) {
                s.active = None;
            }
        }
        pixmap.borrow_mut().screen = Weak::new();
        if disable > 0 {
            ScreenState::enable_update_external(rc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw;
    use crate::pixel::Operator;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc as StdRc;

    /// Sink recording every span into a full-screen shadow buffer.
    struct Capture {
        width: usize,
        data: StdRc<StdRefCell<Vec<Argb32>>>,
    }

    impl Sink for Capture {
        fn put_span(&mut self, left: Coord, y: Coord, right: Coord, span: &[Argb32]) {
            let mut data = self.data.borrow_mut();
            let off = y as usize * self.width + left as usize;
            data[off..off + (right - left) as usize].copy_from_slice(span);
        }
    }

    fn capture_screen(w: Coord, h: Coord) -> (Screen, StdRc<StdRefCell<Vec<Argb32>>>) {
        let data = StdRc::new(StdRefCell::new(vec![0u32; w as usize * h as usize]));
        let screen = Screen::new(
            w,
            h,
            Box::new(Capture {
                width: w as usize,
                data: data.clone(),
            }),
        );
        (screen, data)
    }

    fn solid_pixmap(w: Coord, h: Coord, color: Argb32) -> HPixmap {
        let px = HPixmap::new(Format::Argb32, w, h);
        draw::fill(
            &mut px.borrow_mut(),
            color,
            Operator::Source,
            0,
            0,
            w,
            h,
        );
        px
    }

    #[test]
    fn update_composites_z_order() {
        let (screen, data) = capture_screen(10, 10);

        let a = solid_pixmap(4, 4, 0xff00_00ff);
        a.borrow_mut().x = 1;
        a.borrow_mut().y = 1;
        screen.show_pixmap(&a, None);

        let b = solid_pixmap(4, 4, 0xffff_0000);
        b.borrow_mut().x = 3;
        b.borrow_mut().y = 3;
        screen.show_pixmap(&b, screen.top_pixmap().as_ref());

        assert!(screen.damaged());
        screen.update();
        assert!(!screen.damaged());

        let d = data.borrow();
        // overlap at (3,3) shows b (on top)
        assert_eq!(d[3 * 10 + 3], 0xffff_0000);
        assert_eq!(d[1 * 10 + 1], 0xff00_00ff);
        // outside both: white background
        assert_eq!(d[9 * 10 + 9], 0xffff_ffff);
    }

    #[test]
    fn damage_tracks_move_and_clamps() {
        let (screen, _) = capture_screen(10, 10);
        let a = solid_pixmap(4, 4, 0xff12_3456);
        screen.show_pixmap(&a, None);
        screen.update();

        a.move_to(8, 8);
        let s = screen.rc.borrow();
        // spec property 3: damage stays within the screen
        assert!(s.damage.left >= 0 && s.damage.top >= 0);
        assert!(s.damage.right <= 10 && s.damage.bottom <= 10);
        assert!(!s.damage.is_empty());
    }

    #[test]
    fn disable_update_defers() {
        let (screen, data) = capture_screen(4, 4);
        let a = solid_pixmap(4, 4, 0xffaa_bbcc);
        screen.show_pixmap(&a, None);

        screen.disable_update();
        screen.update();
        assert_eq!(data.borrow()[0], 0, "update ran while disabled");
        screen.enable_update();
        screen.update();
        assert_eq!(data.borrow()[0], 0xffaa_bbcc);
    }

    #[test]
    fn damaged_callback_fires_when_enabled() {
        let (screen, _) = capture_screen(4, 4);
        let count = StdRc::new(StdRefCell::new(0));
        {
            let count = count.clone();
            screen.register_damaged(move || *count.borrow_mut() += 1);
        }

        screen.damage(0, 0, 1, 1);
        assert_eq!(*count.borrow(), 1);

        screen.disable_update();
        screen.damage(1, 1, 2, 2);
        assert_eq!(*count.borrow(), 1);
        screen.enable_update();
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn background_tiles() {
        let (screen, data) = capture_screen(5, 3);
        let bg = solid_pixmap(2, 2, 0xff11_2233);
        screen.set_background(Some(bg));
        screen.update();
        let d = data.borrow();
        for y in 0..3usize {
            for x in 0..5usize {
                assert_eq!(d[y * 5 + x], 0xff11_2233, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn event_filter_consumes() {
        let (screen, _) = capture_screen(4, 4);
        screen.set_event_filter(|ev| matches!(ev, Event::KeyDown(_)));
        assert!(screen.dispatch(&Event::KeyDown(13)));
        assert!(!screen.dispatch(&Event::KeyUp(13)));
    }
}
