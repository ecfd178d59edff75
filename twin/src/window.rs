//! Decorated windows: a pixmap, a client rectangle inset for the frame,
//! and the simple window management the title bar implements (raise,
//! drag-move, iconify/restore, active highlight, drop shadow).
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxp::Fixed;
use log::trace;

use crate::blur;
use crate::draw;
use crate::event::Event;
use crate::font::{self, DEFAULT_FONT};
use crate::geom::{Coord, Rect};
use crate::icon::{self, Icon};
use crate::matrix::Matrix;
use crate::path::{FontStyle, Path};
use crate::pixel::{Argb32, Format, Operator};
use crate::pixmap::HPixmap;
use crate::sched::{Dispatcher, WORK_PAINT};
use crate::screen::Screen;
use crate::shadow;

const ACTIVE_BG: Argb32 = 0xd03b_80ae;
const INACTIVE_BG: Argb32 = 0xffb0_b0b0;
const FRAME_TEXT: Argb32 = 0xffff_ffff;
const ACTIVE_BORDER: Argb32 = 0xff60_6060;
const INACTIVE_BORDER: Argb32 = 0xff90_9090;
const SHADOW_COLOR: Argb32 = 0xff00_0000;

const BW: Coord = 0;
const TITLE_HEIGHT: Coord = 20;
const TITLE_BW: Coord = (TITLE_HEIGHT + 11) / 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStyle {
    /// Bare client pixmap, no decorations.
    Plain,
    /// Title bar, border, frame buttons.
    Application,
}

/// Per-style decoration insets around the client area.
pub fn style_size(style: WindowStyle) -> Rect {
    match style {
        WindowStyle::Plain => Rect::ZERO,
        WindowStyle::Application => Rect {
            left: BW,
            top: BW + TITLE_HEIGHT + BW,
            right: BW,
            bottom: BW,
        },
    }
}

pub trait WindowListener {
    /// Repaint the client area; the pixmap clip is set to the damaged
    /// part of the client rectangle.
    fn draw(&mut self, _window: &Window) {}

    /// An event routed into the client area, in client coordinates.
    /// Return `true` to consume it.
    fn event(&mut self, _window: &Window, _event: &Event) -> bool {
        false
    }

    /// The window is being destroyed.
    fn destroy(&mut self, _window: &Window) {}
}

pub struct WindowState {
    screen: Screen,
    dispatcher: Dispatcher,
    pixmap: HPixmap,
    style: WindowStyle,
    /// Client area within the pixmap.
    client: Rect,
    name: Option<String>,
    /// Pending client damage, in pixmap coordinates.
    damage: Rect,
    active: bool,
    iconify: bool,
    client_grab: bool,
    draw_queued: bool,
    shadow_x: Coord,
    shadow_y: Coord,
    listener: Option<Box<dyn WindowListener>>,
}

/// Shared handle to a window.
#[derive(Clone)]
pub struct Window {
    rc: Rc<RefCell<WindowState>>,
}

impl Window {
    /// Create a window whose client area is `width × height`; the pixmap
    /// adds the frame decorations and the drop-shadow margin.
    pub fn new(
        screen: &Screen,
        dispatcher: &Dispatcher,
        format: Format,
        style: WindowStyle,
        x: Coord,
        y: Coord,
        width: Coord,
        height: Coord,
    ) -> Window {
        let inset = style_size(style);
        let width = width + inset.left + inset.right;
        let height = height + inset.top + inset.bottom;
        let client = Rect::new(inset.left, inset.top, width - inset.right, height - inset.bottom);

        let (shadow_x, shadow_y) = shadow::margins();
        let pixmap = HPixmap::new(format, width + shadow_x, height + shadow_y);
        {
            let mut px = pixmap.borrow_mut();
            px.clip(client.left, client.top, client.right, client.bottom);
            px.origin_to_clip();
        }

        let window = Window {
            rc: Rc::new(RefCell::new(WindowState {
                screen: screen.clone(),
                dispatcher: dispatcher.clone(),
                pixmap: pixmap.clone(),
                style,
                client,
                name: None,
                damage: client,
                active: false,
                iconify: false,
                client_grab: false,
                draw_queued: false,
                shadow_x,
                shadow_y,
                listener: None,
            })),
        };
        pixmap.borrow_mut().window = Rc::downgrade(&window.rc);
        pixmap.move_to(x, y);
        window
    }

    pub fn set_listener(&self, listener: Box<dyn WindowListener>) {
        self.rc.borrow_mut().listener = Some(listener);
    }

    pub fn pixmap(&self) -> HPixmap {
        self.rc.borrow().pixmap.clone()
    }

    pub fn screen(&self) -> Screen {
        self.rc.borrow().screen.clone()
    }

    pub(crate) fn dispatcher(&self) -> Dispatcher {
        self.rc.borrow().dispatcher.clone()
    }

    pub fn style(&self) -> WindowStyle {
        self.rc.borrow().style
    }

    /// The client rectangle in pixmap coordinates.
    pub fn client_rect(&self) -> Rect {
        self.rc.borrow().client
    }

    /// Raise the window to the top of its screen.
    pub fn show(&self) {
        let (screen, pixmap) = {
            let s = self.rc.borrow();
            (s.screen.clone(), s.pixmap.clone())
        };
        match screen.top_pixmap() {
            Some(top) if top == pixmap => {}
            top => screen.show_pixmap(&pixmap, top.as_ref()),
        }
    }

    pub fn hide(&self) {
        let pixmap = self.rc.borrow().pixmap.clone();
        pixmap.hide();
    }

    /// Release the window: hide it, tell the listener, and unhook the
    /// pixmap.
    pub fn destroy(&self) {
        self.hide();
        let listener = self.rc.borrow_mut().listener.take();
        if let Some(mut listener) = listener {
            listener.destroy(self);
        }
        let pixmap = self.rc.borrow().pixmap.clone();
        pixmap.borrow_mut().window = Weak::new();
    }

    pub fn set_name(&self, name: &str) {
        self.rc.borrow_mut().name = Some(name.into());
        self.draw();
    }

    pub fn name(&self) -> Option<String> {
        self.rc.borrow().name.clone()
    }

    /// Accumulate client damage in pixmap coordinates, clipped to the
    /// client rectangle.
    pub fn damage(&self, left: Coord, top: Coord, right: Coord, bottom: Coord) {
        let mut s = self.rc.borrow_mut();
        let client = s.client;
        let add = Rect::new(
            left.max(client.left),
            top.max(client.top),
            right.min(client.right),
            bottom.min(client.bottom),
        );
        if !add.is_empty() {
            s.damage = s.damage.union(&add);
        }
    }

    /// Repaint the frame, then the damaged client area via the listener.
    pub fn draw(&self) {
        let style = self.rc.borrow().style;
        if style == WindowStyle::Application {
            self.draw_frame();
        }

        let (pixmap, screen, damage, client) = {
            let s = self.rc.borrow();
            (s.pixmap.clone(), s.screen.clone(), s.damage, s.client)
        };
        let listener = self.rc.borrow_mut().listener.take();
        let mut listener = match listener {
            Some(l) if !damage.is_empty() => l,
            other => {
                let mut s = self.rc.borrow_mut();
                if s.listener.is_none() {
                    s.listener = other;
                }
                return;
            }
        };

        // clip to the damaged area (absolute), then restore the client
        // origin the listener paints in
        {
            let mut px = pixmap.borrow_mut();
            px.reset_clip();
            px.set_origin(0, 0);
            px.clip(damage.left, damage.top, damage.right, damage.bottom);
            px.set_origin(client.left, client.top);
        }
        screen.disable_update();
        listener.draw(self);
        pixmap
            .borrow_mut()
            .damage(damage.left, damage.top, damage.right, damage.bottom);
        screen.enable_update();

        {
            let mut s = self.rc.borrow_mut();
            s.damage = Rect::ZERO;
            if s.listener.is_none() {
                s.listener = Some(listener);
            }
        }
        let mut px = pixmap.borrow_mut();
        px.reset_clip();
        px.set_origin(0, 0);
        px.clip(client.left, client.top, client.right, client.bottom);
        px.origin_to_clip();
    }

    /// Queue a repaint on the work queue, collapsing repeated requests.
    pub fn queue_paint(&self) {
        let mut s = self.rc.borrow_mut();
        if s.draw_queued {
            return;
        }
        s.draw_queued = true;
        let dispatcher = s.dispatcher.clone();
        drop(s);

        let this = self.clone();
        dispatcher.set_work(WORK_PAINT, move || {
            this.rc.borrow_mut().draw_queued = false;
            this.draw();
            false
        });
    }

    /// Change style, position, and size in one step. Resizing allocates a
    /// fresh pixmap and transplants the Z position and update-disable
    /// depth.
    pub fn configure(
        &self,
        style: WindowStyle,
        x: Coord,
        y: Coord,
        width: Coord,
        height: Coord,
    ) {
        let pixmap = self.rc.borrow().pixmap.clone();
        pixmap.disable_update();

        let mut need_repaint = false;
        if style != self.rc.borrow().style {
            self.rc.borrow_mut().style = style;
            need_repaint = true;
        }

        let (old_w, old_h, old_fmt, old_disable) = {
            let px = pixmap.borrow();
            (px.width(), px.height(), px.format(), px.disable)
        };
        if width != old_w || height != old_h {
            let (screen, client) = {
                let s = self.rc.borrow();
                (s.screen.clone(), s.client)
            };
            let new_pixmap = HPixmap::new(old_fmt, width, height);
            new_pixmap.borrow_mut().window = Rc::downgrade(&self.rc);
            new_pixmap.move_to(x, y);
            let shown = { pixmap.borrow().screen.upgrade().is_some() };
            if shown {
                screen.show_pixmap(&new_pixmap, Some(&pixmap));
            }
            for _ in 0..old_disable {
                new_pixmap.disable_update();
            }
            pixmap.hide();
            {
                let mut px = new_pixmap.borrow_mut();
                px.reset_clip();
                px.clip(client.left, client.top, client.right, client.bottom);
                px.origin_to_clip();
            }
            self.rc.borrow_mut().pixmap = new_pixmap.clone();

            let (px_x, px_y) = new_pixmap.borrow().position();
            if px_x != x || px_y != y {
                new_pixmap.move_to(x, y);
            }
            if need_repaint {
                self.draw();
            }
            new_pixmap.enable_update();
            return;
        }

        let (px_x, px_y) = pixmap.borrow().position();
        if px_x != x || px_y != y {
            pixmap.move_to(x, y);
        }
        if need_repaint {
            self.draw();
        }
        pixmap.enable_update();
    }

    /// Whether a screen coordinate lands on the window (excluding the
    /// shadow margin; title bars only count where they are opaque, and
    /// an iconified window's client area doesn't count at all).
    pub fn valid_range(&self, x: Coord, y: Coord) -> bool {
        let s = self.rc.borrow();
        let px = s.pixmap.borrow();
        let (px_x, px_y) = (px.x, px.y);
        let in_body = px_x <= x
            && x < px_x + px.width() - s.shadow_x
            && px_y <= y
            && y < px_y + px.height() - s.shadow_y;
        match s.style {
            WindowStyle::Plain => in_body,
            WindowStyle::Application => {
                if !in_body {
                    return false;
                }
                if y < px_y + s.client.top {
                    return !px.transparent(x, y);
                }
                !s.iconify
            }
        }
    }

    // ------------------------------------------------------------------
    // frame

    /// Title-bar layout at the current name and client width, in pixmap
    /// coordinates: `(text_x, title_right, iconify_x, restore_x,
    /// close_x)`.
    fn frame_layout(&self) -> (Fixed, Fixed, Fixed, Fixed, Fixed) {
        let s = self.rc.borrow();
        let bw = Fixed::from_int(TITLE_BW as i32);
        let t_h = Fixed::from_int(s.client.top as i32) - bw;
        let t_arc_2 = t_h * 2 / 3;
        let mut c_right = Fixed::from_int(s.client.right as i32) - bw / 2;

        let name_height = t_h - bw - bw / 2;
        let icon_size = name_height * 8 / 10;
        let menu_x = t_arc_2;
        let text_x = menu_x + icon_size + bw;

        let text_width = {
            let mut path = Path::new();
            path.set_font_size(name_height);
            path.set_font_style(FontStyle::OBLIQUE | FontStyle::UNHINTED);
            match &s.name {
                Some(name) => font::width_utf8(&mut path, &DEFAULT_FONT, name.as_bytes()),
                None => Fixed(0),
            }
        };

        let title_right = text_x + text_width + bw + icon_size + bw + icon_size + bw + icon_size
            + t_arc_2;
        if title_right < c_right {
            c_right = title_right;
        }

        let close_x = c_right - t_arc_2 - icon_size;
        let restore_x = close_x - bw - icon_size;
        let iconify_x = restore_x - bw - icon_size;
        (text_x, c_right, iconify_x, restore_x, close_x)
    }

    /// Paint the title band, border, name, and frame icons.
    fn draw_frame(&self) {
        let (pixmap, client, active, name) = {
            let s = self.rc.borrow();
            (s.pixmap.clone(), s.client, s.active, s.name.clone())
        };
        let (text_x, c_right, iconify_x, restore_x, close_x) = self.frame_layout();

        let bw = Fixed::from_int(TITLE_BW as i32);
        let bw_2 = bw / 2;
        let w_top = bw_2;
        let c_left = bw_2;
        let t_h = Fixed::from_int(client.top as i32) - bw;
        let t_arc_1 = t_h / 3;
        let t_arc_2 = t_h * 2 / 3;
        let c_top = Fixed::from_int(client.top as i32) - bw_2;

        let name_height = t_h - bw - bw_2;
        let icon_size = name_height * 8 / 10;
        let icon_y = (Fixed::from_int(client.top as i32) - icon_size) / 2;
        let menu_x = t_arc_2;
        let text_y = icon_y + icon_size;

        let mut px = pixmap.borrow_mut();
        px.reset_clip();
        px.origin_to_clip();

        let pw = px.width();
        draw::fill(&mut px, 0x0000_0000, Operator::Source, 0, 0, pw, client.top);

        // title band outline
        let mut path = Path::new();
        path.move_to(c_left, c_top);
        path.draw(c_right, c_top);
        path.curve(
            c_right,
            w_top + t_arc_1,
            c_right - t_arc_1,
            w_top,
            c_right - t_h,
            w_top,
        );
        path.draw(c_left + t_h, w_top);
        path.curve(c_left + t_arc_1, w_top, c_left, w_top + t_arc_1, c_left, c_top);
        path.close();

        if active {
            draw::paint_path(&mut px, ACTIVE_BG, &path);
            draw::paint_stroke(&mut px, ACTIVE_BORDER, &path, bw_2 * 2);
        } else {
            draw::paint_path(&mut px, INACTIVE_BG, &path);
            draw::paint_stroke(&mut px, INACTIVE_BORDER, &path, bw_2 * 2);
        }

        // name, clipped between the menu icon and the frame buttons
        if let Some(name) = &name {
            px.clip(
                menu_x.floor().to_int() as Coord,
                0,
                (c_right - t_arc_2).ceil().to_int() as Coord,
                client.top,
            );
            px.origin_to_clip();

            let mut text = Path::new();
            text.set_font_size(name_height);
            text.set_font_style(FontStyle::OBLIQUE | FontStyle::UNHINTED);
            text.move_to(text_x - menu_x.floor(), text_y);
            text.utf8(&DEFAULT_FONT, name.as_bytes());
            draw::paint_path(&mut px, FRAME_TEXT, &text);

            px.reset_clip();
            px.origin_to_clip();
        }

        // frame icons
        let icon_at = |x: Fixed, y: Fixed, size: Fixed| {
            let mut m = Matrix::identity();
            m.translate(x, y);
            m.scale(size, size);
            m
        };
        icon::icon_draw(&mut px, Icon::Menu, icon_at(menu_x, icon_y, icon_size));
        icon::icon_draw(&mut px, Icon::Iconify, icon_at(iconify_x, icon_y, icon_size));
        icon::icon_draw(&mut px, Icon::Restore, icon_at(restore_x, icon_y, icon_size));
        icon::icon_draw(&mut px, Icon::Close, icon_at(close_x, icon_y, icon_size));
        icon::icon_draw(
            &mut px,
            Icon::Resize,
            icon_at(
                Fixed::from_int(client.right as i32),
                Fixed::from_int(client.bottom as i32),
                Fixed::from_int(TITLE_HEIGHT as i32),
            ),
        );

        px.clip(client.left, client.top, client.right, client.bottom);
        px.origin_to_clip();
    }

    // ------------------------------------------------------------------
    // activation and shadow

    /// Make this window the active one: recolor frames, drop the shadow
    /// under it, and deactivate whatever was on top.
    fn activate(&self) {
        let (pixmap, screen, iconify) = {
            let s = self.rc.borrow();
            (s.pixmap.clone(), s.screen.clone(), s.iconify)
        };

        let prev_top = screen.top_pixmap();

        self.rc.borrow_mut().active = !iconify;
        if self.style() == WindowStyle::Application {
            self.draw_frame();
        }

        if let Some(prev) = &prev_top {
            if *prev != pixmap {
                let prev_window = prev.borrow().window.upgrade().map(|rc| Window { rc });
                if let Some(prev_window) = prev_window {
                    prev_window.rc.borrow_mut().active = false;
                    if prev_window.style() == WindowStyle::Application {
                        prev_window.draw_frame();
                    }
                }
            }
        }

        self.drop_shadow(prev_top);
    }

    /// Erase the previous top window's shadow and paint a fresh one under
    /// this window's right and bottom margins.
    fn drop_shadow(&self, prev_top: Option<HPixmap>) {
        let (pixmap, shadow_x, shadow_y, style) = {
            let s = self.rc.borrow();
            (s.pixmap.clone(), s.shadow_x, s.shadow_y, s.style)
        };

        if let Some(prev) = &prev_top {
            if *prev != pixmap {
                let margins = prev
                    .borrow()
                    .window
                    .upgrade()
                    .map(|rc| {
                        let s = rc.borrow();
                        (s.shadow_x, s.shadow_y)
                    })
                    .unwrap_or((0, 0));
                if margins != (0, 0) {
                    let mut px = prev.borrow_mut();
                    let (pw, ph) = (px.width(), px.height());
                    for y in 0..ph {
                        if y < ph - margins.1 {
                            draw::cover(&mut px, 0, pw - margins.0, y, margins.0);
                        } else {
                            draw::cover(&mut px, 0, 0, y, pw);
                        }
                    }
                    px.damage(0, 0, pw, ph);
                }
            }
        }

        let y_start = match style {
            WindowStyle::Application => TITLE_HEIGHT + shadow::BLUR_RADIUS / 2 + 1,
            WindowStyle::Plain => shadow::BLUR_RADIUS / 2 + 1,
        };

        let mut px = pixmap.borrow_mut();
        let ori_wid = px.width() - shadow_x;
        let ori_hei = px.height() - shadow_y;
        shadow::shadow_border(&mut px, SHADOW_COLOR, shadow_x, shadow_y, y_start);
        // soften the right strip, then the bottom strip
        blur::stack_blur(
            &mut px,
            shadow::BLUR_RADIUS,
            ori_wid,
            ori_wid + shadow_x,
            0,
            ori_hei + shadow_y,
        );
        blur::stack_blur(
            &mut px,
            shadow::BLUR_RADIUS,
            0,
            ori_wid + shadow_x,
            ori_hei,
            ori_hei + shadow_y,
        );
        let (pw, ph) = (px.width(), px.height());
        px.damage(0, 0, pw, ph);
    }
}

/// Window-level event dispatch, entered from the pixmap. Handles the
/// frame behaviors and forwards client-area events to the listener.
pub(crate) fn dispatch_rc(rc: &Rc<RefCell<WindowState>>, event: &Event) -> bool {
    let window = Window { rc: rc.clone() };

    let (client, pixmap, style) = {
        let s = rc.borrow();
        (s.client, s.pixmap.clone(), s.style)
    };
    let (px_x, px_y, px_w, px_h) = {
        let px = pixmap.borrow();
        (px.x, px.y, px.width(), px.height())
    };

    // translated event to hand to the client, if any
    let mut delegate: Option<Event> = None;

    match event {
        Event::ButtonDown(p) => {
            if style == WindowStyle::Application {
                let local_y = p.screen_y - px_y;
                if local_y >= 0 && local_y <= BW + TITLE_HEIGHT + BW {
                    let (_, _, iconify_x, restore_x, close_x) = window.frame_layout();
                    let local_x = (p.screen_x - px_x) as i32;
                    if local_x > iconify_x.to_int() && local_x < restore_x.to_int() {
                        trace!("iconify window");
                        rc.borrow_mut().iconify = true;
                        pixmap.borrow_mut().damage(0, 0, px_w, px_h);
                    } else if local_x > restore_x.to_int() && local_x < close_x.to_int() {
                        rc.borrow_mut().iconify = false;
                        pixmap.borrow_mut().damage(0, 0, px_w, px_h);
                    }
                }
            }
            window.activate();
            if client.contains(p.x, p.y) {
                rc.borrow_mut().client_grab = true;
                delegate = Some(event.with_pointer(p.translated(client.left, client.top)));
            }
        }
        Event::Activate => {
            window.activate();
            delegate = Some(*event);
        }
        Event::ButtonUp(p) => {
            let mut s = rc.borrow_mut();
            if s.client_grab {
                s.client_grab = false;
                delegate = Some(event.with_pointer(p.translated(client.left, client.top)));
            }
        }
        Event::Motion(p) => {
            let grabbed = rc.borrow().client_grab;
            if grabbed || client.contains(p.x, p.y) {
                delegate = Some(event.with_pointer(p.translated(client.left, client.top)));
            }
        }
        other => delegate = Some(*other),
    }

    if let Some(ev) = delegate {
        let listener = rc.borrow_mut().listener.take();
        if let Some(mut listener) = listener {
            let consumed = listener.event(&window, &ev);
            {
                let mut s = rc.borrow_mut();
                if s.listener.is_none() {
                    s.listener = Some(listener);
                }
            }
            if consumed {
                return true;
            }
        }
    }

    // simple window management on the unadjusted event
    match event {
        Event::ButtonDown(p) => {
            window.show();
            let screen = rc.borrow().screen.clone();
            let src = screen.rc();
            let mut s = src.borrow_mut();
            s.button_x = p.x;
            s.button_y = p.y;
            true
        }
        Event::ButtonUp(_) => {
            let screen = rc.borrow().screen.clone();
            let src = screen.rc();
            let mut s = src.borrow_mut();
            s.button_x = -1;
            s.button_y = -1;
            true
        }
        Event::Motion(p) => {
            let screen = rc.borrow().screen.clone();
            let (bx, by) = {
                let s = screen.rc().borrow();
                (s.button_x, s.button_y)
            };
            if bx >= 0 {
                let x = p.screen_x - bx;
                let y = p.screen_y - by;
                let style = rc.borrow().style;
                window.configure(style, x, y, px_w, px_h);
            }
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Sink;

    struct NullSink;
    impl Sink for NullSink {
        fn put_span(&mut self, _: Coord, _: Coord, _: Coord, _: &[Argb32]) {}
    }

    fn fixture() -> (Screen, Dispatcher) {
        (
            Screen::new(320, 240, Box::new(NullSink)),
            Dispatcher::new(),
        )
    }

    #[test]
    fn client_rect_insets_application_frame() {
        let (screen, dispatcher) = fixture();
        let w = Window::new(
            &screen,
            &dispatcher,
            Format::Argb32,
            WindowStyle::Application,
            10,
            10,
            100,
            80,
        );
        let client = w.client_rect();
        assert_eq!(client.top, TITLE_HEIGHT);
        assert_eq!(client.width(), 100);
        assert_eq!(client.height(), 80);

        let (sx, sy) = shadow::margins();
        let px = w.pixmap();
        assert_eq!(px.borrow().width(), 100 + sx);
        assert_eq!(px.borrow().height(), 80 + TITLE_HEIGHT + sy);
    }

    #[test]
    fn plain_window_has_no_insets() {
        let (screen, dispatcher) = fixture();
        let w = Window::new(
            &screen,
            &dispatcher,
            Format::Argb32,
            WindowStyle::Plain,
            0,
            0,
            50,
            40,
        );
        assert_eq!(w.client_rect(), Rect::new(0, 0, 50, 40));
    }

    #[test]
    fn show_raises_to_top() {
        let (screen, dispatcher) = fixture();
        let a = Window::new(&screen, &dispatcher, Format::Argb32, WindowStyle::Plain, 0, 0, 10, 10);
        let b = Window::new(&screen, &dispatcher, Format::Argb32, WindowStyle::Plain, 0, 0, 10, 10);
        a.show();
        b.show();
        assert_eq!(screen.top_pixmap().unwrap(), b.pixmap());
        a.show();
        assert_eq!(screen.top_pixmap().unwrap(), a.pixmap());
    }

    #[test]
    fn frame_paints_title_band() {
        let (screen, dispatcher) = fixture();
        let w = Window::new(
            &screen,
            &dispatcher,
            Format::Argb32,
            WindowStyle::Application,
            0,
            0,
            120,
            60,
        );
        w.set_name("test");
        let px = w.pixmap();
        let px = px.borrow();
        // some pixel of the title band carries the inactive background
        let mut hits = 0;
        for y in 0..TITLE_HEIGHT {
            for &p in px.argb32_row(0, y, 60) {
                if p == INACTIVE_BG {
                    hits += 1;
                }
            }
        }
        assert!(hits > 50, "title band barely painted: {}", hits);
    }

    #[test]
    fn click_raises_and_drag_moves() {
        let (screen, dispatcher) = fixture();
        let w = Window::new(
            &screen,
            &dispatcher,
            Format::Argb32,
            WindowStyle::Application,
            10,
            10,
            100,
            80,
        );
        w.show();

        use crate::event::Pointer;
        // press on the title bar (screen 60, 15); local coords land above
        // the client area so the window manager keeps the event
        let p = Pointer {
            screen_x: 60,
            screen_y: 15,
            x: 50,
            y: 5,
            button: 1,
        };
        assert!(dispatch_rc(&w.rc, &Event::ButtonDown(p)));
        assert!(w.rc.borrow().active);

        // drag to the right by 30
        let p2 = Pointer {
            screen_x: 90,
            screen_y: 15,
            x: 80,
            y: 5,
            button: 1,
        };
        assert!(dispatch_rc(&w.rc, &Event::Motion(p2)));
        let (x, _) = w.pixmap().borrow().position();
        assert_eq!(x, 90 - 50);

        let up = Pointer {
            screen_x: 90,
            screen_y: 15,
            x: 80,
            y: 5,
            button: 0,
        };
        assert!(dispatch_rc(&w.rc, &Event::ButtonUp(up)));
        assert_eq!(screen.rc().borrow().button_x, -1);
    }

    #[test]
    fn client_events_reach_listener_translated() {
        use crate::event::Pointer;
        use std::cell::Cell;
        use std::rc::Rc as StdRc;

        struct Recorder {
            last: StdRc<Cell<(Coord, Coord)>>,
        }
        impl WindowListener for Recorder {
            fn event(&mut self, _w: &Window, ev: &Event) -> bool {
                if let Event::ButtonDown(p) = ev {
                    self.last.set((p.x, p.y));
                    return true;
                }
                false
            }
        }

        let (screen, dispatcher) = fixture();
        let w = Window::new(
            &screen,
            &dispatcher,
            Format::Argb32,
            WindowStyle::Application,
            0,
            0,
            100,
            80,
        );
        let last = StdRc::new(Cell::new((-1, -1)));
        w.set_listener(Box::new(Recorder { last: last.clone() }));
        w.show();

        // pixmap-local (30, 50) is client-local (30, 30)
        let p = Pointer {
            screen_x: 30,
            screen_y: 50,
            x: 30,
            y: 50,
            button: 1,
        };
        assert!(dispatch_rc(&w.rc, &Event::ButtonDown(p)));
        assert_eq!(last.get(), (30, 50 - TITLE_HEIGHT));
    }
}
