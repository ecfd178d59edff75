//! Screen-level event routing: hit testing, enter/leave synthesis, and
//! click-lock.
use std::cell::RefCell;
use std::rc::Rc;

use twin::draw;
use twin::event::{Event, Pointer};
use twin::pixel::{Argb32, Format, Operator};
use twin::pixmap::HPixmap;
use twin::prelude::*;
use twin::screen::Sink;
use twin::sched::Dispatcher;
use twin::window::{WindowListener, WindowStyle};

struct NullSink;

impl Sink for NullSink {
    fn put_span(&mut self, _l: Coord, _y: Coord, _r: Coord, _span: &[Argb32]) {}
}

fn screen() -> Screen {
    Screen::new(100, 100, Box::new(NullSink))
}

fn opaque_pixmap(w: Coord, h: Coord, color: Argb32) -> HPixmap {
    let px = HPixmap::new(Format::Argb32, w, h);
    draw::fill(&mut px.borrow_mut(), color, Operator::Source, 0, 0, w, h);
    px
}

/// Listener recording every event its window sees, in client coordinates.
struct Recorder {
    tag: &'static str,
    log: Rc<RefCell<Vec<(&'static str, String)>>>,
}

impl WindowListener for Recorder {
    fn event(&mut self, _w: &Window, ev: &Event) -> bool {
        let entry = match ev {
            Event::Enter(p) => format!("enter {},{}", p.x, p.y),
            Event::Leave(p) => format!("leave {},{}", p.x, p.y),
            Event::ButtonDown(p) => format!("down {},{}", p.x, p.y),
            Event::ButtonUp(p) => format!("up {},{}", p.x, p.y),
            Event::Motion(p) => format!("motion {},{}", p.x, p.y),
            other => format!("{:?}", other),
        };
        self.log.borrow_mut().push((self.tag, entry));
        true
    }
}

fn window_at(
    screen: &Screen,
    dispatcher: &Dispatcher,
    tag: &'static str,
    log: &Rc<RefCell<Vec<(&'static str, String)>>>,
    x: Coord,
    y: Coord,
    w: Coord,
    h: Coord,
) -> Window {
    let win = Window::new(
        screen,
        dispatcher,
        Format::Argb32,
        WindowStyle::Plain,
        x,
        y,
        w,
        h,
    );
    {
        // windows reserve a transparent shadow margin; make the client
        // area itself opaque so hit testing lands on it
        let px = win.pixmap();
        let mut px = px.borrow_mut();
        draw::fill(&mut px, 0xff80_8080, Operator::Source, 0, 0, w, h);
    }
    win.set_listener(Box::new(Recorder {
        tag,
        log: log.clone(),
    }));
    win.show();
    win
}

#[test]
fn click_routes_to_topmost_opaque_pixmap() {
    // spec scenario S4
    let screen = screen();
    let dispatcher = Dispatcher::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let _a = window_at(&screen, &dispatcher, "a", &log, 10, 10, 20, 20);
    let _b = window_at(&screen, &dispatcher, "b", &log, 20, 20, 20, 20);

    // (25, 25) hits both; b is above
    assert!(screen.dispatch(&Event::ButtonDown(Pointer::at(25, 25, 1))));

    {
        let log = log.borrow();
        let b_events: Vec<_> = log.iter().filter(|(t, _)| *t == "b").collect();
        assert_eq!(b_events[0].1, "enter 5,5");
        assert_eq!(b_events[1].1, "down 5,5");
        assert!(
            log.iter().all(|(t, _)| *t != "a"),
            "occluded window a saw events: {:?}",
            *log
        );
    }

    // click-lock: motion outside b still lands on b, in its coordinates
    log.borrow_mut().clear();
    screen.dispatch(&Event::Motion(Pointer::at(25, 35, 1)));
    {
        let log = log.borrow();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0], ("b", "motion 5,15".to_string()));
    }

    // release ends the lock; the next motion over a re-targets with
    // leave/enter
    log.borrow_mut().clear();
    screen.dispatch(&Event::ButtonUp(Pointer::at(25, 35, 0)));
    screen.dispatch(&Event::Motion(Pointer::at(15, 15, 0)));
    {
        let log = log.borrow();
        let tags: Vec<_> = log.iter().map(|(t, e)| (*t, e.as_str())).collect();
        assert!(tags.contains(&("b", "leave -5,-5")), "{:?}", tags);
        assert!(tags.contains(&("a", "enter 5,5")), "{:?}", tags);
        assert!(tags.contains(&("a", "motion 5,5")), "{:?}", tags);
    }
}

#[test]
fn transparent_pixels_fall_through() {
    let screen = screen();

    // bottom: opaque everywhere; top: fully transparent
    let bottom = opaque_pixmap(40, 40, 0xff00_00ff);
    screen.show_pixmap(&bottom, None);
    let top = HPixmap::new(Format::Argb32, 40, 40);
    screen.show_pixmap(&top, screen.top_pixmap().as_ref());

    // spec property 9: delivery goes to the topmost pixmap with nonzero
    // alpha at the point - here the bottom one
    screen.dispatch(&Event::ButtonDown(Pointer::at(5, 5, 1)));
    // neither pixmap has a window; routing just picks the target
    let hit_bottom = !bottom.borrow().transparent(5, 5);
    let hit_top = !top.borrow().transparent(5, 5);
    assert!(hit_bottom);
    assert!(!hit_top);
}

#[test]
fn key_events_go_to_active_pixmap() {
    let screen = screen();
    let dispatcher = Dispatcher::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let win = window_at(&screen, &dispatcher, "w", &log, 0, 0, 30, 30);
    screen.set_active(Some(win.pixmap()));
    log.borrow_mut().clear();

    screen.dispatch(&Event::KeyDown(42));
    screen.dispatch(&Event::Ucs4('x'));
    let log = log.borrow();
    assert_eq!(log[0], ("w", "KeyDown(42)".to_string()));
    assert_eq!(log[1], ("w", "Ucs4('x')".to_string()));
}

#[test]
fn activate_events_follow_focus_changes() {
    let screen = screen();
    let dispatcher = Dispatcher::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let a = window_at(&screen, &dispatcher, "a", &log, 0, 0, 30, 30);
    let b = window_at(&screen, &dispatcher, "b", &log, 40, 0, 30, 30);

    log.borrow_mut().clear();
    screen.set_active(Some(a.pixmap()));
    screen.set_active(Some(b.pixmap()));

    let log = log.borrow();
    let tags: Vec<_> = log.iter().map(|(t, e)| (*t, e.as_str())).collect();
    assert_eq!(
        tags,
        [
            ("a", "Activate"),
            ("a", "Deactivate"),
            ("b", "Activate"),
        ]
    );
}
