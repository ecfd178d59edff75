//! The toplevel: a vertical box hosted by a window, bridging window
//! callbacks into widget dispatch and the work queue.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxp::Fixed;
use genpool::Ptr;

use super::boxes::{BoxDir, BoxWidget};
use super::button::{ButtonSignal, ButtonWidget};
use super::label::{self, LabelWidget};
use super::{
    dispatch, queue_layout, queue_paint, Kind, LayoutHint, Shape, Tree, TreeRc, Widget,
    WidgetHandler, WidgetId,
};
use crate::event::Event;
use crate::geom::{Coord, Rect};
use crate::path::FontStyle;
use crate::pixel::{Argb32, Format};
use crate::sched::{Dispatcher, WORK_LAYOUT, WORK_PAINT};
use crate::screen::Screen;
use crate::window::{Window, WindowListener, WindowStyle};

/// A window whose client area is managed by a widget tree rooted in a
/// vertical box.
pub struct Toplevel {
    tree: TreeRc,
}

struct TreeListener {
    tree: Weak<RefCell<Tree>>,
}

impl WindowListener for TreeListener {
    fn draw(&mut self, window: &Window) {
        if let Some(tree) = self.tree.upgrade() {
            let screen = window.screen();
            screen.disable_update();
            let root = tree.borrow().root;
            dispatch(&tree, root, &Event::Paint);
            screen.enable_update();
        }
    }

    fn event(&mut self, _window: &Window, event: &Event) -> bool {
        if let Some(tree) = self.tree.upgrade() {
            let root = tree.borrow().root;
            dispatch(&tree, root, event) == super::DispatchResult::Done
        } else {
            false
        }
    }

    fn destroy(&mut self, _window: &Window) {
        if let Some(tree) = self.tree.upgrade() {
            let root = tree.borrow().root;
            dispatch(&tree, root, &Event::Destroy);
        }
    }
}

impl Toplevel {
    pub fn new(
        screen: &Screen,
        dispatcher: &Dispatcher,
        format: Format,
        style: WindowStyle,
        x: Coord,
        y: Coord,
        width: Coord,
        height: Coord,
        name: &str,
    ) -> Toplevel {
        let window = Window::new(screen, dispatcher, format, style, x, y, width, height);
        window.set_name(name);

        let mut widgets = genpool::Pool::new();
        let root = widgets.allocate(Widget::new(
            None,
            LayoutHint::default(),
            Kind::Box(BoxWidget::new(BoxDir::Vert)),
        ));

        let tree = Rc::new(RefCell::new(Tree {
            window: window.clone(),
            widgets,
            root,
        }));
        window.set_listener(Box::new(TreeListener {
            tree: Rc::downgrade(&tree),
        }));

        Toplevel { tree }
    }

    pub fn window(&self) -> Window {
        self.tree.borrow().window.clone()
    }

    pub fn root(&self) -> WidgetId {
        WidgetId(self.tree.borrow().root)
    }

    /// Lay out, paint, and raise the window.
    pub fn show(&self) {
        layout_now(&self.tree);
        paint_now(&self.tree);
        self.window().show();
    }

    // ------------------------------------------------------------------
    // tree construction

    fn attach(&self, parent: WidgetId, widget: Widget) -> WidgetId {
        let mut tree = self.tree.borrow_mut();
        let id = tree.widgets.allocate(widget);
        if let Some(p) = tree.widgets.get_mut(parent.0) {
            if let Kind::Box(b) = &mut p.kind {
                b.children.push(id);
            }
        }
        drop(tree);
        queue_layout(&self.tree, id);
        WidgetId(id)
    }

    pub fn create_box(&self, parent: WidgetId, dir: BoxDir) -> WidgetId {
        self.attach(
            parent,
            Widget::new(
                Some(parent.0),
                LayoutHint::default(),
                Kind::Box(BoxWidget::new(dir)),
            ),
        )
    }

    /// A plain colored widget with a fixed preferred size.
    pub fn create_widget(
        &self,
        parent: WidgetId,
        background: Argb32,
        preferred: LayoutHint,
    ) -> WidgetId {
        let mut w = Widget::new(Some(parent.0), preferred, Kind::Plain);
        w.background = background;
        self.attach(parent, w)
    }

    /// A widget driven by an application-supplied handler.
    pub fn create_custom(
        &self,
        parent: WidgetId,
        preferred: LayoutHint,
        handler: Box<dyn WidgetHandler>,
    ) -> WidgetId {
        self.attach(
            parent,
            Widget::new(Some(parent.0), preferred, Kind::Custom(handler)),
        )
    }

    pub fn create_label(
        &self,
        parent: WidgetId,
        text: &str,
        foreground: Argb32,
        font_size: Fixed,
        font_style: FontStyle,
    ) -> WidgetId {
        let hint = LayoutHint {
            width: 0,
            height: 0,
            stretch_width: 1,
            stretch_height: 1,
        };
        self.attach(
            parent,
            Widget::new(
                Some(parent.0),
                hint,
                Kind::Label(LabelWidget::new(text, foreground, font_size, font_style)),
            ),
        )
    }

    pub fn create_button(
        &self,
        parent: WidgetId,
        text: &str,
        foreground: Argb32,
        font_size: Fixed,
        font_style: FontStyle,
    ) -> WidgetId {
        let hint = LayoutHint {
            width: 0,
            height: 0,
            stretch_width: 1,
            stretch_height: 1,
        };
        let mut w = Widget::new(
            Some(parent.0),
            hint,
            Kind::Button(ButtonWidget::new(LabelWidget::new(
                text,
                foreground,
                font_size,
                font_style,
            ))),
        );
        w.want_focus = true;
        self.attach(parent, w)
    }

    // ------------------------------------------------------------------
    // widget mutation

    pub fn set_background(&self, id: WidgetId, background: Argb32) {
        {
            let mut tree = self.tree.borrow_mut();
            if let Some(w) = tree.widgets.get_mut(id.0) {
                w.background = background;
            }
        }
        queue_paint(&self.tree, id.0);
    }

    pub fn set_shape(&self, id: WidgetId, shape: Shape, radius: Fixed) {
        {
            let mut tree = self.tree.borrow_mut();
            if let Some(w) = tree.widgets.get_mut(id.0) {
                w.shape = shape;
                w.radius = radius;
            }
        }
        queue_paint(&self.tree, id.0);
    }

    /// Make `id` report the preferred geometry of `source`.
    pub fn set_copy_geometry(&self, id: WidgetId, source: WidgetId) {
        let mut tree = self.tree.borrow_mut();
        if let Some(w) = tree.widgets.get_mut(id.0) {
            w.copy_geom = Some(source.0);
        }
    }

    pub fn label_set(
        &self,
        id: WidgetId,
        text: &str,
        foreground: Argb32,
        font_size: Fixed,
        font_style: FontStyle,
    ) {
        label::label_set(
            &self.tree,
            id.0,
            Some(text),
            foreground,
            font_size,
            font_style,
        );
    }

    /// Install the button's signal callback.
    pub fn button_on_signal(&self, id: WidgetId, callback: impl FnMut(ButtonSignal) + 'static) {
        let mut tree = self.tree.borrow_mut();
        if let Some(w) = tree.widgets.get_mut(id.0) {
            if let Kind::Button(b) = &mut w.kind {
                b.signal = Some(Box::new(callback));
            }
        }
    }

    pub(crate) fn tree(&self) -> &TreeRc {
        &self.tree
    }
}

// ----------------------------------------------------------------------
// layout / paint plumbing

/// Query preferred sizes and configure the root to fill the client area.
pub(crate) fn layout_now(tree_rc: &TreeRc) {
    let root = tree_rc.borrow().root;
    dispatch(tree_rc, root, &Event::QueryGeometry);

    let client = {
        let tree = tree_rc.borrow();
        tree.window.client_rect()
    };
    let extents = Rect::new(0, 0, client.width(), client.height());
    dispatch(tree_rc, root, &Event::Configure(extents));
}

pub(crate) fn paint_now(tree_rc: &TreeRc) {
    let (screen, root) = {
        let tree = tree_rc.borrow();
        (tree.window.screen(), tree.root)
    };
    screen.disable_update();
    dispatch(tree_rc, root, &Event::Paint);
    screen.enable_update();
}

/// Queue the root paint work unless it is already pending.
pub(crate) fn queue_toplevel_paint(tree_rc: &TreeRc) {
    let (dispatcher, already) = {
        let mut tree = tree_rc.borrow_mut();
        let dispatcher = tree.window.dispatcher();
        let root = tree.root;
        let w = match tree.widgets.get_mut(root) {
            Some(w) => w,
            None => return,
        };
        let already = w.paint;
        w.paint = true;
        (dispatcher, already)
    };
    if already {
        return;
    }

    let weak = Rc::downgrade(tree_rc);
    dispatcher.set_work(WORK_PAINT, move || {
        if let Some(tree) = weak.upgrade() {
            paint_now(&tree);
        }
        false
    });
}

pub(crate) fn queue_toplevel_layout(tree_rc: &TreeRc) {
    let (dispatcher, already) = {
        let mut tree = tree_rc.borrow_mut();
        let dispatcher = tree.window.dispatcher();
        let root = tree.root;
        let w = match tree.widgets.get_mut(root) {
            Some(w) => w,
            None => return,
        };
        let already = w.layout;
        w.layout = true;
        (dispatcher, already)
    };
    if already {
        return;
    }

    let weak = Rc::downgrade(tree_rc);
    dispatcher.set_work(WORK_LAYOUT, move || {
        if let Some(tree) = weak.upgrade() {
            layout_now(&tree);
        }
        false
    });
    queue_toplevel_paint(tree_rc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Pointer;
    use crate::pixel::Argb32 as Px;
    use crate::screen::Sink;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc as StdRc;

    struct NullSink;
    impl Sink for NullSink {
        fn put_span(&mut self, _: Coord, _: Coord, _: Coord, _: &[Px]) {}
    }

    fn fixture() -> (Screen, Dispatcher) {
        (Screen::new(400, 300, Box::new(NullSink)), Dispatcher::new())
    }

    fn plain_toplevel(screen: &Screen, dispatcher: &Dispatcher) -> Toplevel {
        Toplevel::new(
            screen,
            dispatcher,
            Format::Argb32,
            WindowStyle::Plain,
            0,
            0,
            200,
            100,
            "test",
        )
    }

    #[test]
    fn vertical_box_stacks_children() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let a = top.create_widget(
            top.root(),
            0xffff_0000,
            LayoutHint {
                width: 50,
                height: 30,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        let b = top.create_widget(
            top.root(),
            0xff00_ff00,
            LayoutHint {
                width: 50,
                height: 30,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        top.show();

        let tree = top.tree().borrow();
        let ea = tree.widgets[a.0].extents;
        let eb = tree.widgets[b.0].extents;
        // both widgets span the client width; the surplus height is
        // split between them, the second absorbing the rounding
        assert_eq!(ea.width(), 200);
        assert_eq!(eb.width(), 200);
        assert_eq!(ea.top, 0);
        assert_eq!(eb.top, ea.bottom);
        assert_eq!(eb.bottom, 100);
    }

    #[test]
    fn stretch_weights_divide_surplus() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let a = top.create_widget(
            top.root(),
            0,
            LayoutHint {
                width: 10,
                height: 10,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        let b = top.create_widget(
            top.root(),
            0,
            LayoutHint {
                width: 10,
                height: 10,
                stretch_width: 1,
                stretch_height: 3,
            },
        );
        top.show();

        let tree = top.tree().borrow();
        let ha = tree.widgets[a.0].extents.height();
        let hb = tree.widgets[b.0].extents.height();
        // surplus = 100 - 20 = 80 split 1:3
        assert_eq!(ha, 10 + 20);
        assert_eq!(hb, 10 + 60);
    }

    #[test]
    fn deficit_shrinks_children() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let a = top.create_widget(
            top.root(),
            0,
            LayoutHint {
                width: 10,
                height: 80,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        let b = top.create_widget(
            top.root(),
            0,
            LayoutHint {
                width: 10,
                height: 80,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        top.show();

        let tree = top.tree().borrow();
        let ha = tree.widgets[a.0].extents.height();
        let hb = tree.widgets[b.0].extents.height();
        assert_eq!(ha + hb, 100);
    }

    #[test]
    fn paint_fills_widget_background() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        top.create_widget(
            top.root(),
            0xff12_3456,
            LayoutHint {
                width: 10,
                height: 10,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        top.show();

        let px = top.window().pixmap();
        let px = px.borrow();
        assert_eq!(px.argb32_row(5, 5, 1)[0], 0xff12_3456);
    }

    #[test]
    fn button_signals_on_click_and_release() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let button = top.create_button(
            top.root(),
            "OK",
            0xff00_0000,
            Fixed::from_int(12),
            FontStyle::ROMAN,
        );
        top.show();

        let signals = StdRc::new(StdRefCell::new(Vec::new()));
        {
            let signals = signals.clone();
            top.button_on_signal(button, move |s| signals.borrow_mut().push(s));
        }

        let window = top.window();
        // the button fills the whole client area
        let down = Pointer {
            screen_x: 50,
            screen_y: 50,
            x: 50,
            y: 50,
            button: 1,
        };
        window.pixmap().dispatch(&Event::ButtonDown(down));
        let up = Pointer {
            screen_x: 50,
            screen_y: 50,
            x: 50,
            y: 50,
            button: 0,
        };
        window.pixmap().dispatch(&Event::ButtonUp(up));

        assert_eq!(*signals.borrow(), [ButtonSignal::Down, ButtonSignal::Up]);
    }

    #[test]
    fn release_outside_does_not_signal_up() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let button = top.create_button(
            top.root(),
            "OK",
            0xff00_0000,
            Fixed::from_int(12),
            FontStyle::ROMAN,
        );
        top.show();

        let signals = StdRc::new(StdRefCell::new(Vec::new()));
        {
            let signals = signals.clone();
            top.button_on_signal(button, move |s| signals.borrow_mut().push(s));
        }

        let window = top.window();
        let down = Pointer {
            screen_x: 50,
            screen_y: 50,
            x: 50,
            y: 50,
            button: 1,
        };
        window.pixmap().dispatch(&Event::ButtonDown(down));
        // drag far outside, then release
        let motion = Pointer {
            screen_x: 500,
            screen_y: 500,
            x: 500,
            y: 500,
            button: 1,
        };
        window.pixmap().dispatch(&Event::Motion(motion));
        let up = Pointer {
            screen_x: 500,
            screen_y: 500,
            x: 500,
            y: 500,
            button: 0,
        };
        window.pixmap().dispatch(&Event::ButtonUp(up));

        assert_eq!(*signals.borrow(), [ButtonSignal::Down]);
    }

    #[test]
    fn copy_geometry_mirrors_source() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let src = top.create_label(
            top.root(),
            "Wide",
            0xff00_0000,
            Fixed::from_int(14),
            FontStyle::ROMAN,
        );
        let copy = top.create_widget(
            top.root(),
            0,
            LayoutHint::default(),
        );
        top.set_copy_geometry(copy, src);
        top.show();

        let tree = top.tree().borrow();
        assert_eq!(
            tree.widgets[copy.0].preferred,
            tree.widgets[src.0].preferred
        );
    }

    #[test]
    fn queued_paint_collapses() {
        let (screen, dispatcher) = fixture();
        let top = plain_toplevel(&screen, &dispatcher);
        let w = top.create_widget(
            top.root(),
            0xffff_ffff,
            LayoutHint {
                width: 10,
                height: 10,
                stretch_width: 1,
                stretch_height: 1,
            },
        );
        top.show();

        let before = dispatcher.pending_work();
        top.set_background(w, 0xff00_0000);
        top.set_background(w, 0xff11_1111);
        let after = dispatcher.pending_work();
        assert_eq!(after - before, 1, "repeated paints queued once");

        dispatcher.run_work();
        let px = top.window().pixmap();
        assert_eq!(px.borrow().argb32_row(5, 5, 1)[0], 0xff11_1111);
    }
}
