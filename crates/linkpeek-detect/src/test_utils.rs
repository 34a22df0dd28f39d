//! Shared fixtures for detection tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use linkpeek_dom::{
    DispatchOutcome, Document, DomEvent, ElementData, Location, NodeId, Page, Rect, TagName,
};
use linkpeek_types::config::DetectionConfig;
use linkpeek_types::input::{Modifiers, Point};

use crate::extract::LinkResolver;
use crate::gesture::Detection;
use crate::session::{SessionHandle, activate};
use crate::timer::ManualTimers;

pub fn site(href: &str) -> Location {
    Location::parse(href).unwrap()
}

/// `<body><a href=..><span/></a><div/></body>` at `https://site.example/`.
///
/// Boxes: the span covers (95,95)-(135,105) inside the anchor's
/// (90,90)-(150,110); the div sits at (0,290)-(200,310).
pub struct Fixture {
    pub page: Rc<Page>,
    pub body: NodeId,
    pub anchor: NodeId,
    pub label: NodeId,
    pub plain: NodeId,
}

pub fn fixture(href: &str) -> Fixture {
    let mut doc = Document::new();
    let body = doc.create_element(ElementData::new(TagName::Body));
    let anchor = doc.create_element(ElementData::new(TagName::A).with_attribute("href", href));
    let label = doc.create_element(ElementData::new(TagName::Span));
    let plain = doc.create_element(ElementData::new(TagName::Div));
    doc.append_child(doc.root(), body).unwrap();
    doc.append_child(body, anchor).unwrap();
    doc.append_child(anchor, label).unwrap();
    doc.append_child(body, plain).unwrap();

    let page = Page::new(doc, site("https://site.example/"));
    page.set_box(body, Rect::new(0.0, 0.0, 800.0, 600.0));
    page.set_box(anchor, Rect::new(90.0, 90.0, 60.0, 20.0));
    page.set_box(label, Rect::new(95.0, 95.0, 40.0, 10.0));
    page.set_box(plain, Rect::new(0.0, 290.0, 200.0, 20.0));

    Fixture {
        page: Rc::new(page),
        body,
        anchor,
        label,
        plain,
    }
}

/// A lone `<div data-href="page2">` at `https://site.example/dir/`, box
/// (0,0)-(100,100).
pub fn data_link_fixture() -> (Rc<Page>, NodeId) {
    let mut doc = Document::new();
    let div = doc.create_element(ElementData::new(TagName::Div).with_attribute("data-href", "page2"));
    doc.append_child(doc.root(), div).unwrap();
    let page = Page::new(doc, site("https://site.example/dir/"));
    page.set_box(div, Rect::new(0.0, 0.0, 100.0, 100.0));
    (Rc::new(page), div)
}

/// A [`LinkResolver`] backed by a fixed table.
#[derive(Debug, Default)]
pub struct FakeLinks(HashMap<NodeId, String>);

impl FakeLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, node: NodeId, url: &str) -> Self {
        self.0.insert(node, url.to_string());
        self
    }
}

impl LinkResolver for FakeLinks {
    fn resolve_link(&self, node: NodeId) -> Option<String> {
        self.0.get(&node).cloned()
    }
}

// -----------------------------------------------------------------------
// Harness
// -----------------------------------------------------------------------

/// An active session over a page, with a virtual clock and a log of
/// detections.
pub struct Harness {
    pub page: Rc<Page>,
    pub timers: Rc<ManualTimers>,
    pub detections: Rc<RefCell<Vec<Detection>>>,
    pub session: SessionHandle,
}

pub fn harness(page: &Rc<Page>, config: DetectionConfig) -> Harness {
    let timers = Rc::new(ManualTimers::new());
    let detections = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&detections);
    let session = activate(Rc::clone(page), Rc::<ManualTimers>::clone(&timers), config, move |url: &str, source: NodeId| {
        sink.borrow_mut().push(Detection {
            url: url.to_string(),
            source,
        })
    });
    Harness {
        page: Rc::clone(page),
        timers,
        detections,
        session,
    }
}

impl Harness {
    fn at(&self, x: f64, y: f64) -> (Option<NodeId>, Point) {
        let p = Point::new(x, y);
        (self.page.element_at(p), p)
    }

    pub fn down(&self, x: f64, y: f64) -> DispatchOutcome {
        let (target, p) = self.at(x, y);
        self.page.dispatch(DomEvent::pointer_down(target, p))
    }

    pub fn move_to(&self, x: f64, y: f64) -> DispatchOutcome {
        let (target, p) = self.at(x, y);
        self.page.dispatch(DomEvent::pointer_move(target, p))
    }

    pub fn up(&self, x: f64, y: f64) -> DispatchOutcome {
        let (target, p) = self.at(x, y);
        self.page.dispatch(DomEvent::pointer_up(target, p))
    }

    pub fn click(&self, x: f64, y: f64) -> DispatchOutcome {
        let (target, p) = self.at(x, y);
        self.page.dispatch(DomEvent::click(target, p))
    }

    pub fn alt_click(&self, x: f64, y: f64) -> DispatchOutcome {
        let (target, p) = self.at(x, y);
        self.page
            .dispatch(DomEvent::click(target, p).with_modifiers(Modifiers::ALT))
    }

    pub fn urls(&self) -> Vec<String> {
        self.detections.borrow().iter().map(|d| d.url.clone()).collect()
    }
}
