//! Shared fixtures for page tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::{Document, ElementData, NodeId, TagName};
use crate::event::DomEvent;
use crate::location::Location;
use crate::page::{Listener, Page, Rect};

/// A small page: `<body><a href=..><span>label</span></a><div>plain</div></body>`
/// at `https://site.example/`.
pub struct LinkPage {
    pub page: Page,
    pub body: NodeId,
    pub anchor: NodeId,
    pub label: NodeId,
    pub plain: NodeId,
}

pub fn link_page(href: &str) -> LinkPage {
    let mut doc = Document::new();
    let body = doc.create_element(ElementData::new(TagName::Body));
    let anchor = doc.create_element(ElementData::new(TagName::A).with_attribute("href", href));
    let label = doc.create_element(ElementData::new(TagName::Span));
    let plain = doc.create_element(ElementData::new(TagName::Div));
    doc.append_child(doc.root(), body).unwrap();
    doc.append_child(body, anchor).unwrap();
    doc.append_child(anchor, label).unwrap();
    doc.append_child(body, plain).unwrap();

    let page = Page::new(doc, Location::parse("https://site.example/").unwrap());
    page.set_box(body, Rect::new(0.0, 0.0, 800.0, 600.0));
    page.set_box(anchor, Rect::new(90.0, 90.0, 60.0, 20.0));
    page.set_box(label, Rect::new(95.0, 95.0, 40.0, 10.0));
    page.set_box(plain, Rect::new(0.0, 290.0, 200.0, 20.0));

    LinkPage {
        page,
        body,
        anchor,
        label,
        plain,
    }
}

/// A listener that appends `name` to a shared log every time it runs.
pub fn recorder(name: &'static str) -> (Rc<RefCell<Vec<&'static str>>>, Listener) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let listener: Listener = Rc::new(move |_: &Page, _: &mut DomEvent| sink.borrow_mut().push(name));
    (log, listener)
}
