//! Shared fixtures for host and replay tests.

use std::rc::Rc;

use futures::executor::block_on;
use linkpeek_detect::ManualTimers;
use linkpeek_dom::{Document, ElementData, Location, NodeId, Page, Rect, TagName};
use linkpeek_settings::{LocalStorage, MemoryStore};
use serde_json::Value;

use crate::host::ContentHost;

/// `<body><a href=..></a><div></div></body>` at `https://site.example/`.
pub struct TestPage {
    pub page: Rc<Page>,
    pub link: NodeId,
    pub plain: NodeId,
}

pub fn test_page(href: &str) -> TestPage {
    let mut doc = Document::new();
    let body = doc.create_element(ElementData::new(TagName::Body));
    let link = doc.create_element(ElementData::new(TagName::A).with_attribute("href", href));
    let plain = doc.create_element(ElementData::new(TagName::Div));
    doc.append_child(doc.root(), body).unwrap();
    doc.append_child(body, link).unwrap();
    doc.append_child(body, plain).unwrap();

    let page = Page::new(doc, Location::parse("https://site.example/").unwrap());
    page.set_box(link, Rect::new(90.0, 90.0, 60.0, 20.0));
    page.set_box(plain, Rect::new(0.0, 290.0, 200.0, 20.0));
    TestPage {
        page: Rc::new(page),
        link,
        plain,
    }
}

/// A host mounted on `t` over a store holding `entries`.
pub fn mounted<const N: usize>(
    t: &TestPage,
    entries: [(&str, Value); N],
) -> (ContentHost<MemoryStore>, Rc<ManualTimers>) {
    let timers = Rc::new(ManualTimers::new());
    let storage = LocalStorage::new(MemoryStore::with_entries(entries));
    let host = block_on(ContentHost::mount(
        Rc::clone(&t.page),
        Rc::<ManualTimers>::clone(&timers),
        storage,
    ))
    .unwrap();
    (host, timers)
}
