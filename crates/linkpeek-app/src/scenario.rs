//! Replay scenarios.
//!
//! A scenario is a TOML file describing a page, the stored settings, and a
//! timed list of input events:
//!
//! ```toml
//! location = "https://site.example/dir/"
//! end_ms = 1000
//!
//! [settings]
//! behavior = "long-press"
//!
//! [[elements]]
//! name = "card"
//! tag = "div"
//! attributes = { data-href = "page2" }
//! box = [0, 0, 100, 100]
//!
//! [[events]]
//! at = 0
//! kind = "pointer-down"
//! x = 50
//! y = 50
//! ```
//!
//! Elements are created in order, so a parent must be listed before its
//! children. Elements without a `parent` go under the document root.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use linkpeek_dom::{Document, DomEvent, ElementData, Location, NodeId, Page, Rect, TagName};
use linkpeek_settings::lifecycle::InstallReason;
use linkpeek_types::error::{PeekError, Result};
use linkpeek_types::input::{Modifiers, Point, PointerButton};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Document URL.
    pub location: String,
    /// Advance the clock to this time after the last event.
    pub end_ms: Option<u64>,
    #[serde(default)]
    pub install: Option<InstallSection>,
    #[serde(default)]
    pub settings: StoredSettings,
    #[serde(default)]
    pub elements: Vec<ScenarioElement>,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

/// Run the install hook before mounting.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallSection {
    pub reason: InstallReason,
    #[serde(default = "default_install_date")]
    pub date: String,
}

fn default_install_date() -> String {
    "1970-01-01".to_string()
}

/// Raw setting values, written to the store as given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredSettings {
    pub behavior: Option<String>,
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioElement {
    pub name: String,
    pub tag: String,
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// `[x, y, width, height]`
    #[serde(rename = "box")]
    pub rect: Option<[f64; 4]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKindName {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    VisibilityChange,
    Blur,
    /// Change the stored behavior.
    Settings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioEvent {
    pub at: u64,
    pub kind: EventKindName,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Element name. Defaults to the element under `(x, y)`.
    pub target: Option<String>,
    #[serde(default)]
    pub button: PointerButton,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub hidden: bool,
    /// For `settings`: the new behavior, or none to clear it.
    pub behavior: Option<String>,
}

/// A scenario event ready to be carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Dispatch(DomEvent),
    SetBehavior(Option<String>),
}

/// The page a scenario describes, with its elements by name.
#[derive(Debug)]
pub struct BuiltPage {
    pub page: Rc<Page>,
    pub names: HashMap<String, NodeId>,
}

impl BuiltPage {
    /// The scenario name of `node`, if it has one.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, id)| **id == node)
            .map(|(name, _)| name.as_str())
    }
}

impl Scenario {
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| PeekError::Config(format!("scenario: {e}")))
    }

    /// Build the document, location, and element boxes.
    pub fn build_page(&self) -> Result<BuiltPage> {
        let location = Location::parse(&self.location)?;
        let mut doc = Document::new();
        let mut names = HashMap::new();
        let mut boxes = Vec::new();

        for element in &self.elements {
            if names.contains_key(&element.name) {
                return Err(PeekError::Config(format!("duplicate element name `{}`", element.name)));
            }
            let mut data = ElementData::new(TagName::from_str(&element.tag));
            for (name, value) in &element.attributes {
                data.set_attribute(name, value);
            }
            let id = doc.create_element(data);
            let parent = match &element.parent {
                Some(parent) => *names.get(parent).ok_or_else(|| {
                    PeekError::Config(format!("`{}`: unknown parent `{parent}`", element.name))
                })?,
                None => doc.root(),
            };
            doc.append_child(parent, id)?;
            if let Some([x, y, w, h]) = element.rect {
                boxes.push((id, Rect::new(x, y, w, h)));
            }
            names.insert(element.name.clone(), id);
        }

        let page = Page::new(doc, location);
        for (id, rect) in boxes {
            page.set_box(id, rect);
        }
        Ok(BuiltPage {
            page: Rc::new(page),
            names,
        })
    }

    /// Events in time order. Events at the same time keep file order.
    pub fn timeline(&self) -> Vec<&ScenarioEvent> {
        let mut events: Vec<_> = self.events.iter().collect();
        events.sort_by_key(|e| e.at);
        events
    }
}

impl ScenarioEvent {
    /// Resolve the target and build the step for `built`.
    pub fn to_step(&self, built: &BuiltPage) -> Result<Step> {
        let position = Point::new(self.x, self.y);
        let target = match &self.target {
            Some(name) => Some(
                *built
                    .names
                    .get(name)
                    .ok_or_else(|| PeekError::Config(format!("event at {}: unknown target `{name}`", self.at)))?,
            ),
            None => built.page.element_at(position),
        };
        let event = match self.kind {
            EventKindName::Settings => return Ok(Step::SetBehavior(self.behavior.clone())),
            EventKindName::PointerDown => DomEvent::pointer_down(target, position),
            EventKindName::PointerMove => DomEvent::pointer_move(target, position),
            EventKindName::PointerUp => DomEvent::pointer_up(target, position),
            EventKindName::Click => DomEvent::click(target, position),
            EventKindName::VisibilityChange => DomEvent::visibility_change(self.hidden),
            EventKindName::Blur => DomEvent::blur(),
        };
        Ok(Step::Dispatch(
            event.with_button(self.button).with_modifiers(self.modifiers),
        ))
    }
}
