//! Arena-based DOM tree.
//!
//! Nodes live in a flat `Vec` arena and are linked by index. A node that is
//! detached keeps its id and its own subtree, so handles captured before the
//! page mutated stay valid to look at; they just stop being connected.

use linkpeek_types::error::{PeekError, Result};

/// Index into the [`Document`]'s node arena.
pub type NodeId = usize;

// ------------------------------------------------------------------
// Node types
// ------------------------------------------------------------------

/// An HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

/// A single node in the DOM tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// The kind of DOM node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

/// Data associated with an Element node.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag: TagName,
    pub attributes: Vec<Attribute>,
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

// ------------------------------------------------------------------
// TagName
// ------------------------------------------------------------------

/// Tag names the engine cares about. Everything else is `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagName {
    Html,
    Head,
    Body,
    A,
    Div,
    Span,
    P,
    Img,
    Button,
    Ul,
    Li,
    Nav,
    Section,
    Article,
    Unknown(String),
}

impl TagName {
    /// Parse a tag name. Matching is ASCII case-insensitive, the way
    /// `Element.tagName` compares in HTML documents.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Self::Html,
            "head" => Self::Head,
            "body" => Self::Body,
            "a" => Self::A,
            "div" => Self::Div,
            "span" => Self::Span,
            "p" => Self::P,
            "img" => Self::Img,
            "button" => Self::Button,
            "ul" => Self::Ul,
            "li" => Self::Li,
            "nav" => Self::Nav,
            "section" => Self::Section,
            "article" => Self::Article,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Html => "html",
            Self::Head => "head",
            Self::Body => "body",
            Self::A => "a",
            Self::Div => "div",
            Self::Span => "span",
            Self::P => "p",
            Self::Img => "img",
            Self::Button => "button",
            Self::Ul => "ul",
            Self::Li => "li",
            Self::Nav => "nav",
            Self::Section => "section",
            Self::Article => "article",
            Self::Unknown(s) => s.as_str(),
        }
    }

    /// Returns `true` for hyperlink elements (`<a>`).
    pub fn is_hyperlink(&self) -> bool {
        matches!(self, Self::A)
    }
}

// ------------------------------------------------------------------
// ElementData
// ------------------------------------------------------------------

impl ElementData {
    pub fn new(tag: TagName) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Get an attribute value by name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value.to_string(),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != name);
        self.attributes.len() != before
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    pub fn href(&self) -> Option<&str> {
        self.get_attribute("href")
    }
}

// ------------------------------------------------------------------
// Document
// ------------------------------------------------------------------

impl Document {
    /// Create an empty document with a synthetic `Document` root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever created, connected or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always holds its root, so it is never empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Add a new unattached node to the arena.
    pub fn add_node(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Add an unattached element.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.add_node(NodeKind::Element(data))
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is moved, like
    /// `Node.appendChild`. Appending a node under itself or one of its
    /// descendants is rejected.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent >= self.nodes.len() || child >= self.nodes.len() {
            return Err(PeekError::Dom(format!(
                "append_child({parent}, {child}): no such node"
            )));
        }
        if child == self.root {
            return Err(PeekError::Dom("the document root cannot be moved".into()));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(PeekError::Dom(format!(
                "append_child({parent}, {child}): would create a cycle"
            )));
        }
        self.detach(child);
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        Ok(())
    }

    /// Remove `id` (and its subtree) from its parent. The nodes keep their
    /// ids. Returns `true` if the node had a parent.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) else {
            return false;
        };
        self.nodes[parent].children.retain(|&c| c != id);
        self.nodes[id].parent = None;
        true
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get the [`ElementData`] for a node, if it is an element.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable access to an element's data.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// The parent chain of `id`, nearest first, not including `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.nodes.get(id).and_then(|n| n.parent),
        }
    }

    /// Whether `id` is reachable from the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if id >= self.nodes.len() {
            return false;
        }
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// The nearest hyperlink element at or above `id`, like
    /// `element.closest("a")`.
    pub fn closest_hyperlink(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.element(n).is_some_and(|e| e.tag.is_hyperlink()))
    }

    /// Connected nodes in tree order (pre-order depth-first).
    pub fn tree_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    /// Find the first connected element whose `id` attribute matches.
    pub fn get_element_by_id(&self, target: &str) -> Option<NodeId> {
        self.tree_order()
            .into_iter()
            .find(|&id| self.element(id).and_then(|e| e.id()) == Some(target))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's ancestors. See [`Document::ancestors`].
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.nodes.get(current).and_then(|n| n.parent);
        Some(current)
    }
}

// ------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------
