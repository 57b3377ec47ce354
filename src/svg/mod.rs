//! SVG template handling: parsing, placeholder detection, substitution.
//!
//! Templates are parsed once into an owned node tree. A single document-order
//! enumeration over that tree is produced at parse time and stored alongside
//! it; both detection (`detect`) and substitution (`compose`) consume that
//! stored enumeration, so the positional identifiers they agree on can never
//! drift apart within one template load.

pub mod compose;
pub mod detect;

pub use compose::compose;
pub use detect::{ParseError, TemplateDocument, parse_template};

use quick_xml::escape::escape;

/// Maximum label length (in characters) before truncation with an ellipsis.
pub const LABEL_MAX_CHARS: usize = 25;

/// One substitutable element discovered in a template asset.
///
/// Identifiers are positional (`image-N`, `text-N`) and only stable within
/// one parse of one asset — never persisted, never portable across template
/// switches.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectedElement {
    Image {
        id: String,
        label: String,
    },
    Text {
        id: String,
        label: String,
        original_content: String,
    },
}

impl DetectedElement {
    pub fn id(&self) -> &str {
        match self {
            DetectedElement::Image { id, .. } => id,
            DetectedElement::Text { id, .. } => id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DetectedElement::Image { label, .. } => label,
            DetectedElement::Text { label, .. } => label,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, DetectedElement::Image { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DetectedElement::Text { .. })
    }

    /// Trimmed original content for text elements, `None` for images.
    pub fn original_content(&self) -> Option<&str> {
        match self {
            DetectedElement::Text {
                original_content, ..
            } => Some(original_content),
            DetectedElement::Image { .. } => None,
        }
    }
}

/// Path from the root element down to a node: the child index at each level.
pub(crate) type NodePath = Vec<usize>;

/// A node of the owned markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Entity-decoded character data; re-escaped on serialization.
    Text(String),
    CData(String),
    /// Comments, processing instructions, DOCTYPE — re-emitted verbatim.
    Raw(String),
}

/// An element with its attributes and children, order-preserving.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Qualified name as written in the source, e.g. `tspan` or `svg:text`.
    pub name: String,
    /// Attributes in source order; values are entity-decoded.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// True when the source used `<name .../>`; only honoured while childless.
    pub self_closing: bool,
}

impl Element {
    /// Name with any namespace prefix stripped.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite an attribute, appending it when not yet present.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        if let Some((_, v)) = self.attrs.iter_mut().find(|(k, _)| k == key) {
            *v = value.to_string();
        } else {
            self.attrs.push((key.to_string(), value.to_string()));
        }
    }

    /// Concatenated descendant character data (DOM `textContent` semantics).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(s) | Node::CData(s) => out.push_str(s),
                Node::Element(el) => el.collect_text(out),
                Node::Raw(_) => {}
            }
        }
    }

    pub(crate) fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v));
            out.push('"');
        }
        if self.children.is_empty() && self.self_closing {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            child.write(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

impl Node {
    pub(crate) fn write(&self, out: &mut String) {
        match self {
            Node::Element(el) => el.write(out),
            Node::Text(s) => out.push_str(&escape(s)),
            Node::CData(s) => {
                out.push_str("<![CDATA[");
                out.push_str(s);
                out.push_str("]]>");
            }
            Node::Raw(s) => out.push_str(s),
        }
    }
}

/// A parsed markup document: the `svg` root element plus whatever raw pieces
/// (XML declaration, comments, whitespace) surrounded it in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) prolog: Vec<String>,
    pub(crate) root: Element,
    pub(crate) epilog: Vec<String>,
}

impl Document {
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Force explicit pixel dimensions on the root element. Used by the
    /// exporter so output resolution never depends on the on-screen size.
    pub fn set_root_size(&mut self, width: u32, height: u32) {
        self.root.set_attr("width", &width.to_string());
        self.root.set_attr("height", &height.to_string());
    }

    /// Serialize back to markup text.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for piece in &self.prolog {
            out.push_str(piece);
        }
        self.root.write(&mut out);
        for piece in &self.epilog {
            out.push_str(piece);
        }
        out
    }

    pub(crate) fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &idx in path {
            match current.children.get(idx) {
                Some(Node::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    pub(crate) fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &idx in path {
            match current.children.get_mut(idx) {
                Some(Node::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }
}

/// The unfiltered document-order enumeration of substitutable nodes.
#[derive(Debug, Clone, Default)]
pub(crate) struct Enumeration {
    /// All `image` elements, document order.
    pub images: Vec<NodePath>,
    /// All `text` and `tspan` elements, document order (parents before their
    /// nested `tspan` children).
    pub texts: Vec<NodePath>,
}

/// The one shared walk both detection and substitution derive positions from.
pub(crate) fn enumerate(root: &Element) -> Enumeration {
    let mut en = Enumeration::default();
    let mut path = NodePath::new();
    walk(root, &mut path, &mut en);
    en
}

fn walk(el: &Element, path: &mut NodePath, en: &mut Enumeration) {
    for (i, child) in el.children.iter().enumerate() {
        let Node::Element(child_el) = child else {
            continue;
        };
        path.push(i);
        match child_el.local_name() {
            "image" => en.images.push(path.clone()),
            "text" | "tspan" => en.texts.push(path.clone()),
            _ => {}
        }
        walk(child_el, path, en);
        path.pop();
    }
}
