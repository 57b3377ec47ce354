//! Template parsing and placeholder detection.
//!
//! Detection runs exactly once per template load: the parse stores the
//! enumeration output inside the returned [`TemplateDocument`], and every
//! later substitution pass reuses it instead of re-walking the tree.

use std::collections::HashSet;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{
    DetectedElement, Document, Element, LABEL_MAX_CHARS, Node, NodePath, enumerate,
};

/// Error raised when a template asset cannot be parsed.
#[derive(Debug)]
pub enum ParseError {
    /// Malformed markup (mismatched tags, broken attributes, bad escapes).
    Xml(quick_xml::Error),
    /// The document has no `svg` root element.
    MissingRoot,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Xml(e) => write!(f, "Malformed markup: {}", e),
            ParseError::MissingRoot => write!(f, "No svg root element found"),
        }
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        ParseError::Xml(e)
    }
}

/// One entry of the unfiltered text-node enumeration.
#[derive(Debug, Clone)]
pub(crate) struct TextEntry {
    pub path: NodePath,
    /// Whether detection accepted this node (content length in bounds and
    /// not a duplicate of an earlier accepted node).
    pub accepted: bool,
}

/// A parsed template asset: the owned document tree, the stored enumeration,
/// and the accepted detected elements, in detection order (images first).
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    pub(crate) doc: Document,
    pub(crate) images: Vec<NodePath>,
    pub(crate) texts: Vec<TextEntry>,
    elements: Vec<DetectedElement>,
}

impl TemplateDocument {
    /// All accepted elements: images first, then text runs, each in
    /// document order.
    pub fn elements(&self) -> &[DetectedElement] {
        &self.elements
    }

    pub fn image_elements(&self) -> impl Iterator<Item = &DetectedElement> {
        self.elements.iter().filter(|e| e.is_image())
    }

    pub fn text_elements(&self) -> impl Iterator<Item = &DetectedElement> {
        self.elements.iter().filter(|e| e.is_text())
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of *accepted* text elements (the unfiltered enumeration may be
    /// longer).
    pub fn text_count(&self) -> usize {
        self.texts.iter().filter(|t| t.accepted).count()
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }
}

/// Parse raw template markup and detect its substitutable elements.
///
/// Identifier scheme:
/// * `image-{N}` — N is the node's 0-based position among all `image` nodes.
/// * `text-{N}` — N is the node's position in the **unfiltered** `text`/
///   `tspan` enumeration, so accepted identifiers are sparse when nodes are
///   filtered out. Substitution relies on this to map an identifier back to
///   the right node.
pub fn parse_template(markup: &str) -> Result<TemplateDocument, ParseError> {
    let doc = parse_document(markup)?;
    let en = enumerate(doc.root());

    let mut elements = Vec::new();
    for (i, _) in en.images.iter().enumerate() {
        elements.push(DetectedElement::Image {
            id: format!("image-{}", i),
            label: format!("Image {}", i + 1),
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut texts = Vec::with_capacity(en.texts.len());
    for (i, path) in en.texts.iter().enumerate() {
        let content = doc
            .element_at(path)
            .map(|el| el.text_content().trim().to_string())
            .unwrap_or_default();
        let len = content.chars().count();
        let accepted = len > 1 && len < 200 && !seen.contains(&content);
        if accepted {
            seen.insert(content.clone());
            elements.push(DetectedElement::Text {
                id: format!("text-{}", i),
                label: label_for(&content),
                original_content: content,
            });
        }
        texts.push(TextEntry {
            path: path.clone(),
            accepted,
        });
    }

    Ok(TemplateDocument {
        doc,
        images: en.images,
        texts,
        elements,
    })
}

/// First 25 characters plus an ellipsis, else the full content.
fn label_for(content: &str) -> String {
    if content.chars().count() > LABEL_MAX_CHARS {
        let mut label: String = content.chars().take(LABEL_MAX_CHARS).collect();
        label.push('…');
        label
    } else {
        content.to_string()
    }
}

/// Parse markup into an owned [`Document`] tree.
pub(crate) fn parse_document(markup: &str) -> Result<Document, ParseError> {
    let mut reader = Reader::from_str(markup);

    let mut prolog: Vec<String> = Vec::new();
    let mut epilog: Vec<String> = Vec::new();
    let mut root: Option<Element> = None;
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => {
                stack.push(element_from(&e, false)?);
            }
            Event::Empty(e) => {
                let el = element_from(&e, true)?;
                place(
                    Node::Element(el),
                    &mut stack,
                    &mut root,
                    &mut prolog,
                    &mut epilog,
                );
            }
            Event::End(_) => {
                // The reader validates tag nesting, so the stack is non-empty.
                let Some(el) = stack.pop() else { break };
                place(
                    Node::Element(el),
                    &mut stack,
                    &mut root,
                    &mut prolog,
                    &mut epilog,
                );
            }
            Event::Text(t) => {
                let s = t.unescape()?.into_owned();
                place(Node::Text(s), &mut stack, &mut root, &mut prolog, &mut epilog);
            }
            Event::CData(c) => {
                let s = String::from_utf8_lossy(&c.into_inner()).into_owned();
                place(
                    Node::CData(s),
                    &mut stack,
                    &mut root,
                    &mut prolog,
                    &mut epilog,
                );
            }
            Event::Comment(t) => {
                let raw = format!("<!--{}-->", String::from_utf8_lossy(&t.into_inner()));
                place(Node::Raw(raw), &mut stack, &mut root, &mut prolog, &mut epilog);
            }
            Event::PI(t) => {
                let raw = format!("<?{}?>", String::from_utf8_lossy(&t.into_inner()));
                place(Node::Raw(raw), &mut stack, &mut root, &mut prolog, &mut epilog);
            }
            Event::DocType(t) => {
                let raw = format!("<!DOCTYPE{}>", String::from_utf8_lossy(&t.into_inner()));
                place(Node::Raw(raw), &mut stack, &mut root, &mut prolog, &mut epilog);
            }
            Event::Decl(d) => {
                let mut raw = String::from("<?xml");
                if let Ok(v) = d.version() {
                    raw.push_str(&format!(" version=\"{}\"", String::from_utf8_lossy(&v)));
                }
                if let Some(Ok(enc)) = d.encoding() {
                    raw.push_str(&format!(" encoding=\"{}\"", String::from_utf8_lossy(&enc)));
                }
                if let Some(Ok(sa)) = d.standalone() {
                    raw.push_str(&format!(" standalone=\"{}\"", String::from_utf8_lossy(&sa)));
                }
                raw.push_str("?>");
                place(Node::Raw(raw), &mut stack, &mut root, &mut prolog, &mut epilog);
            }
        }
    }

    let root = root.ok_or(ParseError::MissingRoot)?;
    if root.local_name() != "svg" {
        return Err(ParseError::MissingRoot);
    }
    Ok(Document {
        prolog,
        root,
        epilog,
    })
}

/// Attach a completed node to its parent, or to the document prolog/epilog
/// when it sits outside the root element.
fn place(
    node: Node,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
    prolog: &mut Vec<String>,
    epilog: &mut Vec<String>,
) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    match node {
        Node::Element(el) if root.is_none() => *root = Some(el),
        other => {
            let raw = match other {
                Node::Raw(s) | Node::Text(s) => s,
                Node::CData(s) => format!("<![CDATA[{}]]>", s),
                // Stray element after the document element; keep it verbatim.
                el @ Node::Element(_) => {
                    let mut out = String::new();
                    el.write(&mut out);
                    out
                }
            };
            if root.is_none() {
                prolog.push(raw);
            } else {
                epilog.push(raw);
            }
        }
    }
}

fn element_from(e: &BytesStart<'_>, self_closing: bool) -> Result<Element, ParseError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ParseError::Xml(err.into()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(Element {
        name,
        attrs,
        children: Vec::new(),
        self_closing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 1080 1080">
  <rect width="1080" height="1080" fill="#fff"/>
  <image x="100" y="100" width="300" height="300"/>
  <text x="50" y="50">Headline goes here</text>
  <text x="50" y="90">Body copy with quite a few more words in it</text>
</svg>"##;

    #[test]
    fn detects_images_and_text_runs() {
        let doc = parse_template(BASIC).unwrap();
        assert_eq!(doc.image_count(), 1);
        assert_eq!(doc.text_count(), 2);

        let ids: Vec<&str> = doc.elements().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["image-0", "text-0", "text-1"]);
    }

    #[test]
    fn detection_is_idempotent() {
        let a = parse_template(BASIC).unwrap();
        let b = parse_template(BASIC).unwrap();
        let ids_a: Vec<&str> = a.elements().iter().map(|e| e.id()).collect();
        let ids_b: Vec<&str> = b.elements().iter().map(|e| e.id()).collect();
        let labels_a: Vec<&str> = a.elements().iter().map(|e| e.label()).collect();
        let labels_b: Vec<&str> = b.elements().iter().map(|e| e.label()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn identifiers_stay_sparse_when_nodes_are_filtered() {
        // Five text-bearing nodes; node 0 is too short, node 2 duplicates
        // node 1 — accepted identifiers must be text-1, text-3, text-4.
        let svg = r#"<svg>
            <text>x</text>
            <text>Subteam name</text>
            <text>Subteam name</text>
            <text>Mentor name</text>
            <text>Weekly fun fact</text>
        </svg>"#;
        let doc = parse_template(svg).unwrap();
        let ids: Vec<&str> = doc.text_elements().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["text-1", "text-3", "text-4"]);
    }

    #[test]
    fn accepted_content_respects_length_bounds_and_dedupe() {
        let long = "a".repeat(200);
        let svg = format!(
            "<svg><text>ok text</text><text>{}</text><text>ok text</text><text> </text></svg>",
            long
        );
        let doc = parse_template(&svg).unwrap();
        let texts: Vec<&DetectedElement> = doc.text_elements().collect();
        assert_eq!(texts.len(), 1);
        for el in &texts {
            let n = el.original_content().unwrap().chars().count();
            assert!(n > 1 && n < 200);
        }
        // 199 characters is still accepted.
        let svg = format!("<svg><text>{}</text></svg>", "b".repeat(199));
        assert_eq!(parse_template(&svg).unwrap().text_count(), 1);
    }

    #[test]
    fn labels_truncate_at_25_characters() {
        let svg = "<svg><text>This headline is definitely longer than the cap</text><text>Short one</text></svg>";
        let doc = parse_template(svg).unwrap();
        let labels: Vec<&str> = doc.text_elements().map(|e| e.label()).collect();
        assert_eq!(labels[0], "This headline is definite…");
        assert_eq!(labels[1], "Short one");
    }

    #[test]
    fn parent_text_content_includes_tspans() {
        // The parent's textContent equals the sole tspan's content, so the
        // tspan dedupes away and only the parent is accepted.
        let svg = "<svg><text><tspan>Single run</tspan></text></svg>";
        let doc = parse_template(svg).unwrap();
        let ids: Vec<&str> = doc.text_elements().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["text-0"]);

        // Distinct runs: the parent concatenation and each tspan all differ,
        // so all three are accepted.
        let svg = "<svg><text><tspan>First run</tspan><tspan>Second run</tspan></text></svg>";
        let doc = parse_template(svg).unwrap();
        let ids: Vec<&str> = doc.text_elements().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["text-0", "text-1", "text-2"]);
    }

    #[test]
    fn self_closing_text_consumes_an_index() {
        let svg = "<svg><text/><text>Real content</text></svg>";
        let doc = parse_template(svg).unwrap();
        let ids: Vec<&str> = doc.text_elements().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["text-1"]);
    }

    #[test]
    fn zero_elements_is_valid() {
        let doc = parse_template("<svg><rect width=\"10\" height=\"10\"/></svg>").unwrap();
        assert_eq!(doc.image_count(), 0);
        assert_eq!(doc.text_count(), 0);
        assert!(doc.elements().is_empty());
    }

    #[test]
    fn malformed_markup_is_a_parse_error() {
        assert!(matches!(
            parse_template("<svg><text>unclosed</svg>"),
            Err(ParseError::Xml(_))
        ));
    }

    #[test]
    fn non_svg_root_is_a_parse_error() {
        assert!(matches!(
            parse_template("<html><p>hi</p></html>"),
            Err(ParseError::MissingRoot)
        ));
        assert!(matches!(parse_template("   "), Err(ParseError::MissingRoot)));
    }

    #[test]
    fn entity_decoded_content_is_detected() {
        let svg = "<svg><text>Fish &amp; chips</text></svg>";
        let doc = parse_template(svg).unwrap();
        let el = doc.text_elements().next().unwrap();
        assert_eq!(el.original_content(), Some("Fish & chips"));
    }
}
