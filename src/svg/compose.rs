//! Substitution: re-apply current edits onto a fresh copy of the template.
//!
//! Composition never mutates the stored [`TemplateDocument`]; it clones the
//! tree and rewrites it using the enumeration the detector stored, so an
//! identifier always lands on the same node it was derived from.

use std::collections::HashMap;

use super::{Document, Node, TemplateDocument};

/// Produce a composed copy of the template with the current edits applied.
///
/// * Image zones: when `zones` holds `image-{N}`, both `href` and
///   `xlink:href` on the N-th image node are overwritten with the stored
///   data URI.
/// * Text fields: when `fields` holds a **non-empty** value for an accepted
///   `text-{N}`, the node's content is replaced by that value (descendant
///   runs are dropped). Empty or absent values leave the template's original
///   content untouched — unset fields are never blanked.
///
/// A value targeting a node nested inside an already-replaced ancestor is
/// swallowed: the ancestor replacement removed the node, so the path no
/// longer resolves and the edit has no visible effect.
pub fn compose(
    template: &TemplateDocument,
    fields: &HashMap<String, String>,
    zones: &HashMap<String, String>,
) -> Document {
    let mut doc = template.doc.clone();

    for (i, path) in template.images.iter().enumerate() {
        let id = format!("image-{}", i);
        let Some(uri) = zones.get(&id) else { continue };
        if let Some(el) = doc.element_at_mut(path) {
            el.set_attr("href", uri);
            el.set_attr("xlink:href", uri);
        }
    }

    for (i, entry) in template.texts.iter().enumerate() {
        if !entry.accepted {
            continue;
        }
        let id = format!("text-{}", i);
        let Some(value) = fields.get(&id) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if let Some(el) = doc.element_at_mut(&entry.path) {
            el.children = vec![Node::Text(value.clone())];
            el.self_closing = false;
        }
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::parse_template;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const TEMPLATE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 1080 1080">
  <image x="0" y="0" width="400" height="400"/>
  <text x="10" y="20">Original headline</text>
  <text x="10" y="60">Original body copy</text>
</svg>"#;

    #[test]
    fn set_field_shows_exactly_that_value() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let doc = compose(&tpl, &fields(&[("text-0", "New headline")]), &HashMap::new());
        let markup = doc.to_markup();
        assert!(markup.contains(">New headline<"));
        assert!(!markup.contains("Original headline"));
        // The untouched field keeps its original content.
        assert!(markup.contains("Original body copy"));
    }

    #[test]
    fn clearing_a_field_reverts_to_original_content() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let doc = compose(&tpl, &fields(&[("text-0", "")]), &HashMap::new());
        let markup = doc.to_markup();
        assert!(markup.contains("Original headline"));
        assert!(!markup.contains("><"));
    }

    #[test]
    fn zone_image_rewrites_both_href_attributes() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let uri = "data:image/png;base64,AAAA";
        let mut zones = HashMap::new();
        zones.insert("image-0".to_string(), uri.to_string());
        let doc = compose(&tpl, &HashMap::new(), &zones);
        let markup = doc.to_markup();
        assert!(markup.contains(&format!("href=\"{}\"", uri)));
        assert!(markup.contains(&format!("xlink:href=\"{}\"", uri)));
    }

    #[test]
    fn empty_zone_map_leaves_images_untouched() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let doc = compose(&tpl, &HashMap::new(), &HashMap::new());
        assert_eq!(doc.to_markup(), tpl.document().to_markup());
    }

    #[test]
    fn user_text_is_escaped_in_the_markup() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let doc = compose(
            &tpl,
            &fields(&[("text-0", "Fish & chips <tonight>")]),
            &HashMap::new(),
        );
        let markup = doc.to_markup();
        assert!(markup.contains("Fish &amp; chips &lt;tonight&gt;"));
        // The composed markup stays parseable.
        assert!(parse_template(&markup).is_ok());
    }

    #[test]
    fn ancestor_replacement_swallows_child_overrides() {
        let svg = "<svg><text><tspan>First run</tspan><tspan>Second run</tspan></text></svg>";
        let tpl = parse_template(svg).unwrap();
        // text-0 is the parent, text-1/text-2 its tspans.
        let doc = compose(
            &tpl,
            &fields(&[("text-0", "Parent wins"), ("text-2", "Never shown")]),
            &HashMap::new(),
        );
        let markup = doc.to_markup();
        assert!(markup.contains("Parent wins"));
        assert!(!markup.contains("Never shown"));
        assert!(!markup.contains("Second run"));
    }

    #[test]
    fn substitution_reuses_sparse_identifiers() {
        let svg = r#"<svg>
            <text>x</text>
            <text>Keep or replace me</text>
            <text>Keep or replace me</text>
            <text>Another run</text>
        </svg>"#;
        let tpl = parse_template(svg).unwrap();
        // Accepted ids are text-1 and text-3; text-2 was deduped and must
        // stay untouched even if a value is supplied for it.
        let doc = compose(
            &tpl,
            &fields(&[("text-1", "Replaced"), ("text-2", "Ignored"), ("text-3", "Also replaced")]),
            &HashMap::new(),
        );
        let markup = doc.to_markup();
        assert!(markup.contains("Replaced"));
        assert!(markup.contains("Also replaced"));
        assert!(!markup.contains("Ignored"));
        // The deduped duplicate keeps its original content.
        assert!(markup.contains("Keep or replace me"));
    }

    #[test]
    fn compose_does_not_mutate_the_stored_template() {
        let tpl = parse_template(TEMPLATE).unwrap();
        let before = tpl.document().to_markup();
        let _ = compose(&tpl, &fields(&[("text-0", "Changed")]), &HashMap::new());
        assert_eq!(tpl.document().to_markup(), before);
    }

    #[test]
    fn zero_element_template_composes_unchanged() {
        let svg = "<svg><rect width=\"10\" height=\"10\"/></svg>";
        let tpl = parse_template(svg).unwrap();
        let doc = compose(
            &tpl,
            &fields(&[("text-0", "nothing to hit")]),
            &HashMap::new(),
        );
        assert_eq!(doc.to_markup(), svg);
    }
}
