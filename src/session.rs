//! Session state: the currently selected template, the user's edits, the
//! exportable composition, and the list of generated graphics.
//!
//! Nothing here is persisted; a session lives exactly as long as the app.

use std::collections::HashMap;

use crate::ops::export::{CANVAS_HEIGHT, CANVAS_WIDTH, ExportError};
use crate::svg::{Document, TemplateDocument};

/// Text-element id → current value. An empty string means "use the
/// template's original content".
pub type FieldValues = HashMap<String, String>;

/// Image-zone id → embedded `data:` URI. Absence means "no image selected".
pub type ZoneImages = HashMap<String, String>;

/// One exported PNG, kept in memory for the session's output gallery.
#[derive(Debug, Clone)]
pub struct GeneratedGraphic {
    /// Unique within the session (UUID v4).
    pub id: String,
    pub template_id: String,
    /// Encoded PNG bytes, always 1080×1080.
    pub png: Vec<u8>,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_ms: u64,
    /// Resolved output filename, always `.png`-suffixed.
    pub filename: String,
}

/// Everything the exporter needs, captured at trigger time so the background
/// job never reads shared state.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Composed markup with the output dimensions already forced.
    pub markup: String,
    pub template_id: String,
    /// Raw user filename input; may be empty or missing the `.png` suffix.
    pub filename: String,
}

/// Per-session mutable state.
pub struct Session {
    /// Id of the currently selected registry template.
    pub template_id: String,
    /// Parsed template, present once the asset load + detection finished.
    pub document: Option<TemplateDocument>,
    pub fields: FieldValues,
    pub zones: ZoneImages,
    /// Holder for the current exportable composition. Written only by the
    /// preview refresh, read only by `begin_export`.
    exportable: Option<Document>,
    /// Gates export entry; a second trigger while true is rejected.
    exporting: bool,
    /// Generated graphics, most recent first.
    graphics: Vec<GeneratedGraphic>,
}

impl Session {
    pub fn new(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            document: None,
            fields: FieldValues::new(),
            zones: ZoneImages::new(),
            exportable: None,
            exporting: false,
            graphics: Vec::new(),
        }
    }

    /// Switch templates: field values, zone images, the parsed document and
    /// the exportable holder are all reset so editors never show leftover
    /// entries. The gallery survives switches.
    pub fn select_template(&mut self, template_id: &str) {
        self.template_id = template_id.to_string();
        self.document = None;
        self.fields.clear();
        self.zones.clear();
        self.exportable = None;
    }

    /// Install a decoded photo upload. `template_id` is captured when the
    /// picker opens; a receipt staged under a template that is no longer
    /// selected is stale and discarded, so a switch mid-decode never leaks
    /// an entry into the new template's zones.
    pub fn apply_upload(&mut self, template_id: &str, zone_id: &str, data_uri: String) -> bool {
        if template_id != self.template_id {
            return false;
        }
        self.zones.insert(zone_id.to_string(), data_uri);
        true
    }

    /// Install the freshly composed document as the current exportable state.
    pub fn set_exportable(&mut self, doc: Document) {
        self.exportable = Some(doc);
    }

    pub fn has_exportable(&self) -> bool {
        self.exportable.is_some()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Gate and stage an export.
    ///
    /// Fails with [`ExportError::Busy`] while a previous export is still in
    /// flight and with [`ExportError::NoPreview`] when no composition has
    /// been rendered yet. On success the busy flag is set and the returned
    /// request carries a deep copy of the held document, serialized with the
    /// output dimensions forced — the on-screen preview is never mutated.
    pub fn begin_export(&mut self, filename: &str) -> Result<ExportRequest, ExportError> {
        if self.exporting {
            return Err(ExportError::Busy);
        }
        let Some(doc) = &self.exportable else {
            return Err(ExportError::NoPreview);
        };
        let mut copy = doc.clone();
        copy.set_root_size(CANVAS_WIDTH, CANVAS_HEIGHT);
        self.exporting = true;
        Ok(ExportRequest {
            markup: copy.to_markup(),
            template_id: self.template_id.clone(),
            filename: filename.to_string(),
        })
    }

    /// Settle an export. Clears the busy flag on success *and* failure, and
    /// prepends the graphic to the gallery on success — the only mutation of
    /// that list besides [`Session::clear_graphics`].
    pub fn finish_export(
        &mut self,
        outcome: Result<GeneratedGraphic, ExportError>,
    ) -> Result<&GeneratedGraphic, ExportError> {
        self.exporting = false;
        match outcome {
            Ok(graphic) => {
                self.graphics.insert(0, graphic);
                Ok(&self.graphics[0])
            }
            Err(e) => Err(e),
        }
    }

    /// Generated graphics, most recent first.
    pub fn graphics(&self) -> &[GeneratedGraphic] {
        &self.graphics
    }

    pub fn graphic(&self, id: &str) -> Option<&GeneratedGraphic> {
        self.graphics.iter().find(|g| g.id == id)
    }

    pub fn clear_graphics(&mut self) {
        self.graphics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svg::{compose, parse_template};

    fn session_with_preview() -> Session {
        let mut session = Session::new("robot-update");
        let tpl = parse_template("<svg viewBox=\"0 0 100 100\"><text>Some headline</text></svg>")
            .unwrap();
        let composed = compose(&tpl, &session.fields, &session.zones);
        session.document = Some(tpl);
        session.set_exportable(composed);
        session
    }

    fn graphic(id: &str) -> GeneratedGraphic {
        GeneratedGraphic {
            id: id.to_string(),
            template_id: "robot-update".to_string(),
            png: vec![1, 2, 3],
            created_ms: 1_700_000_000_000,
            filename: format!("{id}.png"),
        }
    }

    #[test]
    fn export_without_preview_fails() {
        let mut session = Session::new("robot-update");
        assert!(matches!(
            session.begin_export(""),
            Err(ExportError::NoPreview)
        ));
        assert!(!session.is_exporting());
    }

    #[test]
    fn export_request_forces_output_dimensions() {
        let mut session = session_with_preview();
        let req = session.begin_export("my-graphic").unwrap();
        assert!(req.markup.contains("width=\"1080\""));
        assert!(req.markup.contains("height=\"1080\""));
        assert_eq!(req.template_id, "robot-update");
        // The held preview composition itself is untouched.
        assert!(session.has_exportable());
    }

    #[test]
    fn double_trigger_is_rejected_and_flag_settles() {
        let mut session = session_with_preview();
        let _req = session.begin_export("").unwrap();
        assert!(matches!(session.begin_export(""), Err(ExportError::Busy)));

        session.finish_export(Ok(graphic("a"))).unwrap();
        assert!(!session.is_exporting());
        assert_eq!(session.graphics().len(), 1);

        // The failure path also clears the flag.
        let _req = session.begin_export("").unwrap();
        let err = session
            .finish_export(Err(ExportError::Render("bad markup".to_string())))
            .unwrap_err();
        assert!(matches!(err, ExportError::Render(_)));
        assert!(!session.is_exporting());
        assert_eq!(session.graphics().len(), 1);
    }

    #[test]
    fn graphics_are_prepended_most_recent_first() {
        let mut session = session_with_preview();
        for id in ["first", "second", "third"] {
            let _ = session.begin_export("").unwrap();
            session.finish_export(Ok(graphic(id))).unwrap();
        }
        let ids: Vec<&str> = session.graphics().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
        assert!(session.graphic("second").is_some());

        session.clear_graphics();
        assert!(session.graphics().is_empty());
    }

    #[test]
    fn upload_staged_under_a_previous_template_is_discarded() {
        let mut session = session_with_preview();
        assert!(session.apply_upload(
            "robot-update",
            "image-0",
            "data:image/png;base64,AA".to_string()
        ));
        assert_eq!(session.zones.len(), 1);

        // A decode that settles after a template switch must not land in
        // the new template's zones, even under a colliding zone id.
        session.select_template("fun-fact");
        assert!(!session.apply_upload(
            "robot-update",
            "image-0",
            "data:image/png;base64,BB".to_string()
        ));
        assert!(session.zones.is_empty());

        // A receipt for the currently selected template still applies.
        assert!(session.apply_upload(
            "fun-fact",
            "image-0",
            "data:image/png;base64,CC".to_string()
        ));
        assert_eq!(
            session.zones.get("image-0").map(String::as_str),
            Some("data:image/png;base64,CC")
        );
    }

    #[test]
    fn template_switch_resets_edit_state_but_keeps_gallery() {
        let mut session = session_with_preview();
        session
            .fields
            .insert("text-0".to_string(), "edited".to_string());
        session
            .zones
            .insert("image-0".to_string(), "data:image/png;base64,AA".to_string());
        let _ = session.begin_export("").unwrap();
        session.finish_export(Ok(graphic("kept"))).unwrap();

        session.select_template("fun-fact");
        assert_eq!(session.template_id, "fun-fact");
        assert!(session.fields.is_empty());
        assert!(session.zones.is_empty());
        assert!(session.document.is_none());
        assert!(!session.has_exportable());
        assert_eq!(session.graphics().len(), 1);
    }
}
