//! Field and zone editors — pure presentation over the two value maps.
//!
//! Every edit is a single-key map update; the document tree is only ever
//! touched by the preview refresh, never from here.

use std::collections::HashMap;

use eframe::egui;
use egui::{ColorImage, RichText, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;

use crate::session::{FieldValues, ZoneImages};
use crate::svg::TemplateDocument;

/// Original content longer than this gets a multiline widget. Purely a
/// presentation hint; stored values are identical either way.
const MULTILINE_THRESHOLD_CHARS: usize = 50;

/// Square edge of the zone thumbnail / upload slot.
const ZONE_SLOT_SIZE: f32 = 80.0;

/// What an editor pass asked the app to do.
pub enum EditorEvent {
    /// A map entry changed; the preview needs a refresh.
    Changed,
    /// The user clicked an empty zone slot; open a photo picker for it.
    PickImage(String),
}

/// Render one input per accepted text element. Returns true when any value
/// changed this frame.
pub fn show_text_fields(
    ui: &mut egui::Ui,
    document: &TemplateDocument,
    values: &mut FieldValues,
) -> bool {
    let texts: Vec<_> = document.text_elements().collect();
    if texts.is_empty() {
        ui.label(
            RichText::new("No editable text detected in this template")
                .weak()
                .small(),
        );
        return false;
    }

    let mut changed = false;
    for element in texts {
        let original = element.original_content().unwrap_or_default();
        ui.label(RichText::new(element.label()).small());
        let mut value = values.get(element.id()).cloned().unwrap_or_default();
        let widget = if original.chars().count() > MULTILINE_THRESHOLD_CHARS {
            egui::TextEdit::multiline(&mut value)
                .desired_rows(3)
                .hint_text(original)
        } else {
            egui::TextEdit::singleline(&mut value).hint_text(original)
        };
        if ui.add(widget.desired_width(f32::INFINITY)).changed() {
            values.insert(element.id().to_string(), value);
            changed = true;
        }
        ui.add_space(6.0);
    }
    changed
}

/// Image-zone editor with its per-zone thumbnail texture cache.
#[derive(Default)]
pub struct ImageZoneEditor {
    thumbs: HashMap<String, TextureHandle>,
    /// Thumbnails decoded on a worker, waiting for texture upload.
    pending: Vec<(String, RgbaImage)>,
}

impl ImageZoneEditor {
    /// Drop all cached and pending thumbnails (template switch).
    pub fn clear(&mut self) {
        self.thumbs.clear();
        self.pending.clear();
    }

    /// Queue a decoded upload thumbnail for texture creation on the next
    /// frame.
    pub fn set_thumbnail(&mut self, zone_id: &str, thumbnail: RgbaImage) {
        self.pending.push((zone_id.to_string(), thumbnail));
    }

    /// Render one slot per detected image zone.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        document: &TemplateDocument,
        zones: &mut ZoneImages,
    ) -> Option<EditorEvent> {
        for (zone_id, rgba) in self.pending.drain(..) {
            let size = [rgba.width() as usize, rgba.height() as usize];
            let img = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            let tex = ui
                .ctx()
                .load_texture(format!("zone-thumb-{}", zone_id), img, TextureOptions::LINEAR);
            self.thumbs.insert(zone_id, tex);
        }

        let images: Vec<_> = document.image_elements().collect();
        if images.is_empty() {
            ui.label(
                RichText::new("No image placeholders detected in this template")
                    .weak()
                    .small(),
            );
            return None;
        }

        let mut event = None;
        ui.horizontal_wrapped(|ui| {
            for element in images {
                let id = element.id().to_string();
                ui.vertical(|ui| {
                    ui.label(RichText::new(element.label()).small());
                    if zones.contains_key(&id) {
                        if let Some(tex) = self.thumbs.get(&id) {
                            ui.image((tex.id(), Vec2::splat(ZONE_SLOT_SIZE)));
                        } else {
                            let (rect, _) = ui.allocate_exact_size(
                                Vec2::splat(ZONE_SLOT_SIZE),
                                egui::Sense::hover(),
                            );
                            ui.painter()
                                .rect_filled(rect, 4.0, ui.visuals().extreme_bg_color);
                        }
                        if ui.small_button("Remove").clicked() {
                            zones.remove(&id);
                            self.thumbs.remove(&id);
                            event = Some(EditorEvent::Changed);
                        }
                    } else {
                        let (rect, response) = ui.allocate_exact_size(
                            Vec2::splat(ZONE_SLOT_SIZE),
                            egui::Sense::click(),
                        );
                        let stroke = if response.hovered() {
                            egui::Stroke::new(1.5, ui.visuals().selection.bg_fill)
                        } else {
                            ui.visuals().widgets.noninteractive.bg_stroke
                        };
                        ui.painter().rect_stroke(rect, 4.0, stroke);
                        ui.painter().text(
                            rect.center(),
                            egui::Align2::CENTER_CENTER,
                            "Upload",
                            egui::FontId::proportional(11.0),
                            ui.visuals().weak_text_color(),
                        );
                        if response.clicked() {
                            event = Some(EditorEvent::PickImage(id.clone()));
                        }
                    }
                });
                ui.add_space(8.0);
            }
        });
        event
    }
}
