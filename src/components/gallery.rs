//! Output gallery — the session's generated graphics, most recent first.

use std::collections::HashMap;

use eframe::egui;
use egui::{ColorImage, RichText, TextureHandle, TextureOptions, Vec2};

use crate::session::GeneratedGraphic;

const THUMB_DISPLAY: f32 = 120.0;

/// What a gallery pass asked the app to do; payloads are graphic ids.
pub enum GalleryEvent {
    Save(String),
    Copy(String),
    ClearAll,
}

#[derive(Default)]
pub struct GalleryPanel {
    thumbs: HashMap<String, TextureHandle>,
}

impl GalleryPanel {
    /// Render the gallery. Renders nothing when the list is empty, matching
    /// the hidden-section treatment of an empty output list.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        graphics: &[GeneratedGraphic],
    ) -> Option<GalleryEvent> {
        if graphics.is_empty() {
            self.thumbs.clear();
            return None;
        }
        self.thumbs
            .retain(|id, _| graphics.iter().any(|g| &g.id == id));

        let mut event = None;
        ui.horizontal(|ui| {
            ui.label(RichText::new("Generated Graphics").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Clear All").clicked() {
                    event = Some(GalleryEvent::ClearAll);
                }
            });
        });
        ui.add_space(4.0);

        for graphic in graphics {
            let tex = self.thumbnail(ui.ctx(), graphic);
            ui.horizontal(|ui| {
                if let Some(tex) = tex {
                    ui.image((tex.id(), Vec2::splat(THUMB_DISPLAY)));
                }
                ui.vertical(|ui| {
                    ui.label(RichText::new(&graphic.filename).strong());
                    ui.label(
                        RichText::new(format!("created {} UTC", clock_time(graphic.created_ms)))
                            .small()
                            .weak(),
                    );
                    ui.horizontal(|ui| {
                        if ui.button("Save PNG…").clicked() {
                            event = Some(GalleryEvent::Save(graphic.id.clone()));
                        }
                        if ui.button("Copy").clicked() {
                            event = Some(GalleryEvent::Copy(graphic.id.clone()));
                        }
                    });
                });
            });
            ui.add_space(6.0);
        }
        event
    }

    /// Cached square thumbnail for one graphic, decoded on first display.
    fn thumbnail(&mut self, ctx: &egui::Context, graphic: &GeneratedGraphic) -> Option<&TextureHandle> {
        if !self.thumbs.contains_key(&graphic.id) {
            let decoded = image::load_from_memory(&graphic.png).ok()?;
            let thumb = decoded.thumbnail(256, 256).into_rgba8();
            let size = [thumb.width() as usize, thumb.height() as usize];
            let img = ColorImage::from_rgba_unmultiplied(size, thumb.as_raw());
            let tex = ctx.load_texture(
                format!("gallery-thumb-{}", graphic.id),
                img,
                TextureOptions::LINEAR,
            );
            self.thumbs.insert(graphic.id.clone(), tex);
        }
        self.thumbs.get(&graphic.id)
    }
}

/// UTC HH:MM:SS of an epoch-milliseconds stamp; shown with a "UTC" suffix
/// so the wall-clock offset is never mistaken for local time.
fn clock_time(ms: u64) -> String {
    let secs = ms / 1000;
    let h = (secs % 86400) / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{:02}:{:02}:{:02}", h, m, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_time_formats_utc_time_of_day() {
        assert_eq!(clock_time(0), "00:00:00");
        // 2023-11-14 22:13:20 UTC
        assert_eq!(clock_time(1_700_000_000_000), "22:13:20");
        // The date part is dropped; only the time of day remains.
        assert_eq!(clock_time(86_400_000 + 3_661_000), "01:01:01");
    }
}
