//! Live preview panel — rasterizes the current composition to an egui
//! texture and redraws it whenever the composition changes.

use eframe::egui;
use egui::{Color32, ColorImage, RichText, TextureHandle, TextureOptions, Vec2};

use crate::ops::export;

/// On-screen preview resolution. Display size only; export resolution is
/// fixed independently of this.
const PREVIEW_SIZE: u32 = 540;

#[derive(Default)]
pub struct PreviewPanel {
    markup: Option<String>,
    dirty: bool,
    texture: Option<TextureHandle>,
    render_error: Option<String>,
}

impl PreviewPanel {
    /// Install newly composed markup; rasterized lazily on the next frame.
    pub fn set_markup(&mut self, markup: String) {
        self.markup = Some(markup);
        self.dirty = true;
    }

    /// Drop all preview state (template switch).
    pub fn clear(&mut self) {
        self.markup = None;
        self.dirty = false;
        self.texture = None;
        self.render_error = None;
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        loading: bool,
        load_error: Option<&str>,
        detected: Option<(usize, usize)>,
    ) {
        if self.dirty {
            self.rasterize(ui.ctx());
        }

        if loading {
            ui.group(|ui| {
                ui.set_min_size(Vec2::new(ui.available_width(), 200.0));
                ui.centered_and_justified(|ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new("Loading template...").weak());
                    });
                });
            });
            return;
        }

        if let Some(err) = load_error {
            ui.group(|ui| {
                ui.set_min_size(Vec2::new(ui.available_width(), 200.0));
                ui.vertical_centered(|ui| {
                    ui.colored_label(ui.visuals().error_fg_color, "Error loading template");
                    ui.label(RichText::new(err).small().weak());
                });
            });
            return;
        }

        if let Some(tex) = &self.texture {
            let side = ui.available_width().min(PREVIEW_SIZE as f32);
            let response = ui.image((tex.id(), Vec2::splat(side)));
            // LIVE PREVIEW badge in the top-left corner.
            let badge_pos = response.rect.left_top() + Vec2::new(8.0, 8.0);
            let painter = ui.painter();
            let galley = painter.layout_no_wrap(
                "LIVE PREVIEW".to_string(),
                egui::FontId::proportional(10.0),
                Color32::from_white_alpha(210),
            );
            let badge_rect =
                egui::Rect::from_min_size(badge_pos, galley.size() + Vec2::new(10.0, 6.0));
            painter.rect_filled(badge_rect, 4.0, Color32::from_black_alpha(160));
            painter.galley(badge_rect.min + Vec2::new(5.0, 3.0), galley);
        } else if let Some(err) = &self.render_error {
            ui.colored_label(ui.visuals().error_fg_color, "Preview unavailable");
            ui.label(RichText::new(err.as_str()).small().weak());
        }

        if let Some((images, texts)) = detected {
            ui.label(
                RichText::new(format!(
                    "Detected: {} image(s), {} text element(s)",
                    images, texts
                ))
                .small()
                .weak(),
            );
        }
    }

    fn rasterize(&mut self, ctx: &egui::Context) {
        self.dirty = false;
        let Some(markup) = &self.markup else {
            return;
        };
        match export::rasterize_rgba(markup, PREVIEW_SIZE, PREVIEW_SIZE) {
            Ok(rgba) => {
                let img = ColorImage::from_rgba_unmultiplied(
                    [PREVIEW_SIZE as usize, PREVIEW_SIZE as usize],
                    &rgba,
                );
                self.texture = Some(ctx.load_texture("live-preview", img, TextureOptions::LINEAR));
                self.render_error = None;
            }
            Err(e) => {
                // The exportable holder stays written; export will surface
                // its own RenderError if triggered.
                self.texture = None;
                self.render_error = Some(e.to_string());
                crate::log_warn!("preview rasterization failed: {}", e);
            }
        }
    }
}
