//! Template selector — one card per registry entry, single selection.

use eframe::egui;
use egui::{RichText, Sense};

use crate::registry::TEMPLATES;

/// Render the selector cards. Returns the id of a newly clicked template.
pub fn show(ui: &mut egui::Ui, selected_id: &str) -> Option<&'static str> {
    let mut picked = None;
    for def in TEMPLATES {
        let selected = def.id == selected_id;
        let accent = ui.visuals().selection.bg_fill;
        let frame = egui::Frame::group(ui.style())
            .fill(if selected {
                accent.linear_multiply(0.15)
            } else {
                ui.visuals().faint_bg_color
            })
            .stroke(if selected {
                egui::Stroke::new(1.5, accent)
            } else {
                ui.visuals().widgets.noninteractive.bg_stroke
            });

        let response = frame
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(def.name).strong());
                ui.label(RichText::new(def.description).small().weak());
                ui.label(RichText::new(def.summary()).small().weak());
            })
            .response
            .interact(Sense::click());

        if response.clicked() && !selected {
            picked = Some(def.id);
        }
        ui.add_space(4.0);
    }
    picked
}
