//! Top-level application: owns the session, the UI components, and the
//! background job pipeline.
//!
//! All background work (template loads, exports, photo decodes, disk writes)
//! runs on `rayon::spawn` and delivers exactly one message over an mpsc
//! channel, polled with `try_recv` each frame. Template-load receipts carry a
//! monotonic token; a receipt with a stale token or a template id that no
//! longer matches the current selection is discarded.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui;
use egui::RichText;

use crate::components::editors::{self, EditorEvent, ImageZoneEditor};
use crate::components::gallery::{GalleryEvent, GalleryPanel};
use crate::components::preview::PreviewPanel;
use crate::components::templates;
use crate::io::{self, LoadError, UploadedImage};
use crate::ops::export::{self, ExportError};
use crate::registry::{self, TEMPLATES};
use crate::session::{GeneratedGraphic, Session};
use crate::settings::{AppSettings, ThemeMode};
use crate::svg::{self, TemplateDocument};

/// How long a status-bar notification stays visible, in seconds.
const STATUS_SECONDS: f64 = 4.0;

/// Result delivered from a background job.
enum JobMsg {
    TemplateLoaded {
        token: u64,
        template_id: String,
        document: TemplateDocument,
    },
    TemplateFailed {
        token: u64,
        template_id: String,
        error: LoadError,
    },
    ExportSettled(Result<GeneratedGraphic, ExportError>),
    UploadDecoded {
        /// Template selected when the picker opened; mismatched receipts
        /// are stale and discarded.
        template_id: String,
        zone_id: String,
        result: Result<UploadedImage, String>,
    },
    SaveSettled {
        filename: String,
        result: Result<PathBuf, String>,
    },
}

pub struct StencilApp {
    settings: AppSettings,
    session: Session,

    zone_editor: ImageZoneEditor,
    preview: PreviewPanel,
    gallery: GalleryPanel,

    /// Raw output-filename input; survives template switches.
    filename_input: String,

    loading: bool,
    /// Inline preview error for unreadable assets.
    load_error: Option<String>,
    /// Muted note for assets that read but did not parse; editors degrade to
    /// their empty states instead of hard-failing.
    parse_note: Option<String>,
    /// Monotonic load token; stale receipts are discarded.
    load_token: u64,

    job_tx: Sender<JobMsg>,
    job_rx: Receiver<JobMsg>,

    /// Transient status-bar notification: message + expiry time.
    status: Option<(String, f64)>,
    confirm_clear_open: bool,
    settings_open: bool,
}

impl StencilApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        apply_theme(&cc.egui_ctx, settings.theme_mode);

        let (job_tx, job_rx) = mpsc::channel();
        let mut app = Self {
            settings,
            session: Session::new(TEMPLATES[0].id),
            zone_editor: ImageZoneEditor::default(),
            preview: PreviewPanel::default(),
            gallery: GalleryPanel::default(),
            filename_input: String::new(),
            loading: false,
            load_error: None,
            parse_note: None,
            load_token: 0,
            job_tx,
            job_rx,
            status: None,
            confirm_clear_open: false,
            settings_open: false,
        };
        app.begin_template_load(&cc.egui_ctx);
        app
    }

    // -- Background jobs ---------------------------------------------------

    fn begin_template_load(&mut self, ctx: &egui::Context) {
        self.load_token = self.load_token.wrapping_add(1);
        let token = self.load_token;
        self.loading = true;
        self.load_error = None;
        self.parse_note = None;

        let template_id = self.session.template_id.clone();
        let Some(def) = registry::find(&template_id) else {
            self.loading = false;
            self.load_error = Some(format!("Unknown template '{}'", template_id));
            return;
        };
        let path = registry::asset_path(def, &self.settings.templates_dir);
        crate::log_info!("loading template '{}' from {}", template_id, path.display());

        let tx = self.job_tx.clone();
        let ctx = ctx.clone();
        rayon::spawn(move || {
            let result = io::load_template_markup(&path)
                .and_then(|markup| svg::parse_template(&markup).map_err(LoadError::from));
            let msg = match result {
                Ok(document) => JobMsg::TemplateLoaded {
                    token,
                    template_id,
                    document,
                },
                Err(error) => JobMsg::TemplateFailed {
                    token,
                    template_id,
                    error,
                },
            };
            let _ = tx.send(msg);
            ctx.request_repaint();
        });
    }

    fn trigger_export(&mut self, ctx: &egui::Context) {
        match self.session.begin_export(&self.filename_input) {
            Ok(req) => {
                crate::log_info!("export started for template '{}'", req.template_id);
                let tx = self.job_tx.clone();
                let ctx = ctx.clone();
                rayon::spawn(move || {
                    let _ = tx.send(JobMsg::ExportSettled(export::run(req)));
                    ctx.request_repaint();
                });
            }
            Err(ExportError::Busy) => {
                crate::log_warn!("export trigger ignored: one already in flight");
            }
            Err(e) => {
                crate::log_warn!("export rejected: {}", e);
                self.set_status(ctx, &e.to_string());
            }
        }
    }

    fn pick_zone_image(&mut self, ctx: &egui::Context, zone_id: String) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", io::UPLOAD_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        let template_id = self.session.template_id.clone();
        let tx = self.job_tx.clone();
        let ctx = ctx.clone();
        rayon::spawn(move || {
            let result = io::load_uploaded_image(&path);
            let _ = tx.send(JobMsg::UploadDecoded {
                template_id,
                zone_id,
                result,
            });
            ctx.request_repaint();
        });
    }

    fn prompt_save(&mut self, ctx: &egui::Context, graphic_id: &str) {
        let Some(graphic) = self.session.graphic(graphic_id) else {
            return;
        };
        let filename = graphic.filename.clone();
        let png = graphic.png.clone();
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .set_file_name(&filename)
            .save_file()
        else {
            return;
        };
        let tx = self.job_tx.clone();
        let ctx = ctx.clone();
        rayon::spawn(move || {
            let result = io::write_png(&path, &png);
            let _ = tx.send(JobMsg::SaveSettled { filename, result });
            ctx.request_repaint();
        });
    }

    fn process_jobs(&mut self, ctx: &egui::Context) {
        while let Ok(msg) = self.job_rx.try_recv() {
            match msg {
                JobMsg::TemplateLoaded {
                    token,
                    template_id,
                    document,
                } => {
                    if token != self.load_token || template_id != self.session.template_id {
                        crate::log_info!("discarding stale load of '{}'", template_id);
                        continue;
                    }
                    self.loading = false;
                    crate::log_info!(
                        "template '{}' ready: {} image(s), {} text element(s)",
                        template_id,
                        document.image_count(),
                        document.text_count()
                    );
                    self.session.document = Some(document);
                    self.refresh_preview();
                }
                JobMsg::TemplateFailed {
                    token,
                    template_id,
                    error,
                } => {
                    if token != self.load_token || template_id != self.session.template_id {
                        crate::log_info!("discarding stale load failure of '{}'", template_id);
                        continue;
                    }
                    self.loading = false;
                    crate::log_err!("template '{}' failed: {}", template_id, error);
                    match error {
                        LoadError::Fetch(_) => self.load_error = Some(error.to_string()),
                        // Unparseable assets degrade to "nothing detected".
                        LoadError::Parse(_) => self.parse_note = Some(error.to_string()),
                    }
                }
                JobMsg::ExportSettled(outcome) => {
                    let settled = match self.session.finish_export(outcome) {
                        Ok(g) => Ok((g.id.clone(), g.filename.clone())),
                        Err(e) => Err(e.to_string()),
                    };
                    match settled {
                        Ok((id, filename)) => {
                            crate::log_info!("export finished: {}", filename);
                            self.set_status(ctx, &format!("Generated {}", filename));
                            if self.settings.prompt_save {
                                self.prompt_save(ctx, &id);
                            }
                        }
                        Err(msg) => {
                            crate::log_err!("export failed: {}", msg);
                            self.set_status(ctx, &msg);
                        }
                    }
                }
                JobMsg::UploadDecoded {
                    template_id,
                    zone_id,
                    result,
                } => match result {
                    Ok(upload) => {
                        if !self
                            .session
                            .apply_upload(&template_id, &zone_id, upload.data_uri)
                        {
                            crate::log_info!(
                                "discarding stale photo upload for '{}'",
                                template_id
                            );
                            continue;
                        }
                        self.zone_editor.set_thumbnail(&zone_id, upload.thumbnail);
                        self.refresh_preview();
                    }
                    Err(e) => {
                        crate::log_warn!("photo upload rejected: {}", e);
                        self.set_status(ctx, &e);
                    }
                },
                JobMsg::SaveSettled { filename, result } => match result {
                    Ok(path) => {
                        crate::log_info!("saved {} to {}", filename, path.display());
                        self.set_status(ctx, &format!("Saved {}", filename));
                    }
                    Err(e) => {
                        crate::log_err!("save of {} failed: {}", filename, e);
                        self.set_status(ctx, &format!("Save failed: {}", e));
                    }
                },
            }
        }
    }

    // -- State transitions -------------------------------------------------

    /// Compose the current edits and publish the result: markup to the
    /// preview panel, the composed document to the session's exportable
    /// holder. The only writer of that holder.
    fn refresh_preview(&mut self) {
        let Some(doc) = &self.session.document else {
            return;
        };
        let composed = svg::compose(doc, &self.session.fields, &self.session.zones);
        self.preview.set_markup(composed.to_markup());
        self.session.set_exportable(composed);
    }

    fn switch_template(&mut self, ctx: &egui::Context, template_id: &str) {
        crate::log_info!("switching template to '{}'", template_id);
        self.session.select_template(template_id);
        self.zone_editor.clear();
        self.preview.clear();
        self.begin_template_load(ctx);
    }

    fn set_status(&mut self, ctx: &egui::Context, msg: &str) {
        let now = ctx.input(|i| i.time);
        self.status = Some((msg.to_string(), now + STATUS_SECONDS));
    }

    fn copy_to_clipboard(&mut self, ctx: &egui::Context, graphic_id: &str) {
        let result = match self.session.graphic(graphic_id) {
            Some(graphic) => copy_png_to_clipboard(&graphic.png),
            None => return,
        };
        match result {
            Ok(()) => self.set_status(ctx, "Copied to clipboard"),
            Err(e) => {
                crate::log_warn!("clipboard copy failed: {}", e);
                self.set_status(ctx, &format!("Copy failed: {}", e));
            }
        }
    }

    // -- Layout ------------------------------------------------------------

    fn show_editor_column(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.label(RichText::new("1. Select Template").strong());
        ui.add_space(4.0);
        let selected = self.session.template_id.clone();
        if let Some(id) = templates::show(ui, &selected) {
            self.switch_template(ctx, id);
        }
        ui.add_space(10.0);

        let mut step = 2;
        let counts = self
            .session
            .document
            .as_ref()
            .map(|d| (d.image_count(), d.text_count()));

        if let Some((images, texts)) = counts {
            if images > 0 {
                ui.label(
                    RichText::new(format!("{}. Upload Photos ({} found)", step, images)).strong(),
                );
                step += 1;
                ui.add_space(4.0);
                let event = ui
                    .group(|ui| match self.session.document.as_ref() {
                        Some(doc) => self.zone_editor.show(ui, doc, &mut self.session.zones),
                        None => None,
                    })
                    .inner;
                match event {
                    Some(EditorEvent::Changed) => self.refresh_preview(),
                    Some(EditorEvent::PickImage(zone_id)) => self.pick_zone_image(ctx, zone_id),
                    None => {}
                }
                ui.add_space(10.0);
            }
            if texts > 0 {
                ui.label(
                    RichText::new(format!("{}. Enter Content ({} found)", step, texts)).strong(),
                );
                step += 1;
                ui.add_space(4.0);
                let changed = ui
                    .group(|ui| match self.session.document.as_ref() {
                        Some(doc) => editors::show_text_fields(ui, doc, &mut self.session.fields),
                        None => false,
                    })
                    .inner;
                if changed {
                    self.refresh_preview();
                }
                ui.add_space(10.0);
            }
        }

        ui.label(RichText::new(format!("{}. Generate", step)).strong());
        ui.add_space(4.0);
        ui.group(|ui| {
            ui.label(RichText::new("Output Filename").small());
            ui.add(
                egui::TextEdit::singleline(&mut self.filename_input)
                    .hint_text("my-graphic")
                    .desired_width(f32::INFINITY),
            );
            ui.label(
                RichText::new(".png will be added automatically")
                    .small()
                    .weak(),
            );
            ui.add_space(6.0);

            let busy = self.session.is_exporting();
            let ready = self.session.has_exportable();
            ui.horizontal(|ui| {
                if busy {
                    ui.spinner();
                }
                let label = if busy { "Generating..." } else { "Generate" };
                if ui
                    .add_enabled(!busy && ready, egui::Button::new(label))
                    .clicked()
                {
                    self.trigger_export(ctx);
                }
            });
        });
    }

    fn show_output_column(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.label(RichText::new("Live Preview").strong());
        ui.add_space(4.0);
        let counts = self
            .session
            .document
            .as_ref()
            .map(|d| (d.image_count(), d.text_count()));
        self.preview
            .show(ui, self.loading, self.load_error.as_deref(), counts);
        if let Some(note) = &self.parse_note {
            ui.label(RichText::new(note.as_str()).small().weak());
        }
        ui.add_space(12.0);

        let event = self.gallery.show(ui, self.session.graphics());
        match event {
            Some(GalleryEvent::Save(id)) => self.prompt_save(ctx, &id),
            Some(GalleryEvent::Copy(id)) => self.copy_to_clipboard(ctx, &id),
            Some(GalleryEvent::ClearAll) => {
                if self.settings.confirm_clear {
                    self.confirm_clear_open = true;
                } else {
                    self.session.clear_graphics();
                }
            }
            None => {}
        }
    }

    fn show_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.settings_open;
        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                let before = self.settings.clone();

                ui.label(RichText::new("Theme").small());
                ui.horizontal(|ui| {
                    ui.radio_value(&mut self.settings.theme_mode, ThemeMode::Light, "Light");
                    ui.radio_value(&mut self.settings.theme_mode, ThemeMode::Dark, "Dark");
                });
                ui.add_space(6.0);

                ui.label(RichText::new("Templates directory (blank = auto)").small());
                ui.add(
                    egui::TextEdit::singleline(&mut self.settings.templates_dir)
                        .desired_width(260.0),
                );
                ui.label(
                    RichText::new("Takes effect on the next template load")
                        .small()
                        .weak(),
                );
                ui.add_space(6.0);

                ui.checkbox(
                    &mut self.settings.prompt_save,
                    "Offer to save after generating",
                );
                ui.checkbox(
                    &mut self.settings.confirm_clear,
                    "Confirm before clearing graphics",
                );

                if self.settings != before {
                    if self.settings.theme_mode != before.theme_mode {
                        apply_theme(ctx, self.settings.theme_mode);
                    }
                    self.settings.save();
                }
            });
        self.settings_open = open;
    }

    fn show_confirm_clear(&mut self, ctx: &egui::Context) {
        if !self.confirm_clear_open {
            return;
        }
        egui::Window::new("Clear generated graphics?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("This removes every graphic generated this session.");
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Clear All").clicked() {
                        self.session.clear_graphics();
                        self.confirm_clear_open = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.confirm_clear_open = false;
                    }
                });
            });
    }
}

impl eframe::App for StencilApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_jobs(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("StencilFE");
                ui.label(
                    RichText::new("Automated media graphics generator")
                        .small()
                        .weak(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() {
                        self.settings_open = !self.settings_open;
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let mut expired = false;
            if let Some((msg, until)) = &self.status {
                if ctx.input(|i| i.time) < *until {
                    ui.label(msg);
                    ctx.request_repaint_after(std::time::Duration::from_millis(250));
                } else {
                    expired = true;
                }
            } else {
                ui.label(RichText::new("Ready").small().weak());
            }
            if expired {
                self.status = None;
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                egui::ScrollArea::vertical()
                    .id_source("editor-column")
                    .show(&mut cols[0], |ui| self.show_editor_column(ui, ctx));
                egui::ScrollArea::vertical()
                    .id_source("output-column")
                    .show(&mut cols[1], |ui| self.show_output_column(ui, ctx));
            });
        });

        self.show_settings_window(ctx);
        self.show_confirm_clear(ctx);
    }
}

fn apply_theme(ctx: &egui::Context, mode: ThemeMode) {
    ctx.set_visuals(match mode {
        ThemeMode::Light => egui::Visuals::light(),
        ThemeMode::Dark => egui::Visuals::dark(),
    });
}

/// Decode PNG bytes and place the bitmap on the system clipboard.
fn copy_png_to_clipboard(png: &[u8]) -> Result<(), String> {
    let img = image::load_from_memory(png)
        .map_err(|e| e.to_string())?
        .into_rgba8();
    let (width, height) = img.dimensions();
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard
        .set_image(arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: std::borrow::Cow::Owned(img.into_raw()),
        })
        .map_err(|e| e.to_string())?;
    Ok(())
}
