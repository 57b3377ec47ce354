//! End-to-end flow over the real shipped template assets:
//! load → detect → edit → compose → export.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use stencilfe::io;
use stencilfe::ops::export::{self, CANVAS_HEIGHT, CANVAS_WIDTH};
use stencilfe::registry::{self, TEMPLATES};
use stencilfe::session::{ExportRequest, Session};
use stencilfe::svg::{compose, parse_template};

fn asset_path(file: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("templates")
        .join(file)
}

#[test]
fn every_shipped_template_detects_something() {
    for def in TEMPLATES {
        let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
        let doc = parse_template(&markup).unwrap();
        assert!(
            doc.image_count() > 0 || doc.text_count() > 0,
            "template {} detected nothing",
            def.id
        );
        // The shipped assets carry at least as many image nodes as the
        // registry declares zones for.
        assert!(doc.image_count() >= def.zones.len(), "template {}", def.id);
    }
}

#[test]
fn detection_is_stable_across_reparses_of_shipped_assets() {
    for def in TEMPLATES {
        let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
        let a = parse_template(&markup).unwrap();
        let b = parse_template(&markup).unwrap();
        let ids_a: Vec<&str> = a.elements().iter().map(|e| e.id()).collect();
        let ids_b: Vec<&str> = b.elements().iter().map(|e| e.id()).collect();
        assert_eq!(ids_a, ids_b, "template {}", def.id);
    }
}

#[test]
fn full_generate_flow_produces_a_square_png() {
    let def = registry::find("robot-update").unwrap();
    let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
    let tpl = parse_template(&markup).unwrap();

    let mut session = Session::new(def.id);
    session.document = Some(tpl);

    // Edit the first detected text element.
    let first_text = session
        .document
        .as_ref()
        .unwrap()
        .text_elements()
        .next()
        .unwrap()
        .id()
        .to_string();
    session
        .fields
        .insert(first_text.clone(), "Week 4 drive train".to_string());

    let doc = session.document.as_ref().unwrap();
    let composed = compose(doc, &session.fields, &session.zones);
    assert!(composed.to_markup().contains("Week 4 drive train"));
    session.set_exportable(composed);

    let req = session.begin_export("sprint-review").unwrap();
    assert!(session.is_exporting());
    let outcome = export::run(req);
    let graphic = session.finish_export(outcome).unwrap();

    assert_eq!(graphic.filename, "sprint-review.png");
    assert_eq!(graphic.template_id, "robot-update");
    let img = image::load_from_memory(&graphic.png).unwrap().into_rgba8();
    assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
    assert!(!session.is_exporting());
    assert_eq!(session.graphics().len(), 1);
}

#[test]
fn export_succeeds_with_empty_zone_images() {
    let def = registry::find("subteam-week").unwrap();
    let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
    let tpl = parse_template(&markup).unwrap();
    assert!(tpl.image_count() >= 2);

    let composed = compose(&tpl, &HashMap::new(), &HashMap::new());
    let mut doc = composed;
    doc.set_root_size(CANVAS_WIDTH, CANVAS_HEIGHT);
    let png = export::render_png(&doc.to_markup()).unwrap();
    let img = image::load_from_memory(&png).unwrap().into_rgba8();
    assert_eq!(img.dimensions(), (CANVAS_WIDTH, CANVAS_HEIGHT));
}

#[test]
fn uploaded_photo_round_trips_into_the_composition() {
    use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};

    let dir = tempfile::tempdir().unwrap();
    let photo_path = dir.path().join("upload.png");
    let photo = image::RgbaImage::from_pixel(8, 8, image::Rgba([0, 120, 240, 255]));
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(photo.as_raw(), 8, 8, ColorType::Rgba8)
        .unwrap();
    std::fs::write(&photo_path, bytes).unwrap();

    let upload = io::load_uploaded_image(&photo_path).unwrap();

    let def = registry::find("fun-fact").unwrap();
    let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
    let tpl = parse_template(&markup).unwrap();

    let mut zones = HashMap::new();
    zones.insert("image-0".to_string(), upload.data_uri.clone());
    let composed = compose(&tpl, &HashMap::new(), &zones);
    assert!(composed.to_markup().contains(&upload.data_uri));

    // The embedded data URI must survive rasterization.
    let mut doc = composed;
    doc.set_root_size(CANVAS_WIDTH, CANVAS_HEIGHT);
    assert!(export::render_png(&doc.to_markup()).is_ok());
}

#[test]
fn generated_png_can_be_written_to_disk() {
    let def = registry::find("meet-mentor").unwrap();
    let markup = io::load_template_markup(&asset_path(def.asset_file)).unwrap();
    let tpl = parse_template(&markup).unwrap();

    let composed = compose(&tpl, &HashMap::new(), &HashMap::new());
    let req = ExportRequest {
        markup: {
            let mut doc = composed;
            doc.set_root_size(CANVAS_WIDTH, CANVAS_HEIGHT);
            doc.to_markup()
        },
        template_id: def.id.to_string(),
        filename: String::new(),
    };
    let graphic = export::run(req).unwrap();
    assert!(graphic.filename.starts_with("meet-mentor-"));

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(&graphic.filename);
    let written = io::write_png(&out, &graphic.png).unwrap();
    assert_eq!(std::fs::read(written).unwrap(), graphic.png);
}
