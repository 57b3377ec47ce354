//! Template registry — the compiled-in table of available graphic templates.
//!
//! Declared fields/zones are authoring hints shown on the selector cards
//! ("2 fields · 1 photo"). The editors themselves are driven by runtime
//! detection of the SVG asset, so a template whose asset gains an extra
//! text run keeps working without a registry change.

use std::path::PathBuf;

/// A declared text placeholder of a template.
#[derive(Debug)]
pub struct TextFieldDef {
    pub id: &'static str,
    pub label: &'static str,
    pub placeholder: &'static str,
    pub multiline: bool,
}

/// A declared photo placeholder of a template.
#[derive(Debug)]
pub struct ImageZoneDef {
    pub id: &'static str,
    pub label: &'static str,
}

/// One entry of the template registry. Immutable, compiled in, never mutated.
#[derive(Debug)]
pub struct TemplateDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// File name under the templates directory, e.g. `robot-update.svg`.
    pub asset_file: &'static str,
    pub fields: &'static [TextFieldDef],
    pub zones: &'static [ImageZoneDef],
}

impl TemplateDefinition {
    /// Short "2 fields · 1 photo" summary for the selector card.
    pub fn summary(&self) -> String {
        format!(
            "{} field{} · {} photo{}",
            self.fields.len(),
            if self.fields.len() == 1 { "" } else { "s" },
            self.zones.len(),
            if self.zones.len() == 1 { "" } else { "s" },
        )
    }
}

pub const TEMPLATES: &[TemplateDefinition] = &[
    TemplateDefinition {
        id: "robot-update",
        name: "Robot Updates",
        description: "Share robot progress and updates",
        asset_file: "robot-update.svg",
        fields: &[
            TextFieldDef {
                id: "title",
                label: "Title",
                placeholder: "Robot Update Title",
                multiline: false,
            },
            TextFieldDef {
                id: "bodyText",
                label: "Body Text",
                placeholder: "Add update details...",
                multiline: true,
            },
        ],
        zones: &[ImageZoneDef {
            id: "mainImage",
            label: "Main Photo",
        }],
    },
    TemplateDefinition {
        id: "subteam-week",
        name: "Subteam of the Week",
        description: "Highlight a subteam and their work",
        asset_file: "subteam-week.svg",
        fields: &[TextFieldDef {
            id: "subteamName",
            label: "Subteam Name",
            placeholder: "SUBTEAM",
            multiline: false,
        }],
        zones: &[
            ImageZoneDef {
                id: "photo1",
                label: "Left Photo",
            },
            ImageZoneDef {
                id: "photo2",
                label: "Right Photo",
            },
        ],
    },
    TemplateDefinition {
        id: "meet-mentor",
        name: "Meet the Mentor",
        description: "Introduce team mentors",
        asset_file: "meet-mentor.svg",
        fields: &[
            TextFieldDef {
                id: "mentorName",
                label: "Mentor Name",
                placeholder: "Name!",
                multiline: false,
            },
            TextFieldDef {
                id: "bio",
                label: "Bio",
                placeholder: "Enter mentor bio...",
                multiline: true,
            },
        ],
        zones: &[ImageZoneDef {
            id: "mentorPhoto",
            label: "Mentor Photo",
        }],
    },
    TemplateDefinition {
        id: "fun-fact",
        name: "Fun Fact of the Week",
        description: "Share interesting facts about the team",
        asset_file: "fun-fact.svg",
        fields: &[TextFieldDef {
            id: "factText",
            label: "Fun Fact",
            placeholder: "Enter an interesting fact...",
            multiline: true,
        }],
        zones: &[ImageZoneDef {
            id: "factPhoto",
            label: "Photo",
        }],
    },
    TemplateDefinition {
        id: "crew-week",
        name: "Crew of the Week",
        description: "Feature team members",
        asset_file: "crew-week.svg",
        fields: &[
            TextFieldDef {
                id: "crew1Name",
                label: "Crew Member 1 Name",
                placeholder: "Name...",
                multiline: false,
            },
            TextFieldDef {
                id: "crew1Info",
                label: "Crew Member 1 Info",
                placeholder: "Details...",
                multiline: true,
            },
            TextFieldDef {
                id: "crew2Name",
                label: "Crew Member 2 Name",
                placeholder: "Name...",
                multiline: false,
            },
            TextFieldDef {
                id: "crew2Info",
                label: "Crew Member 2 Info",
                placeholder: "Details...",
                multiline: true,
            },
        ],
        zones: &[
            ImageZoneDef {
                id: "crewPhoto1",
                label: "Crew Photo 1",
            },
            ImageZoneDef {
                id: "crewPhoto2",
                label: "Crew Photo 2",
            },
        ],
    },
];

/// Look up a template definition by id.
pub fn find(id: &str) -> Option<&'static TemplateDefinition> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Resolve the on-disk templates directory.
///
/// A non-empty settings override wins; otherwise probe `./templates`, then
/// `<exe dir>/templates`. Falls back to `./templates` so a missing directory
/// surfaces as a normal load error rather than a panic.
pub fn templates_dir(settings_override: &str) -> PathBuf {
    if !settings_override.is_empty() {
        return PathBuf::from(settings_override);
    }
    let cwd = PathBuf::from("templates");
    if cwd.is_dir() {
        return cwd;
    }
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let beside_exe = dir.join("templates");
        if beside_exe.is_dir() {
            return beside_exe;
        }
    }
    cwd
}

/// Full path of a template's SVG asset.
pub fn asset_path(def: &TemplateDefinition, settings_override: &str) -> PathBuf {
    templates_dir(settings_override).join(def.asset_file)
}
