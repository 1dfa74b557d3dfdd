use serde::Serialize;

/// A model bundled with the static assets, offered without an upload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PresetModel {
    pub name: &'static str,
    pub url: &'static str,
    /// Default placement height in meters.
    pub height: f64,
}

pub const PRESET_MODELS: &[PresetModel] = &[
    PresetModel {
        name: "Tree",
        url: "/static/tree.glb",
        height: 5.0,
    },
    PresetModel {
        name: "Pine Tree",
        url: "/static/pine_tree.glb",
        height: 7.0,
    },
    PresetModel {
        name: "Wall",
        url: "/static/wall.glb",
        height: 3.0,
    },
];

pub fn find_preset(name: &str) -> Option<&'static PresetModel> {
    PRESET_MODELS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}
