//! Point symbols for placing imported models with the sketch tool.

use catalog::{ModelRecord, PresetModel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointSymbolType {
    #[serde(rename = "point-3d")]
    Point3d,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolLayerType {
    #[serde(rename = "object")]
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSymbolLayer {
    #[serde(rename = "type")]
    pub kind: SymbolLayerType,
    pub resource: Resource,
    /// Meters. Unset keeps the model's own size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// `{ "type": "point-3d", "symbolLayers": [{ "type": "object", "resource": { "href": .. } }] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSymbol {
    #[serde(rename = "type")]
    pub kind: PointSymbolType,
    pub symbol_layers: Vec<ObjectSymbolLayer>,
}

impl ObjectSymbol {
    pub fn for_model(href: impl Into<String>, height: Option<f64>) -> Self {
        Self {
            kind: PointSymbolType::Point3d,
            symbol_layers: vec![ObjectSymbolLayer {
                kind: SymbolLayerType::Object,
                resource: Resource { href: href.into() },
                height,
            }],
        }
    }

    pub fn href(&self) -> Option<&str> {
        self.symbol_layers.first().map(|l| l.resource.href.as_str())
    }
}

/// Where a model to place comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    Preset(PresetModel),
    /// The `url` returned by a fresh upload.
    Uploaded { url: String },
    Stored(ModelRecord),
}

impl ModelSource {
    pub fn href(&self) -> &str {
        match self {
            ModelSource::Preset(p) => p.url,
            ModelSource::Uploaded { url } => url,
            ModelSource::Stored(record) => &record.url,
        }
    }

    pub fn height(&self) -> Option<f64> {
        match self {
            ModelSource::Preset(p) => Some(p.height),
            _ => None,
        }
    }

    pub fn symbol(&self) -> ObjectSymbol {
        ObjectSymbol::for_model(self.href(), self.height())
    }
}
