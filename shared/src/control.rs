use serde::{Deserialize, Serialize};

use crate::tiles::{OPEN_TOPO_LAYER_ID, OSM_LAYER_ID};

/// Enumerated values of the mapping library the desired configuration is
/// built from. Resolved from the live library when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConstants {
    pub roadmap: String,
    pub terrain: String,
    pub satellite: String,
    pub hybrid: String,
    pub horizontal_bar: i32,
    pub top_right: i32,
}

impl Default for LibraryConstants {
    fn default() -> Self {
        Self {
            roadmap: "roadmap".into(),
            terrain: "terrain".into(),
            satellite: "satellite".into(),
            hybrid: "hybrid".into(),
            horizontal_bar: 1,
            top_right: 3,
        }
    }
}

/// `mapTypeControlOptions` as the library reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlOptions {
    pub map_type_ids: Vec<String>,
    pub style: i32,
    pub position: i32,
}

/// The map-type control state every customized map is held to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlConfig {
    pub enabled: bool,
    pub options: ControlOptions,
}

impl ControlConfig {
    pub fn desired(constants: &LibraryConstants) -> Self {
        Self {
            enabled: true,
            options: ControlOptions {
                map_type_ids: vec![
                    constants.roadmap.clone(),
                    constants.terrain.clone(),
                    constants.satellite.clone(),
                    constants.hybrid.clone(),
                    OSM_LAYER_ID.to_string(),
                    OPEN_TOPO_LAYER_ID.to_string(),
                ],
                style: constants.horizontal_bar,
                position: constants.top_right,
            },
        }
    }

    /// Field-by-field comparison against what the map currently holds.
    pub fn matches(&self, live: &LiveControls) -> bool {
        if !live.enabled || live.enabled != self.enabled {
            return false;
        }
        let Some(options) = live.options.as_ref() else {
            return false;
        };
        let ids_match = options
            .map_type_ids
            .as_deref()
            .is_some_and(|ids| ids == self.options.map_type_ids.as_slice());
        ids_match
            && options.style == Some(self.options.style)
            && options.position == Some(self.options.position)
    }
}

/// The partially-known options the host may have left on the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveControlOptions {
    pub map_type_ids: Option<Vec<String>>,
    pub style: Option<i32>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveControls {
    pub enabled: bool,
    pub options: Option<LiveControlOptions>,
}

impl From<&ControlConfig> for LiveControls {
    fn from(config: &ControlConfig) -> Self {
        Self {
            enabled: config.enabled,
            options: Some(LiveControlOptions {
                map_type_ids: Some(config.options.map_type_ids.clone()),
                style: Some(config.options.style),
                position: Some(config.options.position),
            }),
        }
    }
}
