/// Pixel edge of a square tile served by both providers.
pub const TILE_SIZE: u32 = 256;
pub const MAX_ZOOM: u32 = 18;

pub const OSM_LAYER_ID: &str = "osm";
pub const OPEN_TOPO_LAYER_ID: &str = "opentopomap";

/// A URL-templated raster tile layer registered on each customized map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayerSpec {
    pub id: &'static str,
    pub name: &'static str,
    /// `{z}`, `{x}` and `{y}` are substituted per tile.
    pub url_template: &'static str,
    pub tile_size: u32,
    pub max_zoom: u32,
}

pub const OPEN_TOPO_MAP: TileLayerSpec = TileLayerSpec {
    id: OPEN_TOPO_LAYER_ID,
    name: "OTM",
    url_template: "https://c.tile.opentopomap.org/{z}/{x}/{y}.png",
    tile_size: TILE_SIZE,
    max_zoom: MAX_ZOOM,
};

pub const OPEN_STREET_MAP: TileLayerSpec = TileLayerSpec {
    id: OSM_LAYER_ID,
    name: "OSM",
    url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
    tile_size: TILE_SIZE,
    max_zoom: MAX_ZOOM,
};

/// Layers in registration order.
pub const CUSTOM_LAYERS: [TileLayerSpec; 2] = [OPEN_TOPO_MAP, OPEN_STREET_MAP];

impl TileLayerSpec {
    /// Image URL for the tile at `(x, y)` on zoom level `zoom`.
    ///
    /// Coordinates are passed through as the library hands them over; the
    /// library already wraps them into the valid range for the zoom level.
    pub fn tile_url(&self, zoom: u32, x: i64, y: i64) -> String {
        self.url_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osm_url_follows_slippy_map_layout() {
        assert_eq!(
            OPEN_STREET_MAP.tile_url(3, 4, 2),
            "https://tile.openstreetmap.org/3/4/2.png"
        );
    }

    #[test]
    fn open_topo_url_uses_c_subdomain() {
        assert_eq!(
            OPEN_TOPO_MAP.tile_url(12, 2143, 1437),
            "https://c.tile.opentopomap.org/12/2143/1437.png"
        );
    }

    #[test]
    fn custom_layers_have_unique_ids() {
        assert_ne!(CUSTOM_LAYERS[0].id, CUSTOM_LAYERS[1].id);
        assert!(CUSTOM_LAYERS.iter().all(|layer| layer.tile_size == 256));
        assert!(CUSTOM_LAYERS.iter().all(|layer| layer.max_zoom == 18));
    }
}
