/// Startup configuration.
///
/// Values come from, in increasing priority: built-in defaults under the
/// platform data directory, an optional TOML file, and command line flags.
/// The resolved [`Config`] is handed to each component's constructor.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::assets::thumbnail::DEFAULT_MAX_DIM;
use crate::error::ConfigError;
use crate::map::{DEFAULT_ZOOM, HEAT_RADIUS};

const DB_FILE_NAME: &str = "customer_locations.db";
const ASSETS_DIR_NAME: &str = "images";

const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
const DEFAULT_TILE_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

/// Map rendering settings
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub zoom: u8,
    pub heat_radius: u32,
    /// Leaflet tile URL template, e.g. `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
    pub tile_url: String,
    /// HTML shown in the map's attribution control. Trusted: comes from config.
    pub tile_attribution: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            heat_radius: HEAT_RADIUS,
            tile_url: DEFAULT_TILE_URL.to_string(),
            tile_attribution: DEFAULT_TILE_ATTRIBUTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub assets_dir: PathBuf,
    pub thumbnail_max_dim: u32,
    pub map: MapSettings,
}

impl Config {
    /// Default layout inside `data_dir`
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            assets_dir: data_dir.join(ASSETS_DIR_NAME),
            thumbnail_max_dim: DEFAULT_MAX_DIM,
            map: MapSettings::default(),
        }
    }

    /// Resolve configuration from the CLI data directory and an optional
    /// TOML file. File values override the defaults; an explicit
    /// `data_dir` argument overrides the file's `data_dir`.
    pub fn resolve(data_dir: Option<PathBuf>, file_config: FileConfig) -> Result<Self, ConfigError> {
        let data_dir = data_dir
            .or_else(|| file_config.data_dir.clone())
            .or_else(default_data_dir)
            .ok_or(ConfigError::NoDataDir)?;

        let mut config = Config::for_data_dir(&data_dir);

        if let Some(db_path) = file_config.db_path {
            config.db_path = db_path;
        }
        if let Some(assets_dir) = file_config.assets_dir {
            config.assets_dir = assets_dir;
        }
        if let Some(max_dim) = file_config.thumbnail_max_dim {
            config.thumbnail_max_dim = max_dim;
        }
        if let Some(map) = file_config.map {
            if let Some(zoom) = map.zoom {
                config.map.zoom = zoom;
            }
            if let Some(heat_radius) = map.heat_radius {
                config.map.heat_radius = heat_radius;
            }
            if let Some(tile_url) = map.tile_url {
                config.map.tile_url = tile_url;
            }
            if let Some(attribution) = map.tile_attribution {
                config.map.tile_attribution = attribution;
            }
        }

        Ok(config)
    }
}

/// Get the directory where the database and images live by default
///
/// - Linux: ~/.local/share/customer-map
/// - macOS: ~/Library/Application Support/customer-map
/// - Windows: %APPDATA%\customer-map
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|path| path.join("customer-map"))
}

/// On-disk TOML configuration. Every field is optional.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub thumbnail_max_dim: Option<u32>,
    pub map: Option<MapFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
#[serde(default)]
pub struct MapFileConfig {
    pub zoom: Option<u8>,
    pub heat_radius: Option<u32>,
    pub tile_url: Option<String>,
    pub tile_attribution: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
