//! The configuration document.
//!
//! ```json
//! {
//!     "apikey": "...",
//!     "bindir": "/opt/cmapbash",
//!     "tilesize": 1024,
//!     "wwwdir": "/var/www/maps",
//!     "worlddir": "/srv/minecraft",
//!     "maptypes": [{ "name": "Day", "dir": "day" }],
//!     "worlds": {
//!         "survival": {},
//!         "creative": { "wwwdir": "/var/www/creative" }
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// The partial set of world attributes that can be given per world or as a
/// global default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WorldOverride {
    /// Tile edge length in pixels, passed through to the manifest.
    #[serde(default)]
    pub tilesize: Option<u32>,
    /// Map types to render, in display order.
    #[serde(default)]
    pub maptypes: Option<Vec<MapTypeSpec>>,
    /// At world level: the world's save directory. Globally: the directory
    /// holding one save directory per world.
    #[serde(default)]
    pub worlddir: Option<PathBuf>,
    /// At world level: the world's web directory. Globally: the directory
    /// holding one web directory per world.
    #[serde(default)]
    pub wwwdir: Option<PathBuf>,
}

/// What to do with the remaining worlds once one of them fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failed world.
    #[default]
    Abort,
    /// Render every world and report all failures at the end.
    Continue,
}

/// The loaded configuration file. Read-only for the lifetime of a run.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalConfig {
    /// Maps API key written into every manifest.
    pub apikey: String,
    /// Install directory of the `cmapbash` renderer.
    pub bindir: PathBuf,
    /// Global defaults for the per-world attributes.
    #[serde(flatten)]
    pub defaults: WorldOverride,
    /// Worlds to render, in declaration order.
    #[serde(default)]
    pub worlds: IndexMap<String, WorldOverride>,
    /// Seconds a single renderer invocation may run before it is killed.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Failure handling across worlds.
    #[serde(default)]
    pub on_failure: FailurePolicy,
    /// Directory holding `index.html`, `style.css` and `script.js`.
    #[serde(default)]
    pub assetdir: Option<PathBuf>,
}

impl GlobalConfig {
    /// Parse a configuration document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse the configuration file at `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a declared world by name.
    pub fn world(&self, name: &str) -> Option<&WorldOverride> {
        self.worlds.get(name)
    }
}

/// One rendering variant of a world, taken verbatim from the config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapTypeSpec {
    /// Display label shown in the map type picker.
    pub name: String,
    /// Output subdirectory under the world's web directory.
    pub dir: String,
    /// Renderer options for this variant.
    #[serde(flatten)]
    pub flags: MapFlags,
}

impl MapTypeSpec {
    /// A map type with every renderer option off.
    pub fn new(name: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            flags: MapFlags::default(),
        }
    }

    /// Replace the renderer options.
    pub fn with_flags(mut self, flags: MapFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Renderer options of a map type. Absent keys are off.
///
/// `dark`/`night` and `nether`/`hell` are synonyms; either one enables the
/// option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapFlags {
    /// Render with night lighting.
    pub dark: bool,
    /// Synonym for `dark`.
    pub night: bool,
    /// Render an isometric view instead of top-down.
    pub iso: bool,
    /// Render the Nether dimension.
    pub nether: bool,
    /// Synonym for `nether`.
    pub hell: bool,
    /// Render the End dimension.
    pub end: bool,
    /// Shade blocks by height.
    pub shadows: bool,
    /// One pixel per block instead of full textures.
    pub tiny: bool,
    /// Quarter turns clockwise, 0-3.
    pub rotate: Option<u8>,
}

impl MapFlags {
    /// Whether night lighting is on.
    pub fn is_dark(&self) -> bool {
        self.dark || self.night
    }

    /// Whether the Nether is rendered.
    pub fn is_nether(&self) -> bool {
        self.nether || self.hell
    }
}
