//! Merging a world's overrides with the global defaults.
//!
//! Every attribute resolves independently: a value on the world wins (even
//! an empty one), otherwise the global value is inherited, otherwise the
//! world is rejected. Path attributes are not inherited verbatim: the
//! global value names a root directory and the world gets `root/<name>`.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::{GlobalConfig, MapTypeSpec, WorldOverride};
use crate::error::{ConfigError, ConfigResult};

/// A per-world attribute that must be resolvable for every world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// `tilesize`
    TileSize,
    /// `maptypes`
    MapTypes,
    /// `worlddir`
    WorldDir,
    /// `wwwdir`
    WwwDir,
}

/// How a global value is turned into a world value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Use the global value as is.
    Inherit,
    /// Treat the global value as a root and append the world name.
    JoinWorldName,
}

impl Attribute {
    /// Every attribute, in resolution order.
    pub const ALL: [Attribute; 4] = [
        Attribute::TileSize,
        Attribute::MapTypes,
        Attribute::WorldDir,
        Attribute::WwwDir,
    ];

    /// The config key for this attribute.
    pub fn key(self) -> &'static str {
        match self {
            Self::TileSize => "tilesize",
            Self::MapTypes => "maptypes",
            Self::WorldDir => "worlddir",
            Self::WwwDir => "wwwdir",
        }
    }

    /// How the global value applies when the world does not set one.
    pub fn fallback(self) -> Fallback {
        match self {
            Self::TileSize | Self::MapTypes => Fallback::Inherit,
            Self::WorldDir | Self::WwwDir => Fallback::JoinWorldName,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A world with every attribute resolved. Never partially filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSpec {
    /// The world's key in the config.
    pub name: String,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Map types to render, in declared order.
    pub map_types: Vec<MapTypeSpec>,
    /// The world's save directory.
    pub world_dir: PathBuf,
    /// The world's web output directory.
    pub www_dir: PathBuf,
}

impl WorldSpec {
    /// Where the renderer writes the tiles of `map_type`.
    pub fn output_dir(&self, map_type: &MapTypeSpec) -> PathBuf {
        self.www_dir.join(&map_type.dir)
    }
}

/// A value that can be inherited from the global layer.
trait Layered: Clone {
    fn join_world(&self, _world: &str) -> Self {
        self.clone()
    }
}

impl Layered for u32 {}

impl Layered for Vec<MapTypeSpec> {}

impl Layered for PathBuf {
    fn join_world(&self, world: &str) -> Self {
        self.join(world)
    }
}

fn pick<T: Layered>(
    attribute: Attribute,
    world: &str,
    local: &Option<T>,
    global: &Option<T>,
) -> ConfigResult<T> {
    if let Some(value) = local {
        return Ok(value.clone());
    }
    match (global, attribute.fallback()) {
        (Some(value), Fallback::Inherit) => Ok(value.clone()),
        (Some(value), Fallback::JoinWorldName) => Ok(value.join_world(world)),
        (None, _) => Err(ConfigError::MissingAttribute {
            attribute,
            world: world.to_string(),
        }),
    }
}

/// Resolve one world against the global defaults.
///
/// Pure: the filesystem is not touched.
pub fn resolve(
    global: &GlobalConfig,
    world_name: &str,
    world: &WorldOverride,
) -> ConfigResult<WorldSpec> {
    let defaults = &global.defaults;
    let spec = WorldSpec {
        name: world_name.to_string(),
        tile_size: pick(Attribute::TileSize, world_name, &world.tilesize, &defaults.tilesize)?,
        map_types: pick(Attribute::MapTypes, world_name, &world.maptypes, &defaults.maptypes)?,
        world_dir: pick(Attribute::WorldDir, world_name, &world.worlddir, &defaults.worlddir)?,
        www_dir: pick(Attribute::WwwDir, world_name, &world.wwwdir, &defaults.wwwdir)?,
    };
    check_map_type_dirs(&spec)?;
    Ok(spec)
}

/// Resolve every declared world, in declaration order.
///
/// Stops at the first world that fails to resolve.
pub fn resolve_all(global: &GlobalConfig) -> ConfigResult<Vec<WorldSpec>> {
    global
        .worlds
        .iter()
        .map(|(name, world)| resolve(global, name, world))
        .collect()
}

fn check_map_type_dirs(spec: &WorldSpec) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for map_type in &spec.map_types {
        if !is_single_segment(&map_type.dir) {
            return Err(ConfigError::InvalidMapTypeDir {
                world: spec.name.clone(),
                map_type: map_type.name.clone(),
                dir: map_type.dir.clone(),
            });
        }
        if !seen.insert(map_type.dir.as_str()) {
            return Err(ConfigError::DuplicateMapTypeDir {
                world: spec.name.clone(),
                dir: map_type.dir.clone(),
            });
        }
    }
    Ok(())
}

fn is_single_segment(dir: &str) -> bool {
    let mut components = Path::new(dir).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(segment)), None) if segment == dir
    )
}
