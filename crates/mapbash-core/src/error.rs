use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use crate::resolve::Attribute;

/// Alias for `Result<T, ConfigError>`.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or resolving the configuration.
///
/// All of these surface before any renderer is started.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {}", .path.display())]
    #[diagnostic(code(mapbash::config::read))]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The configuration file is not a valid configuration document.
    #[error("invalid config file {}", .path.display())]
    #[diagnostic(
        code(mapbash::config::parse),
        help("`apikey` and `bindir` are required at the top level")
    )]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A required attribute is set neither on the world nor globally.
    #[error("could not find `{attribute}` for world \"{world}\"")]
    #[diagnostic(
        code(mapbash::config::missing_attribute),
        help("set it on the world entry or at the top level of the config")
    )]
    MissingAttribute {
        /// The attribute that could not be resolved.
        attribute: Attribute,
        /// The world being resolved.
        world: String,
    },

    /// A map type `dir` is not a single usable path segment.
    #[error("map type \"{map_type}\" of world \"{world}\" has invalid dir {dir:?}")]
    #[diagnostic(
        code(mapbash::config::invalid_dir),
        help("`dir` must be a plain directory name such as \"day\"")
    )]
    InvalidMapTypeDir {
        /// The world the map type belongs to.
        world: String,
        /// Display name of the map type.
        map_type: String,
        /// The offending `dir` value.
        dir: String,
    },

    /// Two map types of one world would render into the same directory.
    #[error("world \"{world}\" has more than one map type with dir \"{dir}\"")]
    #[diagnostic(code(mapbash::config::duplicate_dir))]
    DuplicateMapTypeDir {
        /// The world the map types belong to.
        world: String,
        /// The shared `dir` value.
        dir: String,
    },

    /// A world was requested that the configuration does not declare.
    #[error("no world named \"{0}\" in the config")]
    #[diagnostic(code(mapbash::config::unknown_world))]
    UnknownWorld(String),
}

/// Why a renderer invocation did not complete successfully.
#[derive(Debug, Error)]
pub enum FailureReason {
    /// The renderer process could not be started.
    #[error("could not start {}: {source}", .program.display())]
    Spawn {
        /// The program that was launched.
        program: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The renderer exited unsuccessfully.
    #[error("renderer exited with {status}{}", stderr_suffix(.stderr))]
    Exit {
        /// The exit status reported by the OS.
        status: ExitStatus,
        /// Everything the renderer wrote to stderr.
        stderr: String,
    },

    /// The renderer ran past the configured timeout and was killed.
    #[error("renderer did not finish within {}s and was killed", .0.as_secs())]
    TimedOut(Duration),

    /// Waiting on the renderer process failed.
    #[error("lost track of renderer process: {0}")]
    Wait(#[source] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Why an output directory did not yield a zoom range.
#[derive(Debug, Error)]
pub enum ZoomScanError {
    /// The directory could not be listed (including when it does not exist).
    #[error("cannot list {}: {source}", .path.display())]
    Unreadable {
        /// The directory that was scanned.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The directory holds no `zoom<N>` entries.
    #[error("no zoom directories in {}", .0.display())]
    Empty(PathBuf),

    /// A `zoom`-prefixed entry does not end in a non-negative integer.
    #[error("\"{0}\" is not a zoom<N> directory")]
    BadSuffix(String),
}

/// Errors that abort the rendering of one world.
#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    /// The external renderer failed for one map type.
    #[error("rendering \"{map_type}\" for world \"{world}\" failed: {reason}")]
    #[diagnostic(code(mapbash::render::failed))]
    RenderFailure {
        /// The world being rendered.
        world: String,
        /// Display name of the map type.
        map_type: String,
        /// What went wrong.
        reason: FailureReason,
    },

    /// The renderer finished but its output holds no usable zoom levels.
    #[error("bad output for \"{map_type}\" of world \"{world}\": {reason}")]
    #[diagnostic(
        code(mapbash::render::malformed_zoom_directory),
        help("the renderer is expected to create zoom0, zoom1, ... under the map type's dir")
    )]
    MalformedZoomDirectory {
        /// The world being rendered.
        world: String,
        /// Display name of the map type.
        map_type: String,
        /// What the scan found.
        reason: ZoomScanError,
    },

    /// Writing into the world's web directory failed.
    #[error("cannot write {} for world \"{world}\"", .path.display())]
    #[diagnostic(code(mapbash::render::output))]
    Output {
        /// The world being rendered.
        world: String,
        /// The file or directory being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl RenderError {
    /// Name of the world this error belongs to.
    pub fn world(&self) -> &str {
        match self {
            Self::RenderFailure { world, .. }
            | Self::MalformedZoomDirectory { world, .. }
            | Self::Output { world, .. } => world,
        }
    }
}
