//! Config resolution and render orchestration for mapbash.
//!
//! A mapbash configuration names one or more worlds, each rendered in one or
//! more map types by the external `cmapbash` renderer. This crate resolves
//! each world against the global defaults into a [`WorldSpec`], drives the
//! renderer once per map type, reads the zoom range back from the output
//! directory and writes the `info.json` manifest consumed by the web front
//! end.
//!
//! ```text
//! GlobalConfig ──resolve──▶ WorldSpec ──Orchestrator──▶ cmapbash (per map type)
//!                                            │
//!                                            ├── list_zoom_levels  (zoom.rs)
//!                                            ├── Manifest          (manifest.rs)
//!                                            └── companion assets  (assets.rs)
//! ```

/// Copying the static web front end next to a rendered world.
pub mod assets;
/// The configuration document: global defaults, world overrides, map types.
pub mod config;
/// Error types used throughout the crate.
pub mod error;
/// The `info.json` manifest and its date stamp.
pub mod manifest;
/// Sequencing renderer runs per world and per map type.
pub mod orchestrator;
/// Building and running a single `cmapbash` invocation.
pub mod renderer;
/// Merging world overrides with global defaults.
pub mod resolve;
/// Reading zoom levels back from a rendered output directory.
pub mod zoom;

/// Re-export configuration types.
pub use config::{FailurePolicy, GlobalConfig, MapFlags, MapTypeSpec, WorldOverride};
/// Re-export error types.
pub use error::{ConfigError, ConfigResult, FailureReason, RenderError, ZoomScanError};
/// Re-export manifest types.
pub use manifest::{Manifest, RenderResult};
/// Re-export orchestration types.
pub use orchestrator::{NoopObserver, Orchestrator, RenderObserver, RunReport, RunSettings};
/// Re-export the renderer invocation.
pub use renderer::RenderInvocation;
/// Re-export resolution types.
pub use resolve::{Attribute, WorldSpec, resolve, resolve_all};
