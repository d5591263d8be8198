//! Rendering resolved worlds.
//!
//! Worlds are rendered one after another, and within a world its map types
//! are rendered in declared order. Each world writes only below its own
//! `www_dir`. A failing map type ends its world; whether later worlds are
//! still attempted is decided by the [`FailurePolicy`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;

use crate::assets::copy_companion_assets;
use crate::config::{FailurePolicy, GlobalConfig, MapTypeSpec};
use crate::error::RenderError;
use crate::manifest::{Manifest, RenderResult};
use crate::renderer::RenderInvocation;
use crate::resolve::WorldSpec;
use crate::zoom::zoom_range;

/// Receives progress while worlds are rendered. Every method defaults to
/// doing nothing.
pub trait RenderObserver {
    /// A world is about to be rendered.
    fn world_started(&mut self, _world: &WorldSpec) {}

    /// A map type is about to be rendered.
    fn variant_started(&mut self, _world: &WorldSpec, _map_type: &MapTypeSpec) {}

    /// The renderer is being launched with this command line.
    fn command(&mut self, _invocation: &RenderInvocation) {}

    /// One line of renderer stdout.
    fn renderer_output(&mut self, _line: &str) {}

    /// A map type rendered and its zoom range was read back.
    fn variant_finished(&mut self, _world: &WorldSpec, _result: &RenderResult) {}

    /// The manifest for a world was written.
    fn manifest_written(&mut self, _world: &WorldSpec, _path: &Path) {}

    /// A world failed; its remaining map types are skipped.
    fn world_failed(&mut self, _world: &WorldSpec, _error: &RenderError) {}
}

/// An observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RenderObserver for NoopObserver {}

/// Run-wide settings that are not part of any world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Longest a single renderer invocation may run. `None` waits forever.
    pub timeout: Option<Duration>,
    /// What to do after a world fails.
    pub policy: FailurePolicy,
    /// Where `index.html`, `style.css` and `script.js` are copied from.
    pub asset_dir: PathBuf,
}

impl RunSettings {
    /// Settings taken from the config. A relative `assetdir` is relative to
    /// `config_dir`, which is also the default asset directory.
    pub fn from_config(config: &GlobalConfig, config_dir: &Path) -> Self {
        Self {
            timeout: config.timeout.map(Duration::from_secs),
            policy: config.on_failure,
            asset_dir: match &config.assetdir {
                Some(dir) => config_dir.join(dir),
                None => config_dir.to_path_buf(),
            },
        }
    }

    /// Set the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the asset directory.
    pub fn with_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = dir.into();
        self
    }
}

/// The outcome of one world.
#[derive(Debug)]
pub struct WorldOutcome {
    /// The world's name.
    pub world: String,
    /// The written manifest, or why the world failed.
    pub result: Result<Manifest, RenderError>,
}

/// Outcomes of a whole run, in the order the worlds were attempted.
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per attempted world.
    pub outcomes: Vec<WorldOutcome>,
    /// Worlds never attempted because an earlier world failed.
    pub skipped: Vec<String>,
}

impl RunReport {
    /// True when every world was attempted and succeeded.
    pub fn is_success(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// The errors of failed worlds.
    pub fn failures(&self) -> impl Iterator<Item = &RenderError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Number of worlds that rendered successfully.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Drives the renderer for resolved worlds.
#[derive(Debug, Clone)]
pub struct Orchestrator<'a> {
    config: &'a GlobalConfig,
    settings: RunSettings,
}

impl<'a> Orchestrator<'a> {
    /// An orchestrator for `config` with the given run settings.
    pub fn new(config: &'a GlobalConfig, settings: RunSettings) -> Self {
        Self { config, settings }
    }

    /// The run settings in effect.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Render every world in order, applying the failure policy.
    pub fn render_all(&self, worlds: &[WorldSpec], observer: &mut dyn RenderObserver) -> RunReport {
        let mut report = RunReport::default();
        for (index, world) in worlds.iter().enumerate() {
            let result = self.render_world(world, observer);
            let failed = result.is_err();
            report.outcomes.push(WorldOutcome {
                world: world.name.clone(),
                result,
            });
            if failed && self.settings.policy == FailurePolicy::Abort {
                report.skipped = worlds[index + 1..].iter().map(|w| w.name.clone()).collect();
                break;
            }
        }
        report
    }

    /// Render one world stamped with today's date.
    pub fn render_world(
        &self,
        world: &WorldSpec,
        observer: &mut dyn RenderObserver,
    ) -> Result<Manifest, RenderError> {
        self.render_world_on(world, chrono::Local::now().date_naive(), observer)
    }

    /// Render one world: every map type, then the manifest stamped with
    /// `date`, then the companion assets.
    pub fn render_world_on(
        &self,
        world: &WorldSpec,
        date: NaiveDate,
        observer: &mut dyn RenderObserver,
    ) -> Result<Manifest, RenderError> {
        observer.world_started(world);
        let result = self.render_world_inner(world, date, observer);
        if let Err(err) = &result {
            tracing::warn!(world = %world.name, error = %err, "world failed");
            observer.world_failed(world, err);
        }
        result
    }

    fn render_world_inner(
        &self,
        world: &WorldSpec,
        date: NaiveDate,
        observer: &mut dyn RenderObserver,
    ) -> Result<Manifest, RenderError> {
        let output_error = |path: &Path| {
            let world = world.name.clone();
            let path = path.to_path_buf();
            move |source| RenderError::Output {
                world,
                path,
                source,
            }
        };

        std::fs::create_dir_all(&world.www_dir).map_err(output_error(&world.www_dir))?;

        let mut manifest = Manifest::new(self.config.apikey.clone(), world.tile_size);
        for map_type in &world.map_types {
            let result = self.render_variant(world, map_type, observer)?;
            observer.variant_finished(world, &result);
            manifest.push(result);
        }
        manifest.stamp(date);

        let path = manifest
            .write_to(&world.www_dir)
            .map_err(output_error(&world.www_dir.join(crate::manifest::MANIFEST_FILE)))?;
        tracing::info!(world = %world.name, path = %path.display(), "manifest written");
        observer.manifest_written(world, &path);

        copy_companion_assets(&self.settings.asset_dir, &world.www_dir)
            .map_err(|(path, source)| RenderError::Output {
                world: world.name.clone(),
                path,
                source,
            })?;

        Ok(manifest)
    }

    /// Run the renderer for one map type and read back its zoom range.
    pub fn render_variant(
        &self,
        world: &WorldSpec,
        map_type: &MapTypeSpec,
        observer: &mut dyn RenderObserver,
    ) -> Result<RenderResult, RenderError> {
        observer.variant_started(world, map_type);

        let invocation = RenderInvocation::for_variant(self.config, world, map_type);
        observer.command(&invocation);
        invocation
            .run(self.settings.timeout, |line| observer.renderer_output(line))
            .map_err(|reason| RenderError::RenderFailure {
                world: world.name.clone(),
                map_type: map_type.name.clone(),
                reason,
            })?;

        let zoom = zoom_range(&world.output_dir(map_type)).map_err(|reason| {
            RenderError::MalformedZoomDirectory {
                world: world.name.clone(),
                map_type: map_type.name.clone(),
                reason,
            }
        })?;

        Ok(RenderResult::new(&map_type.dir, &map_type.name, zoom))
    }
}
