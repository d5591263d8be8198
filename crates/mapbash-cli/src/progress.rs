use std::path::Path;

use colored::Colorize;
use mapbash_core::{
    MapTypeSpec, RenderError, RenderInvocation, RenderObserver, RenderResult, WorldSpec,
};

/// Prints render progress to stdout.
#[derive(Default)]
pub struct Console;

impl RenderObserver for Console {
    fn world_started(&mut self, world: &WorldSpec) {
        println!("{} '{}'", "World".bold(), world.name);
    }

    fn variant_started(&mut self, world: &WorldSpec, map_type: &MapTypeSpec) {
        println!("Rendering {} map for {}...", map_type.name, world.name);
    }

    fn command(&mut self, invocation: &RenderInvocation) {
        println!("{}", invocation.command_line().dimmed());
    }

    fn renderer_output(&mut self, line: &str) {
        println!("   {line}");
    }

    fn variant_finished(&mut self, _world: &WorldSpec, result: &RenderResult) {
        println!(
            "Done rendering. {}",
            format!("(zoom {}-{})", result.min_zoom, result.max_zoom).dimmed()
        );
    }

    fn manifest_written(&mut self, world: &WorldSpec, path: &Path) {
        println!("Saving page to {}...", world.www_dir.display());
        tracing::debug!(path = %path.display(), "manifest saved");
    }

    fn world_failed(&mut self, world: &WorldSpec, error: &RenderError) {
        println!("{} '{}': {error}", "Failed".red().bold(), world.name);
    }
}
