//! Integration tests for the render CLI.
#![cfg(unix)]
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Stands in for cmapbash: creates zoom0 and zoom3 under the `-g` dir.
/// A map type dir named `broken` makes it fail.
const FAKE_RENDERER: &str = r#"#!/bin/sh
touch "$(dirname "$0")/ran"
out=""
while [ "$#" -gt 0 ]; do
  case "$1" in
    -g) shift; out="$1" ;;
  esac
  shift
done
echo "slicing into $out"
case "$(basename "$out")" in
  broken) echo "no level.dat" >&2; exit 2 ;;
esac
mkdir -p "$out/zoom0" "$out/zoom3"
"#;

struct Site {
    root: TempDir,
}

impl Site {
    /// A scratch tree with a fake renderer in `bin/` and the companion
    /// assets next to where the config will live.
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let bin = root.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let renderer = bin.join("cmapbash");
        fs::write(&renderer, FAKE_RENDERER).unwrap();
        let mut perms = fs::metadata(&renderer).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&renderer, perms).unwrap();

        for name in ["index.html", "style.css", "script.js"] {
            fs::write(root.path().join(name), format!("/* {name} */")).unwrap();
        }
        Self { root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    fn base_config(&self) -> Value {
        json!({
            "apikey": "test-key",
            "bindir": self.path("bin"),
            "tilesize": 1024,
            "worlddir": self.path("saves"),
            "wwwdir": self.path("www"),
            "maptypes": [{ "name": "Day", "dir": "day" }],
            "worlds": { "survival": {} }
        })
    }

    fn write_config(&self, config: &Value) -> PathBuf {
        let path = self.path("config.json");
        fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
        path
    }

    fn renderer_ran(&self) -> bool {
        self.path("bin/ran").exists()
    }
}

fn mapbash(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mapbash").unwrap();
    cmd.arg(config).env_remove("RUST_LOG");
    cmd
}

fn read_manifest(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join("info.json")).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// rendering
// ---------------------------------------------------------------------------

#[test]
fn renders_a_world_end_to_end() {
    let site = Site::new();
    let config = site.write_config(&site.base_config());

    mapbash(&config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Rendering Day map for survival")
                .and(predicate::str::contains("slicing into"))
                .and(predicate::str::contains("Saving page to")),
        );

    let www = site.path("www/survival");
    let manifest = read_manifest(&www);
    assert_eq!(manifest["apiKey"], "test-key");
    assert_eq!(manifest["tileSize"], 1024);
    assert_eq!(
        manifest["types"],
        json!([{ "id": "day", "name": "Day", "maxZoom": 3, "minZoom": 0 }])
    );
    assert!(manifest["time"].as_str().unwrap().contains(", 20"));
    for name in ["info.json", "index.html", "style.css", "script.js"] {
        assert!(www.join(name).is_file(), "{name} missing");
    }
}

#[test]
fn world_override_paths_are_used() {
    let site = Site::new();
    let mut config = site.base_config();
    config["worlds"]["survival"] = json!({ "wwwdir": site.path("public") });
    let config = site.write_config(&config);

    mapbash(&config).assert().success();

    assert!(site.path("public/info.json").is_file());
    assert!(!site.path("www/survival").exists());
}

#[test]
fn relative_paths_resolve_from_the_working_dir() {
    let site = Site::new();
    let mut config = site.base_config();
    config["bindir"] = json!("bin");
    config["worlddir"] = json!("saves");
    config["wwwdir"] = json!("www");
    let config = site.write_config(&config);

    mapbash(&config)
        .current_dir(site.root.path())
        .assert()
        .success();

    let www = site.path("www/survival");
    assert!(www.join("day/zoom3").is_dir());
    assert_eq!(read_manifest(&www)["types"][0]["maxZoom"], 3);
    assert!(!site.path("bin/www").exists());
}

#[test]
fn renderer_failure_exits_non_zero() {
    let site = Site::new();
    let mut config = site.base_config();
    config["maptypes"] = json!([{ "name": "Broken", "dir": "broken" }]);
    let config = site.write_config(&config);

    mapbash(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed"))
        .stderr(predicate::str::contains("failed"));

    assert!(!site.path("www/survival/info.json").exists());
}

#[test]
fn abort_skips_later_worlds() {
    let site = Site::new();
    let mut config = site.base_config();
    config["worlds"] = json!({
        "first": { "maptypes": [{ "name": "Broken", "dir": "broken" }] },
        "second": {}
    });
    let config = site.write_config(&config);

    mapbash(&config)
        .assert()
        .failure()
        .stdout(predicate::str::contains("skipped"));

    assert!(!site.path("www/second").exists());
}

#[test]
fn keep_going_renders_later_worlds() {
    let site = Site::new();
    let mut config = site.base_config();
    config["worlds"] = json!({
        "first": { "maptypes": [{ "name": "Broken", "dir": "broken" }] },
        "second": {}
    });
    let config = site.write_config(&config);

    mapbash(&config).arg("--keep-going").assert().failure();

    assert!(site.path("www/second/info.json").is_file());
}

#[test]
fn world_filter_renders_only_named_worlds() {
    let site = Site::new();
    let mut config = site.base_config();
    config["worlds"] = json!({ "one": {}, "two": {} });
    let config = site.write_config(&config);

    mapbash(&config).args(["--world", "two"]).assert().success();

    assert!(site.path("www/two/info.json").is_file());
    assert!(!site.path("www/one").exists());
}

#[test]
fn unknown_world_filter_fails() {
    let site = Site::new();
    let config = site.write_config(&site.base_config());

    mapbash(&config)
        .args(["--world", "atlantis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("atlantis"));

    assert!(!site.renderer_ran());
}

#[test]
fn custom_asset_dir() {
    let site = Site::new();
    let assets = site.path("theme");
    fs::create_dir(&assets).unwrap();
    for name in ["index.html", "style.css", "script.js"] {
        fs::write(assets.join(name), "themed").unwrap();
    }
    let config = site.write_config(&site.base_config());

    mapbash(&config).arg("--assets").arg(&assets).assert().success();

    assert_eq!(
        fs::read_to_string(site.path("www/survival/style.css")).unwrap(),
        "themed"
    );
}

// ---------------------------------------------------------------------------
// configuration errors
// ---------------------------------------------------------------------------

#[test]
fn missing_attribute_fails_before_rendering() {
    let site = Site::new();
    let mut config = site.base_config();
    config.as_object_mut().unwrap().remove("tilesize");
    config["worlds"] = json!({ "ok": { "tilesize": 256 }, "alpha": {} });
    let config = site.write_config(&config);

    mapbash(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tilesize").and(predicate::str::contains("alpha")));

    assert!(!site.renderer_ran());
    assert!(!site.path("www").exists());
}

#[test]
fn missing_config_file_fails() {
    let site = Site::new();
    mapbash(&site.path("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read config file"));
}

#[test]
fn invalid_config_fails() {
    let site = Site::new();
    let config = site.write_config(&json!({ "apikey": "k" }));
    mapbash(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config file"));
}

// ---------------------------------------------------------------------------
// dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_prints_commands_only() {
    let site = Site::new();
    let mut config = site.base_config();
    config["maptypes"] = json!([
        { "name": "Day", "dir": "day" },
        { "name": "Nether", "dir": "nether", "hell": true, "iso": true }
    ]);
    let config = site.write_config(&config);

    mapbash(&config)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("World 'survival'")
                .and(predicate::str::contains("cmapbash -b -w"))
                .and(predicate::str::contains("cmapbash -i -n -b -w")),
        );

    assert!(!site.renderer_ran());
    assert!(!site.path("www").exists());
}
