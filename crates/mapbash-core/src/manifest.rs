use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::zoom::ZoomRange;

/// File name of the manifest inside a world's web directory.
pub const MANIFEST_FILE: &str = "info.json";

/// One rendered map type as the front end sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    /// The map type's output dir, used as its id and URL prefix.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Highest zoom level rendered.
    pub max_zoom: u32,
    /// Lowest zoom level rendered.
    pub min_zoom: u32,
}

impl RenderResult {
    /// Describe a rendered map type.
    pub fn new(id: impl Into<String>, name: impl Into<String>, zoom: ZoomRange) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            max_zoom: zoom.max,
            min_zoom: zoom.min,
        }
    }
}

/// The `info.json` written next to each rendered world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Maps API key for the front end.
    pub api_key: String,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Rendered map types, in declared order.
    pub types: Vec<RenderResult>,
    /// Render date, e.g. "March 4, 2024".
    pub time: String,
}

impl Manifest {
    /// An empty, unstamped manifest.
    pub fn new(api_key: impl Into<String>, tile_size: u32) -> Self {
        Self {
            api_key: api_key.into(),
            tile_size,
            types: Vec::new(),
            time: String::new(),
        }
    }

    /// Record a rendered map type.
    pub fn push(&mut self, result: RenderResult) {
        self.types.push(result);
    }

    /// Set the render date.
    pub fn stamp(&mut self, date: NaiveDate) {
        self.time = format_date(date);
    }

    /// Serialize into `dir/info.json`, replacing any previous manifest.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Format a date as "Month D, Year" without zero-padding the day.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_digit_day_is_not_padded() {
        assert_eq!(format_date(date(2024, 3, 4)), "March 4, 2024");
    }

    #[test]
    fn two_digit_day() {
        assert_eq!(format_date(date(2024, 3, 14)), "March 14, 2024");
        assert_eq!(format_date(date(2023, 12, 31)), "December 31, 2023");
    }

    #[test]
    fn serializes_front_end_field_names() {
        let mut manifest = Manifest::new("key-123", 1024);
        manifest.push(RenderResult::new("day", "Day", ZoomRange { min: 0, max: 3 }));
        manifest.push(RenderResult::new("night", "Night", ZoomRange { min: 1, max: 2 }));
        manifest.stamp(date(2024, 3, 4));

        let json = serde_json::to_string(&manifest).unwrap();
        insta::assert_snapshot!(json, @r#"{"apiKey":"key-123","tileSize":1024,"types":[{"id":"day","name":"Day","maxZoom":3,"minZoom":0},{"id":"night","name":"Night","maxZoom":2,"minZoom":1}],"time":"March 4, 2024"}"#);
    }

    #[test]
    fn write_replaces_existing_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "stale").unwrap();

        let mut manifest = Manifest::new("k", 256);
        manifest.stamp(date(2024, 1, 1));
        let path = manifest.write_to(dir.path()).unwrap();

        assert_eq!(path, dir.path().join(MANIFEST_FILE));
        let read: Manifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, manifest);
    }
}
