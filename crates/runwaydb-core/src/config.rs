// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::navdata::NavdataFormat;
use crate::DbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tolerances used when records from different sources describe the same
/// runway end. Empirical; tuned against scenery drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTolerances {
    /// Allowed difference in runway numbers, for magnetic-drift renumbering.
    pub heading_units: u32,
    /// Supplemental threshold distance, in runway widths.
    pub thr_pos_widths: f64,
    /// Lateral reach of an unlabelled VASI/PAPI, in runway widths.
    pub vgsi_lateral_widths: f64,
    pub vgsi_heading_deg: f64,
    pub gs_heading_deg: f64,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        Self {
            heading_units: 1,
            thr_pos_widths: 1.0,
            vgsi_lateral_widths: 2.0,
            vgsi_heading_deg: 5.0,
            gs_heading_deg: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub xplane_root: Option<PathBuf>,
    pub cache_dir: PathBuf,
    pub navdata: NavdataFormat,
    pub nearest_radius_nm: f64,
    pub matching: MatchTolerances,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            xplane_root: None,
            cache_dir: default_cache_dir(),
            navdata: NavdataFormat::Auto,
            nearest_radius_nm: 8.0,
            matching: MatchTolerances::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn new(xplane_root: &Path) -> Self {
        Self {
            xplane_root: Some(xplane_root.to_path_buf()),
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, DbError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), DbError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default location of the JSON config file.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("org", "runwaydb", "runwaydb")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("runwaydb.json"))
    }
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("org", "runwaydb", "runwaydb")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("runwaydb_cache"))
}
