// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Airport and runway database for runway awareness.
//!
//! Airports are ingested from X-Plane scenery and navigation data, written to
//! a per-tile cache, and loaded into memory tile by tile around the aircraft.
//! Loaded airports carry the projected safety polygons of their runways.

pub mod airport;
pub mod apt_dat;
pub mod cache;
pub mod config;
pub mod database;
pub mod geo;
pub mod geometry;
pub mod ingest;
pub mod navdata;
pub mod registry;
pub mod scenery;
pub mod snapshot;
pub mod tiles;

pub use airport::{Airport, Runway, RunwayEnd, RunwayGeometry};
pub use config::{DatabaseConfig, MatchTolerances};
pub use database::{CacheStatus, Database};
pub use geo::{GeoPos2, GeoPos3};
pub use navdata::{NavdataError, NavdataFormat};
pub use snapshot::{RunwaySnapshot, SharedSnapshot};

use std::path::PathBuf;
use std::{env, fs};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("X-Plane root directory not found")]
    RootNotFound,
    #[error("Navigation data not found under {0}")]
    NavdataUnavailable(PathBuf),
    #[error("Failed to read navigation data from {path}: {source}")]
    Navdata {
        path: PathBuf,
        #[source]
        source: NavdataError,
    },
    #[error("Could not update data cache at {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Installer records naming X-Plane installations, newest version first.
const INSTALL_RECORDS: [&str; 2] = ["x-plane_install_12.txt", "x-plane_install_11.txt"];

/// Per-user directories the simulator's installer writes its records to.
fn install_record_dirs() -> Vec<PathBuf> {
    let home = env::var_os("HOME").map(PathBuf::from);
    if cfg!(target_os = "macos") {
        home.map(|h| vec![h.join("Library/Preferences"), h.join(".x-plane")])
            .unwrap_or_default()
    } else if cfg!(target_os = "windows") {
        env::var_os("LOCALAPPDATA").map(PathBuf::from).into_iter().collect()
    } else {
        home.map(|h| h.join(".x-plane")).into_iter().collect()
    }
}

/// Finds the X-Plane installation recorded by the simulator's installer.
pub fn find_xplane_root() -> Option<PathBuf> {
    let root = root_from_install_records(&install_record_dirs())?;
    log::debug!("Found X-Plane installation — root={}", root.display());
    Some(root)
}

/// First directory listed in an installer record under `dirs` that contains
/// `Resources`.
fn root_from_install_records(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| INSTALL_RECORDS.map(|name| dir.join(name)))
        .filter_map(|record| fs::read_to_string(record).ok())
        .find_map(|text| {
            text.lines()
                .map(|line| PathBuf::from(line.trim()))
                .find(|path| !path.as_os_str().is_empty() && path.join("Resources").is_dir())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_records_prefer_newest_valid_entry() {
        let prefs = tempfile::tempdir().unwrap();
        let xp11 = prefs.path().join("X-Plane 11");
        let xp12 = prefs.path().join("X-Plane 12");
        fs::create_dir_all(xp11.join("Resources")).unwrap();
        fs::create_dir_all(&xp12).unwrap();
        let dirs = vec![prefs.path().to_path_buf()];

        // The 12 record only names a directory without Resources
        fs::write(prefs.path().join(INSTALL_RECORDS[0]), format!("{}\n", xp12.display())).unwrap();
        fs::write(prefs.path().join(INSTALL_RECORDS[1]), format!("\n{}\n", xp11.display())).unwrap();
        assert_eq!(root_from_install_records(&dirs), Some(xp11.clone()));

        fs::create_dir_all(xp12.join("Resources")).unwrap();
        assert_eq!(root_from_install_records(&dirs), Some(xp12));

        assert_eq!(root_from_install_records(&[prefs.path().join("missing")]), None);
    }
}
