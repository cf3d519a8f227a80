// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Supplemental navigation data: the authoritative source of transition
//! altitudes and surveyed thresholds, plus ILS glide slopes.
//!
//! Two layouts are supported. The legacy GNS430 database is a single
//! `Airports.txt`; the modern layout has one CIFP procedure file per airport.
//! Both trees exist in `Custom Data/` (user-installed cycles) and under
//! `Resources/` (shipped with the simulator); the former wins.

pub mod airports_txt;
pub mod cifp;
pub mod earth_nav;

use crate::geo::GeoPos3;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavdataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Which supplemental layout to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavdataFormat {
    /// Modern when a CIFP directory exists, else legacy.
    #[default]
    Auto,
    Legacy,
    Modern,
}

/// A runway end as published by a supplemental source.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementalEnd {
    pub id: String,
    /// Landing threshold; elevation in feet.
    pub thr: GeoPos3,
    /// Degrees, `0` if not published.
    pub gpa: f64,
    /// Feet, `0` if not published.
    pub tch: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SupplementalAirport {
    pub icao: String,
    /// Surveyed reference point, when the source publishes one.
    pub refpt: Option<GeoPos3>,
    /// Feet, `0` if not published.
    pub ta: i32,
    pub tl: i32,
    pub ends: Vec<SupplementalEnd>,
}

/// Where the supplemental data of an installation lives.
#[derive(Debug, Clone, PartialEq)]
pub enum SupplementalSource {
    /// `GNS430/navdata/Airports.txt`
    Legacy(PathBuf),
    /// Directory of `<ICAO>.dat` CIFP files.
    Modern(PathBuf),
}

impl SupplementalSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Legacy(p) | Self::Modern(p) => p,
        }
    }

    /// Reads every airport the source publishes.
    pub fn load(&self) -> Result<Vec<SupplementalAirport>, NavdataError> {
        match self {
            Self::Legacy(path) => airports_txt::parse_file(path),
            Self::Modern(dir) => cifp::parse_dir(dir),
        }
    }
}

/// Data files of one installation, resolved against the configured format.
#[derive(Debug, Clone, PartialEq)]
pub struct NavdataFiles {
    pub supplemental: SupplementalSource,
    pub earth_nav: Option<PathBuf>,
    pub cycle_info: Option<PathBuf>,
}

impl NavdataFiles {
    /// Locates the navdata of the installation at `xplane_root`. `None`
    /// if the requested layout is not installed.
    pub fn locate(xplane_root: &Path, format: NavdataFormat) -> Option<Self> {
        let custom = xplane_root.join("Custom Data");
        let default_data = xplane_root.join("Resources").join("default data");

        let modern = [custom.join("CIFP"), default_data.join("CIFP")]
            .into_iter()
            .find(|p| p.is_dir());
        let legacy = [
            custom.join("GNS430").join("navdata"),
            xplane_root.join("Resources").join("GNS430").join("navdata"),
        ]
        .into_iter()
        .find(|p| p.join("Airports.txt").is_file());

        let use_modern = match format {
            NavdataFormat::Modern => true,
            NavdataFormat::Legacy => false,
            NavdataFormat::Auto => modern.is_some(),
        };

        let (supplemental, cycle_dirs) = if use_modern {
            let dir = modern?;
            let base = dir.parent().map(Path::to_path_buf).unwrap_or_default();
            (SupplementalSource::Modern(dir), vec![base])
        } else {
            let dir = legacy?;
            let base = dir.parent().and_then(Path::parent).map(Path::to_path_buf);
            let mut dirs = vec![dir.clone()];
            dirs.extend(base);
            (SupplementalSource::Legacy(dir.join("Airports.txt")), dirs)
        };

        let earth_nav = [custom.join("earth_nav.dat"), default_data.join("earth_nav.dat")]
            .into_iter()
            .find(|p| p.is_file());
        let cycle_info = cycle_dirs
            .iter()
            .map(|d| d.join("cycle_info.txt"))
            .find(|p| p.is_file());

        debug!(
            "Located navdata — supplemental={} earth_nav={:?} cycle_info={:?}",
            supplemental.path().display(),
            earth_nav,
            cycle_info
        );
        Some(Self {
            supplemental,
            earth_nav,
            cycle_info,
        })
    }

    /// AIRAC cycle of the installed data: `cycle_info.txt` first, then the
    /// `earth_nav.dat` header. `0` when neither names one.
    pub fn cycle(&self) -> u32 {
        let from_info = self
            .cycle_info
            .as_deref()
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|s| parse_cycle_info(&s));
        let cycle = from_info
            .or_else(|| self.earth_nav.as_deref().and_then(earth_nav::read_cycle))
            .unwrap_or(0);
        info!("Navdata cycle resolved — cycle={}", cycle);
        cycle
    }

    /// Source paths in precedence order, as recorded in the cache.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.supplemental.path().to_path_buf()];
        paths.extend(self.earth_nav.clone());
        paths
    }
}

/// Extracts `NNNN` from an `AIRAC cycle    : NNNN` line.
pub fn parse_cycle_info(content: &str) -> Option<u32> {
    static RE_CYCLE: OnceLock<Regex> = OnceLock::new();
    let re = RE_CYCLE.get_or_init(|| Regex::new(r"(?im)^\s*AIRAC cycle\s*:\s*(\d{4})").unwrap());
    re.captures(content)?.get(1)?.as_str().parse().ok()
}
