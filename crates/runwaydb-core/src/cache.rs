// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Versioned on-disk tile cache.
//!
//! ```text
//! <dir>/version                       format version, written last
//! <dir>/cycle                         AIRAC cycle of the data
//! <dir>/sources                       contributing files, precedence order
//! <dir>/apt_dat/+40-130/+47-123.dat   airports of one 1° tile
//! ```
//!
//! Tile files reuse the `apt.dat` row layout. Headers carry the reconciled
//! reference point and transition altitude/level; runway rows append glide
//! path angle, crossing height and threshold elevation for both ends.

use crate::airport::Airport;
use crate::apt_dat::{AptDatError, AptDatParser, Dialect};
use crate::registry::AirportRegistry;
use crate::tiles::TileKey;
use crate::DbError;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const CACHE_VERSION: u32 = 3;

const VERSION_FILE: &str = "version";
const CYCLE_FILE: &str = "cycle";
const SOURCES_FILE: &str = "sources";
const TILES_DIR: &str = "apt_dat";

/// Identity of the data a cache was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStamp {
    pub version: u32,
    pub cycle: u32,
    pub sources: Vec<PathBuf>,
}

impl CacheStamp {
    pub fn current(cycle: u32, sources: Vec<PathBuf>) -> Self {
        Self {
            version: CACHE_VERSION,
            cycle,
            sources,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileCache {
    dir: PathBuf,
}

impl TileCache {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        let (mlat, mlon) = key.macro_key();
        self.dir
            .join(TILES_DIR)
            .join(TileKey::new(mlat, mlon).to_string())
            .join(format!("{}.dat", key))
    }

    /// Reads the stamp of the cache on disk, `None` if any part is missing
    /// or unreadable.
    pub fn read_stamp(&self) -> Option<CacheStamp> {
        let read_int = |name: &str| -> Option<u32> {
            fs::read_to_string(self.dir.join(name)).ok()?.trim().parse().ok()
        };
        let version = read_int(VERSION_FILE)?;
        let cycle = read_int(CYCLE_FILE)?;
        let sources = fs::read_to_string(self.dir.join(SOURCES_FILE))
            .ok()?
            .lines()
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect();
        Some(CacheStamp {
            version,
            cycle,
            sources,
        })
    }

    /// Whether the cache on disk was built from exactly `expected`.
    pub fn is_valid(&self, expected: &CacheStamp) -> bool {
        let Some(stamp) = self.read_stamp() else {
            info!("No usable cache — dir={}", self.dir.display());
            return false;
        };
        if stamp.version != expected.version {
            info!(
                "Cache version changed — found={} expected={}",
                stamp.version, expected.version
            );
            return false;
        }
        if stamp.cycle != expected.cycle {
            info!(
                "Navdata cycle changed — found={} expected={}",
                stamp.cycle, expected.cycle
            );
            return false;
        }
        if stamp.sources != expected.sources {
            info!(
                "Data sources changed — cached={} current={}",
                stamp.sources.len(),
                expected.sources.len()
            );
            return false;
        }
        true
    }

    /// Makes the cache fail validation until the next successful write.
    pub fn invalidate(&self) -> io::Result<()> {
        match fs::remove_file(self.dir.join(VERSION_FILE)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Replaces the cache with the airports of `registry`. Returns the number
    /// of tile files written.
    pub fn write(&self, registry: &AirportRegistry, stamp: &CacheStamp) -> Result<usize, DbError> {
        let wrap = |path: &Path| {
            let path = path.to_path_buf();
            move |source: io::Error| DbError::CacheWrite { path, source }
        };

        self.invalidate().map_err(wrap(&self.dir))?;
        let tiles_dir = self.dir.join(TILES_DIR);
        if tiles_dir.exists() {
            fs::remove_dir_all(&tiles_dir).map_err(wrap(&tiles_dir))?;
        }
        fs::create_dir_all(&tiles_dir).map_err(wrap(&tiles_dir))?;

        let mut by_tile: BTreeMap<TileKey, Vec<&Airport>> = BTreeMap::new();
        for apt in registry.iter() {
            by_tile.entry(apt.tile_key()).or_default().push(apt);
        }

        for (key, airports) in &by_tile {
            let path = self.tile_path(*key);
            write_tile(&path, airports).map_err(wrap(&path))?;
            debug!("Wrote cache tile — tile={} airports={}", key, airports.len());
        }

        let sources: String = stamp
            .sources
            .iter()
            .map(|p| format!("{}\n", p.display()))
            .collect();
        let sources_path = self.dir.join(SOURCES_FILE);
        fs::write(&sources_path, sources).map_err(wrap(&sources_path))?;
        let cycle_path = self.dir.join(CYCLE_FILE);
        fs::write(&cycle_path, format!("{}\n", stamp.cycle)).map_err(wrap(&cycle_path))?;
        let version_path = self.dir.join(VERSION_FILE);
        fs::write(&version_path, format!("{}\n", stamp.version)).map_err(wrap(&version_path))?;

        info!(
            "Cache written — dir={} tiles={} airports={} cycle={}",
            self.dir.display(),
            by_tile.len(),
            registry.count(),
            stamp.cycle
        );
        Ok(by_tile.len())
    }

    /// Airports stored for `key`; empty when the tile has no file.
    pub fn load_tile(&self, key: TileKey) -> Result<Vec<Airport>, AptDatError> {
        let path = self.tile_path(key);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let (airports, stats) = AptDatParser::new(Dialect::Cache).parse_file(&path)?;
        if stats.malformed_lines > 0 || stats.rejected_airports > 0 {
            warn!(
                "Cache tile has unreadable records — tile={} malformed_lines={} rejected={}",
                key, stats.malformed_lines, stats.rejected_airports
            );
        }
        Ok(airports)
    }
}

fn write_tile(path: &Path, airports: &[&Airport]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(fs::File::create(path)?);
    writeln!(out, "I")?;
    writeln!(out, "1100 Version - runwaydb cache v{}", CACHE_VERSION)?;
    writeln!(out)?;
    for apt in airports {
        out.write_all(format_airport(apt).as_bytes())?;
    }
    writeln!(out, "99")?;
    out.flush()
}

/// Renders one airport as cache records.
pub fn format_airport(apt: &Airport) -> String {
    let refpt = apt.refpt();
    let mut s = format!(
        "1 {:.2} {} {} {} {:.8} {:.8}\n",
        refpt.elev,
        apt.ta,
        apt.tl,
        apt.icao(),
        refpt.lat,
        refpt.lon
    );
    for rwy in apt.runways() {
        s.push_str(&format!("100 {:.2} 1 0 0.25 0 0 0", rwy.width));
        for end in &rwy.ends {
            s.push_str(&format!(
                " {} {:.8} {:.8} {:.2} {:.2} 0 0 0 0",
                end.id, end.thr.lat, end.thr.lon, end.displ, end.blast
            ));
        }
        for end in &rwy.ends {
            s.push_str(&format!(" {:.2} {:.2} {:.2}", end.gpa, end.tch, end.thr.elev));
        }
        s.push('\n');
    }
    s
}
