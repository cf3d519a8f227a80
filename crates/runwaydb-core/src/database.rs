// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The database handle: owns the registry and tile index, loads tiles around
//! the aircraft and answers proximity queries.

use crate::airport::Airport;
use crate::cache::{CacheStamp, TileCache};
use crate::config::DatabaseConfig;
use crate::geo::{great_circle_distance, GeoPos2, GeoPos3, NM_TO_M};
use crate::ingest::{ingest, SourceSet};
use crate::registry::AirportRegistry;
use crate::snapshot::{AirportInfo, RunwaySnapshot};
use crate::tiles::{TileIndex, TileKey};
use crate::DbError;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

/// Outcome of opening the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// The cache matched the installed data and was used as-is.
    Reused,
    /// Data was re-ingested and the cache rewritten.
    Rebuilt,
    /// Data was re-ingested but the cache could not be written; tiles are
    /// served from memory for this session.
    Degraded(String),
}

/// Where tiles are loaded from.
enum TileSource {
    Disk(TileCache),
    Memory(BTreeMap<TileKey, Vec<Airport>>),
}

pub struct Database {
    config: DatabaseConfig,
    source: TileSource,
    status: CacheStatus,
    registry: AirportRegistry,
    tiles: TileIndex,
}

impl Database {
    /// Opens the database, reusing the cache when it matches the installed
    /// data and rebuilding it otherwise.
    pub fn open(config: DatabaseConfig) -> Result<Self, DbError> {
        Self::open_with(config, false)
    }

    /// Opens the database after an unconditional rebuild.
    pub fn rebuild(config: DatabaseConfig) -> Result<Self, DbError> {
        Self::open_with(config, true)
    }

    fn open_with(config: DatabaseConfig, force: bool) -> Result<Self, DbError> {
        let sources = SourceSet::discover(&config)?;
        let cache = TileCache::new(&config.cache_dir);
        let stamp = CacheStamp::current(sources.cycle, sources.paths());

        if !force && cache.is_valid(&stamp) {
            info!(
                "Using airport cache — dir={} cycle={}",
                cache.dir().display(),
                stamp.cycle
            );
            return Ok(Self::with_source(config, TileSource::Disk(cache), CacheStatus::Reused));
        }

        info!(
            "Rebuilding airport cache — root={} scenery_sources={} forced={}",
            sources.xplane_root.display(),
            sources.apt_dats.len(),
            force
        );
        let registry = ingest(&sources, &config.matching)?;

        let (source, status) = match cache.write(&registry, &stamp) {
            Ok(_) => (TileSource::Disk(cache), CacheStatus::Rebuilt),
            Err(e) => {
                error!("Could not update data cache — error={}", e);
                let mut by_tile: BTreeMap<TileKey, Vec<Airport>> = BTreeMap::new();
                for apt in registry.into_airports() {
                    by_tile.entry(apt.tile_key()).or_default().push(apt);
                }
                (TileSource::Memory(by_tile), CacheStatus::Degraded(e.to_string()))
            }
        };
        Ok(Self::with_source(config, source, status))
    }

    fn with_source(config: DatabaseConfig, source: TileSource, status: CacheStatus) -> Self {
        Self {
            config,
            source,
            status,
            registry: AirportRegistry::new(),
            tiles: TileIndex::new(),
        }
    }

    pub fn cache_status(&self) -> &CacheStatus {
        &self.status
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Airports currently loaded.
    pub fn registry(&self) -> &AirportRegistry {
        &self.registry
    }

    pub fn tiles(&self) -> &TileIndex {
        &self.tiles
    }

    /// Loads one tile unless it is already live. Returns the number of
    /// airports added.
    pub fn load_tile(&mut self, key: TileKey) -> usize {
        if self.tiles.contains(key) {
            return 0;
        }
        self.tiles.get_or_create(key);

        let airports = match &self.source {
            TileSource::Disk(cache) => match cache.load_tile(key) {
                Ok(airports) => airports,
                Err(e) => {
                    warn!("Could not read cache tile — tile={} error={}", key, e);
                    Vec::new()
                }
            },
            TileSource::Memory(tiles) => tiles.get(&key).cloned().unwrap_or_default(),
        };

        let mut added = 0;
        for mut apt in airports {
            if apt.tile_key() != key || apt.is_polar() {
                debug!("Ignoring misplaced cache record — icao={} tile={}", apt.icao(), key);
                continue;
            }
            if self.registry.contains(apt.icao()) {
                debug!("Ignoring duplicate cache record — icao={} tile={}", apt.icao(), key);
                continue;
            }
            if let Err(e) = apt.compute_geometry() {
                debug!("Dropping airport with unusable geometry — icao={} error={}", apt.icao(), e);
                continue;
            }
            self.tiles.link(&mut apt);
            self.registry.insert(apt);
            added += 1;
        }
        debug!("Loaded tile — tile={} airports={}", key, added);
        added
    }

    /// Loads the 3×3 tile window centred on `pos`.
    pub fn load_nearest_tiles(&mut self, pos: GeoPos2) -> usize {
        TileKey::from_pos(pos)
            .neighborhood()
            .into_iter()
            .map(|key| self.load_tile(key))
            .sum()
    }

    /// Evicts every tile outside the 3×3 window around `center`, or every
    /// tile when `center` is `None`. Returns the number of airports freed.
    pub fn unload_distant_tiles(&mut self, center: Option<GeoPos2>) -> usize {
        let mut freed = 0;
        for key in self.tiles.distant_tiles(center) {
            for icao in self.tiles.airports_in(key) {
                if let Some(apt) = self.registry.get_mut(&icao) {
                    self.tiles.unlink(apt);
                    apt.release_geometry();
                }
                self.registry.remove(&icao);
                freed += 1;
            }
            self.tiles.remove_tile(key);
            debug!("Evicted tile — tile={}", key);
        }
        freed
    }

    /// Loads the window around the aircraft and evicts what fell out of it.
    pub fn update_position(&mut self, pos: GeoPos2) {
        self.load_nearest_tiles(pos);
        self.unload_distant_tiles(Some(pos));
    }

    /// Loaded airports within the configured radius of `pos`, closest first.
    pub fn find_nearest_airports(&self, pos: GeoPos2) -> Vec<&Airport> {
        let limit = self.config.nearest_radius_nm * NM_TO_M;
        let mut found: Vec<(f64, &Airport)> = self
            .registry
            .iter()
            .map(|apt| (great_circle_distance(pos, apt.refpt().pos2()), apt))
            .filter(|(dist, _)| *dist <= limit)
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.icao().cmp(b.1.icao())));
        found.into_iter().map(|(_, apt)| apt).collect()
    }

    /// Loads the tile containing `approx_pos` and looks `icao` up.
    pub fn lookup_airport(&mut self, icao: &str, approx_pos: GeoPos2) -> Option<&Airport> {
        self.load_tile(TileKey::from_pos(approx_pos));
        self.registry.get(icao)
    }

    /// The closest loaded airport publishing a transition altitude or level,
    /// preferring those in the same country as `hint_icao` (first two letters).
    pub fn nearest_airport_with_transition_data(
        &mut self,
        approx_pos: GeoPos2,
        hint_icao: Option<&str>,
    ) -> Option<&Airport> {
        self.load_nearest_tiles(approx_pos);
        let prefix = hint_icao.and_then(|h| h.get(..2));

        let best = self
            .registry
            .iter()
            .filter(|apt| apt.ta > 0 || apt.tl > 0)
            .map(|apt| {
                let foreign = prefix.map_or(false, |p| !apt.icao().starts_with(p));
                let dist = great_circle_distance(approx_pos, apt.refpt().pos2());
                (foreign, dist, apt.icao())
            })
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1)))
            .map(|(_, _, icao)| icao.to_string())?;
        self.registry.get(&best)
    }

    /// Owned copy of what `find_nearest_airports` returns for `pos`.
    pub fn snapshot(&self, pos: GeoPos3) -> RunwaySnapshot {
        RunwaySnapshot {
            position: pos,
            airports: self
                .find_nearest_airports(pos.pos2())
                .into_iter()
                .map(|apt| AirportInfo::from_airport(apt, pos))
                .collect(),
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.unload_distant_tiles(None);
    }
}
