// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! 1°×1° geo-tile index. Tiles hold ICAO handles into the registry, never the
//! airports themselves.

use crate::airport::Airport;
use crate::geo::{lon_delta, GeoPos2};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub lat: i32,
    pub lon: i32,
}

impl TileKey {
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    pub fn from_pos(pos: GeoPos2) -> Self {
        let lat = (pos.lat.floor() as i32).clamp(-90, 89);
        // 180.0 belongs to the -180 tile
        let lon = wrap_lon(pos.lon.floor() as i32);
        Self { lat, lon }
    }

    /// South-west corner of the 10°×10° macro tile this tile belongs to.
    pub fn macro_key(&self) -> (i32, i32) {
        (
            self.lat.div_euclid(10) * 10,
            self.lon.div_euclid(10) * 10,
        )
    }

    /// This tile and its eight neighbours. Longitude wraps across the
    /// antimeridian; latitude is clamped at the poles.
    pub fn neighborhood(&self) -> Vec<TileKey> {
        let mut keys = Vec::with_capacity(9);
        for dlat in -1..=1 {
            let lat = self.lat + dlat;
            if !(-90..=89).contains(&lat) {
                continue;
            }
            for dlon in -1..=1 {
                keys.push(TileKey::new(lat, wrap_lon(self.lon + dlon)));
            }
        }
        keys
    }

    /// Whether this tile lies in the 3×3 window centred on the tile of `center`.
    pub fn is_within_window(&self, center: GeoPos2) -> bool {
        let c = TileKey::from_pos(center);
        let dlat = (self.lat - c.lat).abs();
        let dlon = lon_delta(c.lon as f64, self.lon as f64).abs();
        dlat <= 1 && dlon <= 1.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+03}{:+04}", self.lat, self.lon)
    }
}

fn wrap_lon(lon: i32) -> i32 {
    (lon + 180).rem_euclid(360) - 180
}

#[derive(Debug, Clone, Default)]
pub struct Tile {
    airports: BTreeSet<String>,
}

impl Tile {
    pub fn airports(&self) -> impl Iterator<Item = &str> {
        self.airports.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TileIndex {
    tiles: BTreeMap<TileKey, Tile>,
}

impl TileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: TileKey) -> bool {
        self.tiles.contains_key(&key)
    }

    pub fn get(&self, key: TileKey) -> Option<&Tile> {
        self.tiles.get(&key)
    }

    /// Returns the tile and whether it was created by this call.
    pub fn get_or_create(&mut self, key: TileKey) -> (&mut Tile, bool) {
        let created = !self.tiles.contains_key(&key);
        (self.tiles.entry(key).or_default(), created)
    }

    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        self.tiles.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Links `airport` into the tile of its reference point, creating the
    /// tile if needed. Panics if the airport is already linked.
    pub fn link(&mut self, airport: &mut Airport) {
        assert!(
            airport.tile.is_none(),
            "{} is already linked into tile {:?}",
            airport.icao(),
            airport.tile
        );
        let key = airport.tile_key();
        let (tile, _) = self.get_or_create(key);
        let inserted = tile.airports.insert(airport.icao().to_string());
        assert!(inserted, "{} already present in tile {}", airport.icao(), key);
        airport.tile = Some(key);
    }

    /// Removes `airport` from its tile. Panics if the tile does not list it.
    pub fn unlink(&mut self, airport: &mut Airport) {
        let key = airport
            .tile
            .take()
            .unwrap_or_else(|| panic!("{} is not tile-linked", airport.icao()));
        let removed = self
            .tiles
            .get_mut(&key)
            .map(|t| t.airports.remove(airport.icao()))
            .unwrap_or(false);
        assert!(removed, "{} missing from its tile {}", airport.icao(), key);
    }

    /// ICAO handles of the airports in `key`, if the tile is present.
    pub fn airports_in(&self, key: TileKey) -> Vec<String> {
        self.tiles
            .get(&key)
            .map(|t| t.airports.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes an empty tile. Panics if airports are still linked into it.
    pub fn remove_tile(&mut self, key: TileKey) {
        if let Some(tile) = self.tiles.remove(&key) {
            assert!(
                tile.is_empty(),
                "tile {} removed with {} airports still linked",
                key,
                tile.len()
            );
        }
    }

    /// Tiles outside the 3×3 window around `center`; every tile when `center`
    /// is `None`.
    pub fn distant_tiles(&self, center: Option<GeoPos2>) -> Vec<TileKey> {
        self.tiles
            .keys()
            .filter(|k| match center {
                Some(c) => !k.is_within_window(c),
                None => true,
            })
            .copied()
            .collect()
    }
}
