// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Owning store of all currently known airports, keyed by ICAO code.

use crate::airport::{is_valid_icao, Airport};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct AirportRegistry {
    airports: BTreeMap<String, Airport>,
}

impl AirportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of `airport`. A duplicate ICAO, an invalid code or an
    /// airport without runways is a logic error and panics; callers check
    /// `contains` first when duplicates are expected.
    pub fn insert(&mut self, airport: Airport) {
        assert!(
            is_valid_icao(airport.icao()),
            "invalid ICAO code {:?} inserted",
            airport.icao()
        );
        assert!(
            !airport.runways().is_empty(),
            "airport {} inserted without runways",
            airport.icao()
        );
        let icao = airport.icao().to_string();
        let previous = self.airports.insert(icao.clone(), airport);
        assert!(previous.is_none(), "duplicate airport {} inserted", icao);
    }

    pub fn get(&self, icao: &str) -> Option<&Airport> {
        self.airports.get(icao)
    }

    pub fn get_mut(&mut self, icao: &str) -> Option<&mut Airport> {
        self.airports.get_mut(icao)
    }

    pub fn contains(&self, icao: &str) -> bool {
        self.airports.contains_key(icao)
    }

    /// Removes and returns an airport. It must have been unlinked from its
    /// tile beforehand.
    pub fn remove(&mut self, icao: &str) -> Option<Airport> {
        if let Some(apt) = self.airports.get(icao) {
            assert!(
                !apt.is_tile_linked(),
                "airport {} removed while still tile-linked",
                icao
            );
        }
        self.airports.remove(icao)
    }

    /// Keeps only the airports for which `keep` returns true. Only valid for
    /// registries whose airports are not tile-linked.
    pub fn retain<F: FnMut(&Airport) -> bool>(&mut self, mut keep: F) -> usize {
        let before = self.airports.len();
        self.airports.retain(|icao, apt| {
            let k = keep(apt);
            assert!(
                k || !apt.is_tile_linked(),
                "airport {} dropped while still tile-linked",
                icao
            );
            k
        });
        before - self.airports.len()
    }

    /// Airports in ICAO order.
    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.airports.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Airport> {
        self.airports.values_mut()
    }

    pub fn count(&self) -> usize {
        self.airports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn into_airports(self) -> impl Iterator<Item = Airport> {
        self.airports.into_values()
    }
}
