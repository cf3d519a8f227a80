// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Owned copy of the runways near the aircraft, for consumers on other
//! threads. The database itself is single-threaded; the snapshot is the only
//! value meant to cross threads.

use crate::airport::Airport;
use crate::geo::{great_circle_distance, GeoPos3, NM_TO_M};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct RunwayEndInfo {
    pub id: String,
    pub thr: GeoPos3,
    pub hdg: f64,
    pub land_len: f64,
    pub gpa: f64,
    pub tch: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunwayInfo {
    pub joint_id: String,
    pub width: f64,
    pub length: f64,
    pub ends: [RunwayEndInfo; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirportInfo {
    pub icao: String,
    pub refpt: GeoPos3,
    pub ta: i32,
    pub tl: i32,
    /// Great-circle distance from the snapshot position, nautical miles.
    pub dist_nm: f64,
    pub runways: Vec<RunwayInfo>,
}

impl AirportInfo {
    /// Copies an airport whose geometry is computed.
    pub fn from_airport(apt: &Airport, pos: GeoPos3) -> Self {
        let runways = apt
            .runways()
            .iter()
            .filter_map(|rwy| {
                let g = rwy.geometry()?;
                let ends = [0, 1].map(|i| RunwayEndInfo {
                    id: rwy.ends[i].id.clone(),
                    thr: rwy.ends[i].thr,
                    hdg: g.ends[i].hdg,
                    land_len: g.ends[i].land_len,
                    gpa: rwy.ends[i].gpa,
                    tch: rwy.ends[i].tch,
                });
                Some(RunwayInfo {
                    joint_id: rwy.joint_id().to_string(),
                    width: rwy.width,
                    length: g.length,
                    ends,
                })
            })
            .collect();
        Self {
            icao: apt.icao().to_string(),
            refpt: apt.refpt(),
            ta: apt.ta,
            tl: apt.tl,
            dist_nm: great_circle_distance(pos.pos2(), apt.refpt().pos2()) / NM_TO_M,
            runways,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunwaySnapshot {
    pub position: GeoPos3,
    /// Closest first.
    pub airports: Vec<AirportInfo>,
}

/// Single-slot handoff between the database thread and a reader.
#[derive(Debug, Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<Mutex<Option<RunwaySnapshot>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: RunwaySnapshot) {
        let mut slot = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(snapshot);
    }

    /// Clone of the most recently published snapshot.
    pub fn latest(&self) -> Option<RunwaySnapshot> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
