// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::geo::{geo_to_ecef, lon_delta, FlatProjection, GeoPos2, GeoPos3, Vect2, Vect3};
use crate::geometry::{self, GeometryError};
use crate::tiles::TileKey;
use regex::Regex;
use std::sync::OnceLock;

/// Airports pole-ward of this latitude are never retained.
pub const MAX_AIRPORT_LAT: f64 = 80.0;

pub fn is_valid_icao(code: &str) -> bool {
    static RE_ICAO: OnceLock<Regex> = OnceLock::new();
    let re = RE_ICAO.get_or_init(|| Regex::new(r"^[A-Z]{4}$").unwrap());
    re.is_match(code)
}

/// Splits a runway end identifier such as `16R`, `09`, `4` or `34LT` into its
/// numeric heading and suffix. Returns `None` for anything else (helipads,
/// water lanes like `N`).
pub fn parse_runway_id(id: &str) -> Option<(u32, &str)> {
    static RE_RWY: OnceLock<Regex> = OnceLock::new();
    let re = RE_RWY.get_or_init(|| Regex::new(r"^(\d{1,2})([LRC]?T?)$").unwrap());
    let caps = re.captures(id)?;
    let hdg: u32 = caps.get(1)?.as_str().parse().ok()?;
    if !(1..=36).contains(&hdg) {
        return None;
    }
    Some((hdg, caps.get(2).map_or("", |m| m.as_str())))
}

/// Difference between two runway heading numbers, wrapping `36` to `01`.
pub fn heading_number_delta(a: u32, b: u32) -> u32 {
    let d = a.abs_diff(b) % 36;
    d.min(36 - d)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunwayEnd {
    pub id: String,
    /// Undisplaced threshold; elevation in feet.
    pub thr: GeoPos3,
    /// Threshold displacement in metres.
    pub displ: f64,
    /// Stopway / blast pad length in metres.
    pub blast: f64,
    /// Glide path angle in degrees, `0` while unknown.
    pub gpa: f64,
    /// Threshold crossing height in feet, `0` while unknown.
    pub tch: f64,
}

impl RunwayEnd {
    pub fn new(id: &str, thr: GeoPos3, displ: f64, blast: f64) -> Self {
        Self {
            id: id.to_string(),
            thr,
            displ,
            blast,
            gpa: 0.0,
            tch: 0.0,
        }
    }

    pub fn heading_number(&self) -> Option<u32> {
        parse_runway_id(&self.id).map(|(h, _)| h)
    }

    pub fn glide_path_resolved(&self) -> bool {
        self.gpa != 0.0
    }

    /// Sets GPA/TCH unless already resolved. Returns whether it was applied.
    pub fn resolve_glide_path(&mut self, gpa: f64, tch: f64) -> bool {
        if self.glide_path_resolved() || gpa <= 0.0 {
            return false;
        }
        self.gpa = gpa;
        self.tch = tch;
        true
    }
}

/// Derived data for one runway end, valid while the airport's geometry is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct EndGeometry {
    /// Projected raw threshold.
    pub thr_v: Vect2,
    /// Projected displaced threshold.
    pub dthr_v: Vect2,
    /// True heading of the landing direction.
    pub hdg: f64,
    /// Landing distance available in metres.
    pub land_len: f64,
    /// Airborne approach corridor.
    pub apch_bbox: Vec<Vect2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunwayGeometry {
    /// Distance between the displaced thresholds, metres.
    pub length: f64,
    pub ends: [EndGeometry; 2],
    pub rwy_bbox: Vec<Vect2>,
    pub tora_bbox: Vec<Vect2>,
    pub asda_bbox: Vec<Vect2>,
    pub prox_bbox: Vec<Vect2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    /// Width in metres.
    pub width: f64,
    pub ends: [RunwayEnd; 2],
    joint_id: String,
    geometry: Option<RunwayGeometry>,
}

impl Runway {
    pub fn new(width: f64, ends: [RunwayEnd; 2]) -> Self {
        let joint_id = format!("{}{}", ends[0].id, ends[1].id);
        Self {
            width,
            ends,
            joint_id,
            geometry: None,
        }
    }

    pub fn joint_id(&self) -> &str {
        &self.joint_id
    }

    /// `None` until the owning airport's geometry has been computed.
    pub fn geometry(&self) -> Option<&RunwayGeometry> {
        self.geometry.as_ref()
    }

    pub fn end_index(&self, id: &str) -> Option<usize> {
        self.ends.iter().position(|e| e.id == id)
    }

    fn same_ends(&self, other: &Runway) -> bool {
        let (a, b) = (&self.ends[0].id, &self.ends[1].id);
        let (c, d) = (&other.ends[0].id, &other.ends[1].id);
        (a == c && b == d) || (a == d && b == c)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    icao: String,
    refpt: GeoPos3,
    /// Whether the reference point came from a source rather than being
    /// derived from the first runway.
    pub refpt_explicit: bool,
    /// Transition altitude in feet, `0` if unknown.
    pub ta: i32,
    /// Transition level in feet, `0` if unknown.
    pub tl: i32,
    /// Present in the authoritative navigation data.
    pub in_navdata: bool,
    runways: Vec<Runway>,
    ecef: Vect3,
    fpp: Option<FlatProjection>,
    pub(crate) tile: Option<TileKey>,
}

impl Airport {
    pub fn new(icao: &str, refpt: GeoPos3) -> Self {
        Self {
            icao: icao.to_string(),
            refpt,
            refpt_explicit: false,
            ta: 0,
            tl: 0,
            in_navdata: false,
            runways: Vec::new(),
            ecef: geo_to_ecef(refpt),
            fpp: None,
            tile: None,
        }
    }

    pub fn icao(&self) -> &str {
        &self.icao
    }

    pub fn refpt(&self) -> GeoPos3 {
        self.refpt
    }

    pub fn ecef(&self) -> Vect3 {
        self.ecef
    }

    pub fn tile_key(&self) -> TileKey {
        TileKey::from_pos(self.refpt.pos2())
    }

    pub fn is_tile_linked(&self) -> bool {
        self.tile.is_some()
    }

    pub fn is_polar(&self) -> bool {
        self.refpt.lat.abs() >= MAX_AIRPORT_LAT
    }

    /// Moves the reference point. Panics if geometry is computed or the
    /// airport is linked into a tile, since both depend on it.
    pub fn set_refpt(&mut self, refpt: GeoPos3) {
        assert!(
            self.fpp.is_none(),
            "reference point of {} changed while geometry is computed",
            self.icao
        );
        assert!(
            self.tile.is_none(),
            "reference point of {} changed while tile-linked",
            self.icao
        );
        self.refpt = refpt;
        self.ecef = geo_to_ecef(refpt);
    }

    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    /// Mutable runway access; panics while geometry is computed.
    pub fn runways_mut(&mut self) -> &mut [Runway] {
        assert!(
            self.fpp.is_none(),
            "runways of {} edited while geometry is computed",
            self.icao
        );
        &mut self.runways
    }

    /// Adds a runway unless one with the same pair of end identifiers exists.
    pub fn add_runway(&mut self, rwy: Runway) -> bool {
        assert!(self.fpp.is_none(), "runway added to {} while geometry is computed", self.icao);
        if self.runways.iter().any(|r| r.same_ends(&rwy)) {
            return false;
        }
        self.runways.push(rwy);
        true
    }

    /// Midpoint of the first runway's raw thresholds, the fallback reference
    /// point for airports that publish none.
    pub fn first_runway_midpoint(&self) -> Option<GeoPos2> {
        let rwy = self.runways.first()?;
        let (a, b) = (rwy.ends[0].thr, rwy.ends[1].thr);
        Some(GeoPos2::new(
            (a.lat + b.lat) / 2.0,
            a.lon + lon_delta(a.lon, b.lon) / 2.0,
        ))
    }

    /// Looks up a runway end by identifier, returning `(runway, end)` indexes.
    pub fn find_runway_end(&self, id: &str) -> Option<(usize, usize)> {
        self.runways
            .iter()
            .enumerate()
            .find_map(|(i, r)| r.end_index(id).map(|e| (i, e)))
    }

    pub fn geometry_computed(&self) -> bool {
        self.fpp.is_some()
    }

    /// Flat-earth projection anchored at the reference point, present while
    /// geometry is computed.
    pub fn fpp(&self) -> Option<&FlatProjection> {
        self.fpp.as_ref()
    }

    /// Computes the projection and every runway's geometry. All-or-nothing;
    /// fails without side effects if already computed or a runway is degenerate.
    pub fn compute_geometry(&mut self) -> Result<(), GeometryError> {
        if self.fpp.is_some() {
            return Err(GeometryError::AlreadyComputed(self.icao.clone()));
        }
        let fpp = FlatProjection::new(self.refpt.pos2());
        let computed = geometry::compute_runways(&self.runways, &fpp)?;
        for (rwy, geom) in self.runways.iter_mut().zip(computed) {
            rwy.geometry = Some(geom);
        }
        self.fpp = Some(fpp);
        Ok(())
    }

    pub fn release_geometry(&mut self) {
        for rwy in &mut self.runways {
            rwy.geometry = None;
        }
        self.fpp = None;
    }
}
