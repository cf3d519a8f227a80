// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Full ingestion: scenery airports, reconciled against the supplemental
//! navigation data and glide slopes, into a fresh registry.
//!
//! Passes run in strict precedence order:
//!
//! 1. scenery `apt.dat` files, highest priority first; first writer per ICAO wins
//! 2. supplemental navdata (TA/TL, reference point, threshold elevation, GPA/TCH);
//!    airports it does not list are dropped
//! 3. ILS glide slopes for ends whose glide path is still unresolved
//! 4. polar and degenerate-geometry filters

use crate::airport::{heading_number_delta, parse_runway_id, Airport};
use crate::apt_dat::{AptDatParser, Dialect};
use crate::config::{DatabaseConfig, MatchTolerances};
use crate::geo::{rel_hdg, FlatProjection};
use crate::geometry::{offsets_from_threshold, runway_vectors, tch_from_offset, RunwayVectors};
use crate::navdata::earth_nav::{self, GlideSlope};
use crate::navdata::{NavdataFiles, SupplementalAirport, SupplementalEnd};
use crate::registry::AirportRegistry;
use crate::{find_xplane_root, scenery, DbError};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;

/// The data files a build draws on, and the cycle they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSet {
    pub xplane_root: PathBuf,
    /// Scenery airport files, highest priority first.
    pub apt_dats: Vec<PathBuf>,
    pub navdata: NavdataFiles,
    pub cycle: u32,
}

impl SourceSet {
    /// Resolves the sources of the configured installation without reading
    /// any airport data.
    pub fn discover(config: &DatabaseConfig) -> Result<Self, DbError> {
        let xplane_root = config
            .xplane_root
            .clone()
            .or_else(find_xplane_root)
            .ok_or(DbError::RootNotFound)?;
        let navdata = NavdataFiles::locate(&xplane_root, config.navdata)
            .ok_or_else(|| DbError::NavdataUnavailable(xplane_root.clone()))?;
        let cycle = navdata.cycle();
        let apt_dats = scenery::apt_dat_sources(&xplane_root);
        if apt_dats.is_empty() {
            warn!(
                "No scenery airport files found — root={}",
                xplane_root.display()
            );
        }
        Ok(Self {
            xplane_root,
            apt_dats,
            navdata,
            cycle,
        })
    }

    /// Every contributing file, in precedence order.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths = self.apt_dats.clone();
        paths.extend(self.navdata.paths());
        paths
    }
}

/// Runs every pass and returns the reconciled registry. Fails only when the
/// supplemental navdata cannot be read.
pub fn ingest(sources: &SourceSet, tolerances: &MatchTolerances) -> Result<AirportRegistry, DbError> {
    let mut registry = load_scenery(&sources.apt_dats, tolerances);

    let path = sources.navdata.supplemental.path().to_path_buf();
    let supplemental = sources
        .navdata
        .supplemental
        .load()
        .map_err(|source| DbError::Navdata { path, source })?;
    apply_supplemental(&mut registry, supplemental, tolerances);

    if let Some(path) = &sources.navdata.earth_nav {
        match earth_nav::parse_file(path) {
            Ok(slopes) => apply_glide_slopes(&mut registry, &slopes, tolerances),
            Err(e) => warn!(
                "Skipping glide slope data — path={} error={}",
                path.display(),
                e
            ),
        }
    }

    let polar = registry.retain(|apt| !apt.is_polar());
    let degenerate = drop_degenerate(&mut registry);
    info!(
        "Ingestion complete — airports={} polar_dropped={} degenerate_dropped={}",
        registry.count(),
        polar,
        degenerate
    );
    Ok(registry)
}

/// Primary pass. Unreadable files are skipped.
pub fn load_scenery(apt_dats: &[PathBuf], tolerances: &MatchTolerances) -> AirportRegistry {
    let parser = AptDatParser::new(Dialect::Scenery).with_tolerances(*tolerances);
    let mut registry = AirportRegistry::new();

    for path in apt_dats {
        let airports = match parser.parse_file(path) {
            Ok((airports, _)) => airports,
            Err(e) => {
                warn!("Skipping scenery source — path={} error={}", path.display(), e);
                continue;
            }
        };
        let mut shadowed = 0usize;
        for apt in airports {
            if registry.contains(apt.icao()) {
                shadowed += 1;
                continue;
            }
            registry.insert(apt);
        }
        if shadowed > 0 {
            debug!(
                "Ignored lower-priority airport definitions — path={} count={}",
                path.display(),
                shadowed
            );
        }
    }
    registry
}

/// Supplemental pass. Airports the source does not list are dropped.
pub fn apply_supplemental(
    registry: &mut AirportRegistry,
    supplemental: Vec<SupplementalAirport>,
    tolerances: &MatchTolerances,
) {
    let by_icao: HashMap<String, SupplementalAirport> = supplemental
        .into_iter()
        .map(|s| (s.icao.clone(), s))
        .collect();

    let mut matched_ends = 0usize;
    for apt in registry.iter_mut() {
        let Some(supp) = by_icao.get(apt.icao()) else {
            continue;
        };
        apt.in_navdata = true;
        if let Some(refpt) = supp.refpt {
            apt.set_refpt(refpt);
            apt.refpt_explicit = true;
        }
        if supp.ta != 0 {
            apt.ta = supp.ta;
        }
        if supp.tl != 0 {
            apt.tl = supp.tl;
        }
        matched_ends += merge_ends(apt, &supp.ends, tolerances);
    }

    let dropped = registry.retain(|apt| apt.in_navdata);
    info!(
        "Reconciled against navdata — airports={} dropped={} matched_ends={}",
        registry.count(),
        dropped,
        matched_ends
    );
}

fn projected_runways(apt: &Airport) -> (FlatProjection, Vec<Option<RunwayVectors>>) {
    let fpp = FlatProjection::new(apt.refpt().pos2());
    let vectors = apt
        .runways()
        .iter()
        .map(|r| runway_vectors(r, &fpp).ok())
        .collect();
    (fpp, vectors)
}

/// Whether a runway identifier is within the renumbering tolerance of an end.
fn heading_matches(a: &str, b: &str, tolerances: &MatchTolerances) -> bool {
    match (parse_runway_id(a), parse_runway_id(b)) {
        (Some((ha, _)), Some((hb, _))) => heading_number_delta(ha, hb) <= tolerances.heading_units,
        _ => false,
    }
}

/// Finds the end each supplemental record describes and copies its data
/// over. Returns the number of ends matched.
fn merge_ends(apt: &mut Airport, ends: &[SupplementalEnd], tolerances: &MatchTolerances) -> usize {
    let (fpp, vectors) = projected_runways(apt);
    let mut matched = 0;

    for supp in ends {
        let p = fpp.project(supp.thr.pos2());
        let mut best: Option<(usize, usize, f64)> = None;
        for (ri, rwy) in apt.runways().iter().enumerate() {
            let Some(v) = &vectors[ri] else { continue };
            for ei in 0..2 {
                if !heading_matches(&supp.id, &rwy.ends[ei].id, tolerances) {
                    continue;
                }
                let dist = (p - v.dthr_v[ei]).len();
                if dist > tolerances.thr_pos_widths * rwy.width {
                    continue;
                }
                if best.map_or(true, |b| dist < b.2) {
                    best = Some((ri, ei, dist));
                }
            }
        }

        match best {
            Some((ri, ei, _)) => {
                let end = &mut apt.runways_mut()[ri].ends[ei];
                end.thr.elev = supp.thr.elev;
                end.resolve_glide_path(supp.gpa, supp.tch);
                matched += 1;
            }
            None => debug!(
                "Navdata runway end matches no scenery end — icao={} rwy={}",
                apt.icao(),
                supp.id
            ),
        }
    }
    matched
}

/// Picks the end a glide slope serves. An end carrying the record's exact
/// identifier is authoritative; otherwise the unresolved end with a matching
/// heading number and course whose centreline lies nearest the antenna wins.
/// Returns the end and the antenna's distance past its threshold.
fn glide_slope_target(
    apt: &Airport,
    gs: &GlideSlope,
    tolerances: &MatchTolerances,
) -> Option<(usize, usize, f64)> {
    let (fpp, vectors) = projected_runways(apt);
    let p = fpp.project(gs.pos.pos2());
    let aligned = |ri: usize, ei: usize| {
        vectors[ri]
            .as_ref()
            .filter(|v| rel_hdg(v.landing_dir(ei).heading(), gs.hdg).abs() <= tolerances.gs_heading_deg)
            .map(|v| offsets_from_threshold(v, ei, p))
    };

    if let Some((ri, ei)) = apt.find_runway_end(&gs.rwy_id) {
        if apt.runways()[ri].ends[ei].glide_path_resolved() {
            debug!(
                "Glide slope end already resolved — icao={} rwy={}",
                apt.icao(),
                gs.rwy_id
            );
            return None;
        }
        return aligned(ri, ei).map(|(long, _)| (ri, ei, long));
    }

    let mut best: Option<(usize, usize, f64, f64)> = None;
    for (ri, rwy) in apt.runways().iter().enumerate() {
        for (ei, end) in rwy.ends.iter().enumerate() {
            if end.glide_path_resolved() || !heading_matches(&gs.rwy_id, &end.id, tolerances) {
                continue;
            }
            let Some((long, lat)) = aligned(ri, ei) else { continue };
            if lat.abs() > tolerances.vgsi_lateral_widths * rwy.width {
                continue;
            }
            if best.map_or(true, |b| lat.abs() < b.3) {
                best = Some((ri, ei, long, lat.abs()));
            }
        }
    }
    best.map(|(ri, ei, long, _)| (ri, ei, long))
}

/// Glide slope pass: only ends whose glide path is still unknown.
pub fn apply_glide_slopes(
    registry: &mut AirportRegistry,
    slopes: &[GlideSlope],
    tolerances: &MatchTolerances,
) {
    let mut applied = 0usize;
    for gs in slopes {
        let Some(apt) = registry.get_mut(&gs.icao) else {
            continue;
        };
        let Some((ri, ei, long)) = glide_slope_target(apt, gs, tolerances) else {
            continue;
        };
        let end = &mut apt.runways_mut()[ri].ends[ei];
        if end.resolve_glide_path(gs.gpa, tch_from_offset(gs.gpa, long)) {
            applied += 1;
        }
    }
    info!(
        "Applied glide slopes — glide_slopes={} applied={}",
        slopes.len(),
        applied
    );
}

/// Drops airports whose runways cannot produce geometry.
fn drop_degenerate(registry: &mut AirportRegistry) -> usize {
    let mut bad = Vec::new();
    for apt in registry.iter_mut() {
        match apt.compute_geometry() {
            Ok(()) => apt.release_geometry(),
            Err(e) => {
                debug!("Dropping airport with unusable geometry — icao={} error={}", apt.icao(), e);
                bad.push(apt.icao().to_string());
            }
        }
    }
    for icao in &bad {
        registry.remove(icao);
    }
    bad.len()
}
