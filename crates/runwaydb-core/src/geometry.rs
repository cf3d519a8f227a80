// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Runway geometry engine.
//!
//! Turns raw threshold coordinates and declared distances into projected
//! threshold vectors and the safety-zone polygons consumed by the advisory
//! logic. Everything here is a pure function of the airport reference point
//! and the runway records.

use crate::airport::{EndGeometry, Runway, RunwayGeometry};
use crate::geo::{meters_to_feet, FlatProjection, Vect2};
use thiserror::Error;

/// Length of the approach corridor measured outward from the threshold.
pub const APCH_BBOX_LEN: f64 = 5500.0;
/// Lateral spread of the approach corridor, degrees either side.
pub const APCH_BBOX_SPREAD_DEG: f64 = 3.3;
/// Longitudinal reach of the proximity zone beyond each threshold (2000 ft).
pub const PROX_LON_DISPL: f64 = 609.6;
pub const PROX_WIDTH_FACTOR: f64 = 3.0;
/// Runways shorter than this are treated as broken data.
const MIN_RUNWAY_LEN: f64 = 1.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("geometry of {0} is already computed")]
    AlreadyComputed(String),
    #[error("runway {0} is degenerate: {1}")]
    DegenerateRunway(String, String),
}

/// Threshold vectors of a runway in some flat projection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunwayVectors {
    pub thr_v: [Vect2; 2],
    pub dthr_v: [Vect2; 2],
    /// Unit vector from end 0 towards end 1.
    pub dir: Vect2,
    /// Distance between the raw thresholds.
    pub raw_len: f64,
    /// Distance between the displaced thresholds.
    pub length: f64,
}

impl RunwayVectors {
    /// Landing direction when approaching end `i`.
    pub fn landing_dir(&self, i: usize) -> Vect2 {
        if i == 0 {
            self.dir
        } else {
            -self.dir
        }
    }
}

pub(crate) fn runway_vectors(
    rwy: &Runway,
    fpp: &FlatProjection,
) -> Result<RunwayVectors, GeometryError> {
    let thr0 = fpp.project(rwy.ends[0].thr.pos2());
    let thr1 = fpp.project(rwy.ends[1].thr.pos2());
    let raw = thr1 - thr0;
    let raw_len = raw.len();
    if raw_len < MIN_RUNWAY_LEN {
        return Err(GeometryError::DegenerateRunway(
            rwy.joint_id().to_string(),
            format!("thresholds only {:.2} m apart", raw_len),
        ));
    }
    let (displ0, displ1) = (rwy.ends[0].displ, rwy.ends[1].displ);
    if displ0 < 0.0 || displ1 < 0.0 || displ0 + displ1 >= raw_len {
        return Err(GeometryError::DegenerateRunway(
            rwy.joint_id().to_string(),
            format!(
                "displacements {:.1} m + {:.1} m exceed length {:.1} m",
                displ0, displ1, raw_len
            ),
        ));
    }
    let dir = raw.unit();
    let dthr0 = thr0 + dir * displ0;
    let dthr1 = thr1 - dir * displ1;
    Ok(RunwayVectors {
        thr_v: [thr0, thr1],
        dthr_v: [dthr0, dthr1],
        dir,
        raw_len,
        length: (dthr1 - dthr0).len(),
    })
}

/// Rectangle along `dir` starting at `start`, `len` long, pulled back by
/// `back` and pushed forward by `fwd`. Corners run right-near, right-far,
/// left-far, left-near.
pub fn runway_rect(start: Vect2, dir: Vect2, width: f64, len: f64, back: f64, fwd: f64) -> Vec<Vect2> {
    let dir = dir.unit();
    let half = dir.right_normal() * (width / 2.0);
    let near = start - dir * back;
    let far = start + dir * (len + fwd);
    vec![near + half, far + half, far - half, near - half]
}

/// Threshold crossing height in feet for a glide path of `gpa` degrees whose
/// origin lies `long_offset` metres beyond the threshold.
pub fn tch_from_offset(gpa: f64, long_offset: f64) -> f64 {
    meters_to_feet(gpa.to_radians().sin() * long_offset.max(0.0))
}

/// Computes geometry for every runway of an airport. Fails as a whole if any
/// runway is degenerate.
pub(crate) fn compute_runways(
    runways: &[Runway],
    fpp: &FlatProjection,
) -> Result<Vec<RunwayGeometry>, GeometryError> {
    let vectors = runways
        .iter()
        .map(|r| runway_vectors(r, fpp))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runways
        .iter()
        .enumerate()
        .map(|(idx, rwy)| runway_geometry(idx, rwy, runways, &vectors))
        .collect())
}

fn runway_geometry(
    idx: usize,
    rwy: &Runway,
    runways: &[Runway],
    vectors: &[RunwayVectors],
) -> RunwayGeometry {
    let v = &vectors[idx];
    let (e0, e1) = (&rwy.ends[0], &rwy.ends[1]);
    let prox_back = e0.displ.max(PROX_LON_DISPL - e0.displ);
    let prox_fwd = e1.displ.max(PROX_LON_DISPL - e1.displ);

    let ends = [0, 1].map(|i| EndGeometry {
        thr_v: v.thr_v[i],
        dthr_v: v.dthr_v[i],
        hdg: v.landing_dir(i).heading(),
        land_len: v.raw_len - rwy.ends[i].displ,
        apch_bbox: approach_bbox(idx, i, rwy, runways, vectors),
    });

    RunwayGeometry {
        length: v.length,
        rwy_bbox: runway_rect(v.dthr_v[0], v.dir, rwy.width, v.length, 0.0, 0.0),
        tora_bbox: runway_rect(v.thr_v[0], v.dir, rwy.width, v.raw_len, 0.0, 0.0),
        asda_bbox: runway_rect(v.thr_v[0], v.dir, rwy.width, v.raw_len, e0.blast, e1.blast),
        prox_bbox: runway_rect(
            v.dthr_v[0],
            v.dir,
            PROX_WIDTH_FACTOR * rwy.width,
            v.length,
            prox_back,
            prox_fwd,
        ),
        ends,
    }
}

/// Approach corridor for end `end` of runway `idx`, clipped against parallel
/// runways sharing its numeric heading.
fn approach_bbox(
    idx: usize,
    end: usize,
    rwy: &Runway,
    runways: &[Runway],
    vectors: &[RunwayVectors],
) -> Vec<Vect2> {
    let v = &vectors[idx];
    let thr = v.dthr_v[end];
    let dir = v.landing_dir(end);
    let right = dir.right_normal();
    let far = thr - dir * APCH_BBOX_LEN;
    let near_hw = rwy.width / 2.0;
    let far_hw = near_hw + APCH_BBOX_LEN * APCH_BBOX_SPREAD_DEG.to_radians().tan();

    let mut limit_right = f64::INFINITY;
    let mut limit_left = f64::INFINITY;
    if let Some(hdg) = rwy.ends[end].heading_number() {
        for (j, other) in runways.iter().enumerate() {
            if j == idx {
                continue;
            }
            for (k, other_end) in other.ends.iter().enumerate() {
                if other_end.heading_number() != Some(hdg) {
                    continue;
                }
                let offset = (vectors[j].dthr_v[k] - thr).dot(right);
                if offset > 0.0 {
                    limit_right = limit_right.min(offset / 2.0);
                } else if offset < 0.0 {
                    limit_left = limit_left.min(-offset / 2.0);
                }
            }
        }
    }

    vec![
        thr + right * near_hw.min(limit_right),
        far + right * far_hw.min(limit_right),
        far - right * far_hw.min(limit_left),
        thr - right * near_hw.min(limit_left),
    ]
}

/// Position along the landing direction of end `end` measured from its
/// displaced threshold, and the signed lateral offset (positive = right).
pub(crate) fn offsets_from_threshold(v: &RunwayVectors, end: usize, p: Vect2) -> (f64, f64) {
    let dir = v.landing_dir(end);
    let d = p - v.dthr_v[end];
    (d.dot(dir), d.dot(dir.right_normal()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport::{Airport, RunwayEnd};
    use crate::geo::{polygon_area, polygon_centroid, GeoPos2, GeoPos3, EARTH_RADIUS_M};

    const LAT0: f64 = 47.45;
    const LON0: f64 = -122.30;

    fn north_of(m: f64) -> f64 {
        LAT0 + (m / EARTH_RADIUS_M).to_degrees()
    }

    fn east_of(m: f64) -> f64 {
        LON0 + (m / (EARTH_RADIUS_M * LAT0.to_radians().cos())).to_degrees()
    }

    /// North/south runway of `len` metres with end 0 (south, heading 36) at
    /// `east` metres east of the origin.
    fn ns_runway(id0: &str, id1: &str, east: f64, len: f64, width: f64) -> Runway {
        Runway::new(
            width,
            [
                RunwayEnd::new(id0, GeoPos3::new(LAT0, east_of(east), 0.0), 0.0, 0.0),
                RunwayEnd::new(id1, GeoPos3::new(north_of(len), east_of(east), 0.0), 0.0, 0.0),
            ],
        )
    }

    fn airport(runways: Vec<Runway>) -> Airport {
        let mut apt = Airport::new("KSEA", GeoPos3::new(LAT0, LON0, 0.0));
        for r in runways {
            apt.add_runway(r);
        }
        apt
    }

    #[test]
    fn test_rwy_bbox_matches_runway_dimensions() {
        let mut apt = airport(vec![ns_runway("34L", "16R", 0.0, 3600.0, 45.0)]);
        apt.compute_geometry().unwrap();
        let g = apt.runways()[0].geometry().unwrap();

        assert!((g.length - 3600.0).abs() < 1.0, "length={}", g.length);
        let area = polygon_area(&g.rwy_bbox);
        assert!((area - 3600.0 * 45.0).abs() / (3600.0 * 45.0) < 0.001, "area={}", area);

        // Centre of the box lies on the centreline midpoint
        let mid = (g.ends[0].dthr_v + g.ends[1].dthr_v) * 0.5;
        let c = polygon_centroid(&g.rwy_bbox);
        assert!((c - mid).len() < 0.01);
        assert!((g.ends[0].hdg - 0.0).abs() < 0.1 || (g.ends[0].hdg - 360.0).abs() < 0.1);
        assert!((g.ends[1].hdg - 180.0).abs() < 0.1);
    }

    #[test]
    fn test_displacement_shortens_length_and_extends_prox() {
        let mut rwy = ns_runway("34L", "16R", 0.0, 3000.0, 45.0);
        rwy.ends[0].displ = 300.0;
        rwy.ends[1].blast = 100.0;
        let mut apt = airport(vec![rwy]);
        apt.compute_geometry().unwrap();
        let g = apt.runways()[0].geometry().unwrap();

        assert!((g.length - 2700.0).abs() < 1.0);
        assert!((g.ends[0].land_len - 2700.0).abs() < 1.0);
        assert!((g.ends[1].land_len - 3000.0).abs() < 1.0);
        assert!((polygon_area(&g.tora_bbox) - 3000.0 * 45.0).abs() < 200.0);
        assert!((polygon_area(&g.asda_bbox) - 3100.0 * 45.0).abs() < 200.0);
        // max(300, 609.6 - 300) + 2700 + max(0, 609.6)
        let prox_len = 309.6 + 2700.0 + 609.6;
        assert!((polygon_area(&g.prox_bbox) - prox_len * 135.0).abs() < 1000.0);
    }

    #[test]
    fn test_approach_box_tapers_outward() {
        let mut apt = airport(vec![ns_runway("36", "18", 0.0, 2500.0, 45.0)]);
        apt.compute_geometry().unwrap();
        let g = apt.runways()[0].geometry().unwrap();
        let apch = &g.ends[0].apch_bbox;

        // End 0 lands northbound, so its corridor lies to the south
        assert!(apch[1].y < -5000.0 && apch[2].y < -5000.0);
        let near_w = (apch[0] - apch[3]).len();
        let far_w = (apch[1] - apch[2]).len();
        assert!((near_w - 45.0).abs() < 0.01);
        let expected = 45.0 + 2.0 * APCH_BBOX_LEN * APCH_BBOX_SPREAD_DEG.to_radians().tan();
        assert!((far_w - expected).abs() < 0.01);
    }

    #[test]
    fn test_parallel_runway_shears_approach_box() {
        // 34L west, 34R 400 m east
        let mut apt = airport(vec![
            ns_runway("34L", "16R", 0.0, 3000.0, 45.0),
            ns_runway("34R", "16L", 400.0, 3000.0, 45.0),
        ]);
        apt.compute_geometry().unwrap();
        let left = &apt.runways()[0].geometry().unwrap().ends[0].apch_bbox;
        let right = &apt.runways()[1].geometry().unwrap().ends[0].apch_bbox;

        // Landing northbound: right side is east. 34L clipped at +200 m east.
        assert!((left[1].x - 200.0).abs() < 0.5, "x={}", left[1].x);
        // Unclipped on the far side
        assert!(left[2].x < -300.0);
        // 34R clipped at 200 m west of itself
        assert!((right[2].x - 200.0).abs() < 0.5, "x={}", right[2].x);
        assert!(right[1].x > 700.0);
    }

    #[test]
    fn test_compute_is_not_repeatable_until_released() {
        let mut apt = airport(vec![ns_runway("34L", "16R", 0.0, 3000.0, 45.0)]);
        apt.compute_geometry().unwrap();
        assert_eq!(
            apt.compute_geometry(),
            Err(GeometryError::AlreadyComputed("KSEA".into()))
        );
        apt.release_geometry();
        assert!(!apt.geometry_computed());
        assert!(apt.runways()[0].geometry().is_none());
        apt.compute_geometry().unwrap();
        assert!(apt.runways()[0].geometry().is_some());
    }

    #[test]
    fn test_degenerate_runway_rejected() {
        let mut rwy = ns_runway("34L", "16R", 0.0, 500.0, 45.0);
        rwy.ends[0].displ = 300.0;
        rwy.ends[1].displ = 300.0;
        let mut apt = airport(vec![rwy]);
        assert!(matches!(
            apt.compute_geometry(),
            Err(GeometryError::DegenerateRunway(..))
        ));
        assert!(!apt.geometry_computed());
    }

    #[test]
    fn test_offsets_from_threshold() {
        let rwy = ns_runway("36", "18", 0.0, 2000.0, 45.0);
        let fpp = FlatProjection::new(GeoPos2::new(LAT0, LON0));
        let v = runway_vectors(&rwy, &fpp).unwrap();
        let (long, lat) = offsets_from_threshold(&v, 0, Vect2::new(20.0, 300.0));
        assert!((long - 300.0).abs() < 0.1);
        assert!((lat - 20.0).abs() < 0.1);
        // From the other end, the same point is far down the runway and on the left
        let (long, lat) = offsets_from_threshold(&v, 1, Vect2::new(20.0, 300.0));
        assert!((long - 1700.0).abs() < 0.5);
        assert!((lat + 20.0).abs() < 0.1);
    }

    #[test]
    fn test_tch_from_offset() {
        assert_eq!(tch_from_offset(3.0, -10.0), 0.0);
        let tch = tch_from_offset(3.0, 300.0);
        assert!((tch - 51.5).abs() < 0.1, "tch={}", tch);
    }
}
