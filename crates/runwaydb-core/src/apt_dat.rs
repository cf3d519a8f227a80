// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Line-oriented parser for X-Plane `apt.dat` airport files and for the
//! tile files of the on-disk cache, which reuse the same row layout.
//!
//! Only the rows relevant to runway awareness are interpreted:
//!
//! | Row    | Meaning                                  |
//! |--------|------------------------------------------|
//! | `1`    | land airport header                      |
//! | `16`/`17` | seaplane base / heliport (skipped)    |
//! | `21`   | lighting object (VASI/PAPI)              |
//! | `100`  | land runway                              |
//! | `1302` | airport metadata                         |
//! | `99`   | end of file                              |

use crate::airport::{is_valid_icao, Airport, Runway, RunwayEnd};
use crate::config::MatchTolerances;
use crate::geo::{rel_hdg, FlatProjection, GeoPos2, GeoPos3};
use crate::geometry::{offsets_from_threshold, runway_vectors, tch_from_offset};
use flate2::read::GzDecoder;
use log::{debug, info};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Fields of a primary-format runway row.
const RWY_FIELDS: usize = 26;
/// Cache runway rows append GPA, TCH and threshold elevation for both ends.
const CACHE_RWY_FIELDS: usize = RWY_FIELDS + 6;

#[derive(Error, Debug)]
pub enum AptDatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which flavour of the row format is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Scenery `apt.dat` as shipped with X-Plane or add-on packs.
    Scenery,
    /// Cache tile files: reconciled header and extended runway rows.
    Cache,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub airports: usize,
    pub rejected_airports: usize,
    pub malformed_lines: usize,
}

/// Asphalt, concrete, transparent, and the X-Plane 12 asphalt/concrete variants.
pub fn is_hard_surface(code: u32) -> bool {
    matches!(code, 1 | 2 | 15 | 20..=38 | 50..=57)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VgsiSide {
    Any,
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct VgsiRecord {
    pos: GeoPos2,
    hdg: f64,
    gpa: f64,
    rwy_id: Option<String>,
    side: VgsiSide,
}

pub struct AptDatParser {
    dialect: Dialect,
    tolerances: MatchTolerances,
}

impl AptDatParser {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tolerances: MatchTolerances::default(),
        }
    }

    pub fn with_tolerances(mut self, tolerances: MatchTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Parses a file, transparently decompressing `.gz`.
    pub fn parse_file<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<(Vec<Airport>, ParseStats), AptDatError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source = path.display().to_string();
        let result = if path.extension().is_some_and(|ext| ext == "gz") {
            self.parse(BufReader::new(GzDecoder::new(file)), &source)?
        } else {
            self.parse(BufReader::new(file), &source)?
        };
        info!(
            "Parsed airport records — source={} airports={} rejected={} malformed_lines={}",
            source, result.1.airports, result.1.rejected_airports, result.1.malformed_lines
        );
        Ok(result)
    }

    /// Parses airports from `reader`. Malformed lines and unusable airports
    /// are logged and skipped; only I/O errors abort.
    pub fn parse<R: BufRead>(
        &self,
        mut reader: R,
        source: &str,
    ) -> Result<(Vec<Airport>, ParseStats), AptDatError> {
        let mut airports = Vec::with_capacity(256);
        let mut stats = ParseStats::default();
        let mut buf = Vec::with_capacity(256);
        let mut line_no = 0usize;
        let mut current: Option<AirportBuilder> = None;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;
            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();

            let outcome = match parts[0] {
                "1" => {
                    self.finish(current.take(), &mut airports, &mut stats, source);
                    self.parse_header(&parts, line_no).map(|b| current = Some(b))
                }
                "16" | "17" => {
                    self.finish(current.take(), &mut airports, &mut stats, source);
                    Ok(())
                }
                "100" => match current.as_mut() {
                    Some(builder) => self.parse_runway(&parts, builder.elev).map(|rwy| {
                        if let Some(rwy) = rwy {
                            builder.runways.push(rwy);
                        }
                    }),
                    None => Ok(()),
                },
                "21" => match current.as_mut() {
                    Some(builder) if self.dialect == Dialect::Scenery => {
                        parse_vgsi(&parts).map(|v| builder.vgsis.extend(v))
                    }
                    _ => Ok(()),
                },
                "1302" => match current.as_mut() {
                    Some(builder) => {
                        parse_metadata(line, builder);
                        Ok(())
                    }
                    None => Ok(()),
                },
                "99" => break,
                _ => Ok(()),
            };

            if let Err(reason) = outcome {
                stats.malformed_lines += 1;
                debug!(
                    "Skipping malformed airport record — source={} line={} reason={}",
                    source, line_no, reason
                );
            }
        }
        self.finish(current.take(), &mut airports, &mut stats, source);

        Ok((airports, stats))
    }

    fn finish(
        &self,
        builder: Option<AirportBuilder>,
        airports: &mut Vec<Airport>,
        stats: &mut ParseStats,
        source: &str,
    ) {
        let Some(builder) = builder else {
            return;
        };
        let (ident, line) = (builder.ident.clone(), builder.line);
        match builder.build(self.dialect, &self.tolerances) {
            Ok(apt) => {
                stats.airports += 1;
                airports.push(apt);
            }
            Err(reason) => {
                stats.rejected_airports += 1;
                debug!(
                    "Rejecting airport — source={} line={} ident={} reason={}",
                    source, line, ident, reason
                );
            }
        }
    }

    fn parse_header(&self, parts: &[&str], line: usize) -> Result<AirportBuilder, String> {
        let min = if self.dialect == Dialect::Cache { 7 } else { 5 };
        if parts.len() < min {
            return Err(format!("airport header has {} fields, need {}", parts.len(), min));
        }
        let mut builder = AirportBuilder {
            ident: parts[4].to_string(),
            line,
            elev: field(parts, 1, "elevation")?,
            ..Default::default()
        };
        if self.dialect == Dialect::Cache {
            builder.ta = field(parts, 2, "transition altitude")?;
            builder.tl = field(parts, 3, "transition level")?;
            let refpt = GeoPos2::new(field(parts, 5, "latitude")?, field(parts, 6, "longitude")?);
            if !refpt.is_valid() {
                return Err(format!("reference point {:?} out of range", refpt));
            }
            builder.refpt = Some(refpt);
        }
        Ok(builder)
    }

    /// Returns `Ok(None)` for valid runways that are of no interest (soft surfaces).
    fn parse_runway(&self, parts: &[&str], apt_elev: f64) -> Result<Option<Runway>, String> {
        let min = if self.dialect == Dialect::Cache {
            CACHE_RWY_FIELDS
        } else {
            RWY_FIELDS
        };
        if parts.len() < min {
            return Err(format!("runway has {} fields, need {}", parts.len(), min));
        }
        let width: f64 = field(parts, 1, "width")?;
        let surface: u32 = field(parts, 2, "surface")?;
        if !is_hard_surface(surface) {
            return Ok(None);
        }
        if width <= 0.0 {
            return Err(format!("non-positive width {}", width));
        }

        let mut ends = Vec::with_capacity(2);
        for (i, base) in [8usize, 17].into_iter().enumerate() {
            let thr = GeoPos2::new(field(parts, base + 1, "latitude")?, field(parts, base + 2, "longitude")?);
            if !thr.is_valid() {
                return Err(format!("threshold {:?} out of range", thr));
            }
            let mut end = RunwayEnd::new(
                parts[base],
                GeoPos3::new(thr.lat, thr.lon, apt_elev),
                field(parts, base + 3, "displacement")?,
                field(parts, base + 4, "blast pad")?,
            );
            if self.dialect == Dialect::Cache {
                let ext = RWY_FIELDS + i * 3;
                end.gpa = field(parts, ext, "glide path angle")?;
                end.tch = field(parts, ext + 1, "crossing height")?;
                end.thr.elev = field(parts, ext + 2, "threshold elevation")?;
            }
            ends.push(end);
        }
        let [e0, e1]: [RunwayEnd; 2] = ends
            .try_into()
            .map_err(|_| "runway needs two ends".to_string())?;
        Ok(Some(Runway::new(width, [e0, e1])))
    }
}

fn field<T: FromStr>(parts: &[&str], idx: usize, what: &str) -> Result<T, String> {
    let raw = parts
        .get(idx)
        .ok_or_else(|| format!("missing {} (field {})", what, idx))?;
    raw.parse::<T>()
        .map_err(|_| format!("invalid {} {:?} (field {})", what, raw, idx))
}

/// `21 <lat> <lon> <type> <hdg> <gpa> <rwy_id> <desc…>`
fn parse_vgsi(parts: &[&str]) -> Result<Option<VgsiRecord>, String> {
    if parts.len() < 6 {
        return Err(format!("lighting object has {} fields, need 6", parts.len()));
    }
    let side = match field::<u32>(parts, 3, "lighting type")? {
        1 | 4 | 5 => VgsiSide::Any,
        2 => VgsiSide::Left,
        3 => VgsiSide::Right,
        // runway guards and other fixtures
        _ => return Ok(None),
    };
    let pos = GeoPos2::new(field(parts, 1, "latitude")?, field(parts, 2, "longitude")?);
    if !pos.is_valid() {
        return Err(format!("lighting object {:?} out of range", pos));
    }
    let gpa: f64 = field(parts, 5, "glide path angle")?;
    if gpa <= 0.0 {
        return Ok(None);
    }
    Ok(Some(VgsiRecord {
        pos,
        hdg: field(parts, 4, "heading")?,
        gpa,
        rwy_id: parts.get(6).filter(|s| **s != "0").map(|s| s.to_string()),
        side,
    }))
}

/// `1302 <key> <value>`
fn parse_metadata(line: &str, builder: &mut AirportBuilder) {
    let parts: Vec<&str> = line.splitn(3, char::is_whitespace).collect();
    if parts.len() < 3 {
        return;
    }
    let value = parts[2].trim();
    match parts[1] {
        "datum_lat" => builder.datum_lat = value.parse().ok().filter(|v: &f64| v.abs() <= 90.0),
        "datum_lon" => builder.datum_lon = value.parse().ok().filter(|v: &f64| v.abs() <= 180.0),
        "icao_code" => builder.icao_code = Some(value.to_string()),
        "transition_alt" => builder.ta = value.parse().unwrap_or(0),
        "transition_level" => builder.tl = value.parse().unwrap_or(0),
        _ => {}
    }
}

#[derive(Debug, Default)]
struct AirportBuilder {
    ident: String,
    line: usize,
    elev: f64,
    icao_code: Option<String>,
    datum_lat: Option<f64>,
    datum_lon: Option<f64>,
    refpt: Option<GeoPos2>,
    ta: i32,
    tl: i32,
    runways: Vec<Runway>,
    vgsis: Vec<VgsiRecord>,
}

impl AirportBuilder {
    fn build(self, dialect: Dialect, tolerances: &MatchTolerances) -> Result<Airport, String> {
        let icao = if is_valid_icao(&self.ident) {
            self.ident.clone()
        } else {
            match self.icao_code.as_deref() {
                Some(code) if is_valid_icao(code) => code.to_string(),
                _ => return Err("no valid ICAO code".to_string()),
            }
        };
        if self.runways.is_empty() {
            return Err("no hard-surface runways".to_string());
        }

        let explicit = match (self.refpt, self.datum_lat, self.datum_lon) {
            (Some(p), _, _) => Some(p),
            (None, Some(lat), Some(lon)) => Some(GeoPos2::new(lat, lon)),
            _ => None,
        };
        let mut apt = Airport::new(&icao, GeoPos3::default());
        for rwy in self.runways {
            if !apt.add_runway(rwy) {
                debug!("Ignoring duplicate runway definition — icao={}", icao);
            }
        }
        let refpt = match explicit.or_else(|| apt.first_runway_midpoint()) {
            Some(p) => p,
            None => return Err("no reference point".to_string()),
        };
        apt.set_refpt(GeoPos3::new(refpt.lat, refpt.lon, self.elev));
        if apt.is_polar() {
            return Err(format!("latitude {:.3} beyond polar limit", refpt.lat));
        }
        apt.refpt_explicit = explicit.is_some();
        apt.ta = self.ta;
        apt.tl = self.tl;
        apt.in_navdata = dialect == Dialect::Cache;
        resolve_vgsis(&mut apt, &self.vgsis, tolerances);
        Ok(apt)
    }
}

/// Assigns each lighting object's glide path to a runway end.
fn resolve_vgsis(apt: &mut Airport, vgsis: &[VgsiRecord], tol: &MatchTolerances) {
    if vgsis.is_empty() {
        return;
    }
    let fpp = FlatProjection::new(apt.refpt().pos2());
    let vectors: Vec<_> = apt
        .runways()
        .iter()
        .map(|r| runway_vectors(r, &fpp).ok())
        .collect();

    for vgsi in vgsis {
        let p = fpp.project(vgsi.pos);

        let explicit = vgsi
            .rwy_id
            .as_deref()
            .and_then(|id| apt.find_runway_end(id))
            .and_then(|(ri, ei)| {
                let v = vectors[ri].as_ref()?;
                Some((ri, ei, offsets_from_threshold(v, ei, p).0))
            });

        let target = explicit.or_else(|| {
            let mut best: Option<(usize, usize, f64, f64)> = None;
            for (ri, v) in vectors.iter().enumerate() {
                let Some(v) = v else { continue };
                let width = apt.runways()[ri].width;
                for ei in 0..2 {
                    let (long, lat) = offsets_from_threshold(v, ei, p);
                    if lat.abs() > tol.vgsi_lateral_widths * width
                        || long < 0.0
                        || long > v.length
                        || rel_hdg(v.landing_dir(ei).heading(), vgsi.hdg).abs() > tol.vgsi_heading_deg
                    {
                        continue;
                    }
                    let wrong_side = match vgsi.side {
                        VgsiSide::Left => lat > 0.0,
                        VgsiSide::Right => lat < 0.0,
                        VgsiSide::Any => false,
                    };
                    if wrong_side {
                        continue;
                    }
                    if best.map_or(true, |b| lat.abs() < b.3) {
                        best = Some((ri, ei, long, lat.abs()));
                    }
                }
            }
            best.map(|(ri, ei, long, _)| (ri, ei, long))
        });

        match target {
            Some((ri, ei, long)) => {
                let end = &mut apt.runways_mut()[ri].ends[ei];
                end.resolve_glide_path(vgsi.gpa, tch_from_offset(vgsi.gpa, long));
            }
            None => debug!(
                "Lighting object matches no runway end — icao={} lat={:.6} lon={:.6}",
                apt.icao(),
                vgsi.pos.lat,
                vgsi.pos.lon
            ),
        }
    }
}
