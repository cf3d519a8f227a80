// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! ILS glide slopes (row code `6`) from `earth_nav.dat`.
//!
//! The bearing field packs the glide path angle with the true course:
//! `300163.500` is a 3.00° glide slope on course 163.5°.

use super::NavdataError;
use crate::geo::GeoPos3;
use log::{debug, info};
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq)]
pub struct GlideSlope {
    pub icao: String,
    pub rwy_id: String,
    /// Antenna position; elevation in feet.
    pub pos: GeoPos3,
    pub gpa: f64,
    /// True course of the approach.
    pub hdg: f64,
}

/// Row layouts differ in whether a region code precedes the airport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `6 lat lon elev freq range bearing ident icao rwy name…`
    V810,
    /// `6 lat lon elev freq range bearing ident icao region rwy name…`
    V1100,
}

fn data_cycle(header: &str) -> Option<u32> {
    static RE_DATA_CYCLE: OnceLock<Regex> = OnceLock::new();
    let re = RE_DATA_CYCLE.get_or_init(|| Regex::new(r"(?i)data cycle\s+(\d{4})").unwrap());
    re.captures(header)?.get(1)?.as_str().parse().ok()
}

/// Reads the AIRAC cycle from the version header.
pub fn read_cycle(path: &Path) -> Option<u32> {
    let reader = BufReader::new(File::open(path).ok()?);
    reader
        .lines()
        .take(3)
        .map_while(Result::ok)
        .find_map(|line| data_cycle(&line))
}

/// Splits the packed bearing into `(gpa, true_course)`.
pub fn decode_bearing(raw: f64) -> (f64, f64) {
    let gpa_hundredths = (raw / 1000.0).trunc();
    (gpa_hundredths / 100.0, raw - gpa_hundredths * 1000.0)
}

pub fn parse_file(path: &Path) -> Result<Vec<GlideSlope>, NavdataError> {
    let reader = BufReader::new(File::open(path)?);
    let slopes = parse(reader, &path.display().to_string())?;
    info!(
        "Parsed glide slopes — source={} glide_slopes={}",
        path.display(),
        slopes.len()
    );
    Ok(slopes)
}

pub fn parse<R: BufRead>(mut reader: R, source: &str) -> Result<Vec<GlideSlope>, NavdataError> {
    let mut slopes = Vec::new();
    let mut layout = Layout::V1100;
    let mut buf = Vec::with_capacity(128);
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim();

        if line_no <= 3 && line.contains("Version") {
            layout = if line.starts_with("810") {
                Layout::V810
            } else {
                Layout::V1100
            };
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first() {
            Some(&"6") => match parse_glide_slope(&parts, layout) {
                Ok(gs) => slopes.push(gs),
                Err(reason) => debug!(
                    "Skipping malformed navaid record — source={} line={} reason={}",
                    source, line_no, reason
                ),
            },
            Some(&"99") => break,
            _ => {}
        }
    }
    Ok(slopes)
}

fn parse_glide_slope(parts: &[&str], layout: Layout) -> Result<GlideSlope, String> {
    let (icao_idx, rwy_idx) = match layout {
        Layout::V810 => (8, 9),
        Layout::V1100 => (8, 10),
    };
    if parts.len() <= rwy_idx {
        return Err(format!("glide slope has {} fields", parts.len()));
    }
    let num = |idx: usize, what: &str| -> Result<f64, String> {
        parts[idx]
            .parse::<f64>()
            .map_err(|_| format!("invalid {} {:?}", what, parts[idx]))
    };
    let pos = GeoPos3::new(num(1, "latitude")?, num(2, "longitude")?, num(3, "elevation")?);
    if !pos.pos2().is_valid() {
        return Err(format!("position {:?} out of range", pos));
    }
    let (gpa, hdg) = decode_bearing(num(6, "bearing")?);
    if gpa <= 0.0 {
        return Err(format!("no glide path angle in bearing {:?}", parts[6]));
    }
    Ok(GlideSlope {
        icao: parts[icao_idx].to_string(),
        rwy_id: parts[rwy_idx].to_string(),
        pos,
        gpa,
        hdg,
    })
}
