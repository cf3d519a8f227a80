// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Modern CIFP procedure files, one `<ICAO>.dat` per airport. Only the
//! runway records are read:
//!
//! ```text
//! RWY:RW16L,     ,      ,00429, ,ISNQ,1,   ;N47274890,W122182986,0000;
//! ```
//!
//! The first section carries the identifier and the landing threshold
//! elevation; the second the threshold position in packed DMS.

use super::{NavdataError, SupplementalAirport, SupplementalEnd};
use crate::airport::is_valid_icao;
use crate::geo::GeoPos3;
use log::{debug, info, warn};
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::one_of,
    combinator::{all_consuming, map_res},
    IResult,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn digits(input: &str, n: usize) -> IResult<&str, u32> {
    map_res(take_while_m_n(n, n, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(input)
}

/// `N47274890` / `W122182986`: hemisphere, degrees (2 or 3 digits), minutes,
/// seconds and hundredths of a second.
pub fn parse_dms(input: &str) -> IResult<&str, f64> {
    let (input, hemi) = one_of("NSEW")(input)?;
    let deg_len = if matches!(hemi, 'N' | 'S') { 2 } else { 3 };
    let (input, deg) = digits(input, deg_len)?;
    let (input, min) = digits(input, 2)?;
    let (input, sec) = digits(input, 2)?;
    let (input, hund) = digits(input, 2)?;
    let value = deg as f64 + min as f64 / 60.0 + (sec as f64 + hund as f64 / 100.0) / 3600.0;
    Ok((input, if matches!(hemi, 'S' | 'W') { -value } else { value }))
}

fn coordinate(field: &str) -> Result<f64, String> {
    all_consuming(parse_dms)(field.trim())
        .map(|(_, v)| v)
        .map_err(|_| format!("invalid coordinate {:?}", field))
}

/// Parses one `RWY:` line, returning `None` for other record types.
pub fn parse_runway_line(line: &str) -> Option<Result<SupplementalEnd, String>> {
    let body = line.trim().strip_prefix("RWY:")?;
    Some(parse_runway_body(body))
}

fn parse_runway_body(body: &str) -> Result<SupplementalEnd, String> {
    let sections: Vec<&str> = body.split(';').collect();
    if sections.len() < 2 {
        return Err("runway record lacks a position section".to_string());
    }
    let fields: Vec<&str> = sections[0].split(',').map(str::trim).collect();
    let id = fields
        .first()
        .and_then(|f| f.strip_prefix("RW"))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| format!("invalid runway identifier {:?}", fields.first()))?;
    let elev: f64 = fields
        .get(3)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| format!("invalid threshold elevation {:?}", fields.get(3)))?;

    let pos: Vec<&str> = sections[1].split(',').collect();
    if pos.len() < 2 {
        return Err("runway position needs latitude and longitude".to_string());
    }
    Ok(SupplementalEnd {
        id: id.to_string(),
        thr: GeoPos3::new(coordinate(pos[0])?, coordinate(pos[1])?, elev),
        gpa: 0.0,
        tch: 0.0,
    })
}

/// Parses the runway records of one airport file.
pub fn parse_airport(icao: &str, content: &str, source: &str) -> SupplementalAirport {
    let mut ends = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        match parse_runway_line(line) {
            Some(Ok(end)) => ends.push(end),
            Some(Err(reason)) => debug!(
                "Skipping malformed procedure record — source={} line={} reason={}",
                source,
                idx + 1,
                reason
            ),
            None => {}
        }
    }
    SupplementalAirport {
        icao: icao.to_string(),
        refpt: None,
        ta: 0,
        tl: 0,
        ends,
    }
}

fn icao_of(path: &Path) -> Option<String> {
    if path.extension()? != "dat" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?.to_uppercase();
    is_valid_icao(&stem).then_some(stem)
}

/// Parses every airport file under `dir` in parallel.
pub fn parse_dir(dir: &Path) -> Result<Vec<SupplementalAirport>, NavdataError> {
    // Surface a missing directory as an error rather than an empty result
    fs::read_dir(dir)?;
    let files: Vec<(String, PathBuf)> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| icao_of(e.path()).map(|icao| (icao, e.into_path())))
        .collect();

    let mut airports: Vec<SupplementalAirport> = files
        .into_par_iter()
        .filter_map(|(icao, path)| match fs::read(&path) {
            Ok(bytes) => {
                let content = String::from_utf8_lossy(&bytes);
                Some(parse_airport(&icao, &content, &path.display().to_string()))
            }
            Err(e) => {
                warn!("Could not read procedure file — path={} error={}", path.display(), e);
                None
            }
        })
        .collect();
    airports.sort_by(|a, b| a.icao.cmp(&b.icao));

    info!(
        "Parsed procedure files — dir={} airports={}",
        dir.display(),
        airports.len()
    );
    Ok(airports)
}
