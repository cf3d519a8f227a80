// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Legacy GNS430 `Airports.txt`:
//!
//! ```text
//! A,KSEA,SEATTLE-TACOMA INTL,47.449889,-122.311778,433,18000,18000,11900
//! R,16L,163,11901,150,1,111.700,163,47.463750,-122.307869,429,3.00,54,1,0
//! ```

use super::{NavdataError, SupplementalAirport, SupplementalEnd};
use crate::airport::is_valid_icao;
use crate::geo::GeoPos3;
use csv::StringRecord;
use log::{debug, info};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

pub fn parse_file(path: &Path) -> Result<Vec<SupplementalAirport>, NavdataError> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let airports = parse_records(rdr, &path.display().to_string());
    info!(
        "Parsed legacy navdata — source={} airports={}",
        path.display(),
        airports.len()
    );
    Ok(airports)
}

pub fn parse_reader<R: Read>(reader: R, source: &str) -> Vec<SupplementalAirport> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);
    parse_records(rdr, source)
}

fn parse_records<R: Read>(mut rdr: csv::Reader<R>, source: &str) -> Vec<SupplementalAirport> {
    let mut airports = Vec::new();
    let mut current: Option<SupplementalAirport> = None;

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable navdata record — source={} error={}", source, e);
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());

        let outcome = match record.get(0) {
            Some("A") => {
                airports.extend(current.take());
                parse_airport(&record).map(|apt| current = Some(apt))
            }
            Some("R") => match current.as_mut() {
                Some(apt) => parse_runway(&record).map(|end| apt.ends.push(end)),
                None => Ok(()),
            },
            _ => Ok(()),
        };
        if let Err(reason) = outcome {
            debug!(
                "Skipping malformed navdata record — source={} line={} reason={}",
                source, line, reason
            );
        }
    }
    airports.extend(current.take());
    airports
}

fn field<T: FromStr>(record: &StringRecord, idx: usize, what: &str) -> Result<T, String> {
    let raw = record
        .get(idx)
        .ok_or_else(|| format!("missing {} (field {})", what, idx))?;
    raw.parse::<T>()
        .map_err(|_| format!("invalid {} {:?} (field {})", what, raw, idx))
}

fn parse_airport(record: &StringRecord) -> Result<SupplementalAirport, String> {
    if record.len() < 8 {
        return Err(format!("airport has {} fields, need 8", record.len()));
    }
    let icao = record[1].to_string();
    if !is_valid_icao(&icao) {
        return Err(format!("invalid ICAO {:?}", icao));
    }
    let refpt = GeoPos3::new(
        field(record, 3, "latitude")?,
        field(record, 4, "longitude")?,
        field(record, 5, "elevation")?,
    );
    if !refpt.pos2().is_valid() {
        return Err(format!("reference point {:?} out of range", refpt));
    }
    Ok(SupplementalAirport {
        icao,
        refpt: Some(refpt),
        ta: field(record, 6, "transition altitude")?,
        tl: field(record, 7, "transition level")?,
        ends: Vec::new(),
    })
}

fn parse_runway(record: &StringRecord) -> Result<SupplementalEnd, String> {
    if record.len() < 13 {
        return Err(format!("runway has {} fields, need 13", record.len()));
    }
    let thr = GeoPos3::new(
        field(record, 8, "latitude")?,
        field(record, 9, "longitude")?,
        field(record, 10, "elevation")?,
    );
    if !thr.pos2().is_valid() {
        return Err(format!("threshold {:?} out of range", thr));
    }
    Ok(SupplementalEnd {
        id: record[1].to_string(),
        thr,
        gpa: field(record, 11, "glide path angle")?,
        tch: field(record, 12, "crossing height")?,
    })
}
