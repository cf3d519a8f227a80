// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

mod common;

use common::{init_logging, nm_to_lat, Field, MockXPlane, KSEA_APT, KSEA_NAV};
use runwaydb_core::cache::TileCache;
use runwaydb_core::ingest::{ingest, SourceSet};
use runwaydb_core::tiles::TileKey;
use runwaydb_core::{CacheStatus, Database, DbError, GeoPos2, GeoPos3};
use std::collections::BTreeSet;
use std::fs;

const KSEA_LAT: f64 = 47.449889;
const KSEA_LON: f64 = -122.311778;

fn kbfi() -> Field {
    Field::new("KBFI", KSEA_LAT + nm_to_lat(9.0), KSEA_LON)
}

fn fields() -> Vec<Field> {
    let mut cyxx = Field::new("CYXX", 47.30, -121.60);
    cyxx.ta = 18000;
    vec![
        kbfi(),
        Field::new("KAAA", 47.98, -122.02),
        Field::new("KBBB", 48.02, -121.98),
        cyxx,
        Field::new("BGTL", 80.5, -68.7),
    ]
}

/// KSEA, KBFI and a handful of test fields, with legacy navdata for all
/// but KXXX.
fn seattle() -> MockXPlane {
    init_logging();
    let mock = MockXPlane::new();
    let unlisted = Field::new("KXXX", 47.70, -122.50);

    let mut apt = String::from(KSEA_APT);
    let mut nav = String::from(KSEA_NAV);
    for f in fields() {
        apt.push_str(&f.apt_dat());
        nav.push_str(&f.navdata());
    }
    apt.push_str(&unlisted.apt_dat());

    mock.write_global_apt(&apt);
    mock.write_legacy_navdata(&nav, 2403);
    mock
}

fn icaos(db: &Database, pos: GeoPos2) -> BTreeSet<String> {
    db.find_nearest_airports(pos)
        .iter()
        .map(|a| a.icao().to_string())
        .collect()
}

#[test]
fn test_open_rebuilds_then_reuses() {
    let mock = seattle();
    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Rebuilt);
    assert_eq!(db.registry().count(), 0, "nothing is loaded until asked");
    drop(db);

    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Reused);
}

#[test]
fn test_scenario_b_nearest_airports() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    let ksea = GeoPos2::new(KSEA_LAT, KSEA_LON);
    db.update_position(ksea);

    let mid = GeoPos2::new(KSEA_LAT + nm_to_lat(4.5), KSEA_LON);
    let found = icaos(&db, mid);
    assert!(found.contains("KSEA") && found.contains("KBFI"), "{:?}", found);

    let nearest = db.find_nearest_airports(ksea);
    assert_eq!(nearest[0].icao(), "KSEA");
    assert!(nearest.iter().all(|a| a.icao() != "KBFI"));
    assert!(nearest.iter().all(|a| a.geometry_computed()));
}

#[test]
fn test_scenario_d_evict_all_empties_registry() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    db.update_position(GeoPos2::new(KSEA_LAT, KSEA_LON));
    assert!(db.registry().count() > 0);

    db.unload_distant_tiles(None);
    assert_eq!(db.registry().count(), 0);
    assert!(db.tiles().is_empty());
}

#[test]
fn test_moving_away_evicts_old_tiles() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    db.update_position(GeoPos2::new(KSEA_LAT, KSEA_LON));
    assert!(db.registry().contains("KSEA"));

    db.update_position(GeoPos2::new(40.5, -100.5));
    assert!(!db.registry().contains("KSEA"));
    assert_eq!(db.tiles().len(), 9);
    assert!(db.tiles().keys().all(|k| k.is_within_window(GeoPos2::new(40.5, -100.5))));
}

#[test]
fn test_tile_load_order_does_not_change_results() {
    let mock = seattle();
    let pos = GeoPos2::new(48.0, -122.0);
    let expected: BTreeSet<String> = ["KAAA", "KBBB"].iter().map(|s| s.to_string()).collect();

    for first in TileKey::from_pos(pos).neighborhood() {
        let mut db = Database::open(mock.config()).unwrap();
        db.load_tile(first);
        db.load_nearest_tiles(pos);
        assert_eq!(icaos(&db, pos), expected, "first tile {}", first);
    }
}

#[test]
fn test_lookup_airport() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    let approx = GeoPos2::new(47.5, -122.5);

    let ksea = db.lookup_airport("KSEA", approx).unwrap();
    assert_eq!(ksea.icao(), "KSEA");
    assert_eq!(ksea.runways().len(), 2);
    assert!(ksea.runways()[0].geometry().is_some());

    assert!(db.lookup_airport("ksea", approx).is_none());
    assert!(db.lookup_airport("KPAE", approx).is_none());
    // Present in scenery but not in navdata
    assert!(db.lookup_airport("KXXX", approx).is_none());
}

#[test]
fn test_polar_airports_never_retained() {
    let mock = seattle();
    let config = mock.config();
    let sources = SourceSet::discover(&config).unwrap();
    let registry = ingest(&sources, &config.matching).unwrap();
    assert!(registry.iter().all(|a| a.refpt().lat.abs() < 80.0));
    assert!(!registry.contains("BGTL"));

    let mut db = Database::open(config).unwrap();
    assert!(db.lookup_airport("BGTL", GeoPos2::new(80.5, -68.7)).is_none());
}

#[test]
fn test_transition_data_prefers_hint_country() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    let ksea = GeoPos2::new(KSEA_LAT, KSEA_LON);

    let apt = db.nearest_airport_with_transition_data(ksea, None).unwrap();
    assert_eq!(apt.icao(), "KSEA");
    assert_eq!(apt.ta, 18000);

    let apt = db.nearest_airport_with_transition_data(ksea, Some("CYVR")).unwrap();
    assert_eq!(apt.icao(), "CYXX");
}

#[test]
fn test_cache_round_trip_preserves_reconciled_data() {
    let mock = seattle();
    let config = mock.config();
    let sources = SourceSet::discover(&config).unwrap();
    let ingested = ingest(&sources, &config.matching).unwrap();
    Database::open(config.clone()).unwrap();

    let cache = TileCache::new(&config.cache_dir);
    let loaded = cache.load_tile(TileKey::new(47, -123)).unwrap();
    let ksea = loaded.iter().find(|a| a.icao() == "KSEA").unwrap();
    let orig = ingested.get("KSEA").unwrap();

    assert_eq!((ksea.ta, ksea.tl), (orig.ta, orig.tl));
    assert!(ksea.in_navdata && ksea.refpt_explicit);
    assert!((ksea.refpt().lat - orig.refpt().lat).abs() < 1e-7);
    assert!((ksea.refpt().lon - orig.refpt().lon).abs() < 1e-7);
    assert_eq!(ksea.runways().len(), orig.runways().len());
    for (a, b) in ksea.runways().iter().zip(orig.runways()) {
        assert_eq!(a.joint_id(), b.joint_id());
        assert!((a.width - b.width).abs() < 0.005);
        for (ea, eb) in a.ends.iter().zip(&b.ends) {
            assert!((ea.thr.lat - eb.thr.lat).abs() < 1e-7);
            assert!((ea.thr.lon - eb.thr.lon).abs() < 1e-7);
            assert!((ea.thr.elev - eb.thr.elev).abs() < 0.005);
            assert!((ea.displ - eb.displ).abs() < 0.005);
            assert!((ea.blast - eb.blast).abs() < 0.005);
            assert!((ea.gpa - eb.gpa).abs() < 0.005);
            assert!((ea.tch - eb.tch).abs() < 0.005);
        }
    }
    // Navdata values survived the trip
    let (ri, ei) = ksea.find_runway_end("34R").unwrap();
    let e = &ksea.runways()[ri].ends[ei];
    assert_eq!((e.gpa, e.tch, e.thr.elev), (2.75, 50.0, 347.0));
}

#[test]
fn test_version_change_forces_rebuild() {
    let mock = seattle();
    Database::open(mock.config()).unwrap();
    fs::write(mock.cache_dir.join("version"), "2\n").unwrap();
    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Rebuilt);
    assert_eq!(fs::read_to_string(mock.cache_dir.join("version")).unwrap().trim(), "3");
}

#[test]
fn test_cycle_change_forces_rebuild() {
    let mock = seattle();
    Database::open(mock.config()).unwrap();
    fs::write(
        mock.legacy_navdata_dir().join("cycle_info.txt"),
        "AIRAC cycle    : 2404\n",
    )
    .unwrap();
    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Rebuilt);
    assert_eq!(fs::read_to_string(mock.cache_dir.join("cycle")).unwrap().trim(), "2404");
}

#[test]
fn test_source_list_change_forces_rebuild() {
    let mock = seattle();
    Database::open(mock.config()).unwrap();

    let pack = mock.add_pack("KSEA Custom", KSEA_APT);
    mock.write_ini(&["Custom Scenery/KSEA Custom/", "*GLOBAL_AIRPORTS*"]);
    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Rebuilt);

    let sources = fs::read_to_string(mock.cache_dir.join("sources")).unwrap();
    let first = sources.lines().next().unwrap();
    assert_eq!(first, pack.display().to_string());
    drop(db);

    let db = Database::open(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Reused);
}

#[test]
fn test_forced_rebuild() {
    let mock = seattle();
    Database::open(mock.config()).unwrap();
    let db = Database::rebuild(mock.config()).unwrap();
    assert_eq!(db.cache_status(), &CacheStatus::Rebuilt);
}

#[test]
fn test_missing_navdata_aborts_and_keeps_cache() {
    let mock = seattle();
    Database::open(mock.config()).unwrap();
    let tile = TileCache::new(&mock.cache_dir).tile_path(TileKey::new(47, -123));
    assert!(tile.is_file());

    fs::remove_file(mock.legacy_navdata_dir().join("Airports.txt")).unwrap();
    let err = Database::rebuild(mock.config()).err().unwrap();
    assert!(matches!(err, DbError::NavdataUnavailable(_)), "{:?}", err);
    assert!(tile.is_file());
    assert!(mock.cache_dir.join("version").is_file());
}

#[test]
fn test_unwritable_cache_serves_from_memory() {
    let mock = seattle();
    let mut config = mock.config();
    let blocker = mock.root.join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    config.cache_dir = blocker.join("cache");

    let mut db = Database::open(config).unwrap();
    assert!(matches!(db.cache_status(), CacheStatus::Degraded(_)));
    let ksea = db
        .lookup_airport("KSEA", GeoPos2::new(KSEA_LAT, KSEA_LON))
        .unwrap();
    assert_eq!(ksea.ta, 18000);
}

#[test]
fn test_snapshot_copies_nearby_runways() {
    let mock = seattle();
    let mut db = Database::open(mock.config()).unwrap();
    let pos = GeoPos3::new(KSEA_LAT, KSEA_LON, 2000.0);
    db.update_position(pos.pos2());

    let snap = db.snapshot(pos);
    assert_eq!(snap.position, pos);
    assert_eq!(snap.airports[0].icao, "KSEA");
    assert!(snap.airports[0].dist_nm < 0.01);
    let rwy = &snap.airports[0].runways[0];
    assert_eq!(rwy.joint_id, "16L34R");
    assert!((rwy.length - 3600.0).abs() < 20.0, "length={}", rwy.length);
    assert!((rwy.ends[0].hdg - 180.4).abs() < 0.5);
    assert_eq!(rwy.ends[0].gpa, 3.0);
}
