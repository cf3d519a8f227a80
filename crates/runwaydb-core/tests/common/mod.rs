// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

#![allow(dead_code)]

use runwaydb_core::DatabaseConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const KSEA_APT: &str = "\
1 433 0 0 KSEA Seattle Tacoma Intl
100 45.72 1 0 0.25 1 3 0 16L 47.46373500 -122.30786400 0 0 3 0 1 1 34R 47.43135000 -122.30817000 0 0 3 0 1 1
100 45.72 2 0 0.25 1 3 0 16R 47.46381000 -122.31779000 0 0 3 0 1 1 34L 47.43087000 -122.31810000 0 0 3 0 1 1
";

pub const KSEA_NAV: &str = "\
A,KSEA,SEATTLE-TACOMA INTL,47.449889,-122.311778,433,18000,18000,11900
R,16L,163,11901,150,1,111.700,163,47.463735,-122.307864,429,3.00,54,1,0
R,34R,343,11901,150,1,110.700,343,47.431350,-122.308170,347,2.75,50,1,0
";

/// A fixture airport with one 2 km north/south runway `36/18` centred on
/// its reference point.
pub struct Field {
    pub icao: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub ta: i32,
    pub tl: i32,
}

impl Field {
    pub fn new(icao: &'static str, lat: f64, lon: f64) -> Self {
        Self {
            icao,
            lat,
            lon,
            ta: 18000,
            tl: 18000,
        }
    }

    pub fn apt_dat(&self) -> String {
        format!(
            "1 100 0 0 {} Test Field\n\
             100 30.00 1 0 0.25 1 3 0 36 {:.8} {:.8} 0 0 3 0 1 1 18 {:.8} {:.8} 0 0 3 0 1 1\n",
            self.icao,
            self.lat - 0.009,
            self.lon,
            self.lat + 0.009,
            self.lon
        )
    }

    pub fn navdata(&self) -> String {
        format!(
            "A,{},TEST FIELD,{:.6},{:.6},100,{},{},6500\n\
             R,36,360,6500,100,0,0.000,0,{:.6},{:.6},100,3.00,50,0,0\n\
             R,18,180,6500,100,0,0.000,0,{:.6},{:.6},100,3.00,50,0,0\n",
            self.icao,
            self.lat,
            self.lon,
            self.ta,
            self.tl,
            self.lat - 0.009,
            self.lon,
            self.lat + 0.009,
            self.lon
        )
    }
}

/// Degrees of latitude spanned by `nm` nautical miles.
pub fn nm_to_lat(nm: f64) -> f64 {
    (nm * 1852.0 / 6_371_008.8).to_degrees()
}

pub fn apt_dat_file(body: &str) -> String {
    format!("I\n1100 Version - data cycle 2403, build 20240301, metadata AptXP1100.\n\n{}99\n", body)
}

pub struct MockXPlane {
    // Keep TempDir alive so the directory isn't deleted
    _dir: TempDir,
    pub root: PathBuf,
    pub cache_dir: PathBuf,
}

impl MockXPlane {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().join("X-Plane 12");
        fs::create_dir_all(root.join("Resources")).unwrap();
        fs::create_dir_all(root.join("Custom Scenery")).unwrap();
        let cache_dir = dir.path().join("cache");
        Self {
            _dir: dir,
            root,
            cache_dir,
        }
    }

    pub fn global_apt_dat_path(&self) -> PathBuf {
        self.root
            .join("Global Scenery/Global Airports/Earth nav data/apt.dat")
    }

    pub fn write_global_apt(&self, body: &str) {
        let path = self.global_apt_dat_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, apt_dat_file(body)).unwrap();
    }

    pub fn add_pack(&self, name: &str, body: &str) -> PathBuf {
        let path = self
            .root
            .join("Custom Scenery")
            .join(name)
            .join("Earth nav data/apt.dat");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, apt_dat_file(body)).unwrap();
        path
    }

    pub fn write_ini(&self, entries: &[&str]) {
        let mut content = String::from("I\n1000 Version\nSCENERY\n\n");
        for e in entries {
            content.push_str(&format!("SCENERY_PACK {}\n", e));
        }
        fs::write(self.root.join("Custom Scenery/scenery_packs.ini"), content).unwrap();
    }

    pub fn legacy_navdata_dir(&self) -> PathBuf {
        self.root.join("Resources/GNS430/navdata")
    }

    pub fn write_legacy_navdata(&self, body: &str, cycle: u32) {
        let dir = self.legacy_navdata_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Airports.txt"), body).unwrap();
        fs::write(
            dir.join("cycle_info.txt"),
            format!("AIRAC cycle    : {}\nVersion        : 1\n", cycle),
        )
        .unwrap();
    }

    pub fn write_cifp(&self, icao: &str, body: &str) {
        let dir = self.root.join("Custom Data/CIFP");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.dat", icao)), body).unwrap();
    }

    pub fn write_earth_nav(&self, body: &str) {
        let dir = self.root.join("Resources/default data");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("earth_nav.dat"),
            format!("I\n1100 Version - data cycle 2403, build 20240301, metadata NavXP1100.\n\n{}99\n", body),
        )
        .unwrap();
    }

    pub fn config(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::new(&self.root);
        config.cache_dir = self.cache_dir.clone();
        config
    }
}

pub fn init_logging() {
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Debug, simplelog::Config::default());
}
