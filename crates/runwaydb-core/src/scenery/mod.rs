// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Ordering of scenery `apt.dat` sources by `scenery_packs.ini` precedence.

pub mod ini_handler;

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Placeholder X-Plane 12 writes where the global airports pack sits.
pub const GLOBAL_AIRPORTS_TAG: &str = "*GLOBAL_AIRPORTS*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneryPackType {
    Active,
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneryPack {
    pub name: String,
    pub path: PathBuf,
    pub status: SceneryPackType,
}

impl SceneryPack {
    pub fn is_global_airports(&self) -> bool {
        self.name == GLOBAL_AIRPORTS_TAG || self.name == "Global Airports"
    }

    /// `Earth nav data/apt.dat` (or its gzipped form) inside this pack.
    pub fn apt_dat(&self) -> Option<PathBuf> {
        find_apt_dat(&self.path)
    }
}

fn find_apt_dat(pack_dir: &Path) -> Option<PathBuf> {
    ["apt.dat", "apt.dat.gz"]
        .iter()
        .map(|name| pack_dir.join("Earth nav data").join(name))
        .find(|p| p.is_file())
}

/// The simulator's own airport file: X-Plane 12 ships it as a scenery pack,
/// X-Plane 11 under `Resources/default scenery`.
pub fn global_apt_dat(xplane_root: &Path) -> Option<PathBuf> {
    [
        xplane_root.join("Global Scenery").join("Global Airports"),
        xplane_root
            .join("Resources")
            .join("default scenery")
            .join("default apt dat"),
    ]
    .iter()
    .find_map(|dir| find_apt_dat(dir))
}

/// Every `apt.dat` to ingest, highest priority first. Enabled packs keep their
/// `scenery_packs.ini` order; the global airports file takes the place of its
/// tag, or goes last when the list does not mention it.
pub fn apt_dat_sources(xplane_root: &Path) -> Vec<PathBuf> {
    let scenery_root = xplane_root.join("Custom Scenery");
    let ini = scenery_root.join("scenery_packs.ini");
    let packs = match ini_handler::read_ini(&ini, &scenery_root) {
        Ok(packs) => packs,
        Err(e) => {
            warn!(
                "Could not read scenery_packs.ini, using global airports only — path={} error={}",
                ini.display(),
                e
            );
            Vec::new()
        }
    };

    let global = global_apt_dat(xplane_root);
    let mut sources: Vec<PathBuf> = Vec::new();
    let mut global_placed = false;

    for pack in packs.iter().filter(|p| p.status == SceneryPackType::Active) {
        let apt_dat = if pack.is_global_airports() {
            global_placed = true;
            global.clone()
        } else {
            pack.apt_dat()
        };
        if let Some(path) = apt_dat {
            if !sources.contains(&path) {
                sources.push(path);
            }
        }
    }
    if !global_placed {
        if let Some(path) = global {
            if !sources.contains(&path) {
                sources.push(path);
            }
        }
    }

    debug!(
        "Resolved scenery airport sources — packs={} sources={}",
        packs.len(),
        sources.len()
    );
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch_apt(dir: &Path, name: &str) -> PathBuf {
        let p = dir.join("Earth nav data").join(name);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, "I\n1100 Version\n99\n").unwrap();
        p
    }

    #[test]
    fn test_sources_follow_ini_order() {
        let root = tempfile::tempdir().unwrap();
        let cs = root.path().join("Custom Scenery");
        let a = touch_apt(&cs.join("A Pack"), "apt.dat");
        let b = touch_apt(&cs.join("B Pack"), "apt.dat.gz");
        touch_apt(&cs.join("Off Pack"), "apt.dat");
        let global = touch_apt(&root.path().join("Global Scenery/Global Airports"), "apt.dat");
        fs::write(
            cs.join("scenery_packs.ini"),
            "I\n1000 Version\nSCENERY\n\n\
             SCENERY_PACK Custom Scenery/B Pack/\n\
             SCENERY_PACK *GLOBAL_AIRPORTS*\n\
             SCENERY_PACK_DISABLED Custom Scenery/Off Pack/\n\
             SCENERY_PACK Custom Scenery/A Pack/\n\
             SCENERY_PACK Custom Scenery/No Airports/\n",
        )
        .unwrap();

        assert_eq!(apt_dat_sources(root.path()), vec![b, global, a]);
    }

    #[test]
    fn test_global_appended_without_ini() {
        let root = tempfile::tempdir().unwrap();
        let global = touch_apt(
            &root.path().join("Resources/default scenery/default apt dat"),
            "apt.dat",
        );
        assert_eq!(apt_dat_sources(root.path()), vec![global]);
    }
}
