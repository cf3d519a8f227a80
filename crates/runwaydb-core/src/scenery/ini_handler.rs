// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::scenery::{SceneryPack, SceneryPackType};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads `scenery_packs.ini`, returning packs top (highest priority) first.
/// Header, comment and unknown lines are ignored.
pub fn read_ini(file_path: &Path, scenery_root: &Path) -> io::Result<Vec<SceneryPack>> {
    let text = fs::read_to_string(file_path)?;
    Ok(text
        .lines()
        .filter_map(|line| parse_pack_line(line, scenery_root))
        .collect())
}

/// `SCENERY_PACK[_DISABLED] <path>`, where the path may contain spaces and
/// Windows separators.
fn parse_pack_line(line: &str, scenery_root: &Path) -> Option<SceneryPack> {
    let line = line.trim();
    let (status, entry) = if let Some(rest) = line.strip_prefix("SCENERY_PACK_DISABLED") {
        (SceneryPackType::Disabled, rest)
    } else {
        (SceneryPackType::Active, line.strip_prefix("SCENERY_PACK")?)
    };
    // The keyword must be followed by whitespace
    if !entry.starts_with(char::is_whitespace) {
        return None;
    }
    let entry = entry.trim().replace('\\', "/");
    let entry = entry.trim_end_matches('/').trim_end();
    if entry.is_empty() {
        return None;
    }

    let path = resolve_pack_path(entry, scenery_root);
    let name = path.file_name()?.to_string_lossy().trim().to_string();
    Some(SceneryPack { name, path, status })
}

/// Absolute entries stand as written. `Custom Scenery/...` lives under the
/// scenery root; anything else is relative to the installation root.
fn resolve_pack_path(entry: &str, scenery_root: &Path) -> PathBuf {
    let entry_path = Path::new(entry);
    if entry_path.is_absolute() {
        return entry_path.to_path_buf();
    }
    match entry.strip_prefix("Custom Scenery/") {
        Some(pack) => scenery_root.join(pack),
        None => scenery_root.parent().unwrap_or(scenery_root).join(entry_path),
    }
}
