// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use runwaydb_core::cache::TileCache;
use runwaydb_core::ingest::SourceSet;
use runwaydb_core::{
    find_xplane_root, Airport, CacheStatus, Database, DatabaseConfig, GeoPos2, NavdataFormat,
};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to X-Plane root
    #[arg(short, long, env = "XPLANE_ROOT")]
    root: Option<PathBuf>,

    /// Directory holding the airport cache
    #[arg(long, env = "RUNWAYDB_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Navigation data layout to reconcile against
    #[arg(long, value_enum)]
    navdata: Option<NavdataArg>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum NavdataArg {
    Auto,
    Legacy,
    Modern,
}

impl From<NavdataArg> for NavdataFormat {
    fn from(arg: NavdataArg) -> Self {
        match arg {
            NavdataArg::Auto => NavdataFormat::Auto,
            NavdataArg::Legacy => NavdataFormat::Legacy,
            NavdataArg::Modern => NavdataFormat::Modern,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Re-ingest all data and rewrite the cache
    Rebuild,
    /// Show data sources and whether the cache is current
    Status,
    /// List airports near a position
    Nearest {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Show one airport and its runways
    Lookup {
        icao: String,
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Find the nearest transition altitude/level
    Transition {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        hint: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("runwaydb")
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn build_config(cli: &Cli) -> Result<DatabaseConfig> {
    let mut config = match &cli.config {
        Some(path) => DatabaseConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let path = DatabaseConfig::default_path();
            if path.exists() {
                DatabaseConfig::load(&path)?
            } else {
                DatabaseConfig::default()
            }
        }
    };
    if let Some(root) = &cli.root {
        config.xplane_root = Some(root.clone());
    }
    if config.xplane_root.is_none() {
        config.xplane_root = Some(find_xplane_root().ok_or_else(|| {
            anyhow::anyhow!("Could not find X-Plane root. Please specify with --root.")
        })?);
    }
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(navdata) = cli.navdata {
        config.navdata = navdata.into();
    }
    Ok(config)
}

fn print_airport(apt: &Airport, from: GeoPos2) {
    let dist_nm = runwaydb_core::geo::great_circle_distance(from, apt.refpt().pos2())
        / runwaydb_core::geo::NM_TO_M;
    println!(
        "{}  {:.6} {:.6}  elev {:.0} ft  TA {}  TL {}  {:.1} NM",
        apt.icao(),
        apt.refpt().lat,
        apt.refpt().lon,
        apt.refpt().elev,
        apt.ta,
        apt.tl,
        dist_nm
    );
    for rwy in apt.runways() {
        let length = rwy.geometry().map_or(0.0, |g| g.length);
        println!("  {:<8} {:>6.0} m x {:>3.0} m", rwy.joint_id(), length, rwy.width);
        for (i, end) in rwy.ends.iter().enumerate() {
            let hdg = rwy.geometry().map_or(0.0, |g| g.ends[i].hdg);
            println!(
                "    {:<4} hdg {:>5.1}  thr elev {:>5.0} ft  GPA {:.2}  TCH {:.0} ft",
                end.id, hdg, end.thr.elev, end.gpa, end.tch
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = build_config(&cli)?;

    match &cli.command {
        Commands::Rebuild => {
            let db = Database::rebuild(config)?;
            match db.cache_status() {
                CacheStatus::Degraded(reason) => {
                    anyhow::bail!("Could not update data cache: {}", reason)
                }
                _ => println!("Cache rebuilt in {}", db.config().cache_dir.display()),
            }
        }
        Commands::Status => {
            let sources = SourceSet::discover(&config)?;
            let cache = TileCache::new(&config.cache_dir);
            println!("X-Plane root: {}", sources.xplane_root.display());
            println!("Navdata:      {}", sources.navdata.supplemental.path().display());
            println!("AIRAC cycle:  {}", sources.cycle);
            println!("Sources:");
            for path in sources.paths() {
                println!("  {}", path.display());
            }
            let stamp = runwaydb_core::cache::CacheStamp::current(sources.cycle, sources.paths());
            let state = if cache.is_valid(&stamp) { "current" } else { "stale" };
            println!("Cache:        {} ({})", cache.dir().display(), state);
        }
        Commands::Nearest { lat, lon } => {
            let pos = GeoPos2::new(*lat, *lon);
            let mut db = Database::open(config)?;
            db.load_nearest_tiles(pos);
            let airports = db.find_nearest_airports(pos);
            if airports.is_empty() {
                println!("No airports within {} NM", db.config().nearest_radius_nm);
            }
            for apt in airports {
                print_airport(apt, pos);
            }
        }
        Commands::Lookup { icao, lat, lon } => {
            let pos = GeoPos2::new(*lat, *lon);
            let mut db = Database::open(config)?;
            match db.lookup_airport(&icao.to_uppercase(), pos) {
                Some(apt) => print_airport(apt, pos),
                None => println!("No airport '{}' in tile of {:.3} {:.3}", icao, lat, lon),
            }
        }
        Commands::Transition { lat, lon, hint } => {
            let pos = GeoPos2::new(*lat, *lon);
            let mut db = Database::open(config)?;
            let hint = hint.as_ref().map(|h| h.to_uppercase());
            match db.nearest_airport_with_transition_data(pos, hint.as_deref()) {
                Some(apt) => print_airport(apt, pos),
                None => println!("No transition data near {:.3} {:.3}", lat, lon),
            }
        }
    }

    Ok(())
}
