use anyhow::{Context, Result};
use clap::Parser;
use hashbrown::HashMap;
use log::info;
use maptracker::cell_status::{member_name, CellStatus};
use maptracker::classify::{classify_location, ClassifyContext};
use maptracker::flags::FlagSet;
use maptracker::inventory::ProgressCounters;
use maptracker::settings::TrackerSettings;
use maptracker::tracker::MapTracker;
use maptracker::traverse::{load_door_map, DoorMap};
use maptracker_game::{CellKey, WorldData};
use std::path::PathBuf;
use strum::IntoEnumIterator;

#[derive(Parser)]
struct Args {
    /// Directory containing doors.json, locations.json, items.json and cells.json
    #[arg(long)]
    world: PathBuf,

    /// Map cell table to use instead of the world directory's cells.json
    #[arg(long)]
    cells: Option<PathBuf>,

    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON object mapping each entrance door to the door it exits through
    #[arg(long)]
    door_map: Option<PathBuf>,

    /// JSON list of the game flags currently set
    #[arg(long)]
    flags: Option<PathBuf>,

    #[arg(long)]
    counters: Option<PathBuf>,

    /// Show the members of one cell, given as X,Y
    #[arg(long)]
    cell: Option<String>,
}

fn parse_cell_key(s: &str) -> Result<CellKey> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("Expected X,Y for cell, got '{s}'"))?;
    let x = x.trim().parse().with_context(|| format!("Invalid x in '{s}'"))?;
    let y = y.trim().parse().with_context(|| format!("Invalid y in '{s}'"))?;
    Ok(CellKey::new(x, y))
}

fn hex_color(status: CellStatus) -> String {
    let [r, g, b] = status.color();
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn print_cell(
    tracker: &MapTracker,
    world: &WorldData,
    key: CellKey,
    flags: &FlagSet,
    counters: &ProgressCounters,
) -> Result<()> {
    let cell = world
        .get_cell(key)
        .with_context(|| format!("No map cell at {key}"))?;
    let reachability = tracker.recompute_if_stale(flags, counters)?;
    let cx = ClassifyContext {
        world,
        flags,
        reachability: &reachability,
    };
    let anchor = cell
        .anchor()
        .with_context(|| format!("Map cell {key} has no locations"))?;
    let anchor = world.get_location(anchor)?;
    for (i, id) in cell.locations.iter().enumerate() {
        let location = world.get_location(id)?;
        let name = member_name(cell, i, world);
        if !tracker.settings().should_track(location) {
            println!("{id:<28} {name:<40} (not tracked)");
            continue;
        }
        let status = classify_location(location, anchor, &cx);
        println!(
            "{id:<28} {name:<40} {status} {}",
            hex_color(CellStatus::from(status))
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let world = match &args.cells {
        Some(cells_path) => WorldData::load_with_cells(&args.world, cells_path)?,
        None => WorldData::load(&args.world)?,
    };
    let settings = match &args.settings {
        Some(path) => TrackerSettings::load(path)?,
        None => TrackerSettings::default(),
    };
    let door_map = match &args.door_map {
        Some(path) => load_door_map(path)?,
        None => DoorMap::new(),
    };
    let flags = match &args.flags {
        Some(path) => FlagSet::load(path)?,
        None => FlagSet::new(),
    };
    let counters = match &args.counters {
        Some(path) => ProgressCounters::load(path)?,
        None => ProgressCounters::default(),
    };
    info!("Starting door: {}", settings.starting_door);
    let tracker = MapTracker::new(&world, settings, door_map);

    if let Some(cell_str) = &args.cell {
        let key = parse_cell_key(cell_str)?;
        return print_cell(&tracker, &world, key, &flags, &counters);
    }

    let statuses = tracker.cell_statuses(&flags, &counters)?;
    let mut status_counts: HashMap<CellStatus, usize> = HashMap::new();
    for (key, status) in &statuses {
        *status_counts.entry(*status).or_default() += 1;
        if *status != CellStatus::Untracked {
            println!(
                "{:<12} {:<22} {}",
                key.to_string(),
                status.to_string(),
                hex_color(*status)
            );
        }
    }
    for status in CellStatus::iter() {
        info!(
            "{}: {} cells",
            status,
            status_counts.get(&status).copied().unwrap_or(0)
        );
    }
    Ok(())
}
