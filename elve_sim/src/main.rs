// CLI entry point: inspect a path through an ASCII voxel grid.
//
// Loads a grid file (one row per line, top row first; see `grid.rs` for the
// character set), finds a path between two cells, prints each edge with its
// movement kind and cost, then runs an Elve along it and prints every
// locomotion state transition with the tick it happened on.
//
// Usage:
//   pathview <GRID> <SX> <SY> <TX> <TY> [OPTIONS]
//     --config <FILE>      GameConfig JSON (default: built-in defaults)
//     --surface <SURFACE>  Starting surface: floor, ceiling, left, right
//                          (default: floor)
//     --max-ticks <N>      Give up after N ticks (default: 10000)
//
// Logging goes to stderr and is controlled by RUST_LOG (default: warn).

use elve_sim::config::GameConfig;
use elve_sim::elve::{AgentEvent, Elve};
use elve_sim::locomotion::LocomotionEvent;
use elve_sim::pathfinding::Pathing;
use elve_sim::types::{CellPos, ElveId, Surface};
use elve_sim::world::World;
use tracing_subscriber::EnvFilter;

struct Args {
    grid_file: String,
    start: CellPos,
    target: CellPos,
    config_file: Option<String>,
    surface: Surface,
    max_ticks: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args();
    if let Err(e) = run(&args) {
        eprintln!("pathview: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(&args.grid_file)?;
    let world = World::from_ascii(&text)?;
    let config = match &args.config_file {
        Some(path) => GameConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => GameConfig::default(),
    };
    config.validate()?;
    let motion = config.motion();

    let pathing = Pathing::new(&world, &config.pathing);
    let path = pathing.find_path(args.start, args.target)?;
    println!(
        "path {} -> {}: {} steps, cost {}",
        args.start,
        args.target,
        path.remaining_len(),
        path.total_cost()
    );
    for step in path.remaining_steps() {
        println!(
            "  {} -> {}  {} ({})",
            step.edge.from,
            step.edge.to,
            step.edge.kind,
            config.pathing.costs.cost(step.edge.kind)
        );
    }

    let mut elve = Elve::new(ElveId(0), args.start, args.surface);
    elve.start_path(&world, &config.pathing, &motion, args.target)?;
    print_transitions(0, &mut elve);

    for tick in 1..=args.max_ticks {
        let outcome = elve.tick(&world, &motion);
        print_transitions(tick, &mut elve);
        match outcome {
            AgentEvent::PathCompleted => {
                println!(
                    "arrived at {} on the {} after {tick} ticks",
                    elve.cell(),
                    elve.surface()
                );
                return Ok(());
            }
            AgentEvent::Halted => {
                let reason = elve.fault().map(|f| f.to_string()).unwrap_or_default();
                return Err(format!("Elve halted at tick {tick}: {reason}").into());
            }
            AgentEvent::Idle | AgentEvent::Moving | AgentEvent::ActionFinished => {}
        }
    }
    Err(format!("not arrived after {} ticks", args.max_ticks).into())
}

fn print_transitions(tick: u64, elve: &mut Elve) {
    for event in elve.drain_locomotion_events() {
        let body = elve.body();
        match event {
            LocomotionEvent::Started(kind) => {
                println!("[{tick:>5}] start  {kind:?} at {} on the {}", body.cell, body.surface)
            }
            LocomotionEvent::Finished(kind) => println!("[{tick:>5}] finish {kind:?}"),
            LocomotionEvent::Interrupted(kind) => println!("[{tick:>5}] abort  {kind:?}"),
        }
    }
}

fn parse_surface(s: &str) -> Option<Surface> {
    match s {
        "floor" => Some(Surface::Floor),
        "ceiling" => Some(Surface::Ceiling),
        "left" => Some(Surface::LeftWall),
        "right" => Some(Surface::RightWall),
        _ => None,
    }
}

/// Parse command-line arguments. Uses simple `std::env::args()` matching.
fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut positional = Vec::new();
    let mut config_file = None;
    let mut surface = Surface::Floor;
    let mut max_ticks = 10_000;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config_file = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--config requires a file");
                    std::process::exit(1);
                }));
            }
            "--surface" => {
                i += 1;
                surface = args.get(i).and_then(|s| parse_surface(s)).unwrap_or_else(|| {
                    eprintln!("--surface requires one of floor, ceiling, left, right");
                    std::process::exit(1);
                });
            }
            "--max-ticks" => {
                i += 1;
                max_ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--max-ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    if positional.len() != 5 {
        print_usage();
        std::process::exit(1);
    }
    let coord = |s: &String| -> i32 {
        s.parse().unwrap_or_else(|_| {
            eprintln!("invalid coordinate: {s}");
            std::process::exit(1);
        })
    };
    Args {
        grid_file: positional[0].clone(),
        start: CellPos::new(coord(&positional[1]), coord(&positional[2])),
        target: CellPos::new(coord(&positional[3]), coord(&positional[4])),
        config_file,
        surface,
        max_ticks,
    }
}

fn print_usage() {
    println!("Usage: pathview <GRID> <SX> <SY> <TX> <TY> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>      GameConfig JSON (default: built-in defaults)");
    println!("  --surface <SURFACE>  floor, ceiling, left, right (default: floor)");
    println!("  --max-ticks <N>      Give up after N ticks (default: 10000)");
    println!("  --help, -h           Show this help");
}
