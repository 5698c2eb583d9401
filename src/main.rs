//! Diagram Kernel CLI
//!
//! Usage:
//!   diagram-kernel [OPTIONS] <COMMAND>
//!
//! Commands:
//!   path      Parse path data and print its serialized form, length and bbox
//!   point-at  Point and tangent at a length ratio along path data
//!   hull      Convex hull of a points list
//!   resolve   Resolve the attributes of a scene file
//!
//! Options:
//!   -c, --config <FILE>  Configuration file (TOML format)
//!   -v, --verbose        Log resolution steps at debug level

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use diagram_kernel::attributes::{AttributeEngine, AttributeRegistry, NodeTree, SceneDocument};
use diagram_kernel::geometry::{Path, PathOptions, Polyline};
use diagram_kernel::{Config, GeometryError};

#[derive(Parser)]
#[command(name = "diagram-kernel")]
#[command(about = "Geometry queries and attribute resolution for diagrams")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log resolution steps at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse path data and print its serialized form, length and bbox
    Path {
        /// Path data such as "M 0 0 L 10 10"
        data: String,

        /// Fractional digits of length accuracy for curves
        #[arg(short, long)]
        precision: Option<u32>,
    },

    /// Point and tangent at a length ratio along path data
    PointAt {
        data: String,

        /// Ratio of the total length, clamped to [0, 1]
        ratio: f64,
    },

    /// Convex hull of a points list such as "0,0 10,0 5,5 10,10"
    Hull { points: String },

    /// Resolve the attributes of a scene file and print every updated node
    Resolve { scene: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(message) = run(cli.command, &config) {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Command, config: &Config) -> Result<(), String> {
    match command {
        Command::Path { data, precision } => {
            let path = parse_path(&data)?;
            let opt = PathOptions::new(precision.unwrap_or(config.geometry.precision));
            println!("{}", path.serialize().map_err(|e| format!("Error: {}", e))?);
            println!("length: {}", path.length(opt));
            match path.bbox() {
                Some(bbox) => println!("bbox: {}", bbox),
                None => println!("bbox: none"),
            }
        }
        Command::PointAt { data, ratio } => {
            let path = parse_path(&data)?;
            let opt = PathOptions::new(config.geometry.precision);
            match path.point_at(ratio, opt) {
                Some(point) => println!("point: {}", point.serialize()),
                None => println!("point: none"),
            }
            match path.tangent_at(ratio, opt) {
                Some(tangent) => println!("tangent: {}", tangent.serialize()),
                None => println!("tangent: none"),
            }
        }
        Command::Hull { points } => {
            let polyline = Polyline::parse(&points).map_err(|e| format!("Error: {}", e))?;
            println!("{}", polyline.convex_hull().serialize());
        }
        Command::Resolve { scene } => {
            let mut doc = SceneDocument::from_file(&scene)
                .map_err(|e| format!("Error loading scene '{}': {}", scene.display(), e))?;
            let registry = AttributeRegistry::with_builtins();
            let engine = AttributeEngine::new(&registry, config.attributes.clone());
            let resolved = engine
                .resolve(&mut doc.scene, &doc.attrs, &doc.options)
                .map_err(|e| format!("Error: {}", e))?;

            for (node, attrs) in resolved {
                println!("{}", doc.scene.describe(node));
                for (name, value) in attrs {
                    println!("  {} = {}", name, value);
                }
            }
        }
    }
    Ok(())
}

fn parse_path(data: &str) -> Result<Path, String> {
    Path::parse(data).map_err(|e| match e {
        GeometryError::Parse(parse_error) => parse_error.format(data, "<path>"),
        other => format!("Error: {}", other),
    })
}
