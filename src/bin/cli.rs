//! surveylines CLI - survey line reconstruction from trajectory logs
//!
//! Usage:
//!   surveylines-cli flights <folder> [--output <dir>]
//!   surveylines-cli survey <folder> [--output <dir>] [--config <file>]
//!   surveylines-cli cameras <folder>
//!
//! `flights` segments each trajectory on its own and writes per-flight line
//! layers plus the length report. `survey` additionally merges lines across
//! flights, numbers them and builds the coverage polygon.

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use surveylines::{
    build_boundary,
    io::{
        discover_flights,
        export::{
            boundary_geojson, extreme_points_geojson, lines_geojson, segments_geojson,
            straight_lines_geojson, write_boundary_kml_file, write_geojson, write_lines_kml_file,
        },
        read_trajectory, rename_camera_log,
        report::{area_report, flight_report, volume_report, write_report},
    },
    process_flights, run_survey, select_in_rect, Bounds, DirectionLabel, FlightBatch, NoopProgress,
    PointKey, Projection, ReferenceFrame, Result, SurveyConfig, SurveyError, SurveyResult,
};

#[derive(Parser)]
#[command(name = "surveylines-cli")]
#[command(about = "Reconstruct aerial survey lines from trajectory logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Folder searched recursively for trajectory files
    folder: PathBuf,

    /// File name prefix of trajectory files
    #[arg(short, long, default_value = "")]
    pattern: String,

    /// Output directory (defaults to <folder>/output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reference frame of the input, e.g. EPSG:4326 or EPSG:32614
    #[arg(long)]
    crs: Option<String>,

    /// 0-based X column
    #[arg(long)]
    x_col: Option<usize>,

    /// 0-based Y column
    #[arg(long)]
    y_col: Option<usize>,

    /// 0-based Z column
    #[arg(long)]
    z_col: Option<usize>,

    /// Leading rows to drop from every file
    #[arg(long)]
    skip_rows: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment each flight and write per-flight line layers
    Flights(InputArgs),

    /// Merge lines across flights and build the coverage polygon
    Survey {
        #[command(flatten)]
        input: InputArgs,

        /// Merge tolerance in meters
        #[arg(long)]
        tolerance: Option<f64>,

        /// Discard unmerged lines with this direction (repeatable)
        #[arg(long)]
        drop_unmerged: Vec<String>,

        /// Extreme point left out of the polygon, as <id>:<max|min> (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Leave out every extreme point inside min_x,min_y,max_x,max_y
        /// (input coordinates)
        #[arg(long, value_delimiter = ',', num_args = 4)]
        exclude_rect: Option<Vec<f64>>,
    },

    /// Rename image tags in camera event logs
    Cameras {
        /// Folder containing camera logs
        folder: PathBuf,

        /// File name prefix of camera logs
        #[arg(short, long, default_value = "Camara_v")]
        pattern: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Flights(input) => run_flights(&input),
        Commands::Survey {
            input,
            tolerance,
            drop_unmerged,
            exclude,
            exclude_rect,
        } => run_survey_command(&input, tolerance, &drop_unmerged, &exclude, exclude_rect),
        Commands::Cameras { folder, pattern } => run_cameras(&folder, &pattern),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Build the configuration from the optional file and the flags.
fn load_config(input: &InputArgs) -> Result<SurveyConfig> {
    let mut config = match &input.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    };
    if let Some(crs) = &input.crs {
        config.frame = crs.parse::<ReferenceFrame>()?;
    }
    if let Some(x) = input.x_col {
        config.reader.x_column = x;
    }
    if let Some(y) = input.y_col {
        config.reader.y_column = y;
    }
    if let Some(z) = input.z_col {
        config.reader.z_column = z;
    }
    if let Some(rows) = input.skip_rows {
        config.reader.skip_rows = rows;
    }
    Ok(config)
}

fn output_dir(input: &InputArgs) -> Result<PathBuf> {
    let dir = input
        .output
        .clone()
        .unwrap_or_else(|| input.folder.join("output"));
    fs::create_dir_all(&dir).map_err(|e| SurveyError::io(&dir, e))?;
    Ok(dir)
}

fn find_inputs(input: &InputArgs) -> Result<Vec<PathBuf>> {
    let paths = discover_flights(&input.folder, &input.pattern)?;
    if paths.is_empty() {
        return Err(SurveyError::NoInputFiles);
    }
    info!("Found {} trajectory files in {}", paths.len(), input.folder.display());
    Ok(paths)
}

fn run_flights(input: &InputArgs) -> Result<()> {
    let config = load_config(input)?;
    let paths = find_inputs(input)?;
    let out = output_dir(input)?;

    let mut flights = Vec::with_capacity(paths.len());
    for path in &paths {
        match read_trajectory(path, &config.reader) {
            Ok(flight) => flights.push(flight),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let batch = process_flights(&flights, &config, &NoopProgress)?;
    write_flight_layers(&out, &batch)?;

    println!("\n{}", "=".repeat(60));
    println!(
        "{} flights processed, {} empty, {} failed, {:.3} km of lines",
        batch.summary.processed.len(),
        batch.summary.empty.len(),
        batch.summary.failed.len() + paths.len() - flights.len(),
        batch.total_length_km()
    );
    println!("Output written to {}", out.display());
    Ok(())
}

/// Per-flight segment layers and the flight length report.
fn write_flight_layers(out: &Path, batch: &FlightBatch) -> Result<()> {
    for flight in batch.flights.iter().filter(|f| !f.is_empty()) {
        let path = out.join(format!("{}_lines.geojson", flight.flight_id));
        write_geojson(&path, &segments_geojson(&flight.segments, &batch.frame))?;
    }
    write_report(
        &out.join("Report.txt"),
        &flight_report(&batch.flights, &batch.frame),
    )
}

fn run_survey_command(
    input: &InputArgs,
    tolerance: Option<f64>,
    drop_unmerged: &[String],
    exclude: &[String],
    exclude_rect: Option<Vec<f64>>,
) -> Result<()> {
    let mut config = load_config(input)?;
    if let Some(t) = tolerance {
        config.merge.tolerance = t;
    }
    config
        .merge
        .drop_unmerged
        .extend(drop_unmerged.iter().map(|d| DirectionLabel::from(d.clone())));
    for key in exclude {
        config.perimeter.exclude.push(key.parse::<PointKey>()?);
    }

    let paths = find_inputs(input)?;
    let out = output_dir(input)?;

    let mut result = run_survey(&paths, &config, &NoopProgress)?;

    if let Some(rect) = exclude_rect {
        let [min_x, min_y, max_x, max_y] = rect[..] else {
            return Err(SurveyError::Config(
                "--exclude-rect takes min_x,min_y,max_x,max_y".to_string(),
            ));
        };
        // Given in input coordinates, selected in the working frame
        let rect = result.network.frame.project_bounds(&Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
        });
        let selected = select_in_rect(&result.network.extreme_points, &rect);
        info!("Excluding {} extreme points inside the rectangle", selected.len());
        config.perimeter.exclude.extend(selected);
        result.network.boundary = build_boundary(
            &result.network.extreme_points,
            &config.perimeter.exclusion_set(),
        );
    }

    write_survey_outputs(&out, &result, &config)?;

    let network = &result.network;
    println!("\n{}", "=".repeat(60));
    println!(
        "{} lines, {:.3} km total ({} flights: {} processed, {} empty, {} failed)",
        network.lines.len(),
        network.total_length_km(),
        result.batch.summary.total(),
        result.batch.summary.processed.len(),
        result.batch.summary.empty.len(),
        result.batch.summary.failed.len()
    );
    match &network.boundary {
        Some(b) => println!("Coverage: {:.3} km2 ({:.3} ha)", b.area_km2(), b.area_hectares()),
        None => println!("Coverage polygon not built"),
    }
    println!("Output written to {}", out.display());
    Ok(())
}

fn write_survey_outputs(out: &Path, result: &SurveyResult, config: &SurveyConfig) -> Result<()> {
    let network = &result.network;
    let frame = &network.frame;

    write_flight_layers(out, &result.batch)?;

    write_geojson(&out.join("lines.geojson"), &lines_geojson(&network.lines, frame))?;
    write_geojson(
        &out.join("straight_lines.geojson"),
        &straight_lines_geojson(&network.straight_lines, frame),
    )?;
    write_geojson(
        &out.join("extreme_points.geojson"),
        &extreme_points_geojson(
            &network.extreme_points,
            &config.perimeter.exclusion_set(),
            frame,
        ),
    )?;
    write_lines_kml_file(&out.join("lines.kml"), &network.lines, network.projection())?;
    write_report(&out.join("VolumeTotal.txt"), &volume_report(&network.lines))?;

    if let Some(boundary) = &network.boundary {
        write_geojson(&out.join("polygon.geojson"), &boundary_geojson(boundary, frame))?;
        write_boundary_kml_file(&out.join("polygon.kml"), boundary, network.projection())?;
        write_report(&out.join("Area.txt"), &area_report(boundary))?;
    }
    Ok(())
}

fn run_cameras(folder: &Path, pattern: &str) -> Result<()> {
    let logs = discover_flights(folder, pattern)?;
    if logs.is_empty() {
        return Err(SurveyError::NoInputFiles);
    }
    for log_path in logs {
        // Skip outputs of a previous run
        if log_path
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().ends_with("__"))
        {
            continue;
        }
        let written = rename_camera_log(&log_path)?;
        info!("{} renamed to {}", log_path.display(), written.display());
    }
    Ok(())
}
