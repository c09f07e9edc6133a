use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use ev_station_planner::planner::{
    append_result_row, parse_teleports, plan_layout, require_layout, route_base_name,
    DistanceEngine, GraspParams, LaneId, LaneVisitStatistics, NetworkContext, PlanRequest,
    ResultRow, RunLabels, RunMetrics, SelectionMethod,
};

#[derive(Parser)]
#[command(name = "ev_station_planner")]
#[command(about = "Charging station placement for simulated road networks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Select station lanes from exploration visit counts and write the layout file
    Select(SelectArgs),
    /// Print the network distance between two lanes
    Distance(DistanceArgs),
    /// Write the list of edges that made it into the road graph
    Edges(EdgesArgs),
    /// Append a validation result row to the results table
    Record(RecordArgs),
}

#[derive(Args)]
struct SelectArgs {
    /// Road network description
    #[arg(long, default_value = "cologne2.net.xml")]
    net_file: PathBuf,

    /// Lane visit counts written by the exploration pass (JSON)
    #[arg(long)]
    visits: PathBuf,

    /// Route file the visits were gathered with (names the layout file)
    #[arg(long)]
    route_file: PathBuf,

    #[arg(long, value_enum)]
    method: SelectionMethod,

    /// Number of stations to place
    #[arg(long = "stations", default_value = "10")]
    station_count: usize,

    /// Parking spaces per station
    #[arg(long, default_value = "5")]
    capacity: u32,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// GRASP restarts
    #[arg(long, default_value = "10")]
    restarts: usize,

    /// GRASP exclusion radius in network length units
    #[arg(long, default_value = "500")]
    exclusion_radius: f64,

    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct DistanceArgs {
    #[arg(long, default_value = "cologne2.net.xml")]
    net_file: PathBuf,

    #[arg(long)]
    from: String,

    #[arg(long)]
    to: String,
}

#[derive(Args)]
struct EdgesArgs {
    #[arg(long, default_value = "cologne2.net.xml")]
    net_file: PathBuf,

    #[arg(long, default_value = "edges_in_graph.txt")]
    out: PathBuf,
}

#[derive(Args)]
struct RecordArgs {
    #[arg(long, value_enum)]
    method: SelectionMethod,

    #[arg(long)]
    route_file: PathBuf,

    /// Station layout the validation run used
    #[arg(long)]
    layout_file: Option<PathBuf>,

    #[arg(long = "stations", default_value = "10")]
    station_count: usize,

    #[arg(long, default_value = "10")]
    recharge_minutes: f64,

    #[arg(long, default_value = "1")]
    rep: u32,

    /// Engine log of the validation run (teleport count)
    #[arg(long)]
    log_file: PathBuf,

    /// Mean queue time in seconds
    #[arg(long, default_value = "0")]
    mean_queue: f64,

    /// Mean distance to station in metres
    #[arg(long, default_value = "0")]
    mean_distance: f64,

    /// Execution time in seconds
    #[arg(long, default_value = "0")]
    exec_time: f64,

    #[arg(long, default_value = "output")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Select(args) => run_select(args),
        Command::Distance(args) => run_distance(args),
        Command::Edges(args) => run_edges(args),
        Command::Record(args) => run_record(args),
    }
}

fn run_select(args: SelectArgs) -> Result<()> {
    let context = NetworkContext::load(&args.net_file)?;
    let visits = LaneVisitStatistics::load(&args.visits)?;
    info!(
        "{} visited lanes, {} visits in total",
        visits.len(),
        visits.total_visits()
    );

    let request = PlanRequest {
        method: args.method,
        station_count: args.station_count,
        capacity: args.capacity,
        seed: args.seed,
        grasp: GraspParams {
            restarts: args.restarts,
            exclusion_radius: args.exclusion_radius,
            ..GraspParams::default()
        },
        out_dir: args.out_dir,
        route_base: route_base_name(&args.route_file),
    };

    let planned = plan_layout(&context, &visits, &request)?;
    println!("{}", planned.path.display());
    Ok(())
}

fn run_distance(args: DistanceArgs) -> Result<()> {
    let context = NetworkContext::load(&args.net_file)?;
    let mut distance = DistanceEngine::new(&context);
    let value = distance.lane_distance(&LaneId::new(args.from), &LaneId::new(args.to));
    println!("{}", value);
    Ok(())
}

fn run_edges(args: EdgesArgs) -> Result<()> {
    let context = NetworkContext::load(&args.net_file)?;
    context.graph().write_edge_report(&args.out)?;
    info!("Edge report written to {}", args.out.display());
    Ok(())
}

fn run_record(args: RecordArgs) -> Result<()> {
    let layout_file = require_layout(args.layout_file.as_deref())?.to_path_buf();

    let metrics = RunMetrics {
        execution_time: args.exec_time,
        teleport_count: parse_teleports(&args.log_file),
        mean_queue_time: args.mean_queue,
        mean_distance_to_station: args.mean_distance,
    };
    let labels = RunLabels {
        method: args.method,
        station_count: args.station_count,
        recharge_minutes: args.recharge_minutes,
        repetition: args.rep,
        route_file: args.route_file,
        layout_file,
    };

    let table = args.out_dir.join("results.csv");
    append_result_row(&table, &ResultRow::new(&labels, &metrics))
        .context("Could not record validation result")?;
    Ok(())
}
