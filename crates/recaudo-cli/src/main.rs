use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recaudo_core::{io, stations, strata, transactions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "BRT smart-card data cleaning pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter sentinel station codes and geocode stations as points
    Stations(StationsArgs),
    /// Assign an averaged socioeconomic stratum to every station
    Strata(StrataArgs),
    /// Parse packed timestamps and resolve transactions to canonical stations
    Transactions(TransactionsArgs),
}

#[derive(Args, Debug)]
struct StationsArgs {
    /// Raw station CSV
    #[arg(long)]
    stations: PathBuf,
    /// Output table (.csv or .parquet)
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct StrataArgs {
    /// Raw station CSV
    #[arg(long)]
    stations: PathBuf,
    /// Stratum block polygon layer (GeoJSON FeatureCollection with ESTRATO)
    #[arg(long)]
    blocks: PathBuf,
    /// Output table (.csv or .parquet)
    #[arg(long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct TransactionsArgs {
    /// Raw transaction CSV
    #[arg(long)]
    transactions: PathBuf,
    /// Raw station CSV used to resolve canonical station ids
    #[arg(long)]
    stations: PathBuf,
    /// Output table (.csv or .parquet)
    #[arg(long)]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Stations(args) => handle_stations(args),
        Command::Strata(args) => handle_strata(args),
        Command::Transactions(args) => handle_transactions(args),
    }
}

fn handle_stations(args: StationsArgs) -> Result<()> {
    let raw = io::read_stations_csv(&args.stations).context("failed to read station table")?;
    let mut cleaned = stations::clean_stations(&raw).context("station cleaning failed")?;
    info!(
        input = raw.height(),
        output = cleaned.height(),
        "cleaned station table"
    );
    io::write_table(&args.output, &mut cleaned)?;
    Ok(())
}

fn handle_strata(args: StrataArgs) -> Result<()> {
    let raw = io::read_stations_csv(&args.stations).context("failed to read station table")?;
    let blocks =
        io::read_blocks_geojson(&args.blocks).context("failed to read stratum block layer")?;
    let mut assigned =
        strata::assign_strata(&raw, &blocks).context("stratum assignment failed")?;
    info!(stations = assigned.height(), "assigned strata");
    io::write_table(&args.output, &mut assigned)?;
    Ok(())
}

fn handle_transactions(args: TransactionsArgs) -> Result<()> {
    let raw = io::read_transactions_csv(&args.transactions)
        .context("failed to read transaction table")?;
    let station_table =
        io::read_stations_csv(&args.stations).context("failed to read station table")?;
    let lookup =
        stations::clean_stations(&station_table).context("station cleaning failed")?;
    let mut cleaned = transactions::clean_transactions(&raw, &lookup)
        .context("transaction cleaning failed")?;
    info!(
        input = raw.height(),
        output = cleaned.height(),
        "cleaned transaction table"
    );
    io::write_table(&args.output, &mut cleaned)?;
    Ok(())
}
