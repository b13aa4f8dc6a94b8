// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use crossbeam::channel;
use csv::{ReaderBuilder, Trim, Writer};
use gas_station_rs::{
    ContentionPolicy, FuelType, GasStation, StationConfig, StationError, UnpricedFuelPolicy,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Gas Station - Serve fuel purchase requests concurrently
///
/// Reads purchase requests from a CSV file, runs them against one shared
/// station from several worker threads, and writes the pump stock left
/// afterwards to stdout.
#[derive(Parser, Debug)]
#[command(name = "gas-station-rs")]
#[command(about = "A gas station that serves purchase request CSVs concurrently", long_about = None)]
struct Args {
    /// Path to CSV file with purchase requests
    ///
    /// Expected format: fuel,amount,max_price
    /// Example: cargo run -- --pump regular=100 --price regular=1.62 requests.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Pump to install, as <fuel>=<stock>; repeat for more pumps
    #[arg(long = "pump", value_name = "FUEL=STOCK", value_parser = parse_assignment)]
    pumps: Vec<(FuelType, Decimal)>,

    /// Price per unit, as <fuel>=<price>; repeat for more fuel types
    #[arg(long = "price", value_name = "FUEL=PRICE", value_parser = parse_assignment)]
    prices: Vec<(FuelType, Decimal)>,

    /// Number of concurrent buyers
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Handling of fuel types without a price
    #[arg(long, value_enum, default_value_t = UnpricedFuelPolicy::Free)]
    unpriced: UnpricedFuelPolicy,

    /// What a buyer does when all candidate pumps are busy
    #[arg(long, value_enum, default_value_t = ContentionPolicy::Spin)]
    contention: ContentionPolicy,
}

/// Parses `<fuel>=<decimal>`.
fn parse_assignment(arg: &str) -> Result<(FuelType, Decimal), String> {
    let (fuel, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <fuel>=<value>, got '{arg}'"))?;
    let fuel = fuel.parse::<FuelType>().map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid value '{value}': {e}"))?;
    Ok((fuel, value))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let station = match build_station(&args) {
        Ok(station) => station,
        Err(e) => {
            eprintln!("Error configuring station: {}", e);
            process::exit(1);
        }
    };

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    if let Err(e) = process_requests(&station, BufReader::new(file), args.workers as usize) {
        eprintln!("Error processing requests: {}", e);
        process::exit(1);
    }

    let stats = station.statistics();
    info!(
        revenue = %stats.revenue,
        sales = stats.sales,
        cancellations_no_gas = stats.cancellations_no_gas,
        cancellations_too_expensive = stats.cancellations_too_expensive,
        "all requests served"
    );

    if let Err(e) = write_pumps(&station, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Builds a station from the command line setup flags.
fn build_station(args: &Args) -> Result<GasStation, StationError> {
    let mut station = GasStation::with_config(StationConfig {
        unpriced_fuel: args.unpriced,
        contention: args.contention,
    });
    for (fuel_type, price) in &args.prices {
        station.set_price(*fuel_type, *price)?;
    }
    for (fuel_type, stock) in &args.pumps {
        station.add_pump(*fuel_type, *stock)?;
    }
    Ok(station)
}

/// Raw CSV record matching the input format.
///
/// Fields: `fuel, amount, max_price`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    fuel: String,
    amount: Decimal,
    max_price: Decimal,
}

#[derive(Debug, Clone, Copy)]
struct Request {
    line: u64,
    fuel_type: FuelType,
    amount: Decimal,
    max_price: Decimal,
}

/// Failures that stop the driver.
#[derive(Debug, thiserror::Error)]
enum DriverError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Some requests may not have been served
    #[error("a buyer thread panicked")]
    BuyerPanicked,
}

/// Serves purchase requests from a CSV reader on `workers` threads.
///
/// Rows are streamed into a channel as they are parsed, so a large file is
/// never held in memory. Malformed rows are skipped with a warning.
///
/// # Errors
///
/// - [`DriverError::Csv`] - the header cannot be read.
/// - [`DriverError::BuyerPanicked`] - a worker died before the input was drained.
fn process_requests<R: Read>(
    station: &GasStation,
    reader: R,
    workers: usize,
) -> Result<(), DriverError> {
    run_buyers(station, reader, workers, serve)
}

fn run_buyers<R, F>(
    station: &GasStation,
    reader: R,
    workers: usize,
    handler: F,
) -> Result<(), DriverError>
where
    R: Read,
    F: Fn(&GasStation, Request) + Sync,
{
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);
    rdr.headers()?;

    let (sender, receiver) = channel::bounded::<Request>(workers * 4);

    let scoped = crossbeam::thread::scope(|scope| {
        for _ in 0..workers {
            let receiver = receiver.clone();
            let handler = &handler;
            scope.spawn(move |_| {
                for request in receiver {
                    handler(station, request);
                }
            });
        }
        drop(receiver);

        for (index, result) in rdr.deserialize::<CsvRecord>().enumerate() {
            let line = index as u64 + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(line, "skipping malformed row: {e}");
                    continue;
                }
            };
            let fuel_type = match record.fuel.parse::<FuelType>() {
                Ok(fuel_type) => fuel_type,
                Err(e) => {
                    warn!(line, "skipping row: {e}");
                    continue;
                }
            };
            let request = Request {
                line,
                fuel_type,
                amount: record.amount,
                max_price: record.max_price,
            };
            if sender.send(request).is_err() {
                break;
            }
        }
        drop(sender);
    });

    scoped.map_err(|_| DriverError::BuyerPanicked)
}

fn serve(station: &GasStation, request: Request) {
    match station.buy_gas(request.fuel_type, request.amount, request.max_price) {
        Ok(charge) => debug!(line = request.line, charge = %charge, "request served"),
        Err(e) => debug!(line = request.line, reason = %e, "request refused"),
    }
}

/// One output row per pump.
#[derive(Debug, Serialize)]
struct PumpRow {
    pump: usize,
    fuel: FuelType,
    remaining: Decimal,
}

/// Write the stock left in every pump to a CSV writer.
///
/// # CSV Format
///
/// Columns: `pump, fuel, remaining`
///
/// ```csv
/// pump,fuel,remaining
/// 0,regular,40
/// 1,diesel,470
/// ```
fn write_pumps<W: Write>(station: &GasStation, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for (index, pump) in station.pumps().iter().enumerate() {
        wtr.serialize(PumpRow {
            pump: index,
            fuel: pump.fuel_type(),
            remaining: pump.remaining(),
        })?;
    }

    wtr.flush()?;
    Ok(())
}
