//! Command-line tool for the shelter map core.
//!
//! # Responsibility
//! - Verify `shelter_core` linkage without the Flutter runtime.
//! - Report household proximity and search shelters over local datasets.

use clap::{Args, Parser, Subcommand};
use shelter_core::{AppConfig, CatalogState, MapCommandBuffer, ProximityStatus, ShelterSession};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "shelter", version, about = "Family shelter map core tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    /// Show each member's proximity status
    Status(DataArgs),
    /// Search shelters by category, address or village
    Search {
        /// Search text; empty browses the first entries
        #[arg(default_value = "")]
        query: String,
        #[command(flatten)]
        data: DataArgs,
    },
}

#[derive(Args, Debug)]
struct DataArgs {
    /// JSON config file (defaults to $SHELTER_CONFIG, then built-ins)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the static data root holding datasets and contacts
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,
}

impl DataArgs {
    fn load_config(&self) -> Result<AppConfig, String> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path),
            None => AppConfig::from_env(),
        }
        .map_err(|err| err.to_string())?;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }

    fn open_session(
        &self,
    ) -> Result<ShelterSession<Box<dyn shelter_core::PreferenceStore + Send>, MapCommandBuffer>, String>
    {
        let config = self.load_config()?;
        let mut session = ShelterSession::from_config(&config, MapCommandBuffer::new())
            .map_err(|err| err.to_string())?;
        session.start();
        Ok(session)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Ping => {
            println!("shelter_core ping={}", shelter_core::ping());
            println!("shelter_core version={}", shelter_core::core_version());
            Ok(())
        }
        Command::Status(data) => run_status(&data),
        Command::Search { query, data } => run_search(&query, &data),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_status(data: &DataArgs) -> Result<(), String> {
    let session = data.open_session()?;
    if let CatalogState::Failed(reason) = session.catalog_state() {
        return Err(format!("shelter data unavailable: {reason}"));
    }

    match session.store().common_shelter() {
        Some(shelter) => println!(
            "common shelter: {} ({})",
            shelter.display_name(),
            shelter.address
        ),
        None => println!("common shelter: not set"),
    }
    for (member_id, status) in session.member_statuses() {
        let Some(member) = session.store().member(member_id) else {
            continue;
        };
        match status {
            ProximityStatus::AtShelter { address, name, .. } => {
                println!("{member_id}\t{}\tat shelter\t{name}\t{address}", member.name)
            }
            ProximityStatus::Outside => println!(
                "{member_id}\t{}\toutside\t{:.5}, {:.5}",
                member.name, member.coordinates.lng, member.coordinates.lat
            ),
        }
    }
    Ok(())
}

fn run_search(query: &str, data: &DataArgs) -> Result<(), String> {
    let mut session = data.open_session()?;
    let hits = session.search_shelters(query);
    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in &hits {
        let capacity = hit
            .shelter
            .capacity
            .map(|value| value.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{}\t{}",
            hit.index, hit.shelter.category, hit.shelter.address, capacity
        );
    }
    println!("Found {} result(s).", hits.len());
    Ok(())
}
