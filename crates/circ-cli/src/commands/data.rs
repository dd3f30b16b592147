use std::fs::File;
use std::path::PathBuf;

use clap::Subcommand;

use circ_core::{transfer, Database};

#[derive(Subcommand)]
pub enum DataAction {
    /// Write the full session history to a JSON file
    Export { path: PathBuf },
    /// Merge sessions from a JSON file into the store
    Import { path: PathBuf },
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DataAction::Export { path } => {
            let db = Database::open()?;
            let file = File::create(&path)?;
            let count = transfer::export(&db, file)?;
            println!("Exported {count} sessions to {}", path.display());
        }
        DataAction::Import { path } => {
            let mut db = Database::open()?;
            let file = File::open(&path)?;
            let count = transfer::import(&mut db, file)?;
            println!("Imported {count} sessions");
        }
    }
    Ok(())
}
