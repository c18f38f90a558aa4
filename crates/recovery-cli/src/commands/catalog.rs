use clap::Subcommand;
use recovery_core::Catalog;

use super::{print_json, CommandResult};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List the behaviors a plan can target (`<data_dir>/catalog.json`
    /// overrides the built-in set)
    List,
    /// Show risks and guidelines for one behavior
    Show {
        /// Behavior key (e.g. "smoking")
        key: String,
    },
}

pub fn run(action: CatalogAction) -> CommandResult {
    let catalog = Catalog::load()?;
    match action {
        CatalogAction::List => {
            let entries: Vec<_> = catalog.entries().collect();
            print_json(&entries)
        }
        CatalogAction::Show { key } => match catalog.get(&key) {
            Some(entry) => print_json(entry),
            None => Err(format!("unknown behavior: {key}").into()),
        },
    }
}
