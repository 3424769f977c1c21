//! `idv store`: inspect or clear a persisted flow store.

use std::path::PathBuf;

use idv_store::StepStore;

/// Arguments for `idv store`.
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    command: StoreCommand,
}

#[derive(clap::Subcommand, Debug)]
enum StoreCommand {
    /// Print every stored key and value.
    Show {
        /// Path of the persisted flow store.
        #[arg(long, default_value = ".idv-store.json")]
        store: PathBuf,
    },
    /// Remove every key the store has ever recorded.
    Clear {
        /// Path of the persisted flow store.
        #[arg(long, default_value = ".idv-store.json")]
        store: PathBuf,
    },
}

/// Dispatch the store subcommand.
pub fn run(args: StoreArgs) -> anyhow::Result<()> {
    match args.command {
        StoreCommand::Show { store } => {
            let store = StepStore::open(&store)?;
            let entries = store.snapshot();
            if entries.is_empty() {
                println!("store is empty");
            }
            for (key, value) in entries {
                println!("{key} = {value}");
            }
            Ok(())
        }
        StoreCommand::Clear { store } => {
            let store = StepStore::open(&store)?;
            store.clear();
            println!("store cleared");
            Ok(())
        }
    }
}
