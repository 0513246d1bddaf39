//! IPNE progress inspector
//!
//! Native tool that reads and edits a progress store file with the same
//! keys the browser build keeps in LocalStorage.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::rc::Rc;

    use anyhow::{Result, bail};
    use clap::{Parser, Subcommand};

    use ipne_progress::platform::FileStorageProvider;
    use ipne_progress::{GameRecord, PlayerClass, RecordStore, TUTORIAL_STEPS, Tutorial};

    #[derive(Parser, Debug)]
    #[command(about = "Inspect or reset IPNE best records and tutorial progress", version)]
    pub struct Args {
        /// Progress store file (JSON object of storage keys)
        #[arg(long, env = "IPNE_STORE", default_value = "ipne_progress.json")]
        pub store: PathBuf,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand, Debug)]
    pub enum Command {
        /// Print best records and tutorial state
        Show,
        /// Remove best records and the tutorial flag
        Clear,
        /// Save a clear time for a class
        Record {
            /// warrior or thief
            class: String,
            /// Clear time in milliseconds
            time_ms: u64,
        },
        /// Mark the tutorial as completed
        SkipTutorial,
    }

    pub fn run(args: Args) -> Result<()> {
        let storage = Rc::new(FileStorageProvider::new(&args.store));
        let records = RecordStore::with_provider(storage.clone());
        let tutorial = Tutorial::with_provider(storage);

        match args.command {
            Command::Show => {
                let best = records.all_best_records();
                if best.is_empty() {
                    println!("No best records yet");
                }
                for (class, record) in best {
                    println!(
                        "{:<8} {:>8} ms  rank {}  ({})",
                        class.as_str(),
                        record.time,
                        record.rating.as_str(),
                        record.date
                    );
                }
                let state = tutorial.init();
                if state.is_completed {
                    println!("Tutorial: completed");
                } else {
                    println!("Tutorial: not completed ({} steps)", TUTORIAL_STEPS.len());
                }
            }
            Command::Clear => {
                records.clear_records();
                println!("Progress cleared in {}", args.store.display());
            }
            Command::Record { class, time_ms } => {
                let Some(class) = PlayerClass::from_str(&class) else {
                    bail!("unknown player class '{class}' (expected warrior or thief)");
                };
                let update = records.record_clear(time_ms, class);
                let stored = records.best_record_for_class(class);
                println!(
                    "{}",
                    describe_record(class, time_ms, update.is_new_best, stored.as_ref())
                );
            }
            Command::SkipTutorial => {
                tutorial.skip(tutorial.init());
                println!("Tutorial marked completed");
            }
        }
        Ok(())
    }

    /// Outcome line for `record`, based on what the store holds after the save
    pub fn describe_record(
        class: PlayerClass,
        time_ms: u64,
        is_new_best: bool,
        stored: Option<&GameRecord>,
    ) -> String {
        match stored {
            Some(best) if is_new_best && best.time == time_ms => {
                format!("New best for {}: {} ms", class.as_str(), time_ms)
            }
            Some(best) if is_new_best => format!(
                "{} ms would be a new best for {} but was not saved (stored best: {} ms)",
                time_ms,
                class.as_str(),
                best.time
            ),
            Some(best) => format!("Best for {} stays at {} ms", class.as_str(), best.time),
            None => format!(
                "{} ms for {} was not saved (store not writable)",
                time_ms,
                class.as_str()
            ),
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::init();
    cli::run(cli::Args::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry points live in `ipne_progress::web`
}
