//! Command line definition for `intake-forms`

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake-forms", version, about = "Check and run intake form wizards")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a form definition and report structural problems
    Check {
        /// Form definition (JSON)
        definition: PathBuf,
    },

    /// Show which steps are active for a set of answers
    Steps {
        definition: PathBuf,
        /// Answers (JSON object keyed by field id)
        data: PathBuf,
    },

    /// Validate answers as a submission would
    Validate {
        definition: PathBuf,
        data: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk the wizard with the given answers and submit to the file store
    Submit {
        definition: PathBuf,
        data: PathBuf,
        /// Store directory (defaults to the configured one)
        #[arg(long)]
        store: Option<PathBuf>,
    },
}
