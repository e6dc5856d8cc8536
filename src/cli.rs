use clap::{Parser, Subcommand};

use crate::models::audit::ReviewDecision;

/// govrag: governed retrieval-augmented answering with human review
#[derive(Parser)]
#[command(name = "govrag", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (defaults to PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Apply database migrations and exit
    Migrate,

    /// Ingest the built-in sample documents
    Seed,

    /// Answer a prompt from the command line and record it for review
    Ask {
        prompt: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Approve or reject a pending answer
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },

    /// Print review statistics
    Stats,
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Approve a pending answer
    Approve {
        id: String,
        #[arg(long)]
        reviewer: String,
    },
    /// Reject a pending answer
    Reject {
        id: String,
        #[arg(long)]
        reviewer: String,
    },
}

impl ReviewCommands {
    pub fn into_parts(self) -> (ReviewDecision, String, String) {
        match self {
            ReviewCommands::Approve { id, reviewer } => (ReviewDecision::Approved, id, reviewer),
            ReviewCommands::Reject { id, reviewer } => (ReviewDecision::Rejected, id, reviewer),
        }
    }
}
