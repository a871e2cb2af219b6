use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bookvault")]
#[command(about = "Capture bookings and consultations and mirror them into a note vault")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the record store database
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Vault root directory (mirror files go to its record folder)
    #[arg(long, global = true, value_name = "PATH")]
    pub vault_path: Option<PathBuf>,

    /// Sync cursor state file
    #[arg(long, global = true, value_name = "PATH")]
    pub state_path: Option<PathBuf>,

    /// Extra dotenv file to load (variables already set take precedence)
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a booking
    #[command(alias = "new")]
    Book {
        /// Name of the person booking
        #[arg(long)]
        name: String,
        /// Phone, email or handle to reach them
        #[arg(long)]
        contact: String,
        /// Kind of contact (phone, email, wechat, ...)
        #[arg(long, value_name = "TYPE")]
        contact_type: Option<String>,
        /// Appointment time (RFC 3339, or `YYYY-MM-DD HH:MM` in vault time)
        #[arg(long, value_name = "TIME")]
        at: String,
        /// Landing page slug the booking came from
        #[arg(long, value_name = "SLUG")]
        source: Option<String>,
        /// Booking details (read from stdin when omitted)
        content: Vec<String>,
    },
    /// Record a consultation message
    Consult {
        /// Optional contact for a reply
        #[arg(long)]
        contact: Option<String>,
        /// Landing page slug the message came from
        #[arg(long, value_name = "SLUG")]
        source: Option<String>,
        /// Message text (read from stdin when omitted)
        message: Vec<String>,
    },
    /// List recent bookings and consultations
    List {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one record
    Show {
        /// Booking ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a booking's status
    Status {
        /// Booking ID
        id: String,
        /// New status (pending, confirmed, completed, cancelled)
        status: String,
    },
    /// Delete a booking (its vault file is kept)
    Delete {
        /// Booking ID
        id: String,
    },
    /// Mirror every record past the sync cursor into the vault
    Sync {
        /// Report what would be written without touching vault or cursor
        #[arg(long)]
        dry_run: bool,
        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
