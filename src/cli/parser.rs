use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for rTimeclock
/// CLI time clock: clock in/out, breaks and daily attendance with SQLite
#[derive(Parser)]
#[command(
    name = "rtimeclock",
    version = env!("CARGO_PKG_VERSION"),
    about = "A time-clock CLI: clock in and out, track breaks and reconcile daily attendance using SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Act as this user instead of the configured `user_id`
    #[arg(global = true, long = "user")]
    pub user: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view, check or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "check",
            help = "Validate the configuration and add missing fields with their defaults"
        )]
        check: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Clock in: start today's work session
    In {
        /// Work location (office, home, client-site, co-working, other)
        #[arg(long = "loc")]
        loc: Option<String>,
    },

    /// Clock out: complete today's session and reconcile attendance
    Out,

    /// Start or end a break
    Break {
        #[command(subcommand)]
        action: BreakAction,
    },

    /// Show the current timer status and elapsed work time
    Status,

    /// Live timer, refreshed every second (commands: b [reason], e, o, q)
    Watch,

    /// List daily attendance records
    List {
        /// Period: YYYY, YYYY-MM, YYYY-MM-DD or a range A:B (default: current month)
        #[arg(long = "period")]
        period: Option<String>,

        /// Show every user, not only the current one
        #[arg(long = "all-users")]
        all_users: bool,

        /// Only days with this status: present, late, absent, half-day
        #[arg(long = "status")]
        status: Option<String>,
    },

    /// Hours this week and this month, attendance rate
    Stats,

    /// Export attendance records
    Export {
        #[arg(long = "format", value_enum)]
        format: ExportFormat,

        /// Absolute path of the output file
        #[arg(long = "file")]
        file: String,

        /// Period to export: all, YYYY, YYYY-MM, YYYY-MM-DD or a range A:B
        #[arg(long = "range")]
        range: Option<String>,

        /// Export every user, not only the current one
        #[arg(long = "all-users")]
        all_users: bool,

        /// Overwrite an existing file without asking
        #[arg(long = "force")]
        force: bool,
    },

    /// Recompute a day's attendance record from its completed session
    Reconcile {
        /// Day to reconcile (YYYY-MM-DD, default: today)
        #[arg(long = "date")]
        date: Option<String>,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "last", help = "Only the last N rows")]
        last: Option<usize>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },
}

#[derive(Subcommand)]
pub enum BreakAction {
    /// Start a break
    Start {
        /// lunch, coffee, personal, meeting, restroom, other
        #[arg(long = "reason")]
        reason: Option<String>,
    },
    /// End the running break
    End,
}
