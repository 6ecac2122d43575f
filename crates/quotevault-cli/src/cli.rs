use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quotevault_core::{QuoteCategory, ThemeMode};

#[derive(Parser)]
#[command(name = "quotevault")]
#[command(about = "Browse, collect, and share quotes from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// CLI profile name (backend config and stored session)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's quote (the default command)
    #[command(alias = "today")]
    Daily {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse the quote feed, newest first
    Feed {
        /// Number of pages to load
        #[arg(short, long, default_value = "1")]
        pages: usize,
        /// Only show these categories (repeatable)
        #[arg(short, long, value_enum)]
        category: Vec<CategoryArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one quote
    Show {
        /// Quote ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a quote formatted for sharing
    Share {
        /// Quote ID (today's quote when omitted)
        id: Option<String>,
    },
    /// Like or unlike a quote
    Like {
        /// Quote ID
        id: String,
    },
    /// List liked quotes
    Likes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage quote collections
    Collections {
        #[command(subcommand)]
        command: CollectionCommands,
    },
    /// Render a quote as a 1080x1920 PNG into the pictures folder
    Export {
        /// Quote ID (today's quote when omitted)
        id: Option<String>,
        /// Backdrop object name from the storage bucket
        #[arg(long, value_name = "NAME", conflicts_with = "background")]
        backdrop: Option<String>,
        /// Background image path or http(s) URL
        #[arg(long, value_name = "PATH|URL")]
        background: Option<String>,
        /// Pictures directory (defaults to the platform pictures folder)
        #[arg(short, long, value_name = "PATH")]
        output_dir: Option<PathBuf>,
        /// Print the computed text layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// List backdrop images available for export
    Backdrops {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change the color theme
    Theme {
        /// New theme (prints the current one when omitted)
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
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
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign in, sign up, or manage the stored session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CategoryArg {
    Motivation,
    Love,
    Success,
    Wisdom,
    Humor,
}

impl From<CategoryArg> for QuoteCategory {
    fn from(value: CategoryArg) -> Self {
        match value {
            CategoryArg::Motivation => Self::Motivation,
            CategoryArg::Love => Self::Love,
            CategoryArg::Success => Self::Success,
            CategoryArg::Wisdom => Self::Wisdom,
            CategoryArg::Humor => Self::Humor,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

impl ThemeArg {
    pub const fn apply(self, current: ThemeMode) -> ThemeMode {
        match self {
            Self::Light => ThemeMode::Light,
            Self::Dark => ThemeMode::Dark,
            Self::Toggle => current.toggled(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum CollectionCommands {
    /// List collections with item counts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a collection
    Create {
        /// Collection name
        name: Vec<String>,
    },
    /// Show the quotes in a collection
    Show {
        /// Collection ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a quote to a collection
    Add {
        /// Collection ID
        collection: String,
        /// Quote ID
        quote: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Storage bucket holding export backdrops
        #[arg(long, value_name = "BUCKET")]
        backdrop_bucket: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile config
    Show,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account
    Signup {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password (at least 6 characters)
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Email a password-reset link
    ResetPassword {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
    },
    /// Show auth status for the profile
    Status,
    /// Sign out and clear the stored session
    Logout,
}
