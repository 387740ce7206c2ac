use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use picksheet::local::LocalState;

mod cli_exec;

#[derive(Parser)]
#[command(name = "picksheet")]
#[command(about = "Allowance selection portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a client state directory (.picksheet)
    Init {
        /// Re-initialize if .picksheet already exists
        #[arg(long)]
        force: bool,
        /// Path to initialize (defaults to current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Configure the remote and store a bearer token
    Login {
        #[arg(long)]
        url: String,
        #[arg(long)]
        token: String,
    },

    /// Show the authenticated identity
    Whoami {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit the local selection draft
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Persist the draft to the remote
    Save,

    /// Persist the draft and send the submit notification
    Submit,

    /// List every selection header (admin)
    List {
        /// Recount category summaries from live category docs
        #[arg(long)]
        exact: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one owner's selection
    Show {
        owner: String,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// Set an owner's workflow status
    Status { owner: String, value: String },

    /// Delete one item from a stored category document
    DeleteItem {
        owner: String,
        category_id: String,
        #[arg(long)]
        item: usize,
    },

    /// Delete an owner's documents and stored images
    DeleteOwner { owner: String },

    /// Export a stored selection
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Show the current draft
    Show {
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the draft's display name and contact email
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Set one field of one item
    Set {
        category: String,
        #[arg(long)]
        item: usize,
        /// One of: type, link, notes
        #[arg(long)]
        field: String,
        value: String,
    },
    /// Append an empty item to a category
    AddItem { category: String },
    /// Remove an item, shifting later items down
    RemoveItem {
        category: String,
        #[arg(long)]
        item: usize,
    },
    /// Upload a file and attach its durable URL to an item
    Attach {
        category: String,
        #[arg(long)]
        item: usize,
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Spreadsheet rows, one per item
    Csv {
        owner: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print-ready HTML document
    Print {
        owner: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force, path } => {
            let root = path.unwrap_or(std::env::current_dir().context("get current dir")?);
            LocalState::init(&root, force)?;
            println!("Initialized picksheet client state at {}", root.display());
        }
        Commands::Login { url, token } => {
            let state = open_state()?;
            cli_exec::handle_login(&state, &url, &token)?;
        }
        Commands::Whoami { json } => {
            let state = open_state()?;
            cli_exec::handle_whoami(&state, json)?;
        }
        Commands::Draft { command } => {
            let state = open_state()?;
            cli_exec::handle_draft(&state, command)?;
        }
        Commands::Save => {
            let state = open_state()?;
            cli_exec::handle_save(&state, false)?;
        }
        Commands::Submit => {
            let state = open_state()?;
            cli_exec::handle_save(&state, true)?;
        }
        Commands::List { exact, json } => {
            let state = open_state()?;
            cli_exec::handle_list(&state, exact, json)?;
        }
        Commands::Show { owner, json } => {
            let state = open_state()?;
            cli_exec::handle_show(&state, &owner, json)?;
        }
        Commands::Status { owner, value } => {
            let state = open_state()?;
            cli_exec::handle_status(&state, &owner, &value)?;
        }
        Commands::DeleteItem {
            owner,
            category_id,
            item,
        } => {
            let state = open_state()?;
            cli_exec::handle_delete_item(&state, &owner, &category_id, item)?;
        }
        Commands::DeleteOwner { owner } => {
            let state = open_state()?;
            cli_exec::handle_delete_owner(&state, &owner)?;
        }
        Commands::Export { command } => {
            let state = open_state()?;
            cli_exec::handle_export(&state, command)?;
        }
    }

    Ok(())
}

fn open_state() -> Result<LocalState> {
    LocalState::open(&std::env::current_dir().context("get current dir")?)
}
