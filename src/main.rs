//! Labeller CLI - web UI and terminal commands for manual data labelling

use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Mutex;
use labeller::config::{self, ItemType, Settings, WorkDir};
use labeller::storage::RecordStore;
use labeller::Error;
use labeller::ui::{self, Icons};
use labeller::{export, input, server};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "labeller")]
#[command(version)]
#[command(about = "Web UI for manually labelling images, text and other items")]
#[command(long_about = r#"
Labeller shows one unlabelled item (a URL or a local file path) at a time,
records the chosen label(s) and tracks overall progress.

A work directory holds the database (db.sqlite), the settings
(settings.json or settings.toml) and the log file (logs.log).

Example usage:
  labeller init -w ./work --type image --task "What animal is this?" -l cat -l dog
  labeller serve -w ./work -i paths.txt
  labeller status -w ./work
  labeller export -w ./work -o labels.csv
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a settings file into a work directory
    Init {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Item type (image, text, video, audio, webpage)
        #[arg(short = 't', long = "type")]
        item_type: String,

        /// Question shown to the annotator
        #[arg(long)]
        task: String,

        /// Label choice offered to the annotator (repeatable; free text when omitted)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Overwrite existing settings
        #[arg(short, long)]
        force: bool,
    },

    /// Start the labelling web UI
    Serve {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Input file with one URL or path per line, imported before serving
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Bind port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: IpAddr,
    },

    /// Import URLs or paths without starting the server
    Import {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Input file with one URL or path per line
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show labelling progress
    Status {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print a random unlabelled item
    Next {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,
    },

    /// Show one record
    Show {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// URL or path of the item
        identifier: String,
    },

    /// Label an item from the terminal
    Label {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// URL or path of the item
        identifier: String,

        /// One or more labels
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Export labelled items as tab-separated lines, newest first
    Export {
        /// Work directory
        #[arg(short, long)]
        work_dir: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    fn work_dir(&self) -> &PathBuf {
        match self {
            Commands::Init { work_dir, .. }
            | Commands::Serve { work_dir, .. }
            | Commands::Import { work_dir, .. }
            | Commands::Status { work_dir, .. }
            | Commands::Next { work_dir }
            | Commands::Show { work_dir, .. }
            | Commands::Label { work_dir, .. }
            | Commands::Export { work_dir, .. } => work_dir,
        }
    }
}

/// Log to stderr and append to `<work_dir>/logs.log`; the directory must exist
fn init_logging(work: &WorkDir, verbose: bool) -> anyhow::Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(work.logs_path())?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(log_file)))
        .with(filter)
        .init();
    Ok(())
}

fn import_file(store: &RecordStore, path: &std::path::Path) -> anyhow::Result<()> {
    let identifiers = input::read_identifiers(path)?;
    let report = store.import_batch(&identifiers)?;
    tracing::info!(
        "Inserted {} new records from {} ({} already present)",
        report.inserted,
        path.display(),
        report.skipped()
    );
    ui::success(&format!(
        "{} Imported {} new records from {} ({} already present)",
        Icons::INBOX,
        report.inserted,
        path.display(),
        report.skipped()
    ));
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        ui::error(&format!("{e:#}"));
        let code = match e.downcast_ref::<Error>() {
            Some(Error::WorkDirMissing(_) | Error::ConfigurationMissing(_)) => 2,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let work = WorkDir::new(cli.command.work_dir());
    // Only `init` may create a work directory
    match cli.command {
        Commands::Init { .. } => work.ensure_exists()?,
        _ => work.require_initialised()?,
    }
    init_logging(&work, cli.verbose)?;
    tracing::info!("Work dir {}", work.root().display());

    match cli.command {
        Commands::Init { item_type, task, labels, force, .. } => {
            let settings = Settings {
                item_type: item_type.parse::<ItemType>()?,
                task,
                labels,
            };
            let path = work.root().join(config::SETTINGS_TOML_FILE);
            config::write_settings(&path, &settings, force)?;
            ui::success(&format!("Settings written to {}", path.display()));

            let json_path = work.root().join(config::SETTINGS_JSON_FILE);
            if json_path.exists() {
                ui::warn(&format!("{} exists and takes precedence", json_path.display()));
            }
        }

        Commands::Serve { input, port, host, .. } => {
            let settings = work.load_settings()?;
            tracing::debug!("Serving {} items for task {:?}", settings.item_type.as_str(), settings.task);

            let store = work.open_store()?;
            match input {
                Some(path) => import_file(&store, &path)?,
                None => tracing::info!("No new inputs are supplied"),
            }

            let status = store.status()?;
            ui::header(Icons::ROCKET, "Labeller");
            ui::info("Work dir", &work.root().display().to_string());
            ui::info("Database", &work.database_path().display().to_string());
            ui::info("Progress", &ui::progress_bar(&status));

            let addr = SocketAddr::new(host, port);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(addr, store, settings))?;
        }

        Commands::Import { input, .. } => {
            let store = work.open_store()?;
            import_file(&store, &input)?;
            store.close()?;
        }

        Commands::Status { format, .. } => {
            let store = work.open_store()?;
            let status = store.status()?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                ui::header(Icons::STATS, &format!("Labelling Status ({})", work.root().display()));
                println!("{}", ui::status_table(&status));
                println!("{}", ui::progress_bar(&status));
            }
        }

        Commands::Next { .. } => {
            let store = work.open_store()?;
            match store.next_unlabelled()? {
                Some(rec) => println!("{}", rec.identifier),
                None => ui::warn("No Unlabelled Record Found."),
            }
        }

        Commands::Show { identifier, .. } => {
            let store = work.open_store()?;
            let rec = store.get(&identifier)?;

            ui::section(&rec.identifier);
            ui::summary_row("State:", rec.state().as_str());
            ui::summary_row("Label:", rec.label.as_deref().unwrap_or("-"));
            ui::summary_row("Last modified:", &rec.last_modified_string());
        }

        Commands::Label { identifier, labels, .. } => {
            let store = work.open_store()?;
            let count = store.update_label(&identifier, &labels)?;
            if count == 0 {
                anyhow::bail!("Failed... No records updated for {}", identifier);
            }
            let stored = store.get(&identifier)?;
            ui::success(&format!("{} {} → {}", Icons::TAG, identifier, stored.label.as_deref().unwrap_or("-")));
            store.close()?;
        }

        Commands::Export { output, .. } => {
            let store = work.open_store()?;
            let lines = match output {
                Some(path) => {
                    let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
                    let lines = export::write_csv(&store, &mut file)?;
                    ui::success(&format!("{} Exported {} records to {}", Icons::OUTBOX, lines, path.display()));
                    lines
                }
                None => export::write_csv(&store, &mut std::io::stdout().lock())?,
            };
            tracing::info!("Exported {} labelled records", lines);
        }
    }

    Ok(())
}
