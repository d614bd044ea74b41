use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kissa_core::acquisition::{PanelMessage, PanelView};
use kissa_core::catalog::ScanUpload;
use kissa_core::config::{Config, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use kissa_core::{Album, AlbumId, Kissa, KissaError};
use tracing::{error, info};

/// kissa: your vinyl shelf from the terminal.
#[derive(Parser)]
#[command(name = "kissa")]
struct Args {
    /// Base URL of the Kissa backend. Overrides the config file.
    #[arg(long, global = true, env = "KISSA_API_URL")]
    api_url: Option<String>,

    /// Per-request timeout in seconds. Overrides the config file.
    #[arg(long, global = true, env = "KISSA_REQUEST_TIMEOUT_SECS")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the library, optionally filtered
    List {
        /// Text matched against title or artist
        #[arg(long, default_value = "")]
        filter: String,
        /// Only albums carrying this genre
        #[arg(long)]
        genre: Option<String>,
    },
    /// Show every genre in the library
    Genres,
    /// Search the catalog and add one of the candidates
    Search {
        #[arg(required = true)]
        query: Vec<String>,
        /// Add candidate N (1-based) without asking
        #[arg(long)]
        pick: Option<usize>,
    },
    /// Add a release by its catalog id
    Add { catalog_id: u64 },
    /// Delete an album from the library
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Recognise a cover photo and add the album
    Scan { path: PathBuf },
    /// Print the preview player URL for an album
    Play { id: String },
    /// Write ~/.kissa/config.yaml
    Init,
}

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn exit_with(err: KissaError) -> ! {
    error!("{}", err);
    eprintln!("{}", err.user_message());
    std::process::exit(1);
}

fn load_config(api_url: Option<String>, timeout: Option<u64>) -> Config {
    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    });
    if let Some(url) = api_url {
        config.api_base_url = url;
    }
    if let Some(timeout) = timeout {
        config.request_timeout_secs = timeout;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }
    config
}

fn prompt(question: &str) -> String {
    print!("{question}");
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return String::new();
    }
    answer.trim().to_string()
}

fn print_album(album: &Album) {
    let mut line = format!("{:>6}  {} - {}", album.id, album.artist, album.title);
    if !album.year.is_empty() {
        line.push_str(&format!(" ({})", album.year));
    }
    if !album.genres.is_empty() {
        line.push_str(&format!(" [{}]", album.genres.join(", ")));
    }
    if album.can_preview() {
        line.push_str(" ♪");
    }
    println!("{line}");
}

/// Counts what is listed, so a filtered listing shows the filtered count
fn listing_header(albums: &[Album]) -> String {
    format!("{} LP", albums.len())
}

fn print_panel(view: &PanelView) {
    if let Some(message) = &view.error_message {
        eprintln!("{message}");
    }
    match view.message {
        PanelMessage::Prompt => println!("Type an artist or an album title to search."),
        PanelMessage::NoResults => println!("No results for \"{}\".", view.query),
        PanelMessage::Results => {
            for (i, candidate) in view.results.iter().enumerate() {
                let mut details = vec![candidate.year.as_str(), candidate.label.as_str()];
                details.retain(|d| !d.is_empty());
                println!("{:>3}. {} ({})", i + 1, candidate.title, details.join(", "));
            }
        }
    }
}

async fn refresh(kissa: &Kissa) {
    if let Err(e) = kissa.library.refresh().await {
        exit_with(e);
    }
}

async fn search(kissa: &Kissa, query: Vec<String>, pick: Option<usize>) {
    let workflow = &kissa.acquisition;
    workflow.open();
    workflow.edit_query(query.join(" "));
    // The failure is rendered by the panel below.
    let _ = workflow.submit().await;

    let Some(view) = workflow.view() else {
        return;
    };
    print_panel(&view);
    if view.message != PanelMessage::Results || view.results.is_empty() {
        workflow.close();
        return;
    }

    let choice = match pick {
        Some(n) => n,
        None => {
            let answer = prompt("Add which one? (blank to cancel) ");
            if answer.is_empty() {
                workflow.close();
                return;
            }
            answer.parse().unwrap_or(0)
        }
    };
    let Some(candidate) = choice.checked_sub(1).and_then(|i| view.results.get(i)) else {
        eprintln!("No candidate {choice}.");
        workflow.close();
        std::process::exit(1);
    };

    if let Err(e) = workflow.select_candidate(candidate.catalog_id).await {
        exit_with(e);
    }
    println!("Added {}. {} LP in the library.", candidate.title, kissa.library.len());
}

fn init(api_url: Option<String>, timeout: Option<u64>) {
    let config = Config {
        api_base_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        request_timeout_secs: timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ..Config::default()
    };
    if let Err(e) = config.validate().and_then(|_| config.save_to_config_yaml()) {
        eprintln!("Could not write configuration: {e}");
        std::process::exit(1);
    }
    println!("Wrote {}", config.config_path.display());
}

#[tokio::main]
async fn main() {
    configure_logging();
    let Args {
        api_url,
        timeout,
        command,
    } = Args::parse();

    if let Command::Init = command {
        init(api_url, timeout);
        return;
    }

    let config = load_config(api_url, timeout);
    info!("Using backend {}", config.api_base_url);
    let kissa = Kissa::connect(&config).unwrap_or_else(|e| {
        eprintln!("Could not create HTTP client: {e}");
        std::process::exit(1);
    });

    match command {
        Command::List { filter, genre } => {
            refresh(&kissa).await;
            let albums = kissa.library.filtered_view(&filter, genre.as_deref());
            println!("{}", listing_header(&albums));
            for album in &albums {
                print_album(album);
            }
        }
        Command::Genres => {
            refresh(&kissa).await;
            for genre in kissa.library.genres() {
                println!("{genre}");
            }
        }
        Command::Search { query, pick } => search(&kissa, query, pick).await,
        Command::Add { catalog_id } => {
            if let Err(e) = kissa.acquisition.add_by_catalog_id(catalog_id).await {
                exit_with(e);
            }
            println!("Added. {} LP in the library.", kissa.library.len());
        }
        Command::Delete { id, yes } => {
            refresh(&kissa).await;
            let id = AlbumId::new(id);
            let name = match kissa.library.get(&id) {
                Some(album) => format!("{} - {}", album.artist, album.title),
                None => format!("album {id}"),
            };
            if !yes {
                let answer = prompt(&format!("Delete {name}? [y/N] "));
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Kept.");
                    return;
                }
            }
            if let Err(e) = kissa.delete(&id).await {
                exit_with(e);
            }
            println!("Deleted {name}.");
        }
        Command::Scan { path } => {
            let upload = ScanUpload::from_path(&path).unwrap_or_else(|e| {
                eprintln!("Could not read {}: {e}", path.display());
                std::process::exit(1);
            });
            if let Err(e) = kissa.acquisition.scan_photo(upload).await {
                exit_with(e);
            }
            println!("Added. {} LP in the library.", kissa.library.len());
        }
        Command::Play { id } => {
            refresh(&kissa).await;
            let id = AlbumId::new(id);
            if kissa.play(&id) {
                if let Some(url) = kissa.playback.embed_url() {
                    println!("{url}");
                }
            } else if kissa.library.get(&id).is_none() {
                eprintln!("No album {id} in the library.");
                std::process::exit(1);
            } else {
                println!("Nothing to preview for album {id}.");
            }
        }
        Command::Init => {}
    }
}
