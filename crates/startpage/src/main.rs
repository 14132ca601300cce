//! StartPage command-line front-end.
//!
//! Manages the start page configuration (bookmark categories, their URLs, and
//! the design settings) stored in the local data directory, and moves it in and
//! out of `export.json` files.
//!
//! # Usage
//!
//! ```text
//! startpage [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show                                   Print all categories and URLs
//!   add-category [NAME]                    Add a category (prompts if NAME is omitted)
//!   delete-category <ID> [--yes]           Delete a category and its URLs
//!   add-url <CATEGORY_ID> [--name --url]   Add a URL (prompts if omitted)
//!   remove-url <CATEGORY_ID> <URL_ID> [--yes]
//!   design [--background-image] [--color] [--opacity]
//!   export [--out PATH]                    Write export.json
//!   import [FILE]                          Replace everything with FILE
//!
//! Options:
//!   --settings <PATH>  Settings file [env: STARTPAGE_SETTINGS]
//!   --data-dir <DIR>   Storage directory [env: STARTPAGE_DATA_DIR]
//!   --origin <NAME>    Storage namespace [env: STARTPAGE_ORIGIN]
//! ```
//!
//! Log output goes to stderr.  `RUST_LOG` overrides the settings file's
//! `log_level`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use startpage::application::transfer::EXPORT_FILE_NAME;
use startpage::application::workflow::{FileReader, Flow};
use startpage::infrastructure::file_io::{write_export, TokioFileReader};
use startpage::infrastructure::prompt::TerminalPrompter;
use startpage::infrastructure::storage::settings::{load_settings, AppSettings};
use startpage::infrastructure::ui_bridge::{self as bridge, AppState, CommandResult};
use startpage_core::{Category, Configuration, DesignPatch, Resolution, UrlEntry};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Personal start page: bookmark categories with local persistence.
#[derive(Debug, Parser)]
#[command(name = "startpage", version)]
struct Cli {
    /// Settings file to read instead of the platform default.
    #[arg(long, env = "STARTPAGE_SETTINGS")]
    settings: Option<PathBuf>,

    /// Directory holding the stored configuration.
    #[arg(long, env = "STARTPAGE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage namespace; each origin keeps its own configuration.
    #[arg(long, env = "STARTPAGE_ORIGIN")]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Print all categories, their URLs, and the design settings.
    Show,

    /// Add a category.
    AddCategory {
        /// Name of the category; asked for when omitted.
        name: Option<String>,
    },

    /// Delete a category together with its URLs.
    DeleteCategory {
        id: u32,
        /// Skip the confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Add a URL to a category.
    AddUrl {
        category_id: u32,
        #[arg(long, requires = "url")]
        name: Option<String>,
        #[arg(long, requires = "name")]
        url: Option<String>,
    },

    /// Remove one URL from a category.
    RemoveUrl {
        category_id: u32,
        url_id: u32,
        /// Skip the confirmation.
        #[arg(long)]
        yes: bool,
    },

    /// Change the design settings; omitted options are left as they are.
    Design {
        #[arg(long)]
        background_image: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        opacity: Option<f64>,
    },

    /// Write the configuration to a JSON file.
    Export {
        /// Target file, or a directory to write `export.json` into.
        #[arg(long, default_value = EXPORT_FILE_NAME)]
        out: PathBuf,
    },

    /// Replace the configuration with the contents of a JSON file.
    Import {
        /// File to import; asked for when omitted.
        file: Option<PathBuf>,
    },
}

impl Cli {
    /// Applies the storage overrides to `settings` and returns the command.
    fn into_parts(self, mut settings: AppSettings) -> (AppSettings, Command) {
        if let Some(dir) = self.data_dir {
            settings.storage.data_dir = Some(dir);
        }
        if let Some(origin) = self.origin {
            settings.storage.origin = origin;
        }
        (settings, self.command)
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Turns a failed command into an error and renders a successful one.
fn finish<T: Serialize>(result: CommandResult<T>, render: impl FnOnce(T)) -> anyhow::Result<()> {
    match result.data {
        Some(data) if result.success => {
            render(data);
            Ok(())
        }
        _ => Err(anyhow!(result
            .error
            .unwrap_or_else(|| "command failed".to_string()))),
    }
}

fn finish_flow<T: Serialize>(
    result: CommandResult<Flow<T>>,
    render: impl FnOnce(T),
) -> anyhow::Result<()> {
    finish(result, |flow| match flow {
        Flow::Completed(data) => render(data),
        Flow::Cancelled => println!("Cancelled."),
    })
}

fn print_config(config: &Configuration) {
    if config.categories.is_empty() {
        println!("No categories yet.");
    }
    for category in &config.categories {
        println!("[{}] {}", category.id, category.name);
        for entry in &category.urls {
            println!("    [{}] {} <{}>", entry.id, entry.name, entry.url);
        }
    }
    let design = &config.design;
    println!(
        "design: color {} opacity {}{}",
        design.color,
        design.opacity,
        if design.background_image.is_empty() {
            ""
        } else {
            ", background image set"
        }
    );
}

fn print_category(verb: &str, category: Category) {
    println!("{verb} category [{}] {}", category.id, category.name);
}

fn print_url(verb: &str, outcome: Resolution<UrlEntry>) {
    match outcome {
        Resolution::Applied(entry) => {
            println!("{verb} URL [{}] {} <{}>", entry.id, entry.name, entry.url)
        }
        Resolution::Unresolved => println!("No such category or URL; nothing changed."),
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

async fn run(command: Command, state: Arc<AppState>) -> anyhow::Result<()> {
    let prompter = TerminalPrompter::stdio();

    match command {
        Command::Show => finish(bridge::get_config(state).await, |c| print_config(&c)),

        Command::AddCategory { name: Some(name) } => finish(
            bridge::add_category(state, name).await,
            |c| print_category("Added", c),
        ),
        Command::AddCategory { name: None } => finish_flow(
            bridge::prompt_add_category(state, &prompter).await,
            |c| print_category("Added", c),
        ),

        Command::DeleteCategory { id, yes: true } => finish(
            bridge::delete_category(state, id).await,
            |c| print_category("Deleted", c),
        ),
        Command::DeleteCategory { id, yes: false } => finish_flow(
            bridge::prompt_delete_category(state, &prompter, id).await,
            |c| print_category("Deleted", c),
        ),

        Command::AddUrl {
            category_id,
            name: Some(name),
            url: Some(url),
        } => finish(
            bridge::add_url(state, category_id, name, url).await,
            |r| print_url("Added", r),
        ),
        Command::AddUrl { category_id, .. } => finish_flow(
            bridge::prompt_add_url(state, &prompter, category_id).await,
            |r| print_url("Added", r),
        ),

        Command::RemoveUrl {
            category_id,
            url_id,
            yes: true,
        } => finish(
            bridge::remove_url(state, category_id, url_id).await,
            |r| print_url("Removed", r),
        ),
        Command::RemoveUrl {
            category_id,
            url_id,
            yes: false,
        } => finish_flow(
            bridge::prompt_remove_url(state, &prompter, category_id, url_id).await,
            |r| print_url("Removed", r),
        ),

        Command::Design {
            background_image,
            color,
            opacity,
        } => {
            let patch = DesignPatch {
                background_image,
                color,
                opacity,
            };
            finish(bridge::set_design(state, patch).await, |d| {
                println!("design: color {} opacity {}", d.color, d.opacity)
            })
        }

        Command::Export { out } => {
            let result = bridge::export_config(state).await;
            let blob = match (result.success, result.data) {
                (true, Some(blob)) => blob,
                _ => return Err(anyhow!(result.error.unwrap_or_default())),
            };
            let path = write_export(&blob, &out)
                .await
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Exported to {}", path.display());
            Ok(())
        }

        Command::Import { file: Some(file) } => {
            let contents = TokioFileReader
                .read_text(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            finish(bridge::import_config(state, contents).await, |s| {
                println!("Imported {} categories with {} URLs", s.categories, s.urls)
            })
        }
        Command::Import { file: None } => finish_flow(
            bridge::prompt_import(state, &prompter, &TokioFileReader).await,
            |s| println!("Imported {} categories with {} URLs", s.categories, s.urls),
        ),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.settings.as_deref()).context("failed to load settings")?;
    let (settings, command) = cli.into_parts(settings);

    // RUST_LOG wins over the settings file.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    debug!(origin = %settings.storage.origin, "opening storage");
    let state = AppState::from_settings(&settings).context("failed to open storage")?;
    if let Some(notice) = state.notice() {
        eprintln!("warning: {notice}; starting with an empty configuration");
    }

    run(command, state).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_show_without_options() {
        // Arrange / Act
        let cli = Cli::parse_from(["startpage", "show"]);

        // Assert
        assert_eq!(cli.command, Command::Show);
        assert_eq!(cli.settings, None);
    }

    #[test]
    fn test_cli_add_category_name_is_optional() {
        let cli = Cli::parse_from(["startpage", "add-category"]);
        assert_eq!(cli.command, Command::AddCategory { name: None });

        let cli = Cli::parse_from(["startpage", "add-category", "Work"]);
        assert_eq!(
            cli.command,
            Command::AddCategory {
                name: Some("Work".to_string())
            }
        );
    }

    #[test]
    fn test_cli_delete_category_yes_flag() {
        let cli = Cli::parse_from(["startpage", "delete-category", "3", "--yes"]);
        assert_eq!(cli.command, Command::DeleteCategory { id: 3, yes: true });
    }

    #[test]
    fn test_cli_add_url_name_requires_url() {
        let result = Cli::try_parse_from(["startpage", "add-url", "1", "--name", "Docs"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_add_url_with_both_fields() {
        let cli = Cli::parse_from([
            "startpage",
            "add-url",
            "1",
            "--name",
            "Docs",
            "--url",
            "https://example.com",
        ]);
        assert_eq!(
            cli.command,
            Command::AddUrl {
                category_id: 1,
                name: Some("Docs".to_string()),
                url: Some("https://example.com".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_export_defaults_to_export_json() {
        let cli = Cli::parse_from(["startpage", "export"]);
        assert_eq!(
            cli.command,
            Command::Export {
                out: PathBuf::from("export.json")
            }
        );
    }

    #[test]
    fn test_cli_design_opacity_must_be_a_number() {
        let result = Cli::try_parse_from(["startpage", "design", "--opacity", "half"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_parts_applies_storage_overrides() {
        // Arrange
        let cli = Cli::parse_from([
            "startpage",
            "--data-dir",
            "/tmp/startpage",
            "--origin",
            "work",
            "show",
        ]);

        // Act
        let (settings, command) = cli.into_parts(AppSettings::default());

        // Assert
        assert_eq!(settings.storage.data_dir, Some(PathBuf::from("/tmp/startpage")));
        assert_eq!(settings.storage.origin, "work");
        assert_eq!(command, Command::Show);
    }

    #[test]
    fn test_into_parts_without_overrides_keeps_settings() {
        let mut base = AppSettings::default();
        base.storage.origin = "home".to_string();
        let cli = Cli::parse_from(["startpage", "show"]);

        let (settings, _) = cli.into_parts(base.clone());

        assert_eq!(settings, base);
    }

    #[test]
    fn test_finish_reports_command_error() {
        let result: CommandResult<u32> = CommandResult::err("please add a category first");

        let err = finish(result, |_| {}).unwrap_err();

        assert_eq!(err.to_string(), "please add a category first");
    }
}
