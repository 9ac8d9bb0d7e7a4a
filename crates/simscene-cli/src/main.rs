//! Scene archive exporter/importer

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simscene_core::config::ConfigManager;
use simscene_core::editor::{EditorDocument, Selection};
use simscene_core::{SceneError, export_scene, import_scene};

#[derive(Parser)]
#[command(name = "simscene")]
#[command(about = "Move scenes between an editor document and a physics scene archive")]
#[command(version)]
struct Cli {
    /// Bridge configuration file (RON)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export editor objects into a scene archive
    Export {
        /// Archive directory to write
        archive: PathBuf,
        /// Editor document (RON)
        #[arg(short = 'p', long = "project")]
        project: PathBuf,
        /// Root objects to export (default: everything)
        #[arg(short = 's', long = "select")]
        select: Vec<String>,
    },

    /// Import a scene archive into an editor document
    Import {
        /// Archive directory or .scene file to read
        archive: PathBuf,
        /// Editor document (RON), created when missing
        #[arg(short = 'p', long = "project")]
        project: PathBuf,
    },
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simscene=info,simscene_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => ConfigManager::load(path).map_err(|e| e.to_string())?,
        None => ConfigManager::default(),
    };
    let config = config.into_config();

    match cli.command {
        Commands::Export {
            archive,
            project,
            select,
        } => {
            let mut document = EditorDocument::load(&project).map_err(fatal)?;
            let selection = if select.is_empty() {
                Selection::All
            } else {
                Selection::Roots(select)
            };

            let report = export_scene(&mut document, &selection, &archive, &config).map_err(fatal)?;
            // Allocated ids and groups were written back to the document
            document.save(&project).map_err(fatal)?;

            tracing::info!(
                "Wrote {:?} and {} mesh files, {} diagnostics",
                report.scene_file,
                report.mesh_files.len(),
                report.diagnostics.len()
            );
        }
        Commands::Import { archive, project } => {
            let mut document = open_or_create(&project)?;
            let report = import_scene(&mut document, &archive, &config).map_err(fatal)?;
            document.save(&project).map_err(fatal)?;

            tracing::info!(
                "Imported scene version {} into {:?}, {} diagnostics",
                report.version,
                project,
                report.diagnostics.len()
            );
        }
    }
    Ok(())
}

fn open_or_create(project: &Path) -> Result<EditorDocument, String> {
    if project.exists() {
        EditorDocument::load(project).map_err(fatal)
    } else {
        tracing::info!("Creating new document {:?}", project);
        Ok(EditorDocument::new())
    }
}

fn fatal(err: SceneError) -> String {
    format!("{} ({:?})", err, err.kind())
}
