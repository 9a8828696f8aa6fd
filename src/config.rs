//! Configuration management for TelePulse.
//!
//! Settings are resolved once at process start from an optional
//! `telepulse.toml` file plus environment overrides, then passed by
//! reference into every component. No component reads ambient
//! environment state on its own, and the database URL has exactly one
//! resolution path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "telepulse.toml";

/// Default SQLite database file name under the data directory.
const DATABASE_FILE_NAME: &str = "telepulse.db";

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root data directory (JSON batches, images, processed outputs).
    pub data_dir: PathBuf,
    /// Database URL (SQLite path, optionally `sqlite:` prefixed).
    pub database_url: String,
    /// Pipeline stage commands.
    pub pipeline: PipelineSettings,
    /// External object-detector command (program + fixed args).
    pub detector_command: Vec<String>,
    /// HTTP server bind settings.
    pub server: ServerSettings,
}

/// Commands backing each pipeline stage.
///
/// Every stage is an external process; `load` and `enrich` default to
/// re-invoking the current executable's own subcommands so the pipeline
/// can run out of the box.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub scrape_command: Vec<String>,
    pub load_command: Vec<String>,
    pub enrich_command: Vec<String>,
    pub transform_command: Vec<String>,
}

/// HTTP server bind settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// On-disk configuration file shape. Every field is optional; missing
/// values fall back to built-in defaults or environment overrides.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    database_url: Option<String>,
    detector_command: Option<Vec<String>>,
    #[serde(default)]
    pipeline: FilePipelineConfig,
    #[serde(default)]
    server: FileServerConfig,
}

#[derive(Debug, Default, Deserialize)]
struct FilePipelineConfig {
    scrape: Option<Vec<String>>,
    load: Option<Vec<String>>,
    enrich: Option<Vec<String>>,
    transform: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct FileServerConfig {
    host: Option<String>,
    port: Option<u16>,
}

impl Settings {
    /// Load settings from the config file (if present) and environment.
    ///
    /// Precedence, highest first: CLI overrides passed in here,
    /// environment variables, config file, built-in defaults.
    pub fn load(
        data_dir_override: Option<PathBuf>,
        config_path_override: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let config_path = config_path_override.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let file = if config_path.exists() {
            let raw = fs::read_to_string(&config_path)?;
            toml::from_str::<FileConfig>(&raw)?
        } else {
            FileConfig::default()
        };

        // TELEPULSE_DATA_DIR arrives through the CLI layer (clap env
        // support), so the override already reflects it.
        let data_dir = data_dir_override
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from("data"));

        // Single resolution path for the database URL. The original
        // system assembled connection strings in two places with
        // diverging defaults; the env-driven default set won.
        let database_url = std::env::var("TELEPULSE_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()
            .or(file.database_url)
            .unwrap_or_else(|| data_dir.join(DATABASE_FILE_NAME).display().to_string());

        let self_exe = current_exe_string();
        let self_command = |subcommand: &str| {
            vec![
                self_exe.clone(),
                "--data-dir".to_string(),
                data_dir.display().to_string(),
                subcommand.to_string(),
            ]
        };

        let pipeline = PipelineSettings {
            scrape_command: file
                .pipeline
                .scrape
                .unwrap_or_else(|| vec_of(&["python3", "scripts/scrape_telegram.py"])),
            load_command: file.pipeline.load.unwrap_or_else(|| self_command("load")),
            enrich_command: file
                .pipeline
                .enrich
                .unwrap_or_else(|| self_command("enrich")),
            transform_command: file
                .pipeline
                .transform
                .unwrap_or_else(|| vec_of(&["dbt", "build", "--project-dir", "dbt"])),
        };

        let server = ServerSettings {
            host: file.server.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: file.server.port.unwrap_or(8000),
        };

        Ok(Settings {
            data_dir,
            database_url,
            pipeline,
            detector_command: file
                .detector_command
                .unwrap_or_else(|| vec_of(&["yolo-json"])),
            server,
        })
    }

    /// Directory holding per-day, per-channel JSON message batches.
    pub fn messages_dir(&self) -> PathBuf {
        self.data_dir.join("raw").join("telegram_messages")
    }

    /// Directory holding downloaded images, one subdirectory per channel.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("raw").join("images")
    }

    /// Directory for processed outputs (detection CSV).
    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed")
    }

    /// Path of the per-run detection results CSV.
    pub fn results_csv_path(&self) -> PathBuf {
        self.processed_dir().join("yolo_results.csv")
    }

    /// Create the on-disk layout the pipeline stages expect.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        fs::create_dir_all(self.messages_dir())?;
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.processed_dir())?;
        if let Some(parent) = Path::new(
            self.database_url
                .strip_prefix("sqlite:")
                .unwrap_or(&self.database_url),
        )
        .parent()
        {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn vec_of(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn current_exe_string() -> String {
    std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "telepulse".to_string())
}
