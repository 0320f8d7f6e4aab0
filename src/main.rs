//! Folio CLI - Serve and administer a personal portfolio site

use clap::{Parser, Subcommand, ValueEnum};
use folio::admin::{self, AdminConsole};
use folio::backup::{self, Backup, ImportDocument};
use folio::config::{self, FolioConfig};
use folio::imaging::{self, ImageFile, OptimizeOptions, OptimizedImage, OutputFormat};
use folio::ui::{self, Icons};
use folio::App;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Personal portfolio site with an admin panel")]
#[command(long_about = r#"
Folio serves a portfolio (home, projects, services, about) whose content
lives in a hosted backend, falling back to a local store when none is
configured, plus an admin API for editing it.

Example usage:
  folio init
  folio serve --port 8080
  folio list projects
  folio export --out backup.json
  folio square photo.png avatar.jpg --size 400
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Projects,
    Services,
    About,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Serve the site and the admin API
    Serve {
        /// Port to listen on (overrides the config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fill empty collections with starter content
    Seed,

    /// Show stored records
    List {
        #[arg(value_enum)]
        collection: Collection,
    },

    /// Write every record to a backup file
    Export {
        /// Output path (defaults to portfolio-backup-<millis>.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Load records from a backup file
    Import {
        file: PathBuf,
    },

    /// Resize an image to fit within the given bounds
    Optimize {
        input: PathBuf,
        output: PathBuf,

        #[arg(long, default_value = "1920")]
        max_width: u32,

        #[arg(long, default_value = "1080")]
        max_height: u32,

        /// Lossy quality between 0 and 1
        #[arg(short, long, default_value = "0.85")]
        quality: f32,

        /// Output format (jpeg, png, webp)
        #[arg(short, long, default_value = "jpeg")]
        format: OutputFormat,
    },

    /// Center-crop an image to a square profile photo
    Square {
        input: PathBuf,
        output: PathBuf,

        #[arg(short, long, default_value_t = imaging::DEFAULT_SQUARE_SIZE)]
        size: u32,
    },

    /// Set the local admin login
    Credentials {
        username: String,

        /// Read from a prompt when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(rust_log.as_deref(), cli.verbose))
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let load = || -> anyhow::Result<FolioConfig> {
        let loaded = config::load_config(Some(&config_path))?;
        if loaded.is_none() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
        }
        Ok(loaded.unwrap_or_default().with_env())
    };

    match cli.command {
        Commands::Init { force } => {
            config::write_config(&config_path, &FolioConfig::default(), force)?;
            ui::success(&format!("Wrote {}", config_path.display()));
            ui::note("Next", "set backend.url and backend.anon_key to use a hosted store");
        }

        Commands::Serve { port } => {
            let mut config = load()?;
            if let Some(port) = port {
                config.port = port;
            }
            let app = App::bootstrap(config)?;

            ui::banner("Folio");
            ui::backend(app.mode());
            ui::status(Icons::FILE, "Site", &app.config.site_dir);
            ui::status(Icons::PERSON, "Admin", &app.config.admin_email);

            folio::server::start_server(app).await?;
        }

        Commands::Seed => {
            let app = App::bootstrap(load()?)?;
            let spinner = ui::Spinner::new("Adding starter content...");
            let report = admin::seed_defaults(&app.data).await?;
            spinner.clear();

            if report.is_empty() {
                ui::success("Nothing to seed, every collection already has content");
            } else {
                ui::success("Starter content added");
                ui::summary_row("Projects:", &report.projects.to_string());
                ui::summary_row("Services:", &report.services.to_string());
                ui::summary_row("About sections:", &report.about_sections.to_string());
            }
        }

        Commands::List { collection } => {
            let app = App::bootstrap(load()?)?;
            match collection {
                Collection::Projects => {
                    let projects = app.data.list_projects().await?;
                    if projects.is_empty() {
                        println!("∅ No projects found.");
                    } else {
                        println!("{}", ui::projects_table(&projects));
                    }
                }
                Collection::Services => {
                    let services = app.data.list_services().await?;
                    if services.is_empty() {
                        println!("∅ No services found.");
                    } else {
                        println!("{}", ui::services_table(&services));
                    }
                }
                Collection::About => print_about(&app).await?,
            }
        }

        Commands::Export { out } => {
            let app = App::bootstrap(load()?)?;
            let backup = Backup::collect(&app.data).await?;
            let path = out.unwrap_or_else(|| PathBuf::from(backup::backup_filename()));
            tokio::fs::write(&path, backup.to_json_pretty()?).await?;

            ui::success(&format!("Exported to {}", path.display()));
            ui::summary_row("Projects:", &backup.projects.len().to_string());
            ui::summary_row("Services:", &backup.services.len().to_string());
        }

        Commands::Import { file } => {
            let app = App::bootstrap(load()?)?;
            let text = tokio::fs::read_to_string(&file).await?;
            let doc = ImportDocument::parse(&text)?;

            let spinner = ui::Spinner::new("Importing...");
            let report = backup::import(&app.data, doc).await?;
            spinner.clear();

            ui::success(&format!("Imported {}", file.display()));
            ui::added(&format!(
                "{} projects, {} services inserted",
                report.projects_inserted, report.services_inserted
            ));
            ui::changed(&format!(
                "{} projects, {} services updated",
                report.projects_updated, report.services_updated
            ));
            if report.about_replaced {
                ui::changed("about content replaced");
            }
        }

        Commands::Optimize { input, output, max_width, max_height, quality, format } => {
            let file = ImageFile::read(&input).await?;
            let options = OptimizeOptions {
                max_width,
                max_height,
                quality,
                output_format: format,
            };

            let started = Instant::now();
            let spinner = ui::Spinner::new(&format!("Optimizing {}...", input.display()));
            let optimized = imaging::optimize(&file, &options).await?;
            spinner.finish_with_summary("Optimized", started.elapsed());
            write_image(&file, optimized, &output).await?;
        }

        Commands::Square { input, output, size } => {
            let file = ImageFile::read(&input).await?;
            let validation = imaging::validate(Some(&file), imaging::DEFAULT_MAX_SIZE_MB);
            if let Some(reason) = validation.error {
                anyhow::bail!(reason);
            }

            let started = Instant::now();
            let spinner = ui::Spinner::new(&format!("Cropping {}...", input.display()));
            let squared = imaging::optimize_square(&file, size).await?;
            spinner.finish_with_summary("Cropped", started.elapsed());
            write_image(&file, squared, &output).await?;
        }

        Commands::Credentials { username, password } => {
            let password = match password {
                Some(password) => password,
                None => {
                    let term = console::Term::stderr();
                    term.write_str("Password: ")?;
                    term.read_secure_line()?
                }
            };

            let app = App::bootstrap(load()?)?;
            if app.mode().is_remote() {
                ui::warn("A hosted backend is configured; these credentials only apply in local mode");
            }

            let mut console = AdminConsole::new(app.data.clone());
            let outcome = console.save_credentials(&username, &password);
            for toast in console.notifier_mut().drain() {
                ui::toast(&toast);
            }
            for message in console.notifier().field_errors().values() {
                ui::error(message);
            }
            if !outcome.is_done() {
                anyhow::bail!("Credentials not saved");
            }
        }
    }

    Ok(())
}

/// A valid `RUST_LOG` wins; `--verbose` only picks the fallback level
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

async fn write_image(original: &ImageFile, image: OptimizedImage, output: &Path) -> anyhow::Result<()> {
    let dimensions = format!("{}x{}", image.width, image.height);
    let before = original.size();
    let after = image.bytes.len() as u64;
    tokio::fs::write(output, &image.bytes).await?;

    ui::summary_row("Output:", &output.display().to_string());
    ui::summary_row("Dimensions:", &dimensions);
    ui::summary_row(
        "Size:",
        &format!(
            "{} {} {}",
            imaging::format_file_size(before),
            ui::label("→"),
            imaging::format_file_size(after)
        ),
    );
    Ok(())
}

async fn print_about(app: &App) -> anyhow::Result<()> {
    let about = app.data.get_about().await?;

    ui::section("Journey");
    if about.journey.trim().is_empty() {
        println!("  {}", ui::placeholder("(empty)"));
    }
    for paragraph in about.journey.split("\n\n").filter(|p| !p.trim().is_empty()) {
        println!("  {}", paragraph.trim());
    }

    ui::section("Photo");
    println!("  {} {}", Icons::CAMERA, about.photo_url().map(photo_label).unwrap_or_else(|| ui::placeholder("(none)")));

    if !about.stats.is_empty() {
        ui::section("Stats");
        println!("{}", ui::stats_table(&about.stats));
    }

    if !about.education.is_empty() {
        ui::section("Education");
        for entry in &about.education {
            println!("  {} {} {}", Icons::STAR, ui::label(&entry.year), entry.title);
            ui::summary_row("", &entry.institution);
        }
    }

    if !about.skills.is_empty() {
        ui::section("Skills");
        for category in &about.skills {
            ui::summary_row(&format!("{}:", category.name), &category.skills.join(", "));
        }
    }
    Ok(())
}

/// Embedded photos are too long to print
fn photo_label(url: &str) -> String {
    if url.starts_with("data:") {
        format!("{} embedded image", Icons::PACKAGE)
    } else {
        format!("{} {}", Icons::LINK, url)
    }
}
