//! resume-export - render a resume layout to a paginated PDF

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pdf_export::{
    artifact_file_name, sanitize_base_name, DocumentExporter, ExportSettings, FileSink,
    ImageEncoding, SettingsManager,
};
use render_surface::{BlockRasterizer, Element};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "resume-export")]
#[command(version)]
#[command(about = "Export rendered resumes to paginated A4 PDFs", long_about = None)]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize a layout (or take a pre-rendered image) and save the PDF
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Display name used for the file name and document title
        #[arg(short, long)]
        name: String,

        /// Directory the PDF is saved into
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        out_dir: PathBuf,

        #[command(flatten)]
        page: PageArgs,

        /// How page bands are embedded
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,
    },

    /// Show the scaling and page plan without writing anything
    Plan {
        /// Layout JSON describing the rendered preview
        #[arg(value_name = "LAYOUT")]
        layout: PathBuf,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Print the file name an export would use
    Name {
        /// Display name
        name: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Layout JSON describing the rendered preview
    #[arg(long, value_name = "FILE")]
    layout: Option<PathBuf>,

    /// Pre-rendered PNG or JPEG of the resume content
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,
}

#[derive(Args)]
struct PageArgs {
    /// Directory holding export-settings.json
    #[arg(long, value_name = "DIR", env = "RESUME_EXPORT_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    /// Override the page height in millimetres
    #[arg(long, value_name = "MM")]
    page_height: Option<f64>,

    /// Override the page margin in millimetres
    #[arg(long, value_name = "MM")]
    margin: Option<f64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EncodingArg {
    Flate,
    Jpeg,
}

impl From<EncodingArg> for ImageEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Flate => ImageEncoding::Flate,
            EncodingArg::Jpeg => ImageEncoding::Jpeg,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load persisted settings and apply command line overrides
async fn load_settings(page: &PageArgs) -> Result<ExportSettings> {
    let mut settings = match &page.settings_dir {
        Some(dir) => {
            let mut manager = SettingsManager::new(dir);
            let path = manager.settings_path().clone();
            manager
                .load()
                .await
                .with_context(|| format!("Failed to load settings from {}", path.display()))?
                .clone()
        }
        None => ExportSettings::default(),
    };

    if let Some(height) = page.page_height {
        settings.page.height_mm = height;
    }
    if let Some(margin) = page.margin {
        settings.page.margin_mm = margin;
    }
    Ok(settings)
}

fn read_layout(path: &Path) -> Result<Element> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid layout in {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Export {
            source,
            name,
            out_dir,
            page,
            encoding,
        } => {
            let mut settings = load_settings(&page).await?;
            if let Some(encoding) = encoding {
                settings.image_encoding = encoding.into();
            }

            let exporter = Arc::new(DocumentExporter::new(
                BlockRasterizer::default(),
                FileSink::new(out_dir),
                settings,
            )?);

            let receipt = match (source.layout, source.image) {
                (Some(layout), _) => {
                    let container = read_layout(&layout)?;
                    exporter.export_async(container, name).await?
                }
                (None, Some(image_path)) => {
                    let raster = image::open(&image_path)
                        .with_context(|| format!("Failed to open image {}", image_path.display()))?
                        .to_rgba8();
                    tokio::task::spawn_blocking(move || exporter.export_raster(&raster, &name))
                        .await??
                }
                (None, None) => bail!("either --layout or --image is required"),
            };
            print_json(&receipt)?;
        }

        Commands::Plan { layout, page } => {
            let settings = load_settings(&page).await?;
            let container = read_layout(&layout)?;
            let exporter = DocumentExporter::new(
                BlockRasterizer::default(),
                FileSink::new("."),
                settings,
            )?;
            print_json(&exporter.plan(&container)?)?;
        }

        Commands::Name { name } => {
            tracing::debug!("Sanitized {:?} to {:?}", name, sanitize_base_name(&name));
            println!("{}", artifact_file_name(&name));
        }
    }

    Ok(())
}
