use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use markpdf_core::export::{export_filename, ExportPipeline, ExportSettings, SilentStatus};
use markpdf_core::overlay::OverlayRenderer;
use markpdf_core::store::AnnotationStore;
use markpdf_core::text_extract::reconstruct_layout;
use markpdf_engine::{LopdfAssembler, LopdfRasterizer, OpenSource, PageRasterizer};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "markpdf")]
#[command(about = "Headless annotation and export tool for PDF documents")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Composite annotations onto every page and save the result.
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// JSON file mapping page numbers to stroke and text annotations.
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Output resolution in dots per inch.
        #[arg(long, default_value_t = 150)]
        dpi: u32,
        /// Output path; defaults to a timestamped name in the working
        /// directory.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Reconstruct and print the text of one page.
    ExtractText {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u16,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u16,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Export { file, annotations, dpi, output } => {
            run_export(&file, annotations.as_deref(), dpi, output)
        }
        Commands::ExtractText { file, page } => run_extract_text(&file, page),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut rasterizer = LopdfRasterizer::new();
    let handle = rasterizer.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = rasterizer.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = rasterizer.page_size(handle, 1)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    rasterizer.close(handle)?;

    Ok(())
}

fn run_export(
    file: &Path,
    annotations: Option<&Path>,
    dpi: u32,
    output: Option<PathBuf>,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    if dpi == 0 {
        anyhow::bail!("--dpi must be >= 1");
    }

    let store = match annotations {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<AnnotationStore>(&json)
                .with_context(|| format!("invalid annotations in {}", path.display()))?
        }
        None => AnnotationStore::new(),
    };

    let mut rasterizer = LopdfRasterizer::new();
    let handle = rasterizer.open(OpenSource::from(file)).context("failed to open PDF")?;

    let output = output.unwrap_or_else(|| PathBuf::from(export_filename(Utc::now())));
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let renderer = OverlayRenderer::new();
    let pipeline = ExportPipeline::new(&renderer);
    let mut assembler = LopdfAssembler::new();
    pipeline
        .run(
            &rasterizer,
            handle,
            &store,
            &mut assembler,
            &ExportSettings { dpi },
            &output,
            &mut SilentStatus,
        )
        .context("export failed")?;

    println!("{}", output.display());

    rasterizer.close(handle)?;

    Ok(())
}

fn run_extract_text(file: &Path, page: u16) -> Result<()> {
    ensure_pdf_exists(file)?;

    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let mut rasterizer = LopdfRasterizer::new();
    let handle = rasterizer.open(OpenSource::from(file)).context("failed to open PDF")?;

    let fragments =
        rasterizer.text_fragments(handle, page).context("failed to read page text")?;
    println!("{}", reconstruct_layout(&fragments));

    rasterizer.close(handle)?;

    Ok(())
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
