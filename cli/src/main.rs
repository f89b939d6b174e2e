//! pagesplice CLI - splice recognized equations and figures into PDF text

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pagesplice::{
    scan_input_dir, BatchProcessor, BatchSummary, CommandRecognizer, DocumentLoader,
    DocumentOutcome, ImageNumbering, LoadOptions, PageSelection, PageSplice, PdfiumLoader,
    PipelineConfig,
};

#[derive(Parser)]
#[command(name = "pagesplice")]
#[command(author = "pagesplice contributors")]
#[command(version)]
#[command(
    about = "Splice recognized equations and figures back into extracted PDF text",
    long_about = None
)]
struct Cli {
    /// Input directory of PDF files
    #[arg(value_name = "INPUT_DIR")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT_DIR")]
    output: Option<PathBuf>,

    #[command(flatten)]
    options: PipelineArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every processing command.
#[derive(Args)]
struct PipelineArgs {
    /// Pipeline configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// OCR command line; `{input}` is replaced with the region image
    #[arg(long, global = true, env = "PAGESPLICE_OCR_CMD", value_name = "CMD")]
    ocr_cmd: Option<String>,

    /// Formula recognizer command line; equations are left as text without it
    #[arg(long, global = true, env = "PAGESPLICE_FORMULA_CMD", value_name = "CMD")]
    formula_cmd: Option<String>,

    /// Timeout for a single recognizer call, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Image numbering scheme
    #[arg(long, global = true, value_enum)]
    numbering: Option<Numbering>,

    /// Rendering resolution
    #[arg(long, global = true)]
    dpi: Option<f32>,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long, global = true)]
    pages: Option<String>,

    /// Process pages one at a time
    #[arg(long, global = true)]
    sequential: bool,

    /// Leave pages without text out of the output
    #[arg(long, global = true)]
    skip_empty: bool,

    /// Do not write the images embedded in the PDF
    #[arg(long, global = true)]
    no_embedded: bool,

    /// Directory holding the PDFium library
    #[arg(long, global = true, env = "PDFIUM_DYNAMIC_LIB_PATH", value_name = "DIR")]
    pdfium_dir: Option<PathBuf>,

    /// Write a JSON run summary to this file
    #[arg(long, global = true, value_name = "FILE")]
    summary: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every PDF in a directory
    Run {
        /// Input directory
        #[arg(value_name = "INPUT_DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(value_name = "OUTPUT_DIR")]
        output: Option<PathBuf>,
    },

    /// Process a single PDF
    File {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Show detected and classified regions per page
    Regions {
        /// Input PDF file
        #[arg(value_name = "PDF")]
        input: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Numbering {
    /// image_<page>_<index>
    Page,
    /// image_<n> across the document
    Document,
}

impl From<Numbering> for ImageNumbering {
    fn from(numbering: Numbering) -> Self {
        match numbering {
            Numbering::Page => ImageNumbering::Page,
            Numbering::Document => ImageNumbering::Document,
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let options = cli.options;

    let result = match cli.command {
        Some(Commands::Run { input, output }) => cmd_run(&input, output.as_deref(), &options),
        Some(Commands::File { input, output }) => cmd_file(&input, output.as_deref(), &options),
        Some(Commands::Regions { input }) => cmd_regions(&input, &options),
        Some(Commands::Version) => {
            cmd_version();
            Ok(true)
        }
        None => {
            // Default behavior: batch run if an input directory is provided
            if let Some(input) = cli.input {
                cmd_run(&input, cli.output.as_deref(), &options)
            } else {
                println!("{}", "Usage: pagesplice <INPUT_DIR> [OUTPUT_DIR]".yellow());
                println!("       pagesplice --help for more information");
                Ok(true)
            }
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

impl PipelineArgs {
    fn pipeline_config(&self) -> CliResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(numbering) = self.numbering {
            config = config.with_numbering(numbering.into());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if self.sequential {
            config = config.sequential();
        }
        if self.skip_empty {
            config = config.with_skip_empty_pages(true);
        }
        Ok(config)
    }

    fn load_options(&self) -> CliResult<LoadOptions> {
        let mut options = LoadOptions::new().lenient();
        if let Some(pages) = &self.pages {
            let selection = PageSelection::parse(pages)
                .map_err(|e| format!("Invalid page range: {}", e))?;
            options = options.with_pages(selection);
        }
        if let Some(dpi) = self.dpi {
            options = options.with_dpi(dpi);
        }
        options = options.with_embedded_images(!self.no_embedded);
        options.validate()?;
        Ok(options)
    }

    fn builder(&self) -> CliResult<PageSplice> {
        let ocr = match &self.ocr_cmd {
            Some(cmd) => CommandRecognizer::parse(cmd)?.with_name("ocr"),
            None => CommandRecognizer::tesseract(),
        };
        let formula = match &self.formula_cmd {
            Some(cmd) => Some(CommandRecognizer::parse(cmd)?.with_name("formula")),
            None => None,
        };
        Ok(PageSplice::from_commands(ocr, formula)
            .with_config(self.pipeline_config()?)
            .with_load_options(self.load_options()?))
    }

    fn loader(&self) -> CliResult<PdfiumLoader> {
        let loader = match &self.pdfium_dir {
            Some(dir) => PdfiumLoader::from_library_dir(dir)?,
            None => PdfiumLoader::new()?,
        };
        Ok(loader)
    }

    fn batch(&self) -> CliResult<BatchProcessor<PdfiumLoader>> {
        Ok(self.builder()?.batch(self.loader()?)?)
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_output", stem))
}

fn cmd_run(input: &Path, output: Option<&Path>, options: &PipelineArgs) -> CliResult<bool> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output(input));

    let files = scan_input_dir(input)?;
    if files.is_empty() {
        println!("{} no PDF files in {}", "Nothing to do:".yellow(), input.display());
        return Ok(true);
    }

    let batch = options.batch()?;
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let summary = batch.run_files(&files, &output_dir, |outcome| {
        pb.set_message(file_name(&outcome.source));
        if !outcome.is_success() {
            pb.println(format!(
                "{} {}",
                "Failed".red(),
                outcome.source.display()
            ));
        }
        pb.inc(1);
    });
    pb.finish_with_message("Done!");

    print_summary(&summary, &output_dir);
    if let Some(path) = &options.summary {
        summary.write_json(path)?;
        println!("{} {}", "Summary saved to".green(), path.display());
    }

    Ok(!summary.has_failures())
}

fn cmd_file(input: &Path, output: Option<&Path>, options: &PipelineArgs) -> CliResult<bool> {
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_output(input));

    let batch = options.batch()?;
    let summary = batch.run_files(&[input.to_path_buf()], &output_dir, |_| {});

    print_summary(&summary, &output_dir);
    if let Some(path) = &options.summary {
        summary.write_json(path)?;
        println!("{} {}", "Summary saved to".green(), path.display());
    }

    Ok(!summary.has_failures())
}

fn cmd_regions(input: &Path, options: &PipelineArgs) -> CliResult<bool> {
    let pipeline = options.builder()?.pipeline()?;
    let document = options.loader()?.load(input, &options.load_options()?)?;

    println!("{}", "Regions".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for page in &document.pages {
        let regions = pipeline.analyze_page(page);
        println!(
            "{} {} ({}x{}): {} detected, {} kept, {} nested, {} embedded images",
            "Page".bold(),
            regions.number,
            page.width(),
            page.height(),
            regions.detected.len(),
            regions.classified.len(),
            regions.suppressed.len(),
            page.embedded.len()
        );
        for region in &regions.classified {
            let b = region.bbox;
            println!(
                "  {} {:<8} x={} y={} w={} h={}",
                "├─".dimmed(),
                region.kind.to_string(),
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
        for region in &regions.suppressed {
            let b = region.bbox;
            println!(
                "  {} {:<8} x={} y={} w={} h={} (nested)",
                "├─".dimmed(),
                region.kind.to_string(),
                b.x,
                b.y,
                b.width,
                b.height
            );
        }
    }

    Ok(true)
}

fn print_summary(summary: &BatchSummary, output_dir: &Path) {
    println!();
    println!("{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for outcome in &summary.documents {
        print_outcome(outcome);
    }

    let totals = &summary.totals;
    println!();
    println!("{}: {}", "Documents processed".bold(), summary.succeeded());
    println!("{}: {}", "Documents failed".bold(), summary.failed());
    println!("{}: {}", "Pages".bold(), totals.page_count);
    println!("{}: {}", "Equations substituted".bold(), totals.equations_substituted);
    println!("{}: {}", "Images extracted".bold(), totals.images_extracted);
    println!("{}: {}", "Embedded images".bold(), totals.embedded_images);
    println!("{}: {}", "Skipped substitutions".bold(), totals.skipped_substitutions);
    println!("{}: {}", "Output".bold(), output_dir.display());
    if summary.aborted {
        println!("{}", "Run stopped early after a fatal error".red().bold());
    }
}

fn print_outcome(outcome: &DocumentOutcome) {
    if outcome.is_success() {
        println!(
            "  {} {} ({} ms)",
            "✓".green(),
            outcome.source.display(),
            outcome.elapsed_ms
        );
    } else {
        println!(
            "  {} {}: {}",
            "✗".red(),
            outcome.source.display(),
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn cmd_version() {
    println!("{} {}", "pagesplice".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Equation and figure reconciliation for PDF text");
    println!();
    println!("License: MIT");
}
