//! rulesheet CLI - rulebook cheat sheets and piece segmentation

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use rulesheet::render::{self, CheatSheet, RenderOptions, DEFAULT_IMAGE_DIR};
use rulesheet::segment::{self, SegmentMethod, SegmentOptions};
use rulesheet::{
    extract_file_with_options, CleanupOptions, CleanupPreset, ExtractOptions, ExtractedDocument,
    JsonFormat, PageSelection,
};

#[derive(Parser)]
#[command(name = "rulesheet")]
#[command(author)]
#[command(version)]
#[command(about = "Build cheat sheets from PDF rulebooks and split composite piece images", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Log debug messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every cheat sheet artifact
    Build {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "RULESHEET_OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Also write the PDF sheet
        #[arg(long)]
        pdf: bool,

        /// Also write a JSON manifest of extracted objects
        #[arg(long)]
        json: bool,
    },

    /// Write the plain-text cheat sheet
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Leave out the rulebook's full text
        #[arg(long)]
        no_reference: bool,
    },

    /// Write the HTML cheat sheet and its images
    Html {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "cheatsheet.html")]
        output: PathBuf,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Directory for extracted images
        #[arg(long, value_name = "DIR")]
        image_dir: Option<PathBuf>,
    },

    /// Write the PDF cheat sheet
    Pdf {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE", default_value = "cheatsheet.pdf")]
        output: PathBuf,

        #[command(flatten)]
        sheet: SheetArgs,

        /// Do not embed rulebook figures
        #[arg(long)]
        no_figures: bool,
    },

    /// Write a JSON manifest of extracted objects
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// Extract images from PDF
    Images {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "extracted_images")]
        output: PathBuf,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,
    },

    /// List pages that contain images
    Check {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Split composite images into individual pieces
    Segment(SegmentArgs),

    /// Show version information
    Version,
}

/// Options shared by the sheet-writing commands.
#[derive(Args)]
struct SheetArgs {
    /// Cheat sheet definition (JSON); the built-in sheet if omitted
    #[arg(long, value_name = "JSON")]
    sheet: Option<PathBuf>,

    /// Reference text cleanup preset
    #[arg(long, value_enum)]
    cleanup: Option<CleanupLevel>,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,
}

#[derive(Args)]
struct SegmentArgs {
    /// Directory containing composite images
    #[arg(value_name = "DIR", required_unless_present = "single")]
    input_dir: Option<PathBuf>,

    /// Output directory for extracted pieces
    #[arg(short, long, value_name = "DIR", default_value = "segmented_pieces")]
    output: PathBuf,

    /// Segmentation method
    #[arg(short, long, value_enum, default_value = "auto")]
    method: Method,

    /// Minimum width or height for an image to count as a composite
    #[arg(long, default_value_t = 1000)]
    min_size: u32,

    /// Minimum area for detected pieces
    #[arg(long, default_value_t = 500.0)]
    min_area: f64,

    /// Padding around each piece
    #[arg(long, default_value_t = 5)]
    padding: u32,

    /// Expected grid rows (grid method)
    #[arg(long)]
    rows: Option<usize>,

    /// Expected grid columns (grid method)
    #[arg(long)]
    cols: Option<usize>,

    /// Process a single image file instead of a directory
    #[arg(long, value_name = "FILE")]
    single: Option<PathBuf>,

    /// Keep pieces that look empty
    #[arg(long)]
    no_filter_empty: bool,

    /// Keep existing files in the output directory
    #[arg(long)]
    no_clear: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CleanupLevel {
    /// Unicode normalization only (default)
    Minimal,
    /// Also fix ligatures and drop page number headers and footers
    Standard,
}

impl From<CleanupLevel> for CleanupPreset {
    fn from(level: CleanupLevel) -> Self {
        match level {
            CleanupLevel::Minimal => CleanupPreset::Minimal,
            CleanupLevel::Standard => CleanupPreset::Standard,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Contour detection with color fallback
    Auto,
    /// Adaptive threshold and contours
    Contour,
    /// Non-white color mask
    Color,
    /// Contours in reading order
    Grid,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Build {
            input,
            output,
            sheet,
            pdf,
            json,
        }) => cmd_build(&input, output.as_deref(), &sheet, pdf, json),
        Some(Commands::Text {
            input,
            output,
            sheet,
            no_reference,
        }) => cmd_text(&input, output.as_deref(), &sheet, no_reference),
        Some(Commands::Html {
            input,
            output,
            sheet,
            image_dir,
        }) => cmd_html(&input, &output, &sheet, image_dir),
        Some(Commands::Pdf {
            input,
            output,
            sheet,
            no_figures,
        }) => cmd_pdf(&input, &output, &sheet, no_figures),
        Some(Commands::Json {
            input,
            output,
            compact,
            pages,
        }) => cmd_json(&input, output.as_deref(), compact, pages.as_deref()),
        Some(Commands::Images {
            input,
            output,
            pages,
        }) => cmd_images(&input, &output, pages.as_deref()),
        Some(Commands::Check { input }) => cmd_check(&input),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Segment(args)) => cmd_segment(&args),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: build if input is provided
            if let Some(input) = cli.input {
                let output = cli.output.or_else(|| std::env::var_os("RULESHEET_OUTPUT").map(PathBuf::from));
                let sheet = SheetArgs {
                    sheet: None,
                    cleanup: None,
                    pages: None,
                };
                cmd_build(&input, output.as_deref(), &sheet, false, false)
            } else {
                println!("{}", "Usage: rulesheet <FILE> [OUTPUT]".yellow());
                println!("       rulesheet --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn parse_pages(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?),
        None => Ok(PageSelection::All),
    }
}

/// Extract leniently so one broken page does not stop the whole sheet.
fn extract(input: &Path, pages: Option<&str>) -> Result<ExtractedDocument, Box<dyn std::error::Error>> {
    let options = ExtractOptions::new().lenient().with_pages(parse_pages(pages)?);
    Ok(extract_file_with_options(input, options)?)
}

fn load_sheet(args: &SheetArgs) -> Result<CheatSheet, Box<dyn std::error::Error>> {
    match &args.sheet {
        Some(path) => {
            log::debug!("Loading sheet from {}", path.display());
            Ok(CheatSheet::from_json_file(path)?)
        }
        None => Ok(CheatSheet::default()),
    }
}

fn render_options(args: &SheetArgs) -> RenderOptions {
    let options = RenderOptions::new();
    match args.cleanup {
        Some(level) => options.with_cleanup(CleanupOptions::from_preset(level.into())),
        None => options,
    }
}

fn cmd_build(input: &Path, output: Option<&Path>, args: &SheetArgs, pdf: bool, json: bool) -> CmdResult {
    let output_dir = output.map(Path::to_path_buf).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_cheatsheet", stem))
    });
    fs::create_dir_all(&output_dir)?;

    let steps = 3 + pdf as u64 + json as u64;
    let pb = ProgressBar::new(steps);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Extracting objects...");
    let doc = extract(input, args.pages.as_deref())?;
    let sheet = load_sheet(args)?;
    let options = render_options(args).with_image_dir(output_dir.join(DEFAULT_IMAGE_DIR));
    pb.inc(1);

    pb.set_message("Writing text sheet...");
    render::create_cheat_sheet(&doc, &sheet, output_dir.join("cheatsheet.txt"), &options)?;
    pb.inc(1);

    pb.set_message("Writing HTML sheet...");
    let images = render::create_html_cheatsheet(&doc, &sheet, output_dir.join("cheatsheet.html"), &options)?;
    pb.inc(1);

    if pdf {
        pb.set_message("Writing PDF sheet...");
        render::create_pdf_cheatsheet(&doc, &sheet, output_dir.join("cheatsheet.pdf"), &options)?;
        pb.inc(1);
    }

    if json {
        pb.set_message("Writing object manifest...");
        render::write_json(&doc, output_dir.join("objects.json"))?;
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    let mut files = vec!["cheatsheet.txt", "cheatsheet.html"];
    if pdf {
        files.push("cheatsheet.pdf");
    }
    if json {
        files.push("objects.json");
    }

    println!("\n{} {}", "Output files:".green().bold(), output_dir.display());
    for file in files {
        println!("  {} {}", "├─".dimmed(), file);
    }
    println!("  {} {}/ ({} images)", "└─".dimmed(), DEFAULT_IMAGE_DIR, images.len());

    Ok(())
}

fn cmd_text(input: &Path, output: Option<&Path>, args: &SheetArgs, no_reference: bool) -> CmdResult {
    let doc = extract(input, args.pages.as_deref())?;
    let sheet = load_sheet(args)?;
    let options = render_options(args).with_reference_text(!no_reference);

    if let Some(path) = output {
        render::create_cheat_sheet(&doc, &sheet, path, &options)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", render::render_cheat_sheet(&doc, &sheet, &options));
    }

    Ok(())
}

fn cmd_html(input: &Path, output: &Path, args: &SheetArgs, image_dir: Option<PathBuf>) -> CmdResult {
    let doc = extract(input, args.pages.as_deref())?;
    let sheet = load_sheet(args)?;

    let image_dir = image_dir.unwrap_or_else(|| {
        output
            .parent()
            .unwrap_or(Path::new(""))
            .join(DEFAULT_IMAGE_DIR)
    });
    let options = render_options(args).with_image_dir(&image_dir);

    let images = render::create_html_cheatsheet(&doc, &sheet, output, &options)?;
    println!("{} {}", "Saved to".green(), output.display());
    println!("{} {} images in {}", "Extracted".green(), images.len(), image_dir.display());

    Ok(())
}

fn cmd_pdf(input: &Path, output: &Path, args: &SheetArgs, no_figures: bool) -> CmdResult {
    let doc = extract(input, args.pages.as_deref())?;
    let sheet = load_sheet(args)?;
    let options = render_options(args).with_figures(!no_figures);

    render::create_pdf_cheatsheet(&doc, &sheet, output, &options)?;
    println!("{} {}", "Saved to".green(), output.display());

    Ok(())
}

fn cmd_json(input: &Path, output: Option<&Path>, compact: bool, pages: Option<&str>) -> CmdResult {
    let options = ExtractOptions::new().with_pages(parse_pages(pages)?);
    let doc = extract_file_with_options(input, options)?;

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = render::to_json(&doc, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_images(input: &Path, output: &Path, pages: Option<&str>) -> CmdResult {
    let options = ExtractOptions::new().with_pages(parse_pages(pages)?);
    let doc = extract_file_with_options(input, options)?;

    let paths = render::extract_images(&doc, output)?;
    for path in paths.values() {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("{} {}", "Extracted".green(), name);
    }

    println!("\n{} {} images extracted", "Done!".green().bold(), paths.len());

    Ok(())
}

fn cmd_check(input: &Path) -> CmdResult {
    let counts = rulesheet::image_counts(input)?;
    if counts.is_empty() {
        println!("{}", "No images found".yellow());
    }
    for (page, count) in counts {
        println!("Page {}: {} image(s)", page, count);
    }
    Ok(())
}

fn cmd_info(input: &Path) -> CmdResult {
    // Lenient: show metadata even if some pages fail
    let doc = extract(input, None)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), doc.metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), doc.metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if doc.metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = doc.metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = doc.metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = doc.metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = doc.metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = doc.metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text: String = doc.all_text().into_values().collect::<Vec<_>>().join("\n");
    let words = text.split_whitespace().count();
    let pages_with_images = doc.image_counts().len();

    println!("{}: {}", "Text blocks".bold(), doc.total_text_blocks());
    println!("{}: {}", "Words".bold(), words);
    println!("{}: {}", "Characters".bold(), text.chars().count());
    println!(
        "{}: {} on {} pages",
        "Images".bold(),
        doc.total_images(),
        pages_with_images
    );

    Ok(())
}

fn cmd_segment(args: &SegmentArgs) -> CmdResult {
    let method = match args.method {
        Method::Auto => SegmentMethod::Auto,
        Method::Contour => SegmentMethod::Contour,
        Method::Color => SegmentMethod::Color,
        Method::Grid => SegmentMethod::Grid {
            rows: args.rows,
            cols: args.cols,
        },
    };

    let mut options = SegmentOptions::new()
        .with_method(method)
        .with_min_size(args.min_size)
        .with_min_area(args.min_area)
        .with_padding(args.padding);
    if args.no_filter_empty {
        options = options.keep_empty();
    }
    if args.no_clear {
        options = options.keep_output();
    }
    log::debug!("Segment options: {:?}", options);

    if let Some(single) = &args.single {
        let stem = single.file_stem().unwrap_or_default();
        let output_dir = args.output.join(stem);
        let pieces = segment::segment_composite_image(single, &output_dir, &options)?;
        println!(
            "{} {} pieces to {}",
            "Extracted".green(),
            pieces.len(),
            output_dir.display()
        );
        return Ok(());
    }

    let Some(input_dir) = &args.input_dir else {
        return Err("an input directory or --single FILE is required".into());
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Segmenting images in {}...", input_dir.display()));
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let results = segment::segment_all_composites(input_dir, &args.output, &options)?;
    spinner.finish_and_clear();

    if results.is_empty() {
        println!("{}", "No composite images found".yellow());
        return Ok(());
    }

    println!("{}", "Segmented images:".green().bold());
    for (source, pieces) in &results {
        let name = source.file_name().unwrap_or_default().to_string_lossy();
        println!("  {} {} ({} pieces)", "├─".dimmed(), name, pieces.len());
    }
    let total: usize = results.values().map(Vec::len).sum();
    println!(
        "\n{} {} pieces from {} images",
        "Done!".green().bold(),
        total,
        results.len()
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "rulesheet".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Rulebook cheat sheet builder");
    println!();
    println!("License: MIT");
}
