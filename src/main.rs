use anyhow::Context;
use beadgrid_lib::catalog::{Brand, Catalog};
use beadgrid_lib::color::Rgb;
use beadgrid_lib::legend::{
    apply_overrides, color_stats, group_color_stats, total_available_colors, total_beads,
};
use beadgrid_lib::palette_map::{find_closest_palette_color, get_active_brand_palette};
use beadgrid_lib::pipeline::{load_image, sample_image_colors, CellColor, PatternConfig};
use beadgrid_lib::raster::{encode_png, render_scaled, CellShape, RenderOptions};
use beadgrid_lib::{ColorMethod, DitherMethod, SamplingMode};
use clap::{Args, Parser, Subcommand};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "beadgrid")]
#[command(about = "Turn images into bead-board patterns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image into a bead pattern
    Pattern(PatternArgs),
    /// Find the closest catalog bead for a color
    Match {
        /// Color as #RRGGBB, #RGB or rgb(r,g,b)
        color: String,

        /// Catalogs to search (repeatable); all catalogs when omitted
        #[arg(long = "brand")]
        brands: Vec<Brand>,

        #[arg(long, default_value = "lab-ciede2000")]
        color_method: ColorMethod,
    },
    /// List catalog beads
    Catalog {
        /// Catalogs to list (repeatable); all catalogs when omitted
        #[arg(long = "brand")]
        brands: Vec<Brand>,
    },
}

#[derive(Args)]
struct PatternArgs {
    /// Input image (PNG, JPEG, GIF, WebP, ...)
    input: PathBuf,

    /// JSON pattern config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid columns
    #[arg(short, long)]
    width: Option<u32>,

    #[arg(short, long)]
    max_colors: Option<usize>,

    /// lab-ciede2000 or oklab
    #[arg(long)]
    color_method: Option<ColorMethod>,

    /// none, bayer, blue-noise, floyd-steinberg or atkinson
    #[arg(long)]
    dither: Option<DitherMethod>,

    /// default, average or cartoon
    #[arg(long)]
    sampling: Option<SamplingMode>,

    /// Constrain the palette to a catalog (repeatable: perler, mard)
    #[arg(long = "brand")]
    brands: Vec<Brand>,

    /// Catalog color to leave out (repeatable)
    #[arg(long)]
    exclude: Vec<Rgb>,

    /// JSON object mapping colors to replacement colors or "transparent"
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Write the grid as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write a rendered PNG
    #[arg(long)]
    png: Option<PathBuf>,

    #[arg(long, default_value_t = 20)]
    cell_size: u32,

    #[arg(long, default_value = "square")]
    shape: CellShape,

    #[arg(long)]
    no_grid: bool,

    /// Draw axis numbers around the grid
    #[arg(long)]
    coordinates: bool,

    /// Hide bead IDs inside cells
    #[arg(long)]
    no_codes: bool,

    /// Pegboard size in cells, e.g. 29 or 52
    #[arg(long)]
    board_size: Option<u32>,

    /// Keep a blank margin around the design
    #[arg(long)]
    editor: bool,

    /// Pixel multiplier for the exported PNG
    #[arg(long, default_value_t = 1)]
    scale: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pattern(args) => run_pattern_command(&args),
        Commands::Match {
            color,
            brands,
            color_method,
        } => run_match_command(&color, &brands, color_method),
        Commands::Catalog { brands } => run_catalog_command(&brands),
    }
}

fn selected_brands(brands: &[Brand]) -> Vec<Brand> {
    if brands.is_empty() {
        Brand::ALL.to_vec()
    } else {
        brands.to_vec()
    }
}

fn build_config(args: &PatternArgs) -> anyhow::Result<PatternConfig> {
    let mut config = match &args.config {
        Some(path) => PatternConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PatternConfig::default(),
    };

    if let Some(width) = args.width {
        config.target_width = width;
    }
    if let Some(max_colors) = args.max_colors {
        config.max_colors = max_colors;
    }
    if let Some(method) = args.color_method {
        config.color_method = method;
    }
    if let Some(dither) = args.dither {
        config.dither_method = dither;
    }
    if let Some(sampling) = args.sampling {
        config.sampling_mode = sampling;
    }
    if !args.brands.is_empty() {
        config.brands = args.brands.clone();
    }
    config.excluded_colors.extend(args.exclude.iter().copied());

    config.validate()?;
    Ok(config)
}

fn build_render_options(args: &PatternArgs) -> RenderOptions {
    let base = if args.editor {
        RenderOptions::editor()
    } else {
        RenderOptions::default()
    };
    RenderOptions {
        cell_size: args.cell_size,
        cell_shape: args.shape,
        show_grid: !args.no_grid,
        show_coordinates: args.coordinates,
        show_color_codes: !args.no_codes,
        board_size: args.board_size,
        ..base
    }
}

fn run_pattern_command(args: &PatternArgs) -> anyhow::Result<()> {
    let config = build_config(args)?;
    let image = load_image(&args.input)
        .with_context(|| format!("Failed to load image {}", args.input.display()))?;

    let mut grid = sample_image_colors(&image, &config)?;

    if let Some(path) = &args.overrides {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read overrides {}", path.display()))?;
        let overrides: HashMap<Rgb, CellColor> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid overrides in {}", path.display()))?;
        grid = apply_overrides(&grid, &overrides);
    }

    if let Some(path) = &args.json {
        fs::write(path, serde_json::to_string(&grid)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote grid to {}", path.display());
    }

    if let Some(path) = &args.png {
        let options = build_render_options(args);
        let rendered = render_scaled(&grid, &options, args.scale)?;
        fs::write(path, encode_png(&rendered)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!(
            "Wrote {}x{} render to {}",
            rendered.width(),
            rendered.height(),
            path.display()
        );
    }

    let catalog = Catalog::global();
    let stats = color_stats(&grid);
    println!(
        "{} x {} grid, {} beads, {} of {} colors",
        grid.cols,
        grid.rows,
        total_beads(&grid),
        stats.len(),
        total_available_colors(&config.brands, catalog)
    );
    for group in group_color_stats(&stats, &config.brands, catalog) {
        println!("{}", group.title);
        for stat in group.entries {
            let bead = catalog
                .find(stat.color)
                .map(|b| format!("{} {}", b.id, b.name))
                .unwrap_or_default();
            println!(
                "  #{:<3} {} {:>6}  {}",
                stat.id,
                stat.color.to_hex(),
                stat.count,
                bead
            );
        }
    }

    Ok(())
}

fn run_match_command(color: &str, brands: &[Brand], method: ColorMethod) -> anyhow::Result<()> {
    let candidates = get_active_brand_palette(
        Catalog::global(),
        &selected_brands(brands),
        &BTreeSet::new(),
    );
    match find_closest_palette_color(color, &candidates, method) {
        Some(bead) => println!(
            "{} {} {} ({})",
            bead.brand.display_name(),
            bead.id,
            bead.name,
            bead.rgb.to_hex()
        ),
        None => anyhow::bail!("No catalog match for '{}'", color),
    }
    Ok(())
}

fn run_catalog_command(brands: &[Brand]) -> anyhow::Result<()> {
    let catalog = Catalog::global();
    for brand in selected_brands(brands) {
        println!("{} ({} colors)", brand.display_name(), catalog.brand_len(brand));
        for bead in catalog.brand_entries(brand) {
            println!("  {:<4} {} {}", bead.id, bead.rgb.to_hex(), bead.name);
        }
    }
    Ok(())
}
