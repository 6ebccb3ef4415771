use clap::{Args, Parser, Subcommand};
use rastersmith::batch::{ExportOptions, FaviconBundle, SizeSet};
use rastersmith::config::{self, ToolConfig};
use rastersmith::imaging::{
    Color, EncodeRequest, ImageAsset, OutputFormat, Quality, ResizeIntent, RustBackend, Shape,
    SynthesisSpec, encode, resample, synth,
};
use rastersmith::{naming, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rastersmith")]
#[command(about = "Resize images and synthesize favicon sets")]
#[command(long_about = "\
Resize images and synthesize favicon sets

Resize a raster to explicit dimensions, a percentage or a named preset, or
draw icons from text or an image on a square, rounded or circular
background. The favicons command writes a whole set at once: one image per
size, apple-touch-icon.png, favicon.ico, site.webmanifest and an HTML
snippet that links them.

Examples:

  rastersmith resize photo.jpg --width 800 --format webp
  rastersmith resize photo.jpg --preset instagram-post --no-lock
  rastersmith icon --text RS --shape circle --out icon.png
  rastersmith favicons --image logo.png --name \"Acme Docs\" --out-dir public

Run 'rastersmith gen-config' to generate a documented rastersmith.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./rastersmith.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Encoding flags shared by every command that writes images.
#[derive(Args, Clone)]
struct EncodeArgs {
    /// Output format: png, jpeg, webp, avif or a mime type
    #[arg(long)]
    format: Option<String>,

    /// Quality for JPEG and AVIF (0-100)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
    quality: Option<u32>,
}

/// Icon appearance flags. Unset flags come from the `[icon]` config section.
#[derive(Args, Clone)]
struct IconArgs {
    /// Text drawn in the icon (first two characters, uppercased)
    #[arg(long)]
    text: Option<String>,

    /// Image drawn in the icon, cover-fit and clipped to the shape
    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long)]
    shape: Option<Shape>,

    /// Background color (#rgb, #rrggbb, #rrggbbaa or transparent)
    #[arg(long)]
    background: Option<Color>,

    /// Text color
    #[arg(long)]
    foreground: Option<Color>,

    /// Glyph height as a fraction of the icon size, in (0, 1]
    #[arg(long)]
    text_size: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Resize an image to new dimensions, a percentage or a preset
    Resize {
        input: PathBuf,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        /// Uniform scale in percent; above 100 upscales
        #[arg(long, conflicts_with_all = ["width", "height", "preset"])]
        percent: Option<f64>,

        /// Named preset (see 'rastersmith presets')
        #[arg(long, conflicts_with_all = ["width", "height"])]
        preset: Option<String>,

        /// Stretch to the exact box instead of keeping the aspect ratio
        #[arg(long)]
        no_lock: bool,

        #[command(flatten)]
        encode: EncodeArgs,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Draw a single icon
    Icon {
        #[command(flatten)]
        icon: IconArgs,

        /// Edge length in pixels
        #[arg(long)]
        size: Option<u32>,

        #[command(flatten)]
        encode: EncodeArgs,

        /// Output file (default: icon-{size}x{size}.{ext} in the output dir)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export a favicon set with its snippet and web manifest
    Favicons {
        #[command(flatten)]
        icon: IconArgs,

        /// Sizes to export, comma separated, or a size set name
        #[arg(long, value_delimiter = ',')]
        sizes: Option<Vec<String>>,

        /// Display name for the web manifest
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        encode: EncodeArgs,

        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// List resize presets and favicon size sets
    Presets,
    /// Print a stock rastersmith.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config::load_config(cli.config.as_deref(), Path::new("."))?;
    init_thread_pool(&config.processing);
    let backend = RustBackend::new();

    match cli.command {
        Command::Resize {
            input,
            width,
            height,
            percent,
            preset,
            no_lock,
            encode: encode_args,
            out_dir,
        } => {
            let lock_aspect = !no_lock;
            let intent = match (preset, percent) {
                (Some(name), _) => ResizeIntent::Preset { name, lock_aspect },
                (None, Some(pct)) => ResizeIntent::Percentage { pct },
                (None, None) => ResizeIntent::Dimensions {
                    width,
                    height,
                    lock_aspect,
                },
            };
            let asset = ImageAsset::open(&input)?;
            let artifact = resample::resize(
                &backend,
                &asset,
                &intent,
                &config.catalog(),
                &config.surface_limits(),
                &encode_request(&config, &encode_args),
            )?;

            let name = naming::download_name(
                &input.to_string_lossy(),
                artifact.width(),
                artifact.height(),
                artifact_extension(&artifact),
            );
            let dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
            let path = write_output(&dir, &name, artifact.bytes())?;
            output::print_resize_result(&input, &asset, &artifact, &path);
        }
        Command::Icon {
            icon,
            size,
            encode: encode_args,
            out,
        } => {
            let mut spec = synthesis_spec(&config, &icon)?;
            if let Some(size) = size {
                spec.size_px = size;
            }
            let surface = synth::synthesize(&backend, &spec, config.surface_limits())?;
            let artifact = encode(&backend, &surface, &encode_request(&config, &encode_args))?;

            let path = match out {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, artifact.bytes())?;
                    path
                }
                None => {
                    let name = naming::download_name(
                        "icon",
                        artifact.width(),
                        artifact.height(),
                        artifact_extension(&artifact),
                    );
                    write_output(&config.output.dir, &name, artifact.bytes())?
                }
            };
            output::print_icon_result(&artifact, &path);
        }
        Command::Favicons {
            icon,
            sizes,
            name,
            encode: encode_args,
            out_dir,
        } => {
            let template = synthesis_spec(&config, &icon)?;
            let sizes = match sizes {
                Some(args) => parse_sizes(&args)?,
                None => config.favicon.sizes.clone(),
            };
            let options = ExportOptions {
                request: encode_request(&config, &encode_args),
                limits: config.surface_limits(),
            };
            let name = name.unwrap_or_else(|| config.favicon.name.clone());

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let bundle = FaviconBundle::build(
                &backend,
                &template,
                &SizeSet::selected(&sizes),
                &options,
                &name,
                &config.manifest,
                Some(&tx),
            );
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let bundle = bundle?;

            let dir = out_dir.unwrap_or_else(|| config.output.dir.clone());
            let written = bundle.write_to(&dir)?;
            output::print_favicon_summary(&bundle, &written, &dir);
            if !bundle.icons.is_complete() {
                return Err(format!(
                    "{} of {} sizes failed",
                    bundle.icons.failures.len(),
                    bundle.icons.attempted()
                )
                .into());
            }
        }
        Command::Presets => {
            output::print_presets(&config.catalog());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise `-v`/`-vv` raise this crate's level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "rastersmith=warn",
        1 => "rastersmith=debug",
        _ => "rastersmith=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Config request with command-line overrides applied.
///
/// A `--format` that names no known format is passed through as-is so the
/// encoder reports it (or falls back to PNG when the config allows).
fn encode_request(config: &ToolConfig, args: &EncodeArgs) -> EncodeRequest {
    let mut request = config.encode_request();
    if let Some(format) = &args.format {
        request.mime_type = OutputFormat::parse(format)
            .map(|f| f.mime().to_string())
            .unwrap_or_else(|| format.clone());
    }
    if let Some(quality) = args.quality {
        request.quality = Quality::new(quality);
    }
    request
}

fn synthesis_spec(
    config: &ToolConfig,
    args: &IconArgs,
) -> Result<SynthesisSpec, Box<dyn std::error::Error>> {
    let mut spec = config.synthesis_spec();
    spec.text = args.text.clone();
    if let Some(path) = &args.image {
        spec.source_image = Some(ImageAsset::open(path)?);
    }
    if let Some(shape) = args.shape {
        spec.shape = shape;
    }
    if let Some(color) = args.background {
        spec.background_color = color;
    }
    if let Some(color) = args.foreground {
        spec.foreground_color = color;
    }
    if let Some(fraction) = args.text_size {
        spec.text_size_fraction = fraction;
    }
    Ok(spec)
}

/// `--sizes` values: numbers, or the name of a size set.
fn parse_sizes(args: &[String]) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
    let mut sizes = Vec::new();
    for arg in args {
        let arg = arg.trim();
        match rastersmith::presets::size_set(arg) {
            Some(set) => sizes.extend_from_slice(set),
            None => sizes.push(
                arg.parse::<u32>()
                    .map_err(|_| format!("'{arg}' is neither a size nor a size set name"))?,
            ),
        }
    }
    Ok(sizes)
}

fn artifact_extension(artifact: &rastersmith::imaging::OutputArtifact) -> &'static str {
    artifact
        .format()
        .map(OutputFormat::extension)
        .unwrap_or("bin")
}

fn write_output(dir: &Path, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
