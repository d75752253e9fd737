use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "codelayer", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a base code image with the overlays of a scene file and export it.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Base code image (PNG, JPEG, BMP or SVG).
    #[arg(long)]
    base: PathBuf,

    /// Scene JSON describing the overlays.
    #[arg(long)]
    scene: PathBuf,

    /// Output path.
    #[arg(long)]
    out: PathBuf,

    /// Output width in pixels. Defaults to the logical canvas width.
    #[arg(long)]
    width: Option<u32>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<FormatChoice>,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// Editor config JSON overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Canvas background as `#rrggbb` or `#rrggbbaa`, overriding the config.
    #[arg(long, value_parser = parse_color)]
    background: Option<codelayer::Rgba8>,
}

fn parse_color(s: &str) -> Result<codelayer::Rgba8, String> {
    codelayer::Rgba8::from_hex(s)
        .ok_or_else(|| format!("expected #rrggbb or #rrggbbaa, got '{s}'"))
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Bmp,
    Svg,
}

#[derive(serde::Deserialize, Debug)]
struct SceneFile {
    /// Logical canvas size; the base image's natural size when omitted.
    #[serde(default)]
    logical_width: Option<f64>,
    #[serde(default)]
    logical_height: Option<f64>,
    /// Font files registered before text layers are measured.
    #[serde(default)]
    fonts: Vec<PathBuf>,
    #[serde(default)]
    overlays: Vec<SceneOverlay>,
}

#[derive(serde::Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SceneOverlay {
    Text {
        text: String,
        x: f64,
        y: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        font_size: Option<f64>,
        #[serde(default)]
        style: codelayer::TextStyle,
    },
    Image {
        path: PathBuf,
        x: f64,
        y: f64,
        #[serde(default)]
        rotation: f64,
        #[serde(default)]
        width: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
    }
}

fn read_scene_json(path: &Path) -> anyhow::Result<SceneFile> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scene: SceneFile = serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scene)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<codelayer::EditorConfig> {
    let Some(path) = path else {
        return Ok(codelayer::EditorConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    Ok(codelayer::EditorConfig::from_json_str(&json)?)
}

fn resolve_format(args: &ComposeArgs) -> codelayer::ExportFormat {
    let choice = args.format.unwrap_or_else(|| {
        match args
            .out
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => FormatChoice::Jpeg,
            Some("bmp") => FormatChoice::Bmp,
            Some("svg") => FormatChoice::Svg,
            _ => FormatChoice::Png,
        }
    });
    match choice {
        FormatChoice::Png => codelayer::ExportFormat::Png,
        FormatChoice::Jpeg => codelayer::ExportFormat::Jpeg {
            quality: args.quality,
        },
        FormatChoice::Bmp => codelayer::ExportFormat::Bmp,
        FormatChoice::Svg => codelayer::ExportFormat::Svg,
    }
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let mut config = read_config(args.config.as_deref())?;
    if let Some(background) = args.background {
        config.background = background;
    }
    let scene = read_scene_json(&args.scene)?;
    let scene_root = args.scene.parent().unwrap_or_else(|| Path::new("."));

    let base_bytes =
        std::fs::read(&args.base).with_context(|| format!("read base '{}'", args.base.display()))?;
    let base = codelayer::BaseImage::from_bytes(&base_bytes)?;
    let natural = base.natural_size();
    let logical = codelayer::Size::new(
        scene.logical_width.unwrap_or(natural.width),
        scene.logical_height.unwrap_or(natural.height),
    );

    let mut editor = codelayer::Editor::new(logical, config)?;
    editor.set_base(base);

    for font in &scene.fonts {
        let path = scene_root.join(font);
        let bytes =
            std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;
        let family = editor.register_font(bytes)?;
        tracing::info!(%family, path = %path.display(), "registered font");
    }

    for overlay in scene.overlays {
        match overlay {
            SceneOverlay::Text {
                text,
                x,
                y,
                rotation,
                font_size,
                style,
            } => {
                let size = font_size.unwrap_or(editor.config().default_font_size);
                let id = editor.add_text_with(text, codelayer::Point::new(x, y), size, style);
                editor.set_rotation(id, rotation)?;
            }
            SceneOverlay::Image {
                path,
                x,
                y,
                rotation,
                width,
            } => {
                let path = scene_root.join(path);
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read overlay image '{}'", path.display()))?;
                let id = editor
                    .add_image(&bytes)
                    .with_context(|| format!("decode overlay image '{}'", path.display()))?;
                editor.set_position(id, codelayer::Point::new(x, y))?;
                editor.set_rotation(id, rotation)?;
                if let Some(w) = width {
                    editor.set_image_width(id, w)?;
                }
            }
        }
    }

    let request = codelayer::ExportRequest {
        target_width: args
            .width
            .unwrap_or_else(|| logical.width.round().max(1.0) as u32),
        format: resolve_format(&args),
    };
    let bytes = editor.render_export(request)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write output '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
