use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use raster::{FetchOptions, ImageLocation, io};
use zonemap::{
    DetectionStatus, EditEvent, EditOutcome, Editor, EditorConfig, SavePayload, Tool,
};

#[derive(Parser, Debug)]
#[command(name = "zonemap")]
#[command(about = "Detect and rearrange zone blocks on land-use raster maps")]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the zone blocks detected in an image
    Detect {
        #[command(flatten)]
        input: Input,

        /// Also write the blocks as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Drag one detected block to a new position and export the result
    Move {
        #[command(flatten)]
        input: Input,

        /// Index of the block as listed by `detect`
        #[arg(long)]
        block: usize,

        /// New top-left corner
        #[arg(long, value_parser = parse_point)]
        to: (u32, u32),

        #[arg(long)]
        out: PathBuf,
    },
    /// Render the image with road overlays and write a PNG
    Export {
        #[command(flatten)]
        input: Input,

        /// Road network JSON (category -> FeatureCollection)
        #[arg(long)]
        roads: Option<PathBuf>,

        /// Polygon GeoJSON giving the map bounds
        #[arg(long)]
        polygon: Option<PathBuf>,

        #[arg(long, default_value = "zonemap.png")]
        out: PathBuf,

        /// Also write a save payload JSON
        #[arg(long, requires = "target_id")]
        payload: Option<PathBuf>,

        #[arg(long)]
        target_id: Option<String>,

        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
}

#[derive(Args, Debug)]
struct Input {
    /// Image URL, data URI or file path
    source: String,

    /// Editor configuration (.yaml, .yml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bearer token for URL sources
    #[arg(long, env = "ZONEMAP_TOKEN")]
    token: Option<String>,
}

fn parse_point(value: &str) -> Result<(u32, u32), String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", value))?;
    let x = x.trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y = y.trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    Ok((x, y))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    common::log_setup::setup_logging(&cli.log_level, "logs")?;

    match cli.command {
        Command::Detect { input, json } => detect(&input, json.as_deref()),
        Command::Move {
            input,
            block,
            to,
            out,
        } => move_block(&input, block, to, &out),
        Command::Export {
            input,
            roads,
            polygon,
            out,
            payload,
            target_id,
            scale,
        } => export(
            &input,
            roads.as_deref(),
            polygon.as_deref(),
            &out,
            payload.as_deref().zip(target_id.as_deref()),
            scale,
        ),
    }
}

fn open(input: &Input) -> anyhow::Result<Editor> {
    let config = match &input.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let fetch = FetchOptions {
        bearer_token: input.token.clone(),
        ..FetchOptions::default()
    };
    let location = ImageLocation::parse(&input.source);
    let image = raster::load_image(&location, &fetch)
        .with_context(|| format!("Failed to load image {}", location))?;

    Ok(Editor::from_image(image, config)?)
}

fn detect_all(editor: &mut Editor) -> anyhow::Result<()> {
    editor.start_detection()?;
    match editor.run_detection() {
        DetectionStatus::Finished { .. } => Ok(()),
        DetectionStatus::Aborted { reason } => {
            tracing::warn!("Detection aborted: {}", reason);
            Ok(())
        }
        other => bail!("Detection did not complete: {:?}", other),
    }
}

fn detect(input: &Input, json: Option<&Path>) -> anyhow::Result<()> {
    let mut editor = open(input)?;
    detect_all(&mut editor)?;

    for (index, block) in editor.registry().iter().enumerate() {
        println!(
            "{:>3}  {}  {:<18} {}  [{}, {}, {}]",
            index, block.id, block.label, block.rect, block.color.r, block.color.g, block.color.b
        );
    }

    if let Some(path) = json {
        let text = serde_json::to_string_pretty(editor.registry().blocks())?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn move_block(input: &Input, index: usize, to: (u32, u32), out: &Path) -> anyhow::Result<()> {
    let mut editor = open(input)?;
    detect_all(&mut editor)?;

    let Some(block) = editor.registry().blocks().get(index) else {
        bail!(
            "No block {} (detected {})",
            index,
            editor.registry().len()
        );
    };
    let (id, rect) = (block.id, block.rect);

    // Grab the top-left pixel so the pointer lands on the new corner.
    let grab = Vec2::new(rect.x as f32 + 0.5, rect.y as f32 + 0.5);
    let target = Vec2::new(to.0 as f32 + 0.5, to.1 as f32 + 0.5);
    editor.handle(EditEvent::SelectTool(Tool::Move));
    editor.handle(EditEvent::PointerDown(grab));
    editor.handle(EditEvent::PointerMove(target));
    let outcome = editor.handle(EditEvent::PointerUp(target));
    if outcome != EditOutcome::Committed {
        bail!("Moving block {} failed: {:?}", id, outcome);
    }

    let moved = editor
        .registry()
        .get(&id)
        .map(|b| b.rect)
        .context("Moved block vanished")?;
    tracing::info!("Moved block {} from {} to {}", id, rect, moved);
    println!("{} {} -> {}", id, rect, moved);

    write_png(&editor, out)
}

fn export(
    input: &Input,
    roads: Option<&Path>,
    polygon: Option<&Path>,
    out: &Path,
    payload: Option<(&Path, &str)>,
    scale: f32,
) -> anyhow::Result<()> {
    let mut editor = open(input)?;

    if let Some(roads) = roads {
        let roads = read_json(roads)?;
        let polygon = polygon.map(read_json).transpose()?;
        editor.set_overlay(&roads, polygon.as_ref());
    } else if polygon.is_some() {
        tracing::warn!("--polygon has no effect without --roads");
    }

    write_png(&editor, out)?;

    if let Some((path, target_id)) = payload {
        let payload: SavePayload = editor.save_payload(target_id, scale)?;
        std::fs::write(path, payload.to_json()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn write_png(editor: &Editor, out: &Path) -> anyhow::Result<()> {
    let exported = editor.export()?;
    std::fs::write(out, &exported.png)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    tracing::info!(
        "Wrote {}x{} PNG to {}",
        exported.width,
        exported.height,
        out.display()
    );
    Ok(())
}
