use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use storyboard::config::parse_resolution;
use storyboard::player::PlaybackReport;
use storyboard::renderer::{FrameFormat, VideoEncoder};
use storyboard::templates::TemplateSample;
use storyboard::{
    AppConfig, ExtractedDocument, FrameStage, RecordingStage, TemplateContext, TemplateKind,
    TimelineParser, TimelinePlayer,
};

#[derive(Parser)]
#[command(name = "storyboard")]
#[command(about = "Plays JSON timelines of animated explainer scenes", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract plain text from documents (txt, md, html)
    Ingest {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dry-run a timeline and print the stage calls it produces
    Plan {
        #[arg(value_name = "TIMELINE")]
        timeline: Option<PathBuf>,
    },
    /// Render a timeline to frames, optionally encoding a video
    Render {
        #[arg(value_name = "TIMELINE")]
        timeline: Option<PathBuf>,

        /// Frame output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        fps: Option<u32>,

        /// WIDTHxHEIGHT, e.g. 1280x720
        #[arg(long)]
        resolution: Option<String>,

        #[arg(long, value_enum)]
        format: Option<FrameFormat>,

        /// Encode the frames with FFmpeg once rendering completes
        #[arg(long)]
        encode: bool,
    },
    /// Print a sample timeline entry for a template
    Template {
        #[arg(value_enum)]
        #[arg(name = "type")]
        template_type: TemplateKind,

        /// Entry duration in seconds
        #[arg(short, long, default_value_t = 5.0)]
        duration: f64,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    match cli.command {
        Some(Commands::Ingest { files, json }) => ingest(&files, json),
        Some(Commands::Plan { timeline }) => plan(&config, timeline),
        Some(Commands::Render {
            timeline,
            output,
            fps,
            resolution,
            format,
            encode,
        }) => {
            let mut config = config;
            if let Some(output) = output {
                config.render.output_dir = output;
            }
            if let Some(fps) = fps {
                config.video.fps = fps;
            }
            if let Some(resolution) = resolution {
                config.video.resolution = resolution;
            }
            if let Some(format) = format {
                config.render.frame_format = format;
            }
            config.render.encode |= encode;
            render(&config, timeline)
        }
        Some(Commands::Template {
            template_type,
            duration,
        }) => {
            let entry = TemplateSample::generate(template_type, duration);
            println!("{}", serde_json::to_string_pretty(&entry)?);
            Ok(())
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        None => plan(&config, None),
    }
}

fn ingest(files: &[PathBuf], json: bool) -> Result<()> {
    let results: Vec<_> = files
        .par_iter()
        .map(|path| (path, ExtractedDocument::ingest(path)))
        .collect();

    let mut failed = 0;
    let mut documents = Vec::new();
    for (path, result) in results {
        match result {
            Ok(document) => documents.push((path, document)),
            Err(e) => {
                eprintln!("✗ {}: {}", path.display(), e);
                failed += 1;
            }
        }
    }

    if json {
        let values: Vec<_> = documents
            .iter()
            .map(|(path, document)| {
                serde_json::json!({
                    "path": path,
                    "text": document.text(),
                    "element_count": document.element_count(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else {
        for (path, document) in &documents {
            println!(
                "📄 {} ({} elements, {} chars)",
                path.display(),
                document.element_count(),
                document.text().chars().count()
            );
            println!("{}\n", document.text());
        }
    }

    if failed > 0 {
        bail!("{} of {} files could not be ingested", failed, files.len());
    }
    Ok(())
}

fn resolve_timeline(config: &AppConfig, timeline: Option<PathBuf>) -> PathBuf {
    timeline
        .or_else(|| config.timeline.default_path.clone())
        .unwrap_or_else(TimelineParser::default_path)
}

/// Relative image paths resolve against the configured root, or the timeline's directory
fn template_context(config: &AppConfig, timeline: &Path) -> TemplateContext {
    match &config.assets.base_path {
        Some(base) => TemplateContext::new(base),
        None => TemplateContext::new(timeline.parent().unwrap_or_else(|| Path::new("."))),
    }
}

fn print_report(report: &PlaybackReport) {
    println!("\n📊 Playback:");
    println!("  Rendered: {}", report.rendered);
    println!("  Skipped:  {}", report.skipped.len());
    for skipped in &report.skipped {
        println!(
            "    #{} {}",
            skipped.index,
            serde_json::to_string(&skipped.reason).unwrap_or_default()
        );
    }
}

fn plan(config: &AppConfig, timeline: Option<PathBuf>) -> Result<()> {
    let path = resolve_timeline(config, timeline);
    let entries = TimelineParser::parse_json(&path)?;

    println!("📋 Timeline: {}", path.display());
    print!("{}", TimelineParser::summarize(&entries));

    let mut stage = RecordingStage::new();
    let report = TimelinePlayer::new(template_context(config, &path)).play(&entries, &mut stage)?;

    println!("\n🎬 Stage calls:");
    println!("{}", serde_json::to_string_pretty(stage.calls())?);
    println!("\n⏱  Total stage time: {:.2}s", stage.total_time());
    print_report(&report);
    Ok(())
}

fn render(config: &AppConfig, timeline: Option<PathBuf>) -> Result<()> {
    let path = resolve_timeline(config, timeline);
    let entries = TimelineParser::parse_json(&path)?;
    let dimensions = parse_resolution(&config.video.resolution)?;
    let background = config.video.background_rgba()?;

    println!("📋 Timeline: {}", path.display());
    print!("{}", TimelineParser::summarize(&entries));

    let output_dir = &config.render.output_dir;
    let mut stage = FrameStage::new(
        output_dir,
        dimensions,
        config.video.fps,
        background,
        config.render.frame_format,
    )?;

    info!(
        "Rendering {}x{} @ {} fps into {}",
        dimensions.0,
        dimensions.1,
        config.video.fps,
        output_dir.display()
    );
    let report = TimelinePlayer::new(template_context(config, &path)).play(&entries, &mut stage)?;

    println!(
        "\n✅ Wrote {} frames to {}",
        stage.frames_written(),
        output_dir.display()
    );
    print_report(&report);

    if config.render.encode {
        if stage.frames_written() == 0 {
            bail!("Nothing to encode: no frames were rendered");
        }
        VideoEncoder::new(stage.fps(), stage.dimensions())
            .encode(&stage.frame_pattern(), &config.render.video_path)?;
        println!("🎥 Video created: {}", config.render.video_path.display());
    }

    Ok(())
}
