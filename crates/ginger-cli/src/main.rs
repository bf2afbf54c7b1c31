//! ginger CLI - conflict-pattern analysis and session highlights

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ginger_core::models::{HighlightFocus, Message, SessionRecording};
use ginger_core::video::{self, VideoFormat, VideoSettings, VideoStyle};
use ginger_core::{Config, ConflictAnalyzer, Lexicon, highlights};

mod pretty;

#[derive(Debug, Parser)]
#[command(
    name = "ginger",
    author,
    version,
    about = "Transcript analysis and role-play session highlights",
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a transcript for conflict patterns
    Analyze {
        /// JSON file containing an array of messages
        file: PathBuf,

        /// Contact the transcript belongs to
        #[arg(long)]
        contact: String,

        /// Description of the time period
        #[arg(long, default_value = "recent")]
        timeframe: String,

        /// Only analyze messages mentioning this topic
        #[arg(long)]
        topic: Option<String>,

        /// Drop messages before this time (e.g. "2026-01-01", "last week")
        #[arg(long)]
        since: Option<String>,

        /// Drop messages after this time
        #[arg(long)]
        until: Option<String>,

        /// Emit raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Summarize overall relationship health
    Summary {
        /// JSON file containing an array of messages
        file: PathBuf,

        /// Contact the transcript belongs to
        #[arg(long)]
        contact: String,

        /// Emit raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Extract highlight moments from a recorded session
    Highlights {
        /// JSON file containing a session recording
        file: PathBuf,

        /// Number of highlights to keep
        #[arg(short, long)]
        count: Option<usize>,

        /// Focus: all, breakthroughs, boundaries, emotional
        #[arg(long, default_value = "all")]
        focus: String,

        /// Emit raw JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Emit a render descriptor and ffmpeg script for a session
    Render {
        /// JSON file containing a session recording
        file: PathBuf,

        /// Target format: tiktok, reels, shorts, square, landscape
        #[arg(long, default_value = "tiktok")]
        format: String,

        /// Visual style: minimalist, emotional, documentary, energetic, therapeutic
        #[arg(long, default_value = "emotional")]
        style: String,

        /// Title overlay for the opening card
        #[arg(long)]
        title: Option<String>,

        /// Skip burned-in captions
        #[arg(long)]
        no_captions: bool,

        /// Output directory (defaults to the configured one)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Dump the active lexicon tables as TOML
    Lexicon {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    // Load config and rule tables
    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::ensure_at(&config_path)?;
    let lexicon = config.load_lexicon()?;

    match cli.command {
        Command::Analyze {
            file,
            contact,
            timeframe,
            topic,
            since,
            until,
            json,
        } => cmd_analyze(
            &lexicon, &file, &contact, &timeframe, topic, since, until, json,
        ),
        Command::Summary {
            file,
            contact,
            json,
        } => cmd_summary(&lexicon, &file, &contact, json),
        Command::Highlights {
            file,
            count,
            focus,
            json,
        } => cmd_highlights(
            &lexicon,
            &file,
            count.unwrap_or(config.highlight_count),
            &focus,
            json,
        ),
        Command::Render {
            file,
            format,
            style,
            title,
            no_captions,
            out,
        } => cmd_render(
            &config,
            &lexicon,
            &file,
            &format,
            &style,
            title.as_deref(),
            no_captions,
            out,
        ),
        Command::Lexicon { out } => cmd_lexicon(&lexicon, out),
    }
}

#[expect(clippy::too_many_arguments)]
fn cmd_analyze(
    lexicon: &Lexicon,
    file: &Path,
    contact: &str,
    timeframe: &str,
    topic: Option<String>,
    since: Option<String>,
    until: Option<String>,
    json: bool,
) -> Result<()> {
    let mut messages = load_messages(file)?;
    let since = parse_time_flag(since.as_deref())?;
    let until = parse_time_flag(until.as_deref())?;
    if since.is_some() || until.is_some() {
        messages.retain(|msg| within_window(msg, since, until));
    }

    let analyzer = ConflictAnalyzer::new(lexicon);
    let analysis = analyzer.analyze(&messages, contact, timeframe, topic.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        pretty::print_analysis(&analysis);
    }
    Ok(())
}

fn cmd_summary(lexicon: &Lexicon, file: &Path, contact: &str, json: bool) -> Result<()> {
    let messages = load_messages(file)?;
    let analyzer = ConflictAnalyzer::new(lexicon);
    let summary = analyzer.relationship_summary(&messages, contact);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        pretty::print_summary(&summary);
    }
    Ok(())
}

fn cmd_highlights(
    lexicon: &Lexicon,
    file: &Path,
    count: usize,
    focus: &str,
    json: bool,
) -> Result<()> {
    let recording = load_recording(file)?;
    let focus = HighlightFocus::parse(focus);
    let ranked = highlights::extract(&recording, lexicon, count, focus);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else {
        pretty::print_highlights(&ranked);
    }
    Ok(())
}

#[expect(clippy::too_many_arguments)]
fn cmd_render(
    config: &Config,
    lexicon: &Lexicon,
    file: &Path,
    format: &str,
    style: &str,
    title: Option<&str>,
    no_captions: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let mut recording = load_recording(file)?;
    if recording.highlights.is_empty() {
        recording.highlights = highlights::extract(
            &recording,
            lexicon,
            config.highlight_count,
            HighlightFocus::All,
        );
    }

    let settings = VideoSettings {
        format: VideoFormat::parse(format),
        style: VideoStyle::parse(style),
        include_captions: !no_captions,
        ..VideoSettings::default()
    };
    let descriptor = video::build_descriptor(&recording, &settings, title);

    let output_dir = out.unwrap_or_else(|| config.output_dir.clone());
    let descriptor_path = video::write_descriptor(&descriptor, &output_dir)?;
    let script_path = video::write_render_script(&descriptor, &output_dir)?;

    println!("Descriptor: {}", descriptor_path.display());
    println!("Script:     {}", script_path.display());
    println!(
        "Highlights: {} ({} overlays)",
        descriptor.highlights.len(),
        descriptor.overlays.len()
    );
    Ok(())
}

fn cmd_lexicon(lexicon: &Lexicon, out: Option<PathBuf>) -> Result<()> {
    match out {
        Some(path) => {
            lexicon.save_to_path(&path)?;
            println!("Lexicon written to {}", path.display());
        }
        None => print!("{}", toml::to_string_pretty(lexicon)?),
    }
    Ok(())
}

fn load_messages(path: &Path) -> Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn load_recording(path: &Path) -> Result<SessionRecording> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn parse_time_flag(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw {
        Some(value) => dateparser::parse(value)
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Could not parse time {value:?}: {e}")),
        None => Ok(None),
    }
}

/// Messages without a parseable timestamp stay in: degraded input narrows
/// nothing rather than erroring.
fn within_window(
    msg: &Message,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> bool {
    let Some(at) = msg.parsed_timestamp() else {
        return true;
    };
    if since.is_some_and(|bound| at < bound) {
        return false;
    }
    if until.is_some_and(|bound| at > bound) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(timestamp: &str) -> Message {
        Message {
            text: "hi".to_string(),
            is_from_me: false,
            timestamp: Some(timestamp.to_string()),
            sender: None,
        }
    }

    #[test]
    fn window_filters_by_bounds() {
        let msg = stamped("2026-03-01T12:00:00Z");
        let early = dateparser::parse("2026-01-01").ok();
        let late = dateparser::parse("2026-06-01").ok();
        assert!(within_window(&msg, early, late));
        assert!(!within_window(&msg, late, None));
        assert!(!within_window(&msg, None, early));
    }

    #[test]
    fn window_keeps_unstamped_messages() {
        let msg = Message {
            text: "hi".to_string(),
            is_from_me: false,
            timestamp: None,
            sender: None,
        };
        let bound = dateparser::parse("2026-01-01").ok();
        assert!(within_window(&msg, bound, bound));
    }
}
