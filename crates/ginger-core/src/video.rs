//! Render-descriptor generation for session summary videos.
//!
//! The core renders nothing itself. It packages a completed session's
//! highlights into a descriptor an external compositor consumes, and can
//! write that descriptor plus an ffmpeg script as the handoff artifacts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Exchange, Highlight, SessionRecording, truncate_chars};

/// Target platform formats with their fixed output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Tiktok,
    Reels,
    Shorts,
    Square,
    Landscape,
}

impl VideoFormat {
    /// Parse from a platform string; unknown values fall back to tiktok.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "reels" => VideoFormat::Reels,
            "shorts" => VideoFormat::Shorts,
            "square" => VideoFormat::Square,
            "landscape" => VideoFormat::Landscape,
            _ => VideoFormat::Tiktok,
        }
    }

    /// Output dimensions in pixels (width, height).
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            VideoFormat::Tiktok | VideoFormat::Reels | VideoFormat::Shorts => (1080, 1920),
            VideoFormat::Square => (1080, 1080),
            VideoFormat::Landscape => (1920, 1080),
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoFormat::Tiktok => write!(f, "tiktok"),
            VideoFormat::Reels => write!(f, "reels"),
            VideoFormat::Shorts => write!(f, "shorts"),
            VideoFormat::Square => write!(f, "square"),
            VideoFormat::Landscape => write!(f, "landscape"),
        }
    }
}

/// Visual styles, each mapped to a (background, text) color pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStyle {
    Minimalist,
    #[default]
    Emotional,
    Documentary,
    Energetic,
    Therapeutic,
}

impl VideoStyle {
    /// Parse from a style string; unknown values fall back to emotional.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimalist" => VideoStyle::Minimalist,
            "documentary" => VideoStyle::Documentary,
            "energetic" => VideoStyle::Energetic,
            "therapeutic" => VideoStyle::Therapeutic,
            _ => VideoStyle::Emotional,
        }
    }

    /// (background, text) colors the compositor should use.
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            VideoStyle::Minimalist => ("black", "white"),
            VideoStyle::Emotional => ("navy", "peachpuff"),
            VideoStyle::Documentary => ("gray", "white"),
            VideoStyle::Energetic => ("purple", "yellow"),
            VideoStyle::Therapeutic => ("teal", "lavender"),
        }
    }
}

impl std::fmt::Display for VideoStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoStyle::Minimalist => write!(f, "minimalist"),
            VideoStyle::Emotional => write!(f, "emotional"),
            VideoStyle::Documentary => write!(f, "documentary"),
            VideoStyle::Energetic => write!(f, "energetic"),
            VideoStyle::Therapeutic => write!(f, "therapeutic"),
        }
    }
}

/// Configuration for one render request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub format: VideoFormat,
    pub style: VideoStyle,
    pub duration_seconds: u32,
    pub include_captions: bool,
    pub include_music: bool,
    /// emotional, uplifting, dramatic, calm
    pub music_mood: String,
    pub font_style: String,
    /// warm, cool, monochrome, vibrant
    pub color_scheme: String,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            format: VideoFormat::default(),
            style: VideoStyle::default(),
            duration_seconds: 60,
            include_captions: true,
            include_music: true,
            music_mood: "emotional".to_string(),
            font_style: "modern".to_string(),
            color_scheme: "warm".to_string(),
        }
    }
}

/// Output dimensions in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A caption the compositor burns into the frame for one highlight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextOverlay {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
    pub text: String,
}

/// Everything an external compositor needs to render a session video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderDescriptor {
    pub session_id: String,
    pub contact: String,
    pub scenario: String,
    pub format: VideoFormat,
    pub style: VideoStyle,
    pub dimensions: Dimensions,
    pub duration_target: u32,
    pub captions_enabled: bool,
    pub title: String,
    pub background_color: String,
    pub text_color: String,
    pub overlays: Vec<TextOverlay>,
    pub highlights: Vec<Highlight>,
    pub exchanges: Vec<Exchange>,
    /// Content-addressed output file name: `{session_id}_{format}.mp4`.
    pub output_name: String,
}

/// Seconds each caption overlay stays on screen.
const OVERLAY_WINDOW_SECS: f64 = 5.0;
/// At most this many highlight overlays make it into the video.
const MAX_OVERLAYS: usize = 5;

/// Package a recording into a render descriptor.
pub fn build_descriptor(
    recording: &SessionRecording,
    settings: &VideoSettings,
    title: Option<&str>,
) -> RenderDescriptor {
    let (width, height) = settings.format.dimensions();
    let (background_color, text_color) = settings.style.palette();
    let duration = f64::from(settings.duration_seconds);

    let overlays = recording
        .highlights
        .iter()
        .take(MAX_OVERLAYS)
        .map(|highlight| {
            // Keep every overlay inside the target duration.
            let start = highlight
                .timestamp_start
                .min(duration - OVERLAY_WINDOW_SECS);
            TextOverlay {
                start,
                end: start + OVERLAY_WINDOW_SECS,
                speaker: highlight.speaker.clone(),
                text: truncate_chars(&highlight.text, 100),
            }
        })
        .collect();

    let title = title.map_or_else(
        || format!("Role-Play: {}", recording.scenario),
        str::to_string,
    );

    RenderDescriptor {
        session_id: recording.session_id.clone(),
        contact: recording.contact.clone(),
        scenario: recording.scenario.clone(),
        format: settings.format,
        style: settings.style,
        dimensions: Dimensions { width, height },
        duration_target: settings.duration_seconds,
        captions_enabled: settings.include_captions,
        title,
        background_color: background_color.to_string(),
        text_color: text_color.to_string(),
        overlays,
        highlights: recording.highlights.clone(),
        exchanges: recording.exchanges.clone(),
        output_name: format!("{}_{}.mp4", recording.session_id, settings.format),
    }
}

/// Write the descriptor JSON next to where the video will land.
pub fn write_descriptor(descriptor: &RenderDescriptor, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir
        .join(&descriptor.output_name)
        .with_extension("json");
    let json = serde_json::to_string_pretty(descriptor)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Write the ffmpeg script the external compositor runs to produce the
/// actual video file. Never executed here.
pub fn write_render_script(descriptor: &RenderDescriptor, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let script_path = output_dir
        .join(&descriptor.output_name)
        .with_extension("sh");
    let output_path = output_dir.join(&descriptor.output_name);

    let mut filters = vec![format!(
        "color=c={}:s={}x{}:d={}",
        descriptor.background_color,
        descriptor.dimensions.width,
        descriptor.dimensions.height,
        descriptor.duration_target
    )];
    for overlay in &descriptor.overlays {
        let text = escape_drawtext(&format!("{}: {}", overlay.speaker, overlay.text));
        filters.push(format!(
            "drawtext=text='{}':fontcolor={}:fontsize=48:x=(w-text_w)/2:y=h-200\
             :enable='between(t,{},{})'",
            text, descriptor.text_color, overlay.start, overlay.end
        ));
    }
    let title = escape_drawtext(&truncate_chars(&descriptor.title, 50));
    filters.push(format!(
        "drawtext=text='{}':fontcolor={}:fontsize=64:x=(w-text_w)/2:y=100\
         :enable='between(t,0,3)'",
        title, descriptor.text_color
    ));
    let filter_complex = filters.join(",");

    let script = format!(
        "#!/bin/bash\n\
         # Render script for session: {}\n\
         # Requires ffmpeg with libx264\n\
         \n\
         ffmpeg -y \\\n  \
         -filter_complex \"{}\" \\\n  \
         -t {} \\\n  \
         -c:v libx264 \\\n  \
         -pix_fmt yuv420p \\\n  \
         \"{}\"\n\
         \n\
         echo \"Video saved to: {}\"\n",
        descriptor.session_id,
        filter_complex,
        descriptor.duration_target,
        output_path.display(),
        output_path.display()
    );
    std::fs::write(&script_path, script)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(script_path)
}

fn escape_drawtext(text: &str) -> String {
    text.replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HighlightCategory;
    use chrono::Utc;

    fn recording() -> SessionRecording {
        SessionRecording {
            session_id: "rec_demo_20260101_100000".to_string(),
            contact: "Mom".to_string(),
            scenario: "declining the loan".to_string(),
            start_time: Utc::now(),
            end_time: Some(Utc::now()),
            exchanges: vec![Exchange {
                timestamp: 1.0,
                speaker: "user".to_string(),
                text: "I need to make my own decisions".to_string(),
                emotion: Some("calm".to_string()),
            }],
            coaching_scores: Vec::new(),
            highlights: vec![Highlight {
                timestamp_start: 1.0,
                timestamp_end: 6.0,
                text: "I need to make my own decisions".to_string(),
                speaker: "user".to_string(),
                emotion: "calm".to_string(),
                impact_score: 0.5,
                category: HighlightCategory::Boundary,
            }],
        }
    }

    #[test]
    fn format_dimensions() {
        assert_eq!(VideoFormat::Tiktok.dimensions(), (1080, 1920));
        assert_eq!(VideoFormat::Square.dimensions(), (1080, 1080));
        assert_eq!(VideoFormat::Landscape.dimensions(), (1920, 1080));
    }

    #[test]
    fn unknown_format_and_style_fall_back() {
        assert_eq!(VideoFormat::parse("betamax"), VideoFormat::Tiktok);
        assert_eq!(VideoStyle::parse("vaporwave"), VideoStyle::Emotional);
    }

    #[test]
    fn descriptor_carries_palette_and_output_name() {
        let settings = VideoSettings::default();
        let descriptor = build_descriptor(&recording(), &settings, None);
        assert_eq!(descriptor.background_color, "navy");
        assert_eq!(descriptor.text_color, "peachpuff");
        assert_eq!(
            descriptor.output_name,
            "rec_demo_20260101_100000_tiktok.mp4"
        );
        assert_eq!(descriptor.title, "Role-Play: declining the loan");
        assert_eq!(descriptor.overlays.len(), 1);
    }

    #[test]
    fn descriptor_json_roundtrip() {
        let descriptor = build_descriptor(&recording(), &VideoSettings::default(), Some("Demo"));
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(json.contains("\"format\":\"tiktok\""));
        assert!(json.contains("\"style\":\"emotional\""));
        let parsed: RenderDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.title, "Demo");
        assert_eq!(parsed.dimensions.width, 1080);
    }

    #[test]
    fn writes_descriptor_and_script() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = build_descriptor(&recording(), &VideoSettings::default(), None);
        let json_path = write_descriptor(&descriptor, dir.path()).unwrap();
        let script_path = write_render_script(&descriptor, dir.path()).unwrap();
        assert!(json_path.to_string_lossy().ends_with(".json"));
        let script = std::fs::read_to_string(script_path).unwrap();
        assert!(script.contains("ffmpeg -y"));
        assert!(script.contains("1080x1920"));
    }
}
