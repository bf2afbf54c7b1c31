//! MCP server exposing Ginger's transcript analysis and session tools.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser};
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
    transport::io::stdio,
};
use serde::Serialize;

use ginger_core::models::{CoachingScore, HighlightFocus, Message};
use ginger_core::video::{self, VideoFormat, VideoSettings, VideoStyle};
use ginger_core::{Config, ConflictAnalyzer, SessionRegistry};

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .common
        .config
        .unwrap_or_else(Config::default_config_path);
    let config = Config::ensure_at(&config_path)?;
    let lexicon = config.load_lexicon()?;

    let server = McpServer::new(config, &lexicon);
    let transport = stdio();

    server
        .serve(transport)
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;

    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about = "MCP server for ginger - conflict analysis and session highlights")]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct MessageArg {
    #[schemars(description = "The message text")]
    text: String,
    #[serde(default)]
    #[schemars(description = "Whether the user (not the contact) sent this message")]
    is_from_me: bool,
    #[serde(default)]
    #[schemars(description = "ISO-8601 timestamp of the message")]
    timestamp: Option<String>,
    #[serde(default)]
    sender: Option<String>,
}

impl From<MessageArg> for Message {
    fn from(arg: MessageArg) -> Self {
        Message {
            text: arg.text,
            is_from_me: arg.is_from_me,
            timestamp: arg.timestamp,
            sender: arg.sender,
        }
    }
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CoachingScoreArg {
    #[serde(default)]
    boundary_clarity: Option<f64>,
    #[serde(default)]
    assertiveness: Option<f64>,
    #[serde(default)]
    de_escalation: Option<f64>,
}

impl From<CoachingScoreArg> for CoachingScore {
    fn from(arg: CoachingScoreArg) -> Self {
        CoachingScore {
            boundary_clarity: arg.boundary_clarity,
            assertiveness: arg.assertiveness,
            de_escalation: arg.de_escalation,
            ..CoachingScore::default()
        }
    }
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct AnalyzeConflictRequest {
    #[schemars(description = "Messages to analyze, in chronological order")]
    messages: Vec<MessageArg>,
    #[schemars(description = "Contact name or identifier")]
    contact: String,
    #[serde(default)]
    #[schemars(description = "Description of the time period (defaults to 'recent')")]
    timeframe: Option<String>,
    #[serde(default)]
    #[schemars(description = "Optional topic to focus the analysis on")]
    topic: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct RelationshipSummaryRequest {
    messages: Vec<MessageArg>,
    contact: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct StartRecordingRequest {
    #[schemars(description = "Name for this recording session")]
    session_name: String,
    #[schemars(description = "The contact being role-played")]
    contact: String,
    #[schemars(description = "The scenario description")]
    scenario: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct AddExchangeRequest {
    session_id: String,
    #[schemars(description = "Who spoke: 'user', 'coach', or the contact name")]
    speaker: String,
    text: String,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    coaching_score: Option<CoachingScoreArg>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct StopRecordingRequest {
    session_id: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ExtractHighlightsRequest {
    session_id: String,
    #[serde(default)]
    #[schemars(description = "Number of highlights to extract (default 5)")]
    count: Option<usize>,
    #[serde(default)]
    #[schemars(description = "Focus: all, breakthroughs, boundaries, or emotional")]
    focus: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct GenerateVideoRequest {
    session_id: String,
    #[serde(default)]
    #[schemars(description = "Target format: tiktok, reels, shorts, square, or landscape")]
    format: Option<String>,
    #[serde(default)]
    #[schemars(description = "Visual style: minimalist, emotional, documentary, energetic, or therapeutic")]
    style: Option<String>,
    #[serde(default)]
    #[schemars(description = "Whether to burn in captions (default true)")]
    include_captions: Option<bool>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Clone)]
struct McpServer {
    config: Config,
    analyzer: ConflictAnalyzer,
    registry: Arc<SessionRegistry>,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    fn new(config: Config, lexicon: &ginger_core::Lexicon) -> Self {
        Self {
            config,
            analyzer: ConflictAnalyzer::new(lexicon),
            registry: Arc::new(SessionRegistry::new(lexicon.clone())),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl McpServer {
    /// Analyze a message transcript for conflict patterns
    #[tool(
        description = "Analyze messages with a contact for conflict patterns, communication style, escalation points, and coaching recommendations"
    )]
    async fn analyze_conflict_pattern(
        &self,
        Parameters(req): Parameters<AnalyzeConflictRequest>,
    ) -> String {
        tokio::task::yield_now().await;
        let messages: Vec<Message> = req.messages.into_iter().map(Message::from).collect();
        let timeframe = req.timeframe.unwrap_or_else(|| "recent".to_string());
        let analysis =
            self.analyzer
                .analyze(&messages, &req.contact, &timeframe, req.topic.as_deref());
        to_json(&analysis)
    }

    /// Summarize overall relationship health
    #[tool(
        description = "Summarize the overall health of a relationship from its message history"
    )]
    async fn get_relationship_summary(
        &self,
        Parameters(req): Parameters<RelationshipSummaryRequest>,
    ) -> String {
        tokio::task::yield_now().await;
        let messages: Vec<Message> = req.messages.into_iter().map(Message::from).collect();
        let summary = self.analyzer.relationship_summary(&messages, &req.contact);
        to_json(&summary)
    }

    /// Start recording a role-play session
    #[tool(description = "Start recording a new role-play practice session")]
    async fn start_recording(&self, Parameters(req): Parameters<StartRecordingRequest>) -> String {
        tokio::task::yield_now().await;
        let started =
            self.registry
                .start_recording(&req.session_name, &req.contact, &req.scenario);
        with_status("recording", &started)
    }

    /// Append an exchange to an active recording
    #[tool(
        description = "Add a spoken exchange (and optional coaching score) to an active recording"
    )]
    async fn add_exchange(&self, Parameters(req): Parameters<AddExchangeRequest>) -> String {
        tokio::task::yield_now().await;
        match self.registry.add_exchange(
            &req.session_id,
            &req.speaker,
            &req.text,
            req.emotion,
            req.coaching_score.map(CoachingScore::from),
        ) {
            Ok(added) => with_status("added", &added),
            Err(err) => error_json(&err),
        }
    }

    /// Stop an active recording
    #[tool(description = "Stop an active recording and move it to the completed set")]
    async fn stop_recording(&self, Parameters(req): Parameters<StopRecordingRequest>) -> String {
        tokio::task::yield_now().await;
        match self.registry.stop_recording(&req.session_id) {
            Ok(stopped) => with_status("stopped", &stopped),
            Err(err) => error_json(&err),
        }
    }

    /// Extract highlight moments from a session
    #[tool(
        description = "Extract the most noteworthy moments from a recorded session, ranked by impact"
    )]
    async fn extract_highlights(
        &self,
        Parameters(req): Parameters<ExtractHighlightsRequest>,
    ) -> String {
        tokio::task::yield_now().await;
        let count = req.count.unwrap_or(self.config.highlight_count);
        let focus = req
            .focus
            .as_deref()
            .map_or(HighlightFocus::All, HighlightFocus::parse);
        match self.registry.extract_highlights(&req.session_id, count, focus) {
            Ok(report) => with_status("success", &report),
            Err(err) => error_json(&err),
        }
    }

    /// Emit a render descriptor for a completed session
    #[tool(
        description = "Package a completed session's highlights into a render descriptor and ffmpeg script for the video compositor"
    )]
    async fn generate_video(&self, Parameters(req): Parameters<GenerateVideoRequest>) -> String {
        tokio::task::yield_now().await;
        let settings = VideoSettings {
            format: req.format.as_deref().map_or_else(VideoFormat::default, VideoFormat::parse),
            style: req.style.as_deref().map_or_else(VideoStyle::default, VideoStyle::parse),
            include_captions: req.include_captions.unwrap_or(true),
            ..VideoSettings::default()
        };
        let descriptor =
            match self
                .registry
                .generate_video(&req.session_id, &settings, req.title.as_deref())
            {
                Ok(descriptor) => descriptor,
                Err(err) => return error_json(&err),
            };

        let descriptor_path = match video::write_descriptor(&descriptor, &self.config.output_dir) {
            Ok(path) => path,
            Err(err) => return error_json(&err),
        };
        let script_path = match video::write_render_script(&descriptor, &self.config.output_dir) {
            Ok(path) => path,
            Err(err) => return error_json(&err),
        };

        to_json(&serde_json::json!({
            "status": "success",
            "session_id": descriptor.session_id,
            "video_path": self.config.output_dir.join(&descriptor.output_name),
            "descriptor_path": descriptor_path,
            "script_path": script_path,
            "format": descriptor.format,
            "style": descriptor.style,
            "duration_seconds": descriptor.duration_target,
            "highlights_included": descriptor.highlights.len(),
            "has_captions": descriptor.captions_enabled,
        }))
    }

    /// List all recordings
    #[tool(description = "List all recordings, active and completed")]
    async fn list_recordings(&self) -> String {
        tokio::task::yield_now().await;
        to_json(&self.registry.list())
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "MCP server for ginger - conflict-pattern analysis and role-play session highlights"
                    .to_string(),
            ),
            ..Default::default()
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Tag a success payload with a status field, matching the shape clients of
/// the original tool surface expect.
fn with_status<T: Serialize>(status: &str, value: &T) -> String {
    let mut value = serde_json::to_value(value).unwrap_or_else(|_| serde_json::json!({}));
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "status".to_string(),
            serde_json::Value::String(status.to_string()),
        );
    }
    to_json(&value)
}

/// Domain failures surface as data, never as protocol errors.
fn error_json(err: &ginger_core::Error) -> String {
    to_json(&serde_json::json!({
        "status": "error",
        "message": err.to_string(),
    }))
}
