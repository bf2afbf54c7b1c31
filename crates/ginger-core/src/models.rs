//! Domain models for transcript analysis and session recording.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A transcript message from any provider, normalized to a common format.
///
/// Ordering by timestamp is assumed but not re-verified; callers must supply
/// messages chronologically for escalation detection to be meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    #[serde(default)]
    pub is_from_me: bool,
    /// ISO-8601 timestamp as delivered by the message source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

impl Message {
    /// The timestamp as delivered, if it parses as ISO-8601.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_iso_timestamp)
    }

    /// Parse the timestamp, substituting the current time when the field is
    /// missing or malformed (degrade, never error).
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.parsed_timestamp().unwrap_or_else(Utc::now)
    }
}

/// Parse an ISO-8601 timestamp with or without an offset.
pub(crate) fn parse_iso_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Truncate to at most `max_chars` characters, safe on multi-byte input.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Communication-style archetypes for difficult counterparts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PersonaStyle {
    GuiltTripping,
    Dismissive,
    Volatile,
    PassiveAggressive,
    Controlling,
    Victim,
}

impl PersonaStyle {
    /// All styles in enumeration order; ties between equal scores resolve to
    /// the earlier entry.
    pub const ALL: [PersonaStyle; 6] = [
        PersonaStyle::GuiltTripping,
        PersonaStyle::Dismissive,
        PersonaStyle::Volatile,
        PersonaStyle::PassiveAggressive,
        PersonaStyle::Controlling,
        PersonaStyle::Victim,
    ];
}

impl std::fmt::Display for PersonaStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersonaStyle::GuiltTripping => write!(f, "guilt-tripping"),
            PersonaStyle::Dismissive => write!(f, "dismissive"),
            PersonaStyle::Volatile => write!(f, "volatile"),
            PersonaStyle::PassiveAggressive => write!(f, "passive-aggressive"),
            PersonaStyle::Controlling => write!(f, "controlling"),
            PersonaStyle::Victim => write!(f, "victim"),
        }
    }
}

/// Recurring conflict themes in relationships.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConflictTheme {
    Control,
    Boundaries,
    Guilt,
    Money,
    Time,
    Respect,
    Independence,
    Expectations,
    Communication,
    Trust,
}

impl ConflictTheme {
    /// All themes in enumeration order.
    pub const ALL: [ConflictTheme; 10] = [
        ConflictTheme::Control,
        ConflictTheme::Boundaries,
        ConflictTheme::Guilt,
        ConflictTheme::Money,
        ConflictTheme::Time,
        ConflictTheme::Respect,
        ConflictTheme::Independence,
        ConflictTheme::Expectations,
        ConflictTheme::Communication,
        ConflictTheme::Trust,
    ];
}

impl std::fmt::Display for ConflictTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictTheme::Control => write!(f, "control"),
            ConflictTheme::Boundaries => write!(f, "boundaries"),
            ConflictTheme::Guilt => write!(f, "guilt"),
            ConflictTheme::Money => write!(f, "money"),
            ConflictTheme::Time => write!(f, "time"),
            ConflictTheme::Respect => write!(f, "respect"),
            ConflictTheme::Independence => write!(f, "independence"),
            ConflictTheme::Expectations => write!(f, "expectations"),
            ConflictTheme::Communication => write!(f, "communication"),
            ConflictTheme::Trust => write!(f, "trust"),
        }
    }
}

/// A recurring conflict theme detected in a conversation.
///
/// Derived and read-only; recomputed fully on every analysis call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictPattern {
    pub theme: ConflictTheme,
    pub frequency: usize,
    /// 0-1, saturating once the theme reaches 10% message density.
    pub severity: f64,
    pub example_messages: Vec<String>,
    pub triggers: Vec<String>,
}

/// Analysis of a counterpart's communication style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicationStyle {
    pub primary_style: PersonaStyle,
    pub secondary_styles: Vec<PersonaStyle>,
    /// 0-1 share of matches belonging to the primary style. A heuristic,
    /// not a probability: 0.3 floor when nothing matched at all.
    pub confidence: f64,
    pub indicators: Vec<String>,
}

/// How a conversation escalated at a given point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationType {
    Threat,
    Volatile,
}

impl std::fmt::Display for EscalationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationType::Threat => write!(f, "threat"),
            EscalationType::Volatile => write!(f, "volatile"),
        }
    }
}

/// A transcript position where the conversation escalated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationPoint {
    pub timestamp: DateTime<Utc>,
    /// The immediately preceding message, empty if the escalation opened
    /// the conversation. At most 200 characters.
    pub trigger_message: String,
    /// At most 200 characters.
    pub response_message: String,
    pub escalation_type: EscalationType,
}

/// Complete conflict analysis for one contact/timeframe query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictAnalysis {
    pub contact: String,
    pub timeframe: String,
    pub message_count: usize,
    pub conflict_patterns: Vec<ConflictPattern>,
    pub communication_style: CommunicationStyle,
    pub escalation_points: Vec<EscalationPoint>,
    /// Deduplicated escalation trigger prefixes, sorted for determinism.
    pub key_triggers: Vec<String>,
    pub recommendations: Vec<String>,
}

/// How often conflict shows up across a message history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictFrequency {
    Rare,
    Occasional,
    Frequent,
    Constant,
    Unknown,
}

impl std::fmt::Display for ConflictFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictFrequency::Rare => write!(f, "rare"),
            ConflictFrequency::Occasional => write!(f, "occasional"),
            ConflictFrequency::Frequent => write!(f, "frequent"),
            ConflictFrequency::Constant => write!(f, "constant"),
            ConflictFrequency::Unknown => write!(f, "unknown"),
        }
    }
}

/// Overall tone of a relationship's message history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationHealth {
    Healthy,
    Strained,
    Toxic,
    Unknown,
}

impl std::fmt::Display for CommunicationHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommunicationHealth::Healthy => write!(f, "healthy"),
            CommunicationHealth::Strained => write!(f, "strained"),
            CommunicationHealth::Toxic => write!(f, "toxic"),
            CommunicationHealth::Unknown => write!(f, "unknown"),
        }
    }
}

/// Overall relationship health summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSummary {
    pub contact: String,
    pub total_messages: usize,
    /// 0-1 ratio of positive to sentiment-bearing messages.
    pub positive_ratio: f64,
    pub conflict_frequency: ConflictFrequency,
    pub dominant_themes: Vec<ConflictTheme>,
    pub communication_health: CommunicationHealth,
    pub suggested_approaches: Vec<String>,
}

/// A single spoken exchange within a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    /// Seconds since the recording started.
    pub timestamp: f64,
    /// "user", "coach", or the role-played contact's name.
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

/// Coaching score attached to a moment of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoachingScore {
    /// Seconds since the recording started.
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary_clarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertiveness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de_escalation: Option<f64>,
    /// Any further numeric dimensions the coach reported.
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl CoachingScore {
    /// Mean of the three coached dimensions. Missing dimensions count as
    /// zero; the divisor stays fixed at 3.
    pub fn core_dimension_mean(&self) -> f64 {
        (self.boundary_clarity.unwrap_or(0.0)
            + self.assertiveness.unwrap_or(0.0)
            + self.de_escalation.unwrap_or(0.0))
            / 3.0
    }
}

/// What kind of moment a highlight captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightCategory {
    Breakthrough,
    Boundary,
    Emotional,
    Learning,
    #[default]
    General,
}

impl std::fmt::Display for HighlightCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighlightCategory::Breakthrough => write!(f, "breakthrough"),
            HighlightCategory::Boundary => write!(f, "boundary"),
            HighlightCategory::Emotional => write!(f, "emotional"),
            HighlightCategory::Learning => write!(f, "learning"),
            HighlightCategory::General => write!(f, "general"),
        }
    }
}

/// A scored, time-bounded excerpt of a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Highlight {
    pub timestamp_start: f64,
    pub timestamp_end: f64,
    pub text: String,
    pub speaker: String,
    pub emotion: String,
    /// 0-1, clamped.
    pub impact_score: f64,
    pub category: HighlightCategory,
}

/// Which moments `extract_highlights` should keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightFocus {
    #[default]
    All,
    Breakthroughs,
    Boundaries,
    Emotional,
}

impl HighlightFocus {
    /// Parse from a request string, falling back to `All` for unknown values.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakthroughs" => HighlightFocus::Breakthroughs,
            "boundaries" => HighlightFocus::Boundaries,
            "emotional" => HighlightFocus::Emotional,
            _ => HighlightFocus::All,
        }
    }

    /// Whether a highlight of this category survives the focus filter.
    /// No focus maps to `learning` or `general`, so those categories only
    /// ever surface under `All`.
    pub fn admits(self, category: HighlightCategory) -> bool {
        match self {
            HighlightFocus::All => true,
            HighlightFocus::Breakthroughs => category == HighlightCategory::Breakthrough,
            HighlightFocus::Boundaries => category == HighlightCategory::Boundary,
            HighlightFocus::Emotional => category == HighlightCategory::Emotional,
        }
    }
}

impl std::fmt::Display for HighlightFocus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HighlightFocus::All => write!(f, "all"),
            HighlightFocus::Breakthroughs => write!(f, "breakthroughs"),
            HighlightFocus::Boundaries => write!(f, "boundaries"),
            HighlightFocus::Emotional => write!(f, "emotional"),
        }
    }
}

/// A recorded role-play session.
///
/// Created by `start_recording`, mutated while active, frozen on stop
/// except for `highlights`, which is populated lazily.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecording {
    pub session_id: String,
    pub contact: String,
    pub scenario: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub coaching_scores: Vec<CoachingScore>,
    #[serde(default)]
    pub highlights: Vec<Highlight>,
}

impl SessionRecording {
    /// Create an empty recording starting now.
    pub fn new(session_id: &str, contact: &str, scenario: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            contact: contact.to_string(),
            scenario: scenario.to_string(),
            start_time: Utc::now(),
            end_time: None,
            exchanges: Vec::new(),
            coaching_scores: Vec::new(),
            highlights: Vec::new(),
        }
    }

    /// Total recorded duration, available once the session is stopped.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.end_time
            .map(|end| millis_to_secs((end - self.start_time).num_milliseconds()))
    }
}

/// Recording lifecycle state as surfaced in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Recording,
    Completed,
}

impl std::fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordingStatus::Recording => write!(f, "recording"),
            RecordingStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One row of the recording registry listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub session_id: String,
    pub status: RecordingStatus,
    pub contact: String,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub exchanges: usize,
    pub highlights: usize,
}

#[expect(clippy::cast_precision_loss)]
pub(crate) fn millis_to_secs(millis: i64) -> f64 {
    millis as f64 / 1000.0
}

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;
