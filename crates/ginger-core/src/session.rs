//! In-memory registry of practice-session recordings.
//!
//! The registry is the explicit context object owned by the host process:
//! started sessions live in the active map and move to the completed map on
//! stop. Nothing is persisted; a restart loses the registry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Error;
use crate::error::Result;
use crate::highlights::{self, DEFAULT_HIGHLIGHT_COUNT};
use crate::lexicon::Lexicon;
use crate::models::{
    CoachingScore, Exchange, Highlight, HighlightFocus, RecordingStatus, RecordingSummary,
    SessionRecording, millis_to_secs,
};
use crate::video::{RenderDescriptor, VideoSettings, build_descriptor};

/// Registry of active and completed session recordings.
///
/// Safe for concurrent callers: the maps sit behind a single mutex, as the
/// operations are short and purely in-memory.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    lexicon: Lexicon,
    inner: Mutex<Registry>,
}

#[derive(Debug, Default)]
struct Registry {
    active: HashMap<String, SessionRecording>,
    completed: HashMap<String, SessionRecording>,
}

/// Returned by [`SessionRegistry::start_recording`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStarted {
    pub session_id: String,
    pub contact: String,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
}

/// Returned by [`SessionRegistry::add_exchange`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeAdded {
    pub session_id: String,
    pub exchange_number: usize,
    pub timestamp: f64,
}

/// Returned by [`SessionRegistry::stop_recording`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStopped {
    pub session_id: String,
    pub duration_seconds: f64,
    pub exchange_count: usize,
    pub highlight_count: usize,
}

/// Returned by [`SessionRegistry::extract_highlights`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightReport {
    pub session_id: String,
    pub highlight_count: usize,
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
}

impl SessionRegistry {
    /// Build a registry using the given rule tables for highlight scoring.
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            inner: Mutex::new(Registry::default()),
        }
    }

    /// The rule tables this registry scores highlights with.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Start a new recording.
    ///
    /// The id embeds the session name and a second-resolution UTC stamp;
    /// identical names within one second collide (known limitation).
    pub fn start_recording(
        &self,
        session_name: &str,
        contact: &str,
        scenario: &str,
    ) -> RecordingStarted {
        let session_id = format!(
            "rec_{}_{}",
            session_name,
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let recording = SessionRecording::new(&session_id, contact, scenario);
        let started_at = recording.start_time;
        self.lock().active.insert(session_id.clone(), recording);
        info!("started recording session: {session_id}");
        RecordingStarted {
            session_id,
            contact: contact.to_string(),
            scenario: scenario.to_string(),
            started_at,
        }
    }

    /// Append an exchange (and optionally a coaching score tagged with the
    /// same relative timestamp) to an active recording.
    pub fn add_exchange(
        &self,
        session_id: &str,
        speaker: &str,
        text: &str,
        emotion: Option<String>,
        coaching_score: Option<CoachingScore>,
    ) -> Result<ExchangeAdded> {
        let mut inner = self.lock();
        let recording = inner
            .active
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound(format!("No active recording: {session_id}")))?;
        let timestamp = millis_to_secs((Utc::now() - recording.start_time).num_milliseconds());
        recording.exchanges.push(Exchange {
            timestamp,
            speaker: speaker.to_string(),
            text: text.to_string(),
            emotion,
        });
        if let Some(mut score) = coaching_score {
            score.timestamp = timestamp;
            recording.coaching_scores.push(score);
        }
        Ok(ExchangeAdded {
            session_id: session_id.to_string(),
            exchange_number: recording.exchanges.len(),
            timestamp,
        })
    }

    /// Stop an active recording, stamping its end time and moving it to
    /// the completed set. Completed recordings are immutable except for
    /// lazily populated highlights.
    pub fn stop_recording(&self, session_id: &str) -> Result<RecordingStopped> {
        let mut inner = self.lock();
        let mut recording = inner
            .active
            .remove(session_id)
            .ok_or_else(|| Error::NotFound(format!("No active recording: {session_id}")))?;
        let end_time = Utc::now();
        recording.end_time = Some(end_time);
        let duration_seconds = millis_to_secs((end_time - recording.start_time).num_milliseconds());
        let stopped = RecordingStopped {
            session_id: session_id.to_string(),
            duration_seconds,
            exchange_count: recording.exchanges.len(),
            highlight_count: recording.highlights.len(),
        };
        inner.completed.insert(session_id.to_string(), recording);
        info!("stopped recording session: {session_id} ({duration_seconds:.1}s)");
        Ok(stopped)
    }

    /// Rank a recording's exchanges and keep the top highlights on it.
    /// Allowed against both active and completed recordings.
    pub fn extract_highlights(
        &self,
        session_id: &str,
        count: usize,
        focus: HighlightFocus,
    ) -> Result<HighlightReport> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let recording = if inner.completed.contains_key(session_id) {
            inner.completed.get_mut(session_id)
        } else {
            inner.active.get_mut(session_id)
        }
        .ok_or_else(|| Error::NotFound(format!("Recording not found: {session_id}")))?;

        let highlights = highlights::extract(recording, &self.lexicon, count, focus);
        recording.highlights = highlights.clone();
        Ok(HighlightReport {
            session_id: session_id.to_string(),
            highlight_count: highlights.len(),
            highlights,
            total_duration: recording.duration_seconds(),
        })
    }

    /// Build the render descriptor for a completed session. Highlights are
    /// computed with defaults first if nothing extracted them yet.
    pub fn generate_video(
        &self,
        session_id: &str,
        settings: &VideoSettings,
        title: Option<&str>,
    ) -> Result<RenderDescriptor> {
        let mut inner = self.lock();
        let recording = inner
            .completed
            .get_mut(session_id)
            .ok_or_else(|| Error::NotFound(format!("Recording not found: {session_id}")))?;
        if recording.highlights.is_empty() {
            recording.highlights = highlights::extract(
                recording,
                &self.lexicon,
                DEFAULT_HIGHLIGHT_COUNT,
                HighlightFocus::All,
            );
        }
        Ok(build_descriptor(recording, settings, title))
    }

    /// Fetch a recording by id, completed recordings first.
    pub fn get(&self, session_id: &str) -> Option<SessionRecording> {
        let inner = self.lock();
        inner
            .completed
            .get(session_id)
            .or_else(|| inner.active.get(session_id))
            .cloned()
    }

    /// Summaries of every recording, active and completed, oldest first.
    pub fn list(&self) -> Vec<RecordingSummary> {
        let inner = self.lock();
        let mut summaries: Vec<RecordingSummary> = inner
            .active
            .values()
            .map(|rec| summarize(rec, RecordingStatus::Recording))
            .chain(
                inner
                    .completed
                    .values()
                    .map(|rec| summarize(rec, RecordingStatus::Completed)),
            )
            .collect();
        summaries.sort_by_key(|summary| summary.started_at);
        summaries
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn summarize(recording: &SessionRecording, status: RecordingStatus) -> RecordingSummary {
    RecordingSummary {
        session_id: recording.session_id.clone(),
        status,
        contact: recording.contact.clone(),
        scenario: recording.scenario.clone(),
        started_at: recording.start_time,
        ended_at: recording.end_time,
        exchanges: recording.exchanges.len(),
        highlights: recording.highlights.len(),
    }
}
