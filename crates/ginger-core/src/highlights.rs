//! Highlight extraction: scoring session exchanges for noteworthy moments.

use crate::lexicon::Lexicon;
use crate::models::{Highlight, HighlightCategory, HighlightFocus, SessionRecording};

/// Default number of highlights extracted per session.
pub const DEFAULT_HIGHLIGHT_COUNT: usize = 5;

/// Seconds an exchange and a coaching score may be apart and still count
/// as the same moment.
const SCORE_WINDOW_SECS: f64 = 5.0;
/// Minimum impact score for an exchange to qualify as a highlight
/// (exclusive).
const IMPACT_THRESHOLD: f64 = 0.2;
/// Mean coached score (out of 10) that marks a learning moment.
const LEARNING_MEAN: f64 = 7.0;
/// Window assumed for the final exchange, which has no successor.
const TAIL_WINDOW_SECS: f64 = 5.0;

/// Score every exchange of a recording and return the top `count`
/// highlights, ranked by impact (descending, stable for ties).
///
/// Breakthrough and boundary cues only count when the user is speaking;
/// emotional cues count for any speaker. A nearby high coaching score
/// forces the `learning` category, which no focus value other than `All`
/// admits.
pub fn extract(
    recording: &SessionRecording,
    lexicon: &Lexicon,
    count: usize,
    focus: HighlightFocus,
) -> Vec<Highlight> {
    let mut highlights = Vec::new();

    for (i, exchange) in recording.exchanges.iter().enumerate() {
        let lowered = exchange.text.to_lowercase();
        let mut impact = 0.0_f64;
        let mut category = HighlightCategory::General;

        if exchange.speaker == "user" {
            let hits = count_keywords(&lowered, &lexicon.breakthrough_keywords);
            if hits > 0 {
                impact += 0.3 * hits_f(hits);
                category = HighlightCategory::Breakthrough;
            }
            let hits = count_keywords(&lowered, &lexicon.boundary_keywords);
            if hits > 0 {
                impact += 0.25 * hits_f(hits);
                if category == HighlightCategory::General {
                    category = HighlightCategory::Boundary;
                }
            }
        }

        let hits = count_keywords(&lowered, &lexicon.emotional_keywords);
        if hits > 0 {
            impact += 0.2 * hits_f(hits);
            if category == HighlightCategory::General {
                category = HighlightCategory::Emotional;
            }
        }

        let coached = recording.coaching_scores.iter().any(|score| {
            (score.timestamp - exchange.timestamp).abs() < SCORE_WINDOW_SECS
                && score.core_dimension_mean() >= LEARNING_MEAN
        });
        if coached {
            impact += 0.3;
            category = HighlightCategory::Learning;
        }

        if !focus.admits(category) {
            continue;
        }
        if impact <= IMPACT_THRESHOLD {
            continue;
        }

        let timestamp_end = recording
            .exchanges
            .get(i + 1)
            .map_or(exchange.timestamp + TAIL_WINDOW_SECS, |next| next.timestamp);

        highlights.push(Highlight {
            timestamp_start: exchange.timestamp,
            timestamp_end,
            text: exchange.text.clone(),
            speaker: exchange.speaker.clone(),
            emotion: exchange
                .emotion
                .clone()
                .unwrap_or_else(|| "neutral".to_string()),
            impact_score: impact.min(1.0),
            category,
        });
    }

    // Stable sort: ties keep transcript order.
    highlights.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    highlights.truncate(count);
    highlights
}

fn count_keywords(lowered: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| lowered.contains(keyword.as_str()))
        .count()
}

#[expect(clippy::cast_precision_loss)]
fn hits_f(hits: usize) -> f64 {
    hits as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CoachingScore, Exchange};
    use chrono::Utc;

    fn recording_with(exchanges: Vec<Exchange>) -> SessionRecording {
        SessionRecording {
            session_id: "rec_test_20260101_120000".to_string(),
            contact: "Mom".to_string(),
            scenario: "wedding invite".to_string(),
            start_time: Utc::now(),
            end_time: None,
            exchanges,
            coaching_scores: Vec::new(),
            highlights: Vec::new(),
        }
    }

    fn user_exchange(timestamp: f64, text: &str) -> Exchange {
        Exchange {
            timestamp,
            speaker: "user".to_string(),
            text: text.to_string(),
            emotion: None,
        }
    }

    #[test]
    fn single_breakthrough_keyword_scores_point_three() {
        let recording = recording_with(vec![user_exchange(1.0, "I see now")]);
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert_eq!(highlights.len(), 1);
        assert!((highlights[0].impact_score - 0.3).abs() < 1e-9);
        assert_eq!(highlights[0].category, HighlightCategory::Breakthrough);
    }

    #[test]
    fn breakthrough_only_counts_for_user_speaker() {
        let mut exchange = user_exchange(1.0, "I see now");
        exchange.speaker = "coach".to_string();
        let recording = recording_with(vec![exchange]);
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert!(highlights.is_empty());
    }

    #[test]
    fn end_timestamp_comes_from_next_exchange() {
        let recording = recording_with(vec![
            user_exchange(1.0, "I see now"),
            user_exchange(9.5, "hm"),
        ]);
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert!((highlights[0].timestamp_end - 9.5).abs() < 1e-9);
    }

    #[test]
    fn last_exchange_gets_five_second_window() {
        let recording = recording_with(vec![user_exchange(3.0, "I see now")]);
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert!((highlights[0].timestamp_end - 8.0).abs() < 1e-9);
    }

    #[test]
    fn impact_score_is_clamped_to_one() {
        let text = "I realize and understand, you're right, that makes sense, wow, \
                    I never thought of that perspective and I need to respect my limit";
        let recording = recording_with(vec![user_exchange(0.0, text)]);
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert!((highlights[0].impact_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn high_coaching_score_forces_learning_category() {
        let mut recording = recording_with(vec![user_exchange(2.0, "I see now")]);
        recording.coaching_scores.push(CoachingScore {
            timestamp: 4.0,
            boundary_clarity: Some(8.0),
            assertiveness: Some(8.0),
            de_escalation: Some(8.0),
            extra: Default::default(),
        });
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert_eq!(highlights[0].category, HighlightCategory::Learning);
        assert!((highlights[0].impact_score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn missing_dimensions_count_as_zero_in_the_mean() {
        // 9 + 9 over a fixed divisor of 3 stays below the learning bar.
        let mut recording = recording_with(vec![user_exchange(2.0, "I see now")]);
        recording.coaching_scores.push(CoachingScore {
            timestamp: 2.0,
            boundary_clarity: Some(9.0),
            assertiveness: Some(9.0),
            de_escalation: None,
            extra: Default::default(),
        });
        let highlights = extract(&recording, &Lexicon::default(), 5, HighlightFocus::All);
        assert_eq!(highlights[0].category, HighlightCategory::Breakthrough);
    }

    #[test]
    fn focus_filter_drops_learning_moments() {
        let mut recording = recording_with(vec![user_exchange(2.0, "I see now")]);
        recording.coaching_scores.push(CoachingScore {
            timestamp: 2.0,
            boundary_clarity: Some(9.0),
            assertiveness: Some(9.0),
            de_escalation: Some(9.0),
            extra: Default::default(),
        });
        let highlights = extract(
            &recording,
            &Lexicon::default(),
            5,
            HighlightFocus::Breakthroughs,
        );
        assert!(highlights.is_empty());
    }

    #[test]
    fn never_returns_more_than_count() {
        let exchanges = (0..8)
            .map(|i| user_exchange(f64::from(i), "I see now"))
            .collect();
        let recording = recording_with(exchanges);
        let highlights = extract(&recording, &Lexicon::default(), 3, HighlightFocus::All);
        assert_eq!(highlights.len(), 3);
        assert!(highlights.iter().all(|h| h.impact_score > 0.2));
    }
}
