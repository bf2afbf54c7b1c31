//! Conflict-pattern and communication-style analysis over message
//! transcripts.
//!
//! All detection is rule-based: regex batteries for styles and escalations,
//! keyword membership for themes. The analyzer owns no state besides its
//! compiled lexicon and recomputes every result fully per call.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::lexicon::{CompiledLexicon, Lexicon};
use crate::models::{
    CommunicationHealth, CommunicationStyle, ConflictAnalysis, ConflictFrequency,
    ConflictPattern, ConflictTheme, EscalationPoint, EscalationType, Message, PersonaStyle,
    RelationshipSummary, truncate_chars,
};

/// Escalation points reported per analysis (first encountered, not ranked).
const MAX_ESCALATION_POINTS: usize = 10;
/// Example snippets kept per style or theme.
const MAX_EXAMPLES: usize = 3;
/// Confidence reported when no style pattern matched at all. A floor, not
/// a probability estimate.
const NO_MATCH_CONFIDENCE: f64 = 0.3;

/// Rule-based transcript analyzer.
#[derive(Debug, Clone)]
pub struct ConflictAnalyzer {
    rules: CompiledLexicon,
}

impl Default for ConflictAnalyzer {
    fn default() -> Self {
        Self::new(&Lexicon::default())
    }
}

impl ConflictAnalyzer {
    /// Build an analyzer from a lexicon, compiling its batteries once.
    pub fn new(lexicon: &Lexicon) -> Self {
        Self {
            rules: lexicon.compile(),
        }
    }

    /// Analyze messages for one contact: dominant communication style,
    /// recurring themes, escalation points, and coaching recommendations.
    ///
    /// A supplied `topic` narrows the transcript to messages containing it
    /// (case-insensitive) before any detection runs. Never fails; an empty
    /// transcript produces a degenerate but valid analysis.
    pub fn analyze(
        &self,
        messages: &[Message],
        contact: &str,
        timeframe: &str,
        topic: Option<&str>,
    ) -> ConflictAnalysis {
        let filtered: Vec<&Message> = match topic {
            Some(topic) => {
                let needle = topic.to_lowercase();
                messages
                    .iter()
                    .filter(|m| m.text.to_lowercase().contains(&needle))
                    .collect()
            }
            None => messages.iter().collect(),
        };

        let communication_style = self.detect_style(&filtered);
        let conflict_patterns = self.detect_themes(&filtered);
        let escalation_points = self.detect_escalations(&filtered);
        let recommendations = self.recommendations(&communication_style, &conflict_patterns);

        // BTreeSet gives deterministic, sorted trigger output across runs.
        let key_triggers: Vec<String> = escalation_points
            .iter()
            .filter(|point| !point.trigger_message.is_empty())
            .map(|point| truncate_chars(&point.trigger_message, 50))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(5)
            .collect();

        ConflictAnalysis {
            contact: contact.to_string(),
            timeframe: timeframe.to_string(),
            message_count: filtered.len(),
            conflict_patterns,
            communication_style,
            escalation_points,
            key_triggers,
            recommendations,
        }
    }

    /// Overall relationship health across a full message history.
    pub fn relationship_summary(
        &self,
        messages: &[Message],
        contact: &str,
    ) -> RelationshipSummary {
        let total = messages.len();
        if total == 0 {
            return RelationshipSummary {
                contact: contact.to_string(),
                total_messages: 0,
                positive_ratio: 0.5,
                conflict_frequency: ConflictFrequency::Unknown,
                dominant_themes: Vec::new(),
                communication_health: CommunicationHealth::Unknown,
                suggested_approaches: vec![
                    "Get more conversation history for analysis".to_string(),
                ],
            };
        }

        let refs: Vec<&Message> = messages.iter().collect();
        let patterns = self.detect_themes(&refs);
        let lexicon = self.rules.lexicon();

        let mut positive = 0usize;
        let mut negative = 0usize;
        for message in messages {
            let lowered = message.text.to_lowercase();
            if contains_any(&lowered, &lexicon.positive_keywords) {
                positive += 1;
            }
            if contains_any(&lowered, &lexicon.negative_keywords) {
                negative += 1;
            }
        }
        let positive_ratio = ratio(positive, (positive + negative).max(1));

        let conflict_messages: usize = patterns.iter().map(|p| p.frequency).sum();
        let conflict_rate = ratio(conflict_messages, total);
        let conflict_frequency = if conflict_rate < 0.05 {
            ConflictFrequency::Rare
        } else if conflict_rate < 0.15 {
            ConflictFrequency::Occasional
        } else if conflict_rate < 0.30 {
            ConflictFrequency::Frequent
        } else {
            ConflictFrequency::Constant
        };

        // First match wins.
        let communication_health = if positive_ratio > 0.7
            && matches!(
                conflict_frequency,
                ConflictFrequency::Rare | ConflictFrequency::Occasional
            ) {
            CommunicationHealth::Healthy
        } else if positive_ratio > 0.4 || conflict_frequency == ConflictFrequency::Occasional {
            CommunicationHealth::Strained
        } else {
            CommunicationHealth::Toxic
        };

        let suggested_approaches = match communication_health {
            CommunicationHealth::Toxic => vec![
                "Consider setting firm boundaries or limiting contact".to_string(),
                "Practice the Grey Rock technique".to_string(),
            ],
            CommunicationHealth::Strained => vec![
                "Focus on boundary-setting conversations".to_string(),
                "Use 'I feel' statements to express needs".to_string(),
            ],
            CommunicationHealth::Healthy | CommunicationHealth::Unknown => vec![
                "Maintain healthy communication patterns".to_string(),
                "Address issues as they arise before they escalate".to_string(),
            ],
        };

        let dominant_themes = patterns.iter().take(3).map(|p| p.theme).collect();

        RelationshipSummary {
            contact: contact.to_string(),
            total_messages: total,
            // Two decimals in the output; thresholds above saw the raw ratio.
            positive_ratio: (positive_ratio * 100.0).round() / 100.0,
            conflict_frequency,
            dominant_themes,
            communication_health,
            suggested_approaches,
        }
    }

    /// Style detection runs only on the counterpart's messages: the tool
    /// profiles the other party's behavior, not the user's.
    fn detect_style(&self, messages: &[&Message]) -> CommunicationStyle {
        let mut scores: Vec<(PersonaStyle, usize)> =
            PersonaStyle::ALL.iter().map(|style| (*style, 0)).collect();
        let mut indicators: BTreeMap<PersonaStyle, Vec<String>> = BTreeMap::new();

        for message in messages.iter().filter(|m| !m.is_from_me) {
            for (style, score) in &mut scores {
                let hits = self
                    .rules
                    .style_battery(*style)
                    .iter()
                    .filter(|re| re.is_match(&message.text))
                    .count();
                if hits > 0 {
                    *score += hits;
                    let examples = indicators.entry(*style).or_default();
                    if examples.len() < MAX_EXAMPLES {
                        examples.push(truncate_chars(&message.text, 100));
                    }
                }
            }
        }

        let total: usize = scores.iter().map(|(_, score)| *score).sum();
        let mut ranked = scores;
        // Stable sort: equal scores keep enumeration order, first wins.
        ranked.sort_by_key(|(_, score)| Reverse(*score));

        let (top_style, top_score) = ranked[0];
        let primary_style = if top_score > 0 {
            top_style
        } else {
            // Zero-match fallback, kept for parity with the established
            // behavior rather than introducing an "unknown" category.
            PersonaStyle::Dismissive
        };
        let secondary_styles = ranked[1..3]
            .iter()
            .filter(|(_, score)| *score > 0)
            .map(|(style, _)| *style)
            .collect();
        let confidence = if total > 0 {
            ratio(top_score, total).min(1.0)
        } else {
            NO_MATCH_CONFIDENCE
        };
        let indicators = indicators.remove(&primary_style).unwrap_or_default();

        CommunicationStyle {
            primary_style,
            secondary_styles,
            confidence,
            indicators,
        }
    }

    /// Theme detection scans all messages from both parties. A message
    /// counts at most once per theme: the first keyword hit wins.
    fn detect_themes(&self, messages: &[&Message]) -> Vec<ConflictPattern> {
        let lexicon = self.rules.lexicon();
        let mut counts: Vec<(ConflictTheme, usize, Vec<String>)> = ConflictTheme::ALL
            .iter()
            .map(|theme| (*theme, 0, Vec::new()))
            .collect();

        for message in messages {
            let lowered = message.text.to_lowercase();
            for (theme, count, examples) in &mut counts {
                let keywords = lexicon.themes.get(theme).map_or(&[][..], Vec::as_slice);
                if contains_any(&lowered, keywords) {
                    *count += 1;
                    if examples.len() < MAX_EXAMPLES {
                        examples.push(truncate_chars(&message.text, 100));
                    }
                }
            }
        }

        let total = messages.len();
        let mut patterns: Vec<ConflictPattern> = counts
            .into_iter()
            .filter(|(_, count, _)| *count > 0)
            .map(|(theme, frequency, example_messages)| {
                let severity = theme_severity(frequency, total);
                let triggers = lexicon
                    .themes
                    .get(&theme)
                    .map(|keywords| keywords.iter().take(3).cloned().collect())
                    .unwrap_or_default();
                ConflictPattern {
                    theme,
                    frequency,
                    severity,
                    example_messages,
                    triggers,
                }
            })
            .collect();

        patterns.sort_by_key(|pattern| Reverse(pattern.frequency));
        patterns.truncate(5);
        patterns
    }

    /// Escalations in transcript order: threat patterns first, volatile
    /// patterns otherwise. The preceding message is recorded as the trigger.
    fn detect_escalations(&self, messages: &[&Message]) -> Vec<EscalationPoint> {
        let mut points = Vec::new();
        for (i, message) in messages.iter().enumerate() {
            if points.len() == MAX_ESCALATION_POINTS {
                break;
            }
            let escalation_type = if matches_any(self.rules.threat_battery(), &message.text) {
                EscalationType::Threat
            } else if matches_any(self.rules.volatile_battery(), &message.text) {
                EscalationType::Volatile
            } else {
                continue;
            };
            let trigger_message = if i > 0 {
                truncate_chars(&messages[i - 1].text, 200)
            } else {
                String::new()
            };
            points.push(EscalationPoint {
                timestamp: message.timestamp_utc(),
                trigger_message,
                response_message: truncate_chars(&message.text, 200),
                escalation_type,
            });
        }
        points
    }

    /// Coaching tips: three for the primary style, plus one for the top
    /// theme where the lexicon carries theme advice. Capped at five.
    fn recommendations(
        &self,
        style: &CommunicationStyle,
        patterns: &[ConflictPattern],
    ) -> Vec<String> {
        let lexicon = self.rules.lexicon();
        let mut recommendations: Vec<String> = lexicon
            .style_advice
            .get(&style.primary_style)
            .cloned()
            .unwrap_or_default();
        if let Some(top) = patterns.first() {
            if let Some(tip) = lexicon.theme_advice.get(&top.theme) {
                recommendations.push(tip.clone());
            }
        }
        recommendations.truncate(5);
        recommendations
    }
}

/// Severity saturates once a theme reaches 10% of the transcript.
#[expect(clippy::cast_precision_loss)]
fn theme_severity(frequency: usize, total_messages: usize) -> f64 {
    (frequency as f64 / (total_messages as f64 * 0.1).max(1.0)).min(1.0)
}

#[expect(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

fn contains_any(lowered: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
}

fn matches_any(battery: &[regex::Regex], text: &str) -> bool {
    battery.iter().any(|re| re.is_match(text))
}
