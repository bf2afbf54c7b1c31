//! Integration tests for the conflict-pattern analyzer.

use ginger_core::ConflictAnalyzer;
use ginger_core::models::{
    CommunicationHealth, ConflictAnalysis, ConflictFrequency, ConflictTheme, EscalationType,
    Message, PersonaStyle,
};

fn msg(text: &str, is_from_me: bool) -> Message {
    Message {
        text: text.to_string(),
        is_from_me,
        timestamp: None,
        sender: None,
    }
}

fn msg_at(text: &str, is_from_me: bool, timestamp: &str) -> Message {
    Message {
        text: text.to_string(),
        is_from_me,
        timestamp: Some(timestamp.to_string()),
        sender: None,
    }
}

// ============================================================================
// Style detection
// ============================================================================

#[test]
fn overreacting_yields_dismissive_primary() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![msg("You're overreacting", false)];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert_eq!(
        analysis.communication_style.primary_style,
        PersonaStyle::Dismissive
    );
    assert!(
        analysis
            .communication_style
            .indicators
            .iter()
            .any(|text| text.contains("You're overreacting"))
    );
}

#[test]
fn style_detection_ignores_own_messages() {
    let analyzer = ConflictAnalyzer::default();
    // The dismissive line comes from the user, so it must not count.
    let messages = vec![msg("You're overreacting", true)];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert!((analysis.communication_style.confidence - 0.3).abs() < 1e-9);
    assert!(analysis.communication_style.indicators.is_empty());
}

#[test]
fn no_matches_fall_back_to_dismissive_with_confidence_floor() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![msg("sounds good", false), msg("see you then", false)];

    let analysis = analyzer.analyze(&messages, "Sam", "recent", None);

    assert_eq!(
        analysis.communication_style.primary_style,
        PersonaStyle::Dismissive
    );
    assert!((analysis.communication_style.confidence - 0.3).abs() < 1e-9);
    assert!(analysis.communication_style.secondary_styles.is_empty());
}

#[test]
fn multiple_pattern_hits_on_one_message_each_count() {
    let analyzer = ConflictAnalyzer::default();
    // Hits both "calm down" and "you're (overreacting|...)" in one message,
    // and a single controlling pattern in another.
    let messages = vec![
        msg("Calm down, you're being dramatic", false),
        msg("You need to call me back", false),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert_eq!(
        analysis.communication_style.primary_style,
        PersonaStyle::Dismissive
    );
    // 2 dismissive hits out of 3 total matches.
    assert!((analysis.communication_style.confidence - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(
        analysis.communication_style.secondary_styles,
        vec![PersonaStyle::Controlling]
    );
}

// ============================================================================
// Themes and escalations
// ============================================================================

#[test]
fn guilt_trip_scenario_detects_style_and_theme() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg(
            "After everything I've done for you, this is how you repay me?",
            false,
        ),
        msg("I need to make my own decisions.", true),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert_eq!(analysis.message_count, 2);
    assert_eq!(
        analysis.communication_style.primary_style,
        PersonaStyle::GuiltTripping
    );
    let themes: Vec<ConflictTheme> = analysis
        .conflict_patterns
        .iter()
        .map(|p| p.theme)
        .collect();
    assert!(
        themes.contains(&ConflictTheme::Independence)
            || themes.contains(&ConflictTheme::Boundaries)
    );
}

#[test]
fn wedding_refusal_is_a_threat_escalation_with_trigger() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("We expect you at the wedding", false),
        msg_at(
            "I won't be coming to the wedding",
            false,
            "2026-05-02T10:15:00Z",
        ),
    ];

    let analysis = analyzer.analyze(&messages, "Aunt Carol", "recent", None);

    assert_eq!(analysis.escalation_points.len(), 1);
    let point = &analysis.escalation_points[0];
    assert_eq!(point.escalation_type, EscalationType::Threat);
    assert_eq!(point.trigger_message, "We expect you at the wedding");
    assert_eq!(point.response_message, "I won't be coming to the wedding");
}

#[test]
fn escalation_points_cap_at_ten() {
    let analyzer = ConflictAnalyzer::default();
    let messages: Vec<Message> = (0..12)
        .map(|i| msg(&format!("How dare you say that ({i})!!!"), false))
        .collect();

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert_eq!(analysis.escalation_points.len(), 10);
    assert!(
        analysis
            .escalation_points
            .iter()
            .all(|p| p.escalation_type == EscalationType::Volatile)
    );
}

#[test]
fn key_triggers_are_sorted_and_capped() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("zebra topic first", false),
        msg("you'll regret this", false),
        msg("apple topic second", false),
        msg("don't expect me to show up", false),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert!(analysis.key_triggers.len() <= 5);
    let mut sorted = analysis.key_triggers.clone();
    sorted.sort();
    assert_eq!(analysis.key_triggers, sorted);
}

#[test]
fn long_messages_are_truncated_in_escalations() {
    let analyzer = ConflictAnalyzer::default();
    let long_trigger = "a".repeat(400);
    let messages = vec![
        msg(&long_trigger, false),
        msg("I won't be coming to dinner", false),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert_eq!(analysis.escalation_points[0].trigger_message.len(), 200);
    assert!(analysis.key_triggers[0].len() <= 50);
}

#[test]
fn topic_filter_narrows_the_transcript() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("The Wedding plans are a mess", false),
        msg("Unrelated grocery list", true),
        msg("About the wedding again", true),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", Some("wedding"));

    assert_eq!(analysis.message_count, 2);
}

#[test]
fn severity_and_confidence_stay_in_range() {
    let analyzer = ConflictAnalyzer::default();
    // Theme-heavy transcript: every message mentions money.
    let messages: Vec<Message> = (0..20)
        .map(|i| msg(&format!("you never pay, it's always my money ({i})"), i % 2 == 0))
        .collect();

    let analysis = analyzer.analyze(&messages, "Roommate", "last month", None);

    assert!(!analysis.conflict_patterns.is_empty());
    for pattern in &analysis.conflict_patterns {
        assert!((0.0..=1.0).contains(&pattern.severity), "{pattern:?}");
        assert!(pattern.example_messages.len() <= 3);
    }
    assert!((0.0..=1.0).contains(&analysis.communication_style.confidence));
    assert!(analysis.conflict_patterns.len() <= 5);
}

#[test]
fn recommendations_cap_at_five_and_match_primary_style() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("After everything I sacrificed for you", false),
        msg("That was my choice and my decision", true),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);

    assert!(analysis.recommendations.len() <= 5);
    assert!(
        analysis
            .recommendations
            .iter()
            .any(|tip| tip.contains("Broken Record"))
    );
}

#[test]
fn analysis_is_deterministic_for_identical_input() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg_at("We expect you at the wedding", false, "2026-05-02T10:00:00Z"),
        msg_at(
            "I won't be coming to the wedding",
            false,
            "2026-05-02T10:15:00Z",
        ),
        msg_at("You're overreacting", false, "2026-05-02T10:16:00Z"),
    ];

    let first = analyzer.analyze(&messages, "Mom", "recent", None);
    let second = analyzer.analyze(&messages, "Mom", "recent", None);

    let first = serde_json::to_value(&first).expect("serialize");
    let second = serde_json::to_value(&second).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn conflict_analysis_roundtrips_through_json() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("After everything I've done for you", false),
        msg_at(
            "I won't be coming to the wedding",
            false,
            "2026-05-02T10:15:00Z",
        ),
    ];

    let analysis = analyzer.analyze(&messages, "Mom", "recent", None);
    let json = serde_json::to_string(&analysis).expect("serialize");
    assert!(json.contains("\"guilt-tripping\""));
    assert!(json.contains("\"threat\""));

    let parsed: ConflictAnalysis = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(
        serde_json::to_value(&parsed).expect("revalue"),
        serde_json::to_value(&analysis).expect("value")
    );
}

#[test]
fn empty_input_produces_valid_degenerate_analysis() {
    let analyzer = ConflictAnalyzer::default();
    let analysis = analyzer.analyze(&[], "Nobody", "recent", None);

    assert_eq!(analysis.message_count, 0);
    assert!(analysis.conflict_patterns.is_empty());
    assert!(analysis.escalation_points.is_empty());
    assert!((analysis.communication_style.confidence - 0.3).abs() < 1e-9);
}

// ============================================================================
// Relationship summary
// ============================================================================

#[test]
fn empty_history_yields_unknown_summary() {
    let analyzer = ConflictAnalyzer::default();
    let summary = analyzer.relationship_summary(&[], "Mom");

    assert_eq!(summary.total_messages, 0);
    assert_eq!(summary.communication_health, CommunicationHealth::Unknown);
    assert_eq!(summary.conflict_frequency, ConflictFrequency::Unknown);
    assert!((summary.positive_ratio - 0.5).abs() < 1e-9);
    assert!(summary.dominant_themes.is_empty());
}

#[test]
fn warm_history_reads_healthy() {
    let analyzer = ConflictAnalyzer::default();
    let mut messages: Vec<Message> = (0..20)
        .map(|i| msg(&format!("love this, thank you so much ({i})"), i % 2 == 0))
        .collect();
    messages.push(msg("see you soon", false));

    let summary = analyzer.relationship_summary(&messages, "Ana");

    assert_eq!(summary.communication_health, CommunicationHealth::Healthy);
    assert_eq!(summary.conflict_frequency, ConflictFrequency::Rare);
    assert!((summary.positive_ratio - 1.0).abs() < 1e-9);
    assert!(
        summary
            .suggested_approaches
            .iter()
            .any(|tip| tip.contains("Maintain healthy"))
    );
}

#[test]
fn hostile_history_reads_toxic() {
    let analyzer = ConflictAnalyzer::default();
    let messages: Vec<Message> = (0..10)
        .map(|i| {
            msg(
                &format!("I hate how you never listen, it's your fault ({i})"),
                i % 2 == 0,
            )
        })
        .collect();

    let summary = analyzer.relationship_summary(&messages, "Ex");

    assert_eq!(summary.communication_health, CommunicationHealth::Toxic);
    assert_eq!(summary.conflict_frequency, ConflictFrequency::Constant);
    assert!((summary.positive_ratio - 0.0).abs() < 1e-9);
    assert_eq!(summary.suggested_approaches.len(), 2);
    assert!(summary.dominant_themes.len() <= 3);
}

#[test]
fn positive_ratio_stays_in_range() {
    let analyzer = ConflictAnalyzer::default();
    let messages = vec![
        msg("I love you but I'm upset", false),
        msg("great, no problem", true),
        msg("neutral logistics", false),
    ];

    let summary = analyzer.relationship_summary(&messages, "Pat");

    assert!((0.0..=1.0).contains(&summary.positive_ratio));
    assert_eq!(summary.total_messages, 3);
}
