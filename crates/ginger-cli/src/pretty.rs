//! Pretty terminal output formatting for the ginger CLI.

use console::{Style, Term, style};
use ginger_core::models::{
    CommunicationHealth, ConflictAnalysis, Highlight, HighlightCategory, RelationshipSummary,
};

/// Terminal width for formatting, with fallback.
fn term_width() -> usize {
    let width = Term::stdout().size().1 as usize;
    width.clamp(40, 100)
}

/// Create a visual meter for a 0-1 score using Unicode blocks.
fn score_bar(score: f64) -> String {
    let clamped = score.clamp(0.0, 1.0);
    // Safe: clamped is in [0.0, 1.0], so filled is in [0, 10]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let filled = ((clamped * 10.0).round() as usize).min(10);
    "█".repeat(filled) + &"░".repeat(10 - filled)
}

/// Style for highlight category badges.
fn category_style(category: HighlightCategory) -> Style {
    match category {
        HighlightCategory::Breakthrough => Style::new().green().bold(),
        HighlightCategory::Boundary => Style::new().cyan().bold(),
        HighlightCategory::Emotional => Style::new().magenta().bold(),
        HighlightCategory::Learning => Style::new().yellow().bold(),
        HighlightCategory::General => Style::new().white(),
    }
}

/// Style for communication-health badges.
fn health_style(health: CommunicationHealth) -> Style {
    match health {
        CommunicationHealth::Healthy => Style::new().green().bold(),
        CommunicationHealth::Strained => Style::new().yellow().bold(),
        CommunicationHealth::Toxic => Style::new().red().bold(),
        CommunicationHealth::Unknown => Style::new().dim(),
    }
}

/// Truncate and wrap text to fit terminal width.
fn wrap_text(s: &str, prefix_width: usize, max_lines: usize) -> String {
    let width = term_width().saturating_sub(prefix_width + 2).max(40);

    let clean = s.replace('\n', " ").replace('\r', "");
    let wrapped = textwrap::wrap(&clean, width);

    wrapped
        .into_iter()
        .take(max_lines)
        .map(|cow| cow.to_string())
        .collect::<Vec<_>>()
        .join(&format!("\n{:prefix_width$}", ""))
}

/// Print a full conflict analysis.
pub fn print_analysis(analysis: &ConflictAnalysis) {
    let separator = "─".repeat(term_width());
    let double_sep = "═".repeat(term_width());

    println!("{}", style(&double_sep).dim());
    println!(
        "{}",
        style(format!(
            " Conflict analysis: {} ({}, {} messages)",
            analysis.contact, analysis.timeframe, analysis.message_count
        ))
        .bold()
    );
    println!("{}", style(&double_sep).dim());

    let comm_style = &analysis.communication_style;
    println!(" {}", style("Communication style").bold().underlined());
    println!(
        "   primary: {} {} {:.2}",
        style(comm_style.primary_style).red().bold(),
        style(score_bar(comm_style.confidence)).yellow(),
        comm_style.confidence
    );
    if !comm_style.secondary_styles.is_empty() {
        let names: Vec<String> = comm_style
            .secondary_styles
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("   secondary: {}", style(names.join(", ")).dim());
    }
    for indicator in &comm_style.indicators {
        println!("   {} {}", style(">").dim(), wrap_text(indicator, 5, 2));
    }

    if !analysis.conflict_patterns.is_empty() {
        println!();
        println!(" {}", style("Conflict themes").bold().underlined());
        for pattern in &analysis.conflict_patterns {
            println!(
                "   {:14} x{:<3} {} {:.2}",
                style(pattern.theme).cyan(),
                pattern.frequency,
                style(score_bar(pattern.severity)).yellow(),
                pattern.severity
            );
        }
    }

    if !analysis.escalation_points.is_empty() {
        println!();
        println!(" {}", style("Escalation points").bold().underlined());
        for point in &analysis.escalation_points {
            println!(
                "   [{}] {}",
                style(point.escalation_type).red().bold(),
                style(point.timestamp.format("%Y-%m-%d %H:%M")).dim()
            );
            if !point.trigger_message.is_empty() {
                println!("     after: {}", wrap_text(&point.trigger_message, 12, 1));
            }
            println!("     said:  {}", wrap_text(&point.response_message, 12, 2));
        }
    }

    if !analysis.recommendations.is_empty() {
        println!("{}", style(&separator).dim());
        println!(" {}", style("Recommendations").bold().underlined());
        for (i, tip) in analysis.recommendations.iter().enumerate() {
            println!("   {}. {}", i + 1, wrap_text(tip, 6, 3));
        }
    }

    println!("{}", style(&double_sep).dim());
}

/// Print a relationship summary.
pub fn print_summary(summary: &RelationshipSummary) {
    let double_sep = "═".repeat(term_width());

    println!("{}", style(&double_sep).dim());
    println!(
        "{}",
        style(format!(
            " Relationship summary: {} ({} messages)",
            summary.contact, summary.total_messages
        ))
        .bold()
    );
    println!("{}", style(&double_sep).dim());
    println!(
        "   health:         {}",
        health_style(summary.communication_health).apply_to(summary.communication_health)
    );
    println!(
        "   positive ratio: {} {:.2}",
        style(score_bar(summary.positive_ratio)).yellow(),
        summary.positive_ratio
    );
    println!("   conflict:       {}", summary.conflict_frequency);
    if !summary.dominant_themes.is_empty() {
        let themes: Vec<String> = summary
            .dominant_themes
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("   themes:         {}", style(themes.join(", ")).cyan());
    }
    println!();
    for tip in &summary.suggested_approaches {
        println!("   {} {}", style(">").dim(), wrap_text(tip, 5, 2));
    }
    println!("{}", style(&double_sep).dim());
}

/// Print ranked session highlights.
pub fn print_highlights(highlights: &[Highlight]) {
    if highlights.is_empty() {
        println!("{}", style("No highlights crossed the impact threshold.").dim());
        return;
    }

    let separator = "─".repeat(term_width());

    for (i, highlight) in highlights.iter().enumerate() {
        if i > 0 {
            println!("{}", style(&separator).dim());
        }
        let badge = category_style(highlight.category).apply_to(highlight.category);
        println!(
            " {} {:.2} {badge} {}",
            style(score_bar(highlight.impact_score)).yellow(),
            highlight.impact_score,
            style(format!(
                "{:.1}s-{:.1}s",
                highlight.timestamp_start, highlight.timestamp_end
            ))
            .dim()
        );
        println!(
            "   {}: {}",
            style(&highlight.speaker).cyan(),
            wrap_text(&highlight.text, 4, 3)
        );
    }
}
