//! Editable rule tables behind the classifiers.
//!
//! Every regex battery, keyword list, and canned-advice table the analyzer
//! and highlight engine consult lives here as plain data. The whole set
//! round-trips through TOML, so the rules can be tuned in a config file
//! without touching detection logic.

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;
use crate::error::Result;
use crate::models::{ConflictTheme, PersonaStyle};

/// The rule tables. `Default` is the built-in set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    /// Regex battery marking threat/ultimatum escalations.
    pub threat_patterns: Vec<String>,
    /// Sentiment keywords for the relationship summary.
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    /// Highlight-engine keyword lists.
    pub breakthrough_keywords: Vec<String>,
    pub boundary_keywords: Vec<String>,
    pub emotional_keywords: Vec<String>,
    /// Case-insensitive regex batteries per persona style.
    pub styles: BTreeMap<PersonaStyle, Vec<String>>,
    /// Keyword lists per conflict theme (substring membership, not regex).
    pub themes: BTreeMap<ConflictTheme, Vec<String>>,
    /// Canned coaching tips per primary style.
    pub style_advice: BTreeMap<PersonaStyle, Vec<String>>,
    /// One extra tip for selected dominant themes.
    pub theme_advice: BTreeMap<ConflictTheme, String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            threat_patterns: strings(&[
                r"i (won't|will not)( be)? (come|coming|attend|be there)",
                r"if you .* then i'll",
                r"don't expect me to",
                r"you'll (regret|be sorry)",
                r"i'm (cutting|not) .* (off|going|coming)",
                r"this is your (last|final)",
            ]),
            positive_keywords: strings(&[
                "love",
                "thank",
                "happy",
                "great",
                "appreciate",
                "proud",
                "miss you",
                "\u{2764}\u{fe0f}",
                "\u{1f60a}",
            ]),
            negative_keywords: strings(&[
                "angry",
                "upset",
                "disappointed",
                "frustrated",
                "hate",
                "wrong",
                "problem",
            ]),
            breakthrough_keywords: strings(&[
                "realize",
                "understand",
                "never thought",
                "you're right",
                "i see now",
                "that makes sense",
                "breakthrough",
                "wow",
                "i didn't consider",
                "perspective",
            ]),
            boundary_keywords: strings(&[
                "i need",
                "it's not okay",
                "i won't accept",
                "boundary",
                "my limit",
                "i deserve",
                "not acceptable",
                "stop",
                "respect my",
                "i choose",
            ]),
            emotional_keywords: strings(&[
                "hurt",
                "angry",
                "frustrated",
                "scared",
                "anxious",
                "proud",
                "relieved",
                "hopeful",
                "loved",
                "supported",
                "overwhelmed",
                "grateful",
                "empowered",
            ]),
            styles: BTreeMap::from([
                (
                    PersonaStyle::GuiltTripping,
                    strings(&[
                        r"after everything i.*(did|done|sacrificed)",
                        r"you never think about",
                        r"how could you do this to me",
                        r"i gave up .* for you",
                        r"you.*(selfish|ungrateful)",
                        r"i can't believe you would",
                        r"you're breaking my heart",
                        r"you don't (care|love)",
                        r"all i ever wanted",
                        r"why do you (hate|hurt) me",
                    ]),
                ),
                (
                    PersonaStyle::Dismissive,
                    strings(&[
                        r"you're (overreacting|being dramatic|too sensitive)",
                        r"it's not (a big deal|that bad|serious)",
                        r"calm down",
                        r"you're making .* out of nothing",
                        r"why are you so (upset|worked up)",
                        r"whatever",
                        r"i don't (see|understand) the problem",
                        r"you always (blow|make) .* out of proportion",
                    ]),
                ),
                (
                    PersonaStyle::Volatile,
                    strings(&[
                        r"!!!+",
                        r"\b(hate|angry|furious)\b",
                        r"don't you dare",
                        r"how dare you",
                        r"i'm done with",
                        r"you're dead to me",
                        r"never (speak|talk) to me again",
                        r"i (hate|can't stand) you",
                    ]),
                ),
                (
                    PersonaStyle::PassiveAggressive,
                    strings(&[
                        r"fine\.+",
                        r"whatever you say",
                        r"if that's what you want",
                        r"i guess i'm .* wrong",
                        r"sure, i'll just",
                        r"no, no, it's fine",
                        r"must be nice to",
                        r"i'm not mad",
                        r"do what you want",
                    ]),
                ),
                (
                    PersonaStyle::Controlling,
                    strings(&[
                        r"you (should|need to|have to|must)",
                        r"i (told|said|asked) you to",
                        r"why didn't you (listen|do what)",
                        r"you're not allowed",
                        r"i don't (want|approve)",
                        r"because i said so",
                        r"you (can't|won't|shouldn't)",
                        r"who said you could",
                    ]),
                ),
                (
                    PersonaStyle::Victim,
                    strings(&[
                        r"you're (attacking|blaming) me",
                        r"i'm always the (bad|wrong) (guy|one)",
                        r"nothing i do is (good|right) enough",
                        r"you make me feel",
                        r"why (does|is) everything .* my fault",
                        r"i can't do anything right",
                        r"everyone .* against me",
                        r"you're being (mean|cruel|unfair)",
                    ]),
                ),
            ]),
            themes: BTreeMap::from([
                (
                    ConflictTheme::Control,
                    strings(&["control", "permission", "allow", "let me", "decide"]),
                ),
                (
                    ConflictTheme::Boundaries,
                    strings(&["boundary", "space", "privacy", "my choice", "my decision"]),
                ),
                (
                    ConflictTheme::Guilt,
                    strings(&["guilt", "fault", "blame", "responsible", "owe"]),
                ),
                (
                    ConflictTheme::Money,
                    strings(&[
                        "money",
                        "pay",
                        "cost",
                        "afford",
                        "financial",
                        "$",
                        "expensive",
                    ]),
                ),
                (
                    ConflictTheme::Time,
                    strings(&["time", "busy", "schedule", "when", "late", "waiting"]),
                ),
                (
                    ConflictTheme::Respect,
                    strings(&["respect", "rude", "disrespect", "manners", "polite"]),
                ),
                (
                    ConflictTheme::Independence,
                    strings(&["independent", "adult", "own life", "my own", "grow up"]),
                ),
                (
                    ConflictTheme::Expectations,
                    strings(&["expect", "should", "supposed to", "thought you would"]),
                ),
                (
                    ConflictTheme::Communication,
                    strings(&["talk", "listen", "hear", "understand", "ignore"]),
                ),
                (
                    ConflictTheme::Trust,
                    strings(&["trust", "lie", "honest", "truth", "believe"]),
                ),
            ]),
            style_advice: BTreeMap::from([
                (
                    PersonaStyle::GuiltTripping,
                    strings(&[
                        "Use the Broken Record technique - calmly repeat your boundary without engaging with guilt",
                        "Avoid JADE (Justify, Argue, Defend, Explain) - you don't owe explanations",
                        "Acknowledge their feelings without accepting responsibility: 'I hear you're upset, and my decision stands'",
                    ]),
                ),
                (
                    PersonaStyle::Dismissive,
                    strings(&[
                        "Don't try to convince them to validate your feelings - state your truth and move on",
                        "Use 'I' statements to assert your reality: 'I feel X, regardless of your opinion'",
                        "Consider limiting emotional sharing with this person",
                    ]),
                ),
                (
                    PersonaStyle::Volatile,
                    strings(&[
                        "Have an exit strategy ready before difficult conversations",
                        "Stay calm and lower your voice when they escalate",
                        "Consider having important conversations in public or with witnesses",
                    ]),
                ),
                (
                    PersonaStyle::PassiveAggressive,
                    strings(&[
                        "Name the behavior directly but calmly: 'It seems like you're upset about something'",
                        "Don't take the bait - respond to what they mean, not what they say",
                        "Set clear expectations and consequences",
                    ]),
                ),
                (
                    PersonaStyle::Controlling,
                    strings(&[
                        "Assert your autonomy: 'I've made my decision and I'm not looking for input'",
                        "Don't ask permission - inform them of your plans",
                        "Be prepared for pushback and have responses ready",
                    ]),
                ),
                (
                    PersonaStyle::Victim,
                    strings(&[
                        "Don't accept blame that isn't yours",
                        "Redirect to facts: 'I understand you feel that way. Here's what actually happened...'",
                        "Set limits on how much you'll discuss past grievances",
                    ]),
                ),
            ]),
            theme_advice: BTreeMap::from([
                (
                    ConflictTheme::Boundaries,
                    "Practice saying 'No' as a complete sentence".to_string(),
                ),
                (
                    ConflictTheme::Control,
                    "Repeat 'This is my decision to make' when challenged".to_string(),
                ),
                (
                    ConflictTheme::Guilt,
                    "Remember: Their feelings about your choices are theirs to manage".to_string(),
                ),
                (
                    ConflictTheme::Expectations,
                    "Clarify: 'What you expect and what I can give may be different'".to_string(),
                ),
            ]),
        }
    }
}

impl Lexicon {
    /// Load rule tables from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Lexicon(format!("Failed to parse lexicon: {e}")))
    }

    /// Save the rule tables to a TOML file.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Lexicon(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile the regex batteries. Patterns that fail to compile are
    /// skipped with a warning so a hand-edited lexicon degrades instead of
    /// taking the analyzer down.
    pub fn compile(&self) -> CompiledLexicon {
        let style_batteries = PersonaStyle::ALL
            .iter()
            .map(|style| {
                let patterns = self.styles.get(style).map_or(&[][..], Vec::as_slice);
                (*style, compile_battery(&style.to_string(), patterns))
            })
            .collect();
        let threat_battery = compile_battery("threat", &self.threat_patterns);
        CompiledLexicon {
            lexicon: self.clone(),
            style_batteries,
            threat_battery,
        }
    }
}

/// Compiled, case-insensitive form of the regex batteries.
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    lexicon: Lexicon,
    style_batteries: Vec<(PersonaStyle, Vec<Regex>)>,
    threat_battery: Vec<Regex>,
}

impl CompiledLexicon {
    /// The underlying rule tables.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// The compiled battery for one persona style.
    pub fn style_battery(&self, style: PersonaStyle) -> &[Regex] {
        self.style_batteries
            .iter()
            .find(|(s, _)| *s == style)
            .map_or(&[][..], |(_, battery)| battery.as_slice())
    }

    /// The threat/ultimatum battery.
    pub fn threat_battery(&self) -> &[Regex] {
        &self.threat_battery
    }

    /// The volatile battery, shared between style and escalation detection.
    pub fn volatile_battery(&self) -> &[Regex] {
        self.style_battery(PersonaStyle::Volatile)
    }
}

fn compile_battery(label: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| {
            match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!("skipping invalid {label} pattern {pattern:?}: {err}");
                    None
                }
            }
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_covers_every_style() {
        let lexicon = Lexicon::default();
        for style in PersonaStyle::ALL {
            assert!(!lexicon.styles[&style].is_empty(), "{style} battery empty");
            assert_eq!(lexicon.style_advice[&style].len(), 3, "{style} advice");
        }
    }

    #[test]
    fn default_covers_every_theme() {
        let lexicon = Lexicon::default();
        for theme in ConflictTheme::ALL {
            assert!(!lexicon.themes[&theme].is_empty(), "{theme} keywords empty");
        }
    }

    #[test]
    fn compiles_without_losing_patterns() {
        let lexicon = Lexicon::default();
        let compiled = lexicon.compile();
        for style in PersonaStyle::ALL {
            assert_eq!(
                compiled.style_battery(style).len(),
                lexicon.styles[&style].len()
            );
        }
        assert_eq!(
            compiled.threat_battery().len(),
            lexicon.threat_patterns.len()
        );
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let mut lexicon = Lexicon::default();
        lexicon
            .styles
            .insert(PersonaStyle::Volatile, vec!["([unclosed".to_string()]);
        let compiled = lexicon.compile();
        assert!(compiled.volatile_battery().is_empty());
        // The other batteries are untouched.
        assert!(!compiled.style_battery(PersonaStyle::Dismissive).is_empty());
    }

    #[test]
    fn threat_battery_matches_declined_invitation() {
        let compiled = Lexicon::default().compile();
        let text = "I won't be coming to the wedding";
        assert!(compiled.threat_battery().iter().any(|re| re.is_match(text)));
    }

    #[test]
    fn toml_roundtrip_preserves_tables() {
        let lexicon = Lexicon::default();
        let toml_text = toml::to_string_pretty(&lexicon).unwrap();
        let parsed: Lexicon = toml::from_str(&toml_text).unwrap();
        assert_eq!(parsed.styles, lexicon.styles);
        assert_eq!(parsed.themes, lexicon.themes);
        assert_eq!(parsed.threat_patterns, lexicon.threat_patterns);
        assert_eq!(parsed.theme_advice, lexicon.theme_advice);
    }

    #[test]
    fn load_from_path_reads_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexicon.toml");
        std::fs::write(&path, "positive_keywords = [\"splendid\"]\n").unwrap();
        let lexicon = Lexicon::load_from_path(&path).unwrap();
        assert_eq!(lexicon.positive_keywords, vec!["splendid".to_string()]);
        // Unlisted tables fall back to the defaults.
        assert!(!lexicon.threat_patterns.is_empty());
    }
}
