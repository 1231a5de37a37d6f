//! Pattern-based intent classification.
//!
//! An utterance is normalized (trimmed, lower-cased) and scanned against an
//! ordered rule table. The first rule whose pattern matches wins, so more
//! specific patterns must sit above the general ones they overlap with
//! ("play X on youtube" above "play X").

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Classified category of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Open,
    Search,
    Volume,
    System,
    Media,
    Youtube,
    Reminder,
    Joke,
    Screenshot,
    Weather,
    Calculate,
    SystemInfo,
    Lock,
    Time,
    Date,
    Unknown,
}

impl Intent {
    /// Every intent tag, in the order of the public contract.
    pub const ALL: [Intent; 16] = [
        Intent::Open,
        Intent::Search,
        Intent::Volume,
        Intent::System,
        Intent::Media,
        Intent::Youtube,
        Intent::Reminder,
        Intent::Joke,
        Intent::Screenshot,
        Intent::Weather,
        Intent::Calculate,
        Intent::SystemInfo,
        Intent::Lock,
        Intent::Time,
        Intent::Date,
        Intent::Unknown,
    ];

    /// Stable tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Open => "open",
            Intent::Search => "search",
            Intent::Volume => "volume",
            Intent::System => "system",
            Intent::Media => "media",
            Intent::Youtube => "youtube",
            Intent::Reminder => "reminder",
            Intent::Joke => "joke",
            Intent::Screenshot => "screenshot",
            Intent::Weather => "weather",
            Intent::Calculate => "calculate",
            Intent::SystemInfo => "system_info",
            Intent::Lock => "lock",
            Intent::Time => "time",
            Intent::Date => "date",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .iter()
            .copied()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| format!("Unknown intent: {}", s))
    }
}

/// Result of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub intent: Intent,
    /// First capture group of the matching rule, empty when the rule has
    /// none. For `Unknown` this is the whole normalized text.
    pub parameter: String,
}

/// Ordered rule table. Evaluation order is part of the contract.
const RULE_TABLE: &[(&str, Intent)] = &[
    (r"open\s+(?:the\s+)?(.+)", Intent::Open),
    (r"search\s+(?:for\s+)?(.+)", Intent::Search),
    (r"(?:volume|turn)\s+(up|down|mute)", Intent::Volume),
    (r"^(run\s+.+|list processes|system monitor)$", Intent::System),
    (r"\b(exit|quit|shutdown|restart)\b", Intent::System),
    (r"play\s+(.+)\s+on\s+youtube", Intent::Youtube),
    (r"play\s+(.+)", Intent::Media),
    (r"remind\s+me\s+to\s+(.+)", Intent::Reminder),
    (r"(tell me a )?joke( of the day)?", Intent::Joke),
    (r"screenshot", Intent::Screenshot),
    (
        r"weather\b(?:\s+(?:(?:in|for|at)\b\s*)?(.*))?",
        Intent::Weather,
    ),
    (r"calculate\s+(.+)", Intent::Calculate),
    (r"system\s+info", Intent::SystemInfo),
    (r"lock\s+screen", Intent::Lock),
    (r"what'?s?\s+(?:the\s+)?time", Intent::Time),
    (r"what'?s?\s+(?:the\s+)?date", Intent::Date),
];

struct Rule {
    pattern: Regex,
    intent: Intent,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_TABLE
            .iter()
            .filter_map(|(pattern, intent)| match Regex::new(pattern) {
                Ok(pattern) => Some(Rule {
                    pattern,
                    intent: *intent,
                }),
                Err(e) => {
                    tracing::error!("Skipping invalid {} pattern {:?}: {}", intent, pattern, e);
                    None
                }
            })
            .collect()
    })
}

/// Normalize an utterance for matching.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classify an utterance. Total and side-effect free.
pub fn classify(text: &str) -> Classification {
    let command = normalize(text);

    for rule in rules() {
        if let Some(caps) = rule.pattern.captures(&command) {
            let parameter = caps
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            return Classification {
                intent: rule.intent,
                parameter,
            };
        }
    }

    Classification {
        intent: Intent::Unknown,
        parameter: command,
    }
}
