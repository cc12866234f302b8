//! Keyword rule table — the assistant's response selector.
//!
//! Rules are an ordered list of `(keyword, response)` pairs. Input is
//! lowercased and scanned for each keyword as a plain substring, in declared
//! order; the first hit wins. Overlapping keywords (`"safe"` inside
//! `"unsafe"`) are resolved by that order alone, so the table must list the
//! more specific keyword first when that is the intended reading.
//!
//! When nothing matches, one of the default responses is picked uniformly
//! at random. The random source is a parameter; the keyword path never
//! touches it.

use rand::Rng;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule #{index} has an empty keyword")]
    EmptyKeyword { index: usize },
    #[error("rule '{keyword}' has an empty response")]
    EmptyResponse { keyword: String },
    #[error("at least one default response is required")]
    NoDefaults,
    #[error("default response #{index} is empty")]
    EmptyDefault { index: usize },
}

// ── Built-in table ────────────────────────────────────────────────────────────

/// `unsafe` sits ahead of `safe`: "is it unsafe?" should get the unsafe answer.
const CLOUDBURST_RULES: &[(&str, &str)] = &[
    (
        "red",
        "🔴 Red on the map indicates SEVERE cloudburst activity with high intensity. These areas pose significant risk for launch operations and should be avoided.",
    ),
    (
        "green",
        "🟢 Green represents MILD cloudburst activity with low intensity. These areas are generally safe for launch operations with minimal weather-related risks.",
    ),
    (
        "yellow",
        "🟡 Yellow shows MODERATE cloudburst activity. While not as dangerous as red zones, caution is advised for launch operations in these areas.",
    ),
    (
        "unsafe",
        "Unsafe zones are marked in red with severe weather activity. ISRO Sriharikota is currently unsafe due to high cloudburst activity in the Bay of Bengal region.",
    ),
    (
        "safe",
        "Safe zones are marked in green and have minimal cloudburst activity. Current safe launch facilities include Thumba Equatorial and Balasore Test Range.",
    ),
    (
        "update",
        "The map updates every 30 seconds with real-time satellite data from our weather monitoring network. The system provides continuous 24/7 surveillance.",
    ),
    (
        "launch",
        "Launch recommendations are based on weather patterns, satellite data, and cloudburst intensity. We analyze atmospheric conditions in a 50km radius around each facility.",
    ),
    (
        "help",
        "I can explain map colors, discuss launch safety, provide zone updates, explain weather patterns, and answer questions about the detection system.",
    ),
    (
        "cloudburst",
        "Cloudbursts are sudden, intense rainfall events that can dump large amounts of water in a short time. Our satellites detect these using advanced weather radar and prediction algorithms.",
    ),
];

const CLOUDBURST_DEFAULTS: &[&str] = &[
    "I understand you're asking about our cloudburst detection system. Could you be more specific about what you'd like to know?",
    "Great question! Our system monitors weather patterns across India and the Indian Ocean. Is there a particular aspect you'd like me to explain?",
    "I'm here to help with any questions about launch safety, weather patterns, or how our detection system works. What specific information do you need?",
    "Our system provides real-time weather monitoring for launch operations. Would you like to know about current conditions or how the system works?",
];

// ── Rule / RuleTable ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    keyword: String,
    response: String,
}

impl Rule {
    /// Lowercased keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn response(&self) -> &str {
        &self.response
    }
}

#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    defaults: Vec<String>,
}

impl RuleTable {
    /// Build a table from `(keyword, response)` pairs in match order.
    ///
    /// Keywords are lowercased here so lookups only lowercase the input.
    /// Surrounding whitespace in a keyword is kept: `" red "` only matches
    /// the word with spaces around it.
    pub fn new<I, K, R>(rules: I, defaults: Vec<String>) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = (K, R)>,
        K: AsRef<str>,
        R: Into<String>,
    {
        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, (keyword, response))| {
                let keyword = keyword.as_ref().to_lowercase();
                if keyword.is_empty() {
                    return Err(RuleError::EmptyKeyword { index });
                }
                let response: String = response.into();
                if response.trim().is_empty() {
                    return Err(RuleError::EmptyResponse { keyword });
                }
                Ok(Rule { keyword, response })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if defaults.is_empty() {
            return Err(RuleError::NoDefaults);
        }
        if let Some(index) = defaults.iter().position(|d| d.trim().is_empty()) {
            return Err(RuleError::EmptyDefault { index });
        }

        Ok(Self { rules, defaults })
    }

    /// The assistant's built-in keyword table and fallback answers.
    pub fn cloudburst() -> Self {
        Self {
            rules: CLOUDBURST_RULES
                .iter()
                .map(|(k, r)| Rule { keyword: (*k).to_string(), response: (*r).to_string() })
                .collect(),
            defaults: CLOUDBURST_DEFAULTS.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// First rule whose keyword occurs in the lowercased input.
    pub fn match_rule(&self, input: &str) -> Option<&Rule> {
        let input = input.to_lowercase();
        self.rules.iter().find(|r| input.contains(r.keyword.as_str()))
    }

    /// Pick the reply for `input`: the first matching rule's response, or a
    /// uniformly chosen default.
    pub fn respond<R: Rng + ?Sized>(&self, input: &str, rng: &mut R) -> &str {
        match self.match_rule(input) {
            Some(rule) => &rule.response,
            None => self.fallback(rng),
        }
    }

    /// One default response, chosen uniformly.
    pub fn fallback<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // `new` and `cloudburst` both guarantee at least one default.
        &self.defaults[rng.gen_range(0..self.defaults.len())]
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::cloudburst()
    }
}
