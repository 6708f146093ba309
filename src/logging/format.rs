//! Severity-to-template dispatch.
//!
//! A [`LevelFormatter`] holds an immutable, ascending array of
//! [`FormatRule`]s unique on threshold. An event is rendered with the rule
//! whose threshold is the greatest one not above the event's level.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::severity::Severity;
use crate::errors::{PipelineError, PipelineResult};

// Ascending, one entry per severity.
const STANDARD_RULES: [(Severity, &str); 6] = [
    (Severity::Trace, "{magenta}TRACE: {message}{off}"),
    (Severity::Debug, "{cyan}{level}: {message}{off}"),
    (Severity::Info, "{message}"),
    (Severity::Warning, "{green}{level}: {message}{off}"),
    (Severity::Error, "{red}{level}: {message}{off}"),
    (Severity::Critical, "{yellow}{level}: {message}{off}"),
];

/// A single log event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    pub level: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        LogEvent {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// ANSI styling tokens substituted into templates.
///
/// Templates reference colours as `{off}`, `{red}`, `{green}`, `{yellow}`,
/// `{blue}`, `{magenta}` and `{cyan}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub off: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub magenta: &'static str,
    pub cyan: &'static str,
}

impl Palette {
    pub fn ansi() -> Self {
        Palette {
            off: "\x1b[0m",
            red: "\x1b[91m",
            green: "\x1b[92m",
            yellow: "\x1b[93m",
            blue: "\x1b[94m",
            magenta: "\x1b[95m",
            cyan: "\x1b[96m",
        }
    }

    /// Every token maps to the empty string.
    pub fn plain() -> Self {
        Palette {
            off: "",
            red: "",
            green: "",
            yellow: "",
            blue: "",
            magenta: "",
            cyan: "",
        }
    }

    pub fn for_color(enabled: bool) -> Self {
        if enabled {
            Palette::ansi()
        } else {
            Palette::plain()
        }
    }

    /// Replace colour tokens in a template.
    pub fn apply(&self, template: &str) -> String {
        template
            .replace("{off}", self.off)
            .replace("{red}", self.red)
            .replace("{green}", self.green)
            .replace("{yellow}", self.yellow)
            .replace("{blue}", self.blue)
            .replace("{magenta}", self.magenta)
            .replace("{cyan}", self.cyan)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::ansi()
    }
}

/// Template used for events at or above `threshold`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRule {
    pub threshold: Severity,
    pub template: String,
}

impl FormatRule {
    /// Render a message through this rule. `{level}` is substituted first,
    /// `{message}` last so message text is never re-interpreted.
    pub fn render(&self, level: Severity, message: &str) -> String {
        self.template
            .replace("{level}", level.name())
            .replace("{message}", message)
    }
}

/// Sorted rule table queried by binary search.
#[derive(Debug, Clone)]
pub struct LevelFormatter {
    rules: Box<[FormatRule]>,
}

impl LevelFormatter {
    /// Build a formatter from `(threshold, template)` pairs. Colour tokens are
    /// resolved once here. A later pair with the same threshold replaces an
    /// earlier one.
    pub fn new<I, S>(rules: I, palette: &Palette) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (Severity, S)>,
        S: AsRef<str>,
    {
        let sorted: BTreeMap<Severity, String> = rules
            .into_iter()
            .map(|(threshold, template)| (threshold, palette.apply(template.as_ref())))
            .collect();

        if sorted.is_empty() {
            return Err(PipelineError::Configuration(
                "Level formatter needs at least one format rule".to_string(),
            ));
        }

        let rules = sorted
            .into_iter()
            .map(|(threshold, template)| FormatRule { threshold, template })
            .collect();

        Ok(LevelFormatter { rules })
    }

    /// The stock rule table: plain info lines, labelled and coloured
    /// everything else.
    pub fn standard(palette: &Palette) -> Self {
        let rules = STANDARD_RULES
            .iter()
            .map(|(threshold, template)| FormatRule {
                threshold: *threshold,
                template: palette.apply(template),
            })
            .collect();
        LevelFormatter { rules }
    }

    pub fn rules(&self) -> &[FormatRule] {
        &self.rules
    }

    /// Rule with the greatest threshold <= `level`. Levels below every
    /// threshold use the lowest rule, levels above every threshold the
    /// highest.
    pub fn select(&self, level: Severity) -> &FormatRule {
        let above = self.rules.partition_point(|rule| rule.threshold <= level);
        &self.rules[above.saturating_sub(1)]
    }

    pub fn format(&self, event: &LogEvent) -> String {
        self.select(event.level).render(event.level, &event.message)
    }
}
