//! Derive a document title and creation date from a file name.
//!
//! Two ordered rule lists are applied to the file stem:
//!
//! 1. **Date rules**: regular expressions with `date` and `remainder` named
//!    groups. The first rule producing a non-empty `date` wins and its
//!    `remainder` becomes the title source. Rules are anchored at the start
//!    of the name.
//! 2. **Title rules**: sed-style substitutions `s<d>pattern<d>replacement<d>flags`
//!    applied one after another, each replacing every match.
//!
//! Malformed rules are logged and skipped.
//!
//! # Example
//!
//! ```
//! use pngx::upload::filename::{MetadataExtractor, DEFAULT_DATE_RULE};
//! use std::path::Path;
//!
//! let extractor = MetadataExtractor::new(
//!     &[DEFAULT_DATE_RULE.to_string()],
//!     &["s/_/ /g".to_string()],
//!     &[],
//! );
//! let meta = extractor.extract(Path::new("scans/2024-03-05-my_invoice.pdf"));
//! assert_eq!(meta.created.as_deref(), Some("2024-03-05"));
//! assert_eq!(meta.title, "my invoice");
//! ```

use std::path::Path;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

/// Date rule used when neither config nor command line provide one.
pub const DEFAULT_DATE_RULE: &str =
    r"^(?:.*/)?(?P<date>\d{4}[-.]\d{2}[-.]\d{2})[-.]?(?P<remainder>.*)$";

/// Accepted input layouts for date normalisation.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y.%m.%d", "%Y%m%d"];

/// Why a rule could not be used.
#[derive(thiserror::Error, Debug)]
pub enum RuleError {
    #[error("Regular expression must start with 's': {0}")]
    NotSubstitution(String),

    #[error("Invalid regular expression: {rule} ({fields} fields)")]
    FieldCount { rule: String, fields: usize },

    #[error("Invalid regular expression {rule}: {source}")]
    Regex {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered date extraction rules.
#[derive(Debug, Clone, Default)]
pub struct DateRules {
    rules: Vec<Regex>,
}

impl DateRules {
    /// Compile `patterns`, logging and dropping the ones that do not compile.
    #[must_use]
    pub fn compile(patterns: &[String]) -> Self {
        let rules = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(&format!("^(?:{pattern})")) {
                Ok(re) => Some(re),
                Err(source) => {
                    log::error!(
                        "{}",
                        RuleError::Regex {
                            rule: pattern.clone(),
                            source
                        }
                    );
                    None
                }
            })
            .collect();
        Self { rules }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns `(date, title_source)`. Without a match the date is `None`
    /// and the title source is `name` itself.
    #[must_use]
    pub fn extract<'a>(&self, name: &'a str) -> (Option<&'a str>, &'a str) {
        for rule in &self.rules {
            let Some(caps) = rule.captures(name) else {
                continue;
            };

            let date = caps.name("date").map(|m| m.as_str()).filter(|d| !d.is_empty());
            if let Some(date) = date {
                let remainder = caps.name("remainder").map_or(name, |m| m.as_str());
                return (Some(date), remainder);
            }
        }
        (None, name)
    }
}

/// One sed-style substitution.
#[derive(Debug, Clone)]
pub struct TitleRule {
    source: String,
    pattern: Regex,
    replacement: String,
}

impl TitleRule {
    /// Parse `s<d>pattern<d>replacement[<d>flags]`.
    ///
    /// Supported flags: `g` (substitution is always global) and `i`
    /// (case-insensitive). Other flags are ignored with a warning.
    pub fn parse(rule: &str) -> Result<Self, RuleError> {
        let mut chars = rule.chars();
        if chars.next() != Some('s') {
            return Err(RuleError::NotSubstitution(rule.to_string()));
        }
        let Some(delim) = chars.next() else {
            return Err(RuleError::FieldCount {
                rule: rule.to_string(),
                fields: 1,
            });
        };

        let parts: Vec<&str> = rule.split(delim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(RuleError::FieldCount {
                rule: rule.to_string(),
                fields: parts.len(),
            });
        }

        let mut case_insensitive = false;
        for flag in parts.get(3).copied().unwrap_or_default().chars() {
            match flag {
                'g' => {}
                'i' => case_insensitive = true,
                other => log::warn!("Ignoring unsupported flag '{other}' in {rule}"),
            }
        }

        let pattern = RegexBuilder::new(parts[1])
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| RuleError::Regex {
                rule: rule.to_string(),
                source,
            })?;

        Ok(Self {
            source: rule.to_string(),
            pattern,
            replacement: translate_replacement(parts[2]),
        })
    }

    /// Replace every match in `input`.
    #[must_use]
    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement.as_str())
            .into_owned()
    }
}

/// Translate a Python/sed style replacement (`\1`, `\g<name>`) into the
/// `regex` crate's syntax. A literal `$` stays literal.
fn translate_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{group}}}"));
                }
                Some('g') => {
                    chars.next();
                    if chars.peek() == Some(&'<') {
                        chars.next();
                        let name: String = chars.by_ref().take_while(|&c| c != '>').collect();
                        out.push_str(&format!("${{{name}}}"));
                    } else {
                        out.push_str("\\g");
                    }
                }
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// Ordered title substitutions.
#[derive(Debug, Clone, Default)]
pub struct TitleRules {
    rules: Vec<TitleRule>,
}

impl TitleRules {
    /// Parse `rules`, logging and dropping malformed ones.
    #[must_use]
    pub fn compile(rules: &[String]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match TitleRule::parse(rule) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    log::error!("{err}");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order, each to the previous result.
    #[must_use]
    pub fn apply(&self, title: &str) -> String {
        let mut current = title.to_string();
        for rule in &self.rules {
            let next = rule.apply(&current);
            log::debug!("namere: {current} ~= {} → {next}", rule.source);
            current = next;
        }
        current
    }
}

/// Normalise a date to `YYYY-MM-DD` if it parses as a calendar date.
#[must_use]
pub fn normalize_date(raw: &str) -> Option<String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Title and creation date derived from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameMetadata {
    pub title: String,
    pub created: Option<String>,
}

/// Applies date rules, title rules and space replacement to file names.
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    date_rules: DateRules,
    title_rules: TitleRules,
    space_chars: Vec<char>,
}

impl MetadataExtractor {
    /// Compile the rule lists once for a whole batch.
    ///
    /// Every character of every `replace_with_spaces` entry is turned into a
    /// space after the title rules ran.
    #[must_use]
    pub fn new(date_rules: &[String], title_rules: &[String], replace_with_spaces: &[String]) -> Self {
        Self {
            date_rules: DateRules::compile(date_rules),
            title_rules: TitleRules::compile(title_rules),
            space_chars: replace_with_spaces.iter().flat_map(|s| s.chars()).collect(),
        }
    }

    /// Derive metadata for `path` from its stem.
    #[must_use]
    pub fn extract(&self, path: &Path) -> FilenameMetadata {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (date, source) = self.date_rules.extract(&stem);
        let created = match date {
            Some(raw) => {
                log::debug!("Extracted date {raw} from filename {}", path.display());
                Some(normalize_date(raw).unwrap_or_else(|| {
                    log::warn!("'{raw}' from {} is not a valid date, passing it on as is", path.display());
                    raw.to_string()
                }))
            }
            None => {
                if !self.date_rules.is_empty() {
                    log::debug!("Failed to extract date from filename {}", path.display());
                }
                None
            }
        };

        let source = if source.is_empty() { stem.as_str() } else { source };
        let mut title = self.title_rules.apply(source);
        if !self.space_chars.is_empty() {
            title = title
                .chars()
                .map(|c| if self.space_chars.contains(&c) { ' ' } else { c })
                .collect();
        }

        log::debug!("Title extracted from {}: {title}", path.display());
        FilenameMetadata { title, created }
    }
}
