//! Heuristic token classification for a single line of portal result text.
//!
//! The input is mixed-script (Hindi office names, English status phrases,
//! numeric identifiers) with no delimiter discipline, so fields are recovered
//! by positional and lexical pattern. Rule order and tie-breaks are
//! deliberately preserved from the portal's observed output format; tightening
//! them changes which real rows parse.

use regex::Regex;

/// Semantic bucket for one whitespace token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Fragment of the issuing-office name, in original order.
    OfficeFragment(String),
    /// All-digit identifier, length >= 8. First seen = primary.
    NumericId(String),
    /// Single leading letter followed by digits, e.g. "K119269051".
    AlphanumericId(String),
    /// Joined status phrase from the trigger through a `)`-terminated token.
    StatusFragment(String),
    /// Matched no rule; dropped at assembly.
    Unclassified(String),
}

#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// A line qualifies for classification only if it contains one of these.
    pub authority_markers: Vec<&'static str>,
    /// Two-token phrase that opens the status field.
    pub status_trigger: (&'static str, &'static str),
    /// The third status token must contain this.
    pub status_tail: &'static str,
    /// Layout keywords that are never part of the office name.
    pub structural_keywords: Vec<&'static str>,
    /// Keywords that disqualify an otherwise id-shaped token.
    pub non_id_keywords: Vec<&'static str>,
    pub min_numeric_len: usize,
    pub min_alnum_len: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            authority_markers: vec!["प्राधिकृत अधिकारी", "Officer"],
            status_trigger: ("Ration", "Card"),
            status_tail: "Printed",
            structural_keywords: vec![
                "Ration", "Card", "Printed", "Form", "Token", "User", "Status",
            ],
            non_id_keywords: vec!["Printed"],
            min_numeric_len: 8,
            min_alnum_len: 6,
        }
    }
}

impl ClassifyConfig {
    /// Second-chance pattern for a status phrase the token scan missed:
    /// the literal trigger phrase followed by a parenthesized tail.
    pub fn status_pattern(&self) -> Option<Regex> {
        let pat = format!(
            r"{} {} {}\([^)]+\)",
            regex::escape(self.status_trigger.0),
            regex::escape(self.status_trigger.1),
            regex::escape(self.status_tail),
        );
        Regex::new(&pat).ok()
    }

    fn is_marker_word(&self, token: &str) -> bool {
        self.authority_markers
            .iter()
            .any(|m| m.split_whitespace().any(|w| w == token))
    }
}

/// Whether a raw line is worth classifying: it must name an authority and
/// carry at least one digit.
pub fn line_is_classifiable(cfg: &ClassifyConfig, line: &str) -> bool {
    cfg.authority_markers.iter().any(|m| line.contains(m))
        && line.chars().any(|c| c.is_numeric())
}

fn is_numeric_id(cfg: &ClassifyConfig, token: &str) -> bool {
    token.len() >= cfg.min_numeric_len && token.chars().all(|c| c.is_ascii_digit())
}

fn has_alnum_id_shape(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() => {}
        _ => return false,
    }
    let rest = chars.as_str();
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

fn is_alphanumeric_id(cfg: &ClassifyConfig, token: &str) -> bool {
    token.chars().count() >= cfg.min_alnum_len
        && has_alnum_id_shape(token)
        && !cfg.non_id_keywords.iter().any(|k| token.contains(k))
}

/// Split a result line into classified tokens.
///
/// Stateful left-to-right scan; first matching rule wins. A status trigger
/// ends the pass whether or not its forward scan finds a closing parenthesis
/// (the status phrase is the last meaningful field on these lines). When the
/// scan finds no closer, no status fragment is produced; callers fall back to
/// [`status_fallback`] on the raw line.
pub fn classify(cfg: &ClassifyConfig, line: &str) -> Vec<Token> {
    // Asterisks are table decoration, not content.
    let stripped = line.replace('*', "");
    let parts: Vec<&str> = stripped.split_whitespace().collect();

    let mut out = Vec::with_capacity(parts.len());
    let mut i = 0;
    while i < parts.len() {
        let part = parts[i];
        if is_numeric_id(cfg, part) {
            out.push(Token::NumericId(part.to_string()));
        } else if is_alphanumeric_id(cfg, part) {
            out.push(Token::AlphanumericId(part.to_string()));
        } else if part == cfg.status_trigger.0
            && i + 2 < parts.len()
            && parts[i + 1] == cfg.status_trigger.1
            && parts[i + 2].contains(cfg.status_tail)
        {
            let mut j = i;
            while j < parts.len() && !parts[j].ends_with(')') {
                j += 1;
            }
            if j < parts.len() {
                out.push(Token::StatusFragment(parts[i..=j].join(" ")));
            }
            break;
        } else if !part.chars().all(|c| c.is_ascii_digit())
            && !(part.chars().count() > 5 && has_alnum_id_shape(part))
            && !cfg.structural_keywords.contains(&part)
            && !cfg.is_marker_word(part)
        {
            out.push(Token::OfficeFragment(part.to_string()));
        } else {
            out.push(Token::Unclassified(part.to_string()));
        }
        i += 1;
    }
    out
}

/// Regex second chance for a status phrase without a `)`-terminated token in
/// the whitespace scan (line-break inside the parentheses, trailing noise).
pub fn status_fallback(cfg: &ClassifyConfig, line: &str) -> Option<String> {
    let re = cfg.status_pattern()?;
    re.find(line).map(|m| m.as_str().to_string())
}
