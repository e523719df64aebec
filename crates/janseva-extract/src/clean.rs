//! Candidate-string cleanup for unstructured portal text.
//!
//! Portals decorate the interesting strings with label prefixes
//! ("Service :", "Name:"), navigation suffixes ("- View More") and stray
//! markup characters. `clean` strips all of that and rejects candidates that
//! are too short, too long, or plain UI chrome.

/// Static tables driving [`clean`]. Pass the same value for a whole run;
/// there is no global state.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Label prefixes stripped case-insensitively; first match wins.
    pub prefixes: Vec<&'static str>,
    /// Navigation suffixes stripped case-insensitively; first match wins.
    pub suffixes: Vec<&'static str>,
    /// Candidates exactly equal to one of these (case-insensitive) are chrome.
    pub stopwords: Vec<&'static str>,
    /// Short candidates must contain one of these to survive.
    pub domain_keywords: Vec<&'static str>,
    /// Final length bounds, in characters.
    pub min_len: usize,
    pub max_len: usize,
    /// Below this length the domain-keyword requirement kicks in.
    pub short_len: usize,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "Service :",
                "Service:",
                "Service Name :",
                "Service Name:",
                "Service Type :",
                "Service Type:",
                "Application :",
                "Application:",
                "Form :",
                "Form:",
                "Certificate :",
                "Certificate:",
                "Name :",
                "Name:",
            ],
            suffixes: vec![
                "- Click for more details",
                "- View More",
                "- More Info",
                "- Details",
                "Click here",
                "View More",
            ],
            stopwords: vec![
                "search", "result", "click", "view", "more", "date", "time", "status",
                "here", "details", "receipt", "number",
            ],
            domain_keywords: vec![
                "certificate",
                "registration",
                "license",
                "verification",
                "application",
                "form",
                "permit",
                "approval",
            ],
            min_len: 5,
            max_len: 200,
            short_len: 20,
        }
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if text.len() < prefix.len() || !text.is_char_boundary(prefix.len()) {
        return None;
    }
    text[..prefix.len()]
        .eq_ignore_ascii_case(prefix)
        .then(|| text[prefix.len()..].trim_start())
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    if text.len() < suffix.len() {
        return None;
    }
    let cut = text.len() - suffix.len();
    if !text.is_char_boundary(cut) {
        return None;
    }
    text[cut..]
        .eq_ignore_ascii_case(suffix)
        .then(|| text[..cut].trim_end())
}

/// Normalize one raw candidate string, or reject it as unusable.
///
/// The rule order matters and is load-bearing: prefix strip, suffix strip,
/// whitespace collapse, bracket/quote trim, stopword check, length bounds,
/// then the short-text keyword gate.
pub fn clean(cfg: &CleanConfig, raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if text.chars().count() < 3 {
        return None;
    }

    for prefix in &cfg.prefixes {
        if let Some(rest) = strip_prefix_ci(text, prefix) {
            text = rest;
            break;
        }
    }
    for suffix in &cfg.suffixes {
        if let Some(rest) = strip_suffix_ci(text, suffix) {
            text = rest;
            break;
        }
    }

    // Collapses runs of whitespace and drops embedded line breaks in one pass.
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let text = collapsed.trim_matches(|c| "\"'()[]{}".contains(c)).to_string();

    let lower = text.to_lowercase();
    if cfg.stopwords.iter().any(|w| lower == *w) {
        return None;
    }

    let chars = text.chars().count();
    if chars < cfg.min_len || chars > cfg.max_len {
        return None;
    }

    // Short incidental UI strings rarely carry a domain word; genuine short
    // labels ("Birth Certificate") do.
    if chars < cfg.short_len && !cfg.domain_keywords.iter().any(|k| lower.contains(k)) {
        return None;
    }

    Some(text)
}
