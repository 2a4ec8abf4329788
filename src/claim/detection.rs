use regex::Regex;

use super::reference::ReferenceCatalog;
use super::types::{ClaimError, ConditionMatch};
use super::vocabulary::{phrases_for, DOMAIN_TERMS};

/// A compiled phrase with its weight (the phrase's word count).
struct WeightedPattern {
    phrase: String,
    weight: u32,
    regex: Regex,
}

struct ConditionPatterns {
    condition: String,
    patterns: Vec<WeightedPattern>,
}

/// Deterministic keyword scorer for clinical notes.
///
/// Phrases match case-insensitively as whole words; multi-word phrases match
/// contiguous words separated by any whitespace. Never fails: a note that
/// matches nothing yields an empty ranking.
pub struct ConditionDetector {
    conditions: Vec<ConditionPatterns>,
    domain_terms: Vec<Regex>,
}

impl ConditionDetector {
    /// Build a detector from `(condition, phrases)` pairs. Order of the pairs
    /// is the tie-break order.
    pub fn new<I, C, P>(vocabulary: I, domain_terms: &[&str]) -> Self
    where
        I: IntoIterator<Item = (C, Vec<P>)>,
        C: Into<String>,
        P: AsRef<str>,
    {
        let conditions = vocabulary
            .into_iter()
            .map(|(condition, phrases)| ConditionPatterns {
                condition: condition.into(),
                patterns: phrases
                    .iter()
                    .filter_map(|p| compile_phrase(p.as_ref()))
                    .collect(),
            })
            .collect();

        let domain_terms = domain_terms
            .iter()
            .filter_map(|t| compile_phrase(t).map(|p| p.regex))
            .collect();

        Self {
            conditions,
            domain_terms,
        }
    }

    /// Detector over the full built-in chronic disease vocabulary.
    #[cfg(test)]
    pub(crate) fn builtin() -> Self {
        Self::new(
            super::vocabulary::CONDITION_VOCABULARY
                .iter()
                .map(|(name, phrases)| (*name, phrases.to_vec())),
            DOMAIN_TERMS,
        )
    }

    /// Detector restricted to the catalog's conditions, in catalog order.
    /// Each condition's own name is always one of its phrases.
    pub fn from_catalog(catalog: &ReferenceCatalog) -> Self {
        let vocabulary: Vec<(String, Vec<String>)> = catalog
            .condition_names()
            .into_iter()
            .map(|name| {
                let own = name.to_lowercase();
                let mut phrases: Vec<String> = phrases_for(name)
                    .unwrap_or_default()
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                if !phrases.contains(&own) {
                    phrases.push(own);
                }
                (name.to_string(), phrases)
            })
            .collect();

        tracing::debug!(conditions = vocabulary.len(), "Detector built from catalog");
        Self::new(vocabulary, DOMAIN_TERMS)
    }

    /// Ranked candidate conditions, best first.
    pub fn detect(&self, note: &str) -> Vec<String> {
        self.score(note).into_iter().map(|m| m.condition).collect()
    }

    /// Score every condition; keep those above zero, sorted by descending
    /// score. `sort_by` is stable, so ties keep vocabulary order.
    pub fn score(&self, note: &str) -> Vec<ConditionMatch> {
        let mut matches: Vec<ConditionMatch> = self
            .conditions
            .iter()
            .filter_map(|c| {
                let mut score = 0u32;
                let mut matched_terms = Vec::new();
                for p in &c.patterns {
                    let hits = p.regex.find_iter(note).count() as u32;
                    if hits > 0 {
                        score += hits * p.weight;
                        matched_terms.push(p.phrase.clone());
                    }
                }
                (score > 0).then(|| ConditionMatch {
                    condition: c.condition.clone(),
                    score,
                    matched_terms,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }

    /// Relatedness gate: any generic domain term or any condition phrase.
    pub fn is_related(&self, note: &str) -> bool {
        self.domain_terms.iter().any(|re| re.is_match(note))
            || self
                .conditions
                .iter()
                .flat_map(|c| c.patterns.iter())
                .any(|p| p.regex.is_match(note))
    }

    /// Full gate sequence used by the workflow: reject blank notes, then
    /// out-of-domain notes, then notes with no scored condition.
    pub fn analyze(&self, note: &str) -> Result<Vec<ConditionMatch>, ClaimError> {
        if note.trim().is_empty() {
            return Err(ClaimError::EmptyNote);
        }
        if !self.is_related(note) {
            return Err(ClaimError::OutOfDomainNote);
        }
        let matches = self.score(note);
        if matches.is_empty() {
            return Err(ClaimError::NoConditionDetected);
        }
        Ok(matches)
    }
}

/// `(?i)\bword\s+word\b`. Words are escaped; empty phrases are skipped.
fn compile_phrase(phrase: &str) -> Option<WeightedPattern> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    let body = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join(r"\s+");

    match Regex::new(&format!(r"(?i)\b{body}\b")) {
        Ok(regex) => Some(WeightedPattern {
            phrase: words.join(" ").to_lowercase(),
            weight: words.len() as u32,
            regex,
        }),
        Err(e) => {
            tracing::warn!(phrase, error = %e, "Skipping uncompilable detection phrase");
            None
        }
    }
}
