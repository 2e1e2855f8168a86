//! Content gate consulted before any throttle accounting.

use parking_lot::RwLock;
use regex::Regex;
use tracing::warn;

/// Verdict on outgoing text. A `true` verdict drops the attempt before it
/// reaches the throttle, so filtered content never consumes lock budget.
pub trait ContentFilter: Send + Sync {
    fn is_filtered(&self, text: &str) -> bool;
}

/// Filter that passes everything.
#[derive(Debug, Default)]
pub struct NoFilter;

impl ContentFilter for NoFilter {
    fn is_filtered(&self, _text: &str) -> bool {
        false
    }
}

/// Regex-set filter: a message matching any pattern is filtered.
pub struct PatternFilter {
    patterns: RwLock<Vec<Regex>>,
}

impl PatternFilter {
    /// Build from pattern strings. Invalid patterns are skipped with a warning.
    pub fn new(patterns: &[String]) -> Self {
        let compiled = patterns.iter().filter_map(|p| compile(p)).collect();
        Self {
            patterns: RwLock::new(compiled),
        }
    }

    /// Add a pattern at runtime.
    pub fn add_pattern(&self, pattern: &str) -> Result<(), String> {
        let re = Regex::new(pattern)
            .map_err(|e| format!("Invalid filter pattern '{}': {}", pattern, e))?;
        self.patterns.write().push(re);
        Ok(())
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.read().len()
    }
}

impl ContentFilter for PatternFilter {
    fn is_filtered(&self, text: &str) -> bool {
        self.patterns.read().iter().any(|re| re.is_match(text))
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "skipping invalid filter pattern");
            None
        }
    }
}
