use regex::{Regex, RegexBuilder};

/// A user-entered column pattern, compiled once.
///
/// Matching is a case-insensitive substring search. An empty or rejected
/// pattern disables the predicate instead of producing an error: it passes
/// every row for visibility purposes and hits no row for match queries.
#[derive(Clone)]
pub struct RegexPredicate {
    /// Pattern text as entered
    pattern: String,

    /// Compiled regex, `None` when empty or rejected
    regex: Option<Regex>,
}

impl RegexPredicate {
    pub fn new(pattern: &str) -> Self {
        Self {
            regex: compile(pattern),
            pattern: pattern.to_string(),
        }
    }

    /// A predicate with no pattern
    pub fn empty() -> Self {
        Self {
            pattern: String::new(),
            regex: None,
        }
    }

    /// Whether `pattern` is usable as a filter.
    ///
    /// Rejects the empty string, a dangling trailing backslash, numeric
    /// back-references (`\1`..`\9`), an unterminated character class, and
    /// anything else the regex engine refuses to compile.
    pub fn validate(pattern: &str) -> bool {
        compile(pattern).is_some()
    }

    /// One-shot search of `text` for `pattern`.
    ///
    /// Returns `None` when the pattern fails [`validate`](Self::validate).
    pub fn evaluate(pattern: &str, text: &str) -> Option<bool> {
        compile(pattern).map(|re| re.is_match(text))
    }

    /// Search `text`; `None` when the predicate is disabled
    pub fn is_match(&self, text: &str) -> Option<bool> {
        self.regex.as_ref().map(|re| re.is_match(text))
    }

    /// Visibility semantics: a disabled predicate lets everything through
    pub fn passes(&self, text: &str) -> bool {
        self.is_match(text).unwrap_or(true)
    }

    /// Match-query semantics: a disabled predicate hits nothing
    pub fn hits(&self, text: &str) -> bool {
        self.is_match(text).unwrap_or(false)
    }

    /// Get the pattern text
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// No pattern entered
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// A pattern was entered but rejected
    pub fn is_invalid(&self) -> bool {
        !self.pattern.is_empty() && self.regex.is_none()
    }
}

impl Default for RegexPredicate {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for RegexPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegexPredicate")
            .field("pattern", &self.pattern)
            .field("valid", &self.regex.is_some())
            .finish()
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    if !well_formed(pattern) {
        return None;
    }
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "pattern rejected by regex engine");
            None
        }
    }
}

/// Cheap syntactic screen run before the regex compiler
fn well_formed(pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }

    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    // Just after `[` or `[^`, where a `]` is literal
    let mut class_start = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                None => return false,
                Some('1'..='9') => return false,
                Some(_) => {}
            },
            '[' if !in_class => {
                in_class = true;
                class_start = true;
                if chars.peek() == Some(&'^') {
                    chars.next();
                }
                continue;
            }
            ']' if in_class && !class_start => in_class = false,
            _ => {}
        }
        class_start = false;
    }

    !in_class
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects() {
        assert!(!RegexPredicate::validate(""));
        assert!(!RegexPredicate::validate(r"abc\"));
        assert!(!RegexPredicate::validate(r"abc\\\"));
        assert!(!RegexPredicate::validate(r"(a)\1"));
        assert!(!RegexPredicate::validate(r"\9"));
        assert!(!RegexPredicate::validate("[abc"));
        assert!(!RegexPredicate::validate("[^"));
        assert!(!RegexPredicate::validate("(unclosed"));
    }

    #[test]
    fn test_validate_accepts() {
        assert!(RegexPredicate::validate("abc"));
        assert!(RegexPredicate::validate(r"abc\\"));
        assert!(RegexPredicate::validate(r"\d+ms"));
        assert!(RegexPredicate::validate("[]a]"));
        assert!(RegexPredicate::validate("[^]x]"));
        assert!(RegexPredicate::validate(r"\[literal"));
    }

    #[test]
    fn test_evaluate_is_case_insensitive_search() {
        assert_eq!(RegexPredicate::evaluate("error", "An ERROR occurred"), Some(true));
        assert_eq!(RegexPredicate::evaluate("^error", "An ERROR occurred"), Some(false));
        assert_eq!(RegexPredicate::evaluate("[abc", "abc"), None);
    }

    #[test]
    fn test_disabled_predicate_semantics() {
        for pattern in ["", r"\1", "[open"] {
            let p = RegexPredicate::new(pattern);
            assert!(p.passes("anything"));
            assert!(!p.hits("anything"));
        }
        assert!(RegexPredicate::new("[open").is_invalid());
        assert!(!RegexPredicate::new("").is_invalid());
    }
}
