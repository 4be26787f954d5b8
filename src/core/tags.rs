use serde::{Deserialize, Serialize};

/// Every tag ever attached to any task, kept for input suggestions.
///
/// Labels keep the casing they were first seen with and are matched
/// case-insensitively. The index is derived from task tag lists and is never
/// pruned, deleting the last task using a tag keeps the tag suggestible.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagIndex {
    tags: Vec<String>,
}

impl TagIndex {
    pub fn new(tags: Vec<String>) -> Self {
        Self { tags }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Adds every label that is not yet known. First-seen casing wins.
    pub fn register<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            let tag = tag.as_ref();
            if tag.is_empty() {
                continue;
            }
            let lower = tag.to_lowercase();
            if !self.tags.iter().any(|known| known.to_lowercase() == lower) {
                self.tags.push(tag.to_string());
            }
        }
    }

    /// Known tags whose lowercase form starts with `partial`, skipping tags that
    /// already occur in the `entered` input string. An incremental filter for
    /// autocomplete, not fuzzy matching.
    pub fn suggest(&self, partial: &str, entered: &str) -> Vec<&str> {
        let partial = partial.trim().to_lowercase();
        if partial.is_empty() {
            return Vec::new();
        }
        let entered = entered.to_lowercase();

        self.tags
            .iter()
            .filter(|tag| {
                let lower = tag.to_lowercase();
                lower.starts_with(&partial) && !entered.contains(&lower)
            })
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TagIndex;

    #[test]
    fn register_keeps_first_seen_casing() {
        let mut index = TagIndex::default();
        index.register(["Work", "work", "WORK", "focus"]);

        assert_eq!(index.as_slice(), ["Work", "focus"]);
    }

    #[test]
    fn suggest_matches_prefixes_case_insensitively() {
        let mut index = TagIndex::default();
        index.register(["Meeting", "meta", "urgent"]);

        assert_eq!(index.suggest("me", ""), vec!["Meeting", "meta"]);
        assert_eq!(index.suggest("URG", ""), vec!["urgent"]);
    }

    #[test]
    fn suggest_skips_tags_already_entered() {
        let mut index = TagIndex::default();
        index.register(["meeting", "meta"]);

        assert_eq!(index.suggest("me", "Meeting, ur"), vec!["meta"]);
    }

    #[test]
    fn suggest_with_empty_partial_is_silent() {
        let mut index = TagIndex::default();
        index.register(["meeting"]);

        assert!(index.suggest("  ", "").is_empty());
    }
}
