use super::keywords::KeywordSet;

/// Keywords that occur in the upper-cased `title + " " + description`.
///
/// Matching is plain substring containment, not word-bounded: "EPS" matches
/// inside "SWEEPS". An empty keyword set never matches anything.
pub fn match_keywords(
    title: &str,
    description: Option<&str>,
    keywords: &KeywordSet,
) -> Vec<String> {
    if keywords.is_empty() {
        return Vec::new();
    }

    let text = format!("{} {}", title, description.unwrap_or_default()).to_uppercase();

    keywords
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .map(str::to_string)
        .collect()
}
