//! Loose matching of concrete URIs against resource URI templates.

use regex::Regex;

/// Returns whether `uri` plausibly matches `uri_template`.
///
/// Each `{variable}` expression matches one non-empty path segment; the rest
/// of the template must match literally. Templates that cannot be compiled
/// are treated as matching.
#[must_use]
pub fn uri_matches_template(uri_template: &str, uri: &str) -> bool {
    template_pattern(uri_template).is_none_or(|pattern| pattern.is_match(uri))
}

fn template_pattern(uri_template: &str) -> Option<Regex> {
    let expression = Regex::new(r"\{\w+\}").ok()?;
    let mut pattern = String::from("^");
    let mut literal_start = 0;
    for found in expression.find_iter(uri_template) {
        pattern.push_str(&regex::escape(uri_template.get(literal_start..found.start())?));
        pattern.push_str("[^/]+");
        literal_start = found.end();
    }
    pattern.push_str(&regex::escape(uri_template.get(literal_start..)?));
    pattern.push('$');
    Regex::new(&pattern).ok()
}
