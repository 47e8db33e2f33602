// ABOUTME: Category labels and legacy alias folding.
// ABOUTME: Every comparison or grouping by category goes through normalize_category first.

pub const TOP_100: &str = "Top 100";
pub const SOUTH_AMERICA: &str = "South America";

/// Folds legacy category labels to their canonical form.
///
/// Unknown labels come back trimmed; a missing label is the empty string.
pub fn normalize_category(category: Option<&str>) -> String {
    let Some(raw) = category else {
        return String::new();
    };
    let cleaned = raw.trim();
    match cleaned.to_lowercase().as_str() {
        "south" | "south america" => SOUTH_AMERICA.to_string(),
        "top 100" | "main" => TOP_100.to_string(),
        _ => cleaned.to_string(),
    }
}

/// Category filter used by reports: `all` matches everything.
pub fn category_matches(filter: &str, category: &str) -> bool {
    let filter = filter.trim();
    if filter.eq_ignore_ascii_case("all") {
        return true;
    }
    normalize_category(Some(filter)) == normalize_category(Some(category))
}
