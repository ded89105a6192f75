//! Naming utilities for SchemaShift
//!
//! Identifier normalization plus the derived names used throughout the
//! pipeline: table names, foreign-key columns, join tables, constraint and
//! index names.

use inflector::Inflector;

/// Canonicalize a raw identifier to snake_case.
///
/// `-` and whitespace become `_`, leading/trailing `_` are trimmed and a `_` is
/// inserted at every lowercase→uppercase boundary and before the last capital
/// of an uppercase run followed by lowercase (`HTTPServer` → `http_server`).
/// Digits count as lowercase. An empty result means "no override".
pub fn normalize_identifier(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect();
    let chars: Vec<char> = replaced.trim_matches('_').chars().collect();

    let mut normalized = String::with_capacity(chars.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                normalized.push('_');
            }
        }
        normalized.extend(c.to_lowercase());
    }

    normalized
}

/// Normalize an optional override, treating an empty result as absent
pub fn normalize_override(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_identifier).filter(|name| !name.is_empty())
}

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Table name for an entity
pub fn get_table_name(entity_name: &str, pluralize_tables: bool) -> String {
    let name = normalize_identifier(entity_name);

    if pluralize_tables {
        pluralize(&name)
    } else {
        name
    }
}

/// Default foreign-key column pointing at rows of `entity_name`
pub fn foreign_key_column(entity_name: &str) -> String {
    format!("{}_id", normalize_identifier(entity_name))
}

/// Join-table name for a many-to-many relationship.
///
/// Both sides are pluralized and ordered lexicographically so either side
/// declaring the edge yields the same name.
pub fn join_table_name(left_entity: &str, right_entity: &str) -> String {
    let mut parts = [
        pluralize(&normalize_identifier(left_entity)),
        pluralize(&normalize_identifier(right_entity)),
    ];
    parts.sort();
    parts.join("_")
}

/// Get index name from table and columns according to pattern
pub fn get_index_name(pattern: &str, table_name: &str, columns: &[String], max_length: usize) -> String {
    let columns_str = columns.join("_");

    let name = format_name(pattern, &[("table", table_name), ("columns", &columns_str)]);
    truncate_identifier(&name, max_length)
}

/// Get foreign key constraint name according to pattern
pub fn get_foreign_key_name(pattern: &str, table_name: &str, column_name: &str, max_length: usize) -> String {
    let name = format_name(pattern, &[("table", table_name), ("column", column_name)]);
    truncate_identifier(&name, max_length)
}

/// Name of the single-column UNIQUE constraint, `<table>_<column>_key` when it fits
pub fn unique_constraint_name(table_name: &str, column_name: &str, max_length: usize) -> String {
    truncate_identifier(&format!("{}_{}_key", table_name, column_name), max_length)
}

/// Truncate an identifier to fit database limits
pub fn truncate_identifier(name: &str, max_length: usize) -> String {
    if name.len() <= max_length || max_length <= 9 {
        name.to_string()
    } else {
        // 8 hex chars of the hash plus the separating underscore
        let keep_length = max_length - 9;
        let hash = format!("{:x}", md5::compute(name.as_bytes()));

        let mut cut = keep_length;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }

        format!("{}_{}", &name[..cut], &hash[0..8])
    }
}

/// Convert a singular snake_case name to plural, inflecting the last word only
pub fn pluralize(name: &str) -> String {
    let (head, last) = match name.rfind('_') {
        Some(pos) => name.split_at(pos + 1),
        None => ("", name),
    };

    let plural = match last.to_lowercase().as_str() {
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "man" => "men".to_string(),
        "woman" => "women".to_string(),
        "foot" => "feet".to_string(),
        "tooth" => "teeth".to_string(),
        "goose" => "geese".to_string(),
        "mouse" => "mice".to_string(),
        _ => last.to_plural(),
    };

    format!("{}{}", head, plural)
}

/// Convert a plural snake_case name to singular, inflecting the last word only
pub fn singularize(name: &str) -> String {
    let (head, last) = match name.rfind('_') {
        Some(pos) => name.split_at(pos + 1),
        None => ("", name),
    };

    let singular = match last.to_lowercase().as_str() {
        "people" => "person".to_string(),
        "children" => "child".to_string(),
        "men" => "man".to_string(),
        "women" => "woman".to_string(),
        "feet" => "foot".to_string(),
        "teeth" => "tooth".to_string(),
        "geese" => "goose".to_string(),
        "mice" => "mouse".to_string(),
        _ => last.to_singular(),
    };

    format!("{}{}", head, singular)
}

/// Levenshtein distance between two identifiers, compared case-insensitively
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Nearest candidate within `max_distance` edits; ties go to the lexically smallest
pub fn closest_match<'a, I>(name: &str, candidates: I, max_distance: usize) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .min()
        .map(|(_, candidate)| candidate.to_string())
}

/// Format name as a valid file name (for migrations, etc.)
pub fn format_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Create a timestamp-based migration name
pub fn create_migration_name(description: &str, timestamp: chrono::DateTime<chrono::Utc>) -> String {
    format!("{}_{}", timestamp.format("%Y%m%d%H%M%S"), format_file_name(description))
}
