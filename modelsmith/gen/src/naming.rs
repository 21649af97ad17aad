//! Identifier derivation for generated code.
//!
//! Design names arrive in whatever style the author used (`bottleID`,
//! `X-Account`, `not_found`, `HTTPClient`). These helpers split them into
//! words and rebuild them as Rust identifiers.
//!
//! ## Examples
//!
//! ```
//! use modelsmith_gen::naming::{snake_case, table_name, upper_camel};
//!
//! assert_eq!(snake_case("bottleID"), "bottle_id");
//! assert_eq!(snake_case("X-Account"), "x_account");
//! assert_eq!(upper_camel("not_found"), "NotFound");
//! assert_eq!(table_name("Category"), "categories");
//! ```

use proc_macro2::{Ident, Span};

/// Rust keywords that must be emitted as raw identifiers.
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers and get a trailing underscore.
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// Splits a CamelCase string into individual words.
///
/// Handles various CamelCase patterns:
/// - "bottleID" -> ["bottle", "ID"]
/// - "OpenAI" -> ["Open", "AI"]
/// - "HTTPClient" -> ["HTTP", "Client"]
/// - "post" -> ["post"]
pub fn split_camel_case(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut word_start = 0;
    let chars: Vec<(usize, char)> = s.char_indices().collect();

    for i in 1..chars.len() {
        let (idx, current) = chars[i];
        let prev = chars[i - 1].1;

        // Split before uppercase that follows lowercase or a digit: "bottleID" -> "bottle", "ID"
        // Split before uppercase followed by lowercase when preceded by uppercase: "HTTPClient" -> "HTTP", "Client"
        let is_new_word = current.is_uppercase()
            && (prev.is_lowercase()
                || prev.is_ascii_digit()
                || (i + 1 < chars.len() && chars[i + 1].1.is_lowercase() && prev.is_uppercase()));

        if is_new_word {
            if idx > word_start {
                words.push(&s[word_start..idx]);
            }
            word_start = idx;
        }
    }

    if word_start < s.len() {
        words.push(&s[word_start..]);
    }

    words
}

/// Splits any name into words: separators first, then camel humps.
pub fn words(s: &str) -> Vec<&str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .flat_map(split_camel_case)
        .collect()
}

/// Converts a name to `snake_case`.
pub fn snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Converts a name to `UpperCamelCase`, keeping the rest of each word as
/// written so initialisms survive (`bottleID` -> `BottleID`).
pub fn upper_camel(s: &str) -> String {
    words(s)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts a name to `SCREAMING_SNAKE_CASE`.
pub fn screaming_snake(s: &str) -> String {
    snake_case(s).to_uppercase()
}

/// Pluralizes an English word with the common suffix rules.
///
/// ## Examples
///
/// ```
/// use modelsmith_gen::naming::pluralize;
///
/// assert_eq!(pluralize("widget"), "widgets");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("box"), "boxes");
/// assert_eq!(pluralize("day"), "days");
/// ```
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy")
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Default table name of a storage type: the plural snake-case type name.
pub fn table_name(type_name: &str) -> String {
    pluralize(&snake_case(type_name))
}

/// Builds a field or function identifier, escaping keywords.
pub fn ident(name: &str) -> Ident {
    let snake = snake_case(name);
    let snake = if snake.is_empty() {
        "field".to_string()
    } else if snake.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{snake}")
    } else {
        snake
    };
    if RESERVED.contains(&snake.as_str()) {
        Ident::new(&format!("{snake}_"), Span::call_site())
    } else if KEYWORDS.contains(&snake.as_str()) {
        Ident::new_raw(&snake, Span::call_site())
    } else {
        Ident::new(&snake, Span::call_site())
    }
}

/// Builds a type identifier.
pub fn type_ident(name: &str) -> Ident {
    let camel = upper_camel(name);
    if camel.is_empty() {
        Ident::new("Unnamed", Span::call_site())
    } else if RESERVED.contains(&camel.as_str()) {
        Ident::new(&format!("{camel}_"), Span::call_site())
    } else {
        Ident::new(&camel, Span::call_site())
    }
}

/// Builds a constant identifier.
pub fn const_ident(name: &str) -> Ident {
    Ident::new(&screaming_snake(name), Span::call_site())
}

/// Module name for an API version. The default version maps to `default`.
pub fn version_module(version: &str, default: &str) -> String {
    if version.is_empty() {
        default.to_string()
    } else {
        let snake = snake_case(version);
        if snake.starts_with(|c: char| c.is_ascii_digit()) {
            format!("v{snake}")
        } else {
            snake
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_camel_case_patterns() {
        assert_eq!(split_camel_case("bottleID"), vec!["bottle", "ID"]);
        assert_eq!(split_camel_case("OpenAI"), vec!["Open", "AI"]);
        assert_eq!(split_camel_case("HTTPClient"), vec!["HTTP", "Client"]);
        assert_eq!(split_camel_case("post"), vec!["post"]);
        assert_eq!(split_camel_case("V2Beta"), vec!["V2", "Beta"]);
        assert!(split_camel_case("").is_empty());
    }

    #[test]
    fn snake_case_handles_separators_and_initialisms() {
        assert_eq!(snake_case("accountID"), "account_id");
        assert_eq!(snake_case("X-Account-Token"), "x_account_token");
        assert_eq!(snake_case("post_id"), "post_id");
        assert_eq!(snake_case("NotFound"), "not_found");
        assert_eq!(snake_case("JSONBody"), "json_body");
    }

    #[test]
    fn upper_camel_keeps_initialisms() {
        assert_eq!(upper_camel("bottle"), "Bottle");
        assert_eq!(upper_camel("not_found"), "NotFound");
        assert_eq!(upper_camel("bottleID"), "BottleID");
        assert_eq!(upper_camel("tiny view"), "TinyView");
    }

    #[test]
    fn table_names_are_plural_snake() {
        assert_eq!(table_name("Widget"), "widgets");
        assert_eq!(table_name("BottleTag"), "bottle_tags");
        assert_eq!(table_name("Address"), "addresses");
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        assert_eq!(ident("type").to_string(), "r#type");
        assert_eq!(ident("self").to_string(), "self_");
        assert_eq!(ident("bottleID").to_string(), "bottle_id");
        assert_eq!(ident("2fa").to_string(), "_2fa");
        assert_eq!(type_ident("bottle").to_string(), "Bottle");
        assert_eq!(const_ident("tableName").to_string(), "TABLE_NAME");
    }

    #[test]
    fn version_modules() {
        assert_eq!(version_module("", "app"), "app");
        assert_eq!(version_module("v1", "app"), "v1");
        assert_eq!(version_module("2.0", "app"), "v2_0");
    }
}
