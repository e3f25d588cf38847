//! Case conversion shared by every derived path and generated identifier.
//!
//! Directories, modules and functions use [`to_snake_case`]; generated type
//! names use [`to_upper_camel_case`]. Both split their input with the same
//! word splitter, which follows the rules of the tonic/prost code generators
//! so that identifiers in generated stubs line up with the compiled bindings:
//!
//! - any non-alphanumeric character separates words (`health-check`,
//!   `health check`, `health_check`)
//! - a lowercase letter followed by an uppercase letter ends a word
//!   (`healthCheck`)
//! - inside a run of capitals, the last capital before a lowercase letter
//!   starts a new word (`HTTPServer` → `HTTP`, `Server`)
//! - digits never start a word; they stay with the letters before them
//!   (`OAuth2Token` → `o_auth2_token`, `V1Beta` → `v1_beta`)

#[derive(Clone, Copy, PartialEq, Eq)]
enum Case {
    Boundary,
    Lower,
    Upper,
}

/// Split an identifier into words.
pub fn split_words(s: &str) -> Vec<&str> {
    let mut words = Vec::new();
    for chunk in s.split(|c: char| !c.is_alphanumeric()) {
        if chunk.is_empty() {
            continue;
        }
        let mut start = 0;
        let mut mode = Case::Boundary;
        let mut chars = chunk.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            let Some(&(next_i, next)) = chars.peek() else {
                break;
            };
            let next_mode = if c.is_lowercase() {
                Case::Lower
            } else if c.is_uppercase() {
                Case::Upper
            } else {
                mode
            };
            if next_mode == Case::Lower && next.is_uppercase() {
                words.push(&chunk[start..next_i]);
                start = next_i;
                mode = Case::Boundary;
                continue;
            }
            if mode == Case::Upper && c.is_uppercase() && next.is_lowercase() && i > start {
                words.push(&chunk[start..i]);
                start = i;
            }
            mode = next_mode;
        }
        words.push(&chunk[start..]);
    }
    words
}

/// Convert to `snake_case`, e.g. `HealthCheckService` → `health_check_service`.
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Convert to `UpperCamelCase`, e.g. `health-check-service` → `HealthCheckService`.
pub fn to_upper_camel_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

const KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "typeof", "unsized",
    "virtual", "yield", "try", "gen",
];

/// Keywords that cannot be written as raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["self", "super", "crate", "Self"];

/// Make `name` usable as a Rust identifier.
///
/// Keywords become raw identifiers (`type` → `r#type`); the few keywords
/// that cannot be raw get a trailing underscore (`self` → `self_`).
pub fn rust_ident(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Snake-case module or function identifier for `name`.
pub fn snake_ident(name: &str) -> String {
    rust_ident(&to_snake_case(name))
}

/// Whether `name` is a valid, non-empty identifier after conversion.
pub fn is_convertible(name: &str) -> bool {
    !split_words(name).is_empty()
        && !name
            .chars()
            .next()
            .map(|c| c.is_ascii_digit())
            .unwrap_or(true)
}

/// Whether `name` can be used verbatim as a service directory and module
/// name: lowercase snake case, not starting with a digit, not a keyword.
pub fn is_module_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && name != "_"
        && rust_ident(name) == name
}
