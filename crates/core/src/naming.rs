//! Name transforms used when resolving resources and data keys
//!
//! Lookups first try the name as given, then its camelCase form, then the
//! camelCase form with the first letter upper-cased.

/// Convert a `snake_case` name to `camelCase`.
///
/// The first component is kept verbatim; every later component is
/// title-cased (first letter of each word upper-cased, the rest lower-cased).
///
/// ```rust
/// use apiwrap_core::naming::to_camel_case;
///
/// assert_eq!(to_camel_case("user_name"), "userName");
/// assert_eq!(to_camel_case("plain"), "plain");
/// ```
#[must_use]
pub fn to_camel_case(name: &str) -> String {
    let mut components = name.split('_');
    let mut out = components.next().unwrap_or_default().to_string();
    for component in components {
        out.push_str(&title_case(component));
    }
    out
}

/// Convert a `snake_case` name to `PascalCase`.
///
/// ```rust
/// use apiwrap_core::naming::to_pascal_case;
///
/// assert_eq!(to_pascal_case("user_name"), "UserName");
/// ```
#[must_use]
pub fn to_pascal_case(name: &str) -> String {
    let camel = to_camel_case(name);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Candidate keys for a lookup, in the order they must be tried.
///
/// Duplicates are removed, so a name without underscores that already starts
/// with an upper-case letter yields a single candidate.
#[must_use]
pub fn lookup_candidates(name: &str) -> Vec<String> {
    let mut candidates = vec![name.to_string()];
    for candidate in [to_camel_case(name), to_pascal_case(name)] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Title-case a word: a letter following another letter is lower-cased,
/// any other letter is upper-cased.
#[must_use]
pub fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut previous_cased = false;
    for c in word.chars() {
        if previous_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_cased = c.is_alphabetic();
    }
    out
}
