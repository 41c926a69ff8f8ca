use crate::action::classify;
use crate::options::Options;
use crate::types::{Action, AssignKey};

/// Computes the attribute key a resource is read from and written to.
///
/// An explicit `as` key is used verbatim. Otherwise the last segment of the
/// model name is underscored, and the list-all action appends `s` unless the
/// options pin loading to a single instance.
pub fn derive_key(options: &Options, action: &Action) -> AssignKey {
    if let Some(key) = &options.as_key {
        return key.clone();
    }
    let mut name = underscore(options.model.last_segment());
    if action.is_index() && !classify(action, options).pinned {
        name.push('s');
    }
    AssignKey::from_string(name)
}

/// Converts `CamelCase` to `snake_case`, keeping acronyms together
/// (`HTTPRequest` becomes `http_request`).
fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('_');
            }
        }
        out.push(ch.to_ascii_lowercase());
    }
    out
}
