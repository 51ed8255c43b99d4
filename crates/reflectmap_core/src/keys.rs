//! Key normalization between Rust field names and external document keys.
//!
//! Two modes share one algorithm:
//! - **match mode** (`existing` is `Some`): find the document key a field should read from. Only keys that
//!   actually occur in the document are ever returned; `None` means "this field has no counterpart".
//! - **cleanup mode** (`existing` is `None`): produce the key a field should be written under. Always succeeds.
//!
//! ## Examples
//! ```rust
//! use reflectmap_core::keys::normalize;
//!
//! let reserved = ["type"];
//! assert_eq!(normalize("userName", &reserved, None).as_deref(), Some("user_name"));
//! assert_eq!(normalize("_type", &reserved, Some(&["type"])).as_deref(), Some("type"));
//! assert_eq!(normalize("userName", &reserved, Some(&["other"])), None);
//! ```

/// Characters that document keys may contain but Rust identifiers cannot.
pub const ILLEGAL_KEY_CHARACTERS: &[char] = &[
    ' ', '-', '&', '%', '#', '@', '!', '$', '^', '*', '(', ')', '<', '>', '?', '.', ',', ':', ';',
];

/// Map a candidate field key onto a document key (match mode) or clean it up (cleanup mode).
///
/// ## Parameters
/// - `candidate`: the field name (or its custom external key).
/// - `reserved`: words that fields escape with a leading underscore.
/// - `existing`: the keys present in the inbound document, or `None` for cleanup mode.
///
/// ## Returns
/// - (`Option<String>`): the matched document key, the cleaned key in cleanup mode, or `None` when a document
///   was supplied and no rule matched.
///
/// ## Notes
/// Rules are tried in order, first match wins: verbatim hit, reserved-word unescape, illegal-character
/// sanitizing of the document keys, camelCase → snake_case.
pub fn normalize(candidate: &str, reserved: &[&str], existing: Option<&[&str]>) -> Option<String> {
    let present = |key: &str| existing.is_some_and(|keys| keys.contains(&key));

    if present(candidate) {
        return Some(candidate.to_string());
    }

    let mut key = candidate;
    if let Some(stripped) = candidate.strip_prefix('_') {
        if reserved.contains(&stripped) {
            key = stripped;
            if present(key) {
                return Some(key.to_string());
            }
        }
    }

    if let Some(keys) = existing {
        if let Some(original) = keys.iter().find(|doc_key| sanitize_key(doc_key) == key) {
            return Some((*original).to_string());
        }
    }

    let snake = camel_to_snake(key);
    if present(&snake) {
        return Some(snake);
    }

    match existing {
        Some(_) => None,
        None => Some(snake),
    }
}

/// Normalize `candidate` for output (cleanup mode of [`normalize`]).
pub fn cleanup_key(candidate: &str, reserved: &[&str]) -> String {
    let key = match candidate.strip_prefix('_') {
        Some(stripped) if reserved.contains(&stripped) => stripped,
        _ => candidate,
    };
    camel_to_snake(key)
}

/// Replace every [`ILLEGAL_KEY_CHARACTERS`] occurrence with `_`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if ILLEGAL_KEY_CHARACTERS.contains(&c) { '_' } else { c })
        .collect()
}

/// Convert camelCase / PascalCase to snake_case.
///
/// The first character is lowercased; every later uppercase letter becomes `_` plus its lowercase form.
/// Runs of capitals are not grouped, so `"URL"` becomes `"u_r_l"`.
///
/// ## Examples
/// ```rust
/// use reflectmap_core::keys::camel_to_snake;
///
/// assert_eq!(camel_to_snake("userName"), "user_name");
/// assert_eq!(camel_to_snake("URL"), "u_r_l");
/// assert_eq!(camel_to_snake(""), "");
/// ```
pub fn camel_to_snake(input: &str) -> String {
    let mut chars = input.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(input.len() + 4);
    out.extend(first.to_lowercase());
    for c in chars {
        if c.is_uppercase() {
            out.push('_');
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: &[&str] = &["class", "type"];

    #[test]
    fn verbatim_key_wins() {
        let doc = ["userName", "user_name"];
        assert_eq!(normalize("userName", RESERVED, Some(&doc)).as_deref(), Some("userName"));
    }

    #[test]
    fn reserved_word_is_unescaped() {
        assert_eq!(normalize("_class", RESERVED, Some(&["class"])).as_deref(), Some("class"));
        assert_eq!(normalize("_class", RESERVED, None).as_deref(), Some("class"));
    }

    #[test]
    fn underscore_without_reserved_word_is_kept() {
        assert_eq!(normalize("_private", RESERVED, None).as_deref(), Some("_private"));
    }

    #[test]
    fn punctuated_document_key_is_recovered() {
        let doc = ["first-name", "zip code"];
        assert_eq!(normalize("first_name", RESERVED, Some(&doc)).as_deref(), Some("first-name"));
        assert_eq!(normalize("zip_code", RESERVED, Some(&doc)).as_deref(), Some("zip code"));
    }

    #[test]
    fn snake_case_match() {
        let doc = ["user_name"];
        assert_eq!(normalize("userName", RESERVED, Some(&doc)).as_deref(), Some("user_name"));
    }

    #[test]
    fn no_match_against_document_is_none() {
        assert_eq!(normalize("userName", RESERVED, Some(&["name"])), None);
        assert_eq!(normalize("userName", RESERVED, Some(&[])), None);
    }

    #[test]
    fn cleanup_mode_always_produces_a_key() {
        assert_eq!(normalize("URL", RESERVED, None).as_deref(), Some("u_r_l"));
        assert_eq!(cleanup_key("homeAddress", RESERVED), "home_address");
        assert_eq!(cleanup_key("_type", RESERVED), "type");
    }

    #[test]
    fn sanitize_replaces_every_illegal_character() {
        assert_eq!(sanitize_key("a b-c&d%e#f@g!h$i^j*k(l)m<n>o?p.q,r:s;t"), "a_b_c_d_e_f_g_h_i_j_k_l_m_n_o_p_q_r_s_t");
    }

    #[test]
    fn camel_to_snake_lowercases_leading_capital() {
        assert_eq!(camel_to_snake("HomeAddress"), "home_address");
        assert_eq!(camel_to_snake("already_snake"), "already_snake");
    }
}
