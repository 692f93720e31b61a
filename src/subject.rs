//! Certificate subject attribute extraction.
//!
//! TLS authentication hands the pipeline a subject distinguished name string
//! (`CN=alice,OU=eng,DC=example,DC=com`). This module parses it into ordered
//! attribute/value pairs and pulls out the configured attribute (`CN` by
//! default) as the user's short name.
//!
//! # Degradation
//!
//! A malformed subject or a missing attribute is never an error: the original
//! string is returned unchanged and a warning is logged. The worst outcome is
//! a principal named after the full subject string, which simply will not
//! match group-based policies.

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the value of `attribute_key` from a subject DN string.
///
/// The key comparison is case-insensitive and the **first** matching pair in
/// string order wins. On malformed input or when no pair matches, the
/// original `subject_dn` is returned unchanged.
#[must_use]
pub fn extract_attribute(subject_dn: &str, attribute_key: &str) -> String {
    match parse_dn(subject_dn) {
        Some(pairs) => pairs
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(attribute_key))
            .map_or_else(
                || {
                    tracing::warn!(
                        subject = subject_dn,
                        attribute = attribute_key,
                        "Subject has no matching attribute, using full subject as user name"
                    );
                    subject_dn.to_string()
                },
                |(_, value)| value.clone(),
            ),
        None => {
            tracing::warn!(
                subject = subject_dn,
                "Error extracting user name from subject, using it verbatim"
            );
            subject_dn.to_string()
        }
    }
}

/// Parse a DN string into ordered `(attribute, value)` pairs.
///
/// Supports the common RFC 4514 shapes: `,`-separated components (`+` for
/// multi-valued RDNs is treated the same), backslash escapes, and quoted
/// values. Returns `None` on malformed input (missing `=`, empty attribute,
/// dangling escape, unterminated quote).
#[must_use]
pub fn parse_dn(dn: &str) -> Option<Vec<(String, String)>> {
    let components = split_components(dn)?;
    let mut pairs = Vec::with_capacity(components.len());
    for component in components {
        pairs.push(split_pair(&component)?);
    }
    if pairs.is_empty() { None } else { Some(pairs) }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Split a DN on unescaped `,` / `+` separators, keeping escapes and quotes
/// intact for [`split_pair`] to interpret.
fn split_components(dn: &str) -> Option<Vec<String>> {
    let mut components = Vec::new();
    let mut current = String::new();
    let mut chars = dn.chars();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                current.push('\\');
                current.push(escaped);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' | '+' if !in_quotes => {
                components.push(current);
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if in_quotes {
        return None;
    }
    components.push(current);
    Some(components)
}

/// Split one `attr=value` component, unescaping the value.
fn split_pair(component: &str) -> Option<(String, String)> {
    let eq = find_unescaped_eq(component)?;
    let attr = component[..eq].trim();
    if attr.is_empty() || attr.contains('\\') {
        return None;
    }
    let value = unescape_value(component[eq + 1..].trim());
    Some((attr.to_string(), value))
}

fn find_unescaped_eq(component: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in component.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' if !escaped => return Some(i),
            _ => escaped = false,
        }
    }
    None
}

/// Drop one level of backslash escaping and surrounding quotes.
fn unescape_value(raw: &str) -> String {
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn extracts_cn_from_typical_subject() {
        // GIVEN: a standard certificate subject
        let dn = "CN=alice,OU=eng,DC=example,DC=com";
        // THEN: the CN value is the short name
        assert_eq!(extract_attribute(dn, "CN"), "alice");
    }

    #[test]
    fn attribute_key_match_is_case_insensitive() {
        let dn = "cn=alice,OU=eng";
        assert_eq!(extract_attribute(dn, "CN"), "alice");
        assert_eq!(extract_attribute(dn, "ou"), "eng");
    }

    #[test]
    fn first_matching_pair_wins() {
        // GIVEN: repeated attributes (DC here)
        let dn = "CN=alice,DC=example,DC=com";
        // THEN: string order decides
        assert_eq!(extract_attribute(dn, "DC"), "example");
    }

    #[test]
    fn malformed_subject_is_returned_verbatim() {
        // GIVEN: a string that is not a DN at all
        let dn = "not a dn";
        // THEN: graceful fallback, no panic, no error
        assert_eq!(extract_attribute(dn, "CN"), "not a dn");
    }

    #[test]
    fn missing_attribute_is_returned_verbatim() {
        let dn = "OU=eng,DC=example";
        assert_eq!(extract_attribute(dn, "CN"), dn);
    }

    #[test]
    fn empty_subject_is_returned_verbatim() {
        assert_eq!(extract_attribute("", "CN"), "");
    }

    #[test]
    fn escaped_comma_stays_inside_value() {
        let dn = r"CN=Smith\, Alice,OU=eng";
        assert_eq!(extract_attribute(dn, "CN"), "Smith, Alice");
        assert_eq!(extract_attribute(dn, "OU"), "eng");
    }

    #[test]
    fn quoted_value_keeps_separators() {
        let dn = r#"CN="Smith, Alice",OU=eng"#;
        assert_eq!(extract_attribute(dn, "CN"), "Smith, Alice");
    }

    #[test]
    fn plus_separates_multi_valued_rdn() {
        let dn = "CN=alice+UID=1000,OU=eng";
        assert_eq!(extract_attribute(dn, "UID"), "1000");
    }

    #[test]
    fn whitespace_around_pairs_is_trimmed() {
        let dn = "CN = alice , OU = eng";
        assert_eq!(extract_attribute(dn, "OU"), "eng");
    }

    #[test]
    fn dangling_escape_is_malformed() {
        let dn = r"CN=alice\";
        assert_eq!(extract_attribute(dn, "CN"), dn);
    }

    #[test]
    fn parse_dn_preserves_pair_order() {
        let pairs = parse_dn("CN=alice,OU=eng,DC=example,DC=com").unwrap();
        let attrs: Vec<&str> = pairs.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(attrs, &["CN", "OU", "DC", "DC"]);
    }

    #[test]
    fn parse_dn_rejects_component_without_equals() {
        assert!(parse_dn("CN=alice,garbage").is_none());
    }
}
