//! Account Identifier Normalization
//!
//! Client accounts reach the monitor as free-form strings (`"1001"`,
//! `"CLIENT 1001"`, `"CLIENT||1001"`). The Centroid bridge may have stored an
//! account in either the canonical `CLIENT||<id>` shape or as the raw string
//! the operator typed, so both shapes are produced and queried in turn.
//!
//! Both output lists are deduplicated independently, keeping first-seen order.

use std::collections::HashSet;

/// Delimiter separating the account namespace from the account id.
pub const ACCOUNT_DELIMITER: &str = "||";

/// Canonical namespace prefix for client accounts.
pub const CANONICAL_PREFIX: &str = "CLIENT||";

/// Space-separated prefix operators sometimes type instead of the delimiter.
const SPACED_PREFIX: &str = "CLIENT ";

/// Canonical and raw query tokens derived from a list of account identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountTokens {
    /// Tokens rewritten into the `CLIENT||<id>` shape.
    pub canonical: Vec<String>,
    /// Trimmed, non-blank identifiers exactly as entered.
    pub raw: Vec<String>,
}

impl AccountTokens {
    /// True when no usable identifier was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty() && self.raw.is_empty()
    }
}

/// Derive the canonical token for a single trimmed identifier.
#[must_use]
pub fn canonicalize(account: &str) -> String {
    if account.contains(ACCOUNT_DELIMITER) {
        account.to_string()
    } else if let Some(rest) = account.strip_prefix(SPACED_PREFIX) {
        format!("{CANONICAL_PREFIX}{rest}")
    } else {
        format!("{CANONICAL_PREFIX}{account}")
    }
}

/// Normalize raw account identifiers into canonical and raw query tokens.
///
/// Blank entries (after trimming) are skipped. Never fails; empty input
/// yields two empty lists.
pub fn normalize_accounts<I, S>(accounts: I) -> AccountTokens
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut canonical = Vec::new();
    let mut raw = Vec::new();

    for entry in accounts {
        let trimmed = entry.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        raw.push(trimmed.to_string());
        canonical.push(canonicalize(trimmed));
    }

    AccountTokens {
        canonical: dedup_stable(canonical),
        raw: dedup_stable(raw),
    }
}

fn dedup_stable(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case("1001", "CLIENT||1001" ; "bare id gets prefixed")]
    #[test_case("CLIENT 1001", "CLIENT||1001" ; "spaced prefix is rewritten")]
    #[test_case("CLIENT||1001", "CLIENT||1001" ; "canonical passes through")]
    #[test_case("a||b", "a||b" ; "foreign namespace passes through")]
    #[test_case("CLIENT 10 01", "CLIENT||10 01" ; "only first space is consumed")]
    #[test_case("CLIENTX", "CLIENT||CLIENTX" ; "prefix without space is not special")]
    fn canonicalize_cases(input: &str, expected: &str) {
        assert_eq!(canonicalize(input), expected);
    }

    #[test]
    fn mixed_shapes_dedup_independently() {
        let tokens = normalize_accounts(["CLIENT a", "a", "a||b"]);
        assert_eq!(tokens.canonical, vec!["CLIENT||a", "a||b"]);
        assert_eq!(tokens.raw, vec!["CLIENT a", "a", "a||b"]);
    }

    #[test]
    fn blank_entries_are_skipped_and_trimmed() {
        let tokens = normalize_accounts(["  ", "", " 42 ", "\t"]);
        assert_eq!(tokens.raw, vec!["42"]);
        assert_eq!(tokens.canonical, vec!["CLIENT||42"]);
    }

    #[test]
    fn empty_input_yields_empty_tokens() {
        let tokens = normalize_accounts(Vec::<String>::new());
        assert!(tokens.is_empty());
        assert!(tokens.canonical.is_empty());
        assert!(tokens.raw.is_empty());
    }

    #[test]
    fn duplicates_keep_first_seen_order() {
        let tokens = normalize_accounts(["b", "a", "b", "c", "a"]);
        assert_eq!(tokens.raw, vec!["b", "a", "c"]);
        assert_eq!(
            tokens.canonical,
            vec!["CLIENT||b", "CLIENT||a", "CLIENT||c"]
        );
    }

    proptest! {
        #[test]
        fn dedup_never_grows_and_preserves_first_seen_order(
            input in proptest::collection::vec("[ a-cC|]{0,6}", 0..12)
        ) {
            let tokens = normalize_accounts(&input);
            prop_assert!(tokens.canonical.len() <= input.len());
            prop_assert!(tokens.raw.len() <= input.len());

            let expected: Vec<String> = input
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(canonicalize)
                .fold(Vec::new(), |mut acc, token| {
                    if !acc.contains(&token) {
                        acc.push(token);
                    }
                    acc
                });
            prop_assert_eq!(&tokens.canonical, &expected);

            for token in &tokens.canonical {
                prop_assert!(token.contains(ACCOUNT_DELIMITER));
            }
            for token in &tokens.raw {
                prop_assert!(!token.trim().is_empty());
            }
        }
    }
}
