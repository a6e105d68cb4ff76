//! Token helpers shared by the resolver and the flag parser.
//!
//! - Flag-shape detection (negative numbers are values, not flags)
//! - Flag-token splitting (`--name=value`, `-xyz`, `-x=value`)
//! - "Did you mean" suggestions via Levenshtein distance

use strsim::levenshtein;

/// Maximum edit distance for a suggestion to be offered.
const SUGGESTION_DISTANCE: usize = 2;

/// Is `token` a flag rather than a value?
///
/// `-` alone, `-<digit>...` and `-.<digit>...` are values. This means a flag
/// whose name starts with a digit cannot be declared.
pub fn is_flag_shaped(token: &str) -> bool {
    let Some(rest) = token.strip_prefix('-') else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    !is_negative_number(rest)
}

fn is_negative_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// A flag-shaped token split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagToken<'t> {
    /// `--name` or `--name=value`.
    Long {
        name: &'t str,
        value: Option<&'t str>,
    },
    /// `-xyz` or `-x=value`. The inline value belongs to the last char.
    Short {
        chars: Vec<char>,
        value: Option<&'t str>,
    },
}

/// Split a flag-shaped token. Returns `None` for values and for the bare
/// `--` terminator.
pub fn split_flag(token: &str) -> Option<FlagToken<'_>> {
    if token == "--" || !is_flag_shaped(token) {
        return None;
    }
    if let Some(long) = token.strip_prefix("--") {
        let (name, value) = match long.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (long, None),
        };
        return Some(FlagToken::Long { name, value });
    }
    let short = &token[1..];
    let (chars, value) = match short.split_once('=') {
        Some((chars, value)) => (chars, Some(value)),
        None => (short, None),
    };
    Some(FlagToken::Short {
        chars: chars.chars().collect(),
        value,
    })
}

/// Suggest the closest candidate within edit distance 2.
///
/// Ties keep the earliest candidate, so declaration order decides.
pub fn suggest<'c, I>(input: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'c str>,
{
    let input_lower = input.to_lowercase();
    let mut best_match: Option<(&str, usize)> = None;

    for candidate in candidates {
        let distance = levenshtein(&input_lower, &candidate.to_lowercase());
        if distance > SUGGESTION_DISTANCE {
            continue;
        }
        match best_match {
            Some((_, best)) if distance >= best => {}
            _ => best_match = Some((candidate, distance)),
        }
    }

    best_match.map(|(candidate, _)| candidate.to_string())
}

// ============================================================================
// Tests
// ============================================================================
