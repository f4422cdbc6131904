//! Edit-distance based fuzzy matching.

use super::normalize;

/// Threshold used when matching a user-typed sheet name against the workbook.
pub const SHEET_THRESHOLD: f64 = 0.55;

/// The best candidate found by [`fuzzy_match`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatch<'a> {
    /// The candidate exactly as it was supplied
    pub candidate: &'a str,
    /// Normalized edit distance in `[0, 1]`; `0.0` means identical
    pub score: f64,
}

/// Levenshtein distance between two strings, counted in characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (m, n) = (a.len(), b.len());

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1]
            } else {
                1 + dp[i - 1][j].min(dp[i][j - 1]).min(dp[i - 1][j - 1])
            };
        }
    }

    dp[m][n]
}

/// Distance ratio between two already-normalized strings.
///
/// Returns `None` when both strings are empty.
pub fn score(a: &str, b: &str) -> Option<f64> {
    if a == b {
        return if a.is_empty() { None } else { Some(0.0) };
    }
    let max_len = a.chars().count().max(b.chars().count());
    Some(levenshtein(a, b) as f64 / max_len as f64)
}

/// Find the candidate closest to `input`, if it is within `threshold`.
///
/// Both sides are compared in [`normalize`]d form. An exact normalized match
/// returns immediately with a score of `0.0`; otherwise the first candidate
/// with the lowest score wins. Blank input never matches.
pub fn fuzzy_match<'a, S: AsRef<str>>(
    input: &str,
    candidates: &'a [S],
    threshold: f64,
) -> Option<FuzzyMatch<'a>> {
    let needle = normalize(input);
    if needle.is_empty() {
        return None;
    }

    let mut best: Option<FuzzyMatch<'a>> = None;
    for candidate in candidates {
        let candidate = candidate.as_ref();
        let Some(s) = score(&needle, &normalize(candidate)) else {
            continue;
        };
        if s == 0.0 {
            return (threshold >= 0.0).then_some(FuzzyMatch { candidate, score: s });
        }
        if best.is_none_or(|b| s < b.score) {
            best = Some(FuzzyMatch { candidate, score: s });
        }
    }

    best.filter(|b| b.score <= threshold)
}

/// Select a sheet by approximate name, at [`SHEET_THRESHOLD`].
pub fn find_sheet<'a, S: AsRef<str>>(query: &str, names: &'a [S]) -> Option<&'a str> {
    fuzzy_match(query, names, SHEET_THRESHOLD).map(|m| m.candidate)
}
