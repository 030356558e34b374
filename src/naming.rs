//! Centralized parsing for the `NUM-uid` directory name convention.
//!
//! Every page directory is named either `<digits>-<uid>` or plain `<uid>`.
//! The numeric prefix is the page's sort key and makes it visible; a page
//! without one is invisible but still reachable by uri.
//!
//! - `03-projects` → num=Some(3), uid="projects"
//! - `about` → num=None, uid="about"
//! - `1-` → num=Some(1), uid=""
//! - `2024-05-trip` → num=Some(2024), uid="05-trip"

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static DIRNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(.*)$").expect("dirname pattern is valid"));

/// Result of decoding a page directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Sort number if the name carries a numeric prefix.
    pub num: Option<u32>,
    /// Everything after the prefix, verbatim. The full name when unnumbered.
    pub uid: String,
}

/// Decode a directory name into `(num, uid)`.
///
/// A numeric prefix too large for a `u32` is not treated as a sort key; the
/// whole name becomes the uid.
pub fn parse_dirname(dirname: &str) -> ParsedName {
    if let Some(caps) = DIRNAME.captures(dirname)
        && let Ok(num) = caps[1].parse::<u32>()
    {
        return ParsedName {
            num: Some(num),
            uid: caps[2].to_string(),
        };
    }
    ParsedName {
        num: None,
        uid: dirname.to_string(),
    }
}

/// Build the on-disk directory name for `(num, uid)`.
pub fn dirname(num: Option<u32>, uid: &str) -> String {
    match num {
        Some(num) => format!("{num}-{uid}"),
        None => uid.to_string(),
    }
}

/// Split a `NUM-` prefix off a requested uri segment without slugifying.
pub fn split_num_prefix(segment: &str) -> (Option<u32>, &str) {
    if let Some(caps) = DIRNAME.captures(segment)
        && let Ok(num) = caps[1].parse::<u32>()
        && let Some(rest) = caps.get(2)
    {
        return (Some(num), &segment[rest.start()..]);
    }
    (None, segment)
}

/// Turn arbitrary text into a uid.
///
/// Letters are transliterated to ASCII and lowercased; every other run of
/// characters becomes a single dash, trimmed at both ends.
pub fn slugify(text: &str) -> String {
    slug::slugify(text)
}

/// Natural ("human") string ordering: digit runs compare by numeric value,
/// everything else byte-wise.
///
/// `2-b` sorts before `10-a`; `img2` before `img12`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let run_a = trim_leading_zeros(&a[start_a..i]);
            let run_b = trim_leading_zeros(&b[start_b..j]);
            let ord = run_a
                .len()
                .cmp(&run_b.len())
                .then_with(|| run_a.cmp(run_b))
                .then_with(|| (i - start_a).cmp(&(j - start_b)));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            if a[i] != b[j] {
                return a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let first = digits
        .iter()
        .position(|&d| d != b'0')
        .unwrap_or(digits.len());
    &digits[first..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_dirname() {
        let p = parse_dirname("03-projects");
        assert_eq!(p.num, Some(3));
        assert_eq!(p.uid, "projects");
    }

    #[test]
    fn unnumbered_dirname() {
        let p = parse_dirname("about");
        assert_eq!(p.num, None);
        assert_eq!(p.uid, "about");
    }

    #[test]
    fn unnumbered_with_dashes() {
        let p = parse_dirname("wip-drafts");
        assert_eq!(p.num, None);
        assert_eq!(p.uid, "wip-drafts");
    }

    #[test]
    fn number_with_trailing_dash() {
        let p = parse_dirname("1-");
        assert_eq!(p.num, Some(1));
        assert_eq!(p.uid, "");
    }

    #[test]
    fn number_only_is_uid() {
        let p = parse_dirname("2024");
        assert_eq!(p.num, None);
        assert_eq!(p.uid, "2024");
    }

    #[test]
    fn uid_keeps_everything_after_first_prefix() {
        let p = parse_dirname("2024-05-trip");
        assert_eq!(p.num, Some(2024));
        assert_eq!(p.uid, "05-trip");
    }

    #[test]
    fn zero_prefix() {
        let p = parse_dirname("0-first");
        assert_eq!(p.num, Some(0));
        assert_eq!(p.uid, "first");
    }

    #[test]
    fn overflowing_prefix_is_unnumbered() {
        let p = parse_dirname("99999999999-big");
        assert_eq!(p.num, None);
        assert_eq!(p.uid, "99999999999-big");
    }

    #[test]
    fn dirname_round_trip() {
        for (num, uid) in [(None, "about"), (Some(1), "blog"), (Some(42), "a-b-c")] {
            let parsed = parse_dirname(&dirname(num, uid));
            assert_eq!(parsed.num, num);
            assert_eq!(parsed.uid, uid);
        }
    }

    #[test]
    fn split_num_prefix_keeps_raw_rest() {
        assert_eq!(split_num_prefix("3-My Trip"), (Some(3), "My Trip"));
        assert_eq!(split_num_prefix("My Trip"), (None, "My Trip"));
    }

    // =========================================================================
    // slugify
    // =========================================================================

    #[test]
    fn slugify_lowercases_and_dashes() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  --A  &  B-- "), "a-b");
    }

    #[test]
    fn slugify_transliterates_letters() {
        assert_eq!(slugify("Über uns"), "uber-uns");
        assert_eq!(slugify("Café Crème"), "cafe-creme");
    }

    #[test]
    fn slugify_empty_for_symbols() {
        assert_eq!(slugify("!!!"), "");
    }

    // =========================================================================
    // natural_cmp
    // =========================================================================

    #[test]
    fn natural_orders_numbers_by_value() {
        let mut names = vec!["10-c", "2-b", "1-a", "about"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["1-a", "2-b", "10-c", "about"]);
    }

    #[test]
    fn natural_handles_embedded_numbers() {
        assert_eq!(natural_cmp("img2", "img12"), Ordering::Less);
        assert_eq!(natural_cmp("img12", "img12"), Ordering::Equal);
        assert_eq!(natural_cmp("img", "img1"), Ordering::Less);
    }

    #[test]
    fn natural_leading_zeros_break_ties() {
        assert_eq!(natural_cmp("01", "1"), Ordering::Greater);
        assert_eq!(natural_cmp("002", "10"), Ordering::Less);
    }
}
