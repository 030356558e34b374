//! Accept header parsing for representation negotiation.

/// One media range from an Accept header.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub kind: String,
    pub subtype: String,
    pub quality: f32,
}

impl MediaRange {
    /// Parse `type/subtype; q=0.8`. Parameters other than `q` are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split(';');
        let (kind, subtype) = parts.next()?.trim().split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in parts {
            if let Some((name, value)) = param.split_once('=')
                && name.trim().eq_ignore_ascii_case("q")
            {
                quality = value.trim().parse::<f32>().unwrap_or(0.0).clamp(0.0, 1.0);
            }
        }

        Some(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            quality,
        })
    }

    /// How specifically this range names `mime`: 3 exact, 2 `type/*`,
    /// 1 `*/*`, `None` when it doesn't match.
    fn specificity(&self, kind: &str, subtype: &str) -> Option<u8> {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", "*") => Some(1),
            (k, "*") if k == kind => Some(2),
            (k, s) if k == kind && s == subtype => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AcceptHeader {
    pub ranges: Vec<MediaRange>,
}

impl AcceptHeader {
    pub fn parse(header: &str) -> Self {
        let ranges = header
            .split(',')
            .filter_map(|s| MediaRange::parse(s.trim()))
            .collect();
        Self { ranges }
    }

    /// Quality the client assigns to `mime`: the q of the most specific
    /// matching range, 0 when nothing matches.
    pub fn quality(&self, mime: &str) -> f32 {
        let Some((kind, subtype)) = mime.split(';').next().and_then(|m| m.trim().split_once('/'))
        else {
            return 0.0;
        };
        let (kind, subtype) = (kind.to_ascii_lowercase(), subtype.to_ascii_lowercase());

        self.ranges
            .iter()
            .filter_map(|r| r.specificity(&kind, &subtype).map(|s| (s, r.quality)))
            .max_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, q)| q)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ranges_and_quality() {
        let accept = AcceptHeader::parse("application/json, text/html; q=0.9, bogus");
        assert_eq!(accept.ranges.len(), 2);
        assert_eq!(accept.ranges[0].quality, 1.0);
        assert_eq!(accept.ranges[1].subtype, "html");
        assert_eq!(accept.ranges[1].quality, 0.9);
    }

    #[test]
    fn most_specific_range_wins() {
        let accept = AcceptHeader::parse("text/*;q=0.3, text/html;q=0.7, */*;q=0.1");
        assert_eq!(accept.quality("text/html"), 0.7);
        assert_eq!(accept.quality("text/plain"), 0.3);
        assert_eq!(accept.quality("image/png"), 0.1);
    }

    #[test]
    fn no_match_is_zero() {
        let accept = AcceptHeader::parse("application/json");
        assert_eq!(accept.quality("text/html"), 0.0);
        assert_eq!(AcceptHeader::default().quality("text/html"), 0.0);
    }

    #[test]
    fn explicit_zero_rejects() {
        let accept = AcceptHeader::parse("application/json;q=0, */*");
        assert_eq!(accept.quality("application/json"), 0.0);
        assert_eq!(accept.quality("text/html"), 1.0);
    }

    #[test]
    fn mime_parameters_ignored() {
        let accept = AcceptHeader::parse("text/html");
        assert_eq!(accept.quality("text/html; charset=utf-8"), 1.0);
    }
}
