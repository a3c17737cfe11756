//! Decomposition of a generated incident narrative into report fields.
//!
//! The narrative comes from a text-generation service and is untrusted. The
//! parser extracts what it can and leaves the rest at [`PENDING`].

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Placeholder shown for any section that could not be extracted.
pub const PENDING: &str = "Processing...";

/// Section headers in the order the generator is asked to emit them.
pub const HEADERS: [&str; 5] = [
    "Affected Systems",
    "Business Impact",
    "Responsible Team",
    "Estimated Resolution",
    "Reassurance",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeSections {
    pub affected: String,
    pub impact: String,
    pub team: String,
    pub time: String,
    pub reassurance: String,
}

impl Default for NarrativeSections {
    fn default() -> Self {
        Self::pending()
    }
}

impl NarrativeSections {
    /// Every field at the placeholder.
    pub fn pending() -> Self {
        Self {
            affected: PENDING.to_string(),
            impact: PENDING.to_string(),
            team: PENDING.to_string(),
            time: PENDING.to_string(),
            reassurance: PENDING.to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.fields().iter().all(|f| *f == PENDING)
    }

    /// Fields in header order.
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.affected,
            &self.impact,
            &self.team,
            &self.time,
            &self.reassurance,
        ]
    }

    fn from_fields(fields: [String; 5]) -> Self {
        let [affected, impact, team, time, reassurance] = fields;
        Self {
            affected,
            impact,
            team,
            time,
            reassurance,
        }
    }
}

/// Anything that can turn narrative text into sections. Must never fail.
pub trait NarrativeParser: Send + Sync {
    fn parse(&self, text: &str) -> NarrativeSections;
}

/// Decoration that may follow a header: colon, markdown emphasis, dashes.
const HEADER_TAIL: &str = r"[\s:*#_\-–—.]*";

/// Header words separated by any run of spaces, underscores or dashes.
fn header_words(header: &str) -> String {
    let words: Vec<String> = header.split_whitespace().map(regex::escape).collect();
    words.join(r"[\s_\-]*")
}

/// A header that opens a line (after list or heading markers) or is followed
/// by a colon.
fn anchored_pattern(header: &str) -> String {
    let words = header_words(header);
    format!(
        r"(?im)(?:^[\t >*#_\-\d.)]*{}\b|\b{}\b[\t *_]*:){}",
        words, words, HEADER_TAIL
    )
}

/// The header words anywhere, as a last resort.
fn bare_pattern(header: &str) -> String {
    format!(r"(?i)\b{}\b{}", header_words(header), HEADER_TAIL)
}

struct HeaderMatcher {
    anchored: Regex,
    bare: Regex,
}

impl HeaderMatcher {
    fn new(header: &str) -> Self {
        Self {
            anchored: Regex::new(&anchored_pattern(header)).expect("header pattern is valid"),
            bare: Regex::new(&bare_pattern(header)).expect("header pattern is valid"),
        }
    }

    /// First occurrence at or after `from`, preferring an anchored one.
    fn find_from(&self, text: &str, from: usize) -> Option<Range<usize>> {
        self.anchored
            .find_at(text, from)
            .or_else(|| self.bare.find_at(text, from))
            .map(|m| m.range())
    }
}

static HEADER_MATCHERS: LazyLock<Vec<HeaderMatcher>> =
    LazyLock::new(|| HEADERS.iter().map(|h| HeaderMatcher::new(h)).collect());

/// Extracts each section as the text between its header and the next
/// canonical header. Headers are located in order, each one only after the
/// previous one found, so header words inside an earlier section's prose are
/// never taken as headers. A section whose following header is missing stays
/// pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderNarrativeParser;

impl HeaderNarrativeParser {
    fn locate(text: &str) -> [Option<Range<usize>>; 5] {
        let mut cursor = 0;
        std::array::from_fn(|i| {
            let found = HEADER_MATCHERS[i].find_from(text, cursor);
            if let Some(range) = &found {
                cursor = range.end;
            }
            found
        })
    }

    fn section(text: &str, headers: &[Option<Range<usize>>; 5], index: usize) -> Option<String> {
        let header = headers[index].as_ref()?;
        let body = match headers.get(index + 1) {
            None => &text[header.end..],
            Some(next) => &text[header.end..next.as_ref()?.start],
        };
        let body = clean(body);
        (!body.is_empty()).then(|| body.to_string())
    }
}

impl NarrativeParser for HeaderNarrativeParser {
    fn parse(&self, text: &str) -> NarrativeSections {
        let headers = Self::locate(text);
        let fields: [String; 5] = std::array::from_fn(|i| {
            Self::section(text, &headers, i).unwrap_or_else(|| PENDING.to_string())
        });
        let sections = NarrativeSections::from_fields(fields);
        if sections.is_pending() && !text.trim().is_empty() {
            warn!(len = text.len(), "narrative did not match the expected section layout");
        }
        sections
    }
}

/// Strip whitespace and leftover markdown decoration around a section body.
fn clean(body: &str) -> &str {
    body.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "Affected Systems: Transaction System, Security Engine\n\
        Business Impact: Card payments cannot be authorised.\n\
        Responsible Team: Payments Platform SRE\n\
        Estimated Resolution: 45 minutes\n\
        Reassurance: Failover is in progress and no data has been lost.";

    #[test]
    fn test_well_formed_report() {
        let s = HeaderNarrativeParser.parse(REPORT);
        assert_eq!(s.affected, "Transaction System, Security Engine");
        assert_eq!(s.impact, "Card payments cannot be authorised.");
        assert_eq!(s.team, "Payments Platform SRE");
        assert_eq!(s.time, "45 minutes");
        assert_eq!(s.reassurance, "Failover is in progress and no data has been lost.");
    }

    #[test]
    fn test_empty_text_is_all_pending() {
        let s = HeaderNarrativeParser.parse("");
        assert!(s.is_pending());
        assert_eq!(s, NarrativeSections::pending());
    }

    #[test]
    fn test_unstructured_text_is_all_pending() {
        let s = HeaderNarrativeParser
            .parse("Incident affecting: CRM on db-01. System administrators have been notified.");
        assert!(s.is_pending());
    }

    #[test]
    fn test_case_and_decoration_tolerance() {
        let text = "**AFFECTED SYSTEMS:** CRM\n\n## business-impact\nSlower onboarding\n\
            responsible  team - Identity\nEstimated_Resolution: 2 hours\n**Reassurance:** All good.";
        let s = HeaderNarrativeParser.parse(text);
        assert_eq!(s.affected, "CRM");
        assert_eq!(s.impact, "Slower onboarding");
        assert_eq!(s.team, "Identity");
        assert_eq!(s.time, "2 hours");
        assert_eq!(s.reassurance, "All good.");
    }

    #[test]
    fn test_missing_header_defaults_neighbours() {
        // Without "Responsible Team", Business Impact has no end marker.
        let text = "Affected Systems: CRM\nBusiness Impact: Delays\n\
            Estimated Resolution: 1 hour\nReassurance: Under control";
        let s = HeaderNarrativeParser.parse(text);
        assert_eq!(s.affected, "CRM");
        assert_eq!(s.impact, PENDING);
        assert_eq!(s.team, PENDING);
        assert_eq!(s.time, "1 hour");
        assert_eq!(s.reassurance, "Under control");
    }

    #[test]
    fn test_out_of_order_headers_degrade() {
        let text = "Business Impact: Delays\nAffected Systems: CRM\nResponsible Team: Ops\n\
            Estimated Resolution: soon\nReassurance: fine";
        let s = HeaderNarrativeParser.parse(text);
        // Business Impact precedes Affected Systems, so "Affected" has no end marker after it.
        assert_eq!(s.affected, PENDING);
        assert_eq!(s.team, "Ops");
        assert_eq!(s.reassurance, "fine");
    }

    #[test]
    fn test_header_words_inside_prose_are_not_headers() {
        let text = "Affected Systems: CRM, with no business impact on branches yet\n\
            Business Impact: Customers will need reassurance from branches.\n\
            Responsible Team: Ops\n\
            Estimated Resolution: 1 hour, once the responsible team confirms\n\
            Reassurance: Failover is running.";
        let s = HeaderNarrativeParser.parse(text);
        assert_eq!(s.affected, "CRM, with no business impact on branches yet");
        assert_eq!(s.impact, "Customers will need reassurance from branches.");
        assert_eq!(s.team, "Ops");
        assert_eq!(s.time, "1 hour, once the responsible team confirms");
        assert_eq!(s.reassurance, "Failover is running.");
    }

    #[test]
    fn test_inline_headers_without_line_breaks() {
        let text = "Affected Systems CRM Business Impact delays Responsible Team Ops \
            Estimated Resolution soon Reassurance fine";
        let s = HeaderNarrativeParser.parse(text);
        assert_eq!(s.affected, "CRM");
        assert_eq!(s.team, "Ops");
        assert_eq!(s.reassurance, "fine");
    }

    #[test]
    fn test_empty_section_is_pending() {
        let text = "Affected Systems:\nBusiness Impact: x\nResponsible Team: y\n\
            Estimated Resolution: z\nReassurance:   ";
        let s = HeaderNarrativeParser.parse(text);
        assert_eq!(s.affected, PENDING);
        assert_eq!(s.impact, "x");
        assert_eq!(s.reassurance, PENDING);
    }
}
