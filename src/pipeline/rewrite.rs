//! Document rewriting: swap saved links for their local paths.
//!
//! Rewriting works on the match spans the extractor reported, not on raw
//! substrings. A span is replaced only when its whole text is a saved link,
//! so a saved `…/a.png` never bleeds into a failed `…/a.png?v=2` that merely
//! starts with it. Every span of a saved link is rewritten, including the
//! repeats the orchestrator did not fetch again.

use std::collections::HashMap;
use std::ops::Range;

/// Rebuild `document` with each span whose text is a saved link replaced by
/// its local path.
///
/// `spans` must be ascending and non-overlapping, as returned by
/// [`crate::pipeline::extract::LinkExtractor::find_spans`]. Text outside the
/// spans, and spans with no substitution, are copied unchanged.
pub fn rewrite_document<L, P>(
    document: &str,
    spans: &[Range<usize>],
    substitutions: &[(L, P)],
) -> String
where
    L: AsRef<str>,
    P: AsRef<str>,
{
    if substitutions.is_empty() {
        return document.to_string();
    }

    let local_for: HashMap<&str, &str> = substitutions
        .iter()
        .map(|(link, local)| (link.as_ref(), local.as_ref()))
        .collect();

    let mut out = String::with_capacity(document.len());
    let mut cursor = 0;
    for span in spans {
        let link = &document[span.clone()];
        if let Some(local) = local_for.get(link) {
            out.push_str(&document[cursor..span.start]);
            out.push_str(local);
            cursor = span.end;
        }
    }
    out.push_str(&document[cursor..]);
    out
}
