// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Share links.
//!
//! A pattern travels in the `pattern` query parameter of the page URL. On
//! load the parameter is decoded and stripped; afterwards the URL is kept in
//! step with the pattern by a debounced rewrite.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::codec::PatternCodec;
use crate::pattern::DrumPattern;

/// Query parameter carrying the encoded pattern
pub const PATTERN_PARAM: &str = "pattern";

/// Quiet period before the URL is rewritten
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// URL split into base, query pairs and fragment
struct UrlParts<'a> {
    base: &'a str,
    pairs: Vec<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (base, query) = rest.split_once('?').unwrap_or((rest, ""));
        let pairs = query.split('&').filter(|pair| !pair.is_empty()).collect();
        Self {
            base,
            pairs,
            fragment,
        }
    }

    fn key(pair: &str) -> &str {
        pair.split_once('=').map_or(pair, |(key, _)| key)
    }

    fn render(&self, extra: Option<String>) -> String {
        let mut url = self.base.to_string();
        let mut pairs: Vec<String> = self.pairs.iter().map(|p| p.to_string()).collect();
        pairs.extend(extra);
        if !pairs.is_empty() {
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        if let Some(fragment) = self.fragment {
            url.push('#');
            url.push_str(fragment);
        }
        url
    }
}

/// Pull the `pattern` parameter out of a URL.
///
/// Returns the parameter value (first occurrence) and the URL with every
/// occurrence removed. Other parameters and the fragment are kept in order.
pub fn take_pattern_param(url: &str) -> (Option<String>, String) {
    let mut parts = UrlParts::parse(url);
    let mut value = None;
    parts.pairs.retain(|pair| {
        if UrlParts::key(pair) != PATTERN_PARAM {
            return true;
        }
        if value.is_none() {
            value = pair.split_once('=').map(|(_, v)| v.to_string());
        }
        false
    });
    (value.filter(|v| !v.is_empty()), parts.render(None))
}

/// Set or remove the `pattern` parameter, replacing any existing one
pub fn set_pattern_param(url: &str, value: Option<&str>) -> String {
    let mut parts = UrlParts::parse(url);
    parts.pairs.retain(|pair| UrlParts::key(pair) != PATTERN_PARAM);
    parts.render(value.map(|v| format!("{}={}", PATTERN_PARAM, v)))
}

/// Link that opens `pattern` on the page at `base_url`
pub fn share_link(base_url: &str, pattern: &DrumPattern, codec: &PatternCodec) -> Option<String> {
    let encoded = codec.encode(pattern)?;
    Some(set_pattern_param(base_url, Some(&encoded)))
}

/// A rewrite of the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlUpdate {
    /// Put this encoded pattern in the URL
    Set(String),
    /// Drop the parameter
    Remove,
}

impl UrlUpdate {
    /// Apply to a URL
    pub fn apply(&self, url: &str) -> String {
        match self {
            UrlUpdate::Set(encoded) => set_pattern_param(url, Some(encoded)),
            UrlUpdate::Remove => set_pattern_param(url, None),
        }
    }
}

/// Debounced URL rewriting.
///
/// Call [`UrlSync::notify`] with the session revision after changes and
/// [`UrlSync::poll`] from the main loop. Each change restarts the quiet
/// period; once it elapses one update is produced for the latest pattern.
#[derive(Debug, Clone)]
pub struct UrlSync {
    debounce: Duration,
    synced_revision: u64,
    pending: Option<(u64, Instant)>,
}

impl Default for UrlSync {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl UrlSync {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            synced_revision: 0,
            pending: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Treat `revision` as already reflected in the URL (after loading from it)
    pub fn mark_synced(&mut self, revision: u64) {
        self.synced_revision = revision;
        self.pending = None;
    }

    /// Whether a rewrite is waiting for its quiet period
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record the current revision. A new revision restarts the timer.
    pub fn notify(&mut self, revision: u64, now: Instant) {
        if revision == self.synced_revision {
            self.pending = None;
            return;
        }
        match self.pending {
            Some((pending, _)) if pending == revision => {}
            _ => self.pending = Some((revision, now)),
        }
    }

    /// Produce the rewrite once the quiet period has passed.
    ///
    /// A pattern that cannot be encoded removes the parameter rather than
    /// leaving a stale one behind.
    pub fn poll(
        &mut self,
        now: Instant,
        pattern: Option<&DrumPattern>,
        codec: &PatternCodec,
    ) -> Option<UrlUpdate> {
        let (revision, since) = self.pending?;
        if now.saturating_duration_since(since) < self.debounce {
            return None;
        }
        self.mark_synced(revision);

        let update = match pattern.and_then(|p| codec.encode(p)) {
            Some(encoded) => UrlUpdate::Set(encoded),
            None => UrlUpdate::Remove,
        };
        debug!(revision, remove = matches!(update, UrlUpdate::Remove), "url rewritten");
        Some(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Subdivision;

    #[test]
    fn test_take_pattern_param() {
        let (value, url) = take_pattern_param("https://x.dev/app?a=1&pattern=abc-_&b=2#top");
        assert_eq!(value.as_deref(), Some("abc-_"));
        assert_eq!(url, "https://x.dev/app?a=1&b=2#top");

        let (value, url) = take_pattern_param("https://x.dev/app?pattern=abc");
        assert_eq!(value.as_deref(), Some("abc"));
        assert_eq!(url, "https://x.dev/app");
    }

    #[test]
    fn test_take_without_param() {
        let (value, url) = take_pattern_param("https://x.dev/?patterns=1");
        assert!(value.is_none());
        assert_eq!(url, "https://x.dev/?patterns=1");

        let (value, _) = take_pattern_param("https://x.dev/?pattern=");
        assert!(value.is_none());
    }

    #[test]
    fn test_set_pattern_param_replaces() {
        let url = set_pattern_param("https://x.dev/?pattern=old&q=1", Some("new"));
        assert_eq!(url, "https://x.dev/?q=1&pattern=new");

        let url = set_pattern_param(&url, None);
        assert_eq!(url, "https://x.dev/?q=1");
    }

    #[test]
    fn test_share_link_decodes_back() {
        let mut pattern = DrumPattern::new(Some("Link"), 1, Subdivision::Eighth);
        pattern.toggle_step(0, 0);
        let codec = PatternCodec::default();

        let link = share_link("https://x.dev/", &pattern, &codec).unwrap();
        let (value, url) = take_pattern_param(&link);
        assert_eq!(url, "https://x.dev/");

        let decoded = codec.decode(&value.unwrap()).unwrap();
        assert_eq!(decoded.tracks(), pattern.tracks());
    }

    #[test]
    fn test_debounce_waits_for_quiet() {
        let start = Instant::now();
        let codec = PatternCodec::default();
        let pattern = DrumPattern::default();
        let mut sync = UrlSync::new(Duration::from_millis(500));

        sync.notify(1, start);
        sync.notify(2, start + Duration::from_millis(300));
        assert!(sync
            .poll(start + Duration::from_millis(600), Some(&pattern), &codec)
            .is_none());

        let update = sync.poll(start + Duration::from_millis(800), Some(&pattern), &codec);
        assert!(matches!(update, Some(UrlUpdate::Set(_))));
        assert!(!sync.is_pending());
        assert!(sync
            .poll(start + Duration::from_secs(5), Some(&pattern), &codec)
            .is_none());
    }

    #[test]
    fn test_cleared_pattern_removes_param() {
        let start = Instant::now();
        let mut sync = UrlSync::default();
        sync.notify(3, start);
        let update = sync.poll(start + Duration::from_secs(1), None, &PatternCodec::default());
        assert_eq!(update, Some(UrlUpdate::Remove));
        assert_eq!(UrlUpdate::Remove.apply("https://x.dev/?pattern=abc"), "https://x.dev/");
    }

    #[test]
    fn test_unencodable_pattern_removes_param() {
        let start = Instant::now();
        let mut sync = UrlSync::default();
        sync.notify(1, start);
        let tiny = PatternCodec::new(4);
        let update = sync.poll(start + Duration::from_secs(1), Some(&DrumPattern::default()), &tiny);
        assert_eq!(update, Some(UrlUpdate::Remove));
    }

    #[test]
    fn test_synced_revision_is_quiet() {
        let start = Instant::now();
        let mut sync = UrlSync::default();
        sync.mark_synced(4);
        sync.notify(4, start);
        assert!(!sync.is_pending());
    }
}
