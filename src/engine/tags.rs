use crate::engine::error::MalformedDirective;
use crate::model::mode::{EndingKind, EventKind};

const GAME_OVER_OPEN: &str = "[GAME_OVER";

/// Control marker found in a model reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    GameOver,
    Event(EventKind),
}

/// A model reply split into what the player sees and what drives the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    /// Reply text with every recognized marker removed.
    pub narrative: String,
    pub transition: Option<Transition>,
    /// Event text after an `EVENT` marker, or the ending name inside a
    /// `GAME_OVER` marker. Empty when there is none.
    pub payload: String,
}

impl Directives {
    pub fn ending(&self) -> Result<EndingKind, MalformedDirective> {
        self.payload.parse()
    }

    /// Narrative and payload joined back together, for a marker that is
    /// stripped but not acted upon.
    pub fn flattened(&self) -> String {
        match (self.narrative.is_empty(), self.payload.is_empty()) {
            (_, true) => self.narrative.clone(),
            (true, false) => self.payload.clone(),
            (false, false) => format!("{}\n\n{}", self.narrative, self.payload),
        }
    }

    pub fn event_text(&self, kind: EventKind) -> Result<&str, MalformedDirective> {
        if self.payload.is_empty() {
            Err(MalformedDirective::MissingEventPayload(kind))
        } else {
            Ok(&self.payload)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    start: usize,
    end: usize,
    transition: Transition,
    /// Byte range of the text inside a `[GAME_OVER: ...]` bracket.
    inner: (usize, usize),
}

/// Splits a raw reply at its highest-priority marker.
///
/// Priority is `GAME_OVER` > `EVENT: BOSS_BATTLE` > `EVENT: QUIZ`; only the
/// first occurrence of the winning marker counts. Matching is case-sensitive.
pub fn parse_directives(text: &str) -> Directives {
    let markers = find_markers(text);

    let winner = first_of(&markers, |t| t == Transition::GameOver)
        .or_else(|| first_of(&markers, |t| t == Transition::Event(EventKind::BossBattle)))
        .or_else(|| first_of(&markers, |t| t == Transition::Event(EventKind::Quiz)));

    let Some(winner) = winner else {
        return Directives {
            narrative: strip_markers(text, &markers, 0, text.len()).trim().to_string(),
            transition: None,
            payload: String::new(),
        };
    };

    let before = strip_markers(text, &markers, 0, winner.start);
    let after = strip_markers(text, &markers, winner.end, text.len());
    let before = before.trim();
    let after = trim_payload(&after);

    match winner.transition {
        Transition::GameOver => {
            let narrative = match (before.is_empty(), after.is_empty()) {
                (true, _) => after.to_string(),
                (false, true) => before.to_string(),
                (false, false) => format!("{before}\n\n{after}"),
            };
            Directives {
                narrative,
                transition: Some(Transition::GameOver),
                payload: trim_payload(&text[winner.inner.0..winner.inner.1]).to_string(),
            }
        }
        Transition::Event(_) => Directives {
            narrative: before.to_string(),
            transition: Some(winner.transition),
            payload: after.to_string(),
        },
    }
}

fn first_of(markers: &[Marker], pred: impl Fn(Transition) -> bool) -> Option<Marker> {
    markers.iter().copied().find(|m| pred(m.transition))
}

fn trim_payload(s: &str) -> &str {
    let s = s.trim_start();
    s.strip_prefix(':').unwrap_or(s).trim()
}

/// All marker spans in `text`, ordered by position, without overlaps.
fn find_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();

    for kind in [EventKind::Quiz, EventKind::BossBattle] {
        let needle = kind.marker();
        for (start, _) in text.match_indices(needle) {
            markers.push(Marker {
                start,
                end: start + needle.len(),
                transition: Transition::Event(kind),
                inner: (0, 0),
            });
        }
    }

    let mut from = 0;
    while let Some(offset) = text[from..].find(GAME_OVER_OPEN) {
        let start = from + offset;
        let inner_start = start + GAME_OVER_OPEN.len();
        from = inner_start;

        // "[GAME_OVER]" or "[GAME_OVER: kind]"; anything else is just text.
        let rest = &text[inner_start..];
        if !(rest.starts_with(']') || rest.starts_with(':')) {
            continue;
        }
        // An unclosed marker must not borrow the bracket of a later one.
        let line_end = rest.find(|c: char| c == '[' || c == '\n').unwrap_or(rest.len());
        let Some(close) = rest[..line_end].find(']') else {
            continue;
        };
        let inner_end = inner_start + close;
        markers.push(Marker {
            start,
            end: inner_end + 1,
            transition: Transition::GameOver,
            inner: (inner_start, inner_end),
        });
        from = inner_end + 1;
    }

    markers.sort_by_key(|m| m.start);

    let mut kept: Vec<Marker> = Vec::with_capacity(markers.len());
    for m in markers {
        if kept.last().map_or(true, |prev| m.start >= prev.end) {
            kept.push(m);
        }
    }
    kept
}

/// Copies `text[lo..hi]` leaving out every marker span inside it.
fn strip_markers(text: &str, markers: &[Marker], lo: usize, hi: usize) -> String {
    let mut out = String::with_capacity(hi.saturating_sub(lo));
    let mut cursor = lo;
    for m in markers.iter().filter(|m| m.start >= lo && m.end <= hi) {
        out.push_str(&text[cursor..m.start]);
        cursor = m.end;
    }
    out.push_str(&text[cursor..hi]);
    out
}
