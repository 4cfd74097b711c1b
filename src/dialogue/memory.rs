//! Repetition detection and recall of things the user told the pet.

use crate::model::{ConversationEntry, Sender};
use regex::Regex;
use std::sync::OnceLock;

pub(crate) const REPEAT_THRESHOLD: f64 = 0.7;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)my name is (\w+)|i am called (\w+)|i'm (\w+)").expect("valid name regex")
    })
}

fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word-overlap score in [0, 1].
///
/// Only tokens longer than three characters count, unless neither side has
/// any, in which case every token counts. Tokens of `earlier` are scanned
/// against the set of `current`, so the score is not symmetric in general.
pub(crate) fn similarity(earlier: &str, current: &str) -> f64 {
    let a = tokenize(earlier);
    let b = tokenize(current);

    let long = |t: &&String| t.chars().count() > 3;
    let any_long = a.iter().any(|t| long(&t)) || b.iter().any(|t| long(&t));
    let (a, b): (Vec<&String>, Vec<&String>) = if any_long {
        (a.iter().filter(long).collect(), b.iter().filter(long).collect())
    } else {
        (a.iter().collect(), b.iter().collect())
    };

    let denom = a.len().max(b.len());
    if denom == 0 {
        return 0.0;
    }
    let matches = a.iter().filter(|t| b.contains(*t)).count();
    matches as f64 / denom as f64
}

/// User messages in `window`, minus the last one (the message being answered).
fn prior_user_messages(window: &[ConversationEntry]) -> Vec<&str> {
    let mut msgs: Vec<&str> = window
        .iter()
        .filter(|e| e.sender == Sender::User)
        .map(|e| e.text.as_str())
        .collect();
    msgs.pop();
    msgs
}

/// True when a recent user message closely matches `current`.
///
/// `window` must already contain `current` as its last user entry.
pub(crate) fn is_repeated(window: &[ConversationEntry], current: &str) -> bool {
    prior_user_messages(window)
        .into_iter()
        .any(|prior| similarity(prior, current) > REPEAT_THRESHOLD)
}

/// A remembered self-introduction or stated preference, phrased as a reply.
pub(crate) fn recall(window: &[ConversationEntry]) -> Option<String> {
    let prior = prior_user_messages(window);

    let intro = prior.iter().find(|m| {
        let l = m.to_lowercase();
        l.contains("my name is") || l.contains("i am called")
    });
    if let Some(intro) = intro {
        if let Some(caps) = name_pattern().captures(intro) {
            if let Some(name) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) {
                return Some(format!(
                    "Of course I remember you, {}! It's great to chat with you again!",
                    name.as_str()
                ));
            }
        }
    }

    let liked = prior.iter().find(|m| {
        let l = m.to_lowercase();
        l.contains("i like") || l.contains("i love") || l.contains("my favorite")
    })?;
    Some(format!(
        "I remember you mentioned that {liked}. That's really interesting!"
    ))
}
