//! Keyword intent classification. Rules are tried in order; the first hit wins.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Intent {
    Greeting,
    StatusCheck,
    PlayRequest,
    AccessoryRequest,
    AchievementRequest,
    PhotoRequest,
    StatsRequest,
    FoodRequest,
    Sad,
    Happy,
    DanceRequest,
    Surprise,
    AffectionRequest,
    SleepRequest,
    JokeRequest,
    FearRequest,
    CuriosityRequest,
    MemoryRequest,
    NameQuestion,
    NameMention,
    Fallback,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Trigger {
    AnyOf(&'static [&'static str]),
    PetName,
    Always,
}

impl Trigger {
    fn matches(self, lowered: &str, pet_name: &str) -> bool {
        match self {
            Trigger::AnyOf(words) => contains_any(lowered, words),
            Trigger::PetName => !pet_name.is_empty() && lowered.contains(pet_name),
            Trigger::Always => true,
        }
    }
}

pub(crate) struct Rule {
    pub(crate) intent: Intent,
    pub(crate) trigger: Trigger,
}

const fn rule(intent: Intent, words: &'static [&'static str]) -> Rule {
    Rule {
        intent,
        trigger: Trigger::AnyOf(words),
    }
}

pub(crate) const RULES: &[Rule] = &[
    rule(Intent::Greeting, &["hello", "hi", "hey"]),
    rule(Intent::StatusCheck, &["how are you"]),
    rule(Intent::PlayRequest, &["play", "game"]),
    rule(
        Intent::AccessoryRequest,
        &["accessory", "wear", "dress", "outfit"],
    ),
    rule(Intent::AchievementRequest, &["achievement", "award", "trophy"]),
    rule(
        Intent::PhotoRequest,
        &["share", "photo", "picture", "snapshot"],
    ),
    rule(Intent::StatsRequest, &["stats", "level", "progress"]),
    rule(Intent::FoodRequest, &["food", "treat", "hungry"]),
    rule(Intent::Sad, &["bad", "sad", "upset"]),
    rule(Intent::Happy, &["good", "happy", "great"]),
    rule(Intent::DanceRequest, &["dance", "music", "sing"]),
    rule(Intent::Surprise, &["wow", "amazing", "surprise"]),
    rule(Intent::AffectionRequest, &["love", "cuddle", "hug"]),
    rule(Intent::SleepRequest, &["sleep", "tired", "rest"]),
    rule(Intent::JokeRequest, &["joke", "funny", "laugh"]),
    rule(Intent::FearRequest, &["scared", "fear", "afraid"]),
    rule(Intent::CuriosityRequest, &["curious", "wonder", "what if"]),
    rule(Intent::MemoryRequest, &["remember", "memory"]),
    rule(Intent::NameQuestion, &["name"]),
    Rule {
        intent: Intent::NameMention,
        trigger: Trigger::PetName,
    },
    Rule {
        intent: Intent::Fallback,
        trigger: Trigger::Always,
    },
];

pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Both arguments must already be lowercased.
pub(crate) fn classify(lowered: &str, pet_name: &str) -> Intent {
    RULES
        .iter()
        .find(|r| r.trigger.matches(lowered, pet_name))
        .map(|r| r.intent)
        .unwrap_or(Intent::Fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_rule_fires_on_its_own_keyword() {
        let cases = [
            ("hello", Intent::Greeting),
            ("how are you", Intent::StatusCheck),
            ("let's play", Intent::PlayRequest),
            ("new outfit", Intent::AccessoryRequest),
            ("my trophy", Intent::AchievementRequest),
            ("take a photo", Intent::PhotoRequest),
            ("show stats", Intent::StatsRequest),
            ("i am hungry", Intent::FoodRequest),
            ("i feel sad", Intent::Sad),
            ("feeling great", Intent::Happy),
            ("sing along", Intent::DanceRequest),
            ("wow", Intent::Surprise),
            ("cuddle time", Intent::AffectionRequest),
            ("so tired", Intent::SleepRequest),
            ("tell me a joke", Intent::JokeRequest),
            ("i'm afraid", Intent::FearRequest),
            ("i wonder", Intent::CuriosityRequest),
            ("do you remember", Intent::MemoryRequest),
            ("what's your name", Intent::NameQuestion),
            ("buddy!", Intent::NameMention),
            ("the weather", Intent::Fallback),
        ];
        for (text, expected) in cases {
            assert_eq!(classify(text, "buddy"), expected, "input {text:?}");
        }
    }

    #[test]
    fn earlier_rules_take_priority() {
        // "hi" also sits inside "this" and wins over the play rule.
        assert_eq!(classify("this game rocks", "buddy"), Intent::Greeting);
        assert_eq!(classify("play with food", "buddy"), Intent::PlayRequest);
        assert_eq!(classify("good food", "buddy"), Intent::FoodRequest);
        assert_eq!(classify("i love being sad", "buddy"), Intent::Sad);
    }

    #[test]
    fn empty_pet_name_never_matches() {
        assert_eq!(classify("xyz", ""), Intent::Fallback);
    }

    #[test]
    fn table_ends_with_fallback() {
        let last = RULES.last().map(|r| r.intent);
        assert_eq!(last, Some(Intent::Fallback));
        assert_eq!(RULES.len(), 21);
    }
}
