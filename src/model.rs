use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of trailing conversation entries the dialogue engine looks at.
pub(crate) const HISTORY_WINDOW: usize = 10;
pub(crate) const STAT_MAX: u8 = 100;
pub(crate) const XP_PER_LEVEL: u32 = 100;
/// Highest level accepted from saved state.
pub(crate) const MAX_LEVEL: u32 = 10_000;

/// Clamped add for 0..=100 meters.
pub(crate) fn bump(value: u8, delta: i32) -> u8 {
    (value as i32 + delta).clamp(0, STAT_MAX as i32) as u8
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Species {
    #[default]
    Dog,
    Cat,
    Bird,
}

impl Species {
    pub(crate) const ALL: [Species; 3] = [Species::Dog, Species::Cat, Species::Bird];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Species::Dog => "dog",
            Species::Cat => "cat",
            Species::Bird => "bird",
        }
    }

    pub(crate) fn favorite_food(self) -> &'static str {
        match self {
            Species::Dog => "bacon treats",
            Species::Cat => "tuna",
            Species::Bird => "sunflower seeds",
        }
    }

    pub(crate) fn snack(self) -> &'static str {
        match self {
            Species::Dog => "bacon",
            Species::Cat => "tuna",
            Species::Bird => "seeds",
        }
    }

    pub(crate) fn sound(self) -> &'static str {
        match self {
            Species::Dog => "Woof woof!",
            Species::Cat => "Meow meow!",
            Species::Bird => "Tweet tweet!",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Species {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dog" => Ok(Species::Dog),
            "cat" => Ok(Species::Cat),
            "bird" => Ok(Species::Bird),
            other => anyhow::bail!("unknown species {other:?} (expected dog, cat or bird)"),
        }
    }
}

/// Mode label attached to the most recent pet utterance.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Emotion {
    #[default]
    Happy,
    Excited,
    Playful,
    Proud,
    Curious,
    Hungry,
    Sleepy,
    Sad,
    Loving,
    Dancing,
    Shocked,
    Laughing,
    Scared,
    Thinking,
}

impl Emotion {
    #[cfg(test)]
    pub(crate) const ALL: [Emotion; 14] = [
        Emotion::Happy,
        Emotion::Excited,
        Emotion::Playful,
        Emotion::Proud,
        Emotion::Curious,
        Emotion::Hungry,
        Emotion::Sleepy,
        Emotion::Sad,
        Emotion::Loving,
        Emotion::Dancing,
        Emotion::Shocked,
        Emotion::Laughing,
        Emotion::Scared,
        Emotion::Thinking,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Excited => "excited",
            Emotion::Playful => "playful",
            Emotion::Proud => "proud",
            Emotion::Curious => "curious",
            Emotion::Hungry => "hungry",
            Emotion::Sleepy => "sleepy",
            Emotion::Sad => "sad",
            Emotion::Loving => "loving",
            Emotion::Dancing => "dancing",
            Emotion::Shocked => "shocked",
            Emotion::Laughing => "laughing",
            Emotion::Scared => "scared",
            Emotion::Thinking => "thinking",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Stats {
    pub(crate) happiness: u8,
    pub(crate) energy: u8,
    pub(crate) hunger: u8,
    pub(crate) intelligence: u8,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            happiness: 80,
            energy: 90,
            hunger: 70,
            intelligence: 50,
        }
    }
}

impl Stats {
    /// Every meter pulled back into 0..=100.
    pub(crate) fn clamped(self) -> Self {
        Self {
            happiness: self.happiness.min(STAT_MAX),
            energy: self.energy.min(STAT_MAX),
            hunger: self.hunger.min(STAT_MAX),
            intelligence: self.intelligence.min(STAT_MAX),
        }
    }

    pub(crate) fn is_hungry(&self) -> bool {
        self.hunger < 30
    }

    pub(crate) fn is_tired(&self) -> bool {
        self.energy < 30
    }

    pub(crate) fn is_unhappy(&self) -> bool {
        self.happiness < 30
    }

    pub(crate) fn delta_from(&self, before: &Stats) -> StatDelta {
        StatDelta {
            happiness: self.happiness as i16 - before.happiness as i16,
            energy: self.energy as i16 - before.energy as i16,
            hunger: self.hunger as i16 - before.hunger as i16,
            intelligence: self.intelligence as i16 - before.intelligence as i16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct StatDelta {
    pub(crate) happiness: i16,
    pub(crate) energy: i16,
    pub(crate) hunger: i16,
    pub(crate) intelligence: i16,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Personality {
    pub(crate) playfulness: u8,
    pub(crate) affection: u8,
    pub(crate) curiosity: u8,
    pub(crate) independence: u8,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            playfulness: 50,
            affection: 50,
            curiosity: 50,
            independence: 50,
        }
    }
}

impl Personality {
    pub(crate) fn clamped(self) -> Self {
        Self {
            playfulness: self.playfulness.min(STAT_MAX),
            affection: self.affection.min(STAT_MAX),
            curiosity: self.curiosity.min(STAT_MAX),
            independence: self.independence.min(STAT_MAX),
        }
    }

    // a trait counts as dominant strictly above 70
    pub(crate) fn is_playful(&self) -> bool {
        self.playfulness > 70
    }

    pub(crate) fn is_affectionate(&self) -> bool {
        self.affection > 70
    }

    pub(crate) fn is_curious(&self) -> bool {
        self.curiosity > 70
    }

    pub(crate) fn is_independent(&self) -> bool {
        self.independence > 70
    }
}

/// Unlocked achievement names, in unlock order, without duplicates.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub(crate) struct Achievements(Vec<String>);

impl Achievements {
    /// Returns true when the achievement was newly added.
    pub(crate) fn unlock(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|a| a == name)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for Achievements {
    fn from(v: Vec<String>) -> Self {
        let mut out = Achievements::default();
        for name in v {
            out.unlock(&name);
        }
        out
    }
}

pub(crate) mod achievement {
    pub(crate) const LEVEL_UP: &str = "Level Up";
    pub(crate) const FIRST_CONVERSATION: &str = "First Conversation";
    pub(crate) const CHATTY_FRIEND: &str = "Chatty Friend";
    pub(crate) const BEST_FRIENDS: &str = "Best Friends";
    pub(crate) const EXCITEMENT_MASTER: &str = "Excitement Master";
    pub(crate) const GAME_STARTER: &str = "Game Starter";
    pub(crate) const FASHION_SENSE: &str = "Fashion Sense";
    pub(crate) const GENIUS_PET: &str = "Genius Pet";
    pub(crate) const GAME_MASTER: &str = "Game Master";
    pub(crate) const FIRST_PHOTO: &str = "First Photo";
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PetState {
    pub(crate) name: String,
    pub(crate) species: Species,
    pub(crate) color: String,
    pub(crate) level: u32,
    pub(crate) experience: u32,
    pub(crate) stats: Stats,
    pub(crate) personality: Personality,
    pub(crate) achievements: Achievements,
    pub(crate) accessories: Vec<String>,
    pub(crate) equipped_accessory: Option<String>,
    pub(crate) last_interaction_ms: i64,
}

impl PetState {
    pub(crate) fn new_default(now_ms: i64) -> Self {
        Self {
            name: "Buddy".to_string(),
            species: Species::Dog,
            color: "golden".to_string(),
            level: 1,
            experience: 0,
            stats: Stats::default(),
            personality: Personality::default(),
            achievements: Achievements::default(),
            accessories: Vec::new(),
            equipped_accessory: None,
            last_interaction_ms: now_ms,
        }
    }

    pub(crate) fn xp_to_next_level(&self) -> u32 {
        self.level.saturating_mul(XP_PER_LEVEL)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Sender {
    User,
    Pet,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ConversationEntry {
    pub(crate) text: String,
    pub(crate) sender: Sender,
    pub(crate) timestamp: i64,
}

impl ConversationEntry {
    pub(crate) fn user(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            timestamp,
        }
    }

    pub(crate) fn pet(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Pet,
            timestamp,
        }
    }
}

/// Last `HISTORY_WINDOW` entries of a history.
pub(crate) fn recent(history: &[ConversationEntry]) -> &[ConversationEntry] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimeOfDay {
    Morning,
    Day,
    Evening,
    Night,
}

impl TimeOfDay {
    pub(crate) fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Day,
            17..=19 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub(crate) fn now_local() -> Self {
        Self::from_hour(Local::now().hour())
    }

    pub(crate) fn greeting(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "Good morning! ",
            TimeOfDay::Day => "Hello! ",
            TimeOfDay::Evening => "Good evening! ",
            TimeOfDay::Night => "Hello there, night owl! ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Panel {
    Games,
    Accessories,
    Achievements,
    Memory,
    Share,
}

/// Panels the front end should show; set by dialogue side effects or by hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Panels {
    pub(crate) games: bool,
    pub(crate) accessories: bool,
    pub(crate) achievements: bool,
    pub(crate) memory: bool,
    pub(crate) share: bool,
}

impl Panels {
    pub(crate) fn open(&mut self, panel: Panel) {
        *self.slot(panel) = true;
    }

    pub(crate) fn toggle(&mut self, panel: Panel) {
        let slot = self.slot(panel);
        *slot = !*slot;
    }

    pub(crate) fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Games => self.games,
            Panel::Accessories => self.accessories,
            Panel::Achievements => self.achievements,
            Panel::Memory => self.memory,
            Panel::Share => self.share,
        }
    }

    pub(crate) fn merge(&mut self, other: Panels) {
        self.games |= other.games;
        self.accessories |= other.accessories;
        self.achievements |= other.achievements;
        self.memory |= other.memory;
        self.share |= other.share;
    }

    pub(crate) fn any(&self) -> bool {
        self.games || self.accessories || self.achievements || self.memory || self.share
    }

    pub(crate) fn close_all(&mut self) {
        *self = Panels::default();
    }

    fn slot(&mut self, panel: Panel) -> &mut bool {
        match panel {
            Panel::Games => &mut self.games,
            Panel::Accessories => &mut self.accessories,
            Panel::Achievements => &mut self.achievements,
            Panel::Memory => &mut self.memory,
            Panel::Share => &mut self.share,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GameKind {
    Memory,
    Fetch,
    Puzzle,
}

impl GameKind {
    pub(crate) const ALL: [GameKind; 3] = [GameKind::Memory, GameKind::Fetch, GameKind::Puzzle];

    pub(crate) fn label(self) -> &'static str {
        match self {
            GameKind::Memory => "memory",
            GameKind::Fetch => "fetch",
            GameKind::Puzzle => "puzzle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_clamps_both_ends() {
        assert_eq!(bump(98, 5), 100);
        assert_eq!(bump(2, -3), 0);
        assert_eq!(bump(50, 0), 50);
    }

    #[test]
    fn clamped_pulls_meters_into_range() {
        let stats = Stats {
            happiness: 101,
            energy: 255,
            hunger: 0,
            intelligence: 100,
        }
        .clamped();
        assert_eq!((stats.happiness, stats.energy), (100, 100));
        assert_eq!((stats.hunger, stats.intelligence), (0, 100));

        let traits = Personality {
            playfulness: 200,
            ..Personality::default()
        }
        .clamped();
        assert_eq!(traits.playfulness, 100);
        assert_eq!(traits.affection, 50);
    }

    #[test]
    fn xp_threshold_saturates_instead_of_overflowing() {
        let mut pet = PetState::new_default(0);
        pet.level = u32::MAX;
        assert_eq!(pet.xp_to_next_level(), u32::MAX);
    }

    #[test]
    fn time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Day);
        assert_eq!(TimeOfDay::from_hour(17), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn achievements_never_duplicate() {
        let mut a = Achievements::default();
        assert!(a.unlock(achievement::LEVEL_UP));
        assert!(!a.unlock(achievement::LEVEL_UP));
        assert_eq!(a.len(), 1);

        let loaded = Achievements::from(vec!["A".to_string(), "B".to_string(), "A".to_string()]);
        assert_eq!(loaded.iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn species_parses_case_insensitively() {
        assert_eq!("Cat".parse::<Species>().unwrap(), Species::Cat);
        assert!("hamster".parse::<Species>().is_err());
    }

    #[test]
    fn emotion_serializes_lowercase() {
        let s = serde_json::to_string(&Emotion::Laughing).unwrap();
        assert_eq!(s, "\"laughing\"");
    }

    #[test]
    fn recent_keeps_last_ten() {
        let history: Vec<_> = (0..15)
            .map(|i| ConversationEntry::user(format!("m{i}"), i))
            .collect();
        let window = recent(&history);
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window[0].text, "m5");
    }
}
