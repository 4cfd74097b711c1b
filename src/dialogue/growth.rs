//! Per-message experience, stat, personality and achievement rules.

use super::intent::contains_any;
use crate::model::{achievement, bump, Emotion, Panel, Panels, PetState, Personality, Stats};

pub(crate) fn experience_for(message: &str) -> u32 {
    5 + message.chars().count() as u32 / 10
}

/// Adds experience and rolls any overflow into level-ups.
/// Returns the levels reached, in order.
pub(crate) fn grant_experience(pet: &mut PetState, amount: u32) -> Vec<u32> {
    let mut reached = Vec::new();
    pet.experience = pet.experience.saturating_add(amount);
    while pet.experience >= pet.xp_to_next_level() {
        pet.experience -= pet.xp_to_next_level();
        pet.level += 1;
        reached.push(pet.level);
    }
    reached
}

pub(crate) fn level_up_announcement(level: u32) -> String {
    format!("Wow! I just reached level {level}! Thank you for helping me grow!")
}

pub(crate) fn apply_stat_rules(stats: &mut Stats, lowered: &str, emotion: Emotion) {
    use Emotion::*;

    if contains_any(lowered, &["good", "love", "happy"])
        || matches!(emotion, Happy | Excited | Loving)
    {
        stats.happiness = bump(stats.happiness, 5);
    } else if contains_any(lowered, &["bad", "sad", "angry"]) || matches!(emotion, Sad | Scared) {
        stats.happiness = bump(stats.happiness, -3);
    }

    if contains_any(lowered, &["play", "run", "exercise"]) || matches!(emotion, Excited | Playful) {
        stats.energy = bump(stats.energy, -5);
    } else if contains_any(lowered, &["rest", "sleep"]) || emotion == Sleepy {
        stats.energy = bump(stats.energy, 10);
    }

    if contains_any(lowered, &["food", "eat", "treat"]) || emotion == Hungry {
        stats.hunger = bump(stats.hunger, 15);
    } else {
        stats.hunger = bump(stats.hunger, -1);
    }

    if contains_any(lowered, &["learn", "smart", "teach"]) || matches!(emotion, Curious | Thinking)
    {
        stats.intelligence = bump(stats.intelligence, 2);
    }
}

pub(crate) fn apply_personality_rules(traits: &mut Personality, lowered: &str) {
    if contains_any(lowered, &["play", "fun", "game"]) {
        traits.playfulness = bump(traits.playfulness, 1);
    }
    if contains_any(lowered, &["love", "hug", "pet"]) {
        traits.affection = bump(traits.affection, 1);
    }
    if contains_any(lowered, &["what", "why", "how"]) {
        traits.curiosity = bump(traits.curiosity, 1);
    }
    if contains_any(lowered, &["alone", "space", "yourself"]) {
        traits.independence = bump(traits.independence, 1);
    }
}

/// Result of running the per-message rules once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Growth {
    pub(crate) experience_gained: u32,
    pub(crate) levels_reached: Vec<u32>,
    pub(crate) unlocked: Vec<String>,
    pub(crate) panels: Panels,
}

/// Runs every per-message rule against `pet`.
///
/// `prior_len` is the conversation length before the user's message was added.
/// "Genius Pet" looks at intelligence as it stood before this message, so it
/// unlocks on the message after the one that reaches 80.
pub(crate) fn grow(pet: &mut PetState, message: &str, emotion: Emotion, prior_len: usize) -> Growth {
    let lowered = message.to_lowercase();
    let intelligence_before = pet.stats.intelligence;
    let mut growth = Growth {
        experience_gained: experience_for(message),
        ..Growth::default()
    };

    growth.levels_reached = grant_experience(pet, growth.experience_gained);
    if !growth.levels_reached.is_empty() && pet.achievements.unlock(achievement::LEVEL_UP) {
        growth.unlocked.push(achievement::LEVEL_UP.to_string());
    }

    apply_stat_rules(&mut pet.stats, &lowered, emotion);
    apply_personality_rules(&mut pet.personality, &lowered);

    let mut unlock = |pet: &mut PetState, name: &str| {
        if pet.achievements.unlock(name) {
            growth.unlocked.push(name.to_string());
        }
    };

    if prior_len == 3 {
        unlock(pet, achievement::FIRST_CONVERSATION);
    }
    if prior_len >= 20 {
        unlock(pet, achievement::CHATTY_FRIEND);
    }
    if emotion == Emotion::Loving {
        unlock(pet, achievement::BEST_FRIENDS);
    }
    if emotion == Emotion::Excited {
        unlock(pet, achievement::EXCITEMENT_MASTER);
    }
    let game_starter = lowered.contains("play game") && !pet.achievements.contains(achievement::GAME_STARTER);
    if game_starter {
        unlock(pet, achievement::GAME_STARTER);
    }
    let fashion = contains_any(&lowered, &["accessory", "wear", "dress"]);
    if fashion {
        unlock(pet, achievement::FASHION_SENSE);
    }
    if intelligence_before >= 80 {
        unlock(pet, achievement::GENIUS_PET);
    }

    if game_starter {
        growth.panels.open(Panel::Games);
    }
    if fashion {
        growth.panels.open(Panel::Accessories);
    }
    growth
}
