//! Rule-based dialogue engine: classify, recall, reply, then grow.
pub(crate) mod growth;
pub(crate) mod intent;
pub(crate) mod memory;
pub(crate) mod respond;

use crate::model::{
    bump, recent, ConversationEntry, Emotion, Panels, PetState, StatDelta, TimeOfDay,
};
use intent::Intent;
use rand::Rng;
use respond::ReplyContext;

/// Wall-clock inputs for one turn, passed in so turns replay deterministically.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TurnContext {
    pub(crate) now_ms: i64,
    pub(crate) time_of_day: TimeOfDay,
}

impl TurnContext {
    pub(crate) fn now() -> Self {
        Self {
            now_ms: chrono::Utc::now().timestamp_millis(),
            time_of_day: TimeOfDay::now_local(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TurnOutcome {
    pub(crate) intent: Intent,
    pub(crate) reply: String,
    pub(crate) emotion: Emotion,
    pub(crate) stat_delta: StatDelta,
    pub(crate) experience_gained: u32,
    pub(crate) levels_reached: Vec<u32>,
    pub(crate) achievements_unlocked: Vec<String>,
    pub(crate) panels: Panels,
    pub(crate) capture_photo: bool,
    /// Extra pet lines appended after the reply (level-ups).
    pub(crate) announcements: Vec<String>,
}

/// Answers one user message and applies its effects.
///
/// Returns `None` for blank input, leaving everything untouched. Otherwise the
/// user entry, the reply and any level-up announcements are appended to
/// `history` in that order.
pub(crate) fn take_turn<R: Rng + ?Sized>(
    pet: &mut PetState,
    history: &mut Vec<ConversationEntry>,
    emotion: Emotion,
    message: &str,
    ctx: &TurnContext,
    rng: &mut R,
) -> Option<TurnOutcome> {
    if message.trim().is_empty() {
        return None;
    }

    let prior_len = history.len();
    history.push(ConversationEntry::user(message, ctx.now_ms));
    pet.last_interaction_ms = ctx.now_ms;

    let lowered = message.to_lowercase();
    let pet_name = pet.name.to_lowercase();
    let intent = intent::classify(&lowered, &pet_name);

    let reply = {
        let cx = ReplyContext {
            pet: &*pet,
            emotion,
            time_of_day: ctx.time_of_day,
            window: recent(history.as_slice()),
            lowered: &lowered,
            name_recognized: !pet_name.is_empty() && lowered.contains(&pet_name),
        };
        respond::select(intent, &cx, rng)
    };

    let stats_before = pet.stats;
    pet.stats.hunger = bump(pet.stats.hunger, reply.effect.hunger);
    pet.stats.energy = bump(pet.stats.energy, reply.effect.energy);
    history.push(ConversationEntry::pet(reply.text.clone(), ctx.now_ms));

    let grown = growth::grow(pet, message, reply.emotion, prior_len);
    let announcements: Vec<String> = grown
        .levels_reached
        .iter()
        .map(|lvl| growth::level_up_announcement(*lvl))
        .collect();
    for line in &announcements {
        history.push(ConversationEntry::pet(line.clone(), ctx.now_ms));
    }

    let mut panels = reply.panels;
    panels.merge(grown.panels);

    tracing::debug!(
        ?intent,
        emotion = %reply.emotion,
        xp = grown.experience_gained,
        "pet replied"
    );
    for lvl in &grown.levels_reached {
        tracing::info!(level = lvl, "pet levelled up");
    }
    for name in &grown.unlocked {
        tracing::info!(achievement = %name, "achievement unlocked");
    }

    Some(TurnOutcome {
        intent,
        reply: reply.text,
        emotion: reply.emotion,
        stat_delta: pet.stats.delta_from(&stats_before),
        experience_gained: grown.experience_gained,
        levels_reached: grown.levels_reached,
        achievements_unlocked: grown.unlocked,
        panels,
        capture_photo: reply.capture_photo,
        announcements,
    })
}
