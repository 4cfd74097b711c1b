//! Reply selection per intent, shaped by stats, personality and time of day.

use super::intent::Intent;
use super::memory;
use crate::model::{ConversationEntry, Emotion, Panel, Panels, PetState, Species, TimeOfDay};
use rand::Rng;

/// Everything a reply branch may read.
pub(crate) struct ReplyContext<'a> {
    pub(crate) pet: &'a PetState,
    /// Emotion of the previous pet utterance.
    pub(crate) emotion: Emotion,
    pub(crate) time_of_day: TimeOfDay,
    /// Recent entries, ending with the message being answered.
    pub(crate) window: &'a [ConversationEntry],
    /// The user's message, lowercased.
    pub(crate) lowered: &'a str,
    pub(crate) name_recognized: bool,
}

/// Stat changes a branch applies directly, before the per-message rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct BranchEffect {
    pub(crate) hunger: i32,
    pub(crate) energy: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reply {
    pub(crate) text: String,
    pub(crate) emotion: Emotion,
    pub(crate) effect: BranchEffect,
    pub(crate) panels: Panels,
    pub(crate) capture_photo: bool,
}

impl Reply {
    fn new(text: impl Into<String>, emotion: Emotion) -> Self {
        Self {
            text: text.into(),
            emotion,
            effect: BranchEffect::default(),
            panels: Panels::default(),
            capture_photo: false,
        }
    }

    fn opening(mut self, panel: Panel) -> Self {
        self.panels.open(panel);
        self
    }
}

pub(crate) fn select<R: Rng + ?Sized>(intent: Intent, cx: &ReplyContext<'_>, rng: &mut R) -> Reply {
    let mut reply = branch(intent, cx, rng);
    embellish(&mut reply.text, cx, rng);
    reply
}

fn branch<R: Rng + ?Sized>(intent: Intent, cx: &ReplyContext<'_>, rng: &mut R) -> Reply {
    let pet = cx.pet;
    let stats = &pet.stats;
    let traits = &pet.personality;

    match intent {
        Intent::Greeting => {
            let greeting = cx.time_of_day.greeting();
            let text = if cx.name_recognized {
                format!("{greeting}I'm so happy you remembered my name! What would you like to do today?")
            } else {
                format!("{greeting}It's great to see you! How can I make your day better?")
            };
            Reply::new(text, Emotion::Excited)
        }
        Intent::StatusCheck => status_check(cx),
        Intent::PlayRequest => {
            if traits.is_playful() {
                Reply::new(
                    "YES! I'd LOVE to play! I have some fun games we can try! Just click the games button or say \"show me games\"!",
                    Emotion::Excited,
                )
                .opening(Panel::Games)
            } else {
                Reply::new(
                    "I'd enjoy playing a game with you! I have a few we could try. Want to see them?",
                    Emotion::Playful,
                )
            }
        }
        Intent::AccessoryRequest => Reply::new(
            "I love getting dressed up! Check out my accessory collection and help me look fabulous!",
            Emotion::Excited,
        )
        .opening(Panel::Accessories),
        Intent::AchievementRequest => Reply::new(
            format!(
                "I've earned {} achievements so far! Want to see them?",
                pet.achievements.len()
            ),
            Emotion::Proud,
        )
        .opening(Panel::Achievements),
        Intent::PhotoRequest => {
            let mut reply = Reply::new(
                "Let's take a picture together! You can share it with your friends!",
                Emotion::Excited,
            );
            reply.capture_photo = true;
            reply
        }
        Intent::StatsRequest => Reply::new(
            format!(
                "I'm currently at level {} with {} experience points! My happiness is at {}%, and my energy is at {}%. Want to see more stats?",
                pet.level, pet.experience, stats.happiness, stats.energy
            ),
            Emotion::Curious,
        ),
        Intent::FoodRequest => {
            if stats.is_hungry() {
                let mut reply = Reply::new(
                    format!(
                        "Yes please! I'm starving! My favorite is {}!",
                        pet.species.favorite_food()
                    ),
                    Emotion::Hungry,
                );
                reply.effect.hunger = 20;
                reply
            } else {
                let mut reply = Reply::new(
                    format!(
                        "I'm not super hungry right now, but I never say no to a treat! Especially {}!",
                        pet.species.snack()
                    ),
                    Emotion::Happy,
                );
                reply.effect.hunger = 10;
                reply
            }
        }
        Intent::Sad => {
            if traits.is_affectionate() {
                Reply::new(
                    "Oh no! I'm here for you! *nuzzles close* Remember that tomorrow is a new day, and I'll be right here with you.",
                    Emotion::Loving,
                )
            } else {
                Reply::new(
                    "I'm sorry to hear that. Maybe I can cheer you up with my silly antics? Remember, I'm always here for you.",
                    Emotion::Sad,
                )
            }
        }
        Intent::Happy => {
            if traits.is_affectionate() {
                Reply::new(
                    "That's wonderful! Your happiness means everything to me! Let's keep that positive energy going!",
                    Emotion::Loving,
                )
            } else {
                Reply::new(
                    "That's wonderful! I'm happy when you're happy! What should we do to celebrate?",
                    Emotion::Happy,
                )
            }
        }
        Intent::DanceRequest => Reply::new(
            format!(
                "I love to dance! Watch me show off my moves! 🎵 {}  🎵",
                pet.species.sound()
            ),
            Emotion::Dancing,
        ),
        Intent::Surprise => Reply::new(
            "I know, right? Isn't that incredible? I'm always amazed by new things!",
            Emotion::Shocked,
        ),
        Intent::AffectionRequest => {
            let text = if traits.is_affectionate() {
                "Aww, I love you too! You're my absolute favorite person in the whole wide world! *snuggles closer*"
            } else {
                "Aww, I love you too! You're the best friend ever! I'm so lucky to have you."
            };
            Reply::new(text, Emotion::Loving)
        }
        Intent::SleepRequest => {
            let mut reply = Reply::new(
                "*yawn* I could use a little nap too... Maybe we can cuddle up together?",
                Emotion::Sleepy,
            );
            reply.effect.energy = 15;
            reply
        }
        Intent::JokeRequest => {
            let jokes = jokes(pet.species);
            let text = jokes[rng.gen_range(0..jokes.len())].clone();
            Reply::new(text, Emotion::Laughing)
        }
        Intent::FearRequest => Reply::new(
            "Don't worry, I'll protect you! Even though I'm a bit scared too... We can be brave together!",
            Emotion::Scared,
        ),
        Intent::CuriosityRequest => {
            let text = if traits.is_curious() {
                "Ooh, that's fascinating! Tell me more! I love learning new things and exploring ideas with you!"
            } else {
                "Hmm, that's interesting! Tell me more about that! I'm always curious about new things."
            };
            Reply::new(text, Emotion::Curious)
        }
        Intent::MemoryRequest => match memory::recall(cx.window) {
            Some(text) => Reply::new(text, Emotion::Thinking),
            None => Reply::new(
                "I remember all our conversations! Would you like to see my memory bank?",
                Emotion::Happy,
            )
            .opening(Panel::Memory),
        },
        Intent::NameQuestion => Reply::new(
            format!(
                "My name is {}! I'm a {} {}. I'm {} at level {}. What's your name?",
                pet.name,
                pet.color,
                pet.species,
                if pet.level > 5 {
                    "quite experienced"
                } else {
                    "still learning"
                },
                pet.level
            ),
            Emotion::Happy,
        ),
        Intent::NameMention => Reply::new(
            format!(
                "Yes, that's me! {} at your service! How can I help you today? I'm always excited to chat with you!",
                pet.name
            ),
            Emotion::Excited,
        ),
        Intent::Fallback => fallback(pet, rng),
    }
}

fn status_check(cx: &ReplyContext<'_>) -> Reply {
    let stats = &cx.pet.stats;

    if memory::is_repeated(cx.window, cx.lowered) {
        let feeling = if stats.is_hungry() {
            "a bit hungry"
        } else if stats.is_tired() {
            "a little tired"
        } else if stats.is_unhappy() {
            "a bit down"
        } else {
            "great"
        };
        return Reply::new(
            format!("You asked me that recently! But I'm still feeling {feeling}. How about you, any changes?"),
            cx.emotion,
        );
    }

    if stats.is_hungry() {
        Reply::new(
            format!(
                "I'm feeling a bit hungry actually. Maybe a treat would be nice? Otherwise, I'm {}!",
                cx.emotion
            ),
            Emotion::Hungry,
        )
    } else if stats.is_tired() {
        Reply::new(
            format!(
                "I'm a little tired today. Maybe we could do something relaxing? I'm feeling {} though!",
                cx.emotion
            ),
            Emotion::Sleepy,
        )
    } else if stats.is_unhappy() {
        Reply::new(
            "I've been feeling a bit down lately. Maybe we could do something fun together?",
            Emotion::Sad,
        )
    } else {
        Reply::new(
            format!(
                "I'm feeling {} today! Thanks for asking. I'm at level {} now!",
                cx.emotion, cx.pet.level
            ),
            cx.emotion,
        )
    }
}

fn jokes(species: Species) -> [String; 5] {
    let s = species.label();
    let (magician, treat, button) = match species {
        Species::Dog => ("labracadabrador", "milky bone", "paws"),
        Species::Cat => ("hocus pocus cat", "milky mouse", "paws"),
        Species::Bird => ("hocus pocus bird", "milky worm", "beak"),
    };
    [
        "Why don't pets play poker in the jungle? Too many cheetahs! Haha!".to_string(),
        format!("What do you call a {s} that does magic tricks? A {magician}!"),
        format!("Why did the {s} go to space? To find the {treat}!"),
        format!("What do you call a {s} wearing headphones? Whatever you want, they can't hear you! Haha!"),
        format!("How does a {s} stop a video? They press the {button} button!"),
    ]
}

fn fallback<R: Rng + ?Sized>(pet: &PetState, rng: &mut R) -> Reply {
    let traits = &pet.personality;
    let mut pool: Vec<(&str, Emotion)> = Vec::new();

    if traits.is_playful() {
        pool.push(("That's interesting! Want to play a game while we chat?", Emotion::Playful));
        pool.push(("Cool! Hey, did you see that toy over there? Wanna play?", Emotion::Excited));
    }
    if traits.is_affectionate() {
        pool.push(("I'm so glad we're chatting today! You always make me feel special.", Emotion::Loving));
        pool.push(("I love spending time with you like this. Tell me more!", Emotion::Happy));
    }
    if traits.is_curious() {
        pool.push(("Hmm, that's fascinating! I wonder what else we could learn about that?", Emotion::Curious));
        pool.push(("I'm thinking about what you said... it opens up so many possibilities!", Emotion::Thinking));
    }
    if traits.is_independent() {
        pool.push(("That's an interesting perspective. I've been thinking about that differently.", Emotion::Thinking));
        pool.push(("I appreciate you sharing that with me. I've been exploring some ideas on my own too.", Emotion::Curious));
    }

    if pool.len() < 2 {
        pool.push(("I'm listening! Tell me more about that.", Emotion::Curious));
        pool.push(("That's interesting! What else is on your mind?", Emotion::Happy));
        pool.push(("I'm so glad we're chatting today!", Emotion::Excited));
        pool.push(("Hmm, I'm thinking about what you said...", Emotion::Thinking));
    }

    let (text, emotion) = pool[rng.gen_range(0..pool.len())];
    Reply::new(text, emotion)
}

/// Occasional time-of-day and need remarks. Each gate only rolls once the
/// cheaper checks before it have passed.
fn embellish<R: Rng + ?Sized>(text: &mut String, cx: &ReplyContext<'_>, rng: &mut R) {
    match cx.time_of_day {
        TimeOfDay::Night if !text.contains("night") && rng.gen::<f64>() > 0.7 => {
            text.push_str(" It's getting late, isn't it? The stars must be beautiful tonight.");
        }
        TimeOfDay::Morning if !text.contains("morning") && rng.gen::<f64>() > 0.7 => {
            text.push_str(" The morning light is so energizing, don't you think?");
        }
        _ => {}
    }

    let stats = &cx.pet.stats;
    if stats.is_hungry()
        && !text.contains("hungry")
        && !text.contains("food")
        && rng.gen::<f64>() > 0.8
    {
        text.push_str(" By the way, I'm getting a bit hungry. Could I have a treat soon?");
    } else if stats.is_tired()
        && !text.contains("tired")
        && !text.contains("sleep")
        && rng.gen::<f64>() > 0.8
    {
        text.push_str(" *yawns* Sorry, I'm feeling a bit sleepy today.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Personality, Stats};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pet() -> PetState {
        PetState::new_default(0)
    }

    fn reply_for(pet: &PetState, intent: Intent, text: &str, tod: TimeOfDay, seed: u64) -> Reply {
        let window = vec![ConversationEntry::user(text, 0)];
        let lowered = text.to_lowercase();
        let cx = ReplyContext {
            pet,
            emotion: Emotion::Happy,
            time_of_day: tod,
            window: &window,
            lowered: &lowered,
            name_recognized: lowered.contains(&pet.name.to_lowercase()),
        };
        select(intent, &cx, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn daytime_greeting() {
        let r = reply_for(&pet(), Intent::Greeting, "hello", TimeOfDay::Day, 1);
        assert!(r.text.starts_with("Hello! It's great to see you!"), "{}", r.text);
        assert_eq!(r.emotion, Emotion::Excited);
    }

    #[test]
    fn greeting_notices_name() {
        let r = reply_for(&pet(), Intent::Greeting, "hey buddy", TimeOfDay::Evening, 1);
        assert!(r
            .text
            .starts_with("Good evening! I'm so happy you remembered my name!"));
    }

    #[test]
    fn hungry_pet_asks_for_favorite_food() {
        let mut p = pet();
        p.stats.hunger = 20;
        p.species = Species::Cat;
        let r = reply_for(&p, Intent::FoodRequest, "I am hungry", TimeOfDay::Day, 3);
        assert!(r.text.starts_with("Yes please! I'm starving! My favorite is tuna!"));
        assert_eq!(r.emotion, Emotion::Hungry);
        assert_eq!(r.effect.hunger, 20);
    }

    #[test]
    fn fed_pet_still_takes_a_treat() {
        let r = reply_for(&pet(), Intent::FoodRequest, "want a treat?", TimeOfDay::Day, 3);
        assert_eq!(r.emotion, Emotion::Happy);
        assert_eq!(r.effect.hunger, 10);
    }

    #[test]
    fn status_priority_is_hunger_then_energy_then_mood() {
        let mut p = pet();
        p.stats = Stats {
            happiness: 10,
            energy: 10,
            hunger: 50,
            intelligence: 50,
        };
        let r = reply_for(&p, Intent::StatusCheck, "how are you", TimeOfDay::Day, 0);
        assert_eq!(r.emotion, Emotion::Sleepy);

        p.stats.energy = 80;
        let r = reply_for(&p, Intent::StatusCheck, "how are you", TimeOfDay::Day, 0);
        assert_eq!(r.emotion, Emotion::Sad);
    }

    #[test]
    fn playful_pet_opens_games() {
        let mut p = pet();
        p.personality.playfulness = 71;
        let r = reply_for(&p, Intent::PlayRequest, "play", TimeOfDay::Day, 0);
        assert_eq!(r.emotion, Emotion::Excited);
        assert!(r.panels.games);

        p.personality.playfulness = 70;
        let r = reply_for(&p, Intent::PlayRequest, "play", TimeOfDay::Day, 0);
        assert_eq!(r.emotion, Emotion::Playful);
        assert!(!r.panels.games);
    }

    #[test]
    fn jokes_mention_species() {
        let mut p = pet();
        p.species = Species::Bird;
        for seed in 0..20 {
            let r = reply_for(&p, Intent::JokeRequest, "joke", TimeOfDay::Day, seed);
            assert_eq!(r.emotion, Emotion::Laughing);
            assert!(!r.text.contains("dog"));
        }
    }

    #[test]
    fn fallback_never_empty_with_flat_personality() {
        let mut p = pet();
        p.personality = Personality {
            playfulness: 0,
            affection: 0,
            curiosity: 0,
            independence: 0,
        };
        for seed in 0..50 {
            let r = reply_for(&p, Intent::Fallback, "the weather", TimeOfDay::Day, seed);
            assert!(!r.text.is_empty());
        }
    }

    #[test]
    fn fallback_draws_from_dominant_trait() {
        let mut p = pet();
        p.personality.independence = 90;
        for seed in 0..30 {
            let r = reply_for(&p, Intent::Fallback, "the weather", TimeOfDay::Day, seed);
            assert!(
                r.text.contains("interesting perspective") || r.text.contains("on my own"),
                "{}",
                r.text
            );
        }
    }

    #[test]
    fn night_remark_is_not_doubled() {
        for seed in 0..40 {
            let r = reply_for(&pet(), Intent::Greeting, "hi", TimeOfDay::Night, seed);
            assert_eq!(r.text.matches("night").count(), 1, "{}", r.text);
        }
    }

    #[test]
    fn night_remark_shows_up_sometimes() {
        let hits = (0..100)
            .filter(|seed| {
                reply_for(&pet(), Intent::Surprise, "wow", TimeOfDay::Night, *seed)
                    .text
                    .contains("stars must be beautiful")
            })
            .count();
        assert!(hits > 0 && hits < 100, "{hits}");
    }

    /// How many of `seeds` runs of `embellish` add `remark` to `text`.
    fn remark_hits(p: &PetState, tod: TimeOfDay, text: &str, remark: &str) -> usize {
        let lowered = text.to_lowercase();
        let cx = ReplyContext {
            pet: p,
            emotion: Emotion::Happy,
            time_of_day: tod,
            window: &[],
            lowered: &lowered,
            name_recognized: false,
        };
        (0..200)
            .filter(|seed| {
                let mut out = text.to_string();
                embellish(&mut out, &cx, &mut StdRng::seed_from_u64(*seed));
                out.contains(remark)
            })
            .count()
    }

    #[test]
    fn morning_remark_shows_up_sometimes() {
        let hits = remark_hits(&pet(), TimeOfDay::Morning, "Hi!", "morning light");
        assert!(hits > 0 && hits < 200, "{hits}");
        assert_eq!(
            remark_hits(&pet(), TimeOfDay::Morning, "Good morning!", "morning light"),
            0
        );
        assert_eq!(remark_hits(&pet(), TimeOfDay::Day, "Hi!", "morning light"), 0);
    }

    #[test]
    fn hungry_pet_mentions_a_treat_sometimes() {
        let mut p = pet();
        p.stats.hunger = 20;
        let hits = remark_hits(&p, TimeOfDay::Day, "Hi!", "Could I have a treat soon?");
        assert!(hits > 0 && hits < 200, "{hits}");
        assert_eq!(remark_hits(&pet(), TimeOfDay::Day, "Hi!", "treat soon"), 0);
    }

    #[test]
    fn hungry_remark_skipped_when_food_already_came_up() {
        let mut p = pet();
        p.stats.hunger = 20;
        assert_eq!(remark_hits(&p, TimeOfDay::Day, "I love food!", "treat soon"), 0);
        assert_eq!(remark_hits(&p, TimeOfDay::Day, "I'm so hungry!", "treat soon"), 0);
    }

    #[test]
    fn tired_pet_yawns_sometimes() {
        let mut p = pet();
        p.stats.energy = 20;
        let hits = remark_hits(&p, TimeOfDay::Day, "Hi!", "*yawns*");
        assert!(hits > 0 && hits < 200, "{hits}");
        assert_eq!(remark_hits(&p, TimeOfDay::Day, "Time to sleep.", "*yawns*"), 0);

        // at most one need remark per reply
        p.stats.hunger = 20;
        assert_eq!(
            remark_hits(&p, TimeOfDay::Day, "Hi!", "treat soon? *yawns*"),
            0
        );
    }

    #[test]
    fn name_question_reports_experience_bracket() {
        let mut p = pet();
        p.level = 6;
        let r = reply_for(&p, Intent::NameQuestion, "what's your name", TimeOfDay::Day, 0);
        assert!(r.text.starts_with("My name is Buddy! I'm a golden dog. I'm quite experienced at level 6."));
    }
}
