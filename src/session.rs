use crate::dialogue::growth::grant_experience;
use crate::dialogue::{take_turn, TurnContext, TurnOutcome};
use crate::model::{
    achievement, bump, ConversationEntry, Emotion, GameKind, Panel, Panels, PetState, Species,
};
use rand::Rng;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Clone, Debug)]
pub(crate) enum PetAction {
    Say(String),
    CompleteGame { score: u32, kind: GameKind },
    EquipAccessory(String),
    CapturePhoto,
    Customize {
        name: String,
        species: Species,
        color: String,
    },
    TogglePanel(Panel),
    ClosePanels,
}

/// What the front end should show and say after an action.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Feedback {
    /// Pet lines added to the conversation, in order.
    pub(crate) lines: Vec<String>,
    pub(crate) turn: Option<TurnOutcome>,
}

/// All mutable state of one pet, owned by the front end and passed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Session {
    pub(crate) pet: PetState,
    pub(crate) history: Vec<ConversationEntry>,
    pub(crate) emotion: Emotion,
    pub(crate) panels: Panels,
}

impl Session {
    pub(crate) fn new(pet: PetState, history: Vec<ConversationEntry>) -> Self {
        Self {
            pet,
            history,
            emotion: Emotion::Happy,
            panels: Panels::default(),
        }
    }

    pub(crate) fn new_default(now_ms: i64) -> Self {
        let mut s = Self::new(PetState::new_default(now_ms), Vec::new());
        s.greet_if_new(now_ms);
        s
    }

    /// First-run hello when nothing has been said yet.
    pub(crate) fn greet_if_new(&mut self, now_ms: i64) -> Option<String> {
        if !self.history.is_empty() {
            return None;
        }
        let text = format!(
            "Hi there! I'm {}. I'm so excited to meet you! What would you like to do today?",
            self.pet.name
        );
        self.history.push(ConversationEntry::pet(text.clone(), now_ms));
        Some(text)
    }

    /// Missed-you message and happiness dip after a day or more away.
    /// Always refreshes the last-interaction time.
    pub(crate) fn welcome_back(&mut self, now_ms: i64) -> Option<String> {
        let away_days = now_ms.saturating_sub(self.pet.last_interaction_ms).max(0) / DAY_MS;
        self.pet.last_interaction_ms = now_ms;
        if away_days < 1 {
            return None;
        }

        let text = format!(
            "I missed you so much! It's been {} day{} since we last played together!",
            away_days,
            if away_days > 1 { "s" } else { "" }
        );
        self.history.push(ConversationEntry::pet(text.clone(), now_ms));

        let dip = (away_days.min(100) * 5) as i32;
        self.pet.stats.happiness = bump(self.pet.stats.happiness, -dip).max(20);
        tracing::info!(away_days, "welcomed pet owner back");
        Some(text)
    }

    pub(crate) fn apply<R: Rng + ?Sized>(
        &mut self,
        action: PetAction,
        ctx: &TurnContext,
        rng: &mut R,
    ) -> Feedback {
        match action {
            PetAction::Say(text) => self.say(&text, ctx, rng),
            PetAction::CompleteGame { score, kind } => {
                let line = self.complete_game(score, kind, ctx.now_ms, rng);
                Feedback::line(line)
            }
            PetAction::EquipAccessory(name) => {
                let line = self.equip_accessory(&name, ctx.now_ms, rng);
                Feedback::line(line)
            }
            PetAction::CapturePhoto => Feedback::line(self.capture_photo(ctx.now_ms)),
            PetAction::Customize {
                name,
                species,
                color,
            } => Feedback::line(self.customize(&name, species, &color, ctx.now_ms)),
            PetAction::TogglePanel(panel) => {
                self.panels.toggle(panel);
                Feedback::default()
            }
            PetAction::ClosePanels => {
                self.panels.close_all();
                Feedback::default()
            }
        }
    }

    fn say<R: Rng + ?Sized>(&mut self, text: &str, ctx: &TurnContext, rng: &mut R) -> Feedback {
        let Some(turn) = take_turn(&mut self.pet, &mut self.history, self.emotion, text, ctx, rng)
        else {
            return Feedback::default();
        };
        self.emotion = turn.emotion;
        self.panels.merge(turn.panels);

        let mut lines = vec![turn.reply.clone()];
        lines.extend(turn.announcements.iter().cloned());
        Feedback {
            lines,
            turn: Some(turn),
        }
    }

    fn complete_game<R: Rng + ?Sized>(
        &mut self,
        score: u32,
        kind: GameKind,
        now_ms: i64,
        rng: &mut R,
    ) -> String {
        grant_experience(&mut self.pet, score);

        let stats = &mut self.pet.stats;
        let score_i = score.min(1000) as i32;
        match kind {
            GameKind::Memory => {
                stats.intelligence = bump(stats.intelligence, score_i / 10);
            }
            GameKind::Fetch => {
                stats.energy = bump(stats.energy, -(score_i / 5));
                stats.happiness = bump(stats.happiness, score_i / 10);
            }
            GameKind::Puzzle => {
                stats.intelligence = bump(stats.intelligence, score_i / 5);
            }
        }

        if score > 80 && self.pet.achievements.unlock(achievement::GAME_MASTER) {
            tracing::info!(achievement = achievement::GAME_MASTER, "achievement unlocked");
        }

        let quips = [
            format!("That was so much fun! We scored {score} points! Want to play again?"),
            format!("Wow! {score} points! We make a great team!"),
            format!("That was awesome! We got {score} points! I'm getting better at this!"),
        ];
        let text = quips[rng.gen_range(0..quips.len())].clone();
        self.pet_says(text, Emotion::Excited, now_ms)
    }

    fn equip_accessory<R: Rng + ?Sized>(&mut self, name: &str, now_ms: i64, rng: &mut R) -> String {
        if !self.pet.accessories.iter().any(|a| a == name) {
            self.pet.accessories.push(name.to_string());
        }
        self.pet.equipped_accessory = Some(name.to_string());

        let quips = [
            format!("How do I look in my new {name}? I think it suits me!"),
            format!("Do you like my {name}? I feel so stylish!"),
            format!("This {name} is perfect! Thank you for helping me look fabulous!"),
        ];
        let text = quips[rng.gen_range(0..quips.len())].clone();
        self.pet_says(text, Emotion::Happy, now_ms)
    }

    fn capture_photo(&mut self, now_ms: i64) -> String {
        if self.pet.achievements.unlock(achievement::FIRST_PHOTO) {
            tracing::info!(achievement = achievement::FIRST_PHOTO, "achievement unlocked");
        }
        self.panels.open(Panel::Share);
        self.pet_says(
            "That's a great photo! I look amazing, don't I? You can share it with your friends now!"
                .to_string(),
            Emotion::Happy,
            now_ms,
        )
    }

    fn customize(&mut self, name: &str, species: Species, color: &str, now_ms: i64) -> String {
        let name = name.trim();
        if !name.is_empty() {
            self.pet.name = name.to_string();
        }
        let color = color.trim();
        if !color.is_empty() {
            self.pet.color = color.to_string();
        }
        self.pet.species = species;

        let text = format!(
            "Great! My name is now {}, and I'm a {} {}!",
            self.pet.name, self.pet.color, self.pet.species
        );
        self.history.push(ConversationEntry::pet(text.clone(), now_ms));
        text
    }

    fn pet_says(&mut self, text: String, emotion: Emotion, now_ms: i64) -> String {
        self.history.push(ConversationEntry::pet(text.clone(), now_ms));
        self.emotion = emotion;
        text
    }
}

impl Feedback {
    fn line(text: String) -> Self {
        Self {
            lines: vec![text],
            turn: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::intent::Intent;
    use crate::model::TimeOfDay;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ctx(now_ms: i64) -> TurnContext {
        TurnContext {
            now_ms,
            time_of_day: TimeOfDay::Day,
        }
    }

    fn say(s: &mut Session, text: &str, rng: &mut StdRng) -> TurnOutcome {
        s.apply(PetAction::Say(text.to_string()), &ctx(10), rng)
            .turn
            .expect("turn")
    }

    #[test]
    fn new_session_greets_once() {
        let mut s = Session::new_default(0);
        assert_eq!(s.history.len(), 1);
        assert!(s.history[0].text.starts_with("Hi there! I'm Buddy."));
        assert!(s.greet_if_new(5).is_none());
    }

    #[test]
    fn hello_scenario() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(1);
        let out = say(&mut s, "hello", &mut rng);
        assert!(out.reply.starts_with("Hello! It's great to see you!"));
        assert_eq!(out.emotion, Emotion::Excited);
        assert_eq!(s.emotion, Emotion::Excited);
    }

    #[test]
    fn blank_message_is_ignored() {
        let mut s = Session::new_default(0);
        let before = s.clone();
        let mut rng = StdRng::seed_from_u64(1);
        let fb = s.apply(PetAction::Say("  \t".into()), &ctx(10), &mut rng);
        assert!(fb.turn.is_none());
        assert!(fb.lines.is_empty());
        assert_eq!(s, before);
    }

    #[test]
    fn hungry_scenario() {
        let mut s = Session::new_default(0);
        s.pet.stats.hunger = 20;
        let mut rng = StdRng::seed_from_u64(2);
        let out = say(&mut s, "I am hungry", &mut rng);
        assert_eq!(out.intent, Intent::FoodRequest);
        assert_eq!(out.emotion, Emotion::Hungry);
        assert!(out.reply.starts_with("Yes please! I'm starving!"));
        assert!(s.pet.stats.hunger >= 40);
    }

    #[test]
    fn five_long_messages_level_up_once() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(3);
        let message = "z".repeat(200);
        assert_eq!(crate::dialogue::growth::experience_for(&message), 25);

        for _ in 0..3 {
            say(&mut s, &message, &mut rng);
        }
        assert_eq!((s.pet.level, s.pet.experience), (1, 75));

        let fourth = say(&mut s, &message, &mut rng);
        assert_eq!(fourth.levels_reached, vec![2]);
        assert_eq!((s.pet.level, s.pet.experience), (2, 0));
        assert!(s.pet.achievements.contains(achievement::LEVEL_UP));

        say(&mut s, &message, &mut rng);
        assert_eq!((s.pet.level, s.pet.experience), (2, 25));
        assert_eq!(s.pet.xp_to_next_level(), 200);
    }

    #[test]
    fn asking_twice_is_noticed() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(4);
        let first = say(&mut s, "how are you", &mut rng);
        assert!(!first.reply.starts_with("You asked me that recently!"));
        let second = say(&mut s, "how are you", &mut rng);
        assert!(
            second.reply.starts_with("You asked me that recently!"),
            "{}",
            second.reply
        );
        // the repeated branch keeps whatever emotion the pet already had
        assert_eq!(second.emotion, first.emotion);
    }

    #[test]
    fn first_conversation_unlocks_on_second_message() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(5);
        say(&mut s, "the weather", &mut rng);
        assert!(!s.pet.achievements.contains(achievement::FIRST_CONVERSATION));
        say(&mut s, "the weather again", &mut rng);
        assert!(s.pet.achievements.contains(achievement::FIRST_CONVERSATION));
    }

    #[test]
    fn play_game_opens_games_panel() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(6);
        say(&mut s, "can we play game", &mut rng);
        assert!(s.panels.games);
        assert!(s.pet.achievements.contains(achievement::GAME_STARTER));
    }

    #[test]
    fn game_completion_updates_stats_and_levels() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(7);
        let fb = s.apply(
            PetAction::CompleteGame {
                score: 90,
                kind: GameKind::Fetch,
            },
            &ctx(10),
            &mut rng,
        );
        assert!(fb.lines[0].contains("90"));
        assert_eq!(s.pet.stats.energy, 90 - 18);
        assert_eq!(s.pet.stats.happiness, 80 + 9);
        assert!(s.pet.achievements.contains(achievement::GAME_MASTER));
        assert_eq!(s.emotion, Emotion::Excited);

        s.apply(
            PetAction::CompleteGame {
                score: 40,
                kind: GameKind::Puzzle,
            },
            &ctx(11),
            &mut rng,
        );
        assert_eq!((s.pet.level, s.pet.experience), (2, 30));
        assert_eq!(s.pet.stats.intelligence, 58);
    }

    #[test]
    fn equipping_remembers_accessory() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(8);
        let fb = s.apply(PetAction::EquipAccessory("bow tie".into()), &ctx(10), &mut rng);
        assert!(fb.lines[0].contains("bow tie"));
        s.apply(PetAction::EquipAccessory("bow tie".into()), &ctx(11), &mut rng);
        assert_eq!(s.pet.accessories, vec!["bow tie".to_string()]);
        assert_eq!(s.pet.equipped_accessory.as_deref(), Some("bow tie"));
    }

    #[test]
    fn photo_unlocks_and_opens_share() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(9);
        s.apply(PetAction::CapturePhoto, &ctx(10), &mut rng);
        assert!(s.pet.achievements.contains(achievement::FIRST_PHOTO));
        assert!(s.panels.share);
    }

    #[test]
    fn customize_announces_new_identity() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(10);
        let fb = s.apply(
            PetAction::Customize {
                name: "Pip".into(),
                species: Species::Bird,
                color: "blue".into(),
            },
            &ctx(10),
            &mut rng,
        );
        assert_eq!(fb.lines[0], "Great! My name is now Pip, and I'm a blue bird!");
        assert_eq!(s.pet.species, Species::Bird);
    }

    #[test]
    fn welcome_back_after_days_away() {
        let mut s = Session::new_default(0);
        let line = s.welcome_back(3 * DAY_MS + 5).expect("missed you");
        assert!(line.contains("3 days"));
        assert_eq!(s.pet.stats.happiness, 65);
        assert_eq!(s.pet.last_interaction_ms, 3 * DAY_MS + 5);

        assert!(s.welcome_back(3 * DAY_MS + 10).is_none());
    }

    #[test]
    fn welcome_back_floor_is_twenty() {
        let mut s = Session::new_default(0);
        s.pet.stats.happiness = 30;
        s.welcome_back(10 * DAY_MS);
        assert_eq!(s.pet.stats.happiness, 20);

        // a pet already below the floor is lifted to it
        s.pet.stats.happiness = 10;
        s.pet.last_interaction_ms = 0;
        s.welcome_back(10 * DAY_MS);
        assert_eq!(s.pet.stats.happiness, 20);
    }

    #[test]
    fn corrupt_last_interaction_does_not_overflow() {
        let mut s = Session::new_default(0);
        s.pet.last_interaction_ms = i64::MIN + 1;
        let line = s.welcome_back(DAY_MS).expect("missed you");
        assert!(line.contains("days"));
        assert_eq!(s.pet.stats.happiness, 20);
        assert_eq!(s.pet.last_interaction_ms, DAY_MS);
    }

    #[test]
    fn panels_toggle_by_hand() {
        let mut s = Session::new_default(0);
        let mut rng = StdRng::seed_from_u64(11);
        s.apply(PetAction::TogglePanel(Panel::Achievements), &ctx(1), &mut rng);
        assert!(s.panels.achievements);
        s.apply(PetAction::ClosePanels, &ctx(2), &mut rng);
        assert!(!s.panels.any());
    }
}
