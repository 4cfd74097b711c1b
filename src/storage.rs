use crate::config::atomic_rename;
use crate::model::{
    Achievements, ConversationEntry, Personality, PetState, Species, Stats, MAX_LEVEL, XP_PER_LEVEL,
};
use crate::session::Session;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(crate) mod keys {
    pub(crate) const NAME: &str = "petName";
    pub(crate) const SPECIES: &str = "petType";
    pub(crate) const COLOR: &str = "petColor";
    pub(crate) const LEVEL: &str = "petLevel";
    pub(crate) const EXPERIENCE: &str = "petExperience";
    pub(crate) const STATS: &str = "petStats";
    pub(crate) const ACHIEVEMENTS: &str = "petAchievements";
    pub(crate) const ACCESSORIES: &str = "petAccessories";
    pub(crate) const ACTIVE_ACCESSORY: &str = "activeAccessory";
    pub(crate) const PERSONALITY: &str = "petPersonality";
    pub(crate) const LAST_INTERACTION: &str = "lastInteraction";
    pub(crate) const CONVERSATION: &str = "petConversation";
}

/// String key/value persistence, one value per named field.
pub(crate) trait KeyValueStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[cfg(test)]
#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryStore {
    entries: BTreeMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys live in one JSON object on disk, rewritten atomically on change.
#[derive(Debug)]
pub(crate) struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub(crate) fn open(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable pet store, starting fresh");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    fn flush(&self) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        if self.entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(store: &impl KeyValueStore, key: &str, default: T) -> T {
    match store.load(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, "ignoring malformed saved value");
            default
        }),
        None => default,
    }
}

fn json_or<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str, default: T) -> T {
    match store.load(key) {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "ignoring malformed saved value");
            default
        }),
        None => default,
    }
}

/// Pulls an out-of-range saved value back into range, noting the repair.
fn in_range<T: PartialEq + Copy>(key: &str, raw: T, fixed: T) -> T {
    if raw != fixed {
        tracing::warn!(key, "saved value out of range, clamping");
    }
    fixed
}

/// Rebuilds a session field by field; anything missing or malformed falls back
/// to its default. A fresh pet (no saved conversation) gets its first greeting.
pub(crate) fn load_session(store: &impl KeyValueStore, now_ms: i64) -> Session {
    let d = PetState::new_default(now_ms);

    let level: u32 = parse_or(store, keys::LEVEL, d.level);
    let level = in_range(keys::LEVEL, level, level.clamp(1, MAX_LEVEL));
    let experience: u32 = parse_or(store, keys::EXPERIENCE, d.experience);
    let experience = in_range(
        keys::EXPERIENCE,
        experience,
        experience.min(level * XP_PER_LEVEL - 1),
    );
    let stats = json_or::<Stats>(store, keys::STATS, d.stats);
    let personality = json_or::<Personality>(store, keys::PERSONALITY, d.personality);

    let pet = PetState {
        name: store
            .load(keys::NAME)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(d.name),
        species: parse_or::<Species>(store, keys::SPECIES, d.species),
        color: store
            .load(keys::COLOR)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(d.color),
        level,
        experience,
        stats: in_range(keys::STATS, stats, stats.clamped()),
        personality: in_range(keys::PERSONALITY, personality, personality.clamped()),
        achievements: Achievements::from(json_or::<Vec<String>>(
            store,
            keys::ACHIEVEMENTS,
            Vec::new(),
        )),
        accessories: json_or(store, keys::ACCESSORIES, Vec::new()),
        equipped_accessory: store
            .load(keys::ACTIVE_ACCESSORY)
            .filter(|s| !s.is_empty()),
        last_interaction_ms: parse_or(store, keys::LAST_INTERACTION, d.last_interaction_ms),
    };

    let (history, fresh) = match store.load(keys::CONVERSATION) {
        Some(raw) => match serde_json::from_str::<Vec<ConversationEntry>>(&raw) {
            Ok(history) => (history, false),
            Err(e) => {
                tracing::error!(error = %e, "failed to parse saved conversation");
                (Vec::new(), false)
            }
        },
        None => (Vec::new(), true),
    };

    let mut session = Session::new(pet, history);
    if fresh {
        session.greet_if_new(now_ms);
    }
    session
}

pub(crate) fn save_session(store: &mut impl KeyValueStore, session: &Session) -> Result<()> {
    let pet = &session.pet;
    store.save(keys::NAME, &pet.name)?;
    store.save(keys::SPECIES, pet.species.label())?;
    store.save(keys::COLOR, &pet.color)?;
    store.save(keys::LEVEL, &pet.level.to_string())?;
    store.save(keys::EXPERIENCE, &pet.experience.to_string())?;
    store.save(keys::STATS, &serde_json::to_string(&pet.stats)?)?;
    store.save(keys::ACHIEVEMENTS, &serde_json::to_string(&pet.achievements)?)?;
    store.save(keys::ACCESSORIES, &serde_json::to_string(&pet.accessories)?)?;
    match &pet.equipped_accessory {
        Some(a) => store.save(keys::ACTIVE_ACCESSORY, a)?,
        None => store.remove(keys::ACTIVE_ACCESSORY)?,
    }
    store.save(keys::PERSONALITY, &serde_json::to_string(&pet.personality)?)?;
    store.save(keys::LAST_INTERACTION, &pet.last_interaction_ms.to_string())?;
    if !session.history.is_empty() {
        store.save(keys::CONVERSATION, &serde_json::to_string(&session.history)?)?;
    }
    Ok(())
}
