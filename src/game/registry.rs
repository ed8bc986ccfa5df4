use super::player::Player;
use super::players::{FirstMovePlayer, GreedyPlayer, RandomPlayer};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Builds a fresh player for each match
pub type PlayerFactory = Box<dyn Fn() -> Box<dyn Player> + Send + Sync>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown player '{name}' (available: {available})")]
    UnknownPlayer { name: String, available: String },

    #[error("Invalid player identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("Player '{0}' is already registered")]
    Duplicate(String),
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap_or_else(|e| panic!("bad pattern: {e}"))
    })
}

/// Player identifiers must start with a letter or underscore and fit in a name packet
pub fn validate_identifier(name: &str) -> Result<(), RegistryError> {
    if name.len() > crate::messages::MAX_NAME_LEN || !identifier_pattern().is_match(name) {
        return Err(RegistryError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Maps player identifiers to factories
#[derive(Default)]
pub struct PlayerRegistry {
    factories: BTreeMap<String, PlayerFactory>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the reference players: `random`, `first` and `greedy`
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert("random", || Box::new(RandomPlayer));
        registry.insert("first", || Box::new(FirstMovePlayer));
        registry.insert("greedy", || Box::new(GreedyPlayer));
        registry
    }

    fn insert<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Player> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<(), RegistryError>
    where
        F: Fn() -> Box<dyn Player> + Send + Sync + 'static,
    {
        validate_identifier(name)?;
        if self.factories.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }
        self.insert(name, factory);
        Ok(())
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Player>, RegistryError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownPlayer {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for PlayerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerRegistry")
            .field("players", &self.names())
            .finish()
    }
}
