use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{Stone, MAX_CANDIDATES};
use crate::error::ConfigError;

/// Who controls each side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    /// Human plays Black against the computer
    HumanBlack,
    /// Human plays White against the computer
    HumanWhite,
    /// Computer plays both sides
    ComputerVsComputer,
    /// Two humans share the board
    HumanVsHuman,
}

impl Default for GameMode {
    fn default() -> Self {
        GameMode::HumanBlack
    }
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [
        GameMode::HumanBlack,
        GameMode::HumanWhite,
        GameMode::ComputerVsComputer,
        GameMode::HumanVsHuman,
    ];

    /// Whether the computer moves for `side`
    pub fn is_computer(self, side: Stone) -> bool {
        match self {
            GameMode::HumanBlack => side == Stone::White,
            GameMode::HumanWhite => side == Stone::Black,
            GameMode::ComputerVsComputer => side != Stone::Empty,
            GameMode::HumanVsHuman => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::HumanBlack => "You: Black vs Computer",
            GameMode::HumanWhite => "You: White vs Computer",
            GameMode::ComputerVsComputer => "Computer vs Computer",
            GameMode::HumanVsHuman => "Human vs Human",
        }
    }
}

/// Search settings for the computer player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Plies searched below the root
    pub depth: u8,
    /// Cap on successor states generated per node
    pub candidate_limit: usize,
    /// Explore sibling subtrees on the rayon pool
    pub parallel: bool,
    /// Subtrees with less remaining depth than this are searched sequentially
    pub parallel_depth_threshold: u8,
    /// Optional wall-clock budget; the deepest finished iteration is used
    pub time_limit_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            candidate_limit: MAX_CANDIDATES,
            parallel: true,
            parallel_depth_threshold: 2,
            time_limit_ms: None,
        }
    }
}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub mode: GameMode,
    pub show_debug: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            show_debug: true,
        }
    }
}

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub ui: UiConfig,
}

impl GameConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: GameConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.depth == 0 {
            return Err(ConfigError::Validation("engine.depth must be > 0".into()));
        }
        if self.engine.candidate_limit == 0 {
            return Err(ConfigError::Validation(
                "engine.candidate_limit must be > 0".into(),
            ));
        }
        if self.engine.time_limit_ms == Some(0) {
            return Err(ConfigError::Validation(
                "engine.time_limit_ms must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.depth, 3);
        assert_eq!(config.ui.mode, GameMode::HumanBlack);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GameConfig = toml::from_str(
            r#"
            [engine]
            depth = 2
            parallel = false

            [ui]
            mode = "computer-vs-computer"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.depth, 2);
        assert!(!config.engine.parallel);
        assert_eq!(config.engine.candidate_limit, MAX_CANDIDATES);
        assert_eq!(config.ui.mode, GameMode::ComputerVsComputer);
        assert!(config.ui.show_debug);
    }

    #[test]
    fn test_validation_rejects_zero_depth() {
        let mut config = GameConfig::default();
        config.engine.depth = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = GameConfig::load_or_default(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn test_mode_sides() {
        assert!(GameMode::HumanBlack.is_computer(Stone::White));
        assert!(!GameMode::HumanBlack.is_computer(Stone::Black));
        assert!(GameMode::HumanWhite.is_computer(Stone::Black));
        assert!(GameMode::ComputerVsComputer.is_computer(Stone::Black));
        assert!(!GameMode::HumanVsHuman.is_computer(Stone::White));
    }
}
