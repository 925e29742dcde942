//! Engine registry: the single place new games are wired in.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use super::{ConnectFourEngine, GameError, GameType, RulesEngine, TicTacToeEngine};

/// One-time table mapping a game-type tag to its rules engine.
///
/// Built once at process start and read-only thereafter; only the session
/// and lobby-configuration layers consult it.
pub struct EngineRegistry {
    engines: HashMap<GameType, Box<dyn RulesEngine>>,
}

impl EngineRegistry {
    /// Builds the registry with every shipped engine.
    #[instrument]
    pub fn standard() -> Self {
        info!("Building engine registry");
        let mut engines: HashMap<GameType, Box<dyn RulesEngine>> = HashMap::new();
        engines.insert(GameType::TicTacToe, Box::new(TicTacToeEngine));
        engines.insert(GameType::ConnectFour, Box::new(ConnectFourEngine));
        Self { engines }
    }

    /// Resolves the engine for a game type.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnsupportedGameType`] if no engine is registered
    /// for the tag; a deployment defect, never user-triggered in correct
    /// operation.
    #[instrument(skip(self))]
    pub fn engine(&self, game_type: GameType) -> Result<&dyn RulesEngine, GameError> {
        debug!(game_type = %game_type, "Resolving rules engine");
        self.engines
            .get(&game_type)
            .map(|e| e.as_ref())
            .ok_or(GameError::UnsupportedGameType { game_type })
    }

    /// Lists the registered game types.
    pub fn game_types(&self) -> Vec<GameType> {
        self.engines.keys().copied().collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("game_types", &self.game_types())
            .finish()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
