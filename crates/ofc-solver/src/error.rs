use ofc_core::state::StateError;
use thiserror::Error;

/// Facade-boundary failures. Budget exhaustion and cancellation are routine
/// outcomes and never surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("invalid input: {0:?}")]
    InvalidInput(StateError),

    #[error("exhausted deck: {needed} unseen cards required, {available} remain")]
    ExhaustedDeck { needed: u32, available: u32 },

    #[error("inconsistent state: {0}")]
    InconsistentState(&'static str),
}

impl From<StateError> for SolveError {
    fn from(error: StateError) -> Self {
        match error {
            StateError::NotEnoughUnseen { needed, available } => {
                SolveError::ExhaustedDeck { needed, available }
            }
            other => SolveError::InvalidInput(other),
        }
    }
}
