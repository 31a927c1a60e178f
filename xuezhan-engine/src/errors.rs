use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// Deal precondition failure: short deck, unfilled table.
    Deal { message: String },
    /// Room/seat state inconsistency.
    InvalidState { message: String },
    /// Discard request whose rank has no matching tile in hand.
    IllegalDiscard { rank: u8 },
    /// Discard from a seat that does not hold the move.
    NotYourTurn { seat: usize },
    /// Record (de)serialization failure at the persistence boundary.
    Serialization { message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Deal { message } => {
                write!(f, "Deal error: {}", message)
            }
            EngineError::InvalidState { message } => {
                write!(f, "Invalid state: {}", message)
            }
            EngineError::IllegalDiscard { rank } => {
                write!(f, "Illegal discard: no tile of rank {} in hand", rank)
            }
            EngineError::NotYourTurn { seat } => {
                write!(f, "Not slot {}'s turn", seat)
            }
            EngineError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
