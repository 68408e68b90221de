//! The six session operations and the phrase bindings that trigger them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A public session operation.
///
/// Both the presentation layer and the command listener name operations
/// with this enum; neither has a private way into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Capture an image and a question, answer it, speak the answer.
    Start,
    /// Mark recording as stopped and silence any playing response.
    Stop,
    /// Ask a follow-up question against the conversation history.
    Followup,
    /// Forget the conversation history.
    ClearHistory,
    /// Switch the session off until Reset.
    Off,
    /// Re-enable a switched-off session.
    Reset,
}

impl Operation {
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::Stop,
        Self::Followup,
        Self::ClearHistory,
        Self::Off,
        Self::Reset,
    ];

    /// Stable lowercase name, also accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Followup => "followup",
            Self::ClearHistory => "clear_history",
            Self::Off => "off",
            Self::Reset => "reset",
        }
    }

    /// Whether this operation spawns a workflow (and therefore sets busy).
    pub const fn is_workflow(self) -> bool {
        matches!(self, Self::Start | Self::Followup)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown operation name.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown operation '{0}'")]
pub struct ParseOperationError(pub String);

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "followup" | "follow_up" => Ok(Self::Followup),
            "clear_history" | "clear" => Ok(Self::ClearHistory),
            "off" | "ok" => Ok(Self::Off),
            "reset" | "restart" => Ok(Self::Reset),
            _ => Err(ParseOperationError(s.to_string())),
        }
    }
}

/// One vocabulary entry: a phrase and the operation it dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandBinding {
    pub phrase: String,
    pub operation: Operation,
}

impl CommandBinding {
    pub fn new(phrase: impl Into<String>, operation: Operation) -> Self {
        Self {
            phrase: phrase.into(),
            operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("Start".parse::<Operation>().unwrap(), Operation::Start);
        assert_eq!("follow up".parse::<Operation>().unwrap(), Operation::Followup);
        assert_eq!("clear".parse::<Operation>().unwrap(), Operation::ClearHistory);
        assert_eq!("clear-history".parse::<Operation>().unwrap(), Operation::ClearHistory);
        assert_eq!("restart".parse::<Operation>().unwrap(), Operation::Reset);
        assert!("launch".parse::<Operation>().is_err());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn only_start_and_followup_are_workflows() {
        let workflows: Vec<_> = Operation::ALL.into_iter().filter(|op| op.is_workflow()).collect();
        assert_eq!(workflows, vec![Operation::Start, Operation::Followup]);
    }

    #[test]
    fn binding_deserializes_from_json() {
        let binding: CommandBinding =
            serde_json::from_str(r#"{"phrase":"go","operation":"clear_history"}"#).unwrap();
        assert_eq!(binding, CommandBinding::new("go", Operation::ClearHistory));
    }
}
