use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProcessError;

/// The four lifecycle states of a process.
///
/// A process flows through: scheduled → processing → [post_processing] → ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Scheduled,
    Processing,
    PostProcessing,
    Ended,
}

impl State {
    pub const ALL: [State; 4] = [
        State::Scheduled,
        State::Processing,
        State::PostProcessing,
        State::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::Scheduled => "scheduled",
            State::Processing => "processing",
            State::PostProcessing => "post_processing",
            State::Ended => "ended",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == State::Ended
    }

    /// Whether an explicit state change may move from `self` to `next`.
    ///
    /// `processing` is only entered through initialization and `ended` only
    /// through terminate/finish, so the sole explicit move is
    /// `processing → post_processing`. Staying put is always allowed.
    pub fn can_set(&self, next: State) -> bool {
        *self == next || matches!((self, next), (State::Processing, State::PostProcessing))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for State {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        State::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ProcessError::InvalidArgument(format!("unknown process state '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_display() {
        assert_eq!(State::Scheduled.to_string(), "scheduled");
        assert_eq!(State::Processing.to_string(), "processing");
        assert_eq!(State::PostProcessing.to_string(), "post_processing");
        assert_eq!(State::Ended.to_string(), "ended");
    }

    #[test]
    fn parse_known_tags() {
        for state in State::ALL {
            assert_eq!(state.as_str().parse::<State>().unwrap(), state);
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        let err = "TestState".parse::<State>().unwrap_err();
        assert!(matches!(err, ProcessError::InvalidArgument(_)));
    }

    #[test]
    fn states_are_ordered_by_lifecycle() {
        assert!(State::Scheduled < State::Processing);
        assert!(State::Processing < State::PostProcessing);
        assert!(State::PostProcessing < State::Ended);
    }

    #[test]
    fn only_post_processing_can_be_set_explicitly() {
        assert!(State::Processing.can_set(State::PostProcessing));
        assert!(State::PostProcessing.can_set(State::PostProcessing));
        assert!(!State::Scheduled.can_set(State::Processing));
        assert!(!State::Scheduled.can_set(State::PostProcessing));
        assert!(!State::PostProcessing.can_set(State::Processing));
        assert!(!State::Processing.can_set(State::Ended));
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&State::PostProcessing).unwrap();
        assert_eq!(json, r#""post_processing""#);
    }
}
