//! Order fulfillment state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Shipping progress of a placed order.
///
/// State transitions:
/// ```text
/// pendiente ──► enviado ──► entregado
/// ```
///
/// Transitions are strictly forward; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentState {
    /// Order placed, not yet shipped.
    #[default]
    #[serde(rename = "pendiente")]
    Pending,

    /// Order handed to the carrier.
    #[serde(rename = "enviado")]
    Shipped,

    /// Order received by the customer (terminal state).
    #[serde(rename = "entregado")]
    Delivered,
}

impl FulfillmentState {
    /// The only transitions an administrator may request.
    pub const TRANSITIONS: [(FulfillmentState, FulfillmentState); 2] = [
        (FulfillmentState::Pending, FulfillmentState::Shipped),
        (FulfillmentState::Shipped, FulfillmentState::Delivered),
    ];

    /// Returns true if `next` is reachable from this state in one step.
    pub fn can_transition_to(&self, next: FulfillmentState) -> bool {
        Self::TRANSITIONS.contains(&(*self, next))
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FulfillmentState::Delivered)
    }

    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentState::Pending => "pendiente",
            FulfillmentState::Shipped => "enviado",
            FulfillmentState::Delivered => "entregado",
        }
    }
}

impl std::fmt::Display for FulfillmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned for an unknown fulfillment state name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fulfillment state: {0:?}")]
pub struct UnknownFulfillmentState(pub String);

impl FromStr for FulfillmentState {
    type Err = UnknownFulfillmentState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(FulfillmentState::Pending),
            "enviado" => Ok(FulfillmentState::Shipped),
            "entregado" => Ok(FulfillmentState::Delivered),
            other => Err(UnknownFulfillmentState(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_pending() {
        assert_eq!(FulfillmentState::default(), FulfillmentState::Pending);
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(FulfillmentState::Pending.can_transition_to(FulfillmentState::Shipped));
        assert!(FulfillmentState::Shipped.can_transition_to(FulfillmentState::Delivered));
    }

    #[test]
    fn test_other_transitions_rejected() {
        use FulfillmentState::*;
        for from in [Pending, Shipped, Delivered] {
            for to in [Pending, Shipped, Delivered] {
                let allowed = matches!((from, to), (Pending, Shipped) | (Shipped, Delivered));
                assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_terminal_state() {
        assert!(!FulfillmentState::Pending.is_terminal());
        assert!(!FulfillmentState::Shipped.is_terminal());
        assert!(FulfillmentState::Delivered.is_terminal());
    }

    #[test]
    fn test_wire_names_roundtrip() {
        for state in [
            FulfillmentState::Pending,
            FulfillmentState::Shipped,
            FulfillmentState::Delivered,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state.as_str()));
            assert_eq!(state.as_str().parse::<FulfillmentState>().unwrap(), state);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!("cancelado".parse::<FulfillmentState>().is_err());
    }
}
