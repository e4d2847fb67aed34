use serde::{Deserialize, Serialize};

use super::TradeItem;

/// External trade-offer lifecycle states, with the platform's wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferState {
    Active,
    Accepted,
    Countered,
    Expired,
    Canceled,
    Declined,
    InvalidItems,
    CanceledBySecondFactor,
}

impl OfferState {
    pub fn code(&self) -> u8 {
        match self {
            Self::Active => 2,
            Self::Accepted => 3,
            Self::Countered => 4,
            Self::Expired => 5,
            Self::Canceled => 6,
            Self::Declined => 7,
            Self::InvalidItems => 8,
            Self::CanceledBySecondFactor => 10,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(Self::Active),
            3 => Some(Self::Accepted),
            4 => Some(Self::Countered),
            5 => Some(Self::Expired),
            6 => Some(Self::Canceled),
            7 => Some(Self::Declined),
            8 => Some(Self::InvalidItems),
            10 => Some(Self::CanceledBySecondFactor),
            _ => None,
        }
    }

    /// Folds the external state into the category the reconciler acts on.
    pub fn category(&self) -> OfferCategory {
        match self {
            Self::Active => OfferCategory::Active,
            Self::Accepted => OfferCategory::Accepted,
            Self::Countered
            | Self::Expired
            | Self::Canceled
            | Self::Declined
            | Self::InvalidItems
            | Self::CanceledBySecondFactor => OfferCategory::Declined,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.category() != OfferCategory::Active
    }
}

/// Internal category an external offer state folds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferCategory {
    Active,
    Accepted,
    Declined,
}

/// One element of an agent's offer-event stream.
#[derive(Debug, Clone)]
pub struct OfferStateChange {
    pub offer_id: String,
    pub state: OfferState,
    pub to_give: Vec<TradeItem>,
    pub to_receive: Vec<TradeItem>,
}

impl OfferStateChange {
    pub fn has_items(&self) -> bool {
        !self.to_give.is_empty() || !self.to_receive.is_empty()
    }
}

/// Platform-reported outcome of sending an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendStatus {
    /// Delivered to the counterpart.
    Sent,
    /// Delivered, but held until mobile confirmation.
    Pending,
}

/// Dispatch outcome surfaced to the request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Pending,
    Err,
}

impl From<SendStatus> for DispatchStatus {
    fn from(status: SendStatus) -> Self {
        match status {
            SendStatus::Sent => Self::Sent,
            SendStatus::Pending => Self::Pending,
        }
    }
}

impl std::fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Pending => write!(f, "pending"),
            Self::Err => write!(f, "err"),
        }
    }
}

/// Folded external state code carried back to the request layer
/// (`0` when no offer exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchDetail {
    pub state: u8,
}

/// Structured dispatch result. Dispatch never raises; every outcome,
/// including "no agent available", is returned in this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub ok: bool,
    pub status: DispatchStatus,
    pub detail: DispatchDetail,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DispatchResponse {
    /// An offer left the building: status is `sent` or `pending`.
    pub fn delivered(status: SendStatus, offer_id: String, agent_id: String) -> Self {
        Self {
            ok: true,
            status: status.into(),
            detail: DispatchDetail {
                state: OfferState::Active.code(),
            },
            offer_id: Some(offer_id),
            agent_id: Some(agent_id),
            error: None,
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: DispatchStatus::Err,
            detail: DispatchDetail { state: 0 },
            offer_id: None,
            agent_id: None,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_failure_states_fold_to_declined() {
        for state in [
            OfferState::Countered,
            OfferState::Expired,
            OfferState::Canceled,
            OfferState::Declined,
            OfferState::InvalidItems,
            OfferState::CanceledBySecondFactor,
        ] {
            assert_eq!(state.category(), OfferCategory::Declined);
            assert!(state.is_terminal());
        }
        assert_eq!(OfferState::Accepted.category(), OfferCategory::Accepted);
        assert_eq!(OfferState::Active.category(), OfferCategory::Active);
        assert!(!OfferState::Active.is_terminal());
    }

    #[test]
    fn wire_codes_round_trip() {
        for code in [2u8, 3, 4, 5, 6, 7, 8, 10] {
            let state = OfferState::from_code(code).expect("known code");
            assert_eq!(state.code(), code);
        }
        assert!(OfferState::from_code(9).is_none());
        assert!(OfferState::from_code(0).is_none());
    }

    #[test]
    fn failure_response_matches_the_wire_contract() {
        let response = DispatchResponse::failure("Bot not available to send offer");
        assert!(!response.ok);
        assert_eq!(response.status, DispatchStatus::Err);
        assert_eq!(response.detail.state, 0);
        assert!(response.offer_id.is_none());

        let json = serde_json::to_value(&response).expect("serializable");
        assert_eq!(json["status"], "err");
        assert_eq!(json["detail"]["state"], 0);
    }

    #[test]
    fn delivered_response_carries_the_offer_handle() {
        let response =
            DispatchResponse::delivered(SendStatus::Pending, "offer-1".into(), "agent-1".into());
        assert!(response.ok);
        assert_eq!(response.status, DispatchStatus::Pending);
        assert_eq!(response.detail.state, OfferState::Active.code());
        assert_eq!(response.offer_id.as_deref(), Some("offer-1"));
        assert_eq!(response.agent_id.as_deref(), Some("agent-1"));
    }
}
