//! Capability boundary to the external trading platform.

mod inventory;
mod traits;

pub use inventory::{HttpInventoryApi, InventoryProvider};
pub use traits::{
    AccountCredentials, OfferDraft, OfferSubmission, PlatformClient, SessionEvent, SessionHandle,
};
