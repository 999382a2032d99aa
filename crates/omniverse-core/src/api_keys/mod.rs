//! API key manager: the key list, the create form and its pure transitions.
//!
//! Like the builder workspace, state only changes through [`reduce`]. Anything random or
//! clock-dependent (the secret, the id, the creation date) arrives in a [`NewKey`] built by the
//! caller, so transitions stay deterministic.

mod reducer;
mod state;

pub use reducer::{Action, COPIED_FLASH, Effect, MODAL_COPY_ID, reduce};
pub use state::{
    ApiKey, ApiKeysState, EXPIRATIONS, Expiration, KEY_PREFIX, NewKey, SCOPES, find_expiration, generate_secret,
};
