//! Pure state transitions for the key manager.

use std::time::Duration;

use tracing::{debug, info};

use super::state::{ApiKey, ApiKeysState, NewKey, SCOPES, find_expiration};

/// How long a copy button shows its confirmation.
pub const COPIED_FLASH: Duration = Duration::from_millis(2000);

/// Copy id used for the secret shown in the create form.
pub const MODAL_COPY_ID: &str = "modal-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenForm,
    EditName(String),
    /// Expiration value or label.
    SelectExpiration(String),
    ToggleScope(String),
    Create(NewKey),
    /// Closes the form and clears it.
    ResetForm,
    Delete(String),
    Search(String),
    ToggleVisibility(String),
    Copy { text: String, id: String },
    /// The confirmation timer for `id` ran out.
    ClearCopied(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CopyToClipboard(String),
    /// Send [`Action::ClearCopied`] for `id` after `after`.
    ClearCopiedAfter { id: String, after: Duration },
}

/// Applies `action` to `state`.
pub fn reduce(state: &mut ApiKeysState, action: Action) -> Vec<Effect> {
    match action {
        Action::OpenForm => state.creating = true,
        Action::EditName(name) => state.new_key_name = name,
        Action::SelectExpiration(name) => match find_expiration(&name) {
            Some(expiration) => state.expiration = expiration,
            None => debug!(expiration = %name, "Ignoring unknown expiration"),
        },
        Action::ToggleScope(scope) => toggle_scope(state, scope),
        Action::Create(new_key) => create(state, new_key),
        Action::ResetForm => state.reset_form(),
        Action::Delete(id) => {
            let before = state.keys.len();
            state.keys.retain(|k| k.id != id);
            if state.keys.len() == before {
                debug!(id = %id, "Ignoring delete of unknown key");
            } else {
                info!(id = %id, "Deleted API key");
            }
        }
        Action::Search(term) => state.search = term,
        Action::ToggleVisibility(id) => {
            state.visible_key_id = if state.visible_key_id.as_deref() == Some(id.as_str()) { None } else { Some(id) };
        }
        Action::Copy { text, id } => {
            state.copied_id = Some(id.clone());
            return vec![Effect::CopyToClipboard(text), Effect::ClearCopiedAfter { id, after: COPIED_FLASH }];
        }
        Action::ClearCopied(id) => {
            // A later copy owns the flag.
            if state.copied_id.as_deref() == Some(id.as_str()) {
                state.copied_id = None;
            }
        }
    }
    Vec::new()
}

fn toggle_scope(state: &mut ApiKeysState, scope: String) {
    if let Some(pos) = state.selected_scopes.iter().position(|s| *s == scope) {
        state.selected_scopes.remove(pos);
    } else if SCOPES.contains(&scope.as_str()) {
        state.selected_scopes.push(scope);
    } else {
        debug!(scope = %scope, "Ignoring unknown scope");
    }
}

fn create(state: &mut ApiKeysState, new_key: NewKey) {
    let name = state.new_key_name.trim();
    if name.is_empty() {
        return;
    }

    let key = ApiKey {
        id: new_key.id,
        name: name.to_string(),
        key: new_key.secret.clone(),
        created: new_key.created,
        last_used: "Never".to_string(),
        expiration: state.expiration.label.to_string(),
        scopes: state.selected_scopes.clone(),
    };
    info!(id = %key.id, name = %key.name, scopes = key.scopes.len(), "Created API key");
    state.keys.insert(0, key);
    state.generated_key = Some(new_key.secret);
}
