//! Key records, the form state and the scope and expiration catalogues.

use chrono::{DateTime, Local};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of every generated secret.
pub const KEY_PREFIX: &str = "ak_live_";

const SECRET_ALPHABET: &[u8] = b"abcdef0123456789";
const SECRET_LEN: usize = 32;
const MASK: &str = "••••••••••••••••••••••••";

/// Permission scopes a key can carry.
pub const SCOPES: &[&str] = &["read:models", "write:fine-tune", "admin:billing", "read:analytics"];

/// An entry in the expiration picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Expiration {
    pub label: &'static str,
    pub value: &'static str,
}

/// Expiration choices. The first one is selected by default.
pub const EXPIRATIONS: &[Expiration] = &[
    Expiration { label: "Never", value: "never" },
    Expiration { label: "30 Days", value: "30d" },
    Expiration { label: "60 Days", value: "60d" },
    Expiration { label: "1 Year", value: "1y" },
];

/// Looks up an expiration by value (`30d`) or label (`30 Days`).
pub fn find_expiration(name: &str) -> Option<&'static Expiration> {
    EXPIRATIONS.iter().find(|e| e.value == name || e.label == name)
}

/// A stored API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: String,
    pub name: String,
    /// Full secret, `ak_live_` followed by 32 hex characters.
    pub key: String,
    /// Display date, e.g. `Jan 12, 2026`.
    pub created: String,
    pub last_used: String,
    /// Expiration label.
    pub expiration: String,
    pub scopes: Vec<String>,
}

impl ApiKey {
    /// The secret with everything but the last four characters hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("{}{}{}", KEY_PREFIX, MASK, tail)
    }

    fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.id.contains(&term) || self.key.contains(&term)
    }
}

/// Random and clock-derived parts of a key about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKey {
    pub id: String,
    pub secret: String,
    pub created: String,
}

impl NewKey {
    /// Fresh id, secret and today's date.
    pub fn generate() -> Self {
        Self::generate_at(Local::now())
    }

    /// Fresh id and secret, dated `now`.
    pub fn generate_at(now: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            secret: generate_secret(),
            created: now.format("%b %d, %Y").to_string(),
        }
    }
}

/// A new `ak_live_` secret.
pub fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let body: String =
        (0..SECRET_LEN).map(|_| char::from(SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())])).collect();
    format!("{}{}", KEY_PREFIX, body)
}

/// Everything the key manager screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKeysState {
    /// Newest first.
    pub keys: Vec<ApiKey>,
    /// Whether the create form is open.
    pub creating: bool,
    pub search: String,
    pub new_key_name: String,
    pub expiration: &'static Expiration,
    pub selected_scopes: Vec<String>,
    /// Secret of the key just created, shown once in the form.
    pub generated_key: Option<String>,
    /// Id of the entry whose copy button was last pressed.
    pub copied_id: Option<String>,
    /// Id of the key shown unmasked.
    pub visible_key_id: Option<String>,
}

impl ApiKeysState {
    /// The screen as first opened, with the two seed keys.
    pub fn new() -> Self {
        Self::with_keys(seed_keys())
    }

    /// The screen over `keys`, with an empty form.
    pub fn with_keys(keys: Vec<ApiKey>) -> Self {
        Self {
            keys,
            creating: false,
            search: String::new(),
            new_key_name: String::new(),
            expiration: &EXPIRATIONS[0],
            selected_scopes: default_scopes(),
            generated_key: None,
            copied_id: None,
            visible_key_id: None,
        }
    }

    /// Keys whose name (any case), id or secret contains the search term.
    pub fn filtered_keys(&self) -> Vec<&ApiKey> {
        self.keys.iter().filter(|k| k.matches(&self.search)).collect()
    }

    /// How `key` is displayed: in full when it is the visible one, masked otherwise.
    pub fn display_key(&self, key: &ApiKey) -> String {
        if self.visible_key_id.as_deref() == Some(key.id.as_str()) { key.key.clone() } else { key.masked() }
    }

    pub(super) fn reset_form(&mut self) {
        self.new_key_name.clear();
        self.expiration = &EXPIRATIONS[0];
        self.selected_scopes = default_scopes();
        self.generated_key = None;
        self.creating = false;
    }
}

impl Default for ApiKeysState {
    fn default() -> Self {
        Self::new()
    }
}

fn default_scopes() -> Vec<String> {
    vec![SCOPES[0].to_string()]
}

fn seed_keys() -> Vec<ApiKey> {
    let key = |id: &str, name: &str, secret: &str, created: &str, last_used: &str, scopes: &[&str]| ApiKey {
        id: id.to_string(),
        name: name.to_string(),
        key: secret.to_string(),
        created: created.to_string(),
        last_used: last_used.to_string(),
        expiration: EXPIRATIONS[0].label.to_string(),
        scopes: scopes.iter().map(ToString::to_string).collect(),
    };
    vec![
        key(
            "1",
            "Development",
            "ak_live_4f9a8c2d7e1b6a3f0c5d9e8b7a6f32e1",
            "Jan 12, 2026",
            "Just now",
            &["read:models", "read:analytics"],
        ),
        key(
            "2",
            "Production",
            "ak_live_9b2e7d4c1a8f5e3b6d0c9a7f2e4b11c5",
            "Jan 05, 2026",
            "2 hours ago",
            &["read:models", "write:fine-tune", "read:analytics"],
        ),
    ]
}
