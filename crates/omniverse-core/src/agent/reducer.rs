//! Pure state transitions for the builder workspace.
//!
//! [`reduce`] applies one [`Action`] to a [`WorkspaceState`] and returns the side effects the
//! caller must run. Nothing here touches the network or the clock.

use omniverse_abstraction::ChatMessage;
use tracing::{debug, info};

use super::state::{ProjectType, RightTab, WorkspaceState, find_device, find_model};
use crate::code_blocks::extract;
use crate::file_tree::{ActiveFile, FileTree, apply_blocks};

/// Assistant text used when a reply has no content.
pub const FALLBACK_REPLY: &str = "I couldn't process that request.";

/// Notice shown when the model call fails.
pub const FAILURE_NOTICE: &str = "Failed to communicate with the model.";

/// Something the user did or something that came back from an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectProjectType(ProjectType),
    SelectDevice(String),
    SelectModel(String),
    SetTab(RightTab),
    ToggleFolder(String),
    OpenFile(String),
    EditInput(String),
    AttachFile(String),
    Send,
    ChatSucceeded(String),
    ChatFailed(String),
    DismissNotice,
    Deploy,
    DeployFinished(String),
    DeployCancelled,
    Export,
}

/// Work the reducer asks its caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send the conversation to the model.
    SubmitChat { messages: Vec<ChatMessage>, model: String },
    /// Start the simulated deploy.
    StartDeploy,
    /// Package the tree as an archive.
    ExportArchive { tree: FileTree },
}

/// Applies `action` to `state`.
pub fn reduce(state: &mut WorkspaceState, action: Action) -> Vec<Effect> {
    match action {
        Action::SelectProjectType(project_type) => {
            state.project_type = Some(project_type);
            Vec::new()
        }
        Action::SelectDevice(name) => {
            match find_device(&name) {
                Some(device) => state.device = device,
                None => debug!(device = %name, "Ignoring unknown device"),
            }
            Vec::new()
        }
        Action::SelectModel(name) => {
            match find_model(&name) {
                Some(model) => state.selected_model = model.name,
                None => debug!(model = %name, "Ignoring unknown model"),
            }
            Vec::new()
        }
        Action::SetTab(tab) => {
            state.right_tab = tab;
            Vec::new()
        }
        Action::ToggleFolder(name) => {
            state.files.toggle_folder(&name);
            Vec::new()
        }
        Action::OpenFile(path) => {
            match ActiveFile::from_tree(&state.files, &path) {
                Some(file) => state.active_file = Some(file),
                None => debug!(path = %path, "Ignoring open of unknown file"),
            }
            Vec::new()
        }
        Action::EditInput(text) => {
            state.chat_input = text;
            Vec::new()
        }
        Action::AttachFile(name) => {
            state.chat_input.push_str(&format!(" [Attachment: {}] ", name));
            Vec::new()
        }
        Action::Send => send(state),
        Action::ChatSucceeded(content) => {
            chat_succeeded(state, content);
            Vec::new()
        }
        Action::ChatFailed(reason) => {
            info!(reason = %reason, "Chat request failed");
            state.notice = Some(FAILURE_NOTICE.to_string());
            state.loading = false;
            Vec::new()
        }
        Action::DismissNotice => {
            state.notice = None;
            Vec::new()
        }
        Action::Deploy => {
            if state.deploying {
                return Vec::new();
            }
            state.deploying = true;
            vec![Effect::StartDeploy]
        }
        Action::DeployFinished(url) => {
            state.deploying = false;
            state.deployment_url = Some(url);
            state.right_tab = RightTab::Preview;
            Vec::new()
        }
        Action::DeployCancelled => {
            state.deploying = false;
            Vec::new()
        }
        Action::Export => vec![Effect::ExportArchive { tree: state.files.clone() }],
    }
}

fn send(state: &mut WorkspaceState) -> Vec<Effect> {
    if state.chat_input.trim().is_empty() || state.loading {
        return Vec::new();
    }

    let input = std::mem::take(&mut state.chat_input);
    state.messages.push(ChatMessage::user(input));
    state.loading = true;
    state.last_changes.clear();

    vec![Effect::SubmitChat { messages: state.messages.clone(), model: state.selected_model.to_string() }]
}

fn chat_succeeded(state: &mut WorkspaceState, content: String) {
    let content = if content.is_empty() { FALLBACK_REPLY.to_string() } else { content };

    let outcome = apply_blocks(&state.files, state.active_file.as_ref(), extract(&content));
    debug!(
        updated = outcome.updated.len(),
        unmatched = outcome.unmatched.len(),
        activation = ?outcome.activation,
        "Applied reply to workspace"
    );
    state.files = outcome.tree;
    state.active_file = outcome.active;
    state.last_changes = outcome.updated;

    state.messages.push(ChatMessage::assistant(content));
    state.loading = false;
}
