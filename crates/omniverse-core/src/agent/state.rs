//! Workspace state and the fixed catalogues it draws from.

use omniverse_abstraction::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::file_tree::{ActiveFile, FileTree};

/// First assistant message of every session.
pub const GREETING: &str =
    "Hello! I'm your Omniverse App Builder. I can build full-stack apps, debug code, and deploy projects instantly.";

/// Kind of project being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Website,
    Mobile,
}

/// Right-hand pane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightTab {
    Preview,
    #[default]
    Code,
}

/// An entry in the model picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelOption {
    pub name: &'static str,
    pub pro: bool,
}

/// Models offered in the picker. The first one is selected by default.
pub const MODELS: &[ModelOption] = &[
    ModelOption { name: "GPT-5.2", pro: true },
    ModelOption { name: "Claude Sonnet 4.5", pro: true },
    ModelOption { name: "Gemini 3 Pro", pro: true },
];

/// Looks up a model by its display name.
pub fn find_model(name: &str) -> Option<&'static ModelOption> {
    MODELS.iter().find(|m| m.name == name)
}

/// A device frame for the mobile preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevicePreset {
    pub name: &'static str,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Corner radius of the frame.
    pub radius: u32,
    pub notch: bool,
}

/// Device presets. The first one is selected by default.
pub const DEVICES: &[DevicePreset] = &[
    DevicePreset { name: "iPhone 15 Pro", width: 393, height: 852, radius: 40, notch: true },
    DevicePreset { name: "iPhone 15 Pro Max", width: 430, height: 932, radius: 44, notch: true },
    DevicePreset { name: "Pixel 8 Pro", width: 412, height: 892, radius: 24, notch: false },
    DevicePreset { name: "Galaxy S24 Ultra", width: 412, height: 890, radius: 4, notch: false },
    DevicePreset { name: "iPad Mini", width: 744, height: 1133, radius: 24, notch: false },
];

/// Looks up a device preset by name.
pub fn find_device(name: &str) -> Option<&'static DevicePreset> {
    DEVICES.iter().find(|d| d.name == name)
}

/// Everything the builder screen shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceState {
    /// `None` until the user picks one on the start screen.
    pub project_type: Option<ProjectType>,
    pub device: &'static DevicePreset,
    pub files: FileTree,
    pub active_file: Option<ActiveFile>,
    pub right_tab: RightTab,
    pub deploying: bool,
    pub deployment_url: Option<String>,
    pub chat_input: String,
    pub messages: Vec<ChatMessage>,
    /// Set while a chat request is outstanding.
    pub loading: bool,
    pub selected_model: &'static str,
    /// Transient error shown to the user.
    pub notice: Option<String>,
    /// Paths replaced by the most recent reply.
    pub last_changes: Vec<String>,
}

impl WorkspaceState {
    /// A fresh session over the seed project.
    pub fn new() -> Self {
        Self::with_files(FileTree::seed())
    }

    /// A fresh session over `files`. The seed's active path is opened if it exists.
    pub fn with_files(files: FileTree) -> Self {
        let active_file = ActiveFile::from_tree(&files, FileTree::SEED_ACTIVE_PATH);
        Self {
            project_type: None,
            device: &DEVICES[0],
            files,
            active_file,
            right_tab: RightTab::default(),
            deploying: false,
            deployment_url: None,
            chat_input: String::new(),
            messages: vec![ChatMessage::assistant(GREETING)],
            loading: false,
            selected_model: MODELS[0].name,
            notice: None,
            last_changes: Vec::new(),
        }
    }

    /// The most recent assistant message.
    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == omniverse_abstraction::ChatRole::Assistant)
    }
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omniverse_abstraction::ChatRole;

    #[test]
    fn test_new_state() {
        let state = WorkspaceState::new();
        assert_eq!(state.project_type, None);
        assert_eq!(state.device.name, "iPhone 15 Pro");
        assert_eq!(state.right_tab, RightTab::Code);
        assert_eq!(state.selected_model, "GPT-5.2");
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, ChatRole::Assistant);
        assert_eq!(state.messages[0].content, GREETING);
        assert!(!state.loading);
        assert!(!state.deploying);

        let active = state.active_file.unwrap();
        assert_eq!(active.path, "src/App.tsx");
        assert_eq!(active.name, "App.tsx");
    }

    #[test]
    fn test_catalogues() {
        assert_eq!(MODELS.len(), 3);
        assert!(MODELS.iter().all(|m| m.pro));
        assert!(find_model("Gemini 3 Pro").is_some());
        assert!(find_model("gpt-5.2").is_none());

        let ipad = find_device("iPad Mini").unwrap();
        assert_eq!((ipad.width, ipad.height, ipad.radius, ipad.notch), (744, 1133, 24, false));
        let max = find_device("iPhone 15 Pro Max").unwrap();
        assert!(max.notch);
        assert_eq!(find_device("Galaxy S24 Ultra").unwrap().radius, 4);
    }

    #[test]
    fn test_with_files_without_seed_path() {
        let state = WorkspaceState::with_files(FileTree::default());
        assert!(state.active_file.is_none());
    }
}
