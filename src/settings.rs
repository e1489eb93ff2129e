use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::category::Category;

/// The two fields the controller is allowed to write per category. The
/// question generator reads the same fields when building the next puzzle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOverrides {
    pub premises: Option<u32>,
    pub seconds: Option<u32>,
}

/// Per-category difficulty overrides plus the progression target. Entries are
/// created lazily on first write and persist until an explicit reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSettings {
    /// Target completion time in seconds the controller tunes toward.
    pub goal_seconds: u32,
    #[serde(default)]
    overrides: HashMap<Category, CategoryOverrides>,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            goal_seconds: 30,
            overrides: HashMap::new(),
        }
    }
}

impl ProgressionSettings {
    pub fn with_goal(goal_seconds: u32) -> Self {
        Self {
            goal_seconds,
            ..Self::default()
        }
    }

    pub fn overrides(&self, category: Category) -> CategoryOverrides {
        self.overrides.get(&category).copied().unwrap_or_default()
    }

    pub fn set_premises(&mut self, category: Category, premises: u32) {
        self.overrides.entry(category).or_default().premises = Some(premises);
    }

    pub fn set_seconds(&mut self, category: Category, seconds: u32) {
        self.overrides.entry(category).or_default().seconds = Some(seconds);
    }

    /// Clears every override, keeping the goal. The external "reset" action.
    pub fn reset_overrides(&mut self) {
        self.overrides.clear();
    }
}

pub trait SettingsStore {
    fn load(&self) -> ProgressionSettings;
    fn save(&self, settings: &ProgressionSettings) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "rrt") {
            pd.config_dir().join("progression.json")
        } else {
            PathBuf::from("rrt_progression.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> ProgressionSettings {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(settings) = serde_json::from_slice::<ProgressionSettings>(&bytes) {
                return settings;
            }
        }
        ProgressionSettings::default()
    }

    fn save(&self, settings: &ProgressionSettings) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(settings).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
