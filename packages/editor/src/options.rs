use serde::{Deserialize, Serialize};

/// Editor settings, usually read from the `editor` section of a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    /// Appended to the file name to form the backup path
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Undo levels kept per spritesheet (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn default_history_limit() -> usize {
    0
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            backup_suffix: default_backup_suffix(),
            history_limit: default_history_limit(),
        }
    }
}
