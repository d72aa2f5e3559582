use serde::{Deserialize, Serialize};

/// Global state of the automation queue.
///
/// `IDLE --run--> RUNNING --pause--> PAUSED --run--> RUNNING`, and `stop`
/// returns either active state to `IDLE`. `RUNNING` also drops to `IDLE` by
/// itself once no eligible job remains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

impl AutomationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AutomationStatus::Idle => "IDLE",
            AutomationStatus::Running => "RUNNING",
            AutomationStatus::Paused => "PAUSED",
        }
    }

    /// Running or paused.
    pub fn is_active(self) -> bool {
        self != AutomationStatus::Idle
    }
}

impl std::fmt::Display for AutomationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
