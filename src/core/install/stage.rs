/// Steps of one install, in order. `Failed` is reachable from any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    Selecting,
    Classifying,
    Extracting,
    Reading,
    Parsing,
    ConflictCheck,
    Placing,
    Registered,
    Failed,
}

impl std::fmt::Display for InstallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InstallStage::Selecting => "selecting",
            InstallStage::Classifying => "classifying",
            InstallStage::Extracting => "extracting",
            InstallStage::Reading => "reading",
            InstallStage::Parsing => "parsing",
            InstallStage::ConflictCheck => "conflict-check",
            InstallStage::Placing => "placing",
            InstallStage::Registered => "registered",
            InstallStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Follows one install through its stages and logs each transition.
#[derive(Debug)]
pub struct StageTracker {
    label: String,
    stage: InstallStage,
    history: Vec<InstallStage>,
}

impl StageTracker {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            stage: InstallStage::Selecting,
            history: vec![InstallStage::Selecting],
        }
    }

    pub fn enter(&mut self, next: InstallStage) {
        tracing::debug!("{}: {} -> {}", self.label, self.stage, next);
        self.stage = next;
        self.history.push(next);
    }

    pub fn stage(&self) -> InstallStage {
        self.stage
    }

    /// Every stage entered so far, starting with `Selecting`.
    pub fn history(&self) -> &[InstallStage] {
        &self.history
    }
}
