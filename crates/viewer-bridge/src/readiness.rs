//! Viewer readiness stages
//!
//! The remote viewer reports its progress as a small integer. Stages only
//! move forward for a given viewer instance; a refresh starts a new instance
//! at [`ReadinessStage::Uninitialized`].

use serde::{Deserialize, Serialize};

/// Lifecycle milestones of the remote viewer, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReadinessStage {
    #[default]
    Uninitialized,
    /// Viewer page script is running
    ScriptLoaded,
    /// postMessage control handler is installed
    ChannelReady,
    /// PDFViewerApplication finished initializing
    ApplicationReady,
    /// Toolbar, sidebar and page view objects exist
    ViewerReady,
    /// A document finished loading
    DocumentLoaded,
}

impl ReadinessStage {
    /// Decode the integer reported by the viewer. Never fails: values below
    /// zero clamp to `Uninitialized`, values past the last stage clamp to
    /// `DocumentLoaded`.
    pub fn from_wire(value: i64) -> Self {
        match value {
            i64::MIN..=0 => Self::Uninitialized,
            1 => Self::ScriptLoaded,
            2 => Self::ChannelReady,
            3 => Self::ApplicationReady,
            4 => Self::ViewerReady,
            _ => Self::DocumentLoaded,
        }
    }

    pub fn as_wire(self) -> i64 {
        match self {
            Self::Uninitialized => 0,
            Self::ScriptLoaded => 1,
            Self::ChannelReady => 2,
            Self::ApplicationReady => 3,
            Self::ViewerReady => 4,
            Self::DocumentLoaded => 5,
        }
    }

    /// Whether control messages can be posted at this stage
    pub fn has_channel(self) -> bool {
        self >= Self::ChannelReady
    }
}

/// Tracks the highest stage reported for the current viewer instance
#[derive(Debug, Default, Clone)]
pub struct ReadinessTracker {
    stage: ReadinessStage,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> ReadinessStage {
        self.stage
    }

    /// Record a reported stage.
    ///
    /// Returns the new stage when it is forward progress, `None` when the
    /// report is equal to or behind the current stage (no regression).
    pub fn advance(&mut self, stage: ReadinessStage) -> Option<ReadinessStage> {
        if stage > self.stage {
            self.stage = stage;
            Some(stage)
        } else {
            None
        }
    }

    pub fn is_at_least(&self, stage: ReadinessStage) -> bool {
        self.stage >= stage
    }

    /// Start over for a new viewer instance
    pub fn reset(&mut self) {
        self.stage = ReadinessStage::Uninitialized;
    }
}
