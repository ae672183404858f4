use crate::arrangement::RotateDirection;
use serde::{Deserialize, Serialize};

/// A single edit, as sent by a front end.
/// Page numbers are 0-based logical indices; slots are 0-based positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionCommand {
    Rotate {
        page: usize,
        direction: RotateDirection,
    },
    Duplicate {
        page: usize,
    },
    Delete {
        slot: usize,
    },
    Move {
        from: usize,
        to: usize,
    },
    ToggleSplit {
        position: usize,
    },
    ClearSplits,
    /// Boundaries after the given 1-based slot numbers, e.g. "2, 5"
    SplitAfter {
        pages: String,
    },
    SetInterval {
        size: usize,
    },
    ManualSplits,
    ToggleSkip {
        section: usize,
    },
    OpenPreview {
        slot: usize,
    },
    ClosePreview,
}

impl SessionCommand {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
