//! Script generation input and output.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery style of a generated script.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptTone {
    #[default]
    Professional,
    Casual,
    Energetic,
    Educational,
}

impl fmt::Display for ScriptTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScriptTone::Professional => "Professional",
            ScriptTone::Casual => "Casual",
            ScriptTone::Energetic => "Energetic",
            ScriptTone::Educational => "Educational",
        };
        write!(f, "{}", label)
    }
}

/// Structured request for a marketing video script.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScriptInput {
    /// What the video is about.
    pub topic: String,

    /// Who the video speaks to.
    #[serde(default)]
    pub target_audience: String,

    #[serde(default)]
    pub tone: ScriptTone,

    /// Intended runtime of the finished video.
    pub duration_seconds: u32,

    /// Points to cover, one section each.
    #[serde(default)]
    pub key_points: Vec<String>,

    /// Closing call to action. A generic one is used when absent.
    #[serde(default)]
    pub call_to_action: Option<String>,
}

/// One timed block of a script.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ScriptSection {
    pub heading: String,
    pub content: String,
    pub duration_seconds: u32,
}

/// A script ready for editing.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GeneratedScript {
    pub title: String,
    pub hook: String,
    pub sections: Vec<ScriptSection>,
    pub call_to_action: String,
    pub total_duration_seconds: u32,
}
