//! Input contracts for the core engine.
//!
//! Per-timeline playback commands. Hosts build and pass these into
//! `Engine::update()` each frame; they are applied before time advances.

use serde::{Deserialize, Serialize};

use crate::ids::TimelineId;

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Inputs {
    /// Timeline-level commands applied before stepping.
    #[serde(default)]
    pub commands: Vec<TimelineCommand>,
}

impl Inputs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(commands: impl IntoIterator<Item = TimelineCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum TimelineCommand {
    Play { timeline: TimelineId },
    Pause { timeline: TimelineId },
    /// Pause and rewind to 0.
    Stop { timeline: TimelineId },
    /// Rewind to 0 and play.
    Restart { timeline: TimelineId },
    /// Jump the playback clock (ms, before loop mapping).
    Seek { timeline: TimelineId, time: f64 },
    SetSpeed { timeline: TimelineId, speed: f32 },
    SetLoopMode { timeline: TimelineId, mode: LoopMode },
    /// Jump to the end and stop.
    Complete { timeline: TimelineId },
}

impl TimelineCommand {
    pub fn timeline(&self) -> TimelineId {
        match self {
            TimelineCommand::Play { timeline }
            | TimelineCommand::Pause { timeline }
            | TimelineCommand::Stop { timeline }
            | TimelineCommand::Restart { timeline }
            | TimelineCommand::Seek { timeline, .. }
            | TimelineCommand::SetSpeed { timeline, .. }
            | TimelineCommand::SetLoopMode { timeline, .. }
            | TimelineCommand::Complete { timeline } => *timeline,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoopMode {
    #[default]
    Once,
    Loop,
    PingPong,
}
