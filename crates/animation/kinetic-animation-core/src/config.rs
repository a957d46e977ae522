//! Core configuration for kinetic-animation-core.

use serde::{Deserialize, Serialize};

use crate::easing::Ease;
use crate::media::MediaEnvironment;

/// Fully resolved tween defaults.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    /// Milliseconds.
    pub duration: f64,
    /// Milliseconds.
    pub delay: f64,
    pub ease: Ease,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            delay: 0.0,
            ease: Ease::default(),
        }
    }
}

/// Partial defaults, merged over an inherited [`Defaults`].
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DefaultsParams {
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub delay: Option<f64>,
    #[serde(default)]
    pub ease: Option<Ease>,
}

impl DefaultsParams {
    pub fn duration(mut self, ms: f64) -> Self {
        self.duration = Some(ms);
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.delay = Some(ms);
        self
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }

    /// Values set here win over `inherited`.
    pub fn merge_over(&self, inherited: &Defaults) -> Defaults {
        Defaults {
            duration: self.duration.unwrap_or(inherited.duration),
            delay: self.delay.unwrap_or(inherited.delay),
            ease: self.ease.unwrap_or(inherited.ease),
        }
    }
}

/// Configuration for engine defaults and buffer sizing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Global defaults every scope and timeline inherits from.
    #[serde(default)]
    pub defaults: Defaults,

    /// Maximum events to retain per tick; extra events are dropped.
    pub max_events_per_tick: usize,

    /// Initial media environment used to evaluate scope media queries.
    #[serde(default)]
    pub media: MediaEnvironment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            max_events_per_tick: 1024,
            media: MediaEnvironment::default(),
        }
    }
}
