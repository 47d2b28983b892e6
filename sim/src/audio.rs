//! Audio cues emitted by the simulation.
//!
//! Systems never talk to an audio device. They append fire-and-forget cues
//! to the [`CueBuffer`] resource, and the host drains it after each update
//! into whatever implements [`AudioSink`].

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// A sound the host should play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    /// A weapon fired.
    Pew,
    /// A ship or planet was destroyed.
    Boom,
}

/// Cues produced during the current pass, in emission order.
#[derive(Resource, Debug, Default)]
pub struct CueBuffer {
    cues: Vec<AudioCue>,
}

impl CueBuffer {
    pub fn push(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues.iter().filter(|c| **c == cue).count()
    }

    pub fn drain(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.cues)
    }
}

/// Playback side of the audio collaborator.
pub trait AudioSink {
    fn play_pew(&mut self);
    fn play_boom(&mut self);

    fn play(&mut self, cue: AudioCue) {
        match cue {
            AudioCue::Pew => self.play_pew(),
            AudioCue::Boom => self.play_boom(),
        }
    }
}
