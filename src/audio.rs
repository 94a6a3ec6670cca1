//! Sound cue boundary
//!
//! Cues are fire-and-forget: the engine never waits on playback and never
//! learns whether a cue was actually heard.

use serde::{Deserialize, Serialize};

/// Sound effects the games can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Pellet eaten
    Collect,
    /// Cell split or merge
    Split,
    /// Bubbles popped (match) or cell eaten
    Pop,
    /// Bubble launched
    Shoot,
}

/// Something that can play cues
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

impl<A: AudioSink + ?Sized> AudioSink for &mut A {
    fn play(&mut self, cue: SoundCue) {
        (**self).play(cue);
    }
}

/// Sink that drops every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Sink that remembers what was played, in order
#[derive(Debug, Default, Clone)]
pub struct CueLog {
    pub played: Vec<SoundCue>,
}

impl CueLog {
    pub fn count(&self, cue: SoundCue) -> usize {
        self.played.iter().filter(|&&c| c == cue).count()
    }
}

impl AudioSink for CueLog {
    fn play(&mut self, cue: SoundCue) {
        self.played.push(cue);
    }
}
