//! Sound cues for the game event stream
//!
//! The simulation never plays audio itself. A host drains
//! [`GameEvent`]s each frame and hands them to an [`AudioManager`], which
//! turns them into cues for whatever [`AudioSink`] the platform provides.
//! A missing backend is just a sink that does nothing.

use serde::{Deserialize, Serialize};

use crate::sim::events::GameEvent;
use crate::sim::stage::StageTable;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    /// Single combo hit sound
    ComboHit,
    /// Combo hit as a note of an ascending scale (0-based)
    ComboNote(u8),
    /// Enemy struck but still standing
    EnemyHit,
    EnemyDeath,
    TowerDamage,
    HeartCollect,
    SpeedUpCollect,
    SizeUpCollect,
    ItemSpawn,
    GaugeMax,
    StageStart,
    Launch,
    GameOver,
    GameWon,
}

impl SoundCue {
    /// Cue for an event, other than combo hits which depend on player state
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let cue = match event {
            GameEvent::EnemyHit => SoundCue::EnemyHit,
            GameEvent::EnemyDeath => SoundCue::EnemyDeath,
            GameEvent::TowerDamage => SoundCue::TowerDamage,
            GameEvent::HeartCollect => SoundCue::HeartCollect,
            GameEvent::SpeedUpCollect => SoundCue::SpeedUpCollect,
            GameEvent::SizeUpCollect => SoundCue::SizeUpCollect,
            GameEvent::ItemSpawn { .. } => SoundCue::ItemSpawn,
            GameEvent::GaugeMax => SoundCue::GaugeMax,
            GameEvent::StageStart { .. } => SoundCue::StageStart,
            GameEvent::Launch => SoundCue::Launch,
            GameEvent::GameOver => SoundCue::GameOver,
            GameEvent::GameWon => SoundCue::GameWon,
            GameEvent::ComboHit { .. }
            | GameEvent::StageClear { .. }
            | GameEvent::ScorePopup { .. }
            | GameEvent::ComboPopup { .. }
            | GameEvent::LaunchCancelled
            | GameEvent::BirdReset => return None,
        };
        Some(cue)
    }
}

/// Background music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    Normal,
    Boss,
}

/// Platform audio backend
pub trait AudioSink {
    /// Play a one-shot effect at `volume` (0.0 - 1.0)
    fn play(&mut self, cue: SoundCue, volume: f32);
    /// Cross-fade to a looping track
    fn play_music(&mut self, track: MusicTrack, volume: f32);
    fn stop_music(&mut self);
}

/// Sink that only logs what would have played
#[derive(Debug, Default)]
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn play(&mut self, cue: SoundCue, volume: f32) {
        log::trace!("sfx {cue:?} at {volume:.2}");
    }

    fn play_music(&mut self, track: MusicTrack, volume: f32) {
        log::debug!("music {track:?} at {volume:.2}");
    }

    fn stop_music(&mut self) {
        log::debug!("music stopped");
    }
}

/// Player-facing audio options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub music_volume: f32,
    /// Play combo hits as climbing notes instead of a single sound
    pub combo_scale: bool,
    /// Notes in the combo scale before it wraps around
    pub scale_notes: u8,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            master_volume: 0.8,
            sfx_volume: 0.4,
            music_volume: 0.2,
            combo_scale: false,
            scale_notes: 8,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager<S: AudioSink> {
    sink: S,
    settings: AudioSettings,
    scale_index: u8,
    current_music: Option<MusicTrack>,
}

impl<S: AudioSink> AudioManager<S> {
    pub fn new(sink: S, settings: AudioSettings) -> Self {
        Self {
            sink,
            settings,
            scale_index: 0,
            current_music: None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn settings(&self) -> &AudioSettings {
        &self.settings
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.settings.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Turn all sound on or off; turning it off stops the music
    pub fn toggle_enabled(&mut self) {
        self.settings.enabled = !self.settings.enabled;
        log::info!("Sound enabled: {}", self.settings.enabled);
        if !self.settings.enabled {
            self.stop_music();
        }
    }

    fn sfx_volume(&self) -> f32 {
        self.settings.master_volume * self.settings.sfx_volume
    }

    fn play(&mut self, cue: SoundCue) {
        if self.settings.enabled {
            let volume = self.sfx_volume();
            self.sink.play(cue, volume);
        }
    }

    fn play_combo(&mut self) {
        if !self.settings.combo_scale {
            self.play(SoundCue::ComboHit);
            return;
        }
        let note = self.scale_index;
        self.play(SoundCue::ComboNote(note));
        self.scale_index = (self.scale_index + 1) % self.settings.scale_notes.max(1);
    }

    /// Restart the combo scale from its first note
    pub fn reset_scale(&mut self) {
        self.scale_index = 0;
    }

    /// Switch tracks unless `track` is already playing
    pub fn play_music(&mut self, track: MusicTrack) {
        if !self.settings.enabled || self.current_music == Some(track) {
            return;
        }
        log::info!("Switching music from {:?} to {track:?}", self.current_music);
        let volume = self.settings.master_volume * self.settings.music_volume;
        self.sink.play_music(track, volume);
        self.current_music = Some(track);
    }

    pub fn stop_music(&mut self) {
        if self.current_music.take().is_some() {
            self.sink.stop_music();
        }
    }

    /// React to one frame's worth of events
    ///
    /// `stages` decides which track a new stage gets.
    pub fn process(&mut self, events: &[GameEvent], stages: &StageTable) {
        for event in events {
            match event {
                GameEvent::ComboHit { .. } => self.play_combo(),
                GameEvent::BirdReset | GameEvent::LaunchCancelled => self.reset_scale(),
                GameEvent::StageStart { stage } => {
                    let boss = stages.get(*stage).is_some_and(|s| s.is_boss_stage);
                    self.play_music(if boss { MusicTrack::Boss } else { MusicTrack::Normal });
                }
                GameEvent::GameOver | GameEvent::GameWon => self.stop_music(),
                _ => {}
            }
            if let Some(cue) = SoundCue::for_event(event) {
                self.play(cue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Default)]
    struct RecordingSink {
        cues: Vec<SoundCue>,
        music: Vec<Option<MusicTrack>>,
    }

    impl AudioSink for RecordingSink {
        fn play(&mut self, cue: SoundCue, _volume: f32) {
            self.cues.push(cue);
        }

        fn play_music(&mut self, track: MusicTrack, _volume: f32) {
            self.music.push(Some(track));
        }

        fn stop_music(&mut self) {
            self.music.push(None);
        }
    }

    fn manager(combo_scale: bool) -> AudioManager<RecordingSink> {
        AudioManager::new(
            RecordingSink::default(),
            AudioSettings {
                combo_scale,
                scale_notes: 3,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_event_mapping() {
        assert_eq!(SoundCue::for_event(&GameEvent::EnemyDeath), Some(SoundCue::EnemyDeath));
        assert_eq!(
            SoundCue::for_event(&GameEvent::ItemSpawn {
                kind: crate::sim::item::ItemKind::Heart
            }),
            Some(SoundCue::ItemSpawn)
        );
        assert_eq!(
            SoundCue::for_event(&GameEvent::ScorePopup {
                pos: Vec2::ZERO,
                points: 100
            }),
            None
        );
    }

    #[test]
    fn test_combo_scale_cycles_and_resets() {
        let mut audio = manager(true);
        let stages = StageTable::default();
        let hit = GameEvent::ComboHit { combo: 1 };
        audio.process(&[hit.clone(), hit.clone(), hit.clone(), hit.clone()], &stages);
        audio.process(&[GameEvent::BirdReset, hit.clone()], &stages);
        audio.process(&[hit.clone(), GameEvent::LaunchCancelled, hit], &stages);
        assert_eq!(
            audio.sink().cues,
            vec![
                SoundCue::ComboNote(0),
                SoundCue::ComboNote(1),
                SoundCue::ComboNote(2),
                SoundCue::ComboNote(0),
                SoundCue::ComboNote(0),
                SoundCue::ComboNote(1),
                SoundCue::ComboNote(0),
            ]
        );
    }

    #[test]
    fn test_single_combo_sound() {
        let mut audio = manager(false);
        audio.process(&[GameEvent::ComboHit { combo: 4 }], &StageTable::default());
        assert_eq!(audio.sink().cues, vec![SoundCue::ComboHit]);
    }

    #[test]
    fn test_music_follows_stage_type() {
        let mut audio = manager(false);
        let stages = StageTable::default();
        audio.process(&[GameEvent::StageStart { stage: 1 }], &stages);
        audio.process(&[GameEvent::StageStart { stage: 2 }], &stages);
        audio.process(&[GameEvent::StageStart { stage: 3 }], &stages);
        audio.process(&[GameEvent::GameOver], &stages);
        assert_eq!(
            audio.sink().music,
            vec![Some(MusicTrack::Normal), Some(MusicTrack::Boss), None]
        );
    }

    #[test]
    fn test_disabled_is_silent() {
        let mut audio = manager(false);
        audio.toggle_enabled();
        audio.process(
            &[GameEvent::EnemyDeath, GameEvent::StageStart { stage: 1 }],
            &StageTable::default(),
        );
        assert!(audio.sink().cues.is_empty());
        assert!(audio.sink().music.is_empty());
    }
}
