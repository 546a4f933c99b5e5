use crate::MIN_TIME;

/*
Gate-Driven ADSR Envelope
=========================

A linear attack/decay/sustain/release generator driven by a gate signal.
The envelope unit feeds it one gate value per sample; a rising edge starts
the attack, a falling edge starts the release.

Vocabulary
----------

  level       Current output (0.0 to 1.0), multiplied into the voice signal.

  stage       Idle, Attack, Decay, Sustain or Release.

  gate        A control signal read per sample. > 0.5 means "held".


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
         A    D      S          R

Each stage is a straight line:

    increment = target_change / (time_seconds * sample_rate)


Retriggering Without Clicks
---------------------------

A new gate during release starts the attack from the CURRENT level instead
of snapping to zero. The level therefore never jumps, whatever the gate does,
which matters because the envelope directly scales the audio.

Release snapshots its start level and length when the gate falls, then
interpolates down so it lands on exactly 0.0.

Times are re-read each sample, so changing attack/release from a control
port takes effect immediately without disturbing the current level.
*/

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32,
    release_time: f32,

    stage: EnvelopeState,
    level: f32,

    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        let mut env = Self {
            attack_time: 0.0,
            decay_time: 0.0,
            sustain_level: 0.0,
            release_time: 0.0,
            stage: EnvelopeState::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        };
        env.set_times(attack, decay, sustain, release);
        env
    }

    /// Update the shape. Non-finite values fall back to the shortest time.
    pub fn set_times(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        let time = |t: f32| if t.is_finite() { t.max(MIN_TIME) } else { MIN_TIME };
        self.attack_time = time(attack);
        self.decay_time = time(decay);
        self.sustain_level = if sustain.is_finite() {
            sustain.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.release_time = time(release);
    }

    /// Gate rising edge: attack from the current level.
    pub fn gate_on(&mut self) {
        self.stage = EnvelopeState::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Gate falling edge: release from the current level.
    pub fn gate_off(&mut self, sample_rate: f32) {
        if self.stage == EnvelopeState::Idle {
            return;
        }
        self.release_start_level = self.level;
        self.release_total_samples = (self.release_time * sample_rate).round().max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeState::Release;
    }

    /// Advance the envelope by one sample and return the new level.
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        match self.stage {
            EnvelopeState::Idle => {
                self.level = 0.0;
            }

            EnvelopeState::Attack => {
                self.level += 1.0 / (self.attack_time * sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeState::Decay;
                }
            }

            EnvelopeState::Decay => {
                let target = self.sustain_level;
                self.level -= (1.0 - target) / (self.decay_time * sample_rate);
                if self.level <= target {
                    self.level = target;
                    self.stage = EnvelopeState::Sustain;
                }
            }

            EnvelopeState::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeState::Release => {
                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeState::Idle;
                }
            }
        }

        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeState::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn state(&self) -> EnvelopeState {
        self.stage
    }
}
