//! Hold-a-gesture-to-shoot trigger.
//!
//! The machine is driven by two inputs only: the gesture classified for each
//! frame and an external tick (one per elapsed second while a countdown or
//! cooldown is running). It owns no timers, so tests step it directly.

use crate::{error::GestureError, types::Gesture};

pub const DEFAULT_COUNTDOWN_TICKS: u32 = 3;
pub const DEFAULT_COOLDOWN_TICKS: u32 = 2;

/// Gestures that arm the trigger. Never empty and never contains
/// `Undefined`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Activation(Vec<Gesture>);

impl Activation {
    pub fn single(gesture: Gesture) -> Result<Self, GestureError> {
        Self::new([gesture])
    }

    pub fn new(gestures: impl IntoIterator<Item = Gesture>) -> Result<Self, GestureError> {
        let mut set: Vec<Gesture> = gestures.into_iter().collect();
        if set.is_empty() || set.iter().any(|g| !g.is_recognized()) {
            return Err(GestureError::InvalidActivation);
        }
        set.sort();
        set.dedup();
        Ok(Self(set))
    }

    pub fn contains(&self, gesture: Gesture) -> bool {
        self.0.contains(&gesture)
    }

    pub fn gestures(&self) -> &[Gesture] {
        &self.0
    }
}

impl Default for Activation {
    fn default() -> Self {
        Self(vec![Gesture::Victory])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerTimings {
    /// Ticks between arming and the capture. At least one.
    pub countdown_ticks: u32,
    /// Ticks after a capture before the trigger re-arms.
    pub cooldown_ticks: u32,
}

impl TriggerTimings {
    pub fn new(countdown_ticks: u32, cooldown_ticks: u32) -> Result<Self, GestureError> {
        if countdown_ticks == 0 {
            return Err(GestureError::InvalidTimings(
                "countdown must last at least one tick",
            ));
        }
        Ok(Self {
            countdown_ticks,
            cooldown_ticks,
        })
    }
}

impl Default for TriggerTimings {
    fn default() -> Self {
        Self {
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            cooldown_ticks: DEFAULT_COOLDOWN_TICKS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    Idle,
    Arming { remaining: u32, gesture: Gesture },
    Cooldown { remaining: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureSource {
    Gesture(Gesture),
    Manual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Activation gesture seen while idle; countdown started.
    Armed { gesture: Gesture, remaining: u32 },
    /// Countdown advanced; `remaining` is the value to display.
    Countdown { remaining: u32 },
    /// Take the photo.
    Capture { source: CaptureSource },
    /// Cooldown over, activation gestures are honoured again.
    Rearmed,
}

#[derive(Debug)]
pub struct CaptureTrigger {
    state: TriggerState,
    activation: Activation,
    timings: TriggerTimings,
    captures: u64,
}

impl CaptureTrigger {
    pub fn new(activation: Activation, timings: TriggerTimings) -> Self {
        Self {
            state: TriggerState::Idle,
            activation,
            timings,
            captures: 0,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    /// Takes effect the next time the trigger is idle; a running countdown
    /// or cooldown is not interrupted.
    pub fn set_activation(&mut self, activation: Activation) {
        log::info!("activation gestures set to {:?}", activation.gestures());
        self.activation = activation;
    }

    /// True while a countdown or cooldown is running.
    pub fn is_busy(&self) -> bool {
        !matches!(self.state, TriggerState::Idle)
    }

    pub fn countdown_display(&self) -> Option<u32> {
        match self.state {
            TriggerState::Arming { remaining, .. } => Some(remaining),
            _ => None,
        }
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    /// Feeds the gesture classified for the current frame. Only an idle
    /// trigger looks at it.
    pub fn on_gesture(&mut self, gesture: Gesture) -> Option<TriggerEvent> {
        if self.state != TriggerState::Idle || !self.activation.contains(gesture) {
            return None;
        }

        let remaining = self.timings.countdown_ticks;
        self.state = TriggerState::Arming { remaining, gesture };
        log::info!("{gesture:?} detected, capturing in {remaining}");
        Some(TriggerEvent::Armed { gesture, remaining })
    }

    pub fn on_tick(&mut self) -> Option<TriggerEvent> {
        match self.state {
            TriggerState::Idle => None,
            TriggerState::Arming { remaining, gesture } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.state = TriggerState::Arming { remaining, gesture };
                    return Some(TriggerEvent::Countdown { remaining });
                }

                self.captures += 1;
                self.state = match self.timings.cooldown_ticks {
                    0 => TriggerState::Idle,
                    remaining => TriggerState::Cooldown { remaining },
                };
                log::info!("countdown finished, capture #{}", self.captures);
                Some(TriggerEvent::Capture {
                    source: CaptureSource::Gesture(gesture),
                })
            }
            TriggerState::Cooldown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining > 0 {
                    self.state = TriggerState::Cooldown { remaining };
                    return None;
                }

                self.state = TriggerState::Idle;
                log::info!("cooldown over, trigger re-armed");
                Some(TriggerEvent::Rearmed)
            }
        }
    }

    /// Shutter button: captures immediately and leaves the gesture trigger
    /// where it was.
    pub fn request_capture(&mut self) -> TriggerEvent {
        self.captures += 1;
        log::info!("manual capture #{}", self.captures);
        TriggerEvent::Capture {
            source: CaptureSource::Manual,
        }
    }
}
