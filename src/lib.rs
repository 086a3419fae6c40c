//! Hand gesture classification from 21-point hand landmarks, and a
//! hold-to-capture trigger with countdown and cooldown driven by the
//! classified gesture stream.

pub mod config;
pub mod error;
pub mod gesture;
pub mod pipeline;
pub mod trigger;
pub mod types;

pub use config::Config;
pub use error::GestureError;
pub use gesture::{classify_hands, classify_pose, extract_finger_states};
pub use pipeline::{CaptureSession, FrameReport, SessionHandle, start_session};
pub use trigger::{Activation, CaptureTrigger, TriggerEvent, TriggerState, TriggerTimings};
pub use types::{FingerStates, Gesture, GestureDetail, HandFrame, Landmark, LandmarkSet};
