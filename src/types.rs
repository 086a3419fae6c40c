use std::{fmt, ops::Index, str::FromStr, time::Instant};

use serde::{Deserialize, Serialize};

use crate::error::GestureError;

pub const LANDMARK_COUNT: usize = 21;

/// Shown in place of an emoji when no gesture matched.
pub const UNRECOGNIZED_GLYPH: &str = "⋯";

/// Landmark indices of the 21-point hand model, proximal to distal per digit.
pub mod joint {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Normalized keypoint: x/y relative to frame width/height, z relative depth.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// One detected hand. Always holds exactly [`LANDMARK_COUNT`] points, so
/// indexing by a [`joint`] constant never fails.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet([Landmark; LANDMARK_COUNT]);

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Result<Self, GestureError> {
        let actual = points.len();
        <[Landmark; LANDMARK_COUNT]>::try_from(points)
            .map(Self)
            .map_err(|_| GestureError::MalformedLandmarks {
                expected: LANDMARK_COUNT,
                actual,
            })
    }

    pub fn from_raw(points: &[[f32; 3]]) -> Result<Self, GestureError> {
        Self::new(points.iter().copied().map(Landmark::from).collect())
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.0
    }

    pub fn wrist(&self) -> Landmark {
        self.0[joint::WRIST]
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, index: usize, x: f32, y: f32) {
        self.0[index].x = x;
        self.0[index].y = y;
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Landmark {
        &self.0[index]
    }
}

impl TryFrom<Vec<[f32; 3]>> for LandmarkSet {
    type Error = GestureError;

    fn try_from(points: Vec<[f32; 3]>) -> Result<Self, Self::Error> {
        Self::from_raw(&points)
    }
}

/// All hands the detector reported for one camera frame, in detector order.
#[derive(Clone, Debug)]
pub struct HandFrame {
    pub hands: Vec<LandmarkSet>,
    pub timestamp: Instant,
}

impl HandFrame {
    pub fn new(hands: Vec<LandmarkSet>) -> Self {
        Self {
            hands,
            timestamp: Instant::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Multi-line dump of every landmark, for trace logging.
pub fn describe_hands(hands: &[LandmarkSet]) -> String {
    if hands.is_empty() {
        return "no hand landmarks".to_string();
    }

    let mut out = format!("hands detected: {}\n", hands.len());
    for (hand_index, hand) in hands.iter().enumerate() {
        out.push_str(&format!("  hand[{hand_index}]: {LANDMARK_COUNT} landmarks\n"));
        for (index, p) in hand.points().iter().enumerate() {
            out.push_str(&format!(
                "    [{index:2}] ({:.4}, {:.4}, {:.4})\n",
                p.x, p.y, p.z
            ));
        }
    }
    out
}

/// Open (`true`) or closed per digit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerStates {
    pub thumb: bool,
    pub index: bool,
    pub middle: bool,
    pub ring: bool,
    pub pinky: bool,
}

impl FingerStates {
    /// Thumb first, then index through pinky.
    pub fn as_array(&self) -> [bool; 5] {
        [self.thumb, self.index, self.middle, self.ring, self.pinky]
    }

    pub fn from_array([thumb, index, middle, ring, pinky]: [bool; 5]) -> Self {
        Self {
            thumb,
            index,
            middle,
            ring,
            pinky,
        }
    }

    pub fn open_count(&self) -> usize {
        self.as_array().iter().filter(|open| **open).count()
    }
}

impl fmt::Display for FingerStates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, open) in ['T', 'I', 'M', 'R', 'P'].iter().zip(self.as_array()) {
            if open {
                write!(f, "{letter}")?;
            } else {
                write!(f, "-")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Gesture {
    Victory,
    Horns,
    Love,
    IndexPoint,
    Ok,
    Middle,
    CallMe,
    ThumbsUp,
    Fist,
    Undefined,
}

impl Gesture {
    /// Every gesture that has an emoji, i.e. everything but `Undefined`.
    pub const RECOGNIZED: [Gesture; 9] = [
        Gesture::Victory,
        Gesture::Horns,
        Gesture::Love,
        Gesture::IndexPoint,
        Gesture::Ok,
        Gesture::Middle,
        Gesture::CallMe,
        Gesture::ThumbsUp,
        Gesture::Fist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::Victory => "victory",
            Gesture::Horns => "horns",
            Gesture::Love => "love",
            Gesture::IndexPoint => "index_point",
            Gesture::Ok => "ok",
            Gesture::Middle => "middle",
            Gesture::CallMe => "call_me",
            Gesture::ThumbsUp => "thumbs_up",
            Gesture::Fist => "fist",
            Gesture::Undefined => "undefined",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Gesture::Victory => "Victory",
            Gesture::Horns => "Horns",
            Gesture::Love => "Love you",
            Gesture::IndexPoint => "Index pointing up",
            Gesture::Ok => "OK",
            Gesture::Middle => "Middle finger",
            Gesture::CallMe => "Call me",
            Gesture::ThumbsUp => "Thumbs up",
            Gesture::Fist => "Fist",
            Gesture::Undefined => "Unrecognized",
        }
    }

    pub fn emoji(&self) -> Option<char> {
        match self {
            Gesture::Victory => Some('\u{270C}'),
            Gesture::Horns => Some('\u{1F918}'),
            Gesture::Love => Some('\u{1F91F}'),
            Gesture::IndexPoint => Some('\u{261D}'),
            Gesture::Ok => Some('\u{1F44C}'),
            Gesture::Middle => Some('\u{1F595}'),
            Gesture::CallMe => Some('\u{1F919}'),
            Gesture::ThumbsUp => Some('\u{1F44D}'),
            Gesture::Fist => Some('\u{270A}'),
            Gesture::Undefined => None,
        }
    }

    pub fn code_point(&self) -> Option<u32> {
        self.emoji().map(u32::from)
    }

    pub fn from_code_point(code_point: u32) -> Option<Gesture> {
        Gesture::RECOGNIZED
            .into_iter()
            .find(|g| g.code_point() == Some(code_point))
    }

    /// The emoji, or [`UNRECOGNIZED_GLYPH`] for `Undefined`.
    pub fn glyph(&self) -> String {
        match self.emoji() {
            Some(c) => c.to_string(),
            None => UNRECOGNIZED_GLYPH.to_string(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        *self != Gesture::Undefined
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Gesture {
    type Err = GestureError;

    /// Accepts ids (`victory`, `thumbs_up`, ...), a few legacy aliases, and
    /// hex code points as stored by the emoji preference (`0x270C`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(Gesture::from_code_point)
                .ok_or_else(|| GestureError::UnknownGesture(s.to_string()));
        }

        let id = trimmed.to_ascii_lowercase().replace(['-', ' '], "_");
        let gesture = match id.as_str() {
            "victory" => Gesture::Victory,
            "horns" => Gesture::Horns,
            "love" => Gesture::Love,
            "index_point" | "index" => Gesture::IndexPoint,
            "ok" => Gesture::Ok,
            "middle" => Gesture::Middle,
            "call_me" | "call" => Gesture::CallMe,
            "thumbs_up" | "thumbs" => Gesture::ThumbsUp,
            "fist" => Gesture::Fist,
            "undefined" => Gesture::Undefined,
            _ => return Err(GestureError::UnknownGesture(s.to_string())),
        };
        Ok(gesture)
    }
}

impl TryFrom<String> for Gesture {
    type Error = GestureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Gesture> for String {
    fn from(gesture: Gesture) -> Self {
        gesture.as_str().to_string()
    }
}

/// Classification outcome for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureDetail {
    pub gesture: Gesture,
    /// `None` when the frame had no hands.
    pub finger_states: Option<FingerStates>,
    pub hand_count: usize,
}

impl GestureDetail {
    pub fn label(&self) -> String {
        format!("{} {}", self.gesture.glyph(), self.gesture.display_name())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{LANDMARK_COUNT, Landmark, LandmarkSet, joint};

    const THUMB_MCP_X: f32 = 0.5;
    const FINGER_X: [f32; 4] = [0.55, 0.6, 0.65, 0.7];
    const FINGER_BASES: [usize; 4] = [
        joint::INDEX_MCP,
        joint::MIDDLE_MCP,
        joint::RING_MCP,
        joint::PINKY_MCP,
    ];

    /// A hand in upright orientation (thumb MCP left of the middle MCP)
    /// whose digits are open as requested. Thumb and index tips start
    /// well apart.
    pub(crate) fn hand(thumb: bool, fingers: [bool; 4]) -> LandmarkSet {
        let mut points = [Landmark::new(0.5, 0.7, 0.0); LANDMARK_COUNT];
        points[joint::WRIST] = Landmark::new(0.58, 0.9, 0.0);

        points[joint::THUMB_CMC] = Landmark::new(0.52, 0.75, 0.0);
        points[joint::THUMB_MCP] = Landmark::new(THUMB_MCP_X, 0.7, 0.0);
        if thumb {
            points[joint::THUMB_IP] = Landmark::new(0.45, 0.6, 0.0);
            points[joint::THUMB_TIP] = Landmark::new(0.4, 0.56, 0.0);
        } else {
            points[joint::THUMB_IP] = Landmark::new(0.52, 0.7, 0.0);
            points[joint::THUMB_TIP] = Landmark::new(0.53, 0.75, 0.0);
        }

        for ((base, x), open) in FINGER_BASES.into_iter().zip(FINGER_X).zip(fingers) {
            points[base] = Landmark::new(x, 0.65, 0.0);
            points[base + 1] = Landmark::new(x, 0.6, 0.0);
            if open {
                points[base + 2] = Landmark::new(x, 0.5, 0.0);
                points[base + 3] = Landmark::new(x, 0.4, 0.0);
            } else {
                points[base + 2] = Landmark::new(x, 0.55, 0.0);
                points[base + 3] = Landmark::new(x, 0.62, 0.0);
            }
        }

        LandmarkSet(points)
    }

    /// Moves the thumb tip just beside the index tip without changing the
    /// thumb's open/closed reading.
    pub(crate) fn touch_thumb_to_index(hand: &mut LandmarkSet) {
        let tip = hand[joint::INDEX_TIP];
        hand.set(joint::THUMB_TIP, tip.x - 0.07, tip.y - 0.02);
    }

    pub(crate) fn raw(hand: &LandmarkSet) -> Vec<[f32; 3]> {
        hand.points().iter().map(|p| [p.x, p.y, p.z]).collect()
    }
}
