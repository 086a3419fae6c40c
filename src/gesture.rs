use crate::types::{FingerStates, Gesture, GestureDetail, LandmarkSet, joint};

/// Maximum planar distance, in normalized image units, between the thumb tip
/// and the index tip for the two to count as touching.
pub const THUMB_INDEX_PROXIMITY: f32 = 0.1;

const FINGER_JOINTS: [[usize; 3]; 4] = [
    [joint::INDEX_PIP, joint::INDEX_DIP, joint::INDEX_TIP],
    [joint::MIDDLE_PIP, joint::MIDDLE_DIP, joint::MIDDLE_TIP],
    [joint::RING_PIP, joint::RING_DIP, joint::RING_TIP],
    [joint::PINKY_PIP, joint::PINKY_DIP, joint::PINKY_TIP],
];

/// Open/closed reading for every digit of one hand.
pub fn extract_finger_states(points: &LandmarkSet) -> FingerStates {
    let [index, middle, ring, pinky] = FINGER_JOINTS.map(|idx| classify_finger(points, idx));

    FingerStates {
        thumb: classify_thumb(points),
        index,
        middle,
        ring,
        pinky,
    }
}

/// Horizontal test relative to the thumb MCP. Which side counts as "out" is
/// picked from where the MCP sits against the middle-finger MCP, so a palm
/// facing away from the camera reads mirrored.
fn classify_thumb(points: &LandmarkSet) -> bool {
    let reference = points[joint::THUMB_MCP].x;
    let side = points[joint::MIDDLE_MCP].x;
    let ip = points[joint::THUMB_IP].x;
    let tip = points[joint::THUMB_TIP].x;

    if reference < side {
        ip < reference && tip < reference
    } else if reference > side {
        ip > reference && tip > reference
    } else {
        false
    }
}

/// Image-space y grows downward: an open finger rises joint by joint.
fn classify_finger(points: &LandmarkSet, idx: [usize; 3]) -> bool {
    let base = points[idx[0]].y;
    let middle = points[idx[1]].y;
    let tip = points[idx[2]].y;

    middle < base && tip < middle
}

pub fn thumb_near_index_tip(points: &LandmarkSet) -> bool {
    points[joint::THUMB_TIP].planar_distance(&points[joint::INDEX_TIP]) < THUMB_INDEX_PROXIMITY
}

/// Requirement on one digit: `Some(open)` or `None` for "either".
pub type DigitPattern = Option<bool>;

/// One row of the classification table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureRule {
    pub gesture: Gesture,
    /// Thumb, index, middle, ring, pinky.
    pub digits: [DigitPattern; 5],
    pub needs_thumb_touch: bool,
}

impl GestureRule {
    const fn new(gesture: Gesture, digits: [DigitPattern; 5], needs_thumb_touch: bool) -> Self {
        Self {
            gesture,
            digits,
            needs_thumb_touch,
        }
    }

    pub fn matches(&self, states: &FingerStates, thumb_touch: bool) -> bool {
        if self.needs_thumb_touch && !thumb_touch {
            return false;
        }
        self.digits
            .iter()
            .zip(states.as_array())
            .all(|(want, open)| want.is_none_or(|want| want == open))
    }
}

const O: DigitPattern = Some(true);
const C: DigitPattern = Some(false);
const ANY: DigitPattern = None;

/// Tried top to bottom; the first match wins since the patterns overlap in
/// general.
pub const GESTURE_RULES: [GestureRule; 9] = [
    //                                     thumb index middle ring pinky
    GestureRule::new(Gesture::Victory, [C, O, O, C, C], false),
    GestureRule::new(Gesture::Horns, [C, O, C, C, O], false),
    GestureRule::new(Gesture::Love, [O, O, C, C, O], false),
    GestureRule::new(Gesture::IndexPoint, [C, O, C, C, C], false),
    GestureRule::new(Gesture::Ok, [ANY, C, O, O, O], true),
    GestureRule::new(Gesture::Middle, [ANY, C, O, C, C], false),
    GestureRule::new(Gesture::CallMe, [O, C, C, C, O], false),
    GestureRule::new(Gesture::ThumbsUp, [O, C, C, C, C], true),
    GestureRule::new(Gesture::Fist, [C, C, C, C, C], false),
];

/// First rule in `rules` that accepts the pattern, or `Undefined`.
pub fn first_match(rules: &[GestureRule], states: &FingerStates, thumb_touch: bool) -> Gesture {
    rules
        .iter()
        .find(|rule| rule.matches(states, thumb_touch))
        .map(|rule| rule.gesture)
        .unwrap_or(Gesture::Undefined)
}

pub fn classify_pose(states: &FingerStates, points: &LandmarkSet) -> Gesture {
    let gesture = first_match(&GESTURE_RULES, states, thumb_near_index_tip(points));
    if gesture == Gesture::Undefined {
        log::debug!("no gesture rule matches finger pattern {states}");
    }
    gesture
}

/// Classifies the first hand of a frame. Further hands are ignored and an
/// empty frame is `Undefined` without touching the extractor.
pub fn classify_hands(hands: &[LandmarkSet]) -> GestureDetail {
    let Some(primary) = hands.first() else {
        return GestureDetail {
            gesture: Gesture::Undefined,
            finger_states: None,
            hand_count: 0,
        };
    };

    let states = extract_finger_states(primary);
    GestureDetail {
        gesture: classify_pose(&states, primary),
        finger_states: Some(states),
        hand_count: hands.len(),
    }
}
