//! Recorded landmark streams, one JSON object per line:
//!
//! ```text
//! {"hands": [[[0.51, 0.83, 0.0], ... 21 points]]}
//! ```
//!
//! Used to drive a session without a camera or detector.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::types::{HandFrame, LandmarkSet};

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    hands: Vec<Vec<[f32; 3]>>,
}

pub fn parse_frame(line: &str) -> Result<HandFrame> {
    let recorded: RecordedFrame = serde_json::from_str(line)?;
    let hands = recorded
        .hands
        .into_iter()
        .enumerate()
        .map(|(i, points)| {
            LandmarkSet::from_raw(&points).with_context(|| format!("hand {i}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(HandFrame::new(hands))
}

pub fn encode_frame(hands: &[LandmarkSet]) -> Result<String> {
    let recorded = RecordedFrame {
        hands: hands
            .iter()
            .map(|hand| hand.points().iter().map(|p| [p.x, p.y, p.z]).collect())
            .collect(),
    };
    Ok(serde_json::to_string(&recorded)?)
}

/// Skips blank lines and `#` comments.
pub fn read_recording(reader: impl BufRead) -> Result<Vec<HandFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame = parse_frame(trimmed)
            .with_context(|| format!("invalid frame on line {}", index + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load_recording(path: impl AsRef<Path>) -> Result<Vec<HandFrame>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("failed to open recording {}", path.display()))?;
    read_recording(BufReader::new(file))
        .with_context(|| format!("failed to read recording {}", path.display()))
}

/// Feeds recorded frames at a fixed rate, like a live detector would.
#[derive(Debug)]
pub struct ReplayStream {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<usize>>,
}

impl ReplayStream {
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Waits for the recording to finish; returns the number of frames
    /// delivered.
    pub fn wait(mut self) -> usize {
        self.handle
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or(0)
    }
}

impl Drop for ReplayStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn start_replay(
    frames: Vec<HandFrame>,
    frame_tx: Sender<HandFrame>,
    frame_interval: Duration,
) -> ReplayStream {
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();

    let handle = thread::spawn(move || {
        let mut delivered = 0;
        for mut frame in frames {
            if stop_flag.load(Ordering::Relaxed) {
                break;
            }
            frame.timestamp = Instant::now();
            // Drop if the session is busy, the way a live camera would.
            if frame_tx.try_send(frame).is_ok() {
                delivered += 1;
            }
            thread::sleep(frame_interval);
        }
        delivered
    });

    ReplayStream {
        stop,
        handle: Some(handle),
    }
}
