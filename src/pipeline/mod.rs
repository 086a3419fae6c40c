pub mod replay;

use std::{thread, time::Duration};

use crossbeam_channel::{Receiver, Sender, bounded, never, select, tick, unbounded};

use crate::{
    config::Config,
    error::GestureError,
    gesture::classify_hands,
    trigger::{Activation, CaptureTrigger, TriggerEvent, TriggerTimings},
    types::{GestureDetail, HandFrame, describe_hands},
};

/// What the UI needs after each processed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub detail: GestureDetail,
    /// Seconds left before the shot, while counting down.
    pub countdown: Option<u32>,
    pub busy: bool,
    pub event: Option<TriggerEvent>,
}

impl FrameReport {
    pub fn label(&self) -> String {
        self.detail.label()
    }
}

/// Owns the trigger state for one capture session. Every update goes
/// through `&mut self`, which is what keeps frames and ticks serialized.
#[derive(Debug)]
pub struct CaptureSession {
    trigger: CaptureTrigger,
    frames: u64,
}

impl CaptureSession {
    pub fn new(activation: Activation, timings: TriggerTimings) -> Self {
        Self {
            trigger: CaptureTrigger::new(activation, timings),
            frames: 0,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, GestureError> {
        Ok(Self::new(config.activation()?, config.timings()?))
    }

    pub fn process_frame(&mut self, frame: &HandFrame) -> FrameReport {
        self.frames += 1;

        if let Some(hand) = frame.hands.first() {
            let wrist = hand.wrist();
            log::debug!(
                "frame {}: wrist normalized coordinates x={:.4} y={:.4}",
                self.frames,
                wrist.x,
                wrist.y
            );
        }
        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{}", describe_hands(&frame.hands));
        }

        let detail = classify_hands(&frame.hands);
        let event = self.trigger.on_gesture(detail.gesture);

        FrameReport {
            detail,
            countdown: self.trigger.countdown_display(),
            busy: self.trigger.is_busy(),
            event,
        }
    }

    pub fn tick(&mut self) -> Option<TriggerEvent> {
        self.trigger.on_tick()
    }

    pub fn set_activation(&mut self, activation: Activation) {
        self.trigger.set_activation(activation);
    }

    pub fn request_capture(&mut self) -> TriggerEvent {
        self.trigger.request_capture()
    }

    pub fn is_busy(&self) -> bool {
        self.trigger.is_busy()
    }

    pub fn trigger(&self) -> &CaptureTrigger {
        &self.trigger
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

#[derive(Clone, Debug)]
pub enum SessionCommand {
    SetActivation(Activation),
    Capture,
    Shutdown,
}

/// Running session worker. Dropping it stops the worker.
#[derive(Debug)]
pub struct SessionHandle {
    commands: Sender<SessionCommand>,
    reports: Receiver<FrameReport>,
    events: Receiver<TriggerEvent>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SessionHandle {
    /// Per-frame reports. While one is pending unread, newer ones are dropped.
    pub fn reports(&self) -> &Receiver<FrameReport> {
        &self.reports
    }

    /// Every trigger event, in order. Never dropped.
    pub fn events(&self) -> &Receiver<TriggerEvent> {
        &self.events
    }

    /// Returns `false` if the worker has already exited.
    pub fn set_activation(&self, activation: Activation) -> bool {
        self.send(SessionCommand::SetActivation(activation))
    }

    /// Requests a manual capture. Returns `false` if the worker has already
    /// exited.
    pub fn capture(&self) -> bool {
        self.send(SessionCommand::Capture)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(|handle| handle.is_finished())
    }

    fn send(&self, command: SessionCommand) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("capture session already ended, dropping {:?}", err.0);
                false
            }
        }
    }

    /// Blocks until the worker has drained its input: the frame source is
    /// closed and no countdown or cooldown is running.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    pub fn stop(mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(SessionCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn start_session(
    config: &Config,
    frame_rx: Receiver<HandFrame>,
) -> Result<SessionHandle, GestureError> {
    config.validate()?;
    let session = CaptureSession::from_config(config)?;
    let tick_interval = config.tick_interval();

    let (command_tx, command_rx) = unbounded();
    let (report_tx, report_rx) = bounded(1);
    let (event_tx, event_rx) = unbounded();

    log::info!(
        "starting capture session (activation {:?}, countdown {} x {:?})",
        session.trigger().activation().gestures(),
        config.countdown_ticks,
        tick_interval
    );

    let handle = thread::spawn(move || {
        run_session_loop(
            session,
            frame_rx,
            command_rx,
            report_tx,
            event_tx,
            tick_interval,
        )
    });

    Ok(SessionHandle {
        commands: command_tx,
        reports: report_rx,
        events: event_rx,
        handle: Some(handle),
    })
}

enum Step {
    Frame(HandFrame),
    FramesClosed,
    Tick,
    Command(SessionCommand),
}

fn run_session_loop(
    mut session: CaptureSession,
    mut frame_rx: Receiver<HandFrame>,
    command_rx: Receiver<SessionCommand>,
    report_tx: Sender<FrameReport>,
    event_tx: Sender<TriggerEvent>,
    tick_interval: Duration,
) {
    let mut ticker = never();
    let mut ticking = false;
    let mut frames_open = true;

    loop {
        let step = select! {
            recv(frame_rx) -> msg => msg.map(Step::Frame).unwrap_or(Step::FramesClosed),
            recv(ticker) -> _ => Step::Tick,
            recv(command_rx) -> msg => Step::Command(msg.unwrap_or(SessionCommand::Shutdown)),
        };

        match step {
            Step::Frame(frame) => {
                let report = session.process_frame(&frame);
                if let Some(event) = report.event {
                    let _ = event_tx.send(event);
                }
                if report.busy && !ticking {
                    ticker = tick(tick_interval);
                    ticking = true;
                }
                let _ = report_tx.try_send(report);
            }
            Step::FramesClosed => {
                log::debug!(
                    "frame source closed after {} frames",
                    session.frames_processed()
                );
                frame_rx = never();
                frames_open = false;
            }
            Step::Tick => {
                if let Some(event) = session.tick() {
                    let _ = event_tx.send(event);
                }
                if !session.is_busy() {
                    ticker = never();
                    ticking = false;
                }
            }
            Step::Command(SessionCommand::SetActivation(activation)) => {
                session.set_activation(activation)
            }
            Step::Command(SessionCommand::Capture) => {
                let _ = event_tx.send(session.request_capture());
            }
            Step::Command(SessionCommand::Shutdown) => break,
        }

        if !frames_open && !session.is_busy() {
            break;
        }
    }

    log::info!(
        "capture session ended: {} frames, {} captures",
        session.frames_processed(),
        session.trigger().captures()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        trigger::{CaptureSource, TriggerState},
        types::{Gesture, fixtures::hand},
    };

    fn victory_frame() -> HandFrame {
        HandFrame::new(vec![hand(false, [true, true, false, false])])
    }

    fn fist_frame() -> HandFrame {
        HandFrame::new(vec![hand(false, [false; 4])])
    }

    #[test]
    fn session_reports_gesture_and_countdown() {
        let mut session = CaptureSession::new(Activation::default(), TriggerTimings::default());

        let report = session.process_frame(&fist_frame());
        assert_eq!(report.detail.gesture, Gesture::Fist);
        assert_eq!(report.countdown, None);
        assert!(!report.busy);
        assert_eq!(report.event, None);

        let report = session.process_frame(&victory_frame());
        assert_eq!(report.detail.gesture, Gesture::Victory);
        assert_eq!(report.countdown, Some(3));
        assert!(report.busy);
        assert!(matches!(report.event, Some(TriggerEvent::Armed { .. })));
        assert_eq!(session.frames_processed(), 2);
    }

    #[test]
    fn session_keeps_classifying_while_busy() {
        let mut session = CaptureSession::new(Activation::default(), TriggerTimings::default());
        session.process_frame(&victory_frame());

        let report = session.process_frame(&fist_frame());
        assert_eq!(report.detail.gesture, Gesture::Fist);
        assert_eq!(report.event, None);
        assert_eq!(report.countdown, Some(3));
    }

    #[test]
    fn empty_frames_never_arm() {
        let mut session = CaptureSession::new(Activation::default(), TriggerTimings::default());
        let report = session.process_frame(&HandFrame::empty());
        assert_eq!(report.detail.gesture, Gesture::Undefined);
        assert_eq!(report.label(), "⋯ Unrecognized");
        assert!(!session.is_busy());
    }

    #[test]
    fn activation_frames_while_arming_capture_once() {
        let mut session = CaptureSession::new(Activation::default(), TriggerTimings::default());
        session.process_frame(&victory_frame());

        let mut captures = 0;
        for _ in 0..3 {
            session.process_frame(&victory_frame());
            if let Some(TriggerEvent::Capture { .. }) = session.tick() {
                captures += 1;
            }
        }
        assert_eq!(captures, 1);
        assert_eq!(
            session.trigger().state(),
            TriggerState::Cooldown { remaining: 2 }
        );
    }

    #[test]
    fn demo_recording_captures_once() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/victory_hold.jsonl");
        let frames = replay::load_recording(path).unwrap();
        let mut session = CaptureSession::new(Activation::default(), TriggerTimings::default());

        // 30 fps recording, one tick per second of frames.
        let mut armed = 0;
        let mut captures = 0;
        for (i, frame) in frames.iter().enumerate() {
            if let Some(TriggerEvent::Armed { .. }) = session.process_frame(frame).event {
                armed += 1;
            }
            if (i + 1) % 30 == 0 {
                if let Some(TriggerEvent::Capture { .. }) = session.tick() {
                    captures += 1;
                }
            }
        }
        assert_eq!(armed, 1);
        assert_eq!(captures, 1);
        assert!(!session.is_busy());
    }

    fn fast_config() -> Config {
        Config {
            tick_interval_ms: 5,
            ..Config::default()
        }
    }

    #[test]
    fn worker_processes_every_queued_frame() {
        let (frame_tx, frame_rx) = unbounded();
        frame_tx.send(victory_frame()).unwrap();
        frame_tx.send(fist_frame()).unwrap();
        drop(frame_tx);

        let session = start_session(&fast_config(), frame_rx).unwrap();
        let events: Vec<TriggerEvent> = session.events().iter().collect();
        session.join();

        assert_eq!(
            events.first(),
            Some(&TriggerEvent::Armed {
                gesture: Gesture::Victory,
                remaining: 3
            })
        );
        assert!(events.contains(&TriggerEvent::Capture {
            source: CaptureSource::Gesture(Gesture::Victory)
        }));
    }

    #[test]
    fn worker_runs_countdown_to_capture() {
        let (frame_tx, frame_rx) = bounded(4);
        let session = start_session(&fast_config(), frame_rx).unwrap();

        frame_tx.send(victory_frame()).unwrap();
        drop(frame_tx);

        let events: Vec<TriggerEvent> = session
            .events()
            .iter()
            .take_while(|e| *e != TriggerEvent::Rearmed)
            .collect();
        session.join();

        assert_eq!(
            events,
            vec![
                TriggerEvent::Armed {
                    gesture: Gesture::Victory,
                    remaining: 3
                },
                TriggerEvent::Countdown { remaining: 2 },
                TriggerEvent::Countdown { remaining: 1 },
                TriggerEvent::Capture {
                    source: CaptureSource::Gesture(Gesture::Victory)
                },
            ]
        );
    }

    #[test]
    fn worker_handles_manual_capture_and_stop() {
        let (_frame_tx, frame_rx) = bounded::<HandFrame>(1);
        let session = start_session(&Config::default(), frame_rx).unwrap();
        assert!(session.capture());
        assert_eq!(
            session.events().recv().unwrap(),
            TriggerEvent::Capture {
                source: CaptureSource::Manual
            }
        );
        session.stop();
    }

    #[test]
    fn worker_switches_activation_mid_countdown() {
        let (frame_tx, frame_rx) = bounded(4);
        let session = start_session(&fast_config(), frame_rx).unwrap();

        frame_tx.send(victory_frame()).unwrap();
        assert!(matches!(
            session.events().recv().unwrap(),
            TriggerEvent::Armed {
                gesture: Gesture::Victory,
                ..
            }
        ));
        assert!(session.set_activation(Activation::single(Gesture::Fist).unwrap()));

        let rest: Vec<TriggerEvent> = session
            .events()
            .iter()
            .take_while(|e| *e != TriggerEvent::Rearmed)
            .collect();
        assert!(rest.contains(&TriggerEvent::Capture {
            source: CaptureSource::Gesture(Gesture::Victory)
        }));

        frame_tx.send(victory_frame()).unwrap();
        frame_tx.send(fist_frame()).unwrap();
        drop(frame_tx);
        let events: Vec<TriggerEvent> = session.events().iter().collect();
        session.join();

        assert_eq!(
            events.first(),
            Some(&TriggerEvent::Armed {
                gesture: Gesture::Fist,
                remaining: 3
            })
        );
    }

    #[test]
    fn commands_after_exit_are_reported() {
        let (frame_tx, frame_rx) = bounded::<HandFrame>(1);
        let session = start_session(&Config::default(), frame_rx).unwrap();
        drop(frame_tx);

        while !session.is_finished() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!session.capture());
        assert!(!session.set_activation(Activation::default()));
        assert_eq!(session.events().try_recv().ok(), None);
    }

    #[test]
    fn worker_rejects_invalid_config() {
        let config = Config {
            activation: Vec::new(),
            ..Config::default()
        };
        let (_frame_tx, frame_rx) = bounded::<HandFrame>(1);
        assert_eq!(
            start_session(&config, frame_rx).unwrap_err(),
            GestureError::InvalidActivation
        );
    }
}
