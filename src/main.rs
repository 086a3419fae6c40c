use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use crossbeam_channel::bounded;
use gesture_shutter::{
    Config, TriggerEvent,
    pipeline::{
        replay::{load_recording, start_replay},
        start_session,
    },
    trigger::CaptureSource,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let (config, recording) = match args.as_slice() {
        [recording] => (Config::default(), recording.clone()),
        [config, recording] => (Config::load(config)?, recording.clone()),
        _ => bail!("usage: gesture-shutter [CONFIG.toml] RECORDING.jsonl"),
    };

    let frames = load_recording(&recording)?;
    log::info!(
        "replaying {} frames from {} at {} fps",
        frames.len(),
        recording.display(),
        config.replay_fps
    );

    let (frame_tx, frame_rx) = bounded(1);
    let session = start_session(&config, frame_rx).context("failed to start capture session")?;
    let replay = start_replay(frames, frame_tx, config.frame_interval());

    let mut last_label = String::new();
    let mut captures = 0;
    loop {
        crossbeam_channel::select! {
            recv(session.reports()) -> report => {
                let Ok(report) = report else { break };
                let label = report.label();
                if label != last_label {
                    println!("{label}");
                    last_label = label;
                }
            }
            recv(session.events()) -> event => {
                let Ok(event) = event else { break };
                print_event(event, &mut captures);
            }
        }
    }
    for event in session.events().try_iter() {
        print_event(event, &mut captures);
    }

    let delivered = replay.wait();
    session.join();
    println!("{delivered} frames replayed, {captures} captures");

    Ok(())
}

fn print_event(event: TriggerEvent, captures: &mut u32) {
    match event {
        TriggerEvent::Armed { gesture, remaining } => {
            println!("{} armed, {remaining}...", gesture.glyph());
        }
        TriggerEvent::Countdown { remaining } => println!("{remaining}..."),
        TriggerEvent::Capture { source } => {
            *captures += 1;
            match source {
                CaptureSource::Gesture(gesture) => {
                    println!("capture #{captures} ({})", gesture.display_name())
                }
                CaptureSource::Manual => println!("capture #{captures} (manual)"),
            }
        }
        TriggerEvent::Rearmed => println!("ready"),
    }
}
