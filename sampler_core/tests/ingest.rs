use std::collections::VecDeque;

use sampler_core::mocks::{RecordingVisualizer, VisualEvent};
use sampler_core::transcript::MemoryTranscript;
use sampler_core::{AxisLimits, Channel, Engine, SamplingMode, TickStatus};
use sampler_traits::{BoxError, Device};

/// Replays canned lines; records what it was told.
#[derive(Default)]
struct ScriptedDevice {
    lines: VecDeque<String>,
    commands: Vec<u8>,
    throttles: Vec<u32>,
}

impl ScriptedDevice {
    fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| format!("{l}\n")).collect(),
            ..Self::default()
        }
    }
}

impl Device for ScriptedDevice {
    fn write_command(&mut self, command: u8) -> Result<(), BoxError> {
        self.commands.push(command);
        Ok(())
    }
    fn write_throttle(&mut self, level: u32) -> Result<(), BoxError> {
        self.throttles.push(level);
        Ok(())
    }
    fn read_line(&mut self) -> Result<Vec<u8>, BoxError> {
        Ok(self.lines.pop_front().unwrap_or_default().into_bytes())
    }
    fn reset_input_buffer(&mut self) -> Result<(), BoxError> {
        self.lines.clear();
        Ok(())
    }
}

struct Rig {
    engine: Engine<ScriptedDevice>,
    transcript: MemoryTranscript,
    plot: RecordingVisualizer,
}

fn sweeping(lines: &[&str], limits: AxisLimits) -> Rig {
    let transcript = MemoryTranscript::new();
    let plot = RecordingVisualizer::new();
    let mut engine = Engine::builder()
        .with_device(ScriptedDevice::with_lines(lines))
        .with_transcript(transcript.clone())
        .with_visualizer(plot.clone())
        .with_axis_limits(limits)
        .build()
        .expect("engine");
    engine.select_mode(SamplingMode::Manual).unwrap();
    engine.run_sweep().unwrap();
    Rig {
        engine,
        transcript,
        plot,
    }
}

fn polled(status: TickStatus) -> Option<(Channel, u64, f64)> {
    match status {
        TickStatus::Polled { sample } => sample.map(|s| (s.channel, s.timestamp_ms, s.value)),
        other => panic!("expected a poll, got {other:?}"),
    }
}

#[test]
fn thrust_line_lands_in_the_session_and_widens_the_axis() {
    let limits = AxisLimits::default().with_value_limit(Channel::Thrust, 0.4);
    let mut rig = sweeping(&["HX7T 0 0.500000 0 1200 0"], limits);

    let got = polled(rig.engine.tick().unwrap());
    assert_eq!(got, Some((Channel::Thrust, 1200, 0.5)));

    let entry = rig.engine.sessions().active().unwrap();
    assert_eq!(entry.thrust.timestamps(), &[1200]);
    assert_eq!(entry.thrust.values(), &[0.5]);

    let (lower, upper) = rig.plot.last_value_bounds(Channel::Thrust).unwrap();
    assert!((upper - 0.55).abs() < 1e-9);
    assert!((lower + 0.55).abs() < 1e-9);
    assert!(
        (rig.engine.axis_limits().value_limit(Channel::Thrust) - 0.55).abs() < 1e-9
    );
    assert!(
        !rig.plot
            .events()
            .iter()
            .any(|e| matches!(e, VisualEvent::Time(_)))
    );
    assert!(rig.plot.events().contains(&VisualEvent::Series {
        kind: Channel::Thrust,
        points: 1,
        session_index: 0,
    }));
    assert_eq!(rig.transcript.lines(), vec!["HX7T 0 0.500000 0 1200 0"]);
}

#[test]
fn spikes_repeat_the_last_accepted_value() {
    let mut rig = sweeping(
        &["HX7T 0 0.5 0 10 0", "HX7T 0 7.5 0 20 0", "HX7T 0 -0.25 0 30 0"],
        AxisLimits::default(),
    );
    for _ in 0..3 {
        rig.engine.tick().unwrap();
    }
    let thrust = &rig.engine.sessions().active().unwrap().thrust;
    assert_eq!(thrust.values(), &[0.5, 0.5, 0.25]);
    assert_eq!(thrust.timestamps(), &[10, 20, 30]);
}

#[test]
fn speed_is_never_filtered() {
    let mut rig = sweeping(&["RPMp 0 12000 0 10 0"], AxisLimits::default());
    assert_eq!(
        polled(rig.engine.tick().unwrap()),
        Some((Channel::Speed, 10, 12_000.0))
    );
    let (lower, upper) = rig.plot.last_value_bounds(Channel::Speed).unwrap();
    assert_eq!(lower, 0.0);
    assert!((upper - 13_200.0).abs() < 1e-6);
}

#[test]
fn torque_pair_is_read_in_one_tick() {
    let mut rig = sweeping(
        &["HX7M 1 0.02 0 100 0", "HX7M 2 0.04 0 110 0"],
        AxisLimits::default(),
    );
    let (channel, ts, value) = polled(rig.engine.tick().unwrap()).unwrap();
    assert_eq!((channel, ts), (Channel::Torque, 105));
    assert!((value - 0.03).abs() < 1e-12);
    assert_eq!(rig.transcript.lines().len(), 2);
    assert_eq!(polled(rig.engine.tick().unwrap()), None);
}

#[test]
fn late_samples_grow_the_time_axis_one_step() {
    let mut rig = sweeping(
        &["HX7T 0 0.1 0 6000 0", "HX7T 0 0.1 0 40000 0"],
        AxisLimits::default(),
    );
    rig.engine.tick().unwrap();
    rig.engine.tick().unwrap();
    let times: Vec<u64> = rig
        .plot
        .events()
        .iter()
        .filter_map(|e| match e {
            VisualEvent::Time(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(times, vec![15_000, 25_000]);
}

#[test]
fn configured_time_axis_is_the_starting_span() {
    let mut rig = sweeping(
        &["HX7T 0 0.1 0 1500 0", "HX7T 0 0.1 0 2500 0"],
        AxisLimits::default().with_time_limit(2000),
    );
    rig.engine.tick().unwrap();
    assert_eq!(rig.engine.axis_limits().time_limit_ms, 2000);
    rig.engine.tick().unwrap();
    assert_eq!(rig.engine.axis_limits().time_limit_ms, 12_000);
    let entry = rig.engine.sessions().active().unwrap();
    assert_eq!(entry.sample_count(), 2);
}

#[test]
fn chatter_and_garbage_reach_the_transcript_only() {
    let mut rig = sweeping(
        &["Scale ready", "HX7T 0 oops 0 5 0", "RPMp 0 100 0 6 0"],
        AxisLimits::default(),
    );
    assert_eq!(polled(rig.engine.tick().unwrap()), None);
    assert_eq!(polled(rig.engine.tick().unwrap()), None);
    assert!(polled(rig.engine.tick().unwrap()).is_some());

    let lines = rig.transcript.lines();
    assert_eq!(lines[0], "Scale ready");
    assert_eq!(lines[1], "HX7T 0 oops 0 5 0");
    assert!(lines[2].starts_with("Skipped malformed line"));
    let entry = rig.engine.sessions().active().unwrap();
    assert!(entry.thrust.is_empty());
    assert_eq!(entry.speed.len(), 1);
}

#[test]
fn empty_reads_are_quiet() {
    let mut rig = sweeping(&[], AxisLimits::default());
    assert_eq!(polled(rig.engine.tick().unwrap()), None);
    assert!(rig.transcript.lines().is_empty());
    assert!(rig.plot.events().is_empty());
}

#[test]
fn sweep_commands_reach_the_device_in_order() {
    let mut rig = sweeping(&[], AxisLimits::default());
    rig.engine.stop_sweep().unwrap();
    assert_eq!(rig.engine.device().commands, vec![b'X', b'r', b's']);
    assert!(rig.engine.device().throttles.is_empty());
}
