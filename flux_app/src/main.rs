use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use flux_backend::FluxEngine;
use flux_backend::audio_device::CpalHardware;
use flux_backend::sensor::ChannelSensorProvider;
use flux_core::EngineConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod simulator;

use cli::Args;
use simulator::MotionSimulator;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    let rate = Duration::from_micros(config.sensor.rate_hint_micros as u64);
    let (feed, sensors) = ChannelSensorProvider::new(64);
    let mut engine = FluxEngine::new(config, Arc::new(CpalHardware::new()), Arc::new(sensors))?;

    engine.set_master_volume(args.volume.clamp(0.0, 1.0));
    engine.start();
    engine.set_target_parameters(engine.parameters().target_frequency(), args.amplitude.clamp(0.0, 1.0));
    let _simulator = MotionSimulator::spawn(feed, args.motion, rate)?;

    match engine.output_format() {
        Some((sample_rate, channels)) => tracing::info!(sample_rate, channels, "audio output"),
        None => tracing::warn!("no audio output; running silent"),
    }
    tracing::info!(pattern = ?args.motion, seconds = args.duration, "running");
    let deadline = Instant::now() + Duration::from_secs_f32(args.duration.max(0.0));
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_secs(1));
        let counters = engine.get_and_reset_event_counters();
        println!(
            "callbacks/s {:>4}  sensor/s {:>3}  magnitude {:>6.3}  pitch {:>7.1} Hz  stream {}",
            counters.render_callbacks,
            counters.sensor_events,
            engine.current_magnitude(),
            engine.parameters().target_frequency(),
            engine
                .stream_state()
                .map_or_else(|| "unavailable".to_string(), |s| s.to_string()),
        );
    }

    engine.stop();
    let snapshot = engine.render_snapshot();
    tracing::info!(
        frames = snapshot.frames_rendered,
        callbacks = snapshot.total_callbacks,
        max_callback_us = snapshot.max_callback_nanos.map(|n| n / 1_000),
        "done"
    );
    Ok(())
}
