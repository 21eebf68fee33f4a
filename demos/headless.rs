//! Play a sine wave through an output and print its stats.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example headless -- null 3
//! cargo run --features cpal --example headless -- cpal
//! ```
//!
//! Arguments are the backend (`null`/`cpal`) and the seconds to play for.

use std::{str::FromStr, time::Duration};
use outloop::{AudioManager, Fixed, OutputConfig, OutputKind, Source};

/// A sine wave at `hz`, written to every channel.
struct Sine {
	phase: f32,
	step: f32,
	channels: usize,
}

impl Sine {
	fn new(hz: f32, config: &OutputConfig) -> Self {
		Self {
			phase: 0.0,
			step: hz * std::f32::consts::TAU / config.sample_rate as f32,
			channels: usize::from(config.channels),
		}
	}
}

impl Source for Sine {
	fn fill(&mut self, buffer: &mut [Fixed]) {
		for frame in buffer.chunks_mut(self.channels) {
			frame.fill(Fixed::from_f32(self.phase.sin() * 0.2));
			self.phase = (self.phase + self.step) % std::f32::consts::TAU;
		}
	}
}

fn main() {
	// Set RUST_LOG=debug for the lifecycle, trace for every cycle.
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
		.format_timestamp_millis()
		.init();

	let mut args = std::env::args().skip(1);
	let kind = args
		.next()
		.and_then(|s| OutputKind::from_str(&s).ok())
		.unwrap_or_default();
	let seconds: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(2);

	let config = OutputConfig::DEFAULT;
	let sine = Sine::new(440.0, &config);

	let mut manager = match AudioManager::open(kind, config, sine) {
		Ok(m) => m,
		Err(e) => {
			log::error!("could not open any output: {e}");
			std::process::exit(1);
		}
	};

	{
		let output = manager.output();
		log::info!(
			"{kind} -> {} ({}), api: {}, device: {}, buffer_size: {} (requested {})",
			manager.kind(),
			output.state(),
			output.audio_api(),
			output.audio_device(),
			output.buffer_size(),
			output.requested_buffer_size(),
		);
	}

	for _ in 0..seconds * 4 {
		std::thread::sleep(Duration::from_millis(250));
		let output = manager.output();
		log::info!(
			"stream_time: {:.3}s, played: {}%, clipped: {}, dropped: {}, cycles: {}",
			output.stream_time(),
			output.played_buffer_percentage(),
			output.clipped(),
			output.dropped_buffers(),
			output.cycles(),
		);
	}

	if let Err(e) = manager.shutdown() {
		log::error!("shutdown failed: {e}");
	}
}
