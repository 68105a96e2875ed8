use std::io::{self, Write};
use std::process;

use mush::config::Config;
use mush::global::State;
use mush::signal::SignalController;
use mush::{Shell, ShellError};

fn setup_logging() {
	use tracing_subscriber::{fmt, prelude::*, EnvFilter};

	let filter = EnvFilter::try_from_env("MUSH_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(io::stderr))
		.init();
}

fn run(config: Config) -> Result<(), ShellError> {
	let signals = SignalController::install()?;
	let input = config.open_input()?;
	let state = State::new(input.interactive)?;
	Shell::new(state, input.file, io::stdout(), signals).run()
}

fn main() {
	let config: Config = argh::from_env();
	setup_logging();
	if let Err(e) = run(config) {
		let _ = writeln!(&mut io::stderr(), "{}", e);
		process::exit(e.exit_code());
	}
}
