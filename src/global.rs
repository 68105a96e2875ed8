use std::path::PathBuf;

use nix::unistd;

use crate::error::ShellError;

/// Interpreter-owned state carried from one command line to the next.
/// Children start in `cwd`; the interpreter process itself never `chdir`s,
/// so several `State`s can coexist in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
	pub cwd: PathBuf,
	pub interactive: bool,
}

impl State {
	pub fn new(interactive: bool) -> Result<State, ShellError> {
		let cwd = unistd::getcwd().map_err(ShellError::sys("getcwd error"))?;
		Ok(State::with_cwd(cwd, interactive))
	}

	pub fn with_cwd(cwd: PathBuf, interactive: bool) -> State {
		State { cwd, interactive }
	}
}
