use std::fs::File;
use std::io::{self, IsTerminal};
use std::os::fd::AsFd;
use std::path::PathBuf;

use argh::FromArgs;

use crate::error::ShellError;

#[derive(FromArgs, Debug, PartialEq, Eq)]
/// Run pipelines of programs, reading command lines from a terminal or a file.
pub struct Config {
	/// file of command lines to run instead of standard input
	#[argh(positional)]
	pub script: Option<PathBuf>,
}

pub struct Input {
	pub file: File,
	/// Both the command source and standard output are terminals.
	pub interactive: bool,
}

impl Config {
	pub fn open_input(&self) -> Result<Input, ShellError> {
		let file = match self.script {
			Some(ref path) => File::open(path).map_err(|source| ShellError::OpenInput { path: path.clone(), source })?,
			// a close-on-exec duplicate, so children only see fd 0 itself
			None => File::from(io::stdin().as_fd().try_clone_to_owned().map_err(ShellError::Read)?),
		};
		let interactive = file.is_terminal() && io::stdout().is_terminal();
		Ok(Input { file, interactive })
	}
}
