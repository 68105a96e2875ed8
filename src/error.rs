use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Conditions that end the interpreter. Per-command problems (parse errors,
/// a bad `cd` target, a stage that fails to start) never show up here.
#[derive(Debug, Error)]
pub enum ShellError {
	#[error("error opening input file {}: {}", path.display(), describe(source))]
	OpenInput { path: PathBuf, source: io::Error },

	#[error("problem reading input: {}", describe(.0))]
	Read(#[source] io::Error),

	#[error("unable to determine home directory")]
	NoHome,

	#[error("change dir to home failure: {}: {}", path.display(), source.desc())]
	Home { path: PathBuf, source: Errno },

	#[error("{op}: {}", source.desc())]
	Sys { op: &'static str, source: Errno },
}

impl ShellError {
	/// Adapter for `map_err` on `nix` calls, naming the failed operation.
	pub fn sys(op: &'static str) -> impl FnOnce(Errno) -> ShellError {
		move |source| ShellError::Sys { op, source }
	}

	pub fn exit_code(&self) -> i32 {
		1
	}
}

/// The bare system message for an I/O error, as `perror` would print it.
pub fn describe(e: &io::Error) -> String {
	match e.raw_os_error() {
		Some(code) => Errno::from_raw(code).desc().to_string(),
		None => e.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn messages_name_the_operation() {
		let e = ShellError::sys("problem creating pipes")(Errno::EMFILE);
		assert_eq!(e.to_string(), "problem creating pipes: Too many open files");
		assert_eq!(e.exit_code(), 1);

		let e = ShellError::Read(io::Error::from_raw_os_error(libc::EBADF));
		assert_eq!(e.to_string(), "problem reading input: Bad file number");

		let e = ShellError::OpenInput {
			path: PathBuf::from("cmds"),
			source: io::Error::from_raw_os_error(libc::ENOENT),
		};
		assert_eq!(e.to_string(), "error opening input file cmds: No such file or directory");

		let e = ShellError::Home { path: PathBuf::from("/h"), source: Errno::EACCES };
		assert_eq!(e.to_string(), "change dir to home failure: /h: Permission denied");
	}

	#[test]
	fn describe_strips_os_error_suffix() {
		assert_eq!(describe(&io::Error::from_raw_os_error(libc::ENOENT)), "No such file or directory");
		assert_eq!(describe(&io::Error::new(io::ErrorKind::Other, "custom")), "custom");
	}
}
