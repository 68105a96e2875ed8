use std::convert::Infallible;
use std::ffi::CStr;
use std::io::{self, Write};
use std::os::fd::RawFd;
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{self, ForkResult};
use thiserror::Error;

use crate::error::ShellError;
use crate::global;
use crate::job::{ChildSet, Reaped};
use crate::pipe::PipeSet;
use crate::signal::{self, BlockGuard, SignalController};
use crate::types::{Pipeline, Stage};

/// Where one standard stream of a stage comes from or goes to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Wire<'a> {
	Inherit,
	Pipe(usize),
	File(&'a Path),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Wiring<'a> {
	pub stdin: Wire<'a>,
	pub stdout: Wire<'a>,
}

/// Stage `i` reads pipe `i - 1` and writes pipe `i`; a redirection file
/// takes the place of the pipe on its end.
pub fn wiring(pipeline: &Pipeline, i: usize) -> Wiring<'_> {
	let stage = &pipeline.stages[i];
	let last = pipeline.len() - 1;
	let stdin = match stage.input {
		Some(ref path) => Wire::File(path),
		None if i > 0 => Wire::Pipe(i - 1),
		None => Wire::Inherit,
	};
	let stdout = match stage.output {
		Some(ref path) => Wire::File(path),
		None if i < last => Wire::Pipe(i),
		None => Wire::Inherit,
	};
	Wiring { stdin, stdout }
}

/// Why a forked stage never reached its program. Lives and dies in the child.
#[derive(Debug, Error)]
enum StageError<'a> {
	#[error("{}: {}", path.display(), errno.desc())]
	Path { path: &'a Path, errno: Errno },
	#[error("{}: {}", name.to_string_lossy(), errno.desc())]
	Exec { name: &'a CStr, errno: Errno },
	#[error("{op}: {}", errno.desc())]
	Setup { op: &'static str, errno: Errno },
}

impl<'a> StageError<'a> {
	fn setup(op: &'static str) -> impl FnOnce(Errno) -> StageError<'a> {
		move |errno| StageError::Setup { op, errno }
	}

	fn status(&self) -> i32 {
		match *self {
			StageError::Path { errno, .. } | StageError::Exec { errno, .. } if errno as i32 != 0 => errno as i32,
			_ => 1,
		}
	}
}

fn dup_onto<'a>(fd: RawFd, target: RawFd) -> Result<(), StageError<'a>> {
	unistd::dup2(fd, target).map(drop).map_err(StageError::setup("dupping error"))
}

fn redirect(path: &Path, flags: OFlag, target: RawFd) -> Result<(), StageError<'_>> {
	let mode = Mode::S_IRUSR | Mode::S_IWUSR | Mode::S_IRGRP | Mode::S_IROTH;
	let fd = fcntl::open(path, flags, mode).map_err(|errno| StageError::Path { path, errno })?;
	dup_onto(fd, target)?;
	unistd::close(fd).map_err(StageError::setup("fail to close"))
}

fn do_exec_stage<'a>(cwd: &'a Path, stage: &'a Stage, wiring: Wiring<'a>, pipes: PipeSet,
                     guard: &BlockGuard) -> Result<Infallible, StageError<'a>> {
	guard.unblock().map_err(StageError::setup("sigprocmask error"))?;
	signal::reset_for_exec().map_err(StageError::setup("signal error"))?;
	match unistd::chdir(cwd) {
		// removed under us: stay in the inherited directory
		Ok(()) | Err(Errno::ENOENT) => {},
		Err(errno) => return Err(StageError::Path { path: cwd, errno }),
	}

	match wiring.stdin {
		Wire::Inherit => {},
		Wire::Pipe(k) => dup_onto(pipes.read_end(k), libc::STDIN_FILENO)?,
		Wire::File(path) => redirect(path, OFlag::O_RDONLY, libc::STDIN_FILENO)?,
	}
	match wiring.stdout {
		Wire::Inherit => {},
		Wire::Pipe(k) => dup_onto(pipes.write_end(k), libc::STDOUT_FILENO)?,
		Wire::File(path) => redirect(path, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC, libc::STDOUT_FILENO)?,
	}
	// the ends in use now live on 0 and 1
	pipes.close().map_err(StageError::setup("fail to close"))?;

	let name = stage.argv[0].as_c_str();
	match unistd::execvp(name, &stage.argv) {
		Ok(never) => match never {},
		Err(errno) => Err(StageError::Exec { name, errno }),
	}
}

fn exec_stage(cwd: &Path, stage: &Stage, wiring: Wiring, pipes: PipeSet, guard: &BlockGuard) -> ! {
	let s = match do_exec_stage(cwd, stage, wiring, pipes, guard) {
		Ok(never) => match never {},
		Err(e) => {
			let _ = writeln!(&mut io::stderr(), "{}", e);
			e.status()
		},
	};
	unsafe { libc::_exit(s) }
}

/// Forks one child per stage with SIGINT held back for the whole loop, then
/// drops the interpreter's copies of every pipe end.
fn spawn_commands(state: &global::State, pipeline: &Pipeline, pipes: PipeSet,
                  signals: &SignalController) -> Result<ChildSet, ShellError> {
	let _ = io::stdout().flush();
	let guard = signals.block()?;
	let mut children = ChildSet::with_capacity(pipeline.len());
	for (i, stage) in pipeline.stages.iter().enumerate() {
		match unsafe { unistd::fork() }.map_err(ShellError::sys("fork error"))? {
			ForkResult::Parent { child } => children.push(child),
			ForkResult::Child => exec_stage(&state.cwd, stage, wiring(pipeline, i), pipes, &guard),
		}
	}
	pipes.close().map_err(ShellError::sys("fail to close"))?;
	guard.release()?;
	Ok(children)
}

/// Runs `pipeline` to completion: every stage is started and every child
/// reaped before this returns.
pub fn run_pipeline(state: &global::State, pipeline: &Pipeline,
                    signals: &SignalController) -> Result<Reaped, ShellError> {
	assert!(!pipeline.is_empty());

	let pipes = PipeSet::allocate(pipeline.len())?;
	let pipe_count = pipes.len();
	let children = spawn_commands(state, pipeline, pipes, signals)?;
	tracing::debug!(stages = children.len(), pipes = pipe_count, "spawned pipeline");

	let mut reaped = children.reap();
	// a SIGINT held back during the fork loop lands after the unblock
	reaped.interrupted |= signals.take_interrupt();
	Ok(reaped)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser;

	fn plan(line: &str) -> Vec<Wiring<'static>> {
		let pipeline: &'static Pipeline = Box::leak(Box::new(parser::parse(line.as_bytes()).unwrap().unwrap()));
		(0 .. pipeline.len()).map(|i| wiring(pipeline, i)).collect()
	}

	#[test]
	fn single_stage_inherits_everything() {
		assert_eq!(plan("ls"), [Wiring { stdin: Wire::Inherit, stdout: Wire::Inherit }]);
	}

	#[test]
	fn single_stage_with_both_redirections() {
		assert_eq!(plan("sort < a > b"), [Wiring {
			stdin: Wire::File(Path::new("a")),
			stdout: Wire::File(Path::new("b")),
		}]);
	}

	#[test]
	fn stages_chain_through_pipes() {
		assert_eq!(plan("a | b | c | d"), [
			Wiring { stdin: Wire::Inherit, stdout: Wire::Pipe(0) },
			Wiring { stdin: Wire::Pipe(0), stdout: Wire::Pipe(1) },
			Wiring { stdin: Wire::Pipe(1), stdout: Wire::Pipe(2) },
			Wiring { stdin: Wire::Pipe(2), stdout: Wire::Inherit },
		]);
	}

	#[test]
	fn redirections_replace_outer_ends() {
		assert_eq!(plan("a < in | b | c > out"), [
			Wiring { stdin: Wire::File(Path::new("in")), stdout: Wire::Pipe(0) },
			Wiring { stdin: Wire::Pipe(0), stdout: Wire::Pipe(1) },
			Wiring { stdin: Wire::Pipe(1), stdout: Wire::File(Path::new("out")) },
		]);
	}

	#[test]
	fn child_status_carries_errno() {
		let e = StageError::Exec { name: c"nope", errno: Errno::ENOENT };
		assert_eq!(e.status(), libc::ENOENT);
		assert_eq!(e.to_string(), "nope: No such file or directory");
		let e = StageError::Path { path: Path::new("out"), errno: Errno::EACCES };
		assert_eq!(e.status(), libc::EACCES);
		assert_eq!(StageError::setup("dupping error")(Errno::EBADF).status(), 1);
	}
}
