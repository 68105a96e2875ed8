use nix::errno::Errno;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::Pid;

pub trait WaitStatusExt {
	/// Shell-style status: the exit code, or 128 + signal number.
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub status: WaitStatus,
}

/// Children of one pipeline, in stage order.
#[derive(Debug, Default)]
pub struct ChildSet {
	pids: Vec<Pid>,
}

#[derive(Debug)]
pub struct Reaped {
	pub processes: Vec<Process>,
	/// Some wait was cut short by SIGINT.
	pub interrupted: bool,
}

impl ChildSet {
	pub fn with_capacity(stages: usize) -> ChildSet {
		ChildSet { pids: Vec::with_capacity(stages) }
	}

	pub fn push(&mut self, pid: Pid) {
		self.pids.push(pid);
	}

	pub fn len(&self) -> usize {
		self.pids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pids.is_empty()
	}

	/// Waits for every child in stage order. An interrupted wait is retried
	/// on the same pid so that each child is reaped exactly once.
	pub fn reap(self) -> Reaped {
		let mut interrupted = false;
		let mut processes = Vec::with_capacity(self.pids.len());
		for pid in self.pids {
			loop {
				match wait::waitpid(pid, None) {
					Ok(status) => {
						processes.push(Process { pid, status });
						break;
					},
					Err(Errno::EINTR) => { interrupted = true; },
					Err(e) => {
						tracing::warn!(%pid, error = %e, "waitpid failed");
						break;
					},
				}
			}
		}
		let codes: Vec<_> = processes.iter().map(|p| p.status.code()).collect();
		tracing::debug!(?codes, interrupted, "reaped pipeline");
		Reaped { processes, interrupted }
	}
}
