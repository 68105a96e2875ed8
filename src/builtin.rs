use std::env;
use std::ffi::{CString, OsStr};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use nix::unistd::{self, User};

use crate::error::ShellError;
use crate::global;

pub type Builtin = fn(&mut global::State, &[CString]) -> Result<(), ShellError>;

/// Moves the process into `target` and returns where it landed. Relative
/// targets start from `cwd`; when `cwd` itself has been removed the process
/// directory still stands for it, so `..` keeps working.
fn enter(cwd: &Path, target: &Path) -> nix::Result<PathBuf> {
	if target.is_relative() {
		let _ = unistd::chdir(cwd);
	}
	unistd::chdir(target)?;
	Ok(unistd::getcwd().unwrap_or_else(|_| cwd.join(target)))
}

fn home_dir() -> Result<PathBuf, ShellError> {
	if let Some(home) = env::var_os("HOME").filter(|h| !h.is_empty()) {
		return Ok(PathBuf::from(home));
	}
	match User::from_uid(unistd::getuid()) {
		Ok(Some(user)) => Ok(user.dir),
		_ => Err(ShellError::NoHome),
	}
}

pub fn builtin_cd(state: &mut global::State, args: &[CString]) -> Result<(), ShellError> {
	match args {
		[] => {
			let home = home_dir()?;
			state.cwd = enter(&state.cwd, &home).map_err(|source| ShellError::Home { path: home, source })?;
		},
		[dir] => {
			let dir = Path::new(OsStr::from_bytes(dir.as_bytes()));
			match enter(&state.cwd, dir) {
				Ok(cwd) => state.cwd = cwd,
				Err(e) => { let _ = writeln!(&mut io::stderr(), "{}: {}", dir.display(), e.desc()); },
			}
		},
		_ => { let _ = writeln!(&mut io::stderr(), "usage: cd <directory>"); },
	}
	tracing::debug!(cwd = %state.cwd.display(), "cd");
	Ok(())
}

pub fn match_builtin(name: &[u8]) -> Option<Builtin> {
	match name {
		b"cd" => Some(builtin_cd),
		_ => None,
	}
}
