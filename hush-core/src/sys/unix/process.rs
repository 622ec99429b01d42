//! Process creation, replacement and reaping.

use std::ffi::CString;
use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error;

/// A process ID.
pub(crate) type ProcessId = nix::unistd::Pid;

/// Which side of a fork the caller is on.
pub(crate) enum Forked {
    /// The original process; holds the new child's pid.
    Parent(ProcessId),
    /// The new child process.
    Child,
}

/// A state change of a child process, as reported by `waitpid`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChildEvent {
    /// The child exited or was killed; killed children report 128 plus the
    /// signal number.
    Exited { pid: ProcessId, status: u8 },
    /// The child was stopped by a signal.
    Stopped {
        pid: ProcessId,
        signal: nix::sys::signal::Signal,
    },
}

impl ChildEvent {
    pub(crate) const fn pid(&self) -> ProcessId {
        match self {
            Self::Exited { pid, .. } | Self::Stopped { pid, .. } => *pid,
        }
    }
}

pub(crate) fn current_pid() -> ProcessId {
    nix::unistd::getpid()
}

pub(crate) fn current_process_group() -> ProcessId {
    nix::unistd::getpgrp()
}

/// Returns the exit status conventionally reported for a process terminated
/// or stopped by `signal`.
pub(crate) fn status_for_signal(signal: nix::sys::signal::Signal) -> u8 {
    128u8.saturating_add(u8::try_from(signal as i32).unwrap_or_default())
}

/// Forks the shell. Buffered standard output is flushed first so that it
/// isn't written twice.
pub(crate) fn fork() -> Result<Forked, error::Error> {
    std::io::stdout().flush()?;

    // SAFETY: the shell is single-threaded, so the child can safely keep
    // running arbitrary code rather than only async-signal-safe functions.
    match unsafe { nix::unistd::fork() }? {
        nix::unistd::ForkResult::Parent { child } => Ok(Forked::Parent(child)),
        nix::unistd::ForkResult::Child => Ok(Forked::Child),
    }
}

/// Terminates a forked child with the given status, without running any of
/// the destructors it inherited from the shell.
pub(crate) fn exit_child(status: u8) -> ! {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    std::process::exit(i32::from(status))
}

/// Replaces the current process image. Only returns on failure.
pub(crate) fn exec(path: &Path, args: &[String], env: &[String]) -> error::Error {
    let convert = || -> Result<(CString, Vec<CString>, Vec<CString>), error::Error> {
        let path = CString::new(path.as_os_str().as_bytes())?;
        let args = args
            .iter()
            .map(|arg| CString::new(arg.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        let env = env
            .iter()
            .map(|entry| CString::new(entry.as_bytes()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((path, args, env))
    };

    match convert() {
        Ok((path, args, env)) => match nix::unistd::execve(&path, &args, &env) {
            Ok(never) => match never {},
            Err(errno) => errno.into(),
        },
        Err(e) => e,
    }
}

/// Waits for any child to change state. Returns `None` when there are no
/// children left, or, if `block` is false, when no child has changed state.
pub(crate) fn wait_any(block: bool) -> Result<Option<ChildEvent>, error::Error> {
    use nix::sys::wait::{WaitPidFlag, WaitStatus};

    let mut flags = WaitPidFlag::WUNTRACED;
    if !block {
        flags |= WaitPidFlag::WNOHANG;
    }

    loop {
        match nix::sys::wait::waitpid(nix::unistd::Pid::from_raw(-1), Some(flags)) {
            Ok(WaitStatus::Exited(pid, code)) => {
                let status = u8::try_from(code & 0xff).unwrap_or(u8::MAX);
                return Ok(Some(ChildEvent::Exited { pid, status }));
            }
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                return Ok(Some(ChildEvent::Exited {
                    pid,
                    status: status_for_signal(signal),
                }));
            }
            Ok(WaitStatus::Stopped(pid, signal)) => {
                return Ok(Some(ChildEvent::Stopped { pid, signal }));
            }
            Ok(WaitStatus::StillAlive) | Err(nix::errno::Errno::ECHILD) => return Ok(None),
            Ok(_) | Err(nix::errno::Errno::EINTR) => (),
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signal_statuses() {
        assert_eq!(status_for_signal(nix::sys::signal::SIGKILL), 137);
        assert_eq!(status_for_signal(nix::sys::signal::SIGINT), 130);
    }
}
