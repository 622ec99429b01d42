use std::os::fd::RawFd;
use std::sync::atomic::{AtomicI32, Ordering};

use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::{error, sys};

const JOB_CONTROL_SIGNALS: [Signal; 3] = [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU];

const MISC_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTERM];

const FATAL_SIGNALS: [Signal; 9] = [
    Signal::SIGILL,
    Signal::SIGTRAP,
    Signal::SIGABRT,
    Signal::SIGFPE,
    Signal::SIGBUS,
    Signal::SIGSEGV,
    Signal::SIGHUP,
    Signal::SIGPIPE,
    Signal::SIGALRM,
];

// Read from the fatal signal handler, so kept outside the shell session.
static TERMINAL_FD: AtomicI32 = AtomicI32::new(-1);
static SAVED_FOREGROUND_PGRP: AtomicI32 = AtomicI32::new(-1);

fn set_handler(signal: Signal, handler: SigHandler, flags: SaFlags) -> Result<(), error::Error> {
    let action = SigAction::new(handler, flags, SigSet::empty());

    // SAFETY: the only custom handler installed through here is
    // `restore_terminal_and_reraise`, which is async-signal-safe.
    unsafe { nix::sys::signal::sigaction(signal, &action) }?;

    Ok(())
}

/// Ignores the job-control and keyboard signals, as an interactive shell must.
pub(crate) fn ignore_interactive_signals() -> Result<(), error::Error> {
    for signal in JOB_CONTROL_SIGNALS.into_iter().chain(MISC_SIGNALS) {
        set_handler(signal, SigHandler::SigIgn, SaFlags::empty())?;
    }
    Ok(())
}

/// Restores default dispositions for every signal the shell handles; used in
/// forked children before they run a command.
pub(crate) fn restore_default_signals() -> Result<(), error::Error> {
    for signal in JOB_CONTROL_SIGNALS
        .into_iter()
        .chain(MISC_SIGNALS)
        .chain(FATAL_SIGNALS)
        .chain([Signal::SIGCHLD])
    {
        set_handler(signal, SigHandler::SigDfl, SaFlags::empty())?;
    }
    Ok(())
}

/// Installs handlers for fatal signals that hand the terminal back to
/// `saved_pgrp` before letting the signal terminate the shell.
pub(crate) fn install_fatal_handlers(
    terminal_fd: RawFd,
    saved_pgrp: sys::process::ProcessId,
) -> Result<(), error::Error> {
    TERMINAL_FD.store(terminal_fd, Ordering::SeqCst);
    SAVED_FOREGROUND_PGRP.store(saved_pgrp.as_raw(), Ordering::SeqCst);

    for signal in FATAL_SIGNALS {
        set_handler(
            signal,
            SigHandler::Handler(restore_terminal_and_reraise),
            SaFlags::SA_RESETHAND | SaFlags::SA_NODEFER,
        )?;
    }
    Ok(())
}

extern "C" fn restore_terminal_and_reraise(signal: nix::libc::c_int) {
    let fd = TERMINAL_FD.load(Ordering::SeqCst);
    let pgrp = SAVED_FOREGROUND_PGRP.load(Ordering::SeqCst);

    if fd >= 0 && pgrp > 0 {
        // SAFETY: tcsetpgrp is async-signal-safe and takes plain integers.
        unsafe { nix::libc::tcsetpgrp(fd, pgrp) };
    }

    // SAFETY: raise is async-signal-safe. SA_RESETHAND restored the default
    // disposition on entry, so this terminates the shell with `signal`.
    unsafe { nix::libc::raise(signal) };
}

pub(crate) fn continue_process_group(pgid: sys::process::ProcessId) -> Result<(), error::Error> {
    nix::sys::signal::killpg(pgid, Signal::SIGCONT)?;
    Ok(())
}

/// Stops our process group until the terminal's owner resumes it in the
/// foreground.
pub(crate) fn wait_to_be_foregrounded(
    pgid: sys::process::ProcessId,
) -> Result<(), error::Error> {
    nix::sys::signal::killpg(pgid, Signal::SIGTTIN)?;
    Ok(())
}

pub(crate) fn lead_new_process_group() -> Result<(), error::Error> {
    nix::unistd::setpgid(nix::unistd::Pid::from_raw(0), nix::unistd::Pid::from_raw(0))?;
    Ok(())
}

/// Moves `pid` (0 meaning the caller) into process group `pgid` (0 meaning a
/// new group led by `pid`).
pub(crate) fn join_process_group(
    pid: sys::process::ProcessId,
    pgid: sys::process::ProcessId,
) -> Result<(), error::Error> {
    nix::unistd::setpgid(pid, pgid)?;
    Ok(())
}
