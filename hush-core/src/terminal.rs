use std::os::fd::{AsRawFd, OwnedFd};

use crate::{error, sys, trace_categories};

/// Lowest descriptor the shell keeps its terminal handle at, out of the way of
/// descriptors used by redirections.
const TERMINAL_FD_MIN: i32 = 255;

/// Encapsulates the state of a controlled terminal.
///
/// While held, the shell leads its own process group and owns the terminal's
/// foreground; dropping it hands the terminal back to whoever owned it before.
#[expect(clippy::module_name_repetitions)]
pub struct TerminalControl {
    tty: OwnedFd,
    shell_pgrp: sys::process::ProcessId,
    prev_fg_pgrp: Option<sys::process::ProcessId>,
}

impl TerminalControl {
    /// Acquire the terminal on standard input for the shell. Blocks (stopped)
    /// until the shell is started in the foreground.
    pub fn acquire() -> Result<Self, error::Error> {
        let tty = sys::fd::duplicate_above(0, TERMINAL_FD_MIN)?
            .ok_or(error::Error::NotInteractive)?;

        loop {
            let our_pgrp = sys::process::current_process_group();
            if sys::terminal::get_foreground_pgrp(&tty)? == our_pgrp {
                break;
            }
            tracing::debug!(target: trace_categories::TERMINAL, "waiting to be foregrounded");
            sys::signal::wait_to_be_foregrounded(our_pgrp)?;
        }

        let prev_fg_pgrp = sys::process::current_process_group();

        sys::signal::ignore_interactive_signals()?;
        sys::signal::install_fatal_handlers(tty.as_raw_fd(), prev_fg_pgrp)?;

        // Fails harmlessly when we already lead our group (e.g. as a session leader).
        if let Err(e) = sys::signal::lead_new_process_group() {
            tracing::debug!(target: trace_categories::TERMINAL, "couldn't lead new process group: {e}");
        }

        let shell_pgrp = sys::process::current_process_group();
        sys::terminal::move_to_foreground(&tty, shell_pgrp)?;

        tracing::debug!(
            target: trace_categories::TERMINAL,
            "acquired terminal for pgrp {shell_pgrp} (previous owner: {prev_fg_pgrp})"
        );

        Ok(Self {
            tty,
            shell_pgrp,
            prev_fg_pgrp: Some(prev_fg_pgrp),
        })
    }

    /// Makes `pgrp` the terminal's foreground process group.
    pub(crate) fn give_to(&self, pgrp: sys::process::ProcessId) -> Result<(), error::Error> {
        sys::terminal::move_to_foreground(&self.tty, pgrp)
    }

    /// Makes the shell's process group the terminal's foreground again.
    pub(crate) fn reclaim(&self) -> Result<(), error::Error> {
        sys::terminal::move_to_foreground(&self.tty, self.shell_pgrp)
    }

    /// Gives up control without restoring the previous owner; used by forked
    /// children, which must not hand the terminal away on their way out.
    pub(crate) fn disown(mut self) {
        self.prev_fg_pgrp = None;
    }

    fn try_release(&mut self) {
        // Restore the previous foreground process group.
        if let Some(pgrp) = self.prev_fg_pgrp {
            if sys::terminal::move_to_foreground(&self.tty, pgrp).is_ok() {
                self.prev_fg_pgrp = None;
            }
        }
    }
}

impl Drop for TerminalControl {
    fn drop(&mut self) {
        self.try_release();
    }
}
