//! File descriptor utilities.
//!
//! Redirections address descriptors by number, including descriptors that no
//! Rust object owns, so these helpers work on raw descriptors.

use std::os::fd::{FromRawFd, OwnedFd, RawFd};

use crate::error;

/// Lowest descriptor number used when the shell saves a descriptor for later.
pub(crate) const SAVED_FD_BASE: RawFd = 10;

/// Makes `dest` refer to the same open file description as `src`.
pub(crate) fn duplicate_onto(src: RawFd, dest: RawFd) -> Result<(), error::Error> {
    // SAFETY: dup2 only updates the process's descriptor table; an invalid
    // `src` is reported through errno.
    let result = unsafe { nix::libc::dup2(src, dest) };
    nix::errno::Errno::result(result).map_err(|_| error::Error::BadFileDescriptor(src))?;
    Ok(())
}

/// Closes the descriptor numbered `fd`, ignoring whether it was open.
pub(crate) fn close(fd: RawFd) {
    // SAFETY: the descriptor is addressed by number on behalf of the user's
    // redirection; closing an unopened descriptor just fails with EBADF.
    unsafe { nix::libc::close(fd) };
}

/// Duplicates `fd` onto a new close-on-exec descriptor numbered at least
/// `min`. Returns `None` if `fd` isn't open.
pub(crate) fn duplicate_above(fd: RawFd, min: RawFd) -> Result<Option<OwnedFd>, error::Error> {
    // SAFETY: F_DUPFD_CLOEXEC takes an integer argument and touches no memory.
    let result = unsafe { nix::libc::fcntl(fd, nix::libc::F_DUPFD_CLOEXEC, min) };

    match nix::errno::Errno::result(result) {
        Ok(new_fd) => {
            // SAFETY: `new_fd` was just created by fcntl and nothing else owns it.
            let owned = unsafe { OwnedFd::from_raw_fd(new_fd) };
            Ok(Some(owned))
        }
        Err(nix::errno::Errno::EBADF) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::os::fd::AsRawFd;

    #[test]
    fn duplicate_above_respects_minimum() -> Result<()> {
        let file = tempfile::tempfile()?;

        let dup = duplicate_above(file.as_raw_fd(), 100)?
            .ok_or_else(|| anyhow::anyhow!("descriptor not open"))?;
        assert!(dup.as_raw_fd() >= 100);
        Ok(())
    }

    #[test]
    fn duplicate_above_reports_closed_descriptor() -> Result<()> {
        assert!(duplicate_above(987, SAVED_FD_BASE)?.is_none());
        Ok(())
    }
}
