use std::os::fd::AsFd;

use crate::{error, sys};

pub(crate) fn get_foreground_pgrp<Fd: AsFd>(
    fd: Fd,
) -> Result<sys::process::ProcessId, error::Error> {
    Ok(nix::unistd::tcgetpgrp(fd)?)
}

pub(crate) fn move_to_foreground<Fd: AsFd>(
    fd: Fd,
    pgrp: sys::process::ProcessId,
) -> Result<(), error::Error> {
    nix::unistd::tcsetpgrp(fd, pgrp)?;
    Ok(())
}
