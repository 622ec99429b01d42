//! Applying redirections to the shell's file descriptors.

use std::fs::OpenOptions;
use std::io::Write;
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};

use hush_parser::ast::{Redirect, RedirectKind, RedirectTarget};

use crate::expansion;
use crate::shell::Shell;
use crate::{error, sys, trace_categories};

/// Remembers what the descriptors touched by a set of redirections referred
/// to before, and puts them back when dropped.
#[derive(Default)]
pub(crate) struct SavedRedirects {
    saved: Vec<(RawFd, Option<OwnedFd>)>,
}

impl SavedRedirects {
    fn save(&mut self, fd: RawFd) -> Result<(), error::Error> {
        if self.saved.iter().any(|(saved_fd, _)| *saved_fd == fd) {
            return Ok(());
        }

        let copy = sys::fd::duplicate_above(fd, sys::fd::SAVED_FD_BASE)?;
        self.saved.push((fd, copy));
        Ok(())
    }
}

impl Drop for SavedRedirects {
    fn drop(&mut self) {
        // Anything a builtin buffered belongs to the redirected descriptor.
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();

        while let Some((fd, copy)) = self.saved.pop() {
            let result = match copy {
                Some(copy) => sys::fd::duplicate_onto(copy.as_raw_fd(), fd),
                None => {
                    sys::fd::close(fd);
                    Ok(())
                }
            };

            if let Err(e) = result {
                tracing::warn!(target: trace_categories::COMMANDS, "failed to restore fd {fd}: {e}");
            }
        }
    }
}

/// Applies redirections to the shell's own descriptors, in order. When `saved`
/// is given, the prior state of every affected descriptor is recorded there
/// first so the redirections can be undone; otherwise they are permanent.
pub(crate) fn apply_redirects(
    shell: &mut Shell,
    redirects: &[Redirect],
    mut saved: Option<&mut SavedRedirects>,
) -> Result<(), error::Error> {
    std::io::stdout().flush()?;

    for redirect in redirects {
        // Resolve the target before touching anything.
        let opened = match &redirect.target {
            RedirectTarget::Path(word) => {
                let mut fields = expansion::expand_word(shell, word)?;
                let path = match (fields.pop(), fields.is_empty()) {
                    (Some(path), true) => path,
                    _ => return Err(error::Error::AmbiguousRedirect),
                };
                Some(open_target(redirect.kind, &path)?)
            }
            RedirectTarget::Duplicate(_) | RedirectTarget::Close => None,
        };

        if let Some(saved) = saved.as_deref_mut() {
            saved.save(redirect.fd)?;
        }

        tracing::debug!(target: trace_categories::COMMANDS, "applying redirect: {redirect}");

        match (&redirect.target, opened) {
            (RedirectTarget::Duplicate(src), _) => sys::fd::duplicate_onto(*src, redirect.fd)?,
            (RedirectTarget::Close, _) => sys::fd::close(redirect.fd),
            (RedirectTarget::Path(_), Some(file)) => {
                if file.as_raw_fd() == redirect.fd {
                    // Already in place; the descriptor must stay open.
                    let _ = file.into_raw_fd();
                } else {
                    sys::fd::duplicate_onto(file.as_raw_fd(), redirect.fd)?;
                }
            }
            (RedirectTarget::Path(_), None) => (),
        }
    }

    Ok(())
}

fn open_target(kind: RedirectKind, path: &str) -> Result<OwnedFd, error::Error> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.mode(0o666);

    match kind {
        RedirectKind::Input => options.read(true),
        RedirectKind::Overwrite => options.write(true).create(true).truncate(true),
        RedirectKind::Append => options.append(true).create(true),
        RedirectKind::ReadWrite => options.read(true).write(true).create(true),
        RedirectKind::HereDocument => return Err(error::Error::HereDocumentsUnsupported),
    };

    match options.open(path) {
        Ok(file) => Ok(OwnedFd::from(file)),
        Err(e) => Err(error::Error::RedirectionFailure(
            path.to_owned(),
            nix::errno::Errno::from_raw(e.raw_os_error().unwrap_or_default()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use hush_parser::word::Word;
    use pretty_assertions::assert_eq;

    fn redirect(kind: RedirectKind, fd: RawFd, target: RedirectTarget) -> Redirect {
        Redirect { kind, fd, target }
    }

    #[test]
    fn temporary_redirects_are_restored() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.txt");

        // Descriptor 200 is otherwise unused by the test harness.
        {
            let mut saved = SavedRedirects::default();
            apply_redirects(
                &mut shell,
                &[redirect(
                    RedirectKind::Overwrite,
                    200,
                    RedirectTarget::Path(Word::from_text(path.to_string_lossy())),
                )],
                Some(&mut saved),
            )?;

            let mut file = std::fs::File::from(sys::fd::duplicate_above(200, 210)?.ok_or_else(|| anyhow::anyhow!("fd 200 not open"))?);
            file.write_all(b"hello\n")?;
        }

        assert!(sys::fd::duplicate_above(200, 210)?.is_none());
        assert_eq!(std::fs::read_to_string(&path)?, "hello\n");
        Ok(())
    }

    #[test]
    fn open_failures() -> Result<()> {
        assert!(matches!(
            open_target(RedirectKind::Input, "/nonexistent/file"),
            Err(error::Error::RedirectionFailure(_, nix::errno::Errno::ENOENT))
        ));
        assert!(matches!(
            open_target(RedirectKind::HereDocument, "EOF"),
            Err(error::Error::HereDocumentsUnsupported)
        ));
        Ok(())
    }

    #[test]
    fn ambiguous_target() -> Result<()> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        shell.env.set("TARGETS", "a b", false)?;

        let target = Word {
            pieces: vec![hush_parser::word::WordPiece::Variable {
                name: "TARGETS".into(),
                quoted: false,
            }],
            nonnull: false,
        };

        let result = apply_redirects(
            &mut shell,
            &[redirect(RedirectKind::Overwrite, 201, RedirectTarget::Path(target))],
            None,
        );
        assert!(matches!(result, Err(error::Error::AmbiguousRedirect)));
        Ok(())
    }
}
