use std::fmt::Display;

use crate::sys::process::{ChildEvent, ProcessId};
use crate::{error, sys, trace_categories};

/// Manages the jobs that are currently managed by the shell.
#[derive(Default)]
pub struct JobManager {
    /// The jobs that are currently managed by the shell, oldest first.
    pub jobs: Vec<Job>,
}

impl JobManager {
    /// Returns a new job manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job to the job manager, assigning it an id one greater than the
    /// largest id in use; returns an immutable reference to the job.
    ///
    /// # Arguments
    ///
    /// * `job` - The job to add.
    pub fn add(&mut self, mut job: Job) -> &Job {
        job.id = self.jobs.iter().map(|j| j.id).max().unwrap_or_default() + 1;
        self.jobs.push(job);
        &self.jobs[self.jobs.len() - 1]
    }

    /// Returns the index of the current job (the most recently added one).
    pub fn current_job_index(&self) -> Option<usize> {
        self.jobs.len().checked_sub(1)
    }

    /// Tries to resolve the given job specification (`%N`) to the index of a
    /// job.
    ///
    /// # Arguments
    ///
    /// * `job_spec` - The job specification to resolve.
    pub fn resolve_job_spec(&self, job_spec: &str) -> Result<usize, error::Error> {
        let id: usize = job_spec
            .strip_prefix('%')
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| error::Error::BadJobSpec(job_spec.to_owned()))?;

        self.jobs
            .iter()
            .position(|j| j.id == id)
            .ok_or(error::Error::NoSuchJob(id))
    }

    /// Removes the job at the given index.
    pub fn remove(&mut self, index: usize) -> Job {
        self.jobs.remove(index)
    }

    /// Reaps children that have already changed state, without blocking.
    /// Returns the background jobs that finished, which are no longer tracked.
    pub(crate) fn poll(&mut self) -> Result<Vec<Job>, error::Error> {
        let mut finished = vec![];
        while let Some(event) = sys::process::wait_any(false)? {
            self.dispatch(None, event, &mut finished);
        }
        Ok(finished)
    }

    /// Blocks until every process of `foreground` has exited or stopped.
    /// State changes of background jobs seen meanwhile are recorded as well;
    /// the ones that finished are returned.
    pub(crate) fn wait_for_foreground(
        &mut self,
        foreground: &mut Job,
    ) -> Result<Vec<Job>, error::Error> {
        let mut finished = vec![];
        while foreground.state() == JobState::Running {
            match sys::process::wait_any(true)? {
                Some(event) => self.dispatch(Some(&mut *foreground), event, &mut finished),
                None => {
                    tracing::debug!(target: trace_categories::JOBS, "no children left to wait for");
                    break;
                }
            }
        }
        Ok(finished)
    }

    fn dispatch(&mut self, foreground: Option<&mut Job>, event: ChildEvent, finished: &mut Vec<Job>) {
        if let Some(job) = foreground {
            if job.record(event) {
                return;
            }
        }

        if let Some(index) = self.jobs.iter_mut().position(|j| j.record(event)) {
            if self.jobs[index].state() == JobState::Done {
                finished.push(self.jobs.remove(index));
            }
        } else {
            // Children the shell doesn't track (as when running as init) are
            // simply absorbed.
            tracing::debug!(
                target: trace_categories::JOBS,
                "reaped untracked child {}",
                event.pid()
            );
        }
    }
}

/// The state of one process in a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProcessState {
    Running,
    Stopped(nix::sys::signal::Signal),
    Exited(u8),
}

/// Represents the current execution state of a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum JobState {
    /// At least one of the job's processes is still running.
    Running,
    /// None of the job's processes are running, and at least one is stopped.
    Stopped,
    /// All of the job's processes have exited.
    Done,
}

/// Encapsulates a set of processes managed by the shell as a single unit.
#[derive(Clone, Debug)]
pub struct Job {
    /// The id of the job; assigned when the job is added to a [`JobManager`].
    pub id: usize,
    pgid: ProcessId,
    processes: Vec<(ProcessId, ProcessState)>,
    command_line: String,
}

impl Job {
    /// Returns a new job for the given processes, in pipeline order. All of
    /// them belong to the process group `pgid`.
    pub(crate) fn new(pgid: ProcessId, pids: Vec<ProcessId>, command_line: String) -> Self {
        Self {
            id: 0,
            pgid,
            processes: pids
                .into_iter()
                .map(|pid| (pid, ProcessState::Running))
                .collect(),
            command_line,
        }
    }

    /// Returns the job's process group.
    pub const fn process_group(&self) -> ProcessId {
        self.pgid
    }

    /// Returns the command line used to display the job.
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Returns the job's current state.
    pub fn state(&self) -> JobState {
        let states = || self.processes.iter().map(|(_, state)| state);

        if states().any(|s| *s == ProcessState::Running) {
            JobState::Running
        } else if states().any(|s| matches!(s, ProcessState::Stopped(_))) {
            JobState::Stopped
        } else {
            JobState::Done
        }
    }

    /// Returns the status of the job: the exit status of its last process, or
    /// 128 plus the stopping signal if it is stopped.
    pub fn status(&self) -> u8 {
        match self.processes.last() {
            Some((_, ProcessState::Exited(status))) => *status,
            Some((_, ProcessState::Stopped(signal))) => sys::process::status_for_signal(*signal),
            Some((_, ProcessState::Running)) | None => 0,
        }
    }

    /// Applies a child state change, returning whether the child belongs to
    /// this job.
    fn record(&mut self, event: ChildEvent) -> bool {
        let Some((_, state)) = self.processes.iter_mut().find(|(pid, _)| *pid == event.pid())
        else {
            return false;
        };

        *state = match event {
            ChildEvent::Exited { status, .. } => ProcessState::Exited(status),
            ChildEvent::Stopped { signal, .. } => ProcessState::Stopped(signal),
        };

        tracing::debug!(
            target: trace_categories::JOBS,
            "job {}: process {} is now {state:?}",
            self.id,
            event.pid()
        );

        true
    }

    /// Sends SIGCONT to the job's process group and marks its stopped
    /// processes as running.
    pub(crate) fn resume(&mut self) -> Result<(), error::Error> {
        sys::signal::continue_process_group(self.pgid)?;

        for (_, state) in &mut self.processes {
            if matches!(state, ProcessState::Stopped(_)) {
                *state = ProcessState::Running;
            }
        }

        Ok(())
    }

    /// Returns the `[id] pid command` line announcing a newly tracked job.
    pub fn to_pid_style_string(&self) -> String {
        format!("[{}] {} {}", self.id, self.pgid, self.command_line)
    }
}

impl Display for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state().to_string();
        write!(f, "[{}] {:<22} {:.40}", self.id, state, self.command_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn pid(raw: i32) -> ProcessId {
        ProcessId::from_raw(raw)
    }

    fn job(pids: &[i32]) -> Job {
        Job::new(
            pid(pids[0]),
            pids.iter().copied().map(pid).collect(),
            "sleep 10".into(),
        )
    }

    #[test]
    fn ids_are_one_past_the_largest() -> Result<()> {
        let mut manager = JobManager::new();
        assert_eq!(manager.add(job(&[100])).id, 1);
        assert_eq!(manager.add(job(&[200])).id, 2);
        assert_eq!(manager.add(job(&[300])).id, 3);

        manager.remove(1);
        assert_eq!(manager.add(job(&[400])).id, 4);

        manager.remove(2);
        manager.remove(1);
        assert_eq!(manager.add(job(&[500])).id, 2);
        Ok(())
    }

    #[test]
    fn job_spec_resolution() -> Result<()> {
        let mut manager = JobManager::new();
        manager.add(job(&[100]));
        manager.add(job(&[200]));

        assert_eq!(manager.resolve_job_spec("%2")?, 1);
        assert!(matches!(
            manager.resolve_job_spec("%7"),
            Err(error::Error::NoSuchJob(7))
        ));
        assert!(matches!(
            manager.resolve_job_spec("2"),
            Err(error::Error::BadJobSpec(_))
        ));
        assert!(matches!(
            manager.resolve_job_spec("%x"),
            Err(error::Error::BadJobSpec(_))
        ));
        assert_eq!(manager.current_job_index(), Some(1));
        Ok(())
    }

    #[test]
    fn state_follows_processes() -> Result<()> {
        let mut job = job(&[10, 11]);
        assert_eq!(job.state(), JobState::Running);

        assert!(job.record(ChildEvent::Stopped {
            pid: pid(10),
            signal: nix::sys::signal::SIGTSTP,
        }));
        assert_eq!(job.state(), JobState::Running);

        assert!(job.record(ChildEvent::Stopped {
            pid: pid(11),
            signal: nix::sys::signal::SIGTSTP,
        }));
        assert_eq!(job.state(), JobState::Stopped);
        assert_eq!(job.status(), 148);

        assert!(job.record(ChildEvent::Exited {
            pid: pid(10),
            status: 0,
        }));
        assert!(job.record(ChildEvent::Exited {
            pid: pid(11),
            status: 3,
        }));
        assert_eq!(job.state(), JobState::Done);
        assert_eq!(job.status(), 3);

        assert!(!job.record(ChildEvent::Exited {
            pid: pid(12),
            status: 0,
        }));
        Ok(())
    }

    #[test]
    fn finished_background_jobs_are_removed() -> Result<()> {
        let mut manager = JobManager::new();
        manager.add(job(&[10]));

        let mut finished = vec![];
        manager.dispatch(
            None,
            ChildEvent::Exited {
                pid: pid(99),
                status: 0,
            },
            &mut finished,
        );
        assert!(finished.is_empty());
        assert_eq!(manager.jobs.len(), 1);

        manager.dispatch(
            None,
            ChildEvent::Exited {
                pid: pid(10),
                status: 0,
            },
            &mut finished,
        );
        assert_eq!(finished.len(), 1);
        assert!(manager.jobs.is_empty());
        Ok(())
    }

    // The only test in this crate that forks: waiting on any child would
    // otherwise reap processes belonging to other tests.
    #[test]
    fn foreground_job_stops_and_resumes() -> Result<()> {
        let child_pid = match sys::process::fork()? {
            sys::process::Forked::Parent(child_pid) => child_pid,
            sys::process::Forked::Child => {
                let _ = nix::unistd::setpgid(pid(0), pid(0));
                loop {
                    nix::unistd::pause();
                }
            }
        };
        let _ = nix::unistd::setpgid(child_pid, child_pid);

        let mut manager = JobManager::new();
        let mut foreground = Job::new(child_pid, vec![child_pid], "pause".into());

        nix::sys::signal::kill(child_pid, nix::sys::signal::SIGSTOP)?;
        let finished = manager.wait_for_foreground(&mut foreground)?;
        assert!(finished.is_empty());
        assert_eq!(foreground.state(), JobState::Stopped);
        assert_eq!(
            foreground.status(),
            sys::process::status_for_signal(nix::sys::signal::SIGSTOP)
        );

        foreground.resume()?;
        assert_eq!(foreground.state(), JobState::Running);

        nix::sys::signal::kill(child_pid, nix::sys::signal::SIGTERM)?;
        manager.wait_for_foreground(&mut foreground)?;
        assert_eq!(foreground.state(), JobState::Done);
        assert_eq!(
            foreground.status(),
            sys::process::status_for_signal(nix::sys::signal::SIGTERM)
        );
        Ok(())
    }

    #[test]
    fn status_line_format() -> Result<()> {
        let mut manager = JobManager::new();
        let job = manager.add(Job::new(
            pid(42),
            vec![pid(42)],
            "a very long command line that will be cut off at forty characters".into(),
        ));

        assert_eq!(
            job.to_string(),
            "[1] Running                a very long command line that will be cu"
        );
        assert_eq!(
            job.to_pid_style_string(),
            "[1] 42 a very long command line that will be cut off at forty characters"
        );
        Ok(())
    }
}
