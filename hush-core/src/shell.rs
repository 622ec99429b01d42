use std::borrow::Cow;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use hush_parser::ast::CommandList;
use hush_parser::{InputStream, LineReader, ParseError, Parser};
use indexmap::IndexMap;

use crate::env::ShellEnvironment;
use crate::interp;
use crate::jobs::{Job, JobManager, JobState};
use crate::sys::process::ProcessId;
use crate::terminal::TerminalControl;
use crate::{builtins, error, trace_categories};

/// Profile sourced by login shells unless another is configured.
const DEFAULT_PROFILE_PATH: &str = "/etc/profile";

/// Options for creating a new shell.
#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    /// Whether the shell is interactive: it prompts, announces jobs, and owns
    /// the terminal for job control when standard input is one.
    pub interactive: bool,
    /// Parse commands without executing them.
    pub do_not_execute_commands: bool,
    /// Whether the shell is a login shell.
    pub login: bool,
    /// Profile to source when the shell is a login shell; defaults to
    /// `/etc/profile`.
    pub profile_path: Option<PathBuf>,
    /// Whether to skip inheriting environment variables from the calling process.
    pub do_not_inherit_env: bool,
    /// The name of the shell (`$0`).
    pub shell_name: Option<String>,
    /// The initial positional parameters (`$1` onwards).
    pub positional_parameters: Vec<String>,
}

/// Represents an instance of a shell.
pub struct Shell {
    /// The shell's variables.
    pub env: ShellEnvironment,

    /// Positional parameters stack ($1 and beyond).
    pub positional_parameters: Vec<String>,

    /// Shell name ($0).
    pub shell_name: Option<String>,

    /// The status of the last completed pipe ($?).
    pub last_exit_status: u8,

    /// The jobs the shell is tracking.
    pub jobs: JobManager,

    pub(crate) last_bg_pid: Option<ProcessId>,

    builtins: IndexMap<&'static str, builtins::Registration>,
    terminal: Option<TerminalControl>,
    interactive: bool,
    do_not_execute_commands: bool,
    exit_requested: bool,
    pid: ProcessId,
}

impl Shell {
    /// Returns a new shell instance created with the given options.
    ///
    /// # Arguments
    ///
    /// * `options` - The options to use when creating the shell.
    pub fn new(options: CreateOptions) -> Result<Self, error::Error> {
        let mut env = ShellEnvironment::new();
        if !options.do_not_inherit_env {
            env.import(std::env::vars_os().map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            }));
        }

        let terminal = if options.interactive && std::io::IsTerminal::is_terminal(&std::io::stdin()) {
            match TerminalControl::acquire() {
                Ok(terminal) => Some(terminal),
                Err(e) => {
                    tracing::warn!("job control is disabled: {e}");
                    None
                }
            }
        } else {
            None
        };

        let mut shell = Self {
            env,
            positional_parameters: options.positional_parameters,
            shell_name: options.shell_name,
            last_exit_status: 0,
            jobs: JobManager::new(),
            last_bg_pid: None,
            builtins: builtins::get_default_builtins(),
            terminal,
            interactive: options.interactive,
            do_not_execute_commands: options.do_not_execute_commands,
            exit_requested: false,
            pid: crate::sys::process::current_pid(),
        };

        if options.login {
            let profile = options
                .profile_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROFILE_PATH));
            if profile.exists() {
                tracing::debug!("sourcing login profile {}", profile.display());
                shell.source_file(&profile)?;
            }
        }

        Ok(shell)
    }

    /// Returns whether the shell is interactive.
    pub const fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Returns whether the shell owns a terminal and can control jobs.
    pub const fn job_control_enabled(&self) -> bool {
        self.terminal.is_some()
    }

    pub(crate) const fn terminal(&self) -> Option<&TerminalControl> {
        self.terminal.as_ref()
    }

    /// Returns the process id of the shell ($$).
    pub const fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Returns whether a command (such as `exit`) asked the shell to exit.
    pub const fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub(crate) const fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Returns the current IFS value, or the default one if IFS isn't set.
    pub fn ifs(&self) -> Cow<'_, str> {
        self.env
            .get_str("IFS")
            .map_or(Cow::Borrowed(hush_parser::charclass::DEFAULT_IFS), Cow::Borrowed)
    }

    /// Returns positional parameter `index`; index 0 is the shell name.
    pub fn positional_parameter(&self, index: usize) -> Option<&str> {
        match index.checked_sub(1) {
            None => self.shell_name.as_deref(),
            Some(i) => self.positional_parameters.get(i).map(String::as_str),
        }
    }

    /// Returns the shell's builtins, in registration order.
    pub fn builtins(&self) -> impl Iterator<Item = (&'static str, &builtins::Registration)> {
        self.builtins.iter().map(|(name, reg)| (*name, reg))
    }

    pub(crate) fn builtin(&self, name: &str) -> Option<builtins::Registration> {
        self.builtins.get(name).copied()
    }

    /// Returns the shell's current working directory.
    pub fn working_dir(&self) -> Result<PathBuf, error::Error> {
        Ok(std::env::current_dir()?)
    }

    /// Updates the shell's current working directory.
    ///
    /// # Arguments
    ///
    /// * `target_dir` - The path to set as the working directory.
    pub fn set_working_dir(&mut self, target_dir: impl AsRef<Path>) -> std::io::Result<()> {
        std::env::set_current_dir(target_dir)
    }

    //
    // Running commands
    //

    /// Parses and executes the given string, returning the status of the last
    /// pipe run.
    ///
    /// # Arguments
    ///
    /// * `command` - The command text to run.
    pub fn run_string(&mut self, command: &str) -> Result<u8, error::Error> {
        self.run_stream(InputStream::from_string(command))
    }

    /// Executes the script at the given path.
    ///
    /// # Arguments
    ///
    /// * `script_path` - The path to the script file to execute.
    pub fn run_script(&mut self, script_path: &Path) -> Result<u8, error::Error> {
        let file = std::fs::File::open(script_path)?;
        self.run_stream(InputStream::from_reader(BufReader::new(file)))
    }

    /// Executes commands read from standard input, without prompting.
    pub fn run_stdin(&mut self) -> Result<u8, error::Error> {
        let stdin = std::io::stdin();
        self.run_stream(InputStream::from_reader(stdin.lock()))
    }

    /// Executes commands read interactively from the given reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - Source of input lines; it displays the prompts.
    pub fn run_interactive(&mut self, reader: impl LineReader) -> Result<u8, error::Error> {
        self.run_stream(InputStream::interactive(reader))
    }

    /// Runs the commands in the given file in the current shell (`.`).
    pub(crate) fn source_file(&mut self, path: &Path) -> Result<u8, error::Error> {
        let file = std::fs::File::open(path)
            .map_err(|_| error::Error::FailedSourcingFile(path.to_owned()))?;
        self.run_stream(InputStream::from_reader(BufReader::new(file)))
    }

    fn run_stream(&mut self, input: InputStream<'_>) -> Result<u8, error::Error> {
        let mut parser = Parser::new(input);
        let mut status = 0;

        while !self.exit_requested {
            parser.set_ifs(self.env.get_str("IFS"));

            match parser.parse_statement() {
                Ok(None) => break,
                Ok(Some(list)) => status = self.run_parsed(&list),
                Err(ParseError::ReadError(e)) => return Err(e.into()),
                Err(e) => {
                    status = self.report_error(&error::Error::from(e));
                    self.last_exit_status = status;
                }
            }

            self.reap_background_jobs();
        }

        Ok(status)
    }

    fn run_parsed(&mut self, list: &CommandList) -> u8 {
        if list.is_empty() || self.do_not_execute_commands {
            return self.last_exit_status;
        }

        tracing::debug!(target: trace_categories::COMMANDS, "running: {list}");

        match interp::run_list(self, list) {
            Ok(status) => status,
            Err(e) => {
                // Only unrecoverable failures make it this far.
                let status = self.report_error(&e);
                self.last_exit_status = status;
                self.request_exit();
                status
            }
        }
    }

    /// Writes a diagnostic for `error` to stderr, returning the exit status
    /// it implies.
    pub(crate) fn report_error(&self, error: &error::Error) -> u8 {
        let _ = writeln!(std::io::stderr(), "hush: {error}");
        error.exit_status()
    }

    /// Prepares a forked child to run part of the shell's work: it gives up
    /// job control and forgets the parent's jobs.
    pub(crate) fn enter_subshell(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            terminal.disown();
        }
        self.jobs = JobManager::new();
    }

    //
    // Jobs
    //

    /// Tracks a new background job, announcing it when interactive.
    pub(crate) fn add_background_job(&mut self, job: Job) {
        self.last_bg_pid = Some(job.process_group());

        let interactive = self.interactive;
        let job = self.jobs.add(job);
        if interactive {
            let _ = writeln!(std::io::stdout(), "{}", job.to_pid_style_string());
        }
    }

    /// Waits for a job running in the foreground to finish or stop, handing
    /// it the terminal meanwhile. A stopped job is tracked from then on.
    pub(crate) fn wait_for_foreground(&mut self, mut job: Job) -> Result<u8, error::Error> {
        if let Some(terminal) = &self.terminal {
            if let Err(e) = terminal.give_to(job.process_group()) {
                tracing::debug!(target: trace_categories::JOBS, "couldn't foreground job: {e}");
            }
        }

        let result = self.jobs.wait_for_foreground(&mut job);

        if let Some(terminal) = &self.terminal {
            if let Err(e) = terminal.reclaim() {
                tracing::warn!(target: trace_categories::TERMINAL, "couldn't reclaim terminal: {e}");
            }
        }

        self.report_finished_jobs(result?);

        let status = job.status();
        if job.state() == JobState::Stopped {
            let interactive = self.interactive;
            let job = self.jobs.add(job);
            if interactive {
                let _ = writeln!(std::io::stdout(), "{job}");
            }
        }

        Ok(status)
    }

    /// Waits for a single child that isn't part of any job.
    pub(crate) fn wait_for_child(&mut self, pid: ProcessId) -> Result<u8, error::Error> {
        let mut job = Job::new(pid, vec![pid], String::new());
        let finished = self.jobs.wait_for_foreground(&mut job)?;
        self.report_finished_jobs(finished);
        Ok(job.status())
    }

    /// Reaps any background jobs that finished, without blocking.
    pub(crate) fn reap_background_jobs(&mut self) {
        match self.jobs.poll() {
            Ok(finished) => self.report_finished_jobs(finished),
            Err(e) => tracing::debug!(target: trace_categories::JOBS, "failed to poll jobs: {e}"),
        }
    }

    fn report_finished_jobs(&self, finished: Vec<Job>) {
        if self.interactive {
            for job in finished {
                let _ = writeln!(std::io::stdout(), "{job}");
            }
        }
    }

    /// Resolves an optional `%N` job spec to the index of a tracked job; with
    /// no spec, the current job is chosen.
    pub(crate) fn resolve_job(&self, job_spec: Option<&str>) -> Result<usize, error::Error> {
        if !self.job_control_enabled() {
            return Err(error::Error::NotInteractive);
        }

        match job_spec {
            Some(spec) => self.jobs.resolve_job_spec(spec),
            None => self
                .jobs
                .current_job_index()
                .ok_or(error::Error::NoCurrentJob),
        }
    }

    /// Continues the job at `index` in the foreground and waits for it.
    pub(crate) fn foreground_job(&mut self, index: usize) -> Result<u8, error::Error> {
        let mut job = self.jobs.remove(index);

        if let Some(terminal) = &self.terminal {
            if let Err(e) = terminal.give_to(job.process_group()) {
                tracing::debug!(target: trace_categories::JOBS, "couldn't foreground job: {e}");
            }
        }

        match job.resume() {
            Ok(()) => self.wait_for_foreground(job),
            Err(error::Error::ErrnoError(nix::errno::Errno::ESRCH)) => {
                // Already gone; nothing left to wait for.
                if let Some(terminal) = &self.terminal {
                    terminal.reclaim()?;
                }
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    /// Continues the job at `index` in the background.
    pub(crate) fn background_job(&mut self, index: usize) -> Result<(), error::Error> {
        let Some(job) = self.jobs.jobs.get_mut(index) else {
            return Err(error::Error::NoCurrentJob);
        };

        match job.resume() {
            Err(error::Error::ErrnoError(nix::errno::Errno::ESRCH)) => {
                self.jobs.remove(index);
                Ok(())
            }
            result => result,
        }
    }
}
