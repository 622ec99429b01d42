//! Tracing setup for the hush shell.

use std::collections::HashSet;
use std::fmt::Display;

use tracing_subscriber::{
    Layer, Registry, filter::Targets, layer::SubscriberExt, reload::Handle,
    util::SubscriberInitExt,
};

/// Type of event to trace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum TraceEvent {
    /// Traces every category below.
    #[clap(name = "all")]
    All,
    /// Traces command execution.
    #[clap(name = "commands")]
    Commands,
    /// Traces word expansion.
    #[clap(name = "expand")]
    Expand,
    /// Traces job management.
    #[clap(name = "jobs")]
    Jobs,
    /// Traces the parsing of input into command lists.
    #[clap(name = "parse")]
    Parse,
    /// Traces terminal ownership changes.
    #[clap(name = "terminal")]
    Terminal,
}

impl Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Commands => write!(f, "commands"),
            Self::Expand => write!(f, "expand"),
            Self::Jobs => write!(f, "jobs"),
            Self::Parse => write!(f, "parse"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

impl TraceEvent {
    /// Returns the tracing targets covered by this event class.
    const fn targets(self) -> &'static [&'static str] {
        match self {
            Self::All => &["commands", "expand", "jobs", "parse", "terminal"],
            Self::Commands => &["commands"],
            Self::Expand => &["expand"],
            Self::Jobs => &["jobs"],
            Self::Parse => &["parse"],
            Self::Terminal => &["terminal"],
        }
    }
}

/// Error returned when the tracing filter can't be changed.
#[derive(Debug, thiserror::Error)]
pub enum TraceConfigError {
    /// Tracing was never installed.
    #[error("tracing not initialized")]
    NotInitialized,
    /// The subscriber rejected the new filter.
    #[error("failed to reload tracing filter")]
    ReloadFailed,
}

/// The installed tracing subscriber's configuration.
#[derive(Default)]
pub struct TraceEventConfig {
    enabled_trace_events: HashSet<TraceEvent>,
    handle: Option<Handle<Targets, Registry>>,
}

impl TraceEventConfig {
    /// Installs a stderr subscriber with DEBUG enabled for the given events
    /// and INFO for everything else.
    pub fn init(enabled_log_events: &[TraceEvent]) -> Self {
        let mut config = Self {
            enabled_trace_events: enabled_log_events.iter().copied().collect(),
            ..Default::default()
        };

        let filter = config.compose_filter();

        // Make the filter reloadable so that we can change the log level at runtime.
        let (reload_filter, handle) = tracing_subscriber::reload::Layer::new(filter);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(reload_filter);

        if tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .is_ok()
        {
            config.handle = Some(handle);
        } else {
            // Something went wrong; proceed on anyway but complain audibly.
            eprintln!("warning: failed to initialize tracing.");
        }

        config
    }

    fn compose_filter(&self) -> Targets {
        let mut filter =
            Targets::new().with_default(tracing_subscriber::filter::LevelFilter::INFO);

        for event in &self.enabled_trace_events {
            filter = filter.with_targets(
                event
                    .targets()
                    .iter()
                    .map(|target| (*target, tracing::Level::DEBUG)),
            );
        }

        filter
    }

    /// Returns the set of enabled event classes.
    pub const fn enabled_events(&self) -> &HashSet<TraceEvent> {
        &self.enabled_trace_events
    }

    /// Enables DEBUG tracing for one more event class.
    pub fn enable(&mut self, event: TraceEvent) -> Result<(), TraceConfigError> {
        // Don't bother to reload config if nothing has changed.
        if !self.enabled_trace_events.insert(event) {
            return Ok(());
        }

        self.reload_filter()
    }

    fn reload_filter(&self) -> Result<(), TraceConfigError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(TraceConfigError::NotInitialized)?;
        handle
            .reload(self.compose_filter())
            .map_err(|_| TraceConfigError::ReloadFailed)
    }
}
