use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{never, Receiver, RecvTimeoutError};
use heaterlink_frame::TelemetrySnapshot;
use heaterlink_link::{HeaterCommand, LinkChannel, LinkError};
use heaterlink_state::StatePublisher;
use heaterlink_transport::HeaterTransport;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::shutdown::ShutdownToken;
use crate::sink::StateSink;

/// Upper bound on how long the loop sleeps before looking at the shutdown
/// token again.
const SHUTDOWN_CHECK: Duration = Duration::from_millis(200);

/// Poll loop tuning.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// The bridge's control loop.
///
/// Polls the link every [`PollConfig::poll_interval`] and executes commands
/// from `commands` as they arrive. Every outcome, including "no answer", is
/// projected and handed to the sink.
pub struct PollLoop<T, S> {
    link: Arc<LinkChannel<T>>,
    publisher: StatePublisher,
    sink: S,
    commands: Receiver<HeaterCommand>,
    config: PollConfig,
    shutdown: ShutdownToken,
}

impl<T: HeaterTransport, S: StateSink> PollLoop<T, S> {
    pub fn new(
        link: Arc<LinkChannel<T>>,
        publisher: StatePublisher,
        sink: S,
        commands: Receiver<HeaterCommand>,
        config: PollConfig,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            link,
            publisher,
            sink,
            commands,
            config,
            shutdown,
        }
    }

    /// Run until the shutdown token is cancelled or the link disconnects.
    ///
    /// The first poll happens immediately.
    pub fn run(mut self) -> Result<()> {
        info!(
            endpoint = %self.link.endpoint(),
            interval = ?self.config.poll_interval,
            "poll loop started"
        );
        let mut next_poll = Instant::now();

        while !self.shutdown.is_cancelled() {
            let now = Instant::now();
            if now >= next_poll {
                self.poll()?;
                next_poll = Instant::now() + self.config.poll_interval;
                continue;
            }

            let wait = (next_poll - now).min(SHUTDOWN_CHECK);
            match self.commands.recv_timeout(wait) {
                Ok(command) => self.dispatch(command)?,
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command intake closed; polling only");
                    self.commands = never();
                }
            }
        }

        info!("poll loop stopped");
        Ok(())
    }

    /// One status poll, published.
    pub fn poll(&mut self) -> Result<()> {
        let outcome = self.link.poll_status();
        self.settle("status poll", outcome)
    }

    /// One command, published.
    pub fn dispatch(&mut self, command: HeaterCommand) -> Result<()> {
        debug!(command = command.name(), "dispatching command");
        let outcome = self.link.execute(command);
        self.settle(command.name(), outcome)
    }

    fn settle(
        &mut self,
        what: &str,
        outcome: heaterlink_link::Result<Option<TelemetrySnapshot>>,
    ) -> Result<()> {
        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(err @ LinkError::InvalidArgument { .. }) => {
                warn!(operation = what, error = %err, "rejected");
                return Ok(());
            }
            Err(LinkError::Frame(err)) => {
                warn!(operation = what, error = %err, "device sent an undecodable frame");
                None
            }
            Err(err) => return Err(err.into()),
        };

        if snapshot.is_none() {
            debug!(operation = what, "no telemetry");
        }
        let messages = self.publisher.publish(snapshot.as_ref());
        if let Err(err) = self.sink.publish_all(&messages, false) {
            warn!(operation = what, error = %err, "publishing state failed");
        }
        Ok(())
    }
}
