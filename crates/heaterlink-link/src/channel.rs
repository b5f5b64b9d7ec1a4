use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use heaterlink_frame::{command_name, decode, encode, Auth, Passkey, TelemetrySnapshot};
use heaterlink_transport::{HeaterTransport, NotificationReceiver, TransportError};
use tracing::{debug, info, warn};

use crate::control::HeaterCommand;
use crate::error::{LinkError, Result};

/// Link behavior configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Authentication used for every outbound frame.
    pub auth: Auth,
    /// How long a command waits for its confirming notification.
    pub response_timeout: Duration,
    /// How long a status poll waits for a pushed notification before reading
    /// the status resource explicitly.
    pub poll_window: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            auth: Auth::Passkey(Passkey::DEFAULT),
            response_timeout: Duration::from_secs(1),
            poll_window: Duration::from_millis(250),
        }
    }
}

struct LinkInner<T> {
    transport: T,
    notifications: NotificationReceiver,
}

/// Exclusive owner of a heater link.
///
/// `LinkChannel` is `Sync`; share it behind an `Arc`. Every operation takes
/// the internal lock for its whole duration, so at most one request is ever
/// outstanding on the link.
pub struct LinkChannel<T> {
    inner: Mutex<LinkInner<T>>,
    endpoint: String,
    config: LinkConfig,
}

impl<T: HeaterTransport> LinkChannel<T> {
    /// Wrap a connected transport and the receiver for its notifications.
    pub fn new(transport: T, notifications: NotificationReceiver, config: LinkConfig) -> Self {
        let endpoint = transport.endpoint().to_string();
        Self {
            inner: Mutex::new(LinkInner {
                transport,
                notifications,
            }),
            endpoint,
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a raw command and wait for the device to confirm it.
    ///
    /// Returns `Ok(None)` when no notification arrives within
    /// [`LinkConfig::response_timeout`] or the write fails; the device simply
    /// did not confirm. Notifications that were pending before the frame was
    /// written are discarded and never attributed to this command.
    pub fn send_command(&self, command: u8, argument: u16) -> Result<Option<TelemetrySnapshot>> {
        let frame = encode(command, argument, self.config.auth);
        let mut inner = self.lock();

        let stale = inner.notifications.clear();
        if stale > 0 {
            debug!(stale, "discarded notifications received before command");
        }

        if let Err(err) = inner.transport.write_command(frame.as_bytes()) {
            self.check_disconnect(&err)?;
            warn!(
                command = command_name(command),
                argument,
                frame = %hex::encode(frame.as_bytes()),
                error = %err,
                "command write failed"
            );
            return Ok(None);
        }

        let raw = match inner
            .notifications
            .recv_timeout(self.config.response_timeout)
        {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!(
                    command = command_name(command),
                    argument,
                    timeout = ?self.config.response_timeout,
                    "device did not confirm command"
                );
                return Ok(None);
            }
            Err(err) => return Err(self.disconnected(&err)),
        };
        drop(inner);

        decode(&raw).map(Some).map_err(|err| {
            warn!(
                command = command_name(command),
                argument,
                raw = %hex::encode(&raw),
                error = %err,
                "undecodable command confirmation"
            );
            LinkError::Frame(err)
        })
    }

    /// Fetch the current device status without sending a command.
    ///
    /// A notification pushed by the device within
    /// [`LinkConfig::poll_window`] is used as is; otherwise the status
    /// resource is read. A failed read is logged and yields `Ok(None)`.
    pub fn poll_status(&self) -> Result<Option<TelemetrySnapshot>> {
        let mut inner = self.lock();

        let pushed = inner
            .notifications
            .recv_timeout(self.config.poll_window)
            .map_err(|err| self.disconnected(&err))?;

        let raw = match pushed {
            Some(raw) => raw,
            None => match inner.transport.read_status() {
                Ok(raw) => raw,
                Err(err) => {
                    self.check_disconnect(&err)?;
                    warn!(endpoint = %self.endpoint, error = %err, "status read failed");
                    return Ok(None);
                }
            },
        };
        drop(inner);

        decode(&raw).map(Some).map_err(|err| {
            warn!(
                endpoint = %self.endpoint,
                raw = %hex::encode(&raw),
                error = %err,
                "undecodable status frame"
            );
            LinkError::Frame(err)
        })
    }

    /// Validate and send a user-level command.
    ///
    /// Invalid arguments fail with [`LinkError::InvalidArgument`] before the
    /// link is touched.
    pub fn execute(&self, command: HeaterCommand) -> Result<Option<TelemetrySnapshot>> {
        let (code, argument) = command.request()?;
        debug!(command = command.name(), argument, "executing command");
        self.send_command(code, argument)
    }

    pub fn query_status(&self) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::QueryStatus)
    }

    pub fn start(&self) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::Start)
    }

    pub fn stop(&self) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::Stop)
    }

    /// Set the power level (1-36).
    pub fn set_level(&self, level: i64) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::SetLevel(level))
    }

    /// Set the target temperature in °C (8-36). Only meaningful in
    /// temperature mode.
    pub fn set_temperature(&self, celsius: i64) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::SetTemperature(celsius))
    }

    /// Set the running mode (1 = power level, 2 = temperature).
    pub fn set_mode(&self, mode: i64) -> Result<Option<TelemetrySnapshot>> {
        self.execute(HeaterCommand::SetMode(mode))
    }

    fn lock(&self) -> MutexGuard<'_, LinkInner<T>> {
        // A panic mid-request leaves nothing half-written that matters: the
        // next request clears notifications before it starts.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_disconnect(&self, err: &TransportError) -> Result<()> {
        if err.is_disconnect() {
            return Err(self.disconnected(err));
        }
        Ok(())
    }

    fn disconnected(&self, err: &TransportError) -> LinkError {
        warn!(endpoint = %self.endpoint, error = %err, "link lost");
        LinkError::Disconnected {
            endpoint: self.endpoint.clone(),
        }
    }
}

impl<T> std::fmt::Debug for LinkChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkChannel")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    use bytes::Bytes;
    use heaterlink_frame::{
        CommandFrame, FrameError, RunningMode, TelemetryFields, SET_LEVEL, START_STOP,
    };
    use heaterlink_transport::{notification_channel, NotificationSender, SimulatedHeater};
    use tracing_test::traced_test;

    use super::*;

    fn fast_config() -> LinkConfig {
        LinkConfig {
            response_timeout: Duration::from_millis(100),
            poll_window: Duration::from_millis(10),
            ..LinkConfig::default()
        }
    }

    /// Scriptable transport that counts every call.
    #[derive(Default)]
    struct MockTransport {
        calls: Arc<AtomicUsize>,
        notifications: Option<NotificationSender>,
        reply: Option<Bytes>,
        read_result: Option<Bytes>,
        fail_with: Option<fn() -> TransportError>,
    }

    impl HeaterTransport for MockTransport {
        fn write_command(&mut self, _frame: &[u8]) -> heaterlink_transport::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            if let (Some(tx), Some(reply)) = (&self.notifications, &self.reply) {
                tx.deliver(reply.clone());
            }
            Ok(())
        }

        fn read_status(&mut self) -> heaterlink_transport::Result<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            self.read_result
                .clone()
                .ok_or_else(|| TransportError::Rejected("no status".to_string()))
        }

        fn endpoint(&self) -> &str {
            "mock"
        }
    }

    fn status_frame(step: u8) -> Bytes {
        TelemetryFields {
            running_step: step,
            ..TelemetryFields::default()
        }
        .encode()
    }

    #[test]
    fn out_of_range_arguments_never_touch_transport() {
        let (_tx, rx) = notification_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let link = LinkChannel::new(
            MockTransport {
                calls: calls.clone(),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        for level in [i64::MIN, -1, 0, 37, 1000] {
            assert!(matches!(
                link.set_level(level),
                Err(LinkError::InvalidArgument { .. })
            ));
        }
        for mode in [-1, 0, 3, 42] {
            assert!(matches!(
                link.set_mode(mode),
                Err(LinkError::InvalidArgument { .. })
            ));
        }
        assert!(link.set_temperature(99).is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn command_returns_confirmation_from_simulator() {
        let (tx, rx) = notification_channel();
        let link = LinkChannel::new(
            SimulatedHeater::new(Passkey::DEFAULT, tx),
            rx,
            fast_config(),
        );

        let snapshot = link.set_level(17).unwrap().expect("simulator confirms");
        assert_eq!(snapshot.set_level(), 17);

        let snapshot = link.set_mode(2).unwrap().expect("simulator confirms");
        assert_eq!(snapshot.running_mode(), RunningMode::Temperature);

        let snapshot = link.start().unwrap().expect("simulator confirms");
        assert!(snapshot.running_step() > 0);
    }

    #[test]
    fn query_status_sends_status_command() {
        let (tx, rx) = notification_channel();
        let heater = SimulatedHeater::new(Passkey::DEFAULT, tx)
            .with_name("sim-query");
        let link = LinkChannel::new(heater, rx, fast_config());

        assert_eq!(link.endpoint(), "sim-query");
        let snapshot = link.query_status().unwrap().expect("simulator confirms");
        assert_eq!(snapshot.running_step(), 0);
        assert_eq!(snapshot.set_level(), 1);
    }

    #[test]
    fn unconfirmed_command_yields_none_after_timeout() {
        let (_tx, rx) = notification_channel();
        let link = LinkChannel::new(MockTransport::default(), rx, fast_config());

        let started = Instant::now();
        assert!(link.start().unwrap().is_none());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn stale_notification_is_not_attributed_to_command() {
        let (tx, rx) = notification_channel();
        tx.deliver(status_frame(3));
        let link = LinkChannel::new(MockTransport::default(), rx, fast_config());

        assert!(link.stop().unwrap().is_none());
    }

    #[test]
    fn wrong_passkey_goes_unconfirmed() {
        let (tx, rx) = notification_channel();
        let heater = SimulatedHeater::new(Passkey::new(4321).unwrap(), tx);
        let link = LinkChannel::new(heater, rx, fast_config());

        assert!(link.start().unwrap().is_none());
    }

    #[test]
    fn write_failure_is_recoverable() {
        let (_tx, rx) = notification_channel();
        let link = LinkChannel::new(
            MockTransport {
                fail_with: Some(|| TransportError::Rejected("busy".to_string())),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        assert!(link.start().unwrap().is_none());
        assert!(link.poll_status().unwrap().is_none());
    }

    #[test]
    fn disconnect_is_fatal() {
        let (_tx, rx) = notification_channel();
        let link = LinkChannel::new(
            MockTransport {
                fail_with: Some(|| TransportError::Disconnected),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        let err = link.start().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            link.poll_status(),
            Err(LinkError::Disconnected { .. })
        ));
    }

    #[test]
    fn dropped_notification_source_is_fatal() {
        let (tx, rx) = notification_channel();
        drop(tx);
        let link = LinkChannel::new(MockTransport::default(), rx, fast_config());
        assert!(matches!(link.start(), Err(LinkError::Disconnected { .. })));
    }

    #[test]
    fn poll_prefers_pushed_notification() {
        let (tx, rx) = notification_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        tx.deliver(status_frame(2));
        let link = LinkChannel::new(
            MockTransport {
                calls: calls.clone(),
                notifications: Some(tx),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        let snapshot = link.poll_status().unwrap().expect("pushed status");
        assert_eq!(snapshot.running_step(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn poll_falls_back_to_status_read() {
        let (_tx, rx) = notification_channel();
        let calls = Arc::new(AtomicUsize::new(0));
        let link = LinkChannel::new(
            MockTransport {
                calls: calls.clone(),
                read_result: Some(status_frame(1)),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        let snapshot = link.poll_status().unwrap().expect("read status");
        assert_eq!(snapshot.running_step(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn undecodable_confirmation_surfaces_frame_error() {
        let (tx, rx) = notification_channel();
        let bad_mode = TelemetryFields {
            running_mode: 9,
            ..TelemetryFields::default()
        }
        .encode();
        let link = LinkChannel::new(
            MockTransport {
                notifications: Some(tx),
                reply: Some(bad_mode),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        assert!(matches!(
            link.start(),
            Err(LinkError::Frame(FrameError::UnknownMode(9)))
        ));
        assert!(logs_contain("undecodable command confirmation"));
        assert!(logs_contain("command=\"start-stop\""));
        assert!(logs_contain("argument=1"));
        assert!(logs_contain("raw=aa"));
    }

    #[test]
    fn bad_marker_from_status_read_is_malformed() {
        let (_tx, rx) = notification_channel();
        let mut raw = status_frame(0).to_vec();
        raw[0] = 0x55;
        let link = LinkChannel::new(
            MockTransport {
                read_result: Some(Bytes::from(raw)),
                ..MockTransport::default()
            },
            rx,
            fast_config(),
        );

        assert!(matches!(
            link.poll_status(),
            Err(LinkError::Frame(FrameError::MalformedFrame(_)))
        ));
    }

    /// Answers each command asynchronously with a frame echoing the argument
    /// as the level, and counts any access made while a previous request is
    /// still awaiting its answer.
    struct EchoTransport {
        notifications: NotificationSender,
        in_flight: Arc<AtomicBool>,
        violations: Arc<AtomicUsize>,
    }

    impl EchoTransport {
        fn enter(&self) {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.violations.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl HeaterTransport for EchoTransport {
        fn write_command(&mut self, raw: &[u8]) -> heaterlink_transport::Result<()> {
            self.enter();
            let frame = CommandFrame::parse(raw).expect("link sends valid frames");
            let reply = TelemetryFields {
                set_level: frame.argument() as u8,
                ..TelemetryFields::default()
            }
            .encode();

            let tx = self.notifications.clone();
            let in_flight = self.in_flight.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(2));
                in_flight.store(false, Ordering::SeqCst);
                tx.deliver(reply);
            });
            Ok(())
        }

        fn read_status(&mut self) -> heaterlink_transport::Result<Bytes> {
            self.enter();
            thread::sleep(Duration::from_millis(1));
            self.in_flight.store(false, Ordering::SeqCst);
            Ok(TelemetryFields::default().encode())
        }

        fn endpoint(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn concurrent_commands_and_polls_never_interleave() {
        let (tx, rx) = notification_channel();
        let violations = Arc::new(AtomicUsize::new(0));
        let transport = EchoTransport {
            notifications: tx,
            in_flight: Arc::new(AtomicBool::new(false)),
            violations: violations.clone(),
        };
        let link = Arc::new(LinkChannel::new(
            transport,
            rx,
            LinkConfig {
                response_timeout: Duration::from_secs(2),
                poll_window: Duration::from_millis(1),
                ..LinkConfig::default()
            },
        ));

        let workers: Vec<_> = (0..4u16)
            .map(|worker| {
                let link = link.clone();
                thread::spawn(move || {
                    for round in 0..8u16 {
                        let level = 1 + worker * 8 + round;
                        let snapshot = link
                            .send_command(SET_LEVEL, level)
                            .unwrap()
                            .expect("echo transport always answers");
                        assert_eq!(u16::from(snapshot.set_level()), level);
                        link.poll_status().unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("worker should not panic");
        }
        assert_eq!(violations.load(Ordering::SeqCst), 0);

        // A command issued after the storm still gets its own answer.
        let snapshot = link.send_command(START_STOP, 1).unwrap().unwrap();
        assert_eq!(snapshot.set_level(), 1);
    }
}
