//! Single-slot notification channel.
//!
//! The transport's receive context pushes every notification it gets; the
//! link consumes them with a timeout. The channel holds at most one unread
//! notification and a newer one replaces it, so the sender never blocks.

use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::trace;

use crate::error::{Result, TransportError};

/// Create a connected sender/receiver pair.
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (
        NotificationSender {
            tx,
            overflow: rx.clone(),
        },
        NotificationReceiver { rx },
    )
}

/// Producer half, owned by the transport's receive context.
#[derive(Clone)]
pub struct NotificationSender {
    tx: Sender<Bytes>,
    // Used only to evict the unread value when the slot is full.
    overflow: Receiver<Bytes>,
}

impl NotificationSender {
    /// Record a notification, replacing any unread one. Never blocks.
    pub fn deliver(&self, data: impl Into<Bytes>) {
        let mut data = data.into();
        loop {
            match self.tx.try_send(data) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if let Ok(stale) = self.overflow.try_recv() {
                        trace!(len = stale.len(), "replacing unread notification");
                    }
                    data = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

impl std::fmt::Debug for NotificationSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSender")
            .field("pending", &self.tx.len())
            .finish()
    }
}

/// Consumer half, owned by the link.
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: Receiver<Bytes>,
}

impl NotificationReceiver {
    /// Discard any unread notification. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Wait up to `timeout` for the next notification.
    ///
    /// Returns `Ok(None)` on timeout and `Err(Disconnected)` once every
    /// sender is gone and nothing is left to read.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Bytes>> {
        match self.rx.recv_timeout(timeout) {
            Ok(data) => Ok(Some(data)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn newer_notification_replaces_unread_one() {
        let (tx, rx) = notification_channel();
        tx.deliver(&b"first"[..]);
        tx.deliver(&b"second"[..]);
        tx.deliver(&b"third"[..]);

        let got = rx.recv_timeout(Duration::from_millis(10)).unwrap();
        assert_eq!(got.as_deref(), Some(&b"third"[..]));
        assert_eq!(rx.recv_timeout(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn clear_discards_pending() {
        let (tx, rx) = notification_channel();
        tx.deliver(&b"stale"[..]);
        assert_eq!(rx.clear(), 1);
        assert_eq!(rx.clear(), 0);
        assert_eq!(rx.recv_timeout(Duration::from_millis(10)).unwrap(), None);
    }

    #[test]
    fn recv_waits_for_late_delivery() {
        let (tx, rx) = notification_channel();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.deliver(&b"late"[..]);
        });

        let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got.as_deref(), Some(&b"late"[..]));
        producer.join().unwrap();
    }

    #[test]
    fn dropped_sender_reports_disconnect() {
        let (tx, rx) = notification_channel();
        drop(tx);
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(10)),
            Err(TransportError::Disconnected)
        ));
    }

    #[test]
    fn deliver_after_receiver_drop_does_not_block() {
        let (tx, rx) = notification_channel();
        drop(rx);
        tx.deliver(&b"one"[..]);
        tx.deliver(&b"two"[..]);
    }
}
