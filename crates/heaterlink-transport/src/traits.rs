use bytes::Bytes;

use crate::error::Result;

/// A connected heater link.
///
/// Implementations are driven from a single owner at a time; `heaterlink-link`
/// wraps them in a lock and never calls them concurrently. Notifications are
/// not part of this trait: they are delivered out of band through the
/// [`NotificationSender`](crate::NotificationSender) handed to the adapter
/// when it was created.
pub trait HeaterTransport: Send {
    /// Write a command frame to the control resource and wait for the link
    /// level acknowledgement.
    fn write_command(&mut self, frame: &[u8]) -> Result<()>;

    /// Read the current contents of the status resource.
    fn read_status(&mut self) -> Result<Bytes>;

    /// Endpoint name for diagnostics (address, device path, ...).
    fn endpoint(&self) -> &str;
}

impl<T: HeaterTransport + ?Sized> HeaterTransport for Box<T> {
    fn write_command(&mut self, frame: &[u8]) -> Result<()> {
        (**self).write_command(frame)
    }

    fn read_status(&mut self) -> Result<Bytes> {
        (**self).read_status()
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
