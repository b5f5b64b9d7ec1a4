use heaterlink_state::OutboundMessage;

use crate::error::Result;

/// Destination for rendered state and availability messages.
pub trait StateSink {
    fn publish(&mut self, message: &OutboundMessage, retain: bool) -> Result<()>;

    fn publish_all(&mut self, messages: &[OutboundMessage], retain: bool) -> Result<()> {
        for message in messages {
            self.publish(message, retain)?;
        }
        Ok(())
    }
}

impl<S: StateSink + ?Sized> StateSink for &mut S {
    fn publish(&mut self, message: &OutboundMessage, retain: bool) -> Result<()> {
        (**self).publish(message, retain)
    }
}

/// Collects messages in memory.
impl StateSink for Vec<OutboundMessage> {
    fn publish(&mut self, message: &OutboundMessage, _retain: bool) -> Result<()> {
        self.push(message.clone());
        Ok(())
    }
}
