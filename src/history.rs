//! Lazy, ordered walk over a channel's message history.

use crate::platform::ChatClient;
use crate::{ChatMessage, Result};

/// Page size for history pulls. Discord caps message pages at 100.
const PAGE_SIZE: u8 = 100;

/// Yields a channel's messages in chronological order, strictly after the
/// starting watermark, pulling pages lazily as the caller consumes them.
///
/// Not restartable: to walk again, build a new walker with the desired
/// starting point.
pub struct HistoryWalker<'a, C: ChatClient> {
    client: &'a C,
    channel_id: u64,
    cursor: Option<u64>,
    buffer: std::vec::IntoIter<ChatMessage>,
    exhausted: bool,
}

impl<'a, C: ChatClient> HistoryWalker<'a, C> {
    /// `after = None` starts from the beginning of the channel.
    pub fn new(client: &'a C, channel_id: u64, after: Option<u64>) -> Self {
        Self {
            client,
            channel_id,
            cursor: after,
            buffer: Vec::new().into_iter(),
            exhausted: false,
        }
    }

    /// The next message, or `None` once the history is exhausted.
    pub async fn next(&mut self) -> Result<Option<ChatMessage>> {
        loop {
            if let Some(message) = self.buffer.next() {
                self.cursor = Some(message.id);
                return Ok(Some(message));
            }
            if self.exhausted {
                return Ok(None);
            }

            let page = self
                .client
                .messages_after(self.channel_id, self.cursor, PAGE_SIZE)
                .await?;
            if page.len() < PAGE_SIZE as usize {
                // Short page: nothing further to pull after draining it.
                self.exhausted = true;
            }
            self.buffer = page.into_iter();
        }
    }
}
