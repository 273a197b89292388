//! Confirmation gate: present the estimate, wait for the operator's call.

use crate::export::estimate::SizeEstimate;
use crate::platform::ChatClient;
use crate::Result;

use std::time::Duration;

/// How often the gate polls the channel for a reply.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The three ways a confirmation can resolve. `Declined` and `TimedOut`
/// differ only in what gets logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Declined,
    TimedOut,
}

/// Post the estimate and block until the operator replies yes or no in the
/// same channel, or the window elapses.
///
/// `baseline` is the newest message id known before the prompt; only replies
/// strictly after it qualify, which keeps stale "yes" messages from past
/// conversations out of scope.
pub async fn await_decision<C: ChatClient>(
    client: &C,
    channel_id: u64,
    operator_id: u64,
    estimate: &SizeEstimate,
    baseline: Option<u64>,
    window: Duration,
) -> Result<Decision> {
    let prompt = format!(
        "Total size of attachments to be downloaded: {:.2} MB\n\
         Number of messages: {}\n\
         Number of attachments: {}\n\
         Do you want to continue? (yes/no)",
        estimate.total_megabytes(),
        estimate.messages,
        estimate.attachments
    );
    client.send_message(channel_id, &prompt).await?;

    match tokio::time::timeout(window, poll_for_reply(client, channel_id, operator_id, baseline))
        .await
    {
        Ok(decision) => decision,
        Err(_elapsed) => Ok(Decision::TimedOut),
    }
}

async fn poll_for_reply<C: ChatClient>(
    client: &C,
    channel_id: u64,
    operator_id: u64,
    mut baseline: Option<u64>,
) -> Result<Decision> {
    loop {
        let page = client.messages_after(channel_id, baseline, 100).await?;
        for message in page {
            baseline = Some(message.id);
            if message.author_id != operator_id {
                continue;
            }
            match message.content.trim().to_lowercase().as_str() {
                "yes" => return Ok(Decision::Approved),
                "no" => return Ok(Decision::Declined),
                _ => {}
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
