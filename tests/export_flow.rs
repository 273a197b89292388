//! End-to-end export runs against an in-memory chat client.

use archivebot::config::ExportConfig;
use archivebot::export::Exporter;
use archivebot::platform::ChatClient;
use archivebot::state::ExportState;
use archivebot::{Attachment, ChannelInfo, ChatMessage, ExportError, Result};

use chrono::TimeZone as _;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

const CHANNEL_ID: u64 = 42;
const OPERATOR_ID: u64 = 777;

struct FakeClient {
    channel: Option<ChannelInfo>,
    messages: Mutex<Vec<ChatMessage>>,
    /// Operator replies injected into the channel once the confirmation
    /// prompt has been posted.
    pending_replies: Mutex<VecDeque<ChatMessage>>,
    /// Everything the exporter posted into the channel.
    sent: Mutex<Vec<String>>,
    fail_urls: HashSet<String>,
}

impl FakeClient {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            channel: Some(ChannelInfo {
                id: CHANNEL_ID,
                name: "general".to_string(),
            }),
            messages: Mutex::new(messages),
            pending_replies: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            fail_urls: HashSet::new(),
        }
    }

    /// Queue an operator reply that lands in the channel once the
    /// confirmation prompt is posted — like a real operator answering. The
    /// reply then exists in channel history, so the archive pass records it
    /// too, exactly as a live run would.
    fn with_reply(self, content: &str) -> Self {
        self.pending_replies.lock().unwrap().push_back(message(
            1_000_000,
            2030,
            OPERATOR_ID,
            "operator",
            content,
            vec![],
        ));
        self
    }

    fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl ChatClient for FakeClient {
    async fn channel_info(&self, channel_id: u64) -> Result<ChannelInfo> {
        self.channel
            .clone()
            .ok_or(ExportError::ChannelNotFound(channel_id))
    }

    async fn messages_after(
        &self,
        _channel_id: u64,
        after: Option<u64>,
        limit: u8,
    ) -> Result<Vec<ChatMessage>> {
        let floor = after.unwrap_or(0);
        let mut page: Vec<ChatMessage> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.id > floor)
            .cloned()
            .collect();
        page.sort_by_key(|message| message.id);
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn send_message(&self, _channel_id: u64, text: &str) -> Result<()> {
        if text.contains("Do you want to continue?") {
            let mut replies = self.pending_replies.lock().unwrap();
            self.messages.lock().unwrap().extend(replies.drain(..));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        if self.fail_urls.contains(url) {
            return Err(ExportError::Other(anyhow::anyhow!(
                "simulated download failure"
            )));
        }
        Ok(b"attachment-bytes".to_vec())
    }
}

fn message(
    id: u64,
    year: i32,
    author_id: u64,
    author: &str,
    content: &str,
    attachments: Vec<Attachment>,
) -> ChatMessage {
    ChatMessage {
        id,
        timestamp: chrono::Utc
            .with_ymd_and_hms(year, 3, 10, 12, 30, 0)
            .unwrap(),
        author_id,
        author: author.to_string(),
        content: content.to_string(),
        attachments,
    }
}

fn attachment(id: u64, filename: &str, size_bytes: u64) -> Attachment {
    Attachment {
        id,
        filename: filename.to_string(),
        url: format!("https://cdn.example/{filename}"),
        size_bytes,
    }
}

fn sample_history() -> Vec<ChatMessage> {
    vec![
        message(1, 2021, 10, "ana", "first", vec![]),
        message(
            2,
            2022,
            11,
            "ben",
            "with attachments",
            vec![
                attachment(100, "one.png", 1_048_576),
                attachment(101, "two.png", 2_097_152),
            ],
        ),
        message(3, 2022, 10, "ana", "last", vec![]),
    ]
}

struct TestSetup {
    _dir: tempfile::TempDir,
    config: ExportConfig,
    channel_dir: PathBuf,
}

fn setup() -> TestSetup {
    let dir = tempfile::tempdir().unwrap();
    let config = ExportConfig {
        output_dir: dir.path().join("exports"),
        state_file: dir.path().join("export_state.json"),
        save_every: 2,
        confirm_timeout_secs: 30,
    };
    let channel_dir = config.output_dir.join(format!("general_{CHANNEL_ID}"));
    TestSetup {
        _dir: dir,
        config,
        channel_dir,
    }
}

#[tokio::test]
async fn approved_export_produces_all_artifacts() {
    let setup = setup();
    let client = FakeClient::new(sample_history()).with_reply("Yes");
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);

    exporter.run(CHANNEL_ID).await.unwrap();

    // The estimate reflects the concrete scenario: 3 messages, 2 attachments,
    // 1 MiB + 2 MiB = 3.00 MB.
    let sent = client.sent_messages().join("\n---\n");
    assert!(sent.contains("Total size of attachments to be downloaded: 3.00 MB"));
    assert!(sent.contains("Number of messages: 3"));
    assert!(sent.contains("Number of attachments: 2"));

    assert!(setup.channel_dir.join("messages.json").exists());
    assert!(setup.channel_dir.join("messages.xlsx").exists());
    assert!(setup.channel_dir.join("messages_2021.txt").exists());
    assert!(setup.channel_dir.join("messages_2022.txt").exists());
    // The operator's "Yes" reply is part of channel history by the time the
    // archive pass runs, so it gets its own year file and record.
    assert!(setup.channel_dir.join("messages_2030.txt").exists());

    // Both attachments were downloaded into the year partition.
    let year_dir = setup.channel_dir.join("Attachments").join("2022");
    assert!(year_dir.join("20220310_123000_ben_one.png").exists());
    assert!(year_dir.join("20220310_123000_ben_two.png").exists());

    // JSON and the archive pass agree on the record count: the three
    // original messages plus the confirmation reply.
    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(setup.channel_dir.join("messages.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn declined_export_writes_nothing() {
    let setup = setup();
    let client = FakeClient::new(sample_history()).with_reply("No");
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);

    let error = exporter.run(CHANNEL_ID).await.unwrap_err();
    assert!(matches!(error, ExportError::ConfirmationDeclined));

    assert!(client
        .sent_messages()
        .iter()
        .any(|text| text == "Operation cancelled."));
    assert!(!setup.channel_dir.exists());
}

#[tokio::test(start_paused = true)]
async fn confirmation_timeout_writes_nothing() {
    let setup = setup();
    // No reply queued: the gate polls until the window elapses.
    let client = FakeClient::new(sample_history());
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);

    let error = exporter.run(CHANNEL_ID).await.unwrap_err();
    assert!(matches!(error, ExportError::ConfirmationTimeout));

    assert!(client
        .sent_messages()
        .iter()
        .any(|text| text == "Response timed out. Operation cancelled."));
    assert!(!setup.channel_dir.exists());
}

#[tokio::test]
async fn unknown_channel_aborts_before_any_output() {
    let setup = setup();
    let mut client = FakeClient::new(sample_history());
    client.channel = None;
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);

    let error = exporter.run(CHANNEL_ID).await.unwrap_err();
    assert!(matches!(error, ExportError::ChannelNotFound(_)));
    assert!(client.sent_messages().is_empty());
    assert!(!setup.config.output_dir.exists());
}

#[tokio::test]
async fn failed_attachment_download_leaves_gap_without_aborting() {
    let setup = setup();
    let mut client = FakeClient::new(sample_history()).with_reply("yes");
    client
        .fail_urls
        .insert("https://cdn.example/two.png".to_string());
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);

    exporter.run(CHANNEL_ID).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(setup.channel_dir.join("messages.json")).unwrap(),
    )
    .unwrap();
    let attachments = json[1]["attachments"].as_array().unwrap();
    assert_eq!(attachments.len(), 2);
    // The URL survives; only the local path is missing. Saved paths can
    // never outnumber URLs.
    assert!(attachments[0]["local_path"].is_string());
    assert!(attachments[1]["local_path"].is_null());
    assert_eq!(attachments[1]["url"], "https://cdn.example/two.png");
}

#[tokio::test]
async fn watermark_resumes_and_estimate_only_counts_new_messages() {
    let setup = setup();
    let client = FakeClient::new(sample_history()).with_reply("yes");
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);
    exporter.run(CHANNEL_ID).await.unwrap();

    let state = ExportState::load(&setup.config.state_file);
    assert_eq!(state.watermark(CHANNEL_ID).last_message_id(), Some(3));
    assert_eq!(state.watermark(CHANNEL_ID).last_attachment_id(), Some(101));

    let first_json =
        std::fs::read(setup.channel_dir.join("messages.json")).unwrap();

    // Second run over unchanged history: the estimator resumes strictly
    // after the watermark and sees nothing new.
    let client = FakeClient::new(sample_history()).with_reply("yes");
    let exporter = Exporter::new(&client, &setup.config, OPERATOR_ID);
    exporter.run(CHANNEL_ID).await.unwrap();

    let sent = client.sent_messages().join("\n---\n");
    assert!(sent.contains("Number of messages: 0"));
    assert!(sent.contains("Number of attachments: 0"));

    // The archive pass still restarts from the beginning, so the JSON
    // artifact is rebuilt byte-for-byte identical.
    let second_json =
        std::fs::read(setup.channel_dir.join("messages.json")).unwrap();
    assert_eq!(first_json, second_json);
}
