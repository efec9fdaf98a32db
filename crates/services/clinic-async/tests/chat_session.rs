use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clinic_async::chat::{
    ChatFailure, ChatReply, ChatResult, ChatSession, ChatState, ChatTransport, HistoryEntry,
    PatientContextMode, PatientInfo, Role, SendOutcome,
};
use tokio::sync::Notify;

#[derive(Default)]
struct StubTransport {
    replies: Mutex<VecDeque<ChatResult<ChatReply>>>,
    sent: Mutex<Vec<(String, Option<String>, PatientInfo)>>,
    deleted: Mutex<Vec<String>>,
}

impl StubTransport {
    fn replying(replies: impl IntoIterator<Item = ChatResult<ChatReply>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }
}

fn reply(text: &str, id: &str) -> ChatResult<ChatReply> {
    Ok(ChatReply {
        response: text.into(),
        conversation_id: id.into(),
    })
}

#[async_trait]
impl ChatTransport for StubTransport {
    async fn send_message(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        patient_info: &PatientInfo,
    ) -> ChatResult<ChatReply> {
        self.sent.lock().unwrap().push((
            message.to_string(),
            conversation_id.map(str::to_string),
            patient_info.clone(),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ChatFailure::new("no stubbed reply")))
    }

    async fn get_history(&self, conversation_id: &str) -> ChatResult<Vec<HistoryEntry>> {
        Ok(vec![HistoryEntry {
            role: Some("user".into()),
            content: format!("history of {conversation_id}"),
            timestamp: None,
        }])
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ChatResult<()> {
        self.deleted.lock().unwrap().push(conversation_id.to_string());
        Ok(())
    }

    async fn check_health(&self) -> ChatResult<serde_json::Value> {
        Err(ChatFailure::new("service unavailable"))
    }
}

/// Holds every send until released
#[derive(Default)]
struct GatedTransport {
    release: Notify,
}

#[async_trait]
impl ChatTransport for GatedTransport {
    async fn send_message(
        &self,
        _message: &str,
        _conversation_id: Option<&str>,
        _patient_info: &PatientInfo,
    ) -> ChatResult<ChatReply> {
        self.release.notified().await;
        reply("Réponse", "gated-1")
    }

    async fn get_history(&self, _conversation_id: &str) -> ChatResult<Vec<HistoryEntry>> {
        Ok(Vec::new())
    }

    async fn delete_conversation(&self, _conversation_id: &str) -> ChatResult<()> {
        Ok(())
    }

    async fn check_health(&self) -> ChatResult<serde_json::Value> {
        Ok(serde_json::json!({"status": "ok"}))
    }
}

async fn wait_until_sending<T: ChatTransport + ?Sized>(session: &ChatSession<T>) {
    while !session.snapshot().pending() {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn successful_send_appends_both_messages() {
    let transport = StubTransport::replying([reply("Hello", "abc123")]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);

    assert_eq!(session.send("Bonjour").await, SendOutcome::Replied);

    let snap = session.snapshot();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[0].role, Role::User);
    assert_eq!(snap.messages[0].content, "Bonjour");
    assert_eq!(snap.messages[1].role, Role::Assistant);
    assert_eq!(snap.messages[1].content, "Hello");
    assert_eq!(snap.conversation_id.as_deref(), Some("abc123"));
    assert!(!snap.pending());
    assert!(snap.last_error.is_none());

    // First send carries no conversation id
    assert_eq!(transport.sent.lock().unwrap()[0].1, None);
}

#[tokio::test]
async fn failed_send_keeps_user_message_and_conversation() {
    let transport = StubTransport::replying([
        reply("Hello", "abc123"),
        Err(ChatFailure::new("timeout")),
    ]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);
    session.send("Bonjour").await;

    assert_eq!(session.send("Suivi").await, SendOutcome::Failed);

    let snap = session.snapshot();
    assert_eq!(snap.messages.len(), 3);
    assert_eq!(snap.messages[2].role, Role::User);
    assert_eq!(snap.messages[2].content, "Suivi");
    assert_eq!(snap.conversation_id.as_deref(), Some("abc123"));
    assert_eq!(snap.last_error.as_deref(), Some("timeout"));
    assert_eq!(snap.state, ChatState::Errored);

    // The follow-up was sent on the existing conversation
    assert_eq!(
        transport.sent.lock().unwrap()[1].1.as_deref(),
        Some("abc123")
    );
}

#[tokio::test]
async fn errored_session_still_sends_and_dismiss_returns_to_idle() {
    let transport = StubTransport::replying([
        Err(ChatFailure::new("connection error")),
        reply("Rebonjour", "abc123"),
    ]);
    let session = ChatSession::new(transport, PatientContextMode::Disabled);

    session.send("Bonjour").await;
    session.dismiss_error();
    let snap = session.snapshot();
    assert_eq!(snap.state, ChatState::Idle);
    assert!(snap.last_error.is_none());

    assert_eq!(session.send("Encore").await, SendOutcome::Replied);
}

#[tokio::test]
async fn clear_resets_and_deletes_server_conversation() {
    let transport = StubTransport::replying([reply("Hello", "abc123")]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);
    session.send("Bonjour").await;

    session.clear().await;

    let snap = session.snapshot();
    assert!(snap.messages.is_empty());
    assert!(snap.conversation_id.is_none());
    assert!(snap.last_error.is_none());
    assert_eq!(*transport.deleted.lock().unwrap(), vec!["abc123".to_string()]);
}

#[tokio::test]
async fn clear_without_conversation_issues_no_delete() {
    let transport = StubTransport::replying([]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);

    session.clear().await;

    assert!(transport.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blank_messages_are_ignored() {
    let transport = StubTransport::replying([]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);

    assert_eq!(session.send("   \n\t").await, SendOutcome::Ignored);
    assert!(session.snapshot().messages.is_empty());
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn message_is_trimmed_and_draft_cleared() {
    let transport = StubTransport::replying([reply("ok", "c1")]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);

    session.set_draft("  Douleur molaire  ");
    assert_eq!(session.submit_draft().await, SendOutcome::Replied);

    let snap = session.snapshot();
    assert_eq!(snap.messages[0].content, "Douleur molaire");
    assert!(snap.draft.is_empty());
    assert_eq!(transport.sent.lock().unwrap()[0].0, "Douleur molaire");
}

#[tokio::test]
async fn second_send_while_pending_is_a_no_op() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(ChatSession::new(
        transport.clone(),
        PatientContextMode::Optional,
    ));

    let first = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.send("Premier").await }
    });
    wait_until_sending(&session).await;

    assert_eq!(session.send("Second").await, SendOutcome::Ignored);
    assert_eq!(session.snapshot().messages.len(), 1);

    transport.release.notify_one();
    assert_eq!(first.await.unwrap(), SendOutcome::Replied);

    let snap = session.snapshot();
    assert_eq!(snap.messages.len(), 2);
    assert_eq!(snap.messages[0].content, "Premier");
}

#[tokio::test]
async fn reply_after_clear_is_discarded() {
    let transport = Arc::new(GatedTransport::default());
    let session = Arc::new(ChatSession::new(
        transport.clone(),
        PatientContextMode::Optional,
    ));

    let pending = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.send("Bonjour").await }
    });
    wait_until_sending(&session).await;

    session.clear().await;
    transport.release.notify_one();

    assert_eq!(pending.await.unwrap(), SendOutcome::Discarded);
    let snap = session.snapshot();
    assert!(snap.messages.is_empty());
    assert!(snap.conversation_id.is_none());
}

#[tokio::test]
async fn dropped_send_returns_the_session_to_idle() {
    let transport = Arc::new(GatedTransport::default());
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);

    let abandoned = tokio::time::timeout(Duration::from_millis(50), session.send("Premier")).await;
    assert!(abandoned.is_err());

    let snap = session.snapshot();
    assert_eq!(snap.state, ChatState::Idle);
    assert_eq!(snap.messages.len(), 1);

    let retry = tokio::spawn({
        let transport = Arc::clone(&transport);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            transport.release.notify_one();
        }
    });
    assert_eq!(session.send("Encore").await, SendOutcome::Replied);
    retry.await.unwrap();

    let snap = session.snapshot();
    assert_eq!(snap.state, ChatState::Idle);
    assert_eq!(snap.messages.len(), 3);
    assert_eq!(snap.conversation_id.as_deref(), Some("gated-1"));
}

#[tokio::test]
async fn replies_follow_send_order() {
    let transport = StubTransport::replying([reply("A", "c1"), reply("B", "c1")]);
    let session = ChatSession::new(transport, PatientContextMode::Optional);

    session.send("first").await;
    session.send("second").await;

    let contents: Vec<_> = session
        .snapshot()
        .messages
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["first", "A", "second", "B"]);
}

#[tokio::test]
async fn patient_context_only_sent_when_shared() {
    let transport = StubTransport::replying([reply("a", "c1"), reply("b", "c1")]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Optional);
    session.set_patient_info(PatientInfo {
        age: Some("42".into()),
        history: Some("  ".into()),
        ..PatientInfo::default()
    });

    session.send("sans contexte").await;
    session.set_share_patient_context(true);
    session.send("avec contexte").await;

    let sent = transport.sent.lock().unwrap();
    assert!(sent[0].2.is_empty());
    assert_eq!(sent[1].2.age.as_deref(), Some("42"));
    assert_eq!(sent[1].2.history, None);
}

#[tokio::test]
async fn disabled_surface_never_sends_context() {
    let transport = StubTransport::replying([reply("a", "c1")]);
    let session = ChatSession::new(transport.clone(), PatientContextMode::Disabled);
    session.set_patient_info(PatientInfo {
        age: Some("42".into()),
        ..PatientInfo::default()
    });
    session.set_share_patient_context(true);

    session.send("Bonjour").await;

    let snap = session.snapshot();
    assert!(!snap.share_patient_context);
    assert!(snap.patient_info.is_empty());
    assert!(transport.sent.lock().unwrap()[0].2.is_empty());
}

#[tokio::test]
async fn surfaces_do_not_share_state() {
    let transport = StubTransport::replying([reply("Hello", "page-1")]);
    let page = ChatSession::new(transport.clone(), PatientContextMode::Optional);
    let widget = ChatSession::new(transport, PatientContextMode::Disabled);

    page.send("Bonjour").await;

    assert_eq!(page.snapshot().messages.len(), 2);
    assert!(widget.snapshot().messages.is_empty());
    assert!(widget.snapshot().conversation_id.is_none());
}

#[tokio::test]
async fn health_failure_is_recorded() {
    let session = ChatSession::new(StubTransport::replying([]), PatientContextMode::Optional);

    let health = session.refresh_health().await;

    assert!(!health.success);
    assert_eq!(health.error.as_deref(), Some("service unavailable"));
    assert_eq!(session.snapshot().api_status, Some(health));
}

#[tokio::test]
async fn history_requires_a_conversation() {
    let transport = StubTransport::replying([reply("Hello", "abc123")]);
    let session = ChatSession::new(transport, PatientContextMode::Optional);

    assert!(session.fetch_history().await.is_none());

    session.send("Bonjour").await;
    let history = session.fetch_history().await.unwrap().unwrap();
    assert_eq!(history[0].content, "history of abc123");
}
