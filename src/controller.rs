use log::{ debug, error, info, warn };
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex, MutexGuard };
use tokio::task::JoinHandle;
use crate::client::ChatTransport;
use crate::error::ChatError;
use crate::models::chat::{ ChatId, ChatMessage };
use crate::session::{ Applied, ChatSession, Turn };
use crate::view::{ InputField, TranscriptView };

/// Drives chat turns: input field in, transcript entries out.
///
/// Cloning is cheap; clones share the session, transport and view, so a
/// turn can finish on a spawned task while the host keeps taking input.
#[derive(Clone)]
pub struct ChatController {
    session: Arc<Mutex<ChatSession>>,
    transport: Arc<dyn ChatTransport>,
    view: Arc<dyn TranscriptView>,
    in_flight: Arc<AtomicUsize>,
}

struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ChatController {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        view: Arc<dyn TranscriptView>,
        chat_id: Option<ChatId>
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(ChatSession::new(chat_id))),
            transport,
            view,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn session(&self) -> MutexGuard<'_, ChatSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.session().chat_id().cloned()
    }

    /// Requests sent and not yet answered.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Takes the input field's text and starts a turn for it.
    ///
    /// Blank input is ignored. Otherwise the field is cleared and the user's
    /// message rendered before anything goes over the network.
    pub fn submit(&self, input: &mut InputField) -> Option<Turn> {
        let text = input.value().trim().to_string();
        if text.is_empty() {
            return None;
        }
        input.clear();
        self.view.append(ChatMessage::user(text.clone()));
        Some(self.session().begin_turn(text))
    }

    /// Sends a started turn and renders whatever comes back.
    pub async fn complete(&self, turn: Turn) -> Result<(), ChatError> {
        debug!("Sending turn #{} to {}", turn.seq, self.transport.endpoint());

        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.transport.send(&turn.request).await
        };

        match result {
            Ok(response) => {
                let applied = self.session().apply(turn.seq, response.chat_id);
                match applied {
                    Applied::Current { previous, current } => {
                        if previous != current {
                            info!(
                                "Conversation id changed: {} -> {}",
                                describe(previous.as_ref()),
                                describe(current.as_ref())
                            );
                        }
                    }
                    Applied::Stale => {
                        warn!(
                            "Response for turn #{} arrived after a newer one; keeping current conversation id",
                            turn.seq
                        );
                    }
                }
                match response.answer {
                    Some(answer) => {
                        self.view.append(ChatMessage::assistant(answer));
                        Ok(())
                    }
                    None => {
                        let e = ChatError::Decode("reply has no answer".into());
                        error!("Turn #{} failed: {}", turn.seq, e);
                        self.view.append(ChatMessage::error(e.to_string()));
                        Err(e)
                    }
                }
            }
            Err(e) => {
                error!("Turn #{} failed: {}", turn.seq, e);
                self.view.append(ChatMessage::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Submit and wait for the answer. `None` when the input was blank.
    pub async fn handle_submit(&self, input: &mut InputField) -> Option<Result<(), ChatError>> {
        let turn = self.submit(input)?;
        Some(self.complete(turn).await)
    }

    /// Submit and let the answer arrive in the background.
    pub fn dispatch(&self, input: &mut InputField) -> Option<JoinHandle<()>> {
        let turn = self.submit(input)?;
        let controller = self.clone();
        Some(
            tokio::spawn(async move {
                // Failures are already rendered and logged by `complete`.
                let _ = controller.complete(turn).await;
            })
        )
    }
}

fn describe(id: Option<&ChatId>) -> String {
    id.map_or_else(|| "(none)".to_string(), ChatId::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::{ oneshot, Notify };
    use crate::models::chat::{ ChatRequest, ChatResponse, Role };

    /// Transport that records requests and replays queued replies.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub requests: Mutex<Vec<ChatRequest>>,
        pub replies: Mutex<VecDeque<Result<ChatResponse, ChatError>>>,
    }

    impl FakeTransport {
        pub fn replying(replies: Vec<Result<ChatResponse, ChatError>>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                replies: Mutex::new(replies.into()),
            })
        }

        pub fn bodies(&self) -> Vec<serde_json::Value> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| serde_json::to_value(r).unwrap())
                .collect()
        }
    }

    #[async_trait]
    impl ChatTransport for FakeTransport {
        async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::Transport("no reply queued".into())))
        }

        fn endpoint(&self) -> String {
            "fake://api/chat".into()
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingView {
        pub entries: Mutex<Vec<ChatMessage>>,
    }

    impl RecordingView {
        pub fn rendered(&self) -> Vec<(Role, String)> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .map(|m| (m.role, m.content.clone()))
                .collect()
        }
    }

    impl TranscriptView for RecordingView {
        fn append(&self, message: ChatMessage) {
            self.entries.lock().unwrap().push(message);
        }
    }

    pub(crate) fn reply(chat_id: &str, answer: &str) -> Result<ChatResponse, ChatError> {
        Ok(ChatResponse {
            chat_id: Some(chat_id.into()),
            answer: Some(answer.into()),
        })
    }

    fn controller(transport: Arc<FakeTransport>, view: Arc<RecordingView>) -> ChatController {
        ChatController::new(transport, view, None)
    }

    #[tokio::test]
    async fn blank_input_is_a_silent_no_op() {
        let transport = FakeTransport::replying(vec![]);
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view.clone());

        let mut input = InputField::from("   \t ");
        assert!(ctl.handle_submit(&mut input).await.is_none());

        assert!(view.rendered().is_empty());
        assert!(transport.bodies().is_empty());
        assert_eq!(input.value(), "   \t ");
    }

    #[tokio::test]
    async fn first_request_omits_chat_id_and_reply_sets_it() {
        let transport = FakeTransport::replying(vec![reply("abc", "hi"), reply("abc", "again")]);
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view.clone());

        let mut input = InputField::from("  hello ");
        ctl.handle_submit(&mut input).await.unwrap().unwrap();
        assert_eq!(ctl.chat_id(), Some(ChatId::new("abc")));

        let mut input = InputField::from("more");
        ctl.handle_submit(&mut input).await.unwrap().unwrap();

        assert_eq!(
            transport.bodies(),
            vec![json!({ "message": "hello" }), json!({ "message": "more", "chat_id": "abc" })]
        );
        assert_eq!(
            view.rendered(),
            vec![
                (Role::User, "hello".to_string()),
                (Role::Assistant, "hi".to_string()),
                (Role::User, "more".to_string()),
                (Role::Assistant, "again".to_string())
            ]
        );
    }

    struct GatedTransport {
        opened: Notify,
        gate: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl ChatTransport for GatedTransport {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatResponse, ChatError> {
            let gate = self.gate.lock().unwrap().take();
            self.opened.notify_one();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            reply("abc", "hi")
        }

        fn endpoint(&self) -> String {
            "gated://api/chat".into()
        }
    }

    #[tokio::test]
    async fn input_is_cleared_and_user_message_shown_before_reply() {
        let (release, gate) = oneshot::channel();
        let transport = Arc::new(GatedTransport {
            opened: Notify::new(),
            gate: Mutex::new(Some(gate)),
        });
        let view = Arc::new(RecordingView::default());
        let ctl = ChatController::new(transport.clone(), view.clone(), None);

        let mut input = InputField::from("hello");
        let handle = ctl.dispatch(&mut input).unwrap();

        assert_eq!(input.value(), "");
        assert_eq!(view.rendered(), vec![(Role::User, "hello".to_string())]);

        transport.opened.notified().await;
        assert_eq!(ctl.in_flight(), 1);

        release.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(ctl.in_flight(), 0);
        assert_eq!(view.rendered().last(), Some(&(Role::Assistant, "hi".to_string())));
    }

    #[tokio::test]
    async fn failure_renders_error_entry_and_keeps_chat_id() {
        let transport = FakeTransport::replying(
            vec![
                reply("abc", "hi"),
                Err(ChatError::Status {
                    status: StatusCode::BAD_GATEWAY,
                    body: "upstream down".into(),
                })
            ]
        );
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view.clone());

        ctl.handle_submit(&mut InputField::from("hello")).await.unwrap().unwrap();
        let result = ctl.handle_submit(&mut InputField::from("again")).await.unwrap();

        assert!(matches!(result, Err(ChatError::Status { .. })));
        assert_eq!(ctl.chat_id(), Some(ChatId::new("abc")));
        let rendered = view.rendered();
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[2], (Role::User, "again".to_string()));
        assert_eq!(rendered[3].0, Role::Error);
        assert!(rendered[3].1.contains("upstream down"));
    }

    #[tokio::test]
    async fn stale_reply_is_rendered_but_does_not_replace_chat_id() {
        let transport = FakeTransport::replying(vec![reply("new", "second"), reply("old", "first")]);
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view.clone());

        let slow = ctl.submit(&mut InputField::from("one")).unwrap();
        let fast = ctl.submit(&mut InputField::from("two")).unwrap();

        ctl.complete(fast).await.unwrap();
        ctl.complete(slow).await.unwrap();

        assert_eq!(ctl.chat_id(), Some(ChatId::new("new")));
        assert_eq!(view.rendered().last(), Some(&(Role::Assistant, "first".to_string())));
    }

    #[tokio::test]
    async fn reply_without_chat_id_clears_it() {
        let transport = FakeTransport::replying(
            vec![
                reply("abc", "hi"),
                Ok(ChatResponse { chat_id: None, answer: Some("forgot".into()) })
            ]
        );
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view);

        ctl.handle_submit(&mut InputField::from("a")).await.unwrap().unwrap();
        ctl.handle_submit(&mut InputField::from("b")).await.unwrap().unwrap();
        assert_eq!(ctl.chat_id(), None);
    }

    #[tokio::test]
    async fn reply_without_answer_still_sets_chat_id() {
        let transport = FakeTransport::replying(
            vec![Ok(ChatResponse { chat_id: Some("abc".into()), answer: None }), reply("abc", "hi")]
        );
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view.clone());

        let result = ctl.handle_submit(&mut InputField::from("hello")).await.unwrap();
        assert!(matches!(result, Err(ChatError::Decode(_))));
        assert_eq!(ctl.chat_id(), Some(ChatId::new("abc")));
        assert_eq!(view.rendered()[1].0, Role::Error);

        ctl.handle_submit(&mut InputField::from("again")).await.unwrap().unwrap();
        assert_eq!(transport.bodies()[1], json!({ "message": "again", "chat_id": "abc" }));
    }

    #[tokio::test]
    async fn numeric_chat_id_goes_back_as_a_number() {
        let numeric = ChatId::try_from(json!(42)).unwrap();
        let transport = FakeTransport::replying(
            vec![
                Ok(ChatResponse { chat_id: Some(numeric.clone()), answer: Some("hi".into()) }),
                reply("abc", "again")
            ]
        );
        let view = Arc::new(RecordingView::default());
        let ctl = controller(transport.clone(), view);

        ctl.handle_submit(&mut InputField::from("hello")).await.unwrap().unwrap();
        assert_eq!(ctl.chat_id(), Some(numeric));
        ctl.handle_submit(&mut InputField::from("more")).await.unwrap().unwrap();
        assert_eq!(transport.bodies()[1], json!({ "message": "more", "chat_id": 42 }));
    }
}
