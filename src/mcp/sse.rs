//! Session registry for the HTTP+SSE framing
//!
//! `GET /sse` opens a session whose first event names the endpoint the client
//! posts its messages to. Responses to those messages are pushed onto the
//! session's event stream rather than returned in the POST response.

use std::{
    collections::HashMap,
    convert::Infallible,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use axum::response::sse::Event;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{auth::API_KEY_QUERY_PARAM, errors::AppError};

pub const SSE_PATH: &str = "/sse";
pub const SSE_MESSAGE_PATH: &str = "/sse/message";
pub const SESSION_ID_PARAM: &str = "sessionId";

const SESSION_BUFFER: usize = 32;

type EventSender = mpsc::Sender<Result<Event, Infallible>>;
type SenderMap = HashMap<String, EventSender>;

#[derive(Clone, Default)]
pub struct SseSessions {
    senders: Arc<Mutex<SenderMap>>,
}

/// Event stream of one session. Dropping it, which axum does when the client
/// disconnects, removes the session from the registry.
pub struct SessionStream {
    inner: ReceiverStream<Result<Event, Infallible>>,
    session_id: String,
    sessions: SseSessions,
}

impl Stream for SessionStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for SessionStream {
    fn drop(&mut self) {
        self.sessions.close(&self.session_id);
    }
}

impl SseSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> MutexGuard<'_, SenderMap> {
        // The map holds no invariant a panicking holder could break.
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new session and returns its id with the stream to serve.
    ///
    /// A client that authenticated with the `api_key` query parameter gets it back
    /// in the endpoint URL so its follow-up POSTs pass the gate too.
    pub fn open(&self, api_key: Option<&str>) -> Result<(String, SessionStream), AppError> {
        let session_id = Uuid::new_v4().to_string();
        let (sender, receiver) = mpsc::channel(SESSION_BUFFER);

        let endpoint = endpoint_url(&session_id, api_key);
        sender
            .try_send(Ok(Event::default().event("endpoint").data(endpoint)))
            .map_err(|err| AppError::internal(format!("failed to queue endpoint event: {err}")))?;

        self.senders().insert(session_id.clone(), sender);
        info!(session_id = %session_id, "sse session opened");

        let stream = SessionStream {
            inner: ReceiverStream::new(receiver),
            session_id: session_id.clone(),
            sessions: self.clone(),
        };
        Ok((session_id, stream))
    }

    /// Pushes a JSON-RPC message to the session's stream.
    ///
    /// With `None` only the session's existence is checked.
    pub async fn deliver(&self, session_id: &str, message: Option<&Value>) -> Result<(), AppError> {
        let sender = self
            .senders()
            .get(session_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Session not found"))?;

        if sender.is_closed() {
            self.close(session_id);
            return Err(AppError::not_found("Session not found"));
        }

        let Some(message) = message else {
            return Ok(());
        };

        let payload = serde_json::to_string(message)
            .map_err(|err| AppError::internal(format!("failed to encode sse message: {err}")))?;

        if sender
            .send(Ok(Event::default().event("message").data(payload)))
            .await
            .is_err()
        {
            self.close(session_id);
            return Err(AppError::not_found("Session not found"));
        }

        debug!(session_id = %session_id, "sse message delivered");
        Ok(())
    }

    pub fn close(&self, session_id: &str) {
        if self.senders().remove(session_id).is_some() {
            info!(session_id = %session_id, "sse session closed");
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.senders().len()
    }
}

pub fn endpoint_url(session_id: &str, api_key: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair(SESSION_ID_PARAM, session_id);
    if let Some(api_key) = api_key {
        query.append_pair(API_KEY_QUERY_PARAM, api_key);
    }
    format!("{SSE_MESSAGE_PATH}?{}", query.finish())
}
