use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::ChatError;
use super::relay::ChatRelay;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub prompt: String,
    pub text: String,
}

/// Owns the relay on a dedicated thread. Requests go in through one channel,
/// replies come back through another. Dropping the worker closes the request
/// channel. An idle thread is joined; one still inside a remote call is left
/// detached and exits once that call returns.
pub struct ChatWorker {
    requests: Option<Sender<String>>,
    replies: Receiver<ChatReply>,
    handle: Option<JoinHandle<()>>,
    in_flight: AtomicUsize,
}

impl ChatWorker {
    pub fn spawn(mut relay: ChatRelay) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<String>();
        let (reply_tx, reply_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("eppa-chat".to_string())
            .spawn(move || {
                for prompt in request_rx {
                    let text = relay.send(&prompt);
                    if reply_tx.send(ChatReply { prompt, text }).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(request_tx),
            replies: reply_rx,
            handle: Some(handle),
            in_flight: AtomicUsize::new(0),
        })
    }

    pub fn submit(&self, prompt: impl Into<String>) -> Result<(), ChatError> {
        let requests = self.requests.as_ref().ok_or(ChatError::WorkerGone)?;
        requests
            .send(prompt.into())
            .map_err(|_| ChatError::WorkerGone)?;
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Requests submitted whose reply has not been taken yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn try_reply(&self) -> Option<ChatReply> {
        let reply = self.replies.try_recv().ok()?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(reply)
    }

    pub fn wait_reply(&self, timeout: Duration) -> Option<ChatReply> {
        let reply = self.replies.recv_timeout(timeout).ok()?;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Some(reply)
    }
}

impl Drop for ChatWorker {
    fn drop(&mut self) {
        self.requests.take();
        if self.in_flight() > 0 {
            return;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::relay::tests::{Scripted, ScriptedBackend};
    use crate::chat::FALLBACK_UNAVAILABLE;

    #[test]
    fn replies_arrive_in_submission_order() {
        let backend = ScriptedBackend::new(vec![Scripted::Reply("um"), Scripted::Reply("dois")]);
        let worker = ChatWorker::spawn(ChatRelay::new(Box::new(backend), "zen", None)).unwrap();

        worker.submit("primeiro").unwrap();
        worker.submit("segundo").unwrap();

        let first = worker.wait_reply(Duration::from_secs(2)).unwrap();
        let second = worker.wait_reply(Duration::from_secs(2)).unwrap();
        assert_eq!(first.prompt, "primeiro");
        assert_eq!(first.text, "um");
        assert_eq!(second.text, "dois");
        assert!(worker.try_reply().is_none());
    }

    #[test]
    fn unconfigured_relay_still_answers() {
        let mut backend = ScriptedBackend::new(Vec::new());
        backend.configured = false;
        let worker = ChatWorker::spawn(ChatRelay::new(Box::new(backend), "zen", None)).unwrap();
        worker.submit("Olá").unwrap();
        let reply = worker.wait_reply(Duration::from_secs(2)).unwrap();
        assert_eq!(reply.text, FALLBACK_UNAVAILABLE);
    }

    #[test]
    fn drop_does_not_wait_for_a_pending_reply() {
        let backend = ScriptedBackend::new(vec![Scripted::Slow(Duration::from_secs(3), "tarde")]);
        let worker = ChatWorker::spawn(ChatRelay::new(Box::new(backend), "zen", None)).unwrap();
        worker.submit("Olá").unwrap();
        assert_eq!(worker.in_flight(), 1);

        let started = std::time::Instant::now();
        drop(worker);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn taken_replies_leave_nothing_in_flight() {
        let backend = ScriptedBackend::new(vec![Scripted::Reply("um")]);
        let worker = ChatWorker::spawn(ChatRelay::new(Box::new(backend), "zen", None)).unwrap();
        worker.submit("primeiro").unwrap();
        worker.wait_reply(Duration::from_secs(2)).unwrap();
        assert_eq!(worker.in_flight(), 0);
    }

    #[test]
    fn drop_joins_idle_worker() {
        let worker =
            ChatWorker::spawn(ChatRelay::new(Box::new(ScriptedBackend::new(Vec::new())), "zen", None))
                .unwrap();
        drop(worker);
    }
}
