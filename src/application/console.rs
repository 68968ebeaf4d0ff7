//! A stand-in controller for running the relay on its own.
//!
//! `ConsoleApplication` logs every command it receives, reports what it did
//! back to the dashboards through the relay callbacks, and turns
//! `quitApplication` into a notification the binary can wait on.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{Application, ApplicationError, QueueMessageFn, SendMessageFn};

#[derive(Default)]
struct Callbacks {
    send_message: Option<SendMessageFn>,
    queue_message: Option<QueueMessageFn>,
}

pub struct ConsoleApplication {
    callbacks: Mutex<Callbacks>,
    nodes: Mutex<Vec<String>>,
    quit: Notify,
    started_at: Instant,
}

impl Default for ConsoleApplication {
    fn default() -> Self {
        Self::new()
    }
}

fn status_record(mut fields: Value) -> Value {
    if let Value::Object(map) = &mut fields {
        map.insert("msgType".to_string(), json!("status"));
        map.insert(
            "timestamp".to_string(),
            json!(chrono::Utc::now().timestamp_millis()),
        );
    }
    fields
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConsoleApplication {
    pub fn new() -> Self {
        Self {
            callbacks: Mutex::new(Callbacks::default()),
            nodes: Mutex::new(Vec::new()),
            quit: Notify::new(),
            started_at: Instant::now(),
        }
    }

    /// Whether the relay has handed over its callbacks yet.
    pub fn is_bound(&self) -> bool {
        let callbacks = lock(&self.callbacks);
        callbacks.send_message.is_some() && callbacks.queue_message.is_some()
    }

    /// Nodes started so far, in start order.
    pub fn nodes(&self) -> Vec<String> {
        lock(&self.nodes).clone()
    }

    /// Resolves once a client asked the application to quit. A request that
    /// arrived before this is awaited is not lost.
    pub async fn quit_requested(&self) {
        self.quit.notified().await;
    }

    /// Queue a status record, if the relay is bound.
    pub fn publish_status(&self, fields: Value) {
        let Some(queue_message) = lock(&self.callbacks).queue_message.clone() else {
            debug!("relay not bound yet, status dropped");
            return;
        };
        queue_message(status_record(fields));
    }

    /// Broadcast a status record immediately, skipping the queue.
    pub fn announce_status(&self, fields: Value) {
        let Some(send_message) = lock(&self.callbacks).send_message.clone() else {
            debug!("relay not bound yet, announcement dropped");
            return;
        };
        send_message(status_record(fields));
    }

    /// Periodically queue an uptime status until the returned task is
    /// aborted.
    pub fn spawn_heartbeat(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let uptime = self.started_at.elapsed().as_secs();
                self.publish_status(json!({ "uptimeSecs": uptime, "nodes": self.nodes() }));
            }
        })
    }
}

impl Application for ConsoleApplication {
    fn set_callback_send_message(&self, callback: SendMessageFn) {
        lock(&self.callbacks).send_message = Some(callback);
    }

    fn set_callback_queue_message(&self, callback: QueueMessageFn) {
        lock(&self.callbacks).queue_message = Some(callback);
    }

    fn calibrate(&self) -> Result<(), ApplicationError> {
        info!("calibration requested");
        self.announce_status(json!({ "calibration": "requested" }));
        Ok(())
    }

    fn start_node(&self, name: &str) -> Result<(), ApplicationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApplicationError::InvalidArgument(
                "node name must not be empty".to_string(),
            ));
        }

        info!(node = name, "starting node");
        lock(&self.nodes).push(name.to_string());
        self.publish_status(json!({ "node": name, "nodeState": "starting" }));
        Ok(())
    }

    fn quit_application(&self) -> Result<(), ApplicationError> {
        info!("quit requested");
        self.quit.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Records = Arc<Mutex<Vec<Value>>>;

    fn bound() -> (ConsoleApplication, Records, Records) {
        let app = ConsoleApplication::new();
        let sent = Records::default();
        let queued = Records::default();
        let sent_sink = sent.clone();
        let queued_sink = queued.clone();
        app.set_callback_send_message(Arc::new(move |record| {
            sent_sink.lock().unwrap().push(record);
        }));
        app.set_callback_queue_message(Arc::new(move |record| {
            queued_sink.lock().unwrap().push(record);
        }));
        (app, sent, queued)
    }

    #[test]
    fn start_node_queues_status() {
        let (app, sent, queued) = bound();
        assert!(app.is_bound());

        app.start_node("slam").unwrap();

        let queued = queued.lock().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0]["msgType"], "status");
        assert_eq!(queued[0]["node"], "slam");
        assert!(queued[0]["timestamp"].is_i64());
        assert_eq!(app.nodes(), vec!["slam".to_string()]);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn calibrate_announces_immediately() {
        let (app, sent, queued) = bound();

        app.calibrate().unwrap();

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["msgType"], "status");
        assert_eq!(sent[0]["calibration"], "requested");
        assert!(queued.lock().unwrap().is_empty());
    }

    #[test]
    fn start_node_rejects_blank_name() {
        let (app, _sent, queued) = bound();
        assert!(matches!(
            app.start_node("  "),
            Err(ApplicationError::InvalidArgument(_))
        ));
        assert!(queued.lock().unwrap().is_empty());
    }

    #[test]
    fn unbound_application_drops_status() {
        let app = ConsoleApplication::new();
        assert!(!app.is_bound());
        app.calibrate().unwrap();
    }

    #[tokio::test]
    async fn quit_request_is_not_lost() {
        let app = ConsoleApplication::new();
        app.quit_application().unwrap();
        tokio::time::timeout(Duration::from_secs(1), app.quit_requested())
            .await
            .expect("quit notification");
    }
}
