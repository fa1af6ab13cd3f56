use crate::data_structures::LightState;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Channel the traffic light broadcasts its phase changes on.
pub type PhaseBroadcastChannel = MessageQueue<LightState>;

/// Unbounded message queue that receivers wait on without spinning.
///
/// Messages are handed out oldest first, so a receiver never observes them out
/// of send order. Each `send` wakes at most one waiting receiver; messages
/// nobody is waiting for accumulate until someone calls `receive`.
pub struct MessageQueue<T> {
    messages: Mutex<VecDeque<T>>,
    notify: Notify,
    send_delay: Duration,
}

impl<T: fmt::Debug + Send> MessageQueue<T> {
    pub fn new() -> Self {
        Self::with_send_delay(Duration::ZERO)
    }

    /// Creates a queue whose `send` waits `send_delay` before the message
    /// becomes visible, modelling transmission latency.
    pub fn with_send_delay(send_delay: Duration) -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            send_delay,
        }
    }

    pub async fn send(&self, msg: T) {
        if !self.send_delay.is_zero() {
            sleep(self.send_delay).await;
        }
        log::debug!("Message {:?} has been sent to the queue", msg);
        self.messages().push_back(msg);
        self.notify.notify_one();
    }

    /// Waits until a message is available, then removes and returns it.
    pub async fn receive(&self) -> T {
        loop {
            // Register interest before looking at the queue so a send landing
            // between the check and the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = self.messages().pop_front();
            if let Some(msg) = next {
                return msg;
            }
            notified.await;
        }
    }

    /// Removes the oldest message without waiting.
    pub fn try_receive(&self) -> Option<T> {
        self.messages().pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn messages(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug + Send> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
