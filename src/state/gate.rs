use tokio::sync::watch;

/// Process-wide switch that stops new sessions from being created once set.
///
/// There is no way to reopen the gate; sessions already running are not affected.
pub struct AdminGate {
    closed: watch::Sender<bool>,
}

impl AdminGate {
    /// Create an open gate.
    pub fn new() -> Self {
        let (closed, _rx) = watch::channel(false);
        Self { closed }
    }

    /// Close the gate. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.closed.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    /// Whether new sessions are currently refused.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new()
    }
}
