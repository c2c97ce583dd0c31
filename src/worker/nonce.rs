/// Next nonce to use for one account. Only moves forward on a successful send;
/// any other change comes from the node's pending view after a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceCursor {
    next: u64,
}

impl NonceCursor {
    pub fn new(start: u64) -> Self {
        Self { next: start }
    }

    pub fn current(&self) -> u64 {
        self.next
    }

    pub fn advance(&mut self) {
        self.next += 1;
    }

    /// Replace the cursor with the node's pending nonce. May move backwards
    /// when the pool dropped some of our transactions.
    pub fn resync(&mut self, pending: u64) {
        self.next = pending;
    }
}
