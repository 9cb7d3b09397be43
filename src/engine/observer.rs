/// Callback receiving the new voice count.
pub type VoiceCountCallback = Box<dyn FnMut(usize) + Send>;

/// Returned by [`VoiceCountObservers::subscribe`]; pass it back to
/// unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscribers to the voice count, plus one replaceable primary callback.
///
/// `notify` only calls out when the count differs from the last value
/// delivered, so every observer sees each change exactly once.
#[derive(Default)]
pub struct VoiceCountObservers {
    subscribers: Vec<(SubscriptionId, VoiceCountCallback)>,
    primary: Option<VoiceCountCallback>,
    next_id: u64,
    last: Option<usize>,
}

impl VoiceCountObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: VoiceCountCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Replace the primary callback. Subscribers are unaffected.
    pub fn set_primary(&mut self, callback: Option<VoiceCountCallback>) {
        self.primary = callback;
    }

    /// Deliver `count` if it changed. Returns true if it was delivered.
    pub fn notify(&mut self, count: usize) -> bool {
        if self.last == Some(count) {
            return false;
        }
        self.last = Some(count);

        if let Some(primary) = self.primary.as_mut() {
            primary(count);
        }
        for (_, callback) in &mut self.subscribers {
            callback(count);
        }
        true
    }

    /// Last value delivered.
    pub fn last(&self) -> Option<usize> {
        self.last
    }

    pub fn len(&self) -> usize {
        self.subscribers.len() + usize::from(self.primary.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
