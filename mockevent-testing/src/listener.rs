//! A listener that records what it receives.

use mockevent::{CallbackError, Listener, ListenerRef, MethodSignature, TypeName, Value};
use parking_lot::Mutex;
use std::sync::Arc;

/// One callback received by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedCall {
    /// The callback that was invoked
    pub callback: MethodSignature,
    /// The adapted arguments
    pub args: Vec<Value>,
}

/// A log shared between listeners to observe invocation order.
///
/// Each entry reads `label.callback`.
#[derive(Debug, Clone, Default)]
pub struct CallJournal(Arc<Mutex<Vec<String>>>);

impl CallJournal {
    /// Creates an empty journal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry so far, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn record(&self, entry: String) {
        self.0.lock().push(entry);
    }
}

/// A listener implementing one or more contracts that records every
/// callback it receives.
#[derive(Debug)]
pub struct RecordingListener {
    label: String,
    contracts: Vec<TypeName>,
    failure: Option<String>,
    journal: Option<CallJournal>,
    received: Mutex<Vec<ReceivedCall>>,
}

impl RecordingListener {
    /// Creates a listener implementing `contract`.
    #[track_caller]
    pub fn new(label: impl Into<String>, contract: &str) -> Self {
        Self {
            label: label.into(),
            contracts: vec![crate::type_name(contract)],
            failure: None,
            journal: None,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Also implements `contract`.
    #[must_use]
    #[track_caller]
    pub fn implementing(mut self, contract: &str) -> Self {
        self.contracts.push(crate::type_name(contract));
        self
    }

    /// Fails every callback with `message`, after recording it.
    #[must_use]
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Writes every received callback to `journal`.
    #[must_use]
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Moves the listener behind an `Arc` so the test keeps a handle.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// A listener value for this very instance.
    pub fn listener_ref(self: &Arc<Self>) -> ListenerRef {
        ListenerRef::from_arc(Arc::clone(self))
    }

    /// The label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Every callback received so far.
    pub fn calls(&self) -> Vec<ReceivedCall> {
        self.received.lock().clone()
    }

    /// How many callbacks were received.
    pub fn call_count(&self) -> usize {
        self.received.lock().len()
    }

    /// Arguments of every received call of the callback named `method`.
    pub fn received_args(&self, method: &str) -> Vec<Vec<Value>> {
        self.received
            .lock()
            .iter()
            .filter(|call| call.callback.name.as_ref() == method)
            .map(|call| call.args.clone())
            .collect()
    }
}

impl Listener for RecordingListener {
    fn implements(&self, contract: &TypeName) -> bool {
        self.contracts.contains(contract)
    }

    fn on_callback(&self, callback: &MethodSignature, args: &[Value]) -> Result<(), CallbackError> {
        self.received.lock().push(ReceivedCall {
            callback: callback.clone(),
            args: args.to_vec(),
        });
        if let Some(journal) = &self.journal {
            journal.record(format!("{}.{}", self.label, callback.name));
        }
        self.failure
            .as_ref()
            .map_or(Ok(()), |message| Err(CallbackError::new(message.clone())))
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockevent::{MethodName, ParamType};

    fn on_change() -> MethodSignature {
        MethodSignature::new(
            MethodName::try_new("onChange").unwrap(),
            vec![ParamType::Float],
        )
    }

    #[test]
    fn records_and_journals_callbacks() {
        let journal = CallJournal::new();
        let listener = RecordingListener::new("first", "TemperatureListener")
            .with_journal(journal.clone())
            .shared();

        listener.on_callback(&on_change(), &[21.5.into()]).unwrap();

        assert_eq!(listener.call_count(), 1);
        assert_eq!(listener.received_args("onChange"), vec![vec![Value::Float(21.5)]]);
        assert!(listener.received_args("other").is_empty());
        assert_eq!(journal.entries(), vec!["first.onChange".to_string()]);
    }

    #[test]
    fn failing_listener_still_records() {
        let listener = RecordingListener::new("broken", "TemperatureListener").failing_with("boom");
        let err = listener.on_callback(&on_change(), &[1.0.into()]).unwrap_err();
        assert_eq!(err, CallbackError::new("boom"));
        assert_eq!(listener.call_count(), 1);
    }

    #[test]
    fn implements_every_declared_contract() {
        let listener = RecordingListener::new("both", "MyListener").implementing("MyAnotherListener");
        assert!(listener.implements(&crate::type_name("MyListener")));
        assert!(listener.implements(&crate::type_name("MyAnotherListener")));
        assert!(!listener.implements(&crate::type_name("Observer")));
    }

    #[test]
    fn listener_ref_keeps_identity() {
        let listener = RecordingListener::new("l", "MyListener").shared();
        assert_eq!(listener.listener_ref(), listener.listener_ref());
        assert!(listener.listener_ref().to_string().starts_with("l#"));
    }
}
