use serde::{Deserialize, Serialize};

/// One batch of log lines, transmitted to the bus as a single message body.
///
/// Built by the input reader, handed to the bus worker through the
/// [`HandoffQueue`](crate::HandoffQueue), and owned by the worker from dequeue
/// until the send call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    payload: Vec<String>,
}

impl MessageEnvelope {
    pub fn new(lines: Vec<String>) -> Self {
        Self { payload: lines }
    }

    pub fn payload(&self) -> &[String] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_preserves_line_order() {
        let envelope = MessageEnvelope::new(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(envelope.payload(), ["a", "b"]);
        assert_eq!(envelope.len(), 2);
        assert!(!envelope.is_empty());
    }
}
