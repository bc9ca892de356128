use super::{ClientError, ErrorTrackingClient};
use crate::domain::{EventPayload, RecordedError, StackTrace};
use parking_lot::Mutex;
use serde_json::json;
use std::error::Error as StdError;
use std::io::Write;

/// Writes every captured event as one JSON line.
///
/// Used as a dry-run sink and for inspecting what would be sent.
pub struct JsonLinesClient<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesClient<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_line(&self, line: &serde_json::Value) -> Result<(), ClientError> {
        let mut writer = self.writer.lock();
        serde_json::to_writer(&mut *writer, line)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write + Send> ErrorTrackingClient for JsonLinesClient<W> {
    fn capture_exception(
        &self,
        error: &(dyn StdError + Send + Sync + 'static),
    ) -> Result<(), ClientError> {
        let class = error
            .downcast_ref::<RecordedError>()
            .map_or("Error", |recorded| recorded.class.as_str());

        self.write_line(&json!({
            "type": "exception",
            "class": class,
            "message": error.to_string(),
        }))
    }

    fn capture(&self, event: EventPayload, trace: Option<&StackTrace>) -> Result<(), ClientError> {
        self.write_line(&json!({
            "type": "event",
            "event": event,
            "trace": trace,
        }))
    }

    fn flush(&self) -> Result<(), ClientError> {
        self.writer.lock().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventLevel, StackFrame};
    use serde_json::{Map, Value};
    use std::collections::BTreeMap;

    fn lines(client: JsonLinesClient<Vec<u8>>) -> Vec<Value> {
        let output = String::from_utf8(client.into_inner()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_capture_writes_event_line() {
        let client = JsonLinesClient::new(Vec::new());
        let event = EventPayload {
            level: EventLevel::Info,
            timestamp: 12.5,
            message: "hello".to_string(),
            extra: Map::new(),
            tags: BTreeMap::from([("category".to_string(), "app".to_string())]),
        };
        let trace = StackTrace::new(vec![StackFrame {
            file: Some("index.php".to_string()),
            line: Some(3),
            ..StackFrame::default()
        }]);

        client.capture(event, Some(&trace)).unwrap();
        client.flush().unwrap();

        let lines = lines(client);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["type"], "event");
        assert_eq!(lines[0]["event"]["message"], "hello");
        assert_eq!(lines[0]["event"]["tags"]["category"], "app");
        assert_eq!(lines[0]["trace"][0]["file"], "index.php");
    }

    #[test]
    fn test_capture_exception_uses_recorded_class() {
        let client = JsonLinesClient::new(Vec::new());
        let recorded = RecordedError::new("RuntimeException", "boom");
        client.capture_exception(&recorded).unwrap();

        let io = std::io::Error::other("disk gone");
        client.capture_exception(&io).unwrap();

        let lines = lines(client);
        assert_eq!(lines[0]["class"], "RuntimeException");
        assert_eq!(lines[0]["message"], "boom");
        assert_eq!(lines[1]["class"], "Error");
        assert_eq!(lines[1]["message"], "disk gone");
    }
}
