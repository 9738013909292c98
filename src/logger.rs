use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

use crate::diff::diff_json;

pub enum MessageLogMode {
    Full,
    /// Read responses after the first are logged as changes only.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_read: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_read: None,
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, action: &str, body: &Value) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "body": body,
        });
        self.write_line(&entry);
    }

    /// Writes are always logged in full; reads follow the log mode.
    pub fn log_response(&mut self, method: &str, body: &Value) {
        let diffable = matches!(self.mode, MessageLogMode::Diffed) && method == "POST";
        let entry = match (&self.previous_read, diffable) {
            (Some(prev), true) => {
                let mut changes = Vec::new();
                diff_json(prev, body, "", &mut changes);
                let change_entries: Vec<Value> = changes
                    .iter()
                    .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                    .collect();
                json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "resp",
                    "method": method,
                    "changes": change_entries,
                })
            }
            (None, true) => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "method": method,
                "full": true,
                "body": body,
            }),
            (_, false) => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "method": method,
                "body": body,
            }),
        };
        self.write_line(&entry);
        if diffable {
            self.previous_read = Some(body.clone());
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn status_body(indoor: &str) -> Value {
        json!({"responses": [{
            "fr": "/dsiot/edge/adr_0100.dgc_status",
            "rsc": 2000,
            "pc": {"pn": "dgc_status", "pch": [
                {"pn": "e_1002", "pch": [
                    {"pn": "e_A00B", "pch": [{"pn": "p_01", "pv": indoor}]}
                ]}
            ]}
        }]})
    }

    #[test]
    fn log_request_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_request("POST", "/dsiot/multireq", &json!({"requests": []}));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["dir"], "req");
        assert_eq!(lines[0]["method"], "POST");
        assert_eq!(lines[0]["path"], "/dsiot/multireq");
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn log_command_captures_action() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_command("set_fan_mode", &json!({"requests": [{"op": 3}]}));

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "cmd");
        assert_eq!(lines[0]["action"], "set_fan_mode");
        assert_eq!(lines[0]["body"]["requests"][0]["op"], 3);
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_response("POST", &status_body("18"));
        logger.log_response("POST", &status_body("19"));

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        assert!(lines[0]["body"].is_object());
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0]["path"],
            "/dsiot/edge/adr_0100.dgc_status/dgc_status/e_1002/e_A00B/p_01/pv"
        );
        assert_eq!(changes[0]["new"], "19");
    }

    #[test]
    fn diffed_mode_no_changes_logs_empty_array() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_response("POST", &status_body("18"));
        logger.log_response("POST", &status_body("18"));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["changes"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn write_acks_are_not_diffed() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        logger.log_response("POST", &status_body("18"));
        logger.log_response("PUT", &json!({"responses": [{"fr": "/x", "rsc": 2004}]}));
        logger.log_response("POST", &status_body("18"));

        let lines = read_lines(path);
        assert_eq!(lines[1]["body"]["responses"][0]["rsc"], 2004);
        assert!(lines[1].get("changes").is_none());
        assert_eq!(lines[2]["changes"].as_array().unwrap().len(), 0);
    }
}
