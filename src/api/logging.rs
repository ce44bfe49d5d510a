use crate::util::parse_bool_str;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{IsTerminal, Write};

const DEFAULT_LOG_PATH: &str = "/tmp/agentkey-debug.log";
const DEBUG_PAYLOAD_ENV: &str = "AGENTKEY_DEBUG_PAYLOAD";
const LOG_PATH_ENV: &str = "AGENTKEY_LOG_PATH";

pub fn debug_payload_enabled() -> bool {
    std::env::var(DEBUG_PAYLOAD_ENV)
        .ok()
        .and_then(|v| parse_bool_str(&v))
        .unwrap_or(false)
}

/// `request_url` must not carry credentials; the key travels in a header.
pub fn emit_debug_payload(request_url: &str, payload: &Value) {
    let formatted_payload = serde_json::to_string_pretty(payload)
        .unwrap_or_else(|_| "<payload serialization error>".to_string());
    let message = format!(
        "AGENTKEY DEBUG payload_request url={request_url}\npayload:\n{formatted_payload}\n"
    );
    emit_log_message(&message);
}

pub fn emit_sse_parse_error(json_data: &str, parse_error: &serde_json::Error) {
    let message =
        format!("AGENTKEY ERROR sse_parse_failed error={parse_error}\ndata:\n{json_data}\n");
    emit_log_message(&message);
}

pub fn emit_invocation_failed(invocation: &str, agent_id: &str, error: &dyn std::fmt::Display) {
    let message = format!(
        "AGENTKEY ERROR invocation_failed invocation={invocation} agent={agent_id} error={error}\n"
    );
    emit_log_message(&message);
}

pub fn emit_memory_saved(agent_id: &str, content_len: usize) {
    let message =
        format!("AGENTKEY INFO memory_saved agent={agent_id} content_bytes={content_len}\n");
    emit_log_message(&message);
}

fn emit_log_message(message: &str) {
    if let Some(path) = resolve_log_path() {
        if append_log_file(&path, message).is_ok() {
            return;
        }
    }

    eprintln!("{message}");
}

fn resolve_log_path() -> Option<String> {
    crate::util::env_non_empty(LOG_PATH_ENV).or_else(|| {
        if std::io::stderr().is_terminal() {
            Some(DEFAULT_LOG_PATH.to_string())
        } else {
            None
        }
    })
}

fn append_log_file(path: &str, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(message.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_payload_enabled_accepts_true_variants() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(DEBUG_PAYLOAD_ENV, "1");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "TRUE");
        assert!(debug_payload_enabled());
        std::env::set_var(DEBUG_PAYLOAD_ENV, "nope");
        assert!(!debug_payload_enabled());
        std::env::remove_var(DEBUG_PAYLOAD_ENV);
    }

    #[test]
    fn test_resolve_log_path_uses_log_path_env() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        std::env::set_var(LOG_PATH_ENV, "  /tmp/agentkey-test.log ");
        assert_eq!(resolve_log_path().as_deref(), Some("/tmp/agentkey-test.log"));
        std::env::remove_var(LOG_PATH_ENV);
    }

    #[test]
    fn test_records_are_appended_to_log_file() {
        let _env_lock = crate::test_support::ENV_LOCK.blocking_lock();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("agentkey.log");
        std::env::set_var(LOG_PATH_ENV, &path);

        emit_memory_saved("coder", 24);
        emit_invocation_failed("#3", "default", &"collaborator unavailable: boom");

        std::env::remove_var(LOG_PATH_ENV);
        let contents = std::fs::read_to_string(&path).expect("log written");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "AGENTKEY INFO memory_saved agent=coder content_bytes=24",
                "AGENTKEY ERROR invocation_failed invocation=#3 agent=default error=collaborator unavailable: boom",
            ]
        );
    }
}
