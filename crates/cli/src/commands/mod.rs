pub mod config;
pub mod doctor;
pub mod session;

use blindquote_core::ApplicationError;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_message: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            user_message: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        user_message: Option<&str>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            user_message: user_message.map(str::to_string),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure payload carrying the error's stable class, its user-facing message and a
    /// class-specific exit code.
    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            error.to_string(),
            Some(error.user_message()),
            exit_code_for(error),
        )
    }
}

fn exit_code_for(error: &ApplicationError) -> u8 {
    match error {
        ApplicationError::Configuration(_) => 2,
        ApplicationError::PriceBook(_) => 3,
        ApplicationError::Persistence(_) | ApplicationError::Storage(_) => 4,
        ApplicationError::InvalidInput(_) => 5,
        ApplicationError::Io(_) => 6,
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
