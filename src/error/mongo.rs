use std::fmt;

use serde::{Deserialize, Serialize};

/// Duplicate key server error codes.
const DUPLICATE_KEY_CODES: [i32; 2] = [11000, 11001];

/// Structured error information extracted from MongoDB errors.
///
/// Serialized to JSON when a driver error is displayed, so a caller sees the
/// server code and name instead of the driver's debug output.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<ErrorDetails>,
}

/// Additional error details extracted from MongoDB error details document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) key: Option<bson::Document>,
}

impl ErrorInfo {
    /// Convert error info to pretty-printed JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Format MongoDB error messages as pretty JSON wrapped in an `error` field.
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    let info = extract_error_info(error);
    let wrapper = serde_json::json!({ "error": info });
    let json_output = serde_json::to_string_pretty(&wrapper).map_err(|_| fmt::Error)?;
    write!(f, "\n{json_output}")
}

/// Whether the server rejected a write because of a unique index.
pub fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            DUPLICATE_KEY_CODES.contains(&write_error.code)
        }
        ErrorKind::Command(command_error) => DUPLICATE_KEY_CODES.contains(&command_error.code),
        _ => false,
    }
}

/// Extract structured information from a MongoDB error using the driver API.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    use mongodb::error::{ErrorKind, WriteFailure};

    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::Write(write_failure) => {
            info.error_type = Some("mongo.write_error".to_string());

            match write_failure {
                WriteFailure::WriteError(write_error) => {
                    info.code = Some(write_error.code);
                    info.message = Some(write_error.message.clone());
                    info.name = get_error_name(write_error.code);
                    info.details = Some(extract_from_details_and_message(
                        &write_error.details,
                        &write_error.message,
                    ));
                }
                WriteFailure::WriteConcernError(wc_error) => {
                    info.code = Some(wc_error.code);
                    info.message = Some(wc_error.message.clone());
                    info.name = get_error_name(wc_error.code);
                }
                _ => {}
            }
        }
        ErrorKind::Command(command_error) => {
            info.error_type = Some("mongo.command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
            info.name = get_error_name(command_error.code);
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("mongo.authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::InvalidArgument { message, .. } => {
            info.error_type = Some("mongo.invalid_argument".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("mongo.server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    if let Some(code) = info.code {
        if DUPLICATE_KEY_CODES.contains(&code) {
            info.message = Some("Duplicate key error".to_string());
        }
    }

    info
}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

/// Extract error details from an optional BSON document and a message string.
///
/// The BSON document is preferred; the message is only searched for the
/// pieces the document does not carry.
fn extract_from_details_and_message(
    error_details: &Option<bson::Document>,
    message: &str,
) -> ErrorDetails {
    let mut details = ErrorDetails::default();

    if let Some(doc) = error_details {
        if let Ok(ns) = doc.get_str("namespace").or_else(|_| doc.get_str("ns")) {
            details.collection = Some(ns.to_string());
        }
        if let Ok(idx) = doc.get_str("index").or_else(|_| doc.get_str("indexName")) {
            details.index = Some(idx.to_string());
        }
        if let Ok(key) = doc
            .get_document("keyPattern")
            .or_else(|_| doc.get_document("keyValue"))
        {
            details.key = Some(key.clone());
        }
    }

    if details.collection.is_none() {
        details.collection = word_after(message, "collection: ");
    }
    if details.index.is_none() {
        details.index = word_after(message, "index: ");
    }

    details
}

fn word_after(message: &str, marker: &str) -> Option<String> {
    let start = message.find(marker)? + marker.len();
    let rest = &message[start..];
    let end = rest.find(' ')?;
    Some(rest[..end].to_string())
}
