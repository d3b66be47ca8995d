use serde_json::{Map, Value};

use crate::core::errors::ApiError;

/// Structural checks on the merged config before it is deserialized.
pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_u64_field(
            server,
            "server.max_upload_bytes",
            "max_upload_bytes",
            1,
            1_073_741_824,
        )?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(rag, "rag.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(rag, "rag.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 1_000)?;
        validate_u64_field(
            rag,
            "rag.max_context_chars",
            "max_context_chars",
            1,
            10_000_000,
        )?;
        validate_u64_field(rag, "rag.max_sessions", "max_sessions", 1, 100_000)?;
        validate_optional_string_field(rag, "rag.model", "model")?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(embedding, "embedding.dimensions", "dimensions", 1, 65_536)?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 2_048)?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(providers) = expect_optional_object(root, "providers")? {
        for (name, value) in providers {
            let path_prefix = format!("providers.{}", name);
            let entry = value
                .as_object()
                .ok_or_else(|| config_type_error(&path_prefix, "object"))?;
            validate_optional_string_field(entry, &format!("{}.base_url", path_prefix), "base_url")?;
            validate_string_array_field(entry, &format!("{}.models", path_prefix), "models")?;
        }
    }

    if let Some(retry) = expect_optional_object(root, "retry")? {
        validate_u64_field(retry, "retry.max_attempts", "max_attempts", 1, 20)?;
        validate_u64_field(retry, "retry.base_delay_ms", "base_delay_ms", 0, 600_000)?;
        validate_u64_field(retry, "retry.max_delay_ms", "max_delay_ms", 0, 600_000)?;
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_u64_field(search, "search.max_results", "max_results", 1, 20)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    map: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = map.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let number = value
        .as_u64()
        .ok_or_else(|| config_type_error(path, "unsigned integer"))?;
    if number < min || number > max {
        return Err(ApiError::BadRequest(format!(
            "Invalid config: {} must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    map: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    match map.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(config_type_error(path, "string")),
    }
}

fn validate_string_array_field(
    map: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) => {
            if items.iter().all(Value::is_string) {
                Ok(())
            } else {
                Err(config_type_error(path, "array of strings"))
            }
        }
        Some(_) => Err(config_type_error(path, "array of strings")),
    }
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid config: {} must be {}", path, expected))
}
