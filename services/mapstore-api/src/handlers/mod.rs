//! HTTP handlers for REST API endpoints

pub mod authorizations;
pub mod dbrp;
pub mod health;
pub mod metrics;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;

use mapstore_core::{CoreError, IdError};

pub use health::health_check;
pub use metrics::metrics_handler;

/// Success body wrapping lookups and patches.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub content: T,
}

/// Decodes a JSON request body; any failure is the client's.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, CoreError> {
    serde_json::from_slice(body)
        .map_err(|err| CoreError::invalid(format!("invalid json structure: {err}")))
}

/// Parses a path or query identifier named `what`.
pub(crate) fn parse_id<T>(what: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr<Err = IdError>,
{
    raw.parse()
        .map_err(|err: IdError| CoreError::invalid(format!("invalid {what}: {err}")))
}

/// Parses an optional query identifier.
pub(crate) fn parse_optional_id<T>(what: &str, raw: Option<&str>) -> Result<Option<T>, CoreError>
where
    T: FromStr<Err = IdError>,
{
    raw.map(|raw| parse_id(what, raw)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapstore_core::{ErrorCode, MappingId};

    #[test]
    fn test_parse_id() {
        let id: MappingId = parse_id("id", "059af7ed2a034000").unwrap();
        assert_eq!(id, MappingId::from_u64(0x059a_f7ed_2a03_4000));

        let err = parse_id::<MappingId>("id", "xyz").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
        assert!(err.to_string().starts_with("invalid id: "));
    }

    #[test]
    fn test_decode_json_is_invalid_on_garbage() {
        let err = decode_json::<serde_json::Value>(b"{nope").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
    }
}
