//! Decoding and validation of the inbound lookup request.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

use crate::error::RelayError;

const CEP_LEN: usize = 8;

/// Body of `POST /cep`. An absent or `null` `cep` field, and a `null` body,
/// decode as an empty code and are rejected later by [`Cep::parse`]. Any
/// other non-object body is a decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct CepRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cep: String,
}

impl CepRequest {
    pub fn decode(body: &[u8]) -> Result<Self, RelayError> {
        let value: Value = serde_json::from_slice(body).map_err(RelayError::Decode)?;
        match value {
            Value::Null => Ok(CepRequest::default()),
            Value::Object(_) => serde_json::from_value(value).map_err(RelayError::Decode),
            _ => Err(RelayError::Decode(serde_json::Error::custom(
                "expected a JSON object",
            ))),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A postal code known to be exactly eight ASCII digits.
///
/// Kept as text so leading zeros survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cep(String);

impl Cep {
    pub fn parse(code: &str) -> Result<Self, RelayError> {
        if is_valid(code) {
            Ok(Cep(code.to_string()))
        } else {
            Err(RelayError::InvalidFormat)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Byte length equals char length once every byte is an ASCII digit.
fn is_valid(code: &str) -> bool {
    code.len() == CEP_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
