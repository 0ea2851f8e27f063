//! DnsPod legacy API (dnsapi.cn) response types

use bras_ddns_core::traits::{RecordMetadata, RecordType};
use serde::{Deserialize, Deserializer};

/// `status.code` value meaning success
pub const STATUS_OK: i64 = 1;

/// Fields common to every response
#[derive(Debug, Deserialize)]
pub struct BaseResponse {
    pub status: Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    /// Sent as a string ("1"), accepted as an integer too
    #[serde(deserialize_with = "int_or_string")]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }
}

/// `Record.List` response
#[derive(Debug, Deserialize)]
pub struct RecordListResponse {
    pub status: Status,
    /// Absent when the listing failed
    pub records: Option<Vec<RecordInfo>>,
}

/// One record from `Record.List`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInfo {
    #[serde(deserialize_with = "string_or_int")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(deserialize_with = "string_or_int")]
    pub line_id: String,
    pub value: String,
}

impl RecordInfo {
    /// Convert to cached metadata; `None` for record types we never touch
    pub fn into_metadata(self) -> Option<RecordMetadata> {
        let record_type: RecordType = self.record_type.parse().ok()?;
        Some(RecordMetadata {
            id: self.id,
            name: self.name,
            record_type,
            line_id: self.line_id,
            value: self.value,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

fn int_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => Ok(n),
        IntOrString::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid status code: {:?}", s))),
    }
}

fn string_or_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match IntOrString::deserialize(deserializer)? {
        IntOrString::Int(n) => n.to_string(),
        IntOrString::Str(s) => s,
    })
}
