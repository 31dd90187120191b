// Decoded response bodies.
//
// The firewall speaks two dialects: structured JSON from the REST API and
// XML documents from the legacy `/api/?type=op` surface. Both are carried in
// one closed variant so downstream code pattern-matches instead of guessing.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;

/// Marker that identifies a legacy XML API document.
pub const LEGACY_DOCUMENT_MARKER: &str = "<response";

/// Field name under which a raw legacy document is exposed as a record.
pub const RAW_DOCUMENT_FIELD: &str = "result";

/// Raw decoded response for one report type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportPayload {
    /// Parsed JSON body.
    Structured(Value),
    /// Legacy XML document, kept verbatim.
    RawDocument(String),
}

/// Coarse shape of a payload, used for export dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// A single field -> value mapping.
    Record,
    /// An ordered sequence of mappings.
    Records,
    /// A sequence containing at least one non-mapping entry.
    MixedSequence,
    /// A JSON scalar (string, number, bool, null).
    Scalar,
    /// A verbatim legacy document.
    RawDocument,
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Record => "single record",
            Self::Records => "record sequence",
            Self::MixedSequence => "sequence with non-record entries",
            Self::Scalar => "scalar value",
            Self::RawDocument => "raw legacy document",
        };
        f.write_str(name)
    }
}

impl ReportPayload {
    /// Decode a response body, tolerating the legacy XML dialect.
    pub fn decode(body: &str) -> Result<Self, Error> {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Ok(Self::Structured(value)),
            Err(_) if body.contains(LEGACY_DOCUMENT_MARKER) => {
                Ok(Self::RawDocument(body.to_owned()))
            }
            Err(e) => {
                let preview: String = body.chars().take(200).collect();
                Err(Error::Decode {
                    message: format!("{e} (body preview: {preview:?})"),
                })
            }
        }
    }

    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::RawDocument(_) => PayloadShape::RawDocument,
            Self::Structured(Value::Object(_)) => PayloadShape::Record,
            Self::Structured(Value::Array(items)) => {
                if items.iter().all(Value::is_object) {
                    PayloadShape::Records
                } else {
                    PayloadShape::MixedSequence
                }
            }
            Self::Structured(_) => PayloadShape::Scalar,
        }
    }

    /// View the payload as a single record, if it has that shape.
    ///
    /// Raw documents are exposed as `{"result": <document>}`.
    pub fn as_record(&self) -> Option<Map<String, Value>> {
        match self {
            Self::Structured(Value::Object(map)) => Some(map.clone()),
            Self::RawDocument(text) => {
                let mut map = Map::new();
                map.insert(RAW_DOCUMENT_FIELD.into(), Value::String(text.clone()));
                Some(map)
            }
            Self::Structured(_) => None,
        }
    }

    /// Flatten the payload into the list of items a scan visits.
    ///
    /// A record yields one item, a sequence yields its entries, scalars
    /// yield nothing.
    pub fn items(&self) -> Vec<Value> {
        match self {
            Self::Structured(Value::Array(items)) => items.clone(),
            Self::Structured(Value::Object(_)) | Self::RawDocument(_) => self
                .as_record()
                .map(|map| vec![Value::Object(map)])
                .unwrap_or_default(),
            Self::Structured(_) => Vec::new(),
        }
    }
}
