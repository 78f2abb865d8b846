//! Local data operations served by a node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AccessError, MigrationError};
use crate::storage::Record;

/// Operation kind of an [`Access`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Put,
    Get,
    Delete,
    Scan,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Put => "PUT",
            Method::Get => "GET",
            Method::Delete => "DELETE",
            Method::Scan => "SCAN",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PUT" => Ok(Method::Put),
            "GET" => Ok(Method::Get),
            "DELETE" => Ok(Method::Delete),
            "SCAN" => Ok(Method::Scan),
            _ => Err(AccessError::InvalidOperation(s.to_string())),
        }
    }
}

/// A data access request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Put { key: i64, value: String },
    Get { key: i64 },
    Delete { key: i64 },
    /// Records on the arc from `from_partition` to `to_partition`; see
    /// [`RecordStore::scan`](crate::RecordStore::scan).
    Scan { from_partition: i32, to_partition: i32 },
}

impl Access {
    pub fn method(&self) -> Method {
        match self {
            Access::Put { .. } => Method::Put,
            Access::Get { .. } => Method::Get,
            Access::Delete { .. } => Method::Delete,
            Access::Scan { .. } => Method::Scan,
        }
    }
}

/// Successful outcome of an [`Access`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// PUT and DELETE.
    Done,
    /// GET; `None` when the key is absent.
    Value(Option<Record>),
    /// SCAN, as `(partition, record)` pairs.
    Entries(Vec<(i32, Record)>),
}

impl Reply {
    /// The value of a GET reply, `None` for any other reply.
    pub fn into_value(self) -> Option<Record> {
        match self {
            Reply::Value(record) => record,
            _ => None,
        }
    }

    pub(crate) fn into_entries(self) -> Result<Vec<(i32, Record)>, MigrationError> {
        match self {
            Reply::Entries(entries) => Ok(entries),
            _ => Err(MigrationError::UnexpectedReply(Method::Scan.to_string())),
        }
    }
}
