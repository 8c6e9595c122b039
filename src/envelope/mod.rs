//! Envelope module - the records exchanged over the channel.
//!
//! - [`WorkItem`] - one inbound unit of work, routed by its `type`
//! - [`WorkResult`] - one outbound response, correlated by `requestId`
//!
//! Both travel as camelCase JSON. Their `data` fields are opaque payload
//! text (see [`PayloadCodec`](crate::codec::PayloadCodec)).

mod work_item;
mod work_result;

pub use work_item::{WorkItem, REQUEST_ID_KEY};
pub use work_result::WorkResult;

use serde::{Deserialize, Deserializer};

/// Current time as an RFC 3339 UTC timestamp.
pub(crate) fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Treat an explicit JSON `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
