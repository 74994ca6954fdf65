pub mod conversation;
pub mod cursor;
pub mod message;
pub mod receipts;
pub mod tips;

use log::warn;
use serde::Serialize;

/// Encodes a payload destined for a JSON column or the UI listener. The
/// payload types here cannot realistically fail to serialize; if one ever
/// does, an empty object is handed on and the failure is logged rather than
/// aborting the surrounding read-state transition.
pub(crate) fn to_json_string<T: Serialize>(value: &T) -> String {
    match serde_json::to_string(value) {
        Ok(s) => s,
        Err(e) => {
            warn!(target: "ReadState", "failed to encode payload: {e}");
            String::from("{}")
        }
    }
}
