// ezsign/src/protocol/mod.rs

//! Application-layer protocol: APDU construction, the TLV device
//! descriptor, and status-word handling.

pub mod apdu;
pub mod device_info;
pub mod tlv;

pub use apdu::{is_refresh_complete, parse_response_body, Apdu};
pub use device_info::DeviceInfo;
pub use tlv::{parse_tlv, serialize_tlv};
