//! FIX tag constants and helpers for walking a message's tag=value form
//!
//! The session library owns wire framing, validation and sequencing; what
//! it hands the application callbacks is re-serialized here into the flat
//! SOH-separated text every FIX implementation can produce, and these
//! helpers pull fields back out of that text. Repeating-group structure
//! is recovered positionally by the decoder in `parser`.

/// FIX field separator.
pub const SOH: char = '\x01';

pub const MSG_TYPE: u32 = 35;
pub const MSG_SEQ_NUM: u32 = 34;
pub const SENDER_COMP_ID: u32 = 49;
pub const SENDING_TIME: u32 = 52;
pub const SYMBOL: u32 = 55;
pub const TARGET_COMP_ID: u32 = 56;
pub const RAW_DATA_LENGTH: u32 = 95;
pub const RAW_DATA: u32 = 96;
pub const NO_RELATED_SYM: u32 = 146;
pub const MD_REQ_ID: u32 = 262;
pub const SUBSCRIPTION_REQUEST_TYPE: u32 = 263;
pub const MARKET_DEPTH: u32 = 264;
pub const NO_MD_ENTRY_TYPES: u32 = 267;
pub const NO_MD_ENTRIES: u32 = 268;
pub const MD_ENTRY_TYPE: u32 = 269;
pub const MD_ENTRY_PX: u32 = 270;
pub const MD_ENTRY_SIZE: u32 = 271;
pub const MD_UPDATE_ACTION: u32 = 279;
pub const USERNAME: u32 = 553;

/// Venue-specific Logon field selecting per-stream sequential delivery.
pub const MESSAGE_HANDLING: u32 = 25035;

pub const MSG_TYPE_LOGON: &str = "A";
pub const MSG_TYPE_MARKET_DATA_REQUEST: &str = "V";
pub const MSG_TYPE_SNAPSHOT: &str = "W";
pub const MSG_TYPE_INCREMENTAL: &str = "X";

/// Iterate `(tag, value)` pairs of a tag=value message text in wire order.
///
/// Malformed chunks (no `=`, non-numeric tag) are skipped rather than
/// reported; the session library has already validated the message.
pub fn fields(raw: &str) -> impl Iterator<Item = (u32, &str)> {
    raw.split(SOH).filter_map(|chunk| {
        let (tag, value) = chunk.split_once('=')?;
        Some((tag.parse().ok()?, value))
    })
}

/// First occurrence of `tag` in wire order, if any.
pub fn field(raw: &str, tag: u32) -> Option<&str> {
    fields(raw).find(|(t, _)| *t == tag).map(|(_, v)| v)
}

/// First occurrence of `tag`, decoded as a single character.
pub fn char_field(raw: &str, tag: u32) -> Option<char> {
    field(raw, tag).and_then(|v| v.chars().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let raw = "8=FIX.4.4\u{1}35=W\u{1}55=BTCUSDT\u{1}268=2\u{1}";
        assert_eq!(field(raw, MSG_TYPE), Some("W"));
        assert_eq!(field(raw, SYMBOL), Some("BTCUSDT"));
        assert_eq!(field(raw, NO_MD_ENTRIES), Some("2"));
        assert_eq!(field(raw, MD_REQ_ID), None);
    }

    #[test]
    fn test_fields_preserve_wire_order() {
        let raw = "269=0\u{1}270=100.5\u{1}271=1\u{1}269=1\u{1}270=101\u{1}271=2";
        let tags: Vec<u32> = fields(raw).map(|(t, _)| t).collect();
        assert_eq!(tags, vec![269, 270, 271, 269, 270, 271]);
    }

    #[test]
    fn test_malformed_chunks_skipped() {
        let raw = "35=X\u{1}garbage\u{1}abc=1\u{1}55=ETHUSDT";
        assert_eq!(field(raw, SYMBOL), Some("ETHUSDT"));
        assert_eq!(fields(raw).count(), 2);
    }
}
