// ABOUTME: Bolt message tag bytes for request and summary structures
// ABOUTME: Client-to-server tags are constructed directly; server-to-client tags are matched on receipt

use num_enum::TryFromPrimitive;

/// Client request message tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum RequestTag {
    Hello = 0x01,
    Goodbye = 0x02,
    Reset = 0x0F,
    Run = 0x10,
    Begin = 0x11,
    Commit = 0x12,
    Rollback = 0x13,
    Discard = 0x2F,
    Pull = 0x3F,
    Route = 0x66,
}

/// Server summary/detail message tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum SummaryTag {
    Success = 0x70,
    Record = 0x71,
    Ignored = 0x7E,
    Failure = 0x7F,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_tag_round_trips() {
        assert_eq!(SummaryTag::try_from(0x70).unwrap(), SummaryTag::Success);
        assert_eq!(SummaryTag::try_from(0x71).unwrap(), SummaryTag::Record);
        assert_eq!(SummaryTag::try_from(0x7E).unwrap(), SummaryTag::Ignored);
        assert_eq!(SummaryTag::try_from(0x7F).unwrap(), SummaryTag::Failure);
        assert!(SummaryTag::try_from(0x00).is_err());
    }

    #[test]
    fn request_tag_round_trips() {
        assert_eq!(RequestTag::try_from(0x01).unwrap(), RequestTag::Hello);
        assert_eq!(RequestTag::try_from(0x66).unwrap(), RequestTag::Route);
    }
}
