//! Outbound actuator commands.
//!
//! The device accepts `!B<n>@` where `n` is a single digit in `0..=4`.

use crate::core::posture::PostureStatus;

/// Highest actuator code the device understands.
pub const MAX_COMMAND_CODE: i64 = 4;

/// Encode a posture state as its fixed command string.
pub fn encode(status: PostureStatus) -> &'static str {
    match status {
        PostureStatus::LeanLeft => "!B0@",
        PostureStatus::LeanForward => "!B1@",
        PostureStatus::LeanRight => "!B2@",
        PostureStatus::LeanBack => "!B3@",
        PostureStatus::Steady => "!B4@",
    }
}

/// Encode a raw actuator code. Codes outside `0..=4` yield an empty string.
pub fn encode_raw(code: i64) -> String {
    if (0..=MAX_COMMAND_CODE).contains(&code) {
        format!("!B{code}@")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(encode(PostureStatus::LeanLeft), "!B0@");
        assert_eq!(encode(PostureStatus::LeanForward), "!B1@");
        assert_eq!(encode(PostureStatus::LeanRight), "!B2@");
        assert_eq!(encode(PostureStatus::LeanBack), "!B3@");
        assert_eq!(encode(PostureStatus::Steady), "!B4@");
    }

    #[test]
    fn test_status_agrees_with_raw_code() {
        for status in PostureStatus::ALL {
            assert_eq!(encode(status), encode_raw(status.command_code() as i64));
        }
    }

    #[test]
    fn test_raw_out_of_range() {
        assert_eq!(encode_raw(0), "!B0@");
        assert_eq!(encode_raw(4), "!B4@");
        assert_eq!(encode_raw(5), "");
        assert_eq!(encode_raw(-1), "");
        assert_eq!(encode_raw(i64::MAX), "");
    }
}
