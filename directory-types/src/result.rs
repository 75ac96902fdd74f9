use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Outcome code carried in the `result` field of every response.
///
/// The numeric values are part of the wire contract with game clients and
/// must never be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ResultCode {
    Success = 0,
    Error = 1,
    AlreadyLoggedInError = 2,
    ServerNotFound = 3,
    RequestInvalid = 4,
    AccountNotFound = 5,
    AccountAlreadyExists = 6,
}

impl ResultCode {
    pub const ALL: [ResultCode; 7] = [
        ResultCode::Success,
        ResultCode::Error,
        ResultCode::AlreadyLoggedInError,
        ResultCode::ServerNotFound,
        ResultCode::RequestInvalid,
        ResultCode::AccountNotFound,
        ResultCode::AccountAlreadyExists,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|result| result.code() == code)
    }

    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}

impl Serialize for ResultCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ResultCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        ResultCode::from_code(code)
            .ok_or_else(|| D::Error::custom(format!("unknown result code {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ResultCode::Success.code(), 0);
        assert_eq!(ResultCode::Error.code(), 1);
        assert_eq!(ResultCode::AlreadyLoggedInError.code(), 2);
        assert_eq!(ResultCode::ServerNotFound.code(), 3);
        assert_eq!(ResultCode::RequestInvalid.code(), 4);
        assert_eq!(ResultCode::AccountNotFound.code(), 5);
        assert_eq!(ResultCode::AccountAlreadyExists.code(), 6);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ResultCode::AccountNotFound).unwrap();
        assert_eq!(json, "5");

        let parsed: ResultCode = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, ResultCode::AlreadyLoggedInError);
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(serde_json::from_str::<ResultCode>("42").is_err());
        assert_eq!(ResultCode::from_code(7), None);
    }
}
