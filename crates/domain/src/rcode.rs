use hickory_proto::op::ResponseCode;
use std::fmt;

/// A DNS response code reported by an upstream that answered, as opposed to
/// a transport that failed to answer at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RCodeError(pub u16);

impl RCodeError {
    pub const SUCCESS: RCodeError = RCodeError(0);
    pub const FORMAT_ERROR: RCodeError = RCodeError(1);
    pub const SERVER_FAILURE: RCodeError = RCodeError(2);
    pub const NAME_ERROR: RCodeError = RCodeError(3);
    pub const NOT_IMPLEMENTED: RCodeError = RCodeError(4);
    pub const REFUSED: RCodeError = RCodeError(5);

    pub fn code(self) -> u16 {
        self.0
    }

    pub fn response_code(self) -> ResponseCode {
        <ResponseCode as From<u16>>::from(self.0)
    }
}

impl From<ResponseCode> for RCodeError {
    fn from(code: ResponseCode) -> Self {
        RCodeError(u16::from(code))
    }
}

impl fmt::Display for RCodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RCodeError::SUCCESS => f.write_str("success"),
            RCodeError::FORMAT_ERROR => f.write_str("format error"),
            RCodeError::SERVER_FAILURE => f.write_str("server failure"),
            RCodeError::NAME_ERROR => f.write_str("name error"),
            RCodeError::NOT_IMPLEMENTED => f.write_str("not implemented"),
            RCodeError::REFUSED => f.write_str("refused"),
            RCodeError(code) => write!(f, "unknown error: {}", code),
        }
    }
}

impl std::error::Error for RCodeError {}
