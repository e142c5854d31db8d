use std::fmt;

type Repr = u16;

/// A SIP status code, encoded as its numeric value.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Code(Repr);

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("Code");
        tuple.field(&self.0);
        if let Some(text) = self.text() {
            tuple.field(&text);
        }
        tuple.finish()
    }
}

/// Response class, the only thing the transaction layer dispatches on
/// (§1: "it dispatches on status code class only").
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CodeKind {
    /// 100..=199
    Provisional,
    /// 200..=299
    Success,
    /// 300..=399
    Redirection,
    /// 400..=499
    RequestFailure,
    /// 500..=599
    ServerFailure,
    /// 600..=699
    GlobalFailure,
    /// Anything outside 100..=699
    Custom,
}

impl CodeKind {
    /// True for anything >= 200 (a "final" response per the glossary).
    pub fn is_final(self) -> bool {
        !matches!(self, CodeKind::Provisional)
    }
}

impl Code {
    #[inline]
    pub fn kind(self) -> CodeKind {
        match self.0 {
            100..=199 => CodeKind::Provisional,
            200..=299 => CodeKind::Success,
            300..=399 => CodeKind::Redirection,
            400..=499 => CodeKind::RequestFailure,
            500..=599 => CodeKind::ServerFailure,
            600..=699 => CodeKind::GlobalFailure,
            _ => CodeKind::Custom,
        }
    }

    #[inline]
    pub fn into_u16(self) -> Repr {
        self.0
    }
}

impl From<Repr> for Code {
    fn from(r: Repr) -> Code {
        Code(r)
    }
}

macro_rules! codes {
    ($([$code:expr => $name:ident, $text:literal];)*) => {
        impl Code {
            /// Default reason phrase for a well-known code.
            pub fn text(self) -> Option<&'static str> {
                match self.0 {
                    $($code => Some($text),)*
                    _ => None
                }
            }

            $(pub const $name: Code = Code($code);)*
        }
    };
}

codes! {
    [100 => TRYING, "Trying"];
    [180 => RINGING, "Ringing"];
    [181 => CALL_IS_BEING_FORWARDED, "Call Is Being Forwarded"];
    [182 => QUEUED, "Queued"];
    [183 => SESSION_PROGRESS, "Session Progress"];

    [200 => OK, "OK"];

    [300 => MULTIPLE_CHOICES, "Multiple Choices"];
    [301 => MOVED_PERMANENTLY, "Moved Permanently"];
    [302 => MOVED_TEMPORARILY, "Moved Temporarily"];
    [305 => USE_PROXY, "Use Proxy"];
    [380 => ALTERNATIVE_SERVICE, "Alternative Service"];

    [400 => BAD_REQUEST, "Bad Request"];
    [401 => UNAUTHORIZED, "Unauthorized"];
    [403 => FORBIDDEN, "Forbidden"];
    [404 => NOT_FOUND, "Not Found"];
    [405 => METHOD_NOT_ALLOWED, "Method Not Allowed"];
    [408 => REQUEST_TIMEOUT, "Request Timeout"];
    [480 => TEMPORARILY_UNAVAILABLE, "Temporarily Unavailable"];
    [481 => CALL_OR_TRANSACTION_DOES_NOT_EXIST, "Call/Transaction Does Not Exist"];
    [486 => BUSY_HERE, "Busy Here"];
    [487 => REQUEST_TERMINATED, "Request Terminated"];
    [488 => NOT_ACCEPTABLE_HERE, "Not Acceptable Here"];

    [500 => SERVER_INTERNAL_ERROR, "Server Internal Error"];
    [501 => NOT_IMPLEMENTED, "Not Implemented"];
    [503 => SERVICE_UNAVAILABLE, "Service Unavailable"];
    [504 => SERVER_TIMEOUT, "Server Time-out"];

    [600 => BUSY_EVERYWHERE, "Busy Everywhere"];
    [603 => DECLINE, "Decline"];
    [604 => DOES_NOT_EXIST_ANYWHERE, "Does Not Exist Anywhere"];
}
