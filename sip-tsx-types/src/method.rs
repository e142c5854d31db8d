use std::fmt;

/// A SIP method token.
///
/// Mirrors the well-known methods as constants and falls back to an owned
/// string for extension methods, the way most SIP stacks represent it
/// (case-insensitive comparison, case-preserving display).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Method(Repr);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum Repr {
    Invite,
    Ack,
    Bye,
    Cancel,
    Register,
    Options,
    Prack,
    Subscribe,
    Notify,
    Publish,
    Info,
    Refer,
    Message,
    Update,
    Other(String),
}

macro_rules! methods {
    ($($print:literal, $ident:ident;)+) => {
        impl Method {
            $(pub const $ident: Method = Method(Repr::$ident);)+
        }

        impl fmt::Display for Method {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    $(Repr::$ident => f.write_str($print),)+
                    Repr::Other(other) => f.write_str(other),
                }
            }
        }

        impl From<&str> for Method {
            fn from(s: &str) -> Self {
                $(
                if s.eq_ignore_ascii_case($print) {
                    return Method::$ident;
                }
                )+
                Method(Repr::Other(s.to_owned()))
            }
        }
    };
}

methods! {
    "INVITE", INVITE;
    "ACK", ACK;
    "BYE", BYE;
    "CANCEL", CANCEL;
    "REGISTER", REGISTER;
    "OPTIONS", OPTIONS;
    "PRACK", PRACK;
    "SUBSCRIBE", SUBSCRIBE;
    "NOTIFY", NOTIFY;
    "PUBLISH", PUBLISH;
    "INFO", INFO;
    "REFER", REFER;
    "MESSAGE", MESSAGE;
    "UPDATE", UPDATE;
}

impl Method {
    /// True for the two methods that never open their own server transaction
    /// under the matching rules of §6 (INVITE opens one, ACK never does).
    pub fn is_invite(&self) -> bool {
        matches!(self.0, Repr::Invite)
    }

    pub fn is_ack(&self) -> bool {
        matches!(self.0, Repr::Ack)
    }
}
