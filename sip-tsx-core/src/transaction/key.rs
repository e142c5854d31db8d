use sip_tsx_types::{MessageView, Method};
use std::fmt;

/// Transaction key, used to match a message to an ongoing transaction
/// (§3 "Transaction key", §4.D "Transaction matcher").
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TsxKey(Repr);

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum Repr {
    /// Branch carries the RFC 3261 cookie: matching is branch + method-for-matching + role.
    Cookie {
        role: Role,
        branch: String,
        method: Option<Method>,
    },
    /// No cookie on the branch. The core's `MessageView` contract exposes
    /// only method/status/branch/cseq-method/top-Via-protocol (spec.md §6),
    /// which isn't enough to reconstruct RFC 2543's legacy matching tuple
    /// (From-tag, Call-ID, Via sent-by); matching degrades to method+role
    /// only. See DESIGN.md for the tradeoff.
    NoCookie { role: Role, method: Option<Method> },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
enum Role {
    Client,
    Server,
}

impl fmt::Display for TsxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (role, method) = match &self.0 {
            Repr::Cookie { role, method, .. } => (role, method),
            Repr::NoCookie { role, method } => (role, method),
        };

        write!(f, "{}:", if *role == Role::Server { "server" } else { "client" })?;

        match method {
            Some(m) => write!(f, "{m}")?,
            None => write!(f, "INVITE")?,
        }

        if let Repr::Cookie { branch, .. } = &self.0 {
            write!(f, ":{branch}")?;
        }

        Ok(())
    }
}

/// Folds INVITE and ACK onto the same matching bucket, so an inbound ACK
/// matches the server-INVITE transaction it acknowledges (§3).
fn filter_method(method: &Method) -> Option<Method> {
    if method.is_invite() || method.is_ack() {
        None
    } else {
        Some(method.clone())
    }
}

impl TsxKey {
    #[inline]
    pub fn is_server(&self) -> bool {
        match &self.0 {
            Repr::Cookie { role, .. } | Repr::NoCookie { role, .. } => *role == Role::Server,
        }
    }

    /// True when this key's method-for-matching bucket is the INVITE/ACK one.
    #[inline]
    pub fn is_invite(&self) -> bool {
        match &self.0 {
            Repr::Cookie { method, .. } | Repr::NoCookie { method, .. } => method.is_none(),
        }
    }

    /// Key for a newly-originated client transaction, derived from the
    /// request's own Via branch. Must reuse that branch rather than mint a
    /// fresh one: the eventual response echoes the request's branch, and
    /// `from_message` computes its matching key from that echoed branch, so
    /// a generated branch the request itself never carries on the wire would
    /// never match any inbound response (§4.D).
    pub fn client<M: MessageView>(request: &M) -> Self {
        Self::from_view(request, Role::Client)
    }

    /// The branch this key was generated with, if any (client transactions
    /// always have one; inbound messages without the cookie do not).
    pub fn branch(&self) -> Option<&str> {
        match &self.0 {
            Repr::Cookie { branch, .. } => Some(branch),
            Repr::NoCookie { .. } => None,
        }
    }

    fn from_view<M: MessageView>(msg: &M, role: Role) -> Self {
        let branch = msg.branch();
        let method = filter_method(msg.cseq_method());

        if branch.is_empty() {
            TsxKey(Repr::NoCookie { role, method })
        } else {
            TsxKey(Repr::Cookie {
                role,
                branch: branch.to_owned(),
                method,
            })
        }
    }

    /// Compute the key role-appropriately: requests match on the server
    /// role, responses on the client role (§4.D).
    pub fn from_message<M: MessageView>(msg: &M) -> Self {
        let role = if msg.is_request() { Role::Server } else { Role::Client };
        Self::from_view(msg, role)
    }
}
