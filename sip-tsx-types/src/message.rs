use crate::{Code, Method};

/// Read-only projection of a parsed SIP message.
///
/// This is the entire surface the transaction core consumes from a message;
/// grammar, headers beyond these few fields, and serialization are the
/// external parser's business (see `spec.md` §1, §6).
pub trait MessageView: Clone + Send + Sync + 'static {
    /// `true` for requests, `false` for responses.
    fn is_request(&self) -> bool;

    /// `true` for responses, `false` for requests.
    fn is_response(&self) -> bool {
        !self.is_request()
    }

    /// The request method, or the CSeq method for a response.
    fn method(&self) -> &Method;

    /// `Some(code)` for a response, `None` for a request.
    fn status_code(&self) -> Option<Code>;

    /// The branch parameter of the top Via header, or `""` if it does not
    /// carry the RFC 3261 magic cookie `z9hG4bK`.
    fn branch(&self) -> &str;

    /// The method carried by the CSeq header (equal to `method()` for a
    /// request; the method the response is answering for a response).
    fn cseq_method(&self) -> &Method;

    /// The transport protocol named by the top Via header (`"UDP"`,
    /// `"TCP"`, `"TLS"`, ...), used only to classify a message for matching
    /// and diagnostics.
    fn top_via_protocol(&self) -> &str;
}

/// External collaborator that builds new messages on behalf of the core.
///
/// The core never serializes or synthesizes SIP grammar itself; it asks
/// this factory (normally backed by the same library that parsed the
/// inbound message) to produce the handful of derived messages the state
/// machines in §4.E need to emit.
pub trait MessageFactory<M: MessageView>: Send + Sync + 'static {
    /// Build a response to `request` with the given status and optional
    /// reason phrase, copying To/From/Call-ID/CSeq/Via as RFC 3261 requires.
    /// Used by server transactions to generate `100 Trying` (§4.E.1) and by
    /// the TU to build its own responses.
    fn create_response(&self, request: &M, status: Code, reason: Option<&str>) -> M;

    /// Deterministically build the ACK for a non-2xx final response, per
    /// RFC 3261 §17.1.1.3: same Call-ID, From tag, To tag-of-response, CSeq
    /// number with method ACK, and the top Via of the original request
    /// (§4.E.3). Used by the client INVITE transaction only; 2xx ACKs are a
    /// dialog-layer concern and out of scope here.
    fn create_ack(&self, request: &M, response: &M) -> M;
}
