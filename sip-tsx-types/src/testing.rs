//! Minimal concrete [`MessageView`]/[`MessageFactory`] implementation used by
//! `sip-tsx-core`'s test suite (and anyone else wiring up the crate without
//! a real parser). Not a SIP parser: fields are set directly by the caller.

use crate::{Code, MessageFactory, MessageView, Method};

/// A message built from plain fields instead of parsed bytes.
#[derive(Debug, Clone)]
pub struct TestMessage {
    pub is_request: bool,
    pub method: Method,
    pub status_code: Option<Code>,
    pub branch: String,
    pub cseq_method: Method,
    pub cseq: u32,
    pub top_via_protocol: String,
    pub call_id: String,
    pub from_tag: String,
    pub to_tag: Option<String>,
}

impl MessageView for TestMessage {
    fn is_request(&self) -> bool {
        self.is_request
    }

    fn method(&self) -> &Method {
        &self.method
    }

    fn status_code(&self) -> Option<Code> {
        self.status_code
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn cseq_method(&self) -> &Method {
        &self.cseq_method
    }

    fn top_via_protocol(&self) -> &str {
        &self.top_via_protocol
    }
}

impl TestMessage {
    pub fn request(method: Method, branch: impl Into<String>, protocol: &str) -> Self {
        TestMessage {
            is_request: true,
            cseq_method: method.clone(),
            method,
            status_code: None,
            branch: branch.into(),
            cseq: 1,
            top_via_protocol: protocol.to_owned(),
            call_id: "test-call-id".to_owned(),
            from_tag: "from-tag".to_owned(),
            to_tag: None,
        }
    }

    pub fn response(&self, status: Code) -> Self {
        let mut resp = self.clone();
        resp.is_request = false;
        resp.status_code = Some(status);
        resp.to_tag = Some(format!("to-tag-{}", status.into_u16()));
        resp
    }
}

/// A [`MessageFactory`] that operates purely on [`TestMessage`] field copies.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestMessageFactory;

impl MessageFactory<TestMessage> for TestMessageFactory {
    fn create_response(&self, request: &TestMessage, status: Code, _reason: Option<&str>) -> TestMessage {
        let mut response = request.response(status);
        response.cseq_method = request.method.clone();
        response
    }

    fn create_ack(&self, request: &TestMessage, response: &TestMessage) -> TestMessage {
        TestMessage {
            is_request: true,
            method: Method::ACK,
            cseq_method: Method::ACK,
            status_code: None,
            branch: request.branch.clone(),
            cseq: request.cseq,
            top_via_protocol: request.top_via_protocol.clone(),
            call_id: request.call_id.clone(),
            from_tag: request.from_tag.clone(),
            to_tag: response.to_tag.clone(),
        }
    }
}
