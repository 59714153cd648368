use uuid::Uuid;

/// Per-request caller identity, threaded through every service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Owner (supplier account) every read and write is scoped to.
    pub owner: String,
    pub user: Option<String>,
    pub request_id: String,
}

impl RequestContext {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            user: None,
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }
}
