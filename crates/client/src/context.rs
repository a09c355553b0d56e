//! Per-login session: who is signed in, what they may do, and the services
//! bound to that identity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use wareops_auth::{authorize, Capability, CapabilitySet, Principal};
use wareops_core::UserId;

use crate::api::WarehouseApi;
use crate::approvals::ApprovalService;
use crate::capacity::CapacityService;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::HttpWarehouseApi;
use crate::latest::LatestRequests;
use crate::stocktake::StocktakeService;

/// What every service needs from its session.
#[derive(Clone)]
pub(crate) struct SessionHandle {
    pub(crate) api: Arc<dyn WarehouseApi>,
    pub(crate) principal: Arc<Principal>,
    pub(crate) latest: LatestRequests,
}

impl SessionHandle {
    pub(crate) fn require(&self, capability: Capability) -> ClientResult<()> {
        authorize(&self.principal, capability)?;
        Ok(())
    }

    pub(crate) fn user_id(&self) -> UserId {
        self.principal.user_id
    }
}

/// Created at login, torn down at logout. Replaces any process-wide store:
/// everything session-scoped hangs off this value.
pub struct SessionContext {
    id: Uuid,
    opened_at: DateTime<Utc>,
    handle: SessionHandle,
}

impl SessionContext {
    pub fn new(api: Arc<dyn WarehouseApi>, principal: Principal) -> Self {
        let id = Uuid::now_v7();
        tracing::info!(
            session_id = %id,
            user_id = %principal.user_id,
            roles = ?principal.roles,
            "session opened"
        );
        Self {
            id,
            opened_at: Utc::now(),
            handle: SessionHandle {
                api,
                principal: Arc::new(principal),
                latest: LatestRequests::new(),
            },
        }
    }

    /// Open a session against the HTTP API; role names resolve once here.
    pub fn login<S: AsRef<str>>(
        config: &ClientConfig,
        token: impl Into<String>,
        user_id: UserId,
        role_names: &[S],
    ) -> anyhow::Result<Self> {
        let api = HttpWarehouseApi::new(config, token)?;
        let principal = Principal::from_role_names(user_id, role_names);
        Ok(Self::new(Arc::new(api), principal))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn principal(&self) -> &Principal {
        &self.handle.principal
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.handle.principal.capabilities()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.handle.principal.can(capability)
    }

    pub fn latest_requests(&self) -> &LatestRequests {
        &self.handle.latest
    }

    pub fn capacity(&self) -> CapacityService {
        CapacityService::new(self.handle.clone())
    }

    pub fn stocktake(&self) -> StocktakeService {
        StocktakeService::new(self.handle.clone())
    }

    pub fn approvals(&self) -> ApprovalService {
        ApprovalService::new(self.handle.clone())
    }

    /// Abort every in-flight list request; waiting callers see `Cancelled`.
    pub fn teardown(&self) {
        tracing::info!(session_id = %self.id, "session closed");
        self.handle.latest.cancel_all();
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.handle.latest.cancel_all();
    }
}
