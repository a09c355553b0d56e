//! `reqwest` implementation of [`WarehouseApi`].

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::{DeserializeOwned, IgnoredAny};

use wareops_approvals::{Ticket, TicketType};
use wareops_capacity::{Container, Zone};
use wareops_core::{ContainerId, DateRange, InventoryId, TicketId, UserId, WarehouseId, ZoneId};
use wareops_inventory::InventoryItem;
use wareops_stocktake::{InventoryCheck, InventoryCheckSummary, SubmitLine};

use crate::api::{
    ApproveRequest, BatchApproval, BatchApproveRequest, NewContainer, NewZone, WarehouseApi,
    ZoneUpdate,
};
use crate::config::ClientConfig;
use crate::envelope::{Envelope, ErrorBody};
use crate::error::{ClientError, ClientResult};

/// Authenticated HTTP client for the warehouse API.
///
/// No request is ever retried here; retries are the user's call.
#[derive(Debug, Clone)]
pub struct HttpWarehouseApi {
    http: Client,
    api_url: String,
    token: String,
}

impl HttpWarehouseApi {
    pub fn new(config: &ClientConfig, token: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: token.into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        self.http.request(method, url).bearer_auth(&self.token)
    }

    /// Send and unwrap the `{message, body}` envelope.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<Option<T>> {
        let resp = req.send().await.map_err(ClientError::from_reqwest)?;
        let status = resp.status();
        let raw = resp.text().await.map_err(ClientError::from_reqwest)?;

        if !status.is_success() {
            let message = ErrorBody::parse(&raw).into_message();
            tracing::debug!(status = status.as_u16(), message = ?message, "request rejected");
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<T> =
            serde_json::from_str(&raw).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.into_body())
    }

    async fn send_unit(&self, req: RequestBuilder) -> ClientResult<()> {
        self.send::<IgnoredAny>(req).await.map(|_| ())
    }

    async fn send_list<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<Vec<T>> {
        Ok(self.send::<Vec<T>>(req).await?.unwrap_or_default())
    }

    async fn send_required<T: DeserializeOwned>(&self, req: RequestBuilder, what: &str) -> ClientResult<T> {
        self.send(req)
            .await?
            .ok_or_else(|| ClientError::Decode(format!("{what}: response has no body")))
    }
}

#[async_trait]
impl WarehouseApi for HttpWarehouseApi {
    async fn list_zones(&self, warehouse: WarehouseId) -> ClientResult<Vec<Zone>> {
        self.send_list(self.request(Method::GET, &format!("/warehouses/{warehouse}/zones")))
            .await
    }

    async fn list_containers(&self, zone: ZoneId) -> ClientResult<Vec<Container>> {
        self.send_list(self.request(Method::GET, &format!("/warehouse/container/zone/{zone}")))
            .await
    }

    async fn zone_items(&self, zone: ZoneId) -> ClientResult<Vec<InventoryItem>> {
        self.send_list(self.request(Method::GET, &format!("/inventory/zones/{zone}/items")))
            .await
    }

    async fn update_zone(&self, warehouse: WarehouseId, user: UserId, update: &ZoneUpdate) -> ClientResult<()> {
        let req = self
            .request(Method::PUT, &format!("/warehouses/{warehouse}/zones"))
            .query(&[("userId", user.get())])
            .json(update);
        self.send_unit(req).await
    }

    async fn delete_zone(&self, zone: ZoneId) -> ClientResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/warehouses/zones/{zone}")))
            .await
    }

    async fn create_zone(&self, warehouse: WarehouseId, user: UserId, zone: &NewZone) -> ClientResult<Zone> {
        let req = self
            .request(Method::POST, &format!("/warehouses/{warehouse}/zones"))
            .query(&[("userId", user.get())])
            .json(zone);
        self.send_required(req, "create zone").await
    }

    async fn create_container(&self, container: &NewContainer) -> ClientResult<Container> {
        let req = self.request(Method::POST, "/warehouse/container").json(container);
        self.send_required(req, "create container").await
    }

    async fn delete_container(&self, container: ContainerId) -> ClientResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/warehouse/container/{container}")))
            .await
    }

    async fn start_stocktake(&self, warehouse: WarehouseId, created_by: UserId) -> ClientResult<InventoryCheckSummary> {
        let req = self
            .request(Method::POST, "/inventory-check/start")
            .query(&[("warehouseId", warehouse.get()), ("createdBy", created_by.get())]);
        self.send_required(req, "start stocktake").await
    }

    async fn fetch_stocktake(&self, inventory: InventoryId) -> ClientResult<InventoryCheck> {
        let req = self.request(Method::GET, &format!("/inventory-check/{inventory}"));
        self.send_required(req, "fetch stocktake").await
    }

    async fn submit_stocktake(&self, inventory: InventoryId, lines: &[SubmitLine]) -> ClientResult<()> {
        let req = self
            .request(Method::POST, &format!("/inventory-check/process/{inventory}"))
            .json(lines);
        self.send_unit(req).await
    }

    async fn in_progress_stocktakes(&self, range: DateRange) -> ClientResult<Vec<InventoryCheckSummary>> {
        let req = self
            .request(Method::GET, "/inventory-check/in-progress")
            .query(&range.query_pairs());
        self.send_list(req).await
    }

    async fn tickets(&self, ticket_type: TicketType, range: DateRange) -> ClientResult<Vec<Ticket>> {
        let req = self
            .request(Method::GET, &format!("/tickets/{ticket_type}"))
            .query(&range.query_pairs());
        self.send_list(req).await
    }

    async fn approve_ticket(&self, ticket: TicketId, manager: UserId) -> ClientResult<()> {
        let req = self.request(Method::PUT, "/ticket/allow").json(&ApproveRequest {
            ticket_id: ticket,
            managed_id: manager,
        });
        self.send_unit(req).await
    }

    async fn approve_batch(&self, tickets: &[TicketId], manager: UserId) -> ClientResult<BatchApproval> {
        let req = self.request(Method::PUT, "/ticket/allow/batch").json(&BatchApproveRequest {
            ticket_ids: tickets.to_vec(),
            managed_id: manager,
        });
        Ok(self
            .send::<BatchApproval>(req)
            .await?
            .unwrap_or_else(|| BatchApproval::all(tickets)))
    }

    async fn cancel_ticket(&self, ticket: TicketId) -> ClientResult<()> {
        self.send_unit(self.request(Method::DELETE, &format!("/ticket/{ticket}")))
            .await
    }

    async fn execute_write_off(&self, ticket: TicketId) -> ClientResult<()> {
        self.send_unit(self.request(Method::PUT, &format!("/ticket/write-off/{ticket}")))
            .await
    }
}
