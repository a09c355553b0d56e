//! Drives one stocktake: start or resume, zone-by-zone item collection,
//! counted quantities, submission.

use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;

use wareops_auth::Capability;
use wareops_core::{DateRange, DomainError, InventoryId, WarehouseId, ZoneId};
use wareops_stocktake::{DiscrepancyReport, InventoryCheckSummary, StocktakeSession};

use crate::context::SessionHandle;
use crate::error::{ClientError, ClientResult};
use crate::inflight::InFlight;
use crate::{joined, lock};

const IN_PROGRESS_KEY: &str = "stocktake.in-progress";
/// Start and resume both fill the one session slot.
const SESSION_SLOT: &str = "open session";

#[derive(Clone)]
pub struct StocktakeService {
    session: SessionHandle,
    state: Arc<Mutex<Option<StocktakeSession>>>,
    opening: InFlight<&'static str>,
    submits: InFlight<InventoryId>,
}

impl StocktakeService {
    pub(crate) fn new(session: SessionHandle) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(None)),
            opening: InFlight::new("stocktake start or resume"),
            submits: InFlight::new("stocktake submission"),
        }
    }

    /// Open a stocktake for `warehouse`.
    ///
    /// With a stocktake already open for the same warehouse this is a no-op
    /// returning its id; one open for another warehouse is a `Conflict`. A
    /// start while another start or resume is in flight fails with `Busy`.
    #[tracing::instrument(skip(self), fields(warehouse_id = %warehouse))]
    pub async fn start(&self, warehouse: WarehouseId) -> ClientResult<InventoryId> {
        self.session.require(Capability::RunStocktake)?;
        let _guard = self.opening.try_acquire(SESSION_SLOT)?;
        if let Some(open) = self.open_for(warehouse)? {
            tracing::debug!(inventory_id = %open, "stocktake already open");
            return Ok(open);
        }

        let created = self
            .session
            .api
            .start_stocktake(warehouse, self.session.user_id())
            .await?;

        let mut session = StocktakeSession::new(warehouse);
        session.begin(created.id)?;
        *lock(&self.state) = Some(session);
        tracing::info!(inventory_id = %created.id, "stocktake started");
        Ok(created.id)
    }

    /// Rebuild an interrupted stocktake from the server's record alone.
    ///
    /// A no-op when that stocktake is already open here. Any other open
    /// stocktake is a `Conflict`: its unsubmitted counts are never replaced.
    #[tracing::instrument(skip(self), fields(inventory_id = %inventory))]
    pub async fn resume(&self, inventory: InventoryId) -> ClientResult<()> {
        self.session.require(Capability::RunStocktake)?;
        let _guard = self.opening.try_acquire(SESSION_SLOT)?;
        {
            let state = lock(&self.state);
            match state.as_ref().filter(|s| s.is_open()) {
                Some(open) if open.inventory_id() == Some(inventory) => {
                    tracing::debug!("stocktake already open");
                    return Ok(());
                }
                Some(open) => {
                    return Err(DomainError::conflict(format!(
                        "stocktake {} is still open",
                        open.inventory_id().map_or_else(|| "draft".to_string(), |id| id.to_string())
                    ))
                    .into());
                }
                None => {}
            }
        }

        let check = self.session.api.fetch_stocktake(inventory).await?;
        let session = StocktakeSession::resume(check)?;
        tracing::info!(
            selected = session.selected_zones().len(),
            processed = session.processed_zones().len(),
            lines = session.lines().len(),
            "stocktake resumed"
        );
        *lock(&self.state) = Some(session);
        Ok(())
    }

    /// Add zones and fetch their items concurrently.
    ///
    /// Items merge by composite key as fetches complete, in any order. If any
    /// fetch fails, every zone this call added is dropped again.
    #[tracing::instrument(skip(self))]
    pub async fn select_zones(&self, zones: &[ZoneId]) -> ClientResult<usize> {
        self.session.require(Capability::RunStocktake)?;
        let (inventory, added) = {
            let mut state = lock(&self.state);
            let session = state.as_mut().ok_or_else(no_session)?;
            let added = session.select_zones(zones)?;
            (session.inventory_id(), added)
        };

        let mut fetches = JoinSet::new();
        for &zone in &added {
            let api = Arc::clone(&self.session.api);
            fetches.spawn(async move { (zone, api.zone_items(zone).await) });
        }

        let mut new_lines = 0;
        let mut failure: Option<ClientError> = None;
        while let Some(joined_fetch) = fetches.join_next().await {
            let (zone, result) = joined(joined_fetch.map(Ok))?;
            match result {
                Ok(items) => {
                    let mut state = lock(&self.state);
                    if let Some(session) = state.as_mut().filter(|s| s.inventory_id() == inventory) {
                        new_lines += session.apply_zone_items(zone, &items);
                    }
                }
                Err(err) => {
                    tracing::warn!(zone_id = %zone, error = %err, "zone item fetch failed");
                    failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = failure {
            let mut state = lock(&self.state);
            if let Some(session) = state.as_mut().filter(|s| s.inventory_id() == inventory) {
                for zone in &added {
                    if let Err(undo) = session.deselect_zone(*zone) {
                        tracing::debug!(zone_id = %zone, error = %undo, "could not undo zone selection");
                    }
                }
            }
            return Err(err);
        }
        Ok(new_lines)
    }

    /// Drop a zone and its lines. Returns the number of lines removed.
    pub fn deselect_zone(&self, zone: ZoneId) -> ClientResult<usize> {
        let mut state = lock(&self.state);
        let session = state.as_mut().ok_or_else(no_session)?;
        Ok(session.deselect_zone(zone)?)
    }

    /// Record a counted quantity from raw user input.
    pub fn edit_quantity(&self, line: usize, raw: &str) -> ClientResult<f64> {
        let mut state = lock(&self.state);
        let session = state.as_mut().ok_or_else(no_session)?;
        Ok(session.edit_quantity(line, raw)?)
    }

    /// Send the changed lines and discard the session.
    ///
    /// Local state is untouched when the server rejects the submission.
    #[tracing::instrument(skip(self))]
    pub async fn submit(&self) -> ClientResult<usize> {
        self.session.require(Capability::RunStocktake)?;
        let (inventory, payload) = {
            let state = lock(&self.state);
            let session = state.as_ref().ok_or_else(no_session)?;
            let payload = session.prepare_submission()?;
            let inventory = session.inventory_id().ok_or_else(no_session)?;
            (inventory, payload)
        };

        let _guard = self.submits.try_acquire(inventory)?;
        if let Err(err) = self.session.api.submit_stocktake(inventory, &payload).await {
            tracing::warn!(inventory_id = %inventory, error = %err, "stocktake submission rejected");
            return Err(err);
        }

        let mut state = lock(&self.state);
        if let Some(mut session) = state.take_if(|s| s.inventory_id() == Some(inventory)) {
            session.mark_submitted()?;
        }
        tracing::info!(inventory_id = %inventory, lines = payload.len(), "stocktake submitted");
        Ok(payload.len())
    }

    /// In-progress stocktakes created within `range`. Re-issuing supersedes
    /// the previous query.
    pub async fn in_progress(&self, range: DateRange) -> ClientResult<Vec<InventoryCheckSummary>> {
        self.session.require(Capability::RunStocktake)?;
        let api = Arc::clone(&self.session.api);
        self.session
            .latest
            .run(IN_PROGRESS_KEY, async move { api.in_progress_stocktakes(range).await })
            .await
    }

    /// Read the open session, if any.
    pub fn with_session<R>(&self, f: impl FnOnce(Option<&StocktakeSession>) -> R) -> R {
        f(lock(&self.state).as_ref())
    }

    pub fn inventory_id(&self) -> Option<InventoryId> {
        self.with_session(|s| s.and_then(StocktakeSession::inventory_id))
    }

    pub fn report(&self) -> Option<DiscrepancyReport> {
        self.with_session(|s| s.map(StocktakeSession::report))
    }

    /// Forget the open session without submitting it.
    pub fn close(&self) {
        if let Some(session) = lock(&self.state).take() {
            tracing::info!(inventory_id = ?session.inventory_id(), "stocktake closed locally");
        }
    }

    fn open_for(&self, warehouse: WarehouseId) -> ClientResult<Option<InventoryId>> {
        let state = lock(&self.state);
        match state.as_ref().filter(|s| s.is_open()) {
            Some(open) if open.warehouse_id() == warehouse => Ok(open.inventory_id()),
            Some(open) => Err(DomainError::conflict(format!(
                "a stocktake is already open for warehouse {}",
                open.warehouse_id()
            ))
            .into()),
            None => Ok(None),
        }
    }
}

fn no_session() -> DomainError {
    DomainError::validation("no stocktake session is open")
}
