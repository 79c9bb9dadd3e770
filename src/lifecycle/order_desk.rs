use crate::clients::{HttpOrderService, OrderSink, OrderSource, OrgInfo, TransportError};
use crate::correction::CorrectionCoordinator;
use crate::lifecycle::Settings;
use crate::model::{Order, Org, OrgId, StatusFilter};
use crate::search;
use crate::sync::{SyncActor, SyncClient, SyncError, SyncState};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runtime orchestrator for one organization's order desk.
///
/// `OrderDesk` is responsible for:
/// - **Lifecycle Management**: spawning the sync controller and disposing it on shutdown
/// - **Dependency Wiring**: giving the correction coordinator the same controller the
///   readers observe, so every write is followed by a resync of that view
/// - **Org metadata**: fetching [`Org`] once and caching it
///
/// # Example
///
/// ```ignore
/// let desk = OrderDesk::connect(&settings, StatusFilter::All).await?;
///
/// let fixed = desk.coordinator.submit(&order_id, "3 kg flour\n1 bread", None).await?;
/// let visible = desk.visible_orders("flour");
///
/// desk.shutdown().await?;
/// ```
pub struct OrderDesk {
    pub org_id: OrgId,
    pub sync: SyncClient,
    pub coordinator: CorrectionCoordinator,
    org_info: Arc<dyn OrgInfo>,
    org: OnceCell<Org>,
    handle: JoinHandle<()>,
}

impl OrderDesk {
    /// Spawns the controller for `org_id` on top of `service` and wires the coordinator.
    pub fn start<S>(org_id: OrgId, service: Arc<S>, filter: StatusFilter, settings: &Settings) -> Self
    where
        S: OrderSource + OrderSink + OrgInfo + 'static,
    {
        let (actor, sync) = SyncActor::new(
            org_id.clone(),
            service.clone(),
            filter,
            settings.poll_interval(),
            settings.channel_capacity,
        );
        let handle = tokio::spawn(actor.run());
        let coordinator = CorrectionCoordinator::new(service.clone(), sync.clone());

        Self {
            org_id,
            sync,
            coordinator,
            org_info: service,
            org: OnceCell::new(),
            handle,
        }
    }

    /// Builds the HTTP backend from `settings` and starts the desk.
    ///
    /// Without a configured org id, the organization is looked up with
    /// [`OrgInfo::get`] and that answer is cached.
    pub async fn connect(settings: &Settings, filter: StatusFilter) -> Result<Self, TransportError> {
        let service = Arc::new(HttpOrderService::from_settings(settings)?);
        let (org_id, org) = match settings.org_id.as_deref() {
            Some(id) => (OrgId::from(id), None),
            None => {
                let org = service.get().await?;
                info!(org = %org.id, name = ?org.name, "Resolved organization");
                (org.id.clone(), Some(org))
            }
        };

        let desk = Self::start(org_id, service, filter, settings);
        if let Some(org) = org {
            // only fails if already set, and nothing else has had the chance yet
            let _ = desk.org.set(org);
        }
        Ok(desk)
    }

    /// Organization metadata, fetched on first use.
    pub async fn org(&self) -> Result<&Org, TransportError> {
        self.org.get_or_try_init(|| self.org_info.get()).await
    }

    /// Waits for the controller's own initial load to land or fail, without
    /// requesting another fetch.
    pub async fn initial_load(&self) -> Result<Arc<SyncState>, SyncError> {
        let mut states = self.sync.subscribe();
        let state = states
            .wait_for(|s| s.snapshot.fetched_at.is_some() || s.last_error.is_some())
            .await
            .map_err(|_| SyncError::ControllerClosed)?;
        Ok(Arc::clone(&state))
    }

    /// Orders of the current snapshot matching `query`.
    pub fn visible_orders(&self, query: &str) -> Vec<Order> {
        let state = self.sync.current();
        search::filter(&state.snapshot, query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Disposes the controller and waits for its task to finish.
    pub async fn shutdown(self) -> Result<(), SyncError> {
        info!(org = %self.org_id, "Shutting down order desk...");

        match self.sync.dispose().await {
            // the controller already stopped; the join below reports why
            Ok(()) | Err(SyncError::ControllerClosed) | Err(SyncError::ControllerDropped) => {}
            Err(e) => return Err(e),
        }

        if let Err(e) = self.handle.await {
            error!(error = ?e, "Sync controller task failed");
            return Err(SyncError::TaskFailed(e.to_string()));
        }

        info!("Order desk shutdown complete.");
        Ok(())
    }
}
