//! PosEngine - async driver around [`PosSession`]
//!
//! Performs the I/O (catalog fetch, checkout submission, bus receive) and
//! feeds results back into the session one at a time.
//!
//! # Example
//!
//! ```no_run
//! use pos_client::{ClientConfig, EngineCommand, PosEngine};
//! use shared::models::UserContext;
//! use tokio::sync::{broadcast, mpsc};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(bus: broadcast::Receiver<shared::BusMessage>) -> Result<(), pos_client::PosError> {
//! let config = ClientConfig::from_env();
//! let mut engine = PosEngine::from_config(&config)?.with_events(bus);
//! engine.start(UserContext::cashier("b-1")).await?;
//!
//! let (tx, rx) = mpsc::channel(32);
//! let cancel = CancellationToken::new();
//! tx.send(EngineCommand::apply(|session| {
//!     let _ = session.add_to_cart("v-1");
//! }))
//! .await
//! .ok();
//! engine.run(rx, cancel).await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use shared::message::BusMessage;
use shared::models::{Product, UserContext};
use shared::sale::TransactionRecord;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::reconcile::Reconcile;
use crate::session::{FetchOutcome, FetchTicket, PosSession};
use crate::source::{CatalogSource, CheckoutGateway};
use crate::storage::ClientStorage;
use crate::{ClientConfig, ClientResult, PosError, PosResult};

/// Host command for a running engine
pub enum EngineCommand {
    SelectBranch {
        branch_id: String,
        reply: Option<oneshot::Sender<PosResult<bool>>>,
    },
    /// Re-fetch the catalog for the active branch
    Refresh,
    SetEventsEnabled(bool),
    Checkout(oneshot::Sender<PosResult<TransactionRecord>>),
    /// Run a synchronous mutation on the session (cart, hold, form fields)
    Apply(Box<dyn FnOnce(&mut PosSession) + Send>),
}

impl EngineCommand {
    pub fn apply(f: impl FnOnce(&mut PosSession) + Send + 'static) -> Self {
        Self::Apply(Box::new(f))
    }
}

impl std::fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectBranch { branch_id, .. } => f.debug_tuple("SelectBranch").field(branch_id).finish(),
            Self::Refresh => f.write_str("Refresh"),
            Self::SetEventsEnabled(enabled) => f.debug_tuple("SetEventsEnabled").field(enabled).finish(),
            Self::Checkout(_) => f.write_str("Checkout"),
            Self::Apply(_) => f.write_str("Apply"),
        }
    }
}

/// Completion of a background catalog fetch
struct FetchCompletion {
    ticket: FetchTicket,
    result: ClientResult<Vec<Product>>,
}

pub struct PosEngine {
    session: PosSession,
    catalog_source: Arc<dyn CatalogSource>,
    gateway: Arc<dyn CheckoutGateway>,
    events: Option<broadcast::Receiver<BusMessage>>,
}

impl PosEngine {
    pub fn new(session: PosSession, catalog_source: Arc<dyn CatalogSource>, gateway: Arc<dyn CheckoutGateway>) -> Self {
        Self {
            session,
            catalog_source,
            gateway,
            events: None,
        }
    }

    /// HTTP-backed engine with file storage in `config.data_dir`. A corrupt
    /// storage file only loses the remembered branch.
    pub fn from_config(config: &ClientConfig) -> PosResult<Self> {
        let http = Arc::new(config.build_http_client()?);
        let storage = ClientStorage::load_or_empty(&config.data_dir);
        let session = PosSession::new(storage, config.stock_versioning);
        Ok(Self::new(session, http.clone(), http))
    }

    /// Attach the real-time channel
    pub fn with_events(mut self, events: broadcast::Receiver<BusMessage>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn session(&self) -> &PosSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut PosSession {
        &mut self.session
    }

    /// Drop any backlog and listen from now on
    fn resubscribe(&mut self) {
        if let Some(rx) = self.events.as_mut() {
            *rx = rx.resubscribe();
        }
    }

    /// Log the user in: load branches (unless pinned), pick the initial
    /// branch and load its catalog
    pub async fn start(&mut self, user: UserContext) -> PosResult<()> {
        info!(role = ?user.role, branch_id = ?user.branch_id, "Starting POS session");
        self.session.set_user(user);

        if !self.session.is_branch_pinned() {
            let branches = self.catalog_source.fetch_branches().await.inspect_err(|e| {
                error!(error = %e, "Failed to load branches");
            })?;
            info!(count = branches.len(), "Active branches loaded");
            self.session.set_branches(branches);
        }

        let branch_id = self.session.initial_branch().ok_or(PosError::NoBranchSelected)?;
        self.session.select_branch(&branch_id)?;
        self.resubscribe();
        self.refresh_catalog().await?;
        Ok(())
    }

    /// Switch branch, then reload the catalog. Returns whether it changed.
    pub async fn select_branch(&mut self, branch_id: &str) -> PosResult<bool> {
        if !self.session.select_branch(branch_id)? {
            return Ok(false);
        }
        self.resubscribe();
        self.refresh_catalog().await?;
        Ok(true)
    }

    /// Fetch the catalog for the active branch and replace the cache
    pub async fn refresh_catalog(&mut self) -> PosResult<FetchOutcome> {
        let ticket = self.session.begin_fetch()?;
        let result = self.catalog_source.fetch_products(&ticket.branch_id).await;
        let outcome = self.session.complete_fetch(&ticket, result);
        self.resubscribe();
        outcome
    }

    /// Apply one bus message, re-fetching when the event asks for it
    pub async fn handle_message(&mut self, msg: &BusMessage) -> PosResult<Reconcile> {
        let outcome = self.session.handle_message(msg);
        if outcome == Reconcile::Refetch {
            self.refresh_catalog().await?;
        }
        Ok(outcome)
    }

    /// Submit the active cart
    pub async fn checkout(&mut self) -> PosResult<TransactionRecord> {
        let request = self.session.begin_checkout()?;
        debug!(branch_id = %request.branch_id, items = request.items.len(), total = %request.total, "Submitting checkout");
        let result = self.gateway.submit(&request).await;
        self.session.finish_checkout(result)
    }

    /// Process commands, bus messages and fetch completions until cancelled
    /// or the command channel closes
    pub async fn run(&mut self, mut commands: mpsc::Receiver<EngineCommand>, cancel: CancellationToken) {
        let (done_tx, mut done_rx) = mpsc::channel::<FetchCompletion>(8);
        info!("POS engine running");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!("POS engine shutting down");
                    break;
                }
                Some(done) = done_rx.recv() => self.on_fetch_complete(done),
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command, &done_tx).await,
                    None => {
                        info!("Command channel closed, POS engine stopping");
                        break;
                    }
                },
                event = recv_event(&mut self.events) => self.on_event(event, &done_tx),
            }
        }
    }

    async fn on_command(&mut self, command: EngineCommand, done_tx: &mpsc::Sender<FetchCompletion>) {
        debug!(?command, "Engine command");
        match command {
            EngineCommand::SelectBranch { branch_id, reply } => {
                let result = self.session.select_branch(&branch_id);
                if let Ok(true) = result {
                    self.resubscribe();
                    self.spawn_fetch(done_tx);
                }
                if let Err(e) = &result {
                    warn!(branch_id = %branch_id, error = %e, "Branch change rejected");
                }
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            EngineCommand::Refresh => self.spawn_fetch(done_tx),
            EngineCommand::SetEventsEnabled(enabled) => {
                info!(enabled, "Real-time catalog events toggled");
                self.session.set_events_enabled(enabled);
                self.resubscribe();
            }
            EngineCommand::Checkout(reply) => {
                let result = self.checkout().await;
                let _ = reply.send(result);
            }
            EngineCommand::Apply(f) => f(&mut self.session),
        }
    }

    fn on_event(&mut self, event: Result<BusMessage, RecvError>, done_tx: &mpsc::Sender<FetchCompletion>) {
        match event {
            Ok(msg) => {
                if self.session.handle_message(&msg) == Reconcile::Refetch {
                    self.spawn_fetch(done_tx);
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(missed, "Catalog events lagged, re-fetching");
                self.spawn_fetch(done_tx);
            }
            Err(RecvError::Closed) => {
                info!("Real-time channel closed");
                self.events = None;
            }
        }
    }

    fn on_fetch_complete(&mut self, done: FetchCompletion) {
        match self.session.complete_fetch(&done.ticket, done.result) {
            Ok(FetchOutcome::Discarded) => {}
            Ok(FetchOutcome::Replaced { .. }) | Err(_) => self.resubscribe(),
        }
    }

    /// Start a background fetch; its completion arrives through `done_tx`
    fn spawn_fetch(&mut self, done_tx: &mpsc::Sender<FetchCompletion>) {
        let ticket = match self.session.begin_fetch() {
            Ok(ticket) => ticket,
            Err(e) => {
                warn!(error = %e, "Catalog fetch skipped");
                return;
            }
        };
        let source = Arc::clone(&self.catalog_source);
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_products(&ticket.branch_id).await;
            let _ = done_tx.send(FetchCompletion { ticket, result }).await;
        });
    }
}

/// Next bus message, or pending forever when no channel is attached
async fn recv_event(events: &mut Option<broadcast::Receiver<BusMessage>>) -> Result<BusMessage, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
