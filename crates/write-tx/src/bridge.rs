//! Bridge between the egui shell and the write flow.
//! Provider calls run on a tokio runtime; results are queued and applied on
//! the UI thread by `poll`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use eframe::egui;

use write_tx_adapters::{Eip1193Adapter, SystemClockAdapter, WalletAdapterConfig};
use write_tx_core::{
    ConnectStart, ConnectTicket, ConnectionState, FlowError, ProviderError, Receipt,
    SubmissionTicket, WalletAddress, WalletProvider, WriteFlow,
};

type Flow = WriteFlow<Eip1193Adapter, SystemClockAdapter>;
type Inbox<T> = Arc<Mutex<Vec<T>>>;

const ACCOUNT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

pub struct WalletBridge {
    runtime: tokio::runtime::Runtime,
    flow: Flow,
    connect_results: Inbox<(ConnectTicket, Result<Vec<WalletAddress>, ProviderError>)>,
    submit_results: Inbox<(SubmissionTicket, Result<Receipt, ProviderError>)>,
    last_refresh: Instant,
    /// Set while an `eth_accounts` refresh is outstanding.
    refresh_in_flight: Arc<AtomicBool>,
    /// Rejections that leave every state untouched (e.g. AlreadyPending).
    notice: Option<FlowError>,
}

impl WalletBridge {
    pub fn from_env() -> eyre::Result<Self> {
        let adapter = Eip1193Adapter::with_config(WalletAdapterConfig::from_env());
        if adapter.is_deterministic() {
            tracing::warn!("no EIP-1193 proxy configured; using the deterministic wallet");
        }
        Self::new(adapter)
    }

    pub fn new(adapter: Eip1193Adapter) -> eyre::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            flow: WriteFlow::new(adapter, SystemClockAdapter),
            connect_results: Arc::new(Mutex::new(Vec::new())),
            submit_results: Arc::new(Mutex::new(Vec::new())),
            last_refresh: Instant::now(),
            refresh_in_flight: Arc::new(AtomicBool::new(false)),
            notice: None,
        })
    }

    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    pub fn notice(&self) -> Option<&FlowError> {
        self.notice.as_ref()
    }

    /// Whether the Submit button should be clickable. The flow still rejects
    /// anything that slips through.
    pub fn can_submit(&self) -> bool {
        !self.flow.submission().is_pending()
            && self.flow.composer().is_valid()
            && self.flow.connection().is_connected()
    }

    pub fn connect(&mut self, ctx: &egui::Context) {
        self.notice = None;
        let ticket = match self.flow.begin_connect() {
            Ok(ConnectStart::Started(ticket, _)) => ticket,
            Ok(ConnectStart::AlreadyConnected(_)) => return,
            Err(err) => {
                self.notice = Some(err);
                return;
            }
        };

        let provider = self.flow.provider.clone();
        let inbox = Arc::clone(&self.connect_results);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = provider.connect().await;
            lock_inbox(&inbox).push((ticket, outcome));
            ctx.request_repaint();
        });
    }

    pub fn disconnect(&mut self) {
        self.notice = None;
        if let Err(err) = self.flow.disconnect() {
            self.notice = Some(err);
        }
    }

    pub fn set_text(&mut self, text: &str) {
        match self.flow.set_text(text) {
            Ok(()) => self.notice = None,
            Err(err) => self.notice = Some(err),
        }
    }

    pub fn submit(&mut self, ctx: &egui::Context) {
        self.notice = None;
        let ticket = match self.flow.begin_submit() {
            Ok(ticket) => ticket,
            Err(err) => {
                self.notice = Some(err);
                return;
            }
        };

        let provider = self.flow.provider.clone();
        let inbox = Arc::clone(&self.submit_results);
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = provider.send_message(ticket.payload()).await;
            lock_inbox(&inbox).push((ticket, outcome));
            ctx.request_repaint();
        });
    }

    /// Applies everything the runtime produced since the last frame.
    pub fn poll(&mut self) {
        let connects = std::mem::take(&mut *lock_inbox(&self.connect_results));
        for (ticket, outcome) in connects {
            if let Err(err) = self.flow.complete_connect(&ticket, outcome) {
                self.notice = Some(err);
            }
        }

        let submits = std::mem::take(&mut *lock_inbox(&self.submit_results));
        for (ticket, outcome) in submits {
            if let Err(err) = self.flow.complete_submit(&ticket, outcome) {
                self.notice = Some(err);
            }
        }

        if self.refresh_due() {
            self.spawn_refresh();
        }

        if let Err(err) = self.flow.recover_provider_events() {
            tracing::warn!(error = %err, "failed to apply provider events");
        }
    }

    /// One provider call at a time: no refresh while a connect or submit is
    /// outstanding, or while the previous refresh has not returned.
    fn refresh_due(&self) -> bool {
        matches!(self.flow.connection(), ConnectionState::Connected(_))
            && !self.flow.submission().is_pending()
            && !self.refresh_in_flight.load(Ordering::Acquire)
            && self.last_refresh.elapsed() >= ACCOUNT_REFRESH_INTERVAL
    }

    fn spawn_refresh(&mut self) {
        self.last_refresh = Instant::now();
        self.refresh_in_flight.store(true, Ordering::Release);
        let provider = self.flow.provider.clone();
        let in_flight = Arc::clone(&self.refresh_in_flight);
        self.runtime.spawn(async move {
            if let Err(err) = provider.refresh_accounts().await {
                tracing::debug!(error = %err, "account refresh failed");
            }
            in_flight.store(false, Ordering::Release);
        });
    }
}

fn lock_inbox<T>(inbox: &Mutex<Vec<T>>) -> MutexGuard<'_, Vec<T>> {
    inbox.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("result inbox lock poisoned; recovering queued results");
        poisoned.into_inner()
    })
}
