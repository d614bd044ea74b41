use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::acquisition::panel::{
    AcquisitionPanel, PanelCommand, PanelEvent, PanelView, RequestTicket,
};
use crate::acquisition::scan::ScanGate;
use crate::catalog::{CatalogService, ScanUpload};
use crate::error::{CatalogError, KissaError};
use crate::library::LibraryStore;
use crate::util::lock;

/// Drives the acquisition panel and the photo scan against the catalog.
///
/// The panel lock is only taken to dispatch an event or read a snapshot,
/// never across a collaborator call.
pub struct AcquisitionWorkflow {
    service: Arc<dyn CatalogService>,
    store: Arc<LibraryStore>,
    panel: Mutex<AcquisitionPanel>,
    scan_gate: ScanGate,
}

impl AcquisitionWorkflow {
    pub fn new(service: Arc<dyn CatalogService>, store: Arc<LibraryStore>) -> Self {
        Self {
            service,
            store,
            panel: Mutex::new(AcquisitionPanel::new()),
            scan_gate: ScanGate::new(),
        }
    }

    fn dispatch(&self, event: PanelEvent) -> Option<PanelCommand> {
        lock(&self.panel).dispatch(event)
    }

    /// Dispatch a completion for `ticket`. Also reports whether the ticket
    /// was still current, checked under the same lock.
    fn complete(&self, ticket: RequestTicket, event: PanelEvent) -> (bool, Option<PanelCommand>) {
        let mut panel = lock(&self.panel);
        let current = panel.is_current(ticket);
        (current, panel.dispatch(event))
    }

    /// Open a fresh panel, replacing any current one
    pub fn open(&self) {
        self.dispatch(PanelEvent::Open);
    }

    pub fn close(&self) {
        self.dispatch(PanelEvent::Close);
    }

    pub fn edit_query(&self, text: impl Into<String>) {
        self.dispatch(PanelEvent::EditQuery(text.into()));
    }

    /// Snapshot of the open panel
    pub fn view(&self) -> Option<PanelView> {
        lock(&self.panel).view()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.panel).is_open()
    }

    /// Search for the current query.
    ///
    /// Does nothing for a blank query or while a search is running. The
    /// outcome lands in the panel; a failure is also returned for display
    /// unless the panel has moved on to another session or query.
    pub async fn submit(&self) -> Result<(), KissaError> {
        let Some(PanelCommand::Search { ticket, query }) = self.dispatch(PanelEvent::Submit) else {
            return Ok(());
        };

        match self.service.search_candidates(&query).await {
            Ok(results) => {
                info!("{} candidates for {:?}", results.len(), query);
                self.dispatch(PanelEvent::SearchComplete {
                    ticket,
                    result: Ok(results),
                });
                Ok(())
            }
            Err(e) => {
                let err = KissaError::Search(e);
                warn!("Search for {:?} failed: {}", query, err);
                let (current, _) = self.complete(
                    ticket,
                    PanelEvent::SearchComplete {
                        ticket,
                        result: Err(err.user_message()),
                    },
                );
                if !current {
                    debug!("Search for {:?} no longer current, dropping its error", query);
                    return Ok(());
                }
                Err(err)
            }
        }
    }

    /// Add the chosen candidate to the library.
    ///
    /// Only valid while results are showing. On success the library is
    /// refreshed and the panel closes; on failure the results stay.
    pub async fn select_candidate(&self, catalog_id: u64) -> Result<(), KissaError> {
        let Some(PanelCommand::Commit { ticket, catalog_id }) =
            self.dispatch(PanelEvent::SelectCandidate(catalog_id))
        else {
            return Ok(());
        };

        if let Err(e) = self.service.commit_candidate(catalog_id).await {
            let err = KissaError::Commit(e);
            warn!("Commit of catalog id {} failed: {}", catalog_id, err);
            let (current, _) = self.complete(
                ticket,
                PanelEvent::CommitComplete {
                    ticket,
                    result: Err(err.user_message()),
                },
            );
            if !current {
                debug!("Commit of {} no longer current, dropping its error", catalog_id);
                return Ok(());
            }
            return Err(err);
        }
        info!("Committed catalog id {}", catalog_id);

        let command = self.dispatch(PanelEvent::CommitComplete {
            ticket,
            result: Ok(()),
        });
        if let Some(PanelCommand::RefreshLibrary { ticket }) = command {
            let refreshed = self.store.refresh().await;
            // Close even if the refresh failed: the album is on the server.
            self.dispatch(PanelEvent::LibraryRefreshed { ticket });
            refreshed?;
        }
        Ok(())
    }

    /// Commit a known catalog id without going through the panel
    pub async fn add_by_catalog_id(&self, catalog_id: u64) -> Result<(), KissaError> {
        self.service
            .commit_candidate(catalog_id)
            .await
            .map_err(KissaError::Commit)?;
        info!("Committed catalog id {}", catalog_id);
        self.store.refresh().await?;
        Ok(())
    }

    /// Recognise a cover photo and add the album it shows.
    ///
    /// One scan at a time; a second call while busy fails with
    /// [`KissaError::ScanBusy`]. The library is refreshed on success.
    pub async fn scan_photo(&self, upload: ScanUpload) -> Result<(), KissaError> {
        let Some(_permit) = self.scan_gate.try_acquire() else {
            warn!("Scan rejected, another scan is in progress");
            return Err(KissaError::ScanBusy);
        };

        if upload.bytes.is_empty() {
            return Err(KissaError::Scan(CatalogError::InvalidUpload(
                "Empty file".to_string(),
            )));
        }

        let file_name = upload.file_name.clone();
        if let Err(e) = self.service.scan_photo(upload).await {
            let err = KissaError::Scan(e);
            warn!("Scan of {} failed: {}", file_name, err);
            return Err(err);
        }
        info!("Scan of {} added an album", file_name);

        self.store.refresh().await?;
        Ok(())
    }

    pub fn is_scanning(&self) -> bool {
        self.scan_gate.is_scanning()
    }
}
