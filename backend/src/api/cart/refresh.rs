//! Last-triggered-wins publication of cart view data.
//!
//! A refresh that started earlier may finish later than a newer one. Its
//! network calls are left to run, but whatever it computes is dropped at the
//! publication boundary.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use common::{facet::{FacetField, FacetSet}, search_query::FacetFilters};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    api::cart::{
        cart_contents::{CartContents, retrieve_cart_contents},
        facet_aggregator::{AggregationProgress, FacetAggregator},
    },
    config::PortalConfig,
    portal_utils::SearchBackend,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct LatestRun {
    latest: AtomicU64,
}

impl LatestRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run; every earlier ticket stops being current.
    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Checked while holding the publication lock, against the run that
    /// produced what is published now.
    fn may_publish(&self, ticket: RunTicket, published_run: u64) -> bool {
        self.is_current(ticket) && ticket.0 > published_run
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published,
    /// A newer refresh started before this one finished.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacetPublication {
    /// Run that produced `facets`; 0 before anything was published.
    pub run: u64,
    /// `None` when no aggregation is being reported.
    pub progress: Option<AggregationProgress>,
    pub facets: FacetSet,
}

pub struct FacetRefresher<B> {
    backend: Arc<B>,
    fields: Vec<FacetField>,
    batch_size: usize,
    runs: LatestRun,
    publication: watch::Sender<FacetPublication>,
}

impl<B: SearchBackend> FacetRefresher<B> {
    pub fn new(backend: Arc<B>, config: &PortalConfig) -> Self {
        let (publication, _) = watch::channel(FacetPublication::default());
        Self {
            backend,
            fields: config.facet_fields.clone(),
            batch_size: config.facet_batch_size,
            runs: LatestRun::new(),
            publication,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FacetPublication> {
        self.publication.subscribe()
    }

    pub fn current(&self) -> FacetPublication {
        self.publication.borrow().clone()
    }

    /// Aggregate facets for `identifiers` under `selected` and publish them
    /// unless a newer refresh has started in the meantime.
    pub async fn refresh(&self, identifiers: &[String], selected: &FacetFilters) -> anyhow::Result<RefreshOutcome> {
        let ticket = self.runs.begin();
        debug!("Facet refresh {} started for {} datasets", ticket.id(), identifiers.len());
        self.publish_progress(ticket, Some(AggregationProgress::Percent(0)));

        let aggregator = FacetAggregator::new(&*self.backend, self.fields.clone(), self.batch_size);
        let result = aggregator
            .aggregate(identifiers, selected, |progress| self.publish_progress(ticket, Some(progress)))
            .await;

        let facets = match result {
            Ok(facets) => facets,
            Err(e) => {
                warn!("Facet refresh {} failed: {:#}", ticket.id(), e);
                self.publish_progress(ticket, None);
                return Err(e);
            }
        };

        let published = self.publication.send_if_modified(|publication| {
            if !self.runs.may_publish(ticket, publication.run) {
                return false;
            }
            *publication = FacetPublication { run: ticket.id(), progress: None, facets };
            true
        });
        if !published {
            debug!("Facet refresh {} superseded, discarding result", ticket.id());
            return Ok(RefreshOutcome::Superseded);
        }
        Ok(RefreshOutcome::Published)
    }

    fn publish_progress(&self, ticket: RunTicket, progress: Option<AggregationProgress>) {
        self.publication.send_if_modified(|publication| {
            if !self.runs.may_publish(ticket, publication.run) {
                return false;
            }
            publication.progress = progress;
            true
        });
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentsPublication {
    pub run: u64,
    pub in_progress: bool,
    pub contents: CartContents,
}

/// Same guard for the dataset/file listing of the cart view.
pub struct ContentsRefresher<B> {
    backend: Arc<B>,
    runs: LatestRun,
    publication: watch::Sender<ContentsPublication>,
}

impl<B: SearchBackend> ContentsRefresher<B> {
    pub fn new(backend: Arc<B>) -> Self {
        let (publication, _) = watch::channel(ContentsPublication::default());
        Self { backend, runs: LatestRun::new(), publication }
    }

    pub fn subscribe(&self) -> watch::Receiver<ContentsPublication> {
        self.publication.subscribe()
    }

    pub fn current(&self) -> ContentsPublication {
        self.publication.borrow().clone()
    }

    pub async fn refresh(&self, items: &[String]) -> anyhow::Result<RefreshOutcome> {
        let ticket = self.runs.begin();
        self.set_in_progress(ticket, true);

        let contents = match retrieve_cart_contents(&*self.backend, items).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Contents refresh {} failed: {:#}", ticket.id(), e);
                self.set_in_progress(ticket, false);
                return Err(e);
            }
        };
        let published = self.publication.send_if_modified(|publication| {
            if !self.runs.may_publish(ticket, publication.run) {
                return false;
            }
            *publication = ContentsPublication { run: ticket.id(), in_progress: false, contents };
            true
        });
        if !published {
            debug!("Contents refresh {} superseded, discarding result", ticket.id());
            return Ok(RefreshOutcome::Superseded);
        }
        Ok(RefreshOutcome::Published)
    }

    fn set_in_progress(&self, ticket: RunTicket, in_progress: bool) {
        self.publication.send_if_modified(|publication| {
            if !self.runs.may_publish(ticket, publication.run) {
                return false;
            }
            publication.in_progress = in_progress;
            true
        });
    }
}
