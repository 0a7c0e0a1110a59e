//! Concurrent per-unit geometry fetches.
//!
//! A batch builds one future per unit and polls them all from the calling
//! task through a `FuturesUnordered`. A semaphore bounds how many are inside
//! their network call at once. Results are kept in completion order.
//!
//! The first failing unit ends the batch with an error; an interrupt ends it
//! with whatever was collected so far. Either way, fetches already inside
//! their network call keep running on a detached task and their results are
//! dropped. Queued units that get a permit after that return without a request.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::{Semaphore, watch};

use crate::catalog::Catalog;
use crate::dataset::Dataset;
use crate::error::{Error, FetchContext, Result};
use crate::payload::GeometryPayload;
use crate::theme::{Projection, Scale, SpatialType, Theme};
use crate::units::{UnitFilter, resolve_units};

pub const DEFAULT_UNIT_CONCURRENCY: usize = 50;

/// Representation requested for every unit of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRequest {
    pub spatial_type: SpatialType,
    /// Needed for regions, ignored for labels.
    pub scale: Option<Scale>,
    pub projection: Projection,
}

impl UnitRequest {
    pub fn region(scale: Scale, projection: Projection) -> Self {
        Self {
            spatial_type: SpatialType::Region,
            scale: Some(scale),
            projection,
        }
    }

    pub fn label(projection: Projection) -> Self {
        Self {
            spatial_type: SpatialType::Label,
            scale: None,
            projection,
        }
    }
}

impl Default for UnitRequest {
    fn default() -> Self {
        Self::region(Scale::M20, Projection::Epsg4326)
    }
}

/// Path of one unit's geometry under `distribution/`.
pub fn unit_path(unit: &str, request: &UnitRequest, year: &str) -> Result<String> {
    match request.spatial_type {
        SpatialType::Region => {
            let scale = request.scale.ok_or_else(|| {
                Error::InvalidParameter("region geometry requires a scale".to_string())
            })?;
            Ok(format!(
                "{}-region-{}-{}-{}.geojson",
                unit, scale, request.projection, year
            ))
        }
        SpatialType::Label => Ok(format!(
            "{}-label-{}-{}.geojson",
            unit, request.projection, year
        )),
        other => Err(Error::InvalidParameter(format!(
            "wrong spatial type {}, allowed are \"RG\" and \"LB\"",
            other
        ))),
    }
}

/// Collected payloads of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// In completion order.
    pub payloads: Vec<GeometryPayload>,
    /// Number of units the batch was started with.
    pub requested: usize,
    /// Set when collection stopped early on an interrupt.
    pub interrupted: bool,
}

impl FetchOutcome {
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.payloads.len() == self.requested
    }
}

/// Receiving side of an operator interrupt.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Sending side of an operator interrupt.
#[derive(Debug)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

/// A connected interrupt pair. Triggering the handle is observed by every
/// batch holding a clone of the receiver.
pub fn interrupt_pair() -> (InterruptHandle, Interrupt) {
    let (tx, rx) = watch::channel(false);
    (InterruptHandle { tx }, Interrupt { rx })
}

impl InterruptHandle {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Interrupt {
    /// An interrupt that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Sender gone without triggering.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// `None` marks a unit skipped after its batch stopped.
type UnitResult = (String, Option<Result<GeometryPayload>>);

enum Step {
    Interrupted,
    Completed(Option<UnitResult>),
}

/// Runs unit batches against one catalog under a shared gate.
#[derive(Debug, Clone)]
pub struct UnitFetcher {
    catalog: Arc<Catalog>,
    gate: Arc<Semaphore>,
    concurrency: usize,
}

impl UnitFetcher {
    pub fn new(catalog: Arc<Catalog>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            catalog,
            gate: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolves the units of `dataset` selected by `filter` and fetches them.
    pub async fn fetch_units(
        &self,
        dataset: &Dataset,
        filter: &UnitFilter,
        request: UnitRequest,
        interrupt: &mut Interrupt,
    ) -> Result<FetchOutcome> {
        let theme = dataset.theme();
        filter.check_theme(theme)?;

        let catalog = dataset.units(&self.catalog).await?;
        let units = resolve_units(&catalog, filter);
        tracing::info!(
            %theme,
            year = dataset.year(),
            %filter,
            matched = units.len(),
            of = catalog.len(),
            "resolved units"
        );

        let context = FetchContext {
            theme,
            filter: filter.to_string(),
            spatial_type: request.spatial_type,
            scale: request.scale,
            projection: request.projection,
            year: dataset.year().to_string(),
        };
        self.fetch_batch(units, request, context, interrupt).await
    }

    /// Fetches the given units; `context` describes the batch in errors.
    pub async fn fetch_batch(
        &self,
        units: Vec<String>,
        request: UnitRequest,
        context: FetchContext,
        interrupt: &mut Interrupt,
    ) -> Result<FetchOutcome> {
        let requested = units.len();
        let (stop, stopped) = watch::channel(false);
        let mut pending: FuturesUnordered<_> = units
            .into_iter()
            .map(|unit| UnitTask {
                catalog: Arc::clone(&self.catalog),
                gate: Arc::clone(&self.gate),
                stopped: stopped.clone(),
                theme: context.theme,
                unit,
                request,
                year: context.year.clone(),
            })
            .map(UnitTask::run)
            .collect();
        let mut payloads = Vec::with_capacity(requested);

        loop {
            let step = tokio::select! {
                biased;
                _ = interrupt.triggered() => Step::Interrupted,
                next = pending.next() => Step::Completed(next),
            };

            match step {
                Step::Interrupted => {
                    tracing::warn!(
                        collected = payloads.len(),
                        requested,
                        "interrupted, returning partial result"
                    );
                    stop.send_replace(true);
                    detach(pending);
                    return Ok(FetchOutcome {
                        payloads,
                        requested,
                        interrupted: true,
                    });
                }
                Step::Completed(None) => break,
                Step::Completed(Some((_, None))) => {}
                Step::Completed(Some((unit, Some(Ok(payload))))) => {
                    tracing::debug!(
                        unit = %unit,
                        done = payloads.len() + 1,
                        requested,
                        "unit fetched"
                    );
                    payloads.push(payload);
                }
                Step::Completed(Some((unit, Some(Err(err))))) => {
                    tracing::debug!(
                        unit = %unit,
                        error = %err,
                        "unit fetch failed, aborting batch"
                    );
                    stop.send_replace(true);
                    detach(pending);
                    if err.is_transport() {
                        return Err(Error::Batch {
                            context,
                            source: Box::new(err),
                        });
                    }
                    return Err(err);
                }
            }
        }

        tracing::info!(theme = %context.theme, fetched = payloads.len(), "unit batch complete");
        Ok(FetchOutcome {
            payloads,
            requested,
            interrupted: false,
        })
    }
}

struct UnitTask {
    catalog: Arc<Catalog>,
    gate: Arc<Semaphore>,
    stopped: watch::Receiver<bool>,
    theme: Theme,
    unit: String,
    request: UnitRequest,
    year: String,
}

impl UnitTask {
    async fn run(self) -> UnitResult {
        let result = self.fetch().await.transpose();
        (self.unit, result)
    }

    async fn fetch(&self) -> Result<Option<GeometryPayload>> {
        let path = unit_path(&self.unit, &self.request, &self.year)?;
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| Error::Config("unit gate closed".to_string()))?;
        if *self.stopped.borrow() {
            tracing::trace!(unit = %self.unit, "batch stopped, skipping unit");
            return Ok(None);
        }
        let value = self.catalog.distribution(self.theme, &path).await?;
        Ok(Some(GeometryPayload::new((*value).clone())))
    }
}

/// Drives unfinished fetches to completion in the background, dropping results.
///
/// The batch must be stopped first so queued units skip their request.
fn detach<F>(mut rest: FuturesUnordered<F>)
where
    F: Future + Send + 'static,
    F::Output: Send,
{
    if rest.is_empty() {
        return;
    }
    let remaining = rest.len();
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            tracing::debug!(remaining, "detaching unfinished unit fetches");
            handle.spawn(async move { while rest.next().await.is_some() {} });
        }
        Err(_) => {
            tracing::warn!(remaining, "no tokio runtime, dropping unfinished unit fetches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_and_label_paths() {
        let rg = UnitRequest::region(Scale::M20, Projection::Epsg4326);
        assert_eq!(
            unit_path("RO", &rg, "2020").unwrap(),
            "RO-region-20M-4326-2020.geojson"
        );
        let lb = UnitRequest::label(Projection::Epsg3035);
        assert_eq!(
            unit_path("RO21", &lb, "2021").unwrap(),
            "RO21-label-3035-2021.geojson"
        );
    }

    #[test]
    fn other_spatial_types_are_request_errors() {
        let bn = UnitRequest {
            spatial_type: SpatialType::Boundary,
            scale: Some(Scale::M20),
            projection: Projection::Epsg4326,
        };
        assert!(matches!(
            unit_path("RO", &bn, "2020"),
            Err(Error::InvalidParameter(_))
        ));
        let no_scale = UnitRequest {
            scale: None,
            ..UnitRequest::default()
        };
        assert!(matches!(
            unit_path("RO", &no_scale, "2020"),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn interrupt_pair_fires_once_triggered() {
        let (handle, mut interrupt) = interrupt_pair();
        assert!(!interrupt.is_triggered());
        handle.trigger();
        assert!(interrupt.is_triggered());
        interrupt.triggered().await;
    }

    #[tokio::test]
    async fn never_interrupt_stays_pending() {
        let mut interrupt = Interrupt::never();
        let fired =
            tokio::time::timeout(std::time::Duration::from_millis(20), interrupt.triggered()).await;
        assert!(fired.is_err());
    }
}
