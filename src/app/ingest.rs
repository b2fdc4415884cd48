use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, info, warn};

use crate::analytics::{
    AnalyticsError, AnalyticsSource, AssetMeta, DeltaRecord, IconError, IconResolver,
    SeriesRecord, TimeWindow,
};
use crate::bubbles::{BubbleKey, Registry};

pub(super) enum IngestEvent {
    Deltas {
        generation: u64,
        result: Result<Vec<DeltaRecord>, AnalyticsError>,
    },
    Series {
        generation: u64,
        result: Result<Vec<SeriesRecord>, AnalyticsError>,
    },
    Icon {
        key: BubbleKey,
        epoch: u64,
        result: Result<Option<AssetMeta>, IconError>,
    },
}

pub struct Ingest {
    source: Arc<dyn AnalyticsSource>,
    icons: Arc<dyn IconResolver>,
    tx: Sender<IngestEvent>,
    rx: Receiver<IngestEvent>,
    window: TimeWindow,
    interval_secs: f64,
    generation: u64,
    in_flight: bool,
    next_poll_at: Option<f64>,
    last_error: Option<String>,
}

impl Ingest {
    pub fn new(
        source: Arc<dyn AnalyticsSource>,
        icons: Arc<dyn IconResolver>,
        window: TimeWindow,
        interval_secs: f64,
    ) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            icons,
            tx,
            rx,
            window,
            interval_secs,
            generation: 0,
            in_flight: false,
            next_poll_at: None,
            last_error: None,
        }
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn start(&mut self) {
        self.restart();
    }

    pub fn set_time(&mut self, window: TimeWindow) {
        self.window = window;
        self.restart();
    }

    pub fn force_reset(&mut self, registry: &mut Registry) {
        registry.reset();
        self.restart();
    }

    fn restart(&mut self) {
        self.generation += 1;
        self.next_poll_at = None;
        self.request_deltas();
    }

    fn request_deltas(&mut self) {
        let generation = self.generation;
        let window = self.window;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        self.in_flight = true;

        debug!(generation, minutes = window.minutes(), "fetching deltas");
        thread::spawn(move || {
            let result = source.deltas(window);
            let _ = tx.send(IngestEvent::Deltas { generation, result });
        });
    }

    fn request_series(&self) {
        let generation = self.generation;
        let window = self.window;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let result = source.series(window);
            let _ = tx.send(IngestEvent::Series { generation, result });
        });
    }

    // Tagged with the registry epoch: a window switch keeps them, a reset drops them.
    fn request_icons(&self, keys: Vec<BubbleKey>, epoch: u64) {
        if keys.is_empty() {
            return;
        }
        let icons = Arc::clone(&self.icons);
        let tx = self.tx.clone();

        thread::spawn(move || {
            for key in keys {
                let result = icons.resolve(&key.code, &key.issuer);
                if tx.send(IngestEvent::Icon { key, epoch, result }).is_err() {
                    break;
                }
            }
        });
    }

    pub fn pump(&mut self, registry: &mut Registry, now: f64) -> bool {
        let mut changed = false;

        while let Ok(event) = self.rx.try_recv() {
            match event {
                IngestEvent::Deltas { generation, result } => {
                    if generation != self.generation {
                        debug!(generation, current = self.generation, "dropping stale deltas");
                        continue;
                    }
                    self.in_flight = false;
                    self.next_poll_at = Some(now + self.interval_secs);

                    match result {
                        Ok(records) => {
                            let received = records.len();
                            let created = registry.reconcile(records);
                            info!(received, created = created.len(), total = registry.len(), "deltas applied");
                            self.last_error = None;
                            self.request_icons(created, registry.epoch());
                            self.request_series();
                            changed = true;
                        }
                        Err(error) => {
                            warn!(%error, "delta fetch failed");
                            self.last_error = Some(error.to_string());
                        }
                    }
                }
                IngestEvent::Series { generation, result } => {
                    if generation != self.generation {
                        debug!(generation, current = self.generation, "dropping stale series");
                        continue;
                    }
                    match result {
                        Ok(records) => {
                            let updated = registry.apply_series(records);
                            debug!(updated, "series applied");
                            changed = true;
                        }
                        Err(error) => warn!(%error, "series fetch failed"),
                    }
                }
                IngestEvent::Icon { key, epoch, result } => {
                    if epoch != registry.epoch() {
                        debug!(%key, epoch, current = registry.epoch(), "dropping stale icon");
                        continue;
                    }
                    match result {
                        Ok(Some(meta)) => {
                            changed |= registry.apply_asset_meta(&key, meta);
                        }
                        Ok(None) => debug!(%key, "no icon published"),
                        Err(error) => debug!(%key, %error, "icon lookup failed"),
                    }
                }
            }
        }

        if !self.in_flight && self.next_poll_at.is_some_and(|at| now >= at) {
            self.next_poll_at = None;
            self.request_deltas();
        }

        changed
    }
}
