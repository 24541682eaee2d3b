//! Broadcast dispatcher: one tick of fetch, format and fan-out.
//!
//! Quotes are fetched once per tick for every tracked pair, concurrently,
//! regardless of how many subscribers there are. A failed fetch degrades
//! that pair to a placeholder line; a failed delivery is logged and the
//! remaining subscribers are still served.

use crate::scheduler::{task, Task};
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use pricebell_alerts::{Notifier, RecipientId, Registry};
use pricebell_core::{format_pair_line, PairId, PairTable, Quote};
use pricebell_feeds::PriceSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Separator placed between the header and each pair line.
pub const SEPARATOR: &str = "\n\n";

/// Digest header carrying the tick time.
pub fn format_header(now: DateTime<Utc>) -> String {
    now.format("%Y/%m/%d - %H:%M - UTC").to_string()
}

/// Header followed by each line, joined by `separator`.
pub fn compose_digest<'a, I>(header: &str, lines: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut digest = header.to_string();
    for line in lines {
        digest.push_str(separator);
        digest.push_str(line);
    }
    digest
}

/// What a completed tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Subscribers in the snapshot
    pub subscribers: usize,
    /// Pairs whose fetch failed
    pub failed_pairs: Vec<PairId>,
    /// Digests handed to the notifier successfully
    pub delivered: usize,
    /// Recipients whose delivery failed
    pub failed_deliveries: Vec<RecipientId>,
    /// Subscribers skipped for having no subscriptions
    pub skipped: usize,
}

/// Result of one `run_tick` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nobody subscribed to anything; no fetch was made.
    Idle,
    /// A previous tick was still running; this one did nothing.
    Overlapped,
    Completed(TickReport),
}

// Clears the in-flight flag even if the tick future is dropped mid-way.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates broadcast ticks.
pub struct BroadcastDispatcher {
    pairs: Arc<PairTable>,
    registry: Arc<Registry>,
    source: Arc<dyn PriceSource>,
    notifier: Arc<dyn Notifier>,
    in_flight: AtomicBool,
}

impl BroadcastDispatcher {
    pub fn new(
        pairs: Arc<PairTable>,
        registry: Arc<Registry>,
        source: Arc<dyn PriceSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pairs,
            registry,
            source,
            notifier,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a tick is currently running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one tick stamped with the current time.
    pub async fn run_tick(&self) -> TickOutcome {
        self.run_tick_at(Utc::now()).await
    }

    /// Run one tick stamped with `now`.
    pub async fn run_tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Previous tick still running, skipping");
            return TickOutcome::Overlapped;
        }
        let _guard = InFlight(&self.in_flight);

        let snapshot = self.registry.snapshot();
        if snapshot.iter().all(|s| s.pairs.is_empty()) {
            info!(subscribers = snapshot.len(), "No active subscriptions, skipping tick");
            return TickOutcome::Idle;
        }

        let quotes = self.fetch_all().await;
        let mut report = TickReport {
            subscribers: snapshot.len(),
            ..Default::default()
        };

        let mut lines: HashMap<&PairId, String> = HashMap::with_capacity(quotes.len());
        for (pair_id, line, quote) in quotes {
            if !quote.is_available() {
                report.failed_pairs.push(pair_id.clone());
            }
            lines.insert(pair_id, line);
        }

        let header = format_header(now);

        for subscriber in &snapshot {
            if subscriber.pairs.is_empty() {
                report.skipped += 1;
                continue;
            }

            let digest = compose_digest(
                &header,
                subscriber
                    .pairs
                    .iter()
                    .filter_map(|id| lines.get(id).map(String::as_str)),
                SEPARATOR,
            );

            match self.notifier.send(subscriber.recipient, &digest).await {
                Ok(()) => {
                    debug!(recipient = subscriber.recipient, "Digest delivered");
                    report.delivered += 1;
                }
                Err(e) => {
                    error!(
                        recipient = subscriber.recipient,
                        error = %e,
                        "Failed to deliver digest"
                    );
                    report.failed_deliveries.push(subscriber.recipient);
                }
            }
        }

        info!(
            subscribers = report.subscribers,
            delivered = report.delivered,
            failed_deliveries = report.failed_deliveries.len(),
            failed_pairs = report.failed_pairs.len(),
            "Tick complete"
        );

        TickOutcome::Completed(report)
    }

    /// Fetch every tracked pair concurrently and format its line.
    async fn fetch_all(&self) -> Vec<(&PairId, String, Quote)> {
        let futures = self.pairs.iter().map(|pair| async move {
            let result = self.source.fetch_quote(pair.id.as_str()).await;
            if let Err(e) = &result {
                warn!(pair = %pair.id, error = %e, "Failed to fetch quote");
            }
            let quote = Quote::from(result);
            (&pair.id, format_pair_line(pair, &quote), quote)
        });

        join_all(futures).await
    }

    /// Wrap this dispatcher as a scheduler task.
    pub fn into_task(self: Arc<Self>) -> Task {
        task(move || {
            let dispatcher = Arc::clone(&self);
            async move {
                dispatcher.run_tick().await;
            }
        })
    }
}
