//! Background demand simulation.
//!
//! A long-lived worker that periodically perturbs per-flight demand
//! factors, feeding back into the pricing engine, and appends a fare
//! snapshot for every material change. Storage, clock and RNG are injected;
//! `run_once` is the synchronous single pass used by the admin trigger and
//! tests. One bad flight never aborts a pass, and a failed pass never
//! stops the loop.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use skyfare_core::{Clock, Flight};
use skyfare_pricing::{demand, quote};
use skyfare_store::{DbClient, FareHistoryRepo, FlightRepo};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DemandPassSummary {
    pub scanned: usize,
    pub updated: usize,
}

pub struct DemandSimulator {
    db: DbClient,
    clock: Arc<dyn Clock>,
    interval: Duration,
    rng: Mutex<StdRng>,
}

impl DemandSimulator {
    pub fn new(db: DbClient, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            interval: DEFAULT_INTERVAL,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Seeded RNG for reproducible passes.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Spawn the periodic loop. The returned handle stops it; no lock is
    /// held across the sleep.
    pub fn start(self: Arc<Self>) -> SimulatorHandle {
        let (shutdown, mut stopped) = watch::channel(false);
        let simulator = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(simulator.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            info!(interval_secs = simulator.interval.as_secs(), "demand simulator started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = simulator.run_once().await {
                            error!(error = %e, "demand pass failed");
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
            info!("demand simulator stopped");
        });

        SimulatorHandle { shutdown, task }
    }

    /// One full pass over every not-yet-departed flight.
    pub async fn run_once(&self) -> Result<DemandPassSummary, sqlx::Error> {
        let now = self.clock.now();
        let flights = FlightRepo::departing_after(&self.db.pool, now).await?;

        let mut updated = 0;
        for flight in &flights {
            match self.adjust_flight(flight).await {
                Ok(true) => updated += 1,
                Ok(false) => {}
                // Isolate the failure: log and move to the next flight.
                Err(e) => {
                    error!(flight_id = %flight.id, error = %e, "demand adjustment failed")
                }
            }
        }

        info!(scanned = flights.len(), updated, "demand pass complete");
        Ok(DemandPassSummary {
            scanned: flights.len(),
            updated,
        })
    }

    async fn adjust_flight(&self, flight: &Flight) -> Result<bool, sqlx::Error> {
        let now = self.clock.now();
        let hours_until = (flight.departure_time - now).num_seconds() as f64 / 3600.0;

        let adjustment = {
            let mut rng = self.rng.lock().expect("rng poisoned");
            demand::draw_adjustment(&mut *rng, hours_until)
        };
        let next = demand::next_factor(flight.demand_factor, adjustment);
        if !demand::is_material(flight.demand_factor, next) {
            return Ok(false);
        }

        let mut tx = self.db.pool.begin().await?;
        FlightRepo::set_demand_factor(&mut tx, flight.id, next).await?;

        let repriced = Flight {
            demand_factor: next,
            ..flight.clone()
        };
        FareHistoryRepo::append(
            &mut tx,
            flight.id,
            quote(&repriced, now),
            next,
            flight.available_seats,
            now,
        )
        .await?;
        tx.commit().await?;
        Ok(true)
    }
}

/// Lifecycle handle for a running simulator.
pub struct SimulatorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
