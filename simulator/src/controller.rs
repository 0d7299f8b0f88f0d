//! Seeding run controller.

use std::time::Duration;

use orderdesk_common::{OrderId, UserId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, ShownOrder};
use crate::factory::Factory;
use crate::metrics::RunMetrics;

/// How much to seed and read back.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub users: usize,
    pub orders_per_user: usize,
    /// `GET /orders/{id}` calls per user, spread over that user's orders.
    pub shows_per_user: usize,
    /// Pause between requests.
    pub pace: Duration,
    /// Delete the seeded users (and with them their orders) at the end.
    pub cleanup: bool,
}

/// A seeded user and the session the run opened for them.
struct Session {
    user_id: UserId,
    client: ApiClient,
    orders: Vec<OrderId>,
}

/// Drives one seeding run against a live server.
pub struct SimulationController {
    client: ApiClient,
    factory: Factory,
    plan: RunPlan,
    metrics: RunMetrics,
}

impl SimulationController {
    pub fn new(client: ApiClient, plan: RunPlan, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            client,
            factory: Factory::new(rng),
            plan,
            metrics: RunMetrics::new(),
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut sessions = self.seed_users().await;
        if sessions.is_empty() {
            anyhow::bail!("no user could be registered; is the server reachable?");
        }

        for session in &mut sessions {
            self.seed_orders(session).await;
        }
        for session in &sessions {
            self.read_back(session).await;
        }

        if self.plan.cleanup {
            for session in &sessions {
                if let Err(e) = session.client.delete_user(session.user_id).await {
                    warn!("Failed to delete user {}: {}", session.user_id, e);
                }
            }
            info!("Removed {} seeded users", sessions.len());
        }

        Ok(())
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    async fn seed_users(&mut self) -> Vec<Session> {
        info!("Registering {} users", self.plan.users);
        let mut sessions = Vec::with_capacity(self.plan.users);

        for index in 0..self.plan.users {
            let draft = self.factory.user(index);
            let profile = match self.client.register(&draft).await {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Failed to register {}: {}", draft.email, e);
                    self.metrics.user_failures += 1;
                    continue;
                }
            };
            let login = match self.client.login(&draft.email, &draft.password).await {
                Ok(login) => login,
                Err(e) => {
                    warn!("Failed to log in as {}: {}", draft.email, e);
                    self.metrics.user_failures += 1;
                    continue;
                }
            };
            debug!("Logged in as {} ({})", login.user.email, login.token_type);

            self.metrics.users_created += 1;
            sessions.push(Session {
                user_id: profile.id,
                client: self.client.with_token(login.access_token),
                orders: Vec::new(),
            });
            self.pause().await;
        }

        sessions
    }

    async fn seed_orders(&mut self, session: &mut Session) {
        for _ in 0..self.plan.orders_per_user {
            let draft = self.factory.order();
            match session.client.create_order(&draft).await {
                Ok(created) => {
                    debug!(
                        "Created order {} for {} {}",
                        created.value.id, created.value.value, created.value.currency
                    );
                    session.orders.push(created.value.id);
                    self.metrics.creates.record_success(created.elapsed);
                }
                Err(e) => {
                    warn!("Failed to create order: {}", e);
                    self.metrics.creates.record_failure();
                }
            }
            self.pause().await;
        }
    }

    async fn read_back(&mut self, session: &Session) {
        for _ in 0..self.plan.shows_per_user {
            let Some(id) = self.factory.pick(&session.orders) else {
                return;
            };
            match session.client.show_order(id).await {
                Ok(shown) => {
                    let ShownOrder { order, converted_value: conversion } = shown.value;
                    match &conversion.error {
                        Some(reason) => debug!("Order {} conversion degraded: {}", id, reason),
                        None => debug!(
                            "Order {}: {} {} = {} {}",
                            id,
                            order.value,
                            order.currency,
                            conversion.converted_amount,
                            conversion.to_currency
                        ),
                    }
                    self.metrics
                        .record_show(shown.elapsed, conversion.is_degraded());
                }
                Err(e) => {
                    warn!("Failed to show order {}: {}", id, e);
                    self.metrics.shows.record_failure();
                }
            }
            self.pause().await;
        }
    }

    async fn pause(&self) {
        if !self.plan.pace.is_zero() {
            tokio::time::sleep(self.plan.pace).await;
        }
    }
}
