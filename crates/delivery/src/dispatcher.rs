//! Walks the configured triggers for one incoming event.
//!
//! Triggers are processed in configuration order. The first delivery that
//! exhausts its retries stops the walk; triggers after it are not evaluated
//! for this event even though they target unrelated endpoints.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use triggers::{Config, ConfigError, DeliveryError, EndpointDefinition, JenkinsApi, NormalizedEvent};

use crate::executor::{DeliveryExecutor, DeliveryReceipt};

/// What happened to one event. Used for logging; webhook responses do not
/// depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Triggers whose rules matched the event.
    pub matched: usize,
    /// Successful deliveries, in order.
    pub delivered: Vec<DeliveryReceipt>,
    /// Triggers skipped for an unknown endpoint or a malformed retry policy.
    pub skipped: usize,
    /// The exhausted delivery that stopped processing, if any.
    pub aborted: Option<DeliveryError>,
}

/// Matches events against the trigger catalog and runs the deliveries.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<Config>,
    executor: DeliveryExecutor,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, jenkins: Arc<dyn JenkinsApi>) -> Self {
        Self {
            config,
            executor: DeliveryExecutor::new(jenkins),
        }
    }

    /// Processes every trigger for `event`. Never fails; see [`DispatchOutcome`].
    pub async fn dispatch(&self, event: &NormalizedEvent) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for trigger in &self.config.triggers {
            let Some(endpoint) = self.config.endpoint(&trigger.endpoint) else {
                debug!(endpoint = %trigger.endpoint, "Trigger references unknown endpoint");
                outcome.skipped += 1;
                continue;
            };

            if !trigger.matches(event) {
                continue;
            }
            outcome.matched += 1;

            let (retry_delay, retry_count) = match retry_policy(endpoint) {
                Ok(policy) => policy,
                Err(e) => {
                    warn!(endpoint = %trigger.endpoint, error = %e, "Skipping trigger");
                    outcome.skipped += 1;
                    continue;
                }
            };

            match self
                .executor
                .deliver(endpoint, &event.repository, &event.branch, retry_delay, retry_count)
                .await
            {
                Ok(receipt) => {
                    info!(
                        endpoint = %trigger.endpoint,
                        path = %receipt.path,
                        attempts = receipt.attempts,
                        "Triggered Jenkins job"
                    );
                    outcome.delivered.push(receipt);
                }
                Err(e) => {
                    error!(
                        endpoint = %trigger.endpoint,
                        error = %e,
                        "Error processing endpoint. Breaking."
                    );
                    outcome.aborted = Some(e);
                    break;
                }
            }
        }

        outcome
    }
}

fn retry_policy(endpoint: &EndpointDefinition) -> Result<(std::time::Duration, i64), ConfigError> {
    Ok((endpoint.retry_delay()?, endpoint.retry_count()?))
}
