//! The delivery retry loop.
//!
//! One delivery is a bounded sequence of attempts. Each attempt fetches a
//! fresh crumb, substitutes the path template, POSTs, and compares the status
//! code to the endpoint's expectation:
//!
//! ```text
//!   ┌────────────── attempt n of count ──────────────┐
//!   │ AcquireToken ─► BuildPath ─► Send ─► Evaluate  │──ok──► Success
//!   └──────┬────────────────────────┬────────┬───────┘
//!          └──── failure: sleep(delay), attempt n+1 ─┘
//!                        n > count ──► Exhausted
//! ```
//!
//! Backoff is flat: the same delay follows every failed attempt, including
//! the last one. Sleeping is async, so only the task handling this delivery
//! waits.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use triggers::{AttemptFailure, DeliveryError, EndpointDefinition, JenkinsApi};

/// Proof of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// The substituted path that was POSTed.
    pub path: String,
    /// Status code Jenkins answered with.
    pub status: u16,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Runs deliveries against one Jenkins instance.
#[derive(Clone)]
pub struct DeliveryExecutor {
    jenkins: Arc<dyn JenkinsApi>,
}

impl DeliveryExecutor {
    pub fn new(jenkins: Arc<dyn JenkinsApi>) -> Self {
        Self { jenkins }
    }

    /// Delivers one trigger to `endpoint`, trying at most `retry_count` times.
    ///
    /// A `retry_count` of zero or less fails immediately without contacting
    /// Jenkins.
    #[instrument(
        name = "delivery.deliver",
        skip_all,
        fields(endpoint = %endpoint.id, repository = %repository, branch = %branch, retry_count = retry_count)
    )]
    pub async fn deliver(
        &self,
        endpoint: &EndpointDefinition,
        repository: &str,
        branch: &str,
        retry_delay: Duration,
        retry_count: i64,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let mut attempts: u32 = 0;
        let mut last_failure = None;

        for attempt in 1..=retry_count {
            attempts = attempts.saturating_add(1);
            info!("Retry: ({attempt}/{retry_count})");

            match self.attempt(endpoint, repository, branch).await {
                Ok((path, status)) => {
                    return Ok(DeliveryReceipt {
                        path,
                        status,
                        attempts,
                    });
                }
                Err(failure) => {
                    warn!(error = %failure, "Delivery attempt failed");
                    last_failure = Some(failure);
                    if !retry_delay.is_zero() {
                        tokio::time::sleep(retry_delay).await;
                    }
                }
            }
        }

        Err(DeliveryError::Exhausted {
            path: endpoint.path.clone(),
            attempts,
            last_failure,
        })
    }

    async fn attempt(
        &self,
        endpoint: &EndpointDefinition,
        repository: &str,
        branch: &str,
    ) -> Result<(String, u16), AttemptFailure> {
        let crumb = self
            .jenkins
            .fetch_crumb()
            .await
            .map_err(AttemptFailure::Crumb)?;

        let path = endpoint.build_path(repository, branch);

        let status = match self.jenkins.trigger_job(&path, &crumb).await {
            Ok(status) => status,
            Err(source) => return Err(AttemptFailure::Send { path, source }),
        };
        info!(path = %path, status, "Posted to endpoint");

        if !endpoint.is_success(status) {
            return Err(AttemptFailure::UnexpectedStatus {
                expected: endpoint.success.http_status.clone(),
                actual: status,
            });
        }

        Ok((path, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{transport_error, ScriptedJenkins};
    use triggers::{EndpointId, JenkinsError, RetrySettings, SuccessCriteria};

    fn endpoint(status: &str) -> EndpointDefinition {
        EndpointDefinition {
            id: EndpointId::new("deploy").unwrap(),
            path: "job/{{.repository}}/branch/{{.branch}}/build".to_string(),
            retry: RetrySettings::default(),
            success: SuccessCriteria {
                http_status: status.to_string(),
            },
        }
    }

    fn executor(jenkins: &Arc<ScriptedJenkins>) -> DeliveryExecutor {
        DeliveryExecutor::new(jenkins.clone())
    }

    #[tokio::test]
    async fn first_attempt_success_posts_substituted_path_with_crumb() {
        let jenkins = Arc::new(ScriptedJenkins::answering(201));

        let receipt = executor(&jenkins)
            .deliver(&endpoint("201"), "app", "main", Duration::ZERO, 3)
            .await
            .unwrap();

        assert_eq!(
            receipt,
            DeliveryReceipt {
                path: "job/app/branch/main/build".to_string(),
                status: 201,
                attempts: 1,
            }
        );
        assert_eq!(
            jenkins.posts(),
            vec![("job/app/branch/main/build".to_string(), "crumb-1".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_status_exhausts_budget_with_flat_delay() {
        let jenkins = Arc::new(ScriptedJenkins::answering(500));
        let started = tokio::time::Instant::now();

        let err = executor(&jenkins)
            .deliver(&endpoint("201"), "app", "main", Duration::from_secs(2), 3)
            .await
            .unwrap_err();

        assert_eq!(jenkins.posts().len(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
        assert_eq!(
            err,
            DeliveryError::Exhausted {
                path: "job/{{.repository}}/branch/{{.branch}}/build".to_string(),
                attempts: 3,
                last_failure: Some(AttemptFailure::UnexpectedStatus {
                    expected: "201".to_string(),
                    actual: 500,
                }),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_third_attempt_stops_retrying() {
        let jenkins = Arc::new(
            ScriptedJenkins::answering(201)
                .with_statuses([Ok(503), Err(transport_error()), Ok(201), Ok(201)]),
        );
        let started = tokio::time::Instant::now();

        let receipt = executor(&jenkins)
            .deliver(&endpoint("201"), "app", "main", Duration::from_secs(1), 5)
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 3);
        assert_eq!(jenkins.posts().len(), 3);
        assert_eq!(jenkins.crumb_calls(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(2) && elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn crumb_failure_consumes_an_attempt_without_posting() {
        let jenkins = Arc::new(
            ScriptedJenkins::answering(201).with_crumbs([
                Err(JenkinsError::MalformedCrumb {
                    body: "<html>".to_string(),
                }),
                Ok("fresh".to_string()),
            ]),
        );

        let receipt = executor(&jenkins)
            .deliver(&endpoint("201"), "app", "main", Duration::ZERO, 2)
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
        assert_eq!(jenkins.crumb_calls(), 2);
        assert_eq!(
            jenkins.posts(),
            vec![("job/app/branch/main/build".to_string(), "fresh".to_string())]
        );
    }

    #[tokio::test]
    async fn crumb_failure_on_every_attempt_exhausts() {
        let jenkins = Arc::new(ScriptedJenkins::answering(201).with_crumbs([Err(transport_error())]));

        let err = executor(&jenkins)
            .deliver(&endpoint("201"), "app", "main", Duration::ZERO, 2)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DeliveryError::Exhausted {
                attempts: 2,
                last_failure: Some(AttemptFailure::Crumb(_)),
                ..
            }
        ));
        assert!(jenkins.posts().is_empty());
    }

    #[tokio::test]
    async fn non_positive_retry_count_fails_without_contacting_jenkins() {
        let jenkins = Arc::new(ScriptedJenkins::answering(201));

        for count in [0, -1] {
            let err = executor(&jenkins)
                .deliver(&endpoint("201"), "app", "main", Duration::ZERO, count)
                .await
                .unwrap_err();

            assert!(matches!(
                err,
                DeliveryError::Exhausted {
                    attempts: 0,
                    last_failure: None,
                    ..
                }
            ));
        }
        assert_eq!(jenkins.crumb_calls(), 0);
    }

    #[tokio::test]
    async fn unparsable_expected_status_never_succeeds() {
        let jenkins = Arc::new(ScriptedJenkins::answering(201));

        let err = executor(&jenkins)
            .deliver(&endpoint("created"), "app", "main", Duration::ZERO, 2)
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Exhausted { attempts: 2, .. }));
        assert_eq!(jenkins.posts().len(), 2);
    }
}
