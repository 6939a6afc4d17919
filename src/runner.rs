//! Batch orchestration
//!
//! Processes the account batch strictly in order, one open browser session
//! at a time, with a randomized rest interval between accounts. Sequential
//! pacing is the point: concurrent sessions would defeat the human-cadence
//! emulation.

use serde::Serialize;
use tracing::info;

use crate::accounts::Credential;
use crate::browser::{LoginDriver, LoginOutcome};
use crate::pacing;

/// Aggregate result of one full run over the account batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub success_count: usize,
    pub total_count: usize,
    pub outcomes: Vec<LoginOutcome>,
}

/// Sequential batch runner.
pub struct BatchRunner {
    driver: LoginDriver,
}

impl BatchRunner {
    pub fn new(driver: LoginDriver) -> Self {
        Self { driver }
    }

    /// Process every credential in order. A failed account never stops the
    /// batch; every entry produces exactly one outcome.
    pub async fn run(&self, batch: &[Credential]) -> RunSummary {
        info!("Processing {} account(s)", batch.len());

        let mut outcomes = Vec::with_capacity(batch.len());

        for (index, credential) in batch.iter().enumerate() {
            info!("Account {}/{}: {}", index + 1, batch.len(), credential.user);

            let outcome = self.driver.login(credential).await;
            outcomes.push(outcome);

            // Rest between accounts, modeled on an operator taking a break.
            if index + 1 < batch.len() {
                let waited = pacing::pause(pacing::ACCOUNT_REST).await;
                info!("Rested {:.1}s before the next account", waited.as_secs_f64());
            }
        }

        let success_count = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Batch complete: {}/{} account(s) succeeded",
            success_count,
            outcomes.len()
        );

        RunSummary {
            success_count,
            total_count: outcomes.len(),
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::accounts;
    use crate::browser::mock::{MockAutomation, MockFailure};

    fn batch(users: &[&str]) -> Vec<Credential> {
        users
            .iter()
            .map(|u| Credential {
                user: u.to_string(),
                pass: "secret".to_string(),
            })
            .collect()
    }

    fn runner(automation: MockAutomation) -> BatchRunner {
        BatchRunner::new(LoginDriver::new(
            Box::new(automation),
            "https://service.example/",
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_outcome_per_account_in_input_order() {
        let runner = runner(MockAutomation::returning("exclusive owner"));
        let summary = runner.run(&batch(&["u1", "u2", "u3"])).await;

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.success_count, 3);
        let users: Vec<&str> = summary.outcomes.iter().map(|o| o.user.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_batch() {
        let automation = MockAutomation::failing_at(MockFailure::Navigate);
        let acquired = automation.acquired.clone();
        let released = automation.released.clone();
        let runner = runner(automation);

        let summary = runner.run(&batch(&["u1", "u2", "u3"])).await;

        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.success_count, 0);
        assert!(summary.outcomes.iter().all(|o| !o.success));
        // One session per account, every one released.
        assert_eq!(acquired.load(Ordering::Relaxed), 3);
        assert_eq!(released.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rest_intervals_between_accounts_only() {
        // Per login: observe [3,5]s + form settle [2,3]s + two field waits
        // [1,2]s each + 5s grace. Two rests of [8,12]s for three accounts.
        let runner = runner(MockAutomation::returning("exclusive owner"));

        let start = tokio::time::Instant::now();
        runner.run(&batch(&["u1", "u2", "u3"])).await;
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(3 * 12 + 2 * 8));
        assert!(elapsed <= Duration::from_secs(3 * 17 + 2 * 12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_account_has_no_rest_interval() {
        let runner = runner(MockAutomation::returning("exclusive owner"));

        let start = tokio::time::Instant::now();
        runner.run(&batch(&["u1"])).await;
        let elapsed = start.elapsed();

        assert!(elapsed <= Duration::from_secs(17));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_batch_end_to_end() {
        // Sessions report "u1" as page content: u1 succeeds through the
        // own-username check, u2 does not.
        let parsed = accounts::parse(Some("u1:p1,u2:p2")).unwrap();
        let runner = runner(MockAutomation::returning("signed in as u1"));

        let summary = runner.run(&parsed).await;

        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.outcomes[0].user, "u1");
        assert!(summary.outcomes[0].success);
        assert_eq!(summary.outcomes[1].user, "u2");
        assert!(!summary.outcomes[1].success);
    }
}
