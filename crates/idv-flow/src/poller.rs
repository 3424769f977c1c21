//! # Status Poller
//!
//! Two independent timer-driven protocols:
//!
//! - **Status verification**: repeatedly query the identification status
//!   endpoint until a terminal status arrives or the caller cancels.
//! - **New-code countdown**: a per-second countdown gating when a
//!   one-time verification code may be re-requested.
//!
//! Both are singular: starting a new instance aborts the prior one, so
//! only the latest timer's ticks can ever reach a receiver. Dropping the
//! poller aborts everything it owns; no orphaned polling survives a
//! coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use idv_client::{ApiError, IdentificationApi};
use idv_core::{IdentificationStatus, IdentificationUid, ReferenceToken, StatusResponse};

/// Outcome of one status-verification run.
#[derive(Debug)]
pub enum PollOutcome {
    /// The identification completed successfully.
    Success(IdentificationUid),
    /// The identification was confirmed; the token is the confirmation
    /// reference, when the service provided one.
    Confirmed(Option<ReferenceToken>),
    /// Polling stopped on a terminal business status
    /// (`failed`/`rejected`/`fraud`); the full response is handed back
    /// for fallback routing and provider-code classification.
    Ended(StatusResponse),
    /// The status call itself failed.
    Failed(ApiError),
}

/// Timer-driven poller owned by one sub-flow coordinator.
///
/// At most one status-verification task and one countdown task exist at
/// a time; replacing either aborts its predecessor.
#[derive(Debug)]
pub struct StatusPoller {
    poll_interval: Duration,
    verification: Option<JoinHandle<()>>,
    countdown: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Create a poller that polls every `poll_interval`.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            verification: None,
            countdown: None,
        }
    }

    /// Start (or restart) status verification for `uid`.
    ///
    /// The returned channel yields exactly one [`PollOutcome`], after
    /// which the task stops. Any previously running verification is
    /// aborted first; its channel closes without a value.
    pub fn start_verification(
        &mut self,
        api: Arc<dyn IdentificationApi>,
        uid: IdentificationUid,
    ) -> mpsc::Receiver<PollOutcome> {
        self.cancel_verification();
        let (tx, rx) = mpsc::channel(1);
        let interval = self.poll_interval;
        self.verification = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = match api.get_identification(&uid).await {
                    Ok(resp) => match resp.status {
                        IdentificationStatus::Successful => PollOutcome::Success(resp.id),
                        IdentificationStatus::Confirmed => {
                            PollOutcome::Confirmed(resp.reference_token)
                        }
                        status if status.is_terminal() => PollOutcome::Ended(resp),
                        status => {
                            debug!(%status, uid = uid.as_str(), "identification not terminal; polling continues");
                            continue;
                        }
                    },
                    Err(err) => {
                        warn!(uid = uid.as_str(), %err, "status poll failed");
                        PollOutcome::Failed(err)
                    }
                };
                let _ = tx.send(outcome).await;
                break;
            }
        }));
        rx
    }

    /// Abort the running status verification, if any.
    pub fn cancel_verification(&mut self) {
        if let Some(handle) = self.verification.take() {
            handle.abort();
        }
    }

    /// Start (or restart) the new-code countdown from `total_secs`.
    ///
    /// The channel yields `total_secs, total_secs - 1, …, 0`, one value
    /// per second starting immediately, then closes. Cancelling ends the
    /// sequence at whatever value was emitted last.
    pub fn start_new_code_countdown(&mut self, total_secs: u64) -> mpsc::Receiver<u64> {
        self.cancel_countdown();
        let (tx, rx) = mpsc::channel(1);
        self.countdown = Some(tokio::spawn(async move {
            for remaining in (0..=total_secs).rev() {
                if tx.send(remaining).await.is_err() {
                    return;
                }
                if remaining > 0 {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }));
        rx
    }

    /// Abort the running countdown, if any.
    pub fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    /// Whether the countdown has run to completion (a new code may be
    /// requested). `true` when no countdown was ever started.
    pub fn countdown_finished(&self) -> bool {
        self.countdown.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancel_verification();
        self.cancel_countdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted API: replays a fixed status sequence, repeating the last
    /// entry forever, and counts calls.
    struct ScriptedStatus {
        sequence: Vec<StatusResponse>,
        calls: Mutex<usize>,
    }

    impl ScriptedStatus {
        fn new(sequence: Vec<StatusResponse>) -> Arc<Self> {
            Arc::new(Self {
                sequence,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    fn resp(status: IdentificationStatus, reference: Option<&str>) -> StatusResponse {
        StatusResponse {
            id: IdentificationUid("id-1".into()),
            status,
            next_step: None,
            fallback_step: None,
            provider_status_code: None,
            reference_token: reference.map(|r| ReferenceToken(r.into())),
            created_at: None,
        }
    }

    #[async_trait]
    impl IdentificationApi for ScriptedStatus {
        async fn resolve_method(
            &self,
        ) -> Result<idv_client::MethodResolution, ApiError> {
            unimplemented!("not exercised by poller tests")
        }

        async fn get_identification(
            &self,
            _uid: &IdentificationUid,
        ) -> Result<StatusResponse, ApiError> {
            let mut calls = self.calls.lock().unwrap();
            let index = (*calls).min(self.sequence.len() - 1);
            *calls += 1;
            Ok(self.sequence[index].clone())
        }

        async fn verify_iban(
            &self,
            _uid: &IdentificationUid,
            _iban: &idv_core::Iban,
        ) -> Result<StatusResponse, ApiError> {
            unimplemented!("not exercised by poller tests")
        }

        async fn authorize_one_time_code(
            &self,
            _uid: &IdentificationUid,
        ) -> Result<idv_client::OtcAuthorization, ApiError> {
            unimplemented!("not exercised by poller tests")
        }

        async fn verify_one_time_code(
            &self,
            _uid: &IdentificationUid,
            _code: &str,
        ) -> Result<idv_client::OtcConfirmation, ApiError> {
            unimplemented!("not exercised by poller tests")
        }

        async fn get_mobile_number(&self) -> Result<idv_core::MobileNumber, ApiError> {
            unimplemented!("not exercised by poller tests")
        }
    }

    fn uid() -> IdentificationUid {
        IdentificationUid("id-1".into())
    }

    // ── Status verification ──────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn pending_pending_confirmed_delivers_reference_once() {
        let api = ScriptedStatus::new(vec![
            resp(IdentificationStatus::Pending, None),
            resp(IdentificationStatus::Pending, None),
            resp(IdentificationStatus::Confirmed, Some("R1")),
        ]);
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_verification(api.clone(), uid());

        match rx.recv().await {
            Some(PollOutcome::Confirmed(Some(reference))) => {
                assert_eq!(reference.as_str(), "R1");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // The channel closes after the single delivery; no further ticks
        // occur.
        assert!(rx.recv().await.is_none());
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_status_delivers_identification_id() {
        let api = ScriptedStatus::new(vec![resp(IdentificationStatus::Successful, None)]);
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_verification(api, uid());

        match rx.recv().await {
            Some(PollOutcome::Success(id)) => assert_eq!(id.as_str(), "id-1"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_hands_back_the_full_response() {
        let mut failed = resp(IdentificationStatus::Failed, None);
        failed.provider_status_code = Some("2500".into());
        let api = ScriptedStatus::new(vec![failed]);
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_verification(api, uid());

        match rx.recv().await {
            Some(PollOutcome::Ended(resp)) => {
                assert_eq!(resp.status, IdentificationStatus::Failed);
                assert_eq!(resp.provider_status_code.as_deref(), Some("2500"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn starting_a_new_verification_invalidates_the_prior_one() {
        let pending_forever =
            ScriptedStatus::new(vec![resp(IdentificationStatus::Pending, None)]);
        let confirms = ScriptedStatus::new(vec![resp(
            IdentificationStatus::Confirmed,
            Some("R2"),
        )]);

        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut first = poller.start_verification(pending_forever, uid());
        let mut second = poller.start_verification(confirms, uid());

        // Only the latest timer's ticks may ever deliver.
        match second.recv().await {
            Some(PollOutcome::Confirmed(Some(reference))) => {
                assert_eq!(reference.as_str(), "R2");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(first.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_aborts_polling() {
        let api = ScriptedStatus::new(vec![resp(IdentificationStatus::Pending, None)]);
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_verification(api, uid());
        drop(poller);
        assert!(rx.recv().await.is_none());
    }

    // ── New-code countdown ───────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn countdown_emits_every_value_down_to_zero() {
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_new_code_countdown(5);

        let mut seen = Vec::new();
        while let Some(value) = rx.recv().await {
            seen.push(value);
        }
        assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
        assert!(poller.countdown_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_ends_the_sequence_where_it_stands() {
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut rx = poller.start_new_code_countdown(5);

        let mut seen = Vec::new();
        while let Some(value) = rx.recv().await {
            seen.push(value);
            if value == 3 {
                poller.cancel_countdown();
            }
        }
        assert_eq!(seen, vec![5, 4, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_the_countdown_cancels_the_prior_one() {
        let mut poller = StatusPoller::new(Duration::from_secs(3));
        let mut first = poller.start_new_code_countdown(30);
        assert_eq!(first.recv().await, Some(30));

        let mut second = poller.start_new_code_countdown(5);
        let mut seen = Vec::new();
        while let Some(value) = second.recv().await {
            seen.push(value);
        }
        assert_eq!(seen, vec![5, 4, 3, 2, 1, 0]);
        // The first channel closed without running to zero.
        assert!(first.recv().await.is_none());
    }
}
