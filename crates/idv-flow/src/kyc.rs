//! # KYC Sub-flow Coordinator
//!
//! Drives the biometric/document capture state machine. Capture itself
//! is delegated to the [`CaptureProvider`]; results accumulate in a
//! coordinator-owned [`CaptureContext`] and are forwarded unchanged.
//!
//! On a `failed` status the provider status code decides between a
//! retry (nothing cleared, retry budget decremented) and a terminal
//! abort (persisted flow data cleared). `rejected` and `fraud` always
//! clear. A terminal next-step instruction naming the signing flow is
//! handed to the parent as a [`FlowOutcome::NextStep`] for chaining into
//! the bank coordinator.

use std::sync::Arc;

use tracing::{debug, warn};

use idv_client::{ApiError, IdentificationApi};
use idv_core::{
    CodeClass, FlowFailure, IdentificationStatus, IdentificationStep, IdentificationUid, Route,
    StatusResponse,
};
use idv_state::{DocumentType, KycStep};
use idv_store::{keys, StepStore};

use crate::capture::{CaptureContext, CaptureError, CaptureProvider};
use crate::config::FlowConfig;
use crate::outcome::{FlowOutcome, OutcomeSender};
use crate::poller::{PollOutcome, StatusPoller};
use crate::presentation::{AlertChoice, Presenter, Screen, ScreenEvent};
use crate::session::SessionState;

/// Coordinator for the biometric/document capture sub-flow.
pub struct KycCoordinator<'s> {
    api: Arc<dyn IdentificationApi>,
    presenter: Arc<dyn Presenter>,
    capture: Arc<dyn CaptureProvider>,
    store: Arc<StepStore>,
    config: FlowConfig,
    session: &'s mut SessionState,
    poller: StatusPoller,
    outcome: OutcomeSender,
    current: KycStep,
    context: CaptureContext,
}

impl<'s> KycCoordinator<'s> {
    /// Create a coordinator with an explicitly injected capture context,
    /// restoring the persisted step when one is present for the current
    /// session.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<dyn IdentificationApi>,
        presenter: Arc<dyn Presenter>,
        capture: Arc<dyn CaptureProvider>,
        store: Arc<StepStore>,
        config: FlowConfig,
        session: &'s mut SessionState,
        context: CaptureContext,
    ) -> (Self, tokio::sync::mpsc::Receiver<FlowOutcome>) {
        let (outcome, rx) = OutcomeSender::channel();
        let current = store.get::<KycStep>(keys::KYC_STEP).unwrap_or_else(KycStep::start);
        let poller = StatusPoller::new(config.poll_interval);
        (
            Self {
                api,
                presenter,
                capture,
                store,
                config,
                session,
                poller,
                outcome,
                current,
                context,
            },
            rx,
        )
    }

    /// The step the coordinator is currently in.
    pub fn current_step(&self) -> &KycStep {
        &self.current
    }

    /// The accumulated capture data.
    pub fn capture_context(&self) -> &CaptureContext {
        &self.context
    }

    /// Run the sub-flow from its restored (or initial) step.
    pub async fn run(&mut self) {
        let step = self.current.clone();
        self.perform(step).await;
    }

    /// Drive the state machine from `step` until the outcome is
    /// delivered or a terminal step is reached.
    pub async fn perform(&mut self, step: KycStep) {
        let mut step = step;
        while !self.outcome.is_delivered() {
            match self.execute(step).await {
                Some(next) => step = next,
                None => break,
            }
        }
    }

    async fn execute(&mut self, step: KycStep) -> Option<KycStep> {
        self.store.put(keys::KYC_STEP, &step);
        self.current = step.clone();
        debug!(step = %step, "kyc sub-flow transition");

        match step {
            KycStep::Welcome => match self.presenter.present(Screen::KycWelcome).await {
                ScreenEvent::Continue => Some(KycStep::DocumentTypeSelection),
                ScreenEvent::Quit => Some(KycStep::Quit),
                _ => Some(KycStep::Welcome),
            },
            KycStep::DocumentTypeSelection => {
                match self.presenter.present(Screen::KycDocumentType).await {
                    ScreenEvent::SelectDocument(document_type) => {
                        Some(KycStep::DocumentScan { document_type })
                    }
                    ScreenEvent::Quit => Some(KycStep::Quit),
                    _ => Some(KycStep::DocumentTypeSelection),
                }
            }
            KycStep::DocumentScan { document_type } => self.scan_document(document_type).await,
            KycStep::Selfie => self.capture_selfie().await,
            KycStep::Upload => self.upload_and_poll().await,
            KycStep::Result { status } => self.finish_with_result(status).await,
            KycStep::Quit => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnauthorizedAction));
                None
            }
        }
    }

    // ── Capture steps ────────────────────────────────────────────────

    async fn scan_document(&mut self, document_type: DocumentType) -> Option<KycStep> {
        self.presenter
            .show(Screen::KycDocumentScan { document_type })
            .await;
        match self.capture.scan_document(document_type).await {
            Ok(scan) => {
                self.context.document = Some(scan);
                Some(KycStep::Selfie)
            }
            Err(CaptureError::Cancelled) => Some(KycStep::Quit),
            Err(err) => self.capture_recovery(err, KycStep::DocumentScan { document_type }).await,
        }
    }

    async fn capture_selfie(&mut self) -> Option<KycStep> {
        self.presenter.show(Screen::KycSelfie).await;
        match self.capture.capture_selfie().await {
            Ok(selfie) => {
                self.context.selfie = Some(selfie);
                Some(KycStep::Upload)
            }
            Err(CaptureError::Cancelled) => Some(KycStep::Quit),
            Err(err) => self.capture_recovery(err, KycStep::Selfie).await,
        }
    }

    async fn upload_and_poll(&mut self) -> Option<KycStep> {
        let uid = self.require_uid()?;
        if !self.context.is_complete() {
            warn!("upload reached without complete capture data; restarting capture");
            return Some(KycStep::DocumentTypeSelection);
        }
        self.presenter.show(Screen::KycUpload).await;

        let mut rx = self
            .poller
            .start_verification(self.api.clone(), uid.clone());
        match rx.recv().await {
            Some(PollOutcome::Success(_)) => {
                // A method with a signing requirement chains into the
                // signing flow instead of closing here.
                if self.session.method.is_some_and(|m| m.requires_signing()) {
                    self.outcome.deliver(FlowOutcome::NextStep {
                        step: IdentificationStep::SignDocuments,
                    });
                    None
                } else {
                    Some(KycStep::Result {
                        status: IdentificationStatus::Successful,
                    })
                }
            }
            Some(PollOutcome::Confirmed(Some(reference))) => {
                self.presenter
                    .show(Screen::Result {
                        status: IdentificationStatus::Confirmed,
                    })
                    .await;
                self.outcome
                    .deliver(FlowOutcome::Confirmed { id: uid, reference });
                None
            }
            Some(PollOutcome::Confirmed(None)) => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: "confirmed without a reference token".into(),
                    }));
                None
            }
            Some(PollOutcome::Ended(resp)) => self.handle_terminal(resp).await,
            Some(PollOutcome::Failed(err)) => self.transport_recovery(err, KycStep::Upload).await,
            None => None,
        }
    }

    async fn finish_with_result(&mut self, status: IdentificationStatus) -> Option<KycStep> {
        self.presenter.show(Screen::Result { status }).await;
        let outcome = if status == IdentificationStatus::Successful {
            match &self.session.identification_uid {
                Some(uid) => FlowOutcome::Success { id: uid.clone() },
                None => FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                    detail: "successful result without an identification".into(),
                }),
            }
        } else {
            FlowOutcome::Failure(FlowFailure::AuthorizationFailed)
        };
        self.outcome.deliver(outcome);
        None
    }

    // ── Terminal status handling ─────────────────────────────────────

    /// Classify a terminal business status.
    ///
    /// `rejected`/`fraud` always clear persisted data. For `failed`, the
    /// provider status code picks between retry (nothing cleared) and
    /// terminal abort; a terminal code still honors a usable
    /// next/fallback step before giving up.
    async fn handle_terminal(&mut self, resp: StatusResponse) -> Option<KycStep> {
        match resp.status {
            IdentificationStatus::Rejected | IdentificationStatus::Fraud => {
                self.clear_flow_data();
                Some(KycStep::Result {
                    status: resp.status,
                })
            }
            IdentificationStatus::Failed => {
                let class = self
                    .config
                    .provider_codes
                    .classify(resp.provider_status_code.as_deref());
                match class {
                    CodeClass::Retryable if self.session.retry_count > 0 => {
                        self.session.retry_count -= 1;
                        self.store.put(keys::RETRY_COUNT, &self.session.retry_count);
                        debug!(
                            remaining = self.session.retry_count,
                            code = resp.provider_status_code.as_deref().unwrap_or("-"),
                            "retryable provider code; offering retry"
                        );
                        match self.presenter.present(Screen::KycRetry).await {
                            ScreenEvent::Retry | ScreenEvent::Continue => {
                                Some(KycStep::DocumentTypeSelection)
                            }
                            _ => Some(KycStep::Quit),
                        }
                    }
                    CodeClass::Retryable => {
                        warn!("retry budget exhausted; aborting");
                        self.clear_flow_data();
                        Some(KycStep::Result {
                            status: IdentificationStatus::Failed,
                        })
                    }
                    CodeClass::Terminal => match resp.route() {
                        Route::Next(step) => self.route_external(step),
                        Route::Fallback(step) => {
                            self.session.fallback_step = Some(step);
                            self.store.put(keys::FALLBACK_STEP, &step);
                            self.route_external(step)
                        }
                        Route::Abort => {
                            self.clear_flow_data();
                            Some(KycStep::Result {
                                status: IdentificationStatus::Failed,
                            })
                        }
                    },
                }
            }
            status => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: format!("unexpected terminal status {status}"),
                    }));
                None
            }
        }
    }

    /// Route a server-driven step: capture steps restart locally,
    /// everything else goes to the parent.
    fn route_external(&mut self, step: IdentificationStep) -> Option<KycStep> {
        match step {
            IdentificationStep::DocumentScan => Some(KycStep::DocumentTypeSelection),
            IdentificationStep::Abort => {
                self.clear_flow_data();
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::IdentificationNotPossible));
                None
            }
            step => {
                self.outcome.deliver(FlowOutcome::NextStep { step });
                None
            }
        }
    }

    /// Purge persisted flow data (including capture artifacts) and drop
    /// the accumulated capture context.
    fn clear_flow_data(&mut self) {
        self.store.clear();
        self.context = CaptureContext::new();
    }

    // ── Error handling ───────────────────────────────────────────────

    async fn capture_recovery(&mut self, err: CaptureError, same: KycStep) -> Option<KycStep> {
        warn!(%err, step = %same, "capture provider error");
        match self.presenter.alert(err.to_string()).await {
            AlertChoice::Retry => Some(same),
            AlertChoice::Quit => Some(KycStep::Quit),
        }
    }

    async fn transport_recovery(&mut self, err: ApiError, same: KycStep) -> Option<KycStep> {
        warn!(%err, step = %same, "transport error in kyc sub-flow");
        match self.presenter.alert(err.to_string()).await {
            AlertChoice::Retry => Some(same),
            AlertChoice::Quit => Some(KycStep::Quit),
        }
    }

    fn require_uid(&mut self) -> Option<IdentificationUid> {
        match &self.session.identification_uid {
            Some(uid) => Some(uid.clone()),
            None => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: "no identification assigned to this session".into(),
                    }));
                None
            }
        }
    }
}
