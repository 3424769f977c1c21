//! # Top-level Flow Orchestrator
//!
//! Owns the overall process state (`initialization → terms →
//! identification → done`), resolves the identification method, starts
//! the matching sub-flow coordinator(s), and wires sub-flow completion
//! outcomes into continuation of the top-level flow.
//!
//! Composition is done by channel subscription: when the KYC sub-flow
//! ends with a next-step instruction naming the signing flow, the
//! orchestrator feeds that step into a bank coordinator's `perform`
//! entry point. Abort and quit always clear persisted session data
//! before the external completion surface (the `run` return) resolves.

use std::sync::Arc;

use tracing::{debug, info, warn};

use idv_client::IdentificationApi;
use idv_core::{
    FlowFailure, IdentificationMethod, IdentificationStep, IdentificationUid, ReferenceToken,
    SessionToken,
};
use idv_state::{BankStep, FlowStage, SignStage};
use idv_store::{keys, StepStore};

use crate::bank::BankCoordinator;
use crate::capture::{CaptureContext, CaptureProvider};
use crate::config::FlowConfig;
use crate::kyc::KycCoordinator;
use crate::outcome::FlowOutcome;
use crate::presentation::{AlertChoice, Presenter, Screen, ScreenEvent};
use crate::session::SessionState;

/// Successful completion of a verification flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowResult {
    /// The identification completed.
    Success {
        /// The completed identification.
        id: IdentificationUid,
    },
    /// The identification is confirmed and awaiting final settlement.
    ConfirmationPending {
        /// The confirmed identification.
        id: IdentificationUid,
        /// The confirmation reference.
        reference: ReferenceToken,
    },
}

/// The top-level orchestrator.
pub struct FlowOrchestrator {
    api: Arc<dyn IdentificationApi>,
    presenter: Arc<dyn Presenter>,
    capture: Arc<dyn CaptureProvider>,
    store: Arc<StepStore>,
    config: FlowConfig,
}

impl FlowOrchestrator {
    /// Create an orchestrator with default configuration.
    pub fn new(
        api: Arc<dyn IdentificationApi>,
        presenter: Arc<dyn Presenter>,
        capture: Arc<dyn CaptureProvider>,
        store: Arc<StepStore>,
    ) -> Self {
        Self::with_config(api, presenter, capture, store, FlowConfig::default())
    }

    /// Create an orchestrator with explicit configuration.
    pub fn with_config(
        api: Arc<dyn IdentificationApi>,
        presenter: Arc<dyn Presenter>,
        capture: Arc<dyn CaptureProvider>,
        store: Arc<StepStore>,
        config: FlowConfig,
    ) -> Self {
        Self {
            api,
            presenter,
            capture,
            store,
            config,
        }
    }

    /// Run the verification flow for `token` to completion.
    ///
    /// The returned future resolving is the external completion
    /// callback: exactly one `Ok`/`Err` per run, with persisted state
    /// cleared on every terminal path.
    pub async fn run(&self, token: SessionToken) -> Result<FlowResult, FlowFailure> {
        let mut session =
            SessionState::bootstrap(token, &self.store, self.config.default_retry_count);
        let mut stage = self
            .store
            .get::<FlowStage>(keys::FLOW_STAGE)
            .unwrap_or_else(FlowStage::start);
        info!(%stage, "verification flow starting");

        // ── Initialization ───────────────────────────────────────────
        if stage == FlowStage::Initialization {
            let resolution = match self.resolve_method().await {
                Ok(resolution) => resolution,
                Err(failure) => return self.abort(failure),
            };
            info!(method = %resolution.method, "identification method resolved");
            session.method = Some(resolution.method);
            session.identification_uid = Some(resolution.id);
            session.retry_count = self.config.default_retry_count;
            session.persist(&self.store);
            if let Err(err) = stage.advance_to(FlowStage::TermsAndConditions) {
                warn!(%err, "stage advance rejected");
                return self.abort(FlowFailure::UnsupportedResponse {
                    detail: err.to_string(),
                });
            }
            self.store.put(keys::FLOW_STAGE, &stage);
        }

        let Some(method) = session.method else {
            // The stage advanced but the method did not survive;
            // treat the persisted state as unusable.
            return self.abort(FlowFailure::UnsupportedResponse {
                detail: "no identification method in session".into(),
            });
        };

        // ── Terms and conditions ─────────────────────────────────────
        if stage == FlowStage::TermsAndConditions {
            if !session.terms_accepted {
                loop {
                    match self.presenter.present(Screen::TermsAndConditions).await {
                        ScreenEvent::Continue => {
                            session.terms_accepted = true;
                            self.store.put(keys::TERMS_ACCEPTED, &true);
                            break;
                        }
                        ScreenEvent::Quit => {
                            return self.abort(FlowFailure::UnauthorizedAction)
                        }
                        event => debug!(?event, "ignoring event on terms screen"),
                    }
                }
            }
            if let Err(err) = stage.advance_to(FlowStage::Identification { method }) {
                warn!(%err, "stage advance rejected");
                return self.abort(FlowFailure::UnsupportedResponse {
                    detail: err.to_string(),
                });
            }
            self.store.put(keys::FLOW_STAGE, &stage);
        }

        if stage == FlowStage::Done {
            // A completed flow always clears its state; finding Done
            // here means the store is stale.
            warn!("stale terminal stage found in store");
            return self.abort(FlowFailure::UnauthorizedAction);
        }

        // ── Identification ───────────────────────────────────────────
        let first_outcome = match method {
            IdentificationMethod::Bank | IdentificationMethod::BankWithFallback => {
                self.run_bank(&mut session, None).await
            }
            IdentificationMethod::Kyc | IdentificationMethod::KycWithSigning => {
                // A persisted bank step under a signing method means the
                // capture part already finished; resume the signing flow
                // instead of re-entering capture.
                if method.requires_signing() && self.store.contains(keys::BANK_STEP) {
                    self.run_bank(&mut session, None).await
                } else {
                    self.run_kyc(&mut session).await
                }
            }
            IdentificationMethod::Unknown => {
                return self.abort(FlowFailure::ModulesNotFound {
                    module: "identification".into(),
                })
            }
        };

        self.conclude(&mut session, method, first_outcome).await
    }

    /// Resolve the identification method, surfacing transport errors as
    /// retry-or-quit prompts.
    async fn resolve_method(&self) -> Result<idv_client::MethodResolution, FlowFailure> {
        loop {
            match self.api.resolve_method().await {
                Ok(resolution) => return Ok(resolution),
                Err(err) => {
                    warn!(%err, "method resolution failed");
                    match self.presenter.alert(err.to_string()).await {
                        AlertChoice::Retry => continue,
                        AlertChoice::Quit => return Err(FlowFailure::UnauthorizedAction),
                    }
                }
            }
        }
    }

    /// Resolve sub-flow outcomes, chaining follow-up sub-flows until the
    /// flow is terminal.
    async fn conclude(
        &self,
        session: &mut SessionState,
        method: IdentificationMethod,
        mut outcome: FlowOutcome,
    ) -> Result<FlowResult, FlowFailure> {
        loop {
            outcome = match outcome {
                FlowOutcome::Success { id } => {
                    info!(id = id.as_str(), "identification successful");
                    self.store.clear();
                    return Ok(FlowResult::Success { id });
                }
                FlowOutcome::Confirmed { id, reference } => {
                    info!(id = id.as_str(), "identification confirmed");
                    self.store.clear();
                    return Ok(FlowResult::ConfirmationPending { id, reference });
                }
                FlowOutcome::Failure(failure) => return self.abort(failure),
                FlowOutcome::NextStep { step } => match step {
                    IdentificationStep::SignDocuments => {
                        debug!("chaining into the signing flow");
                        self.run_bank(
                            session,
                            Some(BankStep::SignDocuments {
                                stage: SignStage::ConfirmApplication,
                            }),
                        )
                        .await
                    }
                    IdentificationStep::DocumentScan
                    | IdentificationStep::DocumentScanSigning
                        if method == IdentificationMethod::BankWithFallback =>
                    {
                        debug!("bank flow fell back to document capture");
                        self.run_kyc(session).await
                    }
                    IdentificationStep::PartnerFallback => {
                        return self.abort(FlowFailure::IdentificationNotPossible)
                    }
                    step => {
                        return self.abort(FlowFailure::UnsupportedResponse {
                            detail: format!("no sub-flow can continue from step {step}"),
                        })
                    }
                },
            };
        }
    }

    async fn run_bank(&self, session: &mut SessionState, entry: Option<BankStep>) -> FlowOutcome {
        let (mut coordinator, mut rx) = BankCoordinator::new(
            self.api.clone(),
            self.presenter.clone(),
            self.store.clone(),
            self.config.clone(),
            session,
        );
        match entry {
            Some(step) => coordinator.perform(step).await,
            None => coordinator.run().await,
        }
        drop(coordinator);
        rx.try_recv().unwrap_or_else(|_| {
            FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                detail: "bank sub-flow ended without an outcome".into(),
            })
        })
    }

    async fn run_kyc(&self, session: &mut SessionState) -> FlowOutcome {
        let (mut coordinator, mut rx) = KycCoordinator::new(
            self.api.clone(),
            self.presenter.clone(),
            self.capture.clone(),
            self.store.clone(),
            self.config.clone(),
            session,
            CaptureContext::new(),
        );
        coordinator.run().await;
        drop(coordinator);
        rx.try_recv().unwrap_or_else(|_| {
            FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                detail: "kyc sub-flow ended without an outcome".into(),
            })
        })
    }

    /// Clear persisted session data, then resolve the completion surface
    /// with `failure`. The clear always happens first.
    fn abort(&self, failure: FlowFailure) -> Result<FlowResult, FlowFailure> {
        warn!(%failure, "verification flow aborted");
        self.store.clear();
        Err(failure)
    }
}
