//! # Bank Sub-flow Coordinator
//!
//! Drives the bank verification state machine: phone verification with a
//! one-time code, IBAN verification, reference-payment confirmation, and
//! qualified document signing. Signing is also the entry point for the
//! KYC-with-signing composition: the parent wires the KYC coordinator's
//! next-step outcome straight into [`BankCoordinator::perform`].
//!
//! Every transition persists its step *before* initiating the step's
//! side effect, so a crash between persistence and action re-enters the
//! same step on restart, never an earlier or skipped one.

use std::sync::Arc;

use tracing::{debug, warn};

use idv_client::{ApiError, IdentificationApi};
use idv_core::{
    FlowFailure, Iban, IdentificationStatus, IdentificationStep, IdentificationUid, Route,
    StatusResponse,
};
use idv_state::{BankStep, SignStage, VerifyMode};
use idv_store::{keys, StepStore};

use crate::config::FlowConfig;
use crate::outcome::{FlowOutcome, OutcomeSender};
use crate::poller::{PollOutcome, StatusPoller};
use crate::presentation::{AlertChoice, Presenter, Screen, ScreenEvent};
use crate::session::SessionState;

/// Coordinator for the bank verification sub-flow.
///
/// Owns its step machine and poller; borrows the session mutably for its
/// whole run, which makes it the session's only mutator while active.
pub struct BankCoordinator<'s> {
    api: Arc<dyn IdentificationApi>,
    presenter: Arc<dyn Presenter>,
    store: Arc<StepStore>,
    session: &'s mut SessionState,
    poller: StatusPoller,
    outcome: OutcomeSender,
    current: BankStep,
    presented: Option<BankStep>,
}

impl<'s> BankCoordinator<'s> {
    /// Create a coordinator, restoring the persisted step when one is
    /// present (and decodable) for the current session.
    pub fn new(
        api: Arc<dyn IdentificationApi>,
        presenter: Arc<dyn Presenter>,
        store: Arc<StepStore>,
        config: FlowConfig,
        session: &'s mut SessionState,
    ) -> (Self, tokio::sync::mpsc::Receiver<FlowOutcome>) {
        let (outcome, rx) = OutcomeSender::channel();
        let current = store.get::<BankStep>(keys::BANK_STEP).unwrap_or_else(BankStep::start);
        let poller = StatusPoller::new(config.poll_interval);
        (
            Self {
                api,
                presenter,
                store,
                session,
                poller,
                outcome,
                current,
                presented: None,
            },
            rx,
        )
    }

    /// The step the coordinator is currently in.
    pub fn current_step(&self) -> &BankStep {
        &self.current
    }

    /// Run the sub-flow from its restored (or initial) step.
    pub async fn run(&mut self) {
        let step = self.current.clone();
        self.perform(step).await;
    }

    /// Drive the state machine from `step` until the outcome is
    /// delivered or a terminal step is reached.
    pub async fn perform(&mut self, step: BankStep) {
        let mut step = step;
        while !self.outcome.is_delivered() {
            match self.execute(step).await {
                Some(next) => step = next,
                None => break,
            }
        }
    }

    /// Persist `step`, run its side effect, and return the follow-up
    /// step (or `None` when the sub-flow is finished).
    async fn execute(&mut self, step: BankStep) -> Option<BankStep> {
        let already_presented = self
            .presented
            .as_ref()
            .is_some_and(|p| p.same_screen(&step));
        self.store.put(keys::BANK_STEP, &step);
        self.current = step.clone();
        self.presented = Some(step.clone());
        debug!(step = %step, "bank sub-flow transition");

        match step {
            BankStep::PhoneVerification => self.phone_verification().await,
            BankStep::IbanVerification { .. } => self.iban_verification(already_presented).await,
            BankStep::PaymentVerification => self.payment_verification().await,
            BankStep::SignDocuments { stage } => self.sign_documents(stage).await,
            BankStep::Next { step } => self.route_external(step),
            BankStep::Result { status } => self.finish_with_result(status).await,
            BankStep::Quit => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnauthorizedAction));
                None
            }
            BankStep::Close => None,
        }
    }

    // ── Steps ────────────────────────────────────────────────────────

    async fn phone_verification(&mut self) -> Option<BankStep> {
        if self.session.phone_verified {
            return Some(BankStep::IbanVerification {
                mode: VerifyMode::Iban,
            });
        }
        let uid = self.require_uid()?;

        let number = match &self.session.mobile_number {
            Some(number) => number.clone(),
            None => match self.api.get_mobile_number().await {
                Ok(number) => {
                    self.session.mobile_number = Some(number.clone());
                    self.store.put(keys::MOBILE_NUMBER, &number);
                    number
                }
                Err(err) => {
                    return self
                        .transport_recovery(err, BankStep::PhoneVerification)
                        .await
                }
            },
        };

        let auth = match self.api.authorize_one_time_code(&uid).await {
            Ok(auth) => auth,
            Err(err) => {
                return self
                    .transport_recovery(err, BankStep::PhoneVerification)
                    .await
            }
        };
        // Held for the lifetime of the screen: the countdown gates when
        // a new code may be requested.
        let mut _countdown = self.poller.start_new_code_countdown(auth.new_code_in_secs);

        let screen = Screen::PhoneVerification {
            number,
            resend_in: auth.new_code_in_secs,
        };
        let mut event = self.presenter.present(screen.clone()).await;
        loop {
            match event {
                ScreenEvent::Input(code) => {
                    match self.api.verify_one_time_code(&uid, &code).await {
                        Ok(confirmation) if confirmation.verified => {
                            self.poller.cancel_countdown();
                            self.session.phone_verified = true;
                            self.store.put(keys::PHONE_VERIFIED, &true);
                            return Some(BankStep::IbanVerification {
                                mode: VerifyMode::Iban,
                            });
                        }
                        Ok(_) => {
                            match self
                                .presenter
                                .alert("the verification code was not accepted".into())
                                .await
                            {
                                AlertChoice::Retry => {}
                                AlertChoice::Quit => return Some(BankStep::Quit),
                            }
                        }
                        Err(err) => {
                            return self
                                .transport_recovery(err, BankStep::PhoneVerification)
                                .await
                        }
                    }
                }
                ScreenEvent::RequestNewCode => {
                    if self.poller.countdown_finished() {
                        match self.api.authorize_one_time_code(&uid).await {
                            Ok(auth) => {
                                _countdown =
                                    self.poller.start_new_code_countdown(auth.new_code_in_secs);
                            }
                            Err(err) => {
                                return self
                                    .transport_recovery(err, BankStep::PhoneVerification)
                                    .await
                            }
                        }
                    } else {
                        debug!("new code requested before the countdown elapsed; ignored");
                    }
                }
                ScreenEvent::Quit => return Some(BankStep::Quit),
                _ => {}
            }
            event = self.presenter.resume(screen.clone()).await;
        }
    }

    async fn iban_verification(&mut self, already_presented: bool) -> Option<BankStep> {
        let uid = self.require_uid()?;
        let event = if already_presented {
            debug!("already on the IBAN screen; skipping re-presentation");
            self.presenter.resume(Screen::IbanEntry).await
        } else {
            self.presenter.present(Screen::IbanEntry).await
        };

        match event {
            ScreenEvent::Input(raw) => {
                let iban = Iban(raw);
                match self.api.verify_iban(&uid, &iban).await {
                    Ok(resp) => self.step_after(resp),
                    Err(err) => {
                        self.transport_recovery(
                            err,
                            BankStep::IbanVerification {
                                mode: VerifyMode::Iban,
                            },
                        )
                        .await
                    }
                }
            }
            ScreenEvent::Quit => Some(BankStep::Quit),
            _ => Some(BankStep::IbanVerification {
                mode: VerifyMode::Iban,
            }),
        }
    }

    async fn payment_verification(&mut self) -> Option<BankStep> {
        let uid = self.require_uid()?;
        self.presenter.show(Screen::PaymentPending).await;

        let mut rx = self
            .poller
            .start_verification(self.api.clone(), uid.clone());
        match rx.recv().await {
            Some(PollOutcome::Success(_)) => Some(BankStep::Result {
                status: IdentificationStatus::Successful,
            }),
            Some(PollOutcome::Confirmed(Some(reference))) => {
                self.presenter
                    .show(Screen::Result {
                        status: IdentificationStatus::Confirmed,
                    })
                    .await;
                self.outcome
                    .deliver(FlowOutcome::Confirmed { id: uid, reference });
                Some(BankStep::Close)
            }
            Some(PollOutcome::Confirmed(None)) => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: "confirmed without a reference token".into(),
                    }));
                None
            }
            Some(PollOutcome::Ended(resp)) => self.step_after(resp),
            Some(PollOutcome::Failed(err)) => {
                self.transport_recovery(err, BankStep::PaymentVerification)
                    .await
            }
            None => None,
        }
    }

    async fn sign_documents(&mut self, stage: SignStage) -> Option<BankStep> {
        match stage {
            SignStage::ConfirmApplication => {
                match self.presenter.present(Screen::SignDocumentsConfirm).await {
                    ScreenEvent::Continue => Some(BankStep::SignDocuments {
                        stage: SignStage::Sign,
                    }),
                    ScreenEvent::Quit => Some(BankStep::Quit),
                    _ => Some(BankStep::SignDocuments {
                        stage: SignStage::ConfirmApplication,
                    }),
                }
            }
            SignStage::Sign => self.sign_with_code().await,
        }
    }

    async fn sign_with_code(&mut self) -> Option<BankStep> {
        let uid = self.require_uid()?;
        let same = BankStep::SignDocuments {
            stage: SignStage::Sign,
        };

        let auth = match self.api.authorize_one_time_code(&uid).await {
            Ok(auth) => auth,
            Err(err) => return self.transport_recovery(err, same).await,
        };
        let mut _countdown = self.poller.start_new_code_countdown(auth.new_code_in_secs);

        let mut event = self.presenter.present(Screen::SignDocumentsCode).await;
        loop {
            match event {
                ScreenEvent::Input(code) => {
                    match self.api.verify_one_time_code(&uid, &code).await {
                        Ok(confirmation) if confirmation.verified => {
                            self.poller.cancel_countdown();
                            return self.await_signing_outcome(&uid).await;
                        }
                        Ok(_) => {
                            match self
                                .presenter
                                .alert("the signing code was not accepted".into())
                                .await
                            {
                                AlertChoice::Retry => {}
                                AlertChoice::Quit => return Some(BankStep::Quit),
                            }
                        }
                        Err(err) => return self.transport_recovery(err, same).await,
                    }
                }
                ScreenEvent::RequestNewCode => {
                    if self.poller.countdown_finished() {
                        match self.api.authorize_one_time_code(&uid).await {
                            Ok(auth) => {
                                _countdown =
                                    self.poller.start_new_code_countdown(auth.new_code_in_secs);
                            }
                            Err(err) => return self.transport_recovery(err, same).await,
                        }
                    }
                }
                ScreenEvent::Quit => return Some(BankStep::Quit),
                _ => {}
            }
            event = self.presenter.resume(Screen::SignDocumentsCode).await;
        }
    }

    async fn await_signing_outcome(&mut self, uid: &IdentificationUid) -> Option<BankStep> {
        let mut rx = self
            .poller
            .start_verification(self.api.clone(), uid.clone());
        match rx.recv().await {
            Some(PollOutcome::Success(_)) => Some(BankStep::Result {
                status: IdentificationStatus::Successful,
            }),
            Some(PollOutcome::Confirmed(Some(reference))) => {
                self.presenter
                    .show(Screen::Result {
                        status: IdentificationStatus::Confirmed,
                    })
                    .await;
                self.outcome.deliver(FlowOutcome::Confirmed {
                    id: uid.clone(),
                    reference,
                });
                Some(BankStep::Close)
            }
            Some(PollOutcome::Confirmed(None)) => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: "confirmed without a reference token".into(),
                    }));
                None
            }
            Some(PollOutcome::Ended(resp)) => self.step_after(resp),
            Some(PollOutcome::Failed(err)) => {
                self.transport_recovery(
                    err,
                    BankStep::SignDocuments {
                        stage: SignStage::Sign,
                    },
                )
                .await
            }
            None => None,
        }
    }

    async fn finish_with_result(&mut self, status: IdentificationStatus) -> Option<BankStep> {
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
        Some(BankStep::Close)
    }

    // ── Routing ──────────────────────────────────────────────────────

    /// Decide the follow-up step from a status response: terminal
    /// statuses short-circuit to the result screen, everything else
    /// follows the next-step/fallback precedence.
    fn step_after(&mut self, resp: StatusResponse) -> Option<BankStep> {
        match resp.status {
            IdentificationStatus::Successful => {
                return Some(BankStep::Result {
                    status: IdentificationStatus::Successful,
                })
            }
            IdentificationStatus::Rejected | IdentificationStatus::Fraud => {
                return Some(BankStep::Result {
                    status: resp.status,
                })
            }
            _ => {}
        }
        match resp.route() {
            Route::Next(step) => Some(self.map_step(step)),
            Route::Fallback(step) => {
                self.session.fallback_step = Some(step);
                self.store.put(keys::FALLBACK_STEP, &step);
                Some(self.map_step(step))
            }
            Route::Abort => {
                if resp.status == IdentificationStatus::Failed {
                    Some(BankStep::Result {
                        status: IdentificationStatus::Failed,
                    })
                } else {
                    self.outcome
                        .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                            detail: format!("status {} carried no routable step", resp.status),
                        }));
                    None
                }
            }
        }
    }

    /// Map a server-driven step onto this sub-flow, or park it in
    /// [`BankStep::Next`] for the parent when it routes elsewhere.
    fn map_step(&self, step: IdentificationStep) -> BankStep {
        match step {
            IdentificationStep::MobileNumber | IdentificationStep::MobileNumberVerification => {
                BankStep::PhoneVerification
            }
            IdentificationStep::Iban => BankStep::IbanVerification {
                mode: VerifyMode::Iban,
            },
            IdentificationStep::Payment => BankStep::PaymentVerification,
            IdentificationStep::SignDocuments => BankStep::SignDocuments {
                stage: SignStage::ConfirmApplication,
            },
            step => BankStep::Next { step },
        }
    }

    /// Hand a step outside this sub-flow back to the parent.
    fn route_external(&mut self, step: IdentificationStep) -> Option<BankStep> {
        match step {
            IdentificationStep::Abort => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::IdentificationNotPossible));
            }
            IdentificationStep::Unspecified => {
                self.outcome
                    .deliver(FlowOutcome::Failure(FlowFailure::UnsupportedResponse {
                        detail: "unspecified next step".into(),
                    }));
            }
            step => {
                self.outcome.deliver(FlowOutcome::NextStep { step });
            }
        }
        None
    }

    // ── Error handling ───────────────────────────────────────────────

    /// Surface a transport error as a retry-or-quit alert. Retry
    /// re-enters the same step that produced the error, so retrying
    /// never loses position.
    async fn transport_recovery(&mut self, err: ApiError, same: BankStep) -> Option<BankStep> {
        warn!(%err, step = %same, "transport error in bank sub-flow");
        match self.presenter.alert(err.to_string()).await {
            AlertChoice::Retry => Some(same),
            AlertChoice::Quit => Some(BankStep::Quit),
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
