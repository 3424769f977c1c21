//! Resumability across process restarts.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{token, uid, RecordingPresenter, ScriptedApi, ScriptedCapture};
use idv_core::IdentificationMethod;
use idv_flow::{FlowOrchestrator, Screen, ScreenEvent};
use idv_state::{BankStep, FlowStage, PersistedStep, VerifyMode};
use idv_store::{keys, StepStore};

/// Seed a store the way a crash mid-flow would leave it: token, stage,
/// method, and the bank step all persisted.
fn seed_mid_flow_store(store: &StepStore, session_token: &str) {
    store.put(keys::SESSION_TOKEN, &token(session_token));
    store.put(
        keys::FLOW_STAGE,
        &FlowStage::Identification {
            method: IdentificationMethod::Bank,
        },
    );
    store.put(keys::IDENTIFICATION_METHOD, &IdentificationMethod::Bank);
    store.put(keys::IDENTIFICATION_UID, &uid("id-resume"));
    store.put(keys::TERMS_ACCEPTED, &true);
    store.put(keys::PHONE_VERIFIED, &true);
    store.put(
        keys::BANK_STEP,
        &BankStep::IbanVerification {
            mode: VerifyMode::Iban,
        },
    );
}

#[tokio::test(start_paused = true)]
async fn same_token_reenters_the_persisted_step_without_resolving_again() {
    let store = Arc::new(StepStore::in_memory());
    seed_mid_flow_store(&store, "T1");

    let api = ScriptedApi::new(IdentificationMethod::Bank, "id-resume");
    // Quit as soon as the restored screen appears; we only care where
    // the flow resumes.
    let presenter = RecordingPresenter::new(vec![ScreenEvent::Quit], vec![]);

    let _ = FlowOrchestrator::new(
        api.clone(),
        presenter.clone(),
        ScriptedCapture::new(),
        store,
    )
    .run(token("T1"))
    .await;

    // Straight back onto the IBAN screen: no method resolution, no
    // terms, no phone verification.
    assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 0);
    assert_eq!(presenter.presented(), vec![Screen::IbanEntry]);
}

#[tokio::test(start_paused = true)]
async fn different_token_purges_and_starts_from_the_beginning() {
    let store = Arc::new(StepStore::in_memory());
    seed_mid_flow_store(&store, "T1");

    let api = ScriptedApi::new(IdentificationMethod::Bank, "id-new");
    let presenter = RecordingPresenter::new(vec![ScreenEvent::Quit], vec![]);

    let _ = FlowOrchestrator::new(
        api.clone(),
        presenter.clone(),
        ScriptedCapture::new(),
        store.clone(),
    )
    .run(token("T2"))
    .await;

    // A new session resolves the method again and starts at the terms.
    assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 1);
    assert_eq!(presenter.presented(), vec![Screen::TermsAndConditions]);
}

#[tokio::test(start_paused = true)]
async fn restart_survives_a_store_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flow.json");

    {
        let store = StepStore::open(&path).unwrap();
        seed_mid_flow_store(&store, "T1");
    }

    let store = Arc::new(StepStore::open(&path).unwrap());
    let api = ScriptedApi::new(IdentificationMethod::Bank, "id-resume");
    let presenter = RecordingPresenter::new(vec![ScreenEvent::Quit], vec![]);

    let _ = FlowOrchestrator::new(
        api.clone(),
        presenter.clone(),
        ScriptedCapture::new(),
        store,
    )
    .run(token("T1"))
    .await;

    assert_eq!(api.resolve_calls.load(Ordering::SeqCst), 0);
    assert_eq!(presenter.presented(), vec![Screen::IbanEntry]);
}

#[tokio::test(start_paused = true)]
async fn corrupted_persisted_step_restarts_the_sub_flow() {
    let store = Arc::new(StepStore::in_memory());
    seed_mid_flow_store(&store, "T1");
    // Clobber the bank step with bytes no step decodes from.
    store.put(keys::BANK_STEP, &serde_json::json!({"hologram": 3}));

    let api = ScriptedApi::new(IdentificationMethod::Bank, "id-resume");
    let presenter = RecordingPresenter::new(vec![ScreenEvent::Quit], vec![]);

    let _ = FlowOrchestrator::new(
        api,
        presenter.clone(),
        ScriptedCapture::new(),
        store,
    )
    .run(token("T1"))
    .await;

    // Fail-soft: the bank sub-flow starts from its entry step. The
    // session still has the phone verified, so the entry step skips
    // ahead to the IBAN screen.
    assert_eq!(presenter.presented(), vec![Screen::IbanEntry]);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn bank_step_strategy() -> impl Strategy<Value = BankStep> {
        prop_oneof![
            Just(BankStep::PhoneVerification),
            Just(BankStep::IbanVerification {
                mode: VerifyMode::Iban
            }),
            Just(BankStep::IbanVerification {
                mode: VerifyMode::Payment
            }),
            Just(BankStep::PaymentVerification),
            Just(BankStep::SignDocuments {
                stage: idv_state::SignStage::ConfirmApplication
            }),
            Just(BankStep::SignDocuments {
                stage: idv_state::SignStage::Sign
            }),
            Just(BankStep::Quit),
            Just(BankStep::Close),
        ]
    }

    proptest! {
        // For every persisted (token, step) pair, re-opening the store
        // with the same token yields exactly the persisted step.
        #[test]
        fn persisted_steps_round_trip(step in bank_step_strategy(), raw_token in "[a-zA-Z0-9]{1,16}") {
            let store = StepStore::in_memory();
            store.put(keys::SESSION_TOKEN, &token(&raw_token));
            store.put(keys::BANK_STEP, &step);

            let restored: BankStep = store
                .get(keys::BANK_STEP)
                .unwrap_or_else(BankStep::start);
            prop_assert_eq!(restored.encode(), step.encode());
        }
    }
}
