//! `idv run`: drive a verification flow in the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use idv_core::{IdentificationMethod, SessionToken};
use idv_flow::{FlowOrchestrator, FlowResult};
use idv_store::StepStore;

use crate::demo::{DemoCapture, DemoService};
use crate::terminal::TerminalPresenter;

/// Arguments for `idv run`.
#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Identification method the demo service resolves to.
    #[arg(long, value_enum, default_value = "bank")]
    method: MethodArg,

    /// Session token; rerun with the same token to resume a flow.
    #[arg(long, default_value = "demo-session")]
    session_token: String,

    /// Path of the persisted flow store.
    #[arg(long, default_value = ".idv-store.json")]
    store: PathBuf,
}

/// Selectable identification methods.
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum MethodArg {
    Bank,
    BankWithFallback,
    Kyc,
    KycWithSigning,
}

impl From<MethodArg> for IdentificationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Bank => Self::Bank,
            MethodArg::BankWithFallback => Self::BankWithFallback,
            MethodArg::Kyc => Self::Kyc,
            MethodArg::KycWithSigning => Self::KycWithSigning,
        }
    }
}

/// Run the flow to completion and report the outcome.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let store = Arc::new(
        StepStore::open(&args.store)?
            .with_artifact_dir(args.store.with_extension("artifacts")),
    );
    let orchestrator = FlowOrchestrator::new(
        Arc::new(DemoService::new(args.method.into())),
        Arc::new(TerminalPresenter::new()),
        Arc::new(DemoCapture),
        store,
    );

    match orchestrator.run(SessionToken(args.session_token)).await {
        Ok(FlowResult::Success { id }) => {
            println!("✔ {id} completed");
            Ok(())
        }
        Ok(FlowResult::ConfirmationPending { id, reference }) => {
            println!("✔ {id} confirmed, awaiting settlement ({reference})");
            Ok(())
        }
        Err(failure) => Err(failure.into()),
    }
}
