//! Terminal presenter: renders screens as prompts on stdout and maps
//! line input back to screen events.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use idv_flow::{AlertChoice, Presenter, Screen, ScreenEvent};
use idv_state::DocumentType;

/// Presenter reading events from stdin.
pub struct TerminalPresenter {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalPresenter {
    /// A presenter attached to this process's stdin.
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn read_line(&self) -> String {
        match self.lines.lock().await.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            // EOF or a read error both mean nobody is answering.
            _ => "q".to_string(),
        }
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn present(&self, screen: Screen) -> ScreenEvent {
        match &screen {
            Screen::TermsAndConditions => {
                println!("── Terms and Conditions ──");
                println!("accept to continue  [y] accept  [q] quit");
            }
            Screen::PhoneVerification { number, resend_in } => {
                println!("── Phone Verification ──");
                println!(
                    "a code was sent to {}  (type 'new' after {resend_in}s for a new code)",
                    number.masked()
                );
                println!("enter code  [q to quit]");
            }
            Screen::IbanEntry => {
                println!("── Bank Verification ──");
                println!("enter IBAN  [q to quit]");
            }
            Screen::SignDocumentsConfirm => {
                println!("── Sign Documents ──");
                println!("review the application documents  [y] continue  [q] quit");
            }
            Screen::SignDocumentsCode => {
                println!("── Qualified Signature ──");
                println!("enter signing code  [q to quit]");
            }
            Screen::KycWelcome => {
                println!("── Identity Document Check ──");
                println!("you will scan a document and take a selfie  [y] continue  [q] quit");
            }
            Screen::KycDocumentType => {
                println!("── Document Type ──");
                println!("[1] passport  [2] id card  [3] residence permit  [4] driver's license  [q] quit");
            }
            Screen::KycRetry => {
                println!("── Capture Rejected ──");
                println!("the provider could not verify the capture  [r] retry  [q] quit");
            }
            other => {
                println!("{other:?}");
            }
        }

        let line = self.read_line().await;
        match (&screen, line.as_str()) {
            (_, "q") => ScreenEvent::Quit,
            (Screen::TermsAndConditions, _)
            | (Screen::SignDocumentsConfirm, _)
            | (Screen::KycWelcome, _) => ScreenEvent::Continue,
            (Screen::PhoneVerification { .. }, "new") => ScreenEvent::RequestNewCode,
            (Screen::KycDocumentType, choice) => {
                let document_type = match choice {
                    "2" => DocumentType::IdCard,
                    "3" => DocumentType::ResidencePermit,
                    "4" => DocumentType::DriversLicense,
                    _ => DocumentType::Passport,
                };
                ScreenEvent::SelectDocument(document_type)
            }
            (Screen::KycRetry, _) => ScreenEvent::Retry,
            (_, input) => ScreenEvent::Input(input.to_string()),
        }
    }

    async fn show(&self, screen: Screen) {
        match screen {
            Screen::PaymentPending => println!("… waiting for the reference payment"),
            Screen::KycDocumentScan { document_type } => {
                println!("… scanning {document_type}");
            }
            Screen::KycSelfie => println!("… capturing selfie"),
            Screen::KycUpload => println!("… uploading captured material"),
            Screen::Result { status } => println!("── Result: {status} ──"),
            other => println!("{other:?}"),
        }
    }

    async fn alert(&self, message: String) -> AlertChoice {
        println!("⚠ {message}");
        println!("[r] retry  [q] quit");
        match self.read_line().await.as_str() {
            "q" => AlertChoice::Quit,
            _ => AlertChoice::Retry,
        }
    }
}
