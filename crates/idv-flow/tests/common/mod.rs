//! Shared scripted collaborators for the flow integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use idv_client::{
    ApiError, IdentificationApi, MethodResolution, OtcAuthorization, OtcConfirmation,
};
use idv_core::{
    Iban, IdentificationMethod, IdentificationStatus, IdentificationStep, IdentificationUid,
    MobileNumber, ReferenceToken, SessionToken, StatusResponse,
};
use idv_flow::{
    AlertChoice, CaptureError, CaptureProvider, DocumentScan, Presenter, Screen, ScreenEvent,
    SelfieScan,
};
use idv_state::DocumentType;

pub fn token(s: &str) -> SessionToken {
    SessionToken(s.into())
}

pub fn uid(s: &str) -> IdentificationUid {
    IdentificationUid(s.into())
}

/// Build a status response with the fields the tests care about.
pub fn status_resp(
    status: IdentificationStatus,
    next_step: Option<IdentificationStep>,
    fallback_step: Option<IdentificationStep>,
    provider_status_code: Option<&str>,
    reference_token: Option<&str>,
) -> StatusResponse {
    StatusResponse {
        id: uid("id-under-test"),
        status,
        next_step,
        fallback_step,
        provider_status_code: provider_status_code.map(str::to_string),
        reference_token: reference_token.map(|r| ReferenceToken(r.into())),
        created_at: None,
    }
}

/// One scripted reply: either a response or an HTTP error status.
pub enum Scripted {
    Reply(StatusResponse),
    HttpStatus(u16),
}

impl Scripted {
    fn materialize(self, endpoint: &str) -> Result<StatusResponse, ApiError> {
        match self {
            Self::Reply(resp) => Ok(resp),
            Self::HttpStatus(status) => Err(ApiError::Api {
                endpoint: endpoint.into(),
                status,
                body: String::new(),
            }),
        }
    }
}

/// Scripted in-process implementation of the verification API.
///
/// Status and IBAN replies are consumed front-to-back; when the status
/// script runs dry the last successful reply repeats (a remote status is
/// stable until the service moves it).
pub struct ScriptedApi {
    resolution: Mutex<Option<MethodResolution>>,
    pub resolve_calls: AtomicUsize,
    statuses: Mutex<VecDeque<Scripted>>,
    last_status: Mutex<Option<StatusResponse>>,
    iban_replies: Mutex<VecDeque<Scripted>>,
    pub otc_accepted: AtomicBool,
    pub status_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(method: IdentificationMethod, id: &str) -> Arc<Self> {
        Arc::new(Self {
            resolution: Mutex::new(Some(MethodResolution {
                method,
                id: uid(id),
            })),
            resolve_calls: AtomicUsize::new(0),
            statuses: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            iban_replies: Mutex::new(VecDeque::new()),
            otc_accepted: AtomicBool::new(true),
            status_calls: AtomicUsize::new(0),
        })
    }

    pub fn push_status(&self, resp: StatusResponse) {
        self.statuses.lock().unwrap().push_back(Scripted::Reply(resp));
    }

    pub fn push_status_error(&self, status: u16) {
        self.statuses
            .lock()
            .unwrap()
            .push_back(Scripted::HttpStatus(status));
    }

    pub fn push_iban_reply(&self, resp: StatusResponse) {
        self.iban_replies
            .lock()
            .unwrap()
            .push_back(Scripted::Reply(resp));
    }

    pub fn push_iban_error(&self, status: u16) {
        self.iban_replies
            .lock()
            .unwrap()
            .push_back(Scripted::HttpStatus(status));
    }
}

#[async_trait]
impl IdentificationApi for ScriptedApi {
    async fn resolve_method(&self) -> Result<MethodResolution, ApiError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        match &*self.resolution.lock().unwrap() {
            Some(resolution) => Ok(resolution.clone()),
            None => Err(ApiError::Api {
                endpoint: "GET /identification_method".into(),
                status: 500,
                body: String::new(),
            }),
        }
    }

    async fn get_identification(
        &self,
        uid: &IdentificationUid,
    ) -> Result<StatusResponse, ApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let endpoint = format!("GET /identifications/{}", uid.as_str());
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(scripted) => {
                let result = scripted.materialize(&endpoint);
                if let Ok(resp) = &result {
                    *self.last_status.lock().unwrap() = Some(resp.clone());
                }
                result
            }
            None => match &*self.last_status.lock().unwrap() {
                Some(resp) => Ok(resp.clone()),
                None => Err(ApiError::Api {
                    endpoint,
                    status: 404,
                    body: String::new(),
                }),
            },
        }
    }

    async fn verify_iban(
        &self,
        uid: &IdentificationUid,
        _iban: &Iban,
    ) -> Result<StatusResponse, ApiError> {
        let endpoint = format!("POST /identifications/{}/iban", uid.as_str());
        match self.iban_replies.lock().unwrap().pop_front() {
            Some(scripted) => scripted.materialize(&endpoint),
            None => Err(ApiError::Api {
                endpoint,
                status: 409,
                body: "no scripted iban reply".into(),
            }),
        }
    }

    async fn authorize_one_time_code(
        &self,
        uid: &IdentificationUid,
    ) -> Result<OtcAuthorization, ApiError> {
        Ok(OtcAuthorization {
            id: uid.clone(),
            new_code_in_secs: 5,
        })
    }

    async fn verify_one_time_code(
        &self,
        uid: &IdentificationUid,
        _code: &str,
    ) -> Result<OtcConfirmation, ApiError> {
        Ok(OtcConfirmation {
            id: uid.clone(),
            verified: self.otc_accepted.load(Ordering::SeqCst),
        })
    }

    async fn get_mobile_number(&self) -> Result<MobileNumber, ApiError> {
        Ok(MobileNumber("+4917611122233".into()))
    }
}

/// Presenter that replays a scripted event queue and records every
/// screen interaction.
pub struct RecordingPresenter {
    pub events: Mutex<VecDeque<ScreenEvent>>,
    pub alert_choices: Mutex<VecDeque<AlertChoice>>,
    pub presented: Mutex<Vec<Screen>>,
    pub resumed: Mutex<Vec<Screen>>,
    pub shown: Mutex<Vec<Screen>>,
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingPresenter {
    /// A presenter replaying `events` for `present`/`resume` and
    /// `choices` for alerts. Exhausted queues answer `Quit`, so a test
    /// can never hang on an unscripted prompt.
    pub fn new(events: Vec<ScreenEvent>, choices: Vec<AlertChoice>) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(events.into()),
            alert_choices: Mutex::new(choices.into()),
            presented: Mutex::new(Vec::new()),
            resumed: Mutex::new(Vec::new()),
            shown: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn presented(&self) -> Vec<Screen> {
        self.presented.lock().unwrap().clone()
    }

    pub fn resumed(&self) -> Vec<Screen> {
        self.resumed.lock().unwrap().clone()
    }

    pub fn shown(&self) -> Vec<Screen> {
        self.shown.lock().unwrap().clone()
    }

    fn next_event(&self) -> ScreenEvent {
        self.events
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ScreenEvent::Quit)
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(&self, screen: Screen) -> ScreenEvent {
        self.presented.lock().unwrap().push(screen);
        self.next_event()
    }

    async fn resume(&self, screen: Screen) -> ScreenEvent {
        self.resumed.lock().unwrap().push(screen);
        self.next_event()
    }

    async fn show(&self, screen: Screen) {
        self.shown.lock().unwrap().push(screen);
    }

    async fn alert(&self, message: String) -> AlertChoice {
        self.alerts.lock().unwrap().push(message);
        self.alert_choices
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(AlertChoice::Quit)
    }
}

/// Capture provider returning canned scan metadata.
pub struct ScriptedCapture {
    pub scans: AtomicUsize,
    pub fail_next_scan: AtomicBool,
}

impl ScriptedCapture {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scans: AtomicUsize::new(0),
            fail_next_scan: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl CaptureProvider for ScriptedCapture {
    async fn scan_document(
        &self,
        document_type: DocumentType,
    ) -> Result<DocumentScan, CaptureError> {
        if self.fail_next_scan.swap(false, Ordering::SeqCst) {
            return Err(CaptureError::Provider {
                message: "lens obstructed".into(),
            });
        }
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(DocumentScan {
            document_type,
            metadata: serde_json::json!({"pages": 2, "mrz": {"valid": true}}),
        })
    }

    async fn capture_selfie(&self) -> Result<SelfieScan, CaptureError> {
        Ok(SelfieScan {
            metadata: serde_json::json!({"liveness": "passed"}),
        })
    }
}
