//! Client for the multi-agent debate service.
//!
//! - `transport`: HTTP calls to the backend (document upload, decision
//!   submission, health probe)
//! - `session`: the upload and debate flows driving a `StreamingPresenter`
//! - `terminal`: render surface that streams the debate to a terminal
//! - `config`: layered configuration (defaults, TOML file, environment)

pub mod config;
pub mod session;
pub mod terminal;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use session::{ClientSession, DebateReport, SessionError, UploadReport, LOADING_TEXT};
pub use terminal::{Screen, TerminalSurface};
pub use transport::{
    decode_decision_response, decode_saved_result, decode_upload_response, DebateResult,
    DebateTransport, HttpTransport, TransportError, UploadReceipt,
};
