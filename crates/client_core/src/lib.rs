pub mod attachments;
pub mod clock;
pub mod config;
pub mod controller;
pub mod host;
pub mod progress;
pub mod transport;
pub mod validation;
pub mod view;

pub use attachments::{Attachment, AttachmentRejection, AttachmentStore, AttachmentSummary};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_settings, FormSettings};
pub use controller::{ReportFormController, SubmissionState, SubmitOutcome};
pub use host::{HostBridge, HostShell};
pub use transport::{
    HttpTransport, ReportPayload, ReportTransport, SimulatedTransport, TransportError,
};
pub use view::{FormView, ToastKind, ViewUpdate};
