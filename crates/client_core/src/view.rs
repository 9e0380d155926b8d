use shared::domain::{FieldId, FieldMarker, ProgressState};

use crate::attachments::AttachmentSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// One change the rendering surface should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    FieldValue {
        field: FieldId,
        value: String,
    },
    FieldMarker {
        field: FieldId,
        marker: FieldMarker,
    },
    /// `None` clears the message under the field.
    FieldMessage {
        field: FieldId,
        message: Option<String>,
    },
    Progress(ProgressState),
    CommentCount {
        count: usize,
        limit: usize,
        over_limit: bool,
    },
    Attachments(Vec<AttachmentSummary>),
    SubmitButton {
        enabled: bool,
        loading: bool,
    },
    Toast {
        kind: ToastKind,
        message: String,
    },
    SuccessPanel,
    RestoredAttachmentNames(Vec<String>),
}

pub trait FormView: Send + Sync {
    fn apply(&self, update: ViewUpdate);
}
