use shared::{
    domain::{FileCandidate, ACCEPTED_MIME_TYPES, MAX_ATTACHMENT_BYTES},
    messages,
};
use thiserror::Error;

/// A file that passed the attachment rules. Only [`AttachmentStore`] builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    name: String,
    size_bytes: u64,
    mime_type: String,
    content: Vec<u8>,
}

impl Attachment {
    fn accept(candidate: FileCandidate) -> Result<Self, AttachmentRejection> {
        let supported = ACCEPTED_MIME_TYPES
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(candidate.mime_type.trim()));
        if !supported {
            return Err(AttachmentRejection::UnsupportedType {
                name: candidate.name,
                mime_type: candidate.mime_type,
            });
        }
        if candidate.size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentRejection::TooLarge {
                name: candidate.name,
                size_bytes: candidate.size_bytes,
            });
        }

        Ok(Self {
            name: candidate.name,
            size_bytes: candidate.size_bytes,
            mime_type: candidate.mime_type,
            content: candidate.content,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// Why a picked file was not accepted. Displays as the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttachmentRejection {
    #[error("{}", messages::UNSUPPORTED_FILE_TYPE)]
    UnsupportedType { name: String, mime_type: String },
    #[error("{}", messages::FILE_TOO_LARGE)]
    TooLarge { name: String, size_bytes: u64 },
}

impl AttachmentRejection {
    pub fn file_name(&self) -> &str {
        match self {
            Self::UnsupportedType { name, .. } | Self::TooLarge { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBatch {
    pub accepted: usize,
    pub rejection: Option<AttachmentRejection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSummary {
    pub name: String,
    pub size_label: String,
}

/// Ordered set of accepted attachments; the only record of what will be sent.
#[derive(Debug, Clone, Default)]
pub struct AttachmentStore {
    items: Vec<Attachment>,
}

impl AttachmentStore {
    /// Rebuilds the store from a fresh picker selection. The first rejected
    /// file ends the batch; files accepted before it are kept.
    pub fn replace(&mut self, candidates: impl IntoIterator<Item = FileCandidate>) -> AttachmentBatch {
        self.items.clear();
        let mut rejection = None;

        for candidate in candidates {
            match Attachment::accept(candidate) {
                Ok(attachment) => self.items.push(attachment),
                Err(reason) => {
                    rejection = Some(reason);
                    break;
                }
            }
        }

        AttachmentBatch {
            accepted: self.items.len(),
            rejection,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|a| a.name.clone()).collect()
    }

    pub fn summaries(&self) -> Vec<AttachmentSummary> {
        self.items
            .iter()
            .map(|a| AttachmentSummary {
                name: a.name.clone(),
                size_label: format_file_size(a.size_bytes),
            })
            .collect()
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} Bytes");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.2}");
    let compact_value = value_text.trim_end_matches('0').trim_end_matches('.');
    format!("{compact_value} {unit_label}")
}
