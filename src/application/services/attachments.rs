use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::application::access::{self, Actor};
use crate::application::ports::access_repository::AccessRepository;
use crate::application::ports::document_repository::DocumentRepository;
use crate::domain::accesses::role::Role;

/// `<document_id>/attachments/<file_id>[-unsafe].<ext>`
static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<doc>[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})/attachments/(?P<file>[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})(?P<unsafe>-unsafe)?\.(?P<ext>[A-Za-z0-9]+)$",
    )
    .expect("attachment key pattern compiles")
});

/// Matches media references in rendered document XML.
static MEDIA_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"src="[^"]*/media/(?P<key>[0-9a-f-]{36}/attachments/[0-9a-f-]{36}(?:-unsafe)?\.[A-Za-z0-9]+)""#,
    )
    .expect("media src pattern compiles")
});

/// Parsed storage key of a document attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentKey {
    pub document_id: Uuid,
    pub file_id: Uuid,
    pub is_unsafe: bool,
    pub extension: String,
}

impl AttachmentKey {
    pub fn generate(document_id: Uuid, extension: &str, is_unsafe: bool) -> Self {
        Self {
            document_id,
            file_id: Uuid::new_v4(),
            is_unsafe,
            extension: extension.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_unsafe { "-unsafe" } else { "" };
        write!(
            f,
            "{}/attachments/{}{}.{}",
            self.document_id, self.file_id, marker, self.extension
        )
    }
}

impl FromStr for AttachmentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = KEY_RE
            .captures(s)
            .ok_or_else(|| format!("malformed attachment key: {s}"))?;
        Ok(Self {
            document_id: caps["doc"].parse().map_err(|_| "bad document id")?,
            file_id: caps["file"].parse().map_err(|_| "bad file id")?,
            is_unsafe: caps.name("unsafe").is_some(),
            extension: caps["ext"].to_ascii_lowercase(),
        })
    }
}

/// Attachment keys referenced by a content body.
pub fn extract_media_keys(content: &str) -> BTreeSet<String> {
    MEDIA_SRC_RE
        .captures_iter(content)
        .map(|c| c["key"].to_string())
        .collect()
}

/// Cross-document attachment reachability. An editor may pin a key onto
/// their document only when some document listing that key is readable by
/// them in its own right.
pub struct AttachmentGate<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    pub docs: &'a D,
    pub accesses: &'a A,
}

impl<'a, D, A> AttachmentGate<'a, D, A>
where
    D: DocumentRepository + ?Sized,
    A: AccessRepository + ?Sized,
{
    /// Filter `candidates` down to the keys the actor can read through
    /// some listing document.
    pub async fn readable_keys(
        &self,
        actor: &Actor,
        candidates: &BTreeSet<String>,
    ) -> anyhow::Result<BTreeSet<String>> {
        let mut admitted = BTreeSet::new();
        for key in candidates {
            for holder in self.docs.documents_with_attachment(key).await? {
                let resolved = access::resolve(self.docs, self.accesses, actor, &holder).await?;
                let visible = access::readable_per_se(&resolved)
                    && (!holder.in_deleted_chain() || resolved.role == Some(Role::Owner));
                if visible {
                    admitted.insert(key.clone());
                    break;
                }
            }
        }
        Ok(admitted)
    }

    /// Whether the actor may read attachment `key` at all: some document
    /// lists it and is readable through a direct access or a readable
    /// ancestor.
    pub async fn can_read_key(&self, actor: &Actor, key: &str) -> anyhow::Result<bool> {
        let mut set = BTreeSet::new();
        set.insert(key.to_string());
        Ok(!self.readable_keys(actor, &set).await?.is_empty())
    }
}
