//! The command source used by the demo shell.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::config::SourceConfig;
use crate::dispatcher::auth::CommandAuthorizer;

/// Who issued a shell command. Replies sent by commands are buffered and
/// drained by the shell after each line.
#[derive(Debug, Clone)]
pub struct ShellSource {
    name: String,
    permissions: Arc<BTreeSet<String>>,
    muted: bool,
    replies: Arc<Mutex<Vec<String>>>,
}

impl ShellSource {
    pub fn new(name: impl Into<String>, config: &SourceConfig) -> Self {
        Self {
            name: name.into(),
            permissions: Arc::new(config.permissions.iter().cloned().collect()),
            muted: config.muted,
            replies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Checks a permission against the granted set, honoring `*` and
    /// `prefix.*` wildcards.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| {
            if granted == "*" {
                return true;
            }
            match granted.strip_suffix('*') {
                Some(prefix) if prefix.ends_with('.') => permission.starts_with(prefix),
                _ => granted == permission,
            }
        })
    }

    pub fn reply(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.into());
    }

    /// Takes every buffered reply.
    pub fn take_replies(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Authorizes against the source's own granted permissions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePermissions;

impl CommandAuthorizer<ShellSource> for SourcePermissions {
    fn authorize(&self, permission: &str, source: &ShellSource) -> bool {
        source.has_permission(permission)
    }
}
