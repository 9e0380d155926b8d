use std::sync::Arc;

use async_trait::async_trait;
use shared::messages;
use tracing::{debug, info};

/// Capabilities the hosting shell exposes.
#[async_trait]
pub trait HostShell: Send + Sync {
    fn ready(&self);
    fn expand(&self);
    fn set_main_button_text(&self, text: &str);
    fn show_main_button(&self);
    fn hide_main_button(&self);
    fn enable_main_button(&self);
    fn disable_main_button(&self);
    async fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
    fn close(&self);
}

#[derive(Clone, Default)]
pub struct HostBridge {
    shell: Option<Arc<dyn HostShell>>,
}

impl HostBridge {
    /// Running standalone; every host call becomes a no-op.
    pub fn detached() -> Self {
        Self { shell: None }
    }

    pub fn attached(shell: Arc<dyn HostShell>) -> Self {
        Self { shell: Some(shell) }
    }

    pub fn is_attached(&self) -> bool {
        self.shell.is_some()
    }

    pub(crate) fn initialize(&self) {
        let Some(shell) = &self.shell else {
            debug!("host shell absent; running standalone");
            return;
        };
        shell.ready();
        shell.expand();
        shell.set_main_button_text(messages::MAIN_BUTTON_TEXT);
        info!("host shell initialized");
    }

    pub(crate) fn sync_main_button(&self, complete: bool) {
        let Some(shell) = &self.shell else {
            return;
        };
        if complete {
            shell.show_main_button();
            shell.enable_main_button();
        } else {
            shell.hide_main_button();
        }
    }

    pub(crate) fn disable_main_button(&self) {
        if let Some(shell) = &self.shell {
            shell.disable_main_button();
        }
    }

    /// Returns `false` when there is no shell to show the alert.
    pub(crate) fn alert(&self, message: &str) -> bool {
        match &self.shell {
            Some(shell) => {
                shell.alert(message);
                true
            }
            None => false,
        }
    }

    /// Closes the shell, asking first when there is work to lose.
    pub(crate) async fn request_close(&self, unsaved_changes: bool) -> bool {
        let Some(shell) = &self.shell else {
            return false;
        };
        if unsaved_changes && !shell.confirm(messages::CONFIRM_DISCARD).await {
            info!("host close cancelled by user");
            return false;
        }
        shell.close();
        true
    }

    pub(crate) fn close(&self) {
        if let Some(shell) = &self.shell {
            shell.close();
        }
    }
}
