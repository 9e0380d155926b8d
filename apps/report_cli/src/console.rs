use async_trait::async_trait;
use client_core::{FormView, HostShell, ViewUpdate};
use shared::messages;
use tracing::debug;

/// Prints the updates a person filling the report needs to see.
#[derive(Default)]
pub struct ConsoleView;

impl FormView for ConsoleView {
    fn apply(&self, update: ViewUpdate) {
        match update {
            ViewUpdate::FieldMessage {
                field,
                message: Some(message),
            } => println!("  {field}: {message}"),
            ViewUpdate::Toast { kind, message } => println!("[{kind:?}] {message}"),
            ViewUpdate::Attachments(summaries) => {
                for summary in summaries {
                    println!("  attached {} ({})", summary.name, summary.size_label);
                }
            }
            ViewUpdate::RestoredAttachmentNames(names) => println!(
                "  previously attached, attach again before submitting: {}",
                names.join(", ")
            ),
            ViewUpdate::CommentCount {
                count,
                limit,
                over_limit: true,
            } => println!("  comments: {count}/{limit}"),
            ViewUpdate::SuccessPanel => println!("{}", messages::SUBMISSION_SUCCEEDED),
            other => debug!(update = ?other, "view update"),
        }
    }
}

/// Terminal stand-in for the mini-app shell.
pub struct ConsoleHost {
    assume_yes: bool,
}

impl ConsoleHost {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl HostShell for ConsoleHost {
    fn ready(&self) {
        debug!("host ready");
    }

    fn expand(&self) {
        debug!("host expanded");
    }

    fn set_main_button_text(&self, text: &str) {
        debug!(text, "main button text set");
    }

    fn show_main_button(&self) {
        debug!("main button shown");
    }

    fn hide_main_button(&self) {
        debug!("main button hidden");
    }

    fn enable_main_button(&self) {
        debug!("main button enabled");
    }

    fn disable_main_button(&self) {
        debug!("main button disabled");
    }

    async fn confirm(&self, message: &str) -> bool {
        let answer = if self.assume_yes { "yes" } else { "no" };
        println!("{message} [{answer}]");
        self.assume_yes
    }

    fn alert(&self, message: &str) {
        println!("! {message}");
    }

    fn close(&self) {
        println!("mini-app closed");
    }
}
