#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("prompt cancelled")]
    Cancelled,
    #[error("prompt failed: {0}")]
    Io(String),
}

/// Interactive yes/no exchange with the operator
#[cfg_attr(test, mockall::automock)]
pub trait Prompt: Send + Sync {
    fn ask(&self, question: &str) -> Result<bool, PromptError>;
}

/// Decides whether a destructive action may proceed.
///
/// With auto-confirm set the prompt is never consulted. Any prompt error is a "no".
pub struct ConfirmationGate {
    auto_confirm: bool,
    prompt: Box<dyn Prompt>,
}

impl ConfirmationGate {
    pub fn new(auto_confirm: bool, prompt: Box<dyn Prompt>) -> Self {
        Self {
            auto_confirm,
            prompt,
        }
    }

    pub fn confirm(&self, question: &str) -> bool {
        if self.auto_confirm {
            log::info!("{question} yes (auto-confirmed)");
            return true;
        }

        match self.prompt.ask(question) {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("No confirmation received ({e}); skipping deletion");
                false
            }
        }
    }
}
