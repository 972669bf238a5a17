use dialoguer::{Confirm, theme::ColorfulTheme};
use sweeper::{Prompt, PromptError};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Yes/no confirmation on the controlling terminal, defaulting to "no"
#[derive(Default)]
pub struct TerminalPrompt {
    theme: ColorfulTheme,
}

impl Prompt for TerminalPrompt {
    fn ask(&self, question: &str) -> Result<bool, PromptError> {
        let answer = off_runtime(|| {
            Confirm::with_theme(&self.theme)
                .with_prompt(question)
                .default(false)
                .interact_opt()
        });
        answer
            .map_err(|e| PromptError::Io(e.to_string()))?
            .ok_or(PromptError::Cancelled)
    }
}

/// Run blocking terminal I/O without stalling the other tasks on a multi-threaded runtime
fn off_runtime<T>(blocking: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(blocking)
        }
        _ => blocking(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_io_on_multi_thread_runtime() {
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            "ticked"
        });

        let answer = off_runtime(|| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            42
        });

        assert_eq!(answer, 42);
        assert_eq!(ticker.await.unwrap(), "ticked");
    }

    #[tokio::test]
    async fn test_blocking_io_on_current_thread_runtime() {
        assert_eq!(off_runtime(|| "yes"), "yes");
    }

    #[test]
    fn test_blocking_io_outside_runtime() {
        assert_eq!(off_runtime(|| 7), 7);
    }
}
