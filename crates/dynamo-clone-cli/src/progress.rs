//! Terminal progress bar reporting for the clone pump.

use dynamo_clone::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Mutex;

/// Progress observer rendering an indicatif bar.
///
/// Hidden when the user asked for no bar or stdout is not a TTY
/// (piped output, cron jobs), preventing output corruption.
pub struct BarProgress {
    disabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    /// Create a bar that renders unless `disabled` or not on a TTY.
    pub fn new(disabled: bool) -> Self {
        Self {
            disabled,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressObserver for BarProgress {
    fn begin(&self, total_hint: Option<u64>) {
        if self.disabled || !std::io::stdout().is_terminal() {
            return;
        }

        let bar = match total_hint {
            Some(total) => {
                let bar = ProgressBar::new(total);
                bar.set_style(
                    ProgressStyle::with_template(
                        "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                    )
                    .expect("valid template")
                    .progress_chars("=> "),
                );
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner} {pos} items {msg}")
                        .expect("valid template"),
                );
                bar
            }
        };
        bar.set_message("copying");

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn page_done(&self, items: u64) {
        self.with_bar(|bar| bar.inc(items));
    }

    fn finish(&self) {
        self.with_bar(|bar| bar.finish_with_message("done"));
    }
}
