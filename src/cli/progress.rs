//! Terminal progress bar bridged onto the library's listener seam.

use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::ProgressListener;

pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener for ConsoleProgress {
    fn on_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn on_file(&self, name: &str, _index: usize, _total: usize) {
        self.bar.set_message(name.to_owned());
        self.bar.inc(1);
    }

    fn on_finished(&self) {
        self.bar.finish_and_clear();
    }

    fn on_cancel(&self) {
        self.bar.abandon_with_message("cancelled");
    }
}
