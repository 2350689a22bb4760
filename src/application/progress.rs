//! Terminal progress for the two harvest phases
//!
//! Bars draw on stderr next to the console log. With progress disabled they are hidden,
//! but positions are still tracked.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::infrastructure::parsing::LISTING_PAGE_CAP;

const LISTING_TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages";
const DETAIL_TEMPLATE: &str = "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})";

#[derive(Debug, Clone, Copy)]
pub struct HarvestProgress {
    visible: bool,
}

impl HarvestProgress {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    /// One step per listing page a label may have
    pub fn listing_bar(&self, labels: usize) -> ProgressBar {
        self.create_progress_bar(listing_steps(labels), LISTING_TEMPLATE, "Listing pages")
    }

    /// One step per candidate
    pub fn detail_bar(&self, candidates: usize) -> ProgressBar {
        self.create_progress_bar(candidates as u64, DETAIL_TEMPLATE, "Album pages")
    }

    fn create_progress_bar(&self, len: u64, template: &str, msg: &'static str) -> ProgressBar {
        let bar = if self.visible {
            ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        bar.set_length(len);
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(msg);
        bar
    }
}

pub fn listing_steps(labels: usize) -> u64 {
    labels as u64 * u64::from(LISTING_PAGE_CAP)
}

/// Mark a label's listing steps done, whether or not page 2 existed
pub fn complete_label(bar: &ProgressBar, labels_done: usize) {
    bar.set_position(listing_steps(labels_done));
}

/// Finish a bar; an interrupted phase is left at its current position
pub fn close(bar: &ProgressBar, interrupted: bool) {
    if interrupted {
        bar.abandon_with_message("Interrupted");
    } else {
        bar.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_bar_counts_two_pages_per_label() {
        let bar = HarvestProgress::new(false).listing_bar(3);
        assert_eq!(bar.length(), Some(6));

        bar.inc(1);
        complete_label(&bar, 1);
        assert_eq!(bar.position(), 2);
        complete_label(&bar, 3);
        assert_eq!(bar.position(), 6);
    }

    #[test]
    fn interrupted_bar_keeps_its_position() {
        let bar = HarvestProgress::new(false).detail_bar(10);
        bar.inc(4);
        close(&bar, true);
        assert!(bar.is_finished());
        assert_eq!(bar.position(), 4);
    }

    #[test]
    fn finished_bar_is_closed() {
        let bar = HarvestProgress::new(false).detail_bar(0);
        close(&bar, false);
        assert!(bar.is_finished());
    }
}
