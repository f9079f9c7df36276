use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(total: u64, description: &str) -> Result<Self> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed}, {eta})")?.progress_chars("●○ ");

        bar.set_style(style);
        bar.set_message(description.to_string());

        Ok(Self { bar })
    }

    pub fn add(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_string());
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.abandon();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_counts_points() {
        let bar = Bar::new(3, "sweeping").unwrap();
        bar.add(1);
        bar.set_message("window_bits=9");
        bar.add(2);

        assert_eq!(bar.bar.position(), 3);
        bar.finish();
        assert!(bar.bar.is_finished());
    }
}
