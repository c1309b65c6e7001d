use std::path::{Path, PathBuf};

/// Running counters of one download run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    /// Images written so far. Also the number used for the next file name.
    pub saved: usize,
    /// Image tags seen so far, whatever happened to them.
    pub found: usize,
}

impl Tally {
    /// Where the next successful image goes.
    pub fn next_file_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("image-{}.png", self.saved))
    }

    pub fn record(&mut self, outcome: &ImageOutcome) {
        self.found += 1;
        if matches!(outcome, ImageOutcome::Saved { .. }) {
            self.saved += 1;
        }
    }
}

/// What finally happened to one image tag. None of these are retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    NoSource,
    FetchFailed { url: String, reason: String },
    WrongExtension { url: String },
    WriteFailed { reason: String },
    Saved { url: String, path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_follow_saved_count_only() {
        let dir = Path::new("out");
        let mut tally = Tally::default();
        assert_eq!(tally.next_file_path(dir), dir.join("image-0.png"));

        tally.record(&ImageOutcome::NoSource);
        tally.record(&ImageOutcome::WrongExtension {
            url: "http://x/b.jpg".into(),
        });
        assert_eq!(tally.next_file_path(dir), dir.join("image-0.png"));

        tally.record(&ImageOutcome::Saved {
            url: "http://x/a.png".into(),
            path: dir.join("image-0.png"),
        });
        tally.record(&ImageOutcome::WriteFailed {
            reason: "disk full".into(),
        });
        assert_eq!(tally.next_file_path(dir), dir.join("image-1.png"));
        assert_eq!(tally, Tally { saved: 1, found: 4 });
    }
}
