use std::path::PathBuf;

/// What happens to a batch when some of its samples fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Let every sample finish, then fail the batch without touching the labels.
    #[default]
    Abort,
    /// Record the successful samples and report the failed ones.
    Skip,
}

pub struct GenCfg {
    pub samples: usize,
    pub input_dir: PathBuf,
    pub bg_dir: PathBuf,
    pub out_dir: PathBuf,
    pub draw_boxes: bool,
    pub card_size: Option<(u32, u32)>, // None keeps cards at native size
    pub workers: Option<usize>,
    pub failure_policy: FailurePolicy,
    pub seed: Option<u64>,
}

impl Default for GenCfg {
    fn default() -> Self {
        Self {
            samples: 10,
            input_dir: PathBuf::from("data/input"),
            bg_dir: PathBuf::from("data/background"),
            out_dir: PathBuf::from("output"),
            draw_boxes: false,
            card_size: Some((571, 800)),
            workers: None,
            failure_policy: FailurePolicy::Abort,
            seed: None,
        }
    }
}
