use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{Rgba, RgbaImage};
use synthgen::{
    BatchGenerator, FailurePolicy, GenCfg, GenError, ImageSet, LabelStore, Stage,
    io::LABELS_FILE,
};
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    input: PathBuf,
    bg: PathBuf,
    out: PathBuf,
}

impl Fixture {
    /// Three small cards and one background that fits them at any angle.
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let input = root.path().join("input");
        let bg = root.path().join("background");
        let out = root.path().join("output");
        fs::create_dir_all(&input).unwrap();
        fs::create_dir_all(&bg).unwrap();

        for (i, name) in ["ace", "king", "queen"].iter().enumerate() {
            RgbaImage::from_pixel(24, 36, Rgba([40 * i as u8, 200, 90, 255]))
                .save(input.join(format!("{name}.png")))
                .unwrap();
        }
        RgbaImage::from_pixel(240, 180, Rgba([10, 60, 10, 255]))
            .save(bg.join("table.png"))
            .unwrap();

        Self {
            _root: root,
            input,
            bg,
            out,
        }
    }

    fn cfg(&self, samples: usize) -> GenCfg {
        GenCfg {
            samples,
            input_dir: self.input.clone(),
            bg_dir: self.bg.clone(),
            out_dir: self.out.clone(),
            card_size: None,
            workers: Some(3),
            ..GenCfg::default()
        }
    }

    fn images(&self) -> ImageSet {
        ImageSet::load(&self.input, &self.bg, None).unwrap()
    }

    fn pngs(&self) -> Vec<PathBuf> {
        let mut found: Vec<_> = fs::read_dir(&self.out)
            .map(|rd| rd.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        found.retain(|p: &PathBuf| p.extension().is_some_and(|e| e == "png"));
        found.sort();
        found
    }
}

fn store(dir: &Path) -> LabelStore {
    LabelStore::in_dir(dir)
}

#[test]
fn batch_writes_every_sample_and_one_label_entry() {
    let fx = Fixture::new();
    let images = fx.images();
    let cfg = fx.cfg(5);

    let generator = BatchGenerator::new(&images, &cfg);
    let report = generator.run().unwrap();
    assert_eq!(report.written, 5);
    assert!(report.failures.is_empty());
    assert_eq!(report.stored_batches, Some(1));
    assert_eq!(generator.completed(), 5);

    assert_eq!(fx.pngs().len(), 5);
    let agg = store(&fx.out).load().unwrap();
    assert_eq!(agg.labels.len(), 1);
    assert_eq!(agg.labels[0].len(), 5);
    for record in &agg.labels[0] {
        assert!(!record.input_images.is_empty());
        assert!(record.input_images.len() <= 3);
        assert!(fx.out.join(&record.filename).is_file());
        let decoded = image::open(fx.out.join(&record.filename)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (240, 180));
    }
}

#[test]
fn second_batch_is_appended_after_the_first() {
    let fx = Fixture::new();
    let images = fx.images();

    BatchGenerator::new(&images, &fx.cfg(5)).run().unwrap();
    let first = store(&fx.out).load().unwrap().labels;

    let report = BatchGenerator::new(&images, &fx.cfg(3)).run().unwrap();
    assert_eq!(report.stored_batches, Some(2));

    let agg = store(&fx.out).load().unwrap();
    assert_eq!(agg.labels.len(), 2);
    assert_eq!(agg.labels[0], first[0]);
    assert_eq!(agg.labels[0].len(), 5);
    assert_eq!(agg.labels[1].len(), 3);
    assert_eq!(fx.pngs().len(), 8);
}

#[test]
fn corrupt_store_fails_without_being_overwritten() {
    let fx = Fixture::new();
    let images = fx.images();
    fs::create_dir_all(&fx.out).unwrap();
    fs::write(fx.out.join(LABELS_FILE), "[1, 2, 3]").unwrap();

    let err = BatchGenerator::new(&images, &fx.cfg(2)).run().unwrap_err();
    assert!(matches!(err, GenError::StoreCorrupt { .. }));
    assert_eq!(err.stage(), Stage::Store);
    assert_eq!(
        fs::read_to_string(fx.out.join(LABELS_FILE)).unwrap(),
        "[1, 2, 3]"
    );
    // images already written stay in place
    assert_eq!(fx.pngs().len(), 2);
}

#[test]
fn missing_backgrounds_abort_without_output() {
    let fx = Fixture::new();
    fs::remove_file(fx.bg.join("table.png")).unwrap();
    let images = fx.images();
    assert!(images.backgrounds.is_empty());

    let cfg = fx.cfg(4);
    let generator = BatchGenerator::new(&images, &cfg);
    let err = generator.run().unwrap_err();
    match &err {
        GenError::BatchAborted {
            failed,
            total,
            first,
        } => {
            assert_eq!((*failed, *total), (4, 4));
            assert!(matches!(
                **first,
                GenError::Compose(composer::ComposeError::NoBackground)
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.stage(), Stage::Placement);
    assert_eq!(generator.completed(), 4);
    assert!(fx.pngs().is_empty());
    assert!(!fx.out.join(LABELS_FILE).exists());
}

#[test]
fn skip_policy_keeps_the_successful_samples() {
    let fx = Fixture::new();
    // a card that can never fit the background
    RgbaImage::from_pixel(400, 400, Rgba([255, 255, 255, 255]))
        .save(fx.input.join("giant.png"))
        .unwrap();
    let images = fx.images();
    let cfg = GenCfg {
        failure_policy: FailurePolicy::Skip,
        seed: Some(1234),
        ..fx.cfg(12)
    };

    let report = BatchGenerator::new(&images, &cfg).run().unwrap();
    assert_eq!(report.written + report.failures.len(), 12);
    assert!(
        report
            .failures
            .iter()
            .all(|e| matches!(e, GenError::Compose(composer::ComposeError::Placement { .. })))
    );
    assert_eq!(fx.pngs().len(), report.written);

    let agg = store(&fx.out).load().unwrap();
    if report.written > 0 {
        assert_eq!(agg.labels.len(), 1);
        assert_eq!(agg.labels[0].len(), report.written);
        assert!(
            agg.labels[0]
                .iter()
                .flat_map(|r| &r.input_images)
                .all(|l| l.label != "giant")
        );
    } else {
        assert!(agg.labels.is_empty());
    }
}

#[test]
fn abort_policy_leaves_the_store_untouched() {
    let fx = Fixture::new();
    let images = fx.images();
    BatchGenerator::new(&images, &fx.cfg(2)).run().unwrap();
    let before = fs::read_to_string(fx.out.join(LABELS_FILE)).unwrap();

    let mut with_giant = fx.images();
    with_giant.cards.clear();
    with_giant
        .cards
        .insert("giant".to_string(), RgbaImage::new(400, 400));

    let err = BatchGenerator::new(&with_giant, &fx.cfg(3))
        .run()
        .unwrap_err();
    assert!(matches!(err, GenError::BatchAborted { failed: 3, .. }));
    assert_eq!(fs::read_to_string(fx.out.join(LABELS_FILE)).unwrap(), before);
}

#[test]
fn zero_samples_is_a_no_op() {
    let fx = Fixture::new();
    let images = fx.images();
    let report = BatchGenerator::new(&images, &fx.cfg(0)).run().unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(report.stored_batches, None);
    assert!(!fx.out.join(LABELS_FILE).exists());
}
