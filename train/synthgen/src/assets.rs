use std::{
    collections::{BTreeMap, BTreeSet},
    fs::read_dir,
    path::{Path, PathBuf},
};

use image::{RgbaImage, imageops::FilterType};
use rayon::prelude::*;

use crate::error::GenError;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Decoded cards and backgrounds, loaded once and shared read-only by every sample.
pub struct ImageSet {
    pub cards: BTreeMap<String, RgbaImage>,
    pub backgrounds: Vec<RgbaImage>,
}

impl ImageSet {
    /// Decodes both directories in parallel. Cards are resized to
    /// `card_size` when given. Any file that fails to decode fails the load.
    pub fn load(
        input_dir: &Path,
        bg_dir: &Path,
        card_size: Option<(u32, u32)>,
    ) -> Result<Self, GenError> {
        let card_paths = list_images(input_dir)?;
        let bg_paths = list_images(bg_dir)?;

        let mut ids = BTreeSet::new();
        for path in &card_paths {
            let id = card_id(path);
            if !ids.insert(id.clone()) {
                return Err(GenError::DuplicateCard { id });
            }
        }

        let cards = card_paths
            .par_iter()
            .map(|path| -> Result<(String, RgbaImage), GenError> {
                let img = decode(path)?;
                let img = match card_size {
                    Some((w, h)) => image::imageops::resize(&img, w, h, FilterType::CatmullRom),
                    None => img,
                };
                Ok((card_id(path), img))
            })
            .collect::<Result<BTreeMap<_, _>, GenError>>()?;

        let backgrounds = bg_paths
            .par_iter()
            .map(|path| decode(path))
            .collect::<Result<Vec<_>, GenError>>()?;

        log::info!(
            "loaded {} cards from {} and {} backgrounds from {}",
            cards.len(),
            input_dir.display(),
            backgrounds.len(),
            bg_dir.display()
        );
        if backgrounds.is_empty() {
            log::warn!("no background images in {}", bg_dir.display());
        }

        Ok(Self { cards, backgrounds })
    }
}

pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, GenError> {
    let entries = read_dir(dir).map_err(|source| GenError::Scan {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| {
                    IMAGE_EXTENSIONS
                        .iter()
                        .any(|known| ext.eq_ignore_ascii_case(known))
                })
        })
        .collect();
    paths.sort();
    Ok(paths)
}

pub fn card_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn decode(path: &Path) -> Result<RgbaImage, GenError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| GenError::Load {
            path: path.to_path_buf(),
            source,
        })
}
