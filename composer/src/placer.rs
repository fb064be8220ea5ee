use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use rand::Rng;

use crate::{
    error::ComposeError,
    geom::{BoundingBox, Vertex},
};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A rotated card together with where it goes and what it covers.
///
/// `image`, `anchor` and `bbox` all come from the same angle and anchor.
pub struct Placement {
    pub image: RgbaImage,
    pub anchor: Vertex,
    pub bbox: BoundingBox,
    pub angle: u32,
}

impl Placement {
    pub fn paste_onto(&self, canvas: &mut RgbaImage) {
        imageops::overlay(
            canvas,
            &self.image,
            self.anchor.x() as i64,
            self.anchor.y() as i64,
        );
    }
}

/// Canvas size of a `width` x `height` image turned by `angle_deg` with
/// the canvas grown to hold all of it.
pub fn expanded_size(width: u32, height: u32, angle_deg: f64) -> (u32, u32) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let (w, h) = (width as f64, height as f64);
    // trig noise near multiples of 90 degrees must not add a pixel
    let snap = |v: f64| (v - 1e-6).ceil().max(1.0) as u32;
    (snap(w * cos + h * sin), snap(w * sin + h * cos))
}

// uncovered pixels stay transparent
pub fn rotate_expand(card: &RgbaImage, angle_deg: f64) -> RgbaImage {
    let (w, h) = card.dimensions();
    let (nw, nh) = expanded_size(w, h, angle_deg);
    let theta = angle_deg.to_radians() as f32;
    // Projection::rotate turns clockwise on screen
    let projection = Projection::translate(nw as f32 / 2.0, nh as f32 / 2.0)
        * Projection::rotate(-theta)
        * Projection::translate(-(w as f32) / 2.0, -(h as f32) / 2.0);

    let mut out = RgbaImage::from_pixel(nw, nh, TRANSPARENT);
    warp_into(
        card,
        &projection,
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut out,
    );
    out
}

pub struct CardPlacer {
    bg_width: u32,
    bg_height: u32,
}

impl CardPlacer {
    pub fn new(background: &RgbaImage) -> Self {
        let (bg_width, bg_height) = background.dimensions();
        Self {
            bg_width,
            bg_height,
        }
    }

    /// Turns `card` by a random whole-degree angle in `[0, 359]` and picks
    /// an anchor that keeps it fully inside the background.
    pub fn place<R: Rng + ?Sized>(
        &self,
        id: &str,
        card: &RgbaImage,
        rng: &mut R,
    ) -> Result<Placement, ComposeError> {
        let angle = rng.random_range(0..=359u32);
        self.place_at_angle(id, card, angle, rng)
    }

    pub fn place_at_angle<R: Rng + ?Sized>(
        &self,
        id: &str,
        card: &RgbaImage,
        angle: u32,
        rng: &mut R,
    ) -> Result<Placement, ComposeError> {
        let image = rotate_expand(card, angle as f64);
        let (rotated_w, rotated_h) = image.dimensions();
        if rotated_w > self.bg_width || rotated_h > self.bg_height {
            return Err(ComposeError::Placement {
                card: id.to_string(),
                rotated_w,
                rotated_h,
                bg_w: self.bg_width,
                bg_h: self.bg_height,
            });
        }

        let (w, h) = card.dimensions();
        let bbox = BoundingBox::from_card(w, h, Vertex(0, 0)).rotate(angle as f64);

        let x = rng.random_range(0..=self.bg_width - rotated_w) as i32;
        let y = rng.random_range(0..=self.bg_height - rotated_h) as i32;
        log::trace!("card {id}: angle {angle}, anchor ({x}, {y})");

        Ok(Placement {
            image,
            anchor: Vertex(x, y),
            bbox: bbox.translate(x, y),
            angle,
        })
    }
}
