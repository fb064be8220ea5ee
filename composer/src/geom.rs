use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};

const OUTLINE: Rgba<u8> = Rgba([255, 0, 0, 255]);
const CENTER_MARK: Rgba<u8> = Rgba([0, 255, 0, 255]);
const CENTER_RADIUS: i32 = 4;

/// Pixel coordinate in a y-down image space, serialized as `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex(pub i32, pub i32);

impl Vertex {
    pub fn x(self) -> i32 {
        self.0
    }

    pub fn y(self) -> i32 {
        self.1
    }
}

/// Quadrilateral outline of a placed card.
///
/// Vertices are kept in the order top-left, bottom-left, bottom-right,
/// top-right of the unrotated card, and no transform ever reorders them.
/// The center is fixed at construction and only ever translated.
///
/// Every transform returns a new box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    vertices: [Vertex; 4],
    center: (f64, f64),
}

impl BoundingBox {
    /// Box of an unrotated `width` x `height` card whose top-left corner sits at `anchor`.
    pub fn from_card(width: u32, height: u32, anchor: Vertex) -> Self {
        let Vertex(x, y) = anchor;
        let (w, h) = (width as i32, height as i32);
        Self {
            vertices: [
                Vertex(x, y),
                Vertex(x, y + h),
                Vertex(x + w, y + h),
                Vertex(x + w, y),
            ],
            center: (x as f64 + width as f64 / 2.0, y as f64 + height as f64 / 2.0),
        }
    }

    pub fn vertices(&self) -> [Vertex; 4] {
        self.vertices
    }

    pub fn center(&self) -> (f64, f64) {
        self.center
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            vertices: self.vertices.map(|Vertex(x, y)| Vertex(x + dx, y + dy)),
            center: (self.center.0 + dx as f64, self.center.1 + dy as f64),
        }
    }

    /// Counter-clockwise (on screen) rotation about the box center, rounded
    /// to whole pixels. The center does not move.
    pub fn rotate_about_center(&self, angle_deg: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (cx, cy) = self.center;
        let vertices = self.vertices.map(|Vertex(x, y)| {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            // y grows downward, so the screen-space ccw turn flips the sin terms
            Vertex(
                (cx + dx * cos + dy * sin).round() as i32,
                (cy - dx * sin + dy * cos).round() as i32,
            )
        });
        Self {
            vertices,
            center: self.center,
        }
    }

    /// Rotation matching an image rotated with an expanding canvas.
    ///
    /// After turning about the center, the box is shifted so that the
    /// minimum corner of its axis-aligned extent lands where the minimum
    /// corner was before the turn. The expanded canvas of the rotated card
    /// starts at that corner, so the box keeps tracking the pasted pixels.
    ///
    /// The shift is measured on rounded vertices, so turning by `a` and then
    /// `-a` may leave vertices up to 2 px off, not 1.
    pub fn rotate(&self, angle_deg: f64) -> Self {
        let rotated = self.rotate_about_center(angle_deg);
        let Vertex(x0, y0) = self.min_corner();
        let Vertex(x1, y1) = rotated.min_corner();
        rotated.translate(x0 - x1, y0 - y1)
    }

    pub fn min_corner(&self) -> Vertex {
        let x = self.vertices.iter().map(|v| v.0).min().unwrap_or_default();
        let y = self.vertices.iter().map(|v| v.1).min().unwrap_or_default();
        Vertex(x, y)
    }

    pub fn extent(&self) -> (u32, u32) {
        let Vertex(x0, y0) = self.min_corner();
        let x1 = self.vertices.iter().map(|v| v.0).max().unwrap_or_default();
        let y1 = self.vertices.iter().map(|v| v.1).max().unwrap_or_default();
        ((x1 - x0) as u32, (y1 - y0) as u32)
    }

    pub fn draw(&self, img: &mut RgbaImage) {
        for i in 0..4 {
            let Vertex(x0, y0) = self.vertices[i];
            let Vertex(x1, y1) = self.vertices[(i + 1) % 4];
            draw_line_segment_mut(
                img,
                (x0 as f32, y0 as f32),
                (x1 as f32, y1 as f32),
                OUTLINE,
            );
        }
        let (cx, cy) = self.center;
        draw_filled_circle_mut(
            img,
            (cx.round() as i32, cy.round() as i32),
            CENTER_RADIUS,
            CENTER_MARK,
        );
    }
}
