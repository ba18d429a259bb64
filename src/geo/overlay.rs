//! Customer location overlay.
//!
//! [`MapOverlay`] draws customer locations on top of a background map
//! through the [`Surface`] trait, so it carries no dependency on a
//! particular rendering backend.

use crate::models::GeoRecord;
use image::RgbImage;
use thiserror::Error;
use tracing::debug;

/// Geographic extent of the background map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub max_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Extent of the bundled map of Brazil.
    pub const BRAZIL: BoundingBox = BoundingBox {
        min_lng: -73.98283055,
        max_lng: -33.8,
        min_lat: -33.75116944,
        max_lat: 5.4,
    };

    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        (self.min_lng..=self.max_lng).contains(&lng) && (self.min_lat..=self.max_lat).contains(&lat)
    }
}

/// How scatter points are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointStyle {
    pub color: (u8, u8, u8),
    pub alpha: f64,
    /// Marker radius in pixels.
    pub radius: u32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            // maroon
            color: (128, 0, 0),
            alpha: 0.3,
            radius: 1,
        }
    }
}

/// Errors raised by a drawing surface.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("drawing backend error: {0}")]
    Backend(String),

    #[error("failed to prepare output: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that accepts an image and a sequence of (x, y) points.
pub trait Surface {
    /// Draw `image` stretched over `extent`; also fixes the surface's axes.
    fn draw_image(&mut self, image: &RgbImage, extent: BoundingBox) -> Result<(), RenderError>;

    /// Draw one scatter layer in data coordinates.
    fn draw_points(&mut self, points: &[(f64, f64)], style: PointStyle) -> Result<(), RenderError>;
}

/// Scatter overlay of deduplicated customer locations.
pub struct MapOverlay {
    locations: Vec<GeoRecord>,
    extent: BoundingBox,
    style: PointStyle,
}

impl MapOverlay {
    /// `locations` must hold at most one record per customer.
    pub fn new(locations: Vec<GeoRecord>) -> Self {
        Self {
            locations,
            extent: BoundingBox::BRAZIL,
            style: PointStyle::default(),
        }
    }

    pub fn with_style(mut self, style: PointStyle) -> Self {
        self.style = style;
        self
    }

    pub fn point_count(&self) -> usize {
        self.locations.len()
    }

    /// Draw the background, then every location as (longitude, latitude).
    pub fn render<S: Surface>(&self, surface: &mut S, background: &RgbImage) -> Result<(), RenderError> {
        surface.draw_image(background, self.extent)?;

        let points: Vec<(f64, f64)> = self
            .locations
            .iter()
            .map(|r| (r.longitude, r.latitude))
            .collect();

        let outside = points
            .iter()
            .filter(|(lng, lat)| !self.extent.contains(*lng, *lat))
            .count();
        if outside > 0 {
            debug!("{} locations fall outside the map extent", outside);
        }

        surface.draw_points(&points, self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        calls: Vec<String>,
        points: Vec<(f64, f64)>,
        extent: Option<BoundingBox>,
    }

    impl Surface for RecordingSurface {
        fn draw_image(&mut self, image: &RgbImage, extent: BoundingBox) -> Result<(), RenderError> {
            self.calls.push(format!("image {}x{}", image.width(), image.height()));
            self.extent = Some(extent);
            Ok(())
        }

        fn draw_points(&mut self, points: &[(f64, f64)], style: PointStyle) -> Result<(), RenderError> {
            self.calls.push(format!("points {} alpha {}", points.len(), style.alpha));
            self.points.extend_from_slice(points);
            Ok(())
        }
    }

    fn location(id: &str, lng: f64, lat: f64) -> GeoRecord {
        GeoRecord {
            customer_unique_id: id.to_string(),
            longitude: lng,
            latitude: lat,
        }
    }

    #[test]
    fn test_render_draws_background_then_points() {
        let overlay = MapOverlay::new(vec![
            location("u1", -46.6, -23.5),
            location("u2", -43.2, -22.9),
        ]);
        let background = RgbImage::new(4, 3);
        let mut surface = RecordingSurface::default();

        overlay.render(&mut surface, &background).unwrap();

        assert_eq!(surface.calls, vec!["image 4x3", "points 2 alpha 0.3"]);
        assert_eq!(surface.points, vec![(-46.6, -23.5), (-43.2, -22.9)]);
        assert_eq!(surface.extent, Some(BoundingBox::BRAZIL));
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox::BRAZIL;
        assert!(bbox.contains(-46.6, -23.5));
        assert!(!bbox.contains(2.35, 48.85));
    }

    #[test]
    fn test_surface_errors_propagate() {
        struct FailingSurface;
        impl Surface for FailingSurface {
            fn draw_image(&mut self, _: &RgbImage, _: BoundingBox) -> Result<(), RenderError> {
                Err(RenderError::Backend("no canvas".to_string()))
            }
            fn draw_points(&mut self, _: &[(f64, f64)], _: PointStyle) -> Result<(), RenderError> {
                Ok(())
            }
        }

        let overlay = MapOverlay::new(vec![location("u1", -46.6, -23.5)]);
        let err = overlay
            .render(&mut FailingSurface, &RgbImage::new(1, 1))
            .unwrap_err();
        assert!(err.to_string().contains("no canvas"));
    }
}
