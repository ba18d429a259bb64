//! PNG drawing surface backed by plotters.
//!
//! Draw calls are buffered and written in one pass by [`PngSurface::save`].

use crate::geo::{BoundingBox, PointStyle, RenderError, Surface};
use image::imageops::{self, FilterType};
use image::RgbImage;
use plotters::backend::RGBPixel;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Buffered scatter-over-image surface.
pub struct PngSurface {
    path: PathBuf,
    size: (u32, u32),
    extent: Option<BoundingBox>,
    background: Option<RgbImage>,
    layers: Vec<(Vec<(f64, f64)>, PointStyle)>,
}

impl PngSurface {
    pub fn new(path: impl Into<PathBuf>, size: (u32, u32)) -> Self {
        Self {
            path: path.into(),
            size,
            extent: None,
            background: None,
            layers: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of points drawn across all layers.
    pub fn point_count(&self) -> usize {
        self.layers.iter().map(|(points, _)| points.len()).sum()
    }

    /// Render the buffered image and points to the PNG file.
    pub fn save(&self) -> Result<(), RenderError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let extent = self.extent.unwrap_or_else(|| self.points_extent());

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE).map_err(backend_err)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(0)
            .build_cartesian_2d(extent.min_lng..extent.max_lng, extent.min_lat..extent.max_lat)
            .map_err(backend_err)?;

        if let Some(ref background) = self.background {
            let (w, h) = chart.plotting_area().dim_in_pixel();
            let resized = imageops::resize(background, w, h, FilterType::Triangle);
            let element = BitMapElement::<_, RGBPixel>::with_owned_buffer(
                (extent.min_lng, extent.max_lat),
                (w, h),
                resized.into_raw(),
            )
            .ok_or_else(|| RenderError::Backend("background buffer size mismatch".to_string()))?;
            chart
                .draw_series(std::iter::once(element))
                .map_err(backend_err)?;
        }

        for (points, style) in &self.layers {
            let (r, g, b) = style.color;
            let color = RGBColor(r, g, b).mix(style.alpha).filled();
            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), style.radius, color)),
                )
                .map_err(backend_err)?;
        }

        root.present().map_err(backend_err)?;
        info!("Map written to: {}", self.path.display());
        Ok(())
    }

    /// Fallback extent when no background fixed the axes.
    fn points_extent(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_lng: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for &(x, y) in self.layers.iter().flat_map(|(points, _)| points) {
            bbox.min_lng = bbox.min_lng.min(x);
            bbox.max_lng = bbox.max_lng.max(x);
            bbox.min_lat = bbox.min_lat.min(y);
            bbox.max_lat = bbox.max_lat.max(y);
        }
        if bbox.min_lng >= bbox.max_lng || bbox.min_lat >= bbox.max_lat {
            return BoundingBox::BRAZIL;
        }
        bbox
    }
}

impl Surface for PngSurface {
    fn draw_image(&mut self, image: &RgbImage, extent: BoundingBox) -> Result<(), RenderError> {
        debug!("Buffering {}x{} background", image.width(), image.height());
        self.background = Some(image.clone());
        self.extent = Some(extent);
        Ok(())
    }

    fn draw_points(&mut self, points: &[(f64, f64)], style: PointStyle) -> Result<(), RenderError> {
        debug!("Buffering {} points", points.len());
        self.layers.push((points.to_vec(), style));
        Ok(())
    }
}

pub(crate) fn backend_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Backend(e.to_string())
}
