use std::sync::Arc;

use glam::DVec2;

use crate::cell::{Cell, Flux};
use crate::config::ParticleConfig;
use crate::error::{FlowError, Result};
use crate::field::Field;
use crate::generator::ParticleGenerator;
use crate::grid::Grid;
use crate::layers::{Dataset, Layer};

/// Flow layers in map space with a selectable active layer.
///
/// World coordinates are translated to map space as `(x - x_min, y_max - y)`
/// and all flux is scaled so the fastest normal speed over every layer is 1.
#[derive(Clone, Debug)]
pub struct FlowMap {
    layers: Vec<Layer>,
    x_min: f64,
    y_max: f64,
    flux_scale: f64,
    current: usize,
    field: Arc<Field>,
}

impl FlowMap {
    pub fn new(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(FlowError::UnknownLayer(0));
        }
        let (x_min, y_max) = bounds(&layers);

        let mut map = Self {
            layers,
            x_min,
            y_max,
            flux_scale: 1.0,
            current: 0,
            field: Arc::new(Field::new(Grid::new(Vec::new())?)),
        };

        let mut max_speed: f64 = 0.0;
        for index in 0..map.layers.len() {
            for cell in map.create_cells(index) {
                let speed = cell.max_normal_speed();
                if speed == 0.0 && cell.flux() != Flux::ZERO {
                    log::warn!(
                        "cell ({}, {}) has flux but no measurable speed",
                        cell.i(),
                        cell.j()
                    );
                }
                max_speed = max_speed.max(speed);
            }
        }
        if max_speed > 0.0 && max_speed.is_finite() {
            map.flux_scale = 1.0 / max_speed;
        }
        log::debug!(
            "flow map: {} layers, max normal speed {}, flux scale {}",
            map.layers.len(),
            max_speed,
            map.flux_scale
        );

        map.set_layer(0)?;
        Ok(map)
    }

    pub fn from_dataset(data: &Dataset) -> Result<Self> {
        Self::new(data.layers()?)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn current_layer(&self) -> usize {
        self.current
    }

    pub fn flux_scale(&self) -> f64 {
        self.flux_scale
    }

    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }

    /// Translate a world point into map space.
    pub fn to_map(&self, world: DVec2) -> DVec2 {
        DVec2::new(world.x - self.x_min, self.y_max - world.y)
    }

    /// Rebuild the field for layer `index` (position in [`FlowMap::layers`]).
    pub fn set_layer(&mut self, index: usize) -> Result<()> {
        if index >= self.layers.len() {
            return Err(FlowError::UnknownLayer(index));
        }
        let cells = self
            .create_cells(index)
            .into_iter()
            .map(|c| {
                let flux = c.flux().scaled(self.flux_scale);
                Cell::new(*c.corners(), c.i(), c.j(), flux).with_value(c.value())
            })
            .collect();
        self.field = Arc::new(Field::new(Grid::new(cells)?));
        self.current = index;
        Ok(())
    }

    /// A generator over the active layer.
    pub fn particle_generator(&self, config: ParticleConfig) -> ParticleGenerator {
        ParticleGenerator::new(Arc::clone(&self.field), config)
    }

    /// Unscaled cells of a layer in map space.
    fn create_cells(&self, index: usize) -> Vec<Cell> {
        self.layers[index]
            .cells
            .iter()
            .map(|record| {
                let corners = record.points.map(|[x, y]| self.to_map(DVec2::new(x, y)));
                let flux = record.flow.map_or(Flux::ZERO, |f| {
                    Flux::new(
                        f.i_minus,
                        f.j_minus,
                        f.i_plus.unwrap_or(0.0),
                        f.j_plus.unwrap_or(0.0),
                    )
                });
                Cell::new(corners, record.i, record.j, flux).with_value(record.value)
            })
            .collect()
    }
}

fn bounds(layers: &[Layer]) -> (f64, f64) {
    let points = layers
        .iter()
        .flat_map(|l| l.cells.iter())
        .flat_map(|c| c.points.iter());
    let (mut x_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &[x, y] in points {
        x_min = x_min.min(x);
        y_max = y_max.max(y);
    }
    if x_min.is_finite() && y_max.is_finite() {
        (x_min, y_max)
    } else {
        (0.0, 0.0)
    }
}
