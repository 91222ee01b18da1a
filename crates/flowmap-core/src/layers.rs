//! Decoding of the integer-scaled grid dataset into per-layer cell records.
//!
//! Each data row is `[i, j, k, x0, x1, x2, x3, y0, y1, y2, y3, value,
//! flowI?, flowJ?]` where every raw number decodes as `raw / scale + min`
//! using the matching entry in `linearscales`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

const COLUMNS_2D: usize = 12;
const FLOW_I_COLUMN: usize = 12;
const FLOW_J_COLUMN: usize = 13;

/// `[scale, min]` pairs (and `[scale, xmin, ymin]` for coordinates).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearScales {
    pub coord: [f64; 3],
    pub value: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<[f64; 2]>,
}

/// Raw input dataset as received from the dashboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub linearscales: LinearScales,
    pub values: Vec<Vec<f64>>,
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// A `flow` scale selects the flow-map decoding path.
    pub fn has_flow(&self) -> bool {
        self.linearscales.flow.is_some()
    }

    /// Decode with whichever path the scales select.
    pub fn layers(&self) -> Result<Vec<Layer>> {
        if self.has_flow() {
            make_flow_layers(self)
        } else {
            make_2d_layers(self)
        }
    }
}

/// Flow across the faces of a decoded cell. The negative directions are
/// derived from the neighbouring cells' positive directions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerFlow {
    #[serde(rename = "FLOWI+")]
    pub i_plus: Option<f64>,
    #[serde(rename = "FLOWJ+")]
    pub j_plus: Option<f64>,
    #[serde(rename = "FLOWI-")]
    pub i_minus: f64,
    #[serde(rename = "FLOWJ-")]
    pub j_minus: f64,
}

/// One decoded cell record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerCell {
    pub i: u32,
    pub j: u32,
    pub k: u32,
    pub points: [[f64; 2]; 4],
    pub value: f64,
    #[serde(flatten)]
    pub flow: Option<LayerFlow>,
}

/// All cells sharing one `k`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub k: u32,
    pub cells: Vec<LayerCell>,
}

/// Decode a dataset into flow layers, deriving `FLOWI-`/`FLOWJ-` from the
/// neighbours at `(i-1, j)` and `(i, j-1)`. Missing neighbours give zero.
pub fn make_flow_layers(data: &Dataset) -> Result<Vec<Layer>> {
    let [flow_scale, flow_min] = data.linearscales.flow.ok_or(FlowError::MissingScale("flow"))?;
    if flow_scale == 0.0 {
        return Err(FlowError::InvalidScale("flow"));
    }
    let decode_flow = |raw: Option<&f64>| raw.map(|r| r / flow_scale + flow_min);

    let mut layers = decode_rows(data, |row| {
        Some(LayerFlow {
            i_plus: decode_flow(row.get(FLOW_I_COLUMN)),
            j_plus: decode_flow(row.get(FLOW_J_COLUMN)),
            i_minus: 0.0,
            j_minus: 0.0,
        })
    })?;

    for layer in &mut layers {
        add_negative_flow(layer);
    }
    log::debug!("decoded {} flow layers", layers.len());
    Ok(layers)
}

/// Decode a dataset into plain property layers without flow.
pub fn make_2d_layers(data: &Dataset) -> Result<Vec<Layer>> {
    let layers = decode_rows(data, |_| None)?;
    log::debug!("decoded {} property layers", layers.len());
    Ok(layers)
}

fn decode_rows<F>(data: &Dataset, flow: F) -> Result<Vec<Layer>>
where
    F: Fn(&[f64]) -> Option<LayerFlow>,
{
    let [coord_scale, x_min, y_min] = data.linearscales.coord;
    let [value_scale, value_min] = data.linearscales.value;
    if coord_scale == 0.0 {
        return Err(FlowError::InvalidScale("coord"));
    }
    if value_scale == 0.0 {
        return Err(FlowError::InvalidScale("value"));
    }

    let mut by_k: BTreeMap<u32, Vec<LayerCell>> = BTreeMap::new();
    for (n, row) in data.values.iter().enumerate() {
        if row.len() < COLUMNS_2D {
            return Err(FlowError::RowTooShort {
                row: n,
                expected: COLUMNS_2D,
                found: row.len(),
            });
        }
        let x = |c: usize| row[c] / coord_scale + x_min;
        let y = |c: usize| row[c] / coord_scale + y_min;
        let cell = LayerCell {
            i: index_value(row, n, 0)?,
            j: index_value(row, n, 1)?,
            k: index_value(row, n, 2)?,
            points: [[x(3), y(7)], [x(4), y(8)], [x(5), y(9)], [x(6), y(10)]],
            value: row[11] / value_scale + value_min,
            flow: flow(row),
        };
        by_k.entry(cell.k).or_default().push(cell);
    }

    Ok(by_k.into_iter().map(|(k, cells)| Layer { k, cells }).collect())
}

fn index_value(row: &[f64], n: usize, column: usize) -> Result<u32> {
    let value = row[column];
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Err(FlowError::InvalidIndex {
            row: n,
            column,
            value,
        })
    }
}

fn add_negative_flow(layer: &mut Layer) {
    // First record at a position wins.
    let mut positive: HashMap<(u32, u32), (Option<f64>, Option<f64>)> = HashMap::new();
    for cell in &layer.cells {
        if let Some(flow) = cell.flow {
            positive
                .entry((cell.i, cell.j))
                .or_insert((flow.i_plus, flow.j_plus));
        }
    }

    for cell in &mut layer.cells {
        let Some(flow) = cell.flow.as_mut() else {
            continue;
        };
        flow.i_minus = cell
            .i
            .checked_sub(1)
            .and_then(|i| positive.get(&(i, cell.j)))
            .and_then(|&(i_plus, _)| i_plus)
            .unwrap_or(0.0);
        flow.j_minus = cell
            .j
            .checked_sub(1)
            .and_then(|j| positive.get(&(cell.i, j)))
            .and_then(|&(_, j_plus)| j_plus)
            .unwrap_or(0.0);
    }
}
