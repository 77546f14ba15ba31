use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::quote::FabricType;

/// Width × drop price grid for one fabric.
///
/// `widths` and `drops` are ascending bracket ceilings in millimetres and
/// `prices[drop_index][width_index]` is the price of the bracket pair. A blind is priced from the
/// smallest width bracket that fits its width and the smallest drop bracket that fits its height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMatrix {
    pub widths: Vec<u32>,
    pub drops: Vec<u32>,
    pub prices: Vec<Vec<Decimal>>,
}

impl PriceMatrix {
    pub fn new(
        widths: Vec<u32>,
        drops: Vec<u32>,
        prices: Vec<Vec<Decimal>>,
    ) -> Result<Self, MatrixShapeError> {
        let matrix = Self { widths, drops, prices };
        matrix.check_shape()?;
        Ok(matrix)
    }

    pub fn price_for(&self, width: u32, height: u32) -> Option<Decimal> {
        let column = self.widths.iter().position(|ceiling| width <= *ceiling)?;
        let row = self.drops.iter().position(|ceiling| height <= *ceiling)?;
        self.prices.get(row)?.get(column).copied()
    }

    pub fn max_width(&self) -> u32 {
        self.widths.last().copied().unwrap_or_default()
    }

    pub fn max_drop(&self) -> u32 {
        self.drops.last().copied().unwrap_or_default()
    }

    fn check_shape(&self) -> Result<(), MatrixShapeError> {
        if self.widths.is_empty() || self.drops.is_empty() {
            return Err(MatrixShapeError::NoBrackets);
        }
        if !is_strictly_ascending(&self.widths) {
            return Err(MatrixShapeError::UnorderedBrackets { axis: "widths" });
        }
        if !is_strictly_ascending(&self.drops) {
            return Err(MatrixShapeError::UnorderedBrackets { axis: "drops" });
        }
        if self.prices.len() != self.drops.len() {
            return Err(MatrixShapeError::RowCount {
                expected: self.drops.len(),
                found: self.prices.len(),
            });
        }
        if let Some((row, prices)) =
            self.prices.iter().enumerate().find(|(_, prices)| prices.len() != self.widths.len())
        {
            return Err(MatrixShapeError::RowWidth {
                row,
                found: prices.len(),
                expected: self.widths.len(),
            });
        }
        if self.prices.iter().flatten().any(|price| *price < Decimal::ZERO) {
            return Err(MatrixShapeError::NegativePrice);
        }
        Ok(())
    }
}

fn is_strictly_ascending(values: &[u32]) -> bool {
    values.windows(2).all(|pair| pair[0] < pair[1])
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MatrixShapeError {
    #[error("widths and drops must each list at least one bracket")]
    NoBrackets,
    #[error("{axis} must be strictly ascending")]
    UnorderedBrackets { axis: &'static str },
    #[error("expected {expected} price rows (one per drop) but found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("price row {row} has {found} entries but there are {expected} width brackets")]
    RowWidth { row: usize, found: usize, expected: usize },
    #[error("prices must not be negative")]
    NegativePrice,
}

/// Per-row pricing failure. Reported to the user; never fatal.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PriceLookupError {
    #[error("No price matrix is configured for fabric {fabric}.")]
    MissingMatrix { fabric: FabricType },
    #[error(
        "No price found for {fabric} at {width} x {height}; the matrix covers up to {max_width} x {max_drop}."
    )]
    OutOfRange { fabric: FabricType, width: u32, height: u32, max_width: u32, max_drop: u32 },
    #[error("Line item is missing width, height or fabric type.")]
    Incomplete,
}

#[derive(Debug, Error)]
pub enum PriceMatrixError {
    #[error("could not read price book `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse price book `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("price matrix for fabric {fabric} is malformed: {source}")]
    InvalidShape { fabric: FabricType, source: MatrixShapeError },
    #[error("price book `{path}` lists unknown fabric `{code}`")]
    UnknownFabric { path: PathBuf, code: String },
}

/// Where the orchestrator fetches a fabric's price matrix from.
pub trait PriceMatrixSource: Send + Sync {
    fn price_matrix(&self, fabric: FabricType) -> Option<&PriceMatrix>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriceBook {
    fabrics: BTreeMap<FabricType, PriceMatrix>,
}

#[derive(Debug, Deserialize)]
struct PriceBookFile {
    #[serde(default)]
    fabrics: BTreeMap<String, PriceMatrix>,
}

impl PriceBook {
    pub fn new(fabrics: BTreeMap<FabricType, PriceMatrix>) -> Result<Self, PriceMatrixError> {
        for (fabric, matrix) in &fabrics {
            matrix
                .check_shape()
                .map_err(|source| PriceMatrixError::InvalidShape { fabric: *fabric, source })?;
        }
        Ok(Self { fabrics })
    }

    pub fn empty() -> Self {
        Self { fabrics: BTreeMap::new() }
    }

    /// Reads a TOML price book of the form `[fabrics.BO] widths = [..] drops = [..] prices = [[..]]`.
    pub fn load(path: &Path) -> Result<Self, PriceMatrixError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| PriceMatrixError::ReadFile { path: path.to_path_buf(), source })?;
        let file = toml::from_str::<PriceBookFile>(&raw)
            .map_err(|source| PriceMatrixError::ParseFile { path: path.to_path_buf(), source })?;

        let mut fabrics = BTreeMap::new();
        for (code, matrix) in file.fabrics {
            let fabric = code.parse::<FabricType>().map_err(|_| {
                PriceMatrixError::UnknownFabric { path: path.to_path_buf(), code: code.clone() }
            })?;
            fabrics.insert(fabric, matrix);
        }
        Self::new(fabrics)
    }

    /// Loads `path` when given, otherwise falls back to the built-in book.
    pub fn from_path_or_default(path: Option<&Path>) -> Result<Self, PriceMatrixError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn fabrics(&self) -> impl Iterator<Item = FabricType> + '_ {
        self.fabrics.keys().copied()
    }

    pub fn with_matrix(mut self, fabric: FabricType, matrix: PriceMatrix) -> Self {
        self.fabrics.insert(fabric, matrix);
        self
    }
}

impl Default for PriceBook {
    fn default() -> Self {
        let widths = vec![600, 900, 1200, 1500, 1800, 2100, 2400, 2700, 3000];
        let drops = vec![1000, 1500, 2000, 2500, 3000];

        let grid = |base: i64, width_step: i64, drop_step: i64| -> Vec<Vec<Decimal>> {
            (0..drops.len() as i64)
                .map(|row| {
                    (0..widths.len() as i64)
                        .map(|column| Decimal::from(base + column * width_step + row * drop_step))
                        .collect()
                })
                .collect()
        };

        let fabrics = BTreeMap::from([
            (
                FabricType::Bo,
                PriceMatrix { widths: widths.clone(), drops: drops.clone(), prices: grid(85, 12, 15) },
            ),
            (
                FabricType::Bo1,
                PriceMatrix { widths: widths.clone(), drops: drops.clone(), prices: grid(95, 14, 17) },
            ),
            (
                FabricType::Sn,
                PriceMatrix { widths: widths.clone(), drops: drops.clone(), prices: grid(75, 10, 12) },
            ),
        ]);

        Self { fabrics }
    }
}

impl PriceMatrixSource for PriceBook {
    fn price_matrix(&self, fabric: FabricType) -> Option<&PriceMatrix> {
        self.fabrics.get(&fabric)
    }
}
