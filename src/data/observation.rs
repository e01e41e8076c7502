use std::{fs::File, io::BufReader, path::Path};

use crate::foundation::error::{RaceError, RaceResult};

/// One recorded `(entity, date, value)` sample.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Observation {
    pub date: String,
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Observation {
    pub fn new(date: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            name: name.into(),
            value,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SaleRecord {
    pub sale_date: String,
    #[serde(default)]
    pub sale_products: Vec<SaleProduct>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SaleProduct {
    pub product_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    pub quantity: f64,
}

/// Flattens sales into one observation per sold product line.
///
/// The product name is the entity key, falling back to the id when the name is missing or empty.
pub fn observations_from_sales(sales: &[SaleRecord]) -> Vec<Observation> {
    sales
        .iter()
        .flat_map(|sale| {
            sale.sale_products.iter().map(move |sp| {
                let name = sp
                    .product_name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(&sp.product_id);
                Observation::new(sale.sale_date.clone(), name, sp.quantity)
            })
        })
        .collect()
}

/// Accepted on-disk dataset shapes.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum Dataset {
    Observations(Vec<Observation>),
    Sales(Vec<SaleRecord>),
}

impl Dataset {
    pub fn into_observations(self) -> Vec<Observation> {
        match self {
            Self::Observations(obs) => obs,
            Self::Sales(sales) => observations_from_sales(&sales),
        }
    }

    pub fn from_json_str(s: &str) -> RaceResult<Self> {
        serde_json::from_str(s).map_err(|e| {
            RaceError::serde(format!(
                "dataset must be an array of observations or sales records: {e}"
            ))
        })
    }
}

#[tracing::instrument]
pub fn load_observations(path: &Path) -> RaceResult<Vec<Observation>> {
    let f = File::open(path)?;
    let dataset: Dataset = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
        RaceError::serde(format!("parse dataset '{}': {e}", path.display()))
    })?;
    let obs = dataset.into_observations();
    tracing::debug!(count = obs.len(), "loaded observations");
    Ok(obs)
}
