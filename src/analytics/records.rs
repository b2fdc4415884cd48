use serde::{Deserialize, Deserializer};

use super::params::Field;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct AssetInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issuer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub decimals: Option<u32>,
}

impl AssetInfo {
    pub fn display_symbol(&self) -> &str {
        if self.symbol.is_empty() {
            &self.code
        } else {
            &self.symbol
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldValues {
    #[serde(default)]
    pub supply: Option<f64>,
    #[serde(default)]
    pub borrow: Option<f64>,
    #[serde(default)]
    pub supply_apy: Option<f64>,
    #[serde(default)]
    pub borrow_apy: Option<f64>,
}

impl FieldValues {
    pub fn value(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Supply => self.supply,
            Field::Borrow => self.borrow,
            Field::SupplyApy => self.supply_apy,
            Field::BorrowApy => self.borrow_apy,
        };
        value.filter(|value| value.is_finite())
    }

    pub fn get(&self, field: Field) -> f64 {
        self.value(field).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeltaRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub asset: AssetInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start: FieldValues,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: FieldValues,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: FieldValues,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PositionSummary {
    pub supply: f64,
    pub borrow: f64,
    pub supply_change: f64,
    pub borrow_change: f64,
    pub supply_apy: f64,
    pub borrow_apy: f64,
    pub supply_apy_change: f64,
    pub borrow_apy_change: f64,
}

impl DeltaRecord {
    // On-chain amounts carry seven decimals.
    pub const AMOUNT_SCALE: f64 = 1e7;

    pub fn summary(&self) -> PositionSummary {
        let relative = |field: Field| {
            let start = self.start.get(field) / Self::AMOUNT_SCALE;
            if start == 0.0 {
                0.0
            } else {
                (self.delta.get(field) / Self::AMOUNT_SCALE) / start
            }
        };

        PositionSummary {
            supply: self.end.get(Field::Supply) / Self::AMOUNT_SCALE,
            borrow: self.end.get(Field::Borrow) / Self::AMOUNT_SCALE,
            supply_change: relative(Field::Supply),
            borrow_change: relative(Field::Borrow),
            supply_apy: self.end.get(Field::SupplyApy),
            borrow_apy: self.end.get(Field::BorrowApy),
            supply_apy_change: self.delta.get(Field::SupplyApy),
            borrow_apy_change: self.delta.get(Field::BorrowApy),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub value: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesFields {
    #[serde(default, deserialize_with = "null_as_default")]
    pub supply: Vec<SeriesPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub borrow: Vec<SeriesPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supply_apy: Vec<SeriesPoint>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub borrow_apy: Vec<SeriesPoint>,
}

impl SeriesFields {
    pub fn points(&self, field: Field) -> &[SeriesPoint] {
        match field {
            Field::Supply => &self.supply,
            Field::Borrow => &self.borrow,
            Field::SupplyApy => &self.supply_apy,
            Field::BorrowApy => &self.borrow_apy,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pool_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub asset: AssetInfo,
    #[serde(default)]
    pub series: Option<SeriesFields>,
}
