mod client;
mod icons;
mod params;
mod records;

pub use client::{AnalyticsError, AnalyticsSource, HttpAnalytics};
pub use icons::{AssetMeta, HorizonIconResolver, IconError, IconResolver};
pub use params::{Field, TimeWindow};
pub use records::{AssetInfo, DeltaRecord, SeriesFields, SeriesPoint, SeriesRecord};

#[cfg(test)]
pub use records::FieldValues;
