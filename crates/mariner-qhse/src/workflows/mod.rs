pub mod compatibility;
pub mod documents;
pub mod kpi;
