//! Input records handed over by the external scanner and analyzer.

mod types;

pub use types::{
    DependencyAnalysis, DependencyPlanItem, Language, PlanCommand, ScanInput, StackDetection,
};
