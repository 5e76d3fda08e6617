pub mod assembler;
pub mod enrichment;
pub mod harvester;
pub mod orchestrator;
pub mod statistics;

pub use enrichment::{DetailEnricher, EnrichmentSummary};
pub use harvester::{HarvestOutcome, PageHarvester};
pub use orchestrator::{ExportOrchestrator, ExportOutcome, ExportRequest, ExportState, PipelineSettings};
