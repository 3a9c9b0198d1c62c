pub(crate) mod ingest_service;

// Re-export the public interface
pub use ingest_service::IngestService;
