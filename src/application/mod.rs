// Application layer - Use cases over the repository seam
pub mod admin_service;
pub mod aggregator;
pub mod broadcaster;
pub mod clock;
pub mod consumption_repository;
pub mod dashboard_service;
pub mod ingest_service;
pub mod rate_service;
pub mod sample_producer;
