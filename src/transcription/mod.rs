mod client;

pub use client::{Ingestion, SubmitOutcome, TranscriptionClient};
