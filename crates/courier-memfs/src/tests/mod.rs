//! Behavioural suite for the memfs worker.
