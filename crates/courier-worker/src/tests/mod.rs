//! Behavioural suites for the dispatch engine.

mod answer_behaviour;
mod support;
