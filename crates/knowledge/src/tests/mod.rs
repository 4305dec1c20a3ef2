//! Cross-module scenarios with scripted model replies and recording backends.

mod orchestrator_rounds;
mod support;
