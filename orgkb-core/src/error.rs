// Copyright 2025 OrgKB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error taxonomy for the retrieval pipeline.
//!
//! The parser and query builder are total functions; every failure surface
//! sits at one of the three network boundaries (embedding, structured store,
//! generation). Upstream failures carry the failing stage so callers can
//! name it, and are never substituted with a fabricated answer. A request
//! that simply finds no supporting context is not an error; it is reported
//! as [`crate::ContextSource::None`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The upstream service a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamStage {
    Embedding,
    StructuredStore,
    Generation,
}

impl std::fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UpstreamStage::Embedding => "embedding",
            UpstreamStage::StructuredStore => "structured store",
            UpstreamStage::Generation => "generation",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the retrieval pipeline.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Malformed or empty input, rejected before any network call
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Upstream service unreachable or returned a non-2xx status
    #[error("{stage} request failed: {message}")]
    Upstream {
        stage: UpstreamStage,
        message: String,
    },

    /// Upstream responded 2xx but the body could not be decoded;
    /// classified the same as an upstream failure
    #[error("{stage} returned a malformed response: {message}")]
    Decode {
        stage: UpstreamStage,
        message: String,
    },
}

impl RetrievalError {
    pub fn upstream(stage: UpstreamStage, message: impl Into<String>) -> Self {
        Self::Upstream {
            stage,
            message: message.into(),
        }
    }

    pub fn decode(stage: UpstreamStage, message: impl Into<String>) -> Self {
        Self::Decode {
            stage,
            message: message.into(),
        }
    }

    /// The failing stage, if this error crossed a network boundary.
    pub fn stage(&self) -> Option<UpstreamStage> {
        match self {
            RetrievalError::InvalidInput(_) => None,
            RetrievalError::Upstream { stage, .. } | RetrievalError::Decode { stage, .. } => {
                Some(*stage)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_names_stage() {
        let err = RetrievalError::upstream(UpstreamStage::StructuredStore, "connection refused");
        assert_eq!(err.stage(), Some(UpstreamStage::StructuredStore));
        assert!(err.to_string().contains("structured store"));
    }

    #[test]
    fn input_error_has_no_stage() {
        let err = RetrievalError::InvalidInput("empty question".to_string());
        assert_eq!(err.stage(), None);
    }
}
