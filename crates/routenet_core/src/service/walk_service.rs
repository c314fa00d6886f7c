//! Walk-of-interest command handling.
//!
//! # Responsibility
//! - Accept `RegisterWalkOfInterest` commands from callers.
//! - Validate them against one committed graph snapshot.
//!
//! # Invariants
//! - Never mutates the graph store.
//! - One snapshot per command; later commits do not affect a running command.

use crate::model::element::ElementId;
use crate::store::GraphStore;
use crate::walk::{build_walk, WalkError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of the asset/route association being registered.
pub type InterestId = Uuid;

/// Request to register an interest along an ordered list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWalkOfInterest {
    pub interest_id: InterestId,
    pub reference_list: Vec<ElementId>,
}

impl RegisterWalkOfInterest {
    pub fn new(interest_id: InterestId, reference_list: Vec<ElementId>) -> Self {
        Self {
            interest_id,
            reference_list,
        }
    }
}

/// Successful registration: the fully expanded node/segment walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWalkOfInterestResult {
    pub interest_id: InterestId,
    pub walk: Vec<ElementId>,
}

/// Read-only command handler for walk registration.
pub struct WalkOfInterestService {
    store: Arc<GraphStore>,
}

impl WalkOfInterestService {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Validates `command` and returns the expanded walk.
    ///
    /// # Errors
    /// - Any [`WalkError`]; the whole command fails, no partial walk.
    pub fn register_walk_of_interest(
        &self,
        command: &RegisterWalkOfInterest,
    ) -> Result<RegisterWalkOfInterestResult, WalkError> {
        let snapshot = self.store.snapshot();

        match build_walk(&snapshot, &command.reference_list) {
            Ok(walk) => {
                info!(
                    "event=walk_register module=service status=ok interest_id={} version={} segments={}",
                    command.interest_id,
                    snapshot.version(),
                    command.reference_list.len()
                );
                Ok(RegisterWalkOfInterestResult {
                    interest_id: command.interest_id,
                    walk: walk.into_ids(),
                })
            }
            Err(err) => {
                warn!(
                    "event=walk_register module=service status=error interest_id={} version={} error={}",
                    command.interest_id,
                    snapshot.version(),
                    err
                );
                Err(err)
            }
        }
    }
}
