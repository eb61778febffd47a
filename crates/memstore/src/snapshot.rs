// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! JSON snapshot import/export for the in-memory store.
//!
//! Snapshots capture the durable tables only; the signed-in caller and
//! role assignments are session state and are not exported.

use crate::MemoryStore;
use hero_cycle::ports::{ChangeEvent, StoreError};
use hero_cycle_domain::{Cycle, Nomination, Profile, Validation, Winner};
use serde::{Deserialize, Serialize};

/// A serializable snapshot of the store's durable tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// All cycle rows.
    pub cycles: Vec<Cycle>,
    /// All nomination rows.
    pub nominations: Vec<Nomination>,
    /// All validation rows.
    pub validations: Vec<Validation>,
    /// All display profiles.
    pub profiles: Vec<Profile>,
    /// All resolved winners.
    pub winners: Vec<Winner>,
}

impl MemoryStore {
    /// Serializes the durable tables to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the store lock is
    /// poisoned.
    pub fn export_snapshot(&self) -> Result<String, StoreError> {
        let snapshot: StoreSnapshot = {
            let inner = self.lock()?;
            StoreSnapshot {
                cycles: inner.cycles.clone(),
                nominations: inner.nominations.clone(),
                validations: inner.validations.clone(),
                profiles: inner.profiles.clone(),
                winners: inner.winners.clone(),
            }
        };
        serde_json::to_string_pretty(&snapshot)
            .map_err(|err| StoreError::Backend(format!("snapshot serialization failed: {err}")))
    }

    /// Replaces the durable tables with the contents of a snapshot.
    ///
    /// The id counter is advanced past every numeric id suffix found in
    /// the snapshot so that rows created afterwards cannot collide.
    /// Change events are emitted for every table.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be parsed or the store
    /// lock is poisoned.
    pub fn import_snapshot(&self, json: &str) -> Result<(), StoreError> {
        let snapshot: StoreSnapshot = serde_json::from_str(json)
            .map_err(|err| StoreError::Backend(format!("snapshot parse failed: {err}")))?;

        let highest_seq: u64 = snapshot
            .cycles
            .iter()
            .map(|cycle| id_suffix(cycle.cycle_id.value()))
            .chain(
                snapshot
                    .nominations
                    .iter()
                    .map(|nomination| id_suffix(nomination.nomination_id.value())),
            )
            .chain(
                snapshot
                    .validations
                    .iter()
                    .map(|validation| id_suffix(validation.validation_id.value())),
            )
            .max()
            .unwrap_or(0);

        {
            let mut inner = self.lock()?;
            inner.cycles = snapshot.cycles;
            inner.nominations = snapshot.nominations;
            inner.validations = snapshot.validations;
            inner.profiles = snapshot.profiles;
            inner.winners = snapshot.winners;
            inner.seq = inner.seq.max(highest_seq);
        }

        self.notify(ChangeEvent::Cycles);
        self.notify(ChangeEvent::Nominations);
        self.notify(ChangeEvent::Validations);
        Ok(())
    }
}

/// Parses the numeric suffix of an id like `nom-42`, or 0.
fn id_suffix(id: &str) -> u64 {
    id.rsplit('-')
        .next()
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(0)
}
