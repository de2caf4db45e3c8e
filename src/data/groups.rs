//! Two-group sample assignment

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};

/// Which side of the comparison a sample falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

/// Assignment of every matrix column to exactly one of two named groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Sample identifiers, in matrix column order
    sample_ids: Vec<String>,
    /// Group of each sample, aligned with `sample_ids`
    groups: Vec<Group>,
    label_a: String,
    label_b: String,
}

/// Partition matrix columns into group A (listed samples) and group B (the rest)
///
/// Membership is a set test, so the order of `group_a_samples` is irrelevant.
/// Listed samples that are not matrix columns are ignored with a warning.
pub fn assign_groups(
    sample_ids: &[String],
    group_a_samples: &BTreeSet<String>,
    label_a: &str,
    label_b: &str,
) -> Result<GroupAssignment> {
    let groups: Vec<Group> = sample_ids
        .iter()
        .map(|id| {
            if group_a_samples.contains(id) {
                Group::A
            } else {
                Group::B
            }
        })
        .collect();

    let unknown: Vec<&str> = group_a_samples
        .iter()
        .filter(|id| !sample_ids.contains(id))
        .map(|s| s.as_str())
        .collect();
    if !unknown.is_empty() {
        log::warn!(
            "Samples listed for group '{}' but absent from the matrix: {:?}",
            label_a,
            unknown
        );
    }

    if !groups.contains(&Group::A) {
        return Err(ReportError::EmptyGroup {
            group: label_a.to_string(),
        });
    }
    if !groups.contains(&Group::B) {
        return Err(ReportError::EmptyGroup {
            group: label_b.to_string(),
        });
    }

    Ok(GroupAssignment {
        sample_ids: sample_ids.to_vec(),
        groups,
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
    })
}

impl GroupAssignment {
    pub fn label_a(&self) -> &str {
        &self.label_a
    }

    pub fn label_b(&self) -> &str {
        &self.label_b
    }

    pub fn label(&self, group: Group) -> &str {
        match group {
            Group::A => &self.label_a,
            Group::B => &self.label_b,
        }
    }

    /// Group label of a sample, if it is a matrix column
    pub fn label_of(&self, sample_id: &str) -> Option<&str> {
        self.sample_ids
            .iter()
            .position(|id| id == sample_id)
            .map(|j| self.label(self.groups[j]))
    }

    /// Sample IDs in `group`, in column order
    pub fn members(&self, group: Group) -> Vec<&str> {
        self.sample_ids
            .iter()
            .zip(self.groups.iter())
            .filter(|(_, &g)| g == group)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Column indices of samples in `group`
    pub fn indices_of(&self, group: Group) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, &g)| g == group)
            .map(|(j, _)| j)
            .collect()
    }

    pub fn group_a(&self) -> Vec<&str> {
        self.members(Group::A)
    }

    pub fn group_b(&self) -> Vec<&str> {
        self.members(Group::B)
    }

    /// Group of each column, aligned with the matrix
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }
}
