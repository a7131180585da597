// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail address parsing and group fan-out.
//!
//! Group addresses are resolved against currently-active sessions at send
//! time and are never persisted. The sender is always excluded from its own
//! broadcast.

use ovs_core::{AgentSession, Capability};

use crate::{EngineError, Result};

/// A parsed `to:` address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Agent(String),
    Group(GroupAddress),
}

/// Membership predicate behind each `@<group>` address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupAddress {
    /// Every active session.
    All,
    /// Active sessions with a non-persistent capability.
    Workers,
    /// Active sessions of one capability.
    Capability(Capability),
}

impl Address {
    pub fn parse(to: &str) -> Result<Self> {
        let Some(group) = to.strip_prefix('@') else {
            return Ok(Self::Agent(to.to_string()));
        };
        match group {
            "all" => Ok(Self::Group(GroupAddress::All)),
            "workers" => Ok(Self::Group(GroupAddress::Workers)),
            other => match other.parse::<Capability>() {
                Ok(capability) => Ok(Self::Group(GroupAddress::Capability(capability))),
                Err(_) => Err(EngineError::UnknownGroup(to.to_string())),
            },
        }
    }
}

impl GroupAddress {
    /// Resolve to recipient names among `active`, excluding `sender`.
    pub fn resolve(&self, active: &[AgentSession], sender: &str) -> Vec<String> {
        active
            .iter()
            .filter(|s| s.agent_name != sender)
            .filter(|s| match self {
                Self::All => true,
                Self::Workers => !s.capability.is_persistent(),
                Self::Capability(capability) => s.capability == *capability,
            })
            .map(|s| s.agent_name.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
