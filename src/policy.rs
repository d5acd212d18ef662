use serde::{Deserialize, Serialize};

use crate::error::RejectionReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Any voter may vote for the position from any department.
    Global,
    /// Voters may only vote from the department they are registered in.
    Local,
}

/// Eligibility rule for one election position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPolicy {
    pub name: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_localities: Option<Vec<String>>,
}

impl PositionPolicy {
    pub fn global(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            scope: Scope::Global,
            allowed_localities: None,
        }
    }

    pub fn local(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            scope: Scope::Local,
            allowed_localities: None,
        }
    }

    pub fn allow_localities<I, S>(mut self, localities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_localities = Some(localities.into_iter().map(Into::into).collect());
        self
    }

    /// Checks a vote declared from `department` by a voter registered in
    /// `voter_locality`. Scope is checked before the allow-list.
    pub fn check(
        &self,
        department: &str,
        voter_locality: Option<&str>,
    ) -> Result<(), RejectionReason> {
        if self.scope == Scope::Local && voter_locality != Some(department) {
            return Err(RejectionReason::LocalityMismatch);
        }

        if let Some(allowed) = &self.allowed_localities {
            if !allowed.iter().any(|locality| locality == department) {
                return Err(RejectionReason::DisallowedLocality);
            }
        }

        Ok(())
    }
}
