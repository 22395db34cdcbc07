//! Named chat groups.
//!
//! A group exists only while it has members: [`GroupStore::leave`] deletes
//! the record in the same call that removes its last member. Group names
//! are case-insensitive and stored lower-cased.
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub members: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    NoSuchGroup,
    AlreadyMember,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { group_removed: bool },
    NoSuchGroupOrNotMember,
}

/// The caller is not in the group, or the group does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotMember;

#[derive(Debug, Default)]
pub struct GroupStore {
    groups: HashMap<String, GroupRecord>,
}

impl GroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: &str, creator: &str) -> CreateOutcome {
        let name = normalize_name(name);
        if self.groups.contains_key(&name) {
            return CreateOutcome::AlreadyExists;
        }
        let mut members = BTreeSet::new();
        members.insert(normalize_call(creator));
        self.groups
            .insert(name.clone(), GroupRecord { name, members });
        CreateOutcome::Created
    }

    pub fn join(&mut self, name: &str, caller: &str) -> JoinOutcome {
        match self.groups.get_mut(&normalize_name(name)) {
            None => JoinOutcome::NoSuchGroup,
            Some(group) => {
                if group.members.insert(normalize_call(caller)) {
                    JoinOutcome::Joined
                } else {
                    JoinOutcome::AlreadyMember
                }
            }
        }
    }

    pub fn leave(&mut self, name: &str, caller: &str) -> LeaveOutcome {
        let name = normalize_name(name);
        let Some(group) = self.groups.get_mut(&name) else {
            return LeaveOutcome::NoSuchGroupOrNotMember;
        };
        if !group.members.remove(&normalize_call(caller)) {
            return LeaveOutcome::NoSuchGroupOrNotMember;
        }
        let group_removed = group.members.is_empty();
        if group_removed {
            self.groups.remove(&name);
        }
        LeaveOutcome::Left { group_removed }
    }

    /// Members other than `caller`, in callsign order. Only members may post.
    pub fn broadcast(&self, name: &str, caller: &str) -> Result<Vec<String>, NotMember> {
        let caller = normalize_call(caller);
        let group = self.groups.get(&normalize_name(name)).ok_or(NotMember)?;
        if !group.members.contains(&caller) {
            return Err(NotMember);
        }
        Ok(group
            .members
            .iter()
            .filter(|m| **m != caller)
            .cloned()
            .collect())
    }

    pub fn get(&self, name: &str) -> Option<&GroupRecord> {
        self.groups.get(&normalize_name(name))
    }

    /// Current members in callsign order; empty if the group does not exist.
    pub fn members(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|g| g.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.groups.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_call(callsign: &str) -> String {
    callsign.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut g = GroupStore::new();
        assert_eq!(g.create("Net", "N0CALL"), CreateOutcome::Created);
        assert_eq!(g.create("net", "K2XYZ"), CreateOutcome::AlreadyExists);
        assert_eq!(g.join("NET", "k2xyz"), JoinOutcome::Joined);
        assert_eq!(g.join("net", "K2XYZ"), JoinOutcome::AlreadyMember);
        assert_eq!(g.get("net").map(|r| r.members.len()), Some(2));

        assert_eq!(g.broadcast("net", "N0CALL"), Ok(vec!["K2XYZ".to_string()]));
        assert_eq!(g.broadcast("net", "W1AW"), Err(NotMember));

        assert_eq!(
            g.leave("net", "N0CALL"),
            LeaveOutcome::Left { group_removed: false }
        );
        assert_eq!(
            g.leave("net", "K2XYZ"),
            LeaveOutcome::Left { group_removed: true }
        );
        assert!(!g.exists("net"));
        assert_eq!(g.join("net", "K2XYZ"), JoinOutcome::NoSuchGroup);
    }

    #[test]
    fn leave_by_outsider_or_missing_group() {
        let mut g = GroupStore::new();
        assert_eq!(g.leave("ghost", "A"), LeaveOutcome::NoSuchGroupOrNotMember);
        g.create("club", "A");
        assert_eq!(g.leave("club", "B"), LeaveOutcome::NoSuchGroupOrNotMember);
        assert!(g.exists("club"));
    }
}
