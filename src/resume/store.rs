//! Owner-scoped resume storage

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::types::{Payload, Resume, ResumeId};
use crate::account::AccountId;
use crate::error::ServiceError;

/// Every lookup is keyed on (owner, id). A resume that belongs to someone
/// else is reported exactly like one that does not exist.
pub struct ResumeStore {
    resumes: BTreeMap<ResumeId, Resume>,
    next_id: ResumeId,
}

impl ResumeStore {
    pub fn new() -> Self {
        Self {
            resumes: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn create(&mut self, owner: AccountId, payload: Payload) -> Resume {
        self.create_at(owner, payload, Utc::now())
    }

    pub fn create_at(&mut self, owner: AccountId, payload: Payload, now: DateTime<Utc>) -> Resume {
        let id = self.next_id;
        self.next_id += 1;

        let resume = Resume {
            id,
            owner,
            payload,
            created_at: now,
            updated_at: now,
        };
        self.resumes.insert(id, resume.clone());
        resume
    }

    /// All resumes of one owner, oldest first
    pub fn list_for(&self, owner: AccountId) -> Vec<Resume> {
        self.resumes
            .values()
            .filter(|r| r.owner == owner)
            .cloned()
            .collect()
    }

    pub fn get(&self, owner: AccountId, id: ResumeId) -> Option<&Resume> {
        self.resumes.get(&id).filter(|r| r.owner == owner)
    }

    pub fn update(
        &mut self,
        owner: AccountId,
        id: ResumeId,
        patch: Payload,
    ) -> Result<Resume, ServiceError> {
        self.update_at(owner, id, patch, Utc::now())
    }

    /// Shallow merge: top-level keys in `patch` replace the stored ones,
    /// everything else is kept.
    pub fn update_at(
        &mut self,
        owner: AccountId,
        id: ResumeId,
        patch: Payload,
        now: DateTime<Utc>,
    ) -> Result<Resume, ServiceError> {
        let resume = self
            .resumes
            .get_mut(&id)
            .filter(|r| r.owner == owner)
            .ok_or(ServiceError::NotFound("Resume"))?;

        resume.payload.extend(patch);
        resume.updated_at = now;
        Ok(resume.clone())
    }

    pub fn remove(&mut self, owner: AccountId, id: ResumeId) -> Result<(), ServiceError> {
        if self.get(owner, id).is_none() {
            return Err(ServiceError::NotFound("Resume"));
        }
        self.resumes.remove(&id);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resumes.is_empty()
    }
}

impl Default for ResumeStore {
    fn default() -> Self {
        Self::new()
    }
}
