use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RealGroupService {
    group_repo: Arc<dyn GroupRepo>,
    tx_manager: Arc<dyn TxManager>,
    policy: GroupPolicy,
}

impl RealGroupService {
    pub fn new(
        group_repo: Arc<dyn GroupRepo>,
        tx_manager: Arc<dyn TxManager>,
        policy: GroupPolicy,
    ) -> Self {
        Self {
            group_repo,
            tx_manager,
            policy,
        }
    }

    async fn load_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<FypGroup, RelationError> {
        let record = self
            .group_repo
            .get_for_update_in_tx(tx, group_id)
            .await?
            .ok_or(RelationError::GroupNotFound)?;
        let members = self.group_repo.list_members_in_tx(tx, group_id).await?;
        Ok(FypGroup::from_parts(record, members))
    }

    async fn group_of_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
    ) -> Result<Option<FypGroup>, RelationError> {
        match self.group_repo.group_of_in_tx(tx, student).await? {
            Some(group_id) => Ok(Some(self.load_in_tx(tx, group_id).await?)),
            None => Ok(None),
        }
    }

    async fn create_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: StudentId,
        b: StudentId,
    ) -> Result<GroupId, RelationError> {
        if self.policy.max_members < 2 {
            return Err(RelationError::GroupFull);
        }

        let now = Utc::now();
        let record = GroupRecord {
            group_id: GroupId(Uuid::new_v4()),
            project_name: None,
            description: None,
            is_locked: self.policy.is_full(2),
            created_at: now,
        };

        // order matters: group -> members
        self.group_repo.insert_group_in_tx(tx, &record).await?;
        for student_id in [a, b] {
            let member = GroupMember {
                group_id: record.group_id,
                student_id,
                show_group_on_profile: true,
                joined_at: now,
            };
            self.group_repo.insert_member_in_tx(tx, &member).await?;
        }

        tracing::info!(group = %record.group_id, %a, %b, "group formed");
        Ok(record.group_id)
    }

    async fn join_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
    ) -> Result<GroupId, RelationError> {
        let group = self.load_in_tx(tx, group_id).await?;
        if group.is_locked {
            return Err(RelationError::GroupLocked);
        }
        let new_count = group.member_count() + 1;
        if new_count > self.policy.max_members {
            return Err(RelationError::GroupFull);
        }

        let member = GroupMember {
            group_id,
            student_id: student,
            show_group_on_profile: true,
            joined_at: Utc::now(),
        };
        self.group_repo.insert_member_in_tx(tx, &member).await?;
        if self.policy.is_full(new_count) {
            self.group_repo.set_locked_in_tx(tx, group_id, true).await?;
        }

        tracing::info!(group = %group_id, %student, members = new_count, "group extended");
        Ok(group_id)
    }
}

#[async_trait::async_trait]
impl GroupFormation for RealGroupService {
    async fn check_partner_request_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        from: StudentId,
        to: StudentId,
    ) -> Result<(), RelationError> {
        let from_group = self.group_of_in_tx(tx, from).await?;
        let to_group = self.group_of_in_tx(tx, to).await?;

        if [&from_group, &to_group]
            .into_iter()
            .flatten()
            .any(|g| g.is_locked)
        {
            return Err(RelationError::GroupLocked);
        }

        match (from_group, to_group) {
            (None, None) => Ok(()),
            (Some(x), Some(y)) if x.group_id == y.group_id => Err(RelationError::AlreadyGroupmates),
            (Some(_), Some(_)) => Err(RelationError::GroupsCannotMerge),
            (Some(g), None) | (None, Some(g)) => {
                if self.policy.is_full(g.member_count()) {
                    Err(RelationError::GroupFull)
                } else {
                    Ok(())
                }
            }
        }
    }

    async fn merge_on_partner_accept_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        a: StudentId,
        b: StudentId,
    ) -> Result<GroupId, RelationError> {
        let group_a = self.group_repo.group_of_in_tx(tx, a).await?;
        let group_b = self.group_repo.group_of_in_tx(tx, b).await?;

        match (group_a, group_b) {
            (None, None) => self.create_in_tx(tx, a, b).await,
            // already together; nothing to change
            (Some(x), Some(y)) if x == y => Ok(x),
            (Some(_), Some(_)) => Err(RelationError::GroupsCannotMerge),
            (Some(g), None) => self.join_in_tx(tx, g, b).await,
            (None, Some(g)) => self.join_in_tx(tx, g, a).await,
        }
    }
}

#[async_trait::async_trait]
impl GroupService for RealGroupService {
    async fn my_group(&self, student: StudentId) -> Result<Option<FypGroup>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let group = self.group_of_in_tx(&mut *tx, student).await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(group)
    }

    async fn lock_group(&self, student: StudentId) -> Result<FypGroup, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        // only a current member may lock
        let mut group = self
            .group_of_in_tx(&mut *tx, student)
            .await?
            .ok_or(RelationError::NotMember)?;
        if !group.is_locked {
            self.group_repo
                .set_locked_in_tx(&mut *tx, group.group_id, true)
                .await?;
            group.is_locked = true;
        }

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        tracing::info!(group = %group.group_id, by = %student, "group locked");
        Ok(group)
    }

    async fn remove_member(
        &self,
        acting: StudentId,
        target: StudentId,
    ) -> Result<Option<FypGroup>, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let group = self
            .group_of_in_tx(&mut *tx, target)
            .await?
            .ok_or(RelationError::GroupNotFound)?;
        if !group.has_member(acting) {
            return Err(RelationError::NotMember);
        }

        self.group_repo
            .delete_member_in_tx(&mut *tx, group.group_id, target)
            .await?;

        let remaining = group.member_count() - 1;
        let result = if remaining == 0 {
            self.group_repo
                .delete_group_in_tx(&mut *tx, group.group_id)
                .await?;
            None
        } else {
            if group.is_locked && self.policy.unlock_on_removal {
                self.group_repo
                    .set_locked_in_tx(&mut *tx, group.group_id, false)
                    .await?;
            }
            Some(self.load_in_tx(&mut *tx, group.group_id).await?)
        };

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        tracing::info!(group = %group.group_id, %acting, %target, remaining, "group member removed");
        Ok(result)
    }

    async fn update_project(
        &self,
        student: StudentId,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<FypGroup, RelationError> {
        let project_name = project_name.trim();
        if project_name.is_empty() {
            return Err(RelationError::InvalidInput("project name must not be blank"));
        }
        if project_name.chars().count() > MAX_PROJECT_NAME_LEN {
            return Err(RelationError::InvalidInput("project name is too long"));
        }
        let description = description.map(str::trim).filter(|d| !d.is_empty());

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let group_id = self
            .group_repo
            .group_of_in_tx(&mut *tx, student)
            .await?
            .ok_or(RelationError::GroupNotFound)?;
        self.group_repo
            .update_project_in_tx(&mut *tx, group_id, project_name, description)
            .await?;
        let group = self.load_in_tx(&mut *tx, group_id).await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(group)
    }

    async fn update_visibility(
        &self,
        student: StudentId,
        show_on_profile: bool,
    ) -> Result<GroupMember, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let group_id = self
            .group_repo
            .group_of_in_tx(&mut *tx, student)
            .await?
            .ok_or(RelationError::GroupNotFound)?;
        self.group_repo
            .set_visibility_in_tx(&mut *tx, group_id, student, show_on_profile)
            .await?;
        let member = self
            .group_repo
            .list_members_in_tx(&mut *tx, group_id)
            .await?
            .into_iter()
            .find(|m| m.student_id == student)
            .ok_or(RelationError::NotMember)?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        Ok(member)
    }
}
