use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, Default)]
pub struct MemoryGroupRepo;

impl MemoryGroupRepo {
    pub fn new() -> Self {
        MemoryGroupRepo
    }
}

fn store_err(e: anyhow::Error) -> RelationError {
    RelationError::Store(e.to_string())
}

#[async_trait::async_trait]
impl GroupRepo for MemoryGroupRepo {
    async fn group_of_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
    ) -> Result<Option<GroupId>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.members.get(&student).map(|m| m.group_id))
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Option<GroupRecord>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.groups.get(&group_id).cloned())
    }

    async fn list_members_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<Vec<GroupMember>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let mut members: Vec<GroupMember> = state
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.joined_at, m.student_id));

        Ok(members)
    }

    async fn insert_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group: &GroupRecord,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        state.groups.insert(group.group_id, group.clone());
        Ok(())
    }

    async fn insert_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        member: &GroupMember,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;

        if !state.groups.contains_key(&member.group_id) {
            return Err(RelationError::GroupNotFound);
        }
        // mirrors uq_member_student
        if state.members.contains_key(&member.student_id) {
            return Err(RelationError::AlreadyInGroup);
        }
        state.members.insert(member.student_id, member.clone());

        Ok(())
    }

    async fn delete_member_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        match state.members.get(&student) {
            Some(m) if m.group_id == group_id => {
                state.members.remove(&student);
                Ok(())
            }
            _ => Err(RelationError::NotMember),
        }
    }

    async fn delete_group_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        // ON DELETE CASCADE
        state.members.retain(|_, m| m.group_id != group_id);
        state.groups.remove(&group_id);
        Ok(())
    }

    async fn set_locked_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        is_locked: bool,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or(RelationError::GroupNotFound)?;
        group.is_locked = is_locked;
        Ok(())
    }

    async fn update_project_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        project_name: &str,
        description: Option<&str>,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        let group = state
            .groups
            .get_mut(&group_id)
            .ok_or(RelationError::GroupNotFound)?;
        group.project_name = Some(project_name.to_string());
        group.description = description.map(str::to_string);
        Ok(())
    }

    async fn set_visibility_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        group_id: GroupId,
        student: StudentId,
        show_group_on_profile: bool,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        match state.members.get_mut(&student) {
            Some(m) if m.group_id == group_id => {
                m.show_group_on_profile = show_group_on_profile;
                Ok(())
            }
            _ => Err(RelationError::NotMember),
        }
    }
}
