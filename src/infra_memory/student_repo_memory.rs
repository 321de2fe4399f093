use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, Default)]
pub struct MemoryStudentRepo;

impl MemoryStudentRepo {
    pub fn new() -> Self {
        MemoryStudentRepo
    }
}

fn store_err(e: anyhow::Error) -> RelationError {
    RelationError::Store(e.to_string())
}

#[async_trait::async_trait]
impl StudentRepo for MemoryStudentRepo {
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: &Student,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?;

        let user_taken = state
            .students
            .values()
            .any(|s| s.user_id == student.user_id);
        if user_taken || state.students.contains_key(&student.student_id) {
            return Err(RelationError::Store(format!(
                "duplicate student {}",
                student.student_id
            )));
        }
        state.students.insert(student.student_id, student.clone());

        Ok(())
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student_id: StudentId,
    ) -> Result<Option<Student>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.students.get(&student_id).cloned())
    }

    async fn get_by_user_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        user_id: UserId,
    ) -> Result<Option<Student>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state
            .students
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn list_matchable_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        exclude: StudentId,
        availability: Option<Availability>,
        page_size: PageSize,
        after: Option<StudentCursor>,
    ) -> Result<Vec<Student>, RelationError> {
        let state = downcast(tx).map_err(store_err)?;

        let mut rows: Vec<&Student> = state
            .students
            .values()
            .filter(|s| s.student_id != exclude && s.is_active() && s.is_matchable())
            .filter(|s| availability.is_none_or(|a| s.availability == a))
            .filter(|s| match &after {
                Some(cur) => (&s.name, s.student_id) > (&cur.name, cur.student_id),
                None => true,
            })
            .collect();
        rows.sort_by(|a, b| (&a.name, a.student_id).cmp(&(&b.name, b.student_id)));

        Ok(rows
            .into_iter()
            .take(page_size.limit())
            .cloned()
            .collect())
    }
}
