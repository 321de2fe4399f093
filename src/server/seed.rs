use crate::application_impl::fake_user_id;
use crate::application_port::RelationError;
use crate::domain_model::*;
use crate::server::Services;
use serde::Deserialize;

/// Seed entry for development runs; the username doubles as the fake-token login.
#[derive(Debug, Deserialize)]
pub struct SeedStudent {
    pub username: String,
    pub name: String,
    pub semester: u8,
    #[serde(default = "default_availability")]
    pub availability: Availability,
    #[serde(default = "default_account_status")]
    pub account_status: AccountStatus,
}

fn default_availability() -> Availability {
    Availability::Available
}

fn default_account_status() -> AccountStatus {
    AccountStatus::Active
}

impl SeedStudent {
    pub fn into_student(self) -> Student {
        let user_id = fake_user_id(&self.username);
        Student {
            student_id: StudentId(uuid::Uuid::new_v5(&user_id.0, b"student")),
            user_id,
            name: self.name,
            semester: self.semester,
            availability: self.availability,
            account_status: self.account_status,
        }
    }
}

pub fn parse_seed(json: &str) -> anyhow::Result<Vec<SeedStudent>> {
    Ok(serde_json::from_str(json)?)
}

/// Inserts all students in one transaction.
pub async fn seed_students(services: &Services, students: Vec<SeedStudent>) -> anyhow::Result<usize> {
    let mut tx = services.tx_manager.begin().await?;
    let count = students.len();
    for seed in students {
        let student = seed.into_student();
        services
            .student_repo
            .insert_in_tx(&mut *tx, &student)
            .await
            .map_err(|e: RelationError| anyhow::anyhow!("seed {}: {e}", student.name))?;
    }
    tx.commit().await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_students_resolve_through_their_username() {
        let services = Services::in_memory(GroupPolicy::default());
        let seed = parse_seed(
            r#"[
                { "username": "ayesha", "name": "Ayesha", "semester": 7 },
                { "username": "faraz", "name": "Faraz", "semester": 7, "account_status": "SUSPENDED" }
            ]"#,
        )
        .unwrap();

        assert_eq!(seed_students(&services, seed).await.unwrap(), 2);

        let ayesha = services
            .identity_service
            .resolve(fake_user_id("ayesha"))
            .await
            .unwrap();
        let found = services
            .discovery_service
            .discover(StudentId(uuid::Uuid::nil()), None, PageSize::default(), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].student_id, ayesha);

        assert!(services.identity_service.resolve(fake_user_id("faraz")).await.is_err());
    }
}
