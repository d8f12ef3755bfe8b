use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::errors::{DatabaseError, Result};
use crate::models::{Dog, HealthRecord, PedigreeEntry};

/// Load a dog by id.
#[tracing::instrument(skip(pool), fields(dog_id = %dog_id))]
pub async fn load_dog(pool: &PgPool, dog_id: Uuid) -> Result<Dog> {
    let dog = sqlx::query_as::<_, Dog>(
        r#"
        SELECT
            id,
            owner_id,
            registered_name,
            call_name,
            breed,
            sex,
            dob,
            registration_number,
            trust_score,
            created_at,
            updated_at
        FROM dogs
        WHERE id = $1
        "#,
    )
    .bind(dog_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DatabaseError::NotFound(format!("dog not found: {}", dog_id)),
        _ => DatabaseError::QueryError(e),
    })?;

    Ok(dog)
}

/// Load all health records for a dog, newest first.
#[tracing::instrument(skip(pool), fields(dog_id = %dog_id))]
pub async fn load_health_records(pool: &PgPool, dog_id: Uuid) -> Result<Vec<HealthRecord>> {
    let records = sqlx::query_as::<_, HealthRecord>(
        r#"
        SELECT
            id,
            dog_id,
            test_type,
            result,
            test_date,
            verified,
            source,
            document_url,
            created_at,
            updated_at
        FROM health_records
        WHERE dog_id = $1
        ORDER BY test_date DESC, updated_at DESC
        "#,
    )
    .bind(dog_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    debug!("Loaded {} health records for dog {}", records.len(), dog_id);
    Ok(records)
}

/// Load the pedigree entries for a dog (at most one per position).
#[tracing::instrument(skip(pool), fields(dog_id = %dog_id))]
pub async fn load_pedigree_entries(pool: &PgPool, dog_id: Uuid) -> Result<Vec<PedigreeEntry>> {
    let entries = sqlx::query_as::<_, PedigreeEntry>(
        r#"
        SELECT
            id,
            dog_id,
            position,
            ancestor_name,
            ancestor_registration,
            source,
            created_at,
            updated_at
        FROM pedigree_entries
        WHERE dog_id = $1
        ORDER BY position
        "#,
    )
    .bind(dog_id)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    debug!("Loaded {} pedigree entries for dog {}", entries.len(), dog_id);
    Ok(entries)
}
