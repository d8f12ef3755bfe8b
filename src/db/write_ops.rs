use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::errors::{DatabaseError, Result};
use crate::models::{HealthRecord, PedigreeEntry, PedigreePosition, SOURCE_BREEDER_UPLOAD};

const HEALTH_RECORD_COLUMNS: &str =
    "id, dog_id, test_type, result, test_date, verified, source, document_url, created_at, updated_at";

/// Upsert the health record behind a breeder document upload.
///
/// A fresh upload never flips `verified`: only an authoritative external
/// check does that. An existing row keeps its verified flag and gets the
/// new document URL and timestamp.
pub async fn upsert_uploaded_health_record(
    tx: &mut Transaction<'_, Postgres>,
    dog_id: Uuid,
    test_type: &str,
    document_url: &str,
) -> Result<HealthRecord> {
    debug!("Upserting uploaded health record for dog {} ({})", dog_id, test_type);

    let record = sqlx::query_as::<_, HealthRecord>(&format!(
        r#"
        INSERT INTO health_records ({HEALTH_RECORD_COLUMNS})
        VALUES ($1, $2, $3, 'Documented', NOW(), FALSE, $4, $5, NOW(), NOW())
        ON CONFLICT (dog_id, test_type)
        DO UPDATE SET
            result = EXCLUDED.result,
            test_date = EXCLUDED.test_date,
            source = EXCLUDED.source,
            document_url = EXCLUDED.document_url,
            updated_at = NOW()
        RETURNING {HEALTH_RECORD_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(dog_id)
    .bind(test_type)
    .bind(SOURCE_BREEDER_UPLOAD)
    .bind(document_url)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Upserted uploaded health record {} ({})", record.id, test_type);
    Ok(record)
}

/// Upsert a health record confirmed by an external verifier. Sets
/// `verified = TRUE` on both insert and update; any previously uploaded
/// document URL is kept.
pub async fn upsert_verified_health_record(
    tx: &mut Transaction<'_, Postgres>,
    dog_id: Uuid,
    test_type: &str,
    result: &str,
    source: &str,
) -> Result<HealthRecord> {
    debug!("Upserting verified health record for dog {} ({})", dog_id, test_type);

    let record = sqlx::query_as::<_, HealthRecord>(&format!(
        r#"
        INSERT INTO health_records ({HEALTH_RECORD_COLUMNS})
        VALUES ($1, $2, $3, $4, NOW(), TRUE, $5, NULL, NOW(), NOW())
        ON CONFLICT (dog_id, test_type)
        DO UPDATE SET
            result = EXCLUDED.result,
            test_date = EXCLUDED.test_date,
            verified = TRUE,
            source = EXCLUDED.source,
            updated_at = NOW()
        RETURNING {HEALTH_RECORD_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(dog_id)
    .bind(test_type)
    .bind(result)
    .bind(source)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Upserted verified health record {} ({})", record.id, test_type);
    Ok(record)
}

/// Upsert the pedigree entry for one position. Overwrites any prior
/// entry for that (dog, position); duplicates are never appended.
pub async fn upsert_pedigree_entry(
    tx: &mut Transaction<'_, Postgres>,
    dog_id: Uuid,
    position: PedigreePosition,
    ancestor_name: &str,
    ancestor_registration: Option<&str>,
    source: &str,
) -> Result<PedigreeEntry> {
    debug!("Upserting {} entry for dog {}", position, dog_id);

    let entry = sqlx::query_as::<_, PedigreeEntry>(
        r#"
        INSERT INTO pedigree_entries
            (id, dog_id, position, ancestor_name, ancestor_registration, source, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
        ON CONFLICT (dog_id, position)
        DO UPDATE SET
            ancestor_name = EXCLUDED.ancestor_name,
            ancestor_registration = EXCLUDED.ancestor_registration,
            source = EXCLUDED.source,
            updated_at = NOW()
        RETURNING id, dog_id, position, ancestor_name, ancestor_registration, source, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(dog_id)
    .bind(position.as_str())
    .bind(ancestor_name)
    .bind(ancestor_registration)
    .bind(source)
    .fetch_one(&mut **tx)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Upserted pedigree entry {} ({})", entry.id, position);
    Ok(entry)
}

/// Write the derived trust score to the dog record. The single writer
/// for `dogs.trust_score`.
#[tracing::instrument(skip(pool), fields(dog_id = %dog_id, score = score))]
pub async fn update_trust_score(pool: &PgPool, dog_id: Uuid, score: i32) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE dogs
        SET trust_score = $2, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(dog_id)
    .bind(score)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound(format!("dog not found: {}", dog_id)));
    }

    info!("Published trust score {} for dog {}", score, dog_id);
    Ok(())
}

/// Refresh the derived flags on litters where this dog is a parent:
/// papers_verified when both parents carry registration numbers,
/// health_checked when both parents have at least one health record.
#[tracing::instrument(skip(pool), fields(dog_id = %dog_id))]
pub async fn refresh_litter_flags(pool: &PgPool, dog_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE litters l
        SET papers_verified = (s.registration_number IS NOT NULL AND d.registration_number IS NOT NULL),
            health_checked = (
                EXISTS (SELECT 1 FROM health_records hr WHERE hr.dog_id = l.sire_id)
                AND EXISTS (SELECT 1 FROM health_records hr WHERE hr.dog_id = l.dam_id)
            ),
            updated_at = NOW()
        FROM dogs s, dogs d
        WHERE s.id = l.sire_id
          AND d.id = l.dam_id
          AND (l.sire_id = $1 OR l.dam_id = $1)
        "#,
    )
    .bind(dog_id)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let updated = result.rows_affected();
    if updated > 0 {
        debug!("Refreshed flags on {} litters for dog {}", updated, dog_id);
    }
    Ok(updated)
}
