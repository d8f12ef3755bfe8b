//! End-to-end tests against a live Postgres instance.
//!
//! Apply `schema.sql` to a scratch database, point TEST_DATABASE_URL at
//! it and run `cargo test -- --ignored`.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use bluebloodz_scorer::models::{
    AncestorAttribution, DocumentUpload, PedigreeVerification, Session, VerifiedAttribute,
};
use bluebloodz_scorer::reconcile::{
    commit_pedigree_verification, recompute_and_publish, record_health_upload, ReconcileError,
};
use bluebloodz_scorer::registry::TestRegistry;
use bluebloodz_scorer::storage::BlobStore;

struct StubStorage;

#[async_trait]
impl BlobStore for StubStorage {
    async fn upload(
        &self,
        path: &str,
        _bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, ReconcileError> {
        Ok(self.public_url(path))
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://blobs.example/{}", path)
    }
}

async fn test_pool() -> PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for live-store tests");
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to test database")
}

async fn seed_breeder_and_dog(pool: &PgPool, registration: Option<&str>) -> (Session, Uuid) {
    let owner_id = Uuid::new_v4();
    let dog_id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, full_name) VALUES ($1, 'Test Breeder')")
        .bind(owner_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO dogs (id, owner_id, registered_name, breed, registration_number)
         VALUES ($1, $2, 'Atlas vom Hause', 'Cane Corso', $3)",
    )
    .bind(dog_id)
    .bind(owner_id)
    .bind(registration)
    .execute(pool)
    .await
    .unwrap();

    (Session { user_id: owner_id }, dog_id)
}

fn pdf_upload(name: &str) -> DocumentUpload {
    DocumentUpload {
        filename: name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: name.as_bytes().to_vec(),
    }
}

fn verification(external_id: &str, sire: &str) -> PedigreeVerification {
    PedigreeVerification {
        external_id: external_id.to_string(),
        pedigree_number: Some(external_id.to_string()),
        sire: Some(AncestorAttribution {
            name: sire.to_string(),
            registration: Some("NHSB-3011223".to_string()),
        }),
        dam: Some(AncestorAttribution {
            name: "Freya of Amberhill".to_string(),
            registration: None,
        }),
        health_attributes: vec![VerifiedAttribute {
            attribute: "hd_score".to_string(),
            result: "HD-A".to_string(),
        }],
    }
}

async fn trust_score(pool: &PgPool, dog_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT trust_score FROM dogs WHERE id = $1")
        .bind(dog_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn record_count(pool: &PgPool, dog_id: Uuid, test_type: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM health_records WHERE dog_id = $1 AND test_type = $2",
    )
    .bind(dog_id)
    .bind(test_type)
    .fetch_one(pool)
    .await
    .unwrap()
}

#[tokio::test]
#[ignore = "requires a live Postgres with schema.sql applied"]
async fn repeated_uploads_keep_a_single_record_and_publish_the_score() {
    let pool = test_pool().await;
    let registry = TestRegistry::builtin();
    let storage = StubStorage;
    let (session, dog_id) = seed_breeder_and_dog(&pool, None).await;

    let first = record_health_upload(
        &pool,
        &storage,
        &registry,
        &session,
        dog_id,
        "OFA Hips",
        pdf_upload("first.pdf"),
    )
    .await
    .unwrap();

    assert!(!first.verified);
    assert_eq!(first.result, "Documented");
    assert_eq!(first.source, "breeder_upload");
    assert_eq!(trust_score(&pool, dog_id).await, 25);

    // Mark the record verified out of band: a later upload must not
    // clear the flag.
    sqlx::query("UPDATE health_records SET verified = TRUE WHERE id = $1")
        .bind(first.id)
        .execute(&pool)
        .await
        .unwrap();

    let second = record_health_upload(
        &pool,
        &storage,
        &registry,
        &session,
        dog_id,
        "OFA Hips",
        pdf_upload("second.pdf"),
    )
    .await
    .unwrap();

    assert_eq!(record_count(&pool, dog_id, "OFA Hips").await, 1);
    assert_eq!(second.id, first.id);
    assert!(second.verified);
    assert_ne!(second.document_url, first.document_url);
    assert_eq!(trust_score(&pool, dog_id).await, 25);
}

#[tokio::test]
#[ignore = "requires a live Postgres with schema.sql applied"]
async fn upload_by_a_non_owner_is_forbidden() {
    let pool = test_pool().await;
    let registry = TestRegistry::builtin();
    let storage = StubStorage;
    let (_owner, dog_id) = seed_breeder_and_dog(&pool, None).await;
    let stranger = Session {
        user_id: Uuid::new_v4(),
    };

    let err = record_health_upload(
        &pool,
        &storage,
        &registry,
        &stranger,
        dog_id,
        "OFA Hips",
        pdf_upload("report.pdf"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ReconcileError::Forbidden { .. }));
    assert_eq!(record_count(&pool, dog_id, "OFA Hips").await, 0);
}

#[tokio::test]
#[ignore = "requires a live Postgres with schema.sql applied"]
async fn pedigree_commit_writes_both_entries_and_overwrites_on_recommit() {
    let pool = test_pool().await;
    let registry = TestRegistry::builtin();
    let (session, dog_id) = seed_breeder_and_dog(&pool, None).await;

    let outcome = commit_pedigree_verification(
        &pool,
        &registry,
        "kennel-registry",
        &session,
        dog_id,
        verification("NHSB-3155667", "Ch. Bruno vom Keller"),
    )
    .await
    .unwrap();

    assert_eq!(outcome.pedigree_entries.len(), 2);
    assert_eq!(outcome.health_records.len(), 1);
    assert!(outcome.health_records[0].verified);
    assert_eq!(outcome.health_records[0].source, "kennel-registry");
    // sire 20 + dam 20 + hip 25
    assert_eq!(outcome.trust_score, 65);
    assert_eq!(trust_score(&pool, dog_id).await, 65);

    // Re-committing replaces the sire entry instead of appending one.
    commit_pedigree_verification(
        &pool,
        &registry,
        "kennel-registry",
        &session,
        dog_id,
        verification("NHSB-3155667", "Ch. Bruno vom Keller II"),
    )
    .await
    .unwrap();

    let entries = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pedigree_entries WHERE dog_id = $1",
    )
    .bind(dog_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(entries, 2);

    let sire_name = sqlx::query_scalar::<_, String>(
        "SELECT ancestor_name FROM pedigree_entries WHERE dog_id = $1 AND position = 'sire'",
    )
    .bind(dog_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(sire_name, "Ch. Bruno vom Keller II");
}

#[tokio::test]
#[ignore = "requires a live Postgres with schema.sql applied"]
async fn recompute_repairs_a_stale_published_score() {
    let pool = test_pool().await;
    let registry = TestRegistry::builtin();
    let storage = StubStorage;
    let (session, dog_id) = seed_breeder_and_dog(&pool, None).await;

    record_health_upload(
        &pool,
        &storage,
        &registry,
        &session,
        dog_id,
        "Deworming",
        pdf_upload("deworming.pdf"),
    )
    .await
    .unwrap();
    assert_eq!(trust_score(&pool, dog_id).await, 20);

    sqlx::query("UPDATE dogs SET trust_score = 0 WHERE id = $1")
        .bind(dog_id)
        .execute(&pool)
        .await
        .unwrap();

    let score = recompute_and_publish(&pool, &registry, dog_id).await.unwrap();
    assert_eq!(score, 20);
    assert_eq!(trust_score(&pool, dog_id).await, 20);
}

#[tokio::test]
#[ignore = "requires a live Postgres with schema.sql applied"]
async fn reconciliation_refreshes_derived_litter_flags() {
    let pool = test_pool().await;
    let registry = TestRegistry::builtin();
    let storage = StubStorage;

    let (sire_session, sire_id) = seed_breeder_and_dog(&pool, Some("AKC-100001")).await;
    let (dam_session, dam_id) = seed_breeder_and_dog(&pool, Some("AKC-100002")).await;

    let litter_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO litters (id, breeder_id, sire_id, dam_id, breed)
         VALUES ($1, $2, $3, $4, 'Cane Corso')",
    )
    .bind(litter_id)
    .bind(sire_session.user_id)
    .bind(sire_id)
    .bind(dam_id)
    .execute(&pool)
    .await
    .unwrap();

    record_health_upload(
        &pool,
        &storage,
        &registry,
        &sire_session,
        sire_id,
        "Vaccinations",
        pdf_upload("vax.pdf"),
    )
    .await
    .unwrap();

    // Only the sire has records so far.
    let (papers, health) = sqlx::query_as::<_, (bool, bool)>(
        "SELECT papers_verified, health_checked FROM litters WHERE id = $1",
    )
    .bind(litter_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(papers);
    assert!(!health);

    record_health_upload(
        &pool,
        &storage,
        &registry,
        &dam_session,
        dam_id,
        "Vaccinations",
        pdf_upload("vax.pdf"),
    )
    .await
    .unwrap();

    let (papers, health) = sqlx::query_as::<_, (bool, bool)>(
        "SELECT papers_verified, health_checked FROM litters WHERE id = $1",
    )
    .bind(litter_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(papers);
    assert!(health);
}
