use fotoai_core::ports::{NewProcessingResult, ResultStore};
use fotoai_db::adapters::PgStore;
use fotoai_db::models::user::CreateUser;
use fotoai_db::repositories::{ProcessedImageRepo, UserRepo};
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    UserRepo::create(
        pool,
        &CreateUser {
            id,
            email: format!("{id}@example.com"),
            name: "Test".to_string(),
            remaining_images: 10,
        },
    )
    .await
    .unwrap();
    id
}

fn result_for(user_id: Uuid, path: &str) -> NewProcessingResult {
    NewProcessingResult {
        user_id,
        project_id: Some(Uuid::new_v4()),
        processed_file_path: path.to_string(),
        processing_type: "alimentos".to_string(),
        model_used: "fal-ai/flux-pro/kontext/max".to_string(),
        source_image_path: format!("{user_id}/source.jpg"),
        prompt_used: "Enhance".to_string(),
        processing_parameters: serde_json::json!({ "strength": 0.35 }),
        processing_time_ms: 1234,
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn insert_round_trips_through_the_repo(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let store = PgStore::new(pool.clone());

    let record = store
        .insert(&result_for(user_id, &format!("{user_id}/a.png")))
        .await
        .unwrap();

    let row = ProcessedImageRepo::find_by_id(&pool, record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.user_id, user_id);
    assert_eq!(row.processing_type, "alimentos");
    assert_eq!(row.processing_parameters["strength"], 0.35);
    assert_eq!(row.processing_time_ms, 1234);
}

#[sqlx::test(migrations = "./migrations")]
async fn rows_are_immutable(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let store = PgStore::new(pool.clone());
    let record = store
        .insert(&result_for(user_id, &format!("{user_id}/b.png")))
        .await
        .unwrap();

    let result = sqlx::query("UPDATE processed_images SET prompt_used = 'x' WHERE id = $1")
        .bind(record.id)
        .execute(&pool)
        .await;
    assert!(result.is_err(), "updates must be rejected");
}

#[sqlx::test(migrations = "./migrations")]
async fn referenced_paths_filters_unknown_paths(pool: PgPool) {
    let user_id = seed_user(&pool).await;
    let store = PgStore::new(pool.clone());
    let kept = format!("{user_id}/kept.png");
    store.insert(&result_for(user_id, &kept)).await.unwrap();

    let referenced = ProcessedImageRepo::referenced_paths(
        &pool,
        &[kept.clone(), format!("{user_id}/orphan.png")],
    )
    .await
    .unwrap();

    assert_eq!(referenced, vec![kept]);
    assert!(ProcessedImageRepo::referenced_paths(&pool, &[])
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        ProcessedImageRepo::list_by_user(&pool, user_id).await.unwrap().len(),
        1
    );
}
