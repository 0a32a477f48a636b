//! Repository tests for the catalog, rosters and manager assignments.

use chrono::{NaiveDate, NaiveTime};
use eventhub_db::models::catalog::{CreateCategory, CreateEvent, CreateSubcategory};
use eventhub_db::models::user::CreateUser;
use eventhub_db::repositories::{
    CategoryRepo, EventRepo, ManagerAssignmentRepo, RegistrationRepo, SubcategoryRepo, UserRepo,
};
use sqlx::{Connection, PgPool};

fn new_event(title: &str, subcategory_id: Option<i64>) -> CreateEvent {
    CreateEvent {
        subcategory_id,
        title: title.to_string(),
        description: None,
        venue: None,
        event_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        max_participants: None,
        category_tag: None,
    }
}

fn new_user(email: &str, role: &str) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        full_name: email.to_string(),
        college: String::new(),
        college_id: String::new(),
        role: role.to_string(),
        is_approved: true,
        payment_status: "approved".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sequence_ids_are_per_owning_list(pool: PgPool) {
    let tech = CategoryRepo::create(&pool, &CreateCategory { name: " Technical ".into() })
        .await
        .unwrap();
    assert_eq!(tech.name, "Technical");
    let coding = SubcategoryRepo::create(&pool, tech.id, &CreateSubcategory { name: "Coding".into() })
        .await
        .unwrap();

    let a = EventRepo::create(&pool, tech.id, &new_event("A", None)).await.unwrap();
    let b = EventRepo::create(&pool, tech.id, &new_event("B", Some(coding.id))).await.unwrap();
    let c = EventRepo::create(&pool, tech.id, &new_event("C", None)).await.unwrap();
    assert_eq!((a.seq_id, b.seq_id, c.seq_id), (1, 1, 2));
    assert_eq!(a.max_participants, 100);
    assert_eq!(a.category_tag, "technical");

    let found = EventRepo::find_in_list(&pool, tech.id, Some(coding.id), 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, b.id);
    let direct = EventRepo::find_in_list(&pool, tech.id, None, 1).await.unwrap().unwrap();
    assert_eq!(direct.id, a.id);

    // Deleting the last event frees its sequence id for the next one.
    assert!(EventRepo::delete(&pool, c.id).await.unwrap());
    let d = EventRepo::create(&pool, tech.id, &new_event("D", None)).await.unwrap();
    assert_eq!(d.seq_id, 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn catalog_trees_nest_events_under_their_lists(pool: PgPool) {
    let tech = CategoryRepo::create(&pool, &CreateCategory { name: "Technical".into() })
        .await
        .unwrap();
    let coding = SubcategoryRepo::create(&pool, tech.id, &CreateSubcategory { name: "Coding".into() })
        .await
        .unwrap();
    let quiz = EventRepo::create(&pool, tech.id, &new_event("Quiz", None)).await.unwrap();
    EventRepo::create(&pool, tech.id, &new_event("Golf", Some(coding.id))).await.unwrap();
    let user = UserRepo::create(&pool, &new_user("p@x.org", "student")).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    let mut tx = conn.begin().await.unwrap();
    RegistrationRepo::insert(&mut tx, quiz.id, user.id).await.unwrap();
    tx.commit().await.unwrap();

    let trees = CategoryRepo::load_trees(&pool, vec![tech]).await.unwrap();
    assert_eq!(trees.len(), 1);
    assert_eq!(trees[0].events.len(), 1);
    assert_eq!(trees[0].events[0].registered_count, 1);
    assert_eq!(trees[0].subcategories[0].events[0].event.title, "Golf");
    assert_eq!(trees[0].subcategories[0].events[0].registered_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn roster_rows_are_unique_and_removable(pool: PgPool) {
    let tech = CategoryRepo::create(&pool, &CreateCategory { name: "Technical".into() })
        .await
        .unwrap();
    let quiz = EventRepo::create(&pool, tech.id, &new_event("Quiz", None)).await.unwrap();
    let user = UserRepo::create(&pool, &new_user("p@x.org", "student")).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    RegistrationRepo::insert(&mut conn, quiz.id, user.id).await.unwrap();
    assert!(RegistrationRepo::insert(&mut conn, quiz.id, user.id).await.is_err());

    assert!(RegistrationRepo::is_registered(&pool, quiz.id, user.id).await.unwrap());
    assert_eq!(RegistrationRepo::count_for_event(&pool, quiz.id).await.unwrap(), 1);
    assert_eq!(RegistrationRepo::roster(&pool, quiz.id).await.unwrap(), vec![user.id]);

    let booked = RegistrationRepo::list_for_user(&pool, user.id).await.unwrap();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].title, "Quiz");

    assert!(RegistrationRepo::delete(&pool, quiz.id, user.id).await.unwrap().is_some());
    assert!(RegistrationRepo::delete(&pool, quiz.id, user.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assignment_upsert_is_idempotent_and_scope_exact(pool: PgPool) {
    let tech = CategoryRepo::create(&pool, &CreateCategory { name: "Technical".into() })
        .await
        .unwrap();
    let coding = SubcategoryRepo::create(&pool, tech.id, &CreateSubcategory { name: "Coding".into() })
        .await
        .unwrap();
    let quiz = EventRepo::create(&pool, tech.id, &new_event("Quiz", None)).await.unwrap();
    let manager = UserRepo::create(&pool, &new_user("m@x.org", "manager")).await.unwrap();

    let first = ManagerAssignmentRepo::upsert(&pool, manager.id, tech.id, None, quiz.id)
        .await
        .unwrap();
    let second = ManagerAssignmentRepo::upsert(&pool, manager.id, tech.id, None, quiz.id)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    assert!(ManagerAssignmentRepo::exists(&pool, manager.id, tech.id, None, quiz.id)
        .await
        .unwrap());
    assert!(!ManagerAssignmentRepo::exists(&pool, manager.id, tech.id, Some(coding.id), quiz.id)
        .await
        .unwrap());

    let mine = ManagerAssignmentRepo::list_for_manager(&pool, manager.id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].event_title, "Quiz");
    assert_eq!(mine[0].event_seq_id, 1);

    assert!(ManagerAssignmentRepo::delete(&pool, first.id).await.unwrap());
    assert!(ManagerAssignmentRepo::list_all(&pool).await.unwrap().is_empty());
}
