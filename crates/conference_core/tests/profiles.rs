use conference_core::db::open_db_in_memory;
use conference_core::{EntityStore, ProfileForm, ProfileService, SqliteEntityStore, TeeShirtSize};

#[test]
fn get_or_create_builds_default_profile_without_saving() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::new(&conn);
    let service = ProfileService::new(store);

    let profile = service.get_or_create("u1", "lemoncake@example.com").unwrap();
    assert_eq!(profile.user_id, "u1");
    assert_eq!(profile.display_name, "lemoncake");
    assert_eq!(profile.main_email, "lemoncake@example.com");
    assert_eq!(profile.tee_shirt_size, TeeShirtSize::NotSpecified);
    assert!(profile.conference_keys_to_attend.is_empty());

    assert!(service.get("u1").unwrap().is_none());
    assert!(store.get_profile("u1").unwrap().is_none());
}

#[test]
fn first_save_creates_profile_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let service = ProfileService::new(SqliteEntityStore::new(&conn));

    let saved = service
        .upsert("u1", "lemoncake@example.com", &ProfileForm::default())
        .unwrap();
    assert_eq!(saved.display_name, "lemoncake");
    assert_eq!(saved.tee_shirt_size, TeeShirtSize::NotSpecified);

    let loaded = service.get("u1").unwrap().unwrap();
    assert_eq!(loaded, saved);
}

#[test]
fn later_saves_only_change_supplied_fields() {
    let conn = open_db_in_memory().unwrap();
    let service = ProfileService::new(SqliteEntityStore::new(&conn));

    service
        .upsert(
            "u1",
            "lemoncake@example.com",
            &ProfileForm {
                display_name: Some("Lemon".to_string()),
                tee_shirt_size: Some(TeeShirtSize::Xl),
            },
        )
        .unwrap();

    let updated = service
        .upsert(
            "u1",
            "other@example.com",
            &ProfileForm {
                display_name: Some("  ".to_string()),
                tee_shirt_size: Some(TeeShirtSize::S),
            },
        )
        .unwrap();

    assert_eq!(updated.display_name, "Lemon");
    assert_eq!(updated.tee_shirt_size, TeeShirtSize::S);
    assert_eq!(updated.main_email, "lemoncake@example.com");
    assert_eq!(service.get("u1").unwrap().unwrap(), updated);
}

#[test]
fn profile_form_reads_camel_case_json() {
    let form: ProfileForm =
        serde_json::from_str(r#"{"displayName":"Lemon","teeShirtSize":"XXL"}"#).unwrap();
    assert_eq!(form.display_name.as_deref(), Some("Lemon"));
    assert_eq!(form.tee_shirt_size, Some(TeeShirtSize::Xxl));

    let empty: ProfileForm = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, ProfileForm::default());
}
