use chrono::NaiveDate;
use conference_core::db::open_db_in_memory;
use conference_core::{
    ApiErrorKind, AuthUser, ConferenceApi, ConferenceForm, ConferenceKey, ConferenceQuery,
    InMemoryCache, ProfileForm, SqliteTaskOutbox, RECENT_ANNOUNCEMENTS_KEY,
};
use std::time::Duration;

#[test]
fn identity_is_required_for_caller_scoped_operations() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);

    let errors = [
        api.save_profile(None, &ProfileForm::default()).unwrap_err(),
        api.get_profile(None).unwrap_err(),
        api.create_conference(None, &form("RustConf", 5)).unwrap_err(),
        api.get_conferences_created(None).unwrap_err(),
        api.register_for_conference(None, "anything").unwrap_err(),
        api.unregister_from_conference(None, "anything").unwrap_err(),
        api.get_conferences_to_attend(None).unwrap_err(),
    ];
    for err in errors {
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
        assert_eq!(err.reason, "Authorization required");
    }
}

#[test]
fn blank_user_id_is_unauthorized_and_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);

    for user_id in ["", "  "] {
        let user = AuthUser::new(user_id, "e@example.com");
        let err = api
            .create_conference(Some(&user), &form("Nameless", 5))
            .unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);

        let err = api.save_profile(Some(&user), &ProfileForm::default()).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Unauthorized);
    }
    assert!(api
        .query_conferences(&ConferenceQuery::default())
        .unwrap()
        .is_empty());
}

#[test]
fn save_profile_derives_display_name_from_email() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let user = AuthUser::new("a-id", "a@example.com");

    assert!(api.get_profile(Some(&user)).unwrap().is_none());
    let profile = api.save_profile(Some(&user), &ProfileForm::default()).unwrap();
    assert_eq!(profile.display_name, "a");
    assert_eq!(api.get_profile(Some(&user)).unwrap(), Some(profile));
}

#[test]
fn registration_flow_maps_outcomes_to_errors() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let organizer = AuthUser::new("org", "org@example.com");
    let x = AuthUser::new("x", "x@example.com");
    let y = AuthUser::new("y", "y@example.com");

    let conference = api
        .create_conference(Some(&organizer), &form("Tiny Conf", 1))
        .unwrap();
    let key = conference.key.to_websafe();

    assert!(api.register_for_conference(Some(&x), &key).unwrap().success);

    let err = api.register_for_conference(Some(&x), &key).unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Conflict);
    assert_eq!(err.reason, "You have already registered");

    let err = api.register_for_conference(Some(&y), &key).unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Conflict);
    assert_eq!(err.reason, "There are no seats available");

    let err = api.unregister_from_conference(Some(&y), &key).unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Conflict);
    assert_eq!(err.reason, "You are not registered");

    assert!(api.unregister_from_conference(Some(&x), &key).unwrap().success);
    assert_eq!(api.get_conference(&key).unwrap().seats_available, 1);
}

#[test]
fn unknown_and_malformed_keys_read_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let x = AuthUser::new("x", "x@example.com");

    let missing = ConferenceKey::new("nobody", 1).to_websafe();
    for key in [missing.as_str(), "not a key!", ""] {
        let err = api.register_for_conference(Some(&x), key).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert!(err.reason.starts_with("No Conference found with key"));

        let err = api.unregister_from_conference(Some(&x), key).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);

        let err = api.get_conference(key).unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
    }
}

#[test]
fn invalid_form_is_a_bad_request() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let organizer = AuthUser::new("org", "org@example.com");

    let err = api
        .create_conference(Some(&organizer), &form("", 10))
        .unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::BadRequest);
}

#[test]
fn conferences_to_attend_follow_registration_order() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let organizer = AuthUser::new("org", "org@example.com");
    let x = AuthUser::new("x", "x@example.com");

    let err = api.get_conferences_to_attend(Some(&x)).unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::NotFound);

    let alpha = api.create_conference(Some(&organizer), &form("Alpha", 5)).unwrap();
    let beta = api.create_conference(Some(&organizer), &form("Beta", 5)).unwrap();
    api.register_for_conference(Some(&x), &beta.key.to_websafe())
        .unwrap();
    api.register_for_conference(Some(&x), &alpha.key.to_websafe())
        .unwrap();

    let names: Vec<String> = api
        .get_conferences_to_attend(Some(&x))
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Beta".to_string(), "Alpha".to_string()]);

    let created: Vec<String> = api
        .get_conferences_created(Some(&organizer))
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(created, vec!["Alpha".to_string(), "Beta".to_string()]);

    let queried = api.query_conferences(&ConferenceQuery::default()).unwrap();
    assert_eq!(queried.len(), 2);
}

#[test]
fn announcement_is_read_from_cache() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);

    assert!(api.get_announcement().is_none());

    cache.put(
        RECENT_ANNOUNCEMENTS_KEY,
        "Last chance to attend! Tiny Conf",
        Some(Duration::from_secs(60)),
    );
    let announcement = api.get_announcement().unwrap();
    assert_eq!(announcement.message, "Last chance to attend! Tiny Conf");
}

#[test]
fn conference_serializes_with_websafe_key() {
    let conn = open_db_in_memory().unwrap();
    let cache = InMemoryCache::new();
    let outbox = SqliteTaskOutbox::new(&conn);
    let api = ConferenceApi::new(&conn, &cache, &outbox);
    let organizer = AuthUser::new("org", "org@example.com");

    let conference = api
        .create_conference(Some(&organizer), &form("RustConf", 5))
        .unwrap();
    let json = serde_json::to_value(&conference).unwrap();
    assert_eq!(json["websafeKey"], conference.key.to_websafe());
    assert_eq!(json["seatsAvailable"], 5);
    assert_eq!(json["organizerDisplayName"], "org");
}

fn form(name: &str, max_attendees: u32) -> ConferenceForm {
    ConferenceForm {
        name: name.to_string(),
        city: Some("London".to_string()),
        start_date: NaiveDate::from_ymd_opt(2026, 3, 2),
        end_date: NaiveDate::from_ymd_opt(2026, 3, 3),
        max_attendees,
        ..ConferenceForm::default()
    }
}
