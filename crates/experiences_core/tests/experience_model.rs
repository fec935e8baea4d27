use experiences_core::{
    Coordinate, Experience, ExperienceParts, MediaKind, MediaRecord, ModelValidationError,
};
use uuid::Uuid;

fn coordinate() -> Coordinate {
    Coordinate::new(40.0, -75.0).unwrap()
}

#[test]
fn experience_new_sets_defaults() {
    let experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);

    assert!(!experience.id().is_nil());
    assert_eq!(experience.title(), Some("Park"));
    assert_eq!(experience.subtitle(), Some("Nice walk"));
    assert_eq!(experience.coordinate(), coordinate());
    assert!(experience.media_list().is_empty());
    assert_eq!(experience.created_at_ms(), 1_000);
    assert_eq!(experience.updated_at_ms(), None);
}

#[test]
fn media_new_leaves_updated_unset() {
    let record = MediaRecord::new(MediaKind::Image, None, Some(b"jpeg".to_vec()), 5);

    assert!(!record.id().is_nil());
    assert_eq!(record.kind(), MediaKind::Image);
    assert_eq!(record.payload(), Some(&b"jpeg"[..]));
    assert_eq!(record.updated_at_ms(), None);
    assert!(record.has_content());
}

#[test]
fn append_media_grows_by_one_and_keeps_order() {
    let mut experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);
    let first = experience.append_media(MediaRecord::new(MediaKind::Audio, None, None, 1_001));
    let second_record = MediaRecord::new(MediaKind::Image, None, Some(b"...".to_vec()), 1_002);
    let second = experience.append_media(second_record.clone());

    assert_eq!(experience.media_list().len(), 2);
    assert_eq!(experience.media_list()[0].id(), first);
    assert_eq!(experience.media_list().last(), Some(&second_record));
    assert_eq!(experience.media(second).map(MediaRecord::kind), Some(MediaKind::Image));
}

#[test]
fn edit_metadata_keeps_coordinate_and_advances_timestamp() {
    let mut experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);

    experience.edit_metadata("Park Revisited", "Even nicer", 2_000);
    assert_eq!(experience.title(), Some("Park Revisited"));
    assert_eq!(experience.subtitle(), Some("Even nicer"));
    assert_eq!(experience.coordinate(), coordinate());
    assert_eq!(experience.updated_at_ms(), Some(2_000));

    // Same millisecond still moves forward.
    experience.edit_metadata("Again", "Same instant", 2_000);
    assert_eq!(experience.updated_at_ms(), Some(2_001));
}

#[test]
fn relocate_moves_the_experience() {
    let mut experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);
    let target = Coordinate::new(-33.86, 151.21).unwrap();

    experience.relocate(target, 1_500);
    assert_eq!(experience.coordinate(), target);
    assert_eq!(experience.updated_at_ms(), Some(1_500));
}

fn snapshot(record: &MediaRecord) -> (Option<String>, Option<Vec<u8>>) {
    (
        record.reference().map(str::to_string),
        record.payload().map(<[u8]>::to_vec),
    )
}

#[test]
fn mutate_is_idempotent_for_fields_but_not_for_timestamp() {
    let mut record = MediaRecord::new(MediaKind::Audio, Some("a.caf".to_string()), None, 10);

    record.mutate(Some("b.caf".to_string()), Some(vec![7]), 20);
    let after_first = snapshot(&record);
    let first_stamp = record.updated_at_ms().unwrap();

    record.mutate(Some("b.caf".to_string()), Some(vec![7]), 20);
    let after_second = snapshot(&record);

    assert_eq!(after_first, after_second);
    assert!(record.updated_at_ms().unwrap() > first_stamp);
}

#[test]
fn mutate_media_reports_unknown_ids() {
    let mut experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);
    assert!(!experience.mutate_media(Uuid::new_v4(), None, None, 2_000));
    assert_eq!(experience.updated_at_ms(), None);
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let mut experience = Experience::new("Park", "Nice walk", coordinate(), 1_000);
    experience.append_media(MediaRecord::new(
        MediaKind::Video,
        Some("file:///clip.mov".to_string()),
        None,
        1_100,
    ));

    let json = serde_json::to_value(&experience).unwrap();
    assert_eq!(json["id"], experience.id().to_string());
    assert_eq!(json["title"], "Park");
    assert_eq!(json["coordinate"]["latitude"], 40.0);
    assert_eq!(json["coordinate"]["longitude"], -75.0);
    assert_eq!(json["media"][0]["kind"], "video");
    assert_eq!(json["media"][0]["reference"], "file:///clip.mov");
    assert_eq!(json["updated_at_ms"], serde_json::Value::Null);

    let decoded: Experience = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, experience);
}

#[test]
fn deserialize_rejects_out_of_range_coordinate() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "title": "Nowhere",
        "subtitle": null,
        "coordinate": { "latitude": 91.0, "longitude": 0.0 },
        "media": [],
        "created_at_ms": 1,
        "updated_at_ms": null
    });

    let err = serde_json::from_value::<Experience>(value).unwrap_err();
    assert!(
        err.to_string().contains("latitude (91) must be"),
        "unexpected error: {err}"
    );
}

#[test]
fn from_parts_rejects_nil_id_and_reversed_timestamps() {
    let parts = ExperienceParts {
        id: Uuid::nil(),
        title: None,
        subtitle: None,
        coordinate: coordinate(),
        media: Vec::new(),
        created_at_ms: 10,
        updated_at_ms: None,
    };
    assert_eq!(
        Experience::from_parts(parts.clone()).unwrap_err(),
        ModelValidationError::NilId
    );

    let reversed = ExperienceParts {
        id: Uuid::new_v4(),
        updated_at_ms: Some(5),
        ..parts
    };
    assert_eq!(
        Experience::from_parts(reversed).unwrap_err(),
        ModelValidationError::UpdatedBeforeCreated {
            created_at_ms: 10,
            updated_at_ms: 5,
        }
    );
}

#[test]
fn from_parts_rejects_duplicate_media_ids() {
    let record = MediaRecord::new(MediaKind::Image, None, None, 10);
    let parts = ExperienceParts {
        id: Uuid::new_v4(),
        title: Some("Twice".to_string()),
        subtitle: None,
        coordinate: coordinate(),
        media: vec![record.clone(), record.clone()],
        created_at_ms: 10,
        updated_at_ms: None,
    };

    assert_eq!(
        Experience::from_parts(parts).unwrap_err(),
        ModelValidationError::DuplicateMediaId(record.id())
    );
}

#[test]
fn from_parts_rejects_timestamps_without_room_to_advance() {
    let parts = ExperienceParts {
        id: Uuid::new_v4(),
        title: Some("Far future".to_string()),
        subtitle: None,
        coordinate: coordinate(),
        media: Vec::new(),
        created_at_ms: 1,
        updated_at_ms: Some(i64::MAX),
    };
    assert_eq!(
        Experience::from_parts(parts.clone()).unwrap_err(),
        ModelValidationError::TimestampAtLimit(i64::MAX)
    );

    let created_at_limit = ExperienceParts {
        created_at_ms: i64::MAX,
        updated_at_ms: None,
        ..parts
    };
    assert_eq!(
        Experience::from_parts(created_at_limit).unwrap_err(),
        ModelValidationError::TimestampAtLimit(i64::MAX)
    );
}

#[test]
fn deserialize_rejects_media_updated_at_limit() {
    let value = serde_json::json!({
        "id": "11111111-2222-4333-8444-555555555555",
        "kind": "audio",
        "reference": null,
        "payload": null,
        "created_at_ms": 1,
        "updated_at_ms": i64::MAX
    });

    let err = serde_json::from_value::<MediaRecord>(value).unwrap_err();
    assert!(err.to_string().contains("must be below"), "unexpected error: {err}");
}
