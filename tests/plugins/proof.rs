use guildhall::core::broker::LedgerBroker;
use guildhall::core::error::GuildError;
use guildhall::core::model::{ReviewStatus, Track};
use guildhall::core::store::Store;
use guildhall::plugins::member::{self, EnrollInput};
use guildhall::plugins::proof::{self, TransmitInput};
use tempfile::tempdir;

fn enroll(store: &Store, name: &str, track: Track) -> guildhall::core::model::User {
    member::enroll(
        store,
        EnrollInput {
            name: name.to_string(),
            track,
            session_price: 25,
            invite_code: "AUC-2024".to_string(),
            university: None,
            github_url: None,
            figma_url: None,
            first_title: format!("{}'s artifact", name),
            first_problem: String::new(),
            first_links: Vec::new(),
            first_wrong: String::new(),
            first_lessons: String::new(),
        },
    )
    .expect("enroll")
}

#[test]
fn remix_copies_content_with_fresh_critiques_and_lineage() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada", Track::Engineer);
    let b = enroll(&store, "Brook", Track::Designer);

    let doc = LedgerBroker::new(&store).read().expect("read");
    let source = doc
        .projects
        .iter()
        .find(|p| p.user_id == a.id)
        .cloned()
        .expect("a's artifact");
    proof::comment(&store, &b, &source.id, "solid wiring").expect("comment");

    let remix = proof::remix(&store, &b, &source.id, "swapped the codec").expect("remix");
    assert_ne!(remix.id, source.id);
    assert_eq!(remix.user_id, b.id);
    assert_eq!(remix.user_name, "Brook");
    assert_eq!(remix.user_track, Track::Designer);
    assert_eq!(remix.title, source.title, "content carries over");
    assert_eq!(remix.original_project_id.as_deref(), Some(source.id.as_str()));
    assert_eq!(remix.remix_reason.as_deref(), Some("swapped the codec"));
    assert!(remix.comments.is_empty(), "critiques never carry over");
    assert!(remix.peer_review_requests.is_empty());

    // The source keeps its own critique list.
    let doc = LedgerBroker::new(&store).read().expect("read");
    assert_eq!(doc.find_project(&source.id).expect("source").comments.len(), 1);
}

#[test]
fn remix_requires_reason_and_existing_source() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada", Track::Engineer);
    let b = enroll(&store, "Brook", Track::Designer);

    let doc = LedgerBroker::new(&store).read().expect("read");
    let source_id = doc
        .projects
        .iter()
        .find(|p| p.user_id == a.id)
        .map(|p| p.id.clone())
        .expect("a's artifact");

    assert!(matches!(
        proof::remix(&store, &b, &source_id, "  "),
        Err(GuildError::ValidationError(_))
    ));
    assert!(matches!(
        proof::remix(&store, &b, "ghost", "because"),
        Err(GuildError::NotFound(_))
    ));
    assert!(matches!(
        proof::remix(&store, &a, &source_id, "self remix"),
        Err(GuildError::ValidationError(_))
    ));
}

#[test]
fn feed_is_newest_first_filtered_by_track_without_spotlights() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada", Track::Engineer);
    let b = enroll(&store, "Brook", Track::Designer);

    proof::transmit(
        &store,
        &a,
        TransmitInput {
            title: "second build".to_string(),
            ..TransmitInput::default()
        },
    )
    .expect("transmit");
    proof::transmit(
        &store,
        &a,
        TransmitInput {
            title: "pinned showcase".to_string(),
            is_spotlight: true,
            ..TransmitInput::default()
        },
    )
    .expect("transmit spotlight");

    let all = proof::feed(&store, None).expect("feed");
    assert_eq!(all.len(), 3, "spotlight stays out of the arena");
    assert_eq!(all[0].title, "second build", "newest first");
    assert!(all.iter().all(|p| !p.is_spotlight));

    let designers = proof::feed(&store, Some(Track::Designer)).expect("feed");
    assert_eq!(designers.len(), 1);
    assert_eq!(designers[0].user_id, b.id);
}

#[test]
fn review_request_targets_a_known_member() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada", Track::Engineer);
    let b = enroll(&store, "Brook", Track::Designer);

    let doc = LedgerBroker::new(&store).read().expect("read");
    let project_id = doc
        .projects
        .iter()
        .find(|p| p.user_id == a.id)
        .map(|p| p.id.clone())
        .expect("a's artifact");

    let request = proof::request_review(&store, &a, &project_id, &b.id).expect("request");
    assert_eq!(request.reviewer_id, b.id);
    assert_eq!(request.reviewer_name, "Brook");
    assert_eq!(request.status, ReviewStatus::Pending);

    let doc = LedgerBroker::new(&store).read().expect("read");
    let stored = doc.find_project(&project_id).expect("project");
    assert_eq!(stored.peer_review_requests.len(), 1);

    assert!(matches!(
        proof::request_review(&store, &a, &project_id, "ghost"),
        Err(GuildError::NotFound(_))
    ));
    assert!(matches!(
        proof::request_review(&store, &a, "ghost", &b.id),
        Err(GuildError::NotFound(_))
    ));
}

#[test]
fn empty_comment_and_unknown_project_are_rejected() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada", Track::Engineer);

    assert!(matches!(
        proof::comment(&store, &a, "anything", "   "),
        Err(GuildError::ValidationError(_))
    ));
    assert!(matches!(
        proof::comment(&store, &a, "ghost", "text"),
        Err(GuildError::NotFound(_))
    ));
}
