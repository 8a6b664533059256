use guildhall::core::broker::LedgerBroker;
use guildhall::core::error::GuildError;
use guildhall::core::model::{ContractStatus, Track, User};
use guildhall::core::store::Store;
use guildhall::plugins::exchange::{self, OfferEdit};
use tempfile::tempdir;

fn seed_user(store: &Store, id: &str, name: &str) -> User {
    let user = User {
        id: id.to_string(),
        name: name.to_string(),
        university: None,
        track: Track::Engineer,
        session_price: 25,
        github_url: None,
        figma_url: None,
        sessions_completed: 0,
        is_verified: false,
        invite_code: None,
        is_admin: false,
    };
    let seeded = user.clone();
    LedgerBroker::new(store)
        .with_ledger("seed", "test.seed", move |doc| {
            doc.upsert_user(seeded);
            Ok(())
        })
        .expect("seed user");
    user
}

fn fresh_store(tmp: &tempfile::TempDir) -> Store {
    let store = Store::open(tmp.path());
    store.init().expect("init");
    store
}

#[test]
fn full_lifecycle_credits_the_seller() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    let buyer = seed_user(&store, "b1", "Brook");

    let contract = exchange::publish_offer(&store, &seller, "Design teardown", "45 min call", 25, 2)
        .expect("offer");
    assert_eq!(contract.status, ContractStatus::Available);
    assert!(contract.buyer_id.is_none());

    let booked = exchange::book(&store, &buyer, &contract.id).expect("book");
    assert_eq!(booked.status, ContractStatus::Escrow);
    assert_eq!(booked.buyer_id.as_deref(), Some("b1"));
    assert_eq!(booked.buyer_name.as_deref(), Some("Brook"));

    let delivered =
        exchange::deliver(&store, &seller, &contract.id, "see attached").expect("deliver");
    assert_eq!(delivered.status, ContractStatus::Delivered);
    assert_eq!(delivered.delivery_note.as_deref(), Some("see attached"));

    let completed = exchange::complete(&store, &buyer, &contract.id).expect("complete");
    assert_eq!(completed.status, ContractStatus::Completed);

    let doc = LedgerBroker::new(&store).read().expect("read");
    let seller_after = doc.find_user("s1").expect("seller");
    assert_eq!(seller_after.sessions_completed, 1);
    // Buyer fields survive completion untouched.
    let contract_after = doc.find_contract(&contract.id).expect("contract");
    assert_eq!(contract_after.buyer_id.as_deref(), Some("b1"));
}

#[test]
fn seller_cannot_book_own_offer() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");

    let contract =
        exchange::publish_offer(&store, &seller, "Code review", "deep dive", 25, 2).expect("offer");
    let result = exchange::book(&store, &seller, &contract.id);
    assert!(matches!(result, Err(GuildError::InvalidTransition(_))));

    let doc = LedgerBroker::new(&store).read().expect("read");
    let unchanged = doc.find_contract(&contract.id).expect("contract");
    assert_eq!(unchanged.status, ContractStatus::Available);
    assert!(unchanged.buyer_id.is_none());
}

#[test]
fn no_state_is_skipped_or_revisited() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    let buyer = seed_user(&store, "b1", "Brook");

    let contract =
        exchange::publish_offer(&store, &seller, "Code review", "deep dive", 25, 2).expect("offer");

    // Available: deliver and complete are both out of order.
    assert!(matches!(
        exchange::deliver(&store, &seller, &contract.id, "early"),
        Err(GuildError::InvalidTransition(_))
    ));
    assert!(matches!(
        exchange::complete(&store, &buyer, &contract.id),
        Err(GuildError::InvalidTransition(_))
    ));

    exchange::book(&store, &buyer, &contract.id).expect("book");

    // Escrow: completion still requires delivery, re-booking regresses.
    assert!(matches!(
        exchange::complete(&store, &buyer, &contract.id),
        Err(GuildError::InvalidTransition(_))
    ));
    assert!(matches!(
        exchange::book(&store, &buyer, &contract.id),
        Err(GuildError::InvalidTransition(_))
    ));

    exchange::deliver(&store, &seller, &contract.id, "done").expect("deliver");
    exchange::complete(&store, &seller, &contract.id).expect("complete");

    // Completed is terminal.
    assert!(matches!(
        exchange::deliver(&store, &seller, &contract.id, "again"),
        Err(GuildError::InvalidTransition(_))
    ));
    assert!(matches!(
        exchange::complete(&store, &seller, &contract.id),
        Err(GuildError::InvalidTransition(_))
    ));

    let doc = LedgerBroker::new(&store).read().expect("read");
    assert_eq!(doc.find_user("s1").expect("seller").sessions_completed, 1);
}

#[test]
fn only_the_seller_delivers_and_only_parties_complete() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    let buyer = seed_user(&store, "b1", "Brook");
    let stranger = seed_user(&store, "x1", "Xan");

    let contract =
        exchange::publish_offer(&store, &seller, "Code review", "deep dive", 25, 2).expect("offer");
    exchange::book(&store, &buyer, &contract.id).expect("book");

    assert!(matches!(
        exchange::deliver(&store, &buyer, &contract.id, "not mine"),
        Err(GuildError::InvalidTransition(_))
    ));

    exchange::deliver(&store, &seller, &contract.id, "done").expect("deliver");

    assert!(matches!(
        exchange::complete(&store, &stranger, &contract.id),
        Err(GuildError::InvalidTransition(_))
    ));
    exchange::complete(&store, &seller, &contract.id).expect("seller may confirm");
}

#[test]
fn delivery_note_is_required() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    let buyer = seed_user(&store, "b1", "Brook");

    let contract =
        exchange::publish_offer(&store, &seller, "Code review", "deep dive", 25, 2).expect("offer");
    exchange::book(&store, &buyer, &contract.id).expect("book");

    assert!(matches!(
        exchange::deliver(&store, &seller, &contract.id, "   "),
        Err(GuildError::ValidationError(_))
    ));
}

#[test]
fn offer_terms_freeze_at_escrow() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    let buyer = seed_user(&store, "b1", "Brook");

    let contract =
        exchange::publish_offer(&store, &seller, "Code review", "deep dive", 25, 2).expect("offer");

    let edited = exchange::edit_offer(
        &store,
        &seller,
        &contract.id,
        OfferEdit {
            price: Some(40),
            ..OfferEdit::default()
        },
    )
    .expect("edit while available");
    assert_eq!(edited.price, 40);

    // A stranger never edits, even while available.
    assert!(matches!(
        exchange::edit_offer(&store, &buyer, &contract.id, OfferEdit::default()),
        Err(GuildError::InvalidTransition(_))
    ));

    exchange::book(&store, &buyer, &contract.id).expect("book");
    let frozen = exchange::edit_offer(
        &store,
        &seller,
        &contract.id,
        OfferEdit {
            price: Some(10),
            ..OfferEdit::default()
        },
    );
    assert!(matches!(frozen, Err(GuildError::InvalidTransition(_))));

    let doc = LedgerBroker::new(&store).read().expect("read");
    assert_eq!(doc.find_contract(&contract.id).expect("contract").price, 40);
}

#[test]
fn unknown_contract_is_not_found() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let buyer = seed_user(&store, "b1", "Brook");
    assert!(matches!(
        exchange::book(&store, &buyer, "ghost"),
        Err(GuildError::NotFound(_))
    ));
}

#[test]
fn empty_offer_title_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let store = fresh_store(&tmp);
    let seller = seed_user(&store, "s1", "Sol");
    assert!(matches!(
        exchange::publish_offer(&store, &seller, "  ", "desc", 25, 2),
        Err(GuildError::ValidationError(_))
    ));
}
