use guildhall::core::broker::LedgerBroker;
use guildhall::core::error::GuildError;
use guildhall::core::model::Track;
use guildhall::core::store::Store;
use guildhall::plugins::exchange;
use guildhall::plugins::member::{self, EnrollInput};
use guildhall::plugins::relay;
use tempfile::tempdir;

fn enroll(store: &Store, name: &str) -> guildhall::core::model::User {
    member::enroll(
        store,
        EnrollInput {
            name: name.to_string(),
            track: Track::Engineer,
            session_price: 25,
            invite_code: "BETA-MADE".to_string(),
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

fn complete_exchange(
    store: &Store,
    seller: &guildhall::core::model::User,
    buyer: &guildhall::core::model::User,
) {
    let contract = exchange::publish_offer(store, seller, "Review", "1h", 25, 2).expect("offer");
    exchange::book(store, buyer, &contract.id).expect("book");
    exchange::deliver(store, seller, &contract.id, "done").expect("deliver");
    exchange::complete(store, buyer, &contract.id).expect("complete");
}

#[test]
fn messaging_unlocks_after_a_completed_exchange() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada");
    let b = enroll(&store, "Brook");

    // Locked both ways before any completed exchange.
    assert!(matches!(
        relay::send(&store, &a, &b.id, "hello"),
        Err(GuildError::Unauthorized(_))
    ));
    assert!(matches!(
        relay::history(&store, &b, &a.id),
        Err(GuildError::Unauthorized(_))
    ));

    complete_exchange(&store, &a, &b);

    relay::send(&store, &a, &b.id, "thanks for booking").expect("send a->b");
    relay::send(&store, &b, &a.id, "great session").expect("send b->a");

    let from_a = relay::history(&store, &a, &b.id).expect("history a");
    let from_b = relay::history(&store, &b, &a.id).expect("history b");
    assert_eq!(from_a.len(), 2);
    assert_eq!(from_a[0].text, "thanks for booking");
    assert_eq!(from_a[1].text, "great session");
    // Same conversation regardless of lookup direction.
    assert_eq!(from_a.len(), from_b.len());
    assert_eq!(from_a[0].id, from_b[0].id);
}

#[test]
fn both_directions_share_one_conversation_record() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada");
    let b = enroll(&store, "Brook");
    complete_exchange(&store, &a, &b);

    relay::send(&store, &a, &b.id, "one").expect("send");
    relay::send(&store, &b, &a.id, "two").expect("send");

    let doc = LedgerBroker::new(&store).read().expect("read");
    assert_eq!(doc.conversations.len(), 1);
    let conversation = &doc.conversations[0];
    assert_eq!(conversation.id, relay::pair_key(&a.id, &b.id));
    assert_eq!(conversation.id, relay::pair_key(&b.id, &a.id));
    assert_eq!(conversation.messages.len(), 2);

    let mut sorted = vec![a.id.clone(), b.id.clone()];
    sorted.sort();
    assert_eq!(conversation.participants, sorted);
}

#[test]
fn empty_message_text_is_rejected() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada");
    let b = enroll(&store, "Brook");
    complete_exchange(&store, &a, &b);

    assert!(matches!(
        relay::send(&store, &a, &b.id, "   "),
        Err(GuildError::ValidationError(_))
    ));
}

#[test]
fn unknown_recipient_is_not_found() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada");
    assert!(matches!(
        relay::send(&store, &a, "ghost", "hello"),
        Err(GuildError::NotFound(_))
    ));
}

#[test]
fn an_escrowed_exchange_does_not_unlock_messaging() {
    let tmp = tempdir().expect("tempdir");
    let store = Store::open(tmp.path());
    store.init().expect("init");

    let a = enroll(&store, "Ada");
    let b = enroll(&store, "Brook");

    let contract = exchange::publish_offer(&store, &a, "Review", "1h", 25, 2).expect("offer");
    exchange::book(&store, &b, &contract.id).expect("book");

    assert!(matches!(
        relay::send(&store, &a, &b.id, "hello"),
        Err(GuildError::Unauthorized(_))
    ));
}
