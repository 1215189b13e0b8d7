use std::collections::HashMap;
use std::sync::Arc;

use telex_db::{ChannelStore, Database, MessageFilter, MessageStore, NewUser, SubscriptionStore, UserStore};
use telex_rtm::{ChannelRepository, ErrorKind, IdentityResolver, JwtResolver, ResolveError, RtmError, issue_token};
use telex_types::api::{AttachmentRequest, SendMessageRequest, TokenizedChannelRequest, TokenizedPostRequest};
use telex_types::models::User;

/// Fixed token table standing in for the identity subsystem.
struct StaticResolver(HashMap<String, User>);

impl IdentityResolver for StaticResolver {
    fn resolve(&self, credential: &str) -> Result<User, ResolveError> {
        self.0
            .get(credential)
            .cloned()
            .ok_or(ResolveError::UnknownUser(-1))
    }
}

struct Fixture {
    db: Arc<Database>,
    repo: ChannelRepository,
    u1: User,
    u2: User,
}

/// U1 (id 1) is subscribed to `general` (id 1); U2 (id 2) is not.
fn setup() -> Fixture {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let users = UserStore::new(db.clone());
    let u1 = users.create(&new_user("u1")).unwrap();
    let u2 = users.create(&new_user("u2")).unwrap();

    let general = ChannelStore::new(db.clone()).fetch("general").unwrap().unwrap();
    SubscriptionStore::new(db.clone())
        .create(&general, general.create_subscription(u1.id))
        .unwrap();

    let tokens = HashMap::from([("u1-token".to_string(), u1.clone()), ("u2-token".to_string(), u2.clone())]);
    let repo = ChannelRepository::new(db.clone(), Arc::new(StaticResolver(tokens)));
    Fixture { db, repo, u1, u2 }
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        email: format!("{name}@example.com"),
        username: name.to_string(),
        full_name: format!("User {name}"),
        ..Default::default()
    }
}

fn post(token: &str, channel: &str, content: &str, attachments: Vec<AttachmentRequest>) -> TokenizedPostRequest {
    TokenizedPostRequest::new(
        token,
        channel,
        SendMessageRequest {
            content: content.to_string(),
            attachments,
        },
    )
}

fn attachment(url: &str) -> AttachmentRequest {
    AttachmentRequest {
        url: url.to_string(),
        kind: "image/png".to_string(),
    }
}

fn row_count(db: &Database, table: &str) -> i64 {
    db.with_conn(|conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
        .unwrap()
}

#[test]
fn subscribed_user_posts() {
    let f = setup();
    let message = f.repo.post_message(&post("u1-token", "general", "hi", vec![])).unwrap();

    assert_eq!(message.author.as_ref().map(|u| u.id), Some(1));
    assert_eq!(message.channel.as_ref().map(|c| c.id), Some(1));
    assert_eq!(message.content, "hi");
    assert!(message.attachments.is_empty());
}

#[test]
fn unsubscribed_user_is_forbidden() {
    let f = setup();
    let err = f
        .repo
        .post_message(&post("u2-token", "general", "let me in", vec![]))
        .unwrap_err();

    assert!(matches!(err, RtmError::NotSubscribed { user_id: 2, .. }), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(row_count(&f.db, "messages"), 0);
}

#[test]
fn unknown_credential_aborts_before_writing() {
    let f = setup();
    let err = f.repo.post_message(&post("stolen", "general", "hi", vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    let err = f.repo.join_channel(&TokenizedChannelRequest::new("stolen", "general")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);

    assert_eq!(row_count(&f.db, "messages"), 0);
    assert_eq!(row_count(&f.db, "subscriptions"), 1);
}

#[test]
fn posting_to_missing_channel_is_not_found() {
    let f = setup();
    let err = f
        .repo
        .post_message(&post("u1-token", "nonexistent", "hello?", vec![]))
        .unwrap_err();
    assert!(matches!(err, RtmError::ChannelNotFound(ref name) if name == "nonexistent"));
    assert_eq!(row_count(&f.db, "messages"), 0);
}

#[test]
fn failed_attachment_leaves_nothing_behind() {
    let f = setup();
    let err = f
        .repo
        .post_message(&post("u1-token", "general", "broken", vec![attachment("https://a"), attachment("")]))
        .unwrap_err();

    assert!(matches!(err, RtmError::PersistenceFailure(_)), "got {err:?}");
    assert_eq!(err.kind(), ErrorKind::PersistenceFailure);
    assert_eq!(row_count(&f.db, "messages"), 0);
    assert_eq!(row_count(&f.db, "attachments"), 0);
}

#[test]
fn posted_message_reads_back_identically() {
    let f = setup();
    let sent = vec![attachment("https://cdn/a.png"), attachment("https://cdn/b.png")];
    let message = f
        .repo
        .post_message(&post("u1-token", "general", "pics", sent))
        .unwrap();

    let stored = MessageStore::new(f.db.clone())
        .get(&MessageFilter::id(message.id))
        .unwrap()
        .unwrap();

    assert_eq!(stored, message);
    assert_eq!(stored.author.as_ref(), Some(&f.u1));
    assert_eq!(stored.channel.as_ref().map(|c| c.name.as_str()), Some("general"));
    let urls: Vec<_> = stored.attachments.iter().map(|a| a.url.as_str()).collect();
    assert_eq!(urls, ["https://cdn/a.png", "https://cdn/b.png"]);
}

#[test]
fn joining_twice_conflicts() {
    let f = setup();
    let request = TokenizedChannelRequest::new("u2-token", "general");

    let sub = f.repo.join_channel(&request).unwrap();
    assert_eq!(sub.user_id, f.u2.id);
    assert_eq!(sub.channel_id, 1);

    let err = f.repo.join_channel(&request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let channel = f.repo.fetch_channel("general").unwrap().unwrap();
    let u2_subs = channel.subscriptions.iter().filter(|s| s.user_id == f.u2.id).count();
    assert_eq!(u2_subs, 1);
}

#[test]
fn join_then_post() {
    let f = setup();
    f.repo
        .join_channel(&TokenizedChannelRequest::new("u2-token", "general"))
        .unwrap();
    let message = f.repo.post_message(&post("u2-token", "general", "hello all", vec![])).unwrap();
    assert_eq!(message.author_id, f.u2.id);
}

#[test]
fn join_missing_channel_is_not_found() {
    let f = setup();
    let err = f
        .repo
        .join_channel(&TokenizedChannelRequest::new("u2-token", "nonexistent"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(row_count(&f.db, "subscriptions"), 1);
}

#[test]
fn leave_removes_membership() {
    let f = setup();
    let request = TokenizedChannelRequest::new("u1-token", "general");

    let removed = f.repo.leave_channel(&request).unwrap().unwrap();
    assert_eq!(removed.user_id, f.u1.id);
    assert!(f.repo.leave_channel(&request).unwrap().is_none());

    let err = f.repo.post_message(&post("u1-token", "general", "still here?", vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[test]
fn fetch_channel_absent_vs_outage() {
    let f = setup();
    assert!(f.repo.fetch_channel("nonexistent").unwrap().is_none());

    f.db.with_conn(|conn| Ok(conn.execute_batch("DROP TABLE messages; DROP TABLE subscriptions; DROP TABLE channels;")?))
        .unwrap();
    let err = f.repo.fetch_channel("general").unwrap_err();
    assert!(matches!(err, RtmError::Storage(_)), "got {err:?}");
}

#[test]
fn channel_messages_lists_in_order() {
    let f = setup();
    for body in ["first", "second"] {
        f.repo.post_message(&post("u1-token", "general", body, vec![])).unwrap();
    }
    let listed = f.repo.channel_messages("general").unwrap();
    let bodies: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(bodies, ["first", "second"]);

    assert_eq!(f.repo.channel_messages("nonexistent").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn jwt_resolver_end_to_end() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let users = UserStore::new(db.clone());
    let user = users.create(&new_user("ada")).unwrap();
    let repo = ChannelRepository::new(db.clone(), Arc::new(JwtResolver::new("s3cret", users)));

    let token = issue_token("s3cret", &user, chrono::Duration::hours(1)).unwrap();
    repo.join_channel(&TokenizedChannelRequest::new(token.clone(), "general")).unwrap();
    let message = repo.post_message(&post(&token, "general", "signed", vec![])).unwrap();
    assert_eq!(message.author_id, user.id);

    let forged = issue_token("wrong", &user, chrono::Duration::hours(1)).unwrap();
    let err = repo.post_message(&post(&forged, "general", "forged", vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthenticated);
}
