//! Chat group membership rules and replies.

use aprsbbs::bbs::commands::{CommandProcessor, OutboundMessage, USAGE_GROUP};
use aprsbbs::bbs::groups::{CreateOutcome, GroupStore, JoinOutcome, LeaveOutcome};
use aprsbbs::bbs::mailbox::MailboxStore;

fn reply(cp: &CommandProcessor, groups: &mut GroupStore, caller: &str, body: &str) -> String {
    let mut mb = MailboxStore::new();
    let mut out = cp.process(caller, body, &mut mb, groups);
    assert_eq!(out.len(), 1, "expected one reply to '{body}'");
    out.remove(0).body
}

#[test]
fn duplicate_create_and_join_leave_membership_unchanged() {
    let mut g = GroupStore::new();
    assert_eq!(g.create("Net", "N0CALL"), CreateOutcome::Created);
    assert_eq!(g.create("NET", "N1CALL"), CreateOutcome::AlreadyExists);
    assert_eq!(g.members("net"), vec!["N0CALL".to_string()]);

    assert_eq!(g.join("net", "n1call"), JoinOutcome::Joined);
    assert_eq!(g.join("net", "N1CALL"), JoinOutcome::AlreadyMember);
    assert_eq!(g.members("net").len(), 2);
    assert_eq!(g.join("other", "N1CALL"), JoinOutcome::NoSuchGroup);
}

#[test]
fn last_member_leaving_deletes_group() {
    let mut g = GroupStore::new();
    g.create("net", "N0CALL");
    g.join("net", "N1CALL");
    assert_eq!(g.leave("net", "N0CALL"), LeaveOutcome::Left { group_removed: false });
    assert_eq!(g.leave("net", "N0CALL"), LeaveOutcome::NoSuchGroupOrNotMember);
    assert_eq!(g.leave("net", "N1CALL"), LeaveOutcome::Left { group_removed: true });
    assert!(!g.exists("net"));
    assert!(g.is_empty());
    assert_eq!(g.join("net", "N1CALL"), JoinOutcome::NoSuchGroup);
}

#[test]
fn broadcast_requires_membership() {
    let mut g = GroupStore::new();
    g.create("net", "N0CALL");
    g.join("net", "W1AW");
    g.join("net", "K1ABC");
    assert_eq!(
        g.broadcast("NET", "W1AW").unwrap(),
        vec!["K1ABC".to_string(), "N0CALL".to_string()]
    );
    assert!(g.broadcast("net", "N9XYZ").is_err());
    assert!(g.broadcast("missing", "N0CALL").is_err());
}

#[test]
fn command_replies_use_lower_cased_names() {
    let cp = CommandProcessor::new();
    let mut g = GroupStore::new();
    assert_eq!(
        reply(&cp, &mut g, "N0CALL", "group create Hams"),
        "Group 'hams' created and you have joined."
    );
    assert_eq!(reply(&cp, &mut g, "N1CALL", "group create hams"), "Group 'hams' already exists.");
    assert_eq!(reply(&cp, &mut g, "N1CALL", "group join HAMS"), "Joined group 'hams'.");
    assert_eq!(
        reply(&cp, &mut g, "N1CALL", "group join hams"),
        "You are already a member of 'hams'."
    );
    assert_eq!(reply(&cp, &mut g, "W1AW", "group join dx"), "Group 'dx' does not exist.");
    assert_eq!(reply(&cp, &mut g, "W1AW", "group leave hams"), "You are not a member of 'hams'.");
    assert_eq!(
        reply(&cp, &mut g, "W1AW", "group msg hams hello"),
        "You are not a member of 'hams'."
    );
    assert_eq!(reply(&cp, &mut g, "N1CALL", "group leave hams"), "Left group 'hams'.");
    assert_eq!(reply(&cp, &mut g, "N1CALL", "group"), USAGE_GROUP);
    assert_eq!(reply(&cp, &mut g, "N1CALL", "group join"), USAGE_GROUP);
}

#[test]
fn sole_member_post_only_confirms() {
    let cp = CommandProcessor::new();
    let mut g = GroupStore::new();
    let mut mb = MailboxStore::new();
    cp.process("N0CALL", "group create solo", &mut mb, &mut g);
    let out = cp.process("N0CALL", "group msg solo anyone?", &mut mb, &mut g);
    assert_eq!(out, vec![OutboundMessage::notice("N0CALL", "Sent to group 'solo'.")]);
}
