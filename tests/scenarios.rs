//! End-to-end scenarios exercising spawn/send/receive/supervision together,
//! rather than one module at a time.

use std::sync::mpsc;
use std::time::Duration;

use actorcore::{
    on1, on1_always, on2, on2_always, on_any_always, receive, receive_only, send, send2, spawn, spawn_linked,
    this_id, ActorError,
};

const TIMEOUT: Duration = Duration::from_secs(5);

// S1: a fixed four-message dialogue between parent and child, mixing a
// rejecting handler, tuple destructuring, a bare tuple, a wildcard, and
// first-match-wins string handlers, ending in a reply.
#[test]
fn s1_parent_child_dialogue() {
    let (done_tx, done_rx) = mpsc::channel();
    spawn(move || {
        let parent = this_id();
        let child = spawn(move || {
            receive(&mut [
                on1::<f64, _>(|_v| panic!("a bare float must not match an (i32, i32) message")),
                on2_always::<i32, i32, _>(|a, b| assert!(*a == 42 && *b == 86)),
            ])
            .unwrap();

            receive(&mut [on1_always::<(i32, i32), _>(|t| assert_eq!(*t, (42, 86)))]).unwrap();

            receive(&mut [on_any_always(|_v| ())]).unwrap();

            receive(&mut [
                on1::<&'static str, _>(|v| *v == "the quick brown fox"),
                on1::<&'static str, _>(|_v| panic!("second string handler must not fire")),
            ])
            .unwrap();

            send(&parent, "done").unwrap();
        });

        send2(&child, 42i32, 86i32).unwrap();
        send(&child, (42i32, 86i32)).unwrap();
        send2(&child, "hello", "there").unwrap();
        send(&child, "the quick brown fox").unwrap();

        receive(&mut [on1_always::<&'static str, _>(|v| assert_eq!(*v, "done"))]).unwrap();
        done_tx.send(()).unwrap();
    });
    done_rx.recv_timeout(TIMEOUT).unwrap();
}

// S2: an owner's exit raises OwnerTerminated on the child's next receive.
#[test]
fn s2_owner_termination() {
    let (result_tx, result_rx) = mpsc::channel();
    spawn(move || {
        spawn(move || {
            let outcome = receive(&mut [on1_always::<i32, _>(|_v| ())]);
            result_tx.send(matches!(outcome, Err(ActorError::OwnerTerminated { .. }))).unwrap();
        });
    });
    assert!(result_rx.recv_timeout(TIMEOUT).unwrap());
}

// S3: a linked peer's exit raises LinkTerminated on the survivor's next receive.
#[test]
fn s3_link_termination() {
    let (result_tx, result_rx) = mpsc::channel();
    spawn(move || {
        spawn_linked(move || {
            let outcome = receive(&mut [on1_always::<i32, _>(|_v| ())]);
            result_tx.send(matches!(outcome, Err(ActorError::LinkTerminated { .. }))).unwrap();
        });
    });
    assert!(result_rx.recv_timeout(TIMEOUT).unwrap());
}

// S4: 10,000 distinct integers arrive via receive_only in the sent order.
#[test]
fn s4_flood_preserves_order() {
    const N: i32 = 10_000;
    let (result_tx, result_rx) = mpsc::channel();
    let child = spawn(move || {
        let mut seen = Vec::with_capacity(N as usize);
        for _ in 0..N {
            seen.push(receive_only::<i32>().unwrap());
        }
        result_tx.send(seen).unwrap();
    });
    for i in 0..N {
        send(&child, i).unwrap();
    }
    let seen = result_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    let expected: Vec<i32> = (0..N).collect();
    assert_eq!(seen, expected);
}

// S5: a selective receive for ("tag2", int) picks the middle message out of
// order, leaving the two ("tag1", int) messages for a subsequent receive.
#[test]
fn s5_selective_by_tag() {
    let (result_tx, result_rx) = mpsc::channel();
    let child = spawn(move || {
        let mut tag2_seen = None;
        receive(&mut [on2::<&'static str, i32, _>(|tag, v| {
            if *tag == "tag2" {
                tag2_seen = Some(*v);
                true
            } else {
                false
            }
        })])
        .unwrap();

        let mut tag1_seen = Vec::new();
        for _ in 0..2 {
            receive(&mut [on2_always::<&'static str, i32, _>(|tag, v| {
                assert_eq!(*tag, "tag1");
                tag1_seen.push(*v);
            })])
            .unwrap();
        }

        result_tx.send((tag2_seen, tag1_seen)).unwrap();
    });

    send2(&child, "tag1", 1i32).unwrap();
    send2(&child, "tag2", 2i32).unwrap();
    send2(&child, "tag1", 3i32).unwrap();

    let (tag2_seen, tag1_seen) = result_rx.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(tag2_seen, Some(2));
    assert_eq!(tag1_seen, vec![1, 3]);
}
