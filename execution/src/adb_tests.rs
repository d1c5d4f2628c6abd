//! Block application against the authenticated database.

use crate::mocks::create_adb;
use crate::{execute_block, validate, Block, ReadView, State};
use commonware_runtime::deterministic::Runner;
use commonware_runtime::Runner as _;
use kvchain_types::{Code, Key};

fn entry(key: &str, value: &str) -> (Key, Vec<u8>) {
    (Key::from(key), value.as_bytes().to_vec())
}

#[test]
fn test_adb_end_to_end_block() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut state = create_adb(&context).await;
        assert_eq!(state.committed_height().await.unwrap(), 0);

        let mut block = Block::begin(1);
        assert_eq!(block.deliver(&state, b"x=1").await.unwrap(), Code::Valid);
        assert_eq!(block.deliver(&state, b"x=1").await.unwrap(), Code::Duplicate);
        assert_eq!(block.deliver(&state, b"y=2").await.unwrap(), Code::Valid);
        assert_eq!(block.deliver(&state, b"bad").await.unwrap(), Code::Malformed);

        // Staged writes are invisible to gossip-time checks.
        assert_eq!(validate(&state, b"x=1").await.unwrap(), Code::Valid);

        block.end().unwrap();
        block.commit(&mut state).await.unwrap();

        assert_eq!(state.committed_height().await.unwrap(), 1);
        assert_eq!(ReadView::get(&state, &Key::from("x")).await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(ReadView::get(&state, &Key::from("y")).await.unwrap(), Some(b"2".to_vec()));
        assert_eq!(ReadView::get(&state, &Key::from("bad")).await.unwrap(), None);
        assert_eq!(validate(&state, b"x=1").await.unwrap(), Code::Duplicate);
    });
}

#[test]
fn test_adb_sequential_blocks() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut state = create_adb(&context).await;

        let (height, codes) = execute_block(&mut state, &[b"k=v".to_vec()])
            .await
            .unwrap();
        assert_eq!((height, codes), (1, vec![Code::Valid]));

        let (height, codes) = execute_block(&mut state, &[b"k=v".to_vec(), b"k=w".to_vec()])
            .await
            .unwrap();
        assert_eq!((height, codes), (2, vec![Code::Duplicate, Code::Valid]));

        assert_eq!(state.committed_height().await.unwrap(), 2);
        assert_eq!(ReadView::get(&state, &Key::from("k")).await.unwrap(), Some(b"w".to_vec()));
    });
}

#[test]
fn test_adb_uncommitted_writes_discarded_on_reopen() {
    let executor = Runner::default();
    executor.start(|context| async move {
        let mut state = create_adb(&context).await;
        execute_block(&mut state, &[b"k=v".to_vec()]).await.unwrap();

        // Stage writes the way an interrupted publish would, then stop before commit.
        State::apply(&mut state, vec![entry("a", "1"), entry("k", "z")])
            .await
            .unwrap();
        assert_eq!(
            ReadView::get(&state, &Key::from("a")).await.unwrap(),
            Some(b"1".to_vec())
        );
        drop(state);

        let state = create_adb(&context).await;
        assert_eq!(ReadView::get(&state, &Key::from("a")).await.unwrap(), None);
        assert_eq!(
            ReadView::get(&state, &Key::from("k")).await.unwrap(),
            Some(b"v".to_vec())
        );
        assert_eq!(state.committed_height().await.unwrap(), 1);
    });
}

#[test]
fn test_adb_committed_blocks_survive_restart() {
    let (_, checkpoint) = Runner::default().start_and_recover(|context| async move {
        let mut state = create_adb(&context).await;
        execute_block(&mut state, &[b"x=1".to_vec(), b"y=2".to_vec()])
            .await
            .unwrap();
        execute_block(&mut state, &[b"y=3".to_vec()]).await.unwrap();

        // Left uncommitted when the process stops.
        State::apply(&mut state, vec![entry("x", "9")]).await.unwrap();
    });

    Runner::from(checkpoint).start(|context| async move {
        let mut state = create_adb(&context).await;
        assert_eq!(state.committed_height().await.unwrap(), 2);
        assert_eq!(
            ReadView::get(&state, &Key::from("x")).await.unwrap(),
            Some(b"1".to_vec())
        );
        assert_eq!(
            ReadView::get(&state, &Key::from("y")).await.unwrap(),
            Some(b"3".to_vec())
        );

        // Execution resumes at the next height with duplicates still detected.
        let (height, codes) = execute_block(&mut state, &[b"y=3".to_vec(), b"x=9".to_vec()])
            .await
            .unwrap();
        assert_eq!((height, codes), (3, vec![Code::Duplicate, Code::Valid]));
    });
}
