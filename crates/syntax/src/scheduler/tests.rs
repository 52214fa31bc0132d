use std::time::Duration;

use quill_primitives::Change;

use super::*;

fn scheduler(delay_ms: u64) -> (DebounceScheduler, mpsc::UnboundedReceiver<EngineMsg>) {
	let (tx, rx) = mpsc::unbounded_channel();
	(DebounceScheduler::new(Duration::from_millis(delay_ms), Handle::current(), tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<EngineMsg>) -> Vec<u64> {
	let mut fired = Vec::new();
	while let Ok(msg) = rx.try_recv() {
		if let EngineMsg::Deferred { generation } = msg {
			fired.push(generation);
		}
	}
	fired
}

#[tokio::test(start_paused = true)]
async fn test_rapid_arms_fire_once() {
	let (mut sched, mut rx) = scheduler(300);

	sched.arm(10);
	tokio::time::sleep(Duration::from_millis(100)).await;
	sched.arm(20);
	tokio::time::sleep(Duration::from_millis(100)).await;
	let last = sched.arm(30);

	tokio::time::sleep(Duration::from_millis(400)).await;
	assert_eq!(drain(&mut rx), vec![last]);
	assert_eq!(sched.take_fired(last), Some(30));
	assert_eq!(sched.pending_pos(), None);
}

#[tokio::test(start_paused = true)]
async fn test_does_not_fire_before_delay() {
	let (mut sched, mut rx) = scheduler(300);

	sched.arm(5);
	tokio::time::sleep(Duration::from_millis(299)).await;
	assert!(drain(&mut rx).is_empty());
	tokio::time::sleep(Duration::from_millis(2)).await;
	assert_eq!(drain(&mut rx).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_suppresses_fire() {
	let (mut sched, mut rx) = scheduler(300);

	sched.arm(5);
	assert!(sched.cancel());
	assert!(!sched.cancel());
	tokio::time::sleep(Duration::from_millis(500)).await;
	assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stale_generation_is_ignored() {
	let (mut sched, _rx) = scheduler(300);

	let first = sched.arm(5);
	let second = sched.arm(9);
	assert_ne!(first, second);
	assert_eq!(sched.take_fired(first), None);
	assert_eq!(sched.pending_pos(), Some(9));
	assert_eq!(sched.take_fired(second), Some(9));
	assert_eq!(sched.take_fired(second), None);
}

#[tokio::test(start_paused = true)]
async fn test_remap_follows_edits() {
	let (mut sched, _rx) = scheduler(300);

	sched.arm(10);
	sched.remap(&ChangeSet::from_changes(20, [Change::insert(2, "abc")]));
	assert_eq!(sched.pending_pos(), Some(13));
	sched.remap(&ChangeSet::from_changes(23, [Change::insert(13, "x")]));
	assert_eq!(sched.pending_pos(), Some(13));
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_timer() {
	let (mut sched, mut rx) = scheduler(300);

	sched.arm(1);
	drop(sched);
	tokio::time::sleep(Duration::from_millis(500)).await;
	assert!(drain(&mut rx).is_empty());
}
