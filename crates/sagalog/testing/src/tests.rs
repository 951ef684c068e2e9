//! Conformance tests for the in-memory log and failure-discipline tests
//! for the façade running on top of it.

use std::sync::Arc;

use sagalog_core::{
    replay, SagaCoordinator, SagaError, SagaId, SagaLog, SagaMessage, TaskFlags, TaskId,
};

use crate::{in_memory_coordinator, FailingSagaLog, InMemorySagaLog};

fn task(id: &str) -> TaskId {
    TaskId::from(id)
}

// --- log conformance -----------------------------------------------------

#[tokio::test]
async fn test_log_message_fails_for_unstarted_saga() {
    let log = InMemorySagaLog::new();
    let msg = SagaMessage::abort_saga(SagaId::from("nobody"));

    let err = log.log_message(&msg).await.unwrap_err();
    assert!(err.is_unstarted());
    assert_eq!(log.saga_count(), 0);
}

#[tokio::test]
async fn test_get_messages_for_unknown_saga_is_empty_not_error() {
    let log = InMemorySagaLog::new();

    let msgs = log.get_messages(&SagaId::from("unknown")).await.unwrap();
    assert!(msgs.is_empty());
}

#[tokio::test]
async fn test_messages_come_back_in_append_order() {
    let log = InMemorySagaLog::new();
    let saga_id = SagaId::from("ordered");

    log.start_saga(&saga_id, Some(b"job".as_slice()))
        .await
        .unwrap();
    for i in 0..5 {
        let msg = SagaMessage::start_task(saga_id.clone(), TaskId::new(format!("t{}", i)), None);
        log.log_message(&msg).await.unwrap();
    }

    let msgs = log.get_messages(&saga_id).await.unwrap();
    assert_eq!(msgs.len(), 6);
    for (i, msg) in msgs.iter().skip(1).enumerate() {
        assert_eq!(msg.task_id, Some(TaskId::new(format!("t{}", i))));
    }
}

#[tokio::test]
async fn test_duplicate_start_saga_overwrites() {
    // The reference is permissive: a second StartSaga resets the journal.
    let log = InMemorySagaLog::new();
    let saga_id = SagaId::from("dup");

    log.start_saga(&saga_id, None).await.unwrap();
    log.log_message(&SagaMessage::abort_saga(saga_id.clone()))
        .await
        .unwrap();
    log.start_saga(&saga_id, None).await.unwrap();

    let msgs = log.get_messages(&saga_id).await.unwrap();
    assert_eq!(msgs.len(), 1);
    assert_eq!(log.saga_count(), 1);
}

#[tokio::test]
async fn test_active_sagas_includes_completed_sagas() {
    let coordinator = in_memory_coordinator();

    let saga = coordinator
        .make_saga(SagaId::from("done"), None)
        .await
        .unwrap();
    saga.end_saga().await.unwrap();
    coordinator
        .make_saga(SagaId::from("running"), None)
        .await
        .unwrap();

    let mut active = coordinator.active_sagas().await.unwrap();
    active.sort();
    assert_eq!(active, vec![SagaId::from("done"), SagaId::from("running")]);
}

#[tokio::test]
async fn test_clear_and_counters() {
    let log = InMemorySagaLog::new();
    let saga_id = SagaId::from("counted");

    log.start_saga(&saga_id, None).await.unwrap();
    log.log_message(&SagaMessage::start_task(saga_id.clone(), task("t"), None))
        .await
        .unwrap();

    assert_eq!(log.saga_count(), 1);
    assert_eq!(log.message_count(), 2);

    log.clear();
    assert_eq!(log.saga_count(), 0);
    assert_eq!(log.message_count(), 0);
}

// --- façade failure discipline -------------------------------------------

#[tokio::test]
async fn test_log_failure_leaves_cached_state_unchanged_and_retry_succeeds() {
    let log = Arc::new(FailingSagaLog::new());
    let coordinator = SagaCoordinator::new(Arc::clone(&log));
    let saga = coordinator
        .make_saga(SagaId::from("flaky"), None)
        .await
        .unwrap();

    saga.start_task(task("t1"), None).await.unwrap();

    log.fail_next_appends(1);
    let err = saga.end_task(task("t1"), None).await.unwrap_err();
    assert!(matches!(err, SagaError::Log(_)));
    assert!(err.is_retry_safe());

    // Cached state did not advance and the journal has no EndTask record.
    let state = saga.state().await;
    assert!(!state.is_task_completed(&task("t1")));
    assert_eq!(
        log.get_messages(&SagaId::from("flaky")).await.unwrap().len(),
        2
    );

    // The retry both appends and commits.
    saga.end_task(task("t1"), None).await.unwrap();
    assert!(saga.state().await.is_task_completed(&task("t1")));
    assert_eq!(
        log.get_messages(&SagaId::from("flaky")).await.unwrap().len(),
        3
    );
}

// --- log-state coherence and concurrency ---------------------------------

#[tokio::test]
async fn test_folding_the_journal_reproduces_the_cached_state() {
    let coordinator = in_memory_coordinator();
    let saga_id = SagaId::from("coherent");
    let saga = coordinator
        .make_saga(saga_id.clone(), Some(b"job".to_vec()))
        .await
        .unwrap();

    saga.start_task(task("a"), Some(b"in-a".to_vec())).await.unwrap();
    saga.end_task(task("a"), Some(b"out-a".to_vec())).await.unwrap();
    saga.start_task(task("b"), None).await.unwrap();
    saga.abort_saga().await.unwrap();
    saga.start_comp_task(task("a"), None).await.unwrap();
    saga.end_comp_task(task("a"), Some(b"undone-a".to_vec()))
        .await
        .unwrap();
    saga.start_comp_task(task("b"), None).await.unwrap();
    saga.end_comp_task(task("b"), None).await.unwrap();
    saga.end_saga().await.unwrap();

    let journal = coordinator.log().get_messages(&saga_id).await.unwrap();
    let folded = replay(&journal).unwrap();

    assert_eq!(folded, *saga.state().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_tasks_on_one_saga() {
    const TASKS: usize = 100;

    let coordinator = in_memory_coordinator();
    let saga_id = SagaId::from("concurrent");
    let saga = Arc::new(
        coordinator
            .make_saga(saga_id.clone(), None)
            .await
            .unwrap(),
    );

    let mut handles = Vec::new();
    for i in 0..TASKS {
        let saga = Arc::clone(&saga);
        handles.push(tokio::spawn(async move {
            let task_id = TaskId::new(format!("task-{}", i));
            saga.start_task(task_id.clone(), None).await.unwrap();
            saga.end_task(task_id, None).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // StartSaga + one start and one end per task, and the fold of the
    // journal agrees with the cached state.
    let journal = coordinator.log().get_messages(&saga_id).await.unwrap();
    assert_eq!(journal.len(), 1 + 2 * TASKS);

    let state = saga.state().await;
    for i in 0..TASKS {
        let task_id = TaskId::new(format!("task-{}", i));
        assert_eq!(
            state.task_flags(&task_id),
            TaskFlags::STARTED | TaskFlags::COMPLETED
        );
    }
    assert_eq!(replay(&journal).unwrap(), *state);

    saga.end_saga().await.unwrap();
    assert!(saga.state().await.is_saga_completed());
}
