use super::*;
use std::sync::atomic::AtomicUsize;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn counting_task(counter: &Arc<AtomicUsize>, value: usize) -> BoxFuture {
    let counter = Arc::clone(counter);
    Box::pin(async move {
        counter.fetch_add(value, Ordering::SeqCst);
    })
}

#[test]
fn test_idle_queue_runs_in_schedule_order() {
    let rt = create_runtime();
    let queue = IdleQueue::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let order = Arc::clone(&order);
        queue.schedule(Box::pin(async move {
            order.lock().unwrap().push(i);
        }));
    }
    assert_eq!(queue.len(), 3);

    while let Some(task) = queue.take_next() {
        rt.block_on(task);
    }
    assert!(queue.is_empty());
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn test_idle_queue_cancel_drops_task() {
    let rt = create_runtime();
    let queue = IdleQueue::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let first = queue.schedule(counting_task(&counter, 1));
    let _second = queue.schedule(counting_task(&counter, 10));
    assert_ne!(first, _second);

    queue.cancel(first);
    assert_eq!(queue.len(), 1);

    while let Some(task) = queue.take_next() {
        rt.block_on(task);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_tokio_idle_scheduler_runs_task() {
    let rt = create_runtime();
    let scheduler = TokioIdleScheduler::new(rt.handle().clone(), Duration::from_millis(1));
    let (tx, rx) = std::sync::mpsc::channel();

    scheduler.schedule(Box::pin(async move {
        let _ = tx.send(42);
    }));

    let value = rx.recv_timeout(Duration::from_secs(5)).expect("idle task ran");
    assert_eq!(value, 42);
}

#[test]
fn test_tokio_idle_scheduler_cancel_before_fire() {
    let rt = create_runtime();
    let scheduler = TokioIdleScheduler::new(rt.handle().clone(), Duration::from_millis(200));
    let counter = Arc::new(AtomicUsize::new(0));

    let handle = scheduler.schedule(counting_task(&counter, 1));
    assert_eq!(scheduler.pending_len(), 1);
    scheduler.cancel(handle);
    assert_eq!(scheduler.pending_len(), 0);

    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

fn poison<T: Send>(mutex: &Mutex<T>) {
    std::thread::scope(|s| {
        let _ = s
            .spawn(|| {
                let _guard = mutex.lock().unwrap();
                panic!("poison");
            })
            .join();
    });
    assert!(mutex.is_poisoned());
}

#[test]
fn test_idle_queue_keeps_tasks_after_poison() {
    let rt = create_runtime();
    let queue = IdleQueue::new();
    let counter = Arc::new(AtomicUsize::new(0));
    poison(&queue.queue);

    let dropped = queue.schedule(counting_task(&counter, 1));
    queue.schedule(counting_task(&counter, 10));
    assert_eq!(queue.len(), 2);
    queue.cancel(dropped);
    assert_eq!(queue.len(), 1);

    while let Some(task) = queue.take_next() {
        rt.block_on(task);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 10);
}

#[test]
fn test_tokio_idle_scheduler_runs_task_after_poison() {
    let rt = create_runtime();
    let scheduler = TokioIdleScheduler::new(rt.handle().clone(), Duration::from_millis(1));
    poison(&*scheduler.pending);
    let (tx, rx) = std::sync::mpsc::channel();

    scheduler.schedule(Box::pin(async move {
        let _ = tx.send(7);
    }));

    let value = rx.recv_timeout(Duration::from_secs(5)).expect("idle task ran");
    assert_eq!(value, 7);
    assert_eq!(scheduler.pending_len(), 0);
}
