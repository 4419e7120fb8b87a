    use super::*;
    use crate::event_loop::{loop_state, schedule_component_init, step, submit_job};
    use crate::state::StepOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Thread-local state must not leak between tests, so each one gets its
    /// own OS thread.
    fn on_fresh_thread<F>(f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        thread::spawn(f).join().expect("test thread panicked");
    }

    #[test]
    fn test_register_and_unregister() {
        on_fresh_thread(|| {
            assert_eq!(context_state(), ContextState::Uninitialized);

            let handle = register("tc-basic").unwrap();
            assert_eq!(handle.name(), "tc-basic");
            assert_eq!(handle.thread_id(), thread::current().id());
            assert_eq!(context_state(), ContextState::Active);
            assert_eq!(current_name().unwrap(), "tc-basic");
            assert!(is_registered("tc-basic"));

            unregister().unwrap();
            assert_eq!(context_state(), ContextState::TornDown);
            assert!(!is_registered("tc-basic"));
        });
    }

    #[test]
    fn test_double_register_fails() {
        on_fresh_thread(|| {
            register("tc-double").unwrap();

            let err = register("tc-double-again").unwrap_err();
            assert!(
                matches!(err, RunLoopError::AlreadyRegistered { ref name } if name == "tc-double")
            );
            // The failed attempt must not claim its name.
            assert!(!is_registered("tc-double-again"));

            unregister().unwrap();
        });
    }

    #[test]
    fn test_register_after_unregister() {
        on_fresh_thread(|| {
            register("tc-cycle").unwrap();
            unregister().unwrap();

            register("tc-cycle").unwrap();
            assert_eq!(context_state(), ContextState::Active);
            unregister().unwrap();
        });
    }

    #[test]
    fn test_unregister_without_register() {
        on_fresh_thread(|| {
            assert!(matches!(unregister(), Err(RunLoopError::NotRegistered)));

            register("tc-unreg-twice").unwrap();
            unregister().unwrap();
            assert!(matches!(unregister(), Err(RunLoopError::NotRegistered)));
        });
    }

    #[test]
    fn test_operations_require_context() {
        on_fresh_thread(|| {
            assert!(matches!(
                schedule_component_init(|| {}),
                Err(RunLoopError::NotRegistered)
            ));
            assert!(matches!(step(), Err(RunLoopError::NotRegistered)));
            assert!(matches!(
                crate::event_loop::run(),
                Err(RunLoopError::NotRegistered)
            ));
            assert!(matches!(loop_state(), Err(RunLoopError::NotRegistered)));
            assert!(matches!(current_handle(), Err(RunLoopError::NotRegistered)));
            assert!(matches!(current_name(), Err(RunLoopError::NotRegistered)));
        });
    }

    #[test]
    fn test_operations_fail_after_unregister() {
        on_fresh_thread(|| {
            register("tc-after-teardown").unwrap();
            unregister().unwrap();

            assert!(matches!(step(), Err(RunLoopError::NotRegistered)));
            assert!(matches!(
                schedule_component_init(|| {}),
                Err(RunLoopError::NotRegistered)
            ));
        });
    }

    #[test]
    fn test_name_in_use_by_other_thread() {
        let (registered_tx, registered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let owner = thread::spawn(move || {
            register("tc-shared-name").unwrap();
            registered_tx.send(()).unwrap();
            release_rx.recv().unwrap();
            unregister().unwrap();
        });

        registered_rx.recv().unwrap();
        on_fresh_thread(|| {
            let err = register("tc-shared-name").unwrap_err();
            assert!(matches!(err, RunLoopError::NameInUse(ref name) if name == "tc-shared-name"));
            assert_eq!(context_state(), ContextState::Uninitialized);
        });

        release_tx.send(()).unwrap();
        owner.join().unwrap();

        // Released names can be claimed again.
        on_fresh_thread(|| {
            register("tc-shared-name").unwrap();
            unregister().unwrap();
        });
    }

    #[test]
    fn test_submit_after_unregister_is_unknown_thread() {
        on_fresh_thread(|| {
            let handle = register("tc-late-submit").unwrap();
            unregister().unwrap();

            let err = submit_job("tc-late-submit", || {}).unwrap_err();
            assert!(matches!(err, RunLoopError::UnknownThread(_)));

            let err = handle.submit(|| {}).unwrap_err();
            assert!(matches!(err, RunLoopError::UnknownThread(_)));
            assert!(!handle.is_alive());
        });
    }

    #[test]
    fn test_unregister_discards_pending_work() {
        on_fresh_thread(|| {
            let ran = Arc::new(AtomicUsize::new(0));
            let handle = register("tc-discard").unwrap();

            for _ in 0..3 {
                let ran = ran.clone();
                schedule_component_init(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
            for _ in 0..2 {
                let ran = ran.clone();
                handle
                    .submit(move || {
                        ran.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
            }

            unregister().unwrap();
            assert_eq!(ran.load(Ordering::SeqCst), 0);

            // A fresh context starts with empty queues.
            register("tc-discard").unwrap();
            assert_eq!(step().unwrap(), StepOutcome::WouldBlock);
            assert_eq!(ran.load(Ordering::SeqCst), 0);
            unregister().unwrap();
        });
    }

    #[test]
    fn test_thread_exit_tears_down_context() {
        let handle = thread::spawn(|| register("tc-exit-without-unregister").unwrap())
            .join()
            .unwrap();

        assert!(!handle.is_alive());
        assert!(!is_registered("tc-exit-without-unregister"));
        assert!(matches!(
            submit_job("tc-exit-without-unregister", || {}),
            Err(RunLoopError::UnknownThread(_))
        ));
    }

    #[test]
    fn test_is_registered_by_id() {
        on_fresh_thread(|| {
            let id = thread::current().id();
            assert!(!is_registered(id));

            register("tc-by-id").unwrap();
            assert!(is_registered(id));
            assert_eq!(current_handle().unwrap().thread_id(), id);

            unregister().unwrap();
            assert!(!is_registered(id));
        });
    }
