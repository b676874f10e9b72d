use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::capability::CapabilityError;
use crate::session::RoundStatus;

/// Whether the user can currently see the trainer (terminal focus)
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Visibility {
    #[strum(serialize = "visible")]
    Visible,
    #[strum(serialize = "hidden")]
    Hidden,
}

/// Opaque token for an acquired "keep the display on" request
#[derive(Debug, PartialEq, Eq)]
pub struct WakeLockHandle(u64);

impl WakeLockHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Platform capability that keeps the display from sleeping
pub trait WakeLock {
    fn acquire(&mut self) -> Result<WakeLockHandle, CapabilityError>;
    /// Releasing a handle that is no longer held must be a no-op
    fn release(&mut self, handle: WakeLockHandle);

    /// Whether `handle` still keeps the display on. The platform may drop a
    /// lock on its own.
    fn is_active(&mut self, _handle: &WakeLockHandle) -> bool {
        true
    }
}

/// Used when keep-awake is turned off or nothing suitable exists
pub struct NoWakeLock;

impl WakeLock for NoWakeLock {
    fn acquire(&mut self) -> Result<WakeLockHandle, CapabilityError> {
        Err(CapabilityError::Unsupported)
    }

    fn release(&mut self, _handle: WakeLockHandle) {}
}

/// How long a fresh inhibitor gets to fail (no session bus, no permission)
/// before it counts as holding the lock
const INHIBITOR_SETTLE: Duration = Duration::from_millis(100);

/// Holds a long-running inhibitor process (`systemd-inhibit`, `caffeinate`)
/// for as long as the lock is held.
pub struct CommandWakeLock {
    command: Vec<String>,
    child: Option<(u64, Child)>,
    next_id: u64,
}

impl CommandWakeLock {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: None,
            next_id: 1,
        }
    }

    /// Inhibitor command for the current platform, if there is one
    pub fn platform_command() -> Option<Vec<String>> {
        let parts: &[&str] = if cfg!(target_os = "linux") {
            &[
                "systemd-inhibit",
                "--what=idle:sleep",
                "--who=jabs",
                "--why=round in progress",
                "sleep",
                "infinity",
            ]
        } else if cfg!(target_os = "macos") {
            &["caffeinate", "-d", "-i"]
        } else {
            return None;
        };
        Some(parts.iter().map(|s| s.to_string()).collect())
    }

    pub fn is_holding(&mut self) -> bool {
        self.reap_exited();
        self.child.is_some()
    }

    /// Forget an inhibitor that has exited on its own
    fn reap_exited(&mut self) {
        let Some((id, child)) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!(id = *id, %status, "inhibitor exited, wake lock lost");
                self.child = None;
            }
            Ok(None) => {}
            Err(e) => warn!(id = *id, "cannot poll inhibitor: {}", e),
        }
    }

    fn stop_child(&mut self) {
        if let Some((id, mut child)) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(id, "inhibitor already gone: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl WakeLock for CommandWakeLock {
    fn acquire(&mut self) -> Result<WakeLockHandle, CapabilityError> {
        // never hold two inhibitors at once
        self.stop_child();

        let (program, args) = self
            .command
            .split_first()
            .ok_or(CapabilityError::Unsupported)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CapabilityError::Unsupported,
                std::io::ErrorKind::PermissionDenied => CapabilityError::Denied(e.to_string()),
                _ => CapabilityError::Io(e),
            })?;

        thread::sleep(INHIBITOR_SETTLE);
        match child.try_wait() {
            Ok(None) => {}
            Ok(Some(status)) => {
                return Err(CapabilityError::Denied(format!("{program} exited with {status}")));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CapabilityError::Io(e));
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.child = Some((id, child));
        Ok(WakeLockHandle(id))
    }

    fn release(&mut self, handle: WakeLockHandle) {
        self.reap_exited();
        if matches!(self.child, Some((id, _)) if id == handle.0) {
            self.stop_child();
        }
    }

    fn is_active(&mut self, handle: &WakeLockHandle) -> bool {
        self.reap_exited();
        matches!(self.child, Some((id, _)) if id == handle.0)
    }
}

impl Drop for CommandWakeLock {
    fn drop(&mut self) {
        self.stop_child();
    }
}

/// Keeps at most one wake lock, held exactly while a round is running and
/// the trainer is visible.
pub struct WakeLockManager {
    lock: Box<dyn WakeLock>,
    held: Option<WakeLockHandle>,
    visibility: Visibility,
    wanted: bool,
}

impl WakeLockManager {
    pub fn new(lock: Box<dyn WakeLock>) -> Self {
        Self {
            lock,
            held: None,
            visibility: Visibility::Visible,
            wanted: false,
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Reconcile the lock with the current round status.
    ///
    /// A failed acquisition is retried only when the lock becomes wanted
    /// again (a new round, or the trainer becoming visible).
    pub fn sync(&mut self, status: RoundStatus) {
        let wanted = status == RoundStatus::Running && self.visibility == Visibility::Visible;

        if wanted && !self.wanted && self.held.is_none() {
            match self.lock.acquire() {
                Ok(handle) => {
                    info!(id = handle.id(), "wake lock acquired");
                    self.held = Some(handle);
                }
                Err(e) => warn!("wake lock unavailable: {}", e),
            }
        } else if !wanted {
            self.release();
        }

        self.wanted = wanted;
    }

    pub fn on_visibility(&mut self, visibility: Visibility, status: RoundStatus) {
        if visibility == self.visibility {
            return;
        }
        debug!(%visibility, "visibility changed");
        self.visibility = visibility;
        self.sync(status);
    }

    /// Drop a lock the platform has taken back. It is not re-acquired until
    /// the lock becomes wanted again.
    pub fn refresh(&mut self) {
        let lost = match &self.held {
            Some(handle) => !self.lock.is_active(handle),
            None => false,
        };
        if lost {
            if let Some(handle) = self.held.take() {
                warn!(id = handle.id(), "wake lock lost");
                self.lock.release(handle);
            }
        }
    }

    /// Unconditional release, for shutdown
    pub fn teardown(&mut self) {
        self.release();
        self.wanted = false;
    }

    fn release(&mut self) {
        if let Some(handle) = self.held.take() {
            info!(id = handle.id(), "wake lock released");
            self.lock.release(handle);
        }
    }
}

impl Drop for WakeLockManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        acquired: u32,
        released: Vec<u64>,
        fail: bool,
        lost: bool,
    }

    struct FakeLock(Rc<RefCell<Log>>);

    impl WakeLock for FakeLock {
        fn acquire(&mut self) -> Result<WakeLockHandle, CapabilityError> {
            let mut log = self.0.borrow_mut();
            if log.fail {
                return Err(CapabilityError::Denied("battery saver".into()));
            }
            log.acquired += 1;
            Ok(WakeLockHandle::new(log.acquired as u64))
        }

        fn release(&mut self, handle: WakeLockHandle) {
            self.0.borrow_mut().released.push(handle.id());
        }

        fn is_active(&mut self, _handle: &WakeLockHandle) -> bool {
            !self.0.borrow().lost
        }
    }

    fn manager() -> (WakeLockManager, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        (WakeLockManager::new(Box::new(FakeLock(log.clone()))), log)
    }

    #[test]
    fn test_acquires_while_running_and_releases_after() {
        let (mut mgr, log) = manager();
        mgr.sync(RoundStatus::Idle);
        assert!(!mgr.is_held());

        mgr.sync(RoundStatus::Running);
        mgr.sync(RoundStatus::Running);
        assert!(mgr.is_held());
        assert_eq!(log.borrow().acquired, 1);

        mgr.sync(RoundStatus::RoundOver);
        assert!(!mgr.is_held());
        assert_eq!(log.borrow().released, vec![1]);
    }

    #[test]
    fn test_hidden_releases_and_visible_reacquires() {
        let (mut mgr, log) = manager();
        mgr.sync(RoundStatus::Running);

        mgr.on_visibility(Visibility::Hidden, RoundStatus::Running);
        assert!(!mgr.is_held());
        assert_eq!(log.borrow().released, vec![1]);

        mgr.on_visibility(Visibility::Visible, RoundStatus::Running);
        assert!(mgr.is_held());
        assert_eq!(log.borrow().acquired, 2);
    }

    #[test]
    fn test_visible_while_not_running_does_not_acquire() {
        let (mut mgr, log) = manager();
        mgr.on_visibility(Visibility::Hidden, RoundStatus::RoundOver);
        mgr.on_visibility(Visibility::Visible, RoundStatus::RoundOver);
        assert!(!mgr.is_held());
        assert_eq!(log.borrow().acquired, 0);
    }

    #[test]
    fn test_starting_while_hidden_waits_for_visibility() {
        let (mut mgr, log) = manager();
        mgr.on_visibility(Visibility::Hidden, RoundStatus::Idle);
        mgr.sync(RoundStatus::Running);
        assert!(!mgr.is_held());

        mgr.on_visibility(Visibility::Visible, RoundStatus::Running);
        assert!(mgr.is_held());
        assert_eq!(log.borrow().acquired, 1);
    }

    #[test]
    fn test_failure_is_not_retried_every_sync() {
        let (mut mgr, log) = manager();
        log.borrow_mut().fail = true;
        mgr.sync(RoundStatus::Running);
        assert!(!mgr.is_held());

        log.borrow_mut().fail = false;
        mgr.sync(RoundStatus::Running);
        assert!(!mgr.is_held());

        // next round tries again
        mgr.sync(RoundStatus::RoundOver);
        mgr.sync(RoundStatus::Running);
        assert!(mgr.is_held());
    }

    #[test]
    fn test_teardown_and_drop_release() {
        let (mut mgr, log) = manager();
        mgr.teardown();
        assert!(log.borrow().released.is_empty());

        mgr.sync(RoundStatus::Running);
        mgr.teardown();
        mgr.teardown();
        assert_eq!(log.borrow().released, vec![1]);

        mgr.sync(RoundStatus::Running);
        drop(mgr);
        assert_eq!(log.borrow().released, vec![1, 2]);
    }

    #[test]
    fn test_lost_lock_is_dropped_and_not_retried_until_wanted_again() {
        let (mut mgr, log) = manager();
        mgr.sync(RoundStatus::Running);
        mgr.refresh();
        assert!(mgr.is_held());

        log.borrow_mut().lost = true;
        mgr.refresh();
        assert!(!mgr.is_held());
        assert_eq!(log.borrow().released, vec![1]);

        log.borrow_mut().lost = false;
        mgr.sync(RoundStatus::Running);
        assert!(!mgr.is_held());

        mgr.sync(RoundStatus::RoundOver);
        mgr.sync(RoundStatus::Running);
        assert!(mgr.is_held());
        assert_eq!(log.borrow().acquired, 2);
    }

    #[test]
    fn test_no_wake_lock_is_unsupported() {
        assert!(matches!(
            NoWakeLock.acquire(),
            Err(CapabilityError::Unsupported)
        ));
    }

    #[test]
    fn test_command_wake_lock_missing_program() {
        let mut lock = CommandWakeLock::new(vec!["jabs-no-such-inhibitor-binary".into()]);
        assert!(matches!(lock.acquire(), Err(CapabilityError::Unsupported)));
        assert!(!lock.is_holding());

        let mut empty = CommandWakeLock::new(vec![]);
        assert!(matches!(empty.acquire(), Err(CapabilityError::Unsupported)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_wake_lock_holds_child_until_release() {
        let mut lock = CommandWakeLock::new(vec!["sleep".into(), "30".into()]);
        let handle = lock.acquire().unwrap();
        assert!(lock.is_holding());

        // stale handles are ignored
        lock.release(WakeLockHandle::new(handle.id() + 100));
        assert!(lock.is_holding());

        lock.release(handle);
        assert!(!lock.is_holding());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_wake_lock_failing_inhibitor_is_not_held() {
        let mut lock = CommandWakeLock::new(vec!["false".into()]);
        assert!(matches!(lock.acquire(), Err(CapabilityError::Denied(_))));
        assert!(!lock.is_holding());

        let mut lock = CommandWakeLock::new(vec!["sh".into(), "-c".into(), "exit 1".into()]);
        assert!(matches!(lock.acquire(), Err(CapabilityError::Denied(_))));
        assert!(!lock.is_holding());
    }

    #[cfg(unix)]
    #[test]
    fn test_manager_with_failing_inhibitor_holds_nothing() {
        let mut mgr = WakeLockManager::new(Box::new(CommandWakeLock::new(vec!["false".into()])));
        mgr.sync(RoundStatus::Running);
        assert!(!mgr.is_held());

        thread::sleep(Duration::from_millis(100));
        mgr.sync(RoundStatus::Running);
        mgr.refresh();
        assert!(!mgr.is_held());
    }

    #[cfg(unix)]
    #[test]
    fn test_inhibitor_dying_after_acquire_releases_the_lock() {
        let mut mgr = WakeLockManager::new(Box::new(CommandWakeLock::new(vec![
            "sh".into(),
            "-c".into(),
            "sleep 0.4; exit 1".into(),
        ])));
        mgr.sync(RoundStatus::Running);
        assert!(mgr.is_held());

        thread::sleep(Duration::from_millis(1000));
        mgr.refresh();
        assert!(!mgr.is_held());
    }
}
