use std::{
    cell::RefCell,
    collections::HashSet,
    sync::{Mutex, OnceLock},
};

use crate::error::ManagerError;
use crate::supervisor::Supervisor;

/// Global lock for environment variable modifications in tests.
/// All tests that modify environment variables should acquire this lock
/// to prevent race conditions between parallel test executions.
pub static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Supervisor operations as recorded by [`RecordingSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorCall {
    Reload,
    Register,
    Restart,
    Stop,
    IsActive,
    QueryStatus,
    StreamLogs,
    Deregister,
}

#[derive(Debug, Default)]
struct FakeRegistry {
    calls: Vec<SupervisorCall>,
    failing: HashSet<SupervisorCall>,
    enabled: bool,
    active: bool,
}

/// In-memory supervisor that records calls and models enable/active state.
#[derive(Debug, Default)]
pub struct RecordingSupervisor {
    state: RefCell<FakeRegistry>,
}

impl RecordingSupervisor {
    /// Makes every later `call` fail like a non-zero `systemctl` exit.
    pub fn fail_on(&self, call: SupervisorCall) {
        self.state.borrow_mut().failing.insert(call);
    }

    /// Marks the unit as already running, as after a previous install.
    pub fn set_active(&self, active: bool) {
        self.state.borrow_mut().active = active;
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.state.borrow().calls.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().active
    }

    fn record(
        &self,
        call: SupervisorCall,
        apply: impl FnOnce(&mut FakeRegistry),
    ) -> Result<(), ManagerError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        if state.failing.contains(&call) {
            return Err(ManagerError::ExternalCommand {
                command: format!("fake {call:?}"),
                code: Some(1),
            });
        }
        apply(&mut *state);
        Ok(())
    }
}

impl Supervisor for RecordingSupervisor {
    fn reload(&self) -> Result<(), ManagerError> {
        self.record(SupervisorCall::Reload, |_| {})
    }

    fn register(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::Register, |state| {
            state.enabled = true;
            state.active = true;
        })
    }

    fn restart(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::Restart, |state| state.active = true)
    }

    fn stop(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::Stop, |state| state.active = false)
    }

    fn is_active(&self, _unit: &str) -> Result<bool, ManagerError> {
        self.record(SupervisorCall::IsActive, |_| {})?;
        Ok(self.is_running())
    }

    fn query_status(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::QueryStatus, |_| {})
    }

    fn stream_logs(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::StreamLogs, |_| {})
    }

    fn deregister(&self, _unit: &str) -> Result<(), ManagerError> {
        self.record(SupervisorCall::Deregister, |state| {
            state.enabled = false;
            state.active = false;
        })
    }
}
