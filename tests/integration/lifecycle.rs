#[path = "common/mod.rs"]
mod common;

use std::{fs, thread, time::Duration};

use botctl::{
    controller::ServiceController,
    error::{ManagerError, TemplateError},
    files::InstallLock,
    secret::SecretMaterial,
    test_utils::{RecordingSupervisor, SupervisorCall},
};
use common::{Sandbox, mode_of};
use tempfile::tempdir;

fn token(value: &str) -> impl FnOnce() -> Result<SecretMaterial, ManagerError> {
    let value = value.to_string();
    move || Ok(SecretMaterial::new(value))
}

#[test]
fn install_then_uninstall_round_trip() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());

    controller.install(token("T1")).expect("install");

    let unit = fs::read_to_string(sandbox.unit_path()).expect("unit file written");
    assert!(!unit.contains("{{"), "unresolved placeholder in:\n{unit}");
    assert!(unit.contains("User=alice"));
    assert!(unit.contains(&format!("WorkingDirectory={}", sandbox.repo.display())));
    assert!(unit.contains(&format!("EnvironmentFile={}", sandbox.env_path().display())));
    assert!(unit.contains(&format!(
        "ExecStart={} {}",
        sandbox.interpreter().display(),
        sandbox.repo.join("bot.py").display()
    )));
    assert!(!unit.contains("T1"), "token must not leak into the unit file");
    assert_eq!(mode_of(&sandbox.unit_path()), 0o644);

    assert_eq!(
        fs::read_to_string(sandbox.env_path()).expect("env file written"),
        "BOT_TOKEN=T1\n"
    );
    assert_eq!(mode_of(&sandbox.env_path()), 0o600);

    let supervisor = controller.supervisor();
    assert!(supervisor.is_enabled());
    assert!(supervisor.is_running());
    assert_eq!(
        supervisor.calls(),
        vec![
            SupervisorCall::IsActive,
            SupervisorCall::Reload,
            SupervisorCall::Register
        ]
    );

    let report = controller.uninstall().expect("uninstall");
    assert_eq!(report.removed, vec![sandbox.unit_path(), sandbox.env_path()]);
    assert!(!sandbox.unit_path().exists());
    assert!(!sandbox.env_path().exists());
    assert!(!supervisor.is_enabled());
    assert!(!supervisor.is_running());
}

#[test]
fn reinstall_overwrites_token_and_restarts() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());

    controller.install(token("first")).expect("first install");
    controller.install(token("second")).expect("second install");

    assert_eq!(
        fs::read_to_string(sandbox.env_path()).unwrap(),
        "BOT_TOKEN=second\n"
    );
    assert_eq!(mode_of(&sandbox.env_path()), 0o600);

    let calls = controller.supervisor().calls();
    assert_eq!(
        calls.iter().filter(|call| **call == SupervisorCall::Restart).count(),
        1,
        "only the reinstall should restart: {calls:?}"
    );
    assert_eq!(calls.last(), Some(&SupervisorCall::Restart));
}

#[test]
fn uninstall_with_nothing_installed_is_a_no_op() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());

    let report = controller.uninstall().expect("uninstall");
    assert!(report.is_empty());
    assert_eq!(
        controller.supervisor().calls(),
        vec![SupervisorCall::Deregister, SupervisorCall::Reload]
    );

    let again = controller.uninstall().expect("second uninstall");
    assert!(again.is_empty());
}

#[test]
fn missing_entrypoint_is_reported_without_touching_systemd() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    fs::remove_file(sandbox.repo.join("bot.py")).unwrap();
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());

    let err = controller.install(token("T1")).unwrap_err();
    assert!(matches!(err, ManagerError::Preflight { .. }));
    assert!(err.to_string().contains("bot.py"));
    assert!(controller.supervisor().calls().is_empty());
    assert!(!sandbox.env_path().exists());
    assert!(!sandbox.unit_path().exists());
}

#[test]
fn bad_template_leaves_previous_install_in_place() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());
    controller.install(token("T1")).expect("install");
    let installed_unit = fs::read_to_string(sandbox.unit_path()).unwrap();

    sandbox.write_template("[Service]\nUser={{USER}}\nEnvironment=HOME={{HOME}}\n");
    let err = controller.install(token("T2")).unwrap_err();

    assert!(matches!(
        err,
        ManagerError::Template(TemplateError::UnknownPlaceholder { ref name }) if name == "HOME"
    ));
    assert_eq!(fs::read_to_string(sandbox.unit_path()).unwrap(), installed_unit);
    assert_eq!(
        fs::read_to_string(sandbox.env_path()).unwrap(),
        "BOT_TOKEN=T1\n"
    );
}

#[test]
fn unreadable_template_fails_install() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    fs::remove_file(sandbox.repo.join("deploy/dtek-bot.service.tpl")).unwrap();
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());

    let err = controller.install(token("T1")).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Template(TemplateError::Unreadable { .. })
    ));
    assert_eq!(err.exit_code(), 66);
}

#[test]
fn register_failure_propagates() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let supervisor = RecordingSupervisor::default();
    supervisor.fail_on(SupervisorCall::Register);
    let controller = ServiceController::new(sandbox.config(), supervisor);

    let err = controller.install(token("T1")).unwrap_err();
    assert!(matches!(err, ManagerError::ExternalCommand { .. }));
    assert!(!controller.supervisor().is_enabled());
}

#[test]
fn stop_keeps_service_enabled() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let controller = ServiceController::new(sandbox.config(), RecordingSupervisor::default());
    controller.install(token("T1")).expect("install");

    controller.stop().expect("stop");
    assert!(controller.supervisor().is_enabled());
    assert!(!controller.supervisor().is_running());

    controller.restart().expect("restart");
    assert!(controller.supervisor().is_running());
}

#[test]
fn uninstall_waits_for_concurrent_lock_holder() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let config = sandbox.config();
    let held = InstallLock::acquire(&config.lock_path).expect("take lock");

    let controller = ServiceController::new(config, RecordingSupervisor::default());
    let handle = thread::spawn(move || controller.uninstall().map(|report| report.is_empty()));

    thread::sleep(Duration::from_millis(300));
    assert!(!handle.is_finished(), "uninstall should block on the lock");

    drop(held);
    let empty = handle.join().expect("uninstall thread").expect("uninstall");
    assert!(empty);
}
