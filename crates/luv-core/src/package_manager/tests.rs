use super::*;
use crate::testing::{not_found, output, ScriptedExecutor};
use std::ffi::OsString;

fn tlmgr(executor: &Arc<ScriptedExecutor>) -> TlmgrBackend {
    TlmgrBackend::with_executor(
        PathBuf::from("/bin/tlmgr"),
        PathBuf::from("/project/.luv/texmf"),
        executor.clone(),
    )
}

#[test]
fn test_package_manager_is_available() {
    let pm = PackageManager::with_backend(Arc::new(NoOpBackend));
    assert!(!pm.is_available());
    assert_eq!(pm.backend_name(), "none");

    let executor = Arc::new(ScriptedExecutor::fixed(0, "", ""));
    let pm2 = PackageManager::with_backend(Arc::new(tlmgr(&executor)));
    assert!(pm2.is_available());
}

#[test]
fn test_noop_backend_reports_missing_tlmgr() {
    let pm = PackageManager::with_backend(Arc::new(NoOpBackend));
    let err = pm.install("tikz").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LuvError>(),
        Some(LuvError::ToolNotFound { .. })
    ));
    assert_eq!(pm.search_file("/tikz.sty").unwrap(), None);
}

#[test]
fn test_install_success_runs_in_user_mode() {
    let executor = Arc::new(ScriptedExecutor::fixed(0, "install done", ""));
    let backend = tlmgr(&executor);

    let status = backend.install("pgf").unwrap();
    assert_eq!(status.state, InstallState::Complete);
    assert_eq!(status.message, None);

    let calls = executor.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].args, vec!["init-usertree"]);
    assert_eq!(
        calls[1].args,
        vec!["--usermode", "install", "--no-depends-at-all", "pgf"]
    );
    assert!(calls
        .iter()
        .all(|c| c.env == vec![("TEXMFHOME".to_string(), OsString::from("/project/.luv/texmf"))]));
}

#[test]
fn test_init_usertree_runs_once() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("init-usertree") {
            Ok(output(1, "", "Directory already exists"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let backend = tlmgr(&executor);

    backend.install("a").unwrap();
    backend.install("b").unwrap();
    let inits = executor
        .calls()
        .iter()
        .filter(|c| c.has_arg("init-usertree"))
        .count();
    assert_eq!(inits, 1);
}

#[test]
fn test_install_already_installed() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("install") {
            Ok(output(1, "", "tlmgr: package amsmath already installed"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let status = tlmgr(&executor).install("amsmath").unwrap();
    assert_eq!(status.state, InstallState::AlreadyInstalled);
    assert!(status.state.is_success());
}

#[test]
fn test_install_updmap_failure_counts_as_installed() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("install") {
            Ok(output(1, "install: lm", "updmap failed"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let status = tlmgr(&executor).install("lm").unwrap();
    assert_eq!(status.state, InstallState::FontMapWarning);
}

#[test]
fn test_install_falls_back_to_plain_install() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("--no-depends-at-all") {
            Ok(output(1, "", "dependency trouble"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let status = tlmgr(&executor).install("biblatex").unwrap();
    assert_eq!(status.state, InstallState::Complete);
    assert_eq!(executor.call_count(), 3);
    assert_eq!(
        executor.calls()[2].args,
        vec!["--usermode", "install", "biblatex"]
    );
}

#[test]
fn test_install_not_present_in_repository() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("install") {
            Ok(output(1, "", "package tikz not present in repository"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let status = tlmgr(&executor).install("tikz").unwrap();
    assert_eq!(status.state, InstallState::NotFound);
    assert!(!status.state.is_success());
}

#[test]
fn test_install_other_failure_keeps_output() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| {
        if inv.has_arg("install") {
            Ok(output(1, "", "network unreachable"))
        } else {
            Ok(output(0, "", ""))
        }
    }));
    let status = tlmgr(&executor).install("pgf").unwrap();
    assert_eq!(status.state, InstallState::Failed);
    assert!(status.message.unwrap().contains("network unreachable"));
}

#[test]
fn test_install_without_tlmgr_is_user_error() {
    let executor = Arc::new(ScriptedExecutor::missing());
    let err = tlmgr(&executor).install("pgf").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LuvError>(),
        Some(LuvError::ToolNotFound { .. })
    ));
}

#[test]
fn test_remove_outcomes() {
    let executor = Arc::new(ScriptedExecutor::new(|inv| match inv.args.last().map(String::as_str) {
        Some("pgf") => Ok(output(0, "", "")),
        Some("ghost") => Ok(output(1, "", "package ghost not installed")),
        _ => Ok(output(1, "", "permission denied")),
    }));
    let backend = tlmgr(&executor);

    assert_eq!(backend.remove("pgf").unwrap().state, RemoveState::Removed);
    assert_eq!(
        backend.remove("ghost").unwrap().state,
        RemoveState::NotInstalled
    );
    let failed = backend.remove("other").unwrap();
    assert_eq!(failed.state, RemoveState::Failed);
    assert!(failed.message.unwrap().contains("permission denied"));
}

#[test]
fn test_search_file_returns_raw_output() {
    let executor = Arc::new(ScriptedExecutor::fixed(0, "pgf:\n\ttexmf-dist/tex/latex/pgf/tikz.sty\n", ""));
    let backend = tlmgr(&executor);
    let result = backend.search_file("/tikz.sty").unwrap().unwrap();
    assert!(result.starts_with("pgf:"));
    assert_eq!(
        executor.calls()[0].args,
        vec!["search", "--global", "--file", "/tikz.sty"]
    );
}

#[test]
fn test_search_file_unavailable_or_empty() {
    let failing = Arc::new(ScriptedExecutor::fixed(1, "", "error"));
    assert_eq!(tlmgr(&failing).search_file("/x.sty").unwrap(), None);

    let empty = Arc::new(ScriptedExecutor::fixed(0, "   \n", ""));
    assert_eq!(tlmgr(&empty).search_file("/x.sty").unwrap(), None);

    let missing = Arc::new(ScriptedExecutor::new(|_| Err(not_found())));
    assert_eq!(tlmgr(&missing).search_file("/x.sty").unwrap(), None);
}
