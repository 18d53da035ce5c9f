//! SSH session client
//!
//! One session per backup attempt or connectivity probe; sessions are never
//! shared across devices or cycles. libssh2 is blocking, so each attempt
//! runs on the blocking thread pool and the async surface stays thin.
//!
//! `perform_backup` sequence per attempt:
//! 1. Validate credentials (no session opened on failure)
//! 2. Compute the artifact pair names from device name + local timestamp
//! 3. Ensure local destination directories
//! 4. Open session; run snapshot command, then export command
//! 5. Open SFTP; download snapshot, then export
//! 6. Best-effort remove both remote artifacts (warnings only)
//! 7. Close the session on every exit path

use std::fs::{self, File};
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, warn};

use super::commands;
use super::errors::{ConnectErrorKind, SessionError, SessionResult};
use super::{ArtifactPair, BackupExecutor};
use crate::artifact::{safe_name, ArtifactKind, ParsedArtifactName};
use crate::registry::Device;

/// SSH-backed backup executor.
pub struct SshBackupClient {
    backup_root: PathBuf,
    connect_timeout: Duration,
}

impl SshBackupClient {
    pub fn new(backup_root: PathBuf, connect_timeout: Duration) -> Self {
        Self {
            backup_root,
            connect_timeout,
        }
    }

    fn plan(&self, device: &Device) -> BackupPlan {
        let stamp = Local::now().naive_local();
        let safe = safe_name(&device.name);
        let backup = ParsedArtifactName::new(&device.name, ArtifactKind::Backup, stamp);
        let export = ParsedArtifactName::new(&device.name, ArtifactKind::Export, stamp);
        let device_dir = self.backup_root.join(&safe);

        BackupPlan {
            // RouterOS appends the extension itself, so commands get the
            // base name while transfers address the full file name.
            backup_base: backup.base_name(),
            export_base: export.base_name(),
            local_backup: device_dir
                .join(ArtifactKind::Backup.subdir())
                .join(backup.file_name()),
            local_export: device_dir
                .join(ArtifactKind::Export.subdir())
                .join(export.file_name()),
        }
    }
}

#[async_trait]
impl BackupExecutor for SshBackupClient {
    async fn perform_backup(&self, device: &Device) -> SessionResult<ArtifactPair> {
        require_credentials(device)?;

        let plan = self.plan(device);
        let device = device.clone();
        let timeout = self.connect_timeout;

        tokio::task::spawn_blocking(move || blocking_backup(&device, &plan, timeout))
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))?
    }

    async fn test_connection(&self, device: &Device) -> SessionResult<()> {
        require_credentials(device)?;

        let device = device.clone();
        let timeout = self.connect_timeout;

        tokio::task::spawn_blocking(move || {
            let session = open_session(&device, timeout)?;
            let result = run_command(&session, commands::STATUS_PROBE).map(|_| ());
            close_session(&session);
            result
        })
        .await
        .map_err(|e| SessionError::Worker(e.to_string()))?
    }
}

struct BackupPlan {
    backup_base: String,
    export_base: String,
    local_backup: PathBuf,
    local_export: PathBuf,
}

impl BackupPlan {
    fn remote_backup_file(&self) -> String {
        format!("{}.backup", self.backup_base)
    }

    fn remote_export_file(&self) -> String {
        format!("{}.rsc", self.export_base)
    }
}

fn require_credentials(device: &Device) -> SessionResult<()> {
    let field = if device.host.trim().is_empty() {
        Some("host")
    } else if device.username.trim().is_empty() {
        Some("username")
    } else if device.password.is_empty() {
        Some("password")
    } else {
        None
    };

    match field {
        Some(field) => Err(SessionError::InvalidDevice {
            name: device.name.clone(),
            field,
        }),
        None => Ok(()),
    }
}

fn blocking_backup(
    device: &Device,
    plan: &BackupPlan,
    timeout: Duration,
) -> SessionResult<ArtifactPair> {
    for path in [&plan.local_backup, &plan.local_export] {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::LocalIo {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let session = open_session(device, timeout)?;
    let result = (|| -> SessionResult<ArtifactPair> {
        run_command(&session, &commands::save_backup(&plan.backup_base))?;
        run_command(&session, &commands::export_config(&plan.export_base))?;

        let sftp = session
            .sftp()
            .map_err(|e| SessionError::TransferChannel {
                detail: e.to_string(),
            })?;
        download(&sftp, &plan.remote_backup_file(), &plan.local_backup)?;
        download(&sftp, &plan.remote_export_file(), &plan.local_export)?;

        // Advisory cleanup: device-side removal failures never fail the
        // backup, the artifacts are already local.
        for remote in [plan.remote_backup_file(), plan.remote_export_file()] {
            if let Err(e) = run_command(&session, &commands::remove_file(&remote)) {
                warn!(
                    device = %device.name,
                    file = %remote,
                    error = %e,
                    "remote artifact cleanup failed"
                );
            }
        }

        Ok(ArtifactPair {
            backup_path: plan.local_backup.clone(),
            export_path: plan.local_export.clone(),
        })
    })();
    close_session(&session);

    result
}

/// Opens and authenticates one SSH session within the connect bound.
fn open_session(device: &Device, timeout: Duration) -> SessionResult<ssh2::Session> {
    let host = device.host.trim().to_string();
    let port = device.port;
    let connect_err = |kind: ConnectErrorKind, detail: String| SessionError::Connect {
        host: host.clone(),
        port,
        kind,
        detail,
    };

    let addr = (host.as_str(), port)
        .to_socket_addrs()
        .map_err(|e| connect_err(ConnectErrorKind::Fatal, format!("resolve failed: {e}")))?
        .next()
        .ok_or_else(|| {
            connect_err(
                ConnectErrorKind::Fatal,
                "resolved to no addresses".to_string(),
            )
        })?;

    let tcp = TcpStream::connect_timeout(&addr, timeout)
        .map_err(|e| connect_err(classify_io_error(&e), e.to_string()))?;

    let mut session = ssh2::Session::new()
        .map_err(|e| connect_err(ConnectErrorKind::Fatal, e.to_string()))?;
    session.set_timeout(timeout.as_millis() as u32);
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| connect_err(ConnectErrorKind::Fatal, e.to_string()))?;

    session
        .userauth_password(device.username.trim(), &device.password)
        .map_err(|e| connect_err(ConnectErrorKind::AuthFailed, e.to_string()))?;
    if !session.authenticated() {
        return Err(connect_err(
            ConnectErrorKind::AuthFailed,
            "authentication was not accepted".to_string(),
        ));
    }

    debug!(host = %host, port, "session established");
    Ok(session)
}

fn classify_io_error(e: &std::io::Error) -> ConnectErrorKind {
    use std::io::ErrorKind;
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => ConnectErrorKind::Timeout,
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected => ConnectErrorKind::Reset,
        _ => ConnectErrorKind::Fatal,
    }
}

/// Runs one command line to completion, capturing stdout and stderr
/// separately.
///
/// A non-zero exit status fails even with empty stderr; the error detail is
/// stderr, else stdout, else a generic exit-code message.
fn run_command(session: &ssh2::Session, command: &str) -> SessionResult<String> {
    let command_err = |detail: String| SessionError::Command {
        command: command.to_string(),
        detail,
    };

    let mut channel = session
        .channel_session()
        .map_err(|e| command_err(e.to_string()))?;
    channel
        .exec(command)
        .map_err(|e| command_err(e.to_string()))?;

    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .map_err(|e| command_err(e.to_string()))?;
    let mut stderr = String::new();
    channel
        .stderr()
        .read_to_string(&mut stderr)
        .map_err(|e| command_err(e.to_string()))?;

    channel
        .wait_close()
        .map_err(|e| command_err(e.to_string()))?;
    let status = channel
        .exit_status()
        .map_err(|e| command_err(e.to_string()))?;

    if status != 0 {
        return Err(command_err(failure_detail(&stderr, &stdout, status)));
    }

    Ok(stdout)
}

/// Best-available failure text: stderr, else stdout, else the exit code.
fn failure_detail(stderr: &str, stdout: &str, status: i32) -> String {
    if !stderr.trim().is_empty() {
        stderr.trim().to_string()
    } else if !stdout.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        format!("exit code {status}")
    }
}

/// Downloads one remote file, remote root-relative, to a local path.
fn download(sftp: &ssh2::Sftp, remote_file: &str, local: &Path) -> SessionResult<()> {
    let transfer_err = |detail: String| SessionError::Transfer {
        remote: remote_file.to_string(),
        detail,
    };

    if let Some(parent) = local.parent() {
        fs::create_dir_all(parent).map_err(|e| SessionError::LocalIo {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let remote_path = PathBuf::from(format!("/{remote_file}"));
    let mut remote = sftp
        .open(&remote_path)
        .map_err(|e| transfer_err(e.to_string()))?;

    let mut local_file = File::create(local).map_err(|e| SessionError::LocalIo {
        path: local.to_path_buf(),
        source: e,
    })?;
    std::io::copy(&mut remote, &mut local_file).map_err(|e| transfer_err(e.to_string()))?;

    Ok(())
}

/// Best-effort disconnect; the attempt's outcome is already decided.
fn close_session(session: &ssh2::Session) {
    if let Err(e) = session.disconnect(None, "backup complete", None) {
        debug!(error = %e, "session disconnect failed");
    }
}
