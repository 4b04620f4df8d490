//! Acquisition and storage of the bot token.
use std::{
    env, fmt,
    io::{self, BufRead, IsTerminal, Write},
    path::Path,
};

use nix::sys::termios::{LocalFlags, SetArg, Termios, tcgetattr, tcsetattr};
use tracing::{debug, info};

use crate::constants::{SECRET_FILE_MODE, TOKEN_VAR};
use crate::error::ManagerError;
use crate::files::write_atomic;

/// The bot credential. Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretMaterial(String);

impl SecretMaterial {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The single `KEY=value` line stored in the env file.
    fn env_line(&self) -> String {
        format!("{TOKEN_VAR}={}\n", self.0)
    }
}

impl fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretMaterial(<redacted>)")
    }
}

/// Where the token came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Environment,
    Prompt,
}

/// Reads the token from `BOT_TOKEN`, or prompts for it with echo disabled.
pub fn acquire_secret() -> Result<SecretMaterial, ManagerError> {
    let (secret, source) = acquire_secret_with(env::var(TOKEN_VAR).ok(), prompt_masked)?;
    info!("using {TOKEN_VAR} from {source:?}");
    Ok(secret)
}

/// Prefers a non-empty `from_env`, otherwise calls `prompt`.
///
/// The prompted value is used as typed, even when empty.
pub fn acquire_secret_with<F>(
    from_env: Option<String>,
    prompt: F,
) -> Result<(SecretMaterial, SecretSource), ManagerError>
where
    F: FnOnce() -> io::Result<String>,
{
    match from_env.filter(|token| !token.is_empty()) {
        Some(token) => Ok((SecretMaterial(token), SecretSource::Environment)),
        None => {
            let token = prompt().map_err(ManagerError::Prompt)?;
            Ok((SecretMaterial(token), SecretSource::Prompt))
        }
    }
}

/// Writes the token to `path` as `BOT_TOKEN=<token>`.
///
/// Destructive: any existing file at `path` is replaced without asking. The
/// file is 0600 from creation and owned by `owner` before it holds the token.
pub fn persist_secret(
    secret: &SecretMaterial,
    path: &Path,
    owner: Option<(u32, u32)>,
) -> Result<(), ManagerError> {
    write_atomic(path, secret.env_line().as_bytes(), SECRET_FILE_MODE, owner)?;
    info!("stored {TOKEN_VAR} in {}", path.display());
    Ok(())
}

/// Restores the terminal's echo setting when dropped.
struct EchoGuard {
    original: Termios,
}

impl EchoGuard {
    fn disable() -> io::Result<Self> {
        let stdin = io::stdin();
        let original = tcgetattr(&stdin)?;
        let mut silent = original.clone();
        silent.local_flags.remove(LocalFlags::ECHO);
        silent.local_flags.insert(LocalFlags::ECHONL);
        tcsetattr(&stdin, SetArg::TCSANOW, &silent)?;
        Ok(Self { original })
    }
}

impl Drop for EchoGuard {
    fn drop(&mut self) {
        let _ = tcsetattr(io::stdin(), SetArg::TCSANOW, &self.original);
    }
}

fn prompt_masked() -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "Enter {TOKEN_VAR}: ")?;
    stderr.flush()?;

    let _echo = if io::stdin().is_terminal() {
        Some(EchoGuard::disable()?)
    } else {
        debug!("stdin is not a terminal; reading token without masking");
        None
    };

    read_answer(io::stdin().lock())
}

/// Reads one answer line. End of input before any byte is an error, so a
/// closed stdin is not mistaken for an empty token.
fn read_answer(mut input: impl BufRead) -> io::Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stdin closed before {TOKEN_VAR} was entered"),
        ));
    }
    Ok(strip_line_ending(line))
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
