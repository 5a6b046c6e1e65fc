use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// One subprocess call: program, literal argument vector, working directory.
///
/// Arguments are kept as OS strings so paths reach the tool byte for byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl InvocationSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Shell-quoted rendering, for diagnostics only. Invocation never goes
    /// through a shell, and non-UTF-8 bytes are shown lossily.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|word| shell_quote(&word.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// How a tool process ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitDescription {
    /// Normal exit with a status code.
    Code { code: i32 },
    /// Terminated by a signal (unix only).
    Signal { signal: i32, name: Option<String> },
    /// The platform reported neither.
    Unknown,
}

impl ExitDescription {
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::Code { code } => Some(*code),
            Self::Signal { .. } | Self::Unknown => None,
        }
    }
}

impl fmt::Display for ExitDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code { code } => write!(f, "exit status {code}"),
            Self::Signal {
                signal,
                name: Some(name),
            } => write!(f, "killed by signal {signal} ({name})"),
            Self::Signal { signal, name: None } => write!(f, "killed by signal {signal}"),
            Self::Unknown => f.write_str("unknown exit status"),
        }
    }
}

/// Captured output of one finished subprocess.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationResult {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit: ExitDescription,
    pub duration_ms: u64,
}

impl InvocationResult {
    /// A clean zero exit with no output.
    #[must_use]
    pub fn success() -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit: ExitDescription::Code { code: 0 },
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn exited_with(&self, expected: i32) -> bool {
        self.exit.code() == Some(expected)
    }

    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    #[must_use]
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_quotes_only_when_needed() {
        let spec = InvocationSpec::new("bin/align/phyluce_align_convert_one_align_to_another")
            .args(["--alignments", "/tmp/test expected/mafft", "--cores", "1"])
            .arg("it's");
        assert_eq!(
            spec.command_line(),
            "bin/align/phyluce_align_convert_one_align_to_another --alignments \
             '/tmp/test expected/mafft' --cores 1 'it'\\''s'"
        );
    }

    #[test]
    fn empty_argument_is_visible_in_command_line() {
        let spec = InvocationSpec::new("/bin/tool").arg("");
        assert_eq!(spec.command_line(), "/bin/tool ''");
    }

    #[test]
    fn signal_exit_never_matches_an_expected_code() {
        let result = InvocationResult {
            exit: ExitDescription::Signal {
                signal: 9,
                name: None,
            },
            ..InvocationResult::success()
        };
        assert!(!result.exited_with(0));
        assert!(InvocationResult::success().exited_with(0));
    }
}
