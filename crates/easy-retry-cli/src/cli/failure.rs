//! Failures of a child process, classified for the retry policy.

use easy_retry::Classify;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::str::FromStr;
use thiserror::Error;

/// Kind of child failure, as written after `--on` or in `exceptions`:
/// `spawn`, `signal`, or a numeric exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FailureClass {
    /// The program could not be started at all.
    Spawn,
    /// The program was killed by a signal.
    Signal,
    /// The program exited with this non-zero code.
    Exit(i32),
}

impl FromStr for FailureClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spawn" => Ok(FailureClass::Spawn),
            "signal" => Ok(FailureClass::Signal),
            other => match other.parse::<i32>() {
                Ok(0) => Err("exit code 0 is success, not a failure class".to_string()),
                Ok(code) => Ok(FailureClass::Exit(code)),
                Err(_) => Err(format!(
                    "unknown failure class {other:?} (expected spawn, signal or an exit code)"
                )),
            },
        }
    }
}

impl TryFrom<String> for FailureClass {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FailureClass> for String {
    fn from(class: FailureClass) -> Self {
        class.to_string()
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureClass::Spawn => write!(f, "spawn"),
            FailureClass::Signal => write!(f, "signal"),
            FailureClass::Exit(code) => write!(f, "{}", code),
        }
    }
}

/// One failed run of the child program.
#[derive(Debug, Error)]
pub enum CommandFailure {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with status {code}")]
    Exit { program: String, code: i32 },
    #[error("{program} was terminated by a signal")]
    Signal { program: String },
}

impl CommandFailure {
    pub fn spawn(program: &str, source: io::Error) -> Self {
        CommandFailure::Spawn {
            program: program.to_string(),
            source,
        }
    }

    /// `Ok` for a zero exit status, otherwise the matching failure.
    pub fn check(program: &str, status: ExitStatus) -> Result<(), Self> {
        if status.success() {
            return Ok(());
        }
        Err(match status.code() {
            Some(code) => CommandFailure::Exit {
                program: program.to_string(),
                code,
            },
            None => CommandFailure::Signal {
                program: program.to_string(),
            },
        })
    }

    /// Exit code to report when this is the final failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandFailure::Exit { code, .. } => *code,
            CommandFailure::Spawn { .. } | CommandFailure::Signal { .. } => 1,
        }
    }
}

impl Classify for CommandFailure {
    type Kind = FailureClass;

    fn kind(&self) -> FailureClass {
        match self {
            CommandFailure::Spawn { .. } => FailureClass::Spawn,
            CommandFailure::Exit { code, .. } => FailureClass::Exit(*code),
            CommandFailure::Signal { .. } => FailureClass::Signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failure_classes() {
        assert_eq!("spawn".parse::<FailureClass>(), Ok(FailureClass::Spawn));
        assert_eq!("signal".parse::<FailureClass>(), Ok(FailureClass::Signal));
        assert_eq!("75".parse::<FailureClass>(), Ok(FailureClass::Exit(75)));
        assert!("0".parse::<FailureClass>().is_err());
        assert!("timeout".parse::<FailureClass>().is_err());
    }

    #[test]
    fn failure_kind_and_exit_code() {
        let exit = CommandFailure::Exit {
            program: "make".into(),
            code: 2,
        };
        assert_eq!(exit.kind(), FailureClass::Exit(2));
        assert_eq!(exit.exit_code(), 2);
        assert_eq!(exit.to_string(), "make exited with status 2");

        let spawn = CommandFailure::spawn("nope", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(spawn.kind(), FailureClass::Spawn);
        assert_eq!(spawn.exit_code(), 1);
    }

    #[test]
    fn failure_classes_in_toml() {
        #[derive(Deserialize)]
        struct Doc {
            on: Vec<FailureClass>,
        }
        let doc: Doc = toml::from_str(r#"on = ["spawn", "3"]"#).unwrap();
        assert_eq!(doc.on, vec![FailureClass::Spawn, FailureClass::Exit(3)]);
    }
}
