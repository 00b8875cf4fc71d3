//! Process termination.

/// Exit status chosen by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Every cleanup step succeeded after a termination signal.
    Success,
    /// A cleanup step failed or timed out, a crash occurred, or shutdown was forced.
    Failure,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::Failure => 1,
        }
    }
}

/// The final, irreversible effect of every shutdown path.
pub trait ProcessExit: Send + Sync + 'static {
    fn exit(&self, code: ExitCode);
}

/// Terminates the current process via [`std::process::exit`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdExit;

impl ProcessExit for StdExit {
    fn exit(&self, code: ExitCode) {
        std::process::exit(code.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes() {
        assert_eq!(ExitCode::Success.code(), 0);
        assert_eq!(ExitCode::Failure.code(), 1);
    }
}
