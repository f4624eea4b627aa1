use serde::Serialize;
use svcpatch_core::settings::{ConfigWarning, WarnLevel};
use svcpatch_core::status::{Status, StatusSink};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_warnings(warnings: &[ConfigWarning]) {
    for w in warnings {
        let label = match w.level {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        };
        eprintln!("{label}: {}", w.message);
    }
}

/// Prints status lines with the operator-facing markers.
///
/// With `--json` stdout is reserved for the summary, so status goes to stderr.
pub struct ConsoleSink {
    to_stderr: bool,
}

impl ConsoleSink {
    pub fn new(to_stderr: bool) -> Self {
        Self { to_stderr }
    }

    pub fn line(&self, text: &str) {
        if self.to_stderr {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }
}

impl StatusSink for ConsoleSink {
    fn emit(&self, status: Status) {
        let text = match status {
            Status::Section(m) => format!("--- {m} ---"),
            Status::Exec(m) => format!("   EXEC: {m}"),
            Status::Done(m) => format!("   ✅ {m}"),
            Status::Applied(m) => format!("   > {m}"),
            Status::Warn(m) => format!("   ⚠️  {m}"),
        };
        self.line(&text);
    }

    fn stdout_reserved(&self) -> bool {
        self.to_stderr
    }
}
