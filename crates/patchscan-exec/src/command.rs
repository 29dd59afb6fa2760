//! Shell command construction from argument lists
//!
//! Executors accept shell text. Commands are assembled here from a program,
//! its arguments and environment assignments, and every word is quoted when
//! rendered, so an argument can never be reinterpreted by the shell.

use std::fmt;

/// A single command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    env: Vec<(&'static str, String)>,
    program: String,
    args: Vec<String>,
    sudo: bool,
}

impl ShellCommand {
    /// Start a command running `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            env: Vec::new(),
            program: program.into(),
            args: Vec::new(),
            sudo: false,
        }
    }

    /// Run a fixed script through `sh -c`
    ///
    /// Only for scripts owned by this crate's callers, never for text that
    /// carries host or user data.
    pub fn script(text: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(text)
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the command
    #[must_use]
    pub fn env(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.env.push((key, value.into()));
        self
    }

    /// Prefix the command with `sudo` when `enabled`
    #[must_use]
    pub fn with_sudo(mut self, enabled: bool) -> Self {
        self.sudo = enabled;
        self
    }

    /// Program being run
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed to the program
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Render as shell text with every word quoted
    #[must_use]
    pub fn render(&self) -> String {
        let mut words: Vec<String> = Vec::with_capacity(self.args.len() + self.env.len() + 2);

        if self.sudo {
            words.push("sudo".to_string());
        }
        // `sudo VAR=value cmd` and `VAR=value cmd` both scope the variable
        // to the command
        for (key, value) in &self.env {
            words.push(format!("{key}={}", shell_words::quote(value)));
        }
        words.push(shell_words::quote(&self.program).into_owned());
        words.extend(
            self.args
                .iter()
                .map(|a| shell_words::quote(a).into_owned()),
        );

        words.join(" ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
