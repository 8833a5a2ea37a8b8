//! External helper commands (screenshot and click tools).

use std::io;
use std::process::Output;
use tokio::process::Command;

/// An argv whose arguments may contain `{name}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandTemplate {
    argv: Vec<String>,
}

impl CommandTemplate {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Substitute every `{name}` occurrence with its value.
    pub fn render(&self, vars: &[(&str, String)]) -> Vec<String> {
        self.argv
            .iter()
            .map(|arg| {
                vars.iter().fold(arg.clone(), |acc, (name, value)| {
                    acc.replace(&format!("{{{name}}}"), value)
                })
            })
            .collect()
    }

    /// Render and run to completion, capturing stdout and stderr.
    pub async fn run(&self, vars: &[(&str, String)]) -> io::Result<Output> {
        let argv = self.render(vars);
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;
        Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
    }
}
