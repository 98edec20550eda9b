//! Program plus arguments, each argument kept as a single token.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A program and its ordered arguments.
///
/// Arguments are passed to the OS as separate tokens, so an argument that
/// contains spaces stays one argument. [`CommandLine::quoted_args`] renders
/// the same arguments as a single string, each one wrapped in double quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// `"arg one" "arg2"`: every argument quoted, separated by one space.
    pub fn quoted_args(&self) -> String {
        self.args
            .iter()
            .map(|arg| format!("\"{arg}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.quoted_args())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_args_keeps_spaces_inside_one_token() {
        let command = CommandLine::new("helper.exe", ["hello world", "--flag"]);
        assert_eq!(command.quoted_args(), "\"hello world\" \"--flag\"");
        assert_eq!(command.args().len(), 2);
    }

    #[test]
    fn test_quoted_args_empty() {
        let command = CommandLine::new("helper.exe", Vec::<String>::new());
        assert_eq!(command.quoted_args(), "");
        assert_eq!(command.to_string(), "helper.exe");
    }

    #[test]
    fn test_display() {
        let command = CommandLine::new("/opt/helper", ["deploy", "my app"]);
        assert_eq!(command.to_string(), "/opt/helper \"deploy\" \"my app\"");
    }
}
