//! Command-line configuration
//!
//! `respawn <file.rsp> [--plain] [--check] [--tokens]`

use std::path::PathBuf;
use thiserror::Error;

/// Environment variable with `;`-separated scripted input for `--plain`
pub const INPUT_ENV: &str = "RESPAWN_INPUT";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("No input file provided")]
    MissingFile,

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("more than one input file given ('{0}')")]
    ExtraArgument(String),
}

/// What the binary should do with the source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub file: PathBuf,
    /// Run against stdin/stdout instead of the terminal UI
    pub plain: bool,
    /// Stop after static analysis
    pub check_only: bool,
    /// Print the token stream
    pub print_tokens: bool,
    /// Scripted input lines, consumed before stdin
    pub scripted_input: Vec<String>,
}

impl Config {
    /// Parse arguments, not including the program name
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut file = None;
        let mut config = Config {
            file: PathBuf::new(),
            plain: false,
            check_only: false,
            print_tokens: false,
            scripted_input: Vec::new(),
        };

        for arg in args {
            let arg = arg.into();
            match arg.as_str() {
                "--plain" => config.plain = true,
                "--check" => config.check_only = true,
                "--tokens" => config.print_tokens = true,
                flag if flag.starts_with("--") => return Err(ConfigError::UnknownOption(arg)),
                _ if file.is_some() => return Err(ConfigError::ExtraArgument(arg)),
                _ => file = Some(PathBuf::from(arg)),
            }
        }

        config.file = file.ok_or(ConfigError::MissingFile)?;
        Ok(config)
    }

    /// Attach scripted input from `RESPAWN_INPUT`, if set
    pub fn with_env_input(mut self) -> Self {
        if let Ok(raw) = std::env::var(INPUT_ENV) {
            self.scripted_input = split_input(&raw);
        }
        self
    }
}

/// Split a `;`-separated input script into lines
pub fn split_input(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(';').map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_in_any_order() {
        let config = Config::from_args(["--plain", "game.rsp", "--tokens"]).unwrap();
        assert_eq!(config.file, PathBuf::from("game.rsp"));
        assert!(config.plain);
        assert!(config.print_tokens);
        assert!(!config.check_only);
    }

    #[test]
    fn test_argument_errors() {
        assert_eq!(
            Config::from_args(Vec::<String>::new()),
            Err(ConfigError::MissingFile)
        );
        assert_eq!(
            Config::from_args(["a.rsp", "--fast"]),
            Err(ConfigError::UnknownOption("--fast".into()))
        );
        assert_eq!(
            Config::from_args(["a.rsp", "b.rsp"]),
            Err(ConfigError::ExtraArgument("b.rsp".into()))
        );
    }

    #[test]
    fn test_split_input() {
        assert_eq!(split_input("3;Ana;"), vec!["3", "Ana", ""]);
        assert!(split_input("").is_empty());
    }
}
