//! Command-line flag parsing
//!
//! The flag grammar: a flag is a token starting with `-` whose second
//! character is not a digit (so negative numbers are values, not flags);
//! a flag's value is the following token when that token is not itself a
//! flag. Unknown flags are simply never looked up; a repeated flag keeps
//! its last value.

use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct ArgumentMap {
    flags: HashMap<String, Option<String>>,
}

impl ArgumentMap {
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let mut flags = HashMap::new();

        let mut i = 0;
        while i < args.len() {
            if is_flag(&args[i]) {
                let flag = args[i].clone();
                let value = args
                    .get(i + 1)
                    .filter(|next| !is_flag(next))
                    .map(String::clone);
                if value.is_some() {
                    i += 1;
                }
                flags.insert(flag, value);
            }
            i += 1;
        }

        Self { flags }
    }

    pub fn num_flags(&self) -> usize {
        self.flags.len()
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains_key(flag)
    }

    /// The flag's value, when the flag is present and has one.
    pub fn string(&self, flag: &str) -> Option<&str> {
        self.flags.get(flag)?.as_deref()
    }

    pub fn path(&self, flag: &str) -> Option<PathBuf> {
        self.string(flag).map(PathBuf::from)
    }

    /// The flag's value as a path, or `default` when the flag has no value.
    pub fn path_or(&self, flag: &str, default: &str) -> PathBuf {
        self.path(flag).unwrap_or_else(|| PathBuf::from(default))
    }

    /// The flag's value parsed as a positive integer, or `default` when the
    /// flag is absent, has no value, or the value is not a positive integer.
    pub fn positive_or(&self, flag: &str, default: usize) -> usize {
        self.string(flag)
            .and_then(|value| value.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(default)
    }
}

fn is_flag(arg: &str) -> bool {
    let mut chars = arg.chars();
    chars.next() == Some('-') && chars.next().is_some_and(|c| !c.is_ascii_digit())
}
