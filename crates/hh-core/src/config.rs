use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, replies::CannedReplies, security::AllowList, Result};

/// Moderators allowed to use `/d` when `DISCORD_ALLOWED_USERS` is not set.
pub const DEFAULT_ALLOWED_USERS: &[u64] = &[71242588694249472];

pub const DEFAULT_COMMAND_PREFIX: char = '/';

pub const DEFAULT_RULES_URL: &str =
    "https://github.com/hanabi/hanabi.github.io/blob/main/misc/Convention_Questions.md";

/// Typed configuration, read once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub allowed_users: AllowList,
    pub command_prefix: char,
    pub rules_url: String,
    pub canned_replies: CannedReplies,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        if let Some(dir) = exe_dir() {
            load_dotenv_if_present(&dir.join(".env"));
        }

        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let allowed_users = match env_str("DISCORD_ALLOWED_USERS").and_then(non_empty) {
            Some(raw) => AllowList::new(parse_csv_u64(&raw)?),
            None => AllowList::new(DEFAULT_ALLOWED_USERS.iter().copied()),
        };

        let command_prefix = match env_str("COMMAND_PREFIX") {
            Some(raw) => parse_prefix(&raw)?,
            None => DEFAULT_COMMAND_PREFIX,
        };

        let rules_url = env_str("RULES_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_RULES_URL.to_string());

        let mut canned_replies = CannedReplies::default();
        if let Some(path) = env_path("CANNED_REPLIES_PATH") {
            canned_replies.merge_file(&path).map_err(|e| {
                Error::Config(format!(
                    "failed to load canned replies from {}: {e}",
                    path.display()
                ))
            })?;
        }

        Ok(Self {
            discord_token,
            allowed_users,
            command_prefix,
            rules_url,
            canned_replies,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_csv_u64(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|_| {
                Error::Config(format!("invalid user id in DISCORD_ALLOWED_USERS: {s}"))
            })
        })
        .collect()
}

fn parse_prefix(raw: &str) -> Result<char> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_alphanumeric() => Ok(c),
        _ => Err(Error::Config(format!(
            "COMMAND_PREFIX must be a single non-alphanumeric character, got {raw:?}"
        ))),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotenv_strips_quotes_comments_and_export() {
        let parsed = parse_dotenv(
            "# secrets\n\nDISCORD_TOKEN=\"abc def\"\n\
             export COMMAND_PREFIX='!'\nnot a pair\n=novalue\n",
        );
        assert_eq!(
            parsed,
            vec![
                ("DISCORD_TOKEN".to_string(), "abc def".to_string()),
                ("COMMAND_PREFIX".to_string(), "!".to_string()),
            ]
        );
    }

    #[test]
    fn csv_ids_parse_and_reject_garbage() {
        assert_eq!(parse_csv_u64(" 1, 2 ,,3").unwrap(), vec![1, 2, 3]);
        assert!(matches!(parse_csv_u64("1,abc"), Err(Error::Config(_))));
    }

    #[test]
    fn prefix_must_be_single_symbol() {
        assert_eq!(parse_prefix("/").unwrap(), '/');
        assert_eq!(parse_prefix(" ! ").unwrap(), '!');
        assert!(parse_prefix("").is_err());
        assert!(parse_prefix("!!").is_err());
        assert!(parse_prefix("d").is_err());
    }
}
