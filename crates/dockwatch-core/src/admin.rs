//! Text commands typed by an operator into the dashboard client.
//!
//! `remove <username>` revokes a temporary grant; a bare `<username>` grants
//! [`ADHOC_GRANT_HOURS`] of access.

use std::fmt;

use thiserror::Error;

use crate::access::ADHOC_GRANT_HOURS;

const REMOVE_KEYWORD: &str = "remove";

#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Grant { username: String, hours: f64 },
    Revoke { username: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminCommandError {
    #[error("usage: remove <username>")]
    MissingUsername,
    #[error("usage: <username> | remove <username>")]
    Usage,
}

impl AdminCommand {
    /// Parse operator input. Errors are meant to be shown verbatim and never
    /// result in a request being sent.
    pub fn parse(input: &str) -> Result<Self, AdminCommandError> {
        let tokens: Vec<&str> = input.split_whitespace().collect();
        match tokens.as_slice() {
            [keyword] if *keyword == REMOVE_KEYWORD => Err(AdminCommandError::MissingUsername),
            [keyword, username] if *keyword == REMOVE_KEYWORD => Ok(AdminCommand::Revoke {
                username: (*username).to_string(),
            }),
            [keyword, ..] if *keyword == REMOVE_KEYWORD => Err(AdminCommandError::MissingUsername),
            [username] => Ok(AdminCommand::Grant {
                username: (*username).to_string(),
                hours: ADHOC_GRANT_HOURS,
            }),
            _ => Err(AdminCommandError::Usage),
        }
    }

    pub fn username(&self) -> &str {
        match self {
            AdminCommand::Grant { username, .. } | AdminCommand::Revoke { username } => username,
        }
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCommand::Grant { username, hours } => write!(f, "grant {username} for {hours}h"),
            AdminCommand::Revoke { username } => write!(f, "{REMOVE_KEYWORD} {username}"),
        }
    }
}
