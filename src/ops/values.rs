//! Enumerated value domains used by operation arguments

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed string enum with `as_str`, `ALL`, `Display` and `FromStr`
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Comma-separated list of accepted values, for error messages
            pub fn allowed() -> String {
                Self::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == normalized)
                    .ok_or_else(|| format!("'{}' is not one of: {}", s, Self::allowed()))
            }
        }
    };
}

string_enum! {
    /// Task workflow status
    pub enum TaskStatus {
        Backlog => "backlog",
        Ready => "ready",
        Doing => "doing",
        Blocked => "blocked",
        Done => "done",
        Todo => "todo",
    }
}

string_enum! {
    /// Task priority (stored as importance)
    pub enum Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

string_enum! {
    /// Triage state of an inbound action item
    pub enum ActionState {
        Queued => "queued",
        Deferred => "deferred",
        Completed => "completed",
        Dismissed => "dismissed",
        ConvertedToTask => "converted_to_task",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Backlog
    }
}

impl Default for ActionState {
    fn default() -> Self {
        ActionState::Queued
    }
}
