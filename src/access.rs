//! Access groups and privilege levels shared across host services.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Which side of the house an object or session belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Access {
    App = 0,
    Red = 1,
    Blue = 2,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Privileges {
    #[default]
    User = 0,
    Elevated = 1,
}

impl TryFrom<u8> for Access {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::App),
            1 => Ok(Self::Red),
            2 => Ok(Self::Blue),
            other => Err(AppError::Config(format!("unknown access value: {other}"))),
        }
    }
}

impl TryFrom<u8> for Privileges {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::User),
            1 => Ok(Self::Elevated),
            other => Err(AppError::Config(format!("unknown privilege value: {other}"))),
        }
    }
}
