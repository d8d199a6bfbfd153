//! Core family domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

use crate::Error;

/// The number of members a family can hold.
pub const MAX_FAMILY_MEMBERS: usize = 2;

/// A validated family code: 3 to 20 ASCII letters or digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct FamilyCode(String);

impl FamilyCode {
    /// Create a family code from `code` after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidFamilyCode] if `code` is not
    /// 3 to 20 ASCII letters or digits.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if (3..=20).contains(&code.len()) && code.chars().all(|c| c.is_ascii_alphanumeric()) {
            Ok(Self(code.to_owned()))
        } else {
            Err(Error::InvalidFamilyCode(code.to_owned()))
        }
    }

    /// Create a family code without validation.
    ///
    /// The caller should ensure that the code is 3 to 20 ASCII letters or digits.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant
    /// is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl AsRef<str> for FamilyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for FamilyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FamilyCode::new(s)
    }
}

impl TryFrom<String> for FamilyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FamilyCode::new(&value)
    }
}

impl Display for FamilyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated display name of a family member.
///
/// Names are 1 to 20 characters of Hangul syllables, ASCII letters, digits and spaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a user name from `name` after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidUserName] if `name` is empty, longer than
    /// 20 characters or contains characters other than Hangul, ASCII letters, digits and spaces.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();
        let length = name.graphemes(true).count();

        if (1..=20).contains(&length) && name.chars().all(is_name_char) {
            Ok(Self(name.to_owned()))
        } else {
            Err(Error::InvalidUserName(name.to_owned()))
        }
    }

    /// Create a user name without validation.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the invariant
    /// is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || ('가'..='힣').contains(&c)
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for UserName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserName::new(s)
    }
}

impl TryFrom<String> for UserName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UserName::new(&value)
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A household that shares its transactions, identified by a user-chosen code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    /// The code members use to join the family.
    pub code: FamilyCode,
    /// The members in the order they joined.
    pub users: Vec<UserName>,
    /// When the family was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Family {
    /// Whether `name` is already a member of the family.
    pub fn has_member(&self, name: &UserName) -> bool {
        self.users.contains(name)
    }

    /// Whether the family has room for another member.
    pub fn is_full(&self) -> bool {
        self.users.len() >= MAX_FAMILY_MEMBERS
    }
}
