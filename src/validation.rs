use crate::data::student::{Field, StudentDraft};
use regex::Regex;
use std::{collections::BTreeMap, sync::LazyLock};

pub const LETTERS_AND_NUMBERS_ONLY: &str = "Only letters and numbers are allowed";
pub const LETTERS_ONLY: &str = "Only letters are allowed";
pub const NUMBERS_ONLY: &str = "Only numbers are allowed";
pub const AGE_TOO_HIGH: &str = "Age cannot be more than 100";
pub const REQUIRED: &str = "This field is required";

pub const MAX_AGE: u64 = 100;

static LETTERS_AND_NUMBERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]*$").expect("valid roll number regex"));
static LETTERS_AND_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z\s]*$").expect("valid letters regex"));
static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("valid digits regex"));

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub field: Field,
    pub reason: &'static str,
}

/// Checks one keystroke's worth of input for `field`.
///
/// On success returns the value that should go into the draft (names and cities get their
/// first character uppercased). The empty string is always accepted so inputs can be cleared.
pub fn validate_field(field: Field, value: &str) -> Result<String, Rejection> {
    let reject = |reason| Rejection { field, reason };

    match field {
        Field::RollNo => {
            if LETTERS_AND_NUMBERS.is_match(value) {
                Ok(value.to_string())
            } else {
                Err(reject(LETTERS_AND_NUMBERS_ONLY))
            }
        }
        Field::Name | Field::City => {
            let capitalised = capitalise_first(value);
            if LETTERS_AND_WHITESPACE.is_match(&capitalised) {
                Ok(capitalised)
            } else {
                Err(reject(LETTERS_ONLY))
            }
        }
        Field::Age => {
            if value.is_empty() {
                return Ok(String::new());
            }
            if !DIGITS.is_match(value) {
                return Err(reject(NUMBERS_ONLY));
            }
            //only digits by now, so a failed parse means it overflowed
            let too_old = value.parse::<u64>().map_or(true, |age| age > MAX_AGE);
            if too_old {
                Err(reject(AGE_TOO_HIGH))
            } else {
                Ok(value.to_string())
            }
        }
    }
}

pub fn capitalise_first(value: &str) -> String {
    let mut chars = value.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Runs every field through [`validate_field`] and also requires each to be filled in.
///
/// Used where a whole student arrives at once rather than keystroke by keystroke.
pub fn validate_draft(draft: &StudentDraft) -> Result<StudentDraft, FieldErrors> {
    let mut normalised = StudentDraft::default();
    let mut errors = FieldErrors::default();

    for field in Field::ALL {
        match validate_field(field, draft.get(field)) {
            Ok(value) if value.is_empty() => errors.reject(Rejection {
                field,
                reason: REQUIRED,
            }),
            Ok(value) => normalised.set(field, value),
            Err(rejection) => errors.reject(rejection),
        }
    }

    if errors.is_empty() {
        Ok(normalised)
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, &'static str>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn reject(&mut self, Rejection { field, reason }: Rejection) {
        self.0.insert(field, reason);
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.0.iter().map(|(field, reason)| (*field, *reason))
    }
}
