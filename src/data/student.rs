use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type StudentId = i64;

/// A student as the store hands it back to us.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: StudentId,
    pub roll_no: String,
    pub name: String,
    pub age: i64,
    pub city: String,
}

/// The in-progress contents of the add/edit form.
///
/// `age` stays as whatever digits were typed, the store does the integer coercion.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDraft {
    pub roll_no: String,
    pub name: String,
    pub age: String,
    pub city: String,
}

impl StudentDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::RollNo => &self.roll_no,
            Field::Name => &self.name,
            Field::Age => &self.age,
            Field::City => &self.city,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::RollNo => &mut self.roll_no,
            Field::Name => &mut self.name,
            Field::Age => &mut self.age,
            Field::City => &mut self.city,
        };
        *slot = value;
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_empty())
            .collect()
    }
}

impl From<&Student> for StudentDraft {
    fn from(student: &Student) -> Self {
        Self {
            roll_no: student.roll_no.clone(),
            name: student.name.clone(),
            age: student.age.to_string(),
            city: student.city.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RollNo,
    Name,
    Age,
    City,
}

impl Field {
    pub const ALL: [Self; 4] = [Self::RollNo, Self::Name, Self::Age, Self::City];

    pub const fn name(self) -> &'static str {
        match self {
            Self::RollNo => "roll_no",
            Self::Name => "name",
            Self::Age => "age",
            Self::City => "city",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RollNo => "Roll No",
            Self::Name => "Name",
            Self::Age => "Age",
            Self::City => "City",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
