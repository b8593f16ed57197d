use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    auth::access::Access,
    resources::{repo_types::Collection, Operation, Resource},
    validation::{
        FieldRules, FieldViolation, Rule, Validator, COMPLETION, EMAIL, FIRSTNAME, LASTNAME,
    },
};

time::serde::format_description!(calendar_date, Date, "[year]-[month]-[day]");

const TITLE: FieldRules = FieldRules {
    field: "title",
    trim: true,
    rules: &[
        Rule::Required("Qualification title is required"),
        Rule::Length {
            min: 2,
            max: 100,
            message: "Title must be between 2 and 100 characters",
        },
    ],
};

const DESCRIPTION: FieldRules = FieldRules {
    field: "description",
    trim: true,
    rules: &[
        Rule::Required("Description is required"),
        Rule::Length {
            min: 10,
            max: 1000,
            message: "Description must be between 10 and 1000 characters",
        },
    ],
};

/// A degree, certificate or course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualification {
    pub title: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(with = "calendar_date")]
    pub completion: Date,
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QualificationInput {
    pub title: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub completion: Option<String>,
    pub description: Option<String>,
}

impl Resource for Qualification {
    type Input = QualificationInput;

    const COLLECTION: Collection = Collection::Qualifications;

    fn validate(input: QualificationInput) -> Result<Self, Vec<FieldViolation>> {
        let mut v = Validator::new();
        let title = v.text(&TITLE, input.title.as_deref());
        let firstname = v.text(&FIRSTNAME, input.firstname.as_deref());
        let lastname = v.text(&LASTNAME, input.lastname.as_deref());
        let email = v.text(&EMAIL, input.email.as_deref());
        let completion = v.date(&COMPLETION, input.completion.as_deref());
        let description = v.text(&DESCRIPTION, input.description.as_deref());
        v.finish(|| {
            Some(Qualification {
                title: title?,
                firstname: firstname?,
                lastname: lastname?,
                email: email?,
                completion: completion?,
                description: description?,
            })
        })
    }

    fn merge(&self, input: QualificationInput) -> QualificationInput {
        QualificationInput {
            title: input.title.or_else(|| Some(self.title.clone())),
            firstname: input.firstname.or_else(|| Some(self.firstname.clone())),
            lastname: input.lastname.or_else(|| Some(self.lastname.clone())),
            email: input.email.or_else(|| Some(self.email.clone())),
            completion: input.completion.or_else(|| Some(self.completion.to_string())),
            description: input.description.or_else(|| Some(self.description.clone())),
        }
    }

    fn sort_key(&self) -> Option<OffsetDateTime> {
        Some(self.completion.midnight().assume_utc())
    }

    fn access(op: Operation) -> Access {
        match op {
            Operation::List | Operation::Get => Access::Public,
            _ => Access::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_character_title_is_enough() {
        let q = Qualification::validate(QualificationInput {
            title: Some("BS".into()),
            firstname: Some("Ann".into()),
            lastname: Some("Lee".into()),
            email: Some("ann@x.com".into()),
            completion: Some("2019-06-15".into()),
            description: Some("Computer science degree".into()),
        })
        .unwrap();
        assert_eq!(q.title, "BS");
    }

    #[test]
    fn description_limit_is_1000() {
        let err = Qualification::validate(QualificationInput {
            title: Some("BSc".into()),
            firstname: Some("Ann".into()),
            lastname: Some("Lee".into()),
            email: Some("ann@x.com".into()),
            completion: Some("2019-06-15".into()),
            description: Some("x".repeat(1001)),
        })
        .unwrap_err();
        assert_eq!(err[0].message, "Description must be between 10 and 1000 characters");
    }

    #[test]
    fn missing_completion_is_required() {
        let err = Qualification::validate(QualificationInput::default()).unwrap_err();
        assert_eq!(err.len(), 6);
        assert!(err
            .iter()
            .any(|e| e.field == "completion" && e.message == "Completion date is required"));
    }
}
