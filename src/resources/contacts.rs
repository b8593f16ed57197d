use serde::{Deserialize, Serialize};

use crate::{
    auth::access::Access,
    resources::{repo_types::Collection, Operation, Resource},
    validation::{FieldRules, FieldViolation, Rule, Validator, EMAIL, FIRSTNAME, LASTNAME},
};

const MESSAGE: FieldRules = FieldRules {
    field: "message",
    trim: true,
    rules: &[
        Rule::Required("Message is required"),
        Rule::Length {
            min: 10,
            max: 1000,
            message: "Message must be between 10 and 1000 characters",
        },
    ],
};

/// A message left through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl Resource for Contact {
    type Input = ContactInput;

    const COLLECTION: Collection = Collection::Contacts;

    fn validate(input: ContactInput) -> Result<Self, Vec<FieldViolation>> {
        let mut v = Validator::new();
        let firstname = v.text(&FIRSTNAME, input.firstname.as_deref());
        let lastname = v.text(&LASTNAME, input.lastname.as_deref());
        let email = v.text(&EMAIL, input.email.as_deref());
        let message = v.text(&MESSAGE, input.message.as_deref());
        v.finish(|| {
            Some(Contact {
                firstname: firstname?,
                lastname: lastname?,
                email: email?,
                message: message?,
            })
        })
    }

    fn merge(&self, input: ContactInput) -> ContactInput {
        ContactInput {
            firstname: input.firstname.or_else(|| Some(self.firstname.clone())),
            lastname: input.lastname.or_else(|| Some(self.lastname.clone())),
            email: input.email.or_else(|| Some(self.email.clone())),
            message: input.message.or_else(|| Some(self.message.clone())),
        }
    }

    /// Anyone may write in; only an admin reads or manages messages.
    fn access(op: Operation) -> Access {
        match op {
            Operation::Create => Access::Public,
            _ => Access::Admin,
        }
    }
}
