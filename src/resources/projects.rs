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
        Rule::Required("Project title is required"),
        Rule::Length {
            min: 3,
            max: 100,
            message: "Project title must be between 3 and 100 characters",
        },
    ],
};

const DESCRIPTION: FieldRules = FieldRules {
    field: "description",
    trim: true,
    rules: &[
        Rule::Required("Project description is required"),
        Rule::Length {
            min: 10,
            max: 2000,
            message: "Project description must be between 10 and 2000 characters",
        },
    ],
};

const GITHUB_URL: FieldRules = FieldRules {
    field: "github_url",
    trim: true,
    rules: &[Rule::Url("GitHub URL must be a valid http(s) URL")],
};

const LIVE_URL: FieldRules = FieldRules {
    field: "live_url",
    trim: true,
    rules: &[Rule::Url("Live URL must be a valid http(s) URL")],
};

const IMAGE_URL: FieldRules = FieldRules {
    field: "image_url",
    trim: true,
    rules: &[Rule::Url("Image URL must be a valid http(s) URL")],
};

const STATUS: FieldRules = FieldRules {
    field: "status",
    trim: true,
    rules: &[],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(with = "calendar_date")]
    pub completion: Date,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub title: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub completion: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    /// An empty string clears the link on update.
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub status: Option<String>,
}

fn clean_technologies(raw: Option<Vec<String>>) -> Vec<String> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Resource for Project {
    type Input = ProjectInput;

    const COLLECTION: Collection = Collection::Projects;

    fn validate(input: ProjectInput) -> Result<Self, Vec<FieldViolation>> {
        let mut v = Validator::new();
        let title = v.text(&TITLE, input.title.as_deref());
        let firstname = v.text(&FIRSTNAME, input.firstname.as_deref());
        let lastname = v.text(&LASTNAME, input.lastname.as_deref());
        let email = v.text(&EMAIL, input.email.as_deref());
        let completion = v.date(&COMPLETION, input.completion.as_deref());
        let description = v.text(&DESCRIPTION, input.description.as_deref());
        let github_url = v.text(&GITHUB_URL, input.github_url.as_deref());
        let live_url = v.text(&LIVE_URL, input.live_url.as_deref());
        let image_url = v.text(&IMAGE_URL, input.image_url.as_deref());
        let status = v.text(&STATUS, input.status.as_deref());
        let technologies = clean_technologies(input.technologies);
        v.finish(|| {
            Some(Project {
                title: title?,
                firstname: firstname?,
                lastname: lastname?,
                email: email?,
                completion: completion?,
                description: description?,
                technologies,
                github_url,
                live_url,
                image_url,
                status,
            })
        })
    }

    fn merge(&self, input: ProjectInput) -> ProjectInput {
        ProjectInput {
            title: input.title.or_else(|| Some(self.title.clone())),
            firstname: input.firstname.or_else(|| Some(self.firstname.clone())),
            lastname: input.lastname.or_else(|| Some(self.lastname.clone())),
            email: input.email.or_else(|| Some(self.email.clone())),
            completion: input.completion.or_else(|| Some(self.completion.to_string())),
            description: input.description.or_else(|| Some(self.description.clone())),
            technologies: input.technologies.or_else(|| Some(self.technologies.clone())),
            github_url: input.github_url.or_else(|| self.github_url.clone()),
            live_url: input.live_url.or_else(|| self.live_url.clone()),
            image_url: input.image_url.or_else(|| self.image_url.clone()),
            status: input.status.or_else(|| self.status.clone()),
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
