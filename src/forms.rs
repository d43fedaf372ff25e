//! Form validation for the student, registration and login forms.
//!
//! Each `clean` collects every field error instead of stopping at the first
//! one, so a client can show all messages at once. Store-dependent checks
//! (slug uniqueness, group existence) are added by the handlers.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const NAME_MAX_LEN: usize = 50;
pub const SLUG_MAX_LEN: usize = 255;
pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const MARK_MAX_LEN: usize = 10;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

#[derive(Debug, Default)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "fields": self.0 })
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentForm {
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub middle_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default = "default_true")]
    pub is_study: bool,
    #[serde(default)]
    pub group: Option<i64>,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanStudent {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub is_study: bool,
    pub group: Option<i64>,
    pub slug: String,
}

impl StudentForm {
    pub fn clean(&self, errors: &mut FieldErrors) -> Option<CleanStudent> {
        let last_name = clean_name(errors, "last_name", &self.last_name);
        let first_name = clean_name(errors, "first_name", &self.first_name);
        let middle_name = clean_name(errors, "middle_name", &self.middle_name);

        if !errors.has("first_name") && !first_name.chars().all(char::is_alphabetic) {
            errors.add("first_name", "Invalid characters");
        }

        let email = self.email.trim().to_string();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !is_valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        let birth_date = match self.birth_date.trim() {
            "" => {
                errors.add("birth_date", REQUIRED);
                None
            }
            raw => match parse_date(raw) {
                Some(d) => Some(d),
                None => {
                    errors.add("birth_date", "Enter a valid date.");
                    None
                }
            },
        };

        let slug = self.slug.trim().to_string();
        if slug.is_empty() {
            errors.add("slug", REQUIRED);
        } else if slug.chars().count() > SLUG_MAX_LEN {
            errors.add("slug", max_len_message(SLUG_MAX_LEN, slug.chars().count()));
        } else if !is_valid_slug(&slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }

        if !errors.is_empty() {
            return None;
        }
        Some(CleanStudent {
            last_name,
            first_name,
            middle_name,
            email,
            birth_date: birth_date?,
            is_study: self.is_study,
            group: self.group,
            slug,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRegistration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn clean(&self, errors: &mut FieldErrors) -> Option<CleanRegistration> {
        let username = self.username.trim().to_string();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add(
                "username",
                max_len_message(USERNAME_MAX_LEN, username.chars().count()),
            );
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim().to_string();
        if email.is_empty() {
            errors.add("email", REQUIRED);
        } else if !is_valid_email(&email) {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !self.password1.is_empty() && !self.password2.is_empty() {
            if self.password1 != self.password2 {
                errors.add("password2", "The two password fields didn't match.");
            } else {
                if self.password1.chars().count() < PASSWORD_MIN_LEN {
                    errors.add(
                        "password2",
                        format!(
                            "This password is too short. It must contain at least {} characters.",
                            PASSWORD_MIN_LEN
                        ),
                    );
                }
                if self.password1.chars().all(|c| c.is_ascii_digit()) {
                    errors.add("password2", "This password is entirely numeric.");
                }
            }
        }

        if !errors.is_empty() {
            return None;
        }
        Some(CleanRegistration {
            username,
            email,
            password: self.password1.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self, errors: &mut FieldErrors) {
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryForm {
    pub student: Option<i64>,
    pub subject: Option<i64>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub mark: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    pub student: i64,
    pub subject: i64,
    pub date: NaiveDate,
    pub mark: String,
}

impl EntryForm {
    pub fn clean(&self, errors: &mut FieldErrors) -> Option<CleanEntry> {
        if self.student.is_none() {
            errors.add("student", REQUIRED);
        }
        if self.subject.is_none() {
            errors.add("subject", REQUIRED);
        }
        let date = match self.date.trim() {
            "" => {
                errors.add("date", REQUIRED);
                None
            }
            raw => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    errors.add("date", "Enter a valid date.");
                }
                parsed
            }
        };
        let mark = self.mark.trim().to_string();
        if mark.is_empty() {
            errors.add("mark", REQUIRED);
        } else if mark.chars().count() > MARK_MAX_LEN {
            errors.add("mark", max_len_message(MARK_MAX_LEN, mark.chars().count()));
        }

        if !errors.is_empty() {
            return None;
        }
        Some(CleanEntry {
            student: self.student?,
            subject: self.subject?,
            date: date?,
            mark,
        })
    }
}

/// Validates a required catalog name (group or subject).
pub fn clean_catalog_name(errors: &mut FieldErrors, raw: &str) -> String {
    clean_name(errors, "name", raw)
}

fn clean_name(errors: &mut FieldErrors, field: &'static str, raw: &str) -> String {
    let v = raw.trim().to_string();
    let len = v.chars().count();
    if v.is_empty() {
        errors.add(field, REQUIRED);
    } else if len > NAME_MAX_LEN {
        errors.add(field, max_len_message(NAME_MAX_LEN, len));
    }
    v
}

fn max_len_message(max: usize, got: usize) -> String {
    format!(
        "Ensure this value has at most {} characters (it has {}).",
        max, got
    )
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn is_valid_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') || domain.is_empty() {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| {
            !l.is_empty()
                && !l.starts_with('-')
                && !l.ends_with('-')
                && l.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_form() -> StudentForm {
        StudentForm {
            last_name: "Ivanov".into(),
            first_name: "Ivan".into(),
            middle_name: "Ivanovich".into(),
            email: "ivan@example.com".into(),
            birth_date: "2004-05-06".into(),
            is_study: true,
            group: None,
            slug: "ivanov-ivan".into(),
        }
    }

    #[test]
    fn student_form_accepts_valid_input() {
        let mut errors = FieldErrors::default();
        let clean = student_form().clean(&mut errors).expect("valid form");
        assert!(errors.is_empty());
        assert_eq!(clean.birth_date, NaiveDate::from_ymd_opt(2004, 5, 6).unwrap());
        assert_eq!(clean.slug, "ivanov-ivan");
    }

    #[test]
    fn first_name_must_be_alphabetic() {
        let mut form = student_form();
        form.first_name = "Iv4n".into();
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        assert!(errors.has("first_name"));
        assert_eq!(
            errors.to_json()["fields"]["first_name"][0],
            "Invalid characters"
        );
    }

    #[test]
    fn student_form_reports_all_errors_together() {
        let form = StudentForm {
            last_name: "x".repeat(51),
            first_name: String::new(),
            middle_name: "M".into(),
            email: "not-an-email".into(),
            birth_date: "06.05.2004".into(),
            is_study: false,
            group: Some(3),
            slug: "bad slug".into(),
        };
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        for field in ["last_name", "first_name", "email", "birth_date", "slug"] {
            assert!(errors.has(field), "expected error on {}", field);
        }
        assert!(!errors.has("middle_name"));
    }

    #[test]
    fn registration_checks_passwords() {
        let mut form = RegisterForm {
            username: "teacher".into(),
            email: "t@school.org".into(),
            password1: "s3cret-pass".into(),
            password2: "s3cret-pas".into(),
        };
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        assert!(errors.has("password2"));

        form.password1 = "12345678".into();
        form.password2 = "12345678".into();
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        assert!(errors.has("password2"));

        form.password1 = "s3cret-pass".into();
        form.password2 = "s3cret-pass".into();
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_some());
    }

    #[test]
    fn username_rejects_spaces() {
        let form = RegisterForm {
            username: "bad name".into(),
            email: "t@school.org".into(),
            password1: "s3cret-pass".into(),
            password2: "s3cret-pass".into(),
        };
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        assert!(errors.has("username"));
    }

    #[test]
    fn email_and_slug_syntax() {
        assert!(is_valid_email("a.b@mail.example.ru"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a @example.com"));
        assert!(is_valid_slug("petrov_s-2"));
        assert!(!is_valid_slug("petrov/s"));
    }

    #[test]
    fn entry_form_requires_date_and_mark() {
        let form = EntryForm {
            student: Some(1),
            subject: None,
            date: "2024-13-01".into(),
            mark: String::new(),
        };
        let mut errors = FieldErrors::default();
        assert!(form.clean(&mut errors).is_none());
        assert!(errors.has("subject"));
        assert!(errors.has("date"));
        assert!(errors.has("mark"));
        assert!(!errors.has("student"));
    }
}
