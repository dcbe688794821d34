//! Step machine behind the navbar report form.
//!
//! Steps run Name, Email, Contact, then the request itself (a complaint or
//! a help request). `next` only moves forward when the current step's field
//! passes. Stepping back is left to the client, which resends the whole
//! form. Submitting is only possible from the last step, and a successful
//! submit clears every field and returns to Name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::records::{Report, ReportType};
use crate::store::Bucket;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Step {
    Name,
    Email,
    Contact,
    ComplaintOrHelp,
}

impl Step {
    const ORDER: [Step; 4] = [Step::Name, Step::Email, Step::Contact, Step::ComplaintOrHelp];

    pub fn index(&self) -> usize {
        match self {
            Step::Name => 0,
            Step::Email => 1,
            Step::Contact => 2,
            Step::ComplaintOrHelp => 3,
        }
    }

    fn next(&self) -> Step {
        Step::ORDER[(self.index() + 1).min(Step::ORDER.len() - 1)]
    }

    pub fn is_terminal(&self) -> bool {
        *self == Step::ComplaintOrHelp
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Complaint,
    Help,
}

impl From<RequestKind> for ReportType {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Complaint => ReportType::Complaint,
            RequestKind::Help => ReportType::Help,
        }
    }
}


#[derive(Clone, Debug)]
pub struct ReportWizard {
    step: Step,
    name: String,
    email: String,
    contact: String,
    kind: RequestKind,
    complaint: String,
    help_request: String,
}

impl Default for ReportWizard {
    fn default() -> Self {
        ReportWizard {
            step: Step::Name,
            name: String::new(),
            email: String::new(),
            contact: String::new(),
            kind: RequestKind::Complaint,
            complaint: String::new(),
            help_request: String::new(),
        }
    }
}

impl ReportWizard {
    pub fn new() -> Self {
        ReportWizard::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_owned();
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_owned();
    }

    pub fn set_contact(&mut self, contact: &str) {
        self.contact = contact.to_owned();
    }

    pub fn set_request(&mut self, kind: RequestKind, text: &str) {
        self.kind = kind;
        match kind {
            RequestKind::Complaint => self.complaint = text.to_owned(),
            RequestKind::Help => self.help_request = text.to_owned(),
        }
    }

    fn request_text(&self) -> &str {
        match self.kind {
            RequestKind::Complaint => &self.complaint,
            RequestKind::Help => &self.help_request,
        }
    }

    pub fn validate_step(&self) -> Result<()> {
        match self.step {
            Step::Name if self.name.trim().is_empty() => Err(Error::validation(
                "Name Required",
                "Please enter your name before proceeding.")),
            Step::Email if self.email.trim().is_empty() || !self.email.contains('@') => Err(Error::validation(
                "Valid Email Required",
                "Please enter a valid email address before proceeding.")),
            Step::Contact if self.contact.trim().is_empty() => Err(Error::validation(
                "Contact Number Required",
                "Please enter your contact number before proceeding.")),
            Step::ComplaintOrHelp if self.request_text().trim().is_empty() => match self.kind {
                RequestKind::Complaint => Err(Error::validation(
                    "Complaint Details Required",
                    "Please describe your complaint before submitting.")),
                RequestKind::Help => Err(Error::validation(
                    "Help Request Details Required",
                    "Please describe what kind of help you need before submitting.")),
            },
            _ => Ok(()),
        }
    }

    pub fn next(&mut self) -> Result<Step> {
        self.validate_step()?;
        self.step = self.step.next();
        Ok(self.step)
    }

    pub fn submit(&mut self, bucket: &Bucket<'_, Report>, now: DateTime<Utc>) -> Result<Report> {
        if !self.step.is_terminal() {
            return Err(Error::validation(
                "Incomplete Report",
                "Please complete every step before submitting."));
        }
        self.validate_step()?;

        let report = Report::new(self.kind.into(), self.request_text().to_owned(), now)
            .with_submitter(self.name.clone(), self.email.clone(), self.contact.clone());

        bucket.append(report.clone())?;

        *self = ReportWizard::new();

        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use crate::store::{BucketKey, MemoryStore};

    fn wizard_at_request() -> ReportWizard {
        let mut wizard = ReportWizard::new();
        wizard.set_name("Asha");
        wizard.next().unwrap();
        wizard.set_email("asha@example.com");
        wizard.next().unwrap();
        wizard.set_contact("9900000000");
        wizard.next().unwrap();
        wizard
    }

    #[test]
    fn empty_field_blocks_next() {
        let mut wizard = ReportWizard::new();

        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), Step::Name);

        wizard.set_name("   ");
        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), Step::Name);

        wizard.set_name("Asha");
        assert_eq!(wizard.next().unwrap(), Step::Email);
    }

    #[rstest]
    #[case("test", false)]
    #[case("", false)]
    #[case("a@b", true)]
    #[case("asha@example.com", true)]
    fn email_step_requires_at_sign(#[case] email: &str, #[case] accepted: bool) {
        let mut wizard = ReportWizard::new();
        wizard.set_name("Asha");
        wizard.next().unwrap();

        wizard.set_email(email);
        assert_eq!(wizard.next().is_ok(), accepted);
        assert_eq!(wizard.step() == Step::Contact, accepted);
    }

    #[test]
    fn next_stays_on_last_step() {
        let mut wizard = wizard_at_request();
        wizard.set_request(RequestKind::Help, "walk me home");

        assert_eq!(wizard.next().unwrap(), Step::ComplaintOrHelp);
    }

    #[test]
    fn submit_only_from_last_step() {
        let store = MemoryStore::new();
        let bucket = Bucket::new(&store, BucketKey::NavbarReports);

        let mut wizard = ReportWizard::new();
        wizard.set_name("Asha");

        assert!(wizard.submit(&bucket, Utc::now()).is_err());
        assert!(bucket.read_all().is_empty());
    }

    #[rstest]
    #[case(RequestKind::Complaint, "Complaint Details Required")]
    #[case(RequestKind::Help, "Help Request Details Required")]
    fn empty_request_is_named_by_kind(#[case] kind: RequestKind, #[case] title: &str) {
        let mut wizard = wizard_at_request();
        wizard.set_request(kind, " ");

        match wizard.validate_step() {
            Err(Error::Validation { title: t, .. }) => assert_eq!(t, title),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn submit_persists_and_resets() {
        let store = MemoryStore::new();
        let bucket = Bucket::new(&store, BucketKey::NavbarReports);
        let before = Utc::now();

        let mut wizard = wizard_at_request();
        wizard.set_request(RequestKind::Complaint, "streetlight broken");
        let report = wizard.submit(&bucket, Utc::now()).unwrap();

        assert_eq!(report.kind, ReportType::Complaint);
        assert_eq!(report.name.as_deref(), Some("Asha"));
        assert!(report.id >= before.timestamp_millis());

        let stored = bucket.read_all();
        assert_eq!(stored, vec![report]);

        assert_eq!(wizard.step(), Step::Name);
        assert!(wizard.next().is_err());
    }
}
