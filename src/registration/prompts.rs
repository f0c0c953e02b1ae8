//! User-facing message texts for the registration dialog.

use crate::registration::model::UserRegistration;

fn bool_to_yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Builds every message the bot sends, parameterized on the service name and
/// Terms of Service URL from configuration.
#[derive(Debug, Clone)]
pub struct Prompts {
    service_name: String,
    tos_url: String,
}

impl Prompts {
    pub fn new(service_name: impl Into<String>, tos_url: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            tos_url: tos_url.into(),
        }
    }

    pub fn confirm_display_name(&self, name: &str) -> String {
        format!("Would you like your display name to be \"{name}\"?")
    }

    pub fn ask_display_name(&self) -> String {
        "What would you like your display name to be?".to_string()
    }

    pub fn ask_tos(&self) -> String {
        format!(
            "Do you agree with our Term of Service? You could view the PDF version here {}",
            self.tos_url
        )
    }

    pub fn ask_subscription(&self) -> String {
        "Would you like to receive important updates regarding your account?".to_string()
    }

    /// Account-created summary plus the "sign in now?" question.
    pub fn account_created(&self, record: &UserRegistration) -> String {
        format!(
            "Hurrah! your account has been created!\n\n\
             Display Name: {}\n\
             Term of Service: Agreed\n\
             Subscribe to Updates: {}\n\n\
             Would you like to sign-in {} now?",
            record.display_name,
            bool_to_yes_no(record.subscription_opt_in),
            self.service_name
        )
    }

    pub fn closing(&self) -> String {
        format!(
            "Whenever you would like to sign-in {}, just type /signin",
            self.service_name
        )
    }

    pub fn signin_reminder(&self) -> String {
        format!("To sign-in {}, please type /signin", self.service_name)
    }

    pub fn signin_link(&self, name: &str, url: &str) -> String {
        format!(
            "Welcome {name}, you may use this link to sign-in {} \
             (the link will expire in 1 minute) - {url}",
            self.service_name
        )
    }

    pub fn signin_still_valid(&self) -> String {
        "Please use the last sign-in URL provided, it is still valid.".to_string()
    }
}
