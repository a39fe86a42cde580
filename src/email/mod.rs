//! Outbound notification abstractions

pub mod console;
pub mod smtp;

pub use console::ConsoleNotifier;
pub use smtp::{SmtpConfig, SmtpNotifier};

/// Which message to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Email verification code after registration
    Verification,
    /// Password recovery code
    PasswordReset,
}

/// Delivers one-time codes to users.
///
/// Fire-and-forget from the identity service's perspective: a delivery
/// failure never rolls back the code that was issued.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, template: MailTemplate, code: &str) -> Result<(), String>;
}

/// Allow using Box<dyn Notifier> as a Notifier
impl Notifier for Box<dyn Notifier> {
    fn send(&self, to: &str, template: MailTemplate, code: &str) -> Result<(), String> {
        (**self).send(to, template, code)
    }
}
