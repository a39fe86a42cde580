//! Console notifier for development

use super::{MailTemplate, Notifier};

/// Notifier that prints codes to the console (for development)
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ConsoleNotifier {
    fn send(&self, to: &str, template: MailTemplate, code: &str) -> Result<(), String> {
        let label = match template {
            MailTemplate::Verification => "VERIFICATION CODE",
            MailTemplate::PasswordReset => "PASSWORD RESET CODE",
        };

        println!();
        println!("========================================");
        println!("  {} FOR: {}", label, to);
        println!("  CODE: {}", code);
        println!("========================================");
        println!();

        tracing::info!(email = %to, ?template, "One-time code sent");

        Ok(())
    }
}
