use dlo_core::config::DEFAULT_PRODUCT_NAME;
use dlo_memories::Memory;
use dlo_notify::OutgoingEmail;

/// Turns a memory into the email its recipient receives.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    product_name: String,
}

impl MessageTemplate {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
        }
    }

    /// `[<product>] <title>`
    pub fn subject(&self, title: &str) -> String {
        format!("[{}] {}", self.product_name, title)
    }

    pub fn body(&self, message: &str) -> String {
        format!(
            "You have received a message:\n\n{message}\n\nSent via {}",
            self.product_name
        )
    }

    pub fn email_for(&self, memory: &Memory) -> OutgoingEmail {
        OutgoingEmail::new(
            memory.recipient_email.clone(),
            self.subject(&memory.title),
            self.body(&memory.message),
        )
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PRODUCT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_wording() {
        let t = MessageTemplate::default();
        assert_eq!(t.subject("For you"), "[Dear Loved One] For you");
        assert_eq!(
            t.body("I love you."),
            "You have received a message:\n\nI love you.\n\nSent via Dear Loved One"
        );
    }

    #[test]
    fn custom_product_name() {
        let t = MessageTemplate::new("Time Capsule");
        assert_eq!(t.subject("Hi"), "[Time Capsule] Hi");
        assert!(t.body("x").ends_with("Sent via Time Capsule"));
    }
}
