//! SMTP mail delivery skill.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use planwright_core::{
    FunctionDescriptor, FunctionRegistry, ParameterSpec, PlanwrightError, Result,
};
use serde::Deserialize;
use tracing::info;

use crate::SkillProvider;

/// Subject line applied to every message sent by this skill.
const SUBJECT: &str = "A message from Planwright";

/// SMTP connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Host name of the SMTP service.
    pub host: String,

    /// Port for the SMTP service.
    #[serde(default = "default_port")]
    pub port: u16,

    /// User credential.
    pub user: String,

    /// Password credential.
    pub password: String,

    /// Use implicit TLS instead of STARTTLS.
    #[serde(default)]
    pub use_ssl: bool,

    /// Address placed in the From header.
    pub sender: String,
}

fn default_port() -> u16 {
    587
}

/// Sends mail through a configured SMTP relay, under the `email`
/// collection.
#[derive(Debug, Clone)]
pub struct EmailSkill {
    config: SmtpConfig,
}

impl EmailSkill {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    async fn send(config: SmtpConfig, body: String, address: String) -> Result<String> {
        let sender: Mailbox = config
            .sender
            .parse()
            .map_err(|e| PlanwrightError::skill(format!("invalid sender address: {e}")))?;
        let recipient: Mailbox = address
            .parse()
            .map_err(|e| PlanwrightError::skill(format!("invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(sender)
            .to(recipient)
            .subject(SUBJECT)
            .body(body)
            .map_err(|e| PlanwrightError::skill(format!("could not build message: {e}")))?;

        let builder = if config.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(|e| PlanwrightError::skill(format!("smtp setup failed: {e}")))?;

        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.password.clone()))
            .build();

        let response = transport
            .send(message)
            .await
            .map_err(|e| PlanwrightError::skill(format!("smtp send failed: {e}")))?;

        info!(address = %address, code = %response.code(), "mail delivered");
        Ok(response
            .message()
            .collect::<Vec<&str>>()
            .join(" "))
    }
}

impl SkillProvider for EmailSkill {
    fn register_into(&self, registry: &mut FunctionRegistry) -> Result<()> {
        let config = self.config.clone();
        registry.register(
            FunctionDescriptor::builder()
                .collection("email")
                .name("send")
                .description("Given an e-mail address and message body, sends an email.")
                .parameter(ParameterSpec::new(
                    "input",
                    "The body of the e-mail message to send.",
                ))
                .parameter(ParameterSpec::new(
                    "address",
                    "The e-mail address to send the e-mail to.",
                ))
                .invoke(move |args| {
                    let config = config.clone();
                    Box::pin(async move {
                        let body = args.require("input")?.to_string();
                        let address = args.require("address")?.to_string();
                        Self::send(config, body, address).await
                    })
                })
                .build()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            user: "user".to_string(),
            password: "secret".to_string(),
            use_ssl: false,
            sender: "noreply@example.com".to_string(),
        }
    }

    #[test]
    fn test_registers_send_function() {
        let mut registry = FunctionRegistry::new();
        EmailSkill::new(config()).register_into(&mut registry).unwrap();

        let descriptor = registry.resolve("email", "send").unwrap();
        assert!(descriptor.parameter("input").is_some());
        assert!(descriptor.parameter("address").is_some());
    }

    #[tokio::test]
    async fn test_invalid_recipient_rejected_before_connecting() {
        let err = EmailSkill::send(config(), "hi".to_string(), "not-an-address".to_string())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid recipient address"));
    }

    #[test]
    fn test_port_defaults_to_587() {
        let parsed: SmtpConfig = toml_like();
        assert_eq!(parsed.port, 587);
    }

    fn toml_like() -> SmtpConfig {
        serde_json::from_str(
            r#"{
                "host": "smtp.example.com",
                "user": "user",
                "password": "secret",
                "sender": "noreply@example.com"
            }"#,
        )
        .unwrap()
    }
}
