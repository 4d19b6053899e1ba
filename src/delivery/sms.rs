//! Twilio SMS channel, the fallback when push is unavailable.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::TwilioConfig;
use crate::traits::SmsChannel;

pub struct TwilioChannel {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
    sender_name: String,
}

impl TwilioChannel {
    pub fn new(config: &TwilioConfig, sender_name: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            to_number: config.to_number.clone(),
            sender_name: sender_name.to_string(),
        }
    }
}

#[async_trait]
impl SmsChannel for TwilioChannel {
    async fn send(&self, body: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from_number.as_str()),
                ("To", self.to_number.as_str()),
                ("Body", &format!("{}: {body}", self.sender_name)),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("twilio returned {status}: {text}");
        }

        debug!("sms sent");
        Ok(())
    }
}
