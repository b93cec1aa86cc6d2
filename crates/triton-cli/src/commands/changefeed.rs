//! Change-feed streaming command.

use std::io::Write;

use tracing::{debug, info};
use triton_api::TritonApi;
use triton_cloudapi::types::{ChangeFeedEvent, ChangeFeedSubscription};

use crate::cli::ChangefeedArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};

/// Change-feed command executor.
pub struct ChangefeedCommand<'a> {
    api: &'a TritonApi,
}

impl<'a> ChangefeedCommand<'a> {
    /// Create a new change-feed command.
    #[must_use]
    pub const fn new(api: &'a TritonApi) -> Self {
        Self { api }
    }

    /// Streams events until the server closes the feed or Ctrl-C.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ChangefeedArgs,
    ) -> Result<(), CliError> {
        let subscription =
            ChangeFeedSubscription::new(args.sub_resources.clone(), Some(args.vms.clone()))?;
        let mut feed = self.api.cloudapi().changefeed(&subscription).await?;
        info!(subs = ?subscription.sub_resources, "change feed open");

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    debug!("interrupted, closing change feed");
                    break;
                }
                event = feed.next_event() => match event? {
                    Some(event) => write_event(writer, format, &event)?,
                    None => {
                        info!("change feed closed by server");
                        return Ok(());
                    }
                },
            }
        }
        feed.close().await?;
        Ok(())
    }
}

/// One line per event: compact JSON or the table line.
fn write_event<W: Write>(
    writer: &mut W,
    format: &OutputFormat,
    event: &ChangeFeedEvent,
) -> Result<(), CliError> {
    if format.is_json() {
        serde_json::to_writer(&mut *writer, event)
            .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
        writeln!(writer)?;
    } else {
        event.write_table(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use serde_json::json;
    use triton_cloudapi::types::ChangeKind;

    fn event() -> ChangeFeedEvent {
        ChangeFeedEvent {
            published: json!("1700000000000"),
            change_kind: ChangeKind {
                resource: "vm".into(),
                sub_resources: vec!["state".into()],
            },
            resource_state: json!("running"),
            changed_resource_id: "b4f0b46c-1111-4000-8000-000000000001".into(),
            ..ChangeFeedEvent::default()
        }
    }

    fn api(url: String) -> TritonApi {
        use ssh_key::private::{Ed25519Keypair, KeypairData};
        use triton_cloudapi::{ClientConfig, CloudApi, Profile};

        let data = KeypairData::Ed25519(Ed25519Keypair::from_seed(&[9u8; 32]));
        let private = ssh_key::PrivateKey::new(data, "test").expect("private key");
        let key = triton_auth::KeyPair::from_ssh_private_key(private).expect("key");
        let profile = Profile {
            url,
            account: "alice".to_string(),
            key_id: key.fingerprint().to_string(),
            ..Profile::default()
        };
        TritonApi::new(CloudApi::new(&profile, &ClientConfig::for_cli(), key).expect("client"))
    }

    #[tokio::test]
    async fn streams_every_event_until_server_closes() {
        let mut second = serde_json::to_value(event()).expect("event json");
        second["resourceState"] = json!("stopped");
        let server = triton_test_server::FeedServer::start(vec![
            serde_json::to_value(event()).expect("event json"),
            second,
        ])
        .await
        .expect("feed server");
        let api = api(server.url());

        let mut buf = Vec::new();
        let args = ChangefeedArgs {
            vms: Vec::new(),
            sub_resources: vec!["state".to_string()],
        };
        ChangefeedCommand::new(&api)
            .execute(&mut buf, &OutputFormat::new(Format::Json), &args)
            .await
            .expect("feed");
        let text = String::from_utf8(buf).expect("utf8");
        let states: Vec<serde_json::Value> = text
            .lines()
            .map(|l| {
                let line: serde_json::Value = serde_json::from_str(l).expect("json");
                line["resourceState"].clone()
            })
            .collect();
        assert_eq!(states, vec![json!("running"), json!("stopped")]);
        assert_eq!(server.subscriptions().len(), 1);
        server.shutdown().await;
    }

    #[test]
    fn events_are_one_line_each() {
        let mut buf = Vec::new();
        let json = OutputFormat::new(Format::Json);
        write_event(&mut buf, &json, &event()).expect("write");
        write_event(&mut buf, &json, &event()).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text.lines().count(), 2);
        let first: serde_json::Value =
            serde_json::from_str(text.lines().next().expect("line")).expect("json");
        assert_eq!(first["changeKind"]["subResources"], json!(["state"]));

        let mut buf = Vec::new();
        write_event(&mut buf, &OutputFormat::default(), &event()).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "1700000000000  b4f0b46c-1111-4000-8000-000000000001  vm:state\n"
        );
    }
}
